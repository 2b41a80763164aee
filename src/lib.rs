#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]

#[cfg(test)]
extern crate alloc;

#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, trace, warn};
#[cfg(not(feature = "defmt"))]
pub(crate) use log::{debug, trace, warn};

pub(crate) mod commands;
pub mod driver;
pub mod error;
pub(crate) mod responses;
pub(crate) mod slots;
pub mod spwf;
pub mod stack;
pub mod urc;
pub mod wifi;

#[cfg(feature = "examples")]
pub mod example;

#[cfg(test)]
mod tests;
