//! Standard error vocabulary of the network stack
//!
//! The numeric codes follow the `nsapi_error` values used by mbed network stacks, so callers
//! bridging to C APIs can forward [NsapiError::code] unchanged.
use crate::driver::RecvError;
use core::fmt::{Display, Formatter};
use embedded_nal::{TcpError, TcpErrorKind};

/// Errors reported by the network stack adapter
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NsapiError {
    /// No data is available yet, operation would block
    WouldBlock,

    /// Operation is not supported by the module
    Unsupported,

    /// Invalid configuration or argument
    Parameter,

    /// Not connected to a network or remote
    NoConnection,

    /// No socket available or socket unknown
    NoSocket,

    /// Authentication failed when joining the network
    AuthError,

    /// Module reported an error or did not respond
    DeviceError,

    /// Socket is already connected
    IsConnected,
}

impl NsapiError {
    /// Returns the numeric nsapi error code. Success is represented by zero and is not part of this enum.
    pub fn code(&self) -> i32 {
        match self {
            NsapiError::WouldBlock => -3001,
            NsapiError::Unsupported => -3002,
            NsapiError::Parameter => -3003,
            NsapiError::NoConnection => -3004,
            NsapiError::NoSocket => -3005,
            NsapiError::AuthError => -3011,
            NsapiError::DeviceError => -3012,
            NsapiError::IsConnected => -3015,
        }
    }
}

impl Display for NsapiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            NsapiError::WouldBlock => "operation would block",
            NsapiError::Unsupported => "unsupported operation",
            NsapiError::Parameter => "invalid parameter",
            NsapiError::NoConnection => "not connected",
            NsapiError::NoSocket => "socket not available",
            NsapiError::AuthError => "authentication failed",
            NsapiError::DeviceError => "device error",
            NsapiError::IsConnected => "socket already connected",
        };

        write!(f, "{} ({})", text, self.code())
    }
}

impl TcpError for NsapiError {
    fn kind(&self) -> TcpErrorKind {
        match self {
            NsapiError::NoConnection => TcpErrorKind::PipeClosed,
            _ => TcpErrorKind::Other,
        }
    }
}

impl From<RecvError> for NsapiError {
    fn from(error: RecvError) -> Self {
        match error {
            RecvError::WouldBlock => NsapiError::WouldBlock,
            RecvError::Device => NsapiError::DeviceError,
            RecvError::Closed => NsapiError::NoConnection,
        }
    }
}
