//! # Driver contract
//!
//! The [Adapter](crate::wifi::Adapter) does not talk to the module itself. Every hardware interaction is
//! forwarded to a [SpwfDriver], which owns the real connection slots of the module.
//! [Spwfsa01](crate::spwf::Spwfsa01) is the AT command based implementation shipped by this crate.
use core::fmt::Debug;
use core::net::{Ipv4Addr, SocketAddr};
use heapless::String;

/// Max. number of concurrent sockets supported by the module
pub const SOCKET_COUNT: usize = 8;

/// Slot id reserved by the module for the server socket
pub const SERVER_SOCKET_ID: u8 = 9;

/// Timeout for joining an access point in ms
pub const CONNECT_TIMEOUT_MS: u32 = 20_000;

/// Timeout for writing socket data in ms
pub const SEND_TIMEOUT_MS: u32 = 500;

/// Timeout for reading socket data in ms
pub const RECV_TIMEOUT_MS: u32 = 500;

/// Timeout for all other commands in ms
pub const MISC_TIMEOUT_MS: u32 = 15_000;

/// String encoded MAC address, e.g. `00:80:E1:B8:4B:5C`
pub type MacAddress = String<17>;

/// Transport protocol of a socket
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Protocol letter used by the module when opening a socket
    pub fn letter(&self) -> char {
        match self {
            Protocol::Tcp => 't',
            Protocol::Udp => 'u',
        }
    }
}

/// Wireless privacy mode as understood by the module (`wifi_priv_mode`)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PrivacyMode {
    /// Open network, no passphrase
    Open = 0,
    /// WEP
    Wep = 1,
    /// WPA/WPA2 personal
    Wpa = 2,
}

impl PrivacyMode {
    /// Numeric value of the mode
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

/// Reasons why no data could be received
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecvError {
    /// No data pending yet
    WouldBlock,

    /// Module failed to deliver data
    Device,

    /// Socket was closed by the remote side
    Closed,
}

/// Low level driver of the SPWF module
pub trait SpwfDriver {
    /// Driver specific error
    type Error: Debug;

    /// Performs the startup handshake with the module
    fn startup(&mut self) -> Result<(), Self::Error>;

    /// Joins the given access point. Passphrase is None for open networks.
    fn connect(&mut self, ssid: &str, passphrase: Option<&str>, mode: PrivacyMode) -> Result<(), Self::Error>;

    /// Leaves the current access point
    fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// Opens a connection to the given remote and returns the slot id assigned by the module
    fn open(&mut self, protocol: Protocol, remote: SocketAddr) -> Result<u8, Self::Error>;

    /// Closes the connection of the given slot
    fn close(&mut self, id: u8) -> Result<(), Self::Error>;

    /// Writes the whole buffer to the given slot
    fn send(&mut self, id: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Reads pending data of the given slot and returns the number of bytes written to buffer
    fn recv(&mut self, id: u8, buffer: &mut [u8]) -> Result<usize, RecvError>;

    /// Returns the local IP address or None if not joined
    fn ip_address(&mut self) -> Option<Ipv4Addr>;

    /// Returns the MAC address of the module
    fn mac_address(&mut self) -> Option<MacAddress>;
}
