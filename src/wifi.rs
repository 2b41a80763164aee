//! # WIFI station interface
//!
//! Joining a network and obtaining address information is supported. Scanning, RSSI, channel
//! selection and stored credentials are not supported by the module firmware and return
//! [NsapiError::Unsupported].
//!
//! The module is initialized lazily on the first [WifiInterface::connect] call, unless
//! [Adapter::init] was called before.
//!
//! ## Example
//!
//! ````
//! # use spwf_at_nal::example::ExampleDriver;
//! # use spwf_at_nal::stack::NetworkStack;
//! # use spwf_at_nal::wifi::{Adapter, Security, WifiInterface};
//! #
//! let mut adapter: Adapter<_> = Adapter::new(ExampleDriver::default());
//!
//! // Joining the access point, the module gets initialized on demand
//! adapter.connect("test_wifi", "secret", Security::Wpa2).unwrap();
//!
//! assert_eq!("10.0.0.181", adapter.get_ip_address().unwrap().to_string());
//! assert_eq!("00:80:e1:b8:4b:5c", adapter.get_mac_address().unwrap().as_str());
//! ````
use crate::driver::{MacAddress, PrivacyMode, SpwfDriver, SOCKET_COUNT};
use crate::error::NsapiError;
use crate::slots::SlotTable;
use crate::stack::SocketRecord;
use crate::{debug, warn};
use heapless::String;

/// Max. SSID length in bytes
const MAX_SSID_LENGTH: usize = 32;

/// Max. passphrase length in bytes
const MAX_PASSPHRASE_LENGTH: usize = 64;

/// WIFI station interface
pub trait WifiInterface {
    /// Joins the given access point
    fn connect(&mut self, ssid: &str, passphrase: &str, security: Security) -> Result<(), NsapiError>;

    /// Leaves the current access point
    fn disconnect(&mut self) -> Result<(), NsapiError>;

    /// Stores credentials for a later connect
    fn set_credentials(&mut self, ssid: &str, passphrase: &str, security: Security) -> Result<(), NsapiError>;

    /// Sets the channel used for joining, 0 for any
    fn set_channel(&mut self, channel: u8) -> Result<(), NsapiError>;

    /// Returns the signal strength of the current connection in dBm
    fn get_rssi(&mut self) -> Result<i8, NsapiError>;

    /// Scans for access points and writes the results to the given slice.
    /// Returns the number of found access points.
    fn scan(&mut self, results: &mut [AccessPoint]) -> Result<usize, NsapiError>;

    /// Returns the MAC address of the module
    fn get_mac_address(&mut self) -> Option<MacAddress>;
}

/// Security type of a WIFI network
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Security {
    None,
    Wep,
    Wpa,
    Wpa2,
    WpaWpa2,
    Pap,
    Chap,
    Unknown,
}

impl Security {
    /// Returns the privacy mode of the module.
    ///
    /// The module knows just open, WEP and WPA networks. All types it does not know are joined as WPA.
    pub fn privacy_mode(&self) -> PrivacyMode {
        match self {
            Security::None => PrivacyMode::Open,
            Security::Wep => PrivacyMode::Wep,
            Security::Wpa | Security::Wpa2 | Security::WpaWpa2 => PrivacyMode::Wpa,
            Security::Pap | Security::Chap | Security::Unknown => PrivacyMode::Wpa,
        }
    }
}

/// Access point found by a scan
#[derive(Clone, Debug)]
pub struct AccessPoint {
    pub ssid: String<32>,
    pub bssid: [u8; 6],
    pub security: Security,
    pub rssi: i8,
    pub channel: u8,
}

/// Network stack adapter for SPWF01SA modules
///
/// HANDLES: Max. number of socket handles open at the same time. Only connected handles occupy a
/// slot of the module, of which [SOCKET_COUNT] exist.
pub struct Adapter<D: SpwfDriver, const HANDLES: usize = SOCKET_COUNT> {
    /// Low level driver
    pub(crate) driver: D,

    /// True if the startup handshake succeeded
    initialized: bool,

    /// True if the server socket is active
    pub(crate) listening: bool,

    /// Socket records, array index = handle index
    pub(crate) sockets: [Option<SocketRecord>; HANDLES],

    /// Module slots in use
    pub(crate) slots: SlotTable,
}

impl<D: SpwfDriver, const HANDLES: usize> WifiInterface for Adapter<D, HANDLES> {
    /// Joins the given access point.
    ///
    /// The passphrase is ignored for [Security::None]. Runs [Adapter::init] first, if the module
    /// has not been initialized yet.
    fn connect(&mut self, ssid: &str, passphrase: &str, security: Security) -> Result<(), NsapiError> {
        let mode = security.privacy_mode();
        let passphrase = match mode {
            PrivacyMode::Open => None,
            PrivacyMode::Wep | PrivacyMode::Wpa => Some(passphrase),
        };

        if ssid.is_empty() || ssid.len() > MAX_SSID_LENGTH {
            return Err(NsapiError::Parameter);
        }

        if passphrase.is_some_and(|key| key.len() > MAX_PASSPHRASE_LENGTH) {
            return Err(NsapiError::Parameter);
        }

        if !self.initialized {
            self.init()?;
        }

        if self.driver.connect(ssid, passphrase, mode).is_err() {
            warn!("Joining access point {} failed", ssid);
            return Err(NsapiError::NoConnection);
        }

        debug!("Joined access point {} (mode {})", ssid, mode.value());
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), NsapiError> {
        self.driver.disconnect().map_err(|_| NsapiError::DeviceError)
    }

    fn set_credentials(&mut self, _ssid: &str, _passphrase: &str, _security: Security) -> Result<(), NsapiError> {
        Err(NsapiError::Unsupported)
    }

    fn set_channel(&mut self, _channel: u8) -> Result<(), NsapiError> {
        Err(NsapiError::Unsupported)
    }

    fn get_rssi(&mut self) -> Result<i8, NsapiError> {
        Err(NsapiError::Unsupported)
    }

    fn scan(&mut self, _results: &mut [AccessPoint]) -> Result<usize, NsapiError> {
        Err(NsapiError::Unsupported)
    }

    fn get_mac_address(&mut self) -> Option<MacAddress> {
        self.driver.mac_address()
    }
}

impl<D: SpwfDriver, const HANDLES: usize> Adapter<D, HANDLES> {
    /// Creates a new adapter. The module is not touched until the first call.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            initialized: false,
            listening: false,
            sockets: [None; HANDLES],
            slots: SlotTable::new(),
        }
    }

    /// Performs the startup handshake with the module. Does nothing if already initialized.
    pub fn init(&mut self) -> Result<(), NsapiError> {
        if self.initialized {
            return Ok(());
        }

        if self.driver.startup().is_err() {
            warn!("Module startup failed");
            return Err(NsapiError::DeviceError);
        }

        debug!("Module initialized");
        self.initialized = true;
        Ok(())
    }

    /// True if the startup handshake succeeded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// True if the server socket is active
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Returns true if the given module slot is in use by a socket
    pub fn is_slot_reserved(&self, id: u8) -> bool {
        self.slots.is_reserved(id)
    }

    /// Number of module slots not in use
    pub fn available_slots(&self) -> usize {
        self.slots.available()
    }

    /// Returns the low level driver
    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }
}
