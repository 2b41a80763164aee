//! Mocks for doc examples
use crate::driver::{MacAddress, PrivacyMode, Protocol, RecvError, SpwfDriver};
use core::net::{Ipv4Addr, SocketAddr};
use core::str::FromStr;

/// Driver mock, which answers like a module joined to a network with a single echo peer
#[derive(Default)]
pub struct ExampleDriver {
    joined: bool,

    /// Bytes received from peer
    pending: usize,
}

impl SpwfDriver for ExampleDriver {
    type Error = ();

    fn startup(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn connect(&mut self, ssid: &str, passphrase: Option<&str>, _mode: PrivacyMode) -> Result<(), Self::Error> {
        if ssid != "test_wifi" || passphrase != Some("secret") {
            return Err(());
        }

        self.joined = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.joined = false;
        Ok(())
    }

    fn open(&mut self, _protocol: Protocol, _remote: SocketAddr) -> Result<u8, Self::Error> {
        Ok(0)
    }

    fn close(&mut self, _id: u8) -> Result<(), Self::Error> {
        Ok(())
    }

    fn send(&mut self, _id: u8, _data: &[u8]) -> Result<(), Self::Error> {
        self.pending = 16;
        Ok(())
    }

    fn recv(&mut self, _id: u8, buffer: &mut [u8]) -> Result<usize, RecvError> {
        if self.pending == 0 {
            return Err(RecvError::WouldBlock);
        }

        let data = b"nice to see you!";
        let length = data.len().min(buffer.len());
        buffer[..length].copy_from_slice(&data[..length]);
        self.pending = 0;
        Ok(length)
    }

    fn ip_address(&mut self) -> Option<Ipv4Addr> {
        if !self.joined {
            return None;
        }

        Some(Ipv4Addr::new(10, 0, 0, 181))
    }

    fn mac_address(&mut self) -> Option<MacAddress> {
        MacAddress::from_str("00:80:e1:b8:4b:5c").ok()
    }
}
