use atat::digest::ParseError;
use atat::{AtatUrc, Parser};
use core::net::Ipv4Addr;
use core::str::FromStr;

/// Prefix of all WIND indications
const WIND_PREFIX: &[u8] = b"+WIND:";

/// URC definitions, needs to passed as generic of [AtDigester](atat::digest::AtDigester): `AtDigester<URCMessages>`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum URCMessages {
    /// Console is ready for receiving AT commands (WIND 0)
    ConsoleActive,
    /// Radio is powered up (WIND 32)
    HardwareStarted,
    /// Joined to access point and obtained the given IP (WIND 24)
    WifiUp(Ipv4Addr),
    /// Connection to access point lost (WIND 33)
    NetworkLost,
    /// Access point deauthenticated the module (WIND 41)
    Deauthenticated,
    /// Data of the given length is pending on the given slot (WIND 55)
    PendingData(u8, usize),
    /// Slot was closed by the remote side (WIND 58)
    SocketClosed(u8),
    /// Unknown WIND message
    Unknown,
}

impl AtatUrc for URCMessages {
    type Response = Self;

    fn parse(resp: &[u8]) -> Option<Self::Response> {
        let line = core::str::from_utf8(resp).ok()?.trim_end();
        let mut fields = line.strip_prefix("+WIND:")?.split(':');
        let number: u8 = fields.next()?.parse().ok()?;

        // Skipping description text
        let _ = fields.next();

        match number {
            0 => Some(Self::ConsoleActive),
            24 => Some(Self::WifiUp(Ipv4Addr::from_str(fields.next()?.trim()).ok()?)),
            32 => Some(Self::HardwareStarted),
            33 => Some(Self::NetworkLost),
            41 => Some(Self::Deauthenticated),
            55 => {
                let id = fields.next()?.trim().parse().ok()?;
                let length = fields.next()?.trim().parse().ok()?;
                Some(Self::PendingData(id, length))
            }
            58 => Some(Self::SocketClosed(fields.next()?.trim().parse().ok()?)),
            _ => Some(Self::Unknown),
        }
    }
}

impl Parser for URCMessages {
    fn parse(buf: &[u8]) -> Result<(&[u8], usize), ParseError> {
        let start = buf
            .iter()
            .position(|byte| *byte != b'\r' && *byte != b'\n')
            .ok_or(ParseError::Incomplete)?;
        let line = &buf[start..];

        if line.len() < WIND_PREFIX.len() {
            if WIND_PREFIX.starts_with(line) {
                return Err(ParseError::Incomplete);
            }

            return Err(ParseError::NoMatch);
        }

        if !line.starts_with(WIND_PREFIX) {
            return Err(ParseError::NoMatch);
        }

        let line_end = line
            .windows(2)
            .position(|window| window == b"\r\n")
            .ok_or(ParseError::Incomplete)?;
        let end = start + line_end + 2;

        Ok((&buf[start..end], end))
    }
}
