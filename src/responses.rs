use atat::{AtatResp, Error as AtError};
use core::str::FromStr;
use heapless::{String, Vec};

/// Commands which gets just responded by OK
#[derive(Clone, Debug)]
pub struct NoResponse;

impl AtatResp for NoResponse {}

/// Slot id assigned by SOCKON command, e.g. ` ID: 00`
#[derive(Clone, Debug)]
pub struct SocketIdResponse {
    pub id: u8,
}

impl AtatResp for SocketIdResponse {}

impl SocketIdResponse {
    pub(crate) fn parse(response: &[u8]) -> Result<Self, AtError> {
        let id = labeled_value(response, "ID:")?.parse().map_err(|_| AtError::Parse)?;
        Ok(Self { id })
    }
}

/// Pending data length returned by SOCKQ command, e.g. ` DATALEN: 12`
#[derive(Clone, Debug)]
pub struct DataLengthResponse {
    pub length: usize,
}

impl AtatResp for DataLengthResponse {}

impl DataLengthResponse {
    pub(crate) fn parse(response: &[u8]) -> Result<Self, AtError> {
        let length = labeled_value(response, "DATALEN:")?
            .parse()
            .map_err(|_| AtError::Parse)?;
        Ok(Self { length })
    }
}

/// Raw socket data returned by SOCKR command
#[derive(Clone, Debug)]
pub struct SocketDataResponse<const RX_SIZE: usize> {
    pub data: Vec<u8, RX_SIZE>,
}

impl<const RX_SIZE: usize> AtatResp for SocketDataResponse<RX_SIZE> {}

impl<const RX_SIZE: usize> SocketDataResponse<RX_SIZE> {
    pub(crate) fn parse(response: &[u8]) -> Result<Self, AtError> {
        let data = Vec::from_slice(response).map_err(|_| AtError::InvalidResponse)?;
        Ok(Self { data })
    }
}

/// Single variable of GCFG and STS commands, e.g. `#  ip_ipaddr = 192.168.1.10`
#[derive(Clone, Debug)]
pub struct VariableResponse {
    pub value: String<64>,
}

impl AtatResp for VariableResponse {}

impl VariableResponse {
    pub(crate) fn parse(response: &[u8], name: &str) -> Result<Self, AtError> {
        let text = core::str::from_utf8(response).map_err(|_| AtError::Parse)?;

        let value = text
            .lines()
            .filter_map(|line| line.trim().strip_prefix('#'))
            .filter_map(|line| line.split_once('='))
            .find(|(key, _)| key.trim() == name)
            .map(|(_, value)| value.trim())
            .ok_or(AtError::InvalidResponse)?;

        Ok(Self {
            value: String::from_str(value).map_err(|_| AtError::InvalidResponse)?,
        })
    }
}

/// Returns the trimmed text following the given label
fn labeled_value<'a>(response: &'a [u8], label: &str) -> Result<&'a str, AtError> {
    let text = core::str::from_utf8(response).map_err(|_| AtError::Parse)?;

    text.lines()
        .find_map(|line| line.trim().strip_prefix(label))
        .map(str::trim)
        .ok_or(AtError::InvalidResponse)
}
