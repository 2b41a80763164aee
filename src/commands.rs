use crate::driver::{PrivacyMode, Protocol, MISC_TIMEOUT_MS, RECV_TIMEOUT_MS, SEND_TIMEOUT_MS};
use crate::responses::{DataLengthResponse, NoResponse, SocketDataResponse, SocketIdResponse, VariableResponse};
use crate::spwf::DriverError;
use atat::{AtatCmd, Error as AtError, InternalError};
use core::fmt::{Arguments, Write};
use core::net::SocketAddrV4;
use core::str::FromStr;
use heapless::String;

/// Trait for mapping command errors
pub trait CommandErrorHandler {
    /// Maps regular errors
    fn command_error(&self, error: AtError) -> DriverError;
}

/// Operating mode of the module (`wifi_mode`)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WifiMode {
    Idle = 0,
    Station = 1,
}

/// Checks if the module responds to commands
#[derive(Clone, Debug)]
pub struct AttentionCommand;

impl AtatCmd for AttentionCommand {
    type Response = NoResponse;
    const MAX_LEN: usize = 4;

    fn write(&self, buffer: &mut [u8]) -> usize {
        write_command(buffer, format_args!("AT\r"))
    }

    fn parse(&self, response: Result<&[u8], InternalError>) -> Result<Self::Response, AtError> {
        accept(response)?;
        Ok(NoResponse)
    }
}

impl CommandErrorHandler for AttentionCommand {
    fn command_error(&self, error: AtError) -> DriverError {
        DriverError::StartupFailed(error)
    }
}

/// Sets a configuration variable
#[derive(Clone, Debug)]
pub struct SetConfigCommand {
    /// Variable name, e.g. `wifi_mode`
    name: &'static str,

    /// Unquoted value
    value: String<64>,
}

impl SetConfigCommand {
    /// Enables/Disables the local echo of the console
    pub fn local_echo(enabled: bool) -> Self {
        Self::numeric("localecho1", enabled as u8)
    }

    pub fn wifi_mode(mode: WifiMode) -> Self {
        Self::numeric("wifi_mode", mode as u8)
    }

    pub fn privacy_mode(mode: PrivacyMode) -> Self {
        Self::numeric("wifi_priv_mode", mode.value())
    }

    /// Sets the WPA passphrase (max. 64 chars)
    pub fn wpa_passphrase(passphrase: &str) -> Result<Self, DriverError> {
        Self::text("wifi_wpa_psk_text", passphrase)
    }

    /// Sets the first WEP key (hex encoded, max. 64 chars)
    pub fn wep_key(key: &str) -> Result<Self, DriverError> {
        Self::text("wifi_wep_keys[0]", key)
    }

    fn numeric(name: &'static str, value: u8) -> Self {
        let mut encoded = String::new();
        // Three digits always fit
        let _ = write!(encoded, "{}", value);
        Self { name, value: encoded }
    }

    fn text(name: &'static str, value: &str) -> Result<Self, DriverError> {
        let value = String::from_str(value).map_err(|_| DriverError::InvalidPassphraseLength)?;
        Ok(Self { name, value })
    }
}

impl AtatCmd for SetConfigCommand {
    type Response = NoResponse;
    const MAX_LEN: usize = 96;

    fn write(&self, buffer: &mut [u8]) -> usize {
        write_command(buffer, format_args!("AT+S.SCFG={},{}\r", self.name, self.value))
    }

    fn parse(&self, response: Result<&[u8], InternalError>) -> Result<Self::Response, AtError> {
        accept(response)?;
        Ok(NoResponse)
    }
}

impl CommandErrorHandler for SetConfigCommand {
    fn command_error(&self, error: AtError) -> DriverError {
        DriverError::ConfigurationFailed(error)
    }
}

/// Sets the SSID of the target access point
#[derive(Clone, Debug)]
pub struct SetSsidCommand {
    ssid: String<32>,
}

impl SetSsidCommand {
    pub fn new(ssid: &str) -> Result<Self, DriverError> {
        let ssid = String::from_str(ssid).map_err(|_| DriverError::InvalidSsidLength)?;
        Ok(Self { ssid })
    }
}

impl AtatCmd for SetSsidCommand {
    type Response = NoResponse;
    const MAX_LEN: usize = 48;

    fn write(&self, buffer: &mut [u8]) -> usize {
        write_command(buffer, format_args!("AT+S.SSIDTXT={}\r", self.ssid))
    }

    fn parse(&self, response: Result<&[u8], InternalError>) -> Result<Self::Response, AtError> {
        accept(response)?;
        Ok(NoResponse)
    }
}

impl CommandErrorHandler for SetSsidCommand {
    fn command_error(&self, error: AtError) -> DriverError {
        DriverError::ConfigurationFailed(error)
    }
}

/// Saves the current configuration to flash
#[derive(Clone, Debug)]
pub struct SaveConfigCommand;

impl AtatCmd for SaveConfigCommand {
    type Response = NoResponse;
    const MAX_LEN: usize = 5;

    fn write(&self, buffer: &mut [u8]) -> usize {
        write_command(buffer, format_args!("AT&W\r"))
    }

    fn parse(&self, response: Result<&[u8], InternalError>) -> Result<Self::Response, AtError> {
        accept(response)?;
        Ok(NoResponse)
    }
}

impl CommandErrorHandler for SaveConfigCommand {
    fn command_error(&self, error: AtError) -> DriverError {
        DriverError::ConfigurationFailed(error)
    }
}

/// Restarts the module, which applies the saved configuration
#[derive(Clone, Debug)]
pub struct ResetCommand;

impl AtatCmd for ResetCommand {
    type Response = NoResponse;
    const MAX_LEN: usize = 11;
    const MAX_TIMEOUT_MS: u32 = MISC_TIMEOUT_MS;

    fn write(&self, buffer: &mut [u8]) -> usize {
        write_command(buffer, format_args!("AT+CFUN=1\r"))
    }

    fn parse(&self, response: Result<&[u8], InternalError>) -> Result<Self::Response, AtError> {
        accept(response)?;
        Ok(NoResponse)
    }
}

impl CommandErrorHandler for ResetCommand {
    fn command_error(&self, error: AtError) -> DriverError {
        DriverError::ResetFailed(error)
    }
}

/// Opens a TCP or UDP connection
#[derive(Clone, Debug)]
pub struct SocketOpenCommand {
    remote: SocketAddrV4,
    protocol: Protocol,
}

impl SocketOpenCommand {
    pub fn new(protocol: Protocol, remote: SocketAddrV4) -> Self {
        Self { remote, protocol }
    }
}

impl AtatCmd for SocketOpenCommand {
    type Response = SocketIdResponse;
    const MAX_LEN: usize = 48;
    const MAX_TIMEOUT_MS: u32 = MISC_TIMEOUT_MS;

    fn write(&self, buffer: &mut [u8]) -> usize {
        write_command(
            buffer,
            format_args!(
                "AT+S.SOCKON={},{},{}\r",
                self.remote.ip(),
                self.remote.port(),
                self.protocol.letter()
            ),
        )
    }

    fn parse(&self, response: Result<&[u8], InternalError>) -> Result<Self::Response, AtError> {
        SocketIdResponse::parse(accept(response)?)
    }
}

impl CommandErrorHandler for SocketOpenCommand {
    fn command_error(&self, error: AtError) -> DriverError {
        DriverError::OpenFailed(error)
    }
}

/// Closes the connection of a slot
#[derive(Clone, Debug)]
pub struct SocketCloseCommand {
    id: u8,
}

impl SocketCloseCommand {
    pub fn new(id: u8) -> Self {
        Self { id }
    }
}

impl AtatCmd for SocketCloseCommand {
    type Response = NoResponse;
    const MAX_LEN: usize = 16;
    const MAX_TIMEOUT_MS: u32 = MISC_TIMEOUT_MS;

    fn write(&self, buffer: &mut [u8]) -> usize {
        write_command(buffer, format_args!("AT+S.SOCKC={:02}\r", self.id))
    }

    fn parse(&self, response: Result<&[u8], InternalError>) -> Result<Self::Response, AtError> {
        accept(response)?;
        Ok(NoResponse)
    }
}

impl CommandErrorHandler for SocketCloseCommand {
    fn command_error(&self, error: AtError) -> DriverError {
        DriverError::CloseFailed(error)
    }
}

/// Writes a chunk of max. TX_SIZE bytes to a slot. The data directly follows the command line.
#[derive(Clone, Debug)]
pub struct SocketWriteCommand<'a, const TX_SIZE: usize> {
    id: u8,
    data: &'a [u8],
}

impl<'a, const TX_SIZE: usize> SocketWriteCommand<'a, TX_SIZE> {
    pub fn new(id: u8, data: &'a [u8]) -> Self {
        Self { id, data }
    }
}

impl<const TX_SIZE: usize> AtatCmd for SocketWriteCommand<'_, TX_SIZE> {
    type Response = NoResponse;
    const MAX_LEN: usize = TX_SIZE + 24;
    const MAX_TIMEOUT_MS: u32 = SEND_TIMEOUT_MS;

    fn write(&self, buffer: &mut [u8]) -> usize {
        let header = write_command(buffer, format_args!("AT+S.SOCKW={:02},{}\r", self.id, self.data.len()));

        let length = self.data.len().min(buffer.len() - header);
        buffer[header..header + length].copy_from_slice(&self.data[..length]);
        header + length
    }

    fn parse(&self, response: Result<&[u8], InternalError>) -> Result<Self::Response, AtError> {
        accept(response)?;
        Ok(NoResponse)
    }
}

impl<const TX_SIZE: usize> CommandErrorHandler for SocketWriteCommand<'_, TX_SIZE> {
    fn command_error(&self, error: AtError) -> DriverError {
        DriverError::SendFailed(error)
    }
}

/// Queries the length of data pending on a slot
#[derive(Clone, Debug)]
pub struct SocketQueryCommand {
    id: u8,
}

impl SocketQueryCommand {
    pub fn new(id: u8) -> Self {
        Self { id }
    }
}

impl AtatCmd for SocketQueryCommand {
    type Response = DataLengthResponse;
    const MAX_LEN: usize = 16;
    const MAX_TIMEOUT_MS: u32 = RECV_TIMEOUT_MS;

    fn write(&self, buffer: &mut [u8]) -> usize {
        write_command(buffer, format_args!("AT+S.SOCKQ={:02}\r", self.id))
    }

    fn parse(&self, response: Result<&[u8], InternalError>) -> Result<Self::Response, AtError> {
        DataLengthResponse::parse(accept(response)?)
    }
}

impl CommandErrorHandler for SocketQueryCommand {
    fn command_error(&self, error: AtError) -> DriverError {
        DriverError::ReceiveFailed(error)
    }
}

/// Reads up to RX_SIZE pending bytes of a slot
#[derive(Clone, Debug)]
pub struct SocketReadCommand<const RX_SIZE: usize> {
    id: u8,
    length: usize,
}

impl<const RX_SIZE: usize> SocketReadCommand<RX_SIZE> {
    pub fn new(id: u8, length: usize) -> Self {
        Self {
            id,
            length: length.min(RX_SIZE),
        }
    }
}

impl<const RX_SIZE: usize> AtatCmd for SocketReadCommand<RX_SIZE> {
    type Response = SocketDataResponse<RX_SIZE>;
    const MAX_LEN: usize = 24;
    const MAX_TIMEOUT_MS: u32 = RECV_TIMEOUT_MS;

    fn write(&self, buffer: &mut [u8]) -> usize {
        write_command(buffer, format_args!("AT+S.SOCKR={:02},{}\r", self.id, self.length))
    }

    fn parse(&self, response: Result<&[u8], InternalError>) -> Result<Self::Response, AtError> {
        SocketDataResponse::parse(accept(response)?)
    }
}

impl<const RX_SIZE: usize> CommandErrorHandler for SocketReadCommand<RX_SIZE> {
    fn command_error(&self, error: AtError) -> DriverError {
        DriverError::ReceiveFailed(error)
    }
}

/// Reads a status variable (STS) or configuration variable (GCFG)
#[derive(Clone, Debug)]
pub struct GetVariableCommand {
    /// `S.STS` or `S.GCFG`
    command: &'static str,

    name: &'static str,
}

impl GetVariableCommand {
    /// Current IPv4 address
    pub fn ip_address() -> Self {
        Self {
            command: "S.STS",
            name: "ip_ipaddr",
        }
    }

    /// MAC address stored in flash
    pub fn mac_address() -> Self {
        Self {
            command: "S.GCFG",
            name: "nv_wifi_macaddr",
        }
    }
}

impl AtatCmd for GetVariableCommand {
    type Response = VariableResponse;
    const MAX_LEN: usize = 40;

    fn write(&self, buffer: &mut [u8]) -> usize {
        write_command(buffer, format_args!("AT+{}={}\r", self.command, self.name))
    }

    fn parse(&self, response: Result<&[u8], InternalError>) -> Result<Self::Response, AtError> {
        VariableResponse::parse(accept(response)?, self.name)
    }
}

impl CommandErrorHandler for GetVariableCommand {
    fn command_error(&self, error: AtError) -> DriverError {
        DriverError::QueryFailed(error)
    }
}

/// Writes the formatted command to the buffer and returns the written length.
/// Output exceeding the buffer is truncated.
fn write_command(buffer: &mut [u8], arguments: Arguments<'_>) -> usize {
    let mut writer = CommandWriter { buffer, position: 0 };
    let _ = writer.write_fmt(arguments);
    writer.position
}

/// Maps error responses of the module
fn accept<'a>(response: Result<&'a [u8], InternalError>) -> Result<&'a [u8], AtError> {
    response.map_err(|_| AtError::Error)
}

struct CommandWriter<'a> {
    buffer: &'a mut [u8],

    /// Next buffer index to start inserting data
    position: usize,
}

impl Write for CommandWriter<'_> {
    fn write_str(&mut self, text: &str) -> core::fmt::Result {
        let end = self.position + text.len();
        if end > self.buffer.len() {
            return Err(core::fmt::Error);
        }

        self.buffer[self.position..end].copy_from_slice(text.as_bytes());
        self.position = end;
        Ok(())
    }
}
