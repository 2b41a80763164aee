//! # AT command driver
//!
//! [Spwfsa01] implements [SpwfDriver] on top of a blocking [atat] client. Joining a network is
//! done by storing the credentials in the module configuration and restarting the module. The
//! join result is signaled by `+WIND` messages, which need to be delivered by an
//! [UrcSubscription] of [URCMessages].
//!
//! ````ignore
//! static URC_CHANNEL: UrcChannel<URCMessages, 8, 1> = UrcChannel::new();
//!
//! let (client, ingress) = atat::blocking::Client::new(..);
//! let driver: Spwfsa01<_, _, 1_000, 256, 256, 8> = Spwfsa01::new(client, URC_CHANNEL.subscribe().unwrap(), timer);
//! let mut adapter: Adapter<_> = Adapter::new(driver);
//! ````
use crate::commands::{
    AttentionCommand, CommandErrorHandler, GetVariableCommand, ResetCommand, SaveConfigCommand, SetConfigCommand,
    SetSsidCommand, SocketCloseCommand, SocketOpenCommand, SocketQueryCommand, SocketReadCommand, SocketWriteCommand,
    WifiMode,
};
use crate::driver::{
    MacAddress, PrivacyMode, Protocol, RecvError, SpwfDriver, CONNECT_TIMEOUT_MS, MISC_TIMEOUT_MS, SOCKET_COUNT,
};
use crate::urc::URCMessages;
use crate::{debug, trace, warn};
use atat::blocking::AtatClient;
use atat::{AtatCmd, Error as AtError, UrcSubscription};
use core::net::{Ipv4Addr, SocketAddr};
use core::str::FromStr;
use fugit::TimerDurationU32;
use fugit_timer::Timer;

/// Errors of the AT command driver
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Module did not respond to the attention command
    StartupFailed(AtError),

    /// Error while setting a configuration variable
    ConfigurationFailed(AtError),

    /// Restart command failed
    ResetFailed(AtError),

    /// SOCKON command failed
    OpenFailed(AtError),

    /// SOCKC command failed
    CloseFailed(AtError),

    /// SOCKW command failed
    SendFailed(AtError),

    /// SOCKQ or SOCKR command failed
    ReceiveFailed(AtError),

    /// STS or GCFG command failed
    QueryFailed(AtError),

    /// Given SSID is longer then the max. size of 32 chars
    InvalidSsidLength,

    /// Given passphrase is longer then the max. size of 64 chars
    InvalidPassphraseLength,

    /// Module supports IPv4 remotes only
    UnsupportedAddress,

    /// Access point was not joined in time
    JoinTimeout,

    /// Module did not signal console readiness after restart
    RestartTimeout,

    /// Upstream timer error
    TimerError,
}

/// Link state of the module, updated by URC messages
#[derive(Default)]
pub(crate) struct Session {
    /// Currently joined to WIFI network?
    pub(crate) joined: bool,

    /// IP assigned on join
    pub(crate) ip: Option<Ipv4Addr>,

    /// Console is ready after restart
    pub(crate) console_active: bool,

    /// Slot was closed by remote side, array index = slot id
    pub(crate) closed: [bool; SOCKET_COUNT],
}

impl Session {
    pub(crate) fn handle_urc(&mut self, message: URCMessages) {
        match message {
            URCMessages::ConsoleActive => self.console_active = true,
            URCMessages::HardwareStarted => {}
            URCMessages::WifiUp(ip) => {
                self.joined = true;
                self.ip = Some(ip);
            }
            URCMessages::NetworkLost | URCMessages::Deauthenticated => {
                self.joined = false;
                self.ip = None;
            }
            URCMessages::PendingData(id, length) => trace!("{} bytes pending on slot {}", length, id),
            URCMessages::SocketClosed(id) => {
                if let Some(closed) = self.closed.get_mut(id as usize) {
                    *closed = true;
                }
            }
            URCMessages::Unknown => {}
        }
    }

    /// Returns true if the slot was closed by the remote side
    fn is_closed(&self, id: u8) -> bool {
        self.closed.get(id as usize).copied().unwrap_or(false)
    }

    fn set_closed(&mut self, id: u8, closed: bool) {
        if let Some(state) = self.closed.get_mut(id as usize) {
            *state = closed;
        }
    }
}

/// SPWF01SA driver based on AT commands
///
/// TX_SIZE: Chunk size in bytes when sending data. Higher value results in better performance, but
/// introduces also higher stack memory footprint.
///
/// RX_SIZE: Chunk size in bytes when receiving data. Value should be matched to buffer size of `recv()` calls.
pub struct Spwfsa01<
    'urc_sub,
    A: AtatClient,
    T: Timer<TIMER_HZ>,
    const TIMER_HZ: u32,
    const TX_SIZE: usize,
    const RX_SIZE: usize,
    const URC_CAPACITY: usize,
> {
    /// ATAT client
    pub(crate) client: A,

    /// URC message subscriber
    pub(crate) urc_subscription: UrcSubscription<'urc_sub, URCMessages, URC_CAPACITY, 1>,

    /// Timer used for timeout measurement
    pub(crate) timer: T,

    /// Link state
    pub(crate) session: Session,
}

impl<
        'urc_sub,
        A: AtatClient,
        T: Timer<TIMER_HZ>,
        const TIMER_HZ: u32,
        const TX_SIZE: usize,
        const RX_SIZE: usize,
        const URC_CAPACITY: usize,
    > SpwfDriver for Spwfsa01<'urc_sub, A, T, TIMER_HZ, TX_SIZE, RX_SIZE, URC_CAPACITY>
{
    type Error = DriverError;

    /// Checks that the module responds and disables the console echo
    fn startup(&mut self) -> Result<(), DriverError> {
        self.send_command(AttentionCommand)?;
        self.send_command(SetConfigCommand::local_echo(false))?;
        self.process_urc_messages();
        Ok(())
    }

    /// Stores the credentials, restarts the module and blocks until the access point is joined
    fn connect(&mut self, ssid: &str, passphrase: Option<&str>, mode: PrivacyMode) -> Result<(), DriverError> {
        let ssid_command = SetSsidCommand::new(ssid)?;
        let key_command = match (mode, passphrase) {
            (PrivacyMode::Open, _) | (_, None) => None,
            (PrivacyMode::Wep, Some(key)) => Some(SetConfigCommand::wep_key(key)?),
            (PrivacyMode::Wpa, Some(key)) => Some(SetConfigCommand::wpa_passphrase(key)?),
        };

        if let Some(command) = key_command {
            self.send_command(command)?;
        }

        self.send_command(ssid_command)?;
        self.send_command(SetConfigCommand::privacy_mode(mode))?;
        self.send_command(SetConfigCommand::wifi_mode(WifiMode::Station))?;
        self.send_command(SaveConfigCommand)?;
        self.restart()?;

        self.wait_for(CONNECT_TIMEOUT_MS, |session| session.joined, DriverError::JoinTimeout)?;
        debug!("WIFI up");
        Ok(())
    }

    /// Switches the module to idle mode and blocks until restarted
    fn disconnect(&mut self) -> Result<(), DriverError> {
        self.send_command(SetConfigCommand::wifi_mode(WifiMode::Idle))?;
        self.send_command(SaveConfigCommand)?;
        self.restart()?;

        self.wait_for(MISC_TIMEOUT_MS, |session| session.console_active, DriverError::RestartTimeout)
    }

    fn open(&mut self, protocol: Protocol, remote: SocketAddr) -> Result<u8, DriverError> {
        let SocketAddr::V4(remote) = remote else {
            return Err(DriverError::UnsupportedAddress);
        };

        let response = self.send_command(SocketOpenCommand::new(protocol, remote))?;
        self.session.set_closed(response.id, false);
        Ok(response.id)
    }

    /// If the slot has already been closed by the remote side, no command is sent.
    fn close(&mut self, id: u8) -> Result<(), DriverError> {
        self.process_urc_messages();

        if self.session.is_closed(id) {
            self.session.set_closed(id, false);
            return Ok(());
        }

        self.send_command(SocketCloseCommand::new(id))?;
        Ok(())
    }

    /// The data is divided into smaller blocks. The block size is determined by the generic constant TX_SIZE.
    fn send(&mut self, id: u8, data: &[u8]) -> Result<(), DriverError> {
        for chunk in data.chunks(TX_SIZE) {
            self.send_command(SocketWriteCommand::<TX_SIZE>::new(id, chunk))?;
        }

        Ok(())
    }

    /// Reads at most one RX_SIZE block of pending data.
    ///
    /// Data received before the remote side closed the slot is still returned. After that
    /// [RecvError::Closed] is returned.
    fn recv(&mut self, id: u8, buffer: &mut [u8]) -> Result<usize, RecvError> {
        self.process_urc_messages();

        if buffer.is_empty() {
            return Ok(0);
        }

        let available = match self.send_command(SocketQueryCommand::new(id)) {
            Ok(response) => response.length,
            Err(_) if self.session.is_closed(id) => return Err(RecvError::Closed),
            Err(error) => {
                warn!("Querying pending data of slot {} failed: {:?}", id, error);
                return Err(RecvError::Device);
            }
        };

        if available == 0 && self.session.is_closed(id) {
            return Err(RecvError::Closed);
        }

        if available == 0 {
            return Err(RecvError::WouldBlock);
        }

        let length = available.min(buffer.len());
        let response = self
            .send_command(SocketReadCommand::<RX_SIZE>::new(id, length))
            .map_err(|error| {
                warn!("Reading slot {} failed: {:?}", id, error);
                RecvError::Device
            })?;

        let data = response.data;
        if data.len() > buffer.len() {
            return Err(RecvError::Device);
        }

        buffer[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    /// Returns None if not joined
    fn ip_address(&mut self) -> Option<Ipv4Addr> {
        self.process_urc_messages();

        if !self.session.joined {
            return None;
        }

        match self.send_command(GetVariableCommand::ip_address()) {
            Ok(response) => Ipv4Addr::from_str(response.value.as_str()).ok(),
            Err(_) => self.session.ip,
        }
    }

    fn mac_address(&mut self) -> Option<MacAddress> {
        let response = self.send_command(GetVariableCommand::mac_address()).ok()?;
        MacAddress::from_str(response.value.as_str()).ok()
    }
}

impl<
        'urc_sub,
        A: AtatClient,
        T: Timer<TIMER_HZ>,
        const TIMER_HZ: u32,
        const TX_SIZE: usize,
        const RX_SIZE: usize,
        const URC_CAPACITY: usize,
    > Spwfsa01<'urc_sub, A, T, TIMER_HZ, TX_SIZE, RX_SIZE, URC_CAPACITY>
{
    /// Creates a new driver. Client needs to be in timeout or blocking mode
    pub fn new(
        client: A,
        urc_subscription: UrcSubscription<'urc_sub, URCMessages, URC_CAPACITY, 1>,
        timer: T,
    ) -> Self {
        Self {
            client,
            urc_subscription,
            timer,
            session: Session::default(),
        }
    }

    /// Returns true if joined to an access point. Connection losses are also taken into account.
    pub fn is_joined(&mut self) -> bool {
        self.process_urc_messages();
        self.session.joined
    }

    /// Processes all pending messages in the queue
    pub(crate) fn process_urc_messages(&mut self) {
        while let Some(message) = self.urc_subscription.try_next_message_pure() {
            self.session.handle_urc(message);
        }
    }

    /// Restarts the module. All slots and the link state are reset.
    fn restart(&mut self) -> Result<(), DriverError> {
        self.process_urc_messages();
        self.session = Session::default();
        self.send_command(ResetCommand)?;
        Ok(())
    }

    /// Blocks until the given condition is met by the link state
    fn wait_for(
        &mut self,
        timeout_ms: u32,
        condition: fn(&Session) -> bool,
        timeout_error: DriverError,
    ) -> Result<(), DriverError> {
        self.process_urc_messages();
        if condition(&self.session) {
            return Ok(());
        }

        self.timer
            .start(TimerDurationU32::millis(timeout_ms))
            .map_err(|_| DriverError::TimerError)?;

        loop {
            self.process_urc_messages();
            if condition(&self.session) {
                return Ok(());
            }

            match self.timer.wait() {
                Ok(_) => return Err(timeout_error),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(_)) => return Err(DriverError::TimerError),
            }
        }
    }

    /// Sends a command and maps the error if the command failed
    pub(crate) fn send_command<Cmd: AtatCmd + CommandErrorHandler>(
        &mut self,
        command: Cmd,
    ) -> Result<Cmd::Response, DriverError> {
        self.client.send(&command).map_err(|error| command.command_error(error))
    }
}
