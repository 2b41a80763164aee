use crate::driver::{MacAddress, PrivacyMode, Protocol, RecvError, SpwfDriver};
use crate::urc::URCMessages;
use alloc::collections::VecDeque;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use atat::blocking::AtatClient;
use atat::{AtatCmd, AtatUrc, Error as AtError};
use core::net::{Ipv4Addr, SocketAddr};
use core::str::FromStr;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher};
use fugit::{TimerDurationU32, TimerInstantU32};
use fugit_timer::Timer as FugitTimer;
use mockall::mock;

/// Calls received by [MockDriver]
#[derive(Clone, Debug, PartialEq)]
pub enum DriverCall {
    Startup,
    Connect(String, Option<String>, PrivacyMode),
    Disconnect,
    Open(Protocol, SocketAddr),
    Close(u8),
    Send(u8, Vec<u8>),
    Recv(u8),
    IpAddress,
    MacAddress,
}

/// Custom mock for [SpwfDriver], as mockall crate is not supporting references nested in
/// arguments like `Option<&str>`
///
/// Mocked results get returned in the same order as inserted. If no result is queued, the call succeeds.
#[derive(Default)]
pub struct MockDriver {
    calls: Vec<DriverCall>,
    startup_results: VecDeque<Result<(), u32>>,
    connect_results: VecDeque<Result<(), u32>>,
    disconnect_results: VecDeque<Result<(), u32>>,
    open_results: VecDeque<Result<u8, u32>>,
    close_results: VecDeque<Result<(), u32>>,
    send_results: VecDeque<Result<(), u32>>,

    /// Received data or error, WouldBlock if empty
    recv_results: VecDeque<Result<Vec<u8>, RecvError>>,

    ip: Option<Ipv4Addr>,
    mac: Option<MacAddress>,
}

impl SpwfDriver for MockDriver {
    type Error = u32;

    fn startup(&mut self) -> Result<(), u32> {
        self.calls.push(DriverCall::Startup);
        self.startup_results.pop_front().unwrap_or(Ok(()))
    }

    fn connect(&mut self, ssid: &str, passphrase: Option<&str>, mode: PrivacyMode) -> Result<(), u32> {
        self.calls.push(DriverCall::Connect(
            ssid.to_string(),
            passphrase.map(|key| key.to_string()),
            mode,
        ));
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    fn disconnect(&mut self) -> Result<(), u32> {
        self.calls.push(DriverCall::Disconnect);
        self.disconnect_results.pop_front().unwrap_or(Ok(()))
    }

    fn open(&mut self, protocol: Protocol, remote: SocketAddr) -> Result<u8, u32> {
        self.calls.push(DriverCall::Open(protocol, remote));
        self.open_results.pop_front().unwrap_or(Ok(0))
    }

    fn close(&mut self, id: u8) -> Result<(), u32> {
        self.calls.push(DriverCall::Close(id));
        self.close_results.pop_front().unwrap_or(Ok(()))
    }

    fn send(&mut self, id: u8, data: &[u8]) -> Result<(), u32> {
        self.calls.push(DriverCall::Send(id, data.to_vec()));
        self.send_results.pop_front().unwrap_or(Ok(()))
    }

    fn recv(&mut self, id: u8, buffer: &mut [u8]) -> Result<usize, RecvError> {
        self.calls.push(DriverCall::Recv(id));
        let data = self.recv_results.pop_front().unwrap_or(Err(RecvError::WouldBlock))?;

        buffer[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    fn ip_address(&mut self) -> Option<Ipv4Addr> {
        self.calls.push(DriverCall::IpAddress);
        self.ip
    }

    fn mac_address(&mut self) -> Option<MacAddress> {
        self.calls.push(DriverCall::MacAddress);
        self.mac.clone()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_startup_result(&mut self, result: Result<(), u32>) {
        self.startup_results.push_back(result);
    }

    pub fn add_connect_result(&mut self, result: Result<(), u32>) {
        self.connect_results.push_back(result);
    }

    pub fn add_disconnect_result(&mut self, result: Result<(), u32>) {
        self.disconnect_results.push_back(result);
    }

    pub fn add_open_result(&mut self, result: Result<u8, u32>) {
        self.open_results.push_back(result);
    }

    pub fn add_close_result(&mut self, result: Result<(), u32>) {
        self.close_results.push_back(result);
    }

    pub fn add_send_result(&mut self, result: Result<(), u32>) {
        self.send_results.push_back(result);
    }

    /// Simulates received data
    pub fn add_recv_data(&mut self, data: &[u8]) {
        self.recv_results.push_back(Ok(data.to_vec()));
    }

    /// Simulates a recv status by its legacy code (-1, -2, -3)
    pub fn add_recv_code(&mut self, code: i32) {
        let error = match code {
            -1 => RecvError::WouldBlock,
            -2 => RecvError::Device,
            -3 => RecvError::Closed,
            _ => panic!("Unknown recv code {}", code),
        };
        self.recv_results.push_back(Err(error));
    }

    pub fn set_ip_address(&mut self, ip: Ipv4Addr) {
        self.ip = Some(ip);
    }

    pub fn set_mac_address(&mut self, mac: &str) {
        self.mac = Some(MacAddress::from_str(mac).unwrap());
    }

    /// Returns a copy of the received calls
    pub fn get_calls(&self) -> Vec<DriverCall> {
        self.calls.clone()
    }

    /// Returns the number of calls matching the given predicate
    pub fn count_calls(&self, predicate: impl Fn(&DriverCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }
}

/// Mocked command sent by [MockAtatClient]
pub struct MockedCommand {
    /// Expected encoded command, not asserted if None
    command: Option<&'static [u8]>,

    /// Raw response or error
    response: Result<&'static [u8], AtError>,

    /// URC messages published when the command gets sent
    urc_messages: &'static [&'static [u8]],
}

impl MockedCommand {
    /// Command responded by OK
    pub fn ok(command: Option<&'static [u8]>, urc_messages: Option<&'static [&'static [u8]]>) -> Self {
        Self::response(command, b"", urc_messages)
    }

    /// Command responded by the given response lines
    pub fn response(
        command: Option<&'static [u8]>,
        response: &'static [u8],
        urc_messages: Option<&'static [&'static [u8]]>,
    ) -> Self {
        Self {
            command,
            response: Ok(response),
            urc_messages: urc_messages.unwrap_or(&[]),
        }
    }

    /// Command responded by ERROR
    pub fn error(command: Option<&'static [u8]>, urc_messages: Option<&'static [&'static [u8]]>) -> Self {
        Self {
            command,
            response: Err(AtError::Error),
            urc_messages: urc_messages.unwrap_or(&[]),
        }
    }
}

/// Custom mock for [AtatClient], as mockall crate is currently not supporting the trait structure
/// due to generic closure (s. [https://github.com/asomers/mockall/issues/217]
pub struct MockAtatClient<'a> {
    /// URC publisher used for mocking URC messages
    urc_publisher: Publisher<'a, CriticalSectionRawMutex, URCMessages, 16, 1, 1>,

    /// Expected commands which get processed in the same order as inserted
    expected: VecDeque<MockedCommand>,

    /// Sent (encoded) commands
    commands: Vec<Vec<u8>>,
}

impl AtatClient for MockAtatClient<'_> {
    fn send<Cmd: AtatCmd>(&mut self, cmd: &Cmd) -> Result<Cmd::Response, AtError> {
        let mut buffer = vec![0x0; Cmd::MAX_LEN];
        let length = cmd.write(&mut buffer);
        buffer.truncate(length);
        self.commands.push(buffer.clone());

        let encoded = String::from_utf8_lossy(&buffer).to_string();
        let mocked = self
            .expected
            .pop_front()
            .unwrap_or_else(|| panic!("Unexpected command {:?}", encoded));

        if let Some(command) = mocked.command {
            assert_eq!(String::from_utf8_lossy(command), encoded);
        }

        for message in mocked.urc_messages {
            self.publish_urc(message);
        }

        cmd.parse(Ok(mocked.response?))
    }
}

impl<'a> MockAtatClient<'a> {
    pub fn new(channel: &'a PubSubChannel<CriticalSectionRawMutex, URCMessages, 16, 1, 1>) -> Self {
        Self {
            urc_publisher: channel.publisher().unwrap(),
            expected: VecDeque::new(),
            commands: vec![],
        }
    }

    /// Adds a mocked command
    pub fn add_response(&mut self, command: MockedCommand) {
        self.expected.push_back(command);
    }

    /// Publishes the given URC message
    pub fn add_urc_message(&mut self, message: &[u8]) {
        self.publish_urc(message);
    }

    /// Asserts that all mocked commands were sent
    pub fn assert_all_cmds_sent(&self) {
        assert!(self.expected.is_empty(), "{} mocked commands not sent", self.expected.len());
    }

    /// Returns a copy of the sent commands
    pub fn get_commands_as_strings(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|command| String::from_utf8_lossy(command).to_string())
            .collect()
    }

    fn publish_urc(&mut self, message: &[u8]) {
        let message = <URCMessages as AtatUrc>::parse(message).unwrap();
        self.urc_publisher.try_publish(message).unwrap();
    }
}

mock! {
    pub Timer{}

    impl FugitTimer<1_000_000> for Timer {
        type Error = u32;

        fn now(&mut self) -> TimerInstantU32<1000000>;
        fn start(&mut self, duration: TimerDurationU32<1000000>) -> Result<(), u32>;
        fn cancel(&mut self) -> Result<(), u32>;
        fn wait(&mut self) -> nb::Result<(), u32>;
    }
}

impl MockTimer {
    /// Short hand helper for returning a milliseconds duration
    pub fn duration_ms(duration: u32) -> TimerDurationU32<1_000_000> {
        TimerDurationU32::millis(duration)
    }
}
