use crate::urc::URCMessages;
use atat::digest::ParseError;
use atat::{AtatUrc, Parser};
use core::net::Ipv4Addr;

fn parse(message: &[u8]) -> Option<URCMessages> {
    <URCMessages as AtatUrc>::parse(message)
}

#[test]
fn test_console_active() {
    assert_eq!(Some(URCMessages::ConsoleActive), parse(b"+WIND:0:Console active\r\n"));
}

#[test]
fn test_hardware_started() {
    assert_eq!(Some(URCMessages::HardwareStarted), parse(b"+WIND:32:WiFi Hardware Started\r\n"));
}

#[test]
fn test_wifi_up() {
    assert_eq!(
        Some(URCMessages::WifiUp(Ipv4Addr::new(192, 168, 1, 100))),
        parse(b"+WIND:24:WiFi Up:192.168.1.100\r\n")
    );
}

#[test]
fn test_wifi_up_invalid_address() {
    assert_eq!(None, parse(b"+WIND:24:WiFi Up:192.168.1\r\n"));
    assert_eq!(None, parse(b"+WIND:24:WiFi Up\r\n"));
}

#[test]
fn test_network_lost() {
    assert_eq!(Some(URCMessages::NetworkLost), parse(b"+WIND:33:WiFi Network Lost\r\n"));
}

#[test]
fn test_deauthenticated() {
    assert_eq!(Some(URCMessages::Deauthenticated), parse(b"+WIND:41:WiFi Deauthentication:8\r\n"));
}

#[test]
fn test_pending_data() {
    assert_eq!(
        Some(URCMessages::PendingData(2, 512)),
        parse(b"+WIND:55:Pending Data:2:512\r\n")
    );
}

#[test]
fn test_socket_closed() {
    assert_eq!(Some(URCMessages::SocketClosed(3)), parse(b"+WIND:58:Socket Closed:3\r\n"));
}

#[test]
fn test_unknown_number() {
    assert_eq!(Some(URCMessages::Unknown), parse(b"+WIND:1:Poweron (150410-c2e37a3-SPWF01S)\r\n"));
    assert_eq!(Some(URCMessages::Unknown), parse(b"+WIND:19:WiFi Join:00:80:E1:B8:4B:5C\r\n"));
}

#[test]
fn test_malformed() {
    assert_eq!(None, parse(b"+WIND:abc:Console active\r\n"));
    assert_eq!(None, parse(b"+WIND:\r\n"));
    assert_eq!(None, parse(b"OK\r\n"));
    assert_eq!(None, parse(&[0xff, 0xfe]));
}

#[test]
fn test_parser_complete_line() {
    let buffer = b"+WIND:0:Console active\r\nAT\r\n";

    let (line, length) = <URCMessages as Parser>::parse(buffer).unwrap();

    assert_eq!(b"+WIND:0:Console active\r\n", line);
    assert_eq!(24, length);
}

#[test]
fn test_parser_leading_line_breaks() {
    let buffer = b"\r\n+WIND:58:Socket Closed:1\r\n";

    let (line, length) = <URCMessages as Parser>::parse(buffer).unwrap();

    assert_eq!(b"+WIND:58:Socket Closed:1\r\n", line);
    assert_eq!(buffer.len(), length);
}

#[test]
fn test_parser_incomplete() {
    assert!(matches!(<URCMessages as Parser>::parse(b"\r\n"), Err(ParseError::Incomplete)));
    assert!(matches!(<URCMessages as Parser>::parse(b"+WI"), Err(ParseError::Incomplete)));
    assert!(matches!(
        <URCMessages as Parser>::parse(b"+WIND:24:WiFi Up:19"),
        Err(ParseError::Incomplete)
    ));
}

#[test]
fn test_parser_no_match() {
    assert!(matches!(<URCMessages as Parser>::parse(b"OK\r\n"), Err(ParseError::NoMatch)));
    assert!(matches!(<URCMessages as Parser>::parse(b" ID: 00\r\n"), Err(ParseError::NoMatch)));
    assert!(matches!(<URCMessages as Parser>::parse(b"+CME"), Err(ParseError::NoMatch)));
}
