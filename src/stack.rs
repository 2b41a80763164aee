//! # Socket stack
//!
//! [NetworkStack] is the generic socket contract of the adapter. On top of it [TcpClientStack] and
//! [UdpClientStack] of [embedded_nal] are implemented.
//!
//! Sockets are opened without touching the module. A module slot is assigned by
//! [NetworkStack::socket_connect] and returned by [NetworkStack::socket_close].
//!
//! ## Example
//!
//! ````
//! # use core::str::FromStr;
//! # use core::net::SocketAddr;
//! # use spwf_at_nal::driver::Protocol;
//! # use spwf_at_nal::example::ExampleDriver;
//! # use spwf_at_nal::stack::NetworkStack;
//! # use spwf_at_nal::wifi::Adapter;
//! #
//! let mut adapter: Adapter<_> = Adapter::new(ExampleDriver::default());
//!
//! // Creating a TCP connection
//! let mut socket = adapter.socket_open(Protocol::Tcp).unwrap();
//! adapter.socket_connect(&mut socket, SocketAddr::from_str("10.0.0.1:21").unwrap()).unwrap();
//!
//! // Sending some data
//! assert_eq!(6, adapter.socket_send(&mut socket, b"hallo!").unwrap());
//!
//! // Receiving some data
//! let mut rx_buffer = [0x0; 64];
//! let length = adapter.socket_recv(&mut socket, &mut rx_buffer).unwrap();
//! assert_eq!(16, length);
//! assert_eq!(b"nice to see you!", &rx_buffer[..16]);
//!
//! // Closing socket
//! adapter.socket_close(socket).unwrap();
//! ````
use crate::driver::{Protocol, SpwfDriver, SERVER_SOCKET_ID};
use crate::error::NsapiError;
use crate::slots::SlotError;
use crate::wifi::Adapter;
use crate::{debug, warn};
use core::net::{Ipv4Addr, SocketAddr};
use embedded_nal::{TcpClientStack, UdpClientStack};

/// Callback signaling socket activity
pub type SocketCallback = fn();

/// Generic socket contract of a network stack
pub trait NetworkStack {
    /// Socket handle
    type Socket;

    /// Opens a new socket of the given protocol
    fn socket_open(&mut self, protocol: Protocol) -> Result<Self::Socket, NsapiError>;

    /// Closes the socket and frees the handle
    fn socket_close(&mut self, socket: Self::Socket) -> Result<(), NsapiError>;

    /// Binds the socket to the given local address
    fn socket_bind(&mut self, socket: &mut Self::Socket, address: SocketAddr) -> Result<(), NsapiError>;

    /// Starts listening for incoming connections
    fn socket_listen(&mut self, socket: &mut Self::Socket, backlog: usize) -> Result<(), NsapiError>;

    /// Connects the socket to the given remote
    fn socket_connect(&mut self, socket: &mut Self::Socket, address: SocketAddr) -> Result<(), NsapiError>;

    /// Accepts an incoming connection of a listening socket
    fn socket_accept(&mut self, server: &mut Self::Socket) -> Result<(Self::Socket, SocketAddr), NsapiError>;

    /// Sends data and returns the number of bytes accepted
    fn socket_send(&mut self, socket: &mut Self::Socket, data: &[u8]) -> Result<usize, NsapiError>;

    /// Receives data and returns the number of bytes written to buffer
    fn socket_recv(&mut self, socket: &mut Self::Socket, buffer: &mut [u8]) -> Result<usize, NsapiError>;

    /// Sends data to the given remote
    fn socket_sendto(&mut self, socket: &mut Self::Socket, address: SocketAddr, data: &[u8])
        -> Result<usize, NsapiError>;

    /// Receives a datagram
    fn socket_recvfrom(&mut self, socket: &mut Self::Socket, buffer: &mut [u8]) -> Result<usize, NsapiError>;

    /// Registers a callback for socket activity
    fn socket_attach(&mut self, socket: &mut Self::Socket, callback: Option<SocketCallback>);

    /// Returns the local IP address or None if not joined
    fn get_ip_address(&mut self) -> Option<Ipv4Addr>;
}

/// Handle of a socket, returned by [NetworkStack::socket_open] and consumed by [NetworkStack::socket_close]
#[derive(Debug, PartialEq, Eq)]
pub struct SocketHandle {
    /// Index of the socket record
    pub(crate) index: usize,
}

impl SocketHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self { index }
    }

    /// Index of the socket record, unique among open sockets
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Internal state of a single socket
#[derive(Copy, Clone, Debug)]
pub(crate) struct SocketRecord {
    /// Module slot, assigned on connect
    pub(crate) slot: Option<u8>,

    /// Local port requested by bind
    pub(crate) local_port: Option<u16>,

    pub(crate) protocol: Protocol,

    /// True after a successful connect
    pub(crate) connected: bool,

    /// Remote address given on connect
    pub(crate) remote: Option<SocketAddr>,
}

impl SocketRecord {
    fn new(protocol: Protocol) -> Self {
        Self {
            slot: None,
            local_port: None,
            protocol,
            connected: false,
            remote: None,
        }
    }
}

impl<D: SpwfDriver, const HANDLES: usize> NetworkStack for Adapter<D, HANDLES> {
    type Socket = SocketHandle;

    /// Allocates a socket record. No command is sent to the module.
    /// Returns [NsapiError::NoSocket] if all HANDLES are in use.
    fn socket_open(&mut self, protocol: Protocol) -> Result<SocketHandle, NsapiError> {
        let index = self
            .sockets
            .iter()
            .position(Option::is_none)
            .ok_or(NsapiError::NoSocket)?;

        self.sockets[index] = Some(SocketRecord::new(protocol));
        Ok(SocketHandle::new(index))
    }

    /// Closes the module slot of the socket (if connected) and frees the socket record.
    ///
    /// In case the module fails to close the slot, [NsapiError::DeviceError] is returned and the slot
    /// stays reserved. The socket record is freed in any case.
    fn socket_close(&mut self, socket: SocketHandle) -> Result<(), NsapiError> {
        let record = self
            .sockets
            .get_mut(socket.index)
            .and_then(Option::take)
            .ok_or(NsapiError::NoSocket)?;

        let Some(id) = record.slot else {
            return Ok(());
        };

        if self.driver.close(id).is_err() {
            warn!("Module failed to close slot {}", id);
            return Err(NsapiError::DeviceError);
        }

        if id == SERVER_SOCKET_ID {
            self.listening = false;
        } else {
            let owner = self.slots.release(id);
            debug_assert_eq!(Some(socket.index), owner);
        }

        debug!("Socket {} closed, released slot {}", socket.index, id);
        Ok(())
    }

    /// Just stores the requested port, binding is not supported by the module.
    fn socket_bind(&mut self, socket: &mut SocketHandle, address: SocketAddr) -> Result<(), NsapiError> {
        self.record_mut(socket)?.local_port = Some(address.port());
        Ok(())
    }

    fn socket_listen(&mut self, _socket: &mut SocketHandle, _backlog: usize) -> Result<(), NsapiError> {
        Err(NsapiError::Unsupported)
    }

    /// Opens a connection on the module and reserves the assigned slot.
    ///
    /// Returns [NsapiError::NoSocket] if the module assigns a slot outside of the socket table.
    fn socket_connect(&mut self, socket: &mut SocketHandle, address: SocketAddr) -> Result<(), NsapiError> {
        let record = *self.record(socket)?;
        if record.connected {
            return Err(NsapiError::IsConnected);
        }

        let Ok(id) = self.driver.open(record.protocol, address) else {
            warn!("Opening {:?} connection to port {} failed", record.protocol, address.port());
            return Err(NsapiError::DeviceError);
        };

        match self.slots.reserve(id, socket.index) {
            Ok(()) => {}
            Err(SlotError::OutOfRange) => {
                warn!("Module assigned slot {} outside of socket table", id);
                if id != SERVER_SOCKET_ID {
                    let _ = self.driver.close(id);
                }
                return Err(NsapiError::NoSocket);
            }
            Err(SlotError::AlreadyReserved) => {
                warn!("Module assigned slot {} which is already in use", id);
                return Err(NsapiError::DeviceError);
            }
        }

        let record = self.record_mut(socket)?;
        record.slot = Some(id);
        record.connected = true;
        record.remote = Some(address);

        debug!(
            "Socket {} connected on slot {} ({} slots in use)",
            socket.index,
            id,
            self.slots.reserved()
        );
        Ok(())
    }

    fn socket_accept(&mut self, _server: &mut SocketHandle) -> Result<(SocketHandle, SocketAddr), NsapiError> {
        Err(NsapiError::Unsupported)
    }

    /// Returns [NsapiError::NoConnection] if the socket is not connected.
    fn socket_send(&mut self, socket: &mut SocketHandle, data: &[u8]) -> Result<usize, NsapiError> {
        let id = self.connected_slot(socket)?;

        if self.driver.send(id, data).is_err() {
            warn!("Sending {} bytes on slot {} failed", data.len(), id);
            return Err(NsapiError::DeviceError);
        }

        Ok(data.len())
    }

    /// Returns [NsapiError::WouldBlock] if no data is pending and [NsapiError::NoConnection] if the
    /// socket is not connected or was closed by the remote side.
    fn socket_recv(&mut self, socket: &mut SocketHandle, buffer: &mut [u8]) -> Result<usize, NsapiError> {
        let id = self.connected_slot(socket)?;
        let length = self.driver.recv(id, buffer)?;
        Ok(length)
    }

    /// Connects the socket to the given address first, if not connected yet.
    fn socket_sendto(
        &mut self,
        socket: &mut SocketHandle,
        address: SocketAddr,
        data: &[u8],
    ) -> Result<usize, NsapiError> {
        if !self.record(socket)?.connected {
            self.socket_connect(socket, address)?;
        }

        self.socket_send(socket, data)
    }

    /// Same as [NetworkStack::socket_recv], the source address of datagrams is not tracked.
    fn socket_recvfrom(&mut self, socket: &mut SocketHandle, buffer: &mut [u8]) -> Result<usize, NsapiError> {
        self.socket_recv(socket, buffer)
    }

    /// Callbacks are not supported, the call is ignored.
    fn socket_attach(&mut self, _socket: &mut SocketHandle, _callback: Option<SocketCallback>) {}

    fn get_ip_address(&mut self) -> Option<Ipv4Addr> {
        self.driver.ip_address()
    }
}

impl<D: SpwfDriver, const HANDLES: usize> TcpClientStack for Adapter<D, HANDLES> {
    type TcpSocket = SocketHandle;
    type Error = NsapiError;

    fn socket(&mut self) -> Result<Self::TcpSocket, Self::Error> {
        self.socket_open(Protocol::Tcp)
    }

    fn connect(&mut self, socket: &mut Self::TcpSocket, remote: SocketAddr) -> nb::Result<(), Self::Error> {
        self.socket_connect(socket, remote).map_err(nb_error)
    }

    fn send(&mut self, socket: &mut Self::TcpSocket, buffer: &[u8]) -> nb::Result<usize, Self::Error> {
        self.socket_send(socket, buffer).map_err(nb_error)
    }

    fn receive(&mut self, socket: &mut Self::TcpSocket, buffer: &mut [u8]) -> nb::Result<usize, Self::Error> {
        self.socket_recv(socket, buffer).map_err(nb_error)
    }

    fn close(&mut self, socket: Self::TcpSocket) -> Result<(), Self::Error> {
        self.socket_close(socket)
    }
}

impl<D: SpwfDriver, const HANDLES: usize> UdpClientStack for Adapter<D, HANDLES> {
    type UdpSocket = SocketHandle;
    type Error = NsapiError;

    fn socket(&mut self) -> Result<Self::UdpSocket, Self::Error> {
        self.socket_open(Protocol::Udp)
    }

    fn connect(&mut self, socket: &mut Self::UdpSocket, remote: SocketAddr) -> Result<(), Self::Error> {
        self.socket_connect(socket, remote)
    }

    fn send(&mut self, socket: &mut Self::UdpSocket, buffer: &[u8]) -> nb::Result<(), Self::Error> {
        self.socket_send(socket, buffer).map_err(nb_error)?;
        Ok(())
    }

    /// Datagrams are reported as sent by the connected remote
    fn receive(
        &mut self,
        socket: &mut Self::UdpSocket,
        buffer: &mut [u8],
    ) -> nb::Result<(usize, SocketAddr), Self::Error> {
        let remote = self
            .record(socket)?
            .remote
            .ok_or(nb::Error::Other(NsapiError::NoConnection))?;

        let length = self.socket_recvfrom(socket, buffer).map_err(nb_error)?;
        Ok((length, remote))
    }

    fn close(&mut self, socket: Self::UdpSocket) -> Result<(), Self::Error> {
        self.socket_close(socket)
    }
}

impl<D: SpwfDriver, const HANDLES: usize> Adapter<D, HANDLES> {
    /// Returns true if the socket was successfully connected
    pub fn is_socket_connected(&self, socket: &SocketHandle) -> bool {
        self.record(socket).map(|record| record.connected).unwrap_or(false)
    }

    /// Returns the module slot assigned to the socket
    pub fn socket_slot(&self, socket: &SocketHandle) -> Option<u8> {
        self.record(socket).ok().and_then(|record| record.slot)
    }

    /// Returns the protocol of the socket
    pub fn socket_protocol(&self, socket: &SocketHandle) -> Option<Protocol> {
        self.record(socket).ok().map(|record| record.protocol)
    }

    /// Returns the local port requested by [NetworkStack::socket_bind]
    pub fn bound_port(&self, socket: &SocketHandle) -> Option<u16> {
        self.record(socket).ok().and_then(|record| record.local_port)
    }

    fn record(&self, socket: &SocketHandle) -> Result<&SocketRecord, NsapiError> {
        self.sockets
            .get(socket.index)
            .and_then(Option::as_ref)
            .ok_or(NsapiError::NoSocket)
    }

    fn record_mut(&mut self, socket: &SocketHandle) -> Result<&mut SocketRecord, NsapiError> {
        self.sockets
            .get_mut(socket.index)
            .and_then(Option::as_mut)
            .ok_or(NsapiError::NoSocket)
    }

    /// Returns the slot of a connected socket
    fn connected_slot(&self, socket: &SocketHandle) -> Result<u8, NsapiError> {
        self.record(socket)?.slot.ok_or(NsapiError::NoConnection)
    }
}

/// Maps [NsapiError::WouldBlock] to [nb::Error::WouldBlock]
fn nb_error(error: NsapiError) -> nb::Error<NsapiError> {
    match error {
        NsapiError::WouldBlock => nb::Error::WouldBlock,
        other => nb::Error::Other(other),
    }
}
