//! Stream connections to a responder
//!
//! A host that looks like a filesystem path is taken to be a Unix domain
//! socket; anything else is resolved and dialed over TCP.
//!
//! SO_REUSEADDR is left unset. It only matters for sockets that bind a local
//! address, and these connections never do.

use config::FastCgiConfig;
use errors::{Error, Result};

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

/// One open stream to a responder
///
/// The socket is closed when this is dropped.
#[derive(Debug)]
pub enum Connection {
    Tcp(TcpStream),
    Unix(UnixStream)
}

/// Whether `host` names a Unix domain socket rather than a network host
pub fn is_socket_path(host: &str) -> bool {
    host.starts_with('/')
}

impl Connection {
    /// Opens a connection as described by `config`
    pub fn establish(config: &FastCgiConfig) -> Result<Connection> {
        let conn = if is_socket_path(&config.host) {
            Connection::unix(&config.host)
        }
        else {
            Connection::tcp(&config.host, config.port,
                            config.connect_timeout)
        };

        match conn {
            Ok(c) => {
                c.set_read_timeout(config.read_timeout)
                    .map_err(Error::Connect)?;
                Ok(c)
            },
            Err(e) => {
                error!("Couldn't connect to FastCGI responder at {}: {}",
                       describe(config), e);
                Err(Error::Connect(e))
            }
        }
    }

    fn unix<P: AsRef<Path>>(path: P) -> io::Result<Connection> {
        UnixStream::connect(path).map(Connection::Unix)
    }

    /// Tries each address `host` resolves to in turn
    fn tcp(host: &str, port: u16, timeout: Duration)
           -> io::Result<Connection>
    {
        let mut last_error = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(Connection::Tcp(stream)),
                Err(e) => {
                    debug!("Connecting to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} resolved to no addresses", host))))
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match *self {
            Connection::Tcp(ref s) => s.set_read_timeout(timeout),
            Connection::Unix(ref s) => s.set_read_timeout(timeout)
        }
    }

    /// Sends the whole buffer
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        self.flush()?;
        Ok(())
    }

    /// A single read of at most `max` bytes; may come back short
    pub fn receive(&mut self, max: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0; max];
        let read = self.read(&mut buffer)?;
        buffer.truncate(read);
        Ok(buffer)
    }

    /// Closes both directions; dropping the connection does this too.
    pub fn close(&self) {
        let result = match *self {
            Connection::Tcp(ref s) => s.shutdown(Shutdown::Both),
            Connection::Unix(ref s) => s.shutdown(Shutdown::Both)
        };

        if let Err(e) = result {
            if e.kind() != io::ErrorKind::NotConnected {
                debug!("Error shutting down connection: {}", e);
            }
        }
    }
}

/// Renders the responder's address for log messages
pub fn describe(config: &FastCgiConfig) -> String {
    if is_socket_path(&config.host) {
        format!("unix:{}", config.host)
    }
    else {
        format!("{}:{}", config.host, config.port)
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match *self {
            Connection::Tcp(ref mut s) => s.read(buf),
            Connection::Unix(ref mut s) => s.read(buf)
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match *self {
            Connection::Tcp(ref mut s) => s.write(buf),
            Connection::Unix(ref mut s) => s.write(buf)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match *self {
            Connection::Tcp(ref mut s) => s.flush(),
            Connection::Unix(ref mut s) => s.flush()
        }
    }
}
