pub mod parser;

use std::time::Duration;

/// A holder for app configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub fcgi: FastCgiConfig
}

#[derive(Debug, Clone)]
pub struct FastCgiConfig {
    /// Host name or address, or a filesystem path to a Unix domain socket
    pub host: String,
    /// Ignored for Unix domain sockets
    pub port: u16,
    pub connect_timeout: Duration,
    /// How long a single read may block; forever if `None`
    pub read_timeout: Option<Duration>,
    /// Ask the responder to keep the connection open after the request
    pub keep_alive: bool
}

impl Default for FastCgiConfig {
    fn default() -> FastCgiConfig {
        FastCgiConfig {
            host: String::from("127.0.0.1"),
            port: 9000,
            connect_timeout: Duration::from_secs(3),
            read_timeout: None,
            keep_alive: false
        }
    }
}
