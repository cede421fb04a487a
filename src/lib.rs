//! A client for the FastCGI protocol.
//!
//! Connects to a FastCGI responder over TCP or a Unix domain socket, sends
//! it one request as a stream of records, and collects the records it sends
//! back into a `Response`:
//!
//! ```no_run
//! use fcgi_client::{Client, FastCgiConfig};
//!
//! let client = Client::new(FastCgiConfig::default());
//! let response = client.request(&[("SCRIPT_FILENAME", "/srv/www/index.php"),
//!                                 ("REQUEST_METHOD", "GET")],
//!                               b"").unwrap();
//!
//! if response.is_success() {
//!     print!("{}", response.stdout);
//! }
//! ```
//!
//! A request is considered failed if the responder closes the connection
//! before ending the request, writes anything to its error stream, stops
//! answering within the read timeout or sends an `END_REQUEST` that can't be
//! decoded. The output gathered so far is still handed back.

extern crate byteorder;
#[macro_use] extern crate log;
extern crate nom;
extern crate rand;
extern crate toml;

#[cfg(test)] extern crate tempfile;

pub mod cgi;
pub mod config;
pub mod errors;
pub mod fastcgi;
mod log_util;

pub use config::{Config, FastCgiConfig};
pub use errors::{Error, Result};
pub use fastcgi::driver::{Client, Response};
pub use fastcgi::registry::{RequestState, Failure};
