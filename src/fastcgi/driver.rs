//! A driver for FastCGI requests
//!
//! Every call to `Client::request` gets its own `Exchange`: a fresh
//! connection plus the registry that tracks the request while its records
//! come back. Nothing is shared between calls, so a `Client` can be used
//! from several threads at once.

use cgi::Document;
use cgi::parser::document;
use config::FastCgiConfig;
use errors::{Result, Error};
use fastcgi::{Role, record_kind, protocol_status};
use fastcgi::parser::{read_record, end_request};
use fastcgi::registry::{Registry, RequestRecord, RequestState, Failure};
use fastcgi::serializer::*;
use fastcgi::transport::{self, Connection};
use log_util::*;

use std::io;

/// A client for a single FastCGI responder
#[derive(Debug, Clone)]
pub struct Client {
    config: FastCgiConfig
}

impl Client {
    pub fn new(config: FastCgiConfig) -> Client {
        Client { config: config }
    }

    /// Runs one request against the responder, blocking until it finishes.
    ///
    /// `Err` means we couldn't connect, or couldn't encode the request. Once
    /// the request is on its way every outcome is a `Response`: a responder
    /// that hangs up early, writes to its error stream, times out or sends a
    /// broken `END_REQUEST` leaves the response in an error state, with
    /// whatever output arrived before that.
    pub fn request(&self, params: &[(&str, &str)], body: &[u8])
                   -> Result<Response>
    {
        let mut exchange = Exchange::open(&self.config)?;
        let request = exchange.encode_request(params, body,
                                              self.config.keep_alive)?;

        if let Err(e) = exchange.send_request(&request) {
            exchange.fail(e)?;
        }

        exchange.finish()
    }
}

/// One request's worth of conversation with the responder
struct Exchange {
    conn: Connection,
    registry: Registry,
    request_id: u16
}

impl Exchange {
    fn open(config: &FastCgiConfig) -> Result<Exchange> {
        let conn = Connection::establish(config)?;
        let mut registry = Registry::new();
        let request_id = registry.register();

        debug!("Opened connection to {} for request {}",
               transport::describe(config), request_id);

        Ok(Exchange {
            conn: conn,
            registry: registry,
            request_id: request_id
        })
    }

    /// Lays out the begin, params and stdin records back to back
    fn encode_request(&self, params_in: &[(&str, &str)], body: &[u8],
                      keep_alive: bool)
                      -> Result<Vec<u8>>
    {
        let mut request = Vec::with_capacity(64 + body.len());

        begin_request(&mut request, self.request_id, Role::Responder,
                      keep_alive)?;
        params(&mut request, self.request_id, params_in)?;
        stdin(&mut request, self.request_id, body)?;

        debug!("Encoded request {}: {} params, {} byte body, {} bytes total",
               self.request_id, params_in.len(), body.len(), request.len());

        Ok(request)
    }

    /// Sends the request in one write, then drains the reply
    fn send_request(&mut self, request: &[u8]) -> Result<()> {
        self.conn.send(request)?;
        self.wait_for_response()
    }

    /// Reads records until the request ends or the stream does
    fn wait_for_response(&mut self) -> Result<()> {
        loop {
            let record = match read_record(&mut self.conn)? {
                Some(r) => r,
                None => {
                    warn!("Responder closed the stream before ending request {}",
                          self.request_id);
                    if let Some(request) = self.registry.get_mut(self.request_id) {
                        request.stream_closed();
                    }
                    return Ok(());
                }
            };

            let request = match self.registry.get_mut(record.id) {
                Some(request) => request,
                None => {
                    warn!("Found a record for request {}; this is request {}",
                          record.id, self.request_id);
                    continue;
                }
            };

            match record.kind {
                record_kind::END_REQUEST => {
                    let end = match end_request(&record.content) {
                        Ok((_, end)) => end,
                        Err(_) => {
                            warn!("Malformed END_REQUEST body: \"{}\"",
                                  ascii_escape(&record.content));
                            return Err(Error::MalformedRecord);
                        }
                    };

                    if end.protocol_status != protocol_status::REQUEST_COMPLETE {
                        warn!("Got protocol status {}, expected 0",
                              end.protocol_status);
                    }
                    if end.app_status != 0 {
                        info!("Responder finished request {} with code {}",
                              record.id, end.app_status);
                    }

                    request.finish(end);
                    return Ok(());
                },
                record_kind::STDERR => {
                    warn!("Error from responder: \"{}\"",
                          ascii_escape(&record.content));
                    request.append_stderr(&record.content);
                },
                record_kind::STDOUT => request.append_stdout(&record.content),
                other => debug!("Ignoring record of kind {}", other)
            }
        }
    }

    /// Puts the request in an error state after the conversation broke
    /// down. Errors that don't come from the conversation are passed back.
    fn fail(&mut self, error: Error) -> Result<()> {
        let failure = match error {
            Error::Io(ref e) => Failure::Io(e.kind()),
            Error::MalformedRecord => Failure::Malformed,
            other => return Err(other)
        };

        warn!("Request {} failed: {}", self.request_id, error);
        if let Some(request) = self.registry.get_mut(self.request_id) {
            request.fail(failure);
        }
        Ok(())
    }

    /// Hands back what the request accumulated
    fn finish(&mut self) -> Result<Response> {
        self.registry.remove(self.request_id)
            .map(Response::from)
            .ok_or(Error::UnknownRequest(self.request_id))
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        self.conn.close();
    }
}

/// The outcome of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: u16,
    pub state: RequestState,
    pub stdout: String,
    pub stderr: String,
    /// Only meaningful once the responder ended the request
    pub app_status: Option<i32>,
    pub protocol_status: Option<u8>
}

impl From<RequestRecord> for Response {
    fn from(record: RequestRecord) -> Response {
        Response {
            id: record.id,
            state: record.state,
            stdout: String::from_utf8_lossy(&record.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&record.stderr).into_owned(),
            app_status: record.end.map(|e| e.app_status),
            protocol_status: record.end.map(|e| e.protocol_status)
        }
    }
}

impl Response {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.state == RequestState::Success
    }

    /// Turns an error state into the matching error, keeping stdout otherwise
    pub fn into_result(self) -> Result<String> {
        match self.state {
            RequestState::Success => Ok(self.stdout),
            RequestState::Error(Failure::Application) =>
                Err(Error::Application(self.stderr)),
            RequestState::Error(Failure::Io(kind)) =>
                Err(Error::Io(io::Error::from(kind))),
            RequestState::Error(Failure::Malformed) =>
                Err(Error::MalformedRecord),
            RequestState::Error(Failure::StreamClosed) |
            RequestState::Send => Err(Error::StreamClosed)
        }
    }

    /// Parses stdout as a CGI response document
    pub fn document(&self) -> Option<Document> {
        document(self.stdout.as_bytes())
    }
}
