//! Error handling for the FastCGI client

use std::error;
use std::fmt;
use std::io;

/// A Result for internal operations.
pub type Result<T> = ::std::result::Result<T, Error>;

/// All errors which might arise within the client
#[derive(Debug)]
pub enum Error {
    /// Couldn't reach the responder at all
    Connect(io::Error),
    Io(io::Error),
    Serialization(SerializationError),
    /// The responder sent bytes we can't make sense of as a record
    MalformedRecord,
    /// The responder hung up before sending an `END_REQUEST`
    StreamClosed,
    /// The responder wrote to its error stream
    Application(String),
    /// No request with this id was registered
    UnknownRequest(u16)
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SerializationError {
    TooLong
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<SerializationError> for Error {
    fn from(e: SerializationError) -> Error {
        Error::Serialization(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Connect(ref e) =>
                write!(f, "couldn't connect to the FastCGI responder: {}", e),
            Error::Io(ref e) => write!(f, "I/O error: {}", e),
            Error::Serialization(SerializationError::TooLong) =>
                write!(f, "content too long for a FastCGI record"),
            Error::MalformedRecord =>
                write!(f, "the responder sent a malformed record"),
            Error::StreamClosed =>
                write!(f, "the responder closed the connection mid-request"),
            Error::Application(ref msg) =>
                write!(f, "the responder reported an error: {}", msg),
            Error::UnknownRequest(id) =>
                write!(f, "no request with id {} is registered", id)
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Connect(ref e) | Error::Io(ref e) => Some(e),
            _ => None
        }
    }
}
