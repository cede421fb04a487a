//! The FastCGI 1.0 wire protocol, client side

pub mod driver;
pub mod parser;
pub mod registry;
pub mod serializer;
pub mod transport;

/// The only protocol version there is
pub const VERSION: u8 = 1;

/// Size of a record header on the wire
pub const HEADER_LENGTH: usize = 8;

/// Largest content a single record can carry
pub const MAX_CONTENT_LENGTH: usize = 0xFFFF;

/// The fixed-size prefix of every record
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Header {
    pub version: u8,
    pub kind: u8,
    pub id: u16,
    pub content_length: u16,
    pub padding_length: u8,
    pub reserved: u8
}

/// A record read off the wire, padding already discarded
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Record {
    pub kind: u8,
    pub id: u16,
    pub content: Vec<u8>
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct NameValuePair {
    pub name: Vec<u8>,
    pub value: Vec<u8>
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BeginRequest {
    pub role: Role,
    pub flags: u8
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct EndRequest {
    pub app_status: i32,
    pub protocol_status: u8
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Role {
    Responder,
    Authorizer,
    Filter
}

impl Role {
    /// Returns the protocol's number for this role
    pub fn to_protocol_number(self) -> u16 {
        match self {
            Role::Responder => 1,
            Role::Authorizer => 2,
            Role::Filter => 3
        }
    }
}

pub mod flags {
    pub const KEEP_CONN: u8 = 1;
}

pub mod record_kind {
    pub const BEGIN_REQUEST: u8 = 1;
    pub const ABORT_REQUEST: u8 = 2;
    pub const END_REQUEST: u8 = 3;
    pub const PARAMS: u8 = 4;
    pub const STDIN: u8 = 5;
    pub const STDOUT: u8 = 6;
    pub const STDERR: u8 = 7;
    pub const DATA: u8 = 8;
    pub const GET_VALUES: u8 = 9;
    pub const GET_VALUES_RESULT: u8 = 10;
    pub const UNKNOWN_TYPE: u8 = 11;
}

pub mod protocol_status {
    pub const REQUEST_COMPLETE: u8 = 0;
    pub const CANT_MPX_CONN: u8 = 1;
    pub const OVERLOADED: u8 = 2;
    pub const UNKNOWN_ROLE: u8 = 3;
}
