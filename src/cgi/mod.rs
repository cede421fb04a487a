//! Process CGI/1.1 response documents
//!
//! A Responder's `FCGI_STDOUT` stream is a CGI/1.1 response: header lines, a
//! blank line, then the body.

pub mod parser;

/// A status line
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Status {
    pub code: u16,
    pub reason_phrase: Vec<u8>
}

/// Other headers
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Header {
    pub name: Vec<u8>,
    pub content: Vec<u8>
}

/// A response document split into its parts
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Document {
    pub status: Option<Status>,
    pub content_type: Option<Vec<u8>>,
    pub headers: Vec<Header>,
    pub body: Vec<u8>
}

impl Document {
    /// The status code, defaulting to 200 when the script didn't send one
    pub fn status_code(&self) -> u16 {
        self.status.as_ref().map_or(200, |s| s.code)
    }
}
