//! Bookkeeping for in-flight requests, keyed by request id

use fastcgi::EndRequest;

use rand::Rng;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io;

/// Where a request is in its lifecycle
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RequestState {
    /// Sent, and waiting on the responder
    Send,
    Success,
    Error(Failure)
}

/// Why a request ended up in the error state
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Failure {
    /// The stream closed before an `END_REQUEST` arrived
    StreamClosed,
    /// The responder wrote to `FCGI_STDERR`
    Application,
    /// Reading or writing the connection failed, or a read timed out
    Io(io::ErrorKind),
    /// The responder sent an `END_REQUEST` we couldn't decode
    Malformed
}

/// Everything accumulated for one request.
///
/// Output is kept as raw bytes; a multi-byte character may be split across
/// records.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub id: u16,
    pub state: RequestState,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Present once an `END_REQUEST` has been seen
    pub end: Option<EndRequest>
}

impl RequestRecord {
    fn new(id: u16) -> RequestRecord {
        RequestRecord {
            id: id,
            state: RequestState::Send,
            stdout: Vec::new(),
            stderr: Vec::new(),
            end: None
        }
    }

    pub fn append_stdout(&mut self, content: &[u8]) {
        self.stdout.extend_from_slice(content);
    }

    /// Error output doesn't stop the request; it only flags it.
    pub fn append_stderr(&mut self, content: &[u8]) {
        if self.state == RequestState::Send {
            self.state = RequestState::Error(Failure::Application);
        }
        self.stderr.extend_from_slice(content);
    }

    /// Records the responder's statuses. A request already flagged as failed
    /// stays failed.
    pub fn finish(&mut self, end: EndRequest) {
        self.end = Some(end);
        if self.state == RequestState::Send {
            self.state = RequestState::Success;
        }
    }

    pub fn stream_closed(&mut self) {
        self.fail(Failure::StreamClosed);
    }

    /// Overrides whatever state the request was in
    pub fn fail(&mut self, failure: Failure) {
        self.state = RequestState::Error(failure);
    }
}

/// Live requests by id
#[derive(Debug, Default)]
pub struct Registry {
    requests: HashMap<u16, RequestRecord>
}

impl Registry {
    pub fn new() -> Registry {
        Registry { requests: HashMap::new() }
    }

    /// Picks a random nonzero id no live request is using, and registers a
    /// fresh request under it.
    pub fn register(&mut self) -> u16 {
        let mut rng = ::rand::rng();
        loop {
            let id: u16 = rng.random_range(1..=u16::max_value());
            if let Entry::Vacant(e) = self.requests.entry(id) {
                e.insert(RequestRecord::new(id));
                return id;
            }
        }
    }

    pub fn get(&self, id: u16) -> Option<&RequestRecord> {
        self.requests.get(&id)
    }

    pub fn get_mut(&mut self, id: u16) -> Option<&mut RequestRecord> {
        self.requests.get_mut(&id)
    }

    pub fn remove(&mut self, id: u16) -> Option<RequestRecord> {
        self.requests.remove(&id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn register_assigns_distinct_nonzero_ids() {
        let mut registry = Registry::new();
        let mut ids: Vec<u16> = (0..200).map(|_| registry.register()).collect();

        assert!(ids.iter().all(|&id| id != 0));
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert!(ids.iter().all(|&id| registry.get(id).is_some()));
    }

    #[test]
    fn new_requests_start_in_send() {
        let mut registry = Registry::new();
        let id = registry.register();
        let request = registry.get(id).unwrap();

        assert_eq!(request.id, id);
        assert_eq!(request.state, RequestState::Send);
        assert!(request.stdout.is_empty());
        assert!(request.end.is_none());
    }

    #[test]
    fn stderr_flags_but_end_still_records_status() {
        let mut registry = Registry::new();
        let id = registry.register();
        {
            let request = registry.get_mut(id).unwrap();
            request.append_stderr(b"boom");
            request.finish(EndRequest { app_status: 3, protocol_status: 0 });
        }

        let request = registry.remove(id).unwrap();
        assert_eq!(request.state, RequestState::Error(Failure::Application));
        assert_eq!(request.stderr, b"boom");
        assert_eq!(request.end.unwrap().app_status, 3);
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn stdout_keeps_characters_split_across_records() {
        let mut registry = Registry::new();
        let id = registry.register();
        let request = registry.get_mut(id).unwrap();
        request.append_stdout(b"h\xc3");
        request.append_stdout(b"\xa4llo");

        assert_eq!(request.stdout, "h\u{e4}llo".as_bytes());
    }

    #[test]
    fn failure_overrides_success() {
        let mut registry = Registry::new();
        let id = registry.register();
        let request = registry.get_mut(id).unwrap();
        request.append_stdout(b"partial");
        request.fail(Failure::Io(io::ErrorKind::WouldBlock));

        assert_eq!(request.state,
                   RequestState::Error(Failure::Io(io::ErrorKind::WouldBlock)));
        assert_eq!(request.stdout, b"partial");
    }
}
