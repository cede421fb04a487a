use super::*;
use errors::{Error, Result};

use nom::IResult;
use nom::bytes::complete::take;
use nom::multi::many0;
use nom::number::complete::{be_u8, be_u16, be_u32};

use std::io::{self, Read};

/// Parses the eight fixed header bytes of a record
pub fn record_header(input: &[u8]) -> IResult<&[u8], Header> {
    let (in1, version) = be_u8(input)?;
    let (in2, kind) = be_u8(in1)?;
    let (in3, id) = be_u16(in2)?;
    let (in4, content_length) = be_u16(in3)?;
    let (in5, padding_length) = be_u8(in4)?;
    let (in6, reserved) = be_u8(in5)?;

    Ok((in6, Header {
        version: version,
        kind: kind,
        id: id,
        content_length: content_length,
        padding_length: padding_length,
        reserved: reserved
    }))
}

/// Decodes a header, failing if fewer than eight bytes are given
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    match record_header(bytes) {
        Ok((_, header)) => Ok(header),
        Err(_) => Err(Error::MalformedRecord)
    }
}

/// Parses the body of an `END_REQUEST` record.
///
/// The three trailing reserved bytes aren't required to be present.
pub fn end_request(input: &[u8]) -> IResult<&[u8], EndRequest> {
    let (in1, app_status) = be_u32(input)?;
    let (in2, protocol_status) = be_u8(in1)?;

    Ok((in2, EndRequest {
        app_status: app_status as i32,
        protocol_status: protocol_status
    }))
}

pub fn begin_request(input: &[u8]) -> IResult<&[u8], BeginRequest> {
    let (in1, role) = role(input)?;
    let (in2, flags) = be_u8(in1)?;
    let (in3, _) = take(5usize)(in2)?; // reserved

    Ok((in3, BeginRequest { role: role, flags: flags }))
}

fn role(input: &[u8]) -> IResult<&[u8], Role> {
    let (in1, tag) = be_u16(input)?;
    let r = match tag {
        1 => Role::Responder,
        2 => Role::Authorizer,
        3 => Role::Filter,
        _ => return Err(::nom::Err::Error(
            ::nom::error::Error::new(input, ::nom::error::ErrorKind::Tag)))
    };

    Ok((in1, r))
}

/// Parses a name or value length: one byte, or four with the high bit set
fn pair_length(input: &[u8]) -> IResult<&[u8], u32> {
    let (in1, initial) = be_u8(input)?;
    if initial >> 7 == 1 {
        let (in2, length) = be_u32(input)?;
        Ok((in2, length & 0x7FFF_FFFF))
    }
    else {
        Ok((in1, initial as u32))
    }
}

pub fn name_value_pair(input: &[u8]) -> IResult<&[u8], NameValuePair> {
    let (in1, name_length) = pair_length(input)?;
    let (in2, value_length) = pair_length(in1)?;
    let (in3, name) = take(name_length)(in2)?;
    let (in4, value) = take(value_length)(in3)?;

    Ok((in4, NameValuePair {
        name: Vec::from(name),
        value: Vec::from(value)
    }))
}

pub fn name_value_pairs(input: &[u8]) -> IResult<&[u8], Vec<NameValuePair>> {
    many0(name_value_pair)(input)
}

/// Reads until `buf` is full or the source runs dry, returning the count read
fn read_full<R: Read>(mut source: R, buf: &mut [u8]) -> io::Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match source.read(&mut buf[read ..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => (),
            Err(ref e) if e.kind() == io::ErrorKind::ConnectionReset => break,
            Err(e) => return Err(e)
        }
    }

    Ok(read)
}

/// Reads the next record off a stream.
///
/// Returns `Ok(None)` once the peer has closed the stream, including when it
/// does so partway through a record. Padding is read and thrown away.
pub fn read_record<R: Read>(mut source: R) -> Result<Option<Record>> {
    let mut header_bytes = [0; HEADER_LENGTH];
    let read = read_full(&mut source, &mut header_bytes)?;
    if read == 0 {
        return Ok(None);
    }
    if read < HEADER_LENGTH {
        warn!("Stream ended {} bytes into a record header", read);
        return Ok(None);
    }

    let header = decode_header(&header_bytes)?;

    let mut content = vec![0; header.content_length as usize];
    let read = read_full(&mut source, &mut content)?;
    if read < content.len() {
        warn!("Stream ended {} of {} bytes into a record's content",
              read, content.len());
        return Ok(None);
    }

    let mut padding = [0; 255];
    let padding = &mut padding[.. header.padding_length as usize];
    if read_full(&mut source, padding)? < padding.len() {
        warn!("Stream ended inside a record's padding");
        return Ok(None);
    }

    Ok(Some(Record {
        kind: header.kind,
        id: header.id,
        content: content
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use fastcgi::serializer::encode_record;

    #[test]
    fn header_fields() {
        let input = [1, 6, 0x12, 0x34, 0x01, 0x00, 7, 0];

        assert_eq!(decode_header(&input).unwrap(), Header {
            version: 1,
            kind: record_kind::STDOUT,
            id: 0x1234,
            content_length: 256,
            padding_length: 7,
            reserved: 0
        });
    }

    #[test]
    fn header_too_short() {
        assert!(decode_header(&[1, 6, 0, 1, 0]).is_err());
    }

    #[test]
    fn begin_request_record() {
        let input = [01, 01, 00, 01, 00, 08, 00, 00, 00, 01, 00, 00, 00, 00,
                     00, 00];

        let (rest, header) = record_header(&input).unwrap();
        assert_eq!(header.kind, record_kind::BEGIN_REQUEST);
        assert_eq!(header.id, 1);

        let (_, body) = begin_request(rest).unwrap();
        assert_eq!(body, BeginRequest { role: Role::Responder, flags: 0 });
    }

    #[test]
    fn end_request_body() {
        let input = [0, 0, 1, 2, 0, 0, 0, 0];

        assert_eq!(end_request(&input).unwrap().1, EndRequest {
            app_status: 258,
            protocol_status: protocol_status::REQUEST_COMPLETE
        });
    }

    #[test]
    fn end_request_negative_status() {
        let input = [0xFF, 0xFF, 0xFF, 0xFF, protocol_status::OVERLOADED];

        assert_eq!(end_request(&input).unwrap().1, EndRequest {
            app_status: -1,
            protocol_status: protocol_status::OVERLOADED
        });
    }

    #[test]
    fn params() {
        let input = [15, 16, 83, 67, 82, 73, 80, 84, 95, 70, 73, 76, 69, 78,
                     65, 77, 69, 47, 101, 116, 99, 47, 110, 103, 105, 110,
                     120, 47, 104, 116, 109, 108, 47, 12, 0, 81, 85, 69, 82,
                     89, 95, 83, 84, 82, 73, 78, 71, 14, 3, 82, 69, 81, 85,
                     69, 83, 84, 95, 77, 69, 84, 72, 79, 68, 71, 69, 84];

        let (rest, pairs) = name_value_pairs(&input).unwrap();
        assert!(rest.is_empty());
        assert_eq!(pairs, vec![
            NameValuePair {
                name: Vec::from(&b"SCRIPT_FILENAME"[..]),
                value: Vec::from(&b"/etc/nginx/html/"[..])
            },
            NameValuePair {
                name: Vec::from(&b"QUERY_STRING"[..]),
                value: vec![]
            },
            NameValuePair {
                name: Vec::from(&b"REQUEST_METHOD"[..]),
                value: Vec::from(&b"GET"[..])
            }
        ]);
    }

    #[test]
    fn four_byte_length_drops_marker_bit() {
        let mut input = vec![0x80, 0, 1, 0, 0];
        input.extend(vec![b'n'; 256]);

        let (rest, pair) = name_value_pair(&input).unwrap();
        assert!(rest.is_empty());
        assert_eq!(pair.name.len(), 256);
        assert!(pair.value.is_empty());
    }

    #[test]
    fn read_record_round_trips() {
        for &length in &[0usize, 1, 127, 128, 8000, MAX_CONTENT_LENGTH] {
            let content: Vec<u8> = (0..length).map(|i| i as u8).collect();
            let encoded = encode_record(record_kind::STDOUT, &content, 4242)
                .unwrap();

            let record = read_record(&encoded[..]).unwrap().unwrap();
            assert_eq!(record, Record {
                kind: record_kind::STDOUT,
                id: 4242,
                content: content
            });
        }
    }

    #[test]
    fn read_record_skips_padding() {
        let input = [1, 6, 0, 1, 0, 2, 3, 0, b'o', b'k', 0, 0, 0,
                     1, 3, 0, 1, 0, 0, 0, 0];
        let mut source = &input[..];

        let first = read_record(&mut source).unwrap().unwrap();
        assert_eq!(first.content, b"ok");

        let second = read_record(&mut source).unwrap().unwrap();
        assert_eq!(second.kind, record_kind::END_REQUEST);
    }

    /// Hands out one byte per read, after an interruption
    struct Trickle<'a> {
        input: &'a [u8],
        interrupted: bool
    }

    impl<'a> Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if self.input.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.input[0];
            self.input = &self.input[1 ..];
            Ok(1)
        }
    }

    #[test]
    fn read_record_survives_short_reads() {
        let mut input = encode_record(record_kind::STDOUT, b"one byte at a time",
                                      77).unwrap();
        input.extend(encode_record(record_kind::END_REQUEST,
                                   &[0, 0, 0, 0, 0, 0, 0, 0], 77).unwrap());
        let mut source = Trickle { input: &input, interrupted: false };

        let first = read_record(&mut source).unwrap().unwrap();
        assert_eq!(first.kind, record_kind::STDOUT);
        assert_eq!(first.content, b"one byte at a time");

        let second = read_record(&mut source).unwrap().unwrap();
        assert_eq!(second.kind, record_kind::END_REQUEST);
        assert_eq!(second.id, 77);

        assert_eq!(read_record(&mut source).unwrap(), None);
    }

    #[test]
    fn read_record_end_of_stream() {
        assert_eq!(read_record(&b""[..]).unwrap(), None);
    }

    #[test]
    fn read_record_truncated_content() {
        let input = [1, 6, 0, 1, 0, 5, 0, 0, b'h', b'e'];
        assert_eq!(read_record(&input[..]).unwrap(), None);
    }

    #[test]
    fn read_record_truncated_header() {
        let input = [1, 6, 0];
        assert_eq!(read_record(&input[..]).unwrap(), None);
    }
}
