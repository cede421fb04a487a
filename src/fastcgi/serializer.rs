//! Serialization of FastCGI messages

use errors::{SerializationError, Result};
use fastcgi::{Role, record_kind, flags, VERSION, MAX_CONTENT_LENGTH};

use byteorder::{BigEndian, WriteBytesExt};

use std::io::Write;

/// Largest name or value length the four-byte length form can express
const MAX_PAIR_FIELD_LENGTH: usize = 0x7FFF_FFFF;

/// Writes a header from its bits
///
/// We never pad, so the padding length is always written as zero.
fn write_header<W: Write>(mut output: W, kind: u8, id: u16,
                          content_length: usize)
                          -> Result<()>
{
    if content_length > MAX_CONTENT_LENGTH {
        return Err(SerializationError::TooLong.into());
    }

    output.write_all(&[VERSION, kind])?;
    output.write_u16::<BigEndian>(id)?;
    output.write_u16::<BigEndian>(content_length as u16)?;
    output.write_u8(0)?; // padding length
    output.write_u8(0)?; // reserved byte

    Ok(())
}

/// Encodes a single record: the eight-byte header followed by `content`.
///
/// Content longer than a record can describe is refused rather than
/// truncated; use the stream writers to split it up.
pub fn encode_record(kind: u8, content: &[u8], id: u16) -> Result<Vec<u8>> {
    let mut record = Vec::with_capacity(8 + content.len());
    write_header(&mut record, kind, id, content.len())?;
    record.extend_from_slice(content);
    Ok(record)
}

/// Computes the number of bytes a name or value will take up on the wire once
/// serialized into the FastCGI name-value pair format
fn name_length(val: &[u8]) -> usize {
    let length = val.len();
    let length_length = if length > 127 { 4 } else { 1 };

    length + length_length
}

fn write_pair_length<W: Write>(mut output: W, length: usize) -> Result<()> {
    if length > MAX_PAIR_FIELD_LENGTH {
        return Err(SerializationError::TooLong.into());
    }

    if length > 127 {
        // The high bit marks the four-byte form
        output.write_u32::<BigEndian>(length as u32 | 0x8000_0000)?;
    }
    else {
        output.write_u8(length as u8)?;
    }

    Ok(())
}

/// Writes a name-value pair to the stream
fn write_name_val_pair<W: Write>(mut output: W, name: &[u8], val: &[u8])
                                 -> Result<()>
{
    write_pair_length(&mut output, name.len())?;
    write_pair_length(&mut output, val.len())?;

    output.write_all(name)?;
    output.write_all(val)?;

    Ok(())
}

/// Encodes one name-value pair:
/// `[name length][value length][name bytes][value bytes]`
pub fn encode_name_value(name: &str, value: &str) -> Result<Vec<u8>> {
    let mut pair = Vec::with_capacity(name_length(name.as_bytes()) +
                                      name_length(value.as_bytes()));
    write_name_val_pair(&mut pair, name.as_bytes(), value.as_bytes())?;
    Ok(pair)
}

/// Write a `BeginRequest` message for the given role
pub fn begin_request<W: Write>(mut output: W, id: u16, role: Role,
                               keep_alive: bool)
                               -> Result<()>
{
    write_header(&mut output, record_kind::BEGIN_REQUEST, id, 8)?;
    output.write_u16::<BigEndian>(role.to_protocol_number())?;
    output.write_u8(if keep_alive { flags::KEEP_CONN } else { 0 })?;
    output.write_all(&[0; 5])?; // reserved

    Ok(())
}

/// Writes `content` as a stream of records of the given kind, split on
/// record-size boundaries, then the stream-terminating empty record.
fn stream<W: Write>(mut output: W, kind: u8, id: u16, content: &[u8])
                    -> Result<()>
{
    for chunk in content.chunks(MAX_CONTENT_LENGTH) {
        write_header(&mut output, kind, id, chunk.len())?;
        output.write_all(chunk)?;
    }

    write_header(&mut output, kind, id, 0)
}

/// Write a stream of parameters
///
/// This will automatically emit the stream-terminating empty message as well.
pub fn params<W: Write>(output: W, id: u16, params: &[(&str, &str)])
                        -> Result<()> {
    let content_length = params.iter()
        .map(|&(name, value)|
             name_length(name.as_bytes()) + name_length(value.as_bytes()))
        .fold(0, |acc, x| acc + x);

    let mut content = Vec::with_capacity(content_length);
    for &(name, value) in params {
        write_name_val_pair(&mut content, name.as_bytes(), value.as_bytes())?;
    }

    stream(output, record_kind::PARAMS, id, &content)
}

/// Write the request body as an `FCGI_STDIN` stream, sentinel included
pub fn stdin<W: Write>(output: W, id: u16, content: &[u8]) -> Result<()> {
    stream(output, record_kind::STDIN, id, content)
}
