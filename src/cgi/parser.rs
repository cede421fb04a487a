//! Parsers for CGI/1.1 responses

use cgi::{Status, Header, Document};

use nom::IResult;
use nom::bytes::complete::{tag, take_till, take_till1, take_while,
                           take_while_m_n};
use nom::character::complete::line_ending;
use nom::character::is_digit;
use nom::combinator::{map_res, opt};
use nom::multi::many0;

use std::str;

fn cr_or_lf(x: u8) -> bool {
    x == b'\n' || x == b'\r'
}

fn lwsp(x: u8) -> bool {
    x == b' ' || x == b'\t'
}

fn code(input: &[u8]) -> IResult<&[u8], u16> {
    map_res(map_res(take_while_m_n(3, 3, is_digit), str::from_utf8),
            |s: &str| s.parse::<u16>())(input)
}

/// Parses the value of a `Status:` header, e.g. `404 Not Found`
pub fn status(input: &[u8]) -> IResult<&[u8], Status> {
    let (in1, code) = code(input)?;
    let (in2, _) = opt(tag(" "))(in1)?;

    Ok((&in2[in2.len() ..], Status {
        code: code,
        reason_phrase: Vec::from(in2)
    }))
}

/// One header line, line ending included
pub fn header(input: &[u8]) -> IResult<&[u8], Header> {
    let (in1, name) = take_till1(|b: u8| b == b':' || cr_or_lf(b))(input)?;
    let (in2, _) = tag(":")(in1)?;
    let (in3, _) = take_while(lwsp)(in2)?;
    let (in4, content) = take_till(cr_or_lf)(in3)?;
    let (in5, _) = line_ending(in4)?;

    Ok((in5, Header { name: Vec::from(name), content: Vec::from(content) }))
}

/// All header lines and the blank line ending them
pub fn headers(input: &[u8]) -> IResult<&[u8], Vec<Header>> {
    let (in1, hdrs) = many0(header)(input)?;
    let (in2, _) = line_ending(in1)?;

    Ok((in2, hdrs))
}

/// Splits a complete response document into headers and body.
///
/// Returns `None` if the header block is malformed or unterminated.
pub fn document(input: &[u8]) -> Option<Document> {
    let (body, hdrs) = match headers(input) {
        Ok(parsed) => parsed,
        Err(_) => return None
    };

    let mut doc = Document {
        status: None,
        content_type: None,
        headers: Vec::new(),
        body: Vec::from(body)
    };

    for hdr in hdrs {
        if hdr.name.eq_ignore_ascii_case(b"Status") {
            match status(&hdr.content) {
                Ok((_, s)) => doc.status = Some(s),
                Err(_) => {
                    warn!("Ignoring malformed Status header");
                }
            }
        }
        else if hdr.name.eq_ignore_ascii_case(b"Content-Type") {
            doc.content_type = Some(hdr.content);
        }
        else {
            doc.headers.push(hdr);
        }
    }

    Some(doc)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_works() {
        let input: &[u8] = b"Foo: bar\r\n\r\n";
        let expected = Header {
            name: Vec::from(&b"Foo"[..]),
            content: Vec::from(&b"bar"[..])
        };

        let (rest, res) = header(input).unwrap();
        assert_eq!(expected, res);
        assert_eq!(b"\r\n", rest);
    }

    #[test]
    fn status_with_reason() {
        let (_, s) = status(b"404 Not Found").unwrap();
        assert_eq!(s, Status {
            code: 404,
            reason_phrase: Vec::from(&b"Not Found"[..])
        });
    }

    #[test]
    fn status_rejects_letters() {
        assert!(status(b"2x0 OK").is_err());
    }

    #[test]
    fn test_headers() {
        let input: &[u8] = b"Foo: bar\r\nBaz: buz\r\n\r\n";

        let expected = vec![
            Header {
                name: Vec::from(&b"Foo"[..]),
                content: Vec::from(&b"bar"[..])
            },
            Header {
                name: Vec::from(&b"Baz"[..]),
                content: Vec::from(&b"buz"[..])
            }
        ];
        let (rest, hdrs) = headers(input).unwrap();
        assert_eq!(expected, hdrs);
        assert_eq!(b"", rest);
    }

    #[test]
    fn document_from_php() {
        let input: &[u8] = b"X-Powered-By: PHP/8.2.7\r\nStatus: 201 Created\r\nContent-type: text/html; charset=UTF-8\r\n\r\n<p>made</p>";

        let doc = document(input).unwrap();
        assert_eq!(doc.status_code(), 201);
        assert_eq!(doc.content_type,
                   Some(Vec::from(&b"text/html; charset=UTF-8"[..])));
        assert_eq!(doc.headers, vec![Header {
            name: Vec::from(&b"X-Powered-By"[..]),
            content: Vec::from(&b"PHP/8.2.7"[..])
        }]);
        assert_eq!(doc.body, b"<p>made</p>");
    }

    #[test]
    fn document_bare_newlines_default_status() {
        let doc = document(b"Content-Type: text/plain\n\nhello").unwrap();
        assert_eq!(doc.status_code(), 200);
        assert_eq!(doc.body, b"hello");
    }

    #[test]
    fn document_unterminated_headers() {
        assert_eq!(document(b"Content-Type: text/plain\r\n"), None);
    }
}
