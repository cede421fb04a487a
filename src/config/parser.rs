use super::*;
use toml::{Table, Value};

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::u16;

pub fn parse_file<P: AsRef<Path>>(conf: P)
                                  -> Result<Config, Error>
{
    let mut toml = String::new();
    {
        let mut f = File::open(conf)?;
        f.read_to_string(&mut toml)?;
    }

    parse_str(&toml)
}

pub fn parse_str(toml: &str) -> Result<Config, Error> {
    match toml.parse::<Table>() {
        Ok(table) => config_from_table(table),
        Err(e) => Err(Error::Parse(vec![message_from_error(toml, &e)]))
    }
}

/// Looks up a dotted path like `fastcgi.port`
fn lookup<'a>(table: &'a Table, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = table.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

/// Reads a number of seconds, integer or fractional
fn seconds(table: &Table, path: &str, what: &str)
           -> Result<Option<Duration>, Error>
{
    let secs = match lookup(table, path) {
        Some(&Value::Integer(s)) => s as f64,
        Some(&Value::Float(s)) => s,
        Some(val) => return Err(Error::Validation(
            format!("Expected the {} to be a number, got a {}",
                    what, val.type_str())
        )),
        None => return Ok(None)
    };

    if !(secs > 0.0) || !secs.is_finite() {
        return Err(Error::Validation(
            format!("The {} must be a positive number of seconds", what)
        ));
    }

    match Duration::try_from_secs_f64(secs) {
        Ok(d) => Ok(Some(d)),
        Err(_) => Err(Error::Validation(
            format!("The {} of {} seconds is too long", what, secs)
        ))
    }
}

fn config_from_table(table: Table) -> Result<Config, Error> {
    let mut config: Config = Default::default();

    match lookup(&table, "fastcgi.host") {
        Some(&Value::String(ref host)) if !host.is_empty() =>
            config.fcgi.host = host.clone(),
        Some(&Value::String(_)) => return Err(Error::Validation(
            String::from("The FastCGI host must not be empty")
        )),
        Some(val) => return Err(Error::Validation(
            format!("Expected the FastCGI host to be a string, got a {}",
                    val.type_str())
        )),
        None => ()
    }

    match lookup(&table, "fastcgi.port") {
        Some(&Value::Integer(p))
            if p <= u16::MAX as i64 &&
            p > 0 => config.fcgi.port = p as u16,
        Some(&Value::Integer(p)) => return Err(Error::Validation(
            format!("The FastCGI port {} is out of range", p)
        )),
        Some(val) => return Err(Error::Validation(
            format!("Expected the FastCGI port to be an integer, got a {}",
                    val.type_str())
        )),
        None => ()
    }

    if let Some(timeout) = seconds(&table, "fastcgi.timeout",
                                   "connect timeout")? {
        config.fcgi.connect_timeout = timeout;
    }

    config.fcgi.read_timeout =
        seconds(&table, "fastcgi.read_timeout", "read timeout")?;

    match lookup(&table, "fastcgi.keepalive") {
        Some(&Value::Boolean(k)) => config.fcgi.keep_alive = k,
        Some(val) => return Err(Error::Validation(
            format!("Expected keepalive to be a boolean, got a {}",
                    val.type_str())
        )),
        None => ()
    }

    Ok(config)
}

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Parse(Vec<ErrorMessage>),
    Validation(String)
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref e) => write!(f, "{}", e),
            Error::Parse(ref errors) => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "line {} column {}: {}",
                           e.line, e.column, e.desc)?;
                }
                Ok(())
            },
            Error::Validation(ref message) => write!(f, "{}", message)
        }
    }
}

/// An owned, rendered version of a TOML syntax error
#[derive(Debug, Clone)]
pub struct ErrorMessage {
    pub desc: String,
    pub line: usize,
    pub column: usize
}

/// Convert a TOML syntax error into an `ErrorMessage`, with one-based line
/// and column numbers
fn message_from_error(source: &str, error: &::toml::de::Error)
                      -> ErrorMessage
{
    let offset = error.span().map_or(0, |span| span.start);
    let before = &source[.. offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(before.len(), |i| offset - i - 1) + 1;

    ErrorMessage {
        desc: String::from(error.message()),
        line: line,
        column: column
    }
}
