//! Send a single request to a FastCGI responder.
//!
//! Call it like this:
//!
//!     fcgi-client -f client.toml -p SCRIPT_FILENAME=/srv/www/index.php \
//!         -p REQUEST_METHOD=GET
//!
//! The config file is in the [TOML format][toml]. Here is an example:
//!
//! ```toml
//! [fastcgi]
//! host = "127.0.0.1"   # or a socket path, like "/run/php/php-fpm.sock"
//! port = 9000
//! timeout = 3          # seconds to wait for the connection
//! read_timeout = 30    # seconds a single read may block; unset waits forever
//! keepalive = false
//! ```
//!
//! This example also serves as the defaults if no config file is provided,
//! or any given key is not present. `--host`, `--port` and `--keepalive`
//! override the file.
//!
//! Whatever the responder writes to its standard output is printed; its error
//! output goes to the log. The exit code is 0 if the request completed, 2 if
//! the responder reported an error or hung up early, and 1 if we never got
//! that far.
//!
//! [toml]: https://github.com/toml-lang/toml

#[macro_use] extern crate clap;
extern crate env_logger;
extern crate fcgi_client;
#[macro_use] extern crate log;

use fcgi_client::{Client, Config};
use fcgi_client::config::parser::{self, parse_file};

use clap::{Arg, ArgAction, Command};

use std::env;
use std::fs::File;
use std::io::{self, stderr, Read, Write};
use std::process::exit;

fn main() {
    let mut log_builder = env_logger::Builder::new();
    log_builder.filter(None, log::LevelFilter::Info);

    if let Ok(var) = env::var("FCGI_CLIENT_LOG") {
        log_builder.parse_filters(&var);
    }

    match log_builder.try_init() {
        Ok(()) => (),
        Err(e) => {
            let _ = writeln!(stderr(),
                             "fcgi-client: Error when initializing logging: {}",
                             e);
            exit(1);
        }
    };

    let matches = Command::new("fcgi-client")
        .version("0.1")
        .author("Alex Hill <alexander.d.hill.89@gmail.com>")
        .about("Sends one request to a FastCGI responder")
        .arg(Arg::new("config_file")
             .short('f')
             .value_name("FILE")
             .help("The TOML file with client configuration"))
        .arg(Arg::new("host")
             .long("host")
             .value_name("HOST")
             .help("Responder host, or the path of its Unix socket"))
        .arg(Arg::new("port")
             .long("port")
             .value_name("PORT")
             .value_parser(value_parser!(u16))
             .help("Responder TCP port"))
        .arg(Arg::new("keepalive")
             .long("keepalive")
             .action(ArgAction::SetTrue)
             .help("Ask the responder to keep the connection open"))
        .arg(Arg::new("param")
             .short('p')
             .long("param")
             .value_name("NAME=VALUE")
             .action(ArgAction::Append)
             .help("A request parameter; may be repeated"))
        .arg(Arg::new("data")
             .short('d')
             .long("data")
             .value_name("BODY")
             .conflicts_with("data_file")
             .help("The request body"))
        .arg(Arg::new("data_file")
             .long("data-file")
             .value_name("FILE")
             .help("Read the request body from FILE, or stdin for '-'"))
        .arg(Arg::new("body_only")
             .long("body-only")
             .action(ArgAction::SetTrue)
             .help("Strip the CGI headers from the output"))
        .get_matches();

    let mut config = match matches.get_one::<String>("config_file") {
        Some(config_file) => load_config(config_file),
        None => Config::default()
    };

    if let Some(host) = matches.get_one::<String>("host") {
        config.fcgi.host = host.clone();
    }
    if let Some(&port) = matches.get_one::<u16>("port") {
        config.fcgi.port = port;
    }
    if matches.get_flag("keepalive") {
        config.fcgi.keep_alive = true;
    }

    let mut params = Vec::new();
    for param in matches.get_many::<String>("param").into_iter().flatten() {
        match param.find('=') {
            Some(i) => params.push((&param[.. i], &param[i + 1 ..])),
            None => {
                error!("Parameter {:?} should look like NAME=VALUE", param);
                exit(1);
            }
        }
    }

    let body = match read_body(matches.get_one::<String>("data"),
                               matches.get_one::<String>("data_file")) {
        Ok(b) => b,
        Err(e) => {
            error!("Error reading the request body: {}", e);
            exit(1);
        }
    };

    let client = Client::new(config.fcgi);
    let response = match client.request(&params, &body) {
        Ok(r) => r,
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    };

    let output = if matches.get_flag("body_only") {
        match response.document() {
            Some(doc) => {
                info!("Responder answered with status {}", doc.status_code());
                doc.body
            },
            None => {
                warn!("Output isn't a CGI document; printing all of it");
                response.stdout.clone().into_bytes()
            }
        }
    }
    else {
        response.stdout.clone().into_bytes()
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = out.write_all(&output).and_then(|_| out.flush()) {
        error!("Error writing output: {}", e);
        exit(1);
    }

    if !response.is_success() {
        warn!("Request {} ended in state {:?}", response.id, response.state);
        exit(2);
    }
}

fn load_config(config_file: &str) -> Config {
    match parse_file(config_file) {
        Ok(c) => c,
        Err(parser::Error::Io(e)) => {
            error!("Error opening config file {:?}: {}", config_file, e);
            exit(1);
        },
        Err(parser::Error::Parse(e)) => {
            error!("Errors parsing config file {:?}", config_file);
            for error in e {
                error!("Config file error at line {} column {}: {}",
                       error.line, error.column, error.desc);
            }
            exit(1);
        },
        Err(parser::Error::Validation(message)) => {
            error!("Error in config file: {}", message);
            exit(1);
        }
    }
}

fn read_body(data: Option<&String>, data_file: Option<&String>)
             -> io::Result<Vec<u8>>
{
    if let Some(data) = data {
        return Ok(data.clone().into_bytes());
    }

    let mut body = Vec::new();
    match data_file.map(String::as_str) {
        Some("-") => { io::stdin().read_to_end(&mut body)?; },
        Some(path) => { File::open(path)?.read_to_end(&mut body)?; },
        None => ()
    }

    Ok(body)
}
