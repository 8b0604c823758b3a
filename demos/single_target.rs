//! Per-connection installation.
//!
//! The caller decides which connection gets the forced protocol and applies
//! an upgrade-everything factory to that connection only. Other connections
//! use the platform factory directly.
//!
//! Run with `cargo run --example single_target [host]`

use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use tlsroute::{PlatformFactory, SecureSocket, SocketFactory, TlsRoute};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let target = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "amazing.today".to_owned());

    let forced = TlsRoute::single_target()
        .tls12()
        .read_timeout(Duration::from_secs(15))
        .debug()
        .build()?;
    let platform = PlatformFactory::new()?;

    let chosen = forced.create(&target, 443)?;
    println!("{target}: {}", status_line(chosen.as_ref(), &target)?);

    let other = platform.create("www.rust-lang.org", 443)?;
    println!("www.rust-lang.org: {}", status_line(other.as_ref(), "www.rust-lang.org")?);

    chosen.close()?;
    other.close()?;
    Ok(())
}

fn status_line(socket: &dyn SecureSocket, host: &str) -> std::io::Result<String> {
    let mut stream = socket;
    write!(stream, "GET / HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n")?;
    stream.flush()?;

    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line)?;
    Ok(format!(
        "{} ({})",
        line.trim_end(),
        socket.session().map_or_else(|| "no session".to_owned(), ToString::to_string)
    ))
}
