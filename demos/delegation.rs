//! One shared factory deciding per host.
//!
//! `amazing.today` is connected over a forced TLSv1.2 session; any other host
//! goes through the platform factory untouched.
//!
//! Run with `RUST_LOG=debug cargo run --example delegation [host...]`

use std::io::{BufRead, BufReader, Write};

use tlsroute::{SecureSocket, SocketFactory, TlsRoute};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let factory = match TlsRoute::new().debug().build() {
        Ok(factory) => factory,
        Err(e) => {
            tracing::error!("Failed to build factory: {}", e);
            std::process::exit(1);
        }
    };

    let mut hosts: Vec<String> = std::env::args().skip(1).collect();
    if hosts.is_empty() {
        hosts = vec!["www.google.com".to_owned(), "amazing.today".to_owned()];
    }

    for host in &hosts {
        let route = if factory.should_upgrade(host) { "upgraded" } else { "default" };
        match factory.create(host, 443).map(|socket| head(socket.as_ref(), host)) {
            Ok(Ok(status)) => println!("{host} [{route}]: {status}"),
            Ok(Err(e)) => println!("{host} [{route}]: request failed: {e}"),
            Err(e) => println!("{host} [{route}]: {e}"),
        }
    }
}

/// Send a minimal GET and return the status line.
fn head(socket: &dyn SecureSocket, host: &str) -> std::io::Result<String> {
    let mut stream = socket;
    write!(
        stream,
        "GET / HTTP/1.1\r\nHost: {host}\r\nUser-Agent: tlsroute-demo\r\nConnection: close\r\n\r\n"
    )?;
    stream.flush()?;

    let mut status = String::new();
    BufReader::new(stream).read_line(&mut status)?;
    let protocol = socket.negotiated_protocol().unwrap_or("unknown");
    Ok(format!("{} via {}", status.trim_end(), protocol))
}
