#![allow(dead_code)]

use assert_cmd::Command;
use std::net::TcpListener;
use std::time::Duration;

/// A `simboot` command with logging kept quiet and a hard test timeout.
pub fn simboot() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_simboot"));
    cmd.timeout(Duration::from_secs(30));
    cmd.env("RUST_LOG", "warn");
    cmd
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}
