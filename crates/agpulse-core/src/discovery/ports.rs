//! Listening port enumeration and endpoint probing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Command;

use tracing::debug;

use crate::quota::client::{request_metadata, CSRF_HEADER};
use crate::quota::Scheme;

/// RPC used to check that a port belongs to the language server API
pub const PROBE_PATH: &str = "/exa.language_server_pb.LanguageServerService/GetUnleashData";

/// `lsof` listen line, e.g. `... TCP 127.0.0.1:42100 (LISTEN)`
static LSOF_LISTEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":(\d+)\s+\(LISTEN\)").expect("Invalid LSOF_LISTEN regex"));

/// `ss -tlnpH` line, e.g. `LISTEN 0 4096 127.0.0.1:42100 0.0.0.0:* users:(("x",pid=12,fd=9))`
static SS_LISTEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^LISTEN\s+\d+\s+\d+\s+\S*:(\d+)\s+\S+.*\bpid=(\d+),")
        .expect("Invalid SS_LISTEN regex")
});

/// Push a port unless already present, keeping first-seen order
pub(crate) fn push_unique(ports: &mut Vec<u16>, port: u16) {
    if port != 0 && !ports.contains(&port) {
        ports.push(port);
    }
}

/// Parse listening ports from `lsof -nP -a -iTCP -sTCP:LISTEN -p <pid>`
pub fn parse_lsof_ports(output: &str) -> Vec<u16> {
    let mut ports = Vec::new();
    for caps in output.lines().filter_map(|line| LSOF_LISTEN.captures(line)) {
        if let Ok(port) = caps[1].parse() {
            push_unique(&mut ports, port);
        }
    }
    ports
}

/// Parse listening ports owned by `pid` from `ss -tlnpH`
pub fn parse_ss_ports(output: &str, pid: u32) -> Vec<u16> {
    let mut ports = Vec::new();
    for caps in output.lines().filter_map(|line| SS_LISTEN.captures(line.trim())) {
        if caps[2].parse::<u32>().ok() != Some(pid) {
            continue;
        }
        if let Ok(port) = caps[1].parse() {
            push_unique(&mut ports, port);
        }
    }
    ports
}

/// Run a command and return its stdout if it succeeded
fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            debug!("{} exited with {}", program, output.status);
            None
        }
        Err(e) => {
            debug!("Failed to execute {}: {}", program, e);
            None
        }
    }
}

/// Enumerate TCP ports the process listens on (`lsof`, then `ss`)
pub fn listening_ports(pid: u32) -> Vec<u16> {
    let pid_arg = pid.to_string();
    if let Some(out) = command_stdout(
        "lsof",
        &["-nP", "-a", "-iTCP", "-sTCP:LISTEN", "-p", &pid_arg],
    ) {
        let ports = parse_lsof_ports(&out);
        if !ports.is_empty() {
            return ports;
        }
    }

    command_stdout("ss", &["-tlnpH"])
        .map(|out| parse_ss_ports(&out, pid))
        .unwrap_or_default()
}

/// Return the first candidate port whose probe RPC answers with success
pub async fn probe_ports(
    http: &reqwest::Client,
    scheme: Scheme,
    host: &str,
    candidates: &[u16],
    csrf_token: &str,
) -> Option<u16> {
    for &port in candidates {
        let url = format!("{}://{}:{}{}", scheme.as_str(), host, port, PROBE_PATH);
        let result = http
            .post(&url)
            .header("Connect-Protocol-Version", "1")
            .header(CSRF_HEADER, csrf_token)
            .json(&request_metadata())
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                debug!("Probe: port {} answered", port);
                return Some(port);
            }
            Ok(resp) => debug!("Probe: port {} answered {}", port, resp.status()),
            Err(e) => debug!("Probe: port {} failed: {}", port, e),
        }
    }
    None
}
