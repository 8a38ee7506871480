//! Process table scanning for the Antigravity language server.

use std::path::Path;
use std::process::Command;

use tracing::debug;

/// A running process and its argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    /// Process ID
    pub pid: u32,
    /// Command line split into arguments (argv[0] first)
    pub args: Vec<String>,
}

/// The companion process as recovered from its command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionProcess {
    /// Process ID
    pub pid: u32,
    /// Value of `--csrf_token`
    pub csrf_token: String,
    /// Value of `--extension_server_port`, if present
    pub extension_server_port: Option<u16>,
}

/// List running processes.
///
/// Reads `/proc` directly where it exists, otherwise falls back to `ps`.
/// Returns an empty list on any error.
pub fn list_processes() -> Vec<ProcessEntry> {
    if Path::new("/proc/self/cmdline").exists() {
        read_proc()
    } else {
        run_ps()
    }
}

/// Read every `/proc/<pid>/cmdline`
fn read_proc() -> Vec<ProcessEntry> {
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return Vec::new();
    };

    entries
        .flatten()
        .filter_map(|entry| {
            let pid: u32 = entry.file_name().to_str()?.parse().ok()?;
            let raw = std::fs::read(entry.path().join("cmdline")).ok()?;
            let args = parse_cmdline(&raw);
            (!args.is_empty()).then_some(ProcessEntry { pid, args })
        })
        .collect()
}

/// Split a NUL-separated `/proc/<pid>/cmdline` buffer
pub fn parse_cmdline(raw: &[u8]) -> Vec<String> {
    raw.split(|&b| b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect()
}

/// List processes via `ps` (macOS and other systems without `/proc`)
fn run_ps() -> Vec<ProcessEntry> {
    match Command::new("ps")
        .args(["-axww", "-o", "pid=,command="])
        .output()
    {
        Ok(output) if output.status.success() => {
            parse_ps_output(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            debug!(
                "ps failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Vec::new()
        }
        Err(e) => {
            debug!("Failed to execute ps: {}", e);
            Vec::new()
        }
    }
}

/// Parse `ps -o pid=,command=` output
pub fn parse_ps_output(output: &str) -> Vec<ProcessEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (pid, command) = line.trim().split_once(char::is_whitespace)?;
            let pid: u32 = pid.parse().ok()?;
            let args: Vec<String> = command.split_whitespace().map(str::to_string).collect();
            (!args.is_empty()).then_some(ProcessEntry { pid, args })
        })
        .collect()
}

/// Get the value of a `--flag value` or `--flag=value` argument
pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            return iter.next().map(String::as_str).filter(|v| !v.starts_with("--"));
        }
        if let Some(value) = arg.strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
            return Some(value);
        }
    }
    None
}

/// Check whether a process looks like the Antigravity language server
fn is_companion(entry: &ProcessEntry) -> bool {
    let exe_matches = entry
        .args
        .first()
        .and_then(|exe| Path::new(exe).file_name())
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.contains("language_server"));

    exe_matches
        && entry
            .args
            .iter()
            .any(|arg| arg.to_lowercase().contains("antigravity"))
}

/// Find the companion process and recover its token from the command line
pub fn find_companion(entries: &[ProcessEntry]) -> Option<CompanionProcess> {
    entries.iter().filter(|e| is_companion(e)).find_map(|entry| {
        let csrf_token = flag_value(&entry.args, "--csrf_token")?
            .trim()
            .to_string();
        if csrf_token.is_empty() {
            return None;
        }
        Some(CompanionProcess {
            pid: entry.pid,
            csrf_token,
            extension_server_port: flag_value(&entry.args, "--extension_server_port")
                .and_then(|p| p.parse().ok()),
        })
    })
}
