//! Parsing of `mco rpc` text replies.
//!
//! Replies look like:
//!
//! ```text
//!  * [ ============================================================> ] 2 / 2
//!
//! web01
//!      Arch: x86_64
//!    Ensure: 2.2.3-33.el5
//!
//! web02                                    Request Aborted
//!
//! Finished processing 2 / 2 hosts in 412.33 ms
//! ```
//!
//! A non-indented line names the host; indented `Key: value` lines belong to it.

use crate::types::HostStatus;

const ENSURE_FIELD: &str = "Ensure:";

/// Non-indented lines that are broker chrome rather than host names.
const CHROME_PREFIXES: &[&str] = &[
    "Finished processing",
    "Summary of",
    "No request sent",
    "Determining the amount of hosts",
    "---",
    "*",
];

/// Substrings that mark a host (or the whole call) as failed.
const FAILURE_MARKERS: &[&str] = &[
    "Request Aborted",
    "No response from",
    "did not discover any nodes",
    "Failed",
    "failed",
];

/// Extract every `(host, Ensure)` pair from a status reply.
pub fn parse_status(text: &str) -> Vec<HostStatus> {
    let mut statuses = Vec::new();
    let mut host: Option<&str> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if !line.starts_with(char::is_whitespace) {
            if !is_chrome(line) {
                host = line.split_whitespace().next();
            }
            continue;
        }

        if let Some(value) = line.trim().strip_prefix(ENSURE_FIELD) {
            statuses.push(HostStatus::new(host.unwrap_or("unknown"), value));
        }
    }

    statuses
}

/// Lines that report a failed request.
pub fn failure_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| FAILURE_MARKERS.iter().any(|marker| line.contains(marker)))
        .map(|line| line.trim().to_string())
        .collect()
}

fn is_chrome(line: &str) -> bool {
    CHROME_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}
