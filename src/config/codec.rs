//! Text form of the SSH client config
//!
//! Parsing is a two-state scan over trimmed lines:
//! - `ScanningDocument`: version header, document comments, `Host` openers
//! - `InsideHost`: everything up to the next `Host` line belongs to one entry
//!
//! A run of comment lines sitting directly above a `Host` line (no blank line
//! in between) describes that host. Blank lines carry no content otherwise.
//!
//! Malformed input never fails; it degrades into `other_configs` or is dropped.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ConfigDocument, HostEntry};

/// Tool name used in the generated header comment
pub const TOOL_NAME: &str = "ConfigSsh";

static VERSION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^#\s*create\s+by\s+configssh\s*\(v:([^)\s]+)\)")
        .expect("version header pattern is valid")
});

/// Setter for a typed directive; returns false when the value is rejected
type Setter = fn(&mut HostEntry, &str) -> bool;

/// Directives mapped onto `HostEntry` fields, matched case-insensitively
const HOST_DIRECTIVES: &[(&str, Setter)] = &[
    ("hostname", set_host),
    ("user", set_user),
    ("port", set_port),
    ("identityfile", set_identity_file),
];

fn set_host(entry: &mut HostEntry, value: &str) -> bool {
    entry.host = value.to_string();
    true
}

fn set_user(entry: &mut HostEntry, value: &str) -> bool {
    entry.user = value.to_string();
    true
}

/// Port 0 is rejected: the serializer never writes it back
fn set_port(entry: &mut HostEntry, value: &str) -> bool {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match value.parse::<u16>() {
        Ok(port) if port != 0 => {
            entry.port = Some(port);
            true
        }
        _ => false,
    }
}

fn set_identity_file(entry: &mut HostEntry, value: &str) -> bool {
    entry.identity_file = value.to_string();
    true
}

enum ScanState {
    ScanningDocument,
    InsideHost(HostEntry),
}

/// Split a directive line into its keyword and the trimmed remainder
fn split_directive(line: &str) -> (&str, &str) {
    match line.find(|c: char| c == ' ' || c == '\t') {
        Some(pos) => (&line[..pos], line[pos..].trim()),
        None => (line, ""),
    }
}

/// Name carried by a `Host` line, or None for any other line
fn host_name(line: &str) -> Option<&str> {
    let (keyword, value) = split_directive(line);
    keyword.eq_ignore_ascii_case("host").then_some(value)
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#')
}

/// Forward-only cursor over trimmed lines that steps over blank ones
struct LineCursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().map(str::trim).collect(),
            pos: 0,
        }
    }

    fn skip_blank(&mut self) {
        while self.lines.get(self.pos).map_or(false, |line| line.is_empty()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<&'a str> {
        self.skip_blank();
        self.lines.get(self.pos).copied()
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    /// Length of the comment run at the cursor when a `Host` line follows it directly
    fn comments_above_host(&mut self) -> Option<usize> {
        self.skip_blank();
        let rest = &self.lines[self.pos..];
        let run = rest.iter().take_while(|line| is_comment(line)).count();
        let opens_host = rest.get(run).map_or(false, |line| host_name(line).is_some());
        (run > 0 && opens_host).then_some(run)
    }
}

/// Parse SSH config text into a document
pub fn parse(content: &str) -> ConfigDocument {
    let mut doc = ConfigDocument::new();
    let mut cursor = LineCursor::new(content);
    let mut state = ScanState::ScanningDocument;

    loop {
        state = match state {
            ScanState::ScanningDocument => {
                let leading = match cursor.comments_above_host() {
                    Some(run) => take_leading_comments(&mut doc, &mut cursor, run),
                    None => Vec::new(),
                };
                let Some(line) = cursor.next_line() else { break };
                scan_document_line(&mut doc, line, leading)
            }
            ScanState::InsideHost(mut entry) => {
                if scan_host_line(&mut entry, &mut cursor) {
                    ScanState::InsideHost(entry)
                } else {
                    doc.hosts.push(entry);
                    ScanState::ScanningDocument
                }
            }
        };
    }

    doc.sort_hosts();
    doc
}

/// Consume the comments directly above a `Host` line; a version header among them still sets the version
fn take_leading_comments(doc: &mut ConfigDocument, cursor: &mut LineCursor<'_>, run: usize) -> Vec<String> {
    let mut leading = Vec::with_capacity(run);
    for _ in 0..run {
        let Some(line) = cursor.next_line() else { break };
        match VERSION_HEADER.captures(line) {
            Some(caps) => doc.version = caps[1].to_string(),
            None => leading.push(line.to_string()),
        }
    }
    leading
}

fn scan_document_line(doc: &mut ConfigDocument, line: &str, leading: Vec<String>) -> ScanState {
    if is_comment(line) {
        match VERSION_HEADER.captures(line) {
            Some(caps) => doc.version = caps[1].to_string(),
            None => doc.comments.push(line.to_string()),
        }
        return ScanState::ScanningDocument;
    }

    if let Some(name) = host_name(line) {
        return ScanState::InsideHost(HostEntry {
            comments: leading,
            name: name.to_string(),
            ..Default::default()
        });
    }

    tracing::debug!("Dropping directive outside any Host block: {}", line);
    ScanState::ScanningDocument
}

/// Consume one line belonging to `entry`; false once the block has ended
fn scan_host_line(entry: &mut HostEntry, cursor: &mut LineCursor<'_>) -> bool {
    if cursor.peek().map_or(true, |next| host_name(next).is_some()) {
        return false;
    }
    // Left for the host below
    if cursor.comments_above_host().is_some() {
        return false;
    }
    let Some(line) = cursor.next_line() else {
        return false;
    };

    if is_comment(line) {
        entry.comments.push(line.to_string());
        return true;
    }

    let (keyword, value) = split_directive(line);
    let accepted = HOST_DIRECTIVES
        .iter()
        .find(|(name, _)| keyword.eq_ignore_ascii_case(name))
        .map(|(_, setter)| setter(entry, value))
        .unwrap_or(false);

    if !accepted {
        entry.other_configs.push(line.to_string());
    }
    true
}

/// Serialize a document, stamping the header with the current local time
pub fn serialize(doc: &ConfigDocument) -> String {
    serialize_at(doc, &chrono::Local::now().to_rfc2822())
}

/// Serialize a document with an explicit header timestamp
pub fn serialize_at(doc: &ConfigDocument, timestamp: &str) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(2 + doc.comments.len() + doc.hosts.len() * 7);
    lines.push(format!(
        "# Create By {}(v:{}) at: {}",
        TOOL_NAME, doc.version, timestamp
    ));
    lines.extend(doc.comments.iter().cloned());
    // Keeps document comments apart from the first host's own comments
    lines.push(String::new());

    for host in &doc.hosts {
        lines.extend(host.comments.iter().cloned());
        lines.push(format!("Host\t{}", host.name));
        lines.push(format!("\tHostname\t{}", host.host));
        lines.push(format!("\tUser\t{}", host.user));
        if let Some(port) = host.port.filter(|p| *p != 0) {
            lines.push(format!("\tPort\t{}", port));
        }
        lines.push(format!("\tIdentityFile\t{}", host.identity_file));
        lines.extend(host.other_configs.iter().map(|line| format!("\t{}", line)));
        lines.push(String::new());
    }

    lines.join("\n")
}
