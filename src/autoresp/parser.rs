//! Rule file parsing.
//!
//! One rule per line:
//!
//! ```text
//! ^/status$       "/var/www/status.html"
//! ^/health.*      "/var/www/health.html"
//! ```
//!
//! Lines that do not fit the grammar are skipped without error.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::autoresp::error::RuleError;
use crate::autoresp::rules::{CompileOptions, Rule, RuleSet};

/// Line grammar: `<path pattern> "<local file pattern>"`.
pub const RULE_LINE_PATTERN: &str =
    r#"^[[:space:]]*([^"]+)[[:space:]]+"([^"]+)"[[:space:]]*$"#;

/// Line buffer size. A line may carry at most `LINE_BUFFER_LEN - 1`
/// bytes of content; the `\n` or `\r\n` terminator is not counted.
pub const LINE_BUFFER_LEN: usize = 512;

const MAX_LINE_CONTENT: usize = LINE_BUFFER_LEN - 1;

static RULE_LINE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn rule_line() -> Result<&'static Regex, RuleError> {
    RULE_LINE
        .get_or_init(|| {
            RegexBuilder::new(RULE_LINE_PATTERN)
                .case_insensitive(true)
                .multi_line(true)
                .build()
        })
        .as_ref()
        .map_err(|e| RuleError::Grammar(e.clone()))
}

/// Split one line into `(path_pattern, local_file_pattern)`.
///
/// Returns `None` when the line does not fit the grammar.
pub fn parse_line(line: &str) -> Result<Option<(String, String)>, RuleError> {
    let grammar = rule_line()?;
    let line = line.trim_end_matches(['\n', '\r']);

    let Some(caps) = grammar.captures(line) else {
        return Ok(None);
    };

    // The greedy path class keeps all but one separator character.
    let path = caps[1].trim_end();
    if path.is_empty() {
        return Ok(None);
    }
    Ok(Some((path.to_string(), caps[2].to_string())))
}

/// Outcome of reading one line.
#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    Eof,
    /// `buf` holds the line content without its terminator.
    Line,
    /// The line exceeded the bound and was discarded; carries its length.
    TooLong(usize),
}

/// Read one line into `buf`, holding at most the content bound plus a
/// `\r\n` terminator in memory. The remainder of an overlong line is
/// drained without being buffered.
fn read_bounded_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<LineRead> {
    buf.clear();
    let limit = (MAX_LINE_CONTENT + 2) as u64;
    let read = (&mut *reader).take(limit).read_until(b'\n', buf)?;
    if read == 0 {
        return Ok(LineRead::Eof);
    }

    let terminated = buf.last() == Some(&b'\n');
    if !terminated && read as u64 == limit {
        let rest = skip_line(reader)?;
        return Ok(LineRead::TooLong(read + rest));
    }

    if terminated {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    if buf.len() > MAX_LINE_CONTENT {
        return Ok(LineRead::TooLong(buf.len()));
    }
    Ok(LineRead::Line)
}

/// Consume input up to and including the next `\n`, returning the
/// number of bytes skipped.
fn skip_line<R: BufRead>(reader: &mut R) -> io::Result<usize> {
    let mut skipped = 0;
    loop {
        let (used, done) = {
            let available = match reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(skipped);
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(used);
        skipped += used;
        if done {
            return Ok(skipped);
        }
    }
}

/// Build a rule set from a line-oriented reader.
///
/// Any compile or read failure aborts the whole parse so a broken file
/// never yields a partial set.
pub fn parse_rules<R: BufRead>(mut reader: R, options: CompileOptions) -> Result<RuleSet, RuleError> {
    rule_line()?;

    let mut set = RuleSet::new();
    let mut buf = Vec::with_capacity(MAX_LINE_CONTENT + 2);
    let mut line_no = 0;

    loop {
        line_no += 1;
        let read = read_bounded_line(&mut reader, &mut buf)
            .map_err(|source| RuleError::Read { line: line_no, source })?;
        match read {
            LineRead::Eof => break,
            LineRead::TooLong(len) => {
                tracing::warn!(line = line_no, len, "Rule line too long, skipping");
                continue;
            }
            LineRead::Line => {}
        }

        let line = String::from_utf8_lossy(&buf);
        let Some((path_pattern, local_file_pattern)) = parse_line(&line)? else {
            tracing::trace!(line = line_no, "Ignoring non-rule line");
            continue;
        };

        tracing::info!(
            path_pattern = %path_pattern,
            local_file_pattern = %local_file_pattern,
            "path pattern {} corresponds to {}",
            path_pattern,
            local_file_pattern
        );

        let rule = Rule::new(path_pattern.as_str(), local_file_pattern, options).map_err(|source| {
            RuleError::InvalidPattern {
                line: line_no,
                pattern: path_pattern.clone(),
                source,
            }
        })?;
        set.push(rule);
    }

    Ok(set)
}

/// Load a rule file from disk.
///
/// Returns `Ok(None)` if the file cannot be opened.
pub fn load_rules(path: &Path, options: CompileOptions) -> Result<Option<RuleSet>, RuleError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::info!(path = %path.display(), error = %e, "error in opening rules file");
            return Ok(None);
        }
    };

    parse_rules(BufReader::new(file), options).map(Some)
}
