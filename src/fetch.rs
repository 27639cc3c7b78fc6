//! Domain list downloads.
//!
//! A list is plain text with one domain per line. Blank lines and lines
//! starting with `#`, `//` or `!` are comments. Every other line is
//! lower-cased and validated; invalid lines are logged and dropped without
//! affecting the rest of the list.

use std::fmt;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use thiserror::Error;

use crate::domain::{is_valid_domain, normalize_domain};
use crate::error::FetchError;
use crate::Result;

/// Comment prefixes recognized in domain lists.
const COMMENT_PREFIXES: &[&str] = &["#", "//", "!"];

/// Longest line accepted in a domain list, terminator excluded.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Default User-Agent for list downloads.
pub const DEFAULT_USER_AGENT: &str = concat!("k2geosite/", env!("CARGO_PKG_VERSION"));

/// HTTP settings for [`ListFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A line that was dropped because it is not a valid domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    /// 1-based line number in the downloaded list
    pub line_number: usize,
    /// Trimmed original text of the line
    pub text: String,
}

impl fmt::Display for InvalidLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_number, self.text)
    }
}

/// A line grew past [`MAX_LINE_LEN`] bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line_number} is longer than {limit} bytes")]
pub struct LineTooLong {
    pub line_number: usize,
    pub limit: usize,
}

/// Result of downloading one list.
///
/// `error` being set does not imply `domains` is empty: a body that breaks
/// mid-stream keeps everything validated before the failure.
#[derive(Debug, Default)]
pub struct FetchedList {
    pub domains: Vec<String>,
    pub warnings: Vec<InvalidLine>,
    pub lines: usize,
    pub error: Option<FetchError>,
}

impl FetchedList {
    fn failed(error: FetchError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Downloads and filters domain lists.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ListFetcher {
    client: reqwest::Client,
}

impl ListFetcher {
    /// Create a fetcher from the given HTTP settings.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Download `url` and return its valid domains in file order.
    pub async fn fetch_list(&self, url: &str) -> FetchedList {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return FetchedList::failed(FetchError::Transport {
                    url: url.to_string(),
                    source: e,
                })
            }
        };

        let status = response.status();
        if !status.is_success() {
            return FetchedList::failed(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        scan_stream(url, response.bytes_stream()).await
    }
}

/// Filter a body delivered as a stream of byte chunks.
///
/// A stream error or an over-long line ends the scan: the domains collected
/// so far are kept and the error is reported as [`FetchError::Read`]. An
/// unterminated trailing line is only processed when the stream ends cleanly.
pub async fn scan_stream<S, B, E>(url: &str, stream: S) -> FetchedList
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let mut scanner = LineScanner::new(url);
    futures_util::pin_mut!(stream);

    while let Some(chunk) = stream.next().await {
        let pushed = match chunk {
            Ok(bytes) => scanner.push(bytes.as_ref()).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(reason) = pushed {
            return read_failed(url, scanner, reason);
        }
    }

    scanner.finish()
}

fn read_failed(url: &str, scanner: LineScanner, reason: String) -> FetchedList {
    let mut list = scanner.into_partial();
    list.error = Some(FetchError::Read {
        url: url.to_string(),
        domains: list.domains.len(),
        reason,
    });
    list
}

/// Push-based line filter for domain lists.
///
/// Chunks may split lines anywhere; only complete lines are processed until
/// [`LineScanner::finish`] flushes the remainder. Lines are capped at
/// [`MAX_LINE_LEN`] bytes so a body without newlines cannot grow the buffer
/// without bound.
#[derive(Debug)]
pub struct LineScanner {
    origin: String,
    pending: Vec<u8>,
    line_number: usize,
    domains: Vec<String>,
    warnings: Vec<InvalidLine>,
}

impl LineScanner {
    /// Create a scanner; `origin` names the list in warnings.
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            pending: Vec::new(),
            line_number: 0,
            domains: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Feed the next chunk of the body.
    ///
    /// Fails once a line exceeds [`MAX_LINE_LEN`]; the scanner should then be
    /// abandoned with [`LineScanner::into_partial`].
    pub fn push(&mut self, chunk: &[u8]) -> std::result::Result<(), LineTooLong> {
        let mut buf = std::mem::take(&mut self.pending);
        // Bytes already pending hold no newline.
        let mut search_from = buf.len();
        buf.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(pos) = buf[search_from..].iter().position(|&b| b == b'\n') {
            let end = search_from + pos;
            if end - start > MAX_LINE_LEN {
                return Err(self.line_too_long());
            }
            self.process_line(&buf[start..end]);
            start = end + 1;
            search_from = start;
        }

        buf.drain(..start);
        self.pending = buf;
        if self.pending.len() > MAX_LINE_LEN {
            return Err(self.line_too_long());
        }
        Ok(())
    }

    /// Flush the trailing line, if any, and return the result.
    pub fn finish(mut self) -> FetchedList {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.process_line(&rest);
        }
        self.into_partial()
    }

    /// Return what has been collected, discarding any unterminated line.
    pub fn into_partial(self) -> FetchedList {
        FetchedList {
            domains: self.domains,
            warnings: self.warnings,
            lines: self.line_number,
            error: None,
        }
    }

    fn line_too_long(&self) -> LineTooLong {
        LineTooLong {
            line_number: self.line_number + 1,
            limit: MAX_LINE_LEN,
        }
    }

    fn process_line(&mut self, raw: &[u8]) {
        self.line_number += 1;

        let text = String::from_utf8_lossy(raw);
        let line = text.trim();
        if line.is_empty() || COMMENT_PREFIXES.iter().any(|p| line.starts_with(p)) {
            return;
        }

        let domain = normalize_domain(line);
        if is_valid_domain(&domain) {
            self.domains.push(domain);
        } else {
            log::warn!(
                "{}: skipping invalid domain at line {}: {}",
                self.origin,
                self.line_number,
                line
            );
            self.warnings.push(InvalidLine {
                line_number: self.line_number,
                text: line.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn scan(text: &str) -> FetchedList {
        let mut scanner = LineScanner::new("test");
        scanner.push(text.as_bytes()).unwrap();
        scanner.finish()
    }

    #[test]
    fn test_skips_comments_and_blank_lines() {
        let list = scan("# header\n\n// note\n! adblock\n   \nexample.com\n");
        assert_eq!(list.domains, vec!["example.com"]);
        assert!(list.warnings.is_empty());
        assert_eq!(list.lines, 6);
    }

    #[test]
    fn test_lowercases_and_trims() {
        let list = scan("  WWW.Example.COM  \r\nfoo.ORG");
        assert_eq!(list.domains, vec!["www.example.com", "foo.org"]);
    }

    #[test]
    fn test_partial_tolerance_reports_line_numbers() {
        let lines = [
            "a.com", "b.com", "bad_one.com", "c.com", "d.com", "e.com", "-bad.com", "f.com",
            "g.com", "h.com",
        ];
        let list = scan(&lines.join("\n"));

        assert_eq!(list.domains.len(), 8);
        assert_eq!(
            list.warnings,
            vec![
                InvalidLine {
                    line_number: 3,
                    text: "bad_one.com".to_string()
                },
                InvalidLine {
                    line_number: 7,
                    text: "-bad.com".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let first = scan("Example.COM\nSub.Domain.Net\n");
        let again = scan(&first.domains.join("\n"));
        assert_eq!(first.domains, again.domains);
    }

    #[test]
    fn test_lines_split_across_chunks() {
        let mut scanner = LineScanner::new("test");
        scanner.push(b"goo").unwrap();
        scanner.push(b"gle.com\nbai").unwrap();
        scanner.push(b"du.com").unwrap();
        scanner.push(b"\n\nyahoo.co").unwrap();
        let list = scanner.finish();

        assert_eq!(list.domains, vec!["google.com", "baidu.com", "yahoo.co"]);
        assert_eq!(list.lines, 4);
    }

    #[test]
    fn test_invalid_utf8_is_a_warning() {
        let mut scanner = LineScanner::new("test");
        scanner.push(b"ok.com\n\xff\xfe.com\n").unwrap();
        let list = scanner.finish();

        assert_eq!(list.domains, vec!["ok.com"]);
        assert_eq!(list.warnings.len(), 1);
        assert_eq!(list.warnings[0].line_number, 2);
    }

    #[test]
    fn test_line_at_limit_is_accepted() {
        let mut body = "a".repeat(MAX_LINE_LEN - 4);
        body.push_str(".com\nok.com\n");

        let mut scanner = LineScanner::new("test");
        for chunk in body.as_bytes().chunks(1000) {
            scanner.push(chunk).unwrap();
        }
        let list = scanner.finish();

        // The long line is an invalid domain, not an error
        assert_eq!(list.domains, vec!["ok.com"]);
        assert_eq!(list.warnings.len(), 1);
        assert_eq!(list.lines, 2);
    }

    #[test]
    fn test_unterminated_line_over_limit_fails() {
        let mut scanner = LineScanner::new("test");
        scanner.push(b"first.com\n").unwrap();

        let chunk = vec![b'x'; 4096];
        let mut result = Ok(());
        for _ in 0..=MAX_LINE_LEN / chunk.len() {
            result = scanner.push(&chunk);
            if result.is_err() {
                break;
            }
        }

        assert_eq!(
            result,
            Err(LineTooLong {
                line_number: 2,
                limit: MAX_LINE_LEN
            })
        );
        assert_eq!(scanner.into_partial().domains, vec!["first.com"]);
    }

    #[test]
    fn test_terminated_line_over_limit_fails() {
        let mut body = vec![b'y'; MAX_LINE_LEN + 1];
        body.push(b'\n');

        let mut scanner = LineScanner::new("test");
        let err = scanner.push(&body).unwrap_err();
        assert_eq!(err.line_number, 1);
    }

    #[tokio::test]
    async fn test_scan_stream_reports_long_line_as_read_error() {
        let long = vec![b'z'; MAX_LINE_LEN + 10];
        let chunks: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(b"kept.com\n".to_vec()),
            Ok(long),
            Ok(b"\nlost.com\n".to_vec()),
        ];
        let list = scan_stream("http://x/list.txt", stream::iter(chunks)).await;

        assert_eq!(list.domains, vec!["kept.com"]);
        match list.error {
            Some(FetchError::Read {
                domains,
                ref reason,
                ..
            }) => {
                assert_eq!(domains, 1);
                assert!(reason.contains("line 2 is longer than 65536 bytes"));
            }
            ref other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scan_stream_keeps_partial_result_on_read_error() {
        let chunks: Vec<std::result::Result<&[u8], String>> = vec![
            Ok(b"one.com\ntwo.com\nthr".as_slice()),
            Err("connection reset".to_string()),
            Ok(b"ee.com\n".as_slice()),
        ];
        let list = scan_stream("http://x/list.txt", stream::iter(chunks)).await;

        assert_eq!(list.domains, vec!["one.com", "two.com"]);
        match list.error {
            Some(FetchError::Read {
                ref url,
                domains,
                ref reason,
            }) => {
                assert_eq!(url, "http://x/list.txt");
                assert_eq!(domains, 2);
                assert_eq!(reason, "connection reset");
            }
            ref other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scan_stream_clean_end() {
        let chunks: Vec<std::result::Result<Vec<u8>, String>> =
            vec![Ok(b"a.com\n".to_vec()), Ok(b"b.com".to_vec())];
        let list = scan_stream("http://x/list.txt", stream::iter(chunks)).await;

        assert!(list.error.is_none());
        assert_eq!(list.domains, vec!["a.com", "b.com"]);
    }
}
