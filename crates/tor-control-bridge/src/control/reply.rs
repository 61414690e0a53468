//! Control protocol reply grammar.
//!
//! A reply is a sequence of CRLF-terminated lines, each `DDD<sep><text>`:
//! - `DDD-text`: mid-reply line
//! - `DDD+text`: start of a data block, continued by raw lines up to a lone `.`
//! - `DDD text`: final line, the reply is complete
//!
//! [`ReplyScanner`] applies this grammar incrementally to a growing buffer so
//! the client knows when to stop reading.

/// Separator between the status code and the line text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// ` `: last line of the reply.
    Final,
    /// `-`: more lines follow.
    Continuation,
    /// `+`: a dot-terminated data block follows.
    Data,
}

impl Separator {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b' ' => Some(Self::Final),
            b'-' => Some(Self::Continuation),
            b'+' => Some(Self::Data),
            _ => None,
        }
    }
}

/// Status code and separator of one status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyLine {
    pub status: u16,
    pub separator: Separator,
}

impl ReplyLine {
    pub fn is_final(&self) -> bool {
        self.separator == Separator::Final
    }
}

/// Parse a single line (terminator already stripped). Returns `None` for
/// anything that is not a status line.
pub fn parse_line(line: &[u8]) -> Option<ReplyLine> {
    let &[a, b, c, sep, ..] = line else {
        return None;
    };
    if ![a, b, c].iter().all(u8::is_ascii_digit) {
        return None;
    }

    let status = u16::from(a - b'0') * 100 + u16::from(b - b'0') * 10 + u16::from(c - b'0');
    let separator = Separator::from_byte(sep)?;
    Some(ReplyLine { status, separator })
}

/// Incremental completion detector.
///
/// Feed it the whole accumulated buffer after every read; it only examines
/// complete lines it has not seen before. A trailing partial line is left
/// for the next call.
#[derive(Debug, Default)]
pub struct ReplyScanner {
    consumed: usize,
    in_data_block: bool,
    final_status: Option<u16>,
}

impl ReplyScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan new complete lines in `buf`. Returns the status code of the final
    /// line once one has been seen.
    pub fn feed(&mut self, buf: &[u8]) -> Option<u16> {
        while self.final_status.is_none() {
            let Some(offset) = buf[self.consumed..].iter().position(|&b| b == b'\n') else {
                break;
            };
            let line = &buf[self.consumed..self.consumed + offset];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            self.consumed += offset + 1;

            if self.in_data_block {
                if line == b"." {
                    self.in_data_block = false;
                }
                continue;
            }

            match parse_line(line) {
                Some(parsed) if parsed.separator == Separator::Data => self.in_data_block = true,
                Some(parsed) if parsed.is_final() => self.final_status = Some(parsed.status),
                _ => {}
            }
        }
        self.final_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_separator() {
        let line = parse_line(b"250 OK").unwrap();
        assert_eq!(line.status, 250);
        assert!(line.is_final());

        assert_eq!(
            parse_line(b"250-version=0.4.8.10").unwrap().separator,
            Separator::Continuation
        );
        assert_eq!(
            parse_line(b"250+circuit-status=").unwrap().separator,
            Separator::Data
        );
        assert_eq!(parse_line(b"552 Unrecognized key").unwrap().status, 552);
    }

    #[test]
    fn rejects_non_status_lines() {
        assert!(parse_line(b"").is_none());
        assert!(parse_line(b"250").is_none());
        assert!(parse_line(b"25a OK").is_none());
        assert!(parse_line(b"250:OK").is_none());
        assert!(parse_line(b"123 BUILT $AAAA~Guard").is_some());
        assert!(parse_line(b".").is_none());
    }

    #[test]
    fn completes_on_final_line_across_chunks() {
        let mut scanner = ReplyScanner::new();
        let mut buf = b"250-foo\r\n".to_vec();
        assert_eq!(scanner.feed(&buf), None);

        buf.extend_from_slice(b"250 bar\r\n");
        assert_eq!(scanner.feed(&buf), Some(250));
    }

    #[test]
    fn partial_final_line_is_not_complete() {
        let mut scanner = ReplyScanner::new();
        let mut buf = b"250 O".to_vec();
        assert_eq!(scanner.feed(&buf), None);

        buf.extend_from_slice(b"K\r\n");
        assert_eq!(scanner.feed(&buf), Some(250));
    }

    #[test]
    fn data_block_lines_are_not_status_lines() {
        let mut scanner = ReplyScanner::new();
        let reply = b"250+circuit-status=\r\n123 BUILT $AAAA~Guard,$BBBB~Middle PURPOSE=GENERAL\r\n.\r\n";
        assert_eq!(scanner.feed(reply), None);

        let mut buf = reply.to_vec();
        buf.extend_from_slice(b"250 OK\r\n");
        assert_eq!(scanner.feed(&buf), Some(250));
    }

    #[test]
    fn error_status_also_completes() {
        let mut scanner = ReplyScanner::new();
        assert_eq!(scanner.feed(b"515 Authentication failed\r\n"), Some(515));
    }
}
