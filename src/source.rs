//! Sequential line suppliers consumed by the [Parser](crate::Parser).

use std::io::{self, BufRead};

/// A sequential supplier of lines with a single line of lookahead.
///
/// Implementations start positioned on the first line of their input. The parser only ever looks
/// at [current](Self::current) and moves forward with [advance](Self::advance).
pub trait LineSource {
    /// The line the source is positioned on, without its line terminator. `None` once the input
    /// is exhausted.
    fn current(&self) -> Option<&str>;

    /// Moves to the next line. Returns `Ok(false)` when there is no next line, in which case
    /// [current](Self::current) returns `None` afterwards.
    fn advance(&mut self) -> io::Result<bool>;
}

/// Lines of an in-memory document.
pub struct StrLines<'a> {
    lines: std::str::Lines<'a>,
    current: Option<&'a str>,
}

impl<'a> StrLines<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lines = input.lines();
        let current = lines.next();
        Self { lines, current }
    }
}

impl LineSource for StrLines<'_> {
    fn current(&self) -> Option<&str> {
        self.current
    }

    fn advance(&mut self) -> io::Result<bool> {
        self.current = self.lines.next();
        Ok(self.current.is_some())
    }
}

/// Lines read on demand from any [BufRead], for example a locked stdin or a buffered file.
///
/// Reading blocks whenever the underlying reader blocks.
pub struct ReaderLines<R> {
    reader: R,
    current: Option<String>,
}

impl<R: BufRead> ReaderLines<R> {
    /// Wraps `reader` and reads its first line.
    pub fn new(reader: R) -> io::Result<Self> {
        let mut this = Self {
            reader,
            current: None,
        };
        this.advance()?;
        Ok(this)
    }
}

impl<R: BufRead> LineSource for ReaderLines<R> {
    fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn advance(&mut self) -> io::Result<bool> {
        let mut line = self.current.take().unwrap_or_default();
        line.clear();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(false);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        self.current = Some(line);
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::{LineSource, ReaderLines, StrLines};

    fn drain(mut source: impl LineSource) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = source.current() {
            lines.push(line.to_string());
            if !source.advance().unwrap() {
                break;
            }
        }
        assert_eq!(source.current(), None);
        lines
    }

    #[test]
    fn str_lines() {
        assert_eq!(drain(StrLines::new("a\n\nb\n")), vec!["a", "", "b"]);
        assert!(drain(StrLines::new("")).is_empty());
    }

    #[test]
    fn reader_lines_strips_terminators() {
        let input = "ok 1\r\n  # diag\nnot ok 2";
        let source = ReaderLines::new(input.as_bytes()).unwrap();
        assert_eq!(drain(source), vec!["ok 1", "  # diag", "not ok 2"]);
    }

    #[test]
    fn reader_lines_empty() {
        let source = ReaderLines::new(&b""[..]).unwrap();
        assert_eq!(source.current(), None);
    }

    #[test]
    fn reader_lines_invalid_utf8() {
        let result = ReaderLines::new(&b"ok 1 \xff\n"[..]);
        assert!(result.is_err());
    }
}
