//! This crate is a parser for the [Test Anything Protocol](https://testanything.org).
//!
//! It reads TAP version 12 and 13 output line by line and builds a tree of [Testpoint]s, nesting
//! the indented `# Subtest:` blocks under the testpoint that summarizes them. Parsing is best
//! effort: unknown lines are skipped and a missing subtest summary is searched for instead of
//! aborting. The main entrypoint is the [Parser] structure, [parse_str] and [parse_reader] wrap it
//! for the common cases.
//!
//! # Example
//!
//! ```rust
//! use tap_suite::{parse_str, Directive};
//!
//! let document = "1..3\nok 1 hogehoge\nnot ok foobar\n# Doesn't wiggle\nnot ok 3 foobar # TODO not implemented yet";
//! let suite = parse_str(document).unwrap();
//!
//! assert!(!suite.ok);
//! assert_eq!(suite.plan, Some(3));
//! assert_eq!(suite.tests.iter().map(|t| t.num).collect::<Vec<_>>(), [1, 2, 3]);
//! assert_eq!(suite.tests[1].diagnostic, "Doesn't wiggle\n");
//! assert_eq!(suite.tests[2].directive, Directive::Todo);
//! assert_eq!(suite.tests[2].explanation, "not implemented yet");
//! ```

use std::io::{self, BufRead};
use std::num::ParseIntError;
use std::time::Duration;

mod line;
mod parser;
mod render;
mod source;


pub use parser::{Parser, ParserConfig};
pub use source::{LineSource, ReaderLines, StrLines};

/// TAP version assumed when the document has no version header.
pub const DEFAULT_VERSION: u32 = 12;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub enum Directive {
    #[default]
    None,
    Todo,
    Skip,
}

/// A single `ok`/`not ok` result.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Testpoint {
    pub ok: bool,
    /// Number read from the line, or the previous number plus one when the line has none.
    /// Gaps and duplicates are kept as written.
    pub num: usize,
    pub description: String,
    pub directive: Directive,
    /// Text following the directive. When there is no directive this holds everything after the
    /// `#`.
    pub explanation: String,
    /// The `#` lines following the testpoint, one per line, each terminated by a newline.
    pub diagnostic: String,
    /// Time elapsed since the previous testpoint was parsed.
    pub time: Duration,
    /// Raw lines between `---` and `...`, only read in TAP version 13. Indentation is kept.
    pub yaml: Option<String>,
    /// Name given by the `# Subtest:` header, if any.
    pub name: Option<String>,
    /// Present only when a `# Subtest:` block preceded this testpoint.
    pub subtests: Option<Vec<Testpoint>>,
}

/// The parsed document.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Testsuite {
    /// All top level testpoints are ok, and their count matches a declared plan.
    pub ok: bool,
    pub tests: Vec<Testpoint>,
    /// Count of the last `1..N` line, at any nesting level.
    pub plan: Option<usize>,
    pub version: u32,
    /// Time between the creation of the parser and the last testpoint.
    pub time: Duration,
}

impl Testsuite {
    pub fn passed(&self) -> usize {
        self.tests.iter().filter(|t| t.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.tests.iter().filter(|t| !t.ok).count()
    }

    pub fn skipped(&self) -> usize {
        self.count_directive(Directive::Skip)
    }

    pub fn todo(&self) -> usize {
        self.count_directive(Directive::Todo)
    }

    fn count_directive(&self, directive: Directive) -> usize {
        self.tests
            .iter()
            .filter(|t| t.directive == directive)
            .count()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Version `{0}` is unsupported, only version 13 may be declared")]
    UnsupportedVersion(String),
    #[error("Could not read number")]
    MalformedNumber(#[from] ParseIntError),
    #[error("Subtests are nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
    #[error("No summary line found for subtest after skipping {skipped} lines")]
    MissingSummary { skipped: usize },
    #[error("Line is not a testpoint: {0}")]
    UnknownLine(String),
    #[error("Could not read input")]
    Io(#[from] io::Error),
}

/// Parses a whole in-memory document.
pub fn parse_str(input: &str) -> Result<Testsuite, Error> {
    Parser::new(StrLines::new(input)).suite()
}

/// Parses everything `reader` yields until its end.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Testsuite, Error> {
    Parser::new(ReaderLines::new(reader)?).suite()
}
