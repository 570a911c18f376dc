use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::line::{self, Line, SUBTEST_INDENT, SUPPORTED_VERSION};
use crate::{Error, LineSource, Testpoint, Testsuite, DEFAULT_VERSION};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Deepest accepted subtest nesting, deeper input fails with [Error::NestingTooDeep].
    pub max_depth: usize,
    /// Lines skipped while looking for the summary line of a subtest before failing with
    /// [Error::MissingSummary].
    pub max_summary_skips: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_summary_skips: 1024,
        }
    }
}

/// What reading at one nesting level produced.
#[derive(Debug)]
enum Step {
    Item(Testpoint),
    /// The input ended while looking for what follows this testpoint.
    Last(Testpoint),
    /// The current line belongs to an outer nesting level.
    EndOfLevel,
    EndOfStream,
}

///
/// Entrypoint of this library. This struct pulls lines from a [LineSource] and holds the document
/// state while parsing.
///
/// A parser is meant to be driven by a single caller. Use [suite](Self::suite) to read everything,
/// or [next_testpoint](Self::next_testpoint) to consume top level results as they arrive.
///
pub struct Parser<S> {
    source: S,
    config: ParserConfig,
    version: u32,
    plan: Option<usize>,
    /// Shared by every nesting level, subtests do not restart the numbering.
    last_num: usize,
    depth: usize,
    started: Instant,
    last_event: Instant,
    tests: Vec<Testpoint>,
}

impl<S: LineSource> Parser<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, ParserConfig::default())
    }

    pub fn with_config(source: S, config: ParserConfig) -> Self {
        let now = Instant::now();
        Self {
            source,
            config,
            version: DEFAULT_VERSION,
            plan: None,
            last_num: 0,
            depth: 0,
            started: now,
            last_event: now,
            tests: Vec::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn plan(&self) -> Option<usize> {
        self.plan
    }

    ///
    /// The top level testpoints read so far. This stays available after an error, the last
    /// testpoints may then be missing.
    ///
    pub fn tests(&self) -> &[Testpoint] {
        &self.tests
    }

    ///
    /// Reads the next top level testpoint, with its subtests, diagnostics and YAML block. Returns
    /// `None` once the input is exhausted.
    ///
    pub fn next_testpoint(&mut self) -> Result<Option<&Testpoint>, Error> {
        let test = match self.next_at("")? {
            Step::Item(test) | Step::Last(test) => test,
            // Every line belongs to the root level, so only the end of the input stops it.
            Step::EndOfLevel | Step::EndOfStream => return Ok(None),
        };

        self.tests.push(test);
        Ok(self.tests.last())
    }

    ///
    /// Reads the remaining input and computes the overall result.
    ///
    pub fn suite(mut self) -> Result<Testsuite, Error> {
        while self.next_testpoint()?.is_some() {}

        let ok = self.plan == Some(self.tests.len()) && self.tests.iter().all(|t| t.ok);
        debug!(tests = self.tests.len(), plan = ?self.plan, ok, "finished suite");

        Ok(Testsuite {
            ok,
            tests: self.tests,
            plan: self.plan,
            version: self.version,
            time: self.last_event.duration_since(self.started),
        })
    }

    fn next_at(&mut self, indent: &str) -> Result<Step, Error> {
        loop {
            let Some(line) = self.source.current() else {
                return Ok(Step::EndOfStream);
            };
            let Some(text) = line.strip_prefix(indent) else {
                return Ok(Step::EndOfLevel);
            };

            match line::classify(text) {
                Line::Version(version) => {
                    self.version = line::read_version(version)?;
                    debug!(version = self.version, "read version header");
                }
                Line::Plan(plan) => {
                    let plan = line::read_plan(plan)?;
                    debug!(plan, depth = self.depth, "read plan");
                    self.plan = Some(plan);
                }
                Line::Test { ok, rest } => {
                    let rest = rest.to_string();
                    return self.read_testpoint(ok, &rest, indent);
                }
                Line::Subtest(name) => {
                    let name = name.map(str::to_string);
                    return self.read_subtest(indent, name);
                }
                Line::Other => trace!(line = text, "skipping unknown line"),
            }

            if !self.source.advance()? {
                return Ok(Step::EndOfStream);
            }
        }
    }

    fn read_testpoint(&mut self, ok: bool, rest: &str, indent: &str) -> Result<Step, Error> {
        let now = Instant::now();
        let time = now.duration_since(self.last_event);
        self.last_event = now;

        let mut test = line::read_test_line(rest).into_testpoint(ok, self.last_num + 1);
        test.time = time;
        self.last_num = test.num;

        let mut more = self.source.advance()?;
        while more {
            let Some(text) = self.source.current().and_then(|l| l.strip_prefix(indent)) else {
                break;
            };

            if self.version == SUPPORTED_VERSION && text.trim() == "---" {
                test.yaml = Some(self.read_yaml()?);
                more = self.source.current().is_some();
                continue;
            }

            if !text.starts_with('#') || line::subtest_header(text).is_some() {
                break;
            }

            test.diagnostic.push_str(text[1..].trim());
            test.diagnostic.push('\n');
            more = self.source.advance()?;
        }

        Ok(if more {
            Step::Item(test)
        } else {
            Step::Last(test)
        })
    }

    /// Reads up to the `...` line, and moves past it.
    fn read_yaml(&mut self) -> Result<String, Error> {
        let mut yaml = String::new();
        while self.source.advance()? {
            match self.source.current() {
                Some(line) if line.trim() != "..." => {
                    yaml.push_str(line);
                    yaml.push('\n');
                }
                _ => {
                    self.source.advance()?;
                    break;
                }
            }
        }
        Ok(yaml)
    }

    fn read_subtest(&mut self, indent: &str, name: Option<String>) -> Result<Step, Error> {
        if self.depth >= self.config.max_depth {
            return Err(Error::NestingTooDeep {
                limit: self.config.max_depth,
            });
        }

        self.depth += 1;
        let step = self.read_subtest_body(indent, name);
        self.depth -= 1;
        step
    }

    /// Runs with the depth raised, including the summary line: a header in its place nests
    /// one level further.
    fn read_subtest_body(&mut self, indent: &str, name: Option<String>) -> Result<Step, Error> {
        debug!(?name, depth = self.depth, "entering subtest");
        if !self.source.advance()? {
            warn!(?name, "input ended after a subtest header");
            return Ok(Step::EndOfStream);
        }

        let Some(children) = self.read_children(&format!("{indent}{SUBTEST_INDENT}"))? else {
            warn!(?name, "input ended inside a subtest");
            return Ok(Step::EndOfStream);
        };

        let mut skipped = 0;
        let step = loop {
            match self.next_at(indent)? {
                Step::EndOfLevel if skipped < self.config.max_summary_skips => {
                    warn!(line = ?self.source.current(), "subtest summary missing, skipping line");
                    skipped += 1;
                    if !self.source.advance()? {
                        break Step::EndOfStream;
                    }
                }
                Step::EndOfLevel => return Err(Error::MissingSummary { skipped }),
                step => break step,
            }
        };

        debug!(?name, subtests = children.len(), "leaving subtest");
        Ok(match step {
            Step::Item(test) => Step::Item(summarize(test, name, children)),
            Step::Last(test) => Step::Last(summarize(test, name, children)),
            step => {
                warn!(?name, "input ended before the subtest summary");
                step
            }
        })
    }

    /// Returns `None` if the input ended before the subtest did.
    fn read_children(&mut self, indent: &str) -> Result<Option<Vec<Testpoint>>, Error> {
        let mut children = Vec::new();
        loop {
            match self.next_at(indent)? {
                Step::Item(test) => children.push(test),
                Step::EndOfLevel => return Ok(Some(children)),
                Step::Last(_) | Step::EndOfStream => return Ok(None),
            }
        }
    }
}

fn summarize(mut test: Testpoint, name: Option<String>, children: Vec<Testpoint>) -> Testpoint {
    test.name = name;
    test.subtests = Some(children);
    test
}
