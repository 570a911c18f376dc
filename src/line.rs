use std::num::ParseIntError;
use std::str::FromStr;

use tracing::warn;

use crate::{Directive, Error, Testpoint};

const VERSION_PREFIX: &str = "TAP version ";
const PLAN_PREFIX: &str = "1..";
const SUBTEST_PREFIX: &str = "# Subtest:";

/// Extra indentation of the lines inside a subtest, relative to its summary line.
pub(crate) const SUBTEST_INDENT: &str = "    ";

/// The only version header accepted.
pub(crate) const SUPPORTED_VERSION: u32 = 13;

/// A line with the indentation of its nesting level already removed.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    Version(&'a str),
    Plan(&'a str),
    Test { ok: bool, rest: &'a str },
    /// Holds the subtest name, if the header has a non empty one.
    Subtest(Option<&'a str>),
    Other,
}

pub(crate) fn classify(text: &str) -> Line<'_> {
    if let Some(version) = text.strip_prefix(VERSION_PREFIX) {
        Line::Version(version)
    } else if let Some(plan) = text.strip_prefix(PLAN_PREFIX) {
        Line::Plan(plan)
    } else if let Some(rest) = text.strip_prefix("ok ") {
        Line::Test { ok: true, rest }
    } else if let Some(rest) = text.strip_prefix("not ok ") {
        Line::Test { ok: false, rest }
    } else if let Some(name) = subtest_header(text) {
        Line::Subtest(name)
    } else {
        Line::Other
    }
}

/// Recognises `# Subtest: NAME`, optionally indented by four spaces.
pub(crate) fn subtest_header(text: &str) -> Option<Option<&str>> {
    let name = text
        .strip_prefix(SUBTEST_PREFIX)
        .or_else(|| text.strip_prefix("    ")?.strip_prefix(SUBTEST_PREFIX))?
        .trim();

    Some(if name.is_empty() { None } else { Some(name) })
}

pub(crate) fn read_version(version: &str) -> Result<u32, Error> {
    let version = version.trim();
    match version.parse::<u32>() {
        Ok(SUPPORTED_VERSION) => Ok(SUPPORTED_VERSION),
        _ => Err(Error::UnsupportedVersion(version.into())),
    }
}

/// Reads the run of digits starting the plan, anything after it is ignored.
pub(crate) fn read_plan(plan: &str) -> Result<usize, ParseIntError> {
    let end = plan
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(plan.len());
    plan[..end].parse()
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct TestLine<'a> {
    pub number: Option<usize>,
    pub description: &'a str,
    pub directive: Directive,
    pub explanation: &'a str,
}

/// Decodes what follows `ok ` or `not ok `.
///
/// The description starts after the first `-` following the number, so a bare description
/// containing a dash loses everything up to it.
pub(crate) fn read_test_line(rest: &str) -> TestLine<'_> {
    let rest = rest.trim_start();
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let number = match digits {
        0 => None,
        _ => match rest[..digits].parse() {
            Ok(number) => Some(number),
            Err(error) => {
                warn!(number = &rest[..digits], %error, "test number out of range, ignoring it");
                None
            }
        },
    };

    let mut end = &rest[digits..];
    if let Some(dash) = end.find('-') {
        end = &end[dash + 1..];
    }

    let (description, directive) = match end.split_once('#') {
        Some((desc, directive)) => (desc.trim(), directive.trim()),
        None => (end.trim(), ""),
    };
    let (directive, explanation) = read_directive(directive);

    TestLine {
        number,
        description,
        directive,
        explanation,
    }
}

impl TestLine<'_> {
    pub fn into_testpoint(self, ok: bool, default_num: usize) -> Testpoint {
        Testpoint {
            ok,
            num: self.number.unwrap_or(default_num),
            description: self.description.into(),
            directive: self.directive,
            explanation: self.explanation.into(),
            ..Default::default()
        }
    }
}

///
/// Reads a single `ok`/`not ok` line. A missing number defaults to 1, and nothing but the line
/// itself is read.
///
impl FromStr for Testpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Line::Test { ok, rest } = classify(s) else {
            return Err(Error::UnknownLine(s.into()));
        };
        Ok(read_test_line(rest).into_testpoint(ok, 1))
    }
}

fn read_directive(text: &str) -> (Directive, &str) {
    let directive = match text.get(..4) {
        Some(kind) if kind.eq_ignore_ascii_case("todo") => Directive::Todo,
        Some(kind) if kind.eq_ignore_ascii_case("skip") => Directive::Skip,
        _ => return (Directive::None, text),
    };

    (directive, text[4..].trim())
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_line(rest: &str) -> TestLine<'_> {
        read_test_line(rest)
    }

    #[test]
    fn classify_lines() {
        assert_eq!(classify("TAP version 13"), Line::Version("13"));
        assert_eq!(classify("1..4 # reason"), Line::Plan("4 # reason"));
        assert_eq!(
            classify("not ok 3 - x"),
            Line::Test {
                ok: false,
                rest: "3 - x"
            }
        );
        assert_eq!(classify("# Subtest: foo"), Line::Subtest(Some("foo")));
        assert_eq!(classify("    # Subtest: foo"), Line::Subtest(Some("foo")));
        assert_eq!(classify("# Subtest:"), Line::Subtest(None));
        assert_eq!(classify("ok"), Line::Other);
        assert_eq!(classify("  # Subtest: two spaces"), Line::Other);
        assert_eq!(classify("Bail out!"), Line::Other);
    }

    #[test]
    fn versions() {
        assert_eq!(read_version("13").unwrap(), 13);
        assert_eq!(read_version("13 ").unwrap(), 13);
        assert!(matches!(read_version("12"), Err(Error::UnsupportedVersion(v)) if v == "12"));
        assert!(matches!(read_version("xx"), Err(Error::UnsupportedVersion(v)) if v == "xx"));
    }

    #[test]
    fn plans() {
        assert_eq!(read_plan("12"), Ok(12));
        assert_eq!(read_plan("0 # SKIP nothing to do"), Ok(0));
        assert!(read_plan("").is_err());
        assert!(read_plan("N").is_err());
    }

    #[test]
    fn number_and_dash_description() {
        assert_eq!(
            test_line("  42 - the answer"),
            TestLine {
                number: Some(42),
                description: "the answer",
                directive: Directive::None,
                explanation: "",
            }
        );
        assert_eq!(test_line("bare").number, None);
        assert_eq!(test_line("1 hogehoge").description, "hogehoge");
        assert_eq!(test_line("1 a - b - c").description, "b - c");
        assert_eq!(test_line("").description, "");
    }

    #[test]
    fn directives() {
        let todo = test_line("3 foobar # TODO not implemented yet");
        assert_eq!(todo.description, "foobar");
        assert_eq!(todo.directive, Directive::Todo);
        assert_eq!(todo.explanation, "not implemented yet");

        assert_eq!(test_line("1 # todo reason"), test_line("1 # TODO reason"));
        assert_eq!(test_line("1 # sKiP").directive, Directive::Skip);
        assert_eq!(test_line("1 # SKIP").explanation, "");
    }

    #[test]
    fn unknown_directive_is_explanation() {
        let line = test_line("1 - desc # TOD");
        assert_eq!(line.directive, Directive::None);
        assert_eq!(line.explanation, "TOD");

        let line = test_line("1 - desc # just a comment");
        assert_eq!(line.directive, Directive::None);
        assert_eq!(line.explanation, "just a comment");
    }

    #[test]
    fn testpoint_from_str() {
        let test: Testpoint = "not ok - missing number # SKIP no network".parse().unwrap();
        assert!(!test.ok);
        assert_eq!(test.num, 1);
        assert_eq!(test.description, "missing number");
        assert_eq!(test.directive, Directive::Skip);
        assert_eq!(test.explanation, "no network");
        assert_eq!(test.subtests, None);

        assert!(matches!(
            "# Subtest: foo".parse::<Testpoint>(),
            Err(Error::UnknownLine(line)) if line == "# Subtest: foo"
        ));
    }

    #[test]
    fn number_overflow() {
        let line = test_line("99999999999999999999999 - big");
        assert_eq!(line.number, None);
        assert_eq!(line.description, "big");
    }
}
