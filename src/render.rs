//! Writing results back as TAP text.
//!
//! The output reads back into the same values, but whitespace is normalized so it is not a byte
//! for byte copy of the parsed document.

use std::fmt::{self, Write};

use crate::line::{SUBTEST_INDENT, SUPPORTED_VERSION};
use crate::{Directive, Testpoint, Testsuite};

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::None => Ok(()),
            Directive::Todo => f.write_str("TODO"),
            Directive::Skip => f.write_str("SKIP"),
        }
    }
}

/// The testpoint line alone, for example `not ok 3 - foobar # TODO not implemented yet`.
impl fmt::Display for Testpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ok {
            f.write_str("not ")?;
        }
        write!(f, "ok {}", self.num)?;

        if !self.description.is_empty() {
            write!(f, " - {}", self.description)?;
        }

        if self.directive != Directive::None {
            write!(f, " # {}", self.directive)?;
            if !self.explanation.is_empty() {
                write!(f, " {}", self.explanation)?;
            }
        }

        Ok(())
    }
}

impl Testpoint {
    ///
    /// Renders the testpoint with everything attached to it: the subtest block before the line,
    /// the diagnostics and the YAML block after it. Every line is prefixed by `indent`.
    ///
    pub fn render_tree(&self, indent: &str) -> String {
        let mut out = String::new();
        // Writing to a String never fails
        let _ = self.write_tree(&mut out, indent);
        out
    }

    pub fn write_tree<W: Write>(&self, w: &mut W, indent: &str) -> fmt::Result {
        if let Some(subtests) = &self.subtests {
            write!(w, "{indent}{SUBTEST_INDENT}# Subtest:")?;
            let name = self.name.as_deref().unwrap_or(&self.description);
            if !name.is_empty() {
                write!(w, " {name}")?;
            }
            writeln!(w)?;

            let sub_indent = format!("{indent}{SUBTEST_INDENT}");
            for test in subtests {
                test.write_tree(w, &sub_indent)?;
            }
            writeln!(w, "{sub_indent}1..{}", subtests.len())?;
        }

        writeln!(w, "{indent}{self}")?;

        for line in self.diagnostic.lines() {
            writeln!(w, "{indent}# {line}")?;
        }

        if let Some(yaml) = &self.yaml {
            writeln!(w, "{indent}---")?;
            for line in yaml.lines() {
                writeln!(w, "{indent}{line}")?;
            }
            writeln!(w, "{indent}...")?;
        }

        Ok(())
    }
}

/// The whole document. The plan comes last, so that the plans of subtests do not replace it when
/// the output is parsed again.
impl fmt::Display for Testsuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version == SUPPORTED_VERSION {
            writeln!(f, "TAP version {SUPPORTED_VERSION}")?;
        }

        for test in &self.tests {
            test.write_tree(f, "")?;
        }

        if let Some(plan) = self.plan {
            writeln!(f, "1..{plan}")?;
        }

        Ok(())
    }
}
