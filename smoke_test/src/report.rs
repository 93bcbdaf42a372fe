//! # Test Report
//!
//! Record of a test run: report lines, check results and the fatal error which ended the run, if
//! any. Failed checks do not stop the run.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioVariant;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub name: String,

    pub variant: ScenarioVariant,

    pub lines: Vec<String>,

    pub checks: Vec<CheckResult>,

    /// Error which aborted the run.
    pub fatal_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub description: String,
    pub passed: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TestReport {
    pub fn new(name: &str, variant: ScenarioVariant) -> Self {
        Self {
            name: name.into(),
            variant,
            lines: Vec::new(),
            checks: Vec::new(),
            fatal_error: None,
        }
    }

    /// Add a line to the report.
    pub fn report<S: Into<String>>(&mut self, line: S) {
        let line = line.into();
        info!("[{}] {}", self.name, line);
        self.lines.push(line);
    }

    /// Record a check.
    pub fn check<S: Into<String>>(&mut self, passed: bool, description: S) {
        let description = description.into();

        if passed {
            info!("[{}] CHECK PASSED: {}", self.name, description);
        } else {
            error!("[{}] CHECK FAILED: {}", self.name, description);
        }

        self.checks.push(CheckResult {
            description,
            passed,
        });
    }

    /// Record the error which ended the run.
    pub fn abort<S: Into<String>>(&mut self, error: S) {
        let error = error.into();
        error!("[{}] ABORTED: {}", self.name, error);
        self.fatal_error = Some(error);
    }

    /// The run completed and every check passed.
    pub fn passed(&self) -> bool {
        self.fatal_error.is_none() && !self.checks.is_empty() && self.checks.iter().all(|c| c.passed)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_passed() {
        let mut r = TestReport::new("test", ScenarioVariant::A);
        assert!(!r.passed());

        r.report("line");
        r.check(true, "first");
        assert!(r.passed());

        r.check(false, "second");
        assert!(!r.passed());
        assert_eq!(r.checks.len(), 2);

        let mut r = TestReport::new("test", ScenarioVariant::B);
        r.check(true, "first");
        r.abort("Unable to talk to world");
        assert!(!r.passed());
    }
}
