//! Step results and the final summary

use std::fmt;

use thiserror::Error;

/// Why a step failed
#[derive(Error, Debug)]
pub enum SmokeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("expected HTTP {expected}, got {actual}: {body}")]
    UnexpectedStatus {
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("response missing field `{0}`")]
    MissingField(String),

    #[error("{0}")]
    Check(String),

    #[error("skipped: {0}")]
    Prerequisite(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default)]
pub struct SmokeReport {
    pub steps: Vec<StepResult>,
}

impl SmokeReport {
    pub fn record(&mut self, name: &'static str, outcome: Result<String, SmokeError>) -> bool {
        let (passed, detail) = match outcome {
            Ok(detail) => {
                tracing::info!("✅ {}: {}", name, detail);
                (true, detail)
            }
            Err(e) => {
                tracing::error!("❌ {}: {}", name, e);
                (false, e.to_string())
            }
        };
        self.steps.push(StepResult {
            name,
            passed,
            detail,
        });
        passed
    }

    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn passed(&self) -> usize {
        self.steps.iter().filter(|s| s.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        !self.steps.is_empty() && self.failed() == 0
    }

    /// Percentage of passing steps; 0 when nothing ran
    pub fn success_rate(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.passed() as f64 * 100.0 / self.total() as f64
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.passed)
    }
}

impl fmt::Display for SmokeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Fresh Fold API Smoke Summary ===")?;
        for step in &self.steps {
            let mark = if step.passed { "PASS" } else { "FAIL" };
            writeln!(f, "  [{}] {}", mark, step.name)?;
        }
        writeln!(
            f,
            "Total: {}  Passed: {}  Failed: {}",
            self.total(),
            self.passed(),
            self.failed()
        )?;
        write!(f, "Success rate: {:.1}%", self.success_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_and_rate() {
        let mut report = SmokeReport::default();
        assert_eq!(report.success_rate(), 0.0);
        assert!(!report.all_passed());

        report.record("a", Ok("fine".into()));
        report.record("b", Ok("fine".into()));
        report.record("c", Err(SmokeError::Check("boom".into())));

        assert_eq!(report.total(), 3);
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_passed());

        let text = report.to_string();
        assert!(text.contains("[FAIL] c"));
        assert!(text.contains("Success rate: 66.7%"));
        assert_eq!(report.failures().next().map(|s| s.name), Some("c"));
    }
}
