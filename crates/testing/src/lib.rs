//! Scenario-test harness for fslatency
//!
//! Mirrors the shape of a larger test-record framework (name, category,
//! status, duration, timestamp) scaled down to the handful of multi-thread
//! timing scenarios (S3-S6 from the design notes) that don't fit naturally
//! as inline `#[cfg(test)]` unit tests.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone)]
pub struct TestRecord {
    pub name: String,
    pub status: TestStatus,
    pub duration: Duration,
    pub detail: Option<String>,
}

impl TestRecord {
    pub fn pass(name: &str, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            status: TestStatus::Pass,
            duration,
            detail: None,
        }
    }

    pub fn fail(name: &str, duration: Duration, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: TestStatus::Fail,
            duration,
            detail: Some(detail.into()),
        }
    }
}

/// Runs `scenario`, timing it and turning a panic-free `Result` into a
/// [`TestRecord`]. Scenario closures return `Err` with a human-readable
/// explanation rather than asserting, so a run of the whole suite can
/// continue past one failure and report everything it found.
pub fn run_scenario(name: &str, scenario: impl FnOnce() -> Result<(), String>) -> TestRecord {
    let start = std::time::Instant::now();
    match scenario() {
        Ok(()) => TestRecord::pass(name, start.elapsed()),
        Err(detail) => TestRecord::fail(name, start.elapsed(), detail),
    }
}

#[derive(Debug, Default)]
pub struct SuiteReport {
    pub records: Vec<TestRecord>,
}

impl SuiteReport {
    pub fn push(&mut self, record: TestRecord) {
        self.records.push(record);
    }

    pub fn all_passed(&self) -> bool {
        self.records.iter().all(|r| r.status == TestStatus::Pass)
    }

    pub fn failures(&self) -> Vec<&TestRecord> {
        self.records.iter().filter(|r| r.status == TestStatus::Fail).collect()
    }
}
