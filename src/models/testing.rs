//! Test cases, test cycles, executions and the cycle summary rollup.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::User;

labelled_enum! {
    /// Outcome of running a test case (or a single step).
    #[derive(Default)]
    pub enum TestOutcome {
        #[default]
        Pending => "pending",
        Passed => "passed",
        Failed => "failed",
        Blocked => "blocked",
        Skipped => "skipped",
    }
}

labelled_enum! {
    /// How a test case is run.
    #[derive(Default)]
    pub enum TestType {
        #[default]
        Manual => "manual",
        Automated => "automated",
    }
}

labelled_enum! {
    /// Importance of a test case.
    #[derive(Default)]
    pub enum TestPriority {
        Critical => "critical",
        High => "high",
        #[default]
        Medium => "medium",
        Low => "low",
    }
}

labelled_enum! {
    /// Lifecycle of a test case.
    #[derive(Default)]
    pub enum TestStatus {
        #[default]
        Draft => "draft",
        Active => "active",
        Blocked => "blocked",
        Deprecated => "deprecated",
    }
}

labelled_enum! {
    /// Lifecycle of a test cycle.
    #[derive(Default)]
    pub enum TestCycleStatus {
        #[default]
        Planned => "planned",
        InProgress => "in-progress",
        Completed => "completed",
        Aborted => "aborted",
    }
}

/// One step of a test case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    pub id: String,
    pub step_number: u32,
    pub action: String,
    pub expected_result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TestOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A test case, identified to humans by `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    /// Human-readable code (e.g. "TC-001")
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub test_type: TestType,
    #[serde(default)]
    pub priority: TestPriority,
    #[serde(default)]
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<String>,
    #[serde(default)]
    pub steps: Vec<TestStep>,
    /// Requirement id this case verifies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_requirement: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Expected duration in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<User>,
}

/// Caller-supplied fields for a new test case.
#[derive(Debug, Clone, Default)]
pub struct NewTestCase {
    pub title: String,
    pub description: String,
    pub test_type: TestType,
    pub priority: TestPriority,
    pub status: TestStatus,
    pub preconditions: Option<String>,
    pub steps: Vec<TestStep>,
    pub linked_requirement: Option<String>,
    pub tags: Vec<String>,
    pub estimated_duration: Option<u32>,
}

impl TestCase {
    pub fn new(
        id: String,
        code: String,
        data: NewTestCase,
        author: User,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            code,
            title: data.title,
            description: data.description,
            test_type: data.test_type,
            priority: data.priority,
            status: data.status,
            preconditions: data.preconditions,
            steps: data.steps,
            linked_requirement: data.linked_requirement,
            tags: data.tags,
            estimated_duration: data.estimated_duration,
            created_at: now,
            updated_at: now,
            last_modified_by: Some(author.clone()),
            author,
        }
    }
}

/// Partial update for a test case.
#[derive(Debug, Clone, Default)]
pub struct TestCasePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub test_type: Option<TestType>,
    pub priority: Option<TestPriority>,
    pub status: Option<TestStatus>,
    pub preconditions: Option<String>,
    pub steps: Option<Vec<TestStep>>,
    pub linked_requirement: Option<String>,
    pub tags: Option<Vec<String>>,
    pub estimated_duration: Option<u32>,
}

impl TestCasePatch {
    pub fn apply(self, test_case: &mut TestCase) {
        if let Some(title) = self.title {
            test_case.title = title;
        }
        if let Some(description) = self.description {
            test_case.description = description;
        }
        if let Some(test_type) = self.test_type {
            test_case.test_type = test_type;
        }
        if let Some(priority) = self.priority {
            test_case.priority = priority;
        }
        if let Some(status) = self.status {
            test_case.status = status;
        }
        if self.preconditions.is_some() {
            test_case.preconditions = self.preconditions;
        }
        if let Some(steps) = self.steps {
            test_case.steps = steps;
        }
        if self.linked_requirement.is_some() {
            test_case.linked_requirement = self.linked_requirement;
        }
        if let Some(tags) = self.tags {
            test_case.tags = tags;
        }
        if self.estimated_duration.is_some() {
            test_case.estimated_duration = self.estimated_duration;
        }
    }
}

/// One run of a test case inside a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestExecution {
    pub id: String,
    /// Copy of the case as it was when executed
    pub test_case: TestCase,
    pub test_case_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_cycle_id: Option<String>,
    pub executed_by: User,
    pub executed_at: DateTime<Utc>,
    pub result: TestOutcome,
    /// Run time in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default)]
    pub steps: Vec<TestStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Ids of defects raised from this run
    #[serde(default)]
    pub defects: Vec<String>,
}

/// Caller-supplied fields for a new execution.
#[derive(Debug, Clone, Default)]
pub struct NewTestExecution {
    pub test_case_id: String,
    pub result: TestOutcome,
    /// Defaults to the current user when absent
    pub executed_by: Option<User>,
    /// Defaults to the store clock when absent
    pub executed_at: Option<DateTime<Utc>>,
    pub execution_time: Option<u32>,
    pub environment: Option<String>,
    pub browser: Option<String>,
    pub device: Option<String>,
    pub steps: Vec<TestStep>,
    pub notes: Option<String>,
    pub defects: Vec<String>,
}

/// Pass/fail rollup of a cycle, computed from the latest run per case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCycleSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub blocked: usize,
    pub skipped: usize,
    pub not_run: usize,
    /// Percentage of cases whose latest run passed (0-100)
    pub pass_rate: u32,
    /// Percentage of cases run at least once (0-100)
    pub execution_progress: u32,
}

impl TestCycleSummary {
    /// Summarize `executions` against the cases planned for a cycle.
    ///
    /// Only the execution with the greatest `executed_at` per test case counts.
    /// On equal timestamps the earlier-recorded execution is kept. Runs of
    /// cases outside `test_cases` are ignored.
    pub fn calculate(test_cases: &[TestCase], executions: &[TestExecution]) -> Self {
        let planned: HashSet<&str> = test_cases.iter().map(|tc| tc.id.as_str()).collect();
        let mut latest: HashMap<&str, &TestExecution> = HashMap::new();
        for execution in executions {
            let case_id = execution.test_case_id.as_str();
            if !planned.contains(case_id) {
                continue;
            }
            match latest.get(case_id) {
                Some(existing) if execution.executed_at <= existing.executed_at => {}
                _ => {
                    latest.insert(case_id, execution);
                }
            }
        }

        let total = planned.len();
        let mut summary = Self {
            total,
            ..Self::default()
        };
        for execution in latest.values() {
            match execution.result {
                TestOutcome::Passed => summary.passed += 1,
                TestOutcome::Failed => summary.failed += 1,
                TestOutcome::Blocked => summary.blocked += 1,
                TestOutcome::Skipped => summary.skipped += 1,
                TestOutcome::Pending => {}
            }
        }

        let executed = latest.len();
        summary.not_run = total - executed;
        summary.pass_rate = percentage(summary.passed, total);
        summary.execution_progress = percentage(executed, total);
        summary
    }
}

/// Rounded `part / whole * 100`, or 0 for an empty whole.
pub(crate) fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

/// A planned round of test executions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCycle {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub environment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(default)]
    pub status: TestCycleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Snapshot of the cases planned for this cycle
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub executions: Vec<TestExecution>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<TestCycleSummary>,
}

/// Caller-supplied fields for a new test cycle.
#[derive(Debug, Clone, Default)]
pub struct NewTestCycle {
    pub name: String,
    pub description: String,
    pub version: Option<String>,
    pub environment: String,
    pub build: Option<String>,
    pub status: TestCycleStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub test_cases: Vec<TestCase>,
}

impl TestCycle {
    pub fn new(
        id: String,
        project_id: String,
        data: NewTestCycle,
        created_by: User,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project_id,
            name: data.name,
            description: data.description,
            version: data.version,
            environment: data.environment,
            build: data.build,
            status: data.status,
            start_date: data.start_date,
            end_date: data.end_date,
            test_cases: data.test_cases,
            executions: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by,
            summary: None,
        }
    }

    /// Recompute the summary from the current case list and executions.
    pub fn refresh_summary(&mut self) {
        self.summary = Some(TestCycleSummary::calculate(
            &self.test_cases,
            &self.executions,
        ));
    }
}

/// Partial update for a test cycle.
#[derive(Debug, Clone, Default)]
pub struct TestCyclePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub environment: Option<String>,
    pub build: Option<String>,
    pub status: Option<TestCycleStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub test_cases: Option<Vec<TestCase>>,
}

impl TestCyclePatch {
    /// Apply the patch; returns true when the case list was replaced.
    pub fn apply(self, cycle: &mut TestCycle) -> bool {
        if let Some(name) = self.name {
            cycle.name = name;
        }
        if let Some(description) = self.description {
            cycle.description = description;
        }
        if self.version.is_some() {
            cycle.version = self.version;
        }
        if let Some(environment) = self.environment {
            cycle.environment = environment;
        }
        if self.build.is_some() {
            cycle.build = self.build;
        }
        if let Some(status) = self.status {
            cycle.status = status;
        }
        if self.start_date.is_some() {
            cycle.start_date = self.start_date;
        }
        if self.end_date.is_some() {
            cycle.end_date = self.end_date;
        }
        match self.test_cases {
            Some(test_cases) => {
                cycle.test_cases = test_cases;
                true
            }
            None => false,
        }
    }
}
