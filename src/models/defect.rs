//! Defect (bug) reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Priority, User};

labelled_enum! {
    #[derive(Default)]
    pub enum DefectSeverity {
        Critical => "critical",
        High => "high",
        #[default]
        Medium => "medium",
        Low => "low",
    }
}

labelled_enum! {
    /// Defect workflow status.
    #[derive(Default)]
    pub enum DefectStatus {
        #[default]
        Open => "open",
        InProgress => "in-progress",
        Resolved => "resolved",
        Closed => "closed",
        Reopened => "reopened",
        Rejected => "rejected",
    }
}

/// A file attached to a defect report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
    pub url: String,
    pub size: u64,
}

/// A reported defect, identified to humans by `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defect {
    pub id: String,
    /// Human-readable code (e.g. "BUG-001")
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: DefectSeverity,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: DefectStatus,
    #[serde(default)]
    pub steps_to_reproduce: Vec<String>,
    #[serde(default)]
    pub expected_behavior: String,
    #[serde(default)]
    pub actual_behavior: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<User>,
    /// Test case id the defect was found with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_test_case: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_requirement: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<User>,
}

/// Caller-supplied fields for a new defect.
///
/// `reported_by` falls back to the current user when left empty.
#[derive(Debug, Clone, Default)]
pub struct NewDefect {
    pub title: String,
    pub description: String,
    pub severity: DefectSeverity,
    pub priority: Priority,
    pub status: DefectStatus,
    pub steps_to_reproduce: Vec<String>,
    pub expected_behavior: String,
    pub actual_behavior: String,
    pub environment: String,
    pub browser: Option<String>,
    pub device: Option<String>,
    pub assigned_to: Option<User>,
    pub reported_by: Option<User>,
    pub linked_test_case: Option<String>,
    pub linked_requirement: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl Defect {
    pub fn new(id: String, code: String, data: NewDefect, now: DateTime<Utc>) -> Self {
        Self {
            id,
            code,
            title: data.title,
            description: data.description,
            severity: data.severity,
            priority: data.priority,
            status: data.status,
            steps_to_reproduce: data.steps_to_reproduce,
            expected_behavior: data.expected_behavior,
            actual_behavior: data.actual_behavior,
            environment: data.environment,
            browser: data.browser,
            device: data.device,
            assigned_to: data.assigned_to,
            reported_by: data.reported_by,
            linked_test_case: data.linked_test_case,
            linked_requirement: data.linked_requirement,
            attachments: data.attachments,
            created_at: now,
            updated_at: now,
            resolved_at: None,
            resolved_by: None,
        }
    }

    /// Open, in progress or reopened.
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            DefectStatus::Open | DefectStatus::InProgress | DefectStatus::Reopened
        )
    }
}

/// Partial update for a defect.
#[derive(Debug, Clone, Default)]
pub struct DefectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<DefectSeverity>,
    pub priority: Option<Priority>,
    pub status: Option<DefectStatus>,
    pub steps_to_reproduce: Option<Vec<String>>,
    pub expected_behavior: Option<String>,
    pub actual_behavior: Option<String>,
    pub environment: Option<String>,
    pub browser: Option<String>,
    pub device: Option<String>,
    pub assigned_to: Option<User>,
    pub linked_test_case: Option<String>,
    pub linked_requirement: Option<String>,
}

impl DefectPatch {
    /// Apply the patch; returns the previous status when it changed.
    pub fn apply(self, defect: &mut Defect) -> Option<DefectStatus> {
        if let Some(title) = self.title {
            defect.title = title;
        }
        if let Some(description) = self.description {
            defect.description = description;
        }
        if let Some(severity) = self.severity {
            defect.severity = severity;
        }
        if let Some(priority) = self.priority {
            defect.priority = priority;
        }
        if let Some(steps) = self.steps_to_reproduce {
            defect.steps_to_reproduce = steps;
        }
        if let Some(expected) = self.expected_behavior {
            defect.expected_behavior = expected;
        }
        if let Some(actual) = self.actual_behavior {
            defect.actual_behavior = actual;
        }
        if let Some(environment) = self.environment {
            defect.environment = environment;
        }
        if self.browser.is_some() {
            defect.browser = self.browser;
        }
        if self.device.is_some() {
            defect.device = self.device;
        }
        if self.assigned_to.is_some() {
            defect.assigned_to = self.assigned_to;
        }
        if self.linked_test_case.is_some() {
            defect.linked_test_case = self.linked_test_case;
        }
        if self.linked_requirement.is_some() {
            defect.linked_requirement = self.linked_requirement;
        }
        match self.status {
            Some(status) if status != defect.status => {
                let previous = defect.status;
                defect.status = status;
                Some(previous)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::epoch;

    fn defect() -> Defect {
        Defect::new(
            "d-1".to_string(),
            "BUG-001".to_string(),
            NewDefect {
                title: "Crash on save".to_string(),
                ..NewDefect::default()
            },
            epoch(),
        )
    }

    #[test]
    fn test_new_defect_is_open() {
        let d = defect();
        assert_eq!(d.status, DefectStatus::Open);
        assert!(d.is_open());
        assert!(d.resolved_at.is_none());
    }

    #[test]
    fn test_patch_reports_previous_status() {
        let mut d = defect();
        let previous = DefectPatch {
            status: Some(DefectStatus::Resolved),
            ..DefectPatch::default()
        }
        .apply(&mut d);
        assert_eq!(previous, Some(DefectStatus::Open));
        assert!(!d.is_open());

        let unchanged = DefectPatch {
            status: Some(DefectStatus::Resolved),
            ..DefectPatch::default()
        }
        .apply(&mut d);
        assert_eq!(unchanged, None);
    }

    #[test]
    fn test_defect_json_shape() {
        let json = serde_json::to_value(defect()).unwrap();
        assert_eq!(json["code"], "BUG-001");
        assert_eq!(json["severity"], "medium");
        assert!(json.get("stepsToReproduce").is_some());
        assert!(json.get("resolvedAt").is_none());
    }
}
