//! Effort estimations and their line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{User, UserRole};

labelled_enum! {
    /// How effort is expressed.
    #[derive(Default)]
    pub enum EstimationMethod {
        #[default]
        Hours => "hours",
        StoryPoints => "story-points",
        TShirt => "t-shirt",
    }
}

labelled_enum! {
    /// Approval state of an estimation.
    #[derive(Default)]
    pub enum EstimationStatus {
        #[default]
        Draft => "draft",
        Review => "review",
        Approved => "approved",
        Rejected => "rejected",
    }
}

labelled_enum! {
    /// Work area of an estimation item.
    #[derive(Default)]
    pub enum EstimationCategory {
        #[default]
        Development => "development",
        Design => "design",
        Testing => "testing",
        Devops => "devops",
        Management => "management",
        Documentation => "documentation",
        Other => "other",
    }
}

labelled_enum! {
    /// Technical complexity of an item.
    #[derive(Default)]
    pub enum Complexity {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

labelled_enum! {
    /// How sure the estimator is.
    #[derive(Default)]
    pub enum ConfidenceLevel {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
    }
}

/// An effort estimation made of line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimation {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub version: String,
    #[serde(default)]
    pub status: EstimationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<EstimationMethod>,
    #[serde(default)]
    pub items: Vec<EstimationItem>,
    /// Always the sum of `items[].estimatedHours`
    pub total_hours: f64,
    #[serde(default)]
    pub buffer_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contingency_percentage: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: Vec<EstimationComment>,
}

/// Caller-supplied fields for a new estimation.
#[derive(Debug, Clone, Default)]
pub struct NewEstimation {
    pub title: String,
    pub version: String,
    pub status: EstimationStatus,
    pub description: Option<String>,
    pub method: Option<EstimationMethod>,
    pub buffer_percentage: f64,
    pub contingency_percentage: Option<f64>,
}

impl Estimation {
    pub fn new(
        id: String,
        project_id: String,
        data: NewEstimation,
        created_by: User,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project_id,
            title: data.title,
            version: data.version,
            status: data.status,
            description: data.description,
            method: data.method,
            items: Vec::new(),
            total_hours: 0.0,
            buffer_percentage: data.buffer_percentage,
            contingency_percentage: data.contingency_percentage,
            created_at: now,
            updated_at: now,
            created_by,
            approved_by: None,
            approved_at: None,
            comments: Vec::new(),
        }
    }

    /// Recompute `total_hours` from the current items.
    pub fn recompute_total(&mut self) {
        self.total_hours = self.items.iter().map(|item| item.estimated_hours).sum();
    }
}

/// Partial update for an estimation.
///
/// Items and the total are owned by the item commands and cannot be patched.
#[derive(Debug, Clone, Default)]
pub struct EstimationPatch {
    pub title: Option<String>,
    pub version: Option<String>,
    pub status: Option<EstimationStatus>,
    pub description: Option<String>,
    pub method: Option<EstimationMethod>,
    pub buffer_percentage: Option<f64>,
    pub contingency_percentage: Option<f64>,
}

impl EstimationPatch {
    pub fn apply(self, estimation: &mut Estimation) {
        if let Some(title) = self.title {
            estimation.title = title;
        }
        if let Some(version) = self.version {
            estimation.version = version;
        }
        if let Some(status) = self.status {
            estimation.status = status;
        }
        if self.description.is_some() {
            estimation.description = self.description;
        }
        if self.method.is_some() {
            estimation.method = self.method;
        }
        if let Some(buffer) = self.buffer_percentage {
            estimation.buffer_percentage = buffer;
        }
        if self.contingency_percentage.is_some() {
            estimation.contingency_percentage = self.contingency_percentage;
        }
    }
}

/// One line of an estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: EstimationCategory,
    pub estimated_hours: f64,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub confidence: ConfidenceLevel,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_requirement_id: Option<String>,
}

/// Caller-supplied fields for a new estimation item.
#[derive(Debug, Clone, Default)]
pub struct NewEstimationItem {
    pub title: String,
    pub description: String,
    pub category: EstimationCategory,
    pub estimated_hours: f64,
    pub complexity: Complexity,
    pub confidence: ConfidenceLevel,
    pub assumptions: Vec<String>,
    pub risks: Vec<String>,
    pub notes: Option<String>,
    pub assigned_role: Option<UserRole>,
    pub linked_requirement_id: Option<String>,
}

impl EstimationItem {
    pub fn new(id: String, data: NewEstimationItem) -> Self {
        Self {
            id,
            title: data.title,
            description: data.description,
            category: data.category,
            estimated_hours: data.estimated_hours,
            complexity: data.complexity,
            confidence: data.confidence,
            assumptions: data.assumptions,
            risks: data.risks,
            notes: data.notes,
            assigned_role: data.assigned_role,
            linked_requirement_id: data.linked_requirement_id,
        }
    }
}

/// Partial update for an estimation item.
#[derive(Debug, Clone, Default)]
pub struct EstimationItemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<EstimationCategory>,
    pub estimated_hours: Option<f64>,
    pub complexity: Option<Complexity>,
    pub confidence: Option<ConfidenceLevel>,
    pub notes: Option<String>,
    pub assigned_role: Option<UserRole>,
    pub linked_requirement_id: Option<String>,
}

impl EstimationItemPatch {
    pub fn apply(self, item: &mut EstimationItem) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(hours) = self.estimated_hours {
            item.estimated_hours = hours;
        }
        if let Some(complexity) = self.complexity {
            item.complexity = complexity;
        }
        if let Some(confidence) = self.confidence {
            item.confidence = confidence;
        }
        if self.notes.is_some() {
            item.notes = self.notes;
        }
        if self.assigned_role.is_some() {
            item.assigned_role = self.assigned_role;
        }
        if self.linked_requirement_id.is_some() {
            item.linked_requirement_id = self.linked_requirement_id;
        }
    }
}

/// Review comment on an estimation, optionally about one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationComment {
    pub id: String,
    pub content: String,
    pub author: User,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}
