//! Functional analysis documents and the requirements they own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

labelled_enum! {
    /// Lifecycle of a functional analysis document.
    #[derive(Default)]
    pub enum AnalysisStatus {
        #[default]
        Draft => "draft",
        Review => "review",
        Approved => "approved",
        Superseded => "superseded",
    }
}

labelled_enum! {
    /// Kind of requirement.
    #[derive(Default)]
    pub enum RequirementType {
        #[default]
        Functional => "functional",
        NonFunctional => "non-functional",
        Technical => "technical",
        Business => "business",
        UserStory => "user-story",
    }
}

labelled_enum! {
    /// MoSCoW priority of a requirement.
    #[derive(Default)]
    pub enum RequirementPriority {
        MustHave => "must-have",
        #[default]
        ShouldHave => "should-have",
        CouldHave => "could-have",
        WontHave => "wont-have",
    }
}

labelled_enum! {
    /// Review state of a requirement.
    #[derive(Default)]
    pub enum RequirementStatus {
        #[default]
        Draft => "draft",
        Review => "review",
        Approved => "approved",
        Implemented => "implemented",
        Rejected => "rejected",
    }
}

/// A functional analysis document for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionalAnalysis {
    pub id: String,
    pub project_id: String,
    pub title: String,
    /// Document version label (e.g. "1.0")
    pub version: String,
    #[serde(default)]
    pub status: AnalysisStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub out_of_scope: String,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<FunctionalRequirement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    /// Highest requirement number handed out so far
    #[serde(default)]
    pub requirement_counter: u32,
}

/// Caller-supplied fields for a new functional analysis.
#[derive(Debug, Clone, Default)]
pub struct NewFunctionalAnalysis {
    pub title: String,
    pub version: String,
    pub status: AnalysisStatus,
    pub description: String,
    pub scope: String,
    pub out_of_scope: String,
    pub assumptions: Vec<String>,
    pub constraints: Vec<String>,
}

impl FunctionalAnalysis {
    pub fn new(
        id: String,
        project_id: String,
        data: NewFunctionalAnalysis,
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
            scope: data.scope,
            out_of_scope: data.out_of_scope,
            assumptions: data.assumptions,
            constraints: data.constraints,
            requirements: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by,
            approved_by: None,
            approved_at: None,
            requirement_counter: 0,
        }
    }
}

/// Partial update for a functional analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalysisPatch {
    pub title: Option<String>,
    pub version: Option<String>,
    pub status: Option<AnalysisStatus>,
    pub description: Option<String>,
    pub scope: Option<String>,
    pub out_of_scope: Option<String>,
    pub assumptions: Option<Vec<String>>,
    pub constraints: Option<Vec<String>>,
}

impl AnalysisPatch {
    pub fn apply(self, analysis: &mut FunctionalAnalysis) {
        if let Some(title) = self.title {
            analysis.title = title;
        }
        if let Some(version) = self.version {
            analysis.version = version;
        }
        if let Some(status) = self.status {
            analysis.status = status;
        }
        if let Some(description) = self.description {
            analysis.description = description;
        }
        if let Some(scope) = self.scope {
            analysis.scope = scope;
        }
        if let Some(out_of_scope) = self.out_of_scope {
            analysis.out_of_scope = out_of_scope;
        }
        if let Some(assumptions) = self.assumptions {
            analysis.assumptions = assumptions;
        }
        if let Some(constraints) = self.constraints {
            analysis.constraints = constraints;
        }
    }
}

/// A single requirement inside an analysis, identified to humans by `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionalRequirement {
    pub id: String,
    /// Human-readable code (e.g. "REQ-001")
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub requirement_type: RequirementType,
    #[serde(default)]
    pub priority: RequirementPriority,
    #[serde(default)]
    pub status: RequirementStatus,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// Ids of requirements this one depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub author: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<User>,
    #[serde(default)]
    pub comments: Vec<RequirementComment>,
    #[serde(default)]
    pub linked_tasks: Vec<String>,
    /// Starts at 1, bumped on every tracked change
    pub version: u32,
    #[serde(default)]
    pub history: Vec<RequirementHistoryEntry>,
}

/// Caller-supplied fields for a new requirement.
#[derive(Debug, Clone, Default)]
pub struct NewRequirement {
    pub title: String,
    pub description: String,
    pub requirement_type: RequirementType,
    pub priority: RequirementPriority,
    pub status: RequirementStatus,
    pub acceptance_criteria: Vec<String>,
    pub dependencies: Vec<String>,
    pub reviewer: Option<User>,
}

impl FunctionalRequirement {
    pub fn new(
        id: String,
        code: String,
        data: NewRequirement,
        author: User,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            code,
            title: data.title,
            description: data.description,
            requirement_type: data.requirement_type,
            priority: data.priority,
            status: data.status,
            acceptance_criteria: data.acceptance_criteria,
            dependencies: data.dependencies,
            author,
            reviewer: data.reviewer,
            created_at: now,
            updated_at: now,
            approved_at: None,
            approved_by: None,
            comments: Vec::new(),
            linked_tasks: Vec::new(),
            version: 1,
            history: Vec::new(),
        }
    }
}

/// A discussion comment on a requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementComment {
    pub id: String,
    pub content: String,
    pub author: User,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
}

/// One field change recorded on a requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementHistoryEntry {
    pub id: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub changed_by: User,
    pub changed_at: DateTime<Utc>,
}

/// Partial update for a requirement.
#[derive(Debug, Clone, Default)]
pub struct RequirementPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirement_type: Option<RequirementType>,
    pub priority: Option<RequirementPriority>,
    pub status: Option<RequirementStatus>,
    pub acceptance_criteria: Option<Vec<String>>,
    pub dependencies: Option<Vec<String>>,
    pub reviewer: Option<User>,
    pub linked_tasks: Option<Vec<String>>,
}

/// A tracked field that changed: (field, old, new).
pub type FieldChange = (&'static str, String, String);

impl RequirementPatch {
    /// Apply the patch and report which tracked fields changed value.
    pub fn apply(self, requirement: &mut FunctionalRequirement) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        if let Some(title) = self.title {
            if title != requirement.title {
                changes.push(("title", requirement.title.clone(), title.clone()));
            }
            requirement.title = title;
        }
        if let Some(description) = self.description {
            if description != requirement.description {
                changes.push((
                    "description",
                    requirement.description.clone(),
                    description.clone(),
                ));
            }
            requirement.description = description;
        }
        if let Some(requirement_type) = self.requirement_type {
            if requirement_type != requirement.requirement_type {
                changes.push((
                    "type",
                    requirement.requirement_type.to_string(),
                    requirement_type.to_string(),
                ));
            }
            requirement.requirement_type = requirement_type;
        }
        if let Some(priority) = self.priority {
            if priority != requirement.priority {
                changes.push((
                    "priority",
                    requirement.priority.to_string(),
                    priority.to_string(),
                ));
            }
            requirement.priority = priority;
        }
        if let Some(status) = self.status {
            if status != requirement.status {
                changes.push(("status", requirement.status.to_string(), status.to_string()));
            }
            requirement.status = status;
        }
        if let Some(acceptance_criteria) = self.acceptance_criteria {
            requirement.acceptance_criteria = acceptance_criteria;
        }
        if let Some(dependencies) = self.dependencies {
            requirement.dependencies = dependencies;
        }
        if self.reviewer.is_some() {
            requirement.reviewer = self.reviewer;
        }
        if let Some(linked_tasks) = self.linked_tasks {
            requirement.linked_tasks = linked_tasks;
        }

        changes
    }
}
