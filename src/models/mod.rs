//! Data models for PlanStack entities.
//!
//! This module defines the core data structures:
//! - `Project` - The aggregate root owning every nested collection
//! - `Task`, `Message`, `Milestone`, `TimeEntry` - Day-to-day project work
//! - `User`, `Technology`, `Activity` - Store-level records shared across projects
//! - `State` - The full snapshot persisted as one JSON document
//!
//! Requirements, estimations, testing and defects live in submodules.
//! All types serialize with camelCase keys and kebab-case enum labels.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Declares a fieldless enum with a fixed string label per variant.
///
/// The label is used for serde, `Display` and `FromStr`.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            /// Get all variants.
            pub fn all() -> &'static [$name] {
                &[$($name::$variant),+]
            }

            /// Convert to string representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    _ => Err(format!("Unknown {}: {}", stringify!($name), s)),
                }
            }
        }
    };
}

// Declared after the macros so the submodules can invoke them.
pub mod analysis;
pub mod defect;
pub mod estimation;
pub mod testing;

pub use analysis::*;
pub use defect::*;
pub use estimation::*;
pub use testing::*;

/// Anything stored in a collection and addressed by an opaque id.
pub trait Entity {
    /// Human-readable kind used in error messages (e.g. "Task").
    const KIND: &'static str;

    /// The entity's unique identifier.
    fn id(&self) -> &str;
}

macro_rules! impl_entity {
    ($($ty:ty => $kind:literal),+ $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: &'static str = $kind;

                fn id(&self) -> &str {
                    &self.id
                }
            }
        )+
    };
}

impl_entity! {
    Project => "Project",
    User => "User",
    Technology => "Technology",
    Task => "Task",
    Message => "Message",
    Milestone => "Milestone",
    TimeEntry => "Time entry",
    FunctionalAnalysis => "Functional analysis",
    FunctionalRequirement => "Requirement",
    RequirementComment => "Requirement comment",
    Estimation => "Estimation",
    EstimationItem => "Estimation item",
    TestCase => "Test case",
    TestCycle => "Test cycle",
    TestExecution => "Test execution",
    Defect => "Defect",
}

/// Generate a new opaque entity identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

labelled_enum! {
    /// Kind of software a project delivers.
    #[derive(Default)]
    pub enum ProjectType {
        #[default]
        Web => "web",
        Mobile => "mobile",
        Desktop => "desktop",
        Api => "api",
        Fullstack => "fullstack",
        Other => "other",
    }
}

labelled_enum! {
    /// Project lifecycle status.
    #[derive(Default)]
    pub enum ProjectStatus {
        #[default]
        Planning => "planning",
        InProgress => "in-progress",
        Review => "review",
        Completed => "completed",
        OnHold => "on-hold",
    }
}

labelled_enum! {
    /// Priority shared by projects, tasks and defects.
    #[derive(Default)]
    pub enum Priority {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

labelled_enum! {
    /// Role of a user in the organization.
    #[derive(Default)]
    pub enum UserRole {
        Ceo => "ceo",
        ProjectManager => "project-manager",
        #[default]
        Developer => "developer",
        Designer => "designer",
        Qa => "qa",
        Devops => "devops",
        Other => "other",
    }
}

labelled_enum! {
    /// Area a technology belongs to.
    #[derive(Default)]
    pub enum TechnologyCategory {
        Frontend => "frontend",
        Backend => "backend",
        Database => "database",
        Devops => "devops",
        Design => "design",
        #[default]
        Other => "other",
    }
}

labelled_enum! {
    /// Task workflow status.
    #[derive(Default)]
    pub enum TaskStatus {
        #[default]
        Todo => "todo",
        InProgress => "in-progress",
        Review => "review",
        Done => "done",
    }
}

labelled_enum! {
    /// Milestone status.
    #[derive(Default)]
    pub enum MilestoneStatus {
        #[default]
        Pending => "pending",
        InProgress => "in-progress",
        Completed => "completed",
    }
}

labelled_enum! {
    /// Label of an audit trail entry.
    pub enum ActivityAction {
        Create => "create",
        Update => "update",
        TaskAdd => "task_add",
        MilestoneAdd => "milestone_add",
        TeamAdd => "team_add",
        AnalysisAdd => "analysis_add",
        RequirementAdd => "requirement_add",
        EstimationAdd => "estimation_add",
        TestAdd => "test_add",
        CycleAdd => "cycle_add",
        DefectAdd => "defect_add",
    }
}

labelled_enum! {
    /// Kind of entity an activity refers to.
    pub enum EntityType {
        Project => "project",
        Task => "task",
        Requirement => "requirement",
        Estimation => "estimation",
        Test => "test",
        Defect => "defect",
    }
}

/// A person who can act in the store and be part of project teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// A technology selectable for projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technology {
    pub id: String,
    pub name: String,
    pub category: TechnologyCategory,
    /// Display color (CSS hex)
    pub color: String,
}

/// One entry of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub project_id: String,
    /// Actor who performed the action
    pub user_id: String,
    pub action: ActivityAction,
    /// Human-readable description
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A unit of work inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,
    /// Requirement this task implements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functional_requirement_id: Option<String>,
}

/// Caller-supplied fields for a new task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee: Option<User>,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub functional_requirement_id: Option<String>,
}

impl Task {
    /// Build a task from its descriptor.
    pub fn new(id: String, data: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            assignee: data.assignee,
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
            tags: data.tags,
            estimated_hours: data.estimated_hours,
            actual_hours: data.actual_hours,
            functional_requirement_id: data.functional_requirement_id,
        }
    }
}

/// Partial update for a task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assignee: Option<User>,
    pub due_date: Option<NaiveDate>,
    pub tags: Option<Vec<String>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub functional_requirement_id: Option<String>,
}

impl TaskPatch {
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if self.assignee.is_some() {
            task.assignee = self.assignee;
        }
        if self.due_date.is_some() {
            task.due_date = self.due_date;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if self.estimated_hours.is_some() {
            task.estimated_hours = self.estimated_hours;
        }
        if self.actual_hours.is_some() {
            task.actual_hours = self.actual_hours;
        }
        if self.functional_requirement_id.is_some() {
            task.functional_requirement_id = self.functional_requirement_id;
        }
    }
}

/// A team message posted on a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub author: User,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_announcement: bool,
}

/// A dated checkpoint in a project plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: MilestoneStatus,
    /// Completion percentage (0-100)
    #[serde(default)]
    pub progress: u8,
}

/// Caller-supplied fields for a new milestone.
#[derive(Debug, Clone, Default)]
pub struct NewMilestone {
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: MilestoneStatus,
    pub progress: u8,
}

impl Milestone {
    pub fn new(id: String, data: NewMilestone) -> Self {
        Self {
            id,
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            status: data.status,
            progress: data.progress.min(100),
        }
    }
}

/// Partial update for a milestone.
#[derive(Debug, Clone, Default)]
pub struct MilestonePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<MilestoneStatus>,
    pub progress: Option<u8>,
}

impl MilestonePatch {
    pub fn apply(self, milestone: &mut Milestone) {
        if let Some(title) = self.title {
            milestone.title = title;
        }
        if let Some(description) = self.description {
            milestone.description = description;
        }
        if let Some(due_date) = self.due_date {
            milestone.due_date = due_date;
        }
        if let Some(status) = self.status {
            milestone.status = status;
        }
        if let Some(progress) = self.progress {
            milestone.progress = progress.min(100);
        }
    }
}

/// Hours logged by a user against a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub date: NaiveDate,
    pub hours: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub billable: bool,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new time entry.
#[derive(Debug, Clone, Default)]
pub struct NewTimeEntry {
    pub user_id: String,
    pub project_id: String,
    pub task_id: Option<String>,
    pub date: NaiveDate,
    pub hours: f64,
    pub description: String,
    pub billable: bool,
}

/// Per-project counters backing monotonic code generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeCounters {
    #[serde(default)]
    pub test_cases: u32,
    #[serde(default)]
    pub defects: u32,
}

/// The aggregate root: a project and everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub project_type: ProjectType,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: Priority,
    /// Snapshot of the selected technologies
    #[serde(default)]
    pub technologies: Vec<Technology>,
    /// Snapshot of the team members
    #[serde(default)]
    pub team: Vec<User>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figma_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_link: Option<String>,
    #[serde(default)]
    pub functional_analyses: Vec<FunctionalAnalysis>,
    #[serde(default)]
    pub estimations: Vec<Estimation>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub test_cycles: Vec<TestCycle>,
    #[serde(default)]
    pub defects: Vec<Defect>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
    #[serde(default)]
    pub code_counters: CodeCounters,
}

/// Caller-supplied fields for a new project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub project_type: ProjectType,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub technologies: Vec<Technology>,
    pub team: Vec<User>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub client: Option<String>,
    pub repository: Option<String>,
    pub figma_link: Option<String>,
    pub documentation_link: Option<String>,
}

impl Project {
    /// Build a project with every nested collection empty.
    pub fn new(id: String, data: NewProject, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: data.name,
            description: data.description,
            project_type: data.project_type,
            status: data.status,
            priority: data.priority,
            technologies: data.technologies,
            team: data.team,
            tasks: Vec::new(),
            messages: Vec::new(),
            milestones: Vec::new(),
            start_date: data.start_date,
            end_date: data.end_date,
            created_at: now,
            updated_at: now,
            budget: data.budget,
            client: data.client,
            repository: data.repository,
            figma_link: data.figma_link,
            documentation_link: data.documentation_link,
            functional_analyses: Vec::new(),
            estimations: Vec::new(),
            test_cases: Vec::new(),
            test_cycles: Vec::new(),
            defects: Vec::new(),
            time_entries: Vec::new(),
            code_counters: CodeCounters::default(),
        }
    }

    /// Whether the user is part of the team.
    pub fn has_member(&self, user_id: &str) -> bool {
        self.team.iter().any(|u| u.id == user_id)
    }
}

/// Partial update for a project's own fields.
///
/// Nested collections are only changed through their dedicated commands.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<ProjectType>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub technologies: Option<Vec<Technology>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub client: Option<String>,
    pub repository: Option<String>,
    pub figma_link: Option<String>,
    pub documentation_link: Option<String>,
}

impl ProjectPatch {
    pub fn apply(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(project_type) = self.project_type {
            project.project_type = project_type;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(priority) = self.priority {
            project.priority = priority;
        }
        if let Some(technologies) = self.technologies {
            project.technologies = technologies;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if self.end_date.is_some() {
            project.end_date = self.end_date;
        }
        if self.budget.is_some() {
            project.budget = self.budget;
        }
        if self.client.is_some() {
            project.client = self.client;
        }
        if self.repository.is_some() {
            project.repository = self.repository;
        }
        if self.figma_link.is_some() {
            project.figma_link = self.figma_link;
        }
        if self.documentation_link.is_some() {
            project.documentation_link = self.documentation_link;
        }
    }

    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.project_type.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.technologies.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.budget.is_none()
            && self.client.is_none()
            && self.repository.is_none()
            && self.figma_link.is_none()
            && self.documentation_link.is_none()
    }
}

/// The full application snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub technologies: Vec<Technology>,
    /// Newest first
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub current_user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{epoch, new_project};

    #[test]
    fn test_project_serializes_camel_case() {
        let project = Project::new("p-1".to_string(), new_project("Portal"), epoch());
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["type"], "web");
        assert_eq!(json["status"], "planning");
        assert!(json.get("functionalAnalyses").is_some());
        assert!(json.get("testCycles").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("client").is_none());
    }

    #[test]
    fn test_enum_labels_are_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ProjectStatus::InProgress).unwrap(),
            r#""in-progress""#
        );
        assert_eq!(
            serde_json::to_string(&UserRole::ProjectManager).unwrap(),
            r#""project-manager""#
        );
        assert_eq!(
            serde_json::to_string(&ActivityAction::TaskAdd).unwrap(),
            r#""task_add""#
        );
    }

    #[test]
    fn test_enum_from_str() {
        assert_eq!("done".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert_eq!(
            "on-hold".parse::<ProjectStatus>().unwrap(),
            ProjectStatus::OnHold
        );
        let err = "finished".parse::<TaskStatus>().unwrap_err();
        assert!(err.contains("TaskStatus"));
    }

    #[test]
    fn test_enum_all_and_display() {
        assert_eq!(TaskStatus::all().len(), 4);
        assert_eq!(Priority::Urgent.to_string(), "urgent");
        for status in ProjectStatus::all() {
            assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_task_defaults_when_fields_missing() {
        let json = r#"{"id":"t-1","title":"Login","createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.tags.is_empty());
    }

    #[test]
    fn test_task_patch_only_touches_set_fields() {
        let mut task = Task::new(
            "t-1".to_string(),
            NewTask {
                title: "Implement login".to_string(),
                tags: vec!["auth".to_string()],
                ..NewTask::default()
            },
            epoch(),
        );
        TaskPatch {
            status: Some(TaskStatus::Done),
            ..TaskPatch::default()
        }
        .apply(&mut task);
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.title, "Implement login");
        assert_eq!(task.tags, vec!["auth".to_string()]);
    }

    #[test]
    fn test_milestone_progress_is_clamped() {
        let mut milestone = Milestone::new(
            "m-1".to_string(),
            NewMilestone {
                title: "Beta".to_string(),
                progress: 140,
                ..NewMilestone::default()
            },
        );
        assert_eq!(milestone.progress, 100);
        MilestonePatch {
            progress: Some(40),
            ..MilestonePatch::default()
        }
        .apply(&mut milestone);
        assert_eq!(milestone.progress, 40);
    }

    #[test]
    fn test_project_patch_is_empty() {
        assert!(ProjectPatch::default().is_empty());
        let patch = ProjectPatch {
            client: Some("ACME".to_string()),
            ..ProjectPatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_state_keys() {
        let json = serde_json::to_value(State::default()).unwrap();
        for key in ["projects", "users", "technologies", "activities", "currentUser"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(new_id(), new_id());
    }
}
