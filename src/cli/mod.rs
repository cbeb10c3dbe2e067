//! CLI argument definitions for PlanStack.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::OutputFormat;
use crate::models::{
    AnalysisStatus, Complexity, ConfidenceLevel, DefectSeverity, DefectStatus,
    EstimationCategory, EstimationMethod, EstimationStatus, MilestoneStatus, Priority,
    ProjectStatus, ProjectType, RequirementPriority, RequirementStatus, RequirementType,
    TaskStatus, TestCycleStatus, TestOutcome, TestPriority, TestStatus, TestType,
};
use crate::store::CodeSequence;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("PS_GIT_COMMIT"),
    ", built ",
    env!("PS_BUILD_TIMESTAMP"),
    ")"
);

/// PlanStack - projects, requirements, estimations, tests and defects in one local store.
///
/// Run `planstack system init` once to create the data directory with demo data.
#[derive(Parser, Debug)]
#[command(name = "planstack")]
#[command(author, version, long_version = LONG_VERSION, about = "A local project-management store", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Directory holding the persisted state and config.kdl
    #[arg(long, global = true, env = "PLANSTACK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Code numbering strategy (length, monotonic); overrides config.kdl
    #[arg(long, global = true)]
    pub code_sequence: Option<CodeSequence>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Data directory, demo data and current user
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },

    /// Project management commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Task commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Team message commands
    Message {
        #[command(subcommand)]
        command: MessageCommands,
    },

    /// Milestone commands
    Milestone {
        #[command(subcommand)]
        command: MilestoneCommands,
    },

    /// Team membership commands
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },

    /// Functional analysis commands
    Analysis {
        #[command(subcommand)]
        command: AnalysisCommands,
    },

    /// Requirement commands (within a functional analysis)
    Requirement {
        #[command(subcommand)]
        command: RequirementCommands,
    },

    /// Estimation commands
    Estimation {
        #[command(subcommand)]
        command: EstimationCommands,
    },

    /// Test case commands
    Testcase {
        #[command(subcommand)]
        command: TestcaseCommands,
    },

    /// Test cycle commands
    Cycle {
        #[command(subcommand)]
        command: CycleCommands,
    },

    /// Defect tracking commands
    Defect {
        #[command(subcommand)]
        command: DefectCommands,
    },

    /// Time tracking commands
    Time {
        #[command(subcommand)]
        command: TimeCommands,
    },

    /// Activity log commands
    Activity {
        #[command(subcommand)]
        command: ActivityCommands,
    },

    /// Totals across every project
    Dashboard {
        /// Number of recently updated projects to include
        #[arg(long, default_value_t = 5)]
        recent: usize,
    },
}

/// System subcommands
#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// Create the data directory and seed it with demo data
    Init,

    /// Replace all data with the demo data set
    ResetDemo {
        /// Confirm that existing data will be discarded
        #[arg(long)]
        yes: bool,
    },

    /// Show the current user
    Whoami,

    /// Switch the current user
    Use {
        /// User ID (e.g., user-1)
        user_id: String,
    },

    /// List users
    Users,

    /// Show the resolved configuration, optionally saving new values to config.kdl
    Config {
        /// Default output format (json, human)
        #[arg(long, value_parser = parse_output_format)]
        output_format: Option<OutputFormat>,

        /// Default code numbering strategy (length, monotonic)
        #[arg(long)]
        set_code_sequence: Option<CodeSequence>,
    },
}

/// Fields shared by project create and update.
#[derive(Args, Debug, Default)]
pub struct ProjectFields {
    /// Project description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Project type (web, mobile, desktop, api, fullstack, other)
    #[arg(long = "type")]
    pub project_type: Option<ProjectType>,

    /// Status (planning, in-progress, review, completed, on-hold)
    #[arg(long)]
    pub status: Option<ProjectStatus>,

    /// Priority (low, medium, high, urgent)
    #[arg(short, long)]
    pub priority: Option<Priority>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Budget
    #[arg(long)]
    pub budget: Option<f64>,

    /// Client name
    #[arg(long)]
    pub client: Option<String>,

    /// Repository URL
    #[arg(long)]
    pub repository: Option<String>,

    /// Technology IDs (repeatable)
    #[arg(long = "tech")]
    pub technologies: Vec<String>,
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    Create {
        /// Project name
        name: String,

        #[command(flatten)]
        fields: ProjectFields,
    },

    /// List projects
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<ProjectStatus>,
    },

    /// Show a project with its overview counts
    Show {
        /// Project ID
        id: String,
    },

    /// Update a project's own fields
    Update {
        /// Project ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: ProjectFields,
    },

    /// Delete a project and everything it owns
    Delete {
        /// Project ID
        id: String,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Add a task to a project
    Add {
        /// Project ID
        project: String,

        /// Task title
        title: String,

        /// Task description
        #[arg(short, long)]
        description: Option<String>,

        /// Status (todo, in-progress, review, done)
        #[arg(long)]
        status: Option<TaskStatus>,

        /// Priority (low, medium, high, urgent)
        #[arg(short, long)]
        priority: Option<Priority>,

        /// Assignee user ID
        #[arg(short, long)]
        assignee: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due_date: Option<NaiveDate>,

        /// Tags for the task
        #[arg(short, long)]
        tag: Vec<String>,

        /// Estimated hours
        #[arg(long)]
        estimated_hours: Option<f64>,

        /// Requirement the task implements
        #[arg(long)]
        requirement: Option<String>,
    },

    /// Update a task
    Update {
        /// Project ID
        project: String,

        /// Task ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New status (todo, in-progress, review, done)
        #[arg(long)]
        status: Option<TaskStatus>,

        /// New priority
        #[arg(long)]
        priority: Option<Priority>,

        /// New assignee user ID
        #[arg(long)]
        assignee: Option<String>,

        /// New due date
        #[arg(long)]
        due_date: Option<NaiveDate>,

        /// Hours actually spent
        #[arg(long)]
        actual_hours: Option<f64>,
    },

    /// Delete a task
    Delete {
        /// Project ID
        project: String,

        /// Task ID
        id: String,
    },
}

/// Message subcommands
#[derive(Subcommand, Debug)]
pub enum MessageCommands {
    /// Post a message as the current user
    Post {
        /// Project ID
        project: String,

        /// Message text
        content: String,

        /// Mark as an announcement
        #[arg(long)]
        announcement: bool,
    },
}

/// Milestone subcommands
#[derive(Subcommand, Debug)]
pub enum MilestoneCommands {
    /// Add a milestone
    Add {
        /// Project ID
        project: String,

        /// Milestone title
        title: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due_date: NaiveDate,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Status (pending, in-progress, completed)
        #[arg(long)]
        status: Option<MilestoneStatus>,

        /// Completion percentage (0-100)
        #[arg(long)]
        progress: Option<u8>,
    },

    /// Update a milestone
    Update {
        /// Project ID
        project: String,

        /// Milestone ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New due date
        #[arg(long)]
        due_date: Option<NaiveDate>,

        /// New status
        #[arg(long)]
        status: Option<MilestoneStatus>,

        /// New completion percentage
        #[arg(long)]
        progress: Option<u8>,
    },
}

/// Team subcommands
#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    /// Add a user to the project team
    Add {
        /// Project ID
        project: String,

        /// User ID
        user_id: String,
    },

    /// Remove a user from the project team
    Remove {
        /// Project ID
        project: String,

        /// User ID
        user_id: String,
    },
}

/// Functional analysis subcommands
#[derive(Subcommand, Debug)]
pub enum AnalysisCommands {
    /// Create a functional analysis authored by the current user
    Create {
        /// Project ID
        project: String,

        /// Analysis title
        title: String,

        /// Document version
        #[arg(long, default_value = "1.0")]
        version: String,

        /// Status (draft, review, approved, superseded)
        #[arg(long)]
        status: Option<AnalysisStatus>,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// In-scope summary
        #[arg(long)]
        scope: Option<String>,

        /// Out-of-scope summary
        #[arg(long)]
        out_of_scope: Option<String>,
    },
}

/// Requirement subcommands
#[derive(Subcommand, Debug)]
pub enum RequirementCommands {
    /// Add a requirement with the next REQ code
    Add {
        /// Project ID
        project: String,

        /// Functional analysis ID
        analysis: String,

        /// Requirement title
        title: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Type (functional, non-functional, technical, business, user-story)
        #[arg(long = "type")]
        requirement_type: Option<RequirementType>,

        /// Priority (must-have, should-have, could-have, wont-have)
        #[arg(short, long)]
        priority: Option<RequirementPriority>,

        /// Acceptance criterion (repeatable)
        #[arg(long = "criterion")]
        acceptance_criteria: Vec<String>,
    },

    /// Update a requirement; tracked changes bump its version
    Update {
        /// Project ID
        project: String,

        /// Functional analysis ID
        analysis: String,

        /// Requirement ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New type
        #[arg(long = "type")]
        requirement_type: Option<RequirementType>,

        /// New priority
        #[arg(long)]
        priority: Option<RequirementPriority>,

        /// New status (draft, review, approved, implemented, rejected)
        #[arg(long)]
        status: Option<RequirementStatus>,
    },

    /// Comment on a requirement as the current user
    Comment {
        /// Project ID
        project: String,

        /// Functional analysis ID
        analysis: String,

        /// Requirement ID
        id: String,

        /// Comment text
        content: String,
    },
}

/// Estimation subcommands
#[derive(Subcommand, Debug)]
pub enum EstimationCommands {
    /// Create an estimation authored by the current user
    Create {
        /// Project ID
        project: String,

        /// Estimation title
        title: String,

        /// Document version
        #[arg(long, default_value = "1.0")]
        version: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Method (hours, story-points, t-shirt)
        #[arg(long)]
        method: Option<EstimationMethod>,

        /// Buffer percentage
        #[arg(long, default_value_t = 20.0)]
        buffer: f64,

        /// Contingency percentage
        #[arg(long)]
        contingency: Option<f64>,
    },

    /// Show an estimation with its breakdown
    Show {
        /// Project ID
        project: String,

        /// Estimation ID
        id: String,
    },

    /// Update an estimation's own fields
    Update {
        /// Project ID
        project: String,

        /// Estimation ID
        id: String,

        /// New status (draft, review, approved, rejected)
        #[arg(long)]
        status: Option<EstimationStatus>,

        /// New buffer percentage
        #[arg(long)]
        buffer: Option<f64>,

        /// New contingency percentage
        #[arg(long)]
        contingency: Option<f64>,
    },

    /// Add an item; the estimation total is recomputed
    ItemAdd {
        /// Project ID
        project: String,

        /// Estimation ID
        estimation: String,

        /// Item title
        title: String,

        /// Estimated hours
        #[arg(long)]
        hours: f64,

        /// Category (development, design, testing, devops, management, documentation, other)
        #[arg(long)]
        category: Option<EstimationCategory>,

        /// Complexity (low, medium, high, critical)
        #[arg(long)]
        complexity: Option<Complexity>,

        /// Confidence (low, medium, high)
        #[arg(long)]
        confidence: Option<ConfidenceLevel>,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Update an item; the estimation total is recomputed
    ItemUpdate {
        /// Project ID
        project: String,

        /// Estimation ID
        estimation: String,

        /// Item ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New estimated hours
        #[arg(long)]
        hours: Option<f64>,

        /// New category
        #[arg(long)]
        category: Option<EstimationCategory>,

        /// New complexity
        #[arg(long)]
        complexity: Option<Complexity>,
    },

    /// Delete an item; the estimation total is recomputed
    ItemDelete {
        /// Project ID
        project: String,

        /// Estimation ID
        estimation: String,

        /// Item ID
        id: String,
    },
}

/// Test case subcommands
#[derive(Subcommand, Debug)]
pub enum TestcaseCommands {
    /// Add a test case with the next TC code
    Add {
        /// Project ID
        project: String,

        /// Test case title
        title: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Type (manual, automated)
        #[arg(long = "type")]
        test_type: Option<TestType>,

        /// Priority (critical, high, medium, low)
        #[arg(short, long)]
        priority: Option<TestPriority>,

        /// Status (draft, active, blocked, deprecated)
        #[arg(long)]
        status: Option<TestStatus>,

        /// Linked requirement ID
        #[arg(long)]
        requirement: Option<String>,

        /// Step as "action=>expected result" (repeatable)
        #[arg(long = "step")]
        steps: Vec<String>,
    },

    /// Delete a test case
    Delete {
        /// Project ID
        project: String,

        /// Test case ID
        id: String,
    },
}

/// Test cycle subcommands
#[derive(Subcommand, Debug)]
pub enum CycleCommands {
    /// Create a test cycle from existing test cases
    Create {
        /// Project ID
        project: String,

        /// Cycle name
        name: String,

        /// Target environment
        #[arg(long, default_value = "staging")]
        environment: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Version under test
        #[arg(long)]
        version: Option<String>,

        /// Build under test
        #[arg(long)]
        build: Option<String>,

        /// Status (planned, in-progress, completed, aborted)
        #[arg(long)]
        status: Option<TestCycleStatus>,

        /// Test case ID to include (repeatable)
        #[arg(long = "case")]
        cases: Vec<String>,
    },

    /// Record a test execution and refresh the cycle summary
    Execute {
        /// Project ID
        project: String,

        /// Test cycle ID
        cycle: String,

        /// Test case ID
        test_case: String,

        /// Result (pending, passed, failed, blocked, skipped)
        #[arg(long)]
        result: TestOutcome,

        /// Execution notes
        #[arg(long)]
        notes: Option<String>,

        /// Environment the run used
        #[arg(long)]
        environment: Option<String>,

        /// Duration in minutes
        #[arg(long)]
        minutes: Option<u32>,

        /// Related defect ID (repeatable)
        #[arg(long = "defect")]
        defects: Vec<String>,

        /// User ID of the tester (defaults to the current user)
        #[arg(long)]
        executed_by: Option<String>,
    },

    /// Show a test cycle with its summary
    Show {
        /// Project ID
        project: String,

        /// Test cycle ID
        id: String,
    },
}

/// Defect subcommands
#[derive(Subcommand, Debug)]
pub enum DefectCommands {
    /// Report a defect with the next BUG code
    Report {
        /// Project ID
        project: String,

        /// Defect title
        title: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Severity (critical, high, medium, low)
        #[arg(long)]
        severity: Option<DefectSeverity>,

        /// Priority (low, medium, high, urgent)
        #[arg(short, long)]
        priority: Option<Priority>,

        /// Environment where it was observed
        #[arg(long)]
        environment: Option<String>,

        /// Step to reproduce (repeatable)
        #[arg(long = "step")]
        steps: Vec<String>,

        /// Assignee user ID
        #[arg(short, long)]
        assignee: Option<String>,

        /// Linked test case ID
        #[arg(long)]
        test_case: Option<String>,

        /// Linked requirement ID
        #[arg(long)]
        requirement: Option<String>,
    },

    /// Update a defect
    Update {
        /// Project ID
        project: String,

        /// Defect ID
        id: String,

        /// New status (open, in-progress, resolved, closed, reopened, rejected)
        #[arg(long)]
        status: Option<DefectStatus>,

        /// New severity
        #[arg(long)]
        severity: Option<DefectSeverity>,

        /// New priority
        #[arg(long)]
        priority: Option<Priority>,

        /// New assignee user ID
        #[arg(long)]
        assignee: Option<String>,
    },
}

/// Time tracking subcommands
#[derive(Subcommand, Debug)]
pub enum TimeCommands {
    /// Log hours against a project
    Log {
        /// Project ID
        project: String,

        /// Hours worked
        hours: f64,

        /// Task ID the hours belong to
        #[arg(long)]
        task: Option<String>,

        /// Day worked (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// What was done
        #[arg(short, long)]
        description: Option<String>,

        /// Mark the hours as billable
        #[arg(long)]
        billable: bool,

        /// User ID (defaults to the current user)
        #[arg(long)]
        user: Option<String>,
    },
}

/// Activity subcommands
#[derive(Subcommand, Debug)]
pub enum ActivityCommands {
    /// List activities, newest first
    List {
        /// Only activities of this project
        #[arg(long)]
        project: Option<String>,

        /// Maximum number of entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(s).ok_or_else(|| format!("Invalid output format: '{}'. Valid values: json, human", s))
}
