//! Command implementations for the PlanStack CLI.
//!
//! Each function runs one command against a [`Store`] and returns a value
//! that renders as JSON or as text for humans. Persistence is left to the
//! caller.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{OutputFormat, PlanstackConfig, ResolvedConfig};
use crate::models::{
    Activity, Defect, DefectPatch, Estimation, EstimationItem, EstimationItemPatch,
    EstimationPatch, FunctionalAnalysis, FunctionalRequirement, Message, Milestone,
    MilestonePatch, NewDefect, NewEstimation, NewEstimationItem, NewFunctionalAnalysis,
    NewMilestone, NewProject, NewRequirement, NewTask, NewTestCase, NewTestCycle,
    NewTestExecution, NewTimeEntry, Project, ProjectPatch, ProjectStatus, RequirementComment,
    RequirementPatch, Task, TaskPatch, TestCase, TestCycle, TestExecution, TestStep,
    TimeEntry, User, new_id,
};
use crate::stats::{DashboardStats, EstimationBreakdown, ProjectOverview, ProjectProgress};
use crate::storage::Storage;
use crate::store::{CodeSequence, Store, locate};
use crate::{Error, Result, stats};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

/// Implement [`Output`] with serde JSON and a closure-like human formatter.
macro_rules! impl_output {
    ($ty:ty, |$it:ident| $human:expr) => {
        impl Output for $ty {
            fn to_json(&self) -> String {
                json(self)
            }

            fn to_human(&self) -> String {
                let $it = self;
                $human
            }
        }
    };
}

fn require_user<T>(value: Option<T>) -> Result<T> {
    value.ok_or(Error::NoCurrentUser)
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(())
}

fn require_hours(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(Error::InvalidInput(format!(
            "hours must be a non-negative number, got {}",
            hours
        )));
    }
    Ok(())
}

fn lookup_user(store: &Store, user_id: Option<&str>) -> Result<Option<User>> {
    user_id.map(|id| store.user(id).cloned()).transpose()
}

// === Entity renderings ===

impl_output!(User, |u| format!("{} ({}) <{}> [{}]", u.name, u.id, u.email, u.role));

impl_output!(Project, |p| format!(
    "{} ({})\n  type {}, status {}, priority {}, starts {}\n  {} team members, {} technologies",
    p.name,
    p.id,
    p.project_type,
    p.status,
    p.priority,
    p.start_date,
    p.team.len(),
    p.technologies.len()
));

impl_output!(Task, |t| {
    let mut line = format!("{} {} [{}, {}]", t.id, t.title, t.status, t.priority);
    if let Some(assignee) = &t.assignee {
        line.push_str(&format!(" @{}", assignee.name));
    }
    line
});

impl_output!(Message, |m| {
    let marker = if m.is_announcement { " (announcement)" } else { "" };
    format!("{}{}: {}", m.author.name, marker, m.content)
});

impl_output!(Milestone, |m| format!(
    "{} {} due {} [{}, {}%]",
    m.id, m.title, m.due_date, m.status, m.progress
));

impl_output!(FunctionalAnalysis, |a| format!(
    "{} {} v{} [{}] by {}",
    a.id, a.title, a.version, a.status, a.created_by.name
));

impl_output!(FunctionalRequirement, |r| format!(
    "{} {} [{}, {}, v{}] ({})",
    r.code, r.title, r.status, r.priority, r.version, r.id
));

impl_output!(RequirementComment, |c| format!("{}: {}", c.author.name, c.content));

impl_output!(EstimationItem, |i| format!(
    "{} {} [{}] {}h",
    i.id, i.title, i.category, i.estimated_hours
));

impl_output!(TestCase, |t| format!(
    "{} {} [{}, {}] ({})",
    t.code, t.title, t.status, t.priority, t.id
));

impl_output!(TestExecution, |e| format!(
    "{} {} by {} at {}",
    e.test_case.code,
    e.result,
    e.executed_by.name,
    e.executed_at.format("%Y-%m-%d %H:%M")
));

impl_output!(Defect, |d| {
    let mut line = format!(
        "{} {} [{}, {}, {}] ({})",
        d.code, d.title, d.status, d.severity, d.priority, d.id
    );
    if let Some(resolved_at) = d.resolved_at {
        line.push_str(&format!("\n  resolved {}", resolved_at.format("%Y-%m-%d %H:%M")));
    }
    line
});

impl_output!(TimeEntry, |t| format!(
    "{}h on {} by {}{}",
    t.hours,
    t.date,
    t.user_id,
    if t.billable { " (billable)" } else { "" }
));

impl_output!(TestCycle, |c| {
    let mut lines = vec![format!(
        "{} {} [{}] {} cases, {} executions",
        c.id,
        c.name,
        c.status,
        c.test_cases.len(),
        c.executions.len()
    )];
    match &c.summary {
        Some(s) => lines.push(format!(
            "  passed {}, failed {}, blocked {}, skipped {}, not run {}\n  pass rate {}%, progress {}%",
            s.passed, s.failed, s.blocked, s.skipped, s.not_run, s.pass_rate, s.execution_progress
        )),
        None => lines.push("  no executions yet".to_string()),
    }
    lines.join("\n")
});

// === Command results ===

/// Result of `system init`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResult {
    pub data_dir: PathBuf,
    pub created: bool,
}

impl_output!(InitResult, |r| if r.created {
    format!("Initialized PlanStack data in {}", r.data_dir.display())
} else {
    format!("PlanStack data already exists in {}", r.data_dir.display())
});

/// Result of `system reset-demo`.
#[derive(Serialize)]
pub struct ResetResult {
    pub projects: usize,
    pub users: usize,
}

impl_output!(ResetResult, |r| format!(
    "Demo data restored: {} projects, {} users",
    r.projects, r.users
));

/// Result of `system whoami`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmI {
    pub current_user: Option<User>,
}

impl_output!(WhoAmI, |w| match &w.current_user {
    Some(user) => user.to_human(),
    None => "No current user".to_string(),
});

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserList {
    pub users: Vec<User>,
    pub current_user_id: Option<String>,
}

impl_output!(UserList, |l| l
    .users
    .iter()
    .map(|u| {
        let marker = if l.current_user_id.as_deref() == Some(u.id.as_str()) {
            "*"
        } else {
            " "
        };
        format!("{} {}", marker, u.to_human())
    })
    .collect::<Vec<_>>()
    .join("\n"));

/// Result of `system config`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigReport {
    pub path: PathBuf,
    pub saved: bool,
    pub resolved: ResolvedConfig,
}

impl_output!(ConfigReport, |c| {
    let mut lines = vec![format!("Config file: {}", c.path.display())];
    if c.saved {
        lines.push("Saved.".to_string());
    }
    lines.push(format!(
        "output-format: {} ({})",
        c.resolved.output_format.value, c.resolved.output_format.source
    ));
    lines.push(format!(
        "code-sequence: {} ({})",
        c.resolved.code_sequence.value, c.resolved.code_sequence.source
    ));
    lines.join("\n")
});

/// One line of a project listing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub progress: ProjectProgress,
    pub team_size: usize,
}

impl ProjectSummary {
    fn of(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            status: project.status,
            progress: ProjectProgress::of(project),
            team_size: project.team.len(),
        }
    }
}

fn summary_line(p: &ProjectSummary) -> String {
    format!(
        "{} {} [{}] {}% ({}/{} tasks)",
        p.id,
        p.name,
        p.status,
        p.progress.percent,
        p.progress.completed_tasks,
        p.progress.total_tasks
    )
}

#[derive(Serialize)]
pub struct ProjectList {
    pub projects: Vec<ProjectSummary>,
    pub count: usize,
}

impl_output!(ProjectList, |l| if l.projects.is_empty() {
    "No projects.".to_string()
} else {
    l.projects
        .iter()
        .map(summary_line)
        .collect::<Vec<_>>()
        .join("\n")
});

/// A project with its overview counts.
#[derive(Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub overview: ProjectOverview,
}

impl_output!(ProjectDetail, |d| {
    let p = &d.project;
    let o = &d.overview;
    let mut lines = vec![
        format!("{} ({})", p.name, p.id),
        format!("  type {}, status {}, priority {}", p.project_type, p.status, p.priority),
        format!(
            "  tasks {}/{} done ({}%), {} todo, {} in progress, {} in review",
            o.progress.completed_tasks,
            o.progress.total_tasks,
            o.progress.percent,
            o.todo_tasks,
            o.in_progress_tasks,
            o.review_tasks
        ),
        format!("  team {}, milestones {}", o.team_size, o.milestones),
        format!(
            "  requirements {}, active test cases {}, open defects {}",
            o.requirements, o.active_test_cases, o.open_defects
        ),
        format!(
            "  estimated {}h, logged {}h",
            o.estimated_hours, o.logged_hours
        ),
    ];
    if !p.description.is_empty() {
        lines.insert(1, format!("  {}", p.description));
    }
    lines.join("\n")
});

/// Confirmation of a delete.
#[derive(Serialize)]
pub struct Deleted {
    pub entity: &'static str,
    pub id: String,
}

impl_output!(Deleted, |d| format!("Deleted {} {}", d.entity, d.id));

/// Result of a team membership change.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamChange {
    pub project_id: String,
    pub user_id: String,
    pub added: bool,
    /// False when the membership already had the requested state
    pub changed: bool,
}

impl_output!(TeamChange, |t| match (t.added, t.changed) {
    (true, true) => format!("{} joined {}", t.user_id, t.project_id),
    (true, false) => format!("{} is already on {}", t.user_id, t.project_id),
    (false, true) => format!("{} left {}", t.user_id, t.project_id),
    (false, false) => format!("{} is not on {}", t.user_id, t.project_id),
});

/// An estimation with its totals.
#[derive(Serialize)]
pub struct EstimationReport {
    pub estimation: Estimation,
    pub breakdown: EstimationBreakdown,
}

impl_output!(EstimationReport, |r| {
    let e = &r.estimation;
    let b = &r.breakdown;
    let mut lines = vec![
        format!("{} v{} [{}] ({})", e.title, e.version, e.status, e.id),
        format!(
            "  {}h + {}% buffer = {}h",
            b.total_hours, e.buffer_percentage, b.total_with_buffer
        ),
    ];
    if b.contingency_hours > 0.0 {
        lines.push(format!("  contingency {}h", b.contingency_hours));
    }
    for category in &b.categories {
        lines.push(format!(
            "  {}: {}h over {} items",
            category.category, category.hours, category.count
        ));
    }
    for item in &e.items {
        lines.push(format!("    {}", item.to_human()));
    }
    lines.join("\n")
});

#[derive(Serialize)]
pub struct ActivityList {
    pub activities: Vec<Activity>,
}

impl_output!(ActivityList, |l| if l.activities.is_empty() {
    "No activity.".to_string()
} else {
    l.activities
        .iter()
        .map(|a| {
            format!(
                "{} [{}] {} ({})",
                a.created_at.format("%Y-%m-%d %H:%M"),
                a.action,
                a.details,
                a.user_id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
});

#[derive(Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent: Vec<ProjectSummary>,
}

impl_output!(Dashboard, |d| {
    let s = &d.stats;
    let mut lines = vec![
        format!(
            "Projects: {} ({} active, {} completed)",
            s.total_projects, s.active_projects, s.completed_projects
        ),
        format!("Tasks: {}/{} done", s.completed_tasks, s.total_tasks),
        format!(
            "Requirements: {}, test cases: {}, estimations: {} ({}h)",
            s.total_requirements, s.total_test_cases, s.total_estimations, s.total_estimated_hours
        ),
    ];
    if !d.recent.is_empty() {
        lines.push("Recently updated:".to_string());
        lines.extend(d.recent.iter().map(|p| format!("  {}", summary_line(p))));
    }
    lines.join("\n")
});

// === System ===

/// Create the data directory, seeding it with `initial` on first run.
pub fn system_init(data_dir: &Path, initial: &crate::models::State) -> Result<InitResult> {
    let created = !Storage::exists(data_dir);
    Storage::init(data_dir, initial)?;
    Ok(InitResult {
        data_dir: data_dir.to_path_buf(),
        created,
    })
}

pub fn system_reset_demo(store: &mut Store, confirmed: bool) -> Result<ResetResult> {
    if !confirmed {
        return Err(Error::InvalidInput(
            "reset-demo discards all data; pass --yes to confirm".to_string(),
        ));
    }
    store.reset_to_demo();
    Ok(ResetResult {
        projects: store.projects().len(),
        users: store.users().len(),
    })
}

pub fn system_whoami(store: &Store) -> WhoAmI {
    WhoAmI {
        current_user: store.current_user().cloned(),
    }
}

pub fn system_use(store: &mut Store, user_id: &str) -> Result<User> {
    store.switch_user(user_id)
}

pub fn system_users(store: &Store) -> UserList {
    UserList {
        users: store.users().to_vec(),
        current_user_id: store.current_user().map(|u| u.id.clone()),
    }
}

/// Show the resolved configuration, merging any new values into `config.kdl`.
///
/// `resolve` turns the file config into the effective one so CLI flags keep
/// their precedence in the report.
pub fn system_config(
    storage: &Storage,
    output_format: Option<OutputFormat>,
    code_sequence: Option<CodeSequence>,
    resolve: impl Fn(&PlanstackConfig) -> ResolvedConfig,
) -> Result<ConfigReport> {
    let mut file = storage.read_config();
    let update = PlanstackConfig {
        output_format,
        code_sequence,
    };
    let saved = update != PlanstackConfig::default();
    if saved {
        file.merge(&update);
        storage.write_config(&file)?;
    }
    Ok(ConfigReport {
        path: storage.config_path(),
        saved,
        resolved: resolve(&file),
    })
}

// === Projects ===

pub fn project_create(store: &mut Store, data: NewProject) -> Result<Project> {
    require_text("project name", &data.name)?;
    Ok(store.add_project(data))
}

pub fn project_list(store: &Store, status: Option<ProjectStatus>) -> ProjectList {
    let projects: Vec<ProjectSummary> = store
        .projects()
        .iter()
        .filter(|p| status.is_none_or(|s| p.status == s))
        .map(ProjectSummary::of)
        .collect();
    ProjectList {
        count: projects.len(),
        projects,
    }
}

pub fn project_show(store: &Store, id: &str) -> Result<ProjectDetail> {
    let project = store.project(id)?;
    Ok(ProjectDetail {
        overview: ProjectOverview::of(project),
        project: project.clone(),
    })
}

pub fn project_update(store: &mut Store, id: &str, patch: ProjectPatch) -> Result<ProjectDetail> {
    if patch.is_empty() {
        return Err(Error::InvalidInput("no fields to update".to_string()));
    }
    if let Some(name) = &patch.name {
        require_text("project name", name)?;
    }
    store.update_project(id, patch)?;
    project_show(store, id)
}

pub fn project_delete(store: &mut Store, id: &str) -> Result<Deleted> {
    store.delete_project(id)?;
    Ok(Deleted {
        entity: "project",
        id: id.to_string(),
    })
}

/// Resolve technology ids against the store's catalogue.
pub fn technologies_by_id(
    store: &Store,
    ids: &[String],
) -> Result<Vec<crate::models::Technology>> {
    ids.iter()
        .map(|id| locate(store.technologies(), id).cloned())
        .collect()
}

// === Tasks, messages, milestones, team ===

pub fn task_add(
    store: &mut Store,
    project_id: &str,
    mut data: NewTask,
    assignee: Option<&str>,
) -> Result<Task> {
    require_text("task title", &data.title)?;
    data.assignee = lookup_user(store, assignee)?;
    store.add_task(project_id, data)
}

pub fn task_update(
    store: &mut Store,
    project_id: &str,
    task_id: &str,
    mut patch: TaskPatch,
    assignee: Option<&str>,
) -> Result<Task> {
    patch.assignee = lookup_user(store, assignee)?;
    store.update_task(project_id, task_id, patch)
}

pub fn task_delete(store: &mut Store, project_id: &str, task_id: &str) -> Result<Deleted> {
    store.delete_task(project_id, task_id)?;
    Ok(Deleted {
        entity: "task",
        id: task_id.to_string(),
    })
}

pub fn message_post(
    store: &mut Store,
    project_id: &str,
    content: &str,
    announcement: bool,
) -> Result<Message> {
    require_text("message", content)?;
    require_user(store.add_message(project_id, content, announcement)?)
}

pub fn milestone_add(store: &mut Store, project_id: &str, data: NewMilestone) -> Result<Milestone> {
    require_text("milestone title", &data.title)?;
    store.add_milestone(project_id, data)
}

pub fn milestone_update(
    store: &mut Store,
    project_id: &str,
    milestone_id: &str,
    patch: MilestonePatch,
) -> Result<Milestone> {
    store.update_milestone(project_id, milestone_id, patch)
}

pub fn team_add(store: &mut Store, project_id: &str, user_id: &str) -> Result<TeamChange> {
    let changed = store.add_team_member(project_id, user_id)?;
    Ok(TeamChange {
        project_id: project_id.to_string(),
        user_id: user_id.to_string(),
        added: true,
        changed,
    })
}

pub fn team_remove(store: &mut Store, project_id: &str, user_id: &str) -> Result<TeamChange> {
    let changed = store.remove_team_member(project_id, user_id)?;
    Ok(TeamChange {
        project_id: project_id.to_string(),
        user_id: user_id.to_string(),
        added: false,
        changed,
    })
}

// === Analyses and requirements ===

pub fn analysis_create(
    store: &mut Store,
    project_id: &str,
    data: NewFunctionalAnalysis,
) -> Result<FunctionalAnalysis> {
    require_text("analysis title", &data.title)?;
    store.add_functional_analysis(project_id, data)
}

pub fn requirement_add(
    store: &mut Store,
    project_id: &str,
    analysis_id: &str,
    data: NewRequirement,
) -> Result<FunctionalRequirement> {
    require_text("requirement title", &data.title)?;
    require_user(store.add_requirement(project_id, analysis_id, data)?)
}

pub fn requirement_update(
    store: &mut Store,
    project_id: &str,
    analysis_id: &str,
    requirement_id: &str,
    patch: RequirementPatch,
) -> Result<FunctionalRequirement> {
    store.update_requirement(project_id, analysis_id, requirement_id, patch)
}

pub fn requirement_comment(
    store: &mut Store,
    project_id: &str,
    analysis_id: &str,
    requirement_id: &str,
    content: &str,
) -> Result<RequirementComment> {
    require_text("comment", content)?;
    require_user(store.add_requirement_comment(project_id, analysis_id, requirement_id, content)?)
}

// === Estimations ===

fn estimation_report(store: &Store, project_id: &str, estimation_id: &str) -> Result<EstimationReport> {
    let estimation = locate(&store.project(project_id)?.estimations, estimation_id)?.clone();
    Ok(EstimationReport {
        breakdown: EstimationBreakdown::of(&estimation),
        estimation,
    })
}

pub fn estimation_create(
    store: &mut Store,
    project_id: &str,
    data: NewEstimation,
) -> Result<EstimationReport> {
    require_text("estimation title", &data.title)?;
    require_hours(data.buffer_percentage)?;
    let estimation = store.add_estimation(project_id, data)?;
    estimation_report(store, project_id, &estimation.id)
}

pub fn estimation_show(store: &Store, project_id: &str, estimation_id: &str) -> Result<EstimationReport> {
    estimation_report(store, project_id, estimation_id)
}

pub fn estimation_update(
    store: &mut Store,
    project_id: &str,
    estimation_id: &str,
    patch: EstimationPatch,
) -> Result<EstimationReport> {
    store.update_estimation(project_id, estimation_id, patch)?;
    estimation_report(store, project_id, estimation_id)
}

pub fn estimation_item_add(
    store: &mut Store,
    project_id: &str,
    estimation_id: &str,
    data: NewEstimationItem,
) -> Result<EstimationItem> {
    require_text("item title", &data.title)?;
    require_hours(data.estimated_hours)?;
    store.add_estimation_item(project_id, estimation_id, data)
}

pub fn estimation_item_update(
    store: &mut Store,
    project_id: &str,
    estimation_id: &str,
    item_id: &str,
    patch: EstimationItemPatch,
) -> Result<EstimationItem> {
    if let Some(hours) = patch.estimated_hours {
        require_hours(hours)?;
    }
    store.update_estimation_item(project_id, estimation_id, item_id, patch)
}

pub fn estimation_item_delete(
    store: &mut Store,
    project_id: &str,
    estimation_id: &str,
    item_id: &str,
) -> Result<Deleted> {
    store.delete_estimation_item(project_id, estimation_id, item_id)?;
    Ok(Deleted {
        entity: "estimation item",
        id: item_id.to_string(),
    })
}

// === Testing ===

/// Parse `action=>expected` step descriptions, numbering them from 1.
pub fn parse_steps(steps: &[String]) -> Result<Vec<TestStep>> {
    steps
        .iter()
        .zip(1u32..)
        .map(|(raw, step_number)| {
            let (action, expected) = raw.split_once("=>").ok_or_else(|| {
                Error::InvalidInput(format!(
                    "step '{}' must look like \"action=>expected result\"",
                    raw
                ))
            })?;
            Ok(TestStep {
                id: new_id(),
                step_number,
                action: action.trim().to_string(),
                expected_result: expected.trim().to_string(),
                ..TestStep::default()
            })
        })
        .collect()
}

pub fn testcase_add(store: &mut Store, project_id: &str, data: NewTestCase) -> Result<TestCase> {
    require_text("test case title", &data.title)?;
    require_user(store.add_test_case(project_id, data)?)
}

pub fn testcase_delete(store: &mut Store, project_id: &str, test_case_id: &str) -> Result<Deleted> {
    store.delete_test_case(project_id, test_case_id)?;
    Ok(Deleted {
        entity: "test case",
        id: test_case_id.to_string(),
    })
}

/// Create a cycle whose case list is copied from the project's test cases.
pub fn cycle_create(
    store: &mut Store,
    project_id: &str,
    mut data: NewTestCycle,
    case_ids: &[String],
) -> Result<TestCycle> {
    require_text("cycle name", &data.name)?;
    let project = store.project(project_id)?;
    data.test_cases = case_ids
        .iter()
        .map(|id| locate(&project.test_cases, id).cloned())
        .collect::<Result<_>>()?;
    store.add_test_cycle(project_id, data)
}

pub fn cycle_execute(
    store: &mut Store,
    project_id: &str,
    cycle_id: &str,
    mut data: NewTestExecution,
    executed_by: Option<&str>,
) -> Result<TestExecution> {
    data.executed_by = lookup_user(store, executed_by)?;
    store.add_test_execution(project_id, cycle_id, data)
}

pub fn cycle_show(store: &Store, project_id: &str, cycle_id: &str) -> Result<TestCycle> {
    Ok(locate(&store.project(project_id)?.test_cycles, cycle_id)?.clone())
}

// === Defects and time ===

pub fn defect_report(
    store: &mut Store,
    project_id: &str,
    mut data: NewDefect,
    assignee: Option<&str>,
) -> Result<Defect> {
    require_text("defect title", &data.title)?;
    data.assigned_to = lookup_user(store, assignee)?;
    store.add_defect(project_id, data)
}

pub fn defect_update(
    store: &mut Store,
    project_id: &str,
    defect_id: &str,
    mut patch: DefectPatch,
    assignee: Option<&str>,
) -> Result<Defect> {
    patch.assigned_to = lookup_user(store, assignee)?;
    store.update_defect(project_id, defect_id, patch)
}

/// Log hours for `user_id`, or for the current user when absent.
#[allow(clippy::too_many_arguments)]
pub fn time_log(
    store: &mut Store,
    project_id: &str,
    hours: f64,
    task_id: Option<String>,
    date: NaiveDate,
    description: Option<String>,
    billable: bool,
    user_id: Option<&str>,
) -> Result<TimeEntry> {
    require_hours(hours)?;
    let user_id = match user_id {
        Some(id) => store.user(id)?.id.clone(),
        None => store.current_user().ok_or(Error::NoCurrentUser)?.id.clone(),
    };
    store.add_time_entry(NewTimeEntry {
        user_id,
        project_id: project_id.to_string(),
        task_id,
        date,
        hours,
        description: description.unwrap_or_default(),
        billable,
    })
}

// === Read side ===

pub fn activity_list(store: &Store, project_id: Option<&str>, limit: Option<usize>) -> ActivityList {
    let activities = store
        .activities()
        .iter()
        .filter(|a| project_id.is_none_or(|id| a.project_id == id))
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    ActivityList { activities }
}

pub fn dashboard(store: &Store, recent: usize) -> Dashboard {
    Dashboard {
        stats: DashboardStats::of(store.state()),
        recent: stats::recent_projects(store.state(), recent)
            .into_iter()
            .map(ProjectSummary::of)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DefectStatus, TestOutcome};
    use crate::seed::demo_state;
    use crate::store::ManualClock;
    use crate::test_utils::{empty_store, epoch, new_project, store_with_user};

    fn demo_store() -> Store {
        Store::with_clock(demo_state(epoch()), Box::new(ManualClock::new(epoch())))
    }

    #[test]
    fn test_project_list_filters_by_status() {
        let store = demo_store();
        assert_eq!(project_list(&store, None).count, 2);
        let planning = project_list(&store, Some(ProjectStatus::Planning));
        assert_eq!(planning.count, 1);
        assert_eq!(planning.projects[0].id, "project-mobile");
    }

    #[test]
    fn test_project_create_rejects_blank_name() {
        let (mut store, _clock) = store_with_user();
        assert!(matches!(
            project_create(&mut store, new_project("  ")),
            Err(Error::InvalidInput(_))
        ));
        assert!(store.projects().is_empty());
    }

    #[test]
    fn test_project_create_renders_project() {
        let (mut store, _clock) = store_with_user();
        let project = project_create(&mut store, new_project("Billing")).unwrap();

        let value: serde_json::Value = serde_json::from_str(&project.to_json()).unwrap();
        assert_eq!(value["name"], "Billing");
        assert_eq!(value["id"], project.id.as_str());

        let human = project.to_human();
        assert!(human.starts_with(&format!("Billing ({})", project.id)));
        assert!(human.contains("starts 2026-"));
    }

    #[test]
    fn test_project_update_requires_fields() {
        let mut store = demo_store();
        assert!(matches!(
            project_update(&mut store, "project-portal", ProjectPatch::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_message_without_user_is_an_error() {
        let (mut store, _clock) = empty_store();
        let project = store.add_project(new_project("Portal"));
        assert!(matches!(
            message_post(&mut store, &project.id, "hello", false),
            Err(Error::NoCurrentUser)
        ));
        assert!(store.project(&project.id).unwrap().messages.is_empty());
    }

    #[test]
    fn test_task_add_resolves_assignee() {
        let mut store = demo_store();
        let task = task_add(
            &mut store,
            "project-mobile",
            NewTask {
                title: "Push notifications".to_string(),
                ..NewTask::default()
            },
            Some("user-3"),
        )
        .unwrap();
        assert_eq!(task.assignee.unwrap().id, "user-3");

        assert!(matches!(
            task_add(
                &mut store,
                "project-mobile",
                NewTask {
                    title: "Ghost".to_string(),
                    ..NewTask::default()
                },
                Some("nobody"),
            ),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_steps() {
        let steps = parse_steps(&[
            "Open login page => Form is shown".to_string(),
            "Submit=>Dashboard".to_string(),
        ])
        .unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].step_number, 2);
        assert_eq!(steps[0].action, "Open login page");
        assert_eq!(steps[0].expected_result, "Form is shown");

        assert!(parse_steps(&["no arrow".to_string()]).is_err());
    }

    #[test]
    fn test_cycle_create_copies_cases() {
        let mut store = demo_store();
        let cycle = cycle_create(
            &mut store,
            "project-portal",
            NewTestCycle {
                name: "Regression".to_string(),
                environment: "staging".to_string(),
                ..NewTestCycle::default()
            },
            &["tc-portal-1".to_string(), "tc-portal-2".to_string()],
        )
        .unwrap();
        assert_eq!(cycle.test_cases.len(), 2);

        let execution = cycle_execute(
            &mut store,
            "project-portal",
            &cycle.id,
            NewTestExecution {
                test_case_id: "tc-portal-1".to_string(),
                result: TestOutcome::Passed,
                ..NewTestExecution::default()
            },
            None,
        )
        .unwrap();
        assert_eq!(execution.test_cycle_id.as_deref(), Some(cycle.id.as_str()));
        assert_eq!(execution.executed_by.id, "user-2");

        let shown = cycle_show(&store, "project-portal", &cycle.id).unwrap();
        let summary = shown.summary.unwrap();
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.not_run, 1);
        assert_eq!(summary.execution_progress, 50);
    }

    #[test]
    fn test_cycle_execute_by_named_tester() {
        let mut store = demo_store();
        store.clear_current_user();
        let run = |store: &mut Store, tester: Option<&str>| {
            cycle_execute(
                store,
                "project-portal",
                "cycle-portal-1",
                NewTestExecution {
                    test_case_id: "tc-portal-3".to_string(),
                    result: TestOutcome::Passed,
                    ..NewTestExecution::default()
                },
                tester,
            )
        };

        assert!(matches!(run(&mut store, None), Err(Error::NoCurrentUser)));
        assert!(matches!(run(&mut store, Some("nobody")), Err(Error::NotFound(_))));
        let execution = run(&mut store, Some("user-5")).unwrap();
        assert_eq!(execution.executed_by.id, "user-5");
    }

    #[test]
    fn test_estimation_report_includes_breakdown() {
        let store = demo_store();
        let report = estimation_show(&store, "project-portal", "estimation-portal-1").unwrap();
        assert_eq!(report.breakdown.total_hours, 160.0);
        assert_eq!(report.estimation.total_hours, 160.0);
        assert!(report.to_human().contains("160h"));
    }

    #[test]
    fn test_item_add_rejects_negative_hours() {
        let mut store = demo_store();
        let err = estimation_item_add(
            &mut store,
            "project-portal",
            "estimation-portal-1",
            NewEstimationItem {
                title: "Refunds".to_string(),
                estimated_hours: -3.0,
                ..NewEstimationItem::default()
            },
        );
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_defect_update_to_resolved() {
        let mut store = demo_store();
        let defect = defect_update(
            &mut store,
            "project-portal",
            "defect-portal-1",
            DefectPatch {
                status: Some(DefectStatus::Resolved),
                ..DefectPatch::default()
            },
            None,
        )
        .unwrap();
        assert!(defect.resolved_at.is_some());
        assert!(defect.to_human().contains("resolved"));
    }

    #[test]
    fn test_time_log_defaults_to_current_user() {
        let mut store = demo_store();
        let entry = time_log(
            &mut store,
            "project-portal",
            3.5,
            None,
            epoch().date_naive(),
            None,
            true,
            None,
        )
        .unwrap();
        assert_eq!(entry.user_id, store.current_user().unwrap().id);
        assert!(entry.billable);
    }

    #[test]
    fn test_activity_list_filters_and_limits() {
        let mut store = demo_store();
        store.add_project(new_project("Internal tools"));
        let all = activity_list(&store, None, None);
        let limited = activity_list(&store, None, Some(1));
        assert_eq!(limited.activities.len(), 1);
        assert_eq!(limited.activities[0].details, all.activities[0].details);

        let portal = activity_list(&store, Some("project-portal"), None);
        assert!(!portal.activities.is_empty());
        assert!(portal
            .activities
            .iter()
            .all(|a| a.project_id == "project-portal"));
    }

    #[test]
    fn test_reset_demo_requires_confirmation() {
        let (mut store, _clock) = store_with_user();
        store.add_project(new_project("Scratch"));
        assert!(system_reset_demo(&mut store, false).is_err());
        assert_eq!(store.projects().len(), 1);

        let result = system_reset_demo(&mut store, true).unwrap();
        assert_eq!(result.projects, 2);
        assert_eq!(result.users, 6);
    }

    #[test]
    fn test_dashboard_output() {
        let store = demo_store();
        let dashboard = dashboard(&store, 1);
        assert_eq!(dashboard.recent.len(), 1);
        let rendered = dashboard.to_json();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["stats"]["totalProjects"], 2);
        assert!(dashboard.to_human().contains("Projects: 2"));
    }
}
