//! Read-only rollups over the store snapshot.

use serde::Serialize;

use crate::models::testing::percentage;
use crate::models::{
    Estimation, EstimationCategory, Project, ProjectStatus, State, TaskStatus, TestStatus,
};

/// Task completion of one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgress {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Rounded percentage of tasks done (0 when there are none)
    pub percent: u32,
}

impl ProjectProgress {
    pub fn of(project: &Project) -> Self {
        let total_tasks = project.tasks.len();
        let completed_tasks = project
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .count();
        Self {
            total_tasks,
            completed_tasks,
            percent: percentage(completed_tasks, total_tasks),
        }
    }
}

/// Counts shown on a project's overview page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    pub progress: ProjectProgress,
    pub todo_tasks: usize,
    pub in_progress_tasks: usize,
    pub review_tasks: usize,
    pub team_size: usize,
    pub milestones: usize,
    pub requirements: usize,
    pub active_test_cases: usize,
    pub open_defects: usize,
    pub estimated_hours: f64,
    pub logged_hours: f64,
}

impl ProjectOverview {
    pub fn of(project: &Project) -> Self {
        let count_status = |status: TaskStatus| {
            project.tasks.iter().filter(|t| t.status == status).count()
        };
        Self {
            progress: ProjectProgress::of(project),
            todo_tasks: count_status(TaskStatus::Todo),
            in_progress_tasks: count_status(TaskStatus::InProgress),
            review_tasks: count_status(TaskStatus::Review),
            team_size: project.team.len(),
            milestones: project.milestones.len(),
            requirements: project
                .functional_analyses
                .iter()
                .map(|a| a.requirements.len())
                .sum(),
            active_test_cases: project
                .test_cases
                .iter()
                .filter(|tc| tc.status == TestStatus::Active)
                .count(),
            open_defects: project.defects.iter().filter(|d| d.is_open()).count(),
            estimated_hours: project.estimations.iter().map(|e| e.total_hours).sum(),
            logged_hours: project.time_entries.iter().map(|t| t.hours).sum(),
        }
    }
}

/// Totals across every project.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub total_requirements: usize,
    pub total_test_cases: usize,
    pub total_estimations: usize,
    pub total_estimated_hours: f64,
}

impl DashboardStats {
    pub fn of(state: &State) -> Self {
        let projects = &state.projects;
        let with_status =
            |status: ProjectStatus| projects.iter().filter(|p| p.status == status).count();
        Self {
            total_projects: projects.len(),
            active_projects: with_status(ProjectStatus::InProgress),
            completed_projects: with_status(ProjectStatus::Completed),
            total_tasks: projects.iter().map(|p| p.tasks.len()).sum(),
            completed_tasks: projects
                .iter()
                .map(|p| ProjectProgress::of(p).completed_tasks)
                .sum(),
            total_requirements: projects
                .iter()
                .flat_map(|p| &p.functional_analyses)
                .map(|a| a.requirements.len())
                .sum(),
            total_test_cases: projects.iter().map(|p| p.test_cases.len()).sum(),
            total_estimations: projects.iter().map(|p| p.estimations.len()).sum(),
            total_estimated_hours: projects
                .iter()
                .flat_map(|p| &p.estimations)
                .map(|e| e.total_hours)
                .sum(),
        }
    }
}

/// The most recently updated projects, newest first.
pub fn recent_projects(state: &State, limit: usize) -> Vec<&Project> {
    let mut projects: Vec<&Project> = state.projects.iter().collect();
    projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    projects.truncate(limit);
    projects
}

/// Hours of one estimation category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: EstimationCategory,
    pub hours: f64,
    pub count: usize,
}

/// Totals of an estimation including buffer and contingency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationBreakdown {
    pub total_hours: f64,
    pub buffer_hours: f64,
    pub contingency_hours: f64,
    pub total_with_buffer: f64,
    /// In order of first appearance among the items
    pub categories: Vec<CategoryTotal>,
}

impl EstimationBreakdown {
    pub fn of(estimation: &Estimation) -> Self {
        let mut categories: Vec<CategoryTotal> = Vec::new();
        let mut total_hours = 0.0;
        for item in &estimation.items {
            total_hours += item.estimated_hours;
            match categories.iter_mut().find(|c| c.category == item.category) {
                Some(entry) => {
                    entry.hours += item.estimated_hours;
                    entry.count += 1;
                }
                None => categories.push(CategoryTotal {
                    category: item.category,
                    hours: item.estimated_hours,
                    count: 1,
                }),
            }
        }

        let buffer_hours = total_hours * estimation.buffer_percentage / 100.0;
        let contingency_hours =
            total_hours * estimation.contingency_percentage.unwrap_or(0.0) / 100.0;
        Self {
            total_hours,
            buffer_hours,
            contingency_hours,
            total_with_buffer: total_hours + buffer_hours,
            categories,
        }
    }
}
