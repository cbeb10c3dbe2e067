//! Demo data set.
//!
//! Used for first-run initialization and by [`Store::reset_to_demo`](crate::store::Store::reset_to_demo).
//! Ids are fixed so the demo can be scripted against; dates are relative to
//! the instant the data is built.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{
    Activity, ActivityAction, AnalysisStatus, CodeCounters, ConfidenceLevel, Defect,
    DefectSeverity, DefectStatus, EntityType, Estimation, EstimationCategory, EstimationItem,
    EstimationStatus, FunctionalAnalysis, FunctionalRequirement, Message, Milestone,
    MilestoneStatus, NewDefect, NewEstimation, NewEstimationItem, NewFunctionalAnalysis,
    NewMilestone, NewProject, NewRequirement, NewTask, NewTestCase, NewTestCycle, Priority,
    Project, ProjectStatus, ProjectType, RequirementPriority, RequirementStatus, State, Task,
    TaskStatus, Technology, TechnologyCategory, TestCase, TestCycle, TestCycleStatus,
    TestExecution, TestOutcome, TestPriority, TestStatus, TestStep, TimeEntry, User, UserRole,
};
use crate::store::codes::{format_code, DEFECT_PREFIX, REQUIREMENT_PREFIX, TEST_CASE_PREFIX};

/// Index into [`demo_users`] of the user selected after a reset.
pub const DEMO_CURRENT_USER: usize = 1;

/// Build the full demo snapshot.
pub fn demo_state(now: DateTime<Utc>) -> State {
    let users = demo_users();
    let technologies = default_technologies();
    let projects = vec![
        portal_project(now, &users, &technologies),
        mobile_project(now, &users, &technologies),
    ];
    let activities = demo_activities(now, &projects, &users);
    let current_user = users.get(DEMO_CURRENT_USER).cloned();

    State {
        projects,
        users,
        technologies,
        activities,
        current_user,
    }
}

pub fn demo_users() -> Vec<User> {
    [
        ("user-1", "Marco Rossi", UserRole::Ceo, "Management"),
        ("user-2", "Giulia Bianchi", UserRole::ProjectManager, "Delivery"),
        ("user-3", "Luca Ferrari", UserRole::Developer, "Engineering"),
        ("user-4", "Sara Colombo", UserRole::Designer, "Design"),
        ("user-5", "Andrea Ricci", UserRole::Qa, "Quality"),
        ("user-6", "Elena Marino", UserRole::Devops, "Engineering"),
    ]
    .into_iter()
    .map(|(id, name, role, department)| User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!(
            "{}@planstack.dev",
            name.to_lowercase().replace(' ', ".")
        ),
        avatar: None,
        role,
        department: Some(department.to_string()),
    })
    .collect()
}

pub fn default_technologies() -> Vec<Technology> {
    use TechnologyCategory::*;
    [
        ("tech-react", "React", Frontend, "#61DAFB"),
        ("tech-next", "Next.js", Frontend, "#000000"),
        ("tech-ts", "TypeScript", Frontend, "#3178C6"),
        ("tech-tailwind", "Tailwind CSS", Frontend, "#06B6D4"),
        ("tech-node", "Node.js", Backend, "#339933"),
        ("tech-rust", "Rust", Backend, "#DEA584"),
        ("tech-postgres", "PostgreSQL", Database, "#4169E1"),
        ("tech-redis", "Redis", Database, "#DC382D"),
        ("tech-docker", "Docker", Devops, "#2496ED"),
        ("tech-k8s", "Kubernetes", Devops, "#326CE5"),
        ("tech-figma", "Figma", Design, "#F24E1E"),
        ("tech-flutter", "Flutter", Other, "#02569B"),
    ]
    .into_iter()
    .map(|(id, name, category, color)| Technology {
        id: id.to_string(),
        name: name.to_string(),
        category,
        color: color.to_string(),
    })
    .collect()
}

fn pick<T: Clone>(items: &[T], indexes: &[usize]) -> Vec<T> {
    indexes.iter().filter_map(|&i| items.get(i).cloned()).collect()
}

fn user_at(users: &[User], index: usize) -> User {
    users.get(index).cloned().unwrap_or_else(|| User {
        id: format!("user-{}", index + 1),
        name: "Demo User".to_string(),
        email: "demo@planstack.dev".to_string(),
        avatar: None,
        role: UserRole::Other,
        department: None,
    })
}

fn day(now: DateTime<Utc>, offset: i64) -> NaiveDate {
    now.date_naive() + Duration::days(offset)
}

fn task(
    id: &str,
    title: &str,
    status: TaskStatus,
    priority: Priority,
    assignee: Option<User>,
    hours: f64,
    at: DateTime<Utc>,
) -> Task {
    Task::new(
        id.to_string(),
        NewTask {
            title: title.to_string(),
            status,
            priority,
            assignee,
            estimated_hours: Some(hours),
            ..NewTask::default()
        },
        at,
    )
}

fn portal_project(now: DateTime<Utc>, users: &[User], technologies: &[Technology]) -> Project {
    let created = now - Duration::days(45);
    let pm = user_at(users, 1);
    let dev = user_at(users, 2);
    let designer = user_at(users, 3);
    let qa = user_at(users, 4);

    let mut project = Project::new(
        "project-portal".to_string(),
        NewProject {
            name: "Customer Portal".to_string(),
            description: "Self-service portal for customers to manage orders and invoices"
                .to_string(),
            project_type: ProjectType::Fullstack,
            status: ProjectStatus::InProgress,
            priority: Priority::High,
            technologies: pick(technologies, &[0, 1, 2, 4, 6]),
            team: pick(users, &[1, 2, 3, 4]),
            start_date: day(now, -45),
            end_date: Some(day(now, 60)),
            budget: Some(85_000.0),
            client: Some("Acme S.p.A.".to_string()),
            repository: Some("https://git.example.com/acme/portal".to_string()),
            ..NewProject::default()
        },
        created,
    );

    project.tasks = vec![
        task("task-portal-1", "Design system setup", TaskStatus::Done, Priority::High, Some(designer.clone()), 16.0, created),
        task("task-portal-2", "Implement login", TaskStatus::Done, Priority::Urgent, Some(dev.clone()), 12.0, created),
        task("task-portal-3", "Orders list page", TaskStatus::InProgress, Priority::High, Some(dev.clone()), 20.0, created),
        task("task-portal-4", "Invoice PDF export", TaskStatus::Todo, Priority::Medium, Some(dev.clone()), 10.0, created),
        task("task-portal-5", "Accessibility review", TaskStatus::Review, Priority::Medium, Some(qa.clone()), 6.0, created),
    ];

    project.milestones = vec![
        Milestone::new(
            "milestone-portal-1".to_string(),
            NewMilestone {
                title: "MVP".to_string(),
                description: "Login, orders and profile pages".to_string(),
                due_date: day(now, 10),
                status: MilestoneStatus::InProgress,
                progress: 60,
            },
        ),
        Milestone::new(
            "milestone-portal-2".to_string(),
            NewMilestone {
                title: "Public launch".to_string(),
                description: String::new(),
                due_date: day(now, 60),
                status: MilestoneStatus::Pending,
                progress: 0,
            },
        ),
    ];

    project.messages = vec![Message {
        id: "message-portal-1".to_string(),
        content: "Sprint review moved to Thursday at 10:00".to_string(),
        author: pm.clone(),
        created_at: now - Duration::days(2),
        is_announcement: true,
    }];

    // Functional analysis with two requirements
    let mut analysis = FunctionalAnalysis::new(
        "analysis-portal-1".to_string(),
        project.id.clone(),
        NewFunctionalAnalysis {
            title: "Customer area".to_string(),
            version: "1.0".to_string(),
            status: AnalysisStatus::Review,
            description: "Functional scope of the customer self-service area".to_string(),
            scope: "Authentication, orders, invoices".to_string(),
            out_of_scope: "Payments".to_string(),
            assumptions: vec!["Customers already exist in the ERP".to_string()],
            constraints: vec!["GDPR compliant data retention".to_string()],
        },
        pm.clone(),
        created,
    );
    let requirements = [
        ("req-portal-1", "User login", RequirementPriority::MustHave, RequirementStatus::Approved),
        ("req-portal-2", "Order history", RequirementPriority::ShouldHave, RequirementStatus::Draft),
    ];
    for (n, (id, title, priority, status)) in requirements.into_iter().enumerate() {
        let mut requirement = FunctionalRequirement::new(
            id.to_string(),
            format_code(REQUIREMENT_PREFIX, n as u32 + 1),
            NewRequirement {
                title: title.to_string(),
                priority,
                status,
                acceptance_criteria: vec![format!("{} works on desktop and mobile", title)],
                ..NewRequirement::default()
            },
            pm.clone(),
            created,
        );
        if status == RequirementStatus::Approved {
            requirement.approved_at = Some(created + Duration::days(3));
            requirement.approved_by = Some(pm.clone());
        }
        analysis.requirements.push(requirement);
    }
    analysis.requirement_counter = analysis.requirements.len() as u32;
    project.functional_analyses = vec![analysis];

    // Estimation
    let mut estimation = Estimation::new(
        "estimation-portal-1".to_string(),
        project.id.clone(),
        NewEstimation {
            title: "Portal MVP".to_string(),
            version: "1.0".to_string(),
            status: EstimationStatus::Approved,
            buffer_percentage: 20.0,
            contingency_percentage: Some(10.0),
            ..NewEstimation::default()
        },
        pm.clone(),
        created,
    );
    estimation.items = [
        ("item-portal-1", "Frontend pages", EstimationCategory::Development, 80.0),
        ("item-portal-2", "API integration", EstimationCategory::Development, 40.0),
        ("item-portal-3", "UI design", EstimationCategory::Design, 24.0),
        ("item-portal-4", "Test plan and execution", EstimationCategory::Testing, 16.0),
    ]
    .into_iter()
    .map(|(id, title, category, hours)| {
        EstimationItem::new(
            id.to_string(),
            NewEstimationItem {
                title: title.to_string(),
                category,
                estimated_hours: hours,
                confidence: ConfidenceLevel::Medium,
                ..NewEstimationItem::default()
            },
        )
    })
    .collect();
    estimation.recompute_total();
    estimation.approved_by = Some(user_at(users, 0));
    estimation.approved_at = Some(created + Duration::days(5));
    project.estimations = vec![estimation];

    // Test cases and one cycle
    project.test_cases = [
        ("tc-portal-1", "Login with valid credentials", TestPriority::Critical, Some("req-portal-1")),
        ("tc-portal-2", "Login with wrong password", TestPriority::High, Some("req-portal-1")),
        ("tc-portal-3", "Order history pagination", TestPriority::Medium, Some("req-portal-2")),
    ]
    .into_iter()
    .enumerate()
    .map(|(n, (id, title, priority, requirement))| {
        TestCase::new(
            id.to_string(),
            format_code(TEST_CASE_PREFIX, n as u32 + 1),
            NewTestCase {
                title: title.to_string(),
                priority,
                status: TestStatus::Active,
                steps: vec![TestStep {
                    id: format!("{}-step-1", id),
                    step_number: 1,
                    action: "Open the portal".to_string(),
                    expected_result: "Page loads".to_string(),
                    ..TestStep::default()
                }],
                linked_requirement: requirement.map(str::to_string),
                estimated_duration: Some(10),
                ..NewTestCase::default()
            },
            qa.clone(),
            created,
        )
    })
    .collect();

    let mut cycle = TestCycle::new(
        "cycle-portal-1".to_string(),
        project.id.clone(),
        NewTestCycle {
            name: "Sprint 3 regression".to_string(),
            description: "Regression before MVP".to_string(),
            version: Some("0.3.0".to_string()),
            environment: "staging".to_string(),
            status: TestCycleStatus::InProgress,
            start_date: Some(day(now, -3)),
            test_cases: project.test_cases.clone(),
            ..NewTestCycle::default()
        },
        qa.clone(),
        now - Duration::days(3),
    );
    cycle.executions = [(0, TestOutcome::Passed), (1, TestOutcome::Failed)]
        .into_iter()
        .filter_map(|(index, result)| {
            let test_case = project.test_cases.get(index)?.clone();
            Some(TestExecution {
                id: format!("execution-portal-{}", index + 1),
                test_case_id: test_case.id.clone(),
                test_case,
                test_cycle_id: Some("cycle-portal-1".to_string()),
                executed_by: qa.clone(),
                executed_at: now - Duration::days(1) + Duration::minutes(index as i64 * 15),
                result,
                execution_time: Some(12),
                environment: Some("staging".to_string()),
                browser: Some("Firefox".to_string()),
                device: None,
                steps: Vec::new(),
                notes: None,
                defects: Vec::new(),
            })
        })
        .collect();
    cycle.refresh_summary();
    project.test_cycles = vec![cycle];

    let mut defect = Defect::new(
        "defect-portal-1".to_string(),
        format_code(DEFECT_PREFIX, 1),
        NewDefect {
            title: "Wrong password shows a blank page".to_string(),
            description: "The error banner is not rendered".to_string(),
            severity: DefectSeverity::High,
            priority: Priority::High,
            status: DefectStatus::InProgress,
            steps_to_reproduce: vec![
                "Open the login page".to_string(),
                "Submit a wrong password".to_string(),
            ],
            expected_behavior: "An error banner is shown".to_string(),
            actual_behavior: "The page is blank".to_string(),
            environment: "staging".to_string(),
            assigned_to: Some(dev.clone()),
            reported_by: Some(qa.clone()),
            linked_test_case: Some("tc-portal-2".to_string()),
            linked_requirement: Some("req-portal-1".to_string()),
            ..NewDefect::default()
        },
        now - Duration::days(1),
    );
    defect.updated_at = now - Duration::hours(6);
    project.defects = vec![defect];

    project.time_entries = vec![
        time_entry("time-portal-1", &dev, &project.id, Some("task-portal-2"), day(now, -10), 6.0, now),
        time_entry("time-portal-2", &designer, &project.id, Some("task-portal-1"), day(now, -20), 8.0, now),
    ];

    project.code_counters = CodeCounters {
        test_cases: project.test_cases.len() as u32,
        defects: project.defects.len() as u32,
    };
    project.updated_at = now - Duration::hours(6);
    project
}

fn mobile_project(now: DateTime<Utc>, users: &[User], technologies: &[Technology]) -> Project {
    let created = now - Duration::days(10);
    let dev = user_at(users, 2);
    let ops = user_at(users, 5);

    let mut project = Project::new(
        "project-mobile".to_string(),
        NewProject {
            name: "Field Service App".to_string(),
            description: "Mobile app for technicians to track on-site interventions".to_string(),
            project_type: ProjectType::Mobile,
            status: ProjectStatus::Planning,
            priority: Priority::Medium,
            technologies: pick(technologies, &[11, 5, 7, 8]),
            team: pick(users, &[1, 2, 5]),
            start_date: day(now, -10),
            end_date: Some(day(now, 120)),
            budget: Some(40_000.0),
            client: Some("Servizi Tecnici S.r.l.".to_string()),
            ..NewProject::default()
        },
        created,
    );
    project.tasks = vec![
        task("task-mobile-1", "Offline sync spike", TaskStatus::InProgress, Priority::High, Some(dev), 16.0, created),
        task("task-mobile-2", "CI pipeline for app builds", TaskStatus::Todo, Priority::Medium, Some(ops), 8.0, created),
    ];
    project.milestones = vec![Milestone::new(
        "milestone-mobile-1".to_string(),
        NewMilestone {
            title: "Prototype".to_string(),
            description: "Clickable prototype for the client".to_string(),
            due_date: day(now, 20),
            status: MilestoneStatus::Pending,
            progress: 10,
        },
    )];
    project
}

fn time_entry(
    id: &str,
    user: &User,
    project_id: &str,
    task_id: Option<&str>,
    date: NaiveDate,
    hours: f64,
    now: DateTime<Utc>,
) -> TimeEntry {
    TimeEntry {
        id: id.to_string(),
        user_id: user.id.clone(),
        project_id: project_id.to_string(),
        task_id: task_id.map(str::to_string),
        date,
        hours,
        description: String::new(),
        billable: true,
        created_at: now - Duration::days(1),
    }
}

fn demo_activities(now: DateTime<Utc>, projects: &[Project], users: &[User]) -> Vec<Activity> {
    let mut activities = Vec::new();
    for (n, project) in projects.iter().enumerate() {
        let actor = user_at(users, DEMO_CURRENT_USER);
        activities.push(Activity {
            id: format!("activity-{}-create", project.id),
            project_id: project.id.clone(),
            user_id: actor.id.clone(),
            action: ActivityAction::Create,
            details: format!("Project \"{}\" created", project.name),
            entity_type: Some(EntityType::Project),
            entity_id: Some(project.id.clone()),
            created_at: project.created_at,
        });
        if let Some(task) = project.tasks.first() {
            activities.push(Activity {
                id: format!("activity-{}-task", project.id),
                project_id: project.id.clone(),
                user_id: actor.id,
                action: ActivityAction::TaskAdd,
                details: format!("Task \"{}\" added", task.title),
                entity_type: Some(EntityType::Task),
                entity_id: Some(task.id.clone()),
                created_at: now - Duration::hours(n as i64 + 1),
            });
        }
    }
    activities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    activities
}
