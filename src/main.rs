//! PlanStack CLI - a local project-management store.

use std::cell::Cell;
use std::env;
use std::process;
use std::rc::Rc;

use chrono::Utc;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use planstack::cli::{
    ActivityCommands, AnalysisCommands, Cli, Commands, CycleCommands, DefectCommands,
    EstimationCommands, MessageCommands, MilestoneCommands, ProjectCommands, ProjectFields,
    RequirementCommands, SystemCommands, TaskCommands, TeamCommands, TestcaseCommands,
    TimeCommands,
};
use planstack::commands::{self, Output};
use planstack::config::{ConfigOverrides, OutputFormat, resolve_config};
use planstack::models::{
    DefectPatch, EstimationItemPatch, EstimationPatch, MilestonePatch, NewDefect,
    NewEstimation, NewEstimationItem, NewFunctionalAnalysis, NewMilestone, NewProject,
    NewRequirement, NewTask, NewTestCase, NewTestCycle, NewTestExecution, ProjectPatch,
    RequirementPatch, TaskPatch,
};
use planstack::seed;
use planstack::storage::{self, Storage};
use planstack::store::Store;
use planstack::Error;

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let human = cli.human_readable;

    if let Err(e) = run(cli) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("PLANSTACK_LOG").unwrap_or_else(|_| EnvFilter::new("planstack=warn"));

    let format = env::var("PLANSTACK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli) -> planstack::Result<()> {
    let data_dir = storage::resolve_data_dir(cli.data_dir)?;

    let mut overrides = ConfigOverrides::new();
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    if let Some(sequence) = cli.code_sequence {
        overrides = overrides.with_code_sequence(sequence);
    }

    // The only command that works before the data directory exists.
    let initialized = match &cli.command {
        Commands::System {
            command: SystemCommands::Init,
        } => Some(commands::system_init(&data_dir, &seed::demo_state(Utc::now()))?),
        _ => None,
    };

    let storage = Storage::open(&data_dir)?;
    let config = resolve_config(&overrides, &storage.read_config());
    debug!(
        data_dir = %data_dir.display(),
        output_format = %config.output_format.value,
        code_sequence = %config.code_sequence.value,
        "configuration resolved"
    );

    let mut store = Store::new(storage.load()?).with_code_sequence(config.code_sequence());
    let dirty = Rc::new(Cell::new(false));
    let observer = Rc::clone(&dirty);
    store.subscribe(move |_| observer.set(true));

    let result = run_command(cli.command, initialized, &mut store, &storage, &overrides)?;

    if dirty.get() {
        storage.save(store.state())?;
    }
    output(result.as_ref(), config.output_format());
    Ok(())
}

fn output(result: &dyn Output, format: OutputFormat) {
    match format {
        OutputFormat::Human => println!("{}", result.to_human()),
        OutputFormat::Json => println!("{}", result.to_json()),
    }
}

fn project_patch(name: Option<String>, fields: ProjectFields, store: &Store) -> planstack::Result<ProjectPatch> {
    let technologies = if fields.technologies.is_empty() {
        None
    } else {
        Some(commands::technologies_by_id(store, &fields.technologies)?)
    };
    Ok(ProjectPatch {
        name,
        description: fields.description,
        project_type: fields.project_type,
        status: fields.status,
        priority: fields.priority,
        technologies,
        start_date: fields.start_date,
        end_date: fields.end_date,
        budget: fields.budget,
        client: fields.client,
        repository: fields.repository,
        ..ProjectPatch::default()
    })
}

fn run_command(
    command: Commands,
    initialized: Option<commands::InitResult>,
    store: &mut Store,
    storage: &Storage,
    overrides: &ConfigOverrides,
) -> planstack::Result<Box<dyn Output>> {
    let result: Box<dyn Output> = match command {
        Commands::System { command } => match command {
            SystemCommands::Init => Box::new(initialized.ok_or(Error::NotInitialized)?),
            SystemCommands::ResetDemo { yes } => Box::new(commands::system_reset_demo(store, yes)?),
            SystemCommands::Whoami => Box::new(commands::system_whoami(store)),
            SystemCommands::Use { user_id } => Box::new(commands::system_use(store, &user_id)?),
            SystemCommands::Users => Box::new(commands::system_users(store)),
            SystemCommands::Config {
                output_format,
                set_code_sequence,
            } => Box::new(commands::system_config(
                storage,
                output_format,
                set_code_sequence,
                |file| resolve_config(overrides, file),
            )?),
        },

        Commands::Project { command } => match command {
            ProjectCommands::Create { name, fields } => {
                let technologies = commands::technologies_by_id(store, &fields.technologies)?;
                let data = NewProject {
                    name,
                    description: fields.description.unwrap_or_default(),
                    project_type: fields.project_type.unwrap_or_default(),
                    status: fields.status.unwrap_or_default(),
                    priority: fields.priority.unwrap_or_default(),
                    technologies,
                    team: store.current_user().cloned().into_iter().collect(),
                    start_date: fields.start_date.unwrap_or_else(|| Utc::now().date_naive()),
                    end_date: fields.end_date,
                    budget: fields.budget,
                    client: fields.client,
                    repository: fields.repository,
                    ..NewProject::default()
                };
                Box::new(commands::project_create(store, data)?)
            }
            ProjectCommands::List { status } => Box::new(commands::project_list(store, status)),
            ProjectCommands::Show { id } => Box::new(commands::project_show(store, &id)?),
            ProjectCommands::Update { id, name, fields } => {
                let patch = project_patch(name, fields, store)?;
                Box::new(commands::project_update(store, &id, patch)?)
            }
            ProjectCommands::Delete { id } => Box::new(commands::project_delete(store, &id)?),
        },

        Commands::Task { command } => match command {
            TaskCommands::Add {
                project,
                title,
                description,
                status,
                priority,
                assignee,
                due_date,
                tag,
                estimated_hours,
                requirement,
            } => {
                let data = NewTask {
                    title,
                    description: description.unwrap_or_default(),
                    status: status.unwrap_or_default(),
                    priority: priority.unwrap_or_default(),
                    due_date,
                    tags: tag,
                    estimated_hours,
                    functional_requirement_id: requirement,
                    ..NewTask::default()
                };
                Box::new(commands::task_add(store, &project, data, assignee.as_deref())?)
            }
            TaskCommands::Update {
                project,
                id,
                title,
                description,
                status,
                priority,
                assignee,
                due_date,
                actual_hours,
            } => {
                let patch = TaskPatch {
                    title,
                    description,
                    status,
                    priority,
                    due_date,
                    actual_hours,
                    ..TaskPatch::default()
                };
                Box::new(commands::task_update(
                    store,
                    &project,
                    &id,
                    patch,
                    assignee.as_deref(),
                )?)
            }
            TaskCommands::Delete { project, id } => {
                Box::new(commands::task_delete(store, &project, &id)?)
            }
        },

        Commands::Message { command } => match command {
            MessageCommands::Post {
                project,
                content,
                announcement,
            } => Box::new(commands::message_post(store, &project, &content, announcement)?),
        },

        Commands::Milestone { command } => match command {
            MilestoneCommands::Add {
                project,
                title,
                due_date,
                description,
                status,
                progress,
            } => {
                let data = NewMilestone {
                    title,
                    description: description.unwrap_or_default(),
                    due_date,
                    status: status.unwrap_or_default(),
                    progress: progress.unwrap_or(0),
                };
                Box::new(commands::milestone_add(store, &project, data)?)
            }
            MilestoneCommands::Update {
                project,
                id,
                title,
                due_date,
                status,
                progress,
            } => {
                let patch = MilestonePatch {
                    title,
                    due_date,
                    status,
                    progress,
                    ..MilestonePatch::default()
                };
                Box::new(commands::milestone_update(store, &project, &id, patch)?)
            }
        },

        Commands::Team { command } => match command {
            TeamCommands::Add { project, user_id } => {
                Box::new(commands::team_add(store, &project, &user_id)?)
            }
            TeamCommands::Remove { project, user_id } => {
                Box::new(commands::team_remove(store, &project, &user_id)?)
            }
        },

        Commands::Analysis { command } => match command {
            AnalysisCommands::Create {
                project,
                title,
                version,
                status,
                description,
                scope,
                out_of_scope,
            } => {
                let data = NewFunctionalAnalysis {
                    title,
                    version,
                    status: status.unwrap_or_default(),
                    description: description.unwrap_or_default(),
                    scope: scope.unwrap_or_default(),
                    out_of_scope: out_of_scope.unwrap_or_default(),
                    ..NewFunctionalAnalysis::default()
                };
                Box::new(commands::analysis_create(store, &project, data)?)
            }
        },

        Commands::Requirement { command } => match command {
            RequirementCommands::Add {
                project,
                analysis,
                title,
                description,
                requirement_type,
                priority,
                acceptance_criteria,
            } => {
                let data = NewRequirement {
                    title,
                    description: description.unwrap_or_default(),
                    requirement_type: requirement_type.unwrap_or_default(),
                    priority: priority.unwrap_or_default(),
                    acceptance_criteria,
                    ..NewRequirement::default()
                };
                Box::new(commands::requirement_add(store, &project, &analysis, data)?)
            }
            RequirementCommands::Update {
                project,
                analysis,
                id,
                title,
                description,
                requirement_type,
                priority,
                status,
            } => {
                let patch = RequirementPatch {
                    title,
                    description,
                    requirement_type,
                    priority,
                    status,
                    ..RequirementPatch::default()
                };
                Box::new(commands::requirement_update(
                    store, &project, &analysis, &id, patch,
                )?)
            }
            RequirementCommands::Comment {
                project,
                analysis,
                id,
                content,
            } => Box::new(commands::requirement_comment(
                store, &project, &analysis, &id, &content,
            )?),
        },

        Commands::Estimation { command } => match command {
            EstimationCommands::Create {
                project,
                title,
                version,
                description,
                method,
                buffer,
                contingency,
            } => {
                let data = NewEstimation {
                    title,
                    version,
                    description,
                    method,
                    buffer_percentage: buffer,
                    contingency_percentage: contingency,
                    ..NewEstimation::default()
                };
                Box::new(commands::estimation_create(store, &project, data)?)
            }
            EstimationCommands::Show { project, id } => {
                Box::new(commands::estimation_show(store, &project, &id)?)
            }
            EstimationCommands::Update {
                project,
                id,
                status,
                buffer,
                contingency,
            } => {
                let patch = EstimationPatch {
                    status,
                    buffer_percentage: buffer,
                    contingency_percentage: contingency,
                    ..EstimationPatch::default()
                };
                Box::new(commands::estimation_update(store, &project, &id, patch)?)
            }
            EstimationCommands::ItemAdd {
                project,
                estimation,
                title,
                hours,
                category,
                complexity,
                confidence,
                description,
            } => {
                let data = NewEstimationItem {
                    title,
                    description: description.unwrap_or_default(),
                    category: category.unwrap_or_default(),
                    estimated_hours: hours,
                    complexity: complexity.unwrap_or_default(),
                    confidence: confidence.unwrap_or_default(),
                    ..NewEstimationItem::default()
                };
                Box::new(commands::estimation_item_add(store, &project, &estimation, data)?)
            }
            EstimationCommands::ItemUpdate {
                project,
                estimation,
                id,
                title,
                hours,
                category,
                complexity,
            } => {
                let patch = EstimationItemPatch {
                    title,
                    estimated_hours: hours,
                    category,
                    complexity,
                    ..EstimationItemPatch::default()
                };
                Box::new(commands::estimation_item_update(
                    store,
                    &project,
                    &estimation,
                    &id,
                    patch,
                )?)
            }
            EstimationCommands::ItemDelete {
                project,
                estimation,
                id,
            } => Box::new(commands::estimation_item_delete(
                store,
                &project,
                &estimation,
                &id,
            )?),
        },

        Commands::Testcase { command } => match command {
            TestcaseCommands::Add {
                project,
                title,
                description,
                test_type,
                priority,
                status,
                requirement,
                steps,
            } => {
                let data = NewTestCase {
                    title,
                    description: description.unwrap_or_default(),
                    test_type: test_type.unwrap_or_default(),
                    priority: priority.unwrap_or_default(),
                    status: status.unwrap_or_default(),
                    steps: commands::parse_steps(&steps)?,
                    linked_requirement: requirement,
                    ..NewTestCase::default()
                };
                Box::new(commands::testcase_add(store, &project, data)?)
            }
            TestcaseCommands::Delete { project, id } => {
                Box::new(commands::testcase_delete(store, &project, &id)?)
            }
        },

        Commands::Cycle { command } => match command {
            CycleCommands::Create {
                project,
                name,
                environment,
                description,
                version,
                build,
                status,
                cases,
            } => {
                let data = NewTestCycle {
                    name,
                    description: description.unwrap_or_default(),
                    version,
                    environment,
                    build,
                    status: status.unwrap_or_default(),
                    ..NewTestCycle::default()
                };
                Box::new(commands::cycle_create(store, &project, data, &cases)?)
            }
            CycleCommands::Execute {
                project,
                cycle,
                test_case,
                result,
                notes,
                environment,
                minutes,
                defects,
                executed_by,
            } => {
                let data = NewTestExecution {
                    test_case_id: test_case,
                    result,
                    notes,
                    environment,
                    execution_time: minutes,
                    defects,
                    ..NewTestExecution::default()
                };
                Box::new(commands::cycle_execute(
                    store,
                    &project,
                    &cycle,
                    data,
                    executed_by.as_deref(),
                )?)
            }
            CycleCommands::Show { project, id } => {
                Box::new(commands::cycle_show(store, &project, &id)?)
            }
        },

        Commands::Defect { command } => match command {
            DefectCommands::Report {
                project,
                title,
                description,
                severity,
                priority,
                environment,
                steps,
                assignee,
                test_case,
                requirement,
            } => {
                let data = NewDefect {
                    title,
                    description: description.unwrap_or_default(),
                    severity: severity.unwrap_or_default(),
                    priority: priority.unwrap_or_default(),
                    environment: environment.unwrap_or_default(),
                    steps_to_reproduce: steps,
                    linked_test_case: test_case,
                    linked_requirement: requirement,
                    ..NewDefect::default()
                };
                Box::new(commands::defect_report(
                    store,
                    &project,
                    data,
                    assignee.as_deref(),
                )?)
            }
            DefectCommands::Update {
                project,
                id,
                status,
                severity,
                priority,
                assignee,
            } => {
                let patch = DefectPatch {
                    status,
                    severity,
                    priority,
                    ..DefectPatch::default()
                };
                Box::new(commands::defect_update(
                    store,
                    &project,
                    &id,
                    patch,
                    assignee.as_deref(),
                )?)
            }
        },

        Commands::Time { command } => match command {
            TimeCommands::Log {
                project,
                hours,
                task,
                date,
                description,
                billable,
                user,
            } => Box::new(commands::time_log(
                store,
                &project,
                hours,
                task,
                date.unwrap_or_else(|| Utc::now().date_naive()),
                description,
                billable,
                user.as_deref(),
            )?),
        },

        Commands::Activity { command } => match command {
            ActivityCommands::List { project, limit } => {
                Box::new(commands::activity_list(store, project.as_deref(), limit))
            }
        },

        Commands::Dashboard { recent } => Box::new(commands::dashboard(store, recent)),
    };
    Ok(result)
}
