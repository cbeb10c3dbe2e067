//! PlanStack - a local project-management store.
//!
//! This library provides the core of the `planstack` CLI tool: projects with
//! their tasks, messages, milestones, functional analyses, estimations, test
//! cases, test cycles, defects and time entries, all owned by a single
//! [`store::Store`] and persisted as one JSON document.

pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod seed;
pub mod stats;
pub mod storage;
pub mod store;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::TempDir;

    use crate::models::{NewProject, State, User, UserRole};
    use crate::storage::Storage;
    use crate::store::{ManualClock, Store};

    /// Fixed starting instant for deterministic clocks.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
    }

    /// A user suitable for stamping authorship in tests.
    pub fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", id),
            avatar: None,
            role: UserRole::Developer,
            department: None,
        }
    }

    /// An empty store with a manual clock and no current user.
    pub fn empty_store() -> (Store, ManualClock) {
        let clock = ManualClock::new(epoch());
        let store = Store::with_clock(State::default(), Box::new(clock.clone()));
        (store, clock)
    }

    /// A store with one registered user who is also the current user.
    pub fn store_with_user() -> (Store, ManualClock) {
        let alice = user("u-alice", "Alice");
        let clock = ManualClock::new(epoch());
        let state = State {
            users: vec![alice.clone()],
            current_user: Some(alice),
            ..State::default()
        };
        (Store::with_clock(state, Box::new(clock.clone())), clock)
    }

    /// A minimal project descriptor.
    pub fn new_project(name: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            start_date: epoch().date_naive(),
            ..NewProject::default()
        }
    }

    /// Test environment with an isolated data directory.
    pub struct TestEnv {
        pub data_dir: TempDir,
    }

    impl TestEnv {
        pub fn new() -> Self {
            Self {
                data_dir: TempDir::new().unwrap(),
            }
        }

        pub fn init_storage(&self) -> Storage {
            Storage::init(self.data_dir.path(), &State::default()).unwrap()
        }
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Library-level error type for PlanStack operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Kdl(#[from] kdl::KdlError),

    #[error("Not initialized: run `planstack system init` first")]
    NotInitialized,

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("No current user selected")]
    NoCurrentUser,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for PlanStack operations.
pub type Result<T> = std::result::Result<T, Error>;
