//! The entity store.
//!
//! [`Store`] owns the full [`State`] snapshot and is the only way to change it.
//! Every command runs synchronously to completion: it either applies its
//! whole change or returns early leaving the state untouched. Listeners
//! registered with [`Store::subscribe`] are told about every applied change.
//!
//! Commands are grouped by area:
//! - this module: current user, demo reset, projects
//! - `collaboration`: tasks, messages, milestones, team, time entries
//! - `analysis`: functional analyses, requirements, requirement comments
//! - `estimation`: estimations, items, estimation comments
//! - `testing`: test cases, test cycles, executions
//! - `defects`: defect reports
//! - `activity`: the audit trail

mod activity;
mod analysis;
mod clock;
pub mod codes;
mod collaboration;
mod defects;
mod estimation;
mod testing;

pub use activity::ACTIVITY_LOG_LIMIT;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codes::CodeSequence;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{
    new_id, Activity, ActivityAction, Entity, EntityType, NewProject, Project, ProjectPatch,
    State, Technology, User,
};
use crate::seed;
use crate::{Error, Result};

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&State)>;

/// The authoritative application state plus the commands that mutate it.
pub struct Store {
    state: State,
    clock: Box<dyn Clock>,
    codes: CodeSequence,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Store {
    /// Wrap an existing snapshot using the system clock.
    pub fn new(state: State) -> Self {
        Self::with_clock(state, Box::new(SystemClock))
    }

    pub fn with_clock(state: State, clock: Box<dyn Clock>) -> Self {
        Self {
            state,
            clock,
            codes: CodeSequence::default(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// A store populated with the demo data set.
    pub fn demo() -> Self {
        let clock = SystemClock;
        Self::new(seed::demo_state(clock.now()))
    }

    /// Select how requirement, test case and defect codes are numbered.
    pub fn with_code_sequence(mut self, codes: CodeSequence) -> Self {
        self.codes = codes;
        self
    }

    pub fn code_sequence(&self) -> CodeSequence {
        self.codes
    }

    // === Snapshot access ===

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn into_state(self) -> State {
        self.state
    }

    pub fn projects(&self) -> &[Project] {
        &self.state.projects
    }

    pub fn project(&self, id: &str) -> Result<&Project> {
        locate(&self.state.projects, id)
    }

    pub fn users(&self) -> &[User] {
        &self.state.users
    }

    pub fn user(&self, id: &str) -> Result<&User> {
        locate(&self.state.users, id)
    }

    pub fn technologies(&self) -> &[Technology] {
        &self.state.technologies
    }

    /// The audit trail, newest first.
    pub fn activities(&self) -> &[Activity] {
        &self.state.activities
    }

    pub fn current_user(&self) -> Option<&User> {
        self.state.current_user.as_ref()
    }

    // === Subscriptions ===

    /// Register a listener called with the new snapshot after every change.
    pub fn subscribe(&mut self, listener: impl Fn(&State) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }

    // === Current user and demo data ===

    /// Replace the acting user.
    pub fn set_current_user(&mut self, user: User) {
        debug!(user = %user.id, "current user set");
        self.state.current_user = Some(user);
        self.notify();
    }

    /// Make a registered user the acting user.
    pub fn switch_user(&mut self, user_id: &str) -> Result<User> {
        let user = self.user(user_id)?.clone();
        self.set_current_user(user.clone());
        Ok(user)
    }

    pub fn clear_current_user(&mut self) {
        if self.state.current_user.take().is_some() {
            self.notify();
        }
    }

    /// Overwrite everything with the demo data set. Prior edits are lost.
    pub fn reset_to_demo(&mut self) {
        self.state = seed::demo_state(self.now());
        debug!(projects = self.state.projects.len(), "state reset to demo data");
        self.notify();
    }

    // === Projects ===

    /// Create a project with every nested collection empty.
    pub fn add_project(&mut self, data: NewProject) -> Project {
        let now = self.now();
        let project = Project::new(new_id(), data, now);
        debug!(project = %project.id, "project added");
        self.state.projects.push(project.clone());
        self.record_activity(
            &project.id,
            ActivityAction::Create,
            format!("Project \"{}\" created", project.name),
            Some(EntityType::Project),
            Some(&project.id),
        );
        self.notify();
        project
    }

    pub fn update_project(&mut self, id: &str, patch: ProjectPatch) -> Result<Project> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, id)?;
        patch.apply(project);
        project.updated_at = now;
        let updated = project.clone();
        debug!(project = %id, "project updated");
        self.record_activity(
            id,
            ActivityAction::Update,
            "Project updated".to_string(),
            Some(EntityType::Project),
            Some(id),
        );
        self.notify();
        Ok(updated)
    }

    /// Remove a project and everything it owns.
    pub fn delete_project(&mut self, id: &str) -> Result<()> {
        let index = position(&self.state.projects, id)?;
        self.state.projects.remove(index);
        debug!(project = %id, "project deleted");
        self.notify();
        Ok(())
    }

    // === Helpers shared by the command areas ===

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn actor(&self) -> Option<User> {
        self.state.current_user.clone()
    }
}

/// Find an entity by id.
pub(crate) fn locate<'a, T: Entity>(items: &'a [T], id: &str) -> Result<&'a T> {
    items
        .iter()
        .find(|item| item.id() == id)
        .ok_or_else(|| not_found::<T>(id))
}

/// Find an entity by id for mutation.
pub(crate) fn locate_mut<'a, T: Entity>(items: &'a mut [T], id: &str) -> Result<&'a mut T> {
    items
        .iter_mut()
        .find(|item| item.id() == id)
        .ok_or_else(|| not_found::<T>(id))
}

fn position<T: Entity>(items: &[T], id: &str) -> Result<usize> {
    items
        .iter()
        .position(|item| item.id() == id)
        .ok_or_else(|| not_found::<T>(id))
}

fn not_found<T: Entity>(id: &str) -> Error {
    Error::NotFound(format!("{} '{}'", T::KIND, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectStatus;
    use crate::test_utils::{empty_store, new_project, store_with_user, user};
    use chrono::Duration;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_add_project_initializes_collections() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));

        assert_eq!(store.projects().len(), 1);
        assert!(project.tasks.is_empty());
        assert!(project.test_cycles.is_empty());
        assert_eq!(project.created_at, project.updated_at);

        let activity = &store.activities()[0];
        assert_eq!(activity.action, ActivityAction::Create);
        assert_eq!(activity.entity_id.as_deref(), Some(project.id.as_str()));
        assert!(activity.details.contains("Portal"));
    }

    #[test]
    fn test_update_project_merges_and_stamps() {
        let (mut store, clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        clock.advance(Duration::hours(1));

        let updated = store
            .update_project(
                &project.id,
                ProjectPatch {
                    status: Some(ProjectStatus::InProgress),
                    ..ProjectPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.status, ProjectStatus::InProgress);
        assert_eq!(updated.name, "Portal");
        assert!(updated.updated_at > project.updated_at);
        assert_eq!(store.activities()[0].action, ActivityAction::Update);
    }

    #[test]
    fn test_update_unknown_project_is_not_found() {
        let (mut store, _clock) = store_with_user();
        let err = store
            .update_project("missing", ProjectPatch::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.activities().is_empty());
    }

    #[test]
    fn test_delete_project() {
        let (mut store, _clock) = store_with_user();
        let keep = store.add_project(new_project("Keep"));
        let drop = store.add_project(new_project("Drop"));

        store.delete_project(&drop.id).unwrap();
        assert_eq!(store.projects().len(), 1);
        assert_eq!(store.projects()[0].id, keep.id);
        assert!(store.delete_project(&drop.id).is_err());
    }

    #[test]
    fn test_project_created_without_user_is_not_logged() {
        let (mut store, _clock) = empty_store();
        store.add_project(new_project("Portal"));
        assert_eq!(store.projects().len(), 1);
        assert!(store.activities().is_empty());
    }

    #[test]
    fn test_subscribers_see_changes_only() {
        let (mut store, _clock) = store_with_user();
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let id = store.subscribe(move |state| {
            assert!(!state.projects.is_empty());
            seen.set(seen.get() + 1);
        });

        store.add_project(new_project("Portal"));
        assert_eq!(calls.get(), 1);

        // Failing command must not notify
        let _ = store.update_project("missing", ProjectPatch::default());
        assert_eq!(calls.get(), 1);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add_project(new_project("Other"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_switch_user_requires_registered_user() {
        let (mut store, _clock) = store_with_user();
        assert!(matches!(
            store.switch_user("u-nobody"),
            Err(Error::NotFound(_))
        ));

        store.set_current_user(user("u-bob", "Bob"));
        assert_eq!(store.current_user().unwrap().name, "Bob");

        let alice = store.switch_user("u-alice").unwrap();
        assert_eq!(alice.name, "Alice");
        store.clear_current_user();
        assert!(store.current_user().is_none());
    }

    #[test]
    fn test_reset_to_demo_overwrites_state() {
        let (mut store, _clock) = store_with_user();
        store.add_project(new_project("Scratch"));
        store.reset_to_demo();

        assert!(store.projects().iter().all(|p| p.name != "Scratch"));
        assert!(!store.users().is_empty());
        assert!(!store.technologies().is_empty());
        assert_eq!(
            store.current_user().map(|u| u.id.as_str()),
            Some(store.users()[1].id.as_str())
        );
    }

    #[test]
    fn test_lookup_helpers() {
        let (store, _clock) = store_with_user();
        assert_eq!(store.user("u-alice").unwrap().name, "Alice");
        let err = store.project("nope").unwrap_err();
        assert_eq!(err.to_string(), "Entity not found: Project 'nope'");
    }
}
