//! Activity log recorder.

use tracing::debug;

use super::Store;
use crate::models::{new_id, Activity, ActivityAction, EntityType};

/// Maximum number of entries kept in the audit trail.
pub const ACTIVITY_LOG_LIMIT: usize = 200;

impl Store {
    /// Record an audit trail entry attributed to the current user.
    ///
    /// Returns `None` and records nothing when no user is selected.
    pub fn log_activity(
        &mut self,
        project_id: &str,
        action: ActivityAction,
        details: impl Into<String>,
        entity_type: Option<EntityType>,
        entity_id: Option<&str>,
    ) -> Option<Activity> {
        let activity =
            self.record_activity(project_id, action, details.into(), entity_type, entity_id)?;
        self.notify();
        Some(activity)
    }

    /// Prepend an entry and trim the log, without notifying listeners.
    ///
    /// Commands call this before their own single notification.
    pub(super) fn record_activity(
        &mut self,
        project_id: &str,
        action: ActivityAction,
        details: String,
        entity_type: Option<EntityType>,
        entity_id: Option<&str>,
    ) -> Option<Activity> {
        let Some(user) = self.state.current_user.as_ref() else {
            debug!(%action, "no current user, activity not recorded");
            return None;
        };

        let activity = Activity {
            id: new_id(),
            project_id: project_id.to_string(),
            user_id: user.id.clone(),
            action,
            details,
            entity_type,
            entity_id: entity_id.map(str::to_string),
            created_at: self.now(),
        };

        let activities = &mut self.state.activities;
        activities.insert(0, activity.clone());
        activities.truncate(ACTIVITY_LOG_LIMIT);
        Some(activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Clock;
    use crate::test_utils::{empty_store, store_with_user};
    use chrono::Duration;

    #[test]
    fn test_log_activity_requires_current_user() {
        let (mut store, _clock) = empty_store();
        let logged = store.log_activity("p-1", ActivityAction::Update, "Nothing", None, None);
        assert!(logged.is_none());
        assert!(store.activities().is_empty());
    }

    #[test]
    fn test_log_activity_stamps_actor_and_time() {
        let (mut store, clock) = store_with_user();
        clock.advance(Duration::minutes(3));
        let activity = store
            .log_activity(
                "p-1",
                ActivityAction::TaskAdd,
                "Task \"Login\" added",
                Some(EntityType::Task),
                Some("t-1"),
            )
            .unwrap();

        assert_eq!(activity.user_id, "u-alice");
        assert_eq!(activity.created_at, clock.now());
        assert_eq!(activity.entity_type, Some(EntityType::Task));
        assert_eq!(store.activities()[0], activity);
    }

    #[test]
    fn test_activity_log_is_capped_newest_first() {
        let (mut store, clock) = store_with_user();
        for i in 0..250 {
            clock.advance(Duration::seconds(1));
            store.log_activity("p-1", ActivityAction::Update, format!("entry {}", i), None, None);
        }

        let log = store.activities();
        assert_eq!(log.len(), ACTIVITY_LOG_LIMIT);
        assert_eq!(log[0].details, "entry 249");
        assert_eq!(log[ACTIVITY_LOG_LIMIT - 1].details, "entry 50");
        assert!(log.windows(2).all(|w| w[0].created_at > w[1].created_at));
    }
}
