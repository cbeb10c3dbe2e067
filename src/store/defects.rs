//! Defect reports.

use tracing::debug;

use super::codes::DEFECT_PREFIX;
use super::{locate_mut, Store};
use crate::models::{new_id, ActivityAction, Defect, DefectPatch, DefectStatus, EntityType, NewDefect};
use crate::Result;

impl Store {
    /// Report a defect with the next `BUG-NNN` code of the project.
    ///
    /// The reporter defaults to the current user.
    pub fn add_defect(&mut self, project_id: &str, mut data: NewDefect) -> Result<Defect> {
        if data.reported_by.is_none() {
            data.reported_by = self.actor();
        }
        let now = self.now();
        let codes = self.codes;
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let code = codes.next(
            DEFECT_PREFIX,
            project.defects.len(),
            &mut project.code_counters.defects,
        );
        let defect = Defect::new(new_id(), code, data, now);
        project.defects.push(defect.clone());
        project.updated_at = now;
        debug!(project = %project_id, defect = %defect.code, severity = %defect.severity, "defect reported");

        self.record_activity(
            project_id,
            ActivityAction::DefectAdd,
            format!("Bug \"{}\" reported", defect.code),
            Some(EntityType::Defect),
            Some(&defect.id),
        );
        self.notify();
        Ok(defect)
    }

    /// Merge changes into a defect.
    ///
    /// Moving to `resolved` stamps who resolved it and when; moving back to an
    /// open status clears both.
    pub fn update_defect(
        &mut self,
        project_id: &str,
        defect_id: &str,
        patch: DefectPatch,
    ) -> Result<Defect> {
        let now = self.now();
        let actor = self.actor();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let defect = locate_mut(&mut project.defects, defect_id)?;

        if let Some(previous) = patch.apply(defect) {
            if defect.status == DefectStatus::Resolved {
                defect.resolved_at = Some(now);
                defect.resolved_by = actor;
            } else if defect.is_open() {
                defect.resolved_at = None;
                defect.resolved_by = None;
            }
            debug!(defect = %defect.code, from = %previous, to = %defect.status, "defect status changed");
        }
        defect.updated_at = now;
        let updated = defect.clone();
        project.updated_at = now;
        self.notify();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{DefectPatch, DefectSeverity, DefectStatus, NewDefect};
    use crate::store::CodeSequence;
    use crate::test_utils::{empty_store, new_project, store_with_user};
    use crate::Error;
    use chrono::Duration;

    fn bug(title: &str) -> NewDefect {
        NewDefect {
            title: title.to_string(),
            severity: DefectSeverity::High,
            ..NewDefect::default()
        }
    }

    fn status(s: DefectStatus) -> DefectPatch {
        DefectPatch {
            status: Some(s),
            ..DefectPatch::default()
        }
    }

    #[test]
    fn test_defect_codes_and_activity() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let first = store.add_defect(&project.id, bug("Crash")).unwrap();
        let second = store.add_defect(&project.id, bug("Typo")).unwrap();

        assert_eq!(first.code, "BUG-001");
        assert_eq!(second.code, "BUG-002");
        assert_eq!(first.reported_by.unwrap().id, "u-alice");
        let activity = &store.activities()[0];
        assert_eq!(activity.action.as_str(), "defect_add");
        assert!(activity.details.contains("BUG-002"));
    }

    #[test]
    fn test_defect_without_user_is_still_recorded() {
        let (mut store, _clock) = empty_store();
        let project = store.add_project(new_project("Portal"));
        let defect = store.add_defect(&project.id, bug("Crash")).unwrap();
        assert!(defect.reported_by.is_none());
        assert_eq!(store.project(&project.id).unwrap().defects.len(), 1);
        assert!(store.activities().is_empty());
    }

    #[test]
    fn test_resolve_and_reopen() {
        let (mut store, clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let defect = store.add_defect(&project.id, bug("Crash")).unwrap();

        clock.advance(Duration::hours(2));
        let resolved = store
            .update_defect(&project.id, &defect.id, status(DefectStatus::Resolved))
            .unwrap();
        assert!(resolved.resolved_at.is_some());
        assert_eq!(resolved.resolved_by.as_ref().unwrap().id, "u-alice");
        assert!(resolved.updated_at > defect.updated_at);

        let closed = store
            .update_defect(&project.id, &defect.id, status(DefectStatus::Closed))
            .unwrap();
        assert!(closed.resolved_at.is_some());

        let reopened = store
            .update_defect(&project.id, &defect.id, status(DefectStatus::Reopened))
            .unwrap();
        assert!(reopened.resolved_at.is_none());
        assert!(reopened.resolved_by.is_none());
    }

    #[test]
    fn test_update_unknown_defect() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        assert!(matches!(
            store.update_defect(&project.id, "nope", DefectPatch::default()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_monotonic_defect_codes_raise_counter() {
        let (store, _clock) = store_with_user();
        let mut store = store.with_code_sequence(CodeSequence::Monotonic);
        let project = store.add_project(new_project("Portal"));
        store.add_defect(&project.id, bug("A")).unwrap();
        assert_eq!(
            store.project(&project.id).unwrap().code_counters.defects,
            1
        );
        let next = store.add_defect(&project.id, bug("B")).unwrap();
        assert_eq!(next.code, "BUG-002");
    }
}
