//! Functional analyses, their requirements and requirement comments.

use tracing::debug;

use super::codes::REQUIREMENT_PREFIX;
use super::{locate_mut, Store};
use crate::models::{
    new_id, ActivityAction, AnalysisPatch, EntityType, FunctionalAnalysis, FunctionalRequirement,
    NewFunctionalAnalysis, NewRequirement, RequirementComment, RequirementHistoryEntry,
    RequirementPatch, RequirementStatus,
};
use crate::{Error, Result};

impl Store {
    /// Create a functional analysis owned by the current user.
    ///
    /// Fails with [`Error::NoCurrentUser`] when no user is selected.
    pub fn add_functional_analysis(
        &mut self,
        project_id: &str,
        data: NewFunctionalAnalysis,
    ) -> Result<FunctionalAnalysis> {
        let author = self.actor().ok_or(Error::NoCurrentUser)?;
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let analysis = FunctionalAnalysis::new(new_id(), project_id.to_string(), data, author, now);
        project.functional_analyses.push(analysis.clone());
        project.updated_at = now;
        debug!(project = %project_id, analysis = %analysis.id, "functional analysis added");

        self.record_activity(
            project_id,
            ActivityAction::AnalysisAdd,
            format!("Functional analysis \"{}\" created", analysis.title),
            Some(EntityType::Requirement),
            Some(&analysis.id),
        );
        self.notify();
        Ok(analysis)
    }

    pub fn update_functional_analysis(
        &mut self,
        project_id: &str,
        analysis_id: &str,
        patch: AnalysisPatch,
    ) -> Result<FunctionalAnalysis> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let analysis = locate_mut(&mut project.functional_analyses, analysis_id)?;
        patch.apply(analysis);
        analysis.updated_at = now;
        let updated = analysis.clone();
        project.updated_at = now;
        debug!(project = %project_id, analysis = %analysis_id, "functional analysis updated");
        self.notify();
        Ok(updated)
    }

    /// Add a requirement with the next `REQ-NNN` code of its analysis.
    ///
    /// Returns `Ok(None)` and changes nothing when no user is selected.
    pub fn add_requirement(
        &mut self,
        project_id: &str,
        analysis_id: &str,
        data: NewRequirement,
    ) -> Result<Option<FunctionalRequirement>> {
        let Some(author) = self.actor() else {
            debug!(project = %project_id, "no current user, requirement dropped");
            return Ok(None);
        };
        let now = self.now();
        let codes = self.codes;
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let analysis = locate_mut(&mut project.functional_analyses, analysis_id)?;

        let code = codes.next(
            REQUIREMENT_PREFIX,
            analysis.requirements.len(),
            &mut analysis.requirement_counter,
        );
        let requirement = FunctionalRequirement::new(new_id(), code, data, author, now);
        analysis.requirements.push(requirement.clone());
        analysis.updated_at = now;
        project.updated_at = now;
        debug!(project = %project_id, requirement = %requirement.code, "requirement added");

        self.record_activity(
            project_id,
            ActivityAction::RequirementAdd,
            format!("Requirement \"{}\" added", requirement.code),
            Some(EntityType::Requirement),
            Some(&requirement.id),
        );
        self.notify();
        Ok(Some(requirement))
    }

    /// Merge changes into a requirement.
    ///
    /// Any change to a tracked field bumps `version`; with a current user each
    /// change is also appended to `history`. Moving to `approved` stamps the
    /// approval.
    pub fn update_requirement(
        &mut self,
        project_id: &str,
        analysis_id: &str,
        requirement_id: &str,
        patch: RequirementPatch,
    ) -> Result<FunctionalRequirement> {
        let now = self.now();
        let actor = self.actor();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let analysis = locate_mut(&mut project.functional_analyses, analysis_id)?;
        let requirement = locate_mut(&mut analysis.requirements, requirement_id)?;

        let was_approved = requirement.status == RequirementStatus::Approved;
        let changes = patch.apply(requirement);
        if !changes.is_empty() {
            requirement.version += 1;
            if let Some(user) = actor.as_ref() {
                requirement
                    .history
                    .extend(changes.into_iter().map(|(field, old_value, new_value)| {
                        RequirementHistoryEntry {
                            id: new_id(),
                            field: field.to_string(),
                            old_value,
                            new_value,
                            changed_by: user.clone(),
                            changed_at: now,
                        }
                    }));
            }
        }
        if !was_approved && requirement.status == RequirementStatus::Approved {
            requirement.approved_at = Some(now);
            requirement.approved_by = actor;
        }
        requirement.updated_at = now;
        let updated = requirement.clone();
        analysis.updated_at = now;
        project.updated_at = now;
        debug!(
            project = %project_id,
            requirement = %updated.code,
            version = updated.version,
            "requirement updated"
        );
        self.notify();
        Ok(updated)
    }

    /// Comment on a requirement as the current user.
    ///
    /// Returns `Ok(None)` and changes nothing when no user is selected.
    pub fn add_requirement_comment(
        &mut self,
        project_id: &str,
        analysis_id: &str,
        requirement_id: &str,
        content: &str,
    ) -> Result<Option<RequirementComment>> {
        let Some(author) = self.actor() else {
            return Ok(None);
        };
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let analysis = locate_mut(&mut project.functional_analyses, analysis_id)?;
        let requirement = locate_mut(&mut analysis.requirements, requirement_id)?;

        let comment = RequirementComment {
            id: new_id(),
            content: content.to_string(),
            author,
            created_at: now,
            resolved: false,
        };
        requirement.comments.push(comment.clone());
        requirement.updated_at = now;
        analysis.updated_at = now;
        project.updated_at = now;
        self.notify();
        Ok(Some(comment))
    }

    pub fn resolve_requirement_comment(
        &mut self,
        project_id: &str,
        analysis_id: &str,
        requirement_id: &str,
        comment_id: &str,
    ) -> Result<RequirementComment> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let analysis = locate_mut(&mut project.functional_analyses, analysis_id)?;
        let requirement = locate_mut(&mut analysis.requirements, requirement_id)?;
        let comment = locate_mut(&mut requirement.comments, comment_id)?;
        comment.resolved = true;
        let resolved = comment.clone();
        requirement.updated_at = now;
        analysis.updated_at = now;
        project.updated_at = now;
        self.notify();
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{
        NewFunctionalAnalysis, NewRequirement, Project, RequirementPatch, RequirementPriority,
        RequirementStatus,
    };
    use crate::store::{CodeSequence, Store};
    use crate::test_utils::{empty_store, new_project, store_with_user};
    use crate::Error;

    fn analysis_fixture(store: &mut Store) -> (Project, String) {
        let project = store.add_project(new_project("Portal"));
        let analysis = store
            .add_functional_analysis(
                &project.id,
                NewFunctionalAnalysis {
                    title: "Checkout".to_string(),
                    version: "1.0".to_string(),
                    ..NewFunctionalAnalysis::default()
                },
            )
            .unwrap();
        (project, analysis.id)
    }

    fn requirement(title: &str) -> NewRequirement {
        NewRequirement {
            title: title.to_string(),
            ..NewRequirement::default()
        }
    }

    #[test]
    fn test_analysis_requires_current_user() {
        let (mut store, _clock) = empty_store();
        let project = store.add_project(new_project("Portal"));
        let result = store.add_functional_analysis(&project.id, NewFunctionalAnalysis::default());
        assert!(matches!(result, Err(Error::NoCurrentUser)));
        assert!(store.project(&project.id).unwrap().functional_analyses.is_empty());
    }

    #[test]
    fn test_analysis_logs_activity() {
        let (mut store, _clock) = store_with_user();
        let (project, analysis_id) = analysis_fixture(&mut store);
        let activity = &store.activities()[0];
        assert_eq!(activity.action.as_str(), "analysis_add");
        assert_eq!(activity.project_id, project.id);
        assert_eq!(activity.entity_id.as_deref(), Some(analysis_id.as_str()));
    }

    #[test]
    fn test_requirement_codes_follow_collection_length() {
        let (mut store, _clock) = store_with_user();
        let (project, analysis_id) = analysis_fixture(&mut store);

        let first = store
            .add_requirement(&project.id, &analysis_id, requirement("Login"))
            .unwrap()
            .unwrap();
        let second = store
            .add_requirement(&project.id, &analysis_id, requirement("Logout"))
            .unwrap()
            .unwrap();
        assert_eq!(first.code, "REQ-001");
        assert_eq!(second.code, "REQ-002");
        assert_eq!(first.version, 1);
        assert_eq!(store.activities()[0].action.as_str(), "requirement_add");
    }

    #[test]
    fn test_requirement_without_user_is_silent_noop() {
        let (mut store, _clock) = store_with_user();
        let (project, analysis_id) = analysis_fixture(&mut store);
        store.clear_current_user();

        let added = store
            .add_requirement(&project.id, &analysis_id, requirement("Login"))
            .unwrap();
        assert!(added.is_none());
        let analysis = &store.project(&project.id).unwrap().functional_analyses[0];
        assert!(analysis.requirements.is_empty());
    }

    #[test]
    fn test_requirement_in_unknown_analysis() {
        let (mut store, _clock) = store_with_user();
        let (project, _) = analysis_fixture(&mut store);
        assert!(matches!(
            store.add_requirement(&project.id, "nope", requirement("Login")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_requirement_tracks_history_and_approval() {
        let (mut store, _clock) = store_with_user();
        let (project, analysis_id) = analysis_fixture(&mut store);
        let req = store
            .add_requirement(&project.id, &analysis_id, requirement("Login"))
            .unwrap()
            .unwrap();

        let updated = store
            .update_requirement(
                &project.id,
                &analysis_id,
                &req.id,
                RequirementPatch {
                    priority: Some(RequirementPriority::MustHave),
                    status: Some(RequirementStatus::Approved),
                    ..RequirementPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.version, 2);
        assert_eq!(updated.history.len(), 2);
        assert_eq!(updated.history[0].field, "priority");
        assert_eq!(updated.history[0].new_value, "must-have");
        assert_eq!(updated.history[1].changed_by.id, "u-alice");
        assert!(updated.approved_at.is_some());
        assert_eq!(updated.approved_by.unwrap().id, "u-alice");
    }

    #[test]
    fn test_update_requirement_without_tracked_change_keeps_version() {
        let (mut store, _clock) = store_with_user();
        let (project, analysis_id) = analysis_fixture(&mut store);
        let req = store
            .add_requirement(&project.id, &analysis_id, requirement("Login"))
            .unwrap()
            .unwrap();

        let updated = store
            .update_requirement(
                &project.id,
                &analysis_id,
                &req.id,
                RequirementPatch {
                    acceptance_criteria: Some(vec!["Shows error on bad password".to_string()]),
                    ..RequirementPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.version, 1);
        assert!(updated.history.is_empty());
        assert_eq!(updated.acceptance_criteria.len(), 1);
    }

    #[test]
    fn test_requirement_comments() {
        let (mut store, _clock) = store_with_user();
        let (project, analysis_id) = analysis_fixture(&mut store);
        let req = store
            .add_requirement(&project.id, &analysis_id, requirement("Login"))
            .unwrap()
            .unwrap();

        let comment = store
            .add_requirement_comment(&project.id, &analysis_id, &req.id, "Needs SSO?")
            .unwrap()
            .unwrap();
        assert!(!comment.resolved);

        let resolved = store
            .resolve_requirement_comment(&project.id, &analysis_id, &req.id, &comment.id)
            .unwrap();
        assert!(resolved.resolved);
    }

    #[test]
    fn test_monotonic_requirement_codes() {
        let (store, _clock) = store_with_user();
        let mut store = store.with_code_sequence(CodeSequence::Monotonic);
        let (project, analysis_id) = analysis_fixture(&mut store);
        for title in ["A", "B", "C"] {
            store
                .add_requirement(&project.id, &analysis_id, requirement(title))
                .unwrap();
        }
        let analysis = &store.project(&project.id).unwrap().functional_analyses[0];
        assert_eq!(analysis.requirement_counter, 3);
        assert_eq!(analysis.requirements[2].code, "REQ-003");
    }
}
