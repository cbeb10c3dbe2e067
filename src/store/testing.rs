//! Test cases, test cycles and executions.

use tracing::debug;

use super::codes::TEST_CASE_PREFIX;
use super::{locate, locate_mut, position, Store};
use crate::models::{
    new_id, ActivityAction, EntityType, NewTestCase, NewTestCycle, NewTestExecution, TestCase,
    TestCasePatch, TestCycle, TestCyclePatch, TestExecution,
};
use crate::{Error, Result};

impl Store {
    /// Add a test case with the next `TC-NNN` code of the project.
    ///
    /// Returns `Ok(None)` and changes nothing when no user is selected.
    pub fn add_test_case(&mut self, project_id: &str, data: NewTestCase) -> Result<Option<TestCase>> {
        let Some(author) = self.actor() else {
            debug!(project = %project_id, "no current user, test case dropped");
            return Ok(None);
        };
        let now = self.now();
        let codes = self.codes;
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let code = codes.next(
            TEST_CASE_PREFIX,
            project.test_cases.len(),
            &mut project.code_counters.test_cases,
        );
        let test_case = TestCase::new(new_id(), code, data, author, now);
        project.test_cases.push(test_case.clone());
        project.updated_at = now;
        debug!(project = %project_id, test_case = %test_case.code, "test case added");

        self.record_activity(
            project_id,
            ActivityAction::TestAdd,
            format!("Test case \"{}\" added", test_case.code),
            Some(EntityType::Test),
            Some(&test_case.id),
        );
        self.notify();
        Ok(Some(test_case))
    }

    pub fn update_test_case(
        &mut self,
        project_id: &str,
        test_case_id: &str,
        patch: TestCasePatch,
    ) -> Result<TestCase> {
        let now = self.now();
        let actor = self.actor();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let test_case = locate_mut(&mut project.test_cases, test_case_id)?;
        patch.apply(test_case);
        test_case.updated_at = now;
        if actor.is_some() {
            test_case.last_modified_by = actor;
        }
        let updated = test_case.clone();
        project.updated_at = now;
        debug!(project = %project_id, test_case = %updated.code, "test case updated");
        self.notify();
        Ok(updated)
    }

    /// Remove a test case from the project.
    ///
    /// Cycles keep their own snapshot of the case.
    pub fn delete_test_case(&mut self, project_id: &str, test_case_id: &str) -> Result<()> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let index = position(&project.test_cases, test_case_id)?;
        project.test_cases.remove(index);
        project.updated_at = now;
        debug!(project = %project_id, test_case = %test_case_id, "test case deleted");
        self.notify();
        Ok(())
    }

    /// Create a test cycle owned by the current user.
    ///
    /// Fails with [`Error::NoCurrentUser`] when no user is selected.
    pub fn add_test_cycle(&mut self, project_id: &str, data: NewTestCycle) -> Result<TestCycle> {
        let author = self.actor().ok_or(Error::NoCurrentUser)?;
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let cycle = TestCycle::new(new_id(), project_id.to_string(), data, author, now);
        project.test_cycles.push(cycle.clone());
        project.updated_at = now;
        debug!(project = %project_id, cycle = %cycle.id, cases = cycle.test_cases.len(), "test cycle added");

        self.record_activity(
            project_id,
            ActivityAction::CycleAdd,
            format!("Test cycle \"{}\" created", cycle.name),
            Some(EntityType::Test),
            Some(&cycle.id),
        );
        self.notify();
        Ok(cycle)
    }

    /// Merge changes into a cycle. Replacing its case list refreshes the summary.
    pub fn update_test_cycle(
        &mut self,
        project_id: &str,
        cycle_id: &str,
        patch: TestCyclePatch,
    ) -> Result<TestCycle> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let cycle = locate_mut(&mut project.test_cycles, cycle_id)?;
        if patch.apply(cycle) {
            cycle.refresh_summary();
        }
        cycle.updated_at = now;
        let updated = cycle.clone();
        project.updated_at = now;
        debug!(project = %project_id, cycle = %cycle_id, "test cycle updated");
        self.notify();
        Ok(updated)
    }

    /// Record a run of one of the cycle's test cases and refresh the summary.
    ///
    /// The case must be planned in the cycle; the execution embeds a copy of
    /// it. The executor is `data.executed_by`, or else the current user.
    pub fn add_test_execution(
        &mut self,
        project_id: &str,
        cycle_id: &str,
        data: NewTestExecution,
    ) -> Result<TestExecution> {
        let now = self.now();
        let actor = self.actor();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let cycle = locate(&project.test_cycles, cycle_id)?;
        let test_case = locate(&cycle.test_cases, &data.test_case_id)?.clone();
        let executed_by = data.executed_by.or(actor).ok_or(Error::NoCurrentUser)?;

        let execution = TestExecution {
            id: new_id(),
            test_case,
            test_case_id: data.test_case_id,
            test_cycle_id: Some(cycle_id.to_string()),
            executed_by,
            executed_at: data.executed_at.unwrap_or(now),
            result: data.result,
            execution_time: data.execution_time,
            environment: data.environment,
            browser: data.browser,
            device: data.device,
            steps: data.steps,
            notes: data.notes,
            defects: data.defects,
        };

        let cycle = locate_mut(&mut project.test_cycles, cycle_id)?;
        cycle.executions.push(execution.clone());
        cycle.refresh_summary();
        cycle.updated_at = now;
        project.updated_at = now;
        debug!(
            cycle = %cycle_id,
            test_case = %execution.test_case_id,
            result = %execution.result,
            "test executed"
        );
        self.notify();
        Ok(execution)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{
        NewTestCase, NewTestCycle, NewTestExecution, Project, TestCase, TestCasePatch,
        TestCyclePatch, TestOutcome, TestStatus,
    };
    use crate::store::{CodeSequence, Store};
    use crate::test_utils::{empty_store, epoch, new_project, store_with_user, user};
    use crate::Error;
    use chrono::Duration;

    fn case(title: &str) -> NewTestCase {
        NewTestCase {
            title: title.to_string(),
            ..NewTestCase::default()
        }
    }

    fn add_cases(store: &mut Store, project: &Project, n: usize) -> Vec<TestCase> {
        (0..n)
            .map(|i| {
                store
                    .add_test_case(&project.id, case(&format!("Case {}", i + 1)))
                    .unwrap()
                    .unwrap()
            })
            .collect()
    }

    fn cycle_with(store: &mut Store, project: &Project, cases: Vec<TestCase>) -> String {
        store
            .add_test_cycle(
                &project.id,
                NewTestCycle {
                    name: "Sprint 1".to_string(),
                    environment: "staging".to_string(),
                    test_cases: cases,
                    ..NewTestCycle::default()
                },
            )
            .unwrap()
            .id
    }

    fn execute(store: &mut Store, project: &Project, cycle: &str, case_id: &str, result: TestOutcome, minutes: i64) {
        store
            .add_test_execution(
                &project.id,
                cycle,
                NewTestExecution {
                    test_case_id: case_id.to_string(),
                    result,
                    executed_at: Some(epoch() + Duration::minutes(minutes)),
                    ..NewTestExecution::default()
                },
            )
            .unwrap();
    }

    #[test]
    fn test_case_codes_reuse_after_delete() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let cases = add_cases(&mut store, &project, 2);
        assert_eq!(cases[0].code, "TC-001");
        assert_eq!(cases[1].code, "TC-002");

        store.delete_test_case(&project.id, &cases[0].id).unwrap();
        let next = store.add_test_case(&project.id, case("Again")).unwrap().unwrap();
        assert_eq!(next.code, "TC-002");
    }

    #[test]
    fn test_case_codes_monotonic() {
        let (store, _clock) = store_with_user();
        let mut store = store.with_code_sequence(CodeSequence::Monotonic);
        let project = store.add_project(new_project("Portal"));
        let cases = add_cases(&mut store, &project, 2);

        store.delete_test_case(&project.id, &cases[0].id).unwrap();
        let next = store.add_test_case(&project.id, case("Again")).unwrap().unwrap();
        assert_eq!(next.code, "TC-003");
    }

    #[test]
    fn test_case_without_user_is_silent_noop() {
        let (mut store, _clock) = empty_store();
        let project = store.add_project(new_project("Portal"));
        assert!(store.add_test_case(&project.id, case("A")).unwrap().is_none());
        assert!(store.project(&project.id).unwrap().test_cases.is_empty());
    }

    #[test]
    fn test_update_test_case_stamps_modifier() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let tc = add_cases(&mut store, &project, 1).remove(0);
        let updated = store
            .update_test_case(
                &project.id,
                &tc.id,
                TestCasePatch {
                    status: Some(TestStatus::Active),
                    ..TestCasePatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, TestStatus::Active);
        assert_eq!(updated.last_modified_by.unwrap().id, "u-alice");
        assert_eq!(store.activities()[0].action.as_str(), "test_add");
    }

    #[test]
    fn test_cycle_requires_current_user() {
        let (mut store, _clock) = empty_store();
        let project = store.add_project(new_project("Portal"));
        assert!(matches!(
            store.add_test_cycle(&project.id, NewTestCycle::default()),
            Err(Error::NoCurrentUser)
        ));
    }

    #[test]
    fn test_summary_counts_latest_execution_per_case() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let cases = add_cases(&mut store, &project, 3);
        let cycle = cycle_with(&mut store, &project, cases.clone());
        assert_eq!(store.activities()[0].action.as_str(), "cycle_add");

        execute(&mut store, &project, &cycle, &cases[0].id, TestOutcome::Passed, 1);
        execute(&mut store, &project, &cycle, &cases[1].id, TestOutcome::Failed, 2);
        execute(&mut store, &project, &cycle, &cases[0].id, TestOutcome::Failed, 3);

        let stored = &store.project(&project.id).unwrap().test_cycles[0];
        let summary = stored.summary.as_ref().unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 0);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.not_run, 1);
        assert_eq!(stored.executions.len(), 3);
    }

    #[test]
    fn test_execution_embeds_case_and_executor() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let cases = add_cases(&mut store, &project, 1);
        let cycle = cycle_with(&mut store, &project, cases.clone());

        let execution = store
            .add_test_execution(
                &project.id,
                &cycle,
                NewTestExecution {
                    test_case_id: cases[0].id.clone(),
                    result: TestOutcome::Passed,
                    ..NewTestExecution::default()
                },
            )
            .unwrap();
        assert_eq!(execution.test_case.code, "TC-001");
        assert_eq!(execution.executed_by.id, "u-alice");
        assert_eq!(execution.executed_at, epoch());
        assert_eq!(execution.test_cycle_id.as_deref(), Some(cycle.as_str()));
    }

    #[test]
    fn test_execution_of_unknown_case() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let cycle = cycle_with(&mut store, &project, Vec::new());
        let result = store.add_test_execution(
            &project.id,
            &cycle,
            NewTestExecution {
                test_case_id: "nope".to_string(),
                ..NewTestExecution::default()
            },
        );
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(store.project(&project.id).unwrap().test_cycles[0]
            .executions
            .is_empty());
    }

    #[test]
    fn test_execution_of_case_outside_cycle() {
        let (mut store, clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let cases = add_cases(&mut store, &project, 3);
        let cycle = cycle_with(&mut store, &project, cases[..1].to_vec());
        execute(&mut store, &project, &cycle, &cases[0].id, TestOutcome::Passed, 1);
        let before = store.project(&project.id).unwrap().clone();

        clock.advance(Duration::hours(1));
        for tc in &cases[1..] {
            let result = store.add_test_execution(
                &project.id,
                &cycle,
                NewTestExecution {
                    test_case_id: tc.id.clone(),
                    result: TestOutcome::Passed,
                    ..NewTestExecution::default()
                },
            );
            assert!(matches!(result, Err(Error::NotFound(_))));
        }

        let after = store.project(&project.id).unwrap();
        assert_eq!(*after, before);
        let summary = after.test_cycles[0].summary.as_ref().unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.pass_rate, 100);
        assert_eq!(summary.execution_progress, 100);
    }

    #[test]
    fn test_execution_tie_keeps_first_recorded() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let cases = add_cases(&mut store, &project, 2);
        let cycle = cycle_with(&mut store, &project, cases.clone());

        execute(&mut store, &project, &cycle, &cases[0].id, TestOutcome::Failed, 5);
        execute(&mut store, &project, &cycle, &cases[0].id, TestOutcome::Passed, 5);

        let stored = &store.project(&project.id).unwrap().test_cycles[0];
        let summary = stored.summary.as_ref().unwrap();
        assert_eq!(stored.executions.len(), 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.passed, 0);
        assert_eq!(summary.not_run, 1);
        assert_eq!(summary.execution_progress, 50);
    }

    #[test]
    fn test_execution_by_named_user_without_current_user() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let cases = add_cases(&mut store, &project, 1);
        let cycle = cycle_with(&mut store, &project, cases.clone());
        store.clear_current_user();

        let execution = store
            .add_test_execution(
                &project.id,
                &cycle,
                NewTestExecution {
                    test_case_id: cases[0].id.clone(),
                    result: TestOutcome::Blocked,
                    executed_by: Some(user("u-bob", "Bob")),
                    ..NewTestExecution::default()
                },
            )
            .unwrap();
        assert_eq!(execution.executed_by.id, "u-bob");
        let stored = &store.project(&project.id).unwrap().test_cycles[0];
        assert_eq!(stored.executions.len(), 1);
        assert_eq!(stored.summary.as_ref().unwrap().blocked, 1);
    }

    #[test]
    fn test_execution_needs_some_executor() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let cases = add_cases(&mut store, &project, 1);
        let cycle = cycle_with(&mut store, &project, cases.clone());
        store.clear_current_user();

        let result = store.add_test_execution(
            &project.id,
            &cycle,
            NewTestExecution {
                test_case_id: cases[0].id.clone(),
                ..NewTestExecution::default()
            },
        );
        assert!(matches!(result, Err(Error::NoCurrentUser)));
        assert!(store.project(&project.id).unwrap().test_cycles[0]
            .executions
            .is_empty());
    }

    #[test]
    fn test_replacing_cycle_cases_refreshes_summary() {
        let (mut store, _clock) = store_with_user();
        let project = store.add_project(new_project("Portal"));
        let cases = add_cases(&mut store, &project, 4);
        let cycle = cycle_with(&mut store, &project, cases[..2].to_vec());
        execute(&mut store, &project, &cycle, &cases[0].id, TestOutcome::Passed, 1);
        assert_eq!(
            store.project(&project.id).unwrap().test_cycles[0]
                .summary
                .as_ref()
                .unwrap()
                .pass_rate,
            50
        );

        let updated = store
            .update_test_cycle(
                &project.id,
                &cycle,
                TestCyclePatch {
                    test_cases: Some(cases.clone()),
                    ..TestCyclePatch::default()
                },
            )
            .unwrap();
        let summary = updated.summary.unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.not_run, 3);
        assert_eq!(summary.pass_rate, 25);
    }
}
