//! Day-to-day project work: tasks, messages, milestones, team and time.

use tracing::debug;

use super::{locate, locate_mut, position, Store};
use crate::models::{
    new_id, ActivityAction, EntityType, Message, Milestone, MilestonePatch, NewMilestone, NewTask,
    NewTimeEntry, Task, TaskPatch, TimeEntry,
};
use crate::Result;

impl Store {
    // === Tasks ===

    pub fn add_task(&mut self, project_id: &str, data: NewTask) -> Result<Task> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let task = Task::new(new_id(), data, now);
        project.tasks.push(task.clone());
        project.updated_at = now;
        debug!(project = %project_id, task = %task.id, "task added");

        self.record_activity(
            project_id,
            ActivityAction::TaskAdd,
            format!("Task \"{}\" added", task.title),
            Some(EntityType::Task),
            Some(&task.id),
        );
        self.notify();
        Ok(task)
    }

    pub fn update_task(&mut self, project_id: &str, task_id: &str, patch: TaskPatch) -> Result<Task> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let task = locate_mut(&mut project.tasks, task_id)?;
        patch.apply(task);
        task.updated_at = now;
        let updated = task.clone();
        project.updated_at = now;
        debug!(project = %project_id, task = %task_id, "task updated");
        self.notify();
        Ok(updated)
    }

    pub fn delete_task(&mut self, project_id: &str, task_id: &str) -> Result<()> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let index = position(&project.tasks, task_id)?;
        project.tasks.remove(index);
        project.updated_at = now;
        debug!(project = %project_id, task = %task_id, "task deleted");
        self.notify();
        Ok(())
    }

    // === Messages ===

    /// Post a message authored by the current user.
    ///
    /// Returns `Ok(None)` and changes nothing when no user is selected.
    pub fn add_message(
        &mut self,
        project_id: &str,
        content: &str,
        is_announcement: bool,
    ) -> Result<Option<Message>> {
        let Some(author) = self.actor() else {
            debug!(project = %project_id, "no current user, message dropped");
            return Ok(None);
        };
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let message = Message {
            id: new_id(),
            content: content.to_string(),
            author,
            created_at: now,
            is_announcement,
        };
        project.messages.push(message.clone());
        project.updated_at = now;
        debug!(project = %project_id, message = %message.id, "message posted");
        self.notify();
        Ok(Some(message))
    }

    // === Milestones ===

    pub fn add_milestone(&mut self, project_id: &str, data: NewMilestone) -> Result<Milestone> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let milestone = Milestone::new(new_id(), data);
        project.milestones.push(milestone.clone());
        project.updated_at = now;
        debug!(project = %project_id, milestone = %milestone.id, "milestone added");

        self.record_activity(
            project_id,
            ActivityAction::MilestoneAdd,
            format!("Milestone \"{}\" added", milestone.title),
            None,
            None,
        );
        self.notify();
        Ok(milestone)
    }

    pub fn update_milestone(
        &mut self,
        project_id: &str,
        milestone_id: &str,
        patch: MilestonePatch,
    ) -> Result<Milestone> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let milestone = locate_mut(&mut project.milestones, milestone_id)?;
        patch.apply(milestone);
        let updated = milestone.clone();
        project.updated_at = now;
        debug!(project = %project_id, milestone = %milestone_id, "milestone updated");
        self.notify();
        Ok(updated)
    }

    // === Team ===

    /// Add a registered user to the project team.
    ///
    /// Returns `Ok(false)` without changing anything if the user is already a member.
    pub fn add_team_member(&mut self, project_id: &str, user_id: &str) -> Result<bool> {
        let now = self.now();
        let user = locate(&self.state.users, user_id)?.clone();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        if project.has_member(user_id) {
            return Ok(false);
        }
        project.team.push(user.clone());
        project.updated_at = now;
        debug!(project = %project_id, user = %user_id, "team member added");

        self.record_activity(
            project_id,
            ActivityAction::TeamAdd,
            format!("{} joined the team", user.name),
            None,
            None,
        );
        self.notify();
        Ok(true)
    }

    /// Remove a user from the project team. Returns false if they were not a member.
    pub fn remove_team_member(&mut self, project_id: &str, user_id: &str) -> Result<bool> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        if !project.has_member(user_id) {
            return Ok(false);
        }
        project.team.retain(|member| member.id != user_id);
        project.updated_at = now;
        debug!(project = %project_id, user = %user_id, "team member removed");
        self.notify();
        Ok(true)
    }

    // === Time entries ===

    /// Log hours against the project named in the entry.
    pub fn add_time_entry(&mut self, data: NewTimeEntry) -> Result<TimeEntry> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, &data.project_id)?;
        if let Some(task_id) = data.task_id.as_deref() {
            locate(&project.tasks, task_id)?;
        }
        let entry = TimeEntry {
            id: new_id(),
            user_id: data.user_id,
            project_id: data.project_id,
            task_id: data.task_id,
            date: data.date,
            hours: data.hours,
            description: data.description,
            billable: data.billable,
            created_at: now,
        };
        project.time_entries.push(entry.clone());
        project.updated_at = now;
        debug!(project = %entry.project_id, hours = entry.hours, "time logged");
        self.notify();
        Ok(entry)
    }
}
