//! Estimations and their items.
//!
//! Every item mutation recomputes `total_hours` so it always equals the sum
//! of the items' estimated hours.

use tracing::debug;

use super::{locate, locate_mut, position, Store};
use crate::models::{
    new_id, ActivityAction, EntityType, Estimation, EstimationComment, EstimationItem,
    EstimationItemPatch, EstimationPatch, NewEstimation, NewEstimationItem,
};
use crate::{Error, Result};

impl Store {
    /// Create an estimation owned by the current user.
    ///
    /// Fails with [`Error::NoCurrentUser`] when no user is selected.
    pub fn add_estimation(&mut self, project_id: &str, data: NewEstimation) -> Result<Estimation> {
        let author = self.actor().ok_or(Error::NoCurrentUser)?;
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let estimation = Estimation::new(new_id(), project_id.to_string(), data, author, now);
        project.estimations.push(estimation.clone());
        project.updated_at = now;
        debug!(project = %project_id, estimation = %estimation.id, "estimation added");

        self.record_activity(
            project_id,
            ActivityAction::EstimationAdd,
            format!("Estimation \"{}\" created", estimation.title),
            Some(EntityType::Estimation),
            Some(&estimation.id),
        );
        self.notify();
        Ok(estimation)
    }

    pub fn update_estimation(
        &mut self,
        project_id: &str,
        estimation_id: &str,
        patch: EstimationPatch,
    ) -> Result<Estimation> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let estimation = locate_mut(&mut project.estimations, estimation_id)?;
        patch.apply(estimation);
        estimation.updated_at = now;
        let updated = estimation.clone();
        project.updated_at = now;
        debug!(project = %project_id, estimation = %estimation_id, "estimation updated");
        self.notify();
        Ok(updated)
    }

    pub fn add_estimation_item(
        &mut self,
        project_id: &str,
        estimation_id: &str,
        data: NewEstimationItem,
    ) -> Result<EstimationItem> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let estimation = locate_mut(&mut project.estimations, estimation_id)?;
        let item = EstimationItem::new(new_id(), data);
        estimation.items.push(item.clone());
        estimation.recompute_total();
        estimation.updated_at = now;
        let total = estimation.total_hours;
        project.updated_at = now;
        debug!(estimation = %estimation_id, item = %item.id, total, "estimation item added");
        self.notify();
        Ok(item)
    }

    pub fn update_estimation_item(
        &mut self,
        project_id: &str,
        estimation_id: &str,
        item_id: &str,
        patch: EstimationItemPatch,
    ) -> Result<EstimationItem> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let estimation = locate_mut(&mut project.estimations, estimation_id)?;
        let item = locate_mut(&mut estimation.items, item_id)?;
        patch.apply(item);
        let updated = item.clone();
        estimation.recompute_total();
        estimation.updated_at = now;
        let total = estimation.total_hours;
        project.updated_at = now;
        debug!(estimation = %estimation_id, item = %item_id, total, "estimation item updated");
        self.notify();
        Ok(updated)
    }

    pub fn delete_estimation_item(
        &mut self,
        project_id: &str,
        estimation_id: &str,
        item_id: &str,
    ) -> Result<()> {
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let estimation = locate_mut(&mut project.estimations, estimation_id)?;
        let index = position(&estimation.items, item_id)?;
        estimation.items.remove(index);
        estimation.recompute_total();
        estimation.updated_at = now;
        let total = estimation.total_hours;
        project.updated_at = now;
        debug!(estimation = %estimation_id, item = %item_id, total, "estimation item deleted");
        self.notify();
        Ok(())
    }

    /// Comment on an estimation, optionally about one of its items.
    ///
    /// Returns `Ok(None)` and changes nothing when no user is selected.
    pub fn add_estimation_comment(
        &mut self,
        project_id: &str,
        estimation_id: &str,
        content: &str,
        item_id: Option<&str>,
    ) -> Result<Option<EstimationComment>> {
        let Some(author) = self.actor() else {
            return Ok(None);
        };
        let now = self.now();
        let project = locate_mut(&mut self.state.projects, project_id)?;
        let estimation = locate_mut(&mut project.estimations, estimation_id)?;
        if let Some(item_id) = item_id {
            locate(&estimation.items, item_id)?;
        }

        let comment = EstimationComment {
            id: new_id(),
            content: content.to_string(),
            author,
            created_at: now,
            item_id: item_id.map(str::to_string),
        };
        estimation.comments.push(comment.clone());
        estimation.updated_at = now;
        project.updated_at = now;
        self.notify();
        Ok(Some(comment))
    }
}
