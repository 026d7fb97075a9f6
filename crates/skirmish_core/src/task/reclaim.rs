//! Area reclaim.

use super::{CloseReason, TaskContext, TaskHeader, TaskOutcome, UnitTask, WorkerView};
use crate::config::AiConfig;
use crate::math::Fixed;
use crate::oracle::{Order, UnitId};

/// Reclaim everything within a radius. Expires after its timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct ReclaimTask {
    header: TaskHeader,
    radius: Fixed,
}

impl ReclaimTask {
    /// Wrap a header.
    #[must_use]
    pub fn new(header: TaskHeader, radius: Fixed) -> Self {
        Self { header, radius }
    }

    /// Radius of the area.
    #[must_use]
    pub fn radius(&self) -> Fixed {
        self.radius
    }
}

impl UnitTask for ReclaimTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut TaskHeader {
        &mut self.header
    }

    fn can_assign_to(&self, worker: &WorkerView<'_>, _config: &AiConfig) -> bool {
        !self.header.is_closed()
            && self.header.assignees.is_empty()
            && worker.props.is_builder()
            && !worker.props.movement.is_static()
    }

    fn execute(&mut self, worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        ctx.host.issue(
            worker,
            Order::ReclaimArea {
                center: self.header.position,
                radius: self.radius,
            },
        );
        TaskOutcome::Continue
    }

    fn on_unit_idle(&mut self, _worker: UnitId, _ctx: &mut TaskContext<'_>) -> TaskOutcome {
        TaskOutcome::Done
    }

    fn on_unit_destroyed(&mut self, _unit: UnitId, _ctx: &mut TaskContext<'_>) -> TaskOutcome {
        TaskOutcome::Continue
    }

    fn update(&mut self, _ctx: &mut TaskContext<'_>) -> TaskOutcome {
        TaskOutcome::Continue
    }

    fn close(&mut self, _reason: CloseReason, _ctx: &mut TaskContext<'_>) {}
}
