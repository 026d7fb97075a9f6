//! Factory production of one mobile unit.

use super::{CloseReason, TaskContext, TaskHeader, TaskOutcome, UnitTask, WorkerView};
use crate::config::AiConfig;
use crate::oracle::{Facing, Order, UnitId};

/// Produce one unit at a factory. Done when the unit finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct RecruitTask {
    header: TaskHeader,
}

impl RecruitTask {
    /// Wrap a header.
    #[must_use]
    pub fn new(header: TaskHeader) -> Self {
        Self { header }
    }

    fn target_state(&self, ctx: &TaskContext<'_>) -> TaskOutcome {
        let Some(target) = self.header.target else {
            return TaskOutcome::Continue;
        };
        match ctx.host.unit(target) {
            None => TaskOutcome::Abort,
            Some(unit) if unit.being_built => TaskOutcome::Continue,
            Some(_) => TaskOutcome::Done,
        }
    }
}

impl UnitTask for RecruitTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut TaskHeader {
        &mut self.header
    }

    fn can_assign_to(&self, worker: &WorkerView<'_>, _config: &AiConfig) -> bool {
        !self.header.is_closed()
            && self.header.assignees.is_empty()
            && worker.props.is_factory()
            && worker.can_build.contains(&self.header.unit_type)
    }

    fn execute(&mut self, worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        if self.header.target.is_some() {
            return self.target_state(ctx);
        }
        let position = ctx
            .host
            .unit(worker)
            .map_or(self.header.position, |u| u.position);
        ctx.host.issue(
            worker,
            Order::Build {
                unit_type: self.header.unit_type,
                position,
                facing: Facing::Any,
            },
        );
        TaskOutcome::Continue
    }

    fn on_unit_idle(&mut self, _worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        if self.header.target.is_none() {
            // Factory went idle without starting the unit.
            return TaskOutcome::Abort;
        }
        self.target_state(ctx)
    }

    fn on_unit_destroyed(&mut self, _unit: UnitId, _ctx: &mut TaskContext<'_>) -> TaskOutcome {
        TaskOutcome::Abort
    }

    fn update(&mut self, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        self.target_state(ctx)
    }

    fn close(&mut self, reason: CloseReason, ctx: &mut TaskContext<'_>) {
        if reason == CloseReason::Aborted && self.header.target.is_none() {
            ctx.controller.unit_request_failed(self.header.unit_type);
        }
    }
}
