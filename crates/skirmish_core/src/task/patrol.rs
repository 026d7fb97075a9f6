//! Short patrols for workers with nothing better to do.

use super::{CloseReason, TaskContext, TaskHeader, TaskOutcome, UnitTask, WorkerView};
use crate::config::AiConfig;
use crate::math::Fixed;
use crate::oracle::{step_toward_center, Order, UnitId};

/// Distance of the patrol leg toward the map center.
const PATROL_LEG: i32 = 80;

/// Patrol toward the map center. Expires after its timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolTask {
    header: TaskHeader,
}

impl PatrolTask {
    /// Wrap a header.
    #[must_use]
    pub fn new(header: TaskHeader) -> Self {
        Self { header }
    }
}

impl UnitTask for PatrolTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut TaskHeader {
        &mut self.header
    }

    fn can_assign_to(&self, worker: &WorkerView<'_>, _config: &AiConfig) -> bool {
        !self.header.is_closed()
            && self.header.assignees.is_empty()
            && !worker.props.movement.is_static()
    }

    fn execute(&mut self, worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        let from = ctx
            .host
            .unit(worker)
            .map_or(self.header.position, |u| u.position);
        let to = step_toward_center(from, ctx.host.map_size(), Fixed::from_num(PATROL_LEG));
        ctx.host.issue(worker, Order::PatrolTo(to));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::ConstructionOrderController;
    use crate::math::Vec2Fixed;
    use crate::task::testing::{tree, type_id, FakeHost, ARM};
    use crate::task::{BuildType, Priority, TaskId};
    use crate::unit_kind::UnitTypeId;

    #[test]
    fn test_patrol_heads_toward_center() {
        let config = AiConfig::default();
        let mut controller = ConstructionOrderController::new(tree(), ARM, &config);
        let mut host = FakeHost::default();
        let worker = host.spawn(1, type_id("con_kbot"), 100, 4000);
        let mut task = PatrolTask::new(TaskHeader::new(
            TaskId(3),
            Priority::Low,
            BuildType::Patrol,
            UnitTypeId::NONE,
            Vec2Fixed::ZERO,
            0,
        ));

        let mut ctx = TaskContext {
            host: &mut host,
            controller: &mut controller,
            config: &config,
            tick: 0,
        };
        task.execute(worker, &mut ctx);
        assert_eq!(
            host.last_order(worker),
            Some(Order::PatrolTo(Vec2Fixed::from_ints(180, 3920)))
        );
    }
}
