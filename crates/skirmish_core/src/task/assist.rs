//! Repair and construction assistance.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{CloseReason, TaskContext, TaskHeader, TaskOutcome, UnitTask, WorkerView};
use crate::config::AiConfig;
use crate::math::Fixed;
use crate::oracle::{Order, UnitId};

/// What an assist task helps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssistTarget {
    /// Repair a damaged or unfinished unit.
    Repair(UnitId),
    /// Follow a constructor and help whatever it builds.
    Guard(UnitId),
}

impl AssistTarget {
    /// The unit helped.
    #[must_use]
    pub const fn unit(self) -> UnitId {
        match self {
            Self::Repair(unit) | Self::Guard(unit) => unit,
        }
    }

    fn order(self) -> Order {
        match self {
            Self::Repair(unit) => Order::Repair(unit),
            Self::Guard(unit) => Order::Guard(unit),
        }
    }
}

/// Help another unit. Several assignees may share one task.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistTask {
    header: TaskHeader,
    target: Option<AssistTarget>,
}

impl AssistTask {
    /// Wrap a header. Without target, the first assignee searches one.
    #[must_use]
    pub fn new(mut header: TaskHeader, target: Option<AssistTarget>) -> Self {
        header.target = target.map(AssistTarget::unit);
        Self { header, target }
    }

    /// The unit helped, if chosen yet.
    #[must_use]
    pub fn target(&self) -> Option<AssistTarget> {
        self.target
    }

    /// Nearest damaged friendly unit the worker can reach quickly and keep up with.
    fn search(&self, worker: UnitId, ctx: &TaskContext<'_>) -> Option<AssistTarget> {
        let snapshot = ctx.host.unit(worker)?;
        let tree = ctx.controller.tree();
        let props = tree.get(snapshot.unit_type)?;
        let radius = props.build_distance + props.max_speed * ctx.config.assist_search_seconds;
        let max_target_speed = props.max_speed * 2.0;

        ctx.host
            .friendly_units_in(snapshot.position, Fixed::from_num(radius))
            .into_iter()
            .filter(|u| u.id != worker && u.is_damaged() && !u.being_built)
            .find(|u| {
                tree.get(u.unit_type)
                    .is_some_and(|p| p.max_speed <= max_target_speed)
            })
            .map(|u| AssistTarget::Repair(u.id))
    }

    fn needs_help(&self, ctx: &TaskContext<'_>) -> Option<bool> {
        let target = self.target?;
        let unit = ctx.host.unit(target.unit())?;
        Some(match target {
            AssistTarget::Repair(_) => unit.is_damaged() || unit.being_built,
            AssistTarget::Guard(_) => true,
        })
    }
}

impl UnitTask for AssistTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut TaskHeader {
        &mut self.header
    }

    fn can_assign_to(&self, worker: &WorkerView<'_>, config: &AiConfig) -> bool {
        !self.header.is_closed()
            && (worker.props.is_builder() || worker.props.is_assister())
            && self.header.assignees.len() < config.max_assistants
            && self.target.map_or(true, |t| t.unit() != worker.unit)
    }

    fn execute(&mut self, worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        let target = match self.target {
            Some(target) if ctx.host.unit(target.unit()).is_some() => target,
            Some(_) => return TaskOutcome::Abort,
            None => {
                let Some(found) = self.search(worker, ctx) else {
                    trace!(worker = worker.0, "Nothing to assist nearby");
                    return TaskOutcome::Fallback(worker);
                };
                self.target = Some(found);
                self.header.target = Some(found.unit());
                found
            }
        };
        ctx.host.issue(worker, target.order());
        TaskOutcome::Continue
    }

    fn on_unit_idle(&mut self, worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        match self.needs_help(ctx) {
            Some(true) => self.execute(worker, ctx),
            Some(false) => TaskOutcome::Done,
            None if self.target.is_none() => self.execute(worker, ctx),
            None => TaskOutcome::Abort,
        }
    }

    fn on_unit_destroyed(&mut self, unit: UnitId, _ctx: &mut TaskContext<'_>) -> TaskOutcome {
        if self.target.map(AssistTarget::unit) == Some(unit) {
            TaskOutcome::Abort
        } else {
            TaskOutcome::Continue
        }
    }

    fn update(&mut self, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        match self.needs_help(ctx) {
            Some(true) => TaskOutcome::Continue,
            Some(false) => TaskOutcome::Done,
            None if self.target.is_none() => TaskOutcome::Continue,
            None => TaskOutcome::Abort,
        }
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

    fn header() -> TaskHeader {
        TaskHeader::new(
            TaskId(2),
            Priority::Normal,
            BuildType::Assist,
            UnitTypeId::NONE,
            Vec2Fixed::from_ints(100, 100),
            0,
        )
    }

    #[test]
    fn test_search_finds_nearby_damaged_unit() {
        let config = AiConfig::default();
        let mut controller = ConstructionOrderController::new(tree(), ARM, &config);
        let mut host = FakeHost::default();
        let worker = host.spawn(1, type_id("con_kbot"), 100, 100);
        let healthy = host.spawn(2, type_id("peewee"), 120, 100);
        let damaged = host.spawn(3, type_id("peewee"), 150, 100);
        host.units.get_mut(&damaged).unwrap().health = 50.0;
        let far = host.spawn(4, type_id("peewee"), 3000, 3000);
        host.units.get_mut(&far).unwrap().health = 50.0;

        let mut task = AssistTask::new(header(), None);
        let mut ctx = TaskContext {
            host: &mut host,
            controller: &mut controller,
            config: &config,
            tick: 0,
        };
        assert_eq!(task.execute(worker, &mut ctx), TaskOutcome::Continue);

        assert_eq!(task.target(), Some(AssistTarget::Repair(damaged)));
        assert_eq!(task.header().target, Some(damaged));
        assert_ne!(task.header().target, Some(healthy));
        assert_eq!(host.last_order(worker), Some(Order::Repair(damaged)));
    }

    #[test]
    fn test_search_reach_follows_config() {
        let mut config = AiConfig::default();
        let mut controller = ConstructionOrderController::new(tree(), ARM, &config);
        let mut host = FakeHost::default();
        let worker = host.spawn(1, type_id("con_kbot"), 100, 100);
        // con_kbot reaches 90 + 30 * seconds.
        let damaged = host.spawn(2, type_id("peewee"), 600, 100);
        host.units.get_mut(&damaged).unwrap().health = 50.0;

        let task = AssistTask::new(header(), None);
        let ctx = TaskContext {
            host: &mut host,
            controller: &mut controller,
            config: &config,
            tick: 0,
        };
        assert_eq!(task.search(worker, &ctx), None);

        config.assist_search_seconds = 20.0;
        let ctx = TaskContext {
            host: &mut host,
            controller: &mut controller,
            config: &config,
            tick: 0,
        };
        assert_eq!(task.search(worker, &ctx), Some(AssistTarget::Repair(damaged)));
    }

    #[test]
    fn test_nothing_to_assist_falls_back() {
        let config = AiConfig::default();
        let mut controller = ConstructionOrderController::new(tree(), ARM, &config);
        let mut host = FakeHost::default();
        let worker = host.spawn(1, type_id("con_kbot"), 100, 100);

        let mut task = AssistTask::new(header(), None);
        let mut ctx = TaskContext {
            host: &mut host,
            controller: &mut controller,
            config: &config,
            tick: 0,
        };
        assert_eq!(task.execute(worker, &mut ctx), TaskOutcome::Fallback(worker));
    }

    #[test]
    fn test_repaired_target_completes_task() {
        let config = AiConfig::default();
        let mut controller = ConstructionOrderController::new(tree(), ARM, &config);
        let mut host = FakeHost::default();
        let worker = host.spawn(1, type_id("con_kbot"), 100, 100);
        let target = host.spawn(2, type_id("peewee"), 120, 100);

        let mut task = AssistTask::new(header(), Some(AssistTarget::Repair(target)));
        let mut ctx = TaskContext {
            host: &mut host,
            controller: &mut controller,
            config: &config,
            tick: 0,
        };
        assert_eq!(task.on_unit_idle(worker, &mut ctx), TaskOutcome::Done);
    }

    #[test]
    fn test_guard_issues_guard_order() {
        let config = AiConfig::default();
        let mut controller = ConstructionOrderController::new(tree(), ARM, &config);
        let mut host = FakeHost::default();
        let worker = host.spawn(1, type_id("nano"), 100, 100);
        let builder = host.spawn(2, type_id("commander"), 120, 100);

        let mut task = AssistTask::new(header(), Some(AssistTarget::Guard(builder)));
        let mut ctx = TaskContext {
            host: &mut host,
            controller: &mut controller,
            config: &config,
            tick: 0,
        };
        task.execute(worker, &mut ctx);
        assert_eq!(host.last_order(worker), Some(Order::Guard(builder)));
    }
}
