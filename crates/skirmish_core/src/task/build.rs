//! Construction of a building by a mobile builder.

use tracing::debug;

use super::{CloseReason, TaskContext, TaskHeader, TaskOutcome, UnitTask, WorkerView};
use crate::config::AiConfig;
use crate::math::{Fixed, Vec2Fixed};
use crate::oracle::{Facing, Order, UnitId};

/// Construct one building.
///
/// The site is reserved with a blocker on first execution and re-checked
/// on every later one. Once the host reports the new unit, the task binds
/// it as target and assignees switch to repairing it.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildTask {
    header: TaskHeader,
}

impl BuildTask {
    /// Wrap a header.
    #[must_use]
    pub fn new(header: TaskHeader) -> Self {
        Self { header }
    }

    /// Reuse the reserved site if it is still buildable, else search anew.
    fn resolve_site(&mut self, ctx: &mut TaskContext<'_>) -> Option<Vec2Fixed> {
        let header = &mut self.header;
        if let Some(site) = header.build_site {
            if ctx.host.is_buildable_at(header.unit_type, site, header.facing) {
                return Some(site);
            }
            ctx.host.remove_blocker(header.unit_type, site, header.facing);
            header.build_site = None;
        }

        let facing = Facing::toward_center(header.position, ctx.host.map_size());
        let radius = Fixed::from_num(ctx.config.build_site_search_radius);
        let site = ctx
            .host
            .find_build_site(header.unit_type, header.position, radius, facing)?;
        ctx.host.add_blocker(header.unit_type, site, facing);
        header.build_site = Some(site);
        header.facing = facing;
        Some(site)
    }
}

impl UnitTask for BuildTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut TaskHeader {
        &mut self.header
    }

    fn can_assign_to(&self, worker: &WorkerView<'_>, _config: &AiConfig) -> bool {
        if self.header.is_closed() || !self.header.assignees.is_empty() {
            return false;
        }
        if !worker.props.is_builder() || worker.props.movement.is_static() {
            return false;
        }
        // Anyone can finish a started building; only capable builders start one.
        self.header.target.is_some() || worker.can_build.contains(&self.header.unit_type)
    }

    fn execute(&mut self, worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        if let Some(target) = self.header.target {
            if ctx.host.unit(target).is_none() {
                return TaskOutcome::Abort;
            }
            ctx.host.issue(worker, Order::Repair(target));
            return TaskOutcome::Continue;
        }

        let Some(site) = self.resolve_site(ctx) else {
            debug!(
                task = self.header.id.0,
                unit_type = self.header.unit_type.as_u16(),
                "No build site found"
            );
            return TaskOutcome::Fallback(worker);
        };
        ctx.host.issue(
            worker,
            Order::Build {
                unit_type: self.header.unit_type,
                position: site,
                facing: self.header.facing,
            },
        );
        TaskOutcome::Continue
    }

    fn on_unit_idle(&mut self, worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        let Some(target) = self.header.target else {
            // Build order dropped before the unit appeared.
            return self.execute(worker, ctx);
        };
        match ctx.host.unit(target) {
            Some(unit) if unit.being_built => {
                ctx.host.issue(worker, Order::Repair(target));
                TaskOutcome::Continue
            }
            Some(_) => TaskOutcome::Done,
            None => TaskOutcome::Abort,
        }
    }

    fn on_unit_destroyed(&mut self, unit: UnitId, _ctx: &mut TaskContext<'_>) -> TaskOutcome {
        if self.header.target == Some(unit) {
            return TaskOutcome::Abort;
        }
        if self.header.assignees.is_empty() {
            TaskOutcome::NeedsReplacement
        } else {
            TaskOutcome::Continue
        }
    }

    fn update(&mut self, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        let Some(target) = self.header.target else {
            return TaskOutcome::Continue;
        };
        match ctx.host.unit(target) {
            None => TaskOutcome::Abort,
            Some(unit) if !unit.being_built => TaskOutcome::Done,
            Some(_) => TaskOutcome::Continue,
        }
    }

    fn close(&mut self, reason: CloseReason, ctx: &mut TaskContext<'_>) {
        if let Some(site) = self.header.build_site.take() {
            ctx.host
                .remove_blocker(self.header.unit_type, site, self.header.facing);
        }
        if reason == CloseReason::Aborted && self.header.target.is_none() {
            ctx.controller.unit_request_failed(self.header.unit_type);
        }
    }
}
