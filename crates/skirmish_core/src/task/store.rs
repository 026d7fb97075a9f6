//! Task arena and scheduler.
//!
//! Tasks live in a map keyed by [`TaskId`]; workers refer to them by id
//! only, and tasks refer to workers by [`UnitId`]. Either side may vanish
//! at any time, so every cross reference is checked on use.
//!
//! Scheduling is pull based: an idle worker asks for the open task with
//! the lowest `distance / priority weight` that it can reach in time.
//! Every tick a slice of the task set is re-evaluated so the whole set is
//! revisited once per `slow_update_rate` ticks.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, info, trace};

use super::{
    AssistTarget, CloseReason, Priority, Task, TaskContext, TaskId, TaskOutcome, TaskRequest,
    TaskState, UnitTask, WorkerView,
};
use crate::math::{Fixed, Vec2Fixed};
use crate::oracle::{step_toward_center, Order, TaskPlanner, UnitId};
use crate::registry::UnitTypeProperties;
use crate::unit_kind::{MovementType, UnitTypeId};

/// A unit that takes tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Worker {
    /// Handle.
    pub unit: UnitId,
    /// Type.
    pub unit_type: UnitTypeId,
    /// Current task.
    pub task: Option<TaskId>,
    /// Tick of the last assignment.
    pub assigned_tick: u64,
    /// Tick of the last observed progress.
    pub last_progress_tick: u64,
}

/// Owner of all tasks and workers of one agent.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: BTreeMap<TaskId, Task>,
    workers: BTreeMap<UnitId, Worker>,
    next_id: u32,
    update_queue: VecDeque<TaskId>,
    pending_idle: BTreeSet<UnitId>,
    /// Unit under construction → task building it.
    unfinished: BTreeMap<UnitId, TaskId>,
    /// Build task → assist task helping it.
    assistance: BTreeMap<TaskId, TaskId>,
}

impl TaskStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up a live task.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// All live tasks in id order.
    pub fn tasks(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.tasks.iter().map(|(&id, task)| (id, task))
    }

    /// Look up a worker.
    #[must_use]
    pub fn worker(&self, unit: UnitId) -> Option<&Worker> {
        self.workers.get(&unit)
    }

    /// All workers in id order.
    pub fn workers(&self) -> impl Iterator<Item = &Worker> {
        self.workers.values()
    }

    /// Number of workers.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Task a worker is on.
    #[must_use]
    pub fn task_of(&self, unit: UnitId) -> Option<TaskId> {
        self.workers.get(&unit).and_then(|w| w.task)
    }

    /// Assist task currently helping a build task.
    #[must_use]
    pub fn assistance_for(&self, build: TaskId) -> Option<TaskId> {
        self.assistance.get(&build).copied()
    }

    /// Whether another task may be created: live tasks stay below
    /// `workers × tasks_per_worker`.
    #[must_use]
    pub fn can_enqueue_task(&self, config: &crate::config::AiConfig) -> bool {
        self.tasks.len() < self.workers.len().saturating_mul(config.tasks_per_worker)
    }

    /// Register a worker. It is assigned work on the next update.
    pub fn add_worker(&mut self, unit: UnitId, unit_type: UnitTypeId, tick: u64) {
        self.workers.entry(unit).or_insert(Worker {
            unit,
            unit_type,
            task: None,
            assigned_tick: tick,
            last_progress_tick: tick,
        });
        self.pending_idle.insert(unit);
    }

    /// Create a task and count its order with the controller.
    pub fn enqueue_task(&mut self, request: TaskRequest, ctx: &mut TaskContext<'_>) -> TaskId {
        if let TaskRequest::Build { unit_type, .. } | TaskRequest::Recruit { unit_type, .. } =
            request
        {
            ctx.controller.unit_requested(unit_type);
        }
        self.adopt_task(request, ctx)
    }

    /// Create a task for an order the controller already counted.
    pub fn adopt_task(&mut self, request: TaskRequest, ctx: &mut TaskContext<'_>) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        let task = Task::from_request(id, request, ctx);
        debug!(
            task = id.0,
            build_type = ?task.header().build_type,
            priority = ?task.header().priority,
            "Task created"
        );
        self.tasks.insert(id, task);
        self.update_queue.push_back(id);
        id
    }

    /// Abort a task and release everything it holds.
    pub fn abort_task(&mut self, id: TaskId, ctx: &mut TaskContext<'_>) {
        self.close_task(id, CloseReason::Aborted, ctx);
    }

    /// Close a task. Assignees become idle; helpers are released.
    pub fn close_task(&mut self, id: TaskId, reason: CloseReason, ctx: &mut TaskContext<'_>) {
        let Some(mut task) = self.tasks.remove(&id) else {
            return;
        };
        task.header_mut().state = TaskState::Closed(reason);
        task.close(reason, ctx);

        for unit in &task.header().assignees {
            if let Some(worker) = self.workers.get_mut(unit) {
                if worker.task == Some(id) {
                    worker.task = None;
                    self.pending_idle.insert(*unit);
                }
            }
        }
        self.unfinished.retain(|_, task| *task != id);
        self.assistance.retain(|_, helper| *helper != id);
        if let Some(helper) = self.assistance.remove(&id) {
            self.close_task(helper, CloseReason::Done, ctx);
        }

        debug!(
            task = id.0,
            ?reason,
            build_type = ?task.header().build_type,
            "Task closed"
        );
    }

    fn build_speed_of(&self, unit: UnitId, ctx: &TaskContext<'_>) -> f32 {
        self.workers
            .get(&unit)
            .and_then(|w| ctx.controller.tree().get(w.unit_type))
            .map_or(0.0, |p| p.build_speed)
    }

    /// Take `unit` off its task without closing the task.
    fn release_worker(&mut self, unit: UnitId, ctx: &TaskContext<'_>) -> Option<TaskId> {
        let build_speed = self.build_speed_of(unit, ctx);
        let worker = self.workers.get_mut(&unit)?;
        let id = worker.task.take()?;
        if let Some(task) = self.tasks.get_mut(&id) {
            task.header_mut().remove_assignee(unit, build_speed);
        }
        Some(id)
    }

    /// Put `unit` on task `id` and execute it.
    fn assign(&mut self, unit: UnitId, id: TaskId, ctx: &mut TaskContext<'_>) {
        let build_speed = self.build_speed_of(unit, ctx);
        let Some(task) = self.tasks.get_mut(&id) else {
            return;
        };
        task.assign(unit, build_speed);
        if let Some(worker) = self.workers.get_mut(&unit) {
            worker.task = Some(id);
            worker.assigned_tick = ctx.tick;
            worker.last_progress_tick = ctx.tick;
        }
        self.pending_idle.remove(&unit);
        trace!(unit = unit.0, task = id.0, "Worker assigned");

        let outcome = task.execute(unit, ctx);
        self.apply_outcome(id, outcome, ctx);
    }

    fn apply_outcome(&mut self, id: TaskId, outcome: TaskOutcome, ctx: &mut TaskContext<'_>) {
        match outcome {
            TaskOutcome::Continue => {}
            TaskOutcome::Done => self.close_task(id, CloseReason::Done, ctx),
            TaskOutcome::Abort => self.close_task(id, CloseReason::Aborted, ctx),
            TaskOutcome::Fallback(unit) => {
                self.close_task(id, CloseReason::Aborted, ctx);
                self.fallback_patrol(unit, ctx);
            }
            TaskOutcome::NeedsReplacement => {
                self.find_replacement(id, ctx);
            }
            TaskOutcome::Release(unit) => {
                self.release_worker(unit, ctx);
                self.pending_idle.insert(unit);
            }
        }
    }

    fn fallback_patrol(&mut self, unit: UnitId, ctx: &mut TaskContext<'_>) {
        let Some(worker) = self.workers.get(&unit) else {
            return;
        };
        let mobile = ctx
            .controller
            .tree()
            .get(worker.unit_type)
            .is_some_and(|p| !p.movement.is_static());
        let Some(snapshot) = ctx.host.unit(unit) else {
            return;
        };
        if !mobile {
            return;
        }
        let id = self.adopt_task(
            TaskRequest::Patrol {
                priority: Priority::Low,
                position: snapshot.position,
                timeout: ctx.config.patrol_timeout,
            },
            ctx,
        );
        self.assign(unit, id, ctx);
    }

    /// Path length, or straight-line distance times the fallback factor
    /// when the oracle has no answer.
    fn travel_distance(
        from: Vec2Fixed,
        to: Vec2Fixed,
        movement: MovementType,
        clearance: Fixed,
        ctx: &TaskContext<'_>,
    ) -> Fixed {
        let estimate = ctx.host.estimate_path_length(from, to, movement, clearance);
        if estimate > Fixed::ZERO {
            estimate
        } else {
            from.distance(to)
                .saturating_mul(Fixed::from_num(ctx.config.path_fallback_factor))
        }
    }

    /// A task with a live target is taken only while the target still
    /// misses more health than the task's current build power restores
    /// before the worker arrives. Otherwise the destination must be within
    /// `max_travel_seconds`.
    fn is_feasible(
        task: &Task,
        distance: Fixed,
        worker: &UnitTypeProperties,
        ctx: &TaskContext<'_>,
    ) -> bool {
        let distance: f32 = distance.to_num();
        let travel_seconds = if worker.max_speed > 0.0 {
            distance / worker.max_speed
        } else if distance <= worker.build_distance {
            0.0
        } else {
            f32::INFINITY
        };

        let header = task.header();
        let Some(target) = header.target.and_then(|t| ctx.host.unit(t)) else {
            return travel_seconds <= ctx.config.max_travel_seconds;
        };
        let cost = ctx
            .controller
            .tree()
            .get(target.unit_type)
            .map_or(0.0, |p| p.cost);
        if cost <= 0.0 {
            return travel_seconds <= ctx.config.max_travel_seconds;
        }
        let heal_rate = target.max_health * header.build_power / cost;
        target.missing_health() * ctx.config.repair_health_margin > heal_rate * travel_seconds
    }

    /// Best open task for `worker`: lowest metric, then most urgent, then
    /// lowest id.
    fn select_task(&self, worker: &Worker, ctx: &TaskContext<'_>) -> Option<TaskId> {
        let position = ctx.host.unit(worker.unit)?.position;
        let tree = ctx.controller.tree();
        let props = tree.get(worker.unit_type)?;
        let view = WorkerView {
            unit: worker.unit,
            props,
            can_build: tree.can_build(worker.unit_type),
        };
        let clearance = Fixed::from_num(props.build_distance);

        let mut best: Option<(Fixed, Priority, TaskId)> = None;
        for (&id, task) in &self.tasks {
            if !task.can_assign_to(&view, ctx.config) {
                continue;
            }
            let header = task.header();
            let destination = task.destination(&*ctx.host);
            let distance =
                Self::travel_distance(position, destination, props.movement, clearance, ctx);
            let metric = header.priority.scale_metric(distance);
            if let Some((best_metric, best_priority, _)) = best {
                if (metric, header.priority) >= (best_metric, best_priority) {
                    continue;
                }
            }
            if Self::is_feasible(task, distance, props, ctx) {
                best = Some((metric, header.priority, id));
            }
        }
        best.map(|(_, _, id)| id)
    }

    /// Give an idle worker the best open task, or ask `planner` for one.
    pub fn assign_task(
        &mut self,
        unit: UnitId,
        ctx: &mut TaskContext<'_>,
        planner: &mut dyn TaskPlanner,
    ) -> Option<TaskId> {
        let worker = *self.workers.get(&unit)?;
        if worker.task.is_some() {
            return worker.task;
        }

        let id = match self.select_task(&worker, ctx) {
            Some(id) => id,
            None => {
                let position = ctx.host.unit(unit)?.position;
                let request = planner.plan_task(unit, worker.unit_type, position)?;
                let id = self.enqueue_task(request, ctx);
                let tree = ctx.controller.tree();
                let accepted = tree.get(worker.unit_type).is_some_and(|props| {
                    let view = WorkerView {
                        unit,
                        props,
                        can_build: tree.can_build(worker.unit_type),
                    };
                    self.tasks
                        .get(&id)
                        .is_some_and(|t| t.can_assign_to(&view, ctx.config))
                });
                if !accepted {
                    debug!(unit = unit.0, task = id.0, "Planned task does not fit its worker");
                    self.close_task(id, CloseReason::Aborted, ctx);
                    self.fallback_patrol(unit, ctx);
                    return self.task_of(unit);
                }
                id
            }
        };
        self.assign(unit, id, ctx);
        self.task_of(unit)
    }

    /// Closest available worker within `replacement_search_radius` takes
    /// over a task that lost its builder. Workers on filler tasks count
    /// as available.
    pub fn find_replacement(&mut self, id: TaskId, ctx: &mut TaskContext<'_>) -> Option<UnitId> {
        let task = self.tasks.get(&id)?;
        let destination = task.destination(&*ctx.host);
        let radius = Fixed::from_num(ctx.config.replacement_search_radius);
        let tree = ctx.controller.tree();

        let mut best: Option<(Fixed, UnitId)> = None;
        for (&unit, worker) in &self.workers {
            if worker.task == Some(id) || !self.is_available(worker) {
                continue;
            }
            let Some(props) = tree.get(worker.unit_type) else {
                continue;
            };
            let view = WorkerView {
                unit,
                props,
                can_build: tree.can_build(worker.unit_type),
            };
            if !task.can_assign_to(&view, ctx.config) {
                continue;
            }
            let Some(snapshot) = ctx.host.unit(unit) else {
                continue;
            };
            let distance = snapshot.position.distance(destination);
            if distance <= radius && best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, unit));
            }
        }

        let Some((_, unit)) = best else {
            debug!(task = id.0, "No replacement builder nearby");
            return None;
        };
        info!(task = id.0, unit = unit.0, "Replacement builder found");
        self.take_off_filler_task(unit, ctx);
        self.assign(unit, id, ctx);
        Some(unit)
    }

    /// Idle, or on a task any other work may interrupt.
    fn is_available(&self, worker: &Worker) -> bool {
        worker.task.map_or(true, |t| {
            matches!(
                self.tasks.get(&t),
                None | Some(Task::Patrol(_) | Task::Reclaim(_) | Task::Assist(_))
            )
        })
    }

    fn take_off_filler_task(&mut self, unit: UnitId, ctx: &mut TaskContext<'_>) {
        let Some(old) = self.release_worker(unit, ctx) else {
            return;
        };
        let single_worker = matches!(
            self.tasks.get(&old),
            Some(Task::Patrol(_) | Task::Reclaim(_))
        );
        if single_worker {
            self.close_task(old, CloseReason::Done, ctx);
        }
    }

    /// Pair helpers with a long construction.
    ///
    /// Applies to build tasks whose target is under construction and whose
    /// `build_time / build_power` exceeds `min_assistance_buildtime`. Helpers
    /// share one assist task, capped at `max_assistants`; it closes with the
    /// build task. Returns the number of helpers added.
    pub fn check_assistance(&mut self, id: TaskId, ctx: &mut TaskContext<'_>) -> usize {
        let Some(task) = self.tasks.get(&id).filter(|t| matches!(t, Task::Build(_))) else {
            return 0;
        };
        let header = task.header();
        let Some(target) = header.target.and_then(|t| ctx.host.unit(t)) else {
            return 0;
        };
        if !target.being_built || header.build_power <= 0.0 {
            return 0;
        }
        let tree = ctx.controller.tree();
        let build_time = tree.get(header.unit_type).map_or(0.0, |p| p.build_time);
        if build_time / header.build_power <= ctx.config.min_assistance_buildtime {
            return 0;
        }

        let current = self
            .assistance
            .get(&id)
            .and_then(|a| self.tasks.get(a))
            .map_or(0, |a| a.header().assignees.len());
        let wanted = ctx.config.max_assistants.saturating_sub(current);
        if wanted == 0 {
            return 0;
        }

        let radius = Fixed::from_num(ctx.config.replacement_search_radius);
        let mut candidates: Vec<(Fixed, UnitId)> = self
            .workers
            .values()
            .filter(|w| !header.has_assignee(w.unit) && self.is_available(w))
            .filter(|w| w.task.is_none() || w.task != self.assistance.get(&id).copied())
            .filter_map(|w| {
                let props = tree.get(w.unit_type)?;
                if !props.is_builder() && !props.is_assister() {
                    return None;
                }
                let distance = ctx.host.unit(w.unit)?.position.distance(target.position);
                let reach = if props.movement.is_static() {
                    Fixed::from_num(props.build_distance)
                } else {
                    radius
                };
                (distance <= reach).then_some((distance, w.unit))
            })
            .collect();
        candidates.sort();
        candidates.truncate(wanted);
        if candidates.is_empty() {
            return 0;
        }

        let priority = header.priority;
        let assist = match self.assistance.get(&id) {
            Some(&assist) => assist,
            None => {
                let assist = self.adopt_task(
                    TaskRequest::Assist {
                        priority,
                        target: Some(AssistTarget::Repair(target.id)),
                        position: target.position,
                    },
                    ctx,
                );
                self.assistance.insert(id, assist);
                assist
            }
        };
        for &(_, helper) in &candidates {
            self.take_off_filler_task(helper, ctx);
            self.assign(helper, assist, ctx);
        }
        debug!(task = id.0, helpers = candidates.len(), "Assistance added");
        candidates.len()
    }

    /// A unit under construction appeared. If `builder` is working on a
    /// matching task, the unit becomes that task's target.
    pub fn on_unit_created(
        &mut self,
        unit: UnitId,
        unit_type: UnitTypeId,
        builder: Option<UnitId>,
        ctx: &mut TaskContext<'_>,
    ) -> Option<TaskId> {
        let builder = builder?;
        let id = self.workers.get(&builder)?.task?;
        let task = self.tasks.get_mut(&id)?;
        if !matches!(task, Task::Build(_) | Task::Recruit(_)) || !task.bind_target(unit, unit_type) {
            return None;
        }
        self.unfinished.insert(unit, id);
        if let Some(worker) = self.workers.get_mut(&builder) {
            worker.last_progress_tick = ctx.tick;
        }
        trace!(task = id.0, unit = unit.0, "Construction started");
        Some(id)
    }

    /// A unit finished construction. Closes the task that built it.
    pub fn on_unit_finished(&mut self, unit: UnitId, ctx: &mut TaskContext<'_>) -> bool {
        let Some(id) = self.unfinished.remove(&unit) else {
            return false;
        };
        self.close_task(id, CloseReason::Done, ctx);
        true
    }

    /// A worker ran out of orders.
    pub fn on_unit_idle(
        &mut self,
        unit: UnitId,
        ctx: &mut TaskContext<'_>,
        planner: &mut dyn TaskPlanner,
    ) {
        let Some(worker) = self.workers.get(&unit).copied() else {
            return;
        };
        if let Some(id) = worker.task {
            match self.tasks.get_mut(&id) {
                Some(task) => {
                    let outcome = task.on_unit_idle(unit, ctx);
                    self.apply_outcome(id, outcome, ctx);
                }
                None => {
                    if let Some(worker) = self.workers.get_mut(&unit) {
                        worker.task = None;
                    }
                }
            }
        }
        if self.task_of(unit).is_none() {
            self.assign_task(unit, ctx, planner);
        }
    }

    /// A unit was destroyed: drop it as worker and as target.
    pub fn on_unit_destroyed(&mut self, unit: UnitId, ctx: &mut TaskContext<'_>) {
        self.unfinished.remove(&unit);
        let targeting: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.header().target == Some(unit))
            .map(|(&id, _)| id)
            .collect();
        for id in targeting {
            if let Some(task) = self.tasks.get_mut(&id) {
                let outcome = task.on_unit_destroyed(unit, ctx);
                self.apply_outcome(id, outcome, ctx);
            }
        }

        self.pending_idle.remove(&unit);
        let build_speed = self.build_speed_of(unit, ctx);
        let Some(worker) = self.workers.remove(&unit) else {
            return;
        };
        let Some(id) = worker.task else {
            return;
        };
        if let Some(task) = self.tasks.get_mut(&id) {
            task.header_mut().remove_assignee(unit, build_speed);
            let outcome = task.on_unit_destroyed(unit, ctx);
            self.apply_outcome(id, outcome, ctx);
        }
    }

    /// Assign idle workers, then re-evaluate one slice of tasks.
    pub fn update(&mut self, ctx: &mut TaskContext<'_>, planner: &mut dyn TaskPlanner) {
        let idle = std::mem::take(&mut self.pending_idle);
        for unit in idle {
            if self.task_of(unit).is_none() {
                self.assign_task(unit, ctx, planner);
            }
        }

        if self.update_queue.is_empty() {
            self.update_queue.extend(self.tasks.keys().copied());
        }
        let slice = ctx.config.update_slice(self.tasks.len());
        for _ in 0..slice {
            let Some(id) = self.update_queue.pop_front() else {
                break;
            };
            let Some(task) = self.tasks.get_mut(&id) else {
                continue;
            };
            let outcome = task.update(ctx);
            self.apply_outcome(id, outcome, ctx);
            if self.tasks.contains_key(&id) {
                self.check_assistance(id, ctx);
            }
        }
    }

    /// Periodic cleanup: expire filler tasks, nudge stuck workers, requeue
    /// idle ones and adopt constructions nobody works on.
    pub fn watchdog(&mut self, ctx: &mut TaskContext<'_>) {
        let expired: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|(_, task)| {
                let header = task.header();
                matches!(task, Task::Patrol(_) | Task::Reclaim(_))
                    && header.timeout > 0
                    && ctx.tick.saturating_sub(header.created_tick) > u64::from(header.timeout)
            })
            .map(|(&id, _)| id)
            .collect();
        for id in expired {
            debug!(task = id.0, "Filler task expired");
            self.close_task(id, CloseReason::Done, ctx);
        }

        let stuck_timeout = u64::from(ctx.config.stuck_timeout);
        let mut stuck = Vec::new();
        for worker in self.workers.values() {
            let Some(id) = worker.task else {
                self.pending_idle.insert(worker.unit);
                continue;
            };
            let waiting_to_start = self.tasks.get(&id).is_some_and(|task| {
                let header = task.header();
                header.build_type.is_structure() && header.target.is_none()
            });
            if waiting_to_start && ctx.tick.saturating_sub(worker.last_progress_tick) > stuck_timeout
            {
                stuck.push(worker.unit);
            }
        }
        let step = Fixed::from_num(ctx.config.stuck_move_distance);
        for unit in stuck {
            let Some(snapshot) = ctx.host.unit(unit) else {
                continue;
            };
            let to = step_toward_center(snapshot.position, ctx.host.map_size(), step);
            ctx.host.issue(unit, Order::MoveTo(to));
            if let Some(worker) = self.workers.get_mut(&unit) {
                worker.last_progress_tick = ctx.tick;
            }
            info!(unit = unit.0, "Nudged stuck worker");
        }

        self.adopt_abandoned(ctx);
    }

    fn adopt_abandoned(&mut self, ctx: &mut TaskContext<'_>) {
        let size = ctx.host.map_size();
        let two = Fixed::from_num(2);
        let center = Vec2Fixed::new(size.x / two, size.y / two);
        let radius = size.x.max(size.y);
        let tree = ctx.controller.tree();

        let abandoned: Vec<_> = ctx
            .host
            .friendly_units_in(center, radius)
            .into_iter()
            .filter(|u| u.owned && u.being_built && !self.unfinished.contains_key(&u.id))
            .filter(|u| tree.get(u.unit_type).is_some_and(|p| p.movement.is_static()))
            .filter(|u| !self.tasks.values().any(|t| t.header().target == Some(u.id)))
            .collect();

        for unit in abandoned {
            let id = self.adopt_task(
                TaskRequest::Assist {
                    priority: Priority::Normal,
                    target: Some(AssistTarget::Repair(unit.id)),
                    position: unit.position,
                },
                ctx,
            );
            self.unfinished.insert(unit.id, id);
            info!(unit = unit.id.0, task = id.0, "Adopted abandoned construction");
        }
    }
}
