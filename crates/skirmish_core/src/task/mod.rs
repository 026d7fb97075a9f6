//! Units of work handed to builders, assisters and factories.
//!
//! Every task is one variant of the closed [`Task`] enum. Each variant
//! implements [`UnitTask`], the small interface the scheduler in
//! [`store`] depends on. The scheduler never matches on the variant.
//!
//! Lifecycle: `Open` → `InProgress` → `Closed(Done | Aborted)`. A closed
//! task leaves the store immediately and never reopens.

mod assist;
mod build;
mod patrol;
mod reclaim;
mod recruit;
pub mod store;

pub use assist::{AssistTarget, AssistTask};
pub use build::BuildTask;
pub use patrol::PatrolTask;
pub use reclaim::ReclaimTask;
pub use recruit::RecruitTask;
pub use store::{TaskStore, Worker};

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::construction::ConstructionOrderController;
use crate::math::{Fixed, Vec2Fixed};
use crate::oracle::{Facing, Host, UnitId};
use crate::registry::UnitTypeProperties;
use crate::unit_kind::UnitTypeId;

/// Stable handle of a task. Never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u32);

/// Urgency of a task. Earlier variants are dispatched first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Needed right now.
    Urgent,
    /// Needed soon.
    High,
    /// Regular work.
    #[default]
    Normal,
    /// Filler work.
    Low,
}

impl Priority {
    /// Position in the ordering, 0 for [`Priority::Urgent`].
    #[must_use]
    pub const fn rank(self) -> u32 {
        self as u32
    }

    /// `1 / (rank + 1)`.
    #[must_use]
    pub fn weight(self) -> f32 {
        1.0 / (self.rank() as f32 + 1.0)
    }

    /// Divide a travel distance by [`weight`](Self::weight), exactly.
    #[must_use]
    pub fn scale_metric(self, distance: Fixed) -> Fixed {
        distance.saturating_mul(Fixed::from_num(self.rank() + 1))
    }
}

/// Why a task closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    /// Fulfilled.
    Done,
    /// Target or assignee lost, or superseded.
    Aborted,
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Accepting assignees.
    #[default]
    Open,
    /// At least one assignee is working on it.
    InProgress,
    /// Terminal.
    Closed(CloseReason),
}

/// What a task builds or does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildType {
    /// Static producer.
    Factory,
    /// Static assister next to a factory.
    Nano,
    /// Resource storage.
    Storage,
    /// Energy grid link.
    Pylon,
    /// Power plant.
    Energy,
    /// Static defence.
    Defence,
    /// Heavily armored defence.
    Bunker,
    /// Static artillery.
    BigGun,
    /// Radar.
    Radar,
    /// Sonar.
    Sonar,
    /// Extractor on a new spot.
    Expand,
    /// Extractor.
    Mex,
    /// Help another unit.
    Assist,
    /// Reclaim wrecks and features.
    Reclaim,
    /// Walk around.
    Patrol,
    /// Repair a damaged unit.
    Repair,
    /// Mobile unit from a factory.
    Recruit,
}

impl BuildType {
    /// Whether the task places a building and therefore a blocker.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        !matches!(
            self,
            Self::Assist | Self::Reclaim | Self::Patrol | Self::Repair | Self::Recruit
        )
    }
}

/// Description of a task to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskRequest {
    /// Construct a building.
    Build {
        /// Urgency.
        priority: Priority,
        /// Kind of building.
        build_type: BuildType,
        /// Type to construct.
        unit_type: UnitTypeId,
        /// Where to look for a site.
        position: Vec2Fixed,
    },
    /// Repair or assist a unit. Without target the assignee searches one.
    Assist {
        /// Urgency.
        priority: Priority,
        /// What to help.
        target: Option<AssistTarget>,
        /// Area of interest.
        position: Vec2Fixed,
    },
    /// Reclaim an area.
    Reclaim {
        /// Urgency.
        priority: Priority,
        /// Center of the area.
        position: Vec2Fixed,
        /// Radius of the area.
        #[serde(with = "crate::math::fixed_serde")]
        radius: Fixed,
        /// Expiry in ticks after creation, 0 for none.
        timeout: u32,
    },
    /// Patrol near a position.
    Patrol {
        /// Urgency.
        priority: Priority,
        /// Starting point.
        position: Vec2Fixed,
        /// Expiry in ticks after creation, 0 for none.
        timeout: u32,
    },
    /// Produce a mobile unit at a factory.
    Recruit {
        /// Urgency.
        priority: Priority,
        /// Type to produce.
        unit_type: UnitTypeId,
        /// Location of the factory.
        position: Vec2Fixed,
    },
}

/// Fields shared by every task variant.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskHeader {
    /// Handle.
    pub id: TaskId,
    /// Urgency.
    pub priority: Priority,
    /// Kind of work.
    pub build_type: BuildType,
    /// Type being built, [`UnitTypeId::NONE`] for non-construction work.
    pub unit_type: UnitTypeId,
    /// Area the task refers to.
    pub position: Vec2Fixed,
    /// Reserved build site; `None` while unresolved.
    pub build_site: Option<Vec2Fixed>,
    /// Orientation of the reserved site.
    pub facing: Facing,
    /// Unit worked on. May die at any time; check liveness through the host.
    pub target: Option<UnitId>,
    /// Cost of the target type.
    pub cost: f32,
    /// Combined build speed of the assignees.
    pub build_power: f32,
    /// Expiry in ticks after creation, 0 for none.
    pub timeout: u32,
    /// Tick the task was created.
    pub created_tick: u64,
    /// Units working on the task. Not owned.
    pub assignees: Vec<UnitId>,
    /// Lifecycle state.
    pub state: TaskState,
}

impl TaskHeader {
    /// A fresh open header.
    #[must_use]
    pub fn new(
        id: TaskId,
        priority: Priority,
        build_type: BuildType,
        unit_type: UnitTypeId,
        position: Vec2Fixed,
        created_tick: u64,
    ) -> Self {
        Self {
            id,
            priority,
            build_type,
            unit_type,
            position,
            build_site: None,
            facing: Facing::Any,
            target: None,
            cost: 0.0,
            build_power: 0.0,
            timeout: 0,
            created_tick,
            assignees: Vec::new(),
            state: TaskState::Open,
        }
    }

    /// Whether the task is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, TaskState::Closed(_))
    }

    /// Whether `unit` is assigned.
    #[must_use]
    pub fn has_assignee(&self, unit: UnitId) -> bool {
        self.assignees.contains(&unit)
    }

    /// Remove an assignee. Falls back to `Open` when none are left.
    pub fn remove_assignee(&mut self, unit: UnitId, build_speed: f32) -> bool {
        let before = self.assignees.len();
        self.assignees.retain(|&a| a != unit);
        let removed = self.assignees.len() != before;
        if removed {
            self.build_power = (self.build_power - build_speed).max(0.0);
            if self.assignees.is_empty() && self.state == TaskState::InProgress {
                self.state = TaskState::Open;
            }
        }
        removed
    }

    fn add_assignee(&mut self, unit: UnitId, build_speed: f32) {
        if !self.has_assignee(unit) {
            self.assignees.push(unit);
            self.build_power += build_speed;
        }
        if !self.is_closed() {
            self.state = TaskState::InProgress;
        }
    }
}

/// A worker as seen by [`UnitTask::can_assign_to`].
#[derive(Debug, Clone, Copy)]
pub struct WorkerView<'a> {
    /// Handle.
    pub unit: UnitId,
    /// Type properties.
    pub props: &'a UnitTypeProperties,
    /// Types it can construct.
    pub can_build: &'a [UnitTypeId],
}

/// Everything a task may touch while running.
pub struct TaskContext<'a> {
    /// Host simulation.
    pub host: &'a mut dyn Host,
    /// Construction counters and queues.
    pub controller: &'a mut ConstructionOrderController,
    /// Limits.
    pub config: &'a AiConfig,
    /// Current tick.
    pub tick: u64,
}

impl std::fmt::Debug for TaskContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext").field("tick", &self.tick).finish_non_exhaustive()
    }
}

/// What the store should do after a task handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Nothing further.
    Continue,
    /// Close as done.
    Done,
    /// Close as aborted.
    Abort,
    /// The worker could not carry out the task: abort it and give the
    /// worker a short patrol.
    Fallback(UnitId),
    /// The builder was lost before finishing: look for a replacement.
    NeedsReplacement,
    /// Drop the worker from the task; the task stays.
    Release(UnitId),
}

/// Capability interface shared by all task variants.
pub trait UnitTask {
    /// Shared fields.
    fn header(&self) -> &TaskHeader;

    /// Shared fields, mutable.
    fn header_mut(&mut self) -> &mut TaskHeader;

    /// Whether `worker` may take this task right now.
    fn can_assign_to(&self, worker: &WorkerView<'_>, config: &AiConfig) -> bool;

    /// Give `worker` its orders.
    fn execute(&mut self, worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome;

    /// `worker` ran out of orders.
    fn on_unit_idle(&mut self, worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome;

    /// `unit` (an assignee or the target) was destroyed.
    fn on_unit_destroyed(&mut self, unit: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome;

    /// Periodic re-evaluation.
    fn update(&mut self, ctx: &mut TaskContext<'_>) -> TaskOutcome;

    /// Release reservations. Called once, right before removal.
    fn close(&mut self, reason: CloseReason, ctx: &mut TaskContext<'_>);

    /// Where assignees have to go.
    fn destination(&self, host: &dyn Host) -> Vec2Fixed {
        let header = self.header();
        header
            .target
            .and_then(|t| host.unit(t))
            .map(|u| u.position)
            .or(header.build_site)
            .unwrap_or(header.position)
    }
}

/// The closed set of task variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Construct a building.
    Build(BuildTask),
    /// Repair or assist.
    Assist(AssistTask),
    /// Reclaim an area.
    Reclaim(ReclaimTask),
    /// Patrol.
    Patrol(PatrolTask),
    /// Factory production.
    Recruit(RecruitTask),
}

macro_rules! delegate {
    ($self:ident, $task:ident => $call:expr) => {
        match $self {
            Task::Build($task) => $call,
            Task::Assist($task) => $call,
            Task::Reclaim($task) => $call,
            Task::Patrol($task) => $call,
            Task::Recruit($task) => $call,
        }
    };
}

impl UnitTask for Task {
    fn header(&self) -> &TaskHeader {
        delegate!(self, t => t.header())
    }

    fn header_mut(&mut self) -> &mut TaskHeader {
        delegate!(self, t => t.header_mut())
    }

    fn can_assign_to(&self, worker: &WorkerView<'_>, config: &AiConfig) -> bool {
        delegate!(self, t => t.can_assign_to(worker, config))
    }

    fn execute(&mut self, worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        delegate!(self, t => t.execute(worker, ctx))
    }

    fn on_unit_idle(&mut self, worker: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        delegate!(self, t => t.on_unit_idle(worker, ctx))
    }

    fn on_unit_destroyed(&mut self, unit: UnitId, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        delegate!(self, t => t.on_unit_destroyed(unit, ctx))
    }

    fn update(&mut self, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        delegate!(self, t => t.update(ctx))
    }

    fn close(&mut self, reason: CloseReason, ctx: &mut TaskContext<'_>) {
        delegate!(self, t => t.close(reason, ctx));
    }
}

impl Task {
    /// Build the task described by `request`.
    #[must_use]
    pub fn from_request(id: TaskId, request: TaskRequest, ctx: &TaskContext<'_>) -> Self {
        let cost_of = |unit_type: UnitTypeId| ctx.controller.tree().get(unit_type).map_or(0.0, |p| p.cost);
        match request {
            TaskRequest::Build {
                priority,
                build_type,
                unit_type,
                position,
            } => {
                let mut header =
                    TaskHeader::new(id, priority, build_type, unit_type, position, ctx.tick);
                header.cost = cost_of(unit_type);
                Self::Build(BuildTask::new(header))
            }
            TaskRequest::Assist {
                priority,
                target,
                position,
            } => {
                let header = TaskHeader::new(
                    id,
                    priority,
                    BuildType::Assist,
                    UnitTypeId::NONE,
                    position,
                    ctx.tick,
                );
                Self::Assist(AssistTask::new(header, target))
            }
            TaskRequest::Reclaim {
                priority,
                position,
                radius,
                timeout,
            } => {
                let mut header = TaskHeader::new(
                    id,
                    priority,
                    BuildType::Reclaim,
                    UnitTypeId::NONE,
                    position,
                    ctx.tick,
                );
                header.timeout = timeout;
                Self::Reclaim(ReclaimTask::new(header, radius))
            }
            TaskRequest::Patrol {
                priority,
                position,
                timeout,
            } => {
                let mut header = TaskHeader::new(
                    id,
                    priority,
                    BuildType::Patrol,
                    UnitTypeId::NONE,
                    position,
                    ctx.tick,
                );
                header.timeout = timeout;
                Self::Patrol(PatrolTask::new(header))
            }
            TaskRequest::Recruit {
                priority,
                unit_type,
                position,
            } => {
                let mut header = TaskHeader::new(
                    id,
                    priority,
                    BuildType::Recruit,
                    unit_type,
                    position,
                    ctx.tick,
                );
                header.cost = cost_of(unit_type);
                Self::Recruit(RecruitTask::new(header))
            }
        }
    }

    /// Record `unit` as assignee.
    pub(crate) fn assign(&mut self, unit: UnitId, build_speed: f32) {
        self.header_mut().add_assignee(unit, build_speed);
    }

    /// Bind a freshly created unit as target. Returns false if the task
    /// already has one or builds another type.
    pub fn bind_target(&mut self, unit: UnitId, unit_type: UnitTypeId) -> bool {
        let header = self.header_mut();
        if header.target.is_some() || header.unit_type != unit_type {
            return false;
        }
        header.target = Some(unit);
        true
    }
}
