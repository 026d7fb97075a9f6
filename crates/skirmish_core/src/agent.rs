//! One agent instance: the entry point for the host.
//!
//! [`SkirmishAgent`] joins the process-wide [`SharedKnowledge`], owns its
//! own counters, task store and target list, and turns host events into
//! calls on those parts. The host passes itself in on every call; the
//! agent holds no reference to it between calls.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use crate::air_force::{groups_for_health, AirTarget, AirTargetList};
use crate::config::AiConfig;
use crate::construction::ConstructionOrderController;
use crate::error::Result;
use crate::factions::FactionId;
use crate::knowledge::SharedKnowledge;
use crate::learning::{AttackedByRates, GamePhase, GamePhaseRates, MapType};
use crate::math::Vec2Fixed;
use crate::oracle::{Host, TaskPlanner, UnitId, UnitSnapshot};
use crate::rating::{self, CombatUnitCriteria};
use crate::task::{
    AssistTarget, BuildType, Priority, TaskContext, TaskId, TaskRequest, TaskStore, UnitTask,
};
use crate::unit_kind::{TargetType, TargetTypeValues, UnitTypeId};

/// Decision core of one player.
#[derive(Debug)]
pub struct SkirmishAgent {
    knowledge: Arc<SharedKnowledge>,
    config: AiConfig,
    controller: ConstructionOrderController,
    tasks: TaskStore,
    air_targets: AirTargetList,
    rng: ChaCha8Rng,
    map_type: MapType,
    attacked_by: AttackedByRates,
    observed: GamePhaseRates,
    base: Vec2Fixed,
    tick: u64,
    last_watchdog: u64,
}

impl SkirmishAgent {
    /// Join the shared knowledge and set up an agent for `faction`.
    ///
    /// # Errors
    /// Returns an error if the shared unit tables cannot be built.
    pub fn join(
        knowledge: Arc<SharedKnowledge>,
        faction: FactionId,
        config: AiConfig,
        map_type: MapType,
        seed: u64,
    ) -> Result<Self> {
        let view = knowledge.join()?;
        let controller = ConstructionOrderController::new(view.tree(), faction, &config);
        info!(faction = ?faction, ?map_type, "Agent joined");
        Ok(Self {
            air_targets: AirTargetList::new(config.max_air_targets),
            attacked_by: view.attacked_by_rates(),
            knowledge,
            config,
            controller,
            tasks: TaskStore::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            map_type,
            observed: GamePhaseRates::default(),
            base: Vec2Fixed::ZERO,
            tick: 0,
            last_watchdog: 0,
        })
    }

    /// Leave the shared knowledge, contributing the rates observed in this game.
    ///
    /// # Errors
    /// Returns an error if this was the last agent and saving learned data failed.
    pub fn leave(self) -> Result<()> {
        info!(tick = self.tick, "Agent leaving");
        self.knowledge
            .leave(self.map_type, self.game_phase(), &self.observed)
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Construction counters and queues.
    #[must_use]
    pub fn controller(&self) -> &ConstructionOrderController {
        &self.controller
    }

    /// Construction counters and queues, mutable.
    pub fn controller_mut(&mut self) -> &mut ConstructionOrderController {
        &mut self.controller
    }

    /// Tasks and workers.
    #[must_use]
    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    /// Bombing targets.
    #[must_use]
    pub fn air_targets(&self) -> &AirTargetList {
        &self.air_targets
    }

    /// Attacks suffered so far this game, per phase and attacker type.
    #[must_use]
    pub fn observed_rates(&self) -> &GamePhaseRates {
        &self.observed
    }

    /// Last tick seen.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current game phase.
    #[must_use]
    pub fn game_phase(&self) -> GamePhase {
        GamePhase::from_tick(self.tick, self.config.ticks_per_second)
    }

    /// Where new static producers are placed.
    #[must_use]
    pub fn base_position(&self) -> Vec2Fixed {
        self.base
    }

    /// Move the base.
    pub fn set_base_position(&mut self, position: Vec2Fixed) {
        self.base = position;
    }

    /// Combat power weights from learned attacked-by rates.
    #[must_use]
    pub fn combat_power_weights(&self) -> TargetTypeValues {
        rating::determine_combat_power_weights(&self.attacked_by, self.map_type)
    }

    fn split<'a>(&'a mut self, host: &'a mut dyn Host) -> (&'a mut TaskStore, TaskContext<'a>) {
        (
            &mut self.tasks,
            TaskContext {
                host,
                controller: &mut self.controller,
                config: &self.config,
                tick: self.tick,
            },
        )
    }

    fn is_worker(&self, unit_type: UnitTypeId) -> bool {
        self.controller
            .tree()
            .get(unit_type)
            .is_some_and(|p| p.is_builder() || p.is_assister() || p.is_factory())
    }

    /// Create a task and count its order.
    pub fn enqueue_task(&mut self, host: &mut dyn Host, request: TaskRequest) -> TaskId {
        let (tasks, mut ctx) = self.split(host);
        tasks.enqueue_task(request, &mut ctx)
    }

    /// Pick a combat unit with the agent's own random source and learned weights.
    pub fn select_combat_unit(
        &mut self,
        target_type: TargetType,
        criteria: &CombatUnitCriteria,
        factory_utilization: &[f32],
        randomness: u32,
    ) -> UnitTypeId {
        let weights = self.combat_power_weights();
        self.controller.select_combat_unit(
            target_type,
            &weights,
            criteria,
            factory_utilization,
            randomness,
            &mut self.rng,
        )
    }

    /// A unit present at game start appeared.
    pub fn on_unit_spawned(&mut self, host: &mut dyn Host, unit: UnitId) {
        let Some(snapshot) = host.unit(unit) else {
            return;
        };
        self.controller.unit_spawned(snapshot.unit_type);
        if self.tasks.worker_count() == 0 {
            self.base = snapshot.position;
        }
        if self.is_worker(snapshot.unit_type) {
            self.tasks.add_worker(unit, snapshot.unit_type, self.tick);
        }
    }

    /// Construction of an own unit began.
    pub fn on_unit_created(&mut self, host: &mut dyn Host, unit: UnitId, builder: Option<UnitId>) {
        let Some(snapshot) = host.unit(unit).filter(|u| u.owned) else {
            return;
        };
        self.controller.unit_created(snapshot.unit_type);
        let (tasks, mut ctx) = self.split(host);
        tasks.on_unit_created(unit, snapshot.unit_type, builder, &mut ctx);
    }

    /// Construction of an own unit finished.
    pub fn on_unit_finished(&mut self, host: &mut dyn Host, unit: UnitId) {
        let Some(snapshot) = host.unit(unit).filter(|u| u.owned) else {
            return;
        };
        self.controller.unit_finished(snapshot.unit_type);
        {
            let (tasks, mut ctx) = self.split(host);
            tasks.on_unit_finished(unit, &mut ctx);
        }
        if self.is_worker(snapshot.unit_type) {
            self.tasks.add_worker(unit, snapshot.unit_type, self.tick);
        }
    }

    /// An own unit ran out of orders.
    ///
    /// Idle factories without work take the next unit of their build queue.
    pub fn on_unit_idle(
        &mut self,
        host: &mut dyn Host,
        planner: &mut dyn TaskPlanner,
        unit: UnitId,
    ) {
        {
            let (tasks, mut ctx) = self.split(host);
            tasks.on_unit_idle(unit, &mut ctx, planner);
        }
        if self.tasks.worker(unit).map_or(true, |w| w.task.is_some()) {
            return;
        }
        let Some(snapshot) = host.unit(unit) else {
            return;
        };
        let is_factory = self
            .controller
            .tree()
            .get(snapshot.unit_type)
            .is_some_and(|p| p.is_factory());
        if !is_factory {
            return;
        }
        let Some(next) = self.controller.take_next(snapshot.unit_type) else {
            return;
        };
        let (tasks, mut ctx) = self.split(host);
        let id = tasks.adopt_task(
            TaskRequest::Recruit {
                priority: Priority::Normal,
                unit_type: next,
                position: snapshot.position,
            },
            &mut ctx,
        );
        if tasks.assign_task(unit, &mut ctx, planner) != Some(id) {
            debug!(factory = unit.0, task = id.0, "Recruit left open");
        }
    }

    /// A unit was damaged.
    ///
    /// Own units record the attacker's type for learning. Damaged own
    /// buildings nobody looks after get a repair task.
    pub fn on_unit_damaged(&mut self, host: &mut dyn Host, unit: UnitId, attacker: Option<UnitId>) {
        let Some(snapshot) = host.unit(unit) else {
            return;
        };
        if !snapshot.owned {
            self.air_targets.update_health(unit, snapshot.health);
            return;
        }

        let phase = self.game_phase();
        let tree = self.controller.tree();
        if let Some(attacker_type) = attacker
            .and_then(|a| host.unit(a))
            .filter(|a| !a.owned)
            .and_then(|a| tree.get(a.unit_type))
            .map(|p| p.movement.target_type())
        {
            self.observed.record_attack(phase, attacker_type);
        }

        let is_building = tree
            .get(snapshot.unit_type)
            .is_some_and(|p| p.movement.is_static());
        let looked_after = self
            .tasks
            .tasks()
            .any(|(_, t)| t.header().target == Some(unit));
        if is_building
            && !snapshot.being_built
            && !looked_after
            && self.tasks.can_enqueue_task(&self.config)
        {
            trace!(unit = unit.0, "Repair requested");
            let (tasks, mut ctx) = self.split(host);
            tasks.adopt_task(
                TaskRequest::Assist {
                    priority: Priority::High,
                    target: Some(AssistTarget::Repair(unit)),
                    position: snapshot.position,
                },
                &mut ctx,
            );
        }
    }

    /// A unit was destroyed. `destroyed` is its last known state.
    pub fn on_unit_destroyed(&mut self, host: &mut dyn Host, destroyed: &UnitSnapshot) {
        if !destroyed.owned {
            self.air_targets.remove_target(destroyed.id);
            return;
        }
        if destroyed.being_built {
            self.controller
                .unit_under_construction_killed(destroyed.unit_type);
        } else {
            self.controller.active_unit_killed(destroyed.unit_type);
        }
        let (tasks, mut ctx) = self.split(host);
        tasks.on_unit_destroyed(destroyed.id, &mut ctx);
    }

    /// An enemy unit was seen. Static ones become bombing candidates.
    pub fn on_enemy_sighted(&mut self, host: &mut dyn Host, unit: UnitId) -> bool {
        let Some(snapshot) = host.unit(unit) else {
            return false;
        };
        let Some(props) = self.controller.tree().get(snapshot.unit_type) else {
            return false;
        };
        if !props.movement.is_static() {
            return false;
        }
        let cost = props.cost;
        self.air_targets.check_bomb_target(&snapshot, cost, &*host)
    }

    /// Take the best bombing target and the number of groups to send.
    pub fn bomb_best_target<F>(
        &mut self,
        cost_exponent: f32,
        danger: f32,
        enemy_air_power: F,
    ) -> Option<(AirTarget, u32)>
    where
        F: Fn(Vec2Fixed) -> f32,
    {
        let target = self
            .air_targets
            .best_target(cost_exponent, danger, enemy_air_power)?;
        Some((target, groups_for_health(target.health)))
    }

    /// Advance to `tick`: turn producer requests into build tasks, update a
    /// slice of tasks and run the watchdog when due.
    pub fn update(&mut self, host: &mut dyn Host, planner: &mut dyn TaskPlanner, tick: u64) {
        self.tick = tick;
        let base = self.base;
        let last_watchdog = self.last_watchdog;
        let watchdog_interval = self.config.watchdog_interval;
        let (tasks, mut ctx) = self.split(host);

        while let Some(factory) = ctx.controller.next_factory_request() {
            let id = tasks.adopt_task(
                TaskRequest::Build {
                    priority: Priority::High,
                    build_type: BuildType::Factory,
                    unit_type: factory,
                    position: base,
                },
                &mut ctx,
            );
            debug!(factory = factory.as_u16(), task = id.0, "Factory task created");
        }

        tasks.update(&mut ctx, planner);

        if tick.saturating_sub(last_watchdog) >= u64::from(watchdog_interval) {
            tasks.watchdog(&mut ctx);
            self.last_watchdog = tick;
        }
    }
}
