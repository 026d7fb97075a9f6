//! Task store scenarios driven through the host doubles.

use proptest::prelude::*;
use skirmish_core::config::AiConfig;
use skirmish_core::construction::ConstructionOrderController;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::oracle::{NoPlanner, Order, UnitId};
use skirmish_core::task::{
    BuildType, Priority, Task, TaskContext, TaskId, TaskRequest, TaskState, TaskStore, UnitTask,
};
use skirmish_test_utils::doubles::{FakeWorld, ScriptedPlanner};
use skirmish_test_utils::fixtures::{controller, pos, tree, unit};
use skirmish_test_utils::init_test_logging;
use skirmish_test_utils::strategies::{arb_position, arb_priority};

struct Scenario {
    world: FakeWorld,
    controller: ConstructionOrderController,
    config: AiConfig,
    store: TaskStore,
}

impl Scenario {
    fn new() -> Self {
        init_test_logging();
        let config = AiConfig::default();
        Self {
            world: FakeWorld::new(2048),
            controller: controller(&config),
            config,
            store: TaskStore::new(),
        }
    }

    fn split(&mut self, tick: u64) -> (&mut TaskStore, TaskContext<'_>) {
        (
            &mut self.store,
            TaskContext {
                host: &mut self.world,
                controller: &mut self.controller,
                config: &self.config,
                tick,
            },
        )
    }

    fn worker(&mut self, id: u32, name: &str, at: Vec2Fixed) -> UnitId {
        let unit_type = unit(name);
        let worker = self.world.spawn(id, unit_type, 0, 0);
        if let Some(snapshot) = self.world.units.get_mut(&worker) {
            snapshot.position = at;
        }
        self.store.add_worker(worker, unit_type, 0);
        worker
    }

    fn build(&mut self, priority: Priority, name: &str, at: Vec2Fixed) -> TaskId {
        let (store, mut ctx) = self.split(0);
        store.enqueue_task(
            TaskRequest::Build {
                priority,
                build_type: BuildType::Energy,
                unit_type: unit(name),
                position: at,
            },
            &mut ctx,
        )
    }

    fn assign(&mut self, worker: UnitId) -> Option<TaskId> {
        let (store, mut ctx) = self.split(0);
        store.assign_task(worker, &mut ctx, &mut NoPlanner)
    }

    /// Start construction of the task's building the way the host would
    /// after the worker reached the site.
    fn start_construction(&mut self, task: TaskId, worker: UnitId, id: u32) -> UnitId {
        let Some(Order::Build { unit_type, position, .. }) = self.world.last_order(worker) else {
            panic!("worker {worker:?} has no build order");
        };
        let building = self.world.begin_construction(id, unit_type, 0, 0);
        if let Some(snapshot) = self.world.units.get_mut(&building) {
            snapshot.position = position;
        }
        self.controller.unit_created(unit_type);
        let (store, mut ctx) = self.split(10);
        assert_eq!(
            store.on_unit_created(building, unit_type, Some(worker), &mut ctx),
            Some(task)
        );
        building
    }

    fn destroy(&mut self, unit: UnitId, tick: u64) {
        self.world.kill(unit);
        let (store, mut ctx) = self.split(tick);
        store.on_unit_destroyed(unit, &mut ctx);
    }
}

#[test]
fn replacement_builder_continues_started_construction() {
    let mut s = Scenario::new();
    let commander = s.worker(1, "commander", pos(100, 100));
    let con = s.worker(2, "con_kbot", pos(500, 100));
    let task = s.build(Priority::Normal, "solar", pos(200, 100));
    assert_eq!(s.assign(commander), Some(task));
    let building = s.start_construction(task, commander, 50);

    s.destroy(commander, 20);

    assert_eq!(s.store.task_of(con), Some(task));
    let header = s.store.task(task).unwrap().header();
    assert_eq!(header.assignees, vec![con]);
    assert_eq!(header.state, TaskState::InProgress);
    assert_eq!(s.world.last_order(con), Some(Order::Repair(building)));
}

#[test]
fn task_without_replacement_stays_open() {
    let mut s = Scenario::new();
    let commander = s.worker(1, "commander", pos(100, 100));
    let far = s.worker(2, "con_kbot", pos(1900, 1900));
    let task = s.build(Priority::Normal, "solar", pos(200, 100));
    assert_eq!(s.assign(commander), Some(task));
    s.start_construction(task, commander, 50);

    s.destroy(commander, 20);

    let header = s.store.task(task).unwrap().header();
    assert_eq!(header.state, TaskState::Open);
    assert!(header.assignees.is_empty());
    assert_eq!(s.store.task_of(far), None);
}

#[test]
fn replacement_interrupts_filler_work() {
    let mut s = Scenario::new();
    let commander = s.worker(1, "commander", pos(100, 100));
    let con = s.worker(2, "con_kbot", pos(400, 100));
    let task = s.build(Priority::Normal, "solar", pos(200, 100));
    assert_eq!(s.assign(commander), Some(task));

    let mut planner = ScriptedPlanner::new([TaskRequest::Patrol {
        priority: Priority::Low,
        position: pos(400, 100),
        timeout: 600,
    }]);
    let (store, mut ctx) = s.split(0);
    let patrol = store.assign_task(con, &mut ctx, &mut planner).unwrap();
    assert!(matches!(store.task(patrol), Some(Task::Patrol(_))));

    s.destroy(commander, 20);

    assert_eq!(s.store.task_of(con), Some(task));
    assert!(s.store.task(patrol).is_none());
    assert_eq!(planner.asked, vec![con]);
}

#[test]
fn equidistant_tasks_go_to_lowest_id() {
    let mut s = Scenario::new();
    let commander = s.worker(1, "commander", pos(1000, 1000));
    let west = s.build(Priority::High, "solar", pos(800, 1000));
    let _east = s.build(Priority::High, "solar", pos(1200, 1000));

    assert_eq!(s.assign(commander), Some(west));
}

#[test]
fn urgency_outweighs_distance() {
    let mut s = Scenario::new();
    let commander = s.worker(1, "commander", pos(1000, 1000));
    // Low scales its metric by 4, Urgent by 1.
    let _near = s.build(Priority::Low, "solar", pos(1100, 1000));
    let far = s.build(Priority::Urgent, "solar", pos(1350, 1000));

    assert_eq!(s.assign(commander), Some(far));
}

#[test]
fn planner_is_asked_only_when_nothing_fits() {
    let mut s = Scenario::new();
    let commander = s.worker(1, "commander", pos(100, 100));
    let mut planner = ScriptedPlanner::new([TaskRequest::Reclaim {
        priority: Priority::Low,
        position: pos(150, 150),
        radius: skirmish_test_utils::fixtures::fixed(200),
        timeout: 900,
    }]);

    let (store, mut ctx) = s.split(0);
    let id = store.assign_task(commander, &mut ctx, &mut planner).unwrap();

    assert!(matches!(store.task(id), Some(Task::Reclaim(_))));
    assert_eq!(planner.remaining(), 0);
    assert!(matches!(s.world.last_order(commander), Some(Order::ReclaimArea { .. })));
}

#[test]
fn blocked_site_falls_back_to_patrol() {
    let mut s = Scenario::new();
    s.world.no_sites = true;
    let con = s.worker(1, "con_kbot", pos(100, 100));
    let task = s.build(Priority::Normal, "solar", pos(200, 100));
    let requested_before = s.controller.registry().state(unit("solar")).requested;

    let patrol = s.assign(con).unwrap();

    assert_ne!(patrol, task);
    assert!(s.store.task(task).is_none());
    assert!(matches!(s.store.task(patrol), Some(Task::Patrol(_))));
    assert!(matches!(s.world.last_order(con), Some(Order::PatrolTo(_))));
    assert_eq!(
        s.controller.registry().state(unit("solar")).requested,
        requested_before - 1
    );
}

#[test]
fn finished_building_frees_worker() {
    let mut s = Scenario::new();
    let commander = s.worker(1, "commander", pos(100, 100));
    let task = s.build(Priority::Normal, "solar", pos(200, 100));
    s.assign(commander);
    let building = s.start_construction(task, commander, 50);

    s.world.finish(building);
    s.controller.unit_finished(unit("solar"));
    let (store, mut ctx) = s.split(30);
    assert!(store.on_unit_finished(building, &mut ctx));

    assert!(s.store.task(task).is_none());
    assert_eq!(s.store.task_of(commander), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn assignments_respect_worker_capabilities(
        workers in prop::collection::vec((0usize..3, arb_position(2048)), 1..6),
        tasks in prop::collection::vec((0usize..3, arb_priority(), arb_position(2048)), 1..8),
    ) {
        const WORKERS: [&str; 3] = ["commander", "con_kbot", "con_vehicle"];
        const BUILDINGS: [&str; 3] = ["solar", "fusion", "llt"];
        let tree = tree();
        let mut s = Scenario::new();
        let units: Vec<UnitId> = workers
            .iter()
            .enumerate()
            .map(|(i, (kind, at))| s.worker(i as u32 + 1, WORKERS[*kind], *at))
            .collect();
        for (kind, priority, at) in &tasks {
            s.build(*priority, BUILDINGS[*kind], *at);
        }

        for &worker in &units {
            let Some(id) = s.assign(worker) else { continue };
            let Some(Task::Build(task)) = s.store.task(id) else { continue };
            let header = task.header();
            let worker_type = s.store.worker(worker).unwrap().unit_type;
            prop_assert!(tree.can_build(worker_type).contains(&header.unit_type));
            prop_assert_eq!(&header.assignees, &vec![worker]);
            prop_assert_eq!(header.state, TaskState::InProgress);
        }
    }
}
