//! Bounded bombing target list.

use proptest::prelude::*;
use skirmish_core::air_force::AirTargetList;
use skirmish_core::oracle::{UnitId, UnitSnapshot};
use skirmish_test_utils::doubles::FakeWorld;
use skirmish_test_utils::fixtures::{pos, unit};
use skirmish_test_utils::strategies::{arb_target_ops, TargetOp};

fn sighting(id: u32) -> UnitSnapshot {
    UnitSnapshot {
        id: UnitId::new(id),
        unit_type: unit("llt"),
        position: pos(100 + id as i32 * 10, 300),
        health: 700.0,
        max_health: 700.0,
        being_built: false,
        owned: false,
    }
}

proptest! {
    #[test]
    fn list_never_exceeds_capacity(capacity in 0usize..8, ops in arb_target_ops(64)) {
        let world = FakeWorld::default();
        let mut list = AirTargetList::new(capacity);

        for op in ops {
            match op {
                TargetOp::Add(id) => {
                    let was_listed = list.is_target(UnitId::new(id));
                    let was_full = list.is_full();
                    let added = list.check_bomb_target(&sighting(id), 100.0, &world);
                    prop_assert_eq!(added, !was_listed && !was_full);
                }
                TargetOp::Remove(id) => {
                    list.remove_target(UnitId::new(id));
                    prop_assert!(!list.is_target(UnitId::new(id)));
                }
            }
            prop_assert!(list.len() <= capacity);
            prop_assert_eq!(list.len(), list.iter().count());
        }
    }
}

#[test]
fn bombing_drains_the_list_best_first() {
    let world = FakeWorld::default();
    let mut list = AirTargetList::new(3);
    for id in 1..=3 {
        assert!(list.check_bomb_target(&sighting(id), 100.0 * id as f32, &world));
    }

    let order: Vec<u32> = std::iter::from_fn(|| list.best_target(1.0, 0.0, |_| 0.0))
        .map(|t| t.unit.0)
        .collect();

    assert_eq!(order, vec![3, 2, 1]);
    assert!(list.is_empty());
}
