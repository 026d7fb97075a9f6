//! Learned data surviving between games.

use std::sync::Arc;

use skirmish_core::agent::SkirmishAgent;
use skirmish_core::config::AiConfig;
use skirmish_core::knowledge::SharedKnowledge;
use skirmish_core::learning::{
    AttackedByRates, GamePhase, LearnedData, LearningError, MapType, LEARNED_DATA_FORMAT,
};
use skirmish_core::unit_kind::{TargetType, TargetTypeValues};
use skirmish_test_utils::doubles::FakeWorld;
use skirmish_test_utils::fixtures::{roster, tree, unit, ARM};
use skirmish_test_utils::init_test_logging;

#[test]
fn attacks_seen_in_one_game_weight_the_next() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skirmish.learn");
    let knowledge = Arc::new(SharedKnowledge::from_config(
        vec![roster()],
        Some(path.clone()),
        &AiConfig::default(),
    ));

    let mut agent =
        SkirmishAgent::join(Arc::clone(&knowledge), ARM, AiConfig::default(), MapType::Land, 3).unwrap();
    let before = agent.combat_power_weights();
    let mut world = FakeWorld::default();
    let solar = world.spawn(1, unit("solar"), 500, 500);
    let raider = world.spawn_enemy(90, unit("flash"), 600, 500);
    agent.on_unit_damaged(&mut world, solar, Some(raider));
    agent.leave().unwrap();

    assert!(path.exists());
    assert_eq!(knowledge.instances(), 0);

    let agent =
        SkirmishAgent::join(Arc::clone(&knowledge), ARM, AiConfig::default(), MapType::Land, 3).unwrap();
    let after = agent.combat_power_weights();
    assert!(after.get(TargetType::Surface) > before.get(TargetType::Surface));
    assert_eq!(after.get(TargetType::Air), before.get(TargetType::Air));
    agent.leave().unwrap();
}

#[test]
fn mismatched_format_tag_falls_back_to_defaults() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skirmish.learn");
    let tree = tree();

    let mut stale = LearnedData::with_defaults(vec![TargetTypeValues::splat(9.0); tree.len()]);
    stale.format_tag = "skirmish-learn-v0".to_string();
    stale
        .attacked_by_rates
        .set(MapType::Land, GamePhase::Early, TargetType::Air, 0.8);
    stale.save(&path).unwrap();

    let err = LearnedData::load(&path, LEARNED_DATA_FORMAT, tree.len()).unwrap_err();
    assert!(matches!(err, LearningError::VersionMismatch { .. }));

    let knowledge = SharedKnowledge::new(vec![roster()], Some(path), 0.7);
    let view = knowledge.join().unwrap();
    assert_eq!(view.attacked_by_rates(), AttackedByRates::default());
    // Combat power comes from the roster, not from the stale file.
    assert_eq!(
        view.tree().combat_power(unit("peewee")),
        TargetTypeValues::from_array([2.0, 0.1, 0.5, 0.0, 1.0])
    );
}

#[test]
fn file_for_another_roster_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skirmish.learn");
    LearnedData::with_defaults(vec![TargetTypeValues::splat(1.0); 2])
        .save(&path)
        .unwrap();

    let knowledge = SharedKnowledge::new(vec![roster()], Some(path), 0.7);
    let view = knowledge.join().unwrap();

    assert_eq!(view.attacked_by_rates(), AttackedByRates::default());
    assert_eq!(view.tree().len(), tree().len());
}
