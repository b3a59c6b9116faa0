use super::support::three_way;
use crate::{
    Engine, RolloutCap, RunState, Scenario, SearchConfig, SnapshotError, Tree,
};

fn scenario() -> Scenario {
    Scenario {
        description: "lost a job".to_string(),
        scene: "anxiety".to_string(),
    }
}

#[test]
fn run_state_round_trips_exactly() {
    let mut engine = Engine::fresh(SearchConfig::default(), scenario(), three_way().ending_at(4))
        .expect("fresh engine");
    for _ in 0..5 {
        engine.step().expect("step succeeds");
    }

    let state = engine.run_state(5);
    let json = state.to_json().expect("serializes");
    let restored = RunState::from_json(&json).expect("deserializes");

    assert_eq!(restored, state);
    assert_eq!(restored.iteration, 5);
    assert_eq!(restored.scenario, scenario());
}

#[test]
fn restored_engine_continues_like_the_original() {
    let mut original = Engine::fresh(SearchConfig::default(), scenario(), three_way().ending_at(5))
        .expect("fresh engine");
    for _ in 0..3 {
        original.step().expect("step succeeds");
    }
    let json = original.run_state(3).to_json().expect("serializes");
    let state = RunState::from_json(&json).expect("deserializes");
    let mut resumed = Engine::from_run_state(SearchConfig::default(), state, three_way().ending_at(5));

    for _ in 0..3 {
        original.step().expect("step succeeds");
        resumed.step().expect("step succeeds");
    }
    assert_eq!(resumed.tree(), original.tree());
}

#[test]
fn snapshot_values_override_the_config() {
    let mut state = RunState::new(0.25, RolloutCap::UntilTerminal, scenario(), 0, Tree::new("start", 1.0, 0.25));
    state.iteration = 7;
    let engine = Engine::from_run_state(SearchConfig::default(), state, three_way());

    assert_eq!(engine.config().c, 0.25);
    assert_eq!(engine.config().rollout_cap, RolloutCap::UntilTerminal);
}

#[test]
fn unknown_schema_versions_are_rejected() {
    let mut state = RunState::new(1.0, RolloutCap::Rounds(4), scenario(), 0, Tree::new("start", 1.0, 1.0));
    state.schema_version = 99;
    let json = state.to_json().expect("serializes");

    let err = RunState::from_json(&json).expect_err("version 99 is unknown");
    assert!(matches!(err, SnapshotError::UnsupportedVersion(99)));
}

#[test]
fn rollout_cap_accepts_counts_and_keyword() {
    let config = SearchConfig::from_yaml_str("rollout_cap: until_terminal\n").expect("keyword parses");
    assert_eq!(config.rollout_cap, RolloutCap::UntilTerminal);

    let config = SearchConfig::from_yaml_str("rollout_cap: 7\nc: 2.5\n").expect("count parses");
    assert_eq!(config.rollout_cap, RolloutCap::Rounds(7));
    assert_eq!(config.c, 2.5);
    assert_eq!(config.reward_bias, SearchConfig::default().reward_bias);

    assert!(SearchConfig::from_yaml_str("rollout_cap: 0\n").is_err());
    assert!(SearchConfig::from_yaml_str("c: -1.0\n").is_err());
}

#[test]
fn default_config_yaml_parses() {
    let config = SearchConfig::from_default_yaml().expect("default yaml should parse");
    assert_eq!(config, SearchConfig::default());
}
