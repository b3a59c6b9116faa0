use dialogtree_core::{
    CallbackError, CounterpartReply, DialogueModel, Engine, RolloutCap, Scenario, SearchConfig,
    StrategyScore, TurnPair,
};

/// Counterpart leaves after `patience` pairs; the evaluator prefers "reframe".
struct Listener {
    patience: usize,
}

impl DialogueModel for Listener {
    fn score_strategies(&mut self, _history: &[TurnPair]) -> Result<Vec<StrategyScore>, CallbackError> {
        Ok(vec![
            StrategyScore::new("validate", 0.6),
            StrategyScore::new("reframe", 0.4),
        ])
    }

    fn respond(&mut self, _history: &[TurnPair], strategy: &str) -> Result<String, CallbackError> {
        Ok(format!("({strategy})"))
    }

    fn counterpart(
        &mut self,
        scenario: &Scenario,
        history: &[TurnPair],
    ) -> Result<CounterpartReply, CallbackError> {
        if history.len() >= self.patience {
            Ok(CounterpartReply::end())
        } else {
            Ok(CounterpartReply::says(format!("about {}", scenario.scene)))
        }
    }

    fn evaluate(&mut self, history: &[TurnPair], _simulated_rounds: usize) -> Result<f64, CallbackError> {
        let reframes = history.iter().filter(|p| p.strategy == "reframe").count();
        Ok(reframes as f64 / history.len() as f64 * 4.0)
    }
}

fn scenario() -> Scenario {
    Scenario {
        description: "argued with a friend".to_string(),
        scene: "guilt".to_string(),
    }
}

#[test]
fn public_search_learns_the_better_strategy() {
    let config = SearchConfig {
        c: 0.5,
        rollout_cap: RolloutCap::Rounds(1),
        reward_bias: 0.0,
        ..SearchConfig::default()
    };
    let mut engine =
        Engine::fresh(config, scenario(), Listener { patience: 3 }).expect("fresh engine");

    for _ in 0..30 {
        engine.step().expect("step succeeds");
    }

    let best = engine
        .tree()
        .best_trajectory_by_value()
        .expect("best trajectory");
    assert!(best.len() >= 2);
    assert_eq!(best[1].strategy, "reframe");
    assert_eq!(best[0].counterpart.as_deref(), Some("about guilt"));
}

#[test]
fn public_terminal_counts_grow_monotonically() {
    let mut engine = Engine::fresh(
        SearchConfig::default(),
        scenario(),
        Listener { patience: 2 },
    )
    .expect("fresh engine");
    let root = engine.tree().root_id();

    let mut last = 0;
    for _ in 0..8 {
        engine.step().expect("step succeeds");
        let now = engine
            .tree()
            .count_terminal_descendants(root)
            .expect("count succeeds");
        assert!(now >= last);
        last = now;
    }
    assert_eq!(last, 2);
    assert_eq!(engine.tree().terminal_nodes().len(), 2);
}
