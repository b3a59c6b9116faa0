use std::{fmt, fs, path::Path};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::tree::{
    error::{SearchError, TreeError},
    ids::NodeId,
    model::{DialogueModel, Scenario},
    reward::RewardPolicy,
    rollout::{RolloutCap, RolloutOutcome, rollout},
    search_tree::Tree,
    seed::{GoldTrace, START_STRATEGY, SeedParams, seed_tree},
    snapshot::RunState,
    turn::{Turn, TurnPair},
};

const DEFAULT_SEARCH_CONFIG_YAML: &str = include_str!("../../config/search.default.yaml");

/// Search configuration for the dialogue tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Exploration coefficient in the PUCB score.
    pub c: f64,
    pub rollout_cap: RolloutCap,
    /// Added to every evaluator output.
    pub reward_bias: f64,
    /// Responder text of a freshly started root.
    pub opening_turn: String,
    /// Generate every expanded child immediately instead of on first selection.
    pub eager_materialization: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            c: 1.0,
            rollout_cap: RolloutCap::Rounds(4),
            reward_bias: -3.0,
            opening_turn: "Hello, I'm here to listen. How can I support you today?".to_string(),
            eager_materialization: false,
        }
    }
}

impl SearchConfig {
    /// Parse a search config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SearchConfigError> {
        let config: SearchConfig = serde_yaml::from_str(yaml).map_err(SearchConfigError::Yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a search config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SearchConfigError> {
        let yaml = fs::read_to_string(path).map_err(SearchConfigError::Io)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_SEARCH_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, SearchConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    pub fn validate(&self) -> Result<(), SearchConfigError> {
        if !self.c.is_finite() || self.c < 0.0 {
            return Err(SearchConfigError::Invalid(
                "c must be finite and >= 0".to_string(),
            ));
        }
        if self.rollout_cap == RolloutCap::Rounds(0) {
            return Err(SearchConfigError::Invalid(
                "rollout_cap must be greater than 0".to_string(),
            ));
        }
        if !self.reward_bias.is_finite() {
            return Err(SearchConfigError::Invalid(
                "reward_bias must be finite".to_string(),
            ));
        }
        Ok(())
    }

    fn seed_params(&self) -> SeedParams<'_> {
        SeedParams {
            c: self.c,
            reward_bias: self.reward_bias,
            opening_turn: &self.opening_turn,
        }
    }
}

/// Error type for loading and validating `SearchConfig`.
#[derive(Debug)]
pub enum SearchConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for SearchConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchConfigError::Io(err) => write!(f, "failed to read config file: {err}"),
            SearchConfigError::Yaml(err) => write!(f, "failed to parse config YAML: {err}"),
            SearchConfigError::Invalid(err) => write!(f, "invalid search config: {err}"),
        }
    }
}

impl std::error::Error for SearchConfigError {}

/// Per-iteration metrics emitted by `Engine::step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationMetrics {
    /// Leaf returned by selection.
    pub selected: NodeId,
    /// Node the reward was backpropagated from.
    pub backpropagated_from: NodeId,
    /// Children created by expansion (0 for a terminal leaf).
    pub expanded: usize,
    /// Rollout rounds that fed the reward.
    pub simulated_rounds: usize,
    pub reward: f64,
}

/// Fire-and-forget hook invoked after the tree changes, e.g. a renderer.
pub type TreeObserver = Box<dyn FnMut(&Tree)>;

/// The tree search engine: owns one tree and drives the dialogue callbacks.
pub struct Engine<M> {
    config: SearchConfig,
    scenario: Scenario,
    tree: Tree,
    model: M,
    reward: RewardPolicy,
    observer: Option<TreeObserver>,
}

impl<M: DialogueModel> Engine<M> {
    /// Wrap an existing tree.
    pub fn new(config: SearchConfig, scenario: Scenario, tree: Tree, model: M) -> Self {
        let reward = RewardPolicy::new(config.reward_bias);
        Engine {
            config,
            scenario,
            tree,
            model,
            reward,
            observer: None,
        }
    }

    /// Fresh single-root tree: the root carries the configured opening turn and
    /// one counterpart call produces the first reply.
    pub fn fresh(config: SearchConfig, scenario: Scenario, mut model: M) -> Result<Self, SearchError> {
        let opening = vec![TurnPair::pending(START_STRATEGY, config.opening_turn.clone())];
        let reply = model.counterpart(&scenario, &opening)?;

        let mut tree = Tree::new(START_STRATEGY, 1.0, config.c);
        let root = tree.root_id();
        tree.materialize(
            root,
            Turn {
                responder: config.opening_turn.clone(),
                counterpart: reply.text,
                is_terminal: reply.ends,
            },
        )?;
        Ok(Self::new(config, scenario, tree, model))
    }

    /// Tree seeded from a gold trace.
    pub fn seeded(
        config: SearchConfig,
        scenario: Scenario,
        trace: &GoldTrace,
        mut model: M,
    ) -> Result<Self, SearchError> {
        let tree = seed_tree(&mut model, trace, config.seed_params())?;
        Ok(Self::new(config, scenario, tree, model))
    }

    /// Restore an engine from a persisted run state. The snapshot's `c` and
    /// rollout cap win over `config`.
    pub fn from_run_state(mut config: SearchConfig, state: RunState, model: M) -> Self {
        config.c = state.c;
        config.rollout_cap = state.rollout_cap;
        Self::new(config, state.scenario, state.tree, model)
    }

    /// Capture everything needed to resume after `iteration` completed iterations.
    pub fn run_state(&self, iteration: usize) -> RunState {
        RunState::new(
            self.config.c,
            self.config.rollout_cap,
            self.scenario.clone(),
            iteration,
            self.tree.clone(),
        )
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Register the hook called after every tree mutation.
    pub fn set_observer(&mut self, observer: impl FnMut(&Tree) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Descend by PUCB to a leaf, materializing it if it is still pending.
    pub fn select(&mut self) -> Result<NodeId, SearchError> {
        let leaf = self.tree.select_leaf()?;
        if !self.tree.node(leaf)?.is_materialized() {
            self.materialize(leaf)?;
        }
        Ok(leaf)
    }

    /// Create one pending child per scored strategy. Returns the child count.
    pub fn expand(&mut self, node_id: NodeId) -> Result<usize, SearchError> {
        let node = self.tree.node(node_id)?;
        if node.is_terminal() {
            return Err(TreeError::TerminalNode { node_id }.into());
        }
        if node.has_children() {
            return Err(TreeError::AlreadyExpanded { node_id }.into());
        }

        let history = self.tree.build_history(node_id)?;
        let candidates = self.model.score_strategies(&history)?;
        if candidates.is_empty() {
            return Err(SearchError::NoStrategies);
        }

        let expanded = candidates.len();
        for candidate in candidates {
            let child = self
                .tree
                .add_child(node_id, candidate.strategy, candidate.score)?;
            if self.config.eager_materialization {
                self.materialize(child)?;
            }
        }
        debug!("expanded node {} into {expanded} children", node_id.index());

        self.notify();
        Ok(expanded)
    }

    /// Greedy default-policy rollout starting after `node_id`'s trajectory.
    pub fn simulate_from(&mut self, node_id: NodeId) -> Result<RolloutOutcome, SearchError> {
        if self.tree.node(node_id)?.is_terminal() {
            return Err(TreeError::TerminalNode { node_id }.into());
        }
        let history = self.tree.build_history(node_id)?;
        rollout(
            &mut self.model,
            &self.scenario,
            history,
            self.config.rollout_cap,
        )
    }

    /// Simulate from the best-prior child of `node_id` and backpropagate its reward.
    pub fn simulate_and_backpropagate(
        &mut self,
        node_id: NodeId,
    ) -> Result<(NodeId, usize, f64), SearchError> {
        let child = self
            .tree
            .best_prior_child(node_id)?
            .ok_or(TreeError::NotExpanded { node_id })?;
        if !self.tree.node(child)?.is_materialized() {
            self.materialize(child)?;
        }

        let (trajectory, rounds) = if self.tree.node(child)?.is_terminal() {
            (self.tree.build_history(child)?, 0)
        } else {
            let outcome = self.simulate_from(child)?;
            (outcome.trajectory, outcome.rounds)
        };

        let reward = self.reward.reward(&mut self.model, &trajectory, rounds)?;
        self.tree.backward(child, reward)?;
        Ok((child, rounds, reward))
    }

    /// Execute one complete iteration: select, expand, simulate, backpropagate.
    pub fn step(&mut self) -> Result<IterationMetrics, SearchError> {
        let selected = self.select()?;

        let metrics = if self.tree.node(selected)?.is_terminal() {
            let history = self.tree.build_history(selected)?;
            let reward = self.reward.reward(&mut self.model, &history, 0)?;
            self.tree.backward(selected, reward)?;
            IterationMetrics {
                selected,
                backpropagated_from: selected,
                expanded: 0,
                simulated_rounds: 0,
                reward,
            }
        } else {
            let expanded = self.expand(selected)?;
            let (child, simulated_rounds, reward) = self.simulate_and_backpropagate(selected)?;
            IterationMetrics {
                selected,
                backpropagated_from: child,
                expanded,
                simulated_rounds,
                reward,
            }
        };

        debug!(
            "iteration: selected={} rounds={} reward={:.4}",
            metrics.selected.index(),
            metrics.simulated_rounds,
            metrics.reward
        );
        self.notify();
        Ok(metrics)
    }

    /// Generate the responder and counterpart turns of a pending node.
    fn materialize(&mut self, node_id: NodeId) -> Result<(), SearchError> {
        let (parent, strategy) = {
            let node = self.tree.node(node_id)?;
            (node.parent(), node.strategy().to_string())
        };
        let mut history = match parent {
            Some(parent) => self.tree.build_history(parent)?,
            None => Vec::new(),
        };

        let responder = self.model.respond(&history, &strategy)?;
        history.push(TurnPair::pending(strategy, responder.clone()));
        let reply = self.model.counterpart(&self.scenario, &history)?;

        self.tree.materialize(
            node_id,
            Turn {
                responder,
                counterpart: reply.text,
                is_terminal: reply.ends,
            },
        )?;
        debug!(
            "materialized node {} (terminal={})",
            node_id.index(),
            reply.ends
        );
        Ok(())
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.tree);
        }
    }
}
