mod tree;

pub use tree::error::{CallbackError, SearchError, TreeError};
pub use tree::ids::NodeId;
pub use tree::mcts::{Engine, IterationMetrics, SearchConfig, SearchConfigError, TreeObserver};
pub use tree::model::{
    ClosureModel, CounterpartReply, DialogueModel, Scenario, StrategyScore, softmax_scores,
};
pub use tree::retry::{RetryPolicy, Retrying};
pub use tree::reward::RewardPolicy;
pub use tree::rollout::{RolloutCap, RolloutOutcome, UNTIL_TERMINAL_ROUNDS, rollout};
pub use tree::search_tree::Tree;
pub use tree::seed::{
    ABSENT_GOLD_DISCOUNT, GoldMessage, GoldTrace, INJECTED_GOLD_PRIOR, Role, SEED_VALUE,
    SEED_VISITS, START_STRATEGY, SeedParams, seed_tree,
};
pub use tree::snapshot::{RUN_STATE_SCHEMA_VERSION, RunState, SnapshotError};
pub use tree::turn::{Trajectory, Turn, TurnPair};
pub use tree::{Node, NodeStats, Payload};
