mod arena;
pub mod error;
pub mod ids;
pub mod mcts;
pub mod model;
mod node;
pub mod retry;
pub mod reward;
pub mod rollout;
pub mod search_tree;
pub mod seed;
pub mod snapshot;
mod stats;
pub mod turn;

pub use node::{Node, Payload};
pub use stats::NodeStats;

#[cfg(test)]
mod tests;
