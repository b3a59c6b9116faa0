use log::debug;
use serde::{Deserialize, Serialize};

use crate::tree::{
    error::SearchError,
    ids::NodeId,
    model::{DialogueModel, StrategyScore},
    rollout::greedy_choice,
    search_tree::Tree,
    turn::Turn,
};

/// Label of the synthetic root that holds the opening turn.
pub const START_STRATEGY: &str = "start";
/// Visit count given to every node on the gold path.
pub const SEED_VISITS: u64 = 100;
/// Mean value given to every node on the gold path, before the reward bias.
pub const SEED_VALUE: f64 = 4.0;
/// Factor applied to all scored candidates when the gold strategy is missing.
pub const ABSENT_GOLD_DISCOUNT: f64 = 0.9;
/// Prior given to an injected gold strategy.
pub const INJECTED_GOLD_PRIOR: f64 = 0.1;

/// Who produced a message in a gold trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "supporter", alias = "assistant")]
    Responder,
    #[serde(alias = "user", alias = "seeker")]
    Counterpart,
}

/// One message of an externally supplied gold dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldMessage {
    pub role: Role,
    pub content: String,
    /// Strategy label; only meaningful on responder messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Known-bad alternatives recorded for this turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedback: Vec<String>,
}

impl GoldMessage {
    pub fn responder(strategy: impl Into<String>, content: impl Into<String>) -> Self {
        GoldMessage {
            role: Role::Responder,
            content: content.into(),
            strategy: Some(strategy.into()),
            feedback: Vec::new(),
        }
    }

    pub fn counterpart(content: impl Into<String>) -> Self {
        GoldMessage {
            role: Role::Counterpart,
            content: content.into(),
            strategy: None,
            feedback: Vec::new(),
        }
    }
}

/// Alternating gold dialogue used to seed a tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoldTrace {
    pub messages: Vec<GoldMessage>,
}

impl GoldTrace {
    pub fn new(messages: Vec<GoldMessage>) -> Self {
        GoldTrace { messages }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Parameters the importer takes from the search configuration.
#[derive(Debug, Clone, Copy)]
pub struct SeedParams<'a> {
    pub c: f64,
    pub reward_bias: f64,
    pub opening_turn: &'a str,
}

/// Build a tree whose single high-confidence path replays `trace`.
///
/// Each gold node gets `N = SEED_VISITS` and `Q = SEED_VALUE + bias`. At every
/// step the scorer's other candidates are attached as unvisited pending
/// siblings. The last gold node is marked terminal.
pub fn seed_tree<M>(model: &mut M, trace: &GoldTrace, params: SeedParams<'_>) -> Result<Tree, SearchError>
where
    M: DialogueModel + ?Sized,
{
    let seed_q = SEED_VALUE + params.reward_bias;
    let (mut tree, rest) = seed_root(trace, params)?;
    let root = tree.root_id();
    tree.seed_stats(root, SEED_VISITS, seed_q)?;

    let mut current = root;
    for (step, chunk) in rest.chunks(2).enumerate() {
        let gold = &chunk[0];
        if gold.role != Role::Responder {
            return Err(SearchError::InvalidTrace(format!(
                "expected a responder message at gold step {step}"
            )));
        }
        let reply = match chunk.get(1) {
            Some(msg) if msg.role == Role::Counterpart => Some(msg.content.clone()),
            Some(_) => {
                return Err(SearchError::InvalidTrace(format!(
                    "expected a counterpart message after gold step {step}"
                )));
            }
            None => None,
        };

        // scored against the tree history, root pair included
        let history = tree.build_history(current)?;
        let mut candidates = model.score_strategies(&history)?;
        let gold_strategy = match &gold.strategy {
            Some(strategy) => strategy.clone(),
            None => greedy_choice(&candidates)
                .ok_or(SearchError::NoStrategies)?
                .strategy
                .clone(),
        };
        inject_gold(&mut candidates, &gold_strategy);

        let mut gold_node: Option<NodeId> = None;
        for candidate in candidates {
            let is_gold = gold_node.is_none() && candidate.strategy == gold_strategy;
            let child = tree.add_child(current, candidate.strategy, candidate.score)?;
            if is_gold {
                tree.materialize(
                    child,
                    Turn {
                        responder: gold.content.clone(),
                        counterpart: reply.clone(),
                        is_terminal: false,
                    },
                )?;
                tree.seed_stats(child, SEED_VISITS, seed_q)?;
                tree.set_feedback(child, gold.feedback.clone())?;
                gold_node = Some(child);
            }
        }

        current = gold_node.ok_or_else(|| {
            SearchError::InvalidTrace(format!("gold strategy '{gold_strategy}' was not attached"))
        })?;
        debug!("seeded gold step {step} with strategy '{gold_strategy}'");
    }

    tree.mark_terminal(current)?;
    Ok(tree)
}

/// Root node of a seeded tree plus the messages left after it.
fn seed_root<'t>(
    trace: &'t GoldTrace,
    params: SeedParams<'_>,
) -> Result<(Tree, &'t [GoldMessage]), SearchError> {
    let messages = trace.messages.as_slice();
    let first = messages
        .first()
        .ok_or_else(|| SearchError::InvalidTrace("trace has no messages".to_string()))?;

    match first.role {
        // the counterpart opened; our side of the root is the fixed opening turn
        Role::Counterpart => {
            let mut tree = Tree::new(START_STRATEGY, 1.0, params.c);
            let root = tree.root_id();
            tree.materialize(
                root,
                Turn {
                    responder: params.opening_turn.to_string(),
                    counterpart: Some(first.content.clone()),
                    is_terminal: false,
                },
            )?;
            Ok((tree, &messages[1..]))
        }
        Role::Responder => {
            let strategy = first.strategy.as_deref().unwrap_or(START_STRATEGY);
            let (reply, rest) = match messages.get(1) {
                Some(msg) if msg.role == Role::Counterpart => {
                    (Some(msg.content.clone()), &messages[2..])
                }
                Some(_) => {
                    return Err(SearchError::InvalidTrace(
                        "two responder messages in a row at the start".to_string(),
                    ));
                }
                None => (None, &messages[1..]),
            };
            let mut tree = Tree::new(strategy, 1.0, params.c);
            let root = tree.root_id();
            tree.materialize(
                root,
                Turn {
                    responder: first.content.clone(),
                    counterpart: reply,
                    is_terminal: false,
                },
            )?;
            tree.set_feedback(root, first.feedback.clone())?;
            Ok((tree, rest))
        }
    }
}

/// Make sure the gold strategy is among the candidates. If the scorer left it
/// out, every candidate is discounted and the gold one is appended with a low prior.
fn inject_gold(candidates: &mut Vec<StrategyScore>, gold_strategy: &str) {
    if candidates.iter().any(|c| c.strategy == gold_strategy) {
        return;
    }
    for candidate in candidates.iter_mut() {
        candidate.score *= ABSENT_GOLD_DISCOUNT;
    }
    candidates.push(StrategyScore::new(gold_strategy, INJECTED_GOLD_PRIOR));
}
