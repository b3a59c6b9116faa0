use serde::{Deserialize, Serialize};

use crate::tree::{
    error::SearchError,
    model::{DialogueModel, Scenario, StrategyScore},
    turn::{Trajectory, TurnPair},
};

/// Round bound used when rolling out "until terminal".
pub const UNTIL_TERMINAL_ROUNDS: usize = 1000;

/// How far a rollout may continue past the tree frontier.
///
/// Written as a plain round count (`4`) or the keyword `until_terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CapRepr", into = "CapRepr")]
pub enum RolloutCap {
    /// At most this many rounds.
    Rounds(usize),
    /// Until the counterpart ends the conversation.
    UntilTerminal,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum CapRepr {
    Rounds(usize),
    Keyword(CapKeyword),
}

#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CapKeyword {
    UntilTerminal,
}

impl From<CapRepr> for RolloutCap {
    fn from(repr: CapRepr) -> Self {
        match repr {
            CapRepr::Rounds(rounds) => RolloutCap::Rounds(rounds),
            CapRepr::Keyword(CapKeyword::UntilTerminal) => RolloutCap::UntilTerminal,
        }
    }
}

impl From<RolloutCap> for CapRepr {
    fn from(cap: RolloutCap) -> Self {
        match cap {
            RolloutCap::Rounds(rounds) => CapRepr::Rounds(rounds),
            RolloutCap::UntilTerminal => CapRepr::Keyword(CapKeyword::UntilTerminal),
        }
    }
}

impl Default for RolloutCap {
    fn default() -> Self {
        RolloutCap::Rounds(4)
    }
}

impl RolloutCap {
    /// Resolve the actual round limit.
    pub fn round_limit(&self) -> usize {
        match self {
            RolloutCap::Rounds(rounds) => *rounds,
            RolloutCap::UntilTerminal => UNTIL_TERMINAL_ROUNDS,
        }
    }
}

/// Result of one default-policy rollout.
#[derive(Debug, Clone, PartialEq)]
pub struct RolloutOutcome {
    /// Starting trajectory followed by every simulated pair.
    pub trajectory: Trajectory,
    /// Number of rounds actually simulated.
    pub rounds: usize,
    /// Whether the counterpart ended the conversation.
    pub terminated: bool,
}

/// Candidate with the highest prior, earliest on ties.
pub(crate) fn greedy_choice(candidates: &[StrategyScore]) -> Option<&StrategyScore> {
    candidates.iter().fold(None, |best, candidate| match best {
        Some(current) if current.score >= candidate.score => Some(current),
        _ => Some(candidate),
    })
}

/// Run the greedy default policy from `history`.
///
/// Every round asks the scorer for priors, takes the single best strategy, and
/// generates both turns. No tree nodes are created.
pub fn rollout<M>(
    model: &mut M,
    scenario: &Scenario,
    mut history: Trajectory,
    cap: RolloutCap,
) -> Result<RolloutOutcome, SearchError>
where
    M: DialogueModel + ?Sized,
{
    let mut rounds = 0;
    let mut terminated = false;

    for _ in 0..cap.round_limit() {
        let candidates = model.score_strategies(&history)?;
        let strategy = greedy_choice(&candidates)
            .ok_or(SearchError::NoStrategies)?
            .strategy
            .clone();

        let responder = model.respond(&history, &strategy)?;
        history.push(TurnPair::pending(strategy, responder));
        let reply = model.counterpart(scenario, &history)?;
        if let Some(last) = history.last_mut() {
            last.counterpart = reply.text;
        }
        rounds += 1;

        if reply.ends {
            terminated = true;
            break;
        }
    }

    Ok(RolloutOutcome {
        trajectory: history,
        rounds,
        terminated,
    })
}
