use serde::{Deserialize, Serialize};

use crate::tree::{
    arena::Arena,
    error::TreeError,
    ids::NodeId,
    node::Node,
    stats::NodeStats,
    turn::{Trajectory, Turn},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// owns the arena (root is always at index 0)
/// children are owned through their parent's id list, the parent link is lookup only
pub struct Tree {
    c: f64,
    arena: Arena<Node>,
}

impl Tree {
    /// Create a tree with a single pending root node.
    pub fn new(root_strategy: impl Into<String>, root_score: f64, c: f64) -> Self {
        let mut arena = Arena::new();
        let _ = arena.allocate(Node::new(None, 1, root_strategy, root_score));
        Tree { c, arena }
    }

    /// Return the root node id.
    pub fn root_id(&self) -> NodeId {
        NodeId::from(0)
    }

    /// Exploration coefficient used for every PUCB in this tree.
    pub fn c(&self) -> f64 {
        self.c
    }

    /// Return how many nodes exist in the tree arena.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Return an immutable node handle.
    pub fn node(&self, node_id: NodeId) -> Result<&Node, TreeError> {
        self.arena
            .get(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    /// Return a mutable node handle.
    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Result<&mut Node, TreeError> {
        self.arena
            .get_mut(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    /// Iterate every node with its id, in allocation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.arena.iter_with_ids()
    }

    pub fn children(&self, node_id: NodeId) -> Result<&[NodeId], TreeError> {
        Ok(self.node(node_id)?.children())
    }

    /// Append a pending child and compute its selection score.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        strategy: impl Into<String>,
        strategy_score: f64,
    ) -> Result<NodeId, TreeError> {
        let depth = self.node(parent)?.depth() + 1;
        let child = self
            .arena
            .allocate(Node::new(Some(parent), depth, strategy, strategy_score));
        self.node_mut(parent)?.push_child(child);
        self.refresh_pucb(child)?;
        Ok(child)
    }

    /// Attach the generated turn. A node is materialized at most once.
    pub fn materialize(&mut self, node_id: NodeId, turn: Turn) -> Result<(), TreeError> {
        let node = self.node_mut(node_id)?;
        if node.is_materialized() {
            return Err(TreeError::AlreadyMaterialized { node_id });
        }
        node.set_payload(turn);
        Ok(())
    }

    /// Flag a materialized node as the end of its conversation.
    pub fn mark_terminal(&mut self, node_id: NodeId) -> Result<(), TreeError> {
        let turn = self
            .node_mut(node_id)?
            .turn_mut()
            .ok_or(TreeError::NotMaterialized { node_id })?;
        turn.is_terminal = true;
        Ok(())
    }

    /// Overwrite statistics with synthetic values and refresh the node's own score.
    pub fn seed_stats(&mut self, node_id: NodeId, visits: u64, q: f64) -> Result<(), TreeError> {
        self.node_mut(node_id)?
            .set_stats(NodeStats::seeded(visits, q));
        self.refresh_pucb(node_id)
    }

    pub fn set_feedback(&mut self, node_id: NodeId, feedback: Vec<String>) -> Result<(), TreeError> {
        self.node_mut(node_id)?.set_feedback(feedback);
        Ok(())
    }

    /// Turn pairs from the root down to `node_id`, in root-to-node order.
    pub fn build_history(&self, node_id: NodeId) -> Result<Trajectory, TreeError> {
        let mut history = Vec::with_capacity(self.node(node_id)?.depth());
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = self.node(id)?;
            let pair = node
                .turn_pair()
                .ok_or(TreeError::NotMaterialized { node_id: id })?;
            history.push(pair);
            current = node.parent();
        }
        history.reverse();
        Ok(history)
    }

    /// Apply one reward to `node_id` and each of its ancestors.
    ///
    /// Every node on the path gets `N += 1` and its mean updated, then the
    /// PUCB of its direct children is refreshed since their parent count moved.
    pub fn backward(&mut self, node_id: NodeId, reward: f64) -> Result<(), TreeError> {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = self.node_mut(id)?;
            node.stats_mut().record(reward);
            let parent = node.parent();

            let child_count = self.node(id)?.children().len();
            for idx in 0..child_count {
                let child = self.node(id)?.children()[idx];
                self.refresh_pucb(child)?;
            }

            current = parent;
        }
        Ok(())
    }

    /// Count terminal nodes in the subtree rooted at `node_id`, itself included.
    pub fn count_terminal_descendants(&self, node_id: NodeId) -> Result<usize, TreeError> {
        let mut count = 0;
        let mut stack = vec![node_id];
        while let Some(id) = stack.pop() {
            let node = self.node(id)?;
            if node.is_terminal() {
                count += 1;
            }
            stack.extend_from_slice(node.children());
        }
        Ok(count)
    }

    /// Walk down from the root by maximum PUCB until a childless node.
    pub fn select_leaf(&self) -> Result<NodeId, TreeError> {
        let mut current = self.root_id();
        loop {
            let node = self.node(current)?;
            match self.argmax_child(node, |child| child.pucb())? {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
    }

    /// Child with the highest prior score, `None` if there are no children.
    pub fn best_prior_child(&self, node_id: NodeId) -> Result<Option<NodeId>, TreeError> {
        let node = self.node(node_id)?;
        self.argmax_child(node, |child| child.strategy_score())
    }

    /// Follow the highest mean value from the root and return that trajectory.
    ///
    /// Stops early at the first pending node since it has no turn to report.
    pub fn best_trajectory_by_value(&self) -> Result<Trajectory, TreeError> {
        let mut current = self.root_id();
        while let Some(next) = self.argmax_child(self.node(current)?, |child| child.q())? {
            if !self.node(next)?.is_materialized() {
                break;
            }
            current = next;
        }
        self.build_history(current)
    }

    /// Every terminal node, in allocation order.
    pub fn terminal_nodes(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.is_terminal())
            .map(|(id, _)| id)
            .collect()
    }

    /// Check parent/child links agree and every id resolves.
    pub fn validate(&self) -> Result<(), TreeError> {
        let root = self.node(self.root_id()).map_err(|_| TreeError::EmptyTree)?;
        if let Some(parent) = root.parent() {
            return Err(TreeError::InconsistentLink {
                parent,
                child: self.root_id(),
            });
        }

        for (id, node) in self.nodes() {
            for &child in node.children() {
                if self.node(child)?.parent() != Some(id) {
                    return Err(TreeError::InconsistentLink { parent: id, child });
                }
            }
            if let Some(parent) = node.parent() {
                if !self.node(parent)?.children().contains(&id) {
                    return Err(TreeError::InconsistentLink { parent, child: id });
                }
            }
        }
        Ok(())
    }

    fn refresh_pucb(&mut self, node_id: NodeId) -> Result<(), TreeError> {
        let c = self.c;
        let (stats, prior, parent) = {
            let node = self.node(node_id)?;
            (node.stats(), node.strategy_score(), node.parent())
        };
        // the root has no parent and keeps a zero score
        let Some(parent) = parent else {
            return Ok(());
        };
        let parent_visits = self.node(parent)?.visits();
        self.node_mut(node_id)?
            .set_pucb(stats.pucb(prior, parent_visits, c));
        Ok(())
    }

    // tie breaker in case of equal scores prefers the earliest child
    fn argmax_child<F>(&self, node: &Node, score: F) -> Result<Option<NodeId>, TreeError>
    where
        F: Fn(&Node) -> f64,
    {
        let mut best: Option<(NodeId, f64)> = None;
        for &child_id in node.children() {
            let value = score(self.node(child_id)?);
            best = match best {
                Some((_, best_value)) if best_value >= value => best,
                Some(_) if value.is_nan() => best,
                _ => Some((child_id, value)),
            };
        }
        Ok(best.map(|(id, _)| id))
    }
}
