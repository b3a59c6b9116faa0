use crate::{NodeId, Tree, TreeError, Turn};

fn said(responder: &str) -> Turn {
    Turn {
        responder: responder.to_string(),
        counterpart: Some(format!("re: {responder}")),
        is_terminal: false,
    }
}

/// root -> a -> a1, root -> b; every node materialized.
fn small_tree() -> (Tree, [NodeId; 4]) {
    let mut tree = Tree::new("start", 1.0, 2.0);
    let root = tree.root_id();
    tree.materialize(root, said("hello")).expect("root materializes");
    let a = tree.add_child(root, "a", 0.6).expect("child a");
    let b = tree.add_child(root, "b", 0.4).expect("child b");
    let a1 = tree.add_child(a, "a1", 1.0).expect("child a1");
    for (id, text) in [(a, "first"), (b, "other"), (a1, "second")] {
        tree.materialize(id, said(text)).expect("child materializes");
    }
    (tree, [root, a, b, a1])
}

#[test]
fn build_history_is_root_to_node_and_repeatable() {
    let (tree, [_, a, _, a1]) = small_tree();

    let history = tree.build_history(a1).expect("history builds");
    assert_eq!(history.len(), 3);
    assert_eq!(history.len(), tree.node(a1).expect("a1").depth());
    let strategies: Vec<&str> = history.iter().map(|p| p.strategy.as_str()).collect();
    assert_eq!(strategies, ["start", "a", "a1"]);
    assert_eq!(history[2].responder, "second");
    assert_eq!(history[2].counterpart.as_deref(), Some("re: second"));

    assert_eq!(tree.build_history(a1).expect("history builds"), history);
    assert_eq!(tree.build_history(a).expect("history builds").len(), 2);
}

#[test]
fn build_history_rejects_pending_nodes() {
    let mut tree = Tree::new("start", 1.0, 1.0);
    let root = tree.root_id();
    assert_eq!(
        tree.build_history(root),
        Err(TreeError::NotMaterialized { node_id: root })
    );
}

#[test]
fn backward_updates_the_path_and_nothing_else() {
    let (mut tree, [root, a, b, a1]) = small_tree();

    tree.backward(a1, 2.0).expect("backward succeeds");
    tree.backward(a1, 4.0).expect("backward succeeds");

    for id in [root, a, a1] {
        let node = tree.node(id).expect("node exists");
        assert_eq!(node.visits(), 2);
        assert!((node.q() - 3.0).abs() < 1e-12);
    }
    let sibling = tree.node(b).expect("b exists");
    assert_eq!(sibling.visits(), 0);
    assert_eq!(sibling.q(), 0.0);
}

#[test]
fn backward_refreshes_child_scores() {
    let (mut tree, [root, a, b, _]) = small_tree();
    assert_eq!(tree.node(b).expect("b").pucb(), 0.0);

    tree.backward(a, 1.0).expect("backward succeeds");

    // root has N = 1 now, so b's bonus is c * prior * sqrt(1) / 1
    let b_node = tree.node(b).expect("b");
    assert!((b_node.pucb() - 2.0 * 0.4).abs() < 1e-12);
    // a: Q = 1, N = 1 -> 1 + 2 * 0.6 * 1 / 2
    let a_node = tree.node(a).expect("a");
    assert!((a_node.pucb() - 1.6).abs() < 1e-12);
    assert_eq!(tree.node(root).expect("root").pucb(), 0.0);
}

#[test]
fn select_leaf_descends_by_score_and_prefers_the_first_tie() {
    let (mut tree, [root, a, b, a1]) = small_tree();
    // all scores are zero while the root is unvisited; ties go to the first child
    assert_eq!(tree.select_leaf(), Ok(a1));

    tree.backward(b, 10.0).expect("backward succeeds");
    assert_eq!(tree.select_leaf(), Ok(b));
    assert_eq!(tree.best_prior_child(root), Ok(Some(a)));
    assert_eq!(tree.best_prior_child(a1), Ok(None));
}

#[test]
fn terminal_counting_covers_the_subtree() {
    let (mut tree, [root, a, b, a1]) = small_tree();
    assert_eq!(tree.count_terminal_descendants(root), Ok(0));

    tree.mark_terminal(a1).expect("mark a1");
    tree.mark_terminal(b).expect("mark b");

    assert_eq!(tree.count_terminal_descendants(root), Ok(2));
    assert_eq!(tree.count_terminal_descendants(a), Ok(1));
    assert_eq!(tree.terminal_nodes(), vec![b, a1]);
}

#[test]
fn materialization_happens_once() {
    let (mut tree, [_, a, _, _]) = small_tree();
    let err = tree
        .materialize(a, said("again"))
        .expect_err("second materialization must fail");
    assert_eq!(err, TreeError::AlreadyMaterialized { node_id: a });
}

#[test]
fn best_trajectory_follows_mean_value() {
    let (mut tree, [_, _, b, _]) = small_tree();
    tree.backward(b, 3.0).expect("backward succeeds");

    let best = tree.best_trajectory_by_value().expect("trajectory builds");
    assert_eq!(best.len(), 2);
    assert_eq!(best[1].strategy, "b");
}

#[test]
fn validate_accepts_built_trees() {
    let (tree, _) = small_tree();
    assert_eq!(tree.validate(), Ok(()));
    assert_eq!(tree.node_count(), 4);
}
