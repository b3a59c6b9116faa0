use proptest::prelude::*;

use crate::{Tree, Turn};

fn chain() -> (Tree, Vec<crate::NodeId>) {
    let mut tree = Tree::new("start", 1.0, 1.0);
    let root = tree.root_id();
    let mid = tree.add_child(root, "mid", 0.5).expect("mid");
    let leaf = tree.add_child(mid, "leaf", 0.5).expect("leaf");
    let side = tree.add_child(root, "side", 0.5).expect("side");
    for id in [root, mid, leaf, side] {
        tree.materialize(
            id,
            Turn {
                responder: "r".to_string(),
                counterpart: Some("c".to_string()),
                is_terminal: false,
            },
        )
        .expect("materialize");
    }
    (tree, vec![root, mid, leaf, side])
}

proptest! {
    #[test]
    fn visits_and_means_track_every_reward(rewards in proptest::collection::vec(-10.0f64..10.0, 1..64)) {
        let (mut tree, ids) = chain();
        for reward in &rewards {
            tree.backward(ids[2], *reward).expect("backward succeeds");
        }

        let expected_mean = rewards.iter().sum::<f64>() / rewards.len() as f64;
        for id in &ids[..3] {
            let node = tree.node(*id).expect("node exists");
            prop_assert_eq!(node.visits(), rewards.len() as u64);
            prop_assert!((node.q() - expected_mean).abs() < 1e-9);
        }
        let side = tree.node(ids[3]).expect("side exists");
        prop_assert_eq!(side.visits(), 0);
    }

    #[test]
    fn mean_does_not_depend_on_reward_order(rewards in proptest::collection::vec(-10.0f64..10.0, 1..32)) {
        let (mut forward, ids) = chain();
        let (mut reversed, _) = chain();
        for reward in &rewards {
            forward.backward(ids[2], *reward).expect("backward succeeds");
        }
        for reward in rewards.iter().rev() {
            reversed.backward(ids[2], *reward).expect("backward succeeds");
        }

        let a = forward.node(ids[0]).expect("root");
        let b = reversed.node(ids[0]).expect("root");
        prop_assert_eq!(a.visits(), b.visits());
        prop_assert!((a.q() - b.q()).abs() < 1e-9);
    }
}
