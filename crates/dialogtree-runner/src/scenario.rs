use dialogtree_core::{GoldMessage, GoldTrace, Scenario};
use serde::{Deserialize, Serialize};

/// One entry of a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Names the checkpoint file, so it must be unique within a batch.
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scene: String,
    /// Optional gold dialogue the tree is seeded from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<GoldMessage>,
}

impl ScenarioSpec {
    pub fn scenario(&self) -> Scenario {
        Scenario {
            description: self.description.clone(),
            scene: self.scene.clone(),
        }
    }

    pub fn gold_trace(&self) -> Option<GoldTrace> {
        if self.messages.is_empty() {
            None
        } else {
            Some(GoldTrace::new(self.messages.clone()))
        }
    }
}
