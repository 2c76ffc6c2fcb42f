//! Host-side ownership of spawned instances.
//!
//! The terrain core never tracks what it placed. Each pass the host destroys
//! every instance it realized from the previous result and creates one per new
//! request.

use glam::{DQuat, DVec3};
use strata_terrain::{PlacementRequest, PrototypeId, SpawnRule};
use tracing::{debug, warn};

/// A realized prop.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub id: u64,
    pub prototype: PrototypeId,
    pub position: DVec3,
    pub orientation: DQuat,
}

/// Counts from one [`InstanceSet::replace_all`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaceStats {
    pub destroyed: usize,
    pub created: usize,
}

/// Every instance currently owned by the host.
#[derive(Debug, Default)]
pub struct InstanceSet {
    instances: Vec<Instance>,
    next_id: u64,
}

impl InstanceSet {
    /// Destroy all managed instances, then realize `requests`.
    ///
    /// Requests naming a rule outside `rules` are skipped.
    pub fn replace_all(
        &mut self,
        requests: &[PlacementRequest],
        rules: &[SpawnRule],
    ) -> ReplaceStats {
        let destroyed = self.instances.len();
        self.instances.clear();

        for request in requests {
            let Some(rule) = rules.get(request.rule_index) else {
                warn!(rule = request.rule_index, "placement names an unknown rule");
                continue;
            };
            self.instances.push(Instance {
                id: self.next_id,
                prototype: rule.prototype,
                position: request.world_position,
                orientation: request.orientation,
            });
            self.next_id += 1;
        }

        let stats = ReplaceStats {
            destroyed,
            created: self.instances.len(),
        };
        debug!(
            destroyed = stats.destroyed,
            created = stats.created,
            "replaced instances"
        );
        stats
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances realized from `prototype`.
    pub fn count_of(&self, prototype: PrototypeId) -> usize {
        self.instances
            .iter()
            .filter(|i| i.prototype == prototype)
            .count()
    }
}
