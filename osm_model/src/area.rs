use serde::{Deserialize, Serialize};

use crate::{AreaID, NodeRef, ObjectMeta, Tags};

/// One outer ring and the inner rings it encloses. Every ring is an ordered node-ref polyline
/// whose first and last refs are co-located.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingGroup {
    pub outer: Vec<NodeRef>,
    pub inner: Vec<Vec<NodeRef>>,
}

/// An assembled area record. The assembler commits the header (id, metadata) first and fills in
/// tags and rings only when assembly succeeds, so a record with no ring groups marks a failed
/// assembly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaID,
    pub meta: ObjectMeta,
    pub tags: Tags,
    pub ring_groups: Vec<RingGroup>,
}

impl Area {
    pub fn header(id: AreaID, meta: ObjectMeta) -> Area {
        Area {
            id,
            meta,
            tags: Tags::empty(),
            ring_groups: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.ring_groups.is_empty()
    }
}
