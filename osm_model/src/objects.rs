use serde::{Deserialize, Serialize};

use crate::{Location, NodeID, OsmID, RelationID, Tags, WayID};

/// A node reference as it appears in a way: the node's id plus its resolved location.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: NodeID,
    pub location: Location,
}

impl NodeRef {
    pub fn new(id: NodeID, location: Location) -> NodeRef {
        NodeRef { id, location }
    }
}

/// Attributes every OSM object carries. Copied verbatim onto areas assembled from the object.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub version: u32,
    pub changeset: u64,
    /// Seconds since the epoch.
    pub timestamp: i64,
    pub visible: bool,
    pub uid: u64,
    pub user: String,
}

impl Default for ObjectMeta {
    fn default() -> ObjectMeta {
        ObjectMeta {
            version: 0,
            changeset: 0,
            timestamp: 0,
            visible: true,
            uid: 0,
            user: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeID,
    pub meta: ObjectMeta,
    pub tags: Tags,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Way {
    pub id: WayID,
    pub meta: ObjectMeta,
    pub tags: Tags,
    pub node_refs: Vec<NodeRef>,
}

impl Way {
    /// Closed in the OSM sense: the first and last node refs are the same node.
    pub fn is_closed(&self) -> bool {
        self.ends_have_same_id()
    }

    pub fn ends_have_same_id(&self) -> bool {
        match (self.node_refs.first(), self.node_refs.last()) {
            (Some(a), Some(b)) => a.id == b.id,
            _ => true,
        }
    }

    pub fn ends_have_same_location(&self) -> bool {
        match (self.node_refs.first(), self.node_refs.last()) {
            (Some(a), Some(b)) => a.location == b.location,
            _ => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationMember {
    pub member: OsmID,
    pub role: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationID,
    pub meta: ObjectMeta,
    pub tags: Tags,
    pub members: Vec<RelationMember>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    pub id: i64,
    pub tags: Tags,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum ItemType {
    Node,
    Way,
    Relation,
    Changeset,
}

/// One item of a sorted OSM stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OsmObj {
    Node(Node),
    Way(Way),
    Relation(Relation),
    Changeset(Changeset),
}

impl OsmObj {
    pub fn item_type(&self) -> ItemType {
        match self {
            OsmObj::Node(_) => ItemType::Node,
            OsmObj::Way(_) => ItemType::Way,
            OsmObj::Relation(_) => ItemType::Relation,
            OsmObj::Changeset(_) => ItemType::Changeset,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            OsmObj::Node(n) => n.id.0,
            OsmObj::Way(w) => w.id.0,
            OsmObj::Relation(r) => r.id.0,
            OsmObj::Changeset(c) => c.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn way(ids: &[i64]) -> Way {
        Way {
            id: WayID(1),
            meta: ObjectMeta::default(),
            tags: Tags::empty(),
            node_refs: ids
                .iter()
                .map(|id| NodeRef::new(NodeID(*id), Location::new(*id as i32, 0)))
                .collect(),
        }
    }

    #[test]
    fn closed_ways() {
        assert!(way(&[1, 2, 3, 1]).is_closed());
        assert!(!way(&[1, 2, 3, 4]).is_closed());
        // degenerate ways don't panic
        assert!(way(&[]).is_closed());
        assert!(way(&[1]).is_closed());
    }
}
