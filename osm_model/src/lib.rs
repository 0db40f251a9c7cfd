//! The OSM object model shared by the area assembler and the streaming pipeline: typed ids,
//! fixed-point locations, tags, the raw objects themselves, and the buffers member ways are read
//! from and assembled areas are written into.

mod area;
mod buffer;
mod ids;
mod location;
mod objects;
mod tags;

pub use crate::area::{Area, RingGroup};
pub use crate::buffer::{AreaBuffer, ObjectBuffer};
pub use crate::ids::{AreaID, NodeID, OsmID, RelationID, WayID};
pub use crate::location::Location;
pub use crate::objects::{
    Changeset, ItemType, Node, NodeRef, ObjectMeta, OsmObj, Relation, RelationMember, Way,
};
pub use crate::tags::Tags;
