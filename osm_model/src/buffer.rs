use serde::{Deserialize, Serialize};

use crate::{Area, Way};

/// Holds the member ways collected for a relation before assembly. The collector pushes ways and
/// records the returned offsets, aligned by index with the relation's member list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectBuffer {
    ways: Vec<Way>,
}

impl ObjectBuffer {
    pub fn new() -> ObjectBuffer {
        ObjectBuffer { ways: Vec::new() }
    }

    pub fn push_way(&mut self, way: Way) -> usize {
        self.ways.push(way);
        self.ways.len() - 1
    }

    pub fn way(&self, offset: usize) -> &Way {
        &self.ways[offset]
    }
}

/// The output side: an append-only list of area records. `commit` appends a header; the assembler
/// extends the committed record in place once assembly succeeds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaBuffer {
    areas: Vec<Area>,
}

impl AreaBuffer {
    pub fn new() -> AreaBuffer {
        AreaBuffer { areas: Vec::new() }
    }

    pub fn commit(&mut self, area: Area) -> usize {
        self.areas.push(area);
        self.areas.len() - 1
    }

    pub fn area(&self, idx: usize) -> &Area {
        &self.areas[idx]
    }

    pub fn area_mut(&mut self, idx: usize) -> &mut Area {
        &mut self.areas[idx]
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }
}
