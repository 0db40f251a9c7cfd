use std::collections::BTreeSet;
use std::fmt;

use osm_model::{NodeRef, WayID};

use crate::segment::NodeRefSegment;

/// A ring under construction: a contiguous chain of segments, each sharing an endpoint location
/// with the next. May still be open. Once classified, `outer` says which side of the boundary it
/// is, and outer rings carry the indices of the inner rings they enclose (indices into the
/// assembler's ring list; the ring list owns the rings, these are back references).
#[derive(Clone, Debug)]
pub struct ProtoRing {
    segments: Vec<NodeRefSegment>,
    outer: bool,
    inner_rings: Vec<usize>,
}

impl ProtoRing {
    pub fn new(segment: NodeRefSegment) -> ProtoRing {
        ProtoRing {
            segments: vec![segment],
            outer: true,
            inner_rings: Vec::new(),
        }
    }

    pub fn from_segments(segments: Vec<NodeRefSegment>) -> ProtoRing {
        assert!(!segments.is_empty());
        ProtoRing {
            segments,
            outer: true,
            inner_rings: Vec::new(),
        }
    }

    pub fn segments(&self) -> &[NodeRefSegment] {
        &self.segments
    }

    pub fn first_segment(&self) -> &NodeRefSegment {
        &self.segments[0]
    }

    pub fn last_segment(&self) -> &NodeRefSegment {
        self.segments.last().unwrap()
    }

    pub fn closed(&self) -> bool {
        self.first_segment().first().location == self.last_segment().second().location
    }

    pub fn add_segment_end(&mut self, segment: NodeRefSegment) {
        self.segments.push(segment);
    }

    pub fn add_segment_start(&mut self, segment: NodeRefSegment) {
        self.segments.insert(0, segment);
    }

    /// Reverse the chain direction, keeping chain continuity.
    pub fn reverse(&mut self) {
        for segment in &mut self.segments {
            segment.reverse();
        }
        self.segments.reverse();
    }

    /// Append another ring's chain to this one. The caller has checked that the other ring's
    /// start continues this ring's end.
    pub fn merge(&mut self, other: ProtoRing) {
        self.segments.extend(other.segments);
    }

    /// Like `merge`, for when the other ring continues this one end-to-end.
    pub fn merge_reverse(&mut self, mut other: ProtoRing) {
        other.reverse();
        self.segments.extend(other.segments);
    }

    /// Splice another ring's chain in front of this one.
    pub fn prepend(&mut self, mut other: ProtoRing) {
        std::mem::swap(&mut self.segments, &mut other.segments);
        self.segments.extend(other.segments);
    }

    /// Remove and return the chain tail starting at `at`.
    pub fn split_off(&mut self, at: usize) -> Vec<NodeRefSegment> {
        self.segments.split_off(at)
    }

    /// Remove and return the first `n` segments of the chain.
    pub fn split_head(&mut self, n: usize) -> Vec<NodeRefSegment> {
        self.segments.drain(..n).collect()
    }

    /// Remove and return the chain slice `[from, to)`.
    pub fn remove_range(&mut self, from: usize, to: usize) -> Vec<NodeRefSegment> {
        self.segments.drain(from..to).collect()
    }

    /// The ring vertex with the smallest location by (x, then y). Probe point for the
    /// inner/outer classification.
    pub fn min_node(&self) -> NodeRef {
        let mut min = self.segments[0].first();
        for segment in &self.segments {
            for nr in [segment.first(), segment.second()] {
                if nr.location < min.location {
                    min = nr;
                }
            }
        }
        min
    }

    /// Twice the signed area of the closed chain (shoelace). Positive means counter-clockwise.
    pub fn twice_signed_area(&self) -> i128 {
        let mut sum: i128 = 0;
        for segment in &self.segments {
            let a = segment.first().location;
            let b = segment.second().location;
            sum += i128::from(a.x) * i128::from(b.y) - i128::from(b.x) * i128::from(a.y);
        }
        sum
    }

    pub fn is_cw(&self) -> bool {
        self.twice_signed_area() < 0
    }

    pub fn twice_area(&self) -> i128 {
        self.twice_signed_area().abs()
    }

    /// Is this segment part of the ring? Compares locations in either orientation, since ring
    /// segments may be flipped relative to canonical order.
    pub fn contains_segment(&self, other: &NodeRefSegment) -> bool {
        self.segments.iter().any(|s| {
            (s.first().location == other.first().location
                && s.second().location == other.second().location)
                || (s.first().location == other.second().location
                    && s.second().location == other.first().location)
        })
    }

    /// Even-odd containment test of this ring's minimum vertex against another ring's chain.
    pub fn is_in(&self, outer: &ProtoRing) -> bool {
        let probe = self.min_node().location;
        outer.segments.iter().filter(|s| s.to_left_of(probe)).count() % 2 == 1
    }

    pub fn set_inner(&mut self) {
        self.outer = false;
    }

    pub fn is_outer(&self) -> bool {
        self.outer
    }

    pub fn add_inner_ring(&mut self, idx: usize) {
        self.inner_rings.push(idx);
    }

    pub fn inner_rings(&self) -> &[usize] {
        &self.inner_rings
    }

    /// All ways contributing segments to this ring.
    pub fn ways(&self) -> BTreeSet<WayID> {
        self.segments.iter().map(|s| s.way()).collect()
    }

    /// The ring as a node-ref polyline: the first segment's first endpoint, then every segment's
    /// second. For a closed ring the first and last refs are co-located.
    pub fn node_refs(&self) -> Vec<NodeRef> {
        let mut refs = Vec::with_capacity(self.segments.len() + 1);
        refs.push(self.first_segment().first());
        for segment in &self.segments {
            refs.push(segment.second());
        }
        refs
    }
}

impl fmt::Display for ProtoRing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", segment)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use osm_model::{Location, NodeID};

    use super::*;
    use crate::segment::Role;

    fn nr(id: i64, x: i32, y: i32) -> NodeRef {
        NodeRef::new(NodeID(id), Location::new(x, y))
    }

    // A chain (not canonicalized per segment; built in chain orientation via reverse() where
    // needed) over the given vertex list.
    fn chain(pts: &[(i64, i32, i32)]) -> ProtoRing {
        let mut segments = Vec::new();
        for pair in pts.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let mut s = NodeRefSegment::new(nr(a.0, a.1, a.2), nr(b.0, b.1, b.2), WayID(1), Role::Outer);
            if s.first().id != NodeID(a.0) {
                s.reverse();
            }
            segments.push(s);
        }
        ProtoRing::from_segments(segments)
    }

    #[test]
    fn closed_and_open() {
        let open = chain(&[(1, 0, 0), (2, 10, 0), (3, 10, 10)]);
        assert!(!open.closed());
        let closed = chain(&[(1, 0, 0), (2, 10, 0), (3, 10, 10), (1, 0, 0)]);
        assert!(closed.closed());
    }

    #[test]
    fn winding_flips_with_reverse() {
        let mut ccw = chain(&[(1, 0, 0), (2, 10, 0), (3, 10, 10), (4, 0, 10), (1, 0, 0)]);
        assert!(!ccw.is_cw());
        assert_eq!(ccw.twice_signed_area(), 200);
        ccw.reverse();
        assert!(ccw.is_cw());
        assert_eq!(ccw.twice_signed_area(), -200);
        assert!(ccw.closed());
    }

    #[test]
    fn min_node_scans_both_endpoints() {
        let ring = chain(&[(1, 5, 5), (2, 10, 0), (3, 0, 3), (1, 5, 5)]);
        assert_eq!(ring.min_node().id, NodeID(3));
        assert_eq!(ring.min_node().location, Location::new(0, 3));
    }

    #[test]
    fn containment() {
        let outer = chain(&[(1, 0, 0), (2, 10, 0), (3, 10, 10), (4, 0, 10), (1, 0, 0)]);
        let inner = chain(&[(5, 1, 1), (6, 9, 1), (7, 9, 9), (8, 1, 9), (5, 1, 1)]);
        let outside = chain(&[(9, 20, 20), (10, 30, 20), (11, 30, 30), (12, 20, 30), (9, 20, 20)]);
        assert!(inner.is_in(&outer));
        assert!(!outer.is_in(&inner));
        assert!(!outside.is_in(&outer));
    }

    #[test]
    fn node_refs_walk_the_chain() {
        let ring = chain(&[(1, 0, 0), (2, 10, 0), (3, 10, 10), (1, 0, 0)]);
        let ids: Vec<i64> = ring.node_refs().iter().map(|nr| nr.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 1]);
    }
}
