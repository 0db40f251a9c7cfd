use std::cmp::Ordering;
use std::fmt;

use osm_model::{Location, NodeRef, ObjectBuffer, OsmID, Relation, Way, WayID};

use crate::problems::ProblemReporter;

/// The role the segment's origin way plays in the relation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Outer,
    Inner,
    Unknown,
}

impl Role {
    pub fn from_member(role: &str) -> Role {
        match role {
            "outer" => Role::Outer,
            "inner" => Role::Inner,
            _ => Role::Unknown,
        }
    }
}

/// A directed segment between two node refs, remembering which way it came from and with what
/// role. Constructed in canonical orientation: `first` is the lexicographically smaller endpoint
/// by (x, y), so geometrically identical segments from different ways compare equal.
#[derive(Clone, Copy, Debug)]
pub struct NodeRefSegment {
    first: NodeRef,
    second: NodeRef,
    way: WayID,
    role: Role,
}

impl NodeRefSegment {
    pub fn new(a: NodeRef, b: NodeRef, way: WayID, role: Role) -> NodeRefSegment {
        if b.location < a.location {
            NodeRefSegment { first: b, second: a, way, role }
        } else {
            NodeRefSegment { first: a, second: b, way, role }
        }
    }

    pub fn first(&self) -> NodeRef {
        self.first
    }

    pub fn second(&self) -> NodeRef {
        self.second
    }

    pub fn way(&self) -> WayID {
        self.way
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Swap the endpoints. Rings under construction hold segments in chain orientation, which may
    /// be the reverse of the canonical one.
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.first, &mut self.second);
    }

    /// Full sort order: endpoint locations bottom-left to top-right, with node and way ids as
    /// tie-breaks so the order is deterministic for duplicated geometry.
    pub fn location_cmp(&self, other: &NodeRefSegment) -> Ordering {
        self.first
            .location
            .cmp(&other.first.location)
            .then(self.second.location.cmp(&other.second.location))
            .then(self.first.id.cmp(&other.first.id))
            .then(self.second.id.cmp(&other.second.id))
            .then(self.way.cmp(&other.way))
    }

    /// Does this segment cross the leftward horizontal ray from `loc`? Segments touching `loc`
    /// with an endpoint don't count; the caller corrects for grazed vertices separately.
    pub fn to_left_of(&self, loc: Location) -> bool {
        if self.first.location == loc || self.second.location == loc {
            return false;
        }
        let (low, high) = if self.first.location.y < self.second.location.y {
            (self.first.location, self.second.location)
        } else {
            (self.second.location, self.first.location)
        };
        // Half-open in y so a crossing at a shared vertex is counted exactly once.
        if low.y >= loc.y || high.y < loc.y {
            return false;
        }
        // Crossing x at loc.y is strictly left of loc.x, in exact arithmetic: with dy > 0,
        // low.x + dx * (loc.y - low.y) / dy < loc.x
        let lhs = i128::from(high.x as i64 - low.x as i64) * i128::from(loc.y as i64 - low.y as i64);
        let rhs = i128::from(loc.x as i64 - low.x as i64) * i128::from(high.y as i64 - low.y as i64);
        lhs < rhs
    }
}

/// Two segments are equal iff both endpoints share locations. Node and way ids don't matter:
/// duplicate geometry from different ways must cancel in the dedup step.
impl PartialEq for NodeRefSegment {
    fn eq(&self, other: &NodeRefSegment) -> bool {
        self.first.location == other.first.location && self.second.location == other.second.location
    }
}

impl Eq for NodeRefSegment {}

impl fmt::Display for NodeRefSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}--{}", self.first.location, self.second.location)
    }
}

fn y_range_overlap(s1: &NodeRefSegment, s2: &NodeRefSegment) -> bool {
    let min1 = s1.first.location.y.min(s1.second.location.y);
    let max1 = s1.first.location.y.max(s1.second.location.y);
    let min2 = s2.first.location.y.min(s2.second.location.y);
    let max2 = s2.first.location.y.max(s2.second.location.y);
    min1 <= max2 && min2 <= max1
}

fn cross(ax: i64, ay: i64, bx: i64, by: i64) -> i128 {
    i128::from(ax) * i128::from(by) - i128::from(ay) * i128::from(bx)
}

/// Exact segment-segment intersection in widened integers. Shared endpoints don't count as
/// intersections, and neither does collinear overlap (it has no single crossing point); an
/// endpoint of one segment in the interior of the other does.
fn calculate_intersection(s1: &NodeRefSegment, s2: &NodeRefSegment) -> Option<Location> {
    let p1 = s1.first.location;
    let p2 = s1.second.location;
    let p3 = s2.first.location;
    let p4 = s2.second.location;

    if p1 == p3 || p1 == p4 || p2 == p3 || p2 == p4 {
        return None;
    }

    let d1x = i64::from(p2.x) - i64::from(p1.x);
    let d1y = i64::from(p2.y) - i64::from(p1.y);
    let d2x = i64::from(p4.x) - i64::from(p3.x);
    let d2y = i64::from(p4.y) - i64::from(p3.y);

    let mut denom = cross(d1x, d1y, d2x, d2y);
    if denom == 0 {
        // Parallel, possibly collinear overlap. Not a crossing point.
        return None;
    }

    let ex = i64::from(p3.x) - i64::from(p1.x);
    let ey = i64::from(p3.y) - i64::from(p1.y);
    let mut na = cross(ex, ey, d2x, d2y);
    let mut nb = cross(ex, ey, d1x, d1y);
    if denom < 0 {
        denom = -denom;
        na = -na;
        nb = -nb;
    }
    // s1 hits at t = na / denom, s2 at u = nb / denom; both must be within [0, 1].
    if na < 0 || na > denom || nb < 0 || nb > denom {
        return None;
    }

    let x = i128::from(p1.x) + na * i128::from(d1x) / denom;
    let y = i128::from(p1.y) + na * i128::from(d1y) / denom;
    Some(Location::new(x as i32, y as i32))
}

/// The owned, ordered collection of way segments an area is assembled from.
#[derive(Debug, Default)]
pub struct SegmentList {
    segments: Vec<NodeRefSegment>,
}

impl SegmentList {
    pub fn new() -> SegmentList {
        SegmentList { segments: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, idx: usize) -> NodeRefSegment {
        self.segments[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeRefSegment> {
        self.segments.iter()
    }

    /// Turn a way's node refs into segments. Consecutive refs to the same node, and co-located
    /// refs with different ids, are anomalies: report them and skip the pair, so segments never
    /// have co-located endpoints.
    pub fn extract_segments_from_way<'b>(
        &mut self,
        way: &Way,
        role: Role,
        mut reporter: Option<&mut (dyn ProblemReporter + 'b)>,
    ) {
        for pair in way.node_refs.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.id == b.id || a.location == b.location {
                if let Some(r) = reporter.as_deref_mut() {
                    r.report_duplicate_node(a.id, b.id, a.location);
                }
                continue;
            }
            self.segments.push(NodeRefSegment::new(a, b, way.id, role));
        }
    }

    /// Extract segments from all member ways of a relation. `member_offsets[i]` locates the way
    /// for member i in `in_buffer`; the member's role string tags the segments.
    pub fn extract_segments_from_members<'b>(
        &mut self,
        relation: &Relation,
        member_offsets: &[usize],
        in_buffer: &ObjectBuffer,
        mut reporter: Option<&mut (dyn ProblemReporter + 'b)>,
    ) {
        for (member, offset) in relation.members.iter().zip(member_offsets) {
            let way = in_buffer.way(*offset);
            self.extract_segments_from_way(way, Role::from_member(&member.role), reporter.as_deref_mut());
        }
    }

    /// Sort bottom-left to top-right. This order drives the x-window of the intersection scan and
    /// the left-scan of the inner/outer classifier.
    pub fn sort(&mut self) {
        self.segments.sort_by(NodeRefSegment::location_cmp);
    }

    /// Remove adjacent equal segments pairwise. Two ways sharing a boundary segment cancel; this
    /// is what makes touching multipolygons work.
    pub fn erase_duplicate_segments(&mut self, debug: bool) {
        let mut i = 0;
        while i + 1 < self.segments.len() {
            if self.segments[i] == self.segments[i + 1] {
                if debug {
                    debug!("  erasing duplicate segment {}", self.segments[i]);
                }
                self.segments.drain(i..=i + 1);
            } else {
                i += 1;
            }
        }
    }

    /// Scan for crossing segments. Any crossing makes the whole multipolygon invalid; all of them
    /// are reported before giving up.
    pub fn find_intersections<'b>(
        &self,
        object: OsmID,
        mut reporter: Option<&mut (dyn ProblemReporter + 'b)>,
        debug: bool,
    ) -> bool {
        if self.is_empty() {
            return false;
        }

        let mut found = false;
        for (i, s1) in self.segments.iter().enumerate() {
            for s2 in &self.segments[i + 1..] {
                if s1 == s2 {
                    if debug {
                        debug!("  found overlap on segment {}", s1);
                    }
                    continue;
                }
                // Segments are sorted by first endpoint, so once s2 starts right of s1's end,
                // nothing later can intersect s1.
                if s2.first.location.x > s1.second.location.x {
                    break;
                }
                if !y_range_overlap(s1, s2) {
                    continue;
                }
                if let Some(at) = calculate_intersection(s1, s2) {
                    found = true;
                    if debug {
                        debug!("  segments {} and {} intersecting at {}", s1, s2, at);
                    }
                    if let Some(r) = reporter.as_deref_mut() {
                        r.report_intersection(
                            object,
                            s1.way,
                            s1.first.location,
                            s1.second.location,
                            s2.way,
                            s2.first.location,
                            s2.second.location,
                            at,
                        );
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use osm_model::{NodeID, ObjectMeta, RelationID, Tags};

    use super::*;
    use crate::problems::{CollectedProblems, Problem};

    fn nr(id: i64, x: i32, y: i32) -> NodeRef {
        NodeRef::new(NodeID(id), Location::new(x, y))
    }

    fn seg(x1: i32, y1: i32, x2: i32, y2: i32) -> NodeRefSegment {
        NodeRefSegment::new(nr(1, x1, y1), nr(2, x2, y2), WayID(1), Role::Outer)
    }

    #[test]
    fn construction_is_canonical() {
        let s = seg(10, 0, 0, 10);
        assert_eq!(s.first().location, Location::new(0, 10));
        assert_eq!(s.second().location, Location::new(10, 0));
    }

    #[test]
    fn equality_ignores_ids() {
        let a = NodeRefSegment::new(nr(1, 0, 0), nr(2, 5, 5), WayID(1), Role::Outer);
        let b = NodeRefSegment::new(nr(7, 5, 5), nr(8, 0, 0), WayID(2), Role::Inner);
        assert_eq!(a, b);
    }

    #[test]
    fn to_left_of_counts_strict_crossings() {
        let probe = Location::new(5, 5);
        // vertical segment west of the probe
        assert!(seg(0, 0, 0, 10).to_left_of(probe));
        // east of the probe
        assert!(!seg(8, 0, 8, 10).to_left_of(probe));
        // entirely below the ray
        assert!(!seg(0, 0, 10, 0).to_left_of(probe));
        // half-open rule: counted when the upper endpoint sits on the ray...
        assert!(seg(0, 0, 0, 5).to_left_of(probe));
        // ...but not when the lower one does
        assert!(!seg(0, 5, 0, 10).to_left_of(probe));
        // touching the probe itself never counts
        assert!(!seg(5, 5, 0, 10).to_left_of(probe));
    }

    #[test]
    fn extraction_skips_and_reports_duplicates() {
        let way = Way {
            id: WayID(1),
            meta: ObjectMeta::default(),
            tags: Tags::empty(),
            node_refs: vec![
                nr(1, 0, 0),
                nr(2, 5, 0),
                nr(2, 5, 0),  // same id twice
                nr(3, 5, 0),  // different id, same location
                nr(4, 5, 5),
            ],
        };
        let mut problems = CollectedProblems::default();
        let mut list = SegmentList::new();
        list.extract_segments_from_way(&way, Role::Outer, Some(&mut problems));

        assert_eq!(list.len(), 2);
        assert_eq!(
            problems.problems,
            vec![
                Problem::DuplicateNode {
                    id1: NodeID(2),
                    id2: NodeID(2),
                    location: Location::new(5, 0),
                },
                Problem::DuplicateNode {
                    id1: NodeID(2),
                    id2: NodeID(3),
                    location: Location::new(5, 0),
                },
            ]
        );
    }

    #[test]
    fn dedup_removes_pairs_and_is_involutive() {
        let mut list = SegmentList::new();
        list.segments.push(seg(0, 0, 5, 0));
        list.segments.push(NodeRefSegment::new(nr(9, 0, 0), nr(8, 5, 0), WayID(2), Role::Outer));
        list.segments.push(seg(5, 0, 5, 5));
        list.sort();
        list.erase_duplicate_segments(false);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0), seg(5, 0, 5, 5));
        // running it again changes nothing
        list.erase_duplicate_segments(false);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn crossing_segments_intersect() {
        let s1 = seg(0, 0, 10, 10);
        let s2 = seg(0, 10, 10, 0);
        assert_eq!(calculate_intersection(&s1, &s2), Some(Location::new(5, 5)));
    }

    #[test]
    fn shared_endpoints_dont_intersect() {
        let s1 = seg(0, 0, 10, 10);
        let s2 = seg(10, 10, 20, 0);
        assert_eq!(calculate_intersection(&s1, &s2), None);
    }

    #[test]
    fn endpoint_in_interior_intersects() {
        // T-touch: s2 ends in the middle of s1
        let s1 = seg(0, 0, 10, 0);
        let s2 = seg(5, 0, 5, 8);
        assert_eq!(calculate_intersection(&s1, &s2), Some(Location::new(5, 0)));
    }

    #[test]
    fn collinear_overlap_is_not_a_crossing() {
        let s1 = seg(0, 0, 10, 0);
        let s2 = seg(5, 0, 15, 0);
        assert_eq!(calculate_intersection(&s1, &s2), None);
    }

    #[test]
    fn disjoint_segments_dont_intersect() {
        let s1 = seg(0, 0, 2, 2);
        let s2 = seg(5, 0, 7, 9);
        assert_eq!(calculate_intersection(&s1, &s2), None);
    }

    #[test]
    fn find_intersections_reports_each_crossing() {
        let mut list = SegmentList::new();
        list.segments.push(NodeRefSegment::new(nr(1, 0, 0), nr(2, 10, 10), WayID(1), Role::Outer));
        list.segments.push(NodeRefSegment::new(nr(3, 0, 10), nr(4, 10, 0), WayID(2), Role::Outer));
        list.sort();

        let mut problems = CollectedProblems::default();
        let object = OsmID::Relation(RelationID(7));
        assert!(list.find_intersections(object, Some(&mut problems), false));
        assert_eq!(problems.problems.len(), 1);
        match &problems.problems[0] {
            Problem::Intersection { intersection, .. } => {
                assert_eq!(*intersection, Location::new(5, 5));
            }
            other => panic!("unexpected problem {:?}", other),
        }
    }

    #[test]
    fn far_apart_segments_are_skipped() {
        let mut list = SegmentList::new();
        list.segments.push(seg(0, 0, 1, 1));
        list.segments.push(seg(5, 0, 6, 1));
        list.sort();
        assert!(!list.find_intersections(OsmID::Relation(RelationID(7)), None, false));
    }
}
