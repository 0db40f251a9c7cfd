use std::collections::{BTreeMap, BTreeSet};

use osm_model::{
    Area, AreaBuffer, AreaID, NodeRef, ObjectBuffer, OsmID, Relation, RingGroup, Tags, Way, WayID,
};

use crate::problems::ProblemReporter;
use crate::ring::ProtoRing;
use crate::segment::{NodeRefSegment, Role, SegmentList};

/// Relation tags that say nothing about what the area is. A relation whose tags are empty after
/// ignoring these follows the old tags-on-outer-ways convention.
const IGNORED_RELATION_KEYS: [&str; 6] =
    ["type", "created_by", "source", "note", "test:id", "test:section"];

/// Same list without "type", used when comparing an inner way's own tags against the area's.
const IGNORED_COMPARE_KEYS: [&str; 5] = ["created_by", "source", "note", "test:id", "test:section"];

/// Assembles area objects from a closed way or from a multipolygon relation and its collected
/// members. All geometric state is transient per invocation; the same assembler can be reused for
/// the next object.
pub struct Assembler<'a, 'b> {
    reporter: Option<&'a mut (dyn ProblemReporter + 'b)>,
    debug: bool,
    segment_list: SegmentList,
    rings: Vec<ProtoRing>,
    object: OsmID,
    outer_rings: Vec<usize>,
    inner_rings: Vec<usize>,
    inner_outer_mismatches: usize,
}

impl<'a, 'b> Assembler<'a, 'b> {
    pub fn new(reporter: Option<&'a mut (dyn ProblemReporter + 'b)>) -> Assembler<'a, 'b> {
        Assembler {
            reporter,
            debug: false,
            segment_list: SegmentList::new(),
            rings: Vec::new(),
            object: OsmID::Way(WayID(0)),
            outer_rings: Vec::new(),
            inner_rings: Vec::new(),
            inner_outer_mismatches: 0,
        }
    }

    /// Enable verbose traces of the geometric decisions through the debug log.
    pub fn enable_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    fn init(&mut self, object: OsmID) {
        self.segment_list.clear();
        self.rings.clear();
        self.outer_rings.clear();
        self.inner_rings.clear();
        self.object = object;
        self.inner_outer_mismatches = 0;
    }

    /// Assemble an area from a single closed way. The resulting record goes into `out_buffer`;
    /// on failure it stays an invalid header-only record.
    pub fn way(&mut self, way: &Way, out_buffer: &mut AreaBuffer) {
        self.init(OsmID::Way(way.id));

        if !way.ends_have_same_id() {
            if let Some(r) = self.reporter.as_deref_mut() {
                let front = way.node_refs[0];
                let back = *way.node_refs.last().unwrap();
                r.report_duplicate_node(front.id, back.id, front.location);
            }
            if self.debug {
                // The end locations may still coincide, in which case the ring closes anyway.
                debug!(
                    "  way ends have different ids, locations {}",
                    if way.ends_have_same_location() { "match" } else { "differ" }
                );
            }
        }

        self.segment_list
            .extract_segments_from_way(way, Role::Outer, self.reporter.as_deref_mut());

        if self.debug {
            debug!("build {} segments={}", way.id, self.segment_list.len());
        }

        let idx = out_buffer.commit(Area::header(AreaID::from_way(way.id), way.meta.clone()));

        if !self.stage2() {
            return;
        }

        out_buffer.area_mut(idx).tags = way.tags.clone();
        out_buffer.area_mut(idx).ring_groups = self.ring_groups();
    }

    /// Assemble an area from a relation and its members. `member_offsets[i]` locates the way for
    /// member i in `in_buffer`. The area header is committed before any geometry runs, so a
    /// failed assembly leaves an invalid record for the caller to observe.
    pub fn relation(
        &mut self,
        relation: &Relation,
        member_offsets: &[usize],
        in_buffer: &ObjectBuffer,
        out_buffer: &mut AreaBuffer,
    ) {
        self.init(OsmID::Relation(relation.id));

        self.segment_list.extract_segments_from_members(
            relation,
            member_offsets,
            in_buffer,
            self.reporter.as_deref_mut(),
        );

        if self.debug {
            debug!(
                "build {} members={} segments={}",
                relation.id,
                member_offsets.len(),
                self.segment_list.len()
            );
        }

        let idx = out_buffer.commit(Area::header(
            AreaID::from_relation(relation.id),
            relation.meta.clone(),
        ));

        if !self.stage2() {
            return;
        }

        out_buffer.area_mut(idx).tags = self.relation_area_tags(relation, member_offsets, in_buffer);
        out_buffer.area_mut(idx).ring_groups = self.ring_groups();

        // An inner way carrying its own tags is an independent feature (a building in a
        // courtyard): emit it as a standalone area. Only safe when all member roles checked out.
        if self.inner_outer_mismatches == 0 {
            let area_tags = out_buffer.area(idx).tags.without_keys(&IGNORED_COMPARE_KEYS);
            for (member, offset) in relation.members.iter().zip(member_offsets) {
                if member.role != "inner" {
                    continue;
                }
                let way = in_buffer.way(*offset);
                if !way.is_closed() || way.tags.is_empty() {
                    continue;
                }
                let way_tags = way.tags.without_keys(&IGNORED_COMPARE_KEYS);
                if !way_tags.is_empty() && way_tags != area_tags {
                    self.way(way, out_buffer);
                }
            }
        }
    }

    /// The geometric half: sort and dedup the segments, reject crossings, stitch rings, classify
    /// them, and audit member roles. Returns false if no valid area can come out of this input.
    fn stage2(&mut self) -> bool {
        // Sorts all segments from bottom left to top right.
        self.segment_list.sort();
        self.segment_list.erase_duplicate_segments(self.debug);

        if self
            .segment_list
            .find_intersections(self.object, self.reporter.as_deref_mut(), self.debug)
        {
            return false;
        }

        // Tack each segment onto either end of an existing ring if possible, else start a new
        // ring with it.
        for i in 0..self.segment_list.len() {
            let segment = self.segment_list.get(i);
            if self.debug {
                debug!("  checking segment {}", segment);
            }
            if !self.add_to_existing_ring(segment) {
                if self.debug {
                    debug!("    new ring for segment {}", segment);
                }
                self.rings.push(ProtoRing::new(segment));
            }
        }

        if self.check_for_open_rings() {
            if self.debug {
                debug!("  not all rings are closed");
            }
            return false;
        }

        if self.rings.len() == 1 {
            // A lone ring is outer by definition.
            if self.rings[0].is_cw() {
                self.rings[0].reverse();
            }
            self.outer_rings.push(0);
        } else {
            for idx in 0..self.rings.len() {
                self.classify_inner_outer(idx);
                if self.rings[idx].is_outer() {
                    if self.rings[idx].is_cw() {
                        self.rings[idx].reverse();
                    }
                    self.outer_rings.push(idx);
                } else {
                    if !self.rings[idx].is_cw() {
                        self.rings[idx].reverse();
                    }
                    self.inner_rings.push(idx);
                }
            }

            if self.outer_rings.len() == 1 {
                let outer = self.outer_rings[0];
                for ii in 0..self.inner_rings.len() {
                    let inner = self.inner_rings[ii];
                    self.rings[outer].add_inner_ring(inner);
                }
            } else {
                // Smallest outer ring first, so in nested configurations an inner ring attaches
                // to its innermost container.
                let rings = &self.rings;
                self.outer_rings.sort_by_key(|idx| rings[*idx].twice_area());
                for ii in 0..self.inner_rings.len() {
                    let inner = self.inner_rings[ii];
                    for oi in 0..self.outer_rings.len() {
                        let outer = self.outer_rings[oi];
                        if self.rings[inner].is_in(&self.rings[outer]) {
                            self.rings[outer].add_inner_ring(inner);
                            break;
                        }
                    }
                }
            }
        }

        self.audit_roles();

        true
    }

    /// Same location means same place, whatever the ids say; ids disagreeing about a shared
    /// location is a duplicate-node anomaly worth reporting.
    fn has_same_location(&mut self, a: NodeRef, b: NodeRef) -> bool {
        if a.location != b.location {
            return false;
        }
        if a.id != b.id {
            if let Some(r) = self.reporter.as_deref_mut() {
                r.report_duplicate_node(a.id, b.id, a.location);
            }
        }
        true
    }

    /// Try the four endpoint matches against each open ring, earliest ring and earliest match
    /// winning. Returns false if the segment fits nowhere.
    fn add_to_existing_ring(&mut self, mut segment: NodeRefSegment) -> bool {
        for idx in 0..self.rings.len() {
            if self.rings[idx].closed() {
                continue;
            }
            let ring_last = self.rings[idx].last_segment().second();
            let ring_first = self.rings[idx].first_segment().first();

            if self.has_same_location(ring_last, segment.first()) {
                self.combine_rings(idx, segment, true);
                return true;
            }
            if self.has_same_location(ring_last, segment.second()) {
                segment.reverse();
                self.combine_rings(idx, segment, true);
                return true;
            }
            if self.has_same_location(ring_first, segment.first()) {
                segment.reverse();
                self.combine_rings(idx, segment, false);
                return true;
            }
            if self.has_same_location(ring_first, segment.second()) {
                self.combine_rings(idx, segment, false);
                return true;
            }
        }
        false
    }

    fn combine_rings(&mut self, idx: usize, segment: NodeRefSegment, at_end: bool) {
        if self.debug {
            debug!("    match at {} of ring {}", if at_end { "end" } else { "start" }, self.rings[idx]);
        }
        if at_end {
            let nr = segment.second();
            self.rings[idx].add_segment_end(segment);
            self.split_closed_subring_end(idx, nr);
            if let Some(idx) = self.merge_with_open_ring_end(idx) {
                self.split_repeated_vertex(idx);
            }
        } else {
            let nr = segment.first();
            self.rings[idx].add_segment_start(segment);
            self.split_closed_subring_start(idx, nr);
            if let Some(idx) = self.merge_with_open_ring_start(idx) {
                self.split_repeated_vertex(idx);
            }
        }
    }

    /// After appending at the end: if some interior vertex equals the new end, the chain from
    /// that vertex onwards closed on itself. Split it off as its own ring.
    fn split_closed_subring_end(&mut self, idx: usize, nr: NodeRef) -> bool {
        let len = self.rings[idx].segments().len();
        if len < 3 {
            return false;
        }
        for i in 1..len - 1 {
            let candidate = self.rings[idx].segments()[i].first();
            if self.has_same_location(nr, candidate) {
                let tail = self.rings[idx].split_off(i);
                self.rings.push(ProtoRing::from_segments(tail));
                if self.debug {
                    debug!(
                        "      subring split: {} and {}",
                        self.rings[idx],
                        self.rings.last().unwrap()
                    );
                }
                return true;
            }
        }
        false
    }

    /// Mirror of `split_closed_subring_end` for a prepend: the head of the chain up to the
    /// matching interior vertex is the closed part.
    fn split_closed_subring_start(&mut self, idx: usize, nr: NodeRef) -> bool {
        let len = self.rings[idx].segments().len();
        if len < 3 {
            return false;
        }
        for i in 1..len - 1 {
            let candidate = self.rings[idx].segments()[i].second();
            if self.has_same_location(nr, candidate) {
                let head = self.rings[idx].split_head(i + 1);
                self.rings.push(ProtoRing::from_segments(head));
                if self.debug {
                    debug!(
                        "      subring split: {} and {}",
                        self.rings.last().unwrap(),
                        self.rings[idx]
                    );
                }
                return true;
            }
        }
        false
    }

    /// If some other open ring continues this ring's end, splice it on (reversed if needed) and
    /// drop it from the ring list. Returns the ring's possibly shifted index when a merge
    /// happened.
    fn merge_with_open_ring_end(&mut self, idx: usize) -> Option<usize> {
        let nr = self.rings[idx].last_segment().second();
        for j in 0..self.rings.len() {
            if j == idx || self.rings[j].closed() {
                continue;
            }
            let j_first = self.rings[j].first_segment().first();
            if self.has_same_location(nr, j_first) {
                let other = self.rings.remove(j);
                let idx = if j < idx { idx - 1 } else { idx };
                self.rings[idx].merge(other);
                return Some(idx);
            }
            let j_last = self.rings[j].last_segment().second();
            if self.has_same_location(nr, j_last) {
                let other = self.rings.remove(j);
                let idx = if j < idx { idx - 1 } else { idx };
                self.rings[idx].merge_reverse(other);
                return Some(idx);
            }
        }
        None
    }

    fn merge_with_open_ring_start(&mut self, idx: usize) -> Option<usize> {
        let nr = self.rings[idx].first_segment().first();
        for j in 0..self.rings.len() {
            if j == idx || self.rings[j].closed() {
                continue;
            }
            let j_last = self.rings[j].last_segment().second();
            if self.has_same_location(nr, j_last) {
                let other = self.rings.remove(j);
                let idx = if j < idx { idx - 1 } else { idx };
                self.rings[idx].prepend(other);
                return Some(idx);
            }
            let j_first = self.rings[j].first_segment().first();
            if self.has_same_location(nr, j_first) {
                let other = self.rings.remove(j);
                let idx = if j < idx { idx - 1 } else { idx };
                self.rings[idx].reverse();
                self.rings[idx].merge(other);
                return Some(idx);
            }
        }
        None
    }

    /// After two chains merged, the result can visit one interior vertex twice. The loop between
    /// the two visits is a ring of its own; split it off.
    fn split_repeated_vertex(&mut self, idx: usize) -> bool {
        let mut sorted: Vec<NodeRefSegment> = self.rings[idx].segments().to_vec();
        sorted.sort_by(NodeRefSegment::location_cmp);

        let mut pair: Option<(NodeRefSegment, NodeRefSegment)> = None;
        for i in 0..sorted.len().saturating_sub(1) {
            let (a, b) = (sorted[i], sorted[i + 1]);
            if self.has_same_location(a.first(), b.first()) {
                pair = Some((a, b));
                break;
            }
        }
        let (a, b) = match pair {
            Some(pair) => pair,
            None => return false,
        };

        let position = |needle: &NodeRefSegment, segments: &[NodeRefSegment]| {
            segments
                .iter()
                .position(|s| {
                    s.first().location == needle.first().location
                        && s.second().location == needle.second().location
                })
                .unwrap()
        };
        let p1 = position(&a, self.rings[idx].segments());
        let p2 = position(&b, self.rings[idx].segments());
        let (from, to) = (p1.min(p2), p1.max(p2));

        let mid = self.rings[idx].remove_range(from, to);
        self.rings.push(ProtoRing::from_segments(mid));
        if self.debug {
            debug!(
                "      repeated vertex split: {} and {}",
                self.rings[idx],
                self.rings.last().unwrap()
            );
        }
        true
    }

    fn check_for_open_rings(&mut self) -> bool {
        let mut open = false;
        for idx in 0..self.rings.len() {
            if !self.rings[idx].closed() {
                open = true;
                let start = self.rings[idx].first_segment().first().location;
                let end = self.rings[idx].last_segment().second().location;
                if let Some(r) = self.reporter.as_deref_mut() {
                    r.report_ring_not_closed(self.object, start, end);
                }
            }
        }
        open
    }

    /// Ray-cast from the ring's minimum vertex against the sorted segment list. Odd crossing
    /// parity means some other ring wraps this one, so it is inner.
    fn classify_inner_outer(&mut self, idx: usize) {
        let min_node = self.rings[idx].min_node();
        if self.debug {
            debug!("    classify ring {} min_node={}", self.rings[idx], min_node.location);
        }

        let mut count = 0;
        let mut above = 0;

        for segment in self.segment_list.iter() {
            if segment.first().location.x > min_node.location.x {
                break;
            }
            if self.rings[idx].contains_segment(segment) {
                continue;
            }
            if segment.to_left_of(min_node.location) {
                count += 1;
            }
            // Segments grazing the probe vertex aren't counted by the ray test; track how many
            // leave it upward and use their parity to correct the count.
            if segment.first().location == min_node.location
                && segment.second().location.y > min_node.location.y
            {
                above += 1;
            }
            if segment.second().location == min_node.location
                && segment.first().location.y > min_node.location.y
            {
                above += 1;
            }
        }

        count += above % 2;

        if count % 2 == 1 {
            self.rings[idx].set_inner();
        }
    }

    /// Every outer-ring segment should come from an "outer" member, every inner-ring segment
    /// from an "inner" one. Mismatches are reported and make the inner-way tag rescue unsafe.
    fn audit_roles(&mut self) {
        for oi in 0..self.outer_rings.len() {
            let idx = self.outer_rings[oi];
            for si in 0..self.rings[idx].segments().len() {
                let segment = self.rings[idx].segments()[si];
                if segment.role() != Role::Outer {
                    self.inner_outer_mismatches += 1;
                    if let Some(r) = self.reporter.as_deref_mut() {
                        r.report_role_should_be_outer(
                            self.object,
                            segment.way(),
                            segment.first().location,
                            segment.second().location,
                        );
                    }
                }
            }
        }
        for ii in 0..self.inner_rings.len() {
            let idx = self.inner_rings[ii];
            for si in 0..self.rings[idx].segments().len() {
                let segment = self.rings[idx].segments()[si];
                if segment.role() != Role::Inner {
                    self.inner_outer_mismatches += 1;
                    if let Some(r) = self.reporter.as_deref_mut() {
                        r.report_role_should_be_inner(
                            self.object,
                            segment.way(),
                            segment.first().location,
                            segment.second().location,
                        );
                    }
                }
            }
        }
    }

    /// Tag selection for a relation-sourced area: the relation's own tags if it has any
    /// meaningful ones, else the tags of the outer ways (all of them when they agree).
    fn relation_area_tags(
        &self,
        relation: &Relation,
        member_offsets: &[usize],
        in_buffer: &ObjectBuffer,
    ) -> Tags {
        let meaningful = relation.tags.without_keys(&IGNORED_RELATION_KEYS);
        if self.debug {
            debug!("  {} meaningful tags on relation", meaningful.len());
        }

        if !meaningful.is_empty() {
            let mut tags = relation.tags.clone();
            tags.remove("type");
            return tags;
        }

        // Tags-on-outer-ways convention.
        let mut outer_ways: BTreeSet<WayID> = BTreeSet::new();
        for idx in &self.outer_rings {
            outer_ways.extend(self.rings[*idx].ways());
        }
        let tags_by_way: BTreeMap<WayID, &Tags> = member_offsets
            .iter()
            .map(|offset| {
                let way = in_buffer.way(*offset);
                (way.id, &way.tags)
            })
            .collect();

        if outer_ways.len() == 1 {
            let only = outer_ways.iter().next().unwrap();
            return tags_by_way[only].clone();
        }

        // Multiple outer ways: keep only the tags they all agree on.
        let mut counter: BTreeMap<(&String, &String), usize> = BTreeMap::new();
        for way in &outer_ways {
            for kv in tags_by_way[way].iter() {
                *counter.entry(kv).or_insert(0) += 1;
            }
        }
        let mut tags = Tags::empty();
        for ((k, v), n) in counter {
            if n == outer_ways.len() {
                tags.insert(k.clone(), v.clone());
            }
        }
        tags
    }

    /// Each outer ring with its inner rings, as node-ref polylines.
    fn ring_groups(&self) -> Vec<RingGroup> {
        self.outer_rings
            .iter()
            .map(|outer| RingGroup {
                outer: self.rings[*outer].node_refs(),
                inner: self.rings[*outer]
                    .inner_rings()
                    .iter()
                    .map(|inner| self.rings[*inner].node_refs())
                    .collect(),
            })
            .collect()
    }
}
