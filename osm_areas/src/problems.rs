use osm_model::{Location, NodeID, OsmID, WayID};

/// Receives diagnostics about malformed input while an area is being assembled. Reporting is
/// fire-and-forget; implementations must not panic.
pub trait ProblemReporter {
    /// Two node refs at the same location with different ids, or a way with two consecutive refs
    /// to the same node.
    fn report_duplicate_node(&mut self, id1: NodeID, id2: NodeID, location: Location);

    /// Two boundary segments cross each other.
    #[allow(clippy::too_many_arguments)]
    fn report_intersection(
        &mut self,
        object: OsmID,
        way1: WayID,
        way1_from: Location,
        way1_to: Location,
        way2: WayID,
        way2_from: Location,
        way2_to: Location,
        intersection: Location,
    );

    /// A ring couldn't be closed; the two locations are its dangling endpoints.
    fn report_ring_not_closed(&mut self, object: OsmID, start: Location, end: Location);

    /// A segment of an outer ring came from a member whose role isn't "outer".
    fn report_role_should_be_outer(&mut self, object: OsmID, way: WayID, from: Location, to: Location);

    /// A segment of an inner ring came from a member whose role isn't "inner".
    fn report_role_should_be_inner(&mut self, object: OsmID, way: WayID, from: Location, to: Location);
}

#[derive(Clone, Debug, PartialEq)]
pub enum Problem {
    DuplicateNode {
        id1: NodeID,
        id2: NodeID,
        location: Location,
    },
    Intersection {
        object: OsmID,
        way1: WayID,
        way1_from: Location,
        way1_to: Location,
        way2: WayID,
        way2_from: Location,
        way2_to: Location,
        intersection: Location,
    },
    RingNotClosed {
        object: OsmID,
        start: Location,
        end: Location,
    },
    RoleShouldBeOuter {
        object: OsmID,
        way: WayID,
        from: Location,
        to: Location,
    },
    RoleShouldBeInner {
        object: OsmID,
        way: WayID,
        from: Location,
        to: Location,
    },
}

/// Records every problem for later inspection.
#[derive(Debug, Default)]
pub struct CollectedProblems {
    pub problems: Vec<Problem>,
}

impl ProblemReporter for CollectedProblems {
    fn report_duplicate_node(&mut self, id1: NodeID, id2: NodeID, location: Location) {
        self.problems.push(Problem::DuplicateNode { id1, id2, location });
    }

    fn report_intersection(
        &mut self,
        object: OsmID,
        way1: WayID,
        way1_from: Location,
        way1_to: Location,
        way2: WayID,
        way2_from: Location,
        way2_to: Location,
        intersection: Location,
    ) {
        self.problems.push(Problem::Intersection {
            object,
            way1,
            way1_from,
            way1_to,
            way2,
            way2_from,
            way2_to,
            intersection,
        });
    }

    fn report_ring_not_closed(&mut self, object: OsmID, start: Location, end: Location) {
        self.problems.push(Problem::RingNotClosed { object, start, end });
    }

    fn report_role_should_be_outer(&mut self, object: OsmID, way: WayID, from: Location, to: Location) {
        self.problems.push(Problem::RoleShouldBeOuter { object, way, from, to });
    }

    fn report_role_should_be_inner(&mut self, object: OsmID, way: WayID, from: Location, to: Location) {
        self.problems.push(Problem::RoleShouldBeInner { object, way, from, to });
    }
}

/// Forwards every problem to the log.
#[derive(Debug, Default)]
pub struct LoggedProblems {
    pub count: usize,
}

impl ProblemReporter for LoggedProblems {
    fn report_duplicate_node(&mut self, id1: NodeID, id2: NodeID, location: Location) {
        self.count += 1;
        warn!("duplicate node at {}: {} and {}", location, id1, id2);
    }

    fn report_intersection(
        &mut self,
        object: OsmID,
        way1: WayID,
        way1_from: Location,
        way1_to: Location,
        way2: WayID,
        way2_from: Location,
        way2_to: Location,
        intersection: Location,
    ) {
        self.count += 1;
        warn!(
            "{}: segment {}--{} of {} intersects {}--{} of {} at {}",
            object, way1_from, way1_to, way1, way2_from, way2_to, way2, intersection
        );
    }

    fn report_ring_not_closed(&mut self, object: OsmID, start: Location, end: Location) {
        self.count += 1;
        warn!("{}: ring not closed, open ends at {} and {}", object, start, end);
    }

    fn report_role_should_be_outer(&mut self, object: OsmID, way: WayID, from: Location, to: Location) {
        self.count += 1;
        warn!(
            "{}: segment {}--{} of {} is in an outer ring, member role should be \"outer\"",
            object, from, to, way
        );
    }

    fn report_role_should_be_inner(&mut self, object: OsmID, way: WayID, from: Location, to: Location) {
        self.count += 1;
        warn!(
            "{}: segment {}--{} of {} is in an inner ring, member role should be \"inner\"",
            object, from, to, way
        );
    }
}
