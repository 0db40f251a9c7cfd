use osm_model::{Changeset, ItemType, Node, OsmObj, Relation, Way};

/// A three-item window over one entity's history: the previous and next versions of the same
/// object alongside the current one. At the boundaries of a run the current item stands in for
/// the missing neighbor, so `prev.id == cur.id == next.id` always holds.
#[derive(Clone, Copy, Debug)]
pub struct DiffNode<'a> {
    pub prev: &'a Node,
    pub cur: &'a Node,
    pub next: &'a Node,
}

#[derive(Clone, Copy, Debug)]
pub struct DiffWay<'a> {
    pub prev: &'a Way,
    pub cur: &'a Way,
    pub next: &'a Way,
}

#[derive(Clone, Copy, Debug)]
pub struct DiffRelation<'a> {
    pub prev: &'a Relation,
    pub cur: &'a Relation,
    pub next: &'a Relation,
}

#[derive(Clone, Copy, Debug)]
pub struct DiffChangeset<'a> {
    pub prev: &'a Changeset,
    pub cur: &'a Changeset,
    pub next: &'a Changeset,
}

/// Consumes a sorted object stream. Every hook defaults to a no-op, so handlers implement only
/// what they care about.
pub trait DiffHandler {
    fn init(&mut self) {}
    fn before_nodes(&mut self) {}
    fn node(&mut self, _diff: DiffNode) {}
    fn after_nodes(&mut self) {}
    fn before_ways(&mut self) {}
    fn way(&mut self, _diff: DiffWay) {}
    fn after_ways(&mut self) {}
    fn before_relations(&mut self) {}
    fn relation(&mut self, _diff: DiffRelation) {}
    fn after_relations(&mut self) {}
    fn before_changesets(&mut self) {}
    fn changeset(&mut self, _diff: DiffChangeset) {}
    fn after_changesets(&mut self) {}
    fn done(&mut self) {}
}

fn fire_boundary(
    handlers: &mut [&mut dyn DiffHandler],
    last: Option<ItemType>,
    current: Option<ItemType>,
) {
    for handler in handlers.iter_mut() {
        match last {
            None => handler.init(),
            Some(ItemType::Node) => handler.after_nodes(),
            Some(ItemType::Way) => handler.after_ways(),
            Some(ItemType::Relation) => handler.after_relations(),
            Some(ItemType::Changeset) => handler.after_changesets(),
        }
        match current {
            None => handler.done(),
            Some(ItemType::Node) => handler.before_nodes(),
            Some(ItemType::Way) => handler.before_ways(),
            Some(ItemType::Relation) => handler.before_relations(),
            Some(ItemType::Changeset) => handler.before_changesets(),
        }
    }
}

fn fire_item(handlers: &mut [&mut dyn DiffHandler], prev: &OsmObj, cur: &OsmObj, next: &OsmObj) {
    match (prev, cur, next) {
        (OsmObj::Node(p), OsmObj::Node(c), OsmObj::Node(n)) => {
            for handler in handlers.iter_mut() {
                handler.node(DiffNode { prev: p, cur: c, next: n });
            }
        }
        (OsmObj::Way(p), OsmObj::Way(c), OsmObj::Way(n)) => {
            for handler in handlers.iter_mut() {
                handler.way(DiffWay { prev: p, cur: c, next: n });
            }
        }
        (OsmObj::Relation(p), OsmObj::Relation(c), OsmObj::Relation(n)) => {
            for handler in handlers.iter_mut() {
                handler.relation(DiffRelation { prev: p, cur: c, next: n });
            }
        }
        (OsmObj::Changeset(p), OsmObj::Changeset(c), OsmObj::Changeset(n)) => {
            for handler in handlers.iter_mut() {
                handler.changeset(DiffChangeset { prev: p, cur: c, next: n });
            }
        }
        _ => unreachable!("diff window mixes item types"),
    }
}

/// Walk a stream sorted by (type, id, version), dispatching every item to every handler with its
/// per-entity three-item window, and firing the before/after hooks at type boundaries. An empty
/// stream fires nothing, not even `init`.
pub fn apply(stream: &[OsmObj], handlers: &mut [&mut dyn DiffHandler]) {
    let mut last_type: Option<ItemType> = None;

    for (i, cur) in stream.iter().enumerate() {
        if last_type != Some(cur.item_type()) {
            fire_boundary(handlers, last_type, Some(cur.item_type()));
            last_type = Some(cur.item_type());
        }

        let same_entity = |other: &OsmObj| {
            other.item_type() == cur.item_type() && other.id() == cur.id()
        };
        let prev = if i > 0 && same_entity(&stream[i - 1]) {
            &stream[i - 1]
        } else {
            cur
        };
        let next = if i + 1 < stream.len() && same_entity(&stream[i + 1]) {
            &stream[i + 1]
        } else {
            cur
        };

        fire_item(handlers, prev, cur, next);
    }

    if last_type.is_some() {
        fire_boundary(handlers, last_type, None);
    }
}
