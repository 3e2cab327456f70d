//! Binary space partitioning of polygon sets.
//!
//! Each node splits space by the plane of its first polygon and keeps the
//! polygons coplanar with it; `front` and `back` hold the two half-spaces.
//! A missing back child is solid space, a missing front child empty space.

use super::polygon::{split_polygon, SplitPlane, SplitResult, TaggedPolygon};

#[derive(Debug, Default)]
pub(super) struct Node {
    plane: Option<SplitPlane>,
    polygons: Vec<TaggedPolygon>,
    front: Option<Box<Node>>,
    back: Option<Box<Node>>,
}

impl Node {
    pub fn new(polygons: Vec<TaggedPolygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    /// Swaps solid and empty space.
    pub fn invert(&mut self) {
        for p in &mut self.polygons {
            p.flip();
        }
        if let Some(plane) = &mut self.plane {
            plane.flip();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Removes the parts of `polygons` that lie inside this tree's solid.
    pub fn clip_polygons(&self, polygons: Vec<TaggedPolygon>) -> Vec<TaggedPolygon> {
        let Some(plane) = &self.plane else {
            return polygons;
        };
        let mut split = SplitResult::default();
        for p in polygons {
            split_polygon(plane, p, &mut split);
        }
        let mut front = split.front;
        front.append(&mut split.coplanar_front);
        let mut back = split.back;
        back.append(&mut split.coplanar_back);

        let mut out = match &self.front {
            Some(node) => node.clip_polygons(front),
            None => front,
        };
        if let Some(node) = &self.back {
            out.extend(node.clip_polygons(back));
        }
        out
    }

    /// Removes every polygon of this tree that lies inside `other`.
    pub fn clip_to(&mut self, other: &Node) {
        self.polygons = other.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(front) = &mut self.front {
            front.clip_to(other);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(other);
        }
    }

    pub fn all_polygons(&self) -> Vec<TaggedPolygon> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut Vec<TaggedPolygon>) {
        out.extend(self.polygons.iter().cloned());
        if let Some(front) = &self.front {
            front.collect(out);
        }
        if let Some(back) = &self.back {
            back.collect(out);
        }
    }

    /// Inserts polygons, splitting them down the tree.
    pub fn build(&mut self, polygons: Vec<TaggedPolygon>) {
        let Some(first) = polygons.first() else {
            return;
        };
        let plane = *self.plane.get_or_insert(first.plane);

        let mut split = SplitResult::default();
        for p in polygons {
            split_polygon(&plane, p, &mut split);
        }
        self.polygons.append(&mut split.coplanar_front);
        self.polygons.append(&mut split.coplanar_back);

        if !split.front.is_empty() {
            self.front
                .get_or_insert_with(Box::default)
                .build(split.front);
        }
        if !split.back.is_empty() {
            self.back.get_or_insert_with(Box::default).build(split.back);
        }
    }
}

/// `a ∪ b`.
pub(super) fn union(a: Vec<TaggedPolygon>, b: Vec<TaggedPolygon>) -> Vec<TaggedPolygon> {
    let mut a = Node::new(a);
    let mut b = Node::new(b);
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.all_polygons());
    a.all_polygons()
}

/// `a − b`. Faces of `b` that bound the result are flipped and keep
/// their tags.
pub(super) fn difference(a: Vec<TaggedPolygon>, b: Vec<TaggedPolygon>) -> Vec<TaggedPolygon> {
    let mut a = Node::new(a);
    let mut b = Node::new(b);
    a.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.all_polygons());
    a.invert();
    a.all_polygons()
}
