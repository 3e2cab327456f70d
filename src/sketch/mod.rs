use std::f64::consts::{FRAC_PI_2, TAU};

use slotmap::SlotMap;

use crate::error::{GeometryError, OperationError, Result};
use crate::geometry::{BezierCurve, Plane};
use crate::group::GroupHandle;
use crate::math::{Point3, Vector3, TOLERANCE};

slotmap::new_key_type! {
    /// Unique identifier for a solved sketch entity.
    pub struct EntityId;
}

/// Solved numeric geometry of a sketch entity.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityGeometry {
    LineSegment {
        a: Point3,
        b: Point3,
    },
    /// Counter-clockwise about `normal` from `start` to `end`. Coincident
    /// endpoints describe a full turn.
    Arc {
        center: Point3,
        normal: Vector3,
        start: Point3,
        end: Point3,
    },
    Circle {
        center: Point3,
        normal: Vector3,
        radius: f64,
    },
    Cubic([Point3; 4]),
}

/// A sketch entity as produced by the constraint solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SketchEntity {
    /// The group that owns this entity.
    pub group: GroupHandle,
    /// Construction entities never contribute profile curves.
    pub construction: bool,
    pub geometry: EntityGeometry,
}

impl SketchEntity {
    #[must_use]
    pub fn new(group: GroupHandle, geometry: EntityGeometry) -> Self {
        Self {
            group,
            construction: false,
            geometry,
        }
    }

    /// Converts the entity to Bezier curves.
    ///
    /// Arcs and circles become rational quadratics spanning at most a
    /// quarter turn each.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry is degenerate (zero radius or zero
    /// normal).
    pub fn bezier_curves(&self) -> Result<Vec<BezierCurve>> {
        match &self.geometry {
            EntityGeometry::LineSegment { a, b } => Ok(vec![BezierCurve::line(*a, *b)]),
            EntityGeometry::Cubic(p) => Ok(vec![BezierCurve::new(p.to_vec())?]),
            EntityGeometry::Arc {
                center,
                normal,
                start,
                end,
            } => {
                let n = unit(normal)?;
                let x = start - center;
                let radius = x.norm();
                if radius < TOLERANCE {
                    return Err(GeometryError::Degenerate("arc with zero radius".into()).into());
                }
                let x_dir = x / radius;
                let y_dir = n.cross(&x_dir);
                let e = end - center;
                let mut sweep = e.dot(&y_dir).atan2(e.dot(&x_dir));
                if sweep <= TOLERANCE {
                    sweep += TAU;
                }
                Ok(arc_segments(center, radius, &x_dir, &y_dir, sweep, *start, *end))
            }
            EntityGeometry::Circle {
                center,
                normal,
                radius,
            } => {
                if *radius < TOLERANCE {
                    return Err(GeometryError::Degenerate("circle with zero radius".into()).into());
                }
                let plane = Plane::from_normal(*center, *normal)?;
                let start = center + plane.u_dir() * *radius;
                Ok(arc_segments(
                    center,
                    *radius,
                    plane.u_dir(),
                    plane.v_dir(),
                    TAU,
                    start,
                    start,
                ))
            }
        }
    }
}

fn unit(v: &Vector3) -> Result<Vector3> {
    let len = v.norm();
    if len < TOLERANCE {
        return Err(GeometryError::ZeroVector.into());
    }
    Ok(v / len)
}

/// Splits a circular arc into rational quadratic pieces of at most 90°.
/// The first piece starts exactly at `start` and the last ends exactly at
/// `end`.
fn arc_segments(
    center: &Point3,
    radius: f64,
    x_dir: &Vector3,
    y_dir: &Vector3,
    sweep: f64,
    start: Point3,
    end: Point3,
) -> Vec<BezierCurve> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let k = ((sweep / FRAC_PI_2) - 1e-9).ceil().max(1.0) as usize;
    #[allow(clippy::cast_precision_loss)]
    let phi = sweep / k as f64;
    let half = phi * 0.5;
    let w = half.cos();
    let at = |angle: f64, r: f64| center + (x_dir * angle.cos() + y_dir * angle.sin()) * r;

    let mut curves = Vec::with_capacity(k);
    let mut p0 = start;
    for i in 0..k {
        #[allow(clippy::cast_precision_loss)]
        let a0 = i as f64 * phi;
        let p1 = at(a0 + half, radius / w);
        let p2 = if i + 1 == k { end } else { at(a0 + phi, radius) };
        curves.push(BezierCurve::quadratic_arc(p0, p1, p2, w));
        p0 = p2;
    }
    curves
}

/// Arena of solved sketch entities, shared by all groups.
#[derive(Debug, Clone, Default)]
pub struct Sketch {
    entities: SlotMap<EntityId, SketchEntity>,
}

impl Sketch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: SketchEntity) -> EntityId {
        self.entities.insert(entity)
    }

    pub fn add_line(&mut self, group: GroupHandle, a: Point3, b: Point3) -> EntityId {
        self.add(SketchEntity::new(group, EntityGeometry::LineSegment { a, b }))
    }

    pub fn add_arc(
        &mut self,
        group: GroupHandle,
        center: Point3,
        normal: Vector3,
        start: Point3,
        end: Point3,
    ) -> EntityId {
        self.add(SketchEntity::new(
            group,
            EntityGeometry::Arc {
                center,
                normal,
                start,
                end,
            },
        ))
    }

    pub fn add_circle(
        &mut self,
        group: GroupHandle,
        center: Point3,
        normal: Vector3,
        radius: f64,
    ) -> EntityId {
        self.add(SketchEntity::new(
            group,
            EntityGeometry::Circle {
                center,
                normal,
                radius,
            },
        ))
    }

    pub fn add_cubic(&mut self, group: GroupHandle, ctrl: [Point3; 4]) -> EntityId {
        self.add(SketchEntity::new(group, EntityGeometry::Cubic(ctrl)))
    }

    /// Returns the entity, or an error if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not in the sketch.
    pub fn entity(&self, id: EntityId) -> Result<&SketchEntity> {
        self.entities
            .get(id)
            .ok_or_else(|| OperationError::NotFound("sketch entity".into()).into())
    }

    /// Returns the entity mutably, or an error if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not in the sketch.
    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut SketchEntity> {
        self.entities
            .get_mut(id)
            .ok_or_else(|| OperationError::NotFound("sketch entity".into()).into())
    }

    pub fn remove(&mut self, id: EntityId) -> Option<SketchEntity> {
        self.entities.remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities owned by `group`, in insertion order.
    pub fn entities_of(
        &self,
        group: GroupHandle,
    ) -> impl Iterator<Item = (EntityId, &SketchEntity)> + '_ {
        self.entities.iter().filter(move |(_, e)| e.group == group)
    }

    /// Straight line entities of `group` with their endpoints.
    pub fn lines_of(&self, group: GroupHandle) -> impl Iterator<Item = (EntityId, Point3, Point3)> + '_ {
        self.entities_of(group).filter_map(|(id, e)| match e.geometry {
            EntityGeometry::LineSegment { a, b } => Some((id, a, b)),
            _ => None,
        })
    }

    /// All profile curves contributed by `group`'s non-construction entities.
    ///
    /// # Errors
    ///
    /// Returns an error if any entity has degenerate geometry.
    pub fn curves_of(&self, group: GroupHandle) -> Result<Vec<BezierCurve>> {
        let mut curves = Vec::new();
        for (_, e) in self.entities_of(group) {
            if e.construction {
                continue;
            }
            curves.extend(e.bezier_curves()?);
        }
        Ok(curves)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Curve;
    use approx::assert_relative_eq;

    const G: GroupHandle = GroupHandle(1);

    #[test]
    fn circle_becomes_four_quarter_arcs() {
        let mut sketch = Sketch::new();
        let id = sketch.add_circle(G, Point3::new(1.0, 2.0, 0.0), Vector3::z(), 3.0);
        let curves = sketch.entity(id).unwrap().bezier_curves().unwrap();
        assert_eq!(curves.len(), 4);
        assert_eq!(curves[0].start(), curves[3].finish());
        for c in &curves {
            assert_eq!(c.degree(), 2);
            for i in 0..=8 {
                let p = c.evaluate(f64::from(i) / 8.0).unwrap();
                assert_relative_eq!((p - Point3::new(1.0, 2.0, 0.0)).norm(), 3.0, epsilon = 1e-9);
            }
        }
        for pair in curves.windows(2) {
            assert_eq!(pair[0].finish(), pair[1].start());
        }
    }

    #[test]
    fn arc_is_counter_clockwise_about_normal() {
        let mut sketch = Sketch::new();
        let id = sketch.add_arc(
            G,
            Point3::origin(),
            Vector3::z(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let curves = sketch.entity(id).unwrap().bezier_curves().unwrap();
        assert_eq!(curves.len(), 1);
        let mid = curves[0].evaluate(0.5).unwrap();
        assert!(mid.x > 0.0 && mid.y > 0.0);

        // The same endpoints with the normal flipped go the long way round.
        let id = sketch.add_arc(
            G,
            Point3::origin(),
            -Vector3::z(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let curves = sketch.entity(id).unwrap().bezier_curves().unwrap();
        assert_eq!(curves.len(), 3);
        assert_eq!(curves[2].finish(), Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn cubic_is_a_single_curve() {
        let mut sketch = Sketch::new();
        let ctrl = [
            Point3::origin(),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        sketch.add_cubic(G, ctrl);
        sketch.add_line(G, ctrl[3], ctrl[0]);

        let curves = sketch.curves_of(G).unwrap();
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].degree(), 3);
        assert_eq!(curves[0].ctrl(), &ctrl);
        assert_eq!(sketch.lines_of(G).count(), 1);
    }

    #[test]
    fn construction_entities_are_skipped() {
        let mut sketch = Sketch::new();
        let id = sketch.add_line(G, Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        sketch.entity_mut(id).unwrap().construction = true;
        sketch.add_line(GroupHandle(2), Point3::origin(), Point3::new(0.0, 1.0, 0.0));
        assert!(sketch.curves_of(G).unwrap().is_empty());
        assert_eq!(sketch.lines_of(G).count(), 1);
    }

    #[test]
    fn degenerate_circle_is_an_error() {
        let entity = SketchEntity::new(
            G,
            EntityGeometry::Circle {
                center: Point3::origin(),
                normal: Vector3::z(),
                radius: 0.0,
            },
        );
        assert!(entity.bezier_curves().is_err());
    }

    #[test]
    fn missing_entity_is_reported() {
        let mut sketch = Sketch::new();
        let id = sketch.add_line(G, Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        sketch.remove(id);
        assert!(sketch.entity(id).is_err());
    }
}
