use super::polygon_3d::cross_2d;
use super::Point2;

/// How two bounded 2D segments meet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentContact {
    /// The segments do not touch.
    None,
    /// The segments cross or touch at a single point with parameters `(t, u)`.
    Point { at: Point2, t: f64, u: f64 },
    /// The segments are collinear and share a stretch of positive length.
    Overlap { at: Point2 },
}

/// Bounded segment-segment intersection in 2D.
///
/// `eps` is a length tolerance; endpoints within `eps` of the other segment
/// count as touching.
#[must_use]
pub fn segment_segment_contact_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
    eps: f64,
) -> SegmentContact {
    let da = a1 - a0;
    let db = b1 - b0;
    let la = da.norm();
    let lb = db.norm();
    if la < eps || lb < eps {
        return SegmentContact::None;
    }

    let cross = cross_2d(da.x, da.y, db.x, db.y);
    let w = b0 - a0;

    if cross.abs() < eps * la.max(lb) {
        // Parallel; collinear only if b0 lies on a's line.
        let dist = cross_2d(da.x, da.y, w.x, w.y).abs() / la;
        if dist > eps {
            return SegmentContact::None;
        }
        let dir = da / la;
        let s0 = w.dot(&dir);
        let s1 = (b1 - a0).dot(&dir);
        let lo = s0.min(s1).max(0.0);
        let hi = s0.max(s1).min(la);
        if hi - lo > eps {
            let mid = a0 + dir * (0.5 * (lo + hi));
            return SegmentContact::Overlap { at: mid };
        }
        if (hi - lo).abs() <= eps {
            let at = a0 + dir * lo;
            return SegmentContact::Point {
                at,
                t: lo / la,
                u: (at - b0).dot(&db) / (lb * lb),
            };
        }
        return SegmentContact::None;
    }

    let t = cross_2d(w.x, w.y, db.x, db.y) / cross;
    let u = cross_2d(w.x, w.y, da.x, da.y) / cross;
    let ta = eps / la;
    let tb = eps / lb;
    if t >= -ta && t <= 1.0 + ta && u >= -tb && u <= 1.0 + tb {
        let t = t.clamp(0.0, 1.0);
        SegmentContact::Point {
            at: a0 + da * t,
            t,
            u: u.clamp(0.0, 1.0),
        }
    } else {
        SegmentContact::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn crossing_segments() {
        let c = segment_segment_contact_2d(
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 2.0),
            &Point2::new(0.0, 2.0),
            &Point2::new(2.0, 0.0),
            EPS,
        );
        match c {
            SegmentContact::Point { at, t, u } => {
                assert!((at.x - 1.0).abs() < 1e-12 && (at.y - 1.0).abs() < 1e-12);
                assert!((t - 0.5).abs() < 1e-12 && (u - 0.5).abs() < 1e-12);
            }
            other => panic!("expected a point contact, got {other:?}"),
        }
    }

    #[test]
    fn disjoint_segments() {
        let c = segment_segment_contact_2d(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Point2::new(1.0, 1.0),
            EPS,
        );
        assert_eq!(c, SegmentContact::None);
    }

    #[test]
    fn collinear_overlap() {
        let c = segment_segment_contact_2d(
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(3.0, 0.0),
            EPS,
        );
        assert!(matches!(c, SegmentContact::Overlap { .. }));
    }

    #[test]
    fn touching_at_endpoint() {
        let c = segment_segment_contact_2d(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(1.0, 1.0),
            EPS,
        );
        match c {
            SegmentContact::Point { t, u, .. } => {
                assert!((t - 1.0).abs() < 1e-12);
                assert!(u.abs() < 1e-12);
            }
            other => panic!("expected a point contact, got {other:?}"),
        }
    }
}
