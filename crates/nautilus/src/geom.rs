//! Screen-space 2D geometry: box overlap and distance, segment clipping and intersection.
//!
//! Predicates are total over finite input. Non-finite coordinates are not guarded here.

pub struct ScreenSpace;

pub type ScreenPoint = euclid::Point2D<f64, ScreenSpace>;
pub type ScreenBox = euclid::Box2D<f64, ScreenSpace>;
pub type ScreenVector = euclid::Vector2D<f64, ScreenSpace>;

pub fn point(x: f64, y: f64) -> ScreenPoint {
    euclid::point2(x, y)
}

/// Axis-aligned box from its `(x0, y0)` and `(x1, y1)` corners.
pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> ScreenBox {
    ScreenBox::new(point(x0, y0), point(x1, y1))
}

fn box_center(r: &ScreenBox) -> ScreenPoint {
    point(
        r.min.x + ((r.max.x - r.min.x) / 2.0),
        r.min.y + ((r.max.y - r.min.y) / 2.0),
    )
}

/// A rectangle given by its four corners in winding order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub v1: ScreenPoint,
    pub v2: ScreenPoint,
    pub v3: ScreenPoint,
    pub v4: ScreenPoint,
}

impl RotatedRect {
    pub fn from_box(r: &ScreenBox) -> Self {
        Self {
            v1: point(r.min.x, r.min.y),
            v2: point(r.min.x, r.max.y),
            v3: point(r.max.x, r.max.y),
            v4: point(r.max.x, r.min.y),
        }
    }

    /// Rotates every corner about the origin, then translates by `(tx, ty)`.
    pub fn transformed(&self, angle: f64, tx: f64, ty: f64) -> Self {
        Self {
            v1: rotate_and_translate(self.v1, angle, tx, ty),
            v2: rotate_and_translate(self.v2, angle, tx, ty),
            v3: rotate_and_translate(self.v3, angle, tx, ty),
            v4: rotate_and_translate(self.v4, angle, tx, ty),
        }
    }

    fn edges(&self) -> [(ScreenPoint, ScreenPoint); 4] {
        [
            (self.v1, self.v2),
            (self.v2, self.v3),
            (self.v3, self.v4),
            (self.v4, self.v1),
        ]
    }
}

pub fn rotate_and_translate(p: ScreenPoint, angle: f64, tx: f64, ty: f64) -> ScreenPoint {
    let (sin, cos) = angle.sin_cos();
    point((cos * p.x - sin * p.y) + tx, (sin * p.x + cos * p.y) + ty)
}

fn dot2(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 * b.0) + (a.1 * b.1)
}

/// Barycentric test; boundary points are outside. The triangle must not be degenerate.
pub fn point_in_triangle(a: ScreenPoint, b: ScreenPoint, c: ScreenPoint, p: ScreenPoint) -> bool {
    let v0 = (c.x - a.x, c.y - a.y);
    let v1 = (b.x - a.x, b.y - a.y);
    let v2 = (p.x - a.x, p.y - a.y);

    let dot00 = dot2(v0, v0);
    let dot01 = dot2(v0, v1);
    let dot02 = dot2(v0, v2);
    let dot11 = dot2(v1, v1);
    let dot12 = dot2(v1, v2);

    let inv_denom = 1.0 / (dot00 * dot11 - dot01 * dot01);
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;
    u > 0.0 && v > 0.0 && u + v < 1.0
}

/// Where the segment `from -> to` leaves `rect`, with `from` inside and `to` outside.
///
/// Each axis gets its own crossing parameter against the edge it heads for; the smaller one
/// wins. Returns `None` when `from == to`.
pub fn segment_rect_exit(from: ScreenPoint, to: ScreenPoint, rect: &ScreenBox) -> Option<ScreenPoint> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0.0 && dy == 0.0 {
        return None;
    }

    let tx = (dx != 0.0).then(|| {
        let edge = if dx > 0.0 { rect.max.x } else { rect.min.x };
        (edge - from.x) / dx
    });
    let ty = (dy != 0.0).then(|| {
        let edge = if dy > 0.0 { rect.max.y } else { rect.min.y };
        (edge - from.y) / dy
    });

    let t = match (tx, ty) {
        (Some(tx), Some(ty)) => tx.min(ty),
        (Some(tx), None) => tx,
        (None, Some(ty)) => ty,
        (None, None) => unreachable!("zero delta handled above"),
    };
    Some(point(from.x + dx * t, from.y + dy * t))
}

/// Strict interval overlap: boxes that only share an edge do not overlap.
pub fn rects_overlap(a: &ScreenBox, b: &ScreenBox) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

fn sep_axis_side(a1: ScreenPoint, a2: ScreenPoint, p: ScreenPoint) -> bool {
    ((a2.x - a1.x) * (p.y - a1.y)) - ((a2.y - a1.y) * (p.x - a1.x)) < 0.0
}

/// The edge `a1 -> a2` separates when `inner` (another corner of the same rectangle) lies on
/// one side and all corners of `other` lie on the opposite side.
fn sep_axis(a1: ScreenPoint, a2: ScreenPoint, inner: ScreenPoint, other: &RotatedRect) -> bool {
    let side = sep_axis_side(a1, a2, other.v1);
    if sep_axis_side(a1, a2, inner) == side {
        return false;
    }
    [other.v2, other.v3, other.v4]
        .into_iter()
        .all(|v| sep_axis_side(a1, a2, v) == side)
}

/// Separating-axis test over the four edges of each rectangle.
pub fn rotated_rects_overlap(r1: &RotatedRect, r2: &RotatedRect) -> bool {
    let separated = |a: &RotatedRect, b: &RotatedRect| {
        sep_axis(a.v1, a.v2, a.v3, b)
            || sep_axis(a.v2, a.v3, a.v1, b)
            || sep_axis(a.v3, a.v4, a.v1, b)
            || sep_axis(a.v4, a.v1, a.v2, b)
    };
    !(separated(r1, r2) || separated(r2, r1))
}

/// Distance between two boxes measured along the line joining their centres.
///
/// This is the gap between the points where the centre line leaves each box, not the true
/// minimum boundary distance for every configuration. Touching boxes report 0 only when the
/// centre line crosses their shared edge; when they are offset along that edge the line leaves
/// through another side and the result is positive.
pub fn rects_distance(a: &ScreenBox, b: &ScreenBox) -> f64 {
    if rects_overlap(a, b) {
        return 0.0;
    }
    let ca = box_center(a);
    let cb = box_center(b);
    let pa = segment_rect_exit(ca, cb, a).unwrap_or(ca);
    let pb = segment_rect_exit(cb, ca, b).unwrap_or(cb);
    (pa - pb).length()
}

/// Segment/segment intersection. Parallel segments count only when collinear.
pub fn segments_intersect(
    p1: ScreenPoint,
    p2: ScreenPoint,
    p3: ScreenPoint,
    p4: ScreenPoint,
) -> bool {
    let denom = (p4.y - p3.y) * (p2.x - p1.x) - (p4.x - p3.x) * (p2.y - p1.y);
    let ua = (p4.x - p3.x) * (p1.y - p3.y) - (p4.y - p3.y) * (p1.x - p3.x);
    let ub = (p2.x - p1.x) * (p1.y - p3.y) - (p2.y - p1.y) * (p1.x - p3.x);

    if denom == 0.0 {
        return ua == 0.0 && ub == 0.0;
    }

    let ua = ua / denom;
    let ub = ub / denom;
    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

pub fn segment_rect_overlap(p1: ScreenPoint, p2: ScreenPoint, r: &RotatedRect) -> bool {
    r.edges()
        .into_iter()
        .any(|(a, b)| segments_intersect(p1, p2, a, b))
}
