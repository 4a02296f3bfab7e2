pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;
pub type Size = euclid::Size2D<f64, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

pub fn size(width: f64, height: f64) -> Size {
    euclid::size2(width, height)
}

/// Axis-aligned footprint test for two center-anchored boxes.
pub fn footprints_overlap(a: Point, a_size: Size, b: Point, b_size: Size) -> bool {
    (a.x - b.x).abs() < (a_size.width + b_size.width) / 2.0
        && (a.y - b.y).abs() < (a_size.height + b_size.height) / 2.0
}

/// Unit vector from `from` towards `to`, or `None` when the points coincide.
pub fn direction(from: Point, to: Point) -> Option<(Vector, f64)> {
    let d = to - from;
    let len = d.length();
    if !(len.is_finite() && len > 0.0) {
        return None;
    }
    Some((d / len, len))
}
