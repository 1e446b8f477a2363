//! Connector geometry.
//!
//! Parent/child links are orthogonal routes with two filleted corners. Each
//! corner is a cubic whose control points coincide with the corner itself, so
//! the fillet radius is the distance from the corner to where the straight
//! runs stop. Cross-tree connections use a plain horizontal S-curve.

use std::fmt;

use crate::layout::orientation::Point;

/// Preferred fillet radius, reduced when the endpoints are close.
pub const MAX_CORNER_RADIUS: f32 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
}

/// A connector as a command list. `Display` renders the SVG `d` attribute.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathDescription {
    pub commands: Vec<PathCommand>,
    /// Fillet radius used for the corners (0 for connection arcs).
    pub radius: f32,
}

impl PathDescription {
    pub fn start(&self) -> Option<Point> {
        match self.commands.first()? {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(*p),
            PathCommand::CubicTo(_, _, p) => Some(*p),
        }
    }

    pub fn end(&self) -> Option<Point> {
        match self.commands.last()? {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(*p),
            PathCommand::CubicTo(_, _, p) => Some(*p),
        }
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::MoveTo(Point::new(x, y)));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::LineTo(Point::new(x, y)));
    }

    fn cubic_to(&mut self, c1: (f32, f32), c2: (f32, f32), to: (f32, f32)) {
        self.commands.push(PathCommand::CubicTo(
            Point::new(c1.0, c1.1),
            Point::new(c2.0, c2.1),
            Point::new(to.0, to.1),
        ));
    }
}

impl fmt::Display for PathDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cmd) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match cmd {
                PathCommand::MoveTo(p) => write!(f, "M {} {}", p.x, p.y)?,
                PathCommand::LineTo(p) => write!(f, "L {} {}", p.x, p.y)?,
                PathCommand::CubicTo(a, b, p) => {
                    write!(f, "C {} {} {} {} {} {}", a.x, a.y, b.x, b.y, p.x, p.y)?
                }
            }
        }
        Ok(())
    }
}

/// Shift applied to the source's main-axis coordinate before routing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinkOffsets {
    pub main: f32,
}

impl LinkOffsets {
    pub fn main(main: f32) -> Self {
        Self { main }
    }
}

/// `min(35, |dx| / 2, |dy| / 2)`.
#[inline]
pub fn corner_radius(dx: f32, dy: f32) -> f32 {
    MAX_CORNER_RADIUS.min(dx.abs() / 2.0).min(dy.abs() / 2.0)
}

#[inline]
fn direction(delta: f32) -> f32 {
    if delta < 0.0 { -1.0 } else { 1.0 }
}

/// Route for a vertical main axis (top/bottom layouts).
///
/// Leaves `source` along the main axis, turns onto the cross axis halfway,
/// then turns again to enter `target`. With `via`, the path first runs from
/// `via` across to the source's cross coordinate and along to the source.
pub fn diagonal(source: Point, target: Point, via: Option<Point>, offsets: LinkOffsets) -> PathDescription {
    let x = source.x;
    let (ex, ey) = (target.x, target.y);
    let m = via.unwrap_or(source);
    let xr = direction(ex - x);
    let yr = direction(ey - source.y);
    let y = source.y + offsets.main;

    let r = corner_radius(ex - x, ey - y);
    let h = (ey - y).abs() / 2.0 - r;
    let w = (ex - x).abs() - 2.0 * r;
    let yc = y + h * yr + r * yr;

    let mut path = PathDescription {
        commands: Vec::with_capacity(8),
        radius: r,
    };
    path.move_to(m.x, m.y);
    path.line_to(x, m.y);
    path.line_to(x, y);
    path.line_to(x, y + h * yr);
    path.cubic_to((x, yc), (x, yc), (x + r * xr, yc));
    path.line_to(x + w * xr + r * xr, yc);
    path.cubic_to((ex, yc), (ex, yc), (ex, ey - h * yr));
    path.line_to(ex, ey);
    path
}

/// Route for a horizontal main axis (left/right layouts).
pub fn hdiagonal(source: Point, target: Point, via: Option<Point>, offsets: LinkOffsets) -> PathDescription {
    let y = source.y;
    let (ex, ey) = (target.x, target.y);
    let m = via.unwrap_or(source);
    let xr = direction(ex - source.x);
    let yr = direction(ey - y);
    let x = source.x + offsets.main;

    let r = corner_radius(ex - x, ey - y);
    let h = (ey - y).abs() - 2.0 * r;
    let w = (ex - x).abs() / 2.0 - r;
    let xc = x + w * xr + r * xr;

    let mut path = PathDescription {
        commands: Vec::with_capacity(8),
        radius: r,
    };
    path.move_to(m.x, m.y);
    path.line_to(m.x, y);
    path.line_to(x, y);
    path.line_to(x + w * xr, y);
    path.cubic_to((xc, y), (xc, y), (xc, y + r * yr));
    path.line_to(xc, y + h * yr + r * yr);
    path.cubic_to((xc, ey), (xc, ey), (ex - w * xr, ey));
    path.line_to(ex, ey);
    path
}

/// Horizontal S-curve for a cross-tree connection.
pub fn connection_arc(source: Point, target: Point) -> PathDescription {
    let mid_x = (source.x + target.x) / 2.0;
    let mut path = PathDescription {
        commands: Vec::with_capacity(2),
        radius: 0.0,
    };
    path.move_to(source.x, source.y);
    path.cubic_to((mid_x, source.y), (mid_x, target.y), (target.x, target.y));
    path
}
