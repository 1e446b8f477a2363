//! Bounding boxes and fit-to-viewport transforms.

use serde::Serialize;

use super::orientation::{NodeBox, Orientation, Point};

/// Fraction of the viewport the fitted content may fill.
const FIT_MARGIN: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Smallest box around `nodes`, grown by `padding` on every side.
///
/// Edges come from the orientation's edge functions. Returns `None` when
/// `nodes` is empty.
pub fn bounds<'a, I>(nodes: I, orientation: Orientation, padding: f32) -> Option<BoundingBox>
where
    I: IntoIterator<Item = &'a NodeBox>,
{
    let b = orientation.bindings();
    let mut iter = nodes.into_iter();
    let first = iter.next()?;
    let (min, max) = b.rect(first);
    let mut out = BoundingBox {
        min_x: min.x,
        min_y: min.y,
        max_x: max.x,
        max_y: max.y,
    };
    for node in iter {
        let (min, max) = b.rect(node);
        out.min_x = out.min_x.min(min.x);
        out.min_y = out.min_y.min(min.y);
        out.max_x = out.max_x.max(max.x);
        out.max_y = out.max_y.max(max.y);
    }
    out.min_x -= padding;
    out.min_y -= padding;
    out.max_x += padding;
    out.max_y += padding;
    Some(out)
}

/// Zoom transform that centers a box in a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitTransform {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

/// Scale so the box fills 90% of the tighter viewport axis (never more than
/// `max_scale`), then translate its center onto the viewport center.
pub fn fit_transform(bounds: &BoundingBox, viewport_width: f32, viewport_height: f32, max_scale: f32) -> FitTransform {
    let fill = (bounds.width() / viewport_width).max(bounds.height() / viewport_height);
    let mut scale = (FIT_MARGIN / fill).min(max_scale);
    if !scale.is_finite() || scale <= 0.0 {
        scale = if fill > 0.0 { 0.0 } else { max_scale };
    }
    let center = bounds.center();
    FitTransform {
        scale,
        translate_x: viewport_width / 2.0 - scale * center.x,
        translate_y: viewport_height / 2.0 - scale * center.y,
    }
}
