//! Transform components and their collapse into a single 2D affine.
//!
//! A primitive declares optional translate/scale/rotate components plus an
//! optional pin and an optional raw matrix. At compile time they collapse
//! into one `kurbo::Affine`; an absent transform is the identity and emits
//! nothing into the script.

use kurbo::{Affine, Point, Rect, Vec2};

/// Optional affine components attached to a primitive.
///
/// Rotation and scale are applied about the pin point (default: local
/// origin). The raw matrix, when present, is applied first.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub translate: Option<(f64, f64)>,
    pub scale: Option<(f64, f64)>,
    pub rotate: Option<f64>,
    pub pin: Option<(f64, f64)>,
    pub matrix: Option<[f64; 6]>,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translate: None,
        scale: None,
        rotate: None,
        pin: None,
        matrix: None,
    };

    pub fn translate(dx: f64, dy: f64) -> Self {
        Self {
            translate: Some((dx, dy)),
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            scale: Some((sx, sy)),
            ..Self::IDENTITY
        }
    }

    pub fn rotate(radians: f64) -> Self {
        Self {
            rotate: Some(radians),
            ..Self::IDENTITY
        }
    }

    pub fn is_identity(&self) -> bool {
        self.translate.is_none()
            && self.scale.is_none()
            && self.rotate.is_none()
            && self.matrix.is_none()
    }

    /// Collapse the components into a single affine.
    ///
    /// Composition order, innermost first: matrix, then scale and rotate
    /// about the pin, then translate.
    pub fn to_affine(&self) -> Affine {
        let mut a = match self.matrix {
            Some(m) => Affine::new(m),
            None => Affine::IDENTITY,
        };

        if self.scale.is_some() || self.rotate.is_some() {
            let (px, py) = self.pin.unwrap_or((0.0, 0.0));
            let mut about_pin = Affine::IDENTITY;
            if let Some((sx, sy)) = self.scale {
                about_pin = Affine::scale_non_uniform(sx, sy) * about_pin;
            }
            if let Some(radians) = self.rotate {
                about_pin = Affine::rotate(radians) * about_pin;
            }
            let pin = Vec2::new(px, py);
            a = Affine::translate(pin) * about_pin * Affine::translate(-pin) * a;
        }

        if let Some((dx, dy)) = self.translate {
            a = Affine::translate(Vec2::new(dx, dy)) * a;
        }

        a
    }
}

/// Transform a local-space AABB into the enclosing AABB in the target space.
pub fn transform_bounds(affine: Affine, local: Rect) -> Rect {
    affine.transform_rect_bbox(local)
}

/// Map a point from the target space back into local space.
///
/// Returns `None` when the affine is singular (zero scale) and cannot be
/// inverted, in which case the point cannot hit the primitive.
pub fn untransform_point(affine: Affine, p: Point) -> Option<Point> {
    if affine.determinant().abs() < f64::EPSILON {
        return None;
    }
    Some(affine.inverse() * p)
}
