//! The primitive model: tagged variants of drawable and structural nodes.
//!
//! Dispatch on the tag is a plain `match` — each variant knows how to emit
//! its drawing commands, report a local AABB, and answer point containment
//! for hit testing. Groups and cross-graph references are structural: they
//! emit no geometry of their own.

use crate::id::{Atom, GraphId};
use crate::script::{Command, PathCmd, SpriteDraw};
use crate::semantic::Semantic;
use crate::style::StyleSet;
use crate::transform::Transform;
use kurbo::{Point, Rect};

/// Fieldless tag for indexing and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveTag {
    Group,
    Rect,
    RoundedRect,
    Circle,
    Ellipse,
    Line,
    Triangle,
    Quad,
    Path,
    Arc,
    Sector,
    Text,
    Sprites,
    ScriptRef,
    ComponentRef,
}

impl PrimitiveTag {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveTag::Group => "group",
            PrimitiveTag::Rect => "rect",
            PrimitiveTag::RoundedRect => "rounded_rect",
            PrimitiveTag::Circle => "circle",
            PrimitiveTag::Ellipse => "ellipse",
            PrimitiveTag::Line => "line",
            PrimitiveTag::Triangle => "triangle",
            PrimitiveTag::Quad => "quad",
            PrimitiveTag::Path => "path",
            PrimitiveTag::Arc => "arc",
            PrimitiveTag::Sector => "sector",
            PrimitiveTag::Text => "text",
            PrimitiveTag::Sprites => "sprites",
            PrimitiveTag::ScriptRef => "script_ref",
            PrimitiveTag::ComponentRef => "component_ref",
        }
    }
}

/// The tagged data payload of a primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveKind {
    /// Structural container; children live in the owning graph.
    Group,
    Rect {
        width: f64,
        height: f64,
    },
    RoundedRect {
        width: f64,
        height: f64,
        radius: f64,
    },
    Circle {
        radius: f64,
    },
    Ellipse {
        rx: f64,
        ry: f64,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
    },
    Triangle {
        p1: (f64, f64),
        p2: (f64, f64),
        p3: (f64, f64),
    },
    Quad {
        p1: (f64, f64),
        p2: (f64, f64),
        p3: (f64, f64),
        p4: (f64, f64),
    },
    Path {
        commands: Vec<PathCmd>,
    },
    /// Stroked arc of `radius` from `start` to `end` radians.
    Arc {
        radius: f64,
        start: f64,
        end: f64,
    },
    /// Filled pie slice of `radius` from `start` to `end` radians.
    Sector {
        radius: f64,
        start: f64,
        end: f64,
    },
    Text {
        content: String,
    },
    Sprites {
        draws: Vec<SpriteDraw>,
    },
    /// Defer to another registered script at draw time. Not recursively
    /// compiled.
    ScriptRef {
        target: GraphId,
    },
    /// Hosts a child scene's graph; hit testing descends into it.
    ComponentRef {
        target: GraphId,
    },
}

impl PrimitiveKind {
    pub fn tag(&self) -> PrimitiveTag {
        match self {
            PrimitiveKind::Group => PrimitiveTag::Group,
            PrimitiveKind::Rect { .. } => PrimitiveTag::Rect,
            PrimitiveKind::RoundedRect { .. } => PrimitiveTag::RoundedRect,
            PrimitiveKind::Circle { .. } => PrimitiveTag::Circle,
            PrimitiveKind::Ellipse { .. } => PrimitiveTag::Ellipse,
            PrimitiveKind::Line { .. } => PrimitiveTag::Line,
            PrimitiveKind::Triangle { .. } => PrimitiveTag::Triangle,
            PrimitiveKind::Quad { .. } => PrimitiveTag::Quad,
            PrimitiveKind::Path { .. } => PrimitiveTag::Path,
            PrimitiveKind::Arc { .. } => PrimitiveTag::Arc,
            PrimitiveKind::Sector { .. } => PrimitiveTag::Sector,
            PrimitiveKind::Text { .. } => PrimitiveTag::Text,
            PrimitiveKind::Sprites { .. } => PrimitiveTag::Sprites,
            PrimitiveKind::ScriptRef { .. } => PrimitiveTag::ScriptRef,
            PrimitiveKind::ComponentRef { .. } => PrimitiveTag::ComponentRef,
        }
    }

    /// Containers may hold child uids in the graph.
    pub fn is_container(&self) -> bool {
        matches!(self, PrimitiveKind::Group | PrimitiveKind::ComponentRef { .. })
    }

    /// Local-coordinate AABB. Curved and stroked shapes report a
    /// conservative box; text reports a zero box at its origin because font
    /// metrics live outside the core.
    pub fn bounds(&self) -> Rect {
        match self {
            PrimitiveKind::Group
            | PrimitiveKind::ScriptRef { .. }
            | PrimitiveKind::ComponentRef { .. }
            | PrimitiveKind::Text { .. } => Rect::ZERO,
            PrimitiveKind::Rect { width, height }
            | PrimitiveKind::RoundedRect { width, height, .. } => {
                Rect::new(0.0, 0.0, *width, *height)
            }
            PrimitiveKind::Circle { radius } => {
                Rect::new(-radius, -radius, *radius, *radius)
            }
            PrimitiveKind::Ellipse { rx, ry } => Rect::new(-rx, -ry, *rx, *ry),
            PrimitiveKind::Line { from, to } => point_bbox(&[*from, *to]),
            PrimitiveKind::Triangle { p1, p2, p3 } => point_bbox(&[*p1, *p2, *p3]),
            PrimitiveKind::Quad { p1, p2, p3, p4 } => point_bbox(&[*p1, *p2, *p3, *p4]),
            PrimitiveKind::Path { commands } => path_bbox(commands),
            PrimitiveKind::Arc { radius, .. } | PrimitiveKind::Sector { radius, .. } => {
                Rect::new(-radius, -radius, *radius, *radius)
            }
            PrimitiveKind::Sprites { draws } => {
                let rects: Vec<(f64, f64)> = draws
                    .iter()
                    .flat_map(|d| {
                        [(d.dst[0], d.dst[1]), (d.dst[0] + d.dst[2], d.dst[1] + d.dst[3])]
                    })
                    .collect();
                point_bbox(&rects)
            }
        }
    }

    /// Point containment in local coordinates. Structural variants and
    /// stroke-only shapes never contain a point.
    pub fn contains_point(&self, p: Point) -> bool {
        match self {
            PrimitiveKind::Group
            | PrimitiveKind::ScriptRef { .. }
            | PrimitiveKind::ComponentRef { .. }
            | PrimitiveKind::Line { .. }
            | PrimitiveKind::Arc { .. }
            | PrimitiveKind::Text { .. } => false,
            PrimitiveKind::Rect { width, height } => {
                p.x >= 0.0 && p.x <= *width && p.y >= 0.0 && p.y <= *height
            }
            PrimitiveKind::RoundedRect {
                width,
                height,
                radius,
            } => rrect_contains(*width, *height, *radius, p),
            PrimitiveKind::Circle { radius } => p.x * p.x + p.y * p.y <= radius * radius,
            PrimitiveKind::Ellipse { rx, ry } => {
                if *rx <= 0.0 || *ry <= 0.0 {
                    return false;
                }
                let nx = p.x / rx;
                let ny = p.y / ry;
                nx * nx + ny * ny <= 1.0
            }
            PrimitiveKind::Triangle { p1, p2, p3 } => triangle_contains(*p1, *p2, *p3, p),
            PrimitiveKind::Quad { p1, p2, p3, p4 } => {
                triangle_contains(*p1, *p2, *p3, p) || triangle_contains(*p1, *p3, *p4, p)
            }
            // Precise path hit testing is a driver concern; the compiled
            // AABB is the contract here.
            PrimitiveKind::Path { commands } => path_bbox(commands).contains(p),
            PrimitiveKind::Sector { radius, start, end } => {
                sector_contains(*radius, *start, *end, p)
            }
            PrimitiveKind::Sprites { draws } => draws.iter().any(|d| {
                p.x >= d.dst[0]
                    && p.x <= d.dst[0] + d.dst[2]
                    && p.y >= d.dst[1]
                    && p.y <= d.dst[1] + d.dst[3]
            }),
        }
    }

    /// Emit the variant's drawing commands. State commands are the
    /// compiler's job; only geometry is produced here.
    pub fn emit(&self, out: &mut Vec<Command>) {
        match self {
            PrimitiveKind::Group => {}
            PrimitiveKind::Rect { width, height } => out.push(Command::DrawRect(*width, *height)),
            PrimitiveKind::RoundedRect {
                width,
                height,
                radius,
            } => out.push(Command::DrawRrect(*width, *height, *radius)),
            PrimitiveKind::Circle { radius } => out.push(Command::DrawCircle(*radius)),
            PrimitiveKind::Ellipse { rx, ry } => out.push(Command::DrawEllipse(*rx, *ry)),
            PrimitiveKind::Line { from, to } => out.push(Command::DrawLine(*from, *to)),
            PrimitiveKind::Triangle { p1, p2, p3 } => {
                out.push(Command::DrawTriangle(*p1, *p2, *p3));
            }
            PrimitiveKind::Quad { p1, p2, p3, p4 } => {
                out.push(Command::DrawQuad(*p1, *p2, *p3, *p4));
            }
            PrimitiveKind::Path { commands } => out.push(Command::DrawPath(commands.clone())),
            PrimitiveKind::Arc { radius, start, end } => {
                out.push(Command::DrawArc(*radius, *start, *end));
            }
            PrimitiveKind::Sector { radius, start, end } => {
                out.push(Command::DrawSector(*radius, *start, *end));
            }
            PrimitiveKind::Text { content } => out.push(Command::DrawText(content.clone())),
            PrimitiveKind::Sprites { draws } => out.push(Command::DrawSprites(draws.clone())),
            PrimitiveKind::ScriptRef { target } | PrimitiveKind::ComponentRef { target } => {
                out.push(Command::DrawScript(*target));
            }
        }
    }
}

/// A placed primitive: tagged payload plus transform, styles, optional id,
/// and optional semantic overlay. Child uids live in the owning graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub transform: Transform,
    pub styles: StyleSet,
    pub id: Option<Atom>,
    pub semantic: Option<Semantic>,
}

impl Primitive {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            transform: Transform::IDENTITY,
            styles: StyleSet::new(),
            id: None,
            semantic: None,
        }
    }

    pub fn group() -> Self {
        Self::new(PrimitiveKind::Group)
    }

    pub fn rect(width: f64, height: f64) -> Self {
        Self::new(PrimitiveKind::Rect { width, height })
    }

    pub fn rounded_rect(width: f64, height: f64, radius: f64) -> Self {
        Self::new(PrimitiveKind::RoundedRect {
            width,
            height,
            radius,
        })
    }

    pub fn circle(radius: f64) -> Self {
        Self::new(PrimitiveKind::Circle { radius })
    }

    pub fn ellipse(rx: f64, ry: f64) -> Self {
        Self::new(PrimitiveKind::Ellipse { rx, ry })
    }

    pub fn line(from: (f64, f64), to: (f64, f64)) -> Self {
        Self::new(PrimitiveKind::Line { from, to })
    }

    pub fn triangle(p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)) -> Self {
        Self::new(PrimitiveKind::Triangle { p1, p2, p3 })
    }

    pub fn quad(p1: (f64, f64), p2: (f64, f64), p3: (f64, f64), p4: (f64, f64)) -> Self {
        Self::new(PrimitiveKind::Quad { p1, p2, p3, p4 })
    }

    pub fn path(commands: Vec<PathCmd>) -> Self {
        Self::new(PrimitiveKind::Path { commands })
    }

    pub fn arc(radius: f64, start: f64, end: f64) -> Self {
        Self::new(PrimitiveKind::Arc { radius, start, end })
    }

    pub fn sector(radius: f64, start: f64, end: f64) -> Self {
        Self::new(PrimitiveKind::Sector { radius, start, end })
    }

    pub fn text(content: &str) -> Self {
        Self::new(PrimitiveKind::Text {
            content: content.to_string(),
        })
    }

    pub fn sprites(draws: Vec<SpriteDraw>) -> Self {
        Self::new(PrimitiveKind::Sprites { draws })
    }

    pub fn script_ref(target: GraphId) -> Self {
        Self::new(PrimitiveKind::ScriptRef { target })
    }

    pub fn component_ref(target: GraphId) -> Self {
        Self::new(PrimitiveKind::ComponentRef { target })
    }

    pub fn with_id(mut self, id: impl Into<Atom>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_styles(mut self, styles: StyleSet) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_semantic(mut self, semantic: Semantic) -> Self {
        self.semantic = Some(semantic);
        self
    }

    pub fn tag(&self) -> PrimitiveTag {
        self.kind.tag()
    }
}

fn point_bbox(points: &[(f64, f64)]) -> Rect {
    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    for (x, y) in points {
        min_x = min_x.min(*x);
        min_y = min_y.min(*y);
        max_x = max_x.max(*x);
        max_y = max_y.max(*y);
    }
    if min_x > max_x {
        return Rect::ZERO;
    }
    Rect::new(min_x, min_y, max_x, max_y)
}

/// Conservative AABB over every path vertex, control points included.
fn path_bbox(commands: &[PathCmd]) -> Rect {
    let mut points = Vec::new();
    for cmd in commands {
        match cmd {
            PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y) => points.push((*x, *y)),
            PathCmd::QuadTo(cx, cy, x, y) => {
                points.push((*cx, *cy));
                points.push((*x, *y));
            }
            PathCmd::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                points.push((*c1x, *c1y));
                points.push((*c2x, *c2y));
                points.push((*x, *y));
            }
            PathCmd::Close => {}
        }
    }
    point_bbox(&points)
}

fn rrect_contains(width: f64, height: f64, radius: f64, p: Point) -> bool {
    if p.x < 0.0 || p.x > width || p.y < 0.0 || p.y > height {
        return false;
    }
    let r = radius.min(width / 2.0).min(height / 2.0);
    // Inside the corner squares, the point must also fall in the corner disc.
    let cx = if p.x < r {
        Some(r)
    } else if p.x > width - r {
        Some(width - r)
    } else {
        None
    };
    let cy = if p.y < r {
        Some(r)
    } else if p.y > height - r {
        Some(height - r)
    } else {
        None
    };
    match (cx, cy) {
        (Some(cx), Some(cy)) => {
            let dx = p.x - cx;
            let dy = p.y - cy;
            dx * dx + dy * dy <= r * r
        }
        _ => true,
    }
}

fn triangle_contains(p1: (f64, f64), p2: (f64, f64), p3: (f64, f64), p: Point) -> bool {
    fn sign(a: (f64, f64), b: (f64, f64), p: Point) -> f64 {
        (p.x - b.0) * (a.1 - b.1) - (a.0 - b.0) * (p.y - b.1)
    }
    let d1 = sign(p1, p2, p);
    let d2 = sign(p2, p3, p);
    let d3 = sign(p3, p1, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

fn sector_contains(radius: f64, start: f64, end: f64, p: Point) -> bool {
    if p.x * p.x + p.y * p.y > radius * radius {
        return false;
    }
    let sweep = end - start;
    if sweep.abs() >= std::f64::consts::TAU {
        return true;
    }
    let angle = p.y.atan2(p.x);
    let norm = |a: f64| a.rem_euclid(std::f64::consts::TAU);
    if sweep >= 0.0 {
        norm(angle - start) <= sweep
    } else {
        norm(start - angle) <= -sweep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_bounds_and_containment() {
        let r = PrimitiveKind::Rect {
            width: 100.0,
            height: 50.0,
        };
        assert_eq!(r.bounds(), Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!(r.contains_point(Point::new(50.0, 25.0)));
        assert!(r.contains_point(Point::new(0.0, 0.0)));
        assert!(!r.contains_point(Point::new(101.0, 25.0)));
        assert!(!r.contains_point(Point::new(50.0, -1.0)));
    }

    #[test]
    fn circle_is_centered_on_origin() {
        let c = PrimitiveKind::Circle { radius: 10.0 };
        assert_eq!(c.bounds(), Rect::new(-10.0, -10.0, 10.0, 10.0));
        assert!(c.contains_point(Point::new(7.0, 7.0)));
        assert!(!c.contains_point(Point::new(8.0, 8.0)));
    }

    #[test]
    fn rounded_rect_excludes_sharp_corner() {
        let rr = PrimitiveKind::RoundedRect {
            width: 100.0,
            height: 100.0,
            radius: 20.0,
        };
        // The exact corner is outside the rounding disc.
        assert!(!rr.contains_point(Point::new(1.0, 1.0)));
        assert!(rr.contains_point(Point::new(20.0, 20.0)));
        assert!(rr.contains_point(Point::new(50.0, 1.0)));
    }

    #[test]
    fn triangle_and_quad_containment() {
        let t = PrimitiveKind::Triangle {
            p1: (0.0, 0.0),
            p2: (10.0, 0.0),
            p3: (0.0, 10.0),
        };
        assert!(t.contains_point(Point::new(2.0, 2.0)));
        assert!(!t.contains_point(Point::new(9.0, 9.0)));

        let q = PrimitiveKind::Quad {
            p1: (0.0, 0.0),
            p2: (10.0, 0.0),
            p3: (10.0, 10.0),
            p4: (0.0, 10.0),
        };
        assert!(q.contains_point(Point::new(9.0, 9.0)));
        assert!(!q.contains_point(Point::new(11.0, 5.0)));
    }

    #[test]
    fn sector_respects_sweep() {
        let s = PrimitiveKind::Sector {
            radius: 10.0,
            start: 0.0,
            end: std::f64::consts::FRAC_PI_2,
        };
        assert!(s.contains_point(Point::new(3.0, 3.0)));
        assert!(!s.contains_point(Point::new(3.0, -3.0)));
        assert!(!s.contains_point(Point::new(-3.0, 3.0)));
    }

    #[test]
    fn structural_variants_never_hit() {
        assert!(!PrimitiveKind::Group.contains_point(Point::new(0.0, 0.0)));
        let sref = PrimitiveKind::ScriptRef {
            target: GraphId::new("other"),
        };
        assert!(!sref.contains_point(Point::new(0.0, 0.0)));
    }

    #[test]
    fn emit_produces_one_draw_per_shape() {
        let mut out = Vec::new();
        PrimitiveKind::Rect {
            width: 1.0,
            height: 2.0,
        }
        .emit(&mut out);
        PrimitiveKind::Group.emit(&mut out);
        PrimitiveKind::ScriptRef {
            target: GraphId::new("sub"),
        }
        .emit(&mut out);
        assert_eq!(
            out,
            vec![
                Command::DrawRect(1.0, 2.0),
                Command::DrawScript(GraphId::new("sub")),
            ]
        );
    }
}
