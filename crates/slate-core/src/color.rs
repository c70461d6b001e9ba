//! Color model: named constants, RGB/RGBA, and gradient paints.
//!
//! Colors appear both in style sets and inside compiled script commands, so
//! everything here is serde-serializable. Equality is structural — two colors
//! compare equal iff they were declared the same way, which is what the
//! script change detector relies on.

use serde::{Deserialize, Serialize};

/// A resolved 8-bit RGBA quadruple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Named color constants (the common CSS names plus the grays themes use).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    AliceBlue,
    Black,
    Blue,
    CornflowerBlue,
    Cornsilk,
    Cyan,
    DarkGray,
    DarkGreen,
    DarkRed,
    DimGray,
    Gainsboro,
    Gray,
    Green,
    LightBlue,
    LightGray,
    Lime,
    Magenta,
    Maroon,
    MidnightBlue,
    Navy,
    Olive,
    Orange,
    Purple,
    Red,
    Silver,
    SteelBlue,
    Teal,
    White,
    WhiteSmoke,
    Yellow,
}

impl NamedColor {
    /// Resolve the constant to its RGBA value.
    pub const fn to_rgba(self) -> Rgba {
        use NamedColor::*;
        match self {
            AliceBlue => Rgba::opaque(0xF0, 0xF8, 0xFF),
            Black => Rgba::opaque(0x00, 0x00, 0x00),
            Blue => Rgba::opaque(0x00, 0x00, 0xFF),
            CornflowerBlue => Rgba::opaque(0x64, 0x95, 0xED),
            Cornsilk => Rgba::opaque(0xFF, 0xF8, 0xDC),
            Cyan => Rgba::opaque(0x00, 0xFF, 0xFF),
            DarkGray => Rgba::opaque(0xA9, 0xA9, 0xA9),
            DarkGreen => Rgba::opaque(0x00, 0x64, 0x00),
            DarkRed => Rgba::opaque(0x8B, 0x00, 0x00),
            DimGray => Rgba::opaque(0x69, 0x69, 0x69),
            Gainsboro => Rgba::opaque(0xDC, 0xDC, 0xDC),
            Gray => Rgba::opaque(0x80, 0x80, 0x80),
            Green => Rgba::opaque(0x00, 0x80, 0x00),
            LightBlue => Rgba::opaque(0xAD, 0xD8, 0xE6),
            LightGray => Rgba::opaque(0xD3, 0xD3, 0xD3),
            Lime => Rgba::opaque(0x00, 0xFF, 0x00),
            Magenta => Rgba::opaque(0xFF, 0x00, 0xFF),
            Maroon => Rgba::opaque(0x80, 0x00, 0x00),
            MidnightBlue => Rgba::opaque(0x19, 0x19, 0x70),
            Navy => Rgba::opaque(0x00, 0x00, 0x80),
            Olive => Rgba::opaque(0x80, 0x80, 0x00),
            Orange => Rgba::opaque(0xFF, 0xA5, 0x00),
            Purple => Rgba::opaque(0x80, 0x00, 0x80),
            Red => Rgba::opaque(0xFF, 0x00, 0x00),
            Silver => Rgba::opaque(0xC0, 0xC0, 0xC0),
            SteelBlue => Rgba::opaque(0x46, 0x82, 0xB4),
            Teal => Rgba::opaque(0x00, 0x80, 0x80),
            White => Rgba::opaque(0xFF, 0xFF, 0xFF),
            WhiteSmoke => Rgba::opaque(0xF5, 0xF5, 0xF5),
            Yellow => Rgba::opaque(0xFF, 0xFF, 0x00),
        }
    }
}

/// Fill or stroke color. Tagged union over named constant, RGB triple,
/// RGBA quadruple, and the gradient descriptors drivers know how to shade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Color {
    Named(NamedColor),
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, u8),
    /// Linear gradient from `start` to `end` in local coordinates.
    Linear {
        start: (f32, f32),
        end: (f32, f32),
        from: Rgba,
        to: Rgba,
    },
    /// Radial gradient centered at `center`.
    Radial {
        center: (f32, f32),
        inner_radius: f32,
        outer_radius: f32,
        from: Rgba,
        to: Rgba,
    },
    /// Box gradient over `(x, y, w, h)` with corner radius and feather.
    Box {
        rect: (f32, f32, f32, f32),
        radius: f32,
        feather: f32,
        from: Rgba,
        to: Rgba,
    },
}

impl Color {
    /// Resolve flat (non-gradient) colors to RGBA. Gradients resolve to their
    /// `from` stop, which is what a driver without gradient support paints.
    pub fn to_rgba(&self) -> Rgba {
        match self {
            Color::Named(n) => n.to_rgba(),
            Color::Rgb(r, g, b) => Rgba::opaque(*r, *g, *b),
            Color::Rgba(r, g, b, a) => Rgba::new(*r, *g, *b, *a),
            Color::Linear { from, .. } | Color::Radial { from, .. } | Color::Box { from, .. } => {
                *from
            }
        }
    }
}

impl From<NamedColor> for Color {
    fn from(n: NamedColor) -> Self {
        Color::Named(n)
    }
}
