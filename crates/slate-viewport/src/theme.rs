//! Theme presets propagated to drivers and scenes.

use slate_core::{Color, NamedColor};

/// The color roles a driver needs to paint chrome consistently.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub text: Color,
    pub background: Color,
    pub border: Color,
    pub active: Color,
    pub thumb: Color,
    pub focus: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            text: Color::Named(NamedColor::White),
            background: Color::Rgb(0x20, 0x20, 0x20),
            border: Color::Named(NamedColor::DimGray),
            active: Color::Rgb(0x40, 0x40, 0x40),
            thumb: Color::Named(NamedColor::SteelBlue),
            focus: Color::Named(NamedColor::CornflowerBlue),
        }
    }

    pub fn light() -> Self {
        Self {
            text: Color::Named(NamedColor::Black),
            background: Color::Named(NamedColor::WhiteSmoke),
            border: Color::Named(NamedColor::DarkGray),
            active: Color::Named(NamedColor::Gainsboro),
            thumb: Color::Named(NamedColor::SteelBlue),
            focus: Color::Named(NamedColor::CornflowerBlue),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
