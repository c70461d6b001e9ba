//! Style sets and their inheritance down the graph.
//!
//! Styles are stored sparsely — only fields a primitive sets explicitly are
//! `Some`. During compilation each node's explicit styles merge over the
//! styles inherited from its ancestors, and only the explicit delta is
//! emitted into the script.

use crate::color::Color;
use crate::input::InputClass;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Stroke end-cap shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

/// Stroke join shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

/// Horizontal text alignment relative to the text origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Vertical text baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBase {
    Top,
    Middle,
    Alphabetic,
    Bottom,
}

/// The set of input classes a primitive accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSet {
    /// Accept every class.
    Any,
    /// Accept exactly these classes. Empty means not input-eligible.
    Classes(SmallVec<[InputClass; 4]>),
}

impl InputSet {
    pub fn accepts(&self, class: InputClass) -> bool {
        match self {
            InputSet::Any => true,
            InputSet::Classes(cs) => cs.contains(&class),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            InputSet::Any => false,
            InputSet::Classes(cs) => cs.is_empty(),
        }
    }
}

impl From<InputClass> for InputSet {
    fn from(c: InputClass) -> Self {
        InputSet::Classes(SmallVec::from_slice(&[c]))
    }
}

impl From<&[InputClass]> for InputSet {
    fn from(cs: &[InputClass]) -> Self {
        InputSet::Classes(SmallVec::from_slice(cs))
    }
}

/// Sparse style map. `None` means "inherit".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleSet {
    pub fill: Option<Color>,
    pub stroke: Option<(f64, Color)>,
    pub font: Option<String>,
    pub font_size: Option<f64>,
    pub text_align: Option<TextAlign>,
    pub text_base: Option<TextBase>,
    pub line_cap: Option<LineCap>,
    pub line_join: Option<LineJoin>,
    pub miter_limit: Option<f64>,
    /// Clip rect `(x, y, w, h)` in local coordinates. `Some(None)` clears an
    /// inherited scissor.
    pub scissor: Option<Option<[f64; 4]>>,
    pub hidden: Option<bool>,
    pub input: Option<InputSet>,
}

impl StyleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge `self` (the child's explicit styles) over `inherited`, yielding
    /// the child's effective style set.
    pub fn merge_over(&self, inherited: &StyleSet) -> StyleSet {
        StyleSet {
            fill: self.fill.clone().or_else(|| inherited.fill.clone()),
            stroke: self.stroke.clone().or_else(|| inherited.stroke.clone()),
            font: self.font.clone().or_else(|| inherited.font.clone()),
            font_size: self.font_size.or(inherited.font_size),
            text_align: self.text_align.or(inherited.text_align),
            text_base: self.text_base.or(inherited.text_base),
            line_cap: self.line_cap.or(inherited.line_cap),
            line_join: self.line_join.or(inherited.line_join),
            miter_limit: self.miter_limit.or(inherited.miter_limit),
            scissor: self.scissor.or(inherited.scissor),
            hidden: self.hidden.or(inherited.hidden),
            input: self.input.clone().or_else(|| inherited.input.clone()),
        }
    }

    // Chainable setters used by the graph builder.

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn with_stroke(mut self, width: f64, color: Color) -> Self {
        self.stroke = Some((width, color));
        self
    }

    pub fn with_font(mut self, font: &str, size: f64) -> Self {
        self.font = Some(font.to_string());
        self.font_size = Some(size);
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn with_input(mut self, input: impl Into<InputSet>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_scissor(mut self, rect: Option<[f64; 4]>) -> Self {
        self.scissor = Some(rect);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::NamedColor;

    #[test]
    fn child_overrides_inherited() {
        let parent = StyleSet::new()
            .with_fill(Color::Named(NamedColor::Red))
            .with_font("roboto", 12.0);
        let child = StyleSet::new().with_fill(Color::Named(NamedColor::Blue));

        let effective = child.merge_over(&parent);
        assert_eq!(effective.fill, Some(Color::Named(NamedColor::Blue)));
        assert_eq!(effective.font.as_deref(), Some("roboto"));
        assert_eq!(effective.font_size, Some(12.0));
    }

    #[test]
    fn scissor_can_be_cleared_by_child() {
        let parent = StyleSet::new().with_scissor(Some([0.0, 0.0, 10.0, 10.0]));
        let child = StyleSet::new().with_scissor(None);
        let effective = child.merge_over(&parent);
        assert_eq!(effective.scissor, Some(None));
    }

    #[test]
    fn input_set_membership() {
        let set = InputSet::from(InputClass::CursorButton);
        assert!(set.accepts(InputClass::CursorButton));
        assert!(!set.accepts(InputClass::Key));
        assert!(InputSet::Any.accepts(InputClass::Key));
        assert!(InputSet::Classes(SmallVec::new()).is_empty());
    }
}
