//! The compiled drawing-command stream ("script") and its wire encoding.
//!
//! A script is the flattened rendering of a graph in paint order, with
//! inherited state already resolved into explicit commands. The command set
//! is closed; drivers interpret it, the registry stores it, and the
//! change detector compares the encoded bytes.
//!
//! Encoding is canonical MessagePack via `rmp-serde`: compiling the same
//! graph twice yields byte-identical output, so a byte compare is a
//! semantic compare.

use crate::color::Color;
use crate::id::GraphId;
use crate::style::{LineCap, LineJoin, TextAlign, TextBase};
use serde::{Deserialize, Serialize};

/// A single path command (SVG-like but simplified).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadTo(f64, f64, f64, f64),
    CubicTo(f64, f64, f64, f64, f64, f64),
    Close,
}

/// One sprite blit: source rect in the image, destination rect in local
/// coordinates, both `(x, y, w, h)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteDraw {
    pub src: [f64; 4],
    pub dst: [f64; 4],
    pub image: String,
}

/// The closed wire-level command set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    PushState,
    PopState,
    /// 2D affine as `[a, b, c, d, e, f]` column-major coefficients.
    Transform([f64; 6]),
    Translate(f64, f64),
    Scale(f64, f64),
    Rotate(f64),
    FillColor(Color),
    StrokeColor(Color),
    StrokeWidth(f64),
    LineCap(LineCap),
    LineJoin(LineJoin),
    MiterLimit(f64),
    Font(String),
    FontSize(f64),
    TextAlign(TextAlign),
    TextBase(TextBase),
    /// Clip rect `(x, y, w, h)`; `None` clears the scissor.
    Scissor(Option<[f64; 4]>),
    Hidden(bool),
    DrawLine((f64, f64), (f64, f64)),
    DrawRect(f64, f64),
    DrawRrect(f64, f64, f64),
    DrawCircle(f64),
    DrawEllipse(f64, f64),
    DrawTriangle((f64, f64), (f64, f64), (f64, f64)),
    DrawQuad((f64, f64), (f64, f64), (f64, f64), (f64, f64)),
    DrawPath(Vec<PathCmd>),
    DrawArc(f64, f64, f64),
    DrawSector(f64, f64, f64),
    DrawText(String),
    DrawSprites(Vec<SpriteDraw>),
    /// Defer to another registered script at draw time.
    DrawScript(GraphId),
}

/// An ordered command sequence for one graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Script {
    commands: Vec<Command>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of draw commands, ignoring state bookkeeping.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Command::DrawLine(..)
                        | Command::DrawRect(..)
                        | Command::DrawRrect(..)
                        | Command::DrawCircle(..)
                        | Command::DrawEllipse(..)
                        | Command::DrawTriangle(..)
                        | Command::DrawQuad(..)
                        | Command::DrawPath(..)
                        | Command::DrawArc(..)
                        | Command::DrawSector(..)
                        | Command::DrawText(..)
                        | Command::DrawSprites(..)
                        | Command::DrawScript(..)
                )
            })
            .count()
    }

    /// Encode to canonical MessagePack bytes.
    pub fn encode(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec(&self.commands)
    }

    /// Decode a script previously produced by [`Script::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        let commands = rmp_serde::from_slice(bytes)?;
        Ok(Self { commands })
    }
}

impl From<Vec<Command>> for Script {
    fn from(commands: Vec<Command>) -> Self {
        Self { commands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Script {
        Script::from(vec![
            Command::PushState,
            Command::Transform([1.0, 0.0, 0.0, 1.0, 10.0, 20.0]),
            Command::FillColor(Color::Rgb(255, 0, 0)),
            Command::DrawRect(100.0, 50.0),
            Command::PopState,
        ])
    }

    #[test]
    fn encode_roundtrip() {
        let script = sample();
        let bytes = script.encode().unwrap();
        let back = Script::decode(&bytes).unwrap();
        assert_eq!(script, back);
    }

    #[test]
    fn encoding_is_stable() {
        // Byte-stable encoding is what the no-op change detector relies on.
        assert_eq!(sample().encode().unwrap(), sample().encode().unwrap());
    }

    #[test]
    fn draw_count_ignores_state() {
        assert_eq!(sample().draw_count(), 1);
        assert_eq!(sample().len(), 5);
    }
}
