//! # Receipt Command Types
//!
//! A receipt is an ordered list of commands; order is significant and is
//! preserved exactly through encoding and transmission.

use serde::Serialize;

use crate::protocol::barcode::qr::QrErrorLevel;
use crate::protocol::text::{Alignment, Font};

/// A text block: payload plus the attributes it prints with.
///
/// `content` is printed verbatim; line breaks are part of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub content: String,
    pub align: Alignment,
    pub font: Font,
    /// Width multiplier, 1 = normal.
    pub width_scale: u8,
    /// Height multiplier, 1 = normal.
    pub height_scale: u8,
    pub bold: bool,
}

impl TextBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            align: Alignment::Left,
            font: Font::A,
            width_scale: 1,
            height_scale: 1,
            bold: false,
        }
    }

    /// Text followed by a line feed.
    pub fn line(content: impl AsRef<str>) -> Self {
        Self::new(format!("{}\n", content.as_ref()))
    }

    pub fn center(mut self) -> Self {
        self.align = Alignment::Center;
        self
    }

    pub fn font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn size(mut self, width: u8, height: u8) -> Self {
        self.width_scale = width;
        self.height_scale = height;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// A QR symbol block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrBlock {
    pub payload: String,
    /// Target symbol width in printer dots.
    pub size_px: u32,
    pub error_level: QrErrorLevel,
    pub align: Alignment,
}

/// One unit of the receipt protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Command {
    /// Reset the printer (ESC @) and select PC437.
    Init,
    Text(TextBlock),
    QrCode(QrBlock),
    /// Print and feed n lines.
    Feed { lines: u8 },
}

impl Command {
    /// The text payload, if this is a text block.
    pub fn text(&self) -> Option<&str> {
        match self {
            Command::Text(block) => Some(&block.content),
            _ => None,
        }
    }

    /// The QR block, if this is one.
    pub fn qr(&self) -> Option<&QrBlock> {
        match self {
            Command::QrCode(block) => Some(block),
            _ => None,
        }
    }
}

/// An ordered list of commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub commands: Vec<Command>,
}

impl Program {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Create a program with an initial Init command.
    pub fn with_init() -> Self {
        Self {
            commands: vec![Command::Init],
        }
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn extend(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.commands.extend(commands);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Concatenated text payloads, in order. Used by tests and logging.
    pub fn text_content(&self) -> String {
        self.commands.iter().filter_map(Command::text).collect()
    }
}

impl From<Vec<Command>> for Program {
    fn from(commands: Vec<Command>) -> Self {
        Self { commands }
    }
}

impl FromIterator<Command> for Program {
    fn from_iter<T: IntoIterator<Item = Command>>(iter: T) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Program {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
