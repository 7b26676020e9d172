//! 出力先の抽象化
//!
//! 実端末（crossterm）とテスト用の記録サーフェスの2実装を持つ。

use super::utils::{detect_color_support, detect_terminal_width, split_key_markup};
use super::viewport::{CellStyle, RowKind, ViewBlock, ViewRow};
use crossterm::{
    cursor,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
    QueueableCommand,
};
use std::io::{self, Stdout, Write};

/// Color role of a plain output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Success,
    Failure,
    Emphasis,
    Muted,
}

/// Where the session writes everything it shows
pub trait Surface {
    /// Usable columns per row
    fn width(&self) -> usize;

    fn line(&mut self, text: &str, tone: Tone) -> io::Result<()>;

    /// Draw a viewport block. The first call for a hit reserves rows and
    /// stores the anchor; later calls with the same anchor overwrite them.
    fn draw_block(&mut self, anchor: &mut Option<u16>, block: &ViewBlock) -> io::Result<()>;

    /// Show a key prompt; bracketed keys (`[Y]es`) are emphasized
    fn prompt(&mut self, text: &str) -> io::Result<()>;

    fn clear_prompt(&mut self) -> io::Result<()>;

    /// One row of the binary dump table
    fn table_row(&mut self, text: &str, highlighted: bool) -> io::Result<()>;
}

/// crossterm で標準出力に描画するサーフェス
pub struct TerminalSurface {
    out: Stdout,
    colors: bool,
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            colors: detect_color_support(),
        }
    }

    fn tone_color(tone: Tone) -> Option<Color> {
        match tone {
            Tone::Normal => None,
            Tone::Success => Some(Color::Green),
            Tone::Failure => Some(Color::Red),
            Tone::Emphasis => Some(Color::Yellow),
            Tone::Muted => Some(Color::DarkYellow),
        }
    }

    /// 最初の描画で行を確保し、その先頭行を返す
    fn reserve_rows(&mut self, height: u16) -> io::Result<u16> {
        for _ in 0..height {
            self.out.queue(Print("\n"))?;
        }
        if height > 0 {
            self.out.queue(cursor::MoveUp(height))?;
        }
        self.out.flush()?;
        let (_, row) = cursor::position()?;
        Ok(row)
    }

    fn paint_row(&mut self, row: &ViewRow, width: usize) -> io::Result<()> {
        let background = if row.is_focus() {
            Color::Blue
        } else {
            Color::DarkBlue
        };
        let mut used = 0;

        if self.colors {
            self.out.queue(SetBackgroundColor(background))?;
        }

        if let Some(gutter) = &row.gutter {
            if self.colors {
                let color = if row.is_focus() { Color::Yellow } else { Color::Grey };
                self.out.queue(SetForegroundColor(color))?;
            }
            self.out.queue(Print(gutter))?;
            used += gutter.chars().count();
        }

        for segment in &row.segments {
            self.paint_segment(row.kind, segment.style, &segment.text, background)?;
            used += segment.text.chars().count();
        }

        if self.colors {
            self.out.queue(SetBackgroundColor(background))?;
        }
        let padding = width.saturating_sub(used);
        self.out.queue(Print(" ".repeat(padding)))?;
        self.out.queue(SetAttribute(Attribute::Reset))?;
        self.out.queue(ResetColor)?;
        Ok(())
    }

    fn paint_segment(
        &mut self,
        kind: RowKind,
        style: CellStyle,
        text: &str,
        background: Color,
    ) -> io::Result<()> {
        if self.colors {
            let (fg, bg) = match (kind, style) {
                (RowKind::EndOfFile, _) => (Color::Red, background),
                (_, CellStyle::Primary) => (Color::Black, Color::Cyan),
                (_, CellStyle::Secondary) => (Color::Green, background),
                (_, CellStyle::Default) => (Color::Grey, background),
            };
            self.out.queue(SetForegroundColor(fg))?;
            self.out.queue(SetBackgroundColor(bg))?;
        } else {
            // 色なしでもヒット位置が分かるように属性で区別する
            let attribute = match style {
                CellStyle::Primary => Attribute::Reverse,
                CellStyle::Secondary => Attribute::Underlined,
                CellStyle::Default => Attribute::Reset,
            };
            self.out.queue(SetAttribute(attribute))?;
        }
        self.out.queue(Print(text))?;
        if !self.colors {
            self.out.queue(SetAttribute(Attribute::Reset))?;
        }
        Ok(())
    }
}

impl Surface for TerminalSurface {
    fn width(&self) -> usize {
        // 最終列に書くと折り返す端末があるため1列残す
        detect_terminal_width().saturating_sub(1).max(1)
    }

    fn line(&mut self, text: &str, tone: Tone) -> io::Result<()> {
        match Self::tone_color(tone).filter(|_| self.colors) {
            Some(color) => {
                self.out.queue(SetForegroundColor(color))?;
                self.out.queue(Print(text))?;
                self.out.queue(ResetColor)?;
            }
            None => {
                self.out.queue(Print(text))?;
            }
        }
        self.out.queue(Print("\n"))?;
        self.out.flush()
    }

    fn draw_block(&mut self, anchor: &mut Option<u16>, block: &ViewBlock) -> io::Result<()> {
        let height = block.height() as u16;
        let top = match *anchor {
            Some(row) => row,
            None => {
                let row = self.reserve_rows(height)?;
                *anchor = Some(row);
                row
            }
        };

        let width = self.width();
        for (offset, row) in block.rows.iter().enumerate() {
            self.out.queue(cursor::MoveTo(0, top + offset as u16))?;
            self.paint_row(row, width)?;
        }
        self.out.queue(cursor::MoveTo(0, top + height))?;
        self.out.flush()
    }

    fn prompt(&mut self, text: &str) -> io::Result<()> {
        for (part, emphasized) in split_key_markup(text) {
            if emphasized && self.colors {
                self.out.queue(SetForegroundColor(Color::Yellow))?;
                self.out.queue(Print(part))?;
                self.out.queue(ResetColor)?;
            } else if emphasized {
                self.out.queue(Print(format!("[{part}]")))?;
            } else {
                self.out.queue(Print(part))?;
            }
        }
        self.out.flush()
    }

    fn clear_prompt(&mut self) -> io::Result<()> {
        self.out.queue(Print("\r"))?;
        self.out.queue(Clear(ClearType::CurrentLine))?;
        self.out.flush()
    }

    fn table_row(&mut self, text: &str, highlighted: bool) -> io::Result<()> {
        if highlighted && self.colors {
            self.out.queue(SetBackgroundColor(Color::Blue))?;
            self.out.queue(SetForegroundColor(Color::White))?;
            self.out.queue(Print(text))?;
            self.out.queue(ResetColor)?;
        } else if highlighted {
            self.out.queue(SetAttribute(Attribute::Reverse))?;
            self.out.queue(Print(text))?;
            self.out.queue(SetAttribute(Attribute::Reset))?;
        } else {
            self.out.queue(Print(text))?;
        }
        self.out.queue(Print("\n"))?;
        self.out.flush()
    }
}

/// Everything a [`RecordingSurface`] was asked to show
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Line(String, Tone),
    Block { anchor: u16, rows: Vec<String> },
    Prompt(String),
    TableRow(String, bool),
}

/// 出力を記録するだけのサーフェス（テスト用）
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub width: usize,
    pub events: Vec<Recorded>,
    next_anchor: u16,
}

impl RecordingSurface {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            events: Vec::new(),
            next_anchor: 0,
        }
    }

    /// Plain output lines in order
    pub fn lines(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Recorded::Line(text, _) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn blocks(&self) -> Vec<(u16, Vec<String>)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Recorded::Block { anchor, rows } => Some((*anchor, rows.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn table_rows(&self) -> Vec<(String, bool)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Recorded::TableRow(text, highlighted) => Some((text.clone(), *highlighted)),
                _ => None,
            })
            .collect()
    }

    /// Prompts in the order they were shown
    pub fn prompts(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Recorded::Prompt(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn contains_line(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> usize {
        self.width
    }

    fn line(&mut self, text: &str, tone: Tone) -> io::Result<()> {
        self.events.push(Recorded::Line(text.to_string(), tone));
        Ok(())
    }

    fn draw_block(&mut self, anchor: &mut Option<u16>, block: &ViewBlock) -> io::Result<()> {
        let top = *anchor.get_or_insert_with(|| {
            let row = self.next_anchor;
            self.next_anchor += block.height() as u16;
            row
        });
        self.events.push(Recorded::Block {
            anchor: top,
            rows: block.texts(),
        });
        Ok(())
    }

    fn prompt(&mut self, text: &str) -> io::Result<()> {
        self.events.push(Recorded::Prompt(text.to_string()));
        Ok(())
    }

    fn clear_prompt(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn table_row(&mut self, text: &str, highlighted: bool) -> io::Result<()> {
        self.events
            .push(Recorded::TableRow(text.to_string(), highlighted));
        Ok(())
    }
}
