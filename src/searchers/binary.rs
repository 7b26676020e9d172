//! バイナリ検索
//!
//! ファイル全体を4バイトずつ（重ならない）区切り、各ウィンドウを数値・バイト値・
//! 文字として解釈して照合する。すべてのウィンドウを表形式で出力し、ヒット行を
//! 強調する。

use crate::config::BinaryKind;
use crate::display::surface::Tone;
use crate::error::{TsError, TsResult};
use crate::session::{DocumentFlow, Session};
use crate::tree::SearchableDocument;
use crate::tui::input::KeyProfile;
use std::io;

/// Bytes per window
pub const WINDOW_SIZE: usize = 4;
/// 区切り行を入れる間隔（行数）
pub const SEPARATOR_EVERY: usize = 4;
/// 定期的に一時停止する間隔（ウィンドウ数）
pub const CHECKPOINT_EVERY: usize = 128;

pub const TABLE_HEADER: &str =
    "  offset       uint32       int32          float32 uint16 uint16  int16  int16  bytes        text";

/// All reinterpretations of one window
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub offset: usize,
    pub bytes: Vec<u8>,
    pub f32: Option<f32>,
    pub u32: Option<u32>,
    pub i32: Option<i32>,
    pub u16: Vec<u16>,
    pub i16: Vec<i16>,
    pub chars: Vec<String>,
}

/// 1バイトを表示用の文字に。制御文字はエスケープ表記
fn render_byte(byte: u8) -> String {
    match byte {
        0 => "\\0".to_string(),
        b'\r' => "\\r".to_string(),
        b'\n' => "\\n".to_string(),
        b'\t' => "\\t".to_string(),
        b if b < 0x20 || b == 0x7f => ".".to_string(),
        b => char::from(b).to_string(),
    }
}

/// 桁が大きすぎる値は指数表記にする
pub fn format_f32(value: f32) -> String {
    let magnitude = value.abs();
    if value == 0.0 || !value.is_finite() || (1e-4..1e7).contains(&magnitude) {
        value.to_string()
    } else {
        format!("{value:e}")
    }
}

impl Window {
    /// 1〜4バイトのチャンクを解釈する。16ビット値は2バイト以上、32ビット値は
    /// 4バイト揃った場合のみ
    pub fn decode(offset: usize, chunk: &[u8]) -> Self {
        let full: Option<[u8; 4]> = chunk.try_into().ok();
        let pairs: Vec<[u8; 2]> = chunk
            .chunks_exact(2)
            .take(if full.is_some() { 2 } else { 1 })
            .filter_map(|pair| pair.try_into().ok())
            .collect();

        Self {
            offset,
            bytes: chunk.to_vec(),
            f32: full.map(f32::from_le_bytes),
            u32: full.map(u32::from_le_bytes),
            i32: full.map(i32::from_le_bytes),
            u16: pairs.iter().map(|p| u16::from_le_bytes(*p)).collect(),
            i16: pairs.iter().map(|p| i16::from_le_bytes(*p)).collect(),
            chars: chunk.iter().map(|b| render_byte(*b)).collect(),
        }
    }

    pub fn text(&self) -> String {
        self.chars.concat()
    }

    /// 比較用の文字列表現すべて
    pub fn renderings(&self) -> Vec<String> {
        let mut values = Vec::new();
        values.extend(self.f32.map(format_f32));
        values.extend(self.u32.map(|v| v.to_string()));
        values.extend(self.i32.map(|v| v.to_string()));
        values.extend(self.u16.iter().map(|v| v.to_string()));
        values.extend(self.i16.iter().map(|v| v.to_string()));
        values.extend(self.bytes.iter().map(|v| v.to_string()));
        values.extend(self.chars.iter().cloned());
        values
    }

    /// One table row
    pub fn row(&self) -> String {
        let opt = |value: Option<String>| value.unwrap_or_default();
        let u16_at = |i: usize| opt(self.u16.get(i).map(|v| v.to_string()));
        let i16_at = |i: usize| opt(self.i16.get(i).map(|v| v.to_string()));
        let hex: Vec<String> = self.bytes.iter().map(|b| format!("{b:02x}")).collect();

        format!(
            "{:08X} {:>12} {:>11} {:>16} {:>6} {:>6} {:>6} {:>6}  {:<12} {}",
            self.offset,
            opt(self.u32.map(|v| v.to_string())),
            opt(self.i32.map(|v| v.to_string())),
            opt(self.f32.map(format_f32)),
            u16_at(0),
            u16_at(1),
            i16_at(0),
            i16_at(1),
            hex.join(" "),
            self.text()
        )
    }
}

/// The parsed query
#[derive(Debug, Clone, PartialEq)]
pub enum BinaryTarget {
    /// 型指定なし: 文字列として比較
    Any(String),
    F32(f32),
    U32(u32),
    I32(i32),
    U16(u16),
    I16(i16),
}

impl BinaryTarget {
    /// 数値として解釈できないクエリは起動エラー
    pub fn parse(kind: BinaryKind, query: &str) -> TsResult<Self> {
        let text = query.trim();
        if text.is_empty() {
            return Err(TsError::MissingQuery);
        }
        let invalid = || TsError::InvalidNumber {
            kind: kind.name(),
            value: query.to_string(),
        };
        Ok(match kind {
            BinaryKind::Any => BinaryTarget::Any(query.to_string()),
            BinaryKind::F32 => BinaryTarget::F32(text.parse().map_err(|_| invalid())?),
            BinaryKind::U32 => BinaryTarget::U32(text.parse().map_err(|_| invalid())?),
            BinaryKind::I32 => BinaryTarget::I32(text.parse().map_err(|_| invalid())?),
            BinaryKind::U16 => BinaryTarget::U16(text.parse().map_err(|_| invalid())?),
            BinaryKind::I16 => BinaryTarget::I16(text.parse().map_err(|_| invalid())?),
        })
    }

    pub fn matches(&self, window: &Window) -> bool {
        match self {
            BinaryTarget::F32(v) => window.f32 == Some(*v),
            BinaryTarget::U32(v) => window.u32 == Some(*v),
            BinaryTarget::I32(v) => window.i32 == Some(*v),
            BinaryTarget::U16(v) => window.u16.contains(v),
            BinaryTarget::I16(v) => window.i16.contains(v),
            BinaryTarget::Any(query) => {
                window.renderings().iter().any(|value| value == query)
                    || window
                        .text()
                        .to_lowercase()
                        .contains(&query.to_lowercase())
            }
        }
    }
}

/// Binary pattern strategy
pub struct BinarySearch {
    kind: BinaryKind,
    target: BinaryTarget,
}

impl BinarySearch {
    pub fn new(kind: BinaryKind, query: &str) -> TsResult<Self> {
        Ok(Self {
            kind,
            target: BinaryTarget::parse(kind, query)?,
        })
    }

    pub fn kind(&self) -> BinaryKind {
        self.kind
    }

    pub fn process(
        &self,
        doc: &mut SearchableDocument,
        session: &mut Session<'_>,
    ) -> io::Result<DocumentFlow> {
        let path = doc.path().to_path_buf();
        let bytes = match doc.bytes() {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("Failed to read {}: {}", path.display(), err);
                return Ok(DocumentFlow::Next);
            }
        };
        session.counters.files += 1;

        session
            .surface
            .line(&path.display().to_string(), Tone::Emphasis)?;
        session.surface.line(TABLE_HEADER, Tone::Muted)?;

        let mut hits = 0;
        let mut flow = DocumentFlow::Next;

        for (index, chunk) in bytes.chunks(WINDOW_SIZE).enumerate() {
            let window = Window::decode(index * WINDOW_SIZE, chunk);
            if index > 0 && index % SEPARATOR_EVERY == 0 {
                session
                    .surface
                    .line(&format!("-------- {:08X}", window.offset), Tone::Muted)?;
            }

            let hit = self.target.matches(&window);
            session.surface.table_row(&window.row(), hit)?;

            // 自動モードでも定期停止は行う（D で無効化されるまで）
            if !session.pause_disabled && (index + 1) % CHECKPOINT_EVERY == 0 {
                let answer = session.ask(KeyProfile::Checkpoint)?;
                if let Some(next) = answer.document_flow() {
                    flow = next;
                    break;
                }
            }

            if !hit {
                continue;
            }
            hits += 1;
            session.counters.hits += 1;
            let answer = if session.auto {
                None
            } else {
                Some(session.ask(KeyProfile::BinaryHit)?)
            };
            if session.limit_reached() {
                flow = DocumentFlow::Stop;
                break;
            }
            if let Some(next) = answer.and_then(|answer| answer.document_flow()) {
                flow = next;
                break;
            }
        }

        if hits > 0 {
            doc.had_hit = true;
        }
        Ok(flow)
    }
}
