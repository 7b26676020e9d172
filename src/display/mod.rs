//! 表示モジュール
//!
//! ビューポートの計算、スクロール量の補正、出力先サーフェスを提供する。

pub mod offset;
pub mod surface;
pub mod utils;
pub mod viewport;

pub use offset::{horizontal_offset, vertical_offset};
pub use surface::{Recorded, RecordingSurface, Surface, TerminalSurface, Tone};
pub use viewport::{render_window, ViewBlock, ViewportRequest, ViewportState};
