//! ビューポート描画
//!
//! ヒット行を中心にした固定高さの窓を計算する。出力先への書き込みは
//! [`Surface`](super::surface::Surface) が担当し、ここでは行と色分けだけを決める。

use crate::searchers::matcher::{Matcher, Span};

/// Marker printed on the row right after the last line
pub const EOF_MARKER: &str = ">>>>>> EOF ";

/// 行番号ガター（`{:>5}: `）の幅
pub const GUTTER_WIDTH: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Default,
    /// 現在のヒット
    Primary,
    /// 窓内のその他の出現
    Secondary,
}

/// A run of characters sharing one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: CellStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Document line (0-based index)
    Text { line: usize, focus: bool },
    EndOfFile,
    Filler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
    pub kind: RowKind,
    pub gutter: Option<String>,
    pub segments: Vec<Segment>,
}

impl ViewRow {
    fn filler() -> Self {
        Self {
            kind: RowKind::Filler,
            gutter: None,
            segments: Vec::new(),
        }
    }

    /// ガターを含む行全体のテキスト
    pub fn plain_text(&self) -> String {
        let mut text = self.gutter.clone().unwrap_or_default();
        for segment in &self.segments {
            text.push_str(&segment.text);
        }
        text
    }

    pub fn is_focus(&self) -> bool {
        matches!(self.kind, RowKind::Text { focus: true, .. })
    }
}

/// Fixed-height block of rows ready to be drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewBlock {
    pub rows: Vec<ViewRow>,
}

impl ViewBlock {
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.rows.iter().map(ViewRow::plain_text).collect()
    }
}

/// Scroll position for one hit; a fresh state is made for every hit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewportState {
    pub vertical: i64,
    pub horizontal: usize,
    /// 最初の描画で確保した画面上の行。同じヒットの再描画はここに上書きする
    pub anchor: Option<u16>,
}

impl ViewportState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Everything needed to lay out one hit
#[derive(Debug, Clone)]
pub struct ViewportRequest<'a> {
    pub lines: &'a [String],
    pub focus_line: usize,
    pub half_window: usize,
    pub highlight: Option<Span>,
    pub show_line_numbers: bool,
    pub secondary: Option<&'a Matcher>,
    /// 1行に使える表示幅（ガター込み）
    pub width: usize,
}

impl<'a> ViewportRequest<'a> {
    pub fn new(lines: &'a [String], focus_line: usize, half_window: usize, width: usize) -> Self {
        Self {
            lines,
            focus_line,
            half_window,
            highlight: None,
            show_line_numbers: false,
            secondary: None,
            width,
        }
    }

    pub fn with_highlight(mut self, span: Span) -> Self {
        self.highlight = Some(span);
        self
    }

    pub fn with_secondary(mut self, matcher: &'a Matcher) -> Self {
        self.secondary = Some(matcher);
        self
    }

    pub fn with_line_numbers(mut self, show: bool) -> Self {
        self.show_line_numbers = show;
        self
    }

    pub fn height(&self) -> usize {
        2 * self.half_window + 1
    }
}

/// 窓を計算する
///
/// 文書の先頭より前の行は飛ばして下に伸ばし、末尾の直後の行は EOF マーカー、
/// それ以降は空行になる。結果は常に `2 * half_window + 1` 行。
pub fn render_window(request: &ViewportRequest<'_>, state: &ViewportState) -> ViewBlock {
    let height = request.height();
    let total = request.lines.len() as i64;
    let half = request.half_window as i64;
    let focus = request.focus_line as i64;

    let mut line = focus - half + state.vertical;
    let mut last = focus + half + state.vertical;
    let mut rows = Vec::with_capacity(height);

    while line <= last && rows.len() < height {
        if line < 0 {
            last += 1;
        } else if line < total {
            rows.push(text_row(request, state, line as usize));
        } else if line == total {
            rows.push(eof_row(request));
        } else {
            rows.push(ViewRow::filler());
        }
        line += 1;
    }

    while rows.len() < height {
        rows.push(ViewRow::filler());
    }

    ViewBlock { rows }
}

fn content_width(request: &ViewportRequest<'_>) -> usize {
    if request.show_line_numbers {
        request.width.saturating_sub(GUTTER_WIDTH)
    } else {
        request.width
    }
}

fn eof_row(request: &ViewportRequest<'_>) -> ViewRow {
    let width = content_width(request);
    let mut text: String = EOF_MARKER.chars().take(width).collect();
    let fill = width.saturating_sub(EOF_MARKER.len());
    text.extend(std::iter::repeat('<').take(fill));
    ViewRow {
        kind: RowKind::EndOfFile,
        gutter: None,
        segments: vec![Segment {
            text,
            style: CellStyle::Default,
        }],
    }
}

fn text_row(request: &ViewportRequest<'_>, state: &ViewportState, index: usize) -> ViewRow {
    let line = &request.lines[index];
    let focus = index == request.focus_line;
    let others = request
        .secondary
        .map(|matcher| matcher.find_all(line))
        .unwrap_or_default();

    let style_at = |column: usize| {
        if focus && request.highlight.is_some_and(|span| span.contains(column)) {
            CellStyle::Primary
        } else if others.iter().any(|span| span.contains(column)) {
            CellStyle::Secondary
        } else {
            CellStyle::Default
        }
    };

    let mut segments: Vec<Segment> = Vec::new();
    let visible = line
        .chars()
        .enumerate()
        .skip(state.horizontal)
        .take(content_width(request));
    for (column, c) in visible {
        let style = style_at(column);
        match segments.last_mut() {
            Some(segment) if segment.style == style => segment.text.push(c),
            _ => segments.push(Segment {
                text: c.to_string(),
                style,
            }),
        }
    }

    ViewRow {
        kind: RowKind::Text { line: index, focus },
        gutter: request
            .show_line_numbers
            .then(|| format!("{:>5}: ", index + 1)),
        segments,
    }
}
