//! 行単位のマッチャー
//!
//! 列位置はすべて文字（char）単位。ビューポートの描画とハイライト計算も
//! 同じ単位を使うため、マルチバイト文字を含む行でも位置がずれない。

use crate::error::TsResult;
use regex::{Regex, RegexBuilder};

/// 行内の一致範囲（文字単位）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn contains(&self, column: usize) -> bool {
        column >= self.start && column < self.start + self.len
    }
}

/// 大文字小文字を無視する比較用に1文字を畳み込む（長さは変えない）
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// 固定文字列の検索
#[derive(Debug, Clone)]
pub struct LiteralMatcher {
    needle: Vec<char>,
    case_sensitive: bool,
}

impl LiteralMatcher {
    pub fn new(query: &str, case_sensitive: bool) -> Self {
        let needle = if case_sensitive {
            query.chars().collect()
        } else {
            query.chars().map(fold_char).collect()
        };
        Self {
            needle,
            case_sensitive,
        }
    }

    pub fn len(&self) -> usize {
        self.needle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    fn haystack(&self, line: &str) -> Vec<char> {
        if self.case_sensitive {
            line.chars().collect()
        } else {
            line.chars().map(fold_char).collect()
        }
    }

    fn find_from(&self, haystack: &[char], from: usize) -> Option<usize> {
        let n = self.needle.len();
        if n == 0 || haystack.len() < n {
            return None;
        }
        (from..=haystack.len() - n).find(|&i| haystack[i..i + n] == self.needle[..])
    }

    /// 全出現位置。次の検索はヒット位置+1から始まるため重なった出現も拾う
    pub fn find_all(&self, line: &str) -> Vec<Span> {
        let haystack = self.haystack(line);
        let mut spans = Vec::new();
        let mut from = 0;
        while let Some(hit) = self.find_from(&haystack, from) {
            spans.push(Span::new(hit, self.needle.len()));
            from = hit + 1;
        }
        spans
    }

    /// 重ならない出現数
    pub fn count(&self, line: &str) -> usize {
        let haystack = self.haystack(line);
        let mut count = 0;
        let mut from = 0;
        while let Some(hit) = self.find_from(&haystack, from) {
            count += 1;
            from = hit + self.needle.len();
        }
        count
    }
}

/// Either a literal substring or a compiled pattern
#[derive(Debug, Clone)]
pub enum Matcher {
    Literal(LiteralMatcher),
    Pattern(Regex),
}

impl Matcher {
    pub fn literal(query: &str, case_sensitive: bool) -> Self {
        Matcher::Literal(LiteralMatcher::new(query, case_sensitive))
    }

    pub fn pattern(pattern: &str, case_sensitive: bool) -> TsResult<Self> {
        Ok(Matcher::Pattern(build_regex(pattern, case_sensitive)?))
    }

    /// Every occurrence in the line, in scan order
    pub fn find_all(&self, line: &str) -> Vec<Span> {
        match self {
            Matcher::Literal(literal) => literal.find_all(line),
            Matcher::Pattern(regex) => regex
                .find_iter(line)
                .map(|m| char_span(line, m.start(), m.end()))
                .collect(),
        }
    }

    /// Non-overlapping occurrence count
    pub fn count(&self, line: &str) -> usize {
        match self {
            Matcher::Literal(literal) => literal.count(line),
            Matcher::Pattern(regex) => regex.find_iter(line).count(),
        }
    }

    /// Occurrences paired with the text as written in the line
    pub fn extract(&self, line: &str) -> Vec<(Span, String)> {
        match self {
            Matcher::Literal(_) => {
                let chars: Vec<char> = line.chars().collect();
                self.find_all(line)
                    .into_iter()
                    .map(|span| {
                        let text = chars[span.start..span.start + span.len].iter().collect();
                        (span, text)
                    })
                    .collect()
            }
            Matcher::Pattern(regex) => regex
                .find_iter(line)
                .map(|m| (char_span(line, m.start(), m.end()), m.as_str().to_string()))
                .collect(),
        }
    }
}

/// 大文字小文字の設定に従って正規表現をコンパイル
pub fn build_regex(pattern: &str, case_sensitive: bool) -> TsResult<Regex> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()?)
}

/// バイトオフセットの範囲を文字単位の Span に変換
pub fn char_span(line: &str, start: usize, end: usize) -> Span {
    let start_col = line[..start].chars().count();
    let len = line[start..end].chars().count();
    Span::new(start_col, len)
}
