//! マッチ抽出
//!
//! 一致したテキストそのものを1行ずつ出力する。対話なしで全体を走査し、
//! `unique` の場合はセッション全体で一度出力したテキストを繰り返さない。

use crate::error::{TsError, TsResult};
use crate::searchers::matcher::Matcher;
use crate::session::{DocumentFlow, Session};
use crate::tree::SearchableDocument;
use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Word-bounded pattern used when only a query is given
pub fn default_pattern(query: &str) -> String {
    format!(r"(\b\w*{}\w*\b)", regex::escape(query))
}

pub struct MatchExtractor {
    pattern: String,
    matcher: Matcher,
    unique: bool,
    show_file: bool,
    show_line_numbers: bool,
    seen: HashSet<String>,
}

impl MatchExtractor {
    pub fn new(
        pattern: Option<&str>,
        query: &str,
        case_sensitive: bool,
        unique: bool,
        show_file: bool,
        show_line_numbers: bool,
    ) -> TsResult<Self> {
        let pattern = match pattern {
            Some(pattern) => pattern.to_string(),
            None if query.is_empty() => return Err(TsError::MissingQuery),
            None => default_pattern(query),
        };
        let matcher = Matcher::pattern(&pattern, case_sensitive)?;
        Ok(Self {
            pattern,
            matcher,
            unique,
            show_file,
            show_line_numbers,
            seen: HashSet::new(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// 出力行の書式
    pub fn format_hit(&self, text: &str, line: usize, path: &Path) -> String {
        match (self.show_line_numbers, self.show_file) {
            (true, true) => format!("{:>5}: {:<40} {}", line + 1, text, path.display()),
            (true, false) => format!("{:>5}: {}", line + 1, text),
            (false, true) => format!("{:<40} {}", text, path.display()),
            (false, false) => text.to_string(),
        }
    }

    pub fn process(
        &mut self,
        doc: &mut SearchableDocument,
        session: &mut Session<'_>,
    ) -> io::Result<DocumentFlow> {
        let path = doc.path().to_path_buf();
        let lines = match doc.lines() {
            Ok(lines) => lines,
            Err(err) => {
                log::warn!("Failed to read {}: {}", path.display(), err);
                return Ok(DocumentFlow::Next);
            }
        };
        session.counters.files += 1;

        let mut found = false;
        let mut flow = DocumentFlow::Next;

        'lines: for (index, line) in lines.iter().enumerate() {
            for (_, text) in self.matcher.extract(line) {
                if text.is_empty() {
                    continue;
                }
                if self.unique && !self.seen.insert(text.clone()) {
                    continue;
                }
                found = true;
                session.counters.hits += 1;
                let output = self.format_hit(&text, index, &path);
                session.line(&output)?;
                if session.limit_reached() {
                    flow = DocumentFlow::Stop;
                    break 'lines;
                }
            }
        }

        if found {
            doc.had_hit = true;
        }
        Ok(flow)
    }
}
