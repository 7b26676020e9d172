//! 正規表現検索

use crate::error::TsResult;
use crate::searchers::literal::scan_document;
use crate::searchers::matcher::Matcher;
use crate::session::{DocumentFlow, Session};
use crate::tree::SearchableDocument;
use std::io;

/// Regular expression search; the pattern may come from a helper template
pub struct RegexSearch {
    pattern: String,
    matcher: Matcher,
}

impl RegexSearch {
    /// パターンは開始前にコンパイルし、不正なら起動エラーにする
    pub fn new(pattern: &str, case_sensitive: bool) -> TsResult<Self> {
        let matcher = Matcher::pattern(pattern, case_sensitive)?;
        log::debug!("Compiled pattern {:?} (case sensitive: {})", pattern, case_sensitive);
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn process(
        &self,
        doc: &mut SearchableDocument,
        session: &mut Session<'_>,
    ) -> io::Result<DocumentFlow> {
        scan_document(&self.matcher, doc, session)
    }
}
