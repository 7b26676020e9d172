//! テキスト検索（固定文字列）

use crate::error::{TsError, TsResult};
use crate::searchers::matcher::Matcher;
use crate::session::{DocumentFlow, Session, TextHit};
use crate::tree::SearchableDocument;
use std::io;

/// Literal substring search over every line
pub struct LiteralSearch {
    query: String,
    matcher: Matcher,
}

impl LiteralSearch {
    pub fn new(query: &str, case_sensitive: bool) -> TsResult<Self> {
        if query.is_empty() {
            return Err(TsError::MissingQuery);
        }
        Ok(Self {
            query: query.to_string(),
            matcher: Matcher::literal(query, case_sensitive),
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn process(
        &self,
        doc: &mut SearchableDocument,
        session: &mut Session<'_>,
    ) -> io::Result<DocumentFlow> {
        scan_document(&self.matcher, doc, session)
    }
}

/// 行ごとにマッチャーを適用し、ヒットを順に表示する
///
/// 読み込めないドキュメントは走査済みに数えず、そのまま次へ進む。
pub(crate) fn scan_document(
    matcher: &Matcher,
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

    let mut ordinal = 0;
    let mut flow = DocumentFlow::Next;

    'lines: for (index, line) in lines.iter().enumerate() {
        for span in matcher.find_all(line) {
            ordinal += 1;
            let answer = session.present_hit(TextHit {
                path: &path,
                lines,
                line: index,
                span,
                ordinal,
                secondary: Some(matcher),
            })?;
            if session.limit_reached() {
                flow = DocumentFlow::Stop;
                break 'lines;
            }
            if let Some(next) = answer.document_flow() {
                flow = next;
                break 'lines;
            }
        }
    }

    if ordinal > 0 {
        doc.had_hit = true;
    }
    Ok(flow)
}
