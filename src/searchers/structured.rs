//! 構造化ドキュメント検索
//!
//! クエリの評価は [`DocumentQuery`] に委ねる。既定の実装は XML に対する XPath
//! （[`XPathQuery`](crate::searchers::xpath_query::XPathQuery)）、JSON 用に
//! [`JsonPathQuery`](crate::searchers::json_query::JsonPathQuery) がある。
//! 解析できないドキュメントは黙って読み飛ばす。

use crate::error::{TsError, TsResult};
use crate::searchers::matcher::Span;
use crate::session::{DocumentFlow, Session, TextHit};
use crate::tree::{display_line, SearchableDocument};
use std::io;
use std::ops::Range;

/// One evaluated match, located in the displayed lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMatch {
    /// 0-based line
    pub line: usize,
    /// 0-based char column
    pub column: usize,
    /// Highlighted width in chars
    pub length: usize,
    pub text: String,
}

impl QueryMatch {
    /// ソース中のバイト範囲 `range` を表示行上の位置に変換する
    pub fn locate(source: &str, range: Range<usize>, text: String) -> Self {
        let before = &source[..range.start];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self {
            line,
            column: display_line(&source[line_start..range.start]).chars().count(),
            length: source[range].chars().count(),
            text,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.column, self.length)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The document is not in the queried format
    #[error("unreadable document: {0}")]
    Document(String),
    /// The query itself is malformed
    #[error("{0}")]
    Query(String),
}

/// Structured query evaluator
pub trait DocumentQuery {
    /// Check the query once before the session starts
    fn validate(&self, query: &str) -> Result<(), QueryError>;

    /// Matches in document order
    fn evaluate(&self, source: &str, query: &str) -> Result<Vec<QueryMatch>, QueryError>;
}

/// Interactive structured-query strategy
pub struct StructuredSearch {
    query: Box<dyn DocumentQuery>,
    expression: String,
}

impl StructuredSearch {
    /// 不正なクエリはセッション開始前にエラーにする
    pub fn new(query: Box<dyn DocumentQuery>, expression: &str) -> TsResult<Self> {
        if expression.trim().is_empty() {
            return Err(TsError::MissingQuery);
        }
        query
            .validate(expression)
            .map_err(|err| TsError::InvalidQuery {
                query: expression.to_string(),
                message: err.to_string(),
            })?;
        Ok(Self {
            query,
            expression: expression.to_string(),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluate against one document. `None` means the document is skipped.
    pub fn evaluate(&self, doc: &mut SearchableDocument) -> Option<Vec<QueryMatch>> {
        let path = doc.path().to_path_buf();
        let text = match doc.text() {
            Ok(text) => text,
            Err(err) => {
                log::warn!("Failed to read {}: {}", path.display(), err);
                return None;
            }
        };
        match self.query.evaluate(text, &self.expression) {
            Ok(matches) => Some(matches),
            Err(err) => {
                log::debug!("Skipping {}: {}", path.display(), err);
                None
            }
        }
    }

    pub fn process(
        &self,
        doc: &mut SearchableDocument,
        session: &mut Session<'_>,
    ) -> io::Result<DocumentFlow> {
        let Some(matches) = self.evaluate(doc) else {
            return Ok(DocumentFlow::Next);
        };
        session.counters.files += 1;
        if matches.is_empty() {
            return Ok(DocumentFlow::Next);
        }

        let path = doc.path().to_path_buf();
        let lines = match doc.lines() {
            Ok(lines) => lines,
            Err(err) => {
                log::warn!("Failed to read {}: {}", path.display(), err);
                return Ok(DocumentFlow::Next);
            }
        };
        let mut flow = DocumentFlow::Next;

        for (index, found) in matches.iter().enumerate() {
            let answer = session.present_hit(TextHit {
                path: &path,
                lines,
                line: found.line,
                span: found.span(),
                ordinal: index + 1,
                secondary: None,
            })?;
            if session.limit_reached() {
                flow = DocumentFlow::Stop;
                break;
            }
            if let Some(next) = answer.document_flow() {
                flow = next;
                break;
            }
        }

        doc.had_hit = true;
        Ok(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searchers::json_query::JsonPathQuery;
    use crate::searchers::xpath_query::XPathQuery;

    #[test]
    fn test_locate_expands_tabs() {
        let source = "a\n\tkey";
        let found = QueryMatch::locate(source, 3..6, "key".to_string());
        assert_eq!((found.line, found.column, found.length), (1, 4, 3));
    }

    #[test]
    fn test_invalid_query_fails_at_startup() {
        let result = StructuredSearch::new(Box::new(JsonPathQuery), "a//b");
        assert!(matches!(result, Err(TsError::InvalidQuery { .. })));
        let result = StructuredSearch::new(Box::new(XPathQuery), "//book[");
        assert!(matches!(result, Err(TsError::InvalidQuery { .. })));
        assert!(matches!(
            StructuredSearch::new(Box::new(XPathQuery), "  "),
            Err(TsError::MissingQuery)
        ));
    }
}
