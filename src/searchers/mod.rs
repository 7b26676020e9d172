//! 検索戦略モジュール
//!
//! 各検索モードの実装を提供します：
//! - テキスト検索（固定文字列）
//! - 正規表現検索（コードヘルパーのテンプレートを含む）
//! - バイナリ検索
//! - 構造化ドキュメント検索
//! - マッチ抽出
//! - 件数モード

pub mod binary;
pub mod code_helpers;
pub mod count;
pub mod json_query;
pub mod literal;
pub mod match_extractor;
pub mod matcher;
pub mod regex_search;
pub mod structured;
pub mod xpath_query;

pub use binary::BinarySearch;
pub use count::{CountSource, OccurrenceCount};
pub use literal::LiteralSearch;
pub use match_extractor::MatchExtractor;
pub use matcher::{Matcher, Span};
pub use regex_search::RegexSearch;
pub use json_query::JsonPathQuery;
pub use structured::{DocumentQuery, QueryError, QueryMatch, StructuredSearch};
pub use xpath_query::XPathQuery;

use crate::config::{Listing, QueryLanguage, SearchMode, SessionConfig, TellSource};
use crate::error::{TsError, TsResult};
use crate::session::{DocumentFlow, Session};
use crate::tree::SearchableDocument;
use std::io;

/// The search strategy selected for a session
pub enum Strategy {
    Literal(LiteralSearch),
    Regex(RegexSearch),
    Binary(BinarySearch),
    Structured(StructuredSearch),
    Match(MatchExtractor),
    Count(OccurrenceCount),
}

impl Strategy {
    /// Build the strategy for `config`. Structured queries use the evaluator
    /// named by `config.query_language`.
    pub fn from_config(config: &SessionConfig) -> TsResult<Self> {
        let language = config.query_language;
        Self::with_query_engine(config, move || match language {
            QueryLanguage::XPath => Box::new(XPathQuery) as Box<dyn DocumentQuery>,
            QueryLanguage::JsonPath => Box::new(JsonPathQuery),
        })
    }

    /// 構造化クエリの評価器を差し替えて構築する。不正なクエリや数値はここで失敗する
    pub fn with_query_engine(
        config: &SessionConfig,
        engine: impl Fn() -> Box<dyn DocumentQuery>,
    ) -> TsResult<Self> {
        let query = config.query.as_str();
        let case_sensitive = config.case_sensitive;

        let strategy = match &config.mode {
            SearchMode::Literal => Strategy::Literal(LiteralSearch::new(query, case_sensitive)?),
            SearchMode::Regex { pattern } => {
                Strategy::Regex(RegexSearch::new(pattern, case_sensitive)?)
            }
            SearchMode::Binary(kind) => Strategy::Binary(BinarySearch::new(*kind, query)?),
            SearchMode::Structured => {
                Strategy::Structured(StructuredSearch::new(engine(), query)?)
            }
            SearchMode::Match {
                pattern,
                unique,
                show_file,
            } => Strategy::Match(MatchExtractor::new(
                pattern.as_deref(),
                query,
                case_sensitive,
                *unique,
                *show_file,
                config.show_line_numbers,
            )?),
            SearchMode::Tell { listing, source } => {
                Strategy::Count(Self::counter(*listing, source, config, engine)?)
            }
        };
        Ok(strategy)
    }

    fn counter(
        listing: Listing,
        source: &TellSource,
        config: &SessionConfig,
        engine: impl Fn() -> Box<dyn DocumentQuery>,
    ) -> TsResult<OccurrenceCount> {
        match source {
            TellSource::Literal => {
                OccurrenceCount::literal(listing, &config.query, config.case_sensitive)
            }
            TellSource::Pattern(pattern) => {
                if pattern.is_empty() {
                    return Err(TsError::MissingQuery);
                }
                let matcher = Matcher::pattern(pattern, config.case_sensitive)?;
                Ok(OccurrenceCount::new(listing, CountSource::Text(matcher)))
            }
            TellSource::Structured => {
                let search = StructuredSearch::new(engine(), &config.query)?;
                Ok(OccurrenceCount::new(listing, CountSource::Structured(search)))
            }
        }
    }

    /// セッション開始時に表示する見出し
    pub fn title(&self, config: &SessionConfig) -> String {
        match self {
            Strategy::Literal(search) => format!("Text search mode: {}", search.query()),
            Strategy::Regex(search) => format!("Regex search mode: {}", search.pattern()),
            Strategy::Binary(search) => {
                format!("Binary search mode ({}): {}", search.kind().name(), config.query)
            }
            Strategy::Structured(search) => match config.query_language {
                QueryLanguage::XPath => format!("XML search mode: {}", search.expression()),
                QueryLanguage::JsonPath => format!("JSON search mode: {}", search.expression()),
            },
            Strategy::Match(extractor) => format!("Match mode: {}", extractor.pattern()),
            Strategy::Count(counter) => {
                let label = match counter.listing() {
                    Listing::Names => "Files containing",
                    Listing::Count => "Occurrence count of",
                    Listing::Not => "Files not containing",
                };
                match &config.mode {
                    SearchMode::Tell {
                        source: TellSource::Pattern(pattern),
                        ..
                    } => format!("{label}: {pattern}"),
                    _ => format!("{label}: {}", config.query),
                }
            }
        }
    }

    pub fn process(
        &mut self,
        doc: &mut SearchableDocument,
        session: &mut Session<'_>,
    ) -> io::Result<DocumentFlow> {
        match self {
            Strategy::Literal(search) => search.process(doc, session),
            Strategy::Regex(search) => search.process(doc, session),
            Strategy::Binary(search) => search.process(doc, session),
            Strategy::Structured(search) => search.process(doc, session),
            Strategy::Match(extractor) => extractor.process(doc, session),
            Strategy::Count(counter) => counter.process(doc, session),
        }
    }

    /// 走査終了後の出力（件数一覧など）
    pub fn finish(&mut self, session: &mut Session<'_>) -> io::Result<()> {
        match self {
            Strategy::Count(counter) => counter.finish(session),
            _ => Ok(()),
        }
    }
}
