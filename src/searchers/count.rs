//! 件数モード
//!
//! ドキュメントごとの出現数だけを数え、ファイル名または件数を出力する。

use crate::config::Listing;
use crate::error::{TsError, TsResult};
use crate::searchers::matcher::Matcher;
use crate::searchers::structured::StructuredSearch;
use crate::session::{DocumentFlow, Session};
use crate::tree::SearchableDocument;
use std::io;
use std::path::PathBuf;

/// What is counted in each document
pub enum CountSource {
    /// 重ならない出現数
    Text(Matcher),
    Structured(StructuredSearch),
}

pub struct OccurrenceCount {
    listing: Listing,
    source: CountSource,
    /// `Listing::Count` 用。終了時に件数の降順で出力する
    counts: Vec<(usize, PathBuf)>,
}

impl OccurrenceCount {
    pub fn new(listing: Listing, source: CountSource) -> Self {
        Self {
            listing,
            source,
            counts: Vec::new(),
        }
    }

    pub fn literal(listing: Listing, query: &str, case_sensitive: bool) -> TsResult<Self> {
        if query.is_empty() {
            return Err(TsError::MissingQuery);
        }
        Ok(Self::new(
            listing,
            CountSource::Text(Matcher::literal(query, case_sensitive)),
        ))
    }

    pub fn listing(&self) -> Listing {
        self.listing
    }

    /// 出現数。`None` はドキュメントを読み飛ばす
    fn count(&self, doc: &mut SearchableDocument) -> Option<usize> {
        match &self.source {
            CountSource::Text(matcher) => {
                let path = doc.path().to_path_buf();
                match doc.lines() {
                    Ok(lines) => Some(lines.iter().map(|line| matcher.count(line)).sum()),
                    Err(err) => {
                        log::warn!("Failed to read {}: {}", path.display(), err);
                        None
                    }
                }
            }
            CountSource::Structured(search) => search.evaluate(doc).map(|matches| matches.len()),
        }
    }

    pub fn process(
        &mut self,
        doc: &mut SearchableDocument,
        session: &mut Session<'_>,
    ) -> io::Result<DocumentFlow> {
        let Some(count) = self.count(doc) else {
            return Ok(DocumentFlow::Next);
        };
        session.counters.files += 1;
        session.counters.hits += count;
        doc.had_hit = count > 0;

        let path = doc.path().display().to_string();
        match self.listing {
            Listing::Names if count > 0 => session.line(&format!("  {path}"))?,
            Listing::Not if count == 0 => session.line(&format!("  {path}"))?,
            Listing::Count if count > 0 => self.counts.push((count, doc.path().to_path_buf())),
            _ => {}
        }

        if session.limit_reached() {
            return Ok(DocumentFlow::Stop);
        }
        Ok(DocumentFlow::Next)
    }

    /// 件数一覧を降順で出力（同数は走査順）
    pub fn finish(&mut self, session: &mut Session<'_>) -> io::Result<()> {
        if self.listing != Listing::Count {
            return Ok(());
        }
        self.counts.sort_by(|a, b| b.0.cmp(&a.0));
        for (count, path) in &self.counts {
            session.line(&format!("  {:>6} -> {}", count, path.display()))?;
        }
        Ok(())
    }
}
