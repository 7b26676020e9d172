//! 検索セッション
//!
//! ツリーを1回走査し、各ドキュメントを検索戦略に渡す。カウンタ、自動モード、
//! 中断フラグはすべてこの構造体が保持し、戦略には可変参照で渡される。

use crate::config::SessionConfig;
use crate::display::surface::{Surface, Tone};
use crate::display::viewport::{render_window, ViewportRequest, ViewportState};
use crate::searchers::matcher::{Matcher, Span};
use crate::searchers::Strategy;
use crate::tree::ItemTree;
use crate::tui::input::{Controller, Decision, HitContext, KeyProfile};
use std::io;
use std::path::Path;

/// Running totals, read once for the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounters {
    /// Documents whose content was read and searched
    pub files: usize,
    pub hits: usize,
}

/// What a strategy wants the traversal to do after a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFlow {
    Next,
    SkipSubtree,
    /// Quit or hit limit; ends the whole traversal
    Stop,
}

/// The operator's answer to one hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitFlow {
    Continue,
    SkipDocument,
    SkipSubtree,
    Quit,
}

/// Final summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub canceled: bool,
    pub hits: usize,
    pub files: usize,
    pub documents_with_hits: usize,
}

/// One focus line to present
#[derive(Debug, Clone, Copy)]
pub struct TextHit<'a> {
    pub path: &'a Path,
    pub lines: &'a [String],
    pub line: usize,
    pub span: Span,
    /// Hit number within the document, starting at 1
    pub ordinal: usize,
    pub secondary: Option<&'a Matcher>,
}

pub struct Session<'a> {
    pub config: &'a SessionConfig,
    pub surface: &'a mut dyn Surface,
    pub controller: Controller,
    pub counters: SessionCounters,
    /// Set by `-a` or the `A` key; no more pauses
    pub auto: bool,
    /// Binary checkpoints disabled with `D`
    pub pause_disabled: bool,
    pub canceled: bool,
}

impl<'a> Session<'a> {
    pub fn new(config: &'a SessionConfig, surface: &'a mut dyn Surface, controller: Controller) -> Self {
        Self {
            config,
            surface,
            controller,
            counters: SessionCounters::default(),
            auto: config.auto,
            pause_disabled: false,
            canceled: false,
        }
    }

    /// Whether the hit limit stops the session now
    pub fn limit_reached(&self) -> bool {
        self.config.limit_reached(self.counters.hits)
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        self.surface.line(text, Tone::Normal)
    }

    /// Count a hit and show it. In auto mode the viewport is drawn once
    /// without waiting; otherwise the operator is asked until a non-scroll
    /// key arrives.
    pub fn present_hit(&mut self, hit: TextHit<'_>) -> io::Result<HitFlow> {
        self.counters.hits += 1;
        self.surface.line(
            &format!(
                "#{:<3} Line: {:>5} Col: {:>4} -> {}",
                hit.ordinal,
                hit.line + 1,
                hit.span.start + 1,
                hit.path.display()
            ),
            Tone::Emphasis,
        )?;

        let half_window = self.config.half_window();
        let mut state = ViewportState::new();
        let context = HitContext {
            path: hit.path,
            focus_line: hit.line,
            line_text: hit.lines.get(hit.line).map(String::as_str).unwrap_or_default(),
            total_lines: hit.lines.len(),
            half_window,
            line_count: self.config.line_count,
        };

        loop {
            let mut request = ViewportRequest::new(hit.lines, hit.line, half_window, self.surface.width())
                .with_highlight(hit.span)
                .with_line_numbers(self.config.show_line_numbers);
            if let Some(matcher) = hit.secondary {
                request = request.with_secondary(matcher);
            }
            let block = render_window(&request, &state);
            self.surface.draw_block(&mut state.anchor, &block)?;

            if self.auto {
                return Ok(HitFlow::Continue);
            }

            let prompt = match self.controller.take_notice() {
                Some(notice) => format!("{} | {}", notice, KeyProfile::Hit.prompt()),
                None => KeyProfile::Hit.prompt().to_string(),
            };
            self.surface.prompt(&prompt)?;
            let decision = self
                .controller
                .decide(KeyProfile::Hit, Some(&context), &mut state)?;
            self.surface.clear_prompt()?;

            match self.apply(decision) {
                Some(flow) => return Ok(flow),
                None => continue,
            }
        }
    }

    /// Ask the operator about a non-viewport prompt (binary rows, checkpoints)
    pub fn ask(&mut self, profile: KeyProfile) -> io::Result<HitFlow> {
        let mut state = ViewportState::new();
        loop {
            self.surface.prompt(profile.prompt())?;
            let decision = self.controller.decide(profile, None, &mut state)?;
            self.surface.clear_prompt()?;
            if let Some(flow) = self.apply(decision) {
                return Ok(flow);
            }
        }
    }

    /// セッション状態への反映。`None` は同じヒットを再表示する
    fn apply(&mut self, decision: Decision) -> Option<HitFlow> {
        match decision {
            Decision::Reprint => None,
            Decision::Continue => Some(HitFlow::Continue),
            Decision::SkipDocument => Some(HitFlow::SkipDocument),
            Decision::SkipSubtree => Some(HitFlow::SkipSubtree),
            Decision::GoAuto => {
                log::info!("Switched to auto mode");
                self.auto = true;
                Some(HitFlow::Continue)
            }
            Decision::DisablePause => {
                self.pause_disabled = true;
                Some(HitFlow::Continue)
            }
            Decision::Quit => {
                self.canceled = true;
                Some(HitFlow::Quit)
            }
        }
    }

    /// Print the closing status and totals
    pub fn report(&mut self, tree: &ItemTree) -> io::Result<SessionReport> {
        let report = SessionReport {
            canceled: self.canceled,
            hits: self.counters.hits,
            files: self.counters.files,
            documents_with_hits: tree.count_hits(),
        };

        if report.canceled {
            self.surface.line("canceled", Tone::Failure)?;
        } else {
            self.surface.line("complete", Tone::Success)?;
        }
        self.surface.line(
            &format!(
                "Found {} times in {} files",
                report.hits, report.documents_with_hits
            ),
            Tone::Normal,
        )?;
        self.surface
            .line(&format!("Scanned {} files", report.files), Tone::Normal)?;
        Ok(report)
    }
}

impl HitFlow {
    /// 戦略がドキュメント単位で返す値への変換。`None` は同じドキュメントを続行
    pub fn document_flow(self) -> Option<DocumentFlow> {
        match self {
            HitFlow::Continue => None,
            HitFlow::SkipDocument => Some(DocumentFlow::Next),
            HitFlow::SkipSubtree => Some(DocumentFlow::SkipSubtree),
            HitFlow::Quit => Some(DocumentFlow::Stop),
        }
    }
}

/// Run one whole session: every document of the tree goes through the
/// strategy until the tree is exhausted, the operator quits, or the hit
/// limit is reached.
pub fn run(tree: &mut ItemTree, strategy: &mut Strategy, session: &mut Session<'_>) -> io::Result<SessionReport> {
    let title = strategy.title(session.config);
    session.surface.line(&title, Tone::Emphasis)?;

    while let Some(id) = tree.next() {
        let flow = {
            let mut doc = tree.open(id);
            if session.config.verbose {
                session
                    .surface
                    .line(&doc.path().display().to_string(), Tone::Muted)?;
            }
            strategy.process(&mut doc, session)?
        };

        match flow {
            DocumentFlow::Next => {}
            DocumentFlow::SkipSubtree => tree.skip_current_subtree(),
            DocumentFlow::Stop => break,
        }
    }

    strategy.finish(session)?;
    log::info!(
        "Session finished: {} hits, {} files scanned",
        session.counters.hits,
        session.counters.files
    );
    session.report(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchMode;
    use crate::display::surface::RecordingSurface;
    use crate::tui::input::ScriptedKeys;
    use crate::tui::launcher::MockLauncher;

    fn doc_lines() -> Vec<String> {
        vec!["alpha".into(), "the needle".into(), "omega".into()]
    }

    #[test]
    fn test_present_hit_redraws_on_scroll_then_continues() {
        let config = SessionConfig::new(SearchMode::Literal, "needle");
        let mut surface = RecordingSurface::new(40);
        let keys = ScriptedKeys::new(vec![
            crossterm::event::KeyEvent::new(
                crossterm::event::KeyCode::Down,
                crossterm::event::KeyModifiers::NONE,
            ),
            crossterm::event::KeyEvent::new(
                crossterm::event::KeyCode::Char('y'),
                crossterm::event::KeyModifiers::NONE,
            ),
        ]);
        let lines = doc_lines();
        {
            let mut session =
                Session::new(&config, &mut surface, Controller::new(keys, MockLauncher::new()));
            let flow = session
                .present_hit(TextHit {
                    path: Path::new("/p/a.txt"),
                    lines: &lines,
                    line: 1,
                    span: Span::new(4, 6),
                    ordinal: 1,
                    secondary: None,
                })
                .unwrap();
            assert_eq!(flow, HitFlow::Continue);
            assert_eq!(session.counters.hits, 1);
        }

        let blocks = surface.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].0, blocks[1].0);
        assert_eq!(blocks[0].1[1], "alpha");
        assert_eq!(blocks[1].1[1], "the needle");
        assert!(surface.contains_line("#1   Line:     2 Col:    5 -> /p/a.txt"));
    }

    #[test]
    fn test_go_auto_stops_prompting() {
        let config = SessionConfig::new(SearchMode::Literal, "needle");
        let mut surface = RecordingSurface::new(40);
        let lines = doc_lines();
        let mut session = Session::new(
            &config,
            &mut surface,
            Controller::new(ScriptedKeys::from_chars("a"), MockLauncher::new()),
        );
        let hit = TextHit {
            path: Path::new("/p/a.txt"),
            lines: &lines,
            line: 1,
            span: Span::new(4, 6),
            ordinal: 1,
            secondary: None,
        };
        assert_eq!(session.present_hit(hit).unwrap(), HitFlow::Continue);
        assert!(session.auto);
        // auto mode never reads another key; scripted exhaustion would still answer
        assert_eq!(session.present_hit(hit).unwrap(), HitFlow::Continue);
        assert_eq!(session.counters.hits, 2);
    }

    #[test]
    fn test_quit_marks_session_canceled() {
        let config = SessionConfig::new(SearchMode::Literal, "needle");
        let mut surface = RecordingSurface::new(40);
        let tree = ItemTree::new();
        let lines = doc_lines();
        {
            let mut session = Session::new(
                &config,
                &mut surface,
                Controller::new(ScriptedKeys::from_chars("n"), MockLauncher::new()),
            );
            let flow = session
                .present_hit(TextHit {
                    path: Path::new("/p/a.txt"),
                    lines: &lines,
                    line: 1,
                    span: Span::new(4, 6),
                    ordinal: 1,
                    secondary: None,
                })
                .unwrap();
            assert_eq!(flow, HitFlow::Quit);
            let report = session.report(&tree).unwrap();
            assert!(report.canceled);
            assert_eq!(report.hits, 1);
        }
        assert!(surface.contains_line("canceled"));
        assert!(surface.contains_line("Found 1 times in 0 files"));
    }
}
