//! Key handling for the interactive viewport
//!
//! One key is read at a time and mapped to a [`Decision`]. Keys that are not
//! part of the active [`KeyProfile`] are ignored and the next key is read, so
//! stray input (e.g. after a window focus change) never advances the search.

use super::launcher::Launcher;
use crate::display::offset::{horizontal_offset, vertical_offset};
use crate::display::viewport::ViewportState;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::collections::VecDeque;
use std::io;
use std::path::Path;

/// Ctrl を押しながらのスクロールの最小ステップ
pub const FAST_SCROLL_MIN: usize = 5;

/// What the operator asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Go on to the next hit
    Continue,
    /// Redraw the same hit (offsets may have changed)
    Reprint,
    SkipDocument,
    SkipSubtree,
    /// Stop pausing for the rest of the session
    GoAuto,
    Quit,
    /// Checkpoints only: stop the periodic pause
    DisablePause,
}

/// Which keys are accepted at a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyProfile {
    /// Text hit with a scrollable viewport
    Hit,
    /// Binary hit row, no viewport
    BinaryHit,
    /// Periodic pause during a binary dump
    Checkpoint,
}

impl KeyProfile {
    pub fn prompt(&self) -> &'static str {
        match self {
            KeyProfile::Hit => {
                "Continue? [Y]es [N]o [S]kip [F]older-skip [A]uto [E]dit [O]pen-folder [C]opy  Arrows: scroll"
            }
            KeyProfile::BinaryHit => "Continue? [Y]es [N]o [S]kip [F]older-skip [A]uto",
            KeyProfile::Checkpoint => "Continue? [Y]es [N]o [S]kip-file [D]isable-pause",
        }
    }
}

/// Source of key presses
pub trait KeySource {
    fn read_key(&mut self) -> io::Result<KeyEvent>;
}

/// Reads keys from the terminal; raw mode is held only while waiting
#[derive(Debug, Default)]
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn read_key(&mut self) -> io::Result<KeyEvent> {
        enable_raw_mode()?;
        let result = loop {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => break Ok(key),
                Ok(_) => continue,
                Err(err) => break Err(err),
            }
        };
        disable_raw_mode()?;
        result
    }
}

/// 事前に用意したキー列を返す。使い切った後は常に Enter を返す
#[derive(Debug, Default)]
pub struct ScriptedKeys {
    keys: VecDeque<KeyEvent>,
}

impl ScriptedKeys {
    pub fn new(keys: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// 文字列の各文字をキーとして扱う
    pub fn from_chars(chars: &str) -> Self {
        Self::new(
            chars
                .chars()
                .map(|c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)),
        )
    }
}

impl KeySource for ScriptedKeys {
    fn read_key(&mut self) -> io::Result<KeyEvent> {
        Ok(self
            .keys
            .pop_front()
            .unwrap_or_else(|| KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)))
    }
}

/// Where the hit being shown sits in its document
#[derive(Debug, Clone, Copy)]
pub struct HitContext<'a> {
    pub path: &'a Path,
    /// 0-based focus line
    pub focus_line: usize,
    pub line_text: &'a str,
    pub total_lines: usize,
    pub half_window: usize,
    /// Configured viewport height
    pub line_count: usize,
}

/// The interactive controller
pub struct Controller {
    keys: Box<dyn KeySource>,
    launcher: Box<dyn Launcher>,
    notice: Option<String>,
}

impl Controller {
    pub fn new(keys: impl KeySource + 'static, launcher: impl Launcher + 'static) -> Self {
        Self {
            keys: Box::new(keys),
            launcher: Box::new(launcher),
            notice: None,
        }
    }

    /// 直前の外部操作の結果メッセージを取り出す
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Read keys until one is accepted by `profile`
    pub fn decide(
        &mut self,
        profile: KeyProfile,
        hit: Option<&HitContext<'_>>,
        state: &mut ViewportState,
    ) -> io::Result<Decision> {
        loop {
            let key = self.keys.read_key()?;
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let decision = match profile {
                KeyProfile::Hit => self.hit_key(key, hit, state),
                KeyProfile::BinaryHit => binary_key(key),
                KeyProfile::Checkpoint => Some(checkpoint_key(key)),
            };
            match decision {
                Some(decision) => {
                    log::trace!("Key {:?} -> {:?}", key.code, decision);
                    return Ok(decision);
                }
                None => log::trace!("Ignored key {:?}", key.code),
            }
        }
    }

    fn hit_key(
        &mut self,
        key: KeyEvent,
        hit: Option<&HitContext<'_>>,
        state: &mut ViewportState,
    ) -> Option<Decision> {
        if is_quit(&key) {
            return Some(Decision::Quit);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => return Some(Decision::Continue),
            KeyCode::Char(c) => {
                return match c.to_ascii_lowercase() {
                    'y' => Some(Decision::Continue),
                    's' => Some(Decision::SkipDocument),
                    'f' => Some(Decision::SkipSubtree),
                    'a' => Some(Decision::GoAuto),
                    'e' => hit.map(|hit| self.edit(hit)),
                    'o' => hit.map(|hit| self.open_folder(hit)),
                    'c' => hit.map(|hit| self.copy(hit)),
                    _ => None,
                };
            }
            _ => {}
        }

        let hit = hit?;
        let step = if ctrl {
            hit.line_count.max(FAST_SCROLL_MIN) as i64
        } else {
            1
        };
        let page = hit.line_count.max(1) as i64;
        let vertical = |delta: i64, state: &mut ViewportState| {
            state.vertical = vertical_offset(
                delta,
                state.vertical,
                hit.focus_line,
                hit.total_lines,
                hit.half_window,
            );
        };

        match key.code {
            KeyCode::Up => vertical(-step, state),
            KeyCode::Down => vertical(step, state),
            KeyCode::PageUp => vertical(-page, state),
            KeyCode::PageDown => vertical(page, state),
            KeyCode::Left => state.horizontal = horizontal_offset(-step, state.horizontal),
            KeyCode::Right => state.horizontal = horizontal_offset(step, state.horizontal),
            _ => return None,
        }
        Some(Decision::Reprint)
    }

    fn edit(&mut self, hit: &HitContext<'_>) -> Decision {
        if let Err(err) = self.launcher.open_editor(hit.path, hit.focus_line + 1) {
            log::warn!("Editor launch failed: {}", err);
            self.notice = Some(err.to_string());
        }
        Decision::Reprint
    }

    fn open_folder(&mut self, hit: &HitContext<'_>) -> Decision {
        if let Err(err) = self.launcher.open_folder(hit.path) {
            log::warn!("Folder open failed: {}", err);
            self.notice = Some(err.to_string());
        }
        Decision::Reprint
    }

    fn copy(&mut self, hit: &HitContext<'_>) -> Decision {
        let text = format!(
            "{}:{}\n{}",
            hit.path.display(),
            hit.focus_line + 1,
            hit.line_text
        );
        match self.launcher.copy_text(&text) {
            Ok(()) => self.notice = Some("Copied to clipboard".to_string()),
            Err(err) => {
                log::warn!("Clipboard copy failed: {}", err);
                self.notice = Some(err.to_string());
            }
        }
        Decision::Reprint
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') | KeyCode::Char('C') => key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('n') | KeyCode::Char('N') => true,
        _ => false,
    }
}

fn binary_key(key: KeyEvent) -> Option<Decision> {
    if is_quit(&key) {
        return Some(Decision::Quit);
    }
    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') => Some(Decision::Continue),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'y' => Some(Decision::Continue),
            'a' => Some(Decision::GoAuto),
            's' => Some(Decision::SkipDocument),
            'f' => Some(Decision::SkipSubtree),
            _ => None,
        },
        _ => None,
    }
}

/// チェックポイントでは未定義のキーはすべて続行扱い
fn checkpoint_key(key: KeyEvent) -> Decision {
    if is_quit(&key) {
        return Decision::Quit;
    }
    match key.code {
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            's' => Decision::SkipDocument,
            'd' => Decision::DisablePause,
            _ => Decision::Continue,
        },
        _ => Decision::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TsError;
    use crate::tui::launcher::MockLauncher;
    use mockall::predicate::*;
    use std::path::PathBuf;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    fn hit(path: &Path) -> HitContext<'_> {
        HitContext {
            path,
            focus_line: 50,
            line_text: "needle here",
            total_lines: 100,
            half_window: 2,
            line_count: 5,
        }
    }

    fn controller(keys: Vec<KeyEvent>) -> Controller {
        Controller::new(ScriptedKeys::new(keys), MockLauncher::new())
    }

    #[test]
    fn test_hit_profile_basic_keys() {
        let path = PathBuf::from("/p/a.txt");
        let hit = hit(&path);
        let cases = [
            (key(KeyCode::Char('y')), Decision::Continue),
            (key(KeyCode::Enter), Decision::Continue),
            (key(KeyCode::Char('N')), Decision::Quit),
            (key(KeyCode::Esc), Decision::Quit),
            (ctrl(KeyCode::Char('c')), Decision::Quit),
            (key(KeyCode::Char('s')), Decision::SkipDocument),
            (key(KeyCode::Char('F')), Decision::SkipSubtree),
            (key(KeyCode::Char('a')), Decision::GoAuto),
        ];
        for (pressed, expected) in cases {
            let mut controller = controller(vec![pressed]);
            let mut state = ViewportState::new();
            let decision = controller
                .decide(KeyProfile::Hit, Some(&hit), &mut state)
                .unwrap();
            assert_eq!(decision, expected, "{:?}", pressed);
        }
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let path = PathBuf::from("/p/a.txt");
        let hit = hit(&path);
        let mut controller = controller(vec![
            key(KeyCode::Char('z')),
            key(KeyCode::Tab),
            key(KeyCode::F(5)),
            key(KeyCode::Char('s')),
            key(KeyCode::Char('n')),
        ]);
        let mut state = ViewportState::new();
        let decision = controller
            .decide(KeyProfile::Hit, Some(&hit), &mut state)
            .unwrap();
        assert_eq!(decision, Decision::SkipDocument);
        // the ignored keys were consumed without a decision
        let decision = controller
            .decide(KeyProfile::Hit, Some(&hit), &mut state)
            .unwrap();
        assert_eq!(decision, Decision::Quit);
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut release = key(KeyCode::Char('n'));
        release.kind = KeyEventKind::Release;
        let mut controller = controller(vec![release, key(KeyCode::Char('y'))]);
        let mut state = ViewportState::new();
        let decision = controller
            .decide(KeyProfile::BinaryHit, None, &mut state)
            .unwrap();
        assert_eq!(decision, Decision::Continue);
    }

    #[test]
    fn test_scroll_keys_reprint_with_clamped_offsets() {
        let path = PathBuf::from("/p/a.txt");
        let hit = hit(&path);
        let mut controller = controller(vec![
            key(KeyCode::Down),
            ctrl(KeyCode::Down),
            key(KeyCode::PageUp),
            key(KeyCode::Left),
            key(KeyCode::Right),
            ctrl(KeyCode::Right),
        ]);
        let mut state = ViewportState::new();
        let mut next = |state: &mut ViewportState| {
            controller
                .decide(KeyProfile::Hit, Some(&hit), state)
                .unwrap()
        };

        assert_eq!(next(&mut state), Decision::Reprint);
        assert_eq!(state.vertical, 1);
        next(&mut state);
        assert_eq!(state.vertical, 6);
        next(&mut state);
        assert_eq!(state.vertical, 1);
        next(&mut state);
        assert_eq!(state.horizontal, 0);
        next(&mut state);
        assert_eq!(state.horizontal, 1);
        next(&mut state);
        assert_eq!(state.horizontal, 6);
    }

    #[test]
    fn test_binary_profile_has_no_scrolling() {
        let mut controller = controller(vec![key(KeyCode::Down), key(KeyCode::Char('f'))]);
        let mut state = ViewportState::new();
        let decision = controller
            .decide(KeyProfile::BinaryHit, None, &mut state)
            .unwrap();
        assert_eq!(decision, Decision::SkipSubtree);
        assert_eq!(state, ViewportState::new());
    }

    #[test]
    fn test_checkpoint_profile() {
        let cases = [
            (key(KeyCode::Char('d')), Decision::DisablePause),
            (key(KeyCode::Char('s')), Decision::SkipDocument),
            (key(KeyCode::Char('n')), Decision::Quit),
            (key(KeyCode::Char('q')), Decision::Continue),
            (key(KeyCode::Down), Decision::Continue),
        ];
        for (pressed, expected) in cases {
            let mut controller = controller(vec![pressed]);
            let mut state = ViewportState::new();
            let decision = controller
                .decide(KeyProfile::Checkpoint, None, &mut state)
                .unwrap();
            assert_eq!(decision, expected);
        }
    }

    #[test]
    fn test_edit_key_passes_one_based_line() {
        let path = PathBuf::from("/p/a.txt");
        let hit = hit(&path);
        let mut launcher = MockLauncher::new();
        launcher
            .expect_open_editor()
            .with(eq(PathBuf::from("/p/a.txt")), eq(51))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut controller =
            Controller::new(ScriptedKeys::new(vec![key(KeyCode::Char('e'))]), launcher);
        let mut state = ViewportState::new();
        let decision = controller
            .decide(KeyProfile::Hit, Some(&hit), &mut state)
            .unwrap();
        assert_eq!(decision, Decision::Reprint);
        assert_eq!(controller.take_notice(), None);
    }

    #[test]
    fn test_launch_failure_becomes_notice() {
        let path = PathBuf::from("/p/a.txt");
        let hit = hit(&path);
        let mut launcher = MockLauncher::new();
        launcher
            .expect_open_folder()
            .times(1)
            .returning(|_| Err(TsError::EditorNotConfigured));
        launcher
            .expect_copy_text()
            .with(eq("/p/a.txt:51\nneedle here"))
            .times(1)
            .returning(|_| Ok(()));

        let mut controller = Controller::new(ScriptedKeys::from_chars("oc"), launcher);
        let mut state = ViewportState::new();
        controller
            .decide(KeyProfile::Hit, Some(&hit), &mut state)
            .unwrap();
        assert!(controller.take_notice().is_some());
        controller
            .decide(KeyProfile::Hit, Some(&hit), &mut state)
            .unwrap();
        assert_eq!(
            controller.take_notice().as_deref(),
            Some("Copied to clipboard")
        );
    }

    #[test]
    fn test_scripted_keys_default_to_enter() {
        let mut keys = ScriptedKeys::default();
        assert_eq!(keys.read_key().unwrap().code, KeyCode::Enter);
    }
}
