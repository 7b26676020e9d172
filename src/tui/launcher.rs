//! 外部プログラムの起動（エディタ・フォルダ表示・クリップボード）

use crate::error::{TsError, TsResult};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use which::which;

/// Environment variable naming the editor executable
pub const EDITOR_ENV: &str = "TS_EDIT_TEXT";

/// Side effects the viewport keys can trigger outside the terminal
#[cfg_attr(test, mockall::automock)]
pub trait Launcher {
    /// Open `path` in the configured editor, at `line` (1-based) when supported
    fn open_editor(&self, path: &Path, line: usize) -> TsResult<()>;

    /// Show the folder containing `path` in the platform file browser
    fn open_folder(&self, path: &Path) -> TsResult<()>;

    fn copy_text(&self, text: &str) -> TsResult<()>;
}

/// 既知のエディタの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// `-n<line>`
    NotepadPlusPlus,
    /// `+<line>`、端末を占有するので終了を待つ
    Terminal,
    /// `--goto path:line`
    VsCode,
    Unknown,
}

impl EditorKind {
    /// 実行ファイル名から種類を推定
    pub fn detect(editor: &str) -> Self {
        let stem = Path::new(editor)
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match stem.as_str() {
            "notepad++" => EditorKind::NotepadPlusPlus,
            "vim" | "nvim" | "vi" | "nano" | "emacs" | "micro" | "hx" | "helix" => {
                EditorKind::Terminal
            }
            "code" | "code-insiders" | "codium" => EditorKind::VsCode,
            _ => EditorKind::Unknown,
        }
    }

    /// エディタに渡す引数
    pub fn args(&self, path: &Path, line: usize) -> Vec<String> {
        let path = path.display().to_string();
        match self {
            EditorKind::NotepadPlusPlus => vec![format!("-n{line}"), path],
            EditorKind::Terminal => vec![format!("+{line}"), path],
            EditorKind::VsCode => vec!["--goto".to_string(), format!("{path}:{line}")],
            EditorKind::Unknown => vec![path],
        }
    }
}

/// Launcher backed by real processes and the system clipboard
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher {
    editor: Option<String>,
}

impl SystemLauncher {
    pub fn new(editor: Option<String>) -> Self {
        Self { editor }
    }

    /// `TS_EDIT_TEXT` からエディタを読み込む
    pub fn from_env() -> Self {
        let editor = std::env::var(EDITOR_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self { editor }
    }

    pub fn editor(&self) -> Option<&str> {
        self.editor.as_deref()
    }
}

fn launch_error(program: &str, err: impl std::fmt::Display) -> TsError {
    TsError::Launch {
        program: program.to_string(),
        message: err.to_string(),
    }
}

/// 終了を待たない起動。子プロセスは別スレッドで回収する
fn spawn_detached(command: &mut Command, program: &str) -> TsResult<JoinHandle<()>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| launch_error(program, err))?;
    let program = program.to_string();
    Ok(thread::spawn(move || match child.wait() {
        Ok(status) => log::debug!("{} exited with {}", program, status),
        Err(err) => log::warn!("Failed to wait for {}: {}", program, err),
    }))
}

fn folder_browser() -> &'static str {
    if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

impl Launcher for SystemLauncher {
    fn open_editor(&self, path: &Path, line: usize) -> TsResult<()> {
        let editor = self.editor.as_deref().ok_or(TsError::EditorNotConfigured)?;
        let program = which(editor).map_err(|err| launch_error(editor, err))?;
        let kind = EditorKind::detect(editor);
        let args = kind.args(path, line);
        log::debug!("Launching editor {:?} {:?}", program, args);

        let mut command = Command::new(&program);
        command.args(&args);
        if kind == EditorKind::Terminal {
            command.status().map_err(|err| launch_error(editor, err))?;
        } else {
            spawn_detached(&mut command, editor)?;
        }
        Ok(())
    }

    fn open_folder(&self, path: &Path) -> TsResult<()> {
        let folder = path.parent().unwrap_or(path);
        let browser = folder_browser();
        log::debug!("Opening folder {} with {}", folder.display(), browser);
        spawn_detached(Command::new(browser).arg(folder), browser)?;
        Ok(())
    }

    fn copy_text(&self, text: &str) -> TsResult<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|err| launch_error("clipboard", err))?;
        clipboard
            .set_text(text)
            .map_err(|err| launch_error("clipboard", err))?;
        Ok(())
    }
}
