//! 設定ファイル（ts.cfg）
//!
//! ```text
//! default = -l -n 9
//! # Contained in an email address
//! email = [\w.]+@{0}
//! code = -l -o cpp,h,hpp,c,cc
//! ```

use crate::error::{TsError, TsResult};
use crate::searchers::code_helpers::{needs_query, normalize_name};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "ts.cfg";

/// A switch defined in the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSwitch {
    /// Normalized name (no leading dashes, lower-case)
    pub name: String,
    /// Regex template, or a bundle of flags when it starts with `-`
    pub value: String,
    /// Comment lines directly above the definition
    pub comment: Vec<String>,
}

impl CustomSwitch {
    pub fn is_bundle(&self) -> bool {
        self.value.starts_with('-')
    }

    /// Whether the template consumes the query
    pub fn needs_query(&self) -> bool {
        !self.is_bundle() && needs_query(&self.value)
    }

    pub fn bundle_args(&self) -> Vec<String> {
        self.value.split_whitespace().map(str::to_string).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub path: Option<PathBuf>,
    /// Flags applied before every invocation's own arguments
    pub defaults: Vec<String>,
    pub switches: Vec<CustomSwitch>,
}

/// コメント行なら本文を返す
fn comment_text(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix("//") {
        return Some(rest.trim());
    }
    if let Some(rest) = line.strip_prefix('#') {
        return Some(rest.trim());
    }
    let lower = line.to_ascii_lowercase();
    if lower == "rem" || lower.starts_with("rem ") {
        return Some(line[3..].trim());
    }
    None
}

impl ConfigFile {
    /// 実行ファイルと同じディレクトリの ts.cfg
    pub fn default_path() -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        Some(exe.parent()?.join(CONFIG_FILE_NAME))
    }

    /// Load the config beside the executable; a missing file is an empty config
    pub fn load_default() -> TsResult<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> TsResult<Self> {
        let text = fs::read_to_string(path)?;
        let config = Self::parse(&text, path)?;
        log::debug!(
            "Loaded {} custom switches from {}",
            config.switches.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn parse(text: &str, path: &Path) -> TsResult<Self> {
        let mut config = Self {
            path: Some(path.to_path_buf()),
            ..Self::default()
        };
        let mut pending: Vec<String> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            let error = |message: &str| TsError::Config {
                path: path.to_path_buf(),
                line: index + 1,
                message: message.to_string(),
            };

            if line.is_empty() {
                pending.clear();
                continue;
            }
            if let Some(comment) = comment_text(line) {
                pending.push(comment.to_string());
                continue;
            }

            let Some((name, value)) = line.split_once('=') else {
                return Err(error("expected `name = value`"));
            };
            let name = normalize_name(name);
            let value = value.trim();

            if name == "default" {
                config.defaults = value.split_whitespace().map(str::to_string).collect();
                pending.clear();
                continue;
            }
            if name.is_empty() {
                return Err(error("missing switch name"));
            }
            if value.is_empty() {
                return Err(error("missing switch value"));
            }

            // 同名の定義は後勝ち
            config.switches.retain(|switch| switch.name != name);
            config.switches.push(CustomSwitch {
                name,
                value: value.to_string(),
                comment: std::mem::take(&mut pending),
            });
        }

        Ok(config)
    }

    pub fn find(&self, name: &str) -> Option<&CustomSwitch> {
        let name = normalize_name(name);
        self.switches.iter().find(|switch| switch.name == name)
    }
}
