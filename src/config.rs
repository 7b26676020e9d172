//! セッション設定
//!
//! CLI引数と設定ファイルから組み立てられ、検索開始後は変更されない。

use crate::error::{TsError, TsResult};

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * 1024;

/// デフォルトのファイルサイズ上限（20MB）
pub const DEFAULT_MAX_BYTES: u64 = 20 * MB;
/// デフォルトの表示行数
pub const DEFAULT_LINE_COUNT: usize = 5;

/// バイナリ検索で比較する型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    /// 型指定なし（文字列表現で比較）
    Any,
    F32,
    U32,
    I32,
    U16,
    I16,
}

impl BinaryKind {
    pub fn name(&self) -> &'static str {
        match self {
            BinaryKind::Any => "any",
            BinaryKind::F32 => "float32",
            BinaryKind::U32 => "uint32",
            BinaryKind::I32 => "int32",
            BinaryKind::U16 => "uint16",
            BinaryKind::I16 => "int16",
        }
    }
}

/// 件数モードの出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// ヒットしたファイル名のみ
    Names,
    /// ファイルごとの件数（降順ソート）
    Count,
    /// ヒットしなかったファイル名のみ
    Not,
}

/// 件数モードで出現を数える対象
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TellSource {
    Literal,
    Pattern(String),
    Structured,
}

/// 構造化クエリの言語
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryLanguage {
    /// XML ドキュメントに対する XPath
    #[default]
    XPath,
    /// JSON ドキュメントに対する `/` 区切りのパス
    JsonPath,
}

/// 検索モード（排他的）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    Literal,
    Regex {
        pattern: String,
    },
    Binary(BinaryKind),
    Structured,
    Match {
        /// 未指定の場合はクエリを単語境界で囲んだパターンを使う
        pattern: Option<String>,
        unique: bool,
        show_file: bool,
    },
    Tell {
        listing: Listing,
        source: TellSource,
    },
}

impl SearchMode {
    /// ヒットごとに操作者の入力を待つモードかどうか
    pub fn is_interactive(&self) -> bool {
        !matches!(self, SearchMode::Match { .. } | SearchMode::Tell { .. })
    }
}

/// Immutable settings for one search session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mode: SearchMode,
    /// Evaluator for structured queries
    pub query_language: QueryLanguage,
    /// Query text after `--str` wrapping and backtick substitution
    pub query: String,
    pub case_sensitive: bool,
    pub recurse: bool,
    /// Lower-cased extensions without the leading dot
    pub only_extensions: Vec<String>,
    pub excluded_extensions: Vec<String>,
    pub max_bytes: u64,
    /// Number of rows shown in the viewport, at least 1
    pub line_count: usize,
    pub hit_limit: Option<usize>,
    pub show_line_numbers: bool,
    pub auto: bool,
    pub verbose: bool,
    pub respect_ignore_files: bool,
}

impl SessionConfig {
    pub fn new(mode: SearchMode, query: impl Into<String>) -> Self {
        Self {
            mode,
            query_language: QueryLanguage::default(),
            query: query.into(),
            case_sensitive: false,
            recurse: false,
            only_extensions: Vec::new(),
            excluded_extensions: Vec::new(),
            max_bytes: DEFAULT_MAX_BYTES,
            line_count: DEFAULT_LINE_COUNT,
            hit_limit: None,
            show_line_numbers: false,
            auto: false,
            verbose: false,
            respect_ignore_files: false,
        }
    }

    /// Extra rows drawn above and below the focus line
    pub fn half_window(&self) -> usize {
        if self.line_count <= 1 {
            0
        } else {
            self.line_count / 2
        }
    }

    /// Whether the session hit limit has been reached
    pub fn limit_reached(&self, hits: usize) -> bool {
        matches!(self.hit_limit, Some(limit) if limit > 0 && hits >= limit)
    }
}

/// `20m` / `512k` / `100b` / `4096` 形式のサイズ指定を解析
pub fn parse_size(text: &str) -> TsResult<u64> {
    let trimmed = text.trim();
    let invalid = || TsError::InvalidNumber {
        kind: "file size",
        value: text.to_string(),
    };

    let (digits, unit) = match trimmed.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&trimmed[..idx], Some(c.to_ascii_lowercase())),
        Some(_) => (trimmed, None),
        None => return Err(invalid()),
    };

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let multiplier = match unit {
        None | Some('b') => 1,
        Some('k') => KB,
        Some('m') => MB,
        Some(_) => return Err(invalid()),
    };

    value.checked_mul(multiplier).ok_or_else(invalid)
}
