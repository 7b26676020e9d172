/// カラーサポート検出
pub fn detect_color_support() -> bool {
    // NO_COLOR環境変数でカラー無効化
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    // FORCE_COLOR環境変数でカラー強制有効化（テスト用）
    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    is_stdout_tty() && std::env::var("TERM").map_or(true, |term| term != "dumb")
}

/// 標準出力がTTYかどうか判定
pub fn is_stdout_tty() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}

/// ターミナル幅を検出
pub fn detect_terminal_width() -> usize {
    if let Ok((width, _)) = crossterm::terminal::size() {
        width as usize
    } else {
        80 // デフォルト幅
    }
}

/// `[Y]es [N]o` 形式のプロンプトを (テキスト, 強調するか) の並びに分解
///
/// 角括弧は取り除かれ、中身が強調部分になる。閉じ括弧がない `[` はそのまま残す。
pub fn split_key_markup(text: &str) -> Vec<(String, bool)> {
    let mut parts = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']').map(|i| open + i) else {
            break;
        };
        if open > 0 {
            parts.push((rest[..open].to_string(), false));
        }
        parts.push((rest[open + 1..close].to_string(), true));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        parts.push((rest.to_string(), false));
    }
    parts
}
