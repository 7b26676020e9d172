//! JSON ドキュメントのパス検索
//!
//! `serde_json` で妥当性を確認したあと、独自の走査で各値のバイト位置を記録する。

use crate::searchers::structured::{DocumentQuery, QueryError, QueryMatch};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Name(String),
    /// `*`
    Any,
    /// `**`
    Deep,
}

/// 位置情報付きの JSON ノード（バイトオフセット）
#[derive(Debug)]
struct Node {
    key: Option<String>,
    /// 引用符を含むキーの範囲
    key_span: Option<(usize, usize)>,
    start: usize,
    end: usize,
    children: Vec<Node>,
    container: bool,
}

/// 妥当性確認済みの JSON を走査して各値の位置を記録する
struct Scanner<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Scanner<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> QueryError {
        QueryError::Document(format!("unexpected input at byte {}", self.pos))
    }

    fn expect(&mut self, byte: u8) -> Result<(), QueryError> {
        self.skip_whitespace();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn string(&mut self) -> Result<(String, usize, usize), QueryError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                Some(b'\\') => self.pos += 2,
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
                None => return Err(self.unexpected()),
            }
        }
        let raw = self.src.get(start..self.pos).ok_or_else(|| self.unexpected())?;
        let text: String =
            serde_json::from_str(raw).map_err(|err| QueryError::Document(err.to_string()))?;
        Ok((text, start, self.pos))
    }

    fn value(&mut self) -> Result<Node, QueryError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut children = Vec::new();
        let container = matches!(self.peek(), Some(b'{' | b'['));

        match self.peek() {
            Some(b'{') => {
                self.pos += 1;
                self.skip_whitespace();
                if self.peek() == Some(b'}') {
                    self.pos += 1;
                } else {
                    loop {
                        self.skip_whitespace();
                        let (key, key_start, key_end) = self.string()?;
                        self.expect(b':')?;
                        let mut child = self.value()?;
                        child.key = Some(key);
                        child.key_span = Some((key_start, key_end));
                        children.push(child);
                        self.skip_whitespace();
                        match self.peek() {
                            Some(b',') => self.pos += 1,
                            Some(b'}') => {
                                self.pos += 1;
                                break;
                            }
                            _ => return Err(self.unexpected()),
                        }
                    }
                }
            }
            Some(b'[') => {
                self.pos += 1;
                self.skip_whitespace();
                if self.peek() == Some(b']') {
                    self.pos += 1;
                } else {
                    loop {
                        children.push(self.value()?);
                        self.skip_whitespace();
                        match self.peek() {
                            Some(b',') => self.pos += 1,
                            Some(b']') => {
                                self.pos += 1;
                                break;
                            }
                            _ => return Err(self.unexpected()),
                        }
                    }
                }
            }
            Some(b'"') => {
                self.string()?;
            }
            Some(_) => {
                while !matches!(
                    self.peek(),
                    None | Some(b',' | b']' | b'}' | b' ' | b'\t' | b'\r' | b'\n')
                ) {
                    self.pos += 1;
                }
            }
            None => return Err(self.unexpected()),
        }

        Ok(Node {
            key: None,
            key_span: None,
            start,
            end: self.pos,
            children,
            container,
        })
    }
}

/// `/` 区切りのパスで JSON を辿る評価器
///
/// `*` は1階層のすべての子、`**` は任意の深さ、数値は配列のインデックスに一致する。
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPathQuery;

impl JsonPathQuery {
    fn parse_path(query: &str) -> Result<Vec<Segment>, QueryError> {
        let trimmed = query.trim().trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(QueryError::Query("empty path".to_string()));
        }
        trimmed
            .split('/')
            .map(|segment| match segment {
                "" => Err(QueryError::Query(format!("empty segment in '{query}'"))),
                "*" => Ok(Segment::Any),
                "**" => Ok(Segment::Deep),
                name => Ok(Segment::Name(name.to_string())),
            })
            .collect()
    }
}

fn walk<'n>(node: &'n Node, segments: &[Segment], out: &mut Vec<&'n Node>) {
    let Some((segment, rest)) = segments.split_first() else {
        out.push(node);
        return;
    };

    match segment {
        Segment::Any => {
            for child in &node.children {
                walk(child, rest, out);
            }
        }
        Segment::Deep => {
            walk(node, rest, out);
            for child in &node.children {
                walk(child, segments, out);
            }
        }
        Segment::Name(name) => {
            let is_object = node.children.iter().any(|child| child.key.is_some());
            let found = if is_object {
                node.children
                    .iter()
                    .find(|child| child.key.as_deref() == Some(name.as_str()))
            } else {
                name.parse::<usize>().ok().and_then(|i| node.children.get(i))
            };
            if let Some(child) = found {
                walk(child, rest, out);
            }
        }
    }
}

impl DocumentQuery for JsonPathQuery {
    fn validate(&self, query: &str) -> Result<(), QueryError> {
        Self::parse_path(query).map(|_| ())
    }

    fn evaluate(&self, source: &str, query: &str) -> Result<Vec<QueryMatch>, QueryError> {
        let segments = Self::parse_path(query)?;
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        serde_json::from_str::<Value>(source)
            .map_err(|err| QueryError::Document(err.to_string()))?;
        let root = Scanner::new(source).value()?;

        let mut found = Vec::new();
        walk(&root, &segments, &mut found);
        // `**` は同じノードに複数の経路で到達しうる
        found.sort_by_key(|node| (node.start, node.end));
        found.dedup_by_key(|node| (node.start, node.end));

        found
            .into_iter()
            .map(|node| {
                let raw = &source[node.start..node.end];
                let text = if node.container {
                    serde_json::from_str::<Value>(raw)
                        .map_err(|err| QueryError::Document(err.to_string()))?
                        .to_string()
                } else {
                    match serde_json::from_str::<Value>(raw) {
                        Ok(Value::String(s)) => s,
                        _ => raw.to_string(),
                    }
                };

                // キーがあればキーを、なければ値を強調する
                let (start, end) = match node.key_span {
                    Some(span) => span,
                    None if node.container => (node.start, node.start + 1),
                    None => (node.start, node.end),
                };
                Ok(QueryMatch::locate(source, start..end, text))
            })
            .collect()
    }
}
