//! 検索対象ツリー
//!
//! セッション開始時に一度だけファイルシステムを列挙し、ディレクトリ単位のノードと
//! ファイル（ドキュメント）をアリーナに格納する。走査は「直下のファイル → 子ディレクトリ」
//! の順で行い、各ノードのカーソルは単調増加する。

use crate::config::SessionConfig;
use crate::filters::{FileFilter, GitignoreFilter};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::iter::FusedIterator;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

pub type NodeId = usize;
pub type DocId = usize;

/// 合成ルートノードのID
pub const ROOT: NodeId = 0;

/// 表示用の行。タブは4つの空白に展開する
pub fn display_line(line: &str) -> String {
    line.replace('\t', "    ")
}

/// 検索対象の1ファイル
///
/// 内容は最初のアクセス時に読み込まれ、処理が終わると `release` で破棄される。
#[derive(Debug)]
pub struct SearchableDocument {
    path: PathBuf,
    bytes: Option<Vec<u8>>,
    text: Option<String>,
    lines: Option<Vec<String>>,
    /// いずれかの検索戦略がヒットを報告したら true
    pub had_hit: bool,
}

impl SearchableDocument {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            bytes: None,
            text: None,
            lines: None,
            had_hit: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 生バイト列を読み込む（キャッシュ）
    pub fn bytes(&mut self) -> io::Result<&[u8]> {
        if self.bytes.is_none() {
            self.bytes = Some(fs::read(&self.path)?);
        }
        Ok(self.bytes.as_deref().unwrap_or_default())
    }

    /// UTF-8（不正なバイトは置換）として読み込んだ全文
    pub fn text(&mut self) -> io::Result<&str> {
        if self.text.is_none() {
            let raw = fs::read(&self.path)?;
            let decoded = String::from_utf8_lossy(&raw);
            self.text = Some(decoded.trim_start_matches('\u{feff}').to_string());
        }
        Ok(self.text.as_deref().unwrap_or_default())
    }

    /// 行単位の内容（[`display_line`] 済み）
    pub fn lines(&mut self) -> io::Result<&[String]> {
        if self.lines.is_none() {
            let lines = self
                .text()?
                .lines()
                .map(display_line)
                .collect();
            self.lines = Some(lines);
        }
        Ok(self.lines.as_deref().unwrap_or_default())
    }

    pub fn is_loaded(&self) -> bool {
        self.bytes.is_some() || self.text.is_some() || self.lines.is_some()
    }

    /// 読み込んだバッファを破棄
    pub fn release(&mut self) {
        self.bytes = None;
        self.text = None;
        self.lines = None;
    }
}

/// A visit to one document; the loaded buffers are dropped with the guard.
pub struct OpenDocument<'a> {
    doc: &'a mut SearchableDocument,
}

impl Deref for OpenDocument<'_> {
    type Target = SearchableDocument;

    fn deref(&self) -> &Self::Target {
        self.doc
    }
}

impl DerefMut for OpenDocument<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.doc
    }
}

impl Drop for OpenDocument<'_> {
    fn drop(&mut self) {
        self.doc.release();
    }
}

/// ディレクトリ（または合成ルート）
#[derive(Debug)]
struct TreeNode {
    path: Option<PathBuf>,
    documents: Vec<DocId>,
    children: Vec<NodeId>,
    /// 直下ドキュメントと子ノードを連結した空間へのインデックス
    cursor: usize,
}

impl TreeNode {
    fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            documents: Vec::new(),
            children: Vec::new(),
            cursor: 0,
        }
    }

    fn slot_count(&self) -> usize {
        self.documents.len() + self.children.len()
    }
}

/// Snapshot of every searchable file, traversed once per session
#[derive(Debug)]
pub struct ItemTree {
    nodes: Vec<TreeNode>,
    documents: Vec<SearchableDocument>,
    /// Path from the root to the node currently being traversed
    active: Vec<NodeId>,
}

impl Default for ItemTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemTree {
    /// 空のツリー（合成ルートのみ）
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::new(None)],
            documents: Vec::new(),
            active: vec![ROOT],
        }
    }

    /// 指定されたルート群からツリーを構築
    ///
    /// ディレクトリはルート直下の子ノードになり、ファイルを直接指定した場合は
    /// フィルタを通さずに合成ルートのドキュメントとして追加する。
    pub fn build(roots: &[PathBuf], config: &SessionConfig) -> Self {
        let mut tree = Self::new();
        let filter = FileFilter::from_config(config);
        let walker = GitignoreFilter::new(config.respect_ignore_files, config.recurse);

        for root in roots {
            let root = std::path::absolute(root).unwrap_or_else(|_| root.clone());
            if root.is_dir() {
                tree.add_directory(&root, &filter, &walker);
            } else if root.is_file() {
                tree.add_document(ROOT, root);
            } else {
                log::warn!("Search target not found: {}", root.display());
            }
        }

        log::debug!(
            "Item tree built: {} directories, {} documents",
            tree.nodes.len() - 1,
            tree.documents.len()
        );
        tree
    }

    fn add_directory(&mut self, dir: &Path, filter: &FileFilter, walker: &GitignoreFilter) {
        let top = self.add_node(ROOT, dir.to_path_buf());
        let mut nodes_by_path: HashMap<PathBuf, NodeId> = HashMap::new();
        nodes_by_path.insert(dir.to_path_buf(), top);

        for result in walker.create_walker(dir).build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    // アクセスできないエントリは結果から除外するだけ
                    log::warn!("Failed to access entry: {}", err);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let Some(parent) = path.parent().and_then(|p| nodes_by_path.get(p)).copied() else {
                continue;
            };
            let Some(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                let node = self.add_node(parent, path.to_path_buf());
                nodes_by_path.insert(path.to_path_buf(), node);
            } else if file_type.is_file() {
                let size = match entry.metadata() {
                    Ok(metadata) => metadata.len(),
                    Err(err) => {
                        log::warn!("Failed to read metadata for {}: {}", path.display(), err);
                        continue;
                    }
                };
                if filter.should_search_file(path, size) {
                    self.add_document(parent, path.to_path_buf());
                }
            }
        }
    }

    pub fn add_node(&mut self, parent: NodeId, path: PathBuf) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode::new(Some(path)));
        self.nodes[parent].children.push(id);
        id
    }

    pub fn add_document(&mut self, parent: NodeId, path: PathBuf) -> DocId {
        let id = self.documents.len();
        self.documents.push(SearchableDocument::new(path));
        self.nodes[parent].documents.push(id);
        id
    }

    pub fn document(&self, id: DocId) -> &SearchableDocument {
        &self.documents[id]
    }

    pub fn document_mut(&mut self, id: DocId) -> &mut SearchableDocument {
        &mut self.documents[id]
    }

    /// ドキュメントを開く。ガードが破棄されるとバッファも解放される
    pub fn open(&mut self, id: DocId) -> OpenDocument<'_> {
        OpenDocument {
            doc: &mut self.documents[id],
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// ヒットがあったドキュメント数
    pub fn count_hits(&self) -> usize {
        self.documents.iter().filter(|doc| doc.had_hit).count()
    }

    /// Whether the traversal has consumed the whole tree
    pub fn is_exhausted(&self) -> bool {
        self.active.is_empty()
    }

    /// Advance the currently active directory past its remaining documents and
    /// subdirectories. Sibling subtrees are left untouched.
    ///
    /// On the synthetic root only the remaining explicitly listed files are
    /// skipped; the root directories given on the command line are siblings.
    pub fn skip_current_subtree(&mut self) {
        let Some(&current) = self.active.last() else {
            return;
        };
        let node = &mut self.nodes[current];
        let target = if current == ROOT {
            node.documents.len()
        } else {
            node.slot_count()
        };
        node.cursor = node.cursor.max(target);
        log::debug!("Skipped subtree: {:?}", node.path);
    }
}

impl Iterator for ItemTree {
    type Item = DocId;

    /// 次の未訪問ドキュメント。全体を消費したら以降は常に None
    fn next(&mut self) -> Option<DocId> {
        loop {
            let current = *self.active.last()?;
            let node = &mut self.nodes[current];

            if node.cursor < node.documents.len() {
                let doc = node.documents[node.cursor];
                node.cursor += 1;
                return Some(doc);
            }

            let child_index = node.cursor - node.documents.len();
            if let Some(&child) = node.children.get(child_index) {
                self.active.push(child);
                continue;
            }

            // このノードは消費済み
            self.active.pop();
            if let Some(&parent) = self.active.last() {
                self.nodes[parent].cursor += 1;
            }
        }
    }
}

impl FusedIterator for ItemTree {}
