//! XML ドキュメントの XPath 検索
//!
//! 式の評価は `sxd-xpath`、行と桁は `roxmltree` のノード範囲から求める。
//! 両方のパーサーで要素を文書順に番号付けし、その番号で対応付ける。

use crate::searchers::structured::{DocumentQuery, QueryError, QueryMatch};
use std::ops::Range;
use sxd_document::dom;
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value, XPath};

/// XPath evaluator for XML documents
#[derive(Debug, Clone, Copy, Default)]
pub struct XPathQuery;

impl XPathQuery {
    fn compile(query: &str) -> Result<XPath, QueryError> {
        Factory::new()
            .build(query)
            .map_err(|err| QueryError::Query(err.to_string()))?
            .ok_or_else(|| QueryError::Query("empty expression".to_string()))
    }
}

/// 位置情報付きの要素一覧（文書順）
struct Positions<'s, 'a, 'i> {
    source: &'s str,
    elements: Vec<roxmltree::Node<'a, 'i>>,
}

impl<'s, 'a, 'i> Positions<'s, 'a, 'i> {
    /// 開始タグの `<name` 部分
    fn tag(&self, element: roxmltree::Node<'a, 'i>) -> Range<usize> {
        let start = element.range().start;
        let name_len = self.source[start + 1..]
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(0);
        start..start + 1 + name_len
    }

    /// 開始タグ内の属性名。接頭辞があれば含める
    fn attribute(&self, element: roxmltree::Node<'a, 'i>, local: &str) -> Option<Range<usize>> {
        let start = element.range().start;
        let tag = &self.source[start..element.range().end];
        let tag = &tag[..tag.find('>').unwrap_or(tag.len())];

        tag.match_indices(local).find_map(|(at, _)| {
            let end = at + local.len();
            if !tag[end..].trim_start().starts_with('=') {
                return None;
            }
            let name_start = tag[..at]
                .rfind(|c: char| c.is_whitespace())
                .map(|i| i + 1)?;
            let prefix = &tag[name_start..at];
            (prefix.is_empty() || prefix.ends_with(':')).then(|| start + name_start..start + end)
        })
    }

    /// テキストノードの最初の空白でない行
    fn text(&self, text: roxmltree::Node<'a, 'i>) -> Option<Range<usize>> {
        let range = text.range();
        let raw = &self.source[range.clone()];
        let lead = raw.len() - raw.trim_start().len();
        let body = raw[lead..].lines().next()?.trim_end();
        if body.is_empty() {
            return None;
        }
        let start = range.start + lead;
        Some(start..start + body.len())
    }
}

/// sxd 側の要素を文書順に並べる
fn collect_elements<'d>(element: dom::Element<'d>, out: &mut Vec<dom::Element<'d>>) {
    out.push(element);
    for child in element.children() {
        if let dom::ChildOfElement::Element(child) = child {
            collect_elements(child, out);
        }
    }
}

/// sxd の要素に対応する roxmltree の要素
fn paired<'d, 'a, 'i>(
    element: dom::Element<'d>,
    dom_elements: &[dom::Element<'d>],
    positions: &Positions<'_, 'a, 'i>,
) -> Option<roxmltree::Node<'a, 'i>> {
    let index = dom_elements.iter().position(|candidate| *candidate == element)?;
    positions.elements.get(index).copied()
}

/// 強調するバイト範囲。要素は開始タグ名、属性は属性名、テキストは最初の行
fn highlight<'d>(
    node: &Node<'d>,
    dom_elements: &[dom::Element<'d>],
    positions: &Positions<'_, '_, '_>,
) -> Option<Range<usize>> {
    match node {
        Node::Root(_) => positions.elements.first().map(|root| positions.tag(*root)),
        Node::Element(element) => {
            paired(*element, dom_elements, positions).map(|found| positions.tag(found))
        }
        Node::Attribute(attribute) => {
            let owner = paired(attribute.parent()?, dom_elements, positions)?;
            positions
                .attribute(owner, attribute.name().local_part())
                .or_else(|| Some(positions.tag(owner)))
        }
        Node::Text(text) => {
            let parent = text.parent()?;
            let owner = paired(parent, dom_elements, positions)?;
            let ordinal = parent
                .children()
                .into_iter()
                .filter_map(|child| match child {
                    dom::ChildOfElement::Text(sibling) => Some(sibling),
                    _ => None,
                })
                .position(|sibling| sibling == *text)?;
            owner
                .children()
                .filter(|child| child.is_text())
                .nth(ordinal)
                .and_then(|found| positions.text(found))
                .or_else(|| Some(positions.tag(owner)))
        }
        other => highlight(&other.parent()?, dom_elements, positions),
    }
}

impl DocumentQuery for XPathQuery {
    fn validate(&self, query: &str) -> Result<(), QueryError> {
        Self::compile(query).map(|_| ())
    }

    fn evaluate(&self, source: &str, query: &str) -> Result<Vec<QueryMatch>, QueryError> {
        let xpath = Self::compile(query)?;
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        let located = roxmltree::Document::parse(source)
            .map_err(|err| QueryError::Document(err.to_string()))?;
        let package = sxd_document::parser::parse(source)
            .map_err(|err| QueryError::Document(format!("{err:?}")))?;
        let document = package.as_document();

        let value = xpath
            .evaluate(&Context::new(), document.root())
            .map_err(|err| QueryError::Query(err.to_string()))?;
        let Value::Nodeset(nodes) = value else {
            return Err(QueryError::Query(format!("'{query}' does not select nodes")));
        };

        let mut dom_elements = Vec::new();
        for child in document.root().children() {
            if let dom::ChildOfRoot::Element(element) = child {
                collect_elements(element, &mut dom_elements);
            }
        }
        let positions = Positions {
            source,
            elements: located.descendants().filter(|node| node.is_element()).collect(),
        };
        if positions.elements.len() != dom_elements.len() {
            log::debug!(
                "Element count differs between parsers ({} vs {})",
                positions.elements.len(),
                dom_elements.len()
            );
        }

        // document_order は重複を含まない
        let matches = nodes
            .document_order()
            .into_iter()
            .filter_map(|node| {
                let range = highlight(&node, &dom_elements, &positions)?;
                Some(QueryMatch::locate(
                    source,
                    range,
                    node.string_value().trim().to_string(),
                ))
            })
            .collect();
        Ok(matches)
    }
}
