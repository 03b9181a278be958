//! 片段定位
//!
//! 从屏幕坐标解析出光标所在的文本节点和偏移，再提取其中的单词，或者提取所在
//! 块级祖先内的整句，并把句子范围映射回组成它的各个文本节点。

use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData};

use super::segment::{NodeSpan, SentenceSegment, WordSegment};
use super::segmenter::{Granularity, TextSegmenter};
use crate::parsers::html::{
    get_node_attr, get_node_name, get_parent_node, get_text, has_class, is_block_element,
    is_skip_element,
};

/// 光标位置：文本节点与字节偏移
#[derive(Debug, Clone)]
pub struct Caret {
    pub node: Handle,
    pub offset: usize,
}

/// 宿主的命中测试
pub trait HitTester {
    /// 坐标下的光标位置；可能落在非文本节点上
    fn caret_at(&self, x: f64, y: f64) -> Option<Caret>;

    /// 坐标下最内层的元素
    fn element_at(&self, x: f64, y: f64) -> Option<Handle>;
}

/// 片段定位器
pub struct SegmentLocator {
    hit_tester: Rc<dyn HitTester>,
    segmenter: Rc<dyn TextSegmenter>,
    marker_class: String,
    banner_class: String,
}

impl SegmentLocator {
    pub fn new(
        hit_tester: Rc<dyn HitTester>,
        segmenter: Rc<dyn TextSegmenter>,
        marker_class: &str,
        banner_class: &str,
    ) -> Self {
        Self {
            hit_tester,
            segmenter,
            marker_class: marker_class.to_string(),
            banner_class: banner_class.to_string(),
        }
    }

    pub fn hit_tester(&self) -> &Rc<dyn HitTester> {
        &self.hit_tester
    }

    pub fn locate_word(&self, x: f64, y: f64, locale: &str) -> Option<WordSegment> {
        let caret = self.hit_tester.caret_at(x, y)?;
        self.word_at(&caret, locale)
    }

    pub fn locate_sentence(&self, x: f64, y: f64, locale: &str) -> Option<SentenceSegment> {
        let caret = self.hit_tester.caret_at(x, y)?;
        self.sentence_at(&caret, locale)
    }

    /// 光标所在的单词；落在空白或标点上时返回 `None`
    pub fn word_at(&self, caret: &Caret, locale: &str) -> Option<WordSegment> {
        let text = self.eligible_text(&caret.node)?;

        self.segmenter
            .segments(&text, locale, Granularity::Word)
            .into_iter()
            .filter(|segment| segment.is_word_like)
            .find(|segment| segment.contains(caret.offset))
            .map(|segment| WordSegment {
                node: caret.node.clone(),
                start: segment.index,
                end: segment.end(),
                text: segment.text,
            })
    }

    /// 光标所在的句子
    pub fn sentence_at(&self, caret: &Caret, locale: &str) -> Option<SentenceSegment> {
        self.eligible_text(&caret.node)?;

        let block = block_ancestor(&caret.node);
        let mut nodes = Vec::new();
        let inherited = get_parent_node(&block).is_some_and(|parent| is_editable(&parent));
        self.collect_text_nodes(&block, inherited, &mut nodes);

        // 拼接文本，记录每个节点在其中的范围
        let mut full = String::new();
        let mut ranges = Vec::with_capacity(nodes.len());
        for (node, text) in nodes {
            let start = full.len();
            full.push_str(&text);
            ranges.push((node, start, full.len()));
        }

        let (_, node_start, _) = ranges
            .iter()
            .find(|(node, _, _)| Rc::ptr_eq(node, &caret.node))?;
        let cursor = node_start + caret.offset;

        let sentence = self
            .segmenter
            .segments(&full, locale, Granularity::Sentence)
            .into_iter()
            .find(|segment| segment.contains(cursor))?;

        // 句末空白留在原文中，不参与替换
        let trimmed = sentence.text.trim_end();
        let start = sentence.index + (trimmed.len() - trimmed.trim_start().len());
        let end = sentence.index + trimmed.len();
        if start >= end {
            return None;
        }

        let spans: Vec<NodeSpan> = ranges
            .iter()
            .filter_map(|(node, node_start, node_end)| {
                let overlap_start = start.max(*node_start);
                let overlap_end = end.min(*node_end);
                (overlap_start < overlap_end).then(|| NodeSpan {
                    node: node.clone(),
                    local_start: overlap_start - node_start,
                    local_end: overlap_end - node_start,
                })
            })
            .collect();
        if spans.is_empty() {
            tracing::debug!("句子没有映射到任何文本节点");
            return None;
        }

        Some(SentenceSegment {
            text: full[start..end].to_string(),
            start,
            end,
            spans,
        })
    }

    /// 节点是否处在不参与定位的区域内
    pub fn is_excluded(&self, node: &Handle) -> bool {
        let mut current = match node.data {
            NodeData::Element { .. } => Some(node.clone()),
            _ => get_parent_node(node),
        };

        while let Some(element) = current {
            if let Some(name) = get_node_name(&element) {
                if is_skip_element(name) || self.is_overlay_element(&element) {
                    return true;
                }
            }
            current = get_parent_node(&element);
        }
        is_editable(node)
    }

    fn is_overlay_element(&self, element: &Handle) -> bool {
        has_class(element, &self.marker_class) || has_class(element, &self.banner_class)
    }

    fn eligible_text(&self, node: &Handle) -> Option<String> {
        let text = get_text(node)?;
        if text.is_empty() || self.is_excluded(node) {
            return None;
        }
        Some(text)
    }

    /// 按文档顺序收集非空文本节点，跳过排除区域，其余非文本节点直接略过
    fn collect_text_nodes(
        &self,
        node: &Handle,
        editable: bool,
        out: &mut Vec<(Handle, String)>,
    ) {
        match &node.data {
            NodeData::Text { contents } => {
                let text = contents.borrow();
                if !editable && !text.is_empty() {
                    out.push((node.clone(), text.to_string()));
                }
            }
            NodeData::Element { name, .. } => {
                if is_skip_element(&name.local) || self.is_overlay_element(node) {
                    return;
                }
                let editable = editable_attr(node).unwrap_or(editable);
                for child in node.children.borrow().iter() {
                    self.collect_text_nodes(child, editable, out);
                }
            }
            NodeData::Document => {
                for child in node.children.borrow().iter() {
                    self.collect_text_nodes(child, editable, out);
                }
            }
            _ => {}
        }
    }
}

/// 元素自身的 contenteditable 设定；`None` 表示继承
fn editable_attr(element: &Handle) -> Option<bool> {
    get_node_attr(element, "contenteditable").map(|value| !value.eq_ignore_ascii_case("false"))
}

/// contenteditable 由最近一个带该属性的祖先决定
fn is_editable(node: &Handle) -> bool {
    let mut current = match node.data {
        NodeData::Element { .. } => Some(node.clone()),
        _ => get_parent_node(node),
    };

    while let Some(element) = current {
        if let Some(editable) = editable_attr(&element) {
            return editable;
        }
        current = get_parent_node(&element);
    }
    false
}

/// 最近的块级祖先；没有时退到 `body`，再没有时退到能到达的最上层元素
pub fn block_ancestor(node: &Handle) -> Handle {
    let mut fallback = node.clone();
    let mut current = get_parent_node(node);

    while let Some(element) = current {
        if let Some(name) = get_node_name(&element) {
            if is_block_element(name) || name == "body" {
                return element;
            }
            fallback = element.clone();
        }
        current = get_parent_node(&element);
    }
    fallback
}
