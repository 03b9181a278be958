//! 就地替换与还原
//!
//! 每次替换由两部分组成：`Snapshot` 记录改动前各文本节点的身份和原文，
//! `Patch` 记录插入了哪些节点。还原时按原样回放快照并移除补丁节点，最后合并相邻
//! 文本节点。同一时刻最多只有一个生效的替换。

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use super::segment::{SentenceSegment, WordSegment};
use crate::parsers::html::{
    contains, create_element_with_text, create_text_node, detach, get_parent_node, get_text,
    insert_after, insert_before, is_attached, normalize, set_text, text_content,
};
use crate::translation::error::{helpers, TranslationResult};

/// 改动前的文本节点及其原文
#[derive(Debug, Default)]
struct Snapshot {
    entries: Vec<(Handle, String)>,
}

impl Snapshot {
    fn capture(&mut self, node: &Handle, text: String) {
        self.entries.push((node.clone(), text));
    }

    /// 恢复原文，返回受影响的父节点（去重）
    fn restore(&self) -> Vec<Handle> {
        let mut parents: Vec<Handle> = Vec::new();
        for (node, text) in &self.entries {
            set_text(node, text);
            if let Some(parent) = get_parent_node(node) {
                if !parents.iter().any(|p| Rc::ptr_eq(p, &parent)) {
                    parents.push(parent);
                }
            }
        }
        parents
    }
}

/// 对文档的改动
#[derive(Debug)]
enum Patch {
    /// 原节点被摘下，换成前段文本、译文元素和后段文本
    Word {
        original: Handle,
        inserted: Vec<Handle>,
    },
    /// 各节点原地改写，译文元素插在第一个节点之后，另外可能新建了尾部文本节点
    Sentence { synthetic: Vec<Handle> },
}

/// 当前显示中的替换
#[derive(Debug)]
struct ActiveReplacement {
    marker: Handle,
    translated: String,
    snapshot: Snapshot,
    patch: Patch,
}

/// 就地替换器
pub struct InlineReplacer {
    marker_class: String,
    active: Option<ActiveReplacement>,
}

impl InlineReplacer {
    pub fn new(marker_class: &str) -> Self {
        Self {
            marker_class: marker_class.to_string(),
            active: None,
        }
    }

    /// 用译文替换单词
    pub fn apply_word(&mut self, segment: &WordSegment, translated: &str) -> TranslationResult<()> {
        self.revert();

        let text = get_text(&segment.node).unwrap_or_default();
        let still_valid = is_attached(&segment.node)
            && text.get(segment.start..segment.end) == Some(segment.text.as_str());
        if !still_valid {
            return Err(helpers::stale_segment(format!(
                "单词 '{}' 已不在原位置",
                segment.text
            )));
        }

        let marker = create_element_with_text("span", &self.marker_class, translated);
        let before = &text[..segment.start];
        let after = &text[segment.end..];

        let mut inserted = Vec::with_capacity(3);
        if !before.is_empty() {
            inserted.push(create_text_node(before));
        }
        inserted.push(marker.clone());
        if !after.is_empty() {
            inserted.push(create_text_node(after));
        }

        for node in &inserted {
            insert_before(&segment.node, node.clone());
        }
        detach(&segment.node);

        let mut snapshot = Snapshot::default();
        snapshot.capture(&segment.node, text);

        tracing::debug!("单词替换: '{}' -> '{}'", segment.text, translated);
        self.active = Some(ActiveReplacement {
            marker,
            translated: translated.to_string(),
            snapshot,
            patch: Patch::Word {
                original: segment.node.clone(),
                inserted,
            },
        });
        Ok(())
    }

    /// 用译文替换句子
    pub fn apply_sentence(
        &mut self,
        segment: &SentenceSegment,
        translated: &str,
    ) -> TranslationResult<()> {
        self.revert();

        let (Some(first), Some(last)) = (segment.spans.first(), segment.spans.last()) else {
            return Err(helpers::stale_segment("句子没有对应的文本节点"));
        };

        // 校验每个节点仍然挂在树上，且覆盖部分拼起来正好是句子原文
        let mut originals = Vec::with_capacity(segment.spans.len());
        let mut covered = String::with_capacity(segment.text.len());
        for span in &segment.spans {
            let text = get_text(&span.node)
                .filter(|_| is_attached(&span.node))
                .ok_or_else(|| helpers::stale_segment("句子所在节点已被移除"))?;
            let part = text
                .get(span.local_start..span.local_end)
                .ok_or_else(|| helpers::stale_segment("句子范围越界"))?;
            covered.push_str(part);
            originals.push(text);
        }
        if covered != segment.text {
            return Err(helpers::stale_segment(format!(
                "句子 '{}' 的节点内容已改变",
                segment.text
            )));
        }

        let before = originals[0][..first.local_start].to_string();
        let after = originals[originals.len() - 1][last.local_end..].to_string();

        let mut snapshot = Snapshot::default();
        let count = segment.spans.len();
        for (i, (span, original)) in segment.spans.iter().zip(originals).enumerate() {
            let replacement = match i {
                0 => before.as_str(),
                i if i == count - 1 => after.as_str(),
                _ => "",
            };
            set_text(&span.node, replacement);
            snapshot.capture(&span.node, original);
        }

        let marker = create_element_with_text("span", &self.marker_class, translated);
        insert_after(&first.node, marker.clone());

        // 单节点句子的尾部文本需要放到译文之后
        let mut synthetic = Vec::new();
        if count == 1 && !after.is_empty() {
            let tail = create_text_node(&after);
            insert_after(&marker, tail.clone());
            synthetic.push(tail);
        }

        tracing::debug!("句子替换: {} 个节点", count);
        self.active = Some(ActiveReplacement {
            marker,
            translated: translated.to_string(),
            snapshot,
            patch: Patch::Sentence { synthetic },
        });
        Ok(())
    }

    /// 还原当前替换；没有替换或译文元素已被移除时什么都不做
    pub fn revert(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        if !is_attached(&active.marker) {
            tracing::debug!("译文元素已脱离文档，跳过还原");
            return;
        }

        match active.patch {
            Patch::Word { original, inserted } => {
                let parent = get_parent_node(&active.marker);
                if let Some(first) = inserted.first() {
                    insert_before(first, original);
                }
                for node in &inserted {
                    detach(node);
                }
                active.snapshot.restore();
                if let Some(parent) = parent {
                    normalize(&parent);
                }
            }
            Patch::Sentence { synthetic } => {
                for node in &synthetic {
                    detach(node);
                }
                detach(&active.marker);
                for parent in active.snapshot.restore() {
                    normalize(&parent);
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// `element` 是否为当前译文元素或其后代
    pub fn is_over_active(&self, element: &Handle) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| contains(&active.marker, element))
    }

    /// 当前显示的译文
    pub fn active_text(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.translated.as_str())
    }

    pub fn marker(&self) -> Option<Handle> {
        self.active.as_ref().map(|active| active.marker.clone())
    }

    /// 当前译文元素中的文本（元素脱离文档后为 `None`）
    pub fn displayed_text(&self) -> Option<String> {
        self.active
            .as_ref()
            .filter(|active| is_attached(&active.marker))
            .map(|active| text_content(&active.marker))
    }
}
