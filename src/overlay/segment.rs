//! 定位结果
//!
//! 偏移均为节点 UTF-8 文本中的字节偏移，且总落在字符边界上。

use markup5ever_rcdom::Handle;

use super::segmenter::Granularity;

/// 单个文本节点中的一个单词，`[start, end)`
#[derive(Debug, Clone)]
pub struct WordSegment {
    pub node: Handle,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// 句子与某个文本节点的重叠部分
#[derive(Debug, Clone)]
pub struct NodeSpan {
    pub node: Handle,
    pub local_start: usize,
    pub local_end: usize,
}

/// 一个句子及其在块内各文本节点上的映射
#[derive(Debug, Clone)]
pub struct SentenceSegment {
    pub text: String,
    /// 句子在块内拼接文本中的范围
    pub start: usize,
    pub end: usize,
    /// 按文档顺序排列，至少一项
    pub spans: Vec<NodeSpan>,
}

#[derive(Debug, Clone)]
pub enum Segment {
    Word(WordSegment),
    Sentence(SentenceSegment),
}

/// 判断两次定位是否命中同一片段的稳定标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentKey {
    Word { node_text: String, start: usize },
    Sentence { prefix: String },
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Word(word) => &word.text,
            Segment::Sentence(sentence) => &sentence.text,
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Segment::Word(_) => Granularity::Word,
            Segment::Sentence(_) => Granularity::Sentence,
        }
    }

    /// 单词用所在节点文本加起始偏移，句子用前 `prefix_chars` 个字符
    pub fn key(&self, prefix_chars: usize) -> SegmentKey {
        match self {
            Segment::Word(word) => SegmentKey::Word {
                node_text: crate::parsers::html::get_text(&word.node).unwrap_or_default(),
                start: word.start,
            },
            Segment::Sentence(sentence) => SegmentKey::Sentence {
                prefix: sentence.text.chars().take(prefix_chars).collect(),
            },
        }
    }
}
