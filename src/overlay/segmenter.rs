//! 文本分段
//!
//! 宿主的分段服务按语言和粒度把字符串切成片段。`UnicodeSegmenter` 基于
//! `unicode-segmentation` 的 UAX #29 规则实现，规则与语言无关，`locale`
//! 参数只是为了与宿主接口保持一致。

use unicode_segmentation::UnicodeSegmentation;

/// 分段粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Word,
    Sentence,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Word => "word",
            Granularity::Sentence => "sentence",
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Ok(Granularity::Word),
            "sentence" => Ok(Granularity::Sentence),
            other => Err(format!("Invalid granularity '{}'. Use: word, sentence", other)),
        }
    }
}

/// 一个分段结果，`index` 为字节偏移
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub index: usize,
    pub text: String,
    /// 只对单词粒度有意义
    pub is_word_like: bool,
}

impl TextSegment {
    pub fn end(&self) -> usize {
        self.index + self.text.len()
    }

    /// 左闭右开
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.index && offset < self.end()
    }
}

/// 宿主分段服务
pub trait TextSegmenter {
    fn segments(&self, text: &str, locale: &str, granularity: Granularity) -> Vec<TextSegment>;
}

/// UAX #29 分段
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeSegmenter;

impl TextSegmenter for UnicodeSegmenter {
    fn segments(&self, text: &str, _locale: &str, granularity: Granularity) -> Vec<TextSegment> {
        match granularity {
            Granularity::Word => text
                .split_word_bound_indices()
                .map(|(index, token)| TextSegment {
                    index,
                    text: token.to_string(),
                    is_word_like: token.chars().any(char::is_alphanumeric),
                })
                .collect(),
            Granularity::Sentence => text
                .split_sentence_bound_indices()
                .map(|(index, sentence)| TextSegment {
                    index,
                    text: sentence.to_string(),
                    is_word_like: false,
                })
                .collect(),
        }
    }
}
