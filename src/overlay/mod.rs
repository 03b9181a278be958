//! 悬停翻译覆盖层
//!
//! - **segmenter**: 单词 / 句子分段
//! - **segment**: 定位结果与片段标识
//! - **locator**: 坐标到片段的定位与节点映射
//! - **layout**: 等宽网格命中测试
//! - **replacer**: 就地替换与还原
//! - **context**: 页面上下文共享状态
//! - **controller**: 触发状态机

pub mod context;
pub mod controller;
pub mod layout;
pub mod locator;
pub mod replacer;
pub mod segment;
pub mod segmenter;

pub use context::OverlayContext;
pub use controller::TriggerController;
pub use layout::MonospaceLayout;
pub use locator::{block_ancestor, Caret, HitTester, SegmentLocator};
pub use replacer::InlineReplacer;
pub use segment::{NodeSpan, Segment, SegmentKey, SentenceSegment, WordSegment};
pub use segmenter::{Granularity, TextSegment, TextSegmenter, UnicodeSegmenter};
