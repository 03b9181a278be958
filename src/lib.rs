//! # Hoverlay Library
//!
//! 悬停即译的就地翻译覆盖层：在已渲染的文档中定位指针下的单词或句子，异步翻译，
//! 把译文原地替换进 DOM，并在指针或按键变化时精确还原。
//!
//! ## 模块组织
//!
//! - `overlay` - 定位、替换、触发控制等覆盖层核心
//! - `translation` - 翻译引擎抽象、会话管理、缓存、提示与配置
//! - `settings` - 用户设置与变更广播
//! - `parsers` - HTML 解析、DOM 操作与序列化
//! - `env` - 类型化的环境变量

pub mod env;
pub mod overlay;
pub mod parsers;
pub mod settings;
pub mod translation;

// Re-export commonly used items for convenience
pub use overlay::{MonospaceLayout, OverlayContext, TriggerController, UnicodeSegmenter};
pub use settings::{LanguagePair, Settings, SettingsHub, SettingsStore, TriggerMode};
pub use translation::{TranslationError, TranslationResult};
