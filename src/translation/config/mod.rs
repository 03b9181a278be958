//! 覆盖层配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, OverlayConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 触发相关
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(80);
    pub const MAX_DEBOUNCE_MS: u64 = 5000;
    pub const DEFAULT_SENTENCE_KEY_CHARS: usize = 60;

    // 缓存设置
    pub const DEFAULT_CACHE_CAPACITY: usize = 500;

    // DOM 标记
    pub const MARKER_CLASS: &str = "ll-translated";
    pub const BANNER_CLASS: &str = "ll-banner";
    pub const HIDDEN_CLASS: &str = "hidden";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "hoverlay.toml",
        ".hoverlay.toml",
        "~/.config/hoverlay/config.toml",
    ];

    /// 配置界面提供的语言
    pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
        ("en", "English"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("de", "German"),
        ("it", "Italian"),
        ("pt", "Portuguese"),
        ("nl", "Dutch"),
        ("ru", "Russian"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
        ("zh", "Chinese"),
        ("ar", "Arabic"),
        ("hi", "Hindi"),
        ("tr", "Turkish"),
        ("pl", "Polish"),
        ("vi", "Vietnamese"),
        ("th", "Thai"),
        ("sv", "Swedish"),
        ("da", "Danish"),
        ("fi", "Finnish"),
        ("uk", "Ukrainian"),
        ("cs", "Czech"),
        ("ro", "Romanian"),
        ("el", "Greek"),
        ("hu", "Hungarian"),
        ("id", "Indonesian"),
    ];
}

/// 查询语言代码的显示名称
pub fn language_name(code: &str) -> Option<&'static str> {
    constants::SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}
