//! 用户设置与跨上下文广播
//!
//! 设置对象是不可变快照：每次更新整体替换。存储后端与传输通道属于外部协作方，
//! 这里只提供核心消费的接口（`SettingsStore`）以及一个内存实现 `SettingsHub`，
//! 它通过 `tokio::sync::broadcast` 把变更尽力投递给所有订阅的页面上下文。

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// 广播通道容量，落后的接收方会丢失中间快照，只保留最新的
const BROADCAST_CAPACITY: usize = 16;

/// 触发模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerMode {
    /// 悬停即按单词翻译
    WordHover,
    /// 悬停即按句子翻译
    SentenceHover,
    /// 按住修饰键时才翻译
    #[default]
    Modifier,
}

impl TriggerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerMode::WordHover => "word-hover",
            TriggerMode::SentenceHover => "sentence-hover",
            TriggerMode::Modifier => "modifier",
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word-hover" | "word" => Ok(TriggerMode::WordHover),
            "sentence-hover" | "sentence" => Ok(TriggerMode::SentenceHover),
            "modifier" => Ok(TriggerMode::Modifier),
            other => Err(format!(
                "Invalid trigger mode '{}'. Use: word-hover, sentence-hover, modifier",
                other
            )),
        }
    }
}

/// 修饰键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Alt,
    Meta,
    Control,
    Shift,
}

impl FromStr for Modifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alt" | "option" => Ok(Modifier::Alt),
            "meta" | "cmd" | "command" | "super" => Ok(Modifier::Meta),
            "control" | "ctrl" => Ok(Modifier::Control),
            "shift" => Ok(Modifier::Shift),
            other => Err(format!("Unknown modifier '{}'", other)),
        }
    }
}

/// 某一时刻按下的修饰键集合，随指针事件一起上报
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub alt: bool,
    pub meta: bool,
    pub control: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: Modifier) -> Self {
        self.set(key, true);
        self
    }

    pub fn is_down(&self, key: Modifier) -> bool {
        match key {
            Modifier::Alt => self.alt,
            Modifier::Meta => self.meta,
            Modifier::Control => self.control,
            Modifier::Shift => self.shift,
        }
    }

    pub fn set(&mut self, key: Modifier, down: bool) {
        match key {
            Modifier::Alt => self.alt = down,
            Modifier::Meta => self.meta = down,
            Modifier::Control => self.control = down,
            Modifier::Shift => self.shift = down,
        }
    }
}

/// 语言对
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

/// 用户设置快照
///
/// 字段名与扩展存储中的 JSON 保持一致（`sourceLang` 等），同时接受蛇形命名，
/// 方便直接写在 TOML 配置里。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "sourceLang", alias = "source_lang")]
    pub source_lang: String,
    #[serde(rename = "targetLang", alias = "target_lang")]
    pub target_lang: String,
    #[serde(rename = "triggerMode", alias = "trigger_mode", default)]
    pub trigger_mode: TriggerMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_lang: "es".to_string(),
            target_lang: "en".to_string(),
            trigger_mode: TriggerMode::Modifier,
        }
    }
}

impl Settings {
    pub fn new(source_lang: &str, target_lang: &str, trigger_mode: TriggerMode) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            trigger_mode,
        }
    }

    pub fn language_pair(&self) -> LanguagePair {
        LanguagePair::new(&self.source_lang, &self.target_lang)
    }

    /// 与另一份快照相比，语言对是否发生变化
    pub fn language_changed(&self, other: &Settings) -> bool {
        self.source_lang != other.source_lang || self.target_lang != other.target_lang
    }
}

/// 设置存储（外部协作方）
pub trait SettingsStore {
    fn get(&self) -> Settings;
    fn set(&self, settings: Settings);
    fn subscribe(&self) -> broadcast::Receiver<Settings>;
}

/// 内存设置存储 + 变更广播
#[derive(Clone)]
pub struct SettingsHub {
    current: Arc<RwLock<Settings>>,
    sender: broadcast::Sender<Settings>,
}

impl SettingsHub {
    /// 使用已保存的设置创建；没有保存过时装入默认设置
    pub fn load_or_default(stored: Option<Settings>) -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            current: Arc::new(RwLock::new(stored.unwrap_or_default())),
            sender,
        }
    }

    /// 当前订阅的上下文数量
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SettingsHub {
    fn default() -> Self {
        Self::load_or_default(None)
    }
}

impl SettingsStore for SettingsHub {
    fn get(&self) -> Settings {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, settings: Settings) {
        match self.current.write() {
            Ok(mut guard) => *guard = settings.clone(),
            Err(poisoned) => *poisoned.into_inner() = settings.clone(),
        }
        // 尽力投递：没有订阅者时发送失败可以忽略
        match self.sender.send(settings) {
            Ok(delivered) => tracing::debug!("设置变更已广播到 {} 个上下文", delivered),
            Err(_) => tracing::debug!("设置变更无订阅者"),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<Settings> {
        self.sender.subscribe()
    }
}
