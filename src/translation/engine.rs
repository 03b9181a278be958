//! 宿主翻译引擎接口
//!
//! 引擎按语言对创建会话对象，会话提供异步的 `translate`。创建可能以三种
//! 可区分的方式失败，用 [`EngineError`] 表达，而不是依赖异常名或消息匹配。
//! 可用性探测只供配置界面使用，见 [`availability_status`]。

use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use thiserror::Error;

use crate::settings::LanguagePair;

/// 引擎操作返回的单线程 future
pub type EngineFuture<T> = LocalBoxFuture<'static, Result<T, EngineError>>;

/// 引擎边界错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 宿主上完全没有翻译能力
    #[error("{0}")]
    Unavailable(String),

    /// 首次使用前需要用户手势
    #[error("activation required")]
    ActivationRequired,

    /// 其他失败
    #[error("{0}")]
    Failed(String),
}

/// 语言对可用性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Downloadable,
    Unsupported,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Availability::Available => "available",
            Availability::Downloadable => "downloadable",
            Availability::Unsupported => "unsupported",
        })
    }
}

/// 绑定到单一语言对的翻译会话
pub trait Translator {
    fn translate(&self, text: &str) -> EngineFuture<String>;
}

/// 宿主翻译引擎
pub trait TranslationEngine {
    /// 为语言对创建会话，可能需要较长时间（模型加载）
    fn create(&self, pair: &LanguagePair) -> EngineFuture<Rc<dyn Translator>>;

    /// 探测语言对的可用性
    fn availability(&self, pair: &LanguagePair) -> EngineFuture<Availability>;

    /// 宿主记录到一次用户手势（点击提示等）
    fn user_activated(&self) {}
}

/// 状态等级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Ok,
    Warn,
    Error,
}

/// 配置界面显示的状态文字
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    fn new(level: StatusLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

pub const ENGINE_MISSING_TEXT: &str = "Translator API not available on this host";

/// 把可用性探测结果转换为状态文字；`engine` 为 `None` 表示宿主没有引擎
pub async fn availability_status(
    engine: Option<&dyn TranslationEngine>,
    pair: &LanguagePair,
) -> StatusMessage {
    let Some(engine) = engine else {
        return StatusMessage::new(StatusLevel::Error, ENGINE_MISSING_TEXT);
    };

    match engine.availability(pair).await {
        Ok(Availability::Available) => {
            StatusMessage::new(StatusLevel::Ok, "Translation model ready")
        }
        Ok(Availability::Downloadable) => {
            StatusMessage::new(StatusLevel::Warn, "Model will download on first use")
        }
        Ok(other) => StatusMessage::new(
            StatusLevel::Error,
            format!("Language pair not supported ({})", other),
        ),
        Err(EngineError::Unavailable(_)) => {
            StatusMessage::new(StatusLevel::Error, ENGINE_MISSING_TEXT)
        }
        Err(e) => StatusMessage::new(StatusLevel::Error, e.to_string()),
    }
}
