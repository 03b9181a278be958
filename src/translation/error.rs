//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。宿主翻译引擎的失败以
//! [`EngineError`](crate::translation::engine::EngineError) 的类型化形式进入，
//! 在这里归入统一的错误分类。

use std::fmt;

use thiserror::Error;

use crate::translation::engine::EngineError;

/// 翻译错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// 宿主完全不提供翻译能力
    #[error("翻译能力不可用: {0}")]
    HostUnavailable(String),

    /// 引擎首次使用前需要用户手势激活
    #[error("翻译引擎需要用户激活")]
    ActivationRequired,

    /// 其他引擎失败（创建或翻译）
    #[error("翻译引擎错误: {0}")]
    EngineError(String),

    /// 定位到的片段已与当前 DOM 不一致
    #[error("片段已失效: {0}")]
    StaleSegment(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// IO错误
    #[error("IO错误: {0}")]
    IoError(String),
}

impl TranslationError {
    /// 检查错误是否可在下一次触发时重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::HostUnavailable(_) => false,
            TranslationError::ActivationRequired => false, // 需要用户操作
            TranslationError::EngineError(_) => true,
            TranslationError::StaleSegment(_) => true,
            TranslationError::ConfigError(_) => false,
            TranslationError::ParseError(_) => false,
            TranslationError::IoError(_) => true,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::HostUnavailable(_) => ErrorSeverity::Critical,
            TranslationError::ActivationRequired => ErrorSeverity::Info,
            TranslationError::EngineError(_) => ErrorSeverity::Warning,
            TranslationError::StaleSegment(_) => ErrorSeverity::Info,
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::ParseError(_) => ErrorSeverity::Error,
            TranslationError::IoError(_) => ErrorSeverity::Error,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::HostUnavailable(_) => ErrorCategory::HostCapability,
            TranslationError::ActivationRequired => ErrorCategory::Activation,
            TranslationError::EngineError(_) => ErrorCategory::Engine,
            TranslationError::StaleSegment(_) => ErrorCategory::Overlay,
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::ParseError(_) => ErrorCategory::Parsing,
            TranslationError::IoError(_) => ErrorCategory::Io,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let wrap = |msg: String| format!("{} (上下文: {})", msg, context);

        match self {
            TranslationError::HostUnavailable(msg) => TranslationError::HostUnavailable(wrap(msg)),
            TranslationError::EngineError(msg) => TranslationError::EngineError(wrap(msg)),
            TranslationError::StaleSegment(msg) => TranslationError::StaleSegment(wrap(msg)),
            TranslationError::ConfigError(msg) => TranslationError::ConfigError(wrap(msg)),
            TranslationError::ParseError(msg) => TranslationError::ParseError(wrap(msg)),
            TranslationError::IoError(msg) => TranslationError::IoError(wrap(msg)),
            TranslationError::ActivationRequired => TranslationError::ActivationRequired,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    HostCapability,
    Activation,
    Engine,
    Overlay,
    Configuration,
    Parsing,
    Io,
}

/// 引擎边界错误归类
impl From<EngineError> for TranslationError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::Unavailable(msg) => TranslationError::HostUnavailable(msg),
            EngineError::ActivationRequired => TranslationError::ActivationRequired,
            EngineError::Failed(msg) => TranslationError::EngineError(msg),
        }
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::ParseError(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ParseError(format!("TOML解析错误: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }
    }

    /// 记录并返回错误
    pub fn log_error<T>(error: TranslationError) -> TranslationResult<T> {
        log(&error);
        Err(error)
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建片段失效错误
    pub fn stale_segment<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::StaleSegment(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_onto_taxonomy() {
        let unavailable: TranslationError = EngineError::Unavailable("no engine".into()).into();
        assert_eq!(unavailable.category(), ErrorCategory::HostCapability);
        assert!(!unavailable.is_retryable());

        let activation: TranslationError = EngineError::ActivationRequired.into();
        assert_eq!(activation, TranslationError::ActivationRequired);
        assert_eq!(activation.severity(), ErrorSeverity::Info);

        let failed: TranslationError = EngineError::Failed("model crashed".into()).into();
        assert_eq!(failed.category(), ErrorCategory::Engine);
        assert!(failed.is_retryable());
        assert!(failed.to_string().contains("model crashed"));
    }

    #[test]
    fn test_with_context() {
        let err = helpers::config_error("debounce_ms 不能为0").with_context("hoverlay.toml");
        assert!(err.to_string().contains("hoverlay.toml"));
        assert_eq!(
            TranslationError::ActivationRequired.with_context("x"),
            TranslationError::ActivationRequired
        );
    }

    #[test]
    fn test_log_error_returns_err() {
        let result: TranslationResult<()> = helpers::log_error(helpers::stale_segment("text changed"));
        assert!(matches!(result, Err(TranslationError::StaleSegment(_))));
    }
}
