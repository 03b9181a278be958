//! 翻译模块
//!
//! 覆盖层与翻译后端之间的一层：
//! - **engine**: 宿主翻译能力的抽象（创建会话、查询可用性）
//! - **session**: 按语言对惰性创建并共享翻译会话
//! - **storage**: 有界 LRU 翻译缓存
//! - **notice**: 创建失败时展示给用户的提示
//! - **glossary**: 基于词表文件的内置引擎
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use hoverlay::settings::LanguagePair;
//! use hoverlay::translation::{GlossaryEngine, NoticeLog, SessionManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Rc::new(GlossaryEngine::from_path("glossary.toml")?);
//! let sessions = SessionManager::new(
//!     engine,
//!     Rc::new(NoticeLog::new()),
//!     LanguagePair::new("es", "en"),
//! );
//!
//! if let Some(session) = sessions.get_session().await {
//!     let translated = session.translate("Hola").await?;
//!     println!("{}", translated);
//! }
//! # Ok(())
//! # }
//! ```

/// 配置管理模块
pub mod config;

/// 翻译引擎抽象
pub mod engine;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 词表引擎
pub mod glossary;

/// 用户提示
pub mod notice;

/// 会话生命周期管理
pub mod session;

/// 存储管理模块 - 翻译结果缓存
pub mod storage;

// ============================================================================
// 公共API导出
// ============================================================================

pub use config::{ConfigManager, OverlayConfig};
pub use engine::{
    availability_status, Availability, EngineError, EngineFuture, StatusLevel, StatusMessage,
    TranslationEngine, Translator,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use glossary::{GlossaryEngine, GlossaryTranslator};
pub use notice::{DomBanner, Notice, NoticeKind, NoticeLog, NoticeSink};
pub use session::SessionManager;
pub use storage::{CacheStats, TranslationCache};
