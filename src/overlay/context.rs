//! 覆盖层上下文
//!
//! 一个页面上下文共享的全部可变状态：当前设置、翻译缓存、会话管理器和提示面。
//! 生命周期显式：`init` 创建，`on_settings_changed` 采用新设置，`teardown` 清理。

use std::cell::RefCell;
use std::rc::Rc;

use crate::settings::Settings;
use crate::translation::config::OverlayConfig;
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::notice::{Notice, NoticeSink};
use crate::translation::session::SessionManager;
use crate::translation::storage::{CacheStats, TranslationCache};
use crate::translation::TranslationEngine;

pub struct OverlayContext {
    config: OverlayConfig,
    settings: RefCell<Settings>,
    cache: RefCell<TranslationCache>,
    sessions: SessionManager,
    notices: Rc<dyn NoticeSink>,
}

impl OverlayContext {
    pub fn init(
        config: OverlayConfig,
        settings: Settings,
        engine: Rc<dyn TranslationEngine>,
        notices: Rc<dyn NoticeSink>,
    ) -> Rc<Self> {
        tracing::info!(
            "初始化覆盖层: {} ({})",
            settings.language_pair(),
            settings.trigger_mode
        );
        let sessions = SessionManager::new(engine, Rc::clone(&notices), settings.language_pair());
        Rc::new(Self {
            cache: RefCell::new(TranslationCache::with_capacity(config.cache_capacity)),
            config,
            settings: RefCell::new(settings),
            sessions,
            notices,
        })
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn notices(&self) -> &Rc<dyn NoticeSink> {
        &self.notices
    }

    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats().clone()
    }

    /// 采用新设置；语言对变化时清空缓存并作废会话
    pub fn on_settings_changed(&self, settings: Settings) {
        let language_changed = self.settings.borrow().language_changed(&settings);
        if language_changed {
            tracing::info!("语言对变更为 {}，清空缓存", settings.language_pair());
            self.cache.borrow_mut().clear();
            self.sessions.set_pair(settings.language_pair());
        } else {
            tracing::debug!("触发模式变更为 {}", settings.trigger_mode);
        }
        *self.settings.borrow_mut() = settings;
    }

    /// 翻译一段文本
    ///
    /// 返回 `Ok(None)` 表示没有可用会话，或者翻译期间语言对已经切换、结果作废。
    /// 翻译失败时展示提示并返回错误。
    pub async fn translate(&self, text: &str) -> TranslationResult<Option<String>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if let Some(hit) = self.cache.borrow_mut().get(trimmed) {
            tracing::debug!("缓存命中: '{}'", trimmed);
            return Ok(Some(hit));
        }

        let generation = self.sessions.generation();
        let Some(session) = self.sessions.get_session().await else {
            return Ok(None);
        };

        let translated = match session.translate(trimmed).await {
            Ok(translated) => translated,
            Err(error) => {
                let error = TranslationError::from(error);
                helpers::log(&error);
                if let Some(notice) = Notice::from_error(&error) {
                    self.notices.show(notice);
                }
                return Err(error);
            }
        };

        if self.sessions.generation() != generation {
            tracing::debug!("翻译期间语言对已切换，丢弃 '{}' 的结果", trimmed);
            return Ok(None);
        }

        self.cache.borrow_mut().set(trimmed, translated.clone());
        Ok(Some(translated))
    }

    /// 用户点击提示后重新尝试创建会话
    pub async fn retry_session(&self) -> bool {
        self.sessions.retry_after_user_action().await.is_some()
    }

    pub fn teardown(&self) {
        tracing::info!("覆盖层上下文关闭");
        self.cache.borrow_mut().clear();
        self.sessions.invalidate();
        self.notices.hide();
    }
}
