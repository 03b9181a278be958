//! 翻译会话管理
//!
//! 每个语言对只维护一个共享的翻译会话。会话按需惰性创建；创建进行中再次请求的
//! 调用方会等待同一个 [`Shared`] future，而不是各自发起创建。语言对变化时当前会话
//! 和进行中的创建一起作废，作废前启动的创建即使成功也不会被采用。
//!
//! 失败按 [`TranslationError`] 分类处理：
//!
//! - 宿主不可用：展示持续提示，进入 `Unavailable` 状态，不再自动重试，
//!   直到用户点击提示或语言对改变
//! - 需要激活：展示提示，下一次用户操作（[`SessionManager::retry_after_user_action`]）重试
//! - 其他错误：展示错误信息，下一次触发从头重试

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};

use crate::settings::LanguagePair;
use crate::translation::engine::{EngineError, TranslationEngine, Translator};
use crate::translation::error::{helpers, TranslationError};
use crate::translation::notice::{Notice, NoticeSink};

type SessionFuture = Shared<LocalBoxFuture<'static, Option<Rc<dyn Translator>>>>;

enum SessionState {
    Idle,
    Creating(SessionFuture),
    Ready(Rc<dyn Translator>),
    Unavailable,
}

struct SessionInner {
    engine: Rc<dyn TranslationEngine>,
    notices: Rc<dyn NoticeSink>,
    pair: RefCell<LanguagePair>,
    state: RefCell<SessionState>,
    /// 每次作废递增，用来识别过期的创建结果
    generation: Cell<u64>,
    creations: Cell<u64>,
}

/// 翻译会话管理器
#[derive(Clone)]
pub struct SessionManager {
    inner: Rc<SessionInner>,
}

impl SessionManager {
    pub fn new(
        engine: Rc<dyn TranslationEngine>,
        notices: Rc<dyn NoticeSink>,
        pair: LanguagePair,
    ) -> Self {
        Self {
            inner: Rc::new(SessionInner {
                engine,
                notices,
                pair: RefCell::new(pair),
                state: RefCell::new(SessionState::Idle),
                generation: Cell::new(0),
                creations: Cell::new(0),
            }),
        }
    }

    /// 获取当前语言对的会话，必要时创建
    pub async fn get_session(&self) -> Option<Rc<dyn Translator>> {
        let pending = {
            let mut state = self.inner.state.borrow_mut();
            match &*state {
                SessionState::Ready(session) => return Some(Rc::clone(session)),
                SessionState::Unavailable => return None,
                SessionState::Creating(future) => future.clone(),
                SessionState::Idle => {
                    let future = SessionInner::start(&self.inner);
                    *state = SessionState::Creating(future.clone());
                    future
                }
            }
        };

        pending.await
    }

    /// 作废当前会话和进行中的创建
    pub fn invalidate(&self) {
        self.inner.generation.set(self.inner.generation.get() + 1);
        *self.inner.state.borrow_mut() = SessionState::Idle;
    }

    /// 切换语言对；与当前语言对不同时作废会话
    pub fn set_pair(&self, pair: LanguagePair) {
        if *self.inner.pair.borrow() == pair {
            return;
        }
        tracing::info!("语言对切换为 {}，作废当前翻译会话", pair);
        *self.inner.pair.borrow_mut() = pair;
        self.invalidate();
    }

    /// 用户对提示做出操作后重新尝试创建
    pub async fn retry_after_user_action(&self) -> Option<Rc<dyn Translator>> {
        self.inner.engine.user_activated();
        self.inner.notices.hide();
        self.invalidate();
        self.get_session().await
    }

    pub fn pair(&self) -> LanguagePair {
        self.inner.pair.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.inner.state.borrow(), SessionState::Ready(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(*self.inner.state.borrow(), SessionState::Unavailable)
    }

    /// 已发起的创建次数
    pub fn creation_count(&self) -> u64 {
        self.inner.creations.get()
    }

    /// 当前的 generation，用于在 await 之后判断语言对是否被切换过
    pub fn generation(&self) -> u64 {
        self.inner.generation.get()
    }
}

impl SessionInner {
    fn start(inner: &Rc<SessionInner>) -> SessionFuture {
        let pair = inner.pair.borrow().clone();
        let generation = inner.generation.get();
        inner.creations.set(inner.creations.get() + 1);
        tracing::debug!("开始创建翻译会话: {}", pair);

        let creating = inner.engine.create(&pair);
        let inner = Rc::clone(inner);
        async move {
            let result = creating.await;
            inner.finish(generation, &pair, result)
        }
        .boxed_local()
        .shared()
    }

    fn finish(
        &self,
        generation: u64,
        pair: &LanguagePair,
        result: Result<Rc<dyn Translator>, EngineError>,
    ) -> Option<Rc<dyn Translator>> {
        if self.generation.get() != generation {
            tracing::debug!("语言对 {} 的会话创建结果已过期，丢弃", pair);
            return None;
        }

        match result {
            Ok(session) => {
                tracing::info!("翻译会话已就绪: {}", pair);
                self.notices.hide();
                *self.state.borrow_mut() = SessionState::Ready(Rc::clone(&session));
                Some(session)
            }
            Err(error) => {
                let error = TranslationError::from(error);
                helpers::log(&error);
                if let Some(notice) = Notice::from_error(&error) {
                    self.notices.show(notice);
                }
                *self.state.borrow_mut() = match error {
                    TranslationError::HostUnavailable(_) => SessionState::Unavailable,
                    _ => SessionState::Idle,
                };
                None
            }
        }
    }
}
