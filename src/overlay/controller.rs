//! 触发控制器
//!
//! 根据指针移动、修饰键和触发模式决定何时定位、翻译和替换。
//!
//! 所有状态只在单线程上修改，不需要锁；但每个 `.await` 之后读到的状态都可能
//! 已经过期，因此翻译返回后必须重新比较片段标识，标识变了就丢弃结果。
//! 指针防抖通过递增的序号实现：每次移动都启动一个延时任务，只有序号仍是最新的
//! 任务才会真正执行。

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::broadcast;

use super::context::OverlayContext;
use super::locator::{HitTester, SegmentLocator};
use super::replacer::InlineReplacer;
use super::segment::{Segment, SegmentKey};
use super::segmenter::{Granularity, TextSegmenter};
use crate::settings::{Modifier, Modifiers, Settings, TriggerMode};
use crate::translation::error::helpers;

struct ControllerInner {
    context: Rc<OverlayContext>,
    locator: SegmentLocator,
    replacer: RefCell<InlineReplacer>,
    primary: Modifier,
    secondary: Modifier,
    debounce: Duration,
    sentence_key_chars: usize,

    pointer: Cell<Option<(f64, f64)>>,
    modifiers: Cell<Modifiers>,
    current_key: RefCell<Option<SegmentKey>>,
    motion_seq: Cell<u64>,
}

/// 触发控制器
#[derive(Clone)]
pub struct TriggerController {
    inner: Rc<ControllerInner>,
}

impl TriggerController {
    pub fn new(
        context: Rc<OverlayContext>,
        hit_tester: Rc<dyn HitTester>,
        segmenter: Rc<dyn TextSegmenter>,
    ) -> Self {
        let config = context.config().clone();
        let locator = SegmentLocator::new(
            hit_tester,
            segmenter,
            &config.marker_class,
            &config.banner_class,
        );

        Self {
            inner: Rc::new(ControllerInner {
                context,
                locator,
                replacer: RefCell::new(InlineReplacer::new(&config.marker_class)),
                primary: config.primary_modifier,
                secondary: config.secondary_modifier,
                debounce: config.debounce(),
                sentence_key_chars: config.sentence_key_chars,
                pointer: Cell::new(None),
                modifiers: Cell::new(Modifiers::none()),
                current_key: RefCell::new(None),
                motion_seq: Cell::new(0),
            }),
        }
    }

    pub fn context(&self) -> &Rc<OverlayContext> {
        &self.inner.context
    }

    /// 当前应使用的粒度；`None` 表示不触发
    pub fn granularity(&self) -> Option<Granularity> {
        self.inner.granularity()
    }

    /// 指针移动
    ///
    /// 事件携带的修饰键状态会刷新跟踪的标志。实际的定位在防抖延时后进行，
    /// 必须在 `tokio::task::LocalSet` 中调用。
    pub fn pointer_moved(&self, x: f64, y: f64, modifiers: Modifiers) {
        let inner = &self.inner;
        inner.track_modifiers(modifiers);
        inner.pointer.set(Some((x, y)));

        let seq = inner.motion_seq.get() + 1;
        inner.motion_seq.set(seq);

        let inner = Rc::clone(inner);
        tokio::task::spawn_local(async move {
            tokio::time::sleep(inner.debounce).await;
            if inner.motion_seq.get() == seq {
                inner.evaluate(x, y).await;
            } else {
                tracing::trace!("防抖丢弃指针事件 #{}", seq);
            }
        });
    }

    /// 立即在给定位置评估一次（跳过防抖）
    pub async fn evaluate(&self, x: f64, y: f64) {
        self.inner.pointer.set(Some((x, y)));
        self.inner.evaluate(x, y).await;
    }

    /// 修饰键按下；修饰键模式下立即在最后的指针位置重新评估
    pub async fn key_down(&self, key: Modifier) {
        let inner = &self.inner;
        let mut modifiers = inner.modifiers.get();
        modifiers.set(key, true);
        inner.modifiers.set(modifiers);

        if inner.trigger_mode() != TriggerMode::Modifier || !inner.is_tracked(key) {
            return;
        }
        // 粒度可能改变，先还原再重新定位，否则指针停在译文上时不会切换
        inner.reset();
        if let Some((x, y)) = inner.pointer.get() {
            inner.evaluate(x, y).await;
        }
    }

    /// 修饰键松开；修饰键模式下立即还原
    pub fn key_up(&self, key: Modifier) {
        let inner = &self.inner;
        let mut modifiers = inner.modifiers.get();
        modifiers.set(key, false);
        inner.modifiers.set(modifiers);

        if inner.trigger_mode() == TriggerMode::Modifier {
            inner.reset();
        }
    }

    /// 窗口失去焦点
    pub fn focus_lost(&self) {
        self.inner.modifiers.set(Modifiers::none());
        self.inner.cancel_pending();
        self.inner.reset();
    }

    /// 指针离开文档
    pub fn pointer_left(&self) {
        self.inner.cancel_pending();
        self.inner.reset();
    }

    /// 用户点击了提示横幅
    pub async fn notice_clicked(&self) -> bool {
        self.inner.current_key.borrow_mut().take();
        self.inner.context.retry_session().await
    }

    /// 采用新设置
    pub fn apply_settings(&self, settings: Settings) {
        let language_changed = self.inner.context.settings().language_changed(&settings);
        self.inner.context.on_settings_changed(settings);
        if language_changed {
            self.inner.reset();
        }
    }

    /// 持续接收设置变更，直到通道关闭
    pub async fn follow_settings(&self, mut receiver: broadcast::Receiver<Settings>) {
        loop {
            match receiver.recv().await {
                Ok(settings) => self.apply_settings(settings),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("设置通知落后，跳过 {} 条", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("设置通道已关闭");
                    break;
                }
            }
        }
    }

    pub fn teardown(&self) {
        self.inner.cancel_pending();
        self.inner.reset();
        self.inner.context.teardown();
    }

    pub fn is_active(&self) -> bool {
        self.inner.replacer.borrow().is_active()
    }

    /// 当前显示的译文
    pub fn active_text(&self) -> Option<String> {
        self.inner.replacer.borrow().active_text().map(str::to_string)
    }

    pub fn current_key(&self) -> Option<SegmentKey> {
        self.inner.current_key.borrow().clone()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.inner.modifiers.get()
    }

    pub fn last_pointer(&self) -> Option<(f64, f64)> {
        self.inner.pointer.get()
    }
}

impl ControllerInner {
    fn trigger_mode(&self) -> TriggerMode {
        self.context.settings().trigger_mode
    }

    fn is_tracked(&self, key: Modifier) -> bool {
        key == self.primary || key == self.secondary
    }

    fn track_modifiers(&self, reported: Modifiers) {
        let mut modifiers = self.modifiers.get();
        for key in [self.primary, self.secondary] {
            modifiers.set(key, reported.is_down(key));
        }
        self.modifiers.set(modifiers);
    }

    fn granularity(&self) -> Option<Granularity> {
        match self.trigger_mode() {
            TriggerMode::WordHover => Some(Granularity::Word),
            TriggerMode::SentenceHover => Some(Granularity::Sentence),
            TriggerMode::Modifier => {
                let modifiers = self.modifiers.get();
                match (
                    modifiers.is_down(self.primary),
                    modifiers.is_down(self.secondary),
                ) {
                    (true, true) => Some(Granularity::Sentence),
                    (true, false) | (false, true) => Some(Granularity::Word),
                    (false, false) => None,
                }
            }
        }
    }

    fn cancel_pending(&self) {
        self.motion_seq.set(self.motion_seq.get() + 1);
    }

    fn reset(&self) {
        self.replacer.borrow_mut().revert();
        self.current_key.borrow_mut().take();
    }

    fn forget_key(&self, key: &SegmentKey) {
        let mut current = self.current_key.borrow_mut();
        if current.as_ref() == Some(key) {
            current.take();
        }
    }

    fn is_over_active(&self, x: f64, y: f64) -> bool {
        let replacer = self.replacer.borrow();
        if !replacer.is_active() {
            return false;
        }
        self.locator
            .hit_tester()
            .element_at(x, y)
            .is_some_and(|element| replacer.is_over_active(&element))
    }

    fn locate(&self, granularity: Granularity, x: f64, y: f64) -> Option<Segment> {
        let locale = self.context.settings().source_lang;
        match granularity {
            Granularity::Word => self.locator.locate_word(x, y, &locale).map(Segment::Word),
            Granularity::Sentence => self
                .locator
                .locate_sentence(x, y, &locale)
                .map(Segment::Sentence),
        }
    }

    async fn evaluate(&self, x: f64, y: f64) {
        let Some(granularity) = self.granularity() else {
            self.reset();
            return;
        };

        // 指针仍在译文上时保持不动，避免来回闪烁
        if self.is_over_active(x, y) {
            return;
        }

        // 先还原，定位时拿到的才是原始文本节点
        self.replacer.borrow_mut().revert();

        let Some(segment) = self.locate(granularity, x, y) else {
            self.current_key.borrow_mut().take();
            return;
        };

        let key = segment.key(self.sentence_key_chars);
        if self.current_key.borrow().as_ref() == Some(&key) {
            return;
        }
        *self.current_key.borrow_mut() = Some(key.clone());
        tracing::debug!("{} 粒度触发: '{}'", granularity.as_str(), segment.text());

        let translated = match self.context.translate(segment.text()).await {
            Ok(Some(translated)) => translated,
            outcome => {
                if let Err(error) = outcome {
                    tracing::debug!("放弃本次触发: {}", error);
                }
                // 同一片段的下一次触发重新尝试
                self.forget_key(&key);
                return;
            }
        };

        if self.current_key.borrow().as_ref() != Some(&key) {
            tracing::debug!("片段已变化，丢弃过期译文 '{}'", translated);
            return;
        }

        let applied = {
            let mut replacer = self.replacer.borrow_mut();
            match &segment {
                Segment::Word(word) => replacer.apply_word(word, &translated),
                Segment::Sentence(sentence) => replacer.apply_sentence(sentence, &translated),
            }
        };
        if let Err(error) = applied {
            helpers::log(&error);
            self.current_key.borrow_mut().take();
        }
    }
}
