// 集成测试公共模块
//
// 提供测试页面、可控的模拟翻译引擎和控制器装配

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tokio::sync::oneshot;

use hoverlay::overlay::{MonospaceLayout, OverlayContext, TriggerController, UnicodeSegmenter};
use hoverlay::parsers::html::{find_nodes, has_class, html_to_dom, serialize_children, text_content};
use hoverlay::settings::{LanguagePair, Settings};
use hoverlay::translation::{
    Availability, EngineError, EngineFuture, NoticeLog, OverlayConfig, TranslationEngine,
    Translator,
};

pub const MARKER: &str = "ll-translated";

/// 解析后的测试页面及其等宽布局
pub struct Page {
    pub dom: RcDom,
    pub layout: Rc<MonospaceLayout>,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        let dom = html_to_dom(html.as_bytes(), "utf-8").expect("parse test page");
        let layout = Rc::new(MonospaceLayout::new(dom.document.clone()));
        Self { dom, layout }
    }

    pub fn body(&self) -> Handle {
        find_nodes(&self.dom.document, &["html", "body"]).remove(0)
    }

    /// `needle` 首字符的坐标
    pub fn point_of(&self, needle: &str) -> (f64, f64) {
        self.layout
            .point_of_text(needle)
            .unwrap_or_else(|| panic!("'{}' is not laid out", needle))
    }

    pub fn body_html(&self) -> String {
        serialize_children(&self.body()).expect("serialize body")
    }

    pub fn body_text(&self) -> String {
        text_content(&self.body())
    }

    /// 文档中译文元素的数量
    pub fn markers(&self) -> usize {
        find_nodes(&self.dom.document, &["span"])
            .iter()
            .filter(|span| has_class(span, MARKER))
            .count()
    }
}

/// 按文档顺序列出子树中的文本节点
pub fn text_nodes(node: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    collect_text_nodes(node, &mut out);
    out
}

fn collect_text_nodes(node: &Handle, out: &mut Vec<Handle>) {
    if let NodeData::Text { .. } = node.data {
        out.push(node.clone());
    }
    for child in node.children.borrow().iter() {
        collect_text_nodes(child, out);
    }
}

struct Pending {
    text: String,
    rendered: String,
    sender: oneshot::Sender<Result<String, EngineError>>,
}

#[derive(Default)]
struct MockState {
    hold: Cell<bool>,
    requests: RefCell<Vec<String>>,
    pending: RefCell<VecDeque<Pending>>,
    create_outcomes: RefCell<VecDeque<Result<(), EngineError>>>,
    creations: RefCell<Vec<LanguagePair>>,
    activations: Cell<usize>,
}

/// 模拟翻译引擎
///
/// 译文与原文等长，替换后布局不会移动：目标语言为 `en` 时转大写，其他语言时
/// 反转字符顺序。开启 `hold` 后每个翻译请求挂起，直到测试调用 `release_next`。
pub struct MockEngine {
    state: Rc<MockState>,
}

impl MockEngine {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            state: Rc::new(MockState::default()),
        })
    }

    pub fn hold(&self, hold: bool) {
        self.state.hold.set(hold);
    }

    /// 下一次会话创建的结果
    pub fn fail_next_creation(&self, error: EngineError) {
        self.state.create_outcomes.borrow_mut().push_back(Err(error));
    }

    /// 完成最早挂起的请求，返回其原文
    pub fn release_next(&self) -> Option<String> {
        let pending = self.state.pending.borrow_mut().pop_front()?;
        let _ = pending.sender.send(Ok(pending.rendered));
        Some(pending.text)
    }

    /// 让最早挂起的请求失败
    pub fn fail_next(&self, message: &str) -> Option<String> {
        let pending = self.state.pending.borrow_mut().pop_front()?;
        let _ = pending.sender.send(Err(EngineError::Failed(message.to_string())));
        Some(pending.text)
    }

    pub fn pending(&self) -> usize {
        self.state.pending.borrow().len()
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.requests.borrow().clone()
    }

    pub fn creations(&self) -> Vec<LanguagePair> {
        self.state.creations.borrow().clone()
    }

    pub fn activations(&self) -> usize {
        self.state.activations.get()
    }
}

pub fn render(pair: &LanguagePair, text: &str) -> String {
    if pair.target == "en" {
        text.to_uppercase()
    } else {
        text.chars().rev().collect()
    }
}

impl TranslationEngine for MockEngine {
    fn create(&self, pair: &LanguagePair) -> EngineFuture<Rc<dyn Translator>> {
        self.state.creations.borrow_mut().push(pair.clone());
        let outcome = self
            .state
            .create_outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(()));
        let translator = MockTranslator {
            pair: pair.clone(),
            state: Rc::clone(&self.state),
        };
        async move { outcome.map(|_| Rc::new(translator) as Rc<dyn Translator>) }.boxed_local()
    }

    fn availability(&self, _pair: &LanguagePair) -> EngineFuture<Availability> {
        async { Ok(Availability::Available) }.boxed_local()
    }

    fn user_activated(&self) {
        self.state.activations.set(self.state.activations.get() + 1);
    }
}

struct MockTranslator {
    pair: LanguagePair,
    state: Rc<MockState>,
}

impl Translator for MockTranslator {
    fn translate(&self, text: &str) -> EngineFuture<String> {
        self.state.requests.borrow_mut().push(text.to_string());
        let rendered = render(&self.pair, text);
        if !self.state.hold.get() {
            return async move { Ok(rendered) }.boxed_local();
        }

        let (sender, receiver) = oneshot::channel();
        self.state.pending.borrow_mut().push_back(Pending {
            text: text.to_string(),
            rendered,
            sender,
        });
        async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(EngineError::Failed("request dropped".to_string())))
        }
        .boxed_local()
    }
}

/// 装配好的控制器
pub struct Harness {
    pub page: Page,
    pub engine: Rc<MockEngine>,
    pub notices: Rc<NoticeLog>,
    pub controller: TriggerController,
}

impl Harness {
    pub fn new(html: &str, settings: Settings) -> Self {
        let page = Page::parse(html);
        let engine = MockEngine::new();
        let notices = Rc::new(NoticeLog::new());
        let context = OverlayContext::init(
            OverlayConfig::default(),
            settings,
            engine.clone(),
            notices.clone(),
        );
        let controller = TriggerController::new(
            context,
            page.layout.clone(),
            Rc::new(UnicodeSegmenter),
        );
        Self {
            page,
            engine,
            notices,
            controller,
        }
    }

    /// 在 `needle` 处立即评估
    pub async fn hover(&self, needle: &str) {
        let (x, y) = self.page.point_of(needle);
        self.controller.evaluate(x, y).await;
    }

    /// 在后台任务中评估，用于制造交错的请求
    pub fn spawn_hover(&self, needle: &str) -> tokio::task::JoinHandle<()> {
        let (x, y) = self.page.point_of(needle);
        let controller = self.controller.clone();
        tokio::task::spawn_local(async move { controller.evaluate(x, y).await })
    }
}

/// 让出执行权若干次，让本地任务推进到下一个挂起点
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// 在 `LocalSet` 中运行测试体
pub async fn in_local_set<F: Future>(future: F) -> F::Output {
    tokio::task::LocalSet::new().run_until(future).await
}
