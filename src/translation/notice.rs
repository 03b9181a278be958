//! 页面提示
//!
//! 会话创建失败时向用户展示的提示。`DomBanner` 把提示渲染为文档根元素下的
//! 横幅节点；`NoticeLog` 只在内存中记录，供无界面的宿主和测试使用。

use std::cell::RefCell;

use markup5ever_rcdom::Handle;

use crate::parsers::html::{
    append_child, create_element_with_text, create_text_node, get_child_node_by_name, toggle_class,
};
use crate::translation::config::constants::HIDDEN_CLASS;
use crate::translation::engine::ENGINE_MISSING_TEXT;
use crate::translation::error::TranslationError;

/// 提示类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// 宿主没有翻译能力，持续显示直到用户关闭
    Unavailable,
    /// 需要用户交互激活引擎
    ActivationRequired,
    /// 其他引擎错误
    EngineError,
}

/// 一条提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    /// 根据错误生成提示；与提示无关的错误返回 `None`
    pub fn from_error(error: &TranslationError) -> Option<Self> {
        let (kind, message) = match error {
            TranslationError::HostUnavailable(_) => {
                (NoticeKind::Unavailable, ENGINE_MISSING_TEXT.to_string())
            }
            TranslationError::ActivationRequired => (
                NoticeKind::ActivationRequired,
                "Click anywhere to activate translator".to_string(),
            ),
            TranslationError::EngineError(msg) => {
                (NoticeKind::EngineError, format!("Translator error: {}", msg))
            }
            _ => return None,
        };
        Some(Self { kind, message })
    }
}

/// 提示展示面
pub trait NoticeSink {
    fn show(&self, notice: Notice);
    fn hide(&self);
    /// 当前可见的提示
    fn current(&self) -> Option<Notice>;
}

/// 内存提示记录
#[derive(Default)]
pub struct NoticeLog {
    visible: RefCell<Option<Notice>>,
    history: RefCell<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 展示过的全部提示
    pub fn history(&self) -> Vec<Notice> {
        self.history.borrow().clone()
    }
}

impl NoticeSink for NoticeLog {
    fn show(&self, notice: Notice) {
        self.history.borrow_mut().push(notice.clone());
        *self.visible.borrow_mut() = Some(notice);
    }

    fn hide(&self) {
        self.visible.borrow_mut().take();
    }

    fn current(&self) -> Option<Notice> {
        self.visible.borrow().clone()
    }
}

/// 渲染在文档中的横幅
pub struct DomBanner {
    root: Handle,
    class_name: String,
    banner: RefCell<Option<Handle>>,
    visible: RefCell<Option<Notice>>,
}

impl DomBanner {
    /// `document` 为文档节点，横幅挂到 `<html>` 元素下（找不到时挂到文档节点）
    pub fn new(document: &Handle, class_name: &str) -> Self {
        let root = get_child_node_by_name(document, "html").unwrap_or_else(|| document.clone());
        Self {
            root,
            class_name: class_name.to_string(),
            banner: RefCell::new(None),
            visible: RefCell::new(None),
        }
    }

    /// 横幅节点（第一次展示前为 `None`）
    pub fn element(&self) -> Option<Handle> {
        self.banner.borrow().clone()
    }

    fn ensure_banner(&self) -> Handle {
        let mut slot = self.banner.borrow_mut();
        if let Some(banner) = slot.as_ref() {
            return banner.clone();
        }
        let banner = create_element_with_text("div", &self.class_name, "");
        append_child(&self.root, banner.clone());
        *slot = Some(banner.clone());
        banner
    }
}

impl NoticeSink for DomBanner {
    fn show(&self, notice: Notice) {
        let banner = self.ensure_banner();
        {
            let mut children = banner.children.borrow_mut();
            for child in children.drain(..) {
                child.parent.set(None);
            }
        }
        append_child(&banner, create_text_node(&notice.message));
        toggle_class(&banner, HIDDEN_CLASS, false);
        *self.visible.borrow_mut() = Some(notice);
    }

    fn hide(&self) {
        if let Some(banner) = self.banner.borrow().as_ref() {
            toggle_class(banner, HIDDEN_CLASS, true);
        }
        self.visible.borrow_mut().take();
    }

    fn current(&self) -> Option<Notice> {
        self.visible.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{find_nodes, has_class, html_to_dom, text_content};

    #[test]
    fn test_notice_from_error() {
        let activation = Notice::from_error(&TranslationError::ActivationRequired).unwrap();
        assert_eq!(activation.kind, NoticeKind::ActivationRequired);

        let failed =
            Notice::from_error(&TranslationError::EngineError("quota".to_string())).unwrap();
        assert_eq!(failed.message, "Translator error: quota");

        assert!(Notice::from_error(&TranslationError::StaleSegment("x".into())).is_none());
    }

    #[test]
    fn test_notice_log() {
        let log = NoticeLog::new();
        let notice = Notice::from_error(&TranslationError::ActivationRequired).unwrap();
        log.show(notice.clone());
        assert_eq!(log.current(), Some(notice));
        log.hide();
        assert!(log.current().is_none());
        assert_eq!(log.history().len(), 1);
    }

    #[test]
    fn test_dom_banner_toggles_visibility() {
        let dom = html_to_dom(b"<p>Hola</p>", "utf-8").unwrap();
        let banner = DomBanner::new(&dom.document, "ll-banner");
        assert!(banner.element().is_none());

        banner.show(Notice::from_error(&TranslationError::ActivationRequired).unwrap());
        banner.show(Notice::from_error(&TranslationError::EngineError("boom".into())).unwrap());

        let element = banner.element().unwrap();
        assert_eq!(find_nodes(&dom.document, &["html", "div"]).len(), 1);
        assert_eq!(text_content(&element), "Translator error: boom");
        assert!(!has_class(&element, HIDDEN_CLASS));

        banner.hide();
        assert!(has_class(&element, HIDDEN_CLASS));
        assert!(has_class(&element, "ll-banner"));
        assert!(banner.current().is_none());
    }
}
