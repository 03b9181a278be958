//! # 解析器模块
//!
//! 负责把 HTML 解析为可就地修改的 DOM 树，并提供覆盖层所需的节点操作。

pub mod html;

pub use html::{html_to_dom, serialize_document};
