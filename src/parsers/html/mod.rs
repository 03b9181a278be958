//! HTML解析和处理模块
//!
//! - `utils`: 基础常量（跳过元素、块级元素）
//! - `dom`: 基础DOM操作，包括就地文本替换所需的节点插入、摘除与合并
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;
pub mod utils;

pub use dom::{
    append_child, contains, create_element_with_text, create_text_node, detach, find_nodes,
    get_child_node_by_name, get_node_attr, get_node_name, get_parent_node, get_text, has_class,
    html_to_dom, insert_after, insert_before, is_attached, normalize,
    set_node_attr, set_text, text_content, toggle_class,
};
pub use serializer::{serialize_children, serialize_document};
pub use utils::{is_blank, is_block_element, is_skip_element, BLOCK_ELEMENTS, SKIP_ELEMENTS, WHITESPACES};
