use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, StrTendril, TendrilSink};
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

use super::utils::WHITESPACES;

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> io::Result<RcDom> {
    let s = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => encoding.decode(data).0.into_owned(),
        None => String::from_utf8_lossy(data).into_owned(),
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let Some((&node_name, rest)) = node_names.split_first() else {
        return Vec::new();
    };

    let mut found_nodes = Vec::new();
    let matches = get_node_name(node).is_some_and(|name| name == node_name);

    if matches && rest.is_empty() {
        found_nodes.push(node.clone());
    }

    let next_names = if matches && !rest.is_empty() { rest } else { node_names };
    for child_node in node.children.borrow().iter() {
        found_nodes.append(&mut find_nodes(child_node, next_names));
    }

    found_nodes
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    children
        .iter()
        .find(|child| get_node_name(child) == Some(node_name))
        .cloned()
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点
///
/// rcdom 把父指针存放在 `Cell` 中，读取时必须放回原值。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 设置节点属性，`None` 表示删除该属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs_mut = attrs.borrow_mut();
        let existing = attrs_mut
            .iter()
            .position(|attr| &*attr.name.local == attr_name);

        match (existing, attr_value) {
            (Some(i), Some(value)) => {
                attrs_mut[i].value.clear();
                attrs_mut[i].value.push_slice(&value);
            }
            (Some(i), None) => {
                attrs_mut.remove(i);
            }
            (None, Some(value)) => attrs_mut.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                value: format_tendril!("{}", value),
            }),
            (None, None) => {}
        }
    }
}

/// 检查元素的 class 属性是否包含指定类名
pub fn has_class(node: &Handle, class_name: &str) -> bool {
    get_node_attr(node, "class")
        .is_some_and(|classes| classes.split(WHITESPACES).any(|c| c == class_name))
}

/// 添加或移除 class 中的一个类名
pub fn toggle_class(node: &Handle, class_name: &str, present: bool) {
    let current = get_node_attr(node, "class").unwrap_or_default();
    let mut classes: Vec<&str> = current
        .split(WHITESPACES)
        .filter(|c| !c.is_empty() && *c != class_name)
        .collect();
    if present {
        classes.push(class_name);
    }
    set_node_attr(node, "class", Some(classes.join(" ")));
}

/// 读取文本节点内容，非文本节点返回 `None`
pub fn get_text(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// 覆盖文本节点内容
pub fn set_text(node: &Handle, text: &str) {
    if let NodeData::Text { contents } = &node.data {
        *contents.borrow_mut() = StrTendril::from_slice(text);
    }
}

/// 子树内全部文本按文档顺序拼接
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}

/// 创建游离的文本节点
pub fn create_text_node(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    })
}

/// 创建带 class 和文本子节点的游离元素
pub fn create_element_with_text(tag: &str, class_name: &str, text: &str) -> Handle {
    let factory = RcDom::default();
    let element = create_element(
        &factory,
        QualName::new(None, ns!(html), LocalName::from(tag)),
        vec![Attribute {
            name: QualName::new(None, ns!(), LocalName::from("class")),
            value: format_tendril!("{}", class_name),
        }],
    );
    append_child(&element, create_text_node(text));
    element
}

/// 把节点追加为最后一个子节点
pub fn append_child(parent: &Handle, child: Handle) {
    detach(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// 把 `new_node` 插到 `reference` 之前；`reference` 没有父节点时返回 false
pub fn insert_before(reference: &Handle, new_node: Handle) -> bool {
    insert_relative(reference, new_node, 0)
}

/// 把 `new_node` 插到 `reference` 之后；`reference` 没有父节点时返回 false
pub fn insert_after(reference: &Handle, new_node: Handle) -> bool {
    insert_relative(reference, new_node, 1)
}

fn insert_relative(reference: &Handle, new_node: Handle, shift: usize) -> bool {
    let Some(parent) = get_parent_node(reference) else {
        return false;
    };
    detach(&new_node);

    let mut children = parent.children.borrow_mut();
    let Some(index) = children.iter().position(|c| Rc::ptr_eq(c, reference)) else {
        return false;
    };
    new_node.parent.set(Some(Rc::downgrade(&parent)));
    children.insert(index + shift, new_node);
    true
}

/// 从父节点移除；已经游离时返回 false
pub fn detach(node: &Handle) -> bool {
    let Some(parent) = get_parent_node(node) else {
        return false;
    };
    node.parent.set(None);
    let mut children = parent.children.borrow_mut();
    match children.iter().position(|c| Rc::ptr_eq(c, node)) {
        Some(index) => {
            children.remove(index);
            true
        }
        None => false,
    }
}

/// 节点是否挂在某个父节点下
pub fn is_attached(node: &Handle) -> bool {
    get_parent_node(node).is_some()
}

/// `ancestor` 是否为 `node` 本身或其祖先
pub fn contains(ancestor: &Handle, node: &Handle) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if Rc::ptr_eq(&n, ancestor) {
            return true;
        }
        current = get_parent_node(&n);
    }
    false
}

/// 合并相邻文本节点并移除空文本节点（等价于 DOM 的 `normalize()`）
pub fn normalize(node: &Handle) {
    let children: Vec<Handle> = node.children.borrow().clone();
    let mut kept: Vec<Handle> = Vec::with_capacity(children.len());

    for child in children {
        if let NodeData::Text { contents } = &child.data {
            if contents.borrow().is_empty() {
                child.parent.set(None);
                continue;
            }
            if let Some(NodeData::Text { contents: previous }) = kept.last().map(|p| &p.data) {
                previous.borrow_mut().push_tendril(&contents.borrow());
                child.parent.set(None);
                continue;
            }
        } else {
            normalize(&child);
        }
        kept.push(child);
    }

    *node.children.borrow_mut() = kept;
}
