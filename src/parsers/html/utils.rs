/// ASCII 空白字符
pub const WHITESPACES: &[char] = &[' ', '\t', '\n', '\x0c', '\r'];

/// 不参与定位与分段的元素（表单控件、脚本、样式等）
pub const SKIP_ELEMENTS: &[&str] = &[
    "input", "textarea", "select", "script", "style", "noscript", "svg",
];

/// 句子模式下作为分段边界的块级元素
pub const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "td", "th", "blockquote", "pre", "h1", "h2", "h3", "h4", "h5", "h6",
    "article", "section", "header", "footer", "main", "dd", "dt", "figcaption",
];

/// 检查是否为跳过的元素
pub fn is_skip_element(name: &str) -> bool {
    SKIP_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

/// 检查是否为块级元素
pub fn is_block_element(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

/// 检查文本是否全部由空白组成
pub fn is_blank(text: &str) -> bool {
    text.trim_matches(WHITESPACES).is_empty()
}
