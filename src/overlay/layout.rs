//! 等宽网格布局
//!
//! 没有渲染引擎时的参考命中测试实现：块级元素和 `<br>` 另起一行，每个字符占
//! 一格，行首的空白文本节点不占位置，`<pre>` 内的换行符换行。布局在每次查询时根据
//! 当前 DOM 重新计算，因此替换和还原之后的查询总能看到最新的树。

use markup5ever_rcdom::{Handle, NodeData};

use super::locator::{Caret, HitTester};
use crate::parsers::html::{get_parent_node, is_blank, is_block_element};

pub const DEFAULT_CELL_WIDTH: f64 = 8.0;
pub const DEFAULT_LINE_HEIGHT: f64 = 16.0;

/// 不产生任何可见文本的元素
const INVISIBLE_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

#[derive(Debug, Clone)]
struct Glyph {
    node: Handle,
    offset: usize,
}

/// 等宽布局
pub struct MonospaceLayout {
    document: Handle,
    cell_width: f64,
    line_height: f64,
}

impl MonospaceLayout {
    pub fn new(document: Handle) -> Self {
        Self::with_metrics(document, DEFAULT_CELL_WIDTH, DEFAULT_LINE_HEIGHT)
    }

    pub fn with_metrics(document: Handle, cell_width: f64, line_height: f64) -> Self {
        Self {
            document,
            cell_width,
            line_height,
        }
    }

    /// 某个字符格子中心的坐标
    pub fn point_of(&self, node: &Handle, offset: usize) -> Option<(f64, f64)> {
        self.rows().iter().enumerate().find_map(|(row, glyphs)| {
            glyphs
                .iter()
                .position(|g| std::rc::Rc::ptr_eq(&g.node, node) && g.offset == offset)
                .map(|col| self.center(row, col))
        })
    }

    /// 第一次出现 `needle` 的位置（首字符的格子中心）
    pub fn point_of_text(&self, needle: &str) -> Option<(f64, f64)> {
        for (row, glyphs) in self.rows().iter().enumerate() {
            for (col, glyph) in glyphs.iter().enumerate() {
                let matched = match &glyph.node.data {
                    NodeData::Text { contents } => contents
                        .borrow()
                        .get(glyph.offset..)
                        .is_some_and(|rest| rest.starts_with(needle)),
                    _ => false,
                };
                if matched {
                    return Some(self.center(row, col));
                }
            }
        }
        None
    }

    /// 布局后的文本，每行一段
    pub fn lines(&self) -> Vec<String> {
        self.rows()
            .iter()
            .map(|glyphs| {
                glyphs
                    .iter()
                    .filter_map(|g| match &g.node.data {
                        NodeData::Text { contents } => contents.borrow()[g.offset..].chars().next(),
                        _ => None,
                    })
                    .map(|c| if c.is_whitespace() { ' ' } else { c })
                    .collect()
            })
            .filter(|line: &String| !line.is_empty())
            .collect()
    }

    fn center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            (col as f64 + 0.5) * self.cell_width,
            (row as f64 + 0.5) * self.line_height,
        )
    }

    fn glyph_at(&self, x: f64, y: f64) -> Option<Glyph> {
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        if self.cell_width <= 0.0 || self.line_height <= 0.0 {
            return None;
        }
        let row = (y / self.line_height) as usize;
        let col = (x / self.cell_width) as usize;
        self.rows().get(row)?.get(col).cloned()
    }

    fn rows(&self) -> Vec<Vec<Glyph>> {
        let mut rows = vec![Vec::new()];
        lay_out(&self.document, false, &mut rows);
        if rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }
        rows
    }
}

fn break_row(rows: &mut Vec<Vec<Glyph>>) {
    if rows.last().map_or(true, |row| !row.is_empty()) {
        rows.push(Vec::new());
    }
}

fn lay_out(node: &Handle, preformatted: bool, rows: &mut Vec<Vec<Glyph>>) {
    match &node.data {
        NodeData::Document => {
            for child in node.children.borrow().iter() {
                lay_out(child, preformatted, rows);
            }
        }
        NodeData::Element { name, .. } => {
            let tag: &str = &name.local;
            if INVISIBLE_ELEMENTS.contains(&tag) {
                return;
            }
            if tag == "br" {
                rows.push(Vec::new());
                return;
            }

            let block = is_block_element(tag) || tag == "body";
            if block {
                break_row(rows);
            }
            let preformatted = preformatted || tag == "pre";
            for child in node.children.borrow().iter() {
                lay_out(child, preformatted, rows);
            }
            if block {
                break_row(rows);
            }
        }
        NodeData::Text { contents } => {
            let text = contents.borrow();
            let at_line_start = rows.last().map_or(true, |row| row.is_empty());
            if is_blank(&text) && !preformatted && at_line_start {
                return;
            }
            for (offset, c) in text.char_indices() {
                if c == '\n' && preformatted {
                    rows.push(Vec::new());
                    continue;
                }
                if let Some(row) = rows.last_mut() {
                    row.push(Glyph {
                        node: node.clone(),
                        offset,
                    });
                }
            }
        }
        _ => {}
    }
}

impl HitTester for MonospaceLayout {
    fn caret_at(&self, x: f64, y: f64) -> Option<Caret> {
        self.glyph_at(x, y).map(|glyph| Caret {
            node: glyph.node,
            offset: glyph.offset,
        })
    }

    fn element_at(&self, x: f64, y: f64) -> Option<Handle> {
        let glyph = self.glyph_at(x, y)?;
        get_parent_node(&glyph.node)
    }
}
