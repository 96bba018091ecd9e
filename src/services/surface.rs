//! # 富文本编辑面服务
//!
//! 持有编辑区域当前的规范序列化标记，负责与文档内容双向同步并上报选区。
//!
//! ## 同步方向
//! - 外部变更（切换文档、助手拼接）：内容与当前序列化不同时覆盖编辑面，
//!   返回 `ChangeSource::External`，前端据此重新渲染
//! - 用户输入：前端序列化后的标记写回，返回 `ChangeSource::User`，
//!   只有这一类变更需要写回文档存储，前端不再重新渲染，避免回环
//!
//! ## 选区
//! 选区状态在每次 pointer-up / key-up 时重新计算，不做持久化。
//! 助手的替换 / 插入操作依赖上报时附带的字节区间。
//! 没有选中文本时仍记录折叠的光标位置，插入操作以它为准。

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::selection::{SelectionEvent, SelectionRange, SelectionState};
use crate::utils::html;

/// 仅含一个换行的"视觉空"标记
const EMPTY_MARKUPS: [&str; 2] = ["<br>", "<p><br></p>"];

/// 变更来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeSource {
    External,
    User,
}

/// 编辑面变更结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceChange {
    pub source: ChangeSource,
    pub html: String,
}

/// 富文本编辑面
#[derive(Debug, Default)]
pub struct RichTextSurface {
    html: String,
    selection: SelectionState,
    range: Option<SelectionRange>,
}

impl RichTextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// 编辑面当前的序列化标记
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn range(&self) -> Option<SelectionRange> {
        self.range
    }

    /// 外部内容同步
    ///
    /// # 返回值
    /// - `Some(change)` - 内容不同，编辑面已被覆盖，需要重新渲染
    /// - `None` - 内容一致，无需处理
    pub fn sync_external(&mut self, content: &str) -> Option<SurfaceChange> {
        if self.html == content {
            return None;
        }
        self.html = content.to_string();
        // 旧选区的区间已经不属于新内容
        self.clear_selection();
        Some(SurfaceChange {
            source: ChangeSource::External,
            html: self.html.clone(),
        })
    }

    /// 处理用户输入
    ///
    /// # 参数
    /// - `html` - 编辑区域的 innerHTML
    /// - `inner_text` - 编辑区域的 innerText
    ///
    /// # 返回值
    /// 规范化后的标记：视觉上为空时返回空字符串
    pub fn handle_input(&mut self, html: &str, inner_text: &str) -> SurfaceChange {
        self.html = normalize_markup(html, inner_text);
        SurfaceChange {
            source: ChangeSource::User,
            html: self.html.clone(),
        }
    }

    /// 根据前端选区事件重新计算选区状态
    ///
    /// 文本裁剪后为空，或选区不在编辑区域内时，上报空选区。
    /// 前一种情况下区间折叠到末尾，作为光标位置保留。
    /// 包围盒取最后一个子区间，没有子区间时退回整体包围盒。
    pub fn report_selection(&mut self, event: SelectionEvent) -> SelectionState {
        if !event.within_surface {
            self.clear_selection();
            return self.selection.clone();
        }
        let text = event.text.trim();
        if text.is_empty() {
            self.selection = SelectionState::empty();
            self.range = event.range.map(SelectionRange::collapse_to_end);
            return self.selection.clone();
        }

        let rect = event.client_rects.last().copied().or(event.bounding_rect);
        self.selection = SelectionState {
            text: text.to_string(),
            rect,
        };
        self.range = event.range;
        self.selection.clone()
    }

    /// 清空选区和光标位置
    pub fn clear_selection(&mut self) {
        self.selection = SelectionState::empty();
        self.range = None;
    }

    /// 用文本替换当前选区
    ///
    /// 文本按文本节点转义后放在原选区位置。完成后选中文本清空，
    /// 光标停在替换内容之后。
    ///
    /// # 错误
    /// 没有选区区间、区间已折叠或越界时返回 `AppError::Validation`
    pub fn replace_selection(&mut self, text: &str) -> AppResult<String> {
        let range = self
            .range
            .filter(|range| !range.is_collapsed())
            .ok_or_else(|| AppError::Validation("当前没有可替换的选区".to_string()))?;
        self.check_range(range)?;

        let escaped = html::escape_text(text);
        self.html.replace_range(range.start..range.end, &escaped);
        self.place_caret(range.start + escaped.len());
        Ok(self.html.clone())
    }

    /// 在选区（或光标）之后插入一个新的段落块，不删除原有内容
    ///
    /// 没有记录任何位置时追加到末尾。完成后光标停在新段落之后。
    ///
    /// # 错误
    /// 区间越界时返回 `AppError::Validation`
    pub fn insert_after_selection(&mut self, text: &str) -> AppResult<String> {
        let at = match self.range {
            Some(range) => {
                self.check_range(range)?;
                range.end
            }
            None => self.html.len(),
        };

        let block = format!("<div><p>{}</p></div>", html::escape_text(text));
        self.html.insert_str(at, &block);
        self.place_caret(at + block.len());
        Ok(self.html.clone())
    }

    fn place_caret(&mut self, at: usize) {
        self.selection = SelectionState::empty();
        self.range = Some(SelectionRange::caret(at));
    }

    fn check_range(&self, range: SelectionRange) -> AppResult<()> {
        let valid = range.start <= range.end
            && range.end <= self.html.len()
            && self.html.is_char_boundary(range.start)
            && self.html.is_char_boundary(range.end);
        if valid {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "选区区间 [{}, {}) 超出当前内容",
                range.start, range.end
            )))
        }
    }
}

/// 视觉为空的标记规范化为空字符串
pub fn normalize_markup(html: &str, inner_text: &str) -> String {
    if inner_text.trim().is_empty() && EMPTY_MARKUPS.contains(&html) {
        String::new()
    } else {
        html.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::selection::Rect;

    fn rect(x: f64) -> Rect {
        Rect { x, y: 0.0, width: 10.0, height: 10.0 }
    }

    fn select(surface: &mut RichTextSurface, text: &str, start: usize, end: usize) {
        surface.report_selection(SelectionEvent {
            text: text.to_string(),
            within_surface: true,
            client_rects: vec![rect(1.0)],
            bounding_rect: None,
            range: Some(SelectionRange { start, end }),
        });
    }

    #[test]
    fn test_sync_external_only_when_different() {
        let mut surface = RichTextSurface::new();
        let change = surface.sync_external("<p>a</p>").unwrap();
        assert_eq!(change.source, ChangeSource::External);
        assert_eq!(change.html, "<p>a</p>");
        assert!(surface.sync_external("<p>a</p>").is_none());
    }

    #[test]
    fn test_input_normalizes_visually_empty_markup() {
        let mut surface = RichTextSurface::new();
        assert_eq!(surface.handle_input("<br>", "\n").html, "");
        assert_eq!(surface.handle_input("<p><br></p>", "").html, "");
        assert_eq!(surface.handle_input("<p>x</p>", "x").html, "<p>x</p>");
        let change = surface.handle_input("<p><br></p><p><br></p>", "");
        assert_eq!(change.source, ChangeSource::User);
        assert_eq!(change.html, "<p><br></p><p><br></p>");
    }

    #[test]
    fn test_report_selection_trims_and_takes_last_rect() {
        let mut surface = RichTextSurface::new();
        let state = surface.report_selection(SelectionEvent {
            text: "  hello \n".into(),
            within_surface: true,
            client_rects: vec![rect(1.0), rect(2.0)],
            bounding_rect: Some(rect(9.0)),
            range: None,
        });
        assert_eq!(state.text, "hello");
        assert_eq!(state.rect, Some(rect(2.0)));

        let state = surface.report_selection(SelectionEvent {
            text: "hello".into(),
            within_surface: true,
            client_rects: vec![],
            bounding_rect: Some(rect(9.0)),
            range: None,
        });
        assert_eq!(state.rect, Some(rect(9.0)));
    }

    #[test]
    fn test_report_selection_outside_or_blank_is_empty() {
        let mut surface = RichTextSurface::new();
        select(&mut surface, "hello", 0, 0);
        let state = surface.report_selection(SelectionEvent {
            text: "hello".into(),
            within_surface: false,
            ..Default::default()
        });
        assert_eq!(state, SelectionState::empty());
        assert!(surface.range().is_none());

        let state = surface.report_selection(SelectionEvent {
            text: "   ".into(),
            within_surface: true,
            ..Default::default()
        });
        assert!(!state.has_text());
    }

    #[test]
    fn test_replace_selection_in_place() {
        let mut surface = RichTextSurface::new();
        surface.sync_external("<p>foo baz</p>");
        select(&mut surface, "foo", 3, 6);

        let html = surface.replace_selection("bar").unwrap();
        assert_eq!(html, "<p>bar baz</p>");
        assert!(!surface.selection().has_text());
    }

    #[test]
    fn test_insert_keeps_selected_text() {
        let mut surface = RichTextSurface::new();
        surface.sync_external("<p>foo baz</p>");
        select(&mut surface, "foo", 3, 6);

        let html = surface.insert_after_selection("bar").unwrap();
        assert_eq!(html, "<p>foo<div><p>bar</p></div> baz</p>");
        assert!(html.contains("foo"));
    }

    #[test]
    fn test_splice_escapes_markup() {
        let mut surface = RichTextSurface::new();
        surface.sync_external("<p>foo</p>");
        select(&mut surface, "foo", 3, 6);
        let html = surface.replace_selection("<b>&</b>").unwrap();
        assert_eq!(html, "<p>&lt;b&gt;&amp;&lt;/b&gt;</p>");
    }

    #[test]
    fn test_replace_without_range_fails() {
        let mut surface = RichTextSurface::new();
        surface.sync_external("<p>foo</p>");
        assert!(matches!(surface.replace_selection("bar"), Err(AppError::Validation(_))));

        select(&mut surface, "foo", 3, 99);
        assert!(matches!(surface.replace_selection("bar"), Err(AppError::Validation(_))));
        assert_eq!(surface.html(), "<p>foo</p>");
    }

    #[test]
    fn test_insert_at_collapsed_caret() {
        let mut surface = RichTextSurface::new();
        surface.sync_external("<p>foo baz</p>");
        let state = surface.report_selection(SelectionEvent {
            text: String::new(),
            within_surface: true,
            range: Some(SelectionRange::caret(6)),
            ..Default::default()
        });
        assert!(!state.has_text());
        assert_eq!(surface.range(), Some(SelectionRange::caret(6)));

        let html = surface.insert_after_selection("bar").unwrap();
        assert_eq!(html, "<p>foo<div><p>bar</p></div> baz</p>");
        assert!(matches!(surface.replace_selection("x"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_insert_after_replace_follows_replaced_text() {
        let mut surface = RichTextSurface::new();
        surface.sync_external("<p>foo baz</p>");
        select(&mut surface, "foo", 3, 6);

        surface.replace_selection("a&b").unwrap();
        assert_eq!(surface.range(), Some(SelectionRange::caret(10)));
        let html = surface.insert_after_selection("bar").unwrap();
        assert_eq!(html, "<p>a&amp;b<div><p>bar</p></div> baz</p>");
    }

    #[test]
    fn test_blank_selection_collapses_to_end() {
        let mut surface = RichTextSurface::new();
        surface.sync_external("<p>foo  baz</p>");
        surface.report_selection(SelectionEvent {
            text: " ".into(),
            within_surface: true,
            range: Some(SelectionRange { start: 6, end: 7 }),
            ..Default::default()
        });
        assert_eq!(surface.range(), Some(SelectionRange::caret(7)));
    }

    #[test]
    fn test_external_sync_drops_selection() {
        let mut surface = RichTextSurface::new();
        surface.sync_external("<p>foo</p>");
        select(&mut surface, "foo", 3, 6);
        surface.sync_external("<p>other</p>");
        assert!(surface.range().is_none());
        assert!(!surface.selection().has_text());
    }
}
