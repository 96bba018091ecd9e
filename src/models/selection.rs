//! # 选区数据模型
//!
//! 选区状态是瞬态值对象：每次鼠标/键盘抬起事件时重新计算，
//! 由富文本编辑面持有，作为参数传给 AI 助手会话，不做持久化。

use serde::{Deserialize, Serialize};

/// 选区的包围盒（视口坐标，单位 px）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 选区在序列化标记中的字节区间 `[start, end)`
///
/// 由前端在报告选区时一并给出，用于把助手结果拼接回文档。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    /// 光标位置（起止相同的区间）
    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// 折叠到区间末尾
    pub fn collapse_to_end(self) -> Self {
        Self::caret(self.end)
    }
}

/// 选区状态
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface SelectionState {
///   text: string;
///   rect: DOMRect | null;
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    /// 去除首尾空白后的选中文本，空字符串表示无选区
    pub text: String,

    /// 最后一个选中子区间的包围盒
    pub rect: Option<Rect>,
}

impl SelectionState {
    /// 空选区
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// 前端在 pointer-up / key-up 时上报的原始选区事件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEvent {
    /// `Selection.toString()` 的原始结果（未裁剪）
    pub text: String,

    /// 选区公共祖先节点是否位于编辑区域内
    pub within_surface: bool,

    /// `Range.getClientRects()` 的结果
    #[serde(default)]
    pub client_rects: Vec<Rect>,

    /// `Range.getBoundingClientRect()`，子区间列表为空时使用
    #[serde(default)]
    pub bounding_rect: Option<Rect>,

    /// 选区在序列化标记中的位置
    #[serde(default)]
    pub range: Option<SelectionRange>,
}
