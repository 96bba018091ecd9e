//! # AI 助手数据模型
//!
//! 定义了助手会话的阶段（AssistantPhase）、对外快照（AssistantSnapshot）
//! 以及预置提示词目录（SuggestionGroup、Suggestion）。

use serde::{Deserialize, Serialize};

/// 助手会话阶段
///
/// ```text
/// Idle ──issue──▶ Pending ──chunk──▶ Streaming ──done──▶ Displaying
///                    │                   │
///                    └──────fail─────────┴──────────────▶ DisplayingError
/// 任意阶段 ──reset / 新提示词──▶ Idle / Pending
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum AssistantPhase {
    #[default]
    Idle,
    /// 已发出请求，尚未收到任何内容
    Pending,
    /// 流式请求已收到至少一个分块
    Streaming,
    Displaying,
    DisplayingError,
}

impl AssistantPhase {
    /// 请求仍在进行中（界面显示忙碌状态）
    pub fn is_busy(&self) -> bool {
        matches!(self, AssistantPhase::Pending | AssistantPhase::Streaming)
    }
}

/// 助手会话快照，通过 IPC 返回或通过 `assistant://update` 事件推送给前端
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantSnapshot {
    pub phase: AssistantPhase,
    pub prompt_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_text: Option<String>,
    pub response_text: String,
    pub is_streaming: bool,
    /// 是否展示 Replace / Insert 操作
    pub can_splice: bool,
}

/// 预置提示词
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    /// Font Awesome 图标名
    pub icon: String,
    /// 指令模板，选中后等同于手动输入该指令
    pub prompt: String,
}

/// 预置提示词分组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionGroup {
    pub title: String,
    pub items: Vec<Suggestion>,
}
