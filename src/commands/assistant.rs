//! # AI 助手 Tauri Commands
//!
//! - `assistant_state` - 当前会话快照
//! - `assistant_suggestions` - 预置提示词目录
//! - `assistant_prompt` - 发出提示词，请求在后台任务中执行
//! - `assistant_reset` - 重置会话
//! - `assistant_replace` / `assistant_insert` - 把回复写回文档
//!
//! 请求过程中的每次状态变化通过 `assistant://update` 事件推送 `AssistantSnapshot`。

use tauri::{AppHandle, Emitter, Manager, State};

use crate::models::assistant::{AssistantSnapshot, SuggestionGroup};
use crate::services::app_state::{AppState, PromptStatus};
use crate::services::assistant::{IssueOutcome, PromptSource};
use crate::services::catalog;
use crate::services::surface::SurfaceChange;

/// 会话快照推送事件名
pub const ASSISTANT_EVENT: &str = "assistant://update";

fn emit_snapshot(app: &AppHandle, snapshot: AssistantSnapshot) {
    if let Err(e) = app.emit(ASSISTANT_EVENT, snapshot) {
        log::warn!("推送助手状态失败: {}", e);
    }
}

#[tauri::command]
pub async fn assistant_state(state: State<'_, AppState>) -> Result<AssistantSnapshot, String> {
    Ok(state.assistant_snapshot())
}

#[tauri::command]
pub async fn assistant_suggestions() -> Result<Vec<SuggestionGroup>, String> {
    Ok(catalog::suggestion_groups())
}

/// 发出提示词
///
/// 会话立即进入等待状态并推送一次快照，网络请求在后台任务中执行。
///
/// # 参数
/// - `prompt` - 指令文本
/// - `source` - 来源（手动输入 / 预置提示词），缺省为手动输入
///
/// # 返回值
/// - `requireApiKey` - 未配置 API Key，前端应打开密钥输入界面
/// - `ignored` - 空指令，或忙碌时点击了预置提示词
/// - `started` - 已开始，附带请求 ID
#[tauri::command]
pub async fn assistant_prompt(
    app: AppHandle,
    prompt: String,
    source: Option<PromptSource>,
    state: State<'_, AppState>,
) -> Result<PromptStatus, String> {
    let outcome = state.issue_prompt(&prompt, source.unwrap_or_default());
    let status = PromptStatus::from_outcome(&outcome);

    if let IssueOutcome::Started(request) = outcome {
        emit_snapshot(&app, state.assistant_snapshot());
        let handle = app.clone();
        tauri::async_runtime::spawn(async move {
            let state = handle.state::<AppState>();
            state
                .run_prompt(request, |snapshot| emit_snapshot(&handle, snapshot))
                .await;
        });
    }

    Ok(status)
}

#[tauri::command]
pub async fn assistant_reset(state: State<'_, AppState>) -> Result<AssistantSnapshot, String> {
    Ok(state.reset_assistant())
}

/// 用回复替换选区
///
/// # 返回值
/// 替换后的编辑面标记，前端需重新渲染
///
/// # 错误
/// 没有可写回的回复或选区已失效时返回错误
#[tauri::command]
pub async fn assistant_replace(state: State<'_, AppState>) -> Result<SurfaceChange, String> {
    state.apply_replace().map_err(|e| format!("替换失败: {}", e))
}

/// 在选区后插入回复
#[tauri::command]
pub async fn assistant_insert(state: State<'_, AppState>) -> Result<SurfaceChange, String> {
    state.apply_insert().map_err(|e| format!("插入失败: {}", e))
}
