//! # 文档标签 Tauri Commands
//!
//! 提供打开文档列表的管理 command：
//! - `list_documents` - 读取文档列表
//! - `create_document` - 新建空白文档
//! - `activate_document` - 切换激活文档
//! - `close_document` - 关闭文档（固定文档不可关闭）
//! - `toggle_pin` - 切换固定状态
//! - `rename_document` - 重命名
//! - `update_content` - 更新激活文档内容
//!
//! 所有变更类 command 返回变更后的完整列表，前端直接替换本地状态。
//! 激活文档变化后由前端调用 `sync_surface` 重新同步编辑面。

use tauri::State;

use crate::models::document::Document;
use crate::services::app_state::AppState;

/// 读取打开的文档列表（按标签顺序）
#[tauri::command]
pub async fn list_documents(state: State<'_, AppState>) -> Result<Vec<Document>, String> {
    Ok(state.documents())
}

/// 新建空白文档并激活
#[tauri::command]
pub async fn create_document(state: State<'_, AppState>) -> Result<Vec<Document>, String> {
    let doc = state.create_document();
    log::info!("新建文档: {} ({})", doc.title, doc.id);
    Ok(state.documents())
}

/// 激活指定文档
///
/// ID 不存在时列表保持不变。
#[tauri::command]
pub async fn activate_document(
    id: String,
    state: State<'_, AppState>,
) -> Result<Vec<Document>, String> {
    state.activate_document(&id);
    Ok(state.documents())
}

/// 关闭指定文档
///
/// # 参数
/// - `id` - 文档 ID
///
/// # 返回值
/// 关闭后的文档列表；文档已固定时原样返回
#[tauri::command]
pub async fn close_document(
    id: String,
    state: State<'_, AppState>,
) -> Result<Vec<Document>, String> {
    if !state.close_document(&id) {
        log::debug!("文档 {} 未关闭（已固定或不存在）", id);
    }
    Ok(state.documents())
}

#[tauri::command]
pub async fn toggle_pin(id: String, state: State<'_, AppState>) -> Result<Vec<Document>, String> {
    state.toggle_pin(&id);
    Ok(state.documents())
}

/// 重命名文档，空标题被忽略
#[tauri::command]
pub async fn rename_document(
    id: String,
    title: String,
    state: State<'_, AppState>,
) -> Result<Vec<Document>, String> {
    state.rename_document(&id, &title);
    Ok(state.documents())
}

/// 更新激活文档的内容
#[tauri::command]
pub async fn update_content(
    content: String,
    state: State<'_, AppState>,
) -> Result<Vec<Document>, String> {
    state.update_content(&content);
    Ok(state.documents())
}
