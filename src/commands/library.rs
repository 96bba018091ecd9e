//! # 资料库 Tauri Commands

use tauri::State;

use crate::models::document::{Document, LibraryItem};
use crate::services::app_state::AppState;

/// 保存激活文档到资料库
///
/// # 参数
/// - `name` - 保存名称，为空时使用文档标题
///
/// # 返回值
/// 实际使用的名称
#[tauri::command]
pub async fn save_to_library(name: String, state: State<'_, AppState>) -> Result<String, String> {
    state
        .save_to_library(&name)
        .map_err(|e| format!("保存到资料库失败: {}", e))
}

/// 列出资料库条目，按保存时间倒序
#[tauri::command]
pub async fn list_library(state: State<'_, AppState>) -> Result<Vec<LibraryItem>, String> {
    Ok(state.list_library())
}

#[tauri::command]
pub async fn delete_library_item(
    id: String,
    state: State<'_, AppState>,
) -> Result<Vec<LibraryItem>, String> {
    state
        .delete_library_item(&id)
        .map_err(|e| format!("删除资料库条目失败: {}", e))?;
    Ok(state.list_library())
}

/// 打开资料库条目
///
/// 同 ID 文档已打开时激活它，否则作为新文档打开。
///
/// # 返回值
/// 打开后的文档列表
#[tauri::command]
pub async fn load_from_library(
    id: String,
    state: State<'_, AppState>,
) -> Result<Vec<Document>, String> {
    state.load_from_library(&id).map_err(|e| e.to_string())?;
    Ok(state.documents())
}
