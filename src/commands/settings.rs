//! # 偏好设置 Tauri Commands
//!
//! - `read_settings` - 读取主题、字号和当前模型
//! - `toggle_theme` - 切换深色 / 浅色
//! - `select_model` - 选择模型
//! - `model_catalog` - 模型目录
//! - `key_prompt` - 当前模型对应的密钥输入提示

use tauri::State;

use crate::models::settings::{AppSettings, KeyPrompt, ModelCategory, Theme};
use crate::services::app_state::AppState;
use crate::services::catalog;

#[tauri::command]
pub async fn read_settings(state: State<'_, AppState>) -> Result<AppSettings, String> {
    Ok(state.settings())
}

#[tauri::command]
pub async fn toggle_theme(state: State<'_, AppState>) -> Result<Theme, String> {
    state
        .toggle_theme()
        .map_err(|e| format!("保存主题失败: {}", e))
}

/// 选择模型
///
/// 模型不在目录中时设置保持不变。
///
/// # 返回值
/// 选择后的完整设置
#[tauri::command]
pub async fn select_model(
    model_id: String,
    state: State<'_, AppState>,
) -> Result<AppSettings, String> {
    state
        .select_model(&model_id)
        .map_err(|e| format!("保存模型选择失败: {}", e))?;
    Ok(state.settings())
}

#[tauri::command]
pub async fn model_catalog() -> Result<Vec<ModelCategory>, String> {
    Ok(catalog::model_categories())
}

#[tauri::command]
pub async fn key_prompt(state: State<'_, AppState>) -> Result<KeyPrompt, String> {
    Ok(state.key_prompt())
}
