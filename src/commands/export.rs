//! # 导出 Tauri Commands
//!
//! - `export_word` - 生成 Word 兼容文档内容，由前端触发下载
//! - `export_word_file` - 写入用户选择的目录，并在文件管理器中定位
//! - `export_print` - 生成打印用 HTML 页面

use std::path::PathBuf;

use tauri::State;

use crate::services::app_state::AppState;
use crate::services::export::WordExport;

#[tauri::command]
pub async fn export_word(state: State<'_, AppState>) -> Result<WordExport, String> {
    state.export_word().map_err(|e| format!("导出失败: {}", e))
}

/// 导出 Word 文档到目录
///
/// # 参数
/// - `dir` - 保存对话框选中的目录
///
/// # 返回值
/// 写入的文件路径
#[tauri::command]
pub async fn export_word_file(dir: String, state: State<'_, AppState>) -> Result<String, String> {
    let path = state
        .export_word_to(&PathBuf::from(&dir))
        .await
        .map_err(|e| format!("导出失败: {}", e))?;

    if let Err(e) = tauri_plugin_opener::reveal_item_in_dir(&path) {
        log::warn!("在文件管理器中定位导出文件失败: {}", e);
    }
    Ok(path.to_string_lossy().to_string())
}

#[tauri::command]
pub async fn export_print(state: State<'_, AppState>) -> Result<String, String> {
    state.export_print().map_err(|e| format!("导出失败: {}", e))
}
