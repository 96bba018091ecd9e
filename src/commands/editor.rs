//! # 编辑区域 Tauri Commands
//!
//! 编辑面同步、选区上报和工具栏格式命令：
//! - `sync_surface` / `surface_input` / `report_selection` - 编辑面双向同步
//! - `format_command` / `insert_link` / `insert_image` - 返回需要 web view 依次执行的原生调用
//! - `change_font_size` - 调整基准字号，返回派生字号

use std::path::PathBuf;

use tauri::State;

use crate::models::selection::{SelectionEvent, SelectionState};
use crate::services::app_state::AppState;
use crate::services::formatting::{
    self, CommandDispatcher, FontSizes, FormatCommand, InvocationLog, LinkRequest,
    NativeInvocation,
};
use crate::services::surface::SurfaceChange;

/// 把激活文档的内容同步到编辑面
///
/// # 返回值
/// 需要重新渲染时返回新的标记，否则返回 null
#[tauri::command]
pub async fn sync_surface(state: State<'_, AppState>) -> Result<Option<SurfaceChange>, String> {
    Ok(state.sync_surface())
}

/// 编辑区域的 input 事件
///
/// # 参数
/// - `html` - 编辑区域的 innerHTML
/// - `inner_text` - 编辑区域的 innerText
#[tauri::command]
pub async fn surface_input(
    html: String,
    inner_text: String,
    state: State<'_, AppState>,
) -> Result<SurfaceChange, String> {
    Ok(state.surface_input(&html, &inner_text))
}

/// pointer-up / key-up 时上报选区
#[tauri::command]
pub async fn report_selection(
    event: SelectionEvent,
    state: State<'_, AppState>,
) -> Result<SelectionState, String> {
    Ok(state.report_selection(event))
}

/// 执行工具栏格式命令
///
/// # 参数
/// - `command` - 格式命令
/// - `focused` - 编辑区域当前是否持有焦点
#[tauri::command]
pub async fn format_command(
    command: FormatCommand,
    focused: bool,
) -> Result<Vec<NativeInvocation>, String> {
    let mut surface = InvocationLog::new(focused);
    CommandDispatcher::dispatch(&mut surface, &command);
    Ok(surface.into_invocations())
}

/// 插入链接，URL 为空时返回空列表
#[tauri::command]
pub async fn insert_link(
    request: LinkRequest,
    focused: bool,
) -> Result<Vec<NativeInvocation>, String> {
    let mut surface = InvocationLog::new(focused);
    CommandDispatcher::insert_link(&mut surface, &request);
    Ok(surface.into_invocations())
}

/// 读取本地图片并插入
///
/// # 参数
/// - `path` - 对话框选中的图片文件路径
///
/// # 错误
/// 文件不是图片或读取失败时返回错误
#[tauri::command]
pub async fn insert_image(path: String, focused: bool) -> Result<Vec<NativeInvocation>, String> {
    let data_uri = formatting::read_image_data_uri(&PathBuf::from(&path))
        .await
        .map_err(|e| format!("插入图片失败: {}", e))?;
    let mut surface = InvocationLog::new(focused);
    CommandDispatcher::insert_image(&mut surface, &data_uri);
    Ok(surface.into_invocations())
}

/// 调整基准字号
///
/// # 参数
/// - `delta` - 增量（工具栏 A- / A+ 为 ∓2）
#[tauri::command]
pub async fn change_font_size(delta: i32, state: State<'_, AppState>) -> Result<FontSizes, String> {
    state
        .change_font_size(delta)
        .map_err(|e| format!("保存字号失败: {}", e))
}
