//! # API Key 保管 Tauri Commands
//!
//! web view 与宿主进程之间关于密钥的全部接口：
//! - `get_secret` - 读取已保存的 API Key，不存在时返回 null
//! - `set_secret` - 保存 API Key 到系统钥匙串
//! - `remove_secret` - 删除 API Key（幂等）
//! - `generate` - 由宿主进程代为发出单次模型请求
//!
//! 钥匙串调用是阻塞的系统调用，放到 blocking 线程池执行。
//! 错误消息原样返回，由前端在密钥输入表单中内联展示。

use tauri::{AppHandle, Manager, State};

use crate::services::app_state::AppState;
use crate::services::assistant::TextGenerator;

#[tauri::command]
pub async fn get_secret(app: AppHandle) -> Result<Option<String>, String> {
    tauri::async_runtime::spawn_blocking(move || app.state::<AppState>().load_api_key())
        .await
        .map_err(|e| format!("读取 API Key 失败: {}", e))?
        .map_err(|e| e.to_string())
}

/// 保存 API Key
///
/// # 错误
/// 密钥为空或系统不支持安全存储时返回错误
#[tauri::command]
pub async fn set_secret(app: AppHandle, secret: String) -> Result<(), String> {
    tauri::async_runtime::spawn_blocking(move || app.state::<AppState>().set_api_key(&secret))
        .await
        .map_err(|e| format!("保存 API Key 失败: {}", e))?
        .map_err(|e| e.to_string())
}

/// 删除 API Key，同时清空选区并放弃进行中的请求
#[tauri::command]
pub async fn remove_secret(app: AppHandle) -> Result<(), String> {
    tauri::async_runtime::spawn_blocking(move || app.state::<AppState>().remove_api_key())
        .await
        .map_err(|e| format!("删除 API Key 失败: {}", e))?
        .map_err(|e| e.to_string())
}

/// 单次生成
///
/// # 参数
/// - `secret` - API Key
/// - `prompt` - 完整请求文本
#[tauri::command]
pub async fn generate(
    secret: String,
    prompt: String,
    state: State<'_, AppState>,
) -> Result<String, String> {
    state
        .provider()
        .generate(&secret, &prompt)
        .await
        .map_err(|e| e.to_string())
}
