//! # Tabbed Docs - 应用核心初始化模块
//!
//! 多标签富文本编辑器与 AI 写作助手的 Rust 宿主。
//! 本模块负责：
//! - 导出与界面框架无关的核心（文档、资料库、编辑面、助手会话）
//! - 在 `desktop` 特性下注册 Tauri 插件、commands 和全局状态，并启动事件循环
//!
//! ## 架构说明
//! 通过将核心逻辑放在 `lib.rs` 而非 `main.rs` 中，
//! Tauri 可以在桌面端（`main.rs`）和移动端入口之间共享此初始化代码。
//!
//! ## 模块结构
//! - `commands/` - Tauri command 处理函数（IPC 接口层，仅 `desktop` 特性）
//! - `models/` - 数据模型（对应前端 TypeScript 类型）
//! - `services/` - 核心业务逻辑
//! - `utils/` - 通用工具函数
//! - `error` - 错误类型

#[cfg(feature = "desktop")]
mod commands;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use std::sync::Arc;

    use tauri::Manager;

    use crate::commands;
    use crate::services::app_state::AppState;
    use crate::services::vault::KeyringVault;

    /// Tauri 应用启动函数
    ///
    /// 1. 注册所需的 Tauri 插件（对话框、文件定位、日志）
    /// 2. 注册所有自定义 Tauri commands
    /// 3. 在 `setup` 钩子中初始化日志和应用全局状态（AppState）
    /// 4. 生成应用上下文并启动主事件循环
    ///
    /// # Panics
    /// 如果 Tauri 应用启动失败（例如配置文件缺失或窗口创建失败），
    /// 将通过 `.expect()` 触发 panic 并输出错误信息。
    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        tauri::Builder::default()
            // 对话框插件：选择插入的图片、选择 Word 导出目录
            .plugin(tauri_plugin_dialog::init())
            // Opener 插件：导出完成后在系统文件管理器中定位文件
            .plugin(tauri_plugin_opener::init())
            .invoke_handler(tauri::generate_handler![
                // 文档标签
                commands::documents::list_documents,
                commands::documents::create_document,
                commands::documents::activate_document,
                commands::documents::close_document,
                commands::documents::toggle_pin,
                commands::documents::rename_document,
                commands::documents::update_content,
                // 编辑面与格式
                commands::editor::sync_surface,
                commands::editor::surface_input,
                commands::editor::report_selection,
                commands::editor::format_command,
                commands::editor::insert_link,
                commands::editor::insert_image,
                commands::editor::change_font_size,
                // 资料库
                commands::library::save_to_library,
                commands::library::list_library,
                commands::library::delete_library_item,
                commands::library::load_from_library,
                // AI 助手
                commands::assistant::assistant_state,
                commands::assistant::assistant_suggestions,
                commands::assistant::assistant_prompt,
                commands::assistant::assistant_reset,
                commands::assistant::assistant_replace,
                commands::assistant::assistant_insert,
                // API Key 与宿主代发请求
                commands::vault::get_secret,
                commands::vault::set_secret,
                commands::vault::remove_secret,
                commands::vault::generate,
                // 偏好设置
                commands::settings::read_settings,
                commands::settings::toggle_theme,
                commands::settings::select_model,
                commands::settings::model_catalog,
                commands::settings::key_prompt,
                // 导出
                commands::export::export_word,
                commands::export::export_word_file,
                commands::export::export_print,
            ])
            // `setup` 闭包：在应用窗口创建之前执行的初始化钩子
            .setup(|app| {
                // 调试构建输出 Info 级别日志，发布构建只保留警告和错误
                let level = if cfg!(debug_assertions) {
                    log::LevelFilter::Info
                } else {
                    log::LevelFilter::Warn
                };
                app.handle()
                    .plugin(tauri_plugin_log::Builder::default().level(level).build())?;

                let state = AppState::bootstrap(Arc::new(KeyringVault::new()))?;
                log::info!(
                    "应用状态初始化完成: {} 个打开的文档，执行路径 {:?}",
                    state.documents().len(),
                    state.mode()
                );
                app.manage(state);
                Ok(())
            })
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}
