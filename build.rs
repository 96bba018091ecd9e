//! # Tabbed Docs - Tauri Cargo 构建脚本
//!
//! 仅在启用 `desktop` 特性时调用 `tauri_build::build()`，
//! 生成 Tauri 运行时所需的资源绑定代码、权限清单和 Windows 资源文件。
//! 纯核心构建（`cargo test`）不经过 Tauri 构建流程。

/// 构建脚本入口函数
///
/// 读取 `tauri.conf.json` 与 `capabilities/` 目录完成 Tauri 构建前处理。
fn main() {
    #[cfg(feature = "desktop")]
    tauri_build::build()
}
