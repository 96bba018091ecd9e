//! # 路径工具函数
//!
//! 获取应用本地数据目录。所有持久化键值（文档列表、资料库、偏好设置）
//! 都以独立 JSON 文件的形式存放在此目录下。

use std::path::PathBuf;

/// 应用数据目录名
const APP_DIR_NAME: &str = "tabbed-docs";

/// 获取应用数据目录的绝对路径
///
/// 优先使用平台数据目录（`dirs::data_dir()`），
/// 无法确定时回退到用户主目录下的 `.tabbed-docs`。
///
/// # 示例
/// - Windows: `C:\Users\username\AppData\Roaming\tabbed-docs`
/// - macOS: `/Users/username/Library/Application Support/tabbed-docs`
/// - Linux: `/home/username/.local/share/tabbed-docs`
///
/// # 错误
/// 数据目录和主目录都无法确定时返回错误信息
pub fn get_data_dir() -> Result<PathBuf, String> {
    if let Some(data) = dirs::data_dir() {
        return Ok(data.join(APP_DIR_NAME));
    }
    let home = dirs::home_dir().ok_or_else(|| "无法获取用户主目录".to_string())?;
    Ok(home.join(format!(".{}", APP_DIR_NAME)))
}
