//! # 标识符与时间戳工具

/// 生成 9 位短随机 ID
///
/// 取 UUID v4 简写形式（32 位十六进制）的前 9 位，
/// 作为文档的不透明标识符。
pub fn generate_id() -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    simple[..9].to_string()
}

/// 当前 Unix 毫秒时间戳
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
