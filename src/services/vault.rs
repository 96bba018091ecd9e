//! # API Key 保管服务
//!
//! 为助手提供 API Key 的读取、保存和删除。
//!
//! ## 实现
//! - `MemoryVault` - 进程内存保管，重启后丢失（非宿主环境）
//! - `KeyringVault` - 系统钥匙串（feature `desktop`）：
//!   macOS Keychain / Windows Credential Manager / Linux Secret Service
//!
//! ## 契约
//! - `get` 找不到时返回 `Ok(None)`，不视为错误
//! - `set` 去除空白后为空、或宿主没有安全存储能力时返回 `AppError::Auth`
//! - `remove` 幂等
//!
//! 密钥值不写入日志。

use std::sync::RwLock;

use crate::error::{AppError, AppResult};

const EMPTY_KEY_MESSAGE: &str = "API key cannot be empty.";

/// 密钥保管抽象
pub trait KeyVault: Send + Sync {
    fn get(&self) -> AppResult<Option<String>>;

    fn set(&self, secret: &str) -> AppResult<()>;

    fn remove(&self) -> AppResult<()>;

    /// 是否跨进程重启保留
    fn is_persistent(&self) -> bool;
}

/// 校验并裁剪待保存的密钥
fn normalize_secret(secret: &str) -> AppResult<&str> {
    let secret = secret.trim();
    if secret.is_empty() {
        return Err(AppError::Auth(EMPTY_KEY_MESSAGE.to_string()));
    }
    Ok(secret)
}

// ============ 内存保管 ============

/// 进程内存保管
#[derive(Default)]
pub struct MemoryVault {
    secret: RwLock<Option<String>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyVault for MemoryVault {
    fn get(&self) -> AppResult<Option<String>> {
        let secret = self.secret.read().unwrap_or_else(|e| e.into_inner());
        Ok(secret.clone())
    }

    fn set(&self, secret: &str) -> AppResult<()> {
        let secret = normalize_secret(secret)?;
        *self.secret.write().unwrap_or_else(|e| e.into_inner()) = Some(secret.to_string());
        Ok(())
    }

    fn remove(&self) -> AppResult<()> {
        *self.secret.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

// ============ 系统钥匙串 ============

#[cfg(feature = "desktop")]
pub use keyring_vault::KeyringVault;

#[cfg(feature = "desktop")]
mod keyring_vault {
    use super::{KeyVault, normalize_secret};
    use crate::error::{AppError, AppResult};

    const SERVICE_NAME: &str = "tabbed-docs";
    const ACCOUNT: &str = "gemini-api-key";
    const UNAVAILABLE_MESSAGE: &str = "Secure encryption is not available on this device.";

    /// 系统钥匙串保管
    #[derive(Default)]
    pub struct KeyringVault;

    impl KeyringVault {
        pub fn new() -> Self {
            Self
        }

        fn entry(&self) -> AppResult<keyring::Entry> {
            keyring::Entry::new(SERVICE_NAME, ACCOUNT).map_err(|e| {
                log::warn!("创建钥匙串条目失败: {}", e);
                AppError::Auth(UNAVAILABLE_MESSAGE.to_string())
            })
        }
    }

    /// 钥匙串错误转换：存储不可用时返回统一提示
    fn map_keyring_error(action: &str, error: keyring::Error) -> AppError {
        log::warn!("钥匙串{}失败: {}", action, error);
        match error {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                AppError::Auth(UNAVAILABLE_MESSAGE.to_string())
            }
            other => AppError::Auth(other.to_string()),
        }
    }

    impl KeyVault for KeyringVault {
        fn get(&self) -> AppResult<Option<String>> {
            match self.entry()?.get_password() {
                Ok(secret) => Ok(Some(secret)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(map_keyring_error("读取", e)),
            }
        }

        fn set(&self, secret: &str) -> AppResult<()> {
            let secret = normalize_secret(secret)?;
            self.entry()?
                .set_password(secret)
                .map_err(|e| map_keyring_error("写入", e))?;
            log::info!("API Key 已保存到系统钥匙串");
            Ok(())
        }

        fn remove(&self) -> AppResult<()> {
            match self.entry()?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(map_keyring_error("删除", e)),
            }
        }

        fn is_persistent(&self) -> bool {
            true
        }
    }
}
