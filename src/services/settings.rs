//! # 偏好设置服务
//!
//! 主题、基准字号和当前模型分别保存在独立的键下（纯文本，不是 JSON）。
//! 读取时对每个值单独校验，缺失或非法时使用默认值：
//! - 主题：`light`
//! - 字号：16，超出 [8, 72] 时夹紧
//! - 模型：不在模型目录中时回退到默认模型

use std::sync::Arc;

use crate::error::AppResult;
use crate::models::settings::{AppSettings, Theme};
use crate::services::catalog::{self, DEFAULT_MODEL_ID};
use crate::services::formatting::FontScale;
use crate::services::storage::{FONT_SIZE_KEY, KeyValueStore, MODEL_KEY, THEME_KEY};

/// 偏好设置存储
pub struct SettingsStore {
    settings: AppSettings,
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let theme = read_raw(store.as_ref(), THEME_KEY)
            .and_then(|raw| Theme::parse(&raw))
            .unwrap_or_default();

        let font = read_raw(store.as_ref(), FONT_SIZE_KEY)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|size| FontScale::new(size.clamp(0, u32::MAX as i64) as u32))
            .unwrap_or_default();

        let selected_model_id = read_raw(store.as_ref(), MODEL_KEY)
            .filter(|id| catalog::find_model(id).is_some())
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());

        Self {
            settings: AppSettings {
                theme,
                base_font_size: font.base(),
                selected_model_id,
            },
            store,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn font_scale(&self) -> FontScale {
        FontScale::new(self.settings.base_font_size)
    }

    /// 切换深色 / 浅色主题
    pub fn toggle_theme(&mut self) -> AppResult<Theme> {
        self.settings.theme = self.settings.theme.toggled();
        self.store.set(THEME_KEY, self.settings.theme.as_str())?;
        Ok(self.settings.theme)
    }

    /// 按增量调整基准字号
    pub fn change_font_size(&mut self, delta: i32) -> AppResult<FontScale> {
        let scale = self.font_scale().step(delta);
        self.settings.base_font_size = scale.base();
        self.store.set(FONT_SIZE_KEY, &scale.base().to_string())?;
        Ok(scale)
    }

    /// 选择模型
    ///
    /// # 返回值
    /// 模型不在目录中时返回 false，设置保持不变
    pub fn select_model(&mut self, model_id: &str) -> AppResult<bool> {
        if catalog::find_model(model_id).is_none() {
            log::warn!("忽略未知模型: {}", model_id);
            return Ok(false);
        }
        self.settings.selected_model_id = model_id.to_string();
        self.store.set(MODEL_KEY, model_id)?;
        Ok(true)
    }
}

fn read_raw(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("读取设置 {} 失败: {}", key, e);
            None
        }
    }
}
