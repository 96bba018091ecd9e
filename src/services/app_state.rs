//! # 应用状态
//!
//! 持有全部可变状态的单一对象：文档存储、资料库、编辑面、助手会话、偏好设置和 API Key。
//! 通过 Tauri 的 `manage()` 注册，所有 command 通过 `State<AppState>` 注入访问，
//! 不存在任何全局可变状态。
//!
//! ## 线程安全
//! 每个组件各自放在 `std::sync::Mutex` 中。需要同时操作多个组件时，
//! 依次获取并立即释放，从不同时持有两把锁，也不跨越 `.await` 持锁。
//! 锁中毒时继续使用内部数据（状态在每次变更后都是一致的）。

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::assistant::AssistantSnapshot;
use crate::models::document::{Document, LibraryItem};
use crate::models::selection::{SelectionEvent, SelectionState};
use crate::models::settings::{AppSettings, KeyPrompt, Theme};
use crate::services::assistant::{
    self, AssistantSession, ExecutionMode, IssueOutcome, PendingRequest, PromptSource,
};
use crate::services::catalog;
use crate::services::documents::DocumentStore;
use crate::services::export::{self, WordExport};
use crate::services::formatting::{FontScale, FontSizes};
use crate::services::library::LibraryStore;
use crate::services::provider::{GeminiClient, ProviderConfig};
use crate::services::settings::SettingsStore;
use crate::services::storage::{FileStore, KeyValueStore};
use crate::services::surface::{ChangeSource, RichTextSurface, SurfaceChange};
use crate::services::vault::KeyVault;
use crate::utils::path;

/// 发出提示词后返回给前端的状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PromptStatus {
    /// 需要先输入 API Key
    RequireApiKey,
    Ignored,
    #[serde(rename_all = "camelCase")]
    Started { request_id: u64 },
}

impl PromptStatus {
    pub fn from_outcome(outcome: &IssueOutcome) -> Self {
        match outcome {
            IssueOutcome::RequireApiKey => PromptStatus::RequireApiKey,
            IssueOutcome::Ignored => PromptStatus::Ignored,
            IssueOutcome::Started(request) => PromptStatus::Started {
                request_id: request.handle.id(),
            },
        }
    }
}

/// 应用全局状态
pub struct AppState {
    documents: Mutex<DocumentStore>,
    library: LibraryStore,
    surface: Mutex<RichTextSurface>,
    assistant: Mutex<AssistantSession>,
    settings: Mutex<SettingsStore>,
    vault: Arc<dyn KeyVault>,
    /// 会话期间持有的 API Key
    api_key: RwLock<Option<String>>,
    provider: GeminiClient,
    mode: ExecutionMode,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl AppState {
    /// 以本地数据目录初始化
    ///
    /// 服务地址和执行路径从环境变量读取。
    ///
    /// # 错误
    /// 数据目录无法确定或无法创建时返回错误
    pub fn bootstrap(vault: Arc<dyn KeyVault>) -> AppResult<Self> {
        let data_dir = path::get_data_dir().map_err(AppError::Validation)?;
        let store = FileStore::open(&data_dir)?;
        log::info!("数据目录: {}", data_dir.display());

        Ok(Self::with_parts(
            Arc::new(store),
            vault,
            GeminiClient::new(ProviderConfig::from_env()),
            ExecutionMode::from_env(),
        ))
    }

    /// 由各组件组装
    pub fn with_parts(
        store: Arc<dyn KeyValueStore>,
        vault: Arc<dyn KeyVault>,
        provider: GeminiClient,
        mode: ExecutionMode,
    ) -> Self {
        let documents = DocumentStore::load(store.clone());
        let settings = SettingsStore::load(store.clone());
        let api_key = match vault.get() {
            Ok(key) => key,
            Err(e) => {
                log::warn!("读取已保存的 API Key 失败: {}", e);
                None
            }
        };

        Self {
            documents: Mutex::new(documents),
            library: LibraryStore::new(store),
            surface: Mutex::new(RichTextSurface::new()),
            assistant: Mutex::new(AssistantSession::new()),
            settings: Mutex::new(settings),
            vault,
            api_key: RwLock::new(api_key),
            provider,
            mode,
        }
    }

    pub fn assistant(&self) -> &Mutex<AssistantSession> {
        &self.assistant
    }

    pub fn provider(&self) -> &GeminiClient {
        &self.provider
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    // ============ 文档 ============

    pub fn documents(&self) -> Vec<Document> {
        lock(&self.documents).documents().to_vec()
    }

    pub fn create_document(&self) -> Document {
        let created = lock(&self.documents).create().clone();
        lock(&self.surface).clear_selection();
        created
    }

    pub fn activate_document(&self, id: &str) -> bool {
        let before = self.active_id();
        let activated = lock(&self.documents).activate(id);
        self.follow_active(before);
        activated
    }

    pub fn close_document(&self, id: &str) -> bool {
        let before = self.active_id();
        let closed = lock(&self.documents).close(id);
        self.follow_active(before);
        closed
    }

    pub fn toggle_pin(&self, id: &str) -> bool {
        lock(&self.documents).toggle_pin(id)
    }

    pub fn rename_document(&self, id: &str, title: &str) -> bool {
        lock(&self.documents).rename(id, title)
    }

    pub fn update_content(&self, content: &str) -> bool {
        lock(&self.documents).update_content(content)
    }

    fn active_id(&self) -> Option<String> {
        lock(&self.documents).active().map(|d| d.id.clone())
    }

    /// 激活文档发生变化时，旧文档上的选区和光标随之失效
    fn follow_active(&self, before: Option<String>) {
        if self.active_id() != before {
            lock(&self.surface).clear_selection();
        }
    }

    fn active_document(&self) -> AppResult<Document> {
        lock(&self.documents)
            .active()
            .cloned()
            .ok_or_else(|| AppError::Validation("没有激活的文档".to_string()))
    }

    // ============ 编辑面 ============

    /// 把激活文档的内容同步到编辑面
    ///
    /// 内容与编辑面不同时返回需要重新渲染的标记。
    pub fn sync_surface(&self) -> Option<SurfaceChange> {
        let content = lock(&self.documents).active().map(|d| d.content.clone())?;
        lock(&self.surface).sync_external(&content)
    }

    /// 用户输入：规范化后写回激活文档
    pub fn surface_input(&self, html: &str, inner_text: &str) -> SurfaceChange {
        let change = lock(&self.surface).handle_input(html, inner_text);
        lock(&self.documents).update_content(change.html.as_str());
        change
    }

    pub fn report_selection(&self, event: SelectionEvent) -> SelectionState {
        lock(&self.surface).report_selection(event)
    }

    pub fn selection(&self) -> SelectionState {
        lock(&self.surface).selection().clone()
    }

    // ============ 助手 ============

    pub fn assistant_snapshot(&self) -> AssistantSnapshot {
        lock(&self.assistant).snapshot()
    }

    /// 发出提示词，附带当前选区和 API Key
    pub fn issue_prompt(&self, prompt: &str, source: PromptSource) -> IssueOutcome {
        let selection = self.selection();
        let api_key = self.api_key.read().unwrap_or_else(|e| e.into_inner()).clone();
        lock(&self.assistant).issue(prompt, &selection, api_key.as_deref(), source, self.mode)
    }

    /// 执行已发出的请求，过程中的每次状态变化通过 `on_update` 推送
    pub async fn run_prompt<F>(&self, request: PendingRequest, on_update: F)
    where
        F: Fn(AssistantSnapshot) + Send + Sync,
    {
        assistant::run_request(&self.assistant, &self.provider, request, on_update).await;
    }

    pub fn reset_assistant(&self) -> AssistantSnapshot {
        let mut session = lock(&self.assistant);
        session.reset();
        session.snapshot()
    }

    /// 用助手回复替换选区，并写回激活文档
    ///
    /// # 错误
    /// - 没有可写回的回复或选区时返回 `AppError::Validation`
    /// - 编辑面内容与激活文档不一致时返回 `AppError::Validation`，文档不变
    pub fn apply_replace(&self) -> AppResult<SurfaceChange> {
        let response = self.spliceable_response()?;
        self.ensure_surface_current()?;
        let html = lock(&self.surface).replace_selection(&response)?;
        Ok(self.commit_splice(html))
    }

    /// 在选区后插入助手回复，并写回激活文档
    pub fn apply_insert(&self) -> AppResult<SurfaceChange> {
        let response = self.spliceable_response()?;
        self.ensure_surface_current()?;
        let html = lock(&self.surface).insert_after_selection(&response)?;
        Ok(self.commit_splice(html))
    }

    fn spliceable_response(&self) -> AppResult<String> {
        let session = lock(&self.assistant);
        if !session.can_splice() {
            return Err(AppError::Validation("当前没有可写回文档的回复".to_string()));
        }
        Ok(session.response_text().to_string())
    }

    /// 编辑面上的标记和区间必须属于当前激活的文档
    fn ensure_surface_current(&self) -> AppResult<()> {
        let content = self.active_document()?.content;
        if lock(&self.surface).html() != content {
            log::warn!("编辑面与激活文档不同步，拒绝写回助手回复");
            return Err(AppError::Validation(
                "编辑区域与当前文档不同步，请重新选择文本".to_string(),
            ));
        }
        Ok(())
    }

    fn commit_splice(&self, html: String) -> SurfaceChange {
        lock(&self.documents).update_content(html.as_str());
        SurfaceChange {
            source: ChangeSource::External,
            html,
        }
    }

    // ============ API Key ============

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// 从保管处读取 API Key，读到时同步到会话
    pub fn load_api_key(&self) -> AppResult<Option<String>> {
        let key = self.vault.get()?;
        if key.is_some() {
            *self.api_key.write().unwrap_or_else(|e| e.into_inner()) = key.clone();
        }
        Ok(key)
    }

    /// 保存 API Key
    ///
    /// 保管处不跨重启保留时记录提示，密钥仅在本次会话中有效。
    pub fn set_api_key(&self, secret: &str) -> AppResult<()> {
        self.vault.set(secret)?;
        if !self.vault.is_persistent() {
            log::warn!("API Key 仅保存在内存中，重启后需要重新输入");
        }
        *self.api_key.write().unwrap_or_else(|e| e.into_inner()) = Some(secret.trim().to_string());
        Ok(())
    }

    /// 删除 API Key
    ///
    /// 同时清空选区，并放弃进行中的助手请求。
    pub fn remove_api_key(&self) -> AppResult<()> {
        self.vault.remove()?;
        *self.api_key.write().unwrap_or_else(|e| e.into_inner()) = None;
        lock(&self.surface).clear_selection();
        lock(&self.assistant).supersede();
        log::info!("API Key 已删除");
        Ok(())
    }

    // ============ 资料库 ============

    /// 保存激活文档到资料库
    ///
    /// 实际名称与当前标题不同时，同步重命名打开的文档。
    pub fn save_to_library(&self, display_name: &str) -> AppResult<String> {
        let document = self.active_document()?;
        let final_name = self.library.save(&document, display_name)?;
        if final_name != document.title {
            lock(&self.documents).rename(&document.id, &final_name);
        }
        Ok(final_name)
    }

    pub fn list_library(&self) -> Vec<LibraryItem> {
        self.library.list()
    }

    pub fn delete_library_item(&self, id: &str) -> AppResult<bool> {
        self.library.delete(id)
    }

    /// 打开资料库条目：已打开则激活，否则作为新文档打开
    pub fn load_from_library(&self, id: &str) -> AppResult<Document> {
        let item = self.library.load(id)?;
        let before = self.active_id();
        let document = lock(&self.documents).open_from_library(&item).clone();
        self.follow_active(before);
        Ok(document)
    }

    // ============ 偏好设置 ============

    pub fn settings(&self) -> AppSettings {
        lock(&self.settings).settings().clone()
    }

    pub fn toggle_theme(&self) -> AppResult<Theme> {
        lock(&self.settings).toggle_theme()
    }

    pub fn change_font_size(&self, delta: i32) -> AppResult<FontSizes> {
        Ok(lock(&self.settings).change_font_size(delta)?.sizes())
    }

    pub fn font_sizes(&self) -> FontSizes {
        lock(&self.settings).font_scale().sizes()
    }

    pub fn select_model(&self, model_id: &str) -> AppResult<bool> {
        lock(&self.settings).select_model(model_id)
    }

    /// 当前模型对应的密钥输入提示
    pub fn key_prompt(&self) -> KeyPrompt {
        let model_id = lock(&self.settings).settings().selected_model_id.clone();
        catalog::key_prompt(&model_id)
    }

    // ============ 导出 ============

    pub fn export_word(&self) -> AppResult<WordExport> {
        Ok(export::to_word_document(&self.active_document()?))
    }

    /// 导出 Word 文档到指定目录
    pub async fn export_word_to(&self, dir: &Path) -> AppResult<std::path::PathBuf> {
        let export = self.export_word()?;
        export.save_in(dir).await
    }

    pub fn export_print(&self) -> AppResult<String> {
        let scale: FontScale = lock(&self.settings).font_scale();
        Ok(export::to_print_html(&self.active_document()?, scale))
    }
}
