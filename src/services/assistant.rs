//! # AI 助手会话服务
//!
//! 助手面板的状态机、请求标记与执行。
//!
//! ## 状态流转
//! - 空提示词：静默忽略（先于密钥检查）
//! - 没有 API Key 时发出提示词：会话不变，返回 `IssueOutcome::RequireApiKey`
//! - 发出提示词：清空上一轮回复，立即进入 `Pending`（网络请求之前）
//! - 单次请求（Hosted）：完成后整体显示回复
//! - 流式请求（Direct）：每个分块追加到回复并立即推送快照
//! - 失败：错误消息规范化后进入 `DisplayingError`
//! - 重置：无条件回到 `Idle`
//!
//! ## 请求标记
//! 每次发出提示词分配一个新的 `RequestHandle`，会话只认最新的句柄。
//! 被取代的网络调用不会被中止，它迟到的分块和结果在应用前比对句柄后丢弃。
//!
//! ## 锁
//! 会话放在 `std::sync::Mutex` 中，`run_request` 只在同步片段内持锁，
//! 不跨越任何 `.await`。

use std::fmt;
use std::future::Future;
use std::sync::{LazyLock, Mutex, MutexGuard};

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::assistant::{AssistantPhase, AssistantSnapshot};
use crate::models::selection::SelectionState;

/// 凭据被拒绝时的提示文案
const KEY_REJECTED_MESSAGE: &str = "Your API key is not valid for this desktop request. In Google AI Studio, use a key that allows desktop/server requests (not localhost-only browser referrer restrictions).";

/// 没有可用错误消息时的兜底文案
const FALLBACK_ERROR_MESSAGE: &str = "Sorry, something went wrong while talking to the AI.";

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)api key").unwrap());
static REJECTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)invalid|not valid|not authorized").unwrap());

/// 流式回复：按到达顺序产出的文本增量
pub type TextStream = BoxStream<'static, AppResult<String>>;

// ============ 执行路径 ============

/// 请求执行路径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// 由宿主进程代为发出单次请求，完成后整体显示
    #[default]
    Hosted,
    /// 直接流式调用模型服务，逐块显示
    Direct,
}

impl ExecutionMode {
    /// 读取 `TABBED_DOCS_EXECUTION_MODE`，值为 `direct` 时使用流式路径
    pub fn from_env() -> Self {
        match std::env::var("TABBED_DOCS_EXECUTION_MODE") {
            Ok(value) if value.trim().eq_ignore_ascii_case("direct") => ExecutionMode::Direct,
            _ => ExecutionMode::Hosted,
        }
    }
}

/// 文本生成能力
///
/// 由模型服务客户端实现，测试中使用固定回复的替身。
pub trait TextGenerator {
    /// 单次请求，返回完整文本
    fn generate(&self, api_key: &str, prompt: &str) -> impl Future<Output = AppResult<String>> + Send;

    /// 流式请求，返回文本增量流
    fn generate_stream(
        &self,
        api_key: &str,
        prompt: &str,
    ) -> impl Future<Output = AppResult<TextStream>> + Send;
}

// ============ 会话 ============

/// 请求句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestHandle(u64);

impl RequestHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// 提示词来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PromptSource {
    /// 手动输入
    #[default]
    Typed,
    /// 点击预置提示词
    Suggestion,
}

/// 已发出、等待执行的请求
pub struct PendingRequest {
    pub handle: RequestHandle,
    /// 组合后的完整请求文本
    pub prompt: String,
    pub api_key: String,
    pub mode: ExecutionMode,
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("handle", &self.handle)
            .field("prompt_len", &self.prompt.len())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// 发出提示词的结果
#[derive(Debug)]
pub enum IssueOutcome {
    /// 未配置 API Key，需要打开密钥输入界面，会话未改变
    RequireApiKey,
    /// 空提示词，或忙碌时点击预置提示词
    Ignored,
    Started(PendingRequest),
}

/// 助手会话
#[derive(Debug, Default)]
pub struct AssistantSession {
    phase: AssistantPhase,
    prompt_text: String,
    context_text: Option<String>,
    response_text: String,
    live: Option<RequestHandle>,
    next_id: u64,
}

impl AssistantSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> AssistantPhase {
        self.phase
    }

    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    /// 发出提示词
    ///
    /// # 参数
    /// - `prompt` - 原始指令（手动输入或预置提示词）
    /// - `selection` - 发出时的选区，非空时作为引用上下文附在指令后
    /// - `api_key` - 当前会话持有的 API Key
    /// - `source` - 提示词来源，预置提示词在忙碌时被忽略
    /// - `mode` - 执行路径
    pub fn issue(
        &mut self,
        prompt: &str,
        selection: &SelectionState,
        api_key: Option<&str>,
        source: PromptSource,
        mode: ExecutionMode,
    ) -> IssueOutcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return IssueOutcome::Ignored;
        }

        let Some(api_key) = api_key.map(str::trim).filter(|key| !key.is_empty()) else {
            log::info!("未配置 API Key，请求输入密钥");
            return IssueOutcome::RequireApiKey;
        };
        if source == PromptSource::Suggestion && self.phase.is_busy() {
            log::debug!("助手忙碌中，忽略预置提示词");
            return IssueOutcome::Ignored;
        }

        self.next_id += 1;
        let handle = RequestHandle(self.next_id);
        if let Some(previous) = self.live.replace(handle) {
            log::debug!("助手请求 #{} 被 #{} 取代", previous.id(), handle.id());
        }

        self.phase = AssistantPhase::Pending;
        self.prompt_text = prompt.to_string();
        self.context_text = selection.has_text().then(|| selection.text.clone());
        self.response_text.clear();

        IssueOutcome::Started(PendingRequest {
            handle,
            prompt: compose_prompt(prompt, selection),
            api_key: api_key.to_string(),
            mode,
        })
    }

    /// 句柄是否已被取代（或会话已重置）
    pub fn is_stale(&self, handle: RequestHandle) -> bool {
        self.live != Some(handle)
    }

    /// 追加流式分块
    ///
    /// # 返回值
    /// 句柄已过期时返回 false，分块被丢弃
    pub fn apply_chunk(&mut self, handle: RequestHandle, chunk: &str) -> bool {
        if self.is_stale(handle) {
            return false;
        }
        self.response_text.push_str(chunk);
        self.phase = AssistantPhase::Streaming;
        true
    }

    /// 请求完成
    ///
    /// # 参数
    /// - `text` - 单次请求的完整回复；流式请求传 None，使用已累积的内容
    ///
    /// 流式请求结束时没有任何内容则回到 `Idle`。
    pub fn complete(&mut self, handle: RequestHandle, text: Option<String>) -> bool {
        if self.is_stale(handle) {
            return false;
        }
        if let Some(text) = text {
            self.response_text = text;
        }
        self.live = None;
        self.phase = if self.response_text.is_empty() {
            AssistantPhase::Idle
        } else {
            AssistantPhase::Displaying
        };
        true
    }

    /// 请求失败，显示规范化后的错误消息
    pub fn fail(&mut self, handle: RequestHandle, error: &AppError) -> bool {
        if self.is_stale(handle) {
            return false;
        }
        log::warn!("助手请求 #{} 失败: {}", handle.id(), error);
        self.response_text = normalize_error(error);
        self.live = None;
        self.phase = AssistantPhase::DisplayingError;
        true
    }

    /// 重置会话，进行中的请求随之失效
    pub fn reset(&mut self) {
        self.phase = AssistantPhase::Idle;
        self.prompt_text.clear();
        self.context_text = None;
        self.response_text.clear();
        self.live = None;
    }

    /// 放弃进行中的请求
    ///
    /// 只有忙碌时才回到 `Idle`，已显示的回复保持不变。
    pub fn supersede(&mut self) {
        if let Some(handle) = self.live.take() {
            log::debug!("助手请求 #{} 已放弃", handle.id());
        }
        if self.phase.is_busy() {
            self.phase = AssistantPhase::Idle;
            self.response_text.clear();
        }
    }

    /// 是否可以执行替换 / 插入
    ///
    /// 仅在成功显示回复，且发出提示词时存在选区的情况下可用。
    pub fn can_splice(&self) -> bool {
        self.phase == AssistantPhase::Displaying
            && self.context_text.is_some()
            && !self.response_text.is_empty()
    }

    pub fn snapshot(&self) -> AssistantSnapshot {
        AssistantSnapshot {
            phase: self.phase,
            prompt_text: self.prompt_text.clone(),
            context_text: self.context_text.clone(),
            response_text: self.response_text.clone(),
            is_streaming: self.phase.is_busy(),
            can_splice: self.can_splice(),
        }
    }
}

// ============ 辅助函数 ============

/// 组合请求文本：有选区时把选中文本作为引用上下文附在指令之后
pub fn compose_prompt(prompt: &str, selection: &SelectionState) -> String {
    if selection.has_text() {
        format!(
            "{}\n\nUse this selected context if relevant:\n\"\"\"{}\"\"\"",
            prompt, selection.text
        )
    } else {
        prompt.to_string()
    }
}

/// 将请求失败转换为可展示的消息
///
/// 形如"API key 无效 / 未授权"的消息改写为使用服务端密钥的指引，
/// 其余消息原样透传，消息为空时使用兜底文案。
pub fn normalize_error(error: &AppError) -> String {
    let message = error.to_string();
    let message = message.trim();
    if message.is_empty() {
        return FALLBACK_ERROR_MESSAGE.to_string();
    }
    if API_KEY_RE.is_match(message) && REJECTED_RE.is_match(message) {
        return KEY_REJECTED_MESSAGE.to_string();
    }
    message.to_string()
}

fn lock(session: &Mutex<AssistantSession>) -> MutexGuard<'_, AssistantSession> {
    session.lock().unwrap_or_else(|e| e.into_inner())
}

// ============ 执行 ============

/// 执行已发出的请求，把结果写回会话
///
/// 每次会话状态发生可见变化时调用 `on_update` 推送快照。
/// 句柄过期后立即停止读取，不再推送任何内容。
pub async fn run_request<G, F>(
    session: &Mutex<AssistantSession>,
    generator: &G,
    request: PendingRequest,
    on_update: F,
) where
    G: TextGenerator + Sync,
    F: Fn(AssistantSnapshot) + Send + Sync,
{
    let PendingRequest {
        handle,
        prompt,
        api_key,
        mode,
    } = request;
    log::info!(
        "助手请求 #{} 开始: 路径 {:?}，请求文本 {} 字符",
        handle.id(),
        mode,
        prompt.chars().count()
    );

    match mode {
        ExecutionMode::Hosted => {
            let result = generator.generate(&api_key, &prompt).await;
            let snapshot = {
                let mut session = lock(session);
                let applied = match result {
                    Ok(text) => session.complete(handle, Some(text)),
                    Err(e) => session.fail(handle, &e),
                };
                applied.then(|| session.snapshot())
            };
            match snapshot {
                Some(snapshot) => on_update(snapshot),
                None => log::debug!("丢弃过期的助手结果 #{}", handle.id()),
            }
        }
        ExecutionMode::Direct => {
            let mut stream = match generator.generate_stream(&api_key, &prompt).await {
                Ok(stream) => stream,
                Err(e) => {
                    let snapshot = {
                        let mut session = lock(session);
                        session.fail(handle, &e).then(|| session.snapshot())
                    };
                    if let Some(snapshot) = snapshot {
                        on_update(snapshot);
                    }
                    return;
                }
            };

            while let Some(item) = stream.next().await {
                let snapshot = {
                    let mut session = lock(session);
                    let applied = match &item {
                        Ok(chunk) => session.apply_chunk(handle, chunk),
                        Err(e) => session.fail(handle, e),
                    };
                    applied.then(|| session.snapshot())
                };
                match snapshot {
                    Some(snapshot) => on_update(snapshot),
                    None => {
                        log::debug!("助手请求 #{} 已过期，停止读取", handle.id());
                        return;
                    }
                }
                if item.is_err() {
                    return;
                }
            }

            let snapshot = {
                let mut session = lock(session);
                session.complete(handle, None).then(|| session.snapshot())
            };
            if let Some(snapshot) = snapshot {
                log::info!("助手请求 #{} 完成", handle.id());
                on_update(snapshot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// 固定回复的生成器
    enum FakeGenerator {
        Reply(Result<String, String>),
        Chunks(Vec<Result<String, String>>),
    }

    impl TextGenerator for FakeGenerator {
        async fn generate(&self, _api_key: &str, _prompt: &str) -> AppResult<String> {
            match self {
                FakeGenerator::Reply(Ok(text)) => Ok(text.clone()),
                FakeGenerator::Reply(Err(msg)) => Err(AppError::Request(msg.clone())),
                FakeGenerator::Chunks(_) => Err(AppError::Request("not single-shot".into())),
            }
        }

        async fn generate_stream(&self, _api_key: &str, _prompt: &str) -> AppResult<TextStream> {
            match self {
                FakeGenerator::Chunks(chunks) => {
                    let items: Vec<AppResult<String>> = chunks
                        .iter()
                        .map(|c| c.clone().map_err(AppError::Request))
                        .collect();
                    Ok(futures_util::stream::iter(items).boxed())
                }
                FakeGenerator::Reply(_) => Err(AppError::Request("not streaming".into())),
            }
        }
    }

    fn selection(text: &str) -> SelectionState {
        SelectionState {
            text: text.into(),
            rect: None,
        }
    }

    fn start(
        session: &mut AssistantSession,
        prompt: &str,
        sel: &SelectionState,
        mode: ExecutionMode,
    ) -> PendingRequest {
        match session.issue(prompt, sel, Some("key"), PromptSource::Typed, mode) {
            IssueOutcome::Started(request) => request,
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_issue_without_key_leaves_session_unchanged() {
        let mut session = AssistantSession::new();
        let before = session.snapshot();

        let outcome = session.issue("Summarize", &selection("x"), None, PromptSource::Typed, ExecutionMode::Hosted);
        assert!(matches!(outcome, IssueOutcome::RequireApiKey));
        let outcome = session.issue("Summarize", &selection("x"), Some("  "), PromptSource::Typed, ExecutionMode::Hosted);
        assert!(matches!(outcome, IssueOutcome::RequireApiKey));

        let after = session.snapshot();
        assert_eq!(before, after);
        assert_eq!(after.response_text, "");
        assert!(!after.is_streaming);
    }

    #[test]
    fn test_issue_enters_pending_immediately() {
        let mut session = AssistantSession::new();
        let request = start(&mut session, "Explain", &SelectionState::empty(), ExecutionMode::Hosted);
        assert_eq!(request.prompt, "Explain");
        assert_eq!(session.phase(), AssistantPhase::Pending);
        assert!(session.snapshot().is_streaming);
    }

    #[test]
    fn test_composed_prompt_includes_selection() {
        let mut session = AssistantSession::new();
        let prompt = "Provide a concise summary of the following text:";
        let request = start(&mut session, prompt, &selection("hello"), ExecutionMode::Hosted);
        assert!(request.prompt.contains(prompt));
        assert!(request.prompt.contains("\"\"\"hello\"\"\""));
        assert_eq!(session.snapshot().context_text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_blank_prompt_is_ignored() {
        let mut session = AssistantSession::new();
        let outcome = session.issue("   ", &SelectionState::empty(), Some("k"), PromptSource::Typed, ExecutionMode::Hosted);
        assert!(matches!(outcome, IssueOutcome::Ignored));
        assert_eq!(session.phase(), AssistantPhase::Idle);

        // 没有 API Key 时空指令同样静默忽略，不打开密钥输入界面
        let outcome = session.issue(" \n", &SelectionState::empty(), None, PromptSource::Typed, ExecutionMode::Hosted);
        assert!(matches!(outcome, IssueOutcome::Ignored));
    }

    #[test]
    fn test_suggestion_ignored_while_busy() {
        let mut session = AssistantSession::new();
        start(&mut session, "first", &SelectionState::empty(), ExecutionMode::Hosted);
        let outcome = session.issue("Outline", &SelectionState::empty(), Some("k"), PromptSource::Suggestion, ExecutionMode::Hosted);
        assert!(matches!(outcome, IssueOutcome::Ignored));
        assert_eq!(session.snapshot().prompt_text, "first");
    }

    #[test]
    fn test_error_normalization() {
        let rejected = AppError::Request("API key not valid. Please pass a valid API key.".into());
        assert!(normalize_error(&rejected).contains("desktop/server requests"));

        let unauthorized = AppError::Auth("The API KEY is not authorized".into());
        assert_eq!(normalize_error(&unauthorized), KEY_REJECTED_MESSAGE);

        let other = AppError::Request("Quota exceeded".into());
        assert_eq!(normalize_error(&other), "Quota exceeded");

        let empty = AppError::Request(String::new());
        assert_eq!(normalize_error(&empty), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_reset_always_clears() {
        let mut session = AssistantSession::new();
        let request = start(&mut session, "p", &selection("s"), ExecutionMode::Direct);
        session.apply_chunk(request.handle, "partial");
        session.reset();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.prompt_text, "");
        assert_eq!(snapshot.response_text, "");
        assert!(!snapshot.is_streaming);
        assert_eq!(snapshot.phase, AssistantPhase::Idle);
        assert!(session.is_stale(request.handle));
    }

    #[test]
    fn test_splice_requires_selection_at_issue_time() {
        let mut session = AssistantSession::new();
        let request = start(&mut session, "p", &SelectionState::empty(), ExecutionMode::Hosted);
        session.complete(request.handle, Some("answer".into()));
        assert!(!session.can_splice());

        let request = start(&mut session, "p", &selection("foo"), ExecutionMode::Hosted);
        session.complete(request.handle, Some("answer".into()));
        assert!(session.can_splice());
    }

    #[test]
    fn test_supersede_abandons_live_request() {
        let mut session = AssistantSession::new();
        let request = start(&mut session, "p", &SelectionState::empty(), ExecutionMode::Direct);
        session.supersede();
        assert_eq!(session.phase(), AssistantPhase::Idle);
        assert!(!session.apply_chunk(request.handle, "late"));
        assert_eq!(session.response_text(), "");
    }

    #[tokio::test]
    async fn test_hosted_request_displays_atomically() {
        let session = Mutex::new(AssistantSession::new());
        let request = start(&mut lock(&session), "p", &selection("foo"), ExecutionMode::Hosted);
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();

        let generator = FakeGenerator::Reply(Ok("bar".into()));
        run_request(&session, &generator, request, move |s| sink.lock().unwrap().push(s)).await;

        let updates = updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].phase, AssistantPhase::Displaying);
        assert_eq!(updates[0].response_text, "bar");
        assert!(updates[0].can_splice);
    }

    #[tokio::test]
    async fn test_streaming_accumulates_in_order() {
        let session = Mutex::new(AssistantSession::new());
        let request = start(&mut lock(&session), "p", &SelectionState::empty(), ExecutionMode::Direct);
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();

        let generator = FakeGenerator::Chunks(vec![Ok("Hel".into()), Ok("lo".into()), Ok("!".into())]);
        run_request(&session, &generator, request, move |s| sink.lock().unwrap().push(s)).await;

        let updates = updates.lock().unwrap();
        let texts: Vec<&str> = updates.iter().map(|s| s.response_text.as_str()).collect();
        assert_eq!(texts, vec!["Hel", "Hello", "Hello!", "Hello!"]);
        assert_eq!(updates[0].phase, AssistantPhase::Streaming);
        assert_eq!(updates[3].phase, AssistantPhase::Displaying);
    }

    #[tokio::test]
    async fn test_stream_error_shows_normalized_message() {
        let session = Mutex::new(AssistantSession::new());
        let request = start(&mut lock(&session), "p", &SelectionState::empty(), ExecutionMode::Direct);

        let generator = FakeGenerator::Chunks(vec![Ok("par".into()), Err("API key invalid".into())]);
        run_request(&session, &generator, request, |_| {}).await;

        let snapshot = lock(&session).snapshot();
        assert_eq!(snapshot.phase, AssistantPhase::DisplayingError);
        assert_eq!(snapshot.response_text, KEY_REJECTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let session = Mutex::new(AssistantSession::new());
        let first = start(&mut lock(&session), "old", &SelectionState::empty(), ExecutionMode::Hosted);
        let second = start(&mut lock(&session), "new", &SelectionState::empty(), ExecutionMode::Hosted);

        let updates = Arc::new(Mutex::new(0usize));
        let sink = updates.clone();
        let generator = FakeGenerator::Reply(Ok("old answer".into()));
        run_request(&session, &generator, first, move |_| *sink.lock().unwrap() += 1).await;

        assert_eq!(*updates.lock().unwrap(), 0);
        assert_eq!(lock(&session).phase(), AssistantPhase::Pending);
        assert_eq!(lock(&session).response_text(), "");

        let generator = FakeGenerator::Reply(Ok("new answer".into()));
        run_request(&session, &generator, second, |_| {}).await;
        assert_eq!(lock(&session).response_text(), "new answer");
    }

    #[tokio::test]
    async fn test_failure_after_reset_is_ignored() {
        let session = Mutex::new(AssistantSession::new());
        let request = start(&mut lock(&session), "p", &SelectionState::empty(), ExecutionMode::Hosted);
        lock(&session).reset();

        let generator = FakeGenerator::Reply(Err("boom".into()));
        run_request(&session, &generator, request, |_| {}).await;
        assert_eq!(lock(&session).phase(), AssistantPhase::Idle);
    }
}
