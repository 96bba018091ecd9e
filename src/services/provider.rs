//! # Gemini 模型服务客户端
//!
//! 实现 `TextGenerator`，提供两种调用方式：
//! - 单次请求：`POST {base}/{model}:generateContent`，返回全部候选文本拼接后的结果
//! - 流式请求：`POST {base}/{model}:streamGenerateContent?alt=sse`，
//!   每个 SSE `data:` 事件解析出一个文本增量
//!
//! API Key 通过 `x-goog-api-key` 请求头传递，不出现在 URL 和日志中。
//! 采样参数固定为 temperature 0.7、topP 0.95。

use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::assistant::{TextGenerator, TextStream};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// 模型服务配置
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    /// 单次请求使用的模型
    pub hosted_model: String,
    /// 流式请求使用的模型
    pub streaming_model: String,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            hosted_model: "gemini-2.0-flash".to_string(),
            streaming_model: "gemini-3-flash-preview".to_string(),
            temperature: 0.7,
            top_p: 0.95,
        }
    }
}

impl ProviderConfig {
    /// 默认配置，`TABBED_DOCS_GEMINI_BASE_URL` 存在时覆盖服务地址
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("TABBED_DOCS_GEMINI_BASE_URL") {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                log::info!("使用自定义 Gemini 服务地址: {}", url);
                config.base_url = url.to_string();
            }
        }
        config
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Gemini 客户端
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl GeminiClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
            },
        }
    }

    /// 校验参数并发送请求，非 2xx 响应转换为 `AppError::Request`
    async fn send(&self, url: String, api_key: &str, prompt: &str) -> AppResult<reqwest::Response> {
        let api_key = api_key.trim();
        let prompt = prompt.trim();
        if api_key.is_empty() {
            return Err(AppError::Auth("Gemini API key is required.".to_string()));
        }
        if prompt.is_empty() {
            return Err(AppError::Validation("Prompt cannot be empty.".to_string()));
        }

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&self.build_request(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }
        Ok(response)
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, api_key: &str, prompt: &str) -> AppResult<String> {
        let url = format!("{}/{}:generateContent", self.config.base_url, self.config.hosted_model);
        let response = self.send(url, api_key, prompt).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Request(format!("Failed to parse Gemini response: {}", e)))?;

        let text = parsed.joined_text();
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Request("Gemini did not return any text.".to_string()));
        }
        Ok(text.to_string())
    }

    async fn generate_stream(&self, api_key: &str, prompt: &str) -> AppResult<TextStream> {
        let url = format!(
            "{}/{}:streamGenerateContent?alt=sse",
            self.config.base_url, self.config.streaming_model
        );
        let response = self.send(url, api_key, prompt).await?;
        Ok(text_stream(response.bytes_stream()).boxed())
    }
}

fn map_http_error(status: reqwest::StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| wrapper.error.message)
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or_else(|| format!("Gemini API request failed ({}).", status.as_u16()));
    AppError::Request(message)
}

// ============ 流式解析 ============

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

struct StreamState {
    bytes: ByteStream,
    decoder: SseDecoder,
    /// 已解析、尚未产出的文本增量（逆序存放，pop 即为下一个）
    pending: Vec<AppResult<String>>,
    finished: bool,
}

/// 把 SSE 字节流转换为文本增量流，空增量被跳过
fn text_stream(
    bytes: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
) -> impl Stream<Item = AppResult<String>> + Send {
    futures_util::stream::unfold(
        StreamState {
            bytes: Box::pin(bytes),
            decoder: SseDecoder::default(),
            pending: Vec::new(),
            finished: false,
        },
        |mut state| async move {
            loop {
                if let Some(item) = state.pending.pop() {
                    return Some((item, state));
                }
                if state.finished {
                    return None;
                }

                let events = match state.bytes.next().await {
                    Some(Ok(chunk)) => state.decoder.push(&chunk),
                    Some(Err(e)) => {
                        state.finished = true;
                        return Some((Err(AppError::Http(e)), state));
                    }
                    None => {
                        state.finished = true;
                        state.decoder.flush().into_iter().collect()
                    }
                };

                let mut decoded: Vec<AppResult<String>> =
                    events.iter().filter_map(|data| decode_event(data)).collect();
                decoded.reverse();
                state.pending = decoded;
            }
        },
    )
}

/// 解析单个事件的 data 负载
fn decode_event(data: &str) -> Option<AppResult<String>> {
    if data.trim().is_empty() || data.trim() == "[DONE]" {
        return None;
    }
    match serde_json::from_str::<StreamEvent>(data) {
        Ok(StreamEvent { error: Some(error), .. }) => Some(Err(AppError::Request(
            error.message.unwrap_or_else(|| "Gemini stream reported an error.".to_string()),
        ))),
        Ok(StreamEvent { response, .. }) => {
            let text = response.joined_text();
            (!text.is_empty()).then_some(Ok(text))
        }
        Err(e) => Some(Err(AppError::Request(format!(
            "Failed to parse Gemini stream event: {}",
            e
        )))),
    }
}

/// 增量 SSE 解码器
///
/// 只关心 `data:` 字段，多行 data 以 `\n` 连接，空行为事件边界。
#[derive(Debug, Default)]
struct SseDecoder {
    line: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// 推入一段字节，返回其中完整事件的 data 负载
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut events = Vec::new();
        for &byte in chunk {
            if byte != b'\n' {
                self.line.push(byte);
                continue;
            }
            let raw = std::mem::take(&mut self.line);
            let line = String::from_utf8_lossy(&raw);
            if let Some(event) = self.process_line(line.strip_suffix('\r').unwrap_or(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// 流结束时输出残留事件
    fn flush(&mut self) -> Option<String> {
        if !self.line.is_empty() {
            let raw = std::mem::take(&mut self.line);
            let line = String::from_utf8_lossy(&raw).into_owned();
            if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                return Some(event);
            }
        }
        if self.data.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.data).join("\n"))
        }
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            return Some(std::mem::take(&mut self.data).join("\n"));
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        None
    }
}

// ============ 请求 / 响应结构 ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// 所有候选的所有文本片段按顺序拼接
    fn joined_text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct StreamEvent {
    #[serde(flatten)]
    response: GenerateContentResponse,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}
