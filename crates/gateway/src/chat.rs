//! Chat façade: route-planning answers, titled answers, route summaries.
//!
//! Endpoints:
//!
//! - `POST /api/response`: answer a message within a caller-held context
//! - `POST /api/response/create`: first message of a chat: title + answer
//! - `POST /api/response/summarize`: extract route points from a context
//! - `GET  /api/health`: liveness probe (no auth)
//!
//! Everything except health requires the `AI_BACKEND_KEY` header.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use wayfarer_core::context::trim_context;
use wayfarer_core::error::{ProviderError, RepairError};
use wayfarer_core::message::Message;
use wayfarer_core::provider::{Provider, ProviderRequest};
use wayfarer_core::repair;

use crate::auth;
use crate::error::ApiError;
use crate::prompts;

// ── State ─────────────────────────────────────────────────────────────────

/// Immutable state shared by the chat handlers.
pub struct ChatState {
    pub provider: Arc<dyn Provider>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub summarize_max_tokens: u32,
    pub keep_last: usize,
    /// Expected `AI_BACKEND_KEY`; `None` fails every protected request.
    pub backend_key: Option<String>,
}

impl ChatState {
    pub fn from_config(provider: Arc<dyn Provider>, config: &wayfarer_config::ChatConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            summarize_max_tokens: config.summarize_max_tokens,
            keep_last: config.keep_last,
            backend_key: config.backend_key.clone(),
        }
    }

    async fn ask(&self, request: ProviderRequest) -> Result<String, ProviderError> {
        let provider = self.provider.name();
        let response = self
            .provider
            .complete(request)
            .await
            .inspect_err(|e| warn!(provider, error = %e, "Completion failed"))?;

        debug!(provider, model = %response.model, "Completion received");
        Ok(response.message.content)
    }
}

pub type SharedChatState = Arc<ChatState>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the chat façade router.
pub fn chat_router(state: SharedChatState) -> Router {
    let protected = Router::new()
        .route("/api/response", post(answer_handler))
        .route("/api/response/create", post(create_handler))
        .route("/api/response/summarize", post(summarize_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_backend_key,
        ));

    Router::new()
        .route("/api/health", get(health_handler))
        .merge(protected)
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct MessageRequest {
    message: String,
    context: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageResponse {
    message: String,
    context: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TitleRequest {
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TitleResponse {
    title: String,
    message: String,
    context: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SummarizeRequest {
    context: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SummarizeResponse {
    points: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    model_loaded: bool,
    version: String,
}

/// What the model is asked to produce on the title endpoint.
#[derive(Debug, Deserialize)]
struct TitledReply {
    title: String,
    message: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        model_loaded: true,
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

async fn answer_handler(
    State(state): State<SharedChatState>,
    Json(payload): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let MessageRequest {
        message,
        mut context,
    } = payload;

    let mut messages = Vec::with_capacity(context.len() + 2);
    messages.push(Message::system(prompts::ROUTE_ASSISTANT));
    messages.extend(context.iter().cloned());
    messages.push(Message::user(&message));

    let request = ProviderRequest::new(&state.model, messages)
        .with_temperature(state.temperature)
        .with_max_tokens(state.max_tokens);
    let reply = state.ask(request).await?;

    context.push(Message::user(message));
    context.push(Message::assistant(&reply));
    let context = trim_context(&context, state.keep_last);

    info!(
        reply_len = reply.len(),
        context_len = context.len(),
        "Answered message"
    );

    Ok(Json(MessageResponse {
        message: reply,
        context,
    }))
}

async fn create_handler(
    State(state): State<SharedChatState>,
    Json(payload): Json<TitleRequest>,
) -> Result<Json<TitleResponse>, ApiError> {
    let first = titled_request(&state, prompts::TITLED_ANSWER, &payload.message)
        .with_temperature(state.temperature);
    let reply = state.ask(first).await?;

    let titled = match decode_titled(&reply) {
        Ok(titled) => titled,
        Err(e) => {
            warn!(reason = %e, "Titled reply was not usable JSON, retrying with short-title prompt");
            let retry = titled_request(&state, prompts::SHORT_TITLE, &payload.message)
                .with_temperature(state.temperature);
            let reply = state.ask(retry).await?;
            decode_titled(&reply).map_err(|e| ApiError::Conversion(e.reason))?
        }
    };

    info!(title = %titled.title, "Created titled answer");

    let context = vec![
        Message::user(payload.message),
        Message::assistant(&titled.message),
    ];

    Ok(Json(TitleResponse {
        title: titled.title,
        message: titled.message,
        context,
    }))
}

async fn summarize_handler(
    State(state): State<SharedChatState>,
    Json(payload): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let mut messages = Vec::with_capacity(payload.context.len() + 2);
    messages.push(Message::system(prompts::ROUTE_POINTS));
    messages.extend(payload.context);
    messages.push(Message::user(prompts::ROUTE_POINTS_REQUEST));

    let request =
        ProviderRequest::new(&state.model, messages).with_max_tokens(state.summarize_max_tokens);

    // "If no route was planned, output nothing" can come back as null content.
    let reply = match state.ask(request).await {
        Ok(reply) => reply,
        Err(ProviderError::EmptyResponse) => String::new(),
        Err(e) => return Err(e.into()),
    };

    let points = split_points(&reply);
    info!(points = points.len(), "Summarized route");

    Ok(Json(SummarizeResponse { points }))
}

// ── Helpers ───────────────────────────────────────────────────────────────

fn titled_request(state: &ChatState, system: &str, user: &str) -> ProviderRequest {
    ProviderRequest::new(
        &state.model,
        vec![Message::system(system), Message::user(user)],
    )
    .with_max_tokens(state.max_tokens)
}

/// Repair the reply into an object and require string `title`/`message`.
fn decode_titled(raw: &str) -> Result<TitledReply, RepairError> {
    let map = repair::extract(raw).into_result()?;
    serde_json::from_value(Value::Object(map)).map_err(|e| RepairError {
        reason: e.to_string(),
    })
}

/// Split a `;`-separated model reply into trimmed route points.
///
/// Blank output means no route: an empty list. Otherwise every segment is
/// kept, so a trailing `;` yields a trailing empty string.
fn split_points(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(';').map(|p| p.trim().to_string()).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    use wayfarer_core::message::Role;
    use wayfarer_core::provider::{ProviderResponse, Usage};

    use crate::error::ErrorResponse;

    const KEY: &str = "test-backend-key";

    /// Returns scripted replies in order and records every request.
    struct ScriptedProvider {
        replies: Mutex<Vec<Result<String, ProviderError>>>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn text(replies: &[&str]) -> Arc<Self> {
            Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
        }

        fn requests(&self) -> Vec<ProviderRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "chat_mock"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .expect("ScriptedProvider exhausted")?;
            Ok(ProviderResponse {
                message: Message::assistant(reply),
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock-model".into(),
            })
        }
    }

    fn state_with(provider: Arc<ScriptedProvider>, backend_key: Option<&str>) -> SharedChatState {
        Arc::new(ChatState {
            provider,
            model: "mock-model".into(),
            temperature: 1.3,
            max_tokens: 256,
            summarize_max_tokens: 400,
            keep_last: 8,
            backend_key: backend_key.map(String::from),
        })
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("AI_BACKEND_KEY", KEY)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn dialogue(len: usize) -> Vec<Message> {
        (0..len)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("u{i}"))
                } else {
                    Message::assistant(format!("a{i}"))
                }
            })
            .collect()
    }

    // --- health / auth ---

    #[tokio::test]
    async fn health_needs_no_key() {
        let app = chat_router(state_with(ScriptedProvider::text(&[]), None));
        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse = json_body(response).await;
        assert_eq!(health.status, "ok");
        assert!(health.model_loaded);
    }

    #[tokio::test]
    async fn wrong_key_is_forbidden() {
        let provider = ScriptedProvider::text(&[]);
        let app = chat_router(state_with(provider.clone(), Some("other-key")));

        let response = app
            .oneshot(post(
                "/api/response",
                serde_json::json!({"message": "hi", "context": []}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let err: ErrorResponse = json_body(response).await;
        assert_eq!(err.detail, "Forbidden: invalid key");
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_header_is_forbidden() {
        let app = chat_router(state_with(ScriptedProvider::text(&[]), Some(KEY)));
        let req = Request::builder()
            .method("POST")
            .uri("/api/response/summarize")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"context": []}"#))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unset_server_key_is_500() {
        let app = chat_router(state_with(ScriptedProvider::text(&[]), None));
        let response = app
            .oneshot(post("/api/response/create", serde_json::json!({"message": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err: ErrorResponse = json_body(response).await;
        assert!(err.detail.contains("misconfiguration"));
    }

    // --- /api/response ---

    #[tokio::test]
    async fn answer_with_empty_context() {
        let provider = ScriptedProvider::text(&["Try the Botanical Garden, ten minutes away."]);
        let app = chat_router(state_with(provider.clone(), Some(KEY)));

        let response = app
            .oneshot(post(
                "/api/response",
                serde_json::json!({"message": "Suggest a park nearby", "context": []}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: MessageResponse = json_body(response).await;
        assert_eq!(body.message, "Try the Botanical Garden, ten minutes away.");
        assert_eq!(
            body.context,
            vec![
                Message::user("Suggest a park nearby"),
                Message::assistant("Try the Botanical Garden, ten minutes away."),
            ]
        );

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.temperature, Some(1.3));
        assert_eq!(sent.max_tokens, Some(256));
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(sent.messages[0].role, Role::System);
        assert_eq!(sent.messages[1], Message::user("Suggest a park nearby"));
    }

    #[tokio::test]
    async fn answer_sends_context_between_system_and_user() {
        let provider = ScriptedProvider::text(&["Sure."]);
        let app = chat_router(state_with(provider.clone(), Some(KEY)));

        let context = dialogue(2);
        let response = app
            .oneshot(post(
                "/api/response",
                serde_json::json!({"message": "And then?", "context": context}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let sent = &provider.requests()[0].messages;
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(&sent[1..3], &context[..]);
        assert_eq!(sent[3], Message::user("And then?"));

        let body: MessageResponse = json_body(response).await;
        assert_eq!(body.context.len(), 4);
    }

    #[tokio::test]
    async fn answer_trims_long_context() {
        let provider = ScriptedProvider::text(&["Last reply"]);
        let app = chat_router(state_with(provider, Some(KEY)));

        let response = app
            .oneshot(post(
                "/api/response",
                serde_json::json!({"message": "u10", "context": dialogue(10)}),
            ))
            .await
            .unwrap();
        let body: MessageResponse = json_body(response).await;

        // 12 turns -> first user turn + last 8.
        assert_eq!(body.context.len(), 9);
        assert_eq!(body.context[0], Message::user("u0"));
        assert_eq!(body.context[8], Message::assistant("Last reply"));
        assert_eq!(body.context[7], Message::user("u10"));
    }

    #[tokio::test]
    async fn provider_failure_is_generation_error() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::Network("refused".into()))]);
        let app = chat_router(state_with(provider, Some(KEY)));

        let response = app
            .oneshot(post(
                "/api/response",
                serde_json::json!({"message": "hi", "context": []}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err: ErrorResponse = json_body(response).await;
        assert!(err.detail.starts_with("Generation error:"));
    }

    #[tokio::test]
    async fn invalid_role_in_context_rejected() {
        let provider = ScriptedProvider::text(&[]);
        let app = chat_router(state_with(provider.clone(), Some(KEY)));

        let response = app
            .oneshot(post(
                "/api/response",
                serde_json::json!({
                    "message": "hi",
                    "context": [{"role": "wizard", "content": "x"}]
                }),
            ))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert!(provider.requests().is_empty());
    }

    // --- /api/response/create ---

    #[tokio::test]
    async fn create_parses_fenced_json() {
        let provider = ScriptedProvider::text(&[
            "```json\n{\"title\": \"Coffee walk downtown\", \"message\": \"Start at Cafe Central.\"}\n```",
        ]);
        let app = chat_router(state_with(provider.clone(), Some(KEY)));

        let response = app
            .oneshot(post(
                "/api/response/create",
                serde_json::json!({"message": "Plan a coffee walk"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: TitleResponse = json_body(response).await;
        assert_eq!(body.title, "Coffee walk downtown");
        assert_eq!(body.message, "Start at Cafe Central.");
        assert_eq!(
            body.context,
            vec![
                Message::user("Plan a coffee walk"),
                Message::assistant("Start at Cafe Central."),
            ]
        );
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn create_retries_once_with_short_title_prompt() {
        let provider = ScriptedProvider::text(&[
            "Here is a nice walk for you, no JSON though.",
            r#"{"title": "Riverside stroll", "message": "Walk along the embankment."}"#,
        ]);
        let app = chat_router(state_with(provider.clone(), Some(KEY)));

        let response = app
            .oneshot(post(
                "/api/response/create",
                serde_json::json!({"message": "Walk by the river"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: TitleResponse = json_body(response).await;
        assert_eq!(body.title, "Riverside stroll");

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].messages[0].content, prompts::TITLED_ANSWER);
        assert_eq!(requests[1].messages[0].content, prompts::SHORT_TITLE);
        assert_eq!(requests[1].messages[1], Message::user("Walk by the river"));
        assert_eq!(requests[0].temperature, Some(1.3));
        assert_eq!(requests[1].temperature, Some(1.3));
    }

    #[tokio::test]
    async fn create_missing_fields_trigger_retry() {
        let provider = ScriptedProvider::text(&[
            r#"{"title": "Only a title"}"#,
            r#"{"title": "Museum day", "message": "Visit the Tretyakov."}"#,
        ]);
        let app = chat_router(state_with(provider.clone(), Some(KEY)));

        let response = app
            .oneshot(post(
                "/api/response/create",
                serde_json::json!({"message": "Museums?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn create_retry_provider_failure_is_generation_error() {
        let provider = ScriptedProvider::new(vec![
            Ok("no JSON here".into()),
            Err(ProviderError::Network("connection reset".into())),
        ]);
        let app = chat_router(state_with(provider.clone(), Some(KEY)));

        let response = app
            .oneshot(post(
                "/api/response/create",
                serde_json::json!({"message": "Parks in Kazan"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err: ErrorResponse = json_body(response).await;
        assert!(err.detail.starts_with("Generation error:"));
        assert!(err.detail.contains("connection reset"));
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn create_fails_after_second_bad_reply() {
        let provider = ScriptedProvider::text(&["not json", "still not json"]);
        let app = chat_router(state_with(provider.clone(), Some(KEY)));

        let response = app
            .oneshot(post(
                "/api/response/create",
                serde_json::json!({"message": "Anything"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err: ErrorResponse = json_body(response).await;
        assert!(err.detail.starts_with("Convert to JSON error:"));
        assert!(err.detail.contains("no JSON object found"));
        assert_eq!(provider.requests().len(), 2);
    }

    // --- /api/response/summarize ---

    #[tokio::test]
    async fn summarize_splits_and_trims_points() {
        let provider = ScriptedProvider::text(&["Park ; Cafe Central ;  Museum"]);
        let app = chat_router(state_with(provider.clone(), Some(KEY)));

        let response = app
            .oneshot(post(
                "/api/response/summarize",
                serde_json::json!({"context": dialogue(4)}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: SummarizeResponse = json_body(response).await;
        assert_eq!(body.points, vec!["Park", "Cafe Central", "Museum"]);

        let sent = &provider.requests()[0];
        assert_eq!(sent.temperature, None);
        assert_eq!(sent.max_tokens, Some(400));
        assert_eq!(sent.messages.len(), 6);
        assert_eq!(sent.messages[0].content, prompts::ROUTE_POINTS);
        assert_eq!(sent.messages[5], Message::user(prompts::ROUTE_POINTS_REQUEST));
    }

    #[tokio::test]
    async fn summarize_null_content_is_empty_list() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::EmptyResponse)]);
        let app = chat_router(state_with(provider, Some(KEY)));

        let response = app
            .oneshot(post(
                "/api/response/summarize",
                serde_json::json!({"context": []}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: SummarizeResponse = json_body(response).await;
        assert!(body.points.is_empty());
    }

    #[test]
    fn split_points_keeps_trailing_empty_segment() {
        assert_eq!(split_points("Park; Museum;"), vec!["Park", "Museum", ""]);
    }

    #[test]
    fn split_points_blank_output_is_empty() {
        assert!(split_points("").is_empty());
        assert!(split_points("  \n ").is_empty());
    }

    #[test]
    fn split_points_single_point() {
        assert_eq!(split_points(" Red Square "), vec!["Red Square"]);
    }

    #[test]
    fn decode_titled_requires_string_fields() {
        assert!(decode_titled(r#"{"title": 3, "message": "m"}"#).is_err());
        let ok = decode_titled(r#"noise {"title": "t", "message": "m", "extra": 1} noise"#)
            .unwrap();
        assert_eq!(ok.title, "t");
        assert_eq!(ok.message, "m");
    }
}
