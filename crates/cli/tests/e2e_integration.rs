//! End-to-end integration tests for the SmartFlow agent service.
//!
//! These tests drive the full HTTP stack from request to answer: the
//! composition root, the router, both agent loops, the real tools and the
//! knowledge base, with only the language model scripted.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use smartflow_config::AppConfig;
use smartflow_core::ModelGateway;
use smartflow_core::error::ProviderError;
use smartflow_core::message::MessageToolCall;
use smartflow_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Generation, Provider, ProviderRequest, ProviderResponse,
};
use smartflow_gateway::{AppState, SharedState, build_router};
use tower::ServiceExt;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted generations in sequence and keeps
/// every request it saw. Structured output is reported as unsupported, so
/// planners fall back to free text.
struct ScriptedProvider {
    responses: Mutex<VecDeque<Generation>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Generation>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let output = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider exhausted at call #{call}"));
        Ok(ProviderResponse {
            output,
            usage: None,
            model: "mock".into(),
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|_| vec![0.6, 0.8]).collect(),
            model: request.model,
        })
    }
}

fn text(content: &str) -> Generation {
    Generation::Text {
        content: content.into(),
    }
}

fn tool_call(name: &str, args: serde_json::Value) -> Generation {
    Generation::from_parts(
        String::new(),
        vec![MessageToolCall::new(
            format!("call_{name}"),
            name,
            args.to_string(),
        )],
    )
}

fn service(provider: &Arc<ScriptedProvider>, config: AppConfig) -> SharedState {
    let gateway = ModelGateway::new(provider.clone(), "mock");
    Arc::new(AppState::with_gateway(&config, gateway))
}

async fn chat(state: &SharedState, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = build_router(state.clone()).oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ── E2E: ReAct ───────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_react_calculator_tool_invocation() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_call("calculator", serde_json::json!({"expression": "2 + 2"})),
        text("2 + 2 等于 4。"),
    ]));
    let state = service(&provider, AppConfig::default());

    let (status, json) = chat(
        &state,
        serde_json::json!({"message": "2+2等于几?", "agent_mode": "react"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "2 + 2 等于 4。");
    assert_eq!(json["agent_mode"], "react");
    let steps = json["intermediate_steps"].as_array().unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0]["tool"], "calculator");
    assert_eq!(steps[0]["output"], "计算结果: 2 + 2 = 4");

    // The second model call saw the tool result.
    let requests = provider.requests();
    let last = requests[1].messages.last().unwrap();
    assert_eq!(last.content, "计算结果: 2 + 2 = 4");
}

#[tokio::test]
async fn e2e_react_database_summary() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_call("database_query", serde_json::json!({"query_type": "summary"})),
        text("全年销售额为 ¥21,270,000。"),
    ]));
    let state = service(&provider, AppConfig::default());

    let (status, json) = chat(
        &state,
        serde_json::json!({"message": "全年销售情况如何?", "agent_mode": "react"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let output = json["intermediate_steps"][0]["output"].as_str().unwrap();
    assert!(output.contains("¥21,270,000"));
    assert!(output.contains("55000"));
    assert!(output.contains("2024-12"));
}

// ── E2E: Plan-Execute ────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_auto_routes_weather_comparison_to_plan_execute() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        // classifier
        text("plan_execute"),
        // planner (free text after structured output is unsupported)
        text("1. 查询北京天气\n2. 查询上海天气"),
        // step 1 uses a tool, then reports
        tool_call("weather_query", serde_json::json!({"city": "北京"})),
        text("北京晴"),
        // step 2 answers directly
        text("上海多云"),
        // summarizer
        text("北京晴，上海多云。"),
    ]));
    let state = service(&provider, AppConfig::default());

    let (status, json) = chat(
        &state,
        serde_json::json!({"message": "比较北京和上海的天气"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["agent_mode"], "plan_execute");
    assert_eq!(json["response"], "北京晴，上海多云。");
    assert_eq!(
        json["plan"],
        serde_json::json!(["查询北京天气", "查询上海天气"])
    );
    assert_eq!(
        json["intermediate_steps"],
        serde_json::json!([
            {"tool": "步骤1", "tool_input": "查询北京天气", "output": "北京晴"},
            {"tool": "步骤2", "tool_input": "查询上海天气", "output": "上海多云"}
        ])
    );

    // The weather fixture reached step 1's second model call.
    let requests = provider.requests();
    let observed = requests[3].messages.last().unwrap();
    assert!(observed.content.contains("北京"));
}

// ── E2E: Knowledge base ──────────────────────────────────────────────────

#[tokio::test]
async fn e2e_upload_then_rag_chat() {
    let provider = Arc::new(ScriptedProvider::new(vec![text("7天内可以退货。")]));
    let state = service(&provider, AppConfig::default());

    let boundary = "e2e-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"collection_name\"\r\n\r\n\
         policies\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"returns.md\"\r\n\
         Content-Type: text/markdown\r\n\r\n\
         # 退货政策\n\n商品签收后7天内可无理由退货。\r\n\
         --{boundary}--\r\n"
    );
    let req = Request::builder()
        .method("POST")
        .uri("/api/documents/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = build_router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, json) = chat(
        &state,
        serde_json::json!({
            "message": "退货期限是多久?",
            "agent_mode": "react",
            "use_rag": true,
            "collection_name": "policies"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sources"], serde_json::json!(["policies"]));

    let system = &provider.requests()[0].messages[0].content;
    assert!(system.contains("[来源: returns.md]"));
    assert!(system.contains("7天内可无理由退货"));
}

// ── E2E: Session memory ──────────────────────────────────────────────────

#[tokio::test]
async fn e2e_history_carries_across_turns() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        text("你好，小明。"),
        text("你叫小明。"),
    ]));
    let state = service(&provider, AppConfig::default());

    for message in ["我叫小明", "我叫什么?"] {
        let (status, _) = chat(
            &state,
            serde_json::json!({"message": message, "agent_mode": "react", "session_id": "u1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let requests = provider.requests();
    let replayed: Vec<_> = requests[1].messages[1..]
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(replayed, vec!["我叫小明", "你好，小明。", "我叫什么?"]);
}

#[tokio::test]
async fn e2e_session_window_is_bounded() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        text("a1"),
        text("a2"),
        text("a3"),
    ]));
    let mut config = AppConfig::default();
    config.memory.short_term_max_messages = 4;
    let state = service(&provider, config);

    for message in ["q1", "q2", "q3"] {
        chat(
            &state,
            serde_json::json!({"message": message, "agent_mode": "react"}),
        )
        .await;
    }

    let history = state.sessions.history("default").await;
    let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["q2", "a2", "q3", "a3"]);
}
