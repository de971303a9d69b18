use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AnalysisError;
use crate::models::{AnalysisResult, ImagePayload};
use crate::services::ai_service::FoodAnalyzer;

pub const ANALYSIS_PROMPT: &str = "请分析这张图片中的食物，并按照以下格式返回JSON数据：{\"foods\":[{\"name\":\"食物名称\",\"calories\":\"热量值\",\"category\":\"high/medium/low\"}],\"total_calories\":\"总热量\"}。请只返回JSON数据，不要其他文字。";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    ImageUrl { image_url: ImageData },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Chat-completion client for the Volcengine Ark vision models.
pub struct ArkService {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl ArkService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, payload: &ImagePayload) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::ImageUrl {
                        image_url: ImageData {
                            url: payload.data_url(),
                        },
                    },
                    ContentPart::Text {
                        text: ANALYSIS_PROMPT.to_string(),
                    },
                ],
            }],
        }
    }
}

#[async_trait::async_trait]
impl FoodAnalyzer for ArkService {
    async fn analyze(&self, payload: &ImagePayload) -> Result<AnalysisResult, AnalysisError> {
        log::debug!("📸 Starting analysis of {} image ({} base64 bytes)", payload.mime_type(), payload.encoded_len());

        let request = self.build_request(payload);

        log::info!("🤖 Sending request to {} with model: {}", self.endpoint, self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ API error ({}): {}", status, error_text);
            return Err(AnalysisError::RequestFailed(status.as_u16()));
        }

        let response_text = response.text().await?;
        log::debug!("📄 Raw response size: {} bytes", response_text.len());

        Ok(parse_reply(&response_text))
    }
}

/// Reads `choices[0].message.content` and parses it as an [`AnalysisResult`].
/// Anything that does not fit falls back to the placeholder.
fn parse_reply(body: &str) -> AnalysisResult {
    let content = match serde_json::from_str::<ChatResponse>(body) {
        Ok(response) => response.choices.into_iter().next().and_then(|c| c.message.content),
        Err(e) => {
            log::warn!("⚠️ Unexpected response envelope: {}", e);
            None
        }
    };

    let Some(content) = content else {
        log::warn!("⚠️ No reply content, using placeholder result");
        return AnalysisResult::placeholder();
    };

    log::debug!("💬 Reply content: {}", content);

    match parse_content(&content) {
        Ok(result) => {
            log::info!("✅ Parsed {} foods, total {}", result.foods.len(), result.total_calories);
            result
        }
        Err(e) => {
            log::warn!("⚠️ Reply is not the expected JSON ({}), using placeholder result", e);
            AnalysisResult::placeholder()
        }
    }
}

fn parse_content(content: &str) -> Result<AnalysisResult, serde_json::Error> {
    serde_json::from_str(content.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalorieTier, FoodCategory};
    use httpmock::prelude::*;

    const PATH: &str = "/api/v3/chat/completions";

    fn service_for(server: &MockServer) -> ArkService {
        ArkService::new(&Config::for_endpoint(server.url(PATH))).unwrap()
    }

    fn reply(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    fn payload() -> ImagePayload {
        ImagePayload::encode("image/jpeg", &[0xff, 0xd8, 0xff])
    }

    #[test]
    fn test_request_body_shape() {
        let service = ArkService::new(&Config::for_endpoint("http://localhost")).unwrap();

        let body = serde_json::to_value(service.build_request(&payload())).unwrap();

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);

        let message = &body["messages"][0];
        assert_eq!(message["role"], "user");
        assert_eq!(message["content"][0]["type"], "image_url");
        assert_eq!(message["content"][0]["image_url"]["url"], "data:image/jpeg;base64,/9j/");
        assert_eq!(message["content"][1]["type"], "text");
        assert_eq!(message["content"][1]["text"], ANALYSIS_PROMPT);
    }

    #[tokio::test]
    async fn test_analyze_parses_reply_verbatim() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(PATH)
                    .header("authorization", "Bearer test-key")
                    .header("content-type", "application/json");
                then.status(200).json_body(reply(
                    r#"{"foods":[{"name":"牛排","calories":"400卡","category":"high"},{"name":"沙拉","calories":"约50卡","category":"low"}],"total_calories":"450卡"}"#,
                ));
            })
            .await;

        let result = service_for(&server).analyze(&payload()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.foods.len(), 2);
        assert_eq!(result.foods[0].name, "牛排");
        assert_eq!(result.foods[0].calories, "400卡");
        assert_eq!(result.foods[0].category, FoodCategory::Known(CalorieTier::High));
        assert_eq!(result.foods[1].calories, "约50卡");
        assert_eq!(result.total_calories, "450卡");
    }

    #[tokio::test]
    async fn test_analyze_non_json_reply_uses_placeholder() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200).json_body(reply("图片中有一份炸鸡和薯条，热量较高。"));
            })
            .await;

        let result = service_for(&server).analyze(&payload()).await.unwrap();

        assert_eq!(result, AnalysisResult::placeholder());
        assert_eq!(result.foods.len(), 4);
        assert_eq!(result.total_calories, "795卡");
    }

    #[tokio::test]
    async fn test_analyze_error_status() {
        for status in [400u16, 401, 429, 500, 503] {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(POST).path(PATH);
                    then.status(status).body("{\"error\":{\"message\":\"nope\"}}");
                })
                .await;

            let err = service_for(&server).analyze(&payload()).await.unwrap_err();

            assert!(
                matches!(err, AnalysisError::RequestFailed(s) if s == status),
                "status {} gave {:?}",
                status,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_analyze_connection_refused() {
        let config = Config::for_endpoint("http://127.0.0.1:1/api/v3/chat/completions");
        let service = ArkService::new(&config).unwrap();

        let err = service.analyze(&payload()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn test_analyze_fenced_json_reply_uses_placeholder() {
        let content = "Here you go: ```json\n{\"foods\":[{\"name\":\"牛排\",\"calories\":\"400卡\",\"category\":\"high\"}],\"total_calories\":\"400卡\"}\n```";
        assert!(serde_json::from_str::<serde_json::Value>(content).is_err());

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200).json_body(reply(content));
            })
            .await;

        let result = service_for(&server).analyze(&payload()).await.unwrap();

        assert_eq!(result, AnalysisResult::placeholder());
        assert_eq!(result.total_calories, "795卡");
    }

    #[test]
    fn test_parse_reply_fenced_json_uses_placeholder() {
        let body = reply("```json\n{\"foods\":[{\"name\":\"可乐\",\"calories\":\"150卡\",\"category\":\"medium\"}],\"total_calories\":\"150卡\"}\n```")
            .to_string();

        assert_eq!(parse_reply(&body), AnalysisResult::placeholder());
    }

    #[test]
    fn test_parse_reply_surrounding_text_uses_placeholder() {
        let body = reply("好的，结果如下：{\"foods\":[],\"total_calories\":\"0卡\"} 希望有帮助").to_string();

        assert_eq!(parse_reply(&body), AnalysisResult::placeholder());
    }

    #[test]
    fn test_parse_reply_trims_whitespace() {
        let body = reply("\n  {\"foods\":[],\"total_calories\":\"0卡\"}\n").to_string();

        let result = parse_reply(&body);

        assert!(result.foods.is_empty());
        assert_eq!(result.total_calories, "0卡");
    }

    #[test]
    fn test_parse_reply_wrong_shape_uses_placeholder() {
        let body = reply(r#"{"items":[{"name":"牛排"}]}"#).to_string();
        assert_eq!(parse_reply(&body), AnalysisResult::placeholder());
    }

    #[test]
    fn test_parse_reply_bad_envelope_uses_placeholder() {
        assert_eq!(parse_reply("not json"), AnalysisResult::placeholder());
        assert_eq!(parse_reply(r#"{"choices":[]}"#), AnalysisResult::placeholder());
        assert_eq!(
            parse_reply(r#"{"choices":[{"message":{"content":null}}]}"#),
            AnalysisResult::placeholder()
        );
    }
}
