//! services/api/src/adapters/gemini.rs
//!
//! A thin client for the Gemini `generateContent` REST endpoint, shared by all
//! of the Gemini-backed adapters. It holds no state between calls.

use palazzo_core::codec;
use palazzo_core::domain::ImageData;
use palazzo_core::ports::{PortError, PortResult};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

//=========================================================================================
// Client
//=========================================================================================

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
        }
    }

    pub fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    /// Sends one request. Transport failures and non-2xx answers become
    /// `PortError::Unexpected` carrying the service's own message.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> PortResult<GenerateContentResponse> {
        let response = self
            .http
            .post(self.endpoint_for_model(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Gemini API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to decode Gemini response: {e}")))
    }
}

fn map_http_error(status: StatusCode, body: &str) -> PortError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| wrapper.error.message)
        .unwrap_or_else(|| body.to_string());
    PortError::Unexpected(format!("Gemini API error {}: {}", status.as_u16(), message))
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// A single user turn made of the given parts.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: None,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn image(image: &ImageData) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: codec::encode_base64(&image.bytes),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationConfig {
    pub fn image_only() -> Self {
        Self {
            response_modalities: Some(vec!["IMAGE".to_string()]),
            ..Default::default()
        }
    }

    pub fn json(schema: serde_json::Value) -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
            ..Default::default()
        }
    }

    pub fn deterministic() -> Self {
        Self {
            temperature: Some(0.0),
            ..Default::default()
        }
    }
}

//=========================================================================================
// Response Types
//=========================================================================================

#[derive(Deserialize, Debug, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    /// The first inline image of the first candidate.
    pub fn into_image(self) -> PortResult<ImageData> {
        let inline = self
            .parts()
            .filter_map(|part| part.inline_data.as_ref())
            .find(|inline| !inline.data.is_empty())
            .ok_or_else(|| {
                PortError::GenerationFailed("API did not return a generated image.".to_string())
            })?;

        let bytes = codec::decode_base64(&inline.data).map_err(|e| {
            PortError::GenerationFailed(format!("API returned unreadable image data: {e}"))
        })?;
        let mime_type = if inline.mime_type.is_empty() {
            "image/png".to_string()
        } else {
            inline.mime_type.clone()
        };
        Ok(ImageData::new(bytes, mime_type))
    }

    /// All text parts of the first candidate, joined.
    pub fn text(&self) -> String {
        self.parts()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Like `text`, but an empty answer counts as a failed generation.
    pub fn into_text(self) -> PortResult<String> {
        let text = self.text();
        if text.trim().is_empty() {
            return Err(PortError::GenerationFailed(
                "API did not return any text.".to_string(),
            ));
        }
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn request_serializes_in_gemini_shape() {
        let image = ImageData::new(vec![1u8, 2, 3], "image/png");
        let request = GenerateContentRequest::from_parts(vec![Part::image(&image), Part::text("hi")])
            .with_config(GenerationConfig::image_only());

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "inlineData": { "mimeType": "image/png", "data": "AQID" } },
                        { "text": "hi" }
                    ]
                }],
                "generationConfig": { "responseModalities": ["IMAGE"] }
            })
        );
    }

    #[test]
    fn plain_request_omits_generation_config() {
        let request = GenerateContentRequest::from_parts(vec![Part::text("hi")]);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn picks_the_first_inline_image() {
        let parsed = response(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here is your room" },
                    { "inlineData": { "mimeType": "image/png", "data": "AQID" } }
                ]}
            }]
        }));
        let image = parsed.into_image().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes.as_ref(), &[1u8, 2, 3]);
    }

    #[test]
    fn missing_image_is_a_generation_failure() {
        let parsed = response(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I cannot do that" }] } }]
        }));
        let err = parsed.into_image().unwrap_err();
        assert!(matches!(err, PortError::GenerationFailed(_)));
        assert_eq!(
            err.to_string(),
            "Generation failed: API did not return a generated image."
        );

        let empty = response(json!({}));
        assert!(matches!(
            empty.into_image(),
            Err(PortError::GenerationFailed(_))
        ));
    }

    #[test]
    fn joins_text_parts() {
        let parsed = response(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Sunny " }, { "text": "days #beach" }] } }]
        }));
        assert_eq!(parsed.into_text().unwrap(), "Sunny days #beach");
    }

    #[test]
    fn blank_text_is_a_generation_failure() {
        let parsed = response(json!({ "candidates": [{ "content": { "parts": [] } }] }));
        assert!(matches!(
            parsed.into_text(),
            Err(PortError::GenerationFailed(_))
        ));
    }

    #[test]
    fn endpoint_accepts_prefixed_models() {
        let client = GeminiClient::new(reqwest::Client::new(), "http://localhost/v1beta", "k");
        assert_eq!(
            client.endpoint_for_model("gemini-2.5-flash"),
            "http://localhost/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            client.endpoint_for_model("models/gemini-2.5-flash-image"),
            "http://localhost/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn http_errors_carry_the_service_message() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "An unexpected error occurred: Gemini API error 429: Quota exceeded"
        );

        let raw = map_http_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(raw.to_string().ends_with("Gemini API error 502: upstream down"));
    }
}
