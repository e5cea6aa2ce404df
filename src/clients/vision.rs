use serde::Deserialize;
use serde_json::json;

use crate::error::Error;

/// Client for the hosted vision API's text detection. Images travel as
/// base64 content straight through from the caller.
pub struct VisionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(rename = "textAnnotations", default)]
    text_annotations: Vec<TextAnnotation>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    description: String,
}

impl VisionClient {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    /// Returns the detected annotations, full text first, then the
    /// individual blocks as the provider reported them.
    pub async fn detect_text(&self, image_base64: &str) -> Result<Vec<String>, Error> {
        let payload = json!({
            "requests": [{
                "image": { "content": image_base64 },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        });
        let resp = self
            .http
            .post(format!("{}?key={}", self.endpoint, self.api_key))
            .json(&payload)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::Upstream(format!("vision provider returned {}", resp.status())));
        }
        let body: AnnotateResponse = resp.json().await?;
        let annotations = body
            .responses
            .into_iter()
            .next()
            .map(|r| r.text_annotations.into_iter().map(|a| a.description).collect())
            .unwrap_or_default();
        Ok(annotations)
    }
}
