use serde::Deserialize;
use serde_json::json;

use crate::error::Error;

/// Thin client for the hosted SMS verification service. One verification is
/// started per phone number; checking consumes the pending code.
pub struct SmsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct VerificationStatus {
    status: String,
}

impl SmsClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    pub async fn send_code(&self, phone: &str) -> Result<(), Error> {
        let resp = self
            .http
            .post(format!("{}/verifications", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "to": phone, "channel": "sms" }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::Upstream(format!("sms provider returned {}", resp.status())));
        }
        Ok(())
    }

    pub async fn check_code(&self, phone: &str, code: &str) -> Result<bool, Error> {
        let resp = self
            .http
            .post(format!("{}/verification_checks", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "to": phone, "code": code }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::Upstream(format!("sms provider returned {}", resp.status())));
        }
        let body: VerificationStatus = resp.json().await?;
        Ok(body.status == "approved")
    }
}
