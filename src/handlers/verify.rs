use actix_web::web::{Data, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::clients::sms::SmsClient;
use crate::error::Error;
use crate::tracking::track;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum VerifyRequest {
    Send { phone: String },
    Check { phone: String, code: String },
    Skip,
}

/// Stateless OTP proxy. `skip` short-circuits without contacting the
/// provider, for flows where phone verification is optional.
pub async fn verify(Json(req): Json<VerifyRequest>, sms: Data<SmsClient>) -> Result<Json<Value>, Error> {
    match req {
        VerifyRequest::Send { phone } => {
            if phone.trim().is_empty() {
                return Err(Error::Validation("phone number is required".into()));
            }
            track("verify_send", sms.send_code(phone.trim())).await?;
            Ok(Json(json!({ "status": "pending" })))
        }
        VerifyRequest::Check { phone, code } => {
            if phone.trim().is_empty() || code.trim().is_empty() {
                return Err(Error::Validation("phone number and code are required".into()));
            }
            let approved = track("verify_check", sms.check_code(phone.trim(), code.trim())).await?;
            let status = if approved { "approved" } else { "rejected" };
            Ok(Json(json!({ "status": status, "verified": approved })))
        }
        VerifyRequest::Skip => Ok(Json(json!({ "status": "skipped", "verified": true }))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn actions_deserialize_by_tag() {
        let send: VerifyRequest = serde_json::from_str(r#"{"action": "send", "phone": "+358401234567"}"#).unwrap();
        assert!(matches!(send, VerifyRequest::Send { .. }));

        let check: VerifyRequest = serde_json::from_str(r#"{"action": "check", "phone": "+358401234567", "code": "123456"}"#).unwrap();
        assert!(matches!(check, VerifyRequest::Check { .. }));

        let skip: VerifyRequest = serde_json::from_str(r#"{"action": "skip"}"#).unwrap();
        assert!(matches!(skip, VerifyRequest::Skip));
    }
}
