use actix_web::web::{Data, Json};
use serde::{Deserialize, Serialize};

use crate::clients::vision::VisionClient;
use crate::error::Error;
use crate::tracking::track;

#[derive(Debug, Deserialize)]
pub struct OcrRequest {
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct OcrResponse {
    pub text: String,
    pub blocks: Vec<String>,
}

/// Stateless OCR proxy: base64 image in, detected text out. The first
/// annotation from the provider is the full text, the rest are the
/// individual blocks.
pub async fn ocr(Json(req): Json<OcrRequest>, vision: Data<VisionClient>) -> Result<Json<OcrResponse>, Error> {
    if req.image.trim().is_empty() {
        return Err(Error::Validation("image content is required".into()));
    }
    let mut annotations = track("ocr_detect", vision.detect_text(&req.image)).await?;
    let text = if annotations.is_empty() { String::new() } else { annotations.remove(0) };
    Ok(Json(OcrResponse { text, blocks: annotations }))
}
