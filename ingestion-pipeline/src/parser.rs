use bytes::Bytes;
use serde::Deserialize;
use tracing::{info, warn};

use common::{error::AppError, utils::config::AppConfig};

/// Client for the external document-digitization service. OCR is forced and
/// the response is requested as plain text.
#[derive(Clone)]
pub struct DocumentParser {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(default)]
    content: Option<ParsedContent>,
}

#[derive(Debug, Deserialize)]
struct ParsedContent {
    #[serde(default)]
    text: String,
}

impl DocumentParser {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.upstage_api_key.clone(),
            base_url: config.ocr_base_url.clone(),
        }
    }

    /// Uploads the document and returns the recognised plain text. Empty
    /// text is reported but left to the caller to handle.
    pub async fn parse(&self, bytes: Bytes, filename: &str) -> Result<String, AppError> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new()
            .text("ocr", "force")
            .text("base64_encoding", "[]")
            .text("model", "document-parse")
            .text("output_formats", "['text']")
            .part("document", part);

        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let body: ParseResponse = response.json().await?;
        let text = body.content.map(|content| content.text).unwrap_or_default();

        if text.is_empty() {
            warn!(filename = %filename, "document parse returned no text");
        } else {
            info!(
                filename = %filename,
                text_chars = text.chars().count(),
                "document parsed"
            );
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_response_tolerates_missing_content() {
        let body: ParseResponse = serde_json::from_str("{}").expect("deserialize");
        assert!(body.content.is_none());

        let body: ParseResponse =
            serde_json::from_str(r#"{"content": {"text": "제1조 계약의 목적"}}"#)
                .expect("deserialize");
        assert_eq!(
            body.content.map(|c| c.text).as_deref(),
            Some("제1조 계약의 목적")
        );
    }
}
