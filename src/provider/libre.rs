use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::TranslationProvider;
use super::common::{parse_json, require_translation, send_checked};
use crate::config::LibreConfig;
use crate::error::Result;
use crate::language::{self, AUTO};

const NAME: &str = "libre";

#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: String,
    target: String,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    translated_text: Option<String>,
}

/// Self-hosted or public LibreTranslate instance.
pub struct LibreProvider {
    client: Client,
    config: LibreConfig,
}

impl LibreProvider {
    pub fn new(client: Client, config: LibreConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        let base = self.config.url.as_deref().unwrap_or_default();
        format!("{}/translate", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl TranslationProvider for LibreProvider {
    async fn translate(&self, text: &str, target_language: &str, source_language: &str) -> Result<String> {
        let source = language::normalize(source_language);
        let body = LibreRequest {
            q: text,
            source: if source.is_empty() { AUTO.to_string() } else { source },
            target: language::normalize(target_language),
            format: "text",
            api_key: self.config.api_key.as_deref().filter(|k| !k.trim().is_empty()),
        };

        let request = self.client.post(self.endpoint()).json(&body);
        let response = send_checked(NAME, request).await?;
        let body: LibreResponse = parse_json(NAME, response).await?;

        require_translation(NAME, body.translated_text)
    }
}
