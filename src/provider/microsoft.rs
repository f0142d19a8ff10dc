use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::TranslationProvider;
use super::common::{parse_json, require_translation, send_checked};
use crate::config::MicrosoftConfig;
use crate::error::Result;
use crate::language::{self, AUTO};

const NAME: &str = "microsoft";

#[derive(Debug, Deserialize)]
struct MicrosoftItem {
    #[serde(default)]
    translations: Vec<MicrosoftTranslation>,
}

#[derive(Debug, Deserialize)]
struct MicrosoftTranslation {
    text: String,
}

/// Microsoft Translator (Azure Cognitive Services), API v3.
pub struct MicrosoftProvider {
    client: Client,
    config: MicrosoftConfig,
}

impl MicrosoftProvider {
    pub fn new(client: Client, config: MicrosoftConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl TranslationProvider for MicrosoftProvider {
    async fn translate(&self, text: &str, target_language: &str, source_language: &str) -> Result<String> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let mut query = vec![("api-version", "3.0".to_string()), ("to", language::normalize(target_language))];
        let source = language::normalize(source_language);
        if !source.is_empty() && source != AUTO {
            query.push(("from", source));
        }

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .query(&query)
            .header("Ocp-Apim-Subscription-Key", api_key)
            .json(&json!([{ "Text": text }]));
        if let Some(region) = self.config.region.as_deref().filter(|r| !r.trim().is_empty()) {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }

        let response = send_checked(NAME, request).await?;
        let items: Vec<MicrosoftItem> = parse_json(NAME, response).await?;

        let translation = items
            .into_iter()
            .next()
            .and_then(|item| item.translations.into_iter().next())
            .map(|t| t.text);
        require_translation(NAME, translation)
    }
}
