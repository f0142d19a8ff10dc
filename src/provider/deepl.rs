use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::TranslationProvider;
use super::common::{parse_json, require_translation, send_checked};
use crate::config::DeepLConfig;
use crate::error::Result;
use crate::language::{AUTO, primary_subtag};

const NAME: &str = "deepl";

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

/// DeepL wants upper-case codes. Targets keep their region (`EN-US`);
/// sources only accept the bare language.
fn target_code(code: &str) -> String {
    code.trim().replace('_', "-").to_uppercase()
}

fn source_code(code: &str) -> Option<String> {
    let code = code.trim().to_lowercase();
    if code.is_empty() || code == AUTO {
        None
    } else {
        Some(primary_subtag(&code).to_uppercase())
    }
}

pub struct DeepLProvider {
    client: Client,
    config: DeepLConfig,
}

impl DeepLProvider {
    pub fn new(client: Client, config: DeepLConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl TranslationProvider for DeepLProvider {
    async fn translate(&self, text: &str, target_language: &str, source_language: &str) -> Result<String> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let mut params = vec![
            ("text", text.to_string()),
            ("target_lang", target_code(target_language)),
        ];
        if let Some(source) = source_code(source_language) {
            params.push(("source_lang", source));
        }

        let request = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("DeepL-Auth-Key {}", api_key))
            .form(&params);

        let response = send_checked(NAME, request).await?;
        let body: DeepLResponse = parse_json(NAME, response).await?;

        require_translation(NAME, body.translations.into_iter().next().map(|t| t.text))
    }
}
