//! Reference LLM provider: OpenAI-compatible chat completions
//!
//! Exposes `generate-text`, `check-model` and `list-models` actions.
//! The API key is resolved from the environment / `.env` file on every
//! call, so rotated credentials take effect without a restart. The
//! configured-check is a minimal `GET /models`.

use crate::actions::{Action, ParamKind};
use crate::connections::Connection;
use async_trait::async_trait;
use drover_common::constants::{providers, timeouts};
use drover_common::utils::{ENV_FILE, env_credential, store_env_credential};
use drover_common::{DroverError, Result};
use serde_json::{Map, Value, json};
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::warn;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub struct OpenAiConnection {
    base_url: String,
    model: String,
    api_key_env: String,
    client: reqwest::Client,
    actions: Vec<Action>,
}

impl OpenAiConnection {
    pub fn new() -> Self {
        Self::with_options(&Map::new())
    }

    /// Build from the profile's opaque configuration block. Recognized
    /// options: `base_url`, `model`, `api_key_env`.
    pub fn with_options(options: &Map<String, Value>) -> Self {
        let str_opt = |key: &str, default: &str| {
            options
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        };
        OpenAiConnection {
            base_url: str_opt("base_url", DEFAULT_BASE_URL),
            model: str_opt("model", DEFAULT_MODEL),
            api_key_env: str_opt("api_key_env", API_KEY_ENV),
            client: reqwest::Client::new(),
            actions: vec![
                Action::new("generate-text", "Generate text using the configured model")
                    .param("prompt", ParamKind::String, "The user prompt")
                    .param("system_prompt", ParamKind::String, "The system prompt")
                    .optional_param("model", ParamKind::String, "Override the default model"),
                Action::new("check-model", "Check if a model is available").param(
                    "model",
                    ParamKind::String,
                    "Model identifier to check",
                ),
                Action::new("list-models", "List available models"),
            ],
        }
    }

    fn api_key(&self) -> Result<String> {
        env_credential(&self.api_key_env).ok_or_else(|| {
            DroverError::Config(format!(
                "no API key found: set {} in the environment or .env file",
                self.api_key_env
            ))
        })
    }

    fn provider_err(&self, message: impl std::fmt::Display) -> DroverError {
        DroverError::Provider {
            connection: providers::OPENAI.to_string(),
            message: message.to_string(),
        }
    }

    async fn fetch_model_ids(&self) -> Result<Vec<String>> {
        let key = self.api_key()?;
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(key)
            .timeout(Duration::from_secs(timeouts::DEFAULT_HTTP_TIMEOUT))
            .send()
            .await
            .map_err(|e| self.provider_err(e))?
            .error_for_status()
            .map_err(|e| self.provider_err(e))?;

        let body: Value = response.json().await.map_err(|e| self.provider_err(e))?;
        let ids = body["data"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["id"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }

    async fn generate_text(
        &self,
        prompt: &str,
        system_prompt: &str,
        model: Option<&str>,
    ) -> Result<Value> {
        let key = self.api_key()?;
        let body = json!({
            "model": model.unwrap_or(&self.model),
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": prompt},
            ],
        });
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .timeout(Duration::from_secs(timeouts::DEFAULT_LLM_TIMEOUT))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.provider_err(e))?
            .error_for_status()
            .map_err(|e| self.provider_err(e))?;

        let reply: Value = response.json().await.map_err(|e| self.provider_err(e))?;
        let text = reply["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| self.provider_err("completion response had no message content"))?;
        Ok(Value::String(text.to_string()))
    }
}

impl Default for OpenAiConnection {
    fn default() -> Self {
        Self::new()
    }
}

fn required_str<'a>(args: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    args.get(key).and_then(Value::as_str).ok_or_else(|| {
        DroverError::Validation(vec![format!("missing required parameter: {}", key)])
    })
}

#[async_trait]
impl Connection for OpenAiConnection {
    fn name(&self) -> &str {
        providers::OPENAI
    }

    fn is_llm_provider(&self) -> bool {
        true
    }

    fn actions(&self) -> &[Action] {
        &self.actions
    }

    async fn configure(&self) -> Result<bool> {
        println!("OpenAI API setup");
        if self.is_configured(false).await {
            print!("OpenAI is already configured. Reconfigure? (y/n): ");
            std::io::stdout().flush()?;
            let mut answer = String::new();
            std::io::stdin().lock().read_line(&mut answer)?;
            if !answer.trim().eq_ignore_ascii_case("y") {
                return Ok(false);
            }
        }

        println!("Create an API key at https://platform.openai.com/account/api-keys");
        print!("Enter your OpenAI API key: ");
        std::io::stdout().flush()?;
        let mut key = String::new();
        std::io::stdin().lock().read_line(&mut key)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(DroverError::Config("no API key entered".to_string()));
        }

        store_env_credential(ENV_FILE, &self.api_key_env, key)?;
        println!("API key saved to {}", ENV_FILE);
        Ok(true)
    }

    async fn is_configured(&self, verbose: bool) -> bool {
        match self.fetch_model_ids().await {
            Ok(_) => true,
            Err(e) => {
                if verbose {
                    warn!("OpenAI credential check failed: {}", e);
                }
                false
            }
        }
    }

    async fn perform_action(&self, action: &str, args: &Map<String, Value>) -> Result<Value> {
        match action {
            "generate-text" => {
                let prompt = required_str(args, "prompt")?;
                let system_prompt = required_str(args, "system_prompt")?;
                let model = args.get("model").and_then(Value::as_str);
                self.generate_text(prompt, system_prompt, model).await
            }
            "check-model" => {
                let model = required_str(args, "model")?;
                let ids = self.fetch_model_ids().await?;
                Ok(Value::Bool(ids.iter().any(|id| id == model)))
            }
            "list-models" => {
                let ids = self.fetch_model_ids().await?;
                Ok(Value::Array(ids.into_iter().map(Value::String).collect()))
            }
            other => Err(DroverError::UnknownAction {
                connection: self.name().to_string(),
                action: other.to_string(),
            }),
        }
    }
}
