use serde::{Deserialize, Serialize};
use webbrief_core::{Error, Result, Summarizer};

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn deepseek_api_key_from_env() -> Option<String> {
    env("WEBBRIEF_DEEPSEEK_API_KEY").or_else(|| env("DEEPSEEK_API_KEY"))
}

/// Bound on the text we ship to the remote API. Pages can be arbitrarily
/// large; anything past this prefix adds cost without improving a
/// five-sentence summary.
const MAX_INPUT_CHARS: usize = 24_000;

const REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Summarization via the DeepSeek chat-completions API (OpenAI-compatible
/// shape). Construction fails without an API key; the caller falls back to
/// the local frequency summarizer.
#[derive(Debug, Clone)]
pub struct DeepseekSummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl DeepseekSummarizer {
    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let api_key = deepseek_api_key_from_env().ok_or_else(|| {
            Error::NotConfigured("missing WEBBRIEF_DEEPSEEK_API_KEY (or DEEPSEEK_API_KEY)".to_string())
        })?;
        let model = env("WEBBRIEF_DEEPSEEK_MODEL").unwrap_or_else(|| "deepseek-chat".to_string());
        Ok(Self {
            client,
            api_key,
            model,
            endpoint: Self::default_endpoint(),
        })
    }

    fn default_endpoint() -> String {
        // Docs: https://api-docs.deepseek.com
        //
        // Allow override for testing/debugging (do not include secrets here).
        env("WEBBRIEF_DEEPSEEK_ENDPOINT")
            .unwrap_or_else(|| "https://api.deepseek.com/chat/completions".to_string())
    }

    fn truncate_chars(s: &str, max_chars: usize) -> &str {
        match s.char_indices().nth(max_chars) {
            Some((i, _)) => &s[..i],
            None => s,
        }
    }
}

#[async_trait::async_trait]
impl Summarizer for DeepseekSummarizer {
    fn name(&self) -> &'static str {
        "deepseek"
    }

    async fn summarize(&self, text: &str, max_sentences: usize) -> Result<String> {
        let req = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are an extractive summarizer. Answer with sentences \
                              selected verbatim from the provided text, joined by single \
                              spaces, and nothing else."
                        .to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Select at most {max_sentences} sentences that best summarize the \
                         following text.\n\n{}",
                        Self::truncate_chars(text, MAX_INPUT_CHARS)
                    ),
                },
            ],
            stream: Some(false),
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&req)
            .timeout(std::time::Duration::from_millis(REQUEST_TIMEOUT_MS))
            .send()
            .await
            .map_err(|e| Error::Summarize(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Summarize(format!("deepseek chat HTTP {status}")));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::Summarize(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Summarize("deepseek chat returned no choices".to_string()))?;
        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChatMessage,
}
