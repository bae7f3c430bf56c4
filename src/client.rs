use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{GEMINI_REQUEST_DURATION, GEMINI_REQUEST_ERRORS, GEMINI_REQUESTS};
use crate::service::AiService;

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Output length cap used when none is configured.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 512;

/// Text-completion backend for the Gemini `generateContent` API.
///
/// Each call sends the prompt as a single user turn and returns the text of
/// the first candidate.  The service does not retry; failures come back as
/// the matching [`Error`] variant.
#[derive(Clone)]
pub struct GeminiService {
    api_key: HeaderValue,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl GeminiService {
    /// Create a new Gemini service for `model`.
    ///
    /// The API key can be provided directly or read from the GEMINI_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, model, None, None)
    }

    /// Create a new service with a custom endpoint and timeout.
    pub fn with_options(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var("GEMINI_API_KEY").map_err(|_| {
                Error::authentication(
                    "API key not provided and GEMINI_API_KEY environment variable not set",
                )
            })?,
        };
        if api_key.trim().is_empty() {
            return Err(Error::authentication("GEMINI_API_KEY cannot be empty"));
        }
        let mut api_key = HeaderValue::from_str(&api_key).map_err(|_| {
            Error::validation(
                "API key contains characters not allowed in a header",
                Some("GEMINI_API_KEY".to_string()),
            )
        })?;
        api_key.set_sensitive(true);

        let model = normalize_model(model.into());
        if model.is_empty() {
            return Err(Error::validation(
                "model cannot be empty",
                Some("GEMINI_MODEL".to_string()),
            ));
        }

        let base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = if base_url.ends_with('/') {
            Url::parse(&base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            model,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum number of output tokens.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Attach a logger that sees every prompt and reply.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The model this service talks to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The sampling temperature sent with every request.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// The output cap sent with every request.
    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    /// The `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("models/{}:generateContent", self.model))?)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-goog-api-key", self.api_key.clone());
        headers
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let (status, message) = parse_error_body(&error_body);
        Error::from_status(status_code, status, message, retry_after)
    }

    async fn send(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint()?;

        let response = self
            .client
            .post(url)
            .headers(self.default_headers())
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let reply = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                Error::serialization(
                    format!("Failed to parse response: {}", e),
                    Some(Box::new(e)),
                )
            })?;
        Ok(reply.text())
    }
}

#[async_trait::async_trait]
impl AiService for GeminiService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Some(logger) = &self.logger {
            logger.log_prompt(&self.model, prompt);
        }
        GEMINI_REQUESTS.click();
        let start = Instant::now();
        let result = self.send(prompt).await;
        GEMINI_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        match &result {
            Ok(text) => {
                if let Some(logger) = &self.logger {
                    logger.log_response(&self.model, text);
                }
            }
            Err(err) => {
                GEMINI_REQUEST_ERRORS.click();
                if let Some(logger) = &self.logger {
                    logger.log_error(&self.model, err);
                }
            }
        }
        result
    }
}

impl fmt::Debug for GeminiService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiService")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn normalize_model(model: String) -> String {
    let model = model.trim();
    model.strip_prefix("models/").unwrap_or(model).to_string()
}

/// Pulls the status string and message out of a Gemini error body.  Falls
/// back to the raw body when it is not the expected JSON shape.
fn parse_error_body(body: &str) -> (Option<String>, String) {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
        status: Option<String>,
    }

    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error);
    let status = detail.as_ref().and_then(|d| d.status.clone());
    let message = detail
        .and_then(|d| d.message)
        .unwrap_or_else(|| body.to_string());
    (status, message)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate; empty when the model
    /// returned no candidate text (for example when the prompt was blocked).
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
