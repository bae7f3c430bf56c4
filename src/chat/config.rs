//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the binary builds its backend and tool servers from.
//! Settings come from three places, highest precedence first: command-line
//! flags, the process environment, built-in defaults.

use std::env;
use std::fmt;

use arrrg_derive::CommandLine;

use crate::client::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, GeminiService};
use crate::error::{Error, Result};
use crate::servers::{DOCUMENT_SERVER_ID, ServerCommand, script_server_id};

/// Environment variable naming the Gemini model.
pub const MODEL_VAR: &str = "GEMINI_MODEL";
/// Environment variable holding the Gemini API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Environment variable that switches the document server to `uv run`.
pub const USE_UV_VAR: &str = "USE_UV";

/// Command-line arguments for the relaychat tool.
///
/// Free arguments after the flags are extra server scripts.
#[derive(CommandLine, Debug, Default, Eq, PartialEq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Gemini model (default: $GEMINI_MODEL or gemini-1.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature, parsed when the config is resolved.
    #[arrrg(optional, "Sampling temperature (default: 0.7)", "TEMP")]
    pub temperature: Option<String>,

    /// Maximum output tokens per reply.
    #[arrrg(optional, "Max output tokens per reply (default: 512)", "TOKENS")]
    pub max_output_tokens: Option<u32>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments and the environment with appropriate defaults.
#[derive(Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: String,

    /// Credential for the backend.
    pub api_key: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum output tokens per reply.
    pub max_output_tokens: u32,

    /// Launch the document server through `uv run`.
    pub use_uv: bool,

    /// Extra server scripts, each launched with `uv run`.
    pub server_scripts: Vec<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-1.5-flash
    /// - Temperature: 0.7
    /// - Max output tokens: 512
    /// - Document server: `python mcp_server.py`
    /// - Color: enabled
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            use_uv: false,
            server_scripts: Vec::new(),
            use_color: true,
        }
    }

    /// Resolves configuration from `args`, the extra server `scripts` and
    /// the process environment.
    pub fn from_env(args: ChatArgs, scripts: Vec<String>) -> Result<Self> {
        Self::resolve(args, scripts, |name| env::var(name).ok())
    }

    /// Resolves configuration using `lookup` in place of the process
    /// environment.
    pub fn resolve<F>(args: ChatArgs, scripts: Vec<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = args
            .model
            .or_else(|| lookup(MODEL_VAR))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_key = lookup(API_KEY_VAR).unwrap_or_default();
        let use_uv = lookup(USE_UV_VAR).is_some_and(|value| value == "1");
        let temperature = match args.temperature.as_deref() {
            Some(raw) => raw.trim().parse::<f32>().map_err(|_| {
                Error::validation(
                    format!("temperature must be a number, got {raw:?}"),
                    Some("temperature".to_string()),
                )
            })?,
            None => DEFAULT_TEMPERATURE,
        };

        let config = ChatConfig {
            model,
            api_key,
            temperature,
            max_output_tokens: args.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            use_uv,
            server_scripts: scripts,
            use_color: !args.no_color,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the model and key are usable.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::validation(
                "GEMINI_MODEL cannot be empty",
                Some(MODEL_VAR.to_string()),
            ));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::validation(
                "GEMINI_API_KEY cannot be empty",
                Some(API_KEY_VAR.to_string()),
            ));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(Error::validation(
                format!("temperature must be a non-negative number, got {}", self.temperature),
                Some("temperature".to_string()),
            ));
        }
        Ok(())
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum output tokens per reply.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Selects `uv run` for the document server.
    pub fn with_uv(mut self, use_uv: bool) -> Self {
        self.use_uv = use_uv;
        self
    }

    /// Sets the extra server scripts.
    pub fn with_server_scripts(mut self, scripts: Vec<String>) -> Self {
        self.server_scripts = scripts;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Builds the backend described by this configuration.
    pub fn service(&self) -> Result<GeminiService> {
        Ok(
            GeminiService::new(Some(self.api_key.clone()), self.model.clone())?
                .with_temperature(self.temperature)
                .with_max_output_tokens(self.max_output_tokens),
        )
    }

    /// Every server to launch, in launch order: the document server first,
    /// then one per extra script.
    pub fn server_commands(&self) -> Vec<(String, ServerCommand)> {
        let mut commands = vec![(
            DOCUMENT_SERVER_ID.to_string(),
            ServerCommand::document_server(self.use_uv),
        )];
        for (index, script) in self.server_scripts.iter().enumerate() {
            commands.push((script_server_id(index, script), ServerCommand::script(script)));
        }
        commands
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("use_uv", &self.use_uv)
            .field("server_scripts", &self.server_scripts)
            .field("use_color", &self.use_color)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn default_config() {
        let config = ChatConfig::new("key");
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_output_tokens, 512);
        assert!(!config.use_uv);
        assert!(config.server_scripts.is_empty());
        assert!(config.use_color);
        config.validate().unwrap();
    }

    #[test]
    fn resolve_from_environment() {
        let config = ChatConfig::resolve(
            ChatArgs::default(),
            vec!["weather.py".to_string()],
            lookup(&[
                ("GEMINI_MODEL", "gemini-2.0-flash"),
                ("GEMINI_API_KEY", "secret"),
                ("USE_UV", "1"),
            ]),
        )
        .unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.api_key, "secret");
        assert!(config.use_uv);
        assert_eq!(config.server_scripts, vec!["weather.py".to_string()]);
    }

    #[test]
    fn model_defaults_when_unset() {
        let config =
            ChatConfig::resolve(ChatArgs::default(), Vec::new(), lookup(&[("GEMINI_API_KEY", "k")]))
                .unwrap();
        assert_eq!(config.model, "gemini-1.5-flash");
        assert!(!config.use_uv);
    }

    #[test]
    fn only_exact_one_enables_uv() {
        let config = ChatConfig::resolve(
            ChatArgs::default(),
            Vec::new(),
            lookup(&[("GEMINI_API_KEY", "k"), ("USE_UV", "true")]),
        )
        .unwrap();
        assert!(!config.use_uv);
    }

    #[test]
    fn args_override_environment() {
        let args = ChatArgs {
            model: Some("gemini-1.5-pro".to_string()),
            temperature: Some("0.1".to_string()),
            max_output_tokens: Some(2048),
            no_color: true,
        };
        let config = ChatConfig::resolve(
            args,
            Vec::new(),
            lookup(&[("GEMINI_MODEL", "gemini-2.0-flash"), ("GEMINI_API_KEY", "k")]),
        )
        .unwrap();
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.max_output_tokens, 2048);
        assert!(!config.use_color);
    }

    #[test]
    fn missing_or_empty_settings_rejected() {
        let err = ChatConfig::resolve(ChatArgs::default(), Vec::new(), lookup(&[])).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let err = ChatConfig::resolve(
            ChatArgs::default(),
            Vec::new(),
            lookup(&[("GEMINI_MODEL", ""), ("GEMINI_API_KEY", "k")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("GEMINI_MODEL"));

        let err = ChatConfig::new("k").with_temperature(-1.0).validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn non_numeric_temperature_rejected() {
        let args = ChatArgs {
            temperature: Some("warm".to_string()),
            ..ChatArgs::default()
        };
        let err = ChatConfig::resolve(args, Vec::new(), lookup(&[("GEMINI_API_KEY", "k")]))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("warm"));

        let args = ChatArgs {
            temperature: Some(" 1.5 ".to_string()),
            ..ChatArgs::default()
        };
        let config =
            ChatConfig::resolve(args, Vec::new(), lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.temperature, 1.5);
    }

    #[test]
    fn server_commands_in_launch_order() {
        let config = ChatConfig::new("k")
            .with_uv(true)
            .with_server_scripts(vec!["a.py".to_string(), "b.py".to_string()]);
        let commands = config.server_commands();
        assert_eq!(
            commands,
            vec![
                ("doc_client".to_string(), ServerCommand::new("uv", ["run", "mcp_server.py"])),
                ("client_0_a.py".to_string(), ServerCommand::new("uv", ["run", "a.py"])),
                ("client_1_b.py".to_string(), ServerCommand::new("uv", ["run", "b.py"])),
            ]
        );
    }

    #[test]
    fn service_carries_settings() {
        let service = ChatConfig::new("k")
            .with_model("gemini-1.5-pro")
            .with_temperature(0.25)
            .with_max_output_tokens(128)
            .service()
            .unwrap();
        assert_eq!(service.model(), "gemini-1.5-pro");
        assert_eq!(service.temperature(), 0.25);
        assert_eq!(service.max_output_tokens(), 128);
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", ChatConfig::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
