//! Process-wide game configuration.
//!
//! Configuration is read once at startup, validated, and then passed by
//! value into the components that need it. Nothing reads the environment
//! after [`Config::from_env`] returns.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default cap on a character's reply, in characters.
pub const DEFAULT_MAX_RESPONSE_LENGTH: usize = 200;

/// Default title shown in the welcome banner.
pub const DEFAULT_GAME_TITLE: &str = "AI RPG Chat Game";

pub const ENV_PROVIDER: &str = "RPG_PROVIDER";
pub const ENV_API_KEY: &str = "RPG_API_KEY";
pub const ENV_MODEL: &str = "RPG_MODEL";
pub const ENV_MAX_RESPONSE_LENGTH: &str = "RPG_MAX_RESPONSE_LENGTH";
pub const ENV_DEBUG: &str = "RPG_DEBUG";
pub const ENV_GAME_TITLE: &str = "RPG_GAME_TITLE";

/// Errors raised while assembling the configuration. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No API key configured - set RPG_API_KEY in your environment or in a .env file \
         (see .env.example)"
    )]
    MissingApiKey,

    #[error("Unsupported AI provider: {name} (supported providers: {supported})")]
    UnsupportedProvider { name: String, supported: String },

    #[error("Invalid value for {key}: {value:?} (expected a positive whole number)")]
    InvalidNumber { key: &'static str, value: String },
}

/// A remote chat-completion backend.
///
/// Every provider speaks the OpenAI chat-completions protocol; they differ
/// only in endpoint and in the models they host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Kimi,
    DeepSeek,
    Zhipu,
    Qwen,
}

impl Provider {
    pub fn all() -> [Provider; 5] {
        [
            Provider::OpenAi,
            Provider::Kimi,
            Provider::DeepSeek,
            Provider::Zhipu,
            Provider::Qwen,
        ]
    }

    /// The name used to select this provider in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Kimi => "kimi",
            Provider::DeepSeek => "deepseek",
            Provider::Zhipu => "zhipu",
            Provider::Qwen => "qwen",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI official API",
            Provider::Kimi => "Kimi (Moonshot AI) API",
            Provider::DeepSeek => "DeepSeek API",
            Provider::Zhipu => "Zhipu AI API",
            Provider::Qwen => "Tongyi Qianwen API",
        }
    }

    /// Alternate endpoint, or `None` for the client's default endpoint.
    pub fn base_url(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => None,
            Provider::Kimi => Some("https://api.moonshot.cn/v1"),
            Provider::DeepSeek => Some("https://api.deepseek.com/v1"),
            Provider::Zhipu => Some("https://open.bigmodel.cn/api/paas/v4"),
            Provider::Qwen => Some("https://dashscope.aliyuncs.com/compatible-mode/v1"),
        }
    }

    /// The endpoint requests will actually go to.
    pub fn endpoint(&self) -> &'static str {
        self.base_url().unwrap_or(chat::DEFAULT_BASE_URL)
    }

    /// Models known to work with this provider. Informational only; the
    /// first entry is the default when no model is configured.
    pub fn suggested_models(&self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo"],
            Provider::Kimi => &["moonshot-v1-8k", "moonshot-v1-32k", "moonshot-v1-128k"],
            Provider::DeepSeek => &["deepseek-chat"],
            Provider::Zhipu => &["glm-4", "glm-3-turbo"],
            Provider::Qwen => &["qwen-turbo", "qwen-plus"],
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.suggested_models()[0]
    }

    /// Build a client for this provider. Construction is local only; no
    /// request is made.
    pub fn client(&self, api_key: &str, model: &str) -> chat::ChatClient {
        let client = chat::ChatClient::new(api_key).with_model(model);
        match self.base_url() {
            Some(url) => client.with_base_url(url),
            None => client,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Provider::all()
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| ConfigError::UnsupportedProvider {
                name: s.trim().to_string(),
                supported: Provider::all()
                    .iter()
                    .map(Provider::name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Immutable configuration for one run of the game.
#[derive(Clone)]
pub struct Config {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub max_response_length: usize,
    pub debug: bool,
    pub game_title: String,
}

impl Config {
    /// Create a configuration for a provider with its default model.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(Self {
            provider,
            api_key,
            model: provider.default_model().to_string(),
            max_response_length: DEFAULT_MAX_RESPONSE_LENGTH,
            debug: false,
            game_title: DEFAULT_GAME_TITLE.to_string(),
        })
    }

    /// Read the configuration from `RPG_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key/value source.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match get(ENV_PROVIDER) {
            Some(name) => name.parse()?,
            None => Provider::OpenAi,
        };
        let api_key = get(ENV_API_KEY).ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(provider, api_key)?;

        if let Some(model) = get(ENV_MODEL) {
            config = config.with_model(model.trim());
        }
        if let Some(raw) = get(ENV_MAX_RESPONSE_LENGTH) {
            config = config.with_max_response_length(parse_length(ENV_MAX_RESPONSE_LENGTH, &raw)?);
        }
        if let Some(raw) = get(ENV_DEBUG) {
            config = config.with_debug(parse_flag(&raw));
        }
        if let Some(title) = get(ENV_GAME_TITLE) {
            config = config.with_title(title);
        }

        Ok(config)
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the maximum reply length in characters.
    pub fn with_max_response_length(mut self, length: usize) -> Self {
        self.max_response_length = length;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.game_title = title.into();
        self
    }

    /// Whether the configured model is one the provider is known to host.
    pub fn model_is_suggested(&self) -> bool {
        self.provider
            .suggested_models()
            .iter()
            .any(|m| *m == self.model)
    }

    /// The API key with all but its first few characters hidden.
    pub fn masked_api_key(&self) -> String {
        let visible: String = self.api_key.chars().take(6).collect();
        format!("{visible}...")
    }

    /// Build the chat client described by this configuration.
    pub fn client(&self) -> chat::ChatClient {
        self.provider.client(&self.api_key, &self.model)
    }
}

// Keep the key out of debug output and logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &self.masked_api_key())
            .field("model", &self.model)
            .field("max_response_length", &self.max_response_length)
            .field("debug", &self.debug)
            .field("game_title", &self.game_title)
            .finish()
    }
}

/// Parse a positive length value.
pub fn parse_length(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
