use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_REMOTE_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_REMOTE_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_LOCAL_MODEL: &str = "mistral";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Openai,
    Ollama,
}

/// How the contributing lines of each intent's prompt are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStyle {
    /// Every raw log line mentioning the intent id.
    #[default]
    Transcript,
    /// One templated line per intent.
    Summary,
    /// Every parsed log line, followed by a line naming the intent.
    FullLog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: BackendKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,

    pub use_case_context: String,
    pub system_prompt: String,

    pub report_style: ReportStyle,
    pub report_title: String,

    pub max_concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: BackendKind::default(),
            api_key: None,
            model: None,
            endpoint: None,
            use_case_context: String::new(),
            system_prompt: String::new(),
            report_style: ReportStyle::default(),
            report_title: "Intent Explanation Report".into(),
            max_concurrency: 4,
            timeout_secs: 60,
        }
    }
}

impl Settings {
    /// Fails before any log is read so a bad setup never reaches the pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.use_case_context.trim().is_empty() {
            return Err(ConfigError::Missing("use_case_context".into()));
        }
        if self.system_prompt.trim().is_empty() {
            return Err(ConfigError::Missing("system_prompt".into()));
        }
        if self.llm == BackendKind::Openai && self.resolved_api_key().is_none() {
            return Err(ConfigError::Missing(format!(
                "api_key (or {API_KEY_ENV}) for the openai backend"
            )));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty()))
    }

    pub fn resolved_model(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.llm {
            BackendKind::Openai => DEFAULT_REMOTE_MODEL.into(),
            BackendKind::Ollama => DEFAULT_LOCAL_MODEL.into(),
        })
    }

    pub fn resolved_endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| match self.llm {
            BackendKind::Openai => DEFAULT_REMOTE_ENDPOINT.into(),
            BackendKind::Ollama => DEFAULT_LOCAL_ENDPOINT.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> Settings {
        Settings {
            llm: BackendKind::Ollama,
            use_case_context: "Data centre".into(),
            system_prompt: "Explain.".into(),
            ..Settings::default()
        }
    }

    #[test]
    fn local_backend_needs_no_key() {
        let settings = local();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.resolved_model(), "mistral");
        assert_eq!(settings.resolved_endpoint(), "http://localhost:11434");
    }

    #[test]
    fn blank_prompt_fields_are_missing() {
        let mut settings = local();
        settings.system_prompt = "  ".into();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Missing(field)) if field == "system_prompt"
        ));
    }

    #[test]
    fn explicit_key_satisfies_remote_backend() {
        let settings = Settings {
            llm: BackendKind::Openai,
            api_key: Some("sk-test".into()),
            ..local()
        };
        assert!(settings.validate().is_ok());
        assert_eq!(settings.resolved_model(), "gpt-3.5-turbo");
    }

    #[test]
    fn zero_concurrency_is_invalid() {
        let settings = Settings {
            max_concurrency: 0,
            ..local()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{ "llm": "ollama", "model": "llama3", "report_style": "summary",
                 "use_case_context": "ctx", "system_prompt": "sys" }"#,
        )
        .unwrap();
        assert_eq!(settings.llm, BackendKind::Ollama);
        assert_eq!(settings.report_style, ReportStyle::Summary);

        let settings: Settings = serde_json::from_str(r#"{ "report_style": "full_log" }"#).unwrap();
        assert_eq!(settings.report_style, ReportStyle::FullLog);
        assert_eq!(settings.resolved_model(), "llama3");
        assert_eq!(settings.max_concurrency, 4);
    }
}
