/// Why a rule could not be added to a registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("duplicate rule id '{id}'")]
    DuplicateRuleId { id: String },

    #[error("invalid rule id '{id}': expected E, W or I followed by four digits")]
    InvalidRuleId { id: String },
}

/// Why a lint configuration could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid YAML configuration: {message}")]
    Yaml { message: String },

    #[error("invalid JSON configuration: {message}")]
    Json { message: String },

    #[error("unknown rule '{id}'{}", did_you_mean(.suggestion.as_deref()))]
    UnknownRule { id: String, suggestion: Option<String> },

    #[error("invalid min_severity '{value}': expected informational, warning or error")]
    InvalidSeverity { value: String },
}

fn did_you_mean(suggestion: Option<&str>) -> String {
    suggestion.map(|s| format!(", did you mean '{s}'?")).unwrap_or_default()
}
