//! Model value object representing a generative model

use super::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Generative models a chat session can talk to (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    Gemini25Pro,
    Gemini25Flash,
    Gemini20Flash,
    Gemini15Pro,
    Gemini15Flash,
    // Custom
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gemini25Pro => "gemini-2.5-pro",
            Model::Gemini25Flash => "gemini-2.5-flash",
            Model::Gemini20Flash => "gemini-2.0-flash",
            Model::Gemini15Pro => "gemini-1.5-pro",
            Model::Gemini15Flash => "gemini-1.5-flash",
            Model::Custom(s) => s,
        }
    }

    /// Models known to be available without configuration
    pub fn known_models() -> Vec<Model> {
        vec![
            Model::Gemini25Pro,
            Model::Gemini25Flash,
            Model::Gemini20Flash,
            Model::Gemini15Pro,
            Model::Gemini15Flash,
        ]
    }
}

impl Default for Model {
    /// Returns the default model (Gemini 2.0 Flash)
    fn default() -> Self {
        Model::Gemini20Flash
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s {
            "" => return Err(DomainError::InvalidModel("model name cannot be empty".into())),
            "gemini-2.5-pro" => Model::Gemini25Pro,
            "gemini-2.5-flash" => Model::Gemini25Flash,
            "gemini-2.0-flash" => Model::Gemini20Flash,
            "gemini-1.5-pro" => Model::Gemini15Pro,
            "gemini-1.5-flash" => Model::Gemini15Flash,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_models_parse_back() {
        for model in Model::known_models() {
            let parsed: Model = model.to_string().parse().unwrap();
            assert_eq!(model, parsed);
        }
    }

    #[test]
    fn test_custom_model() {
        let model: Model = "gemini-exp-1206".parse().unwrap();
        assert_eq!(model, Model::Custom("gemini-exp-1206".to_string()));
        assert_eq!(model.to_string(), "gemini-exp-1206");
    }

    #[test]
    fn test_empty_model_rejected() {
        assert!(matches!(
            "  ".parse::<Model>(),
            Err(DomainError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_model_default() {
        assert_eq!(Model::default(), Model::Gemini20Flash);
    }

    #[test]
    fn test_model_deserialize_rejects_empty() {
        let result: Result<Model, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
        let model: Model = serde_json::from_str("\"gemini-2.5-pro\"").unwrap();
        assert_eq!(model, Model::Gemini25Pro);
    }
}
