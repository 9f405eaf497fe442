//! Format-detecting document loading and saving
//!
//! Entity definitions and engine configuration can be written in TOML, JSON
//! or YAML; the format is picked from the file extension.

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result, io};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Detect the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }

    /// Whether a path carries one of the supported extensions.
    pub fn is_supported(path: &Path) -> bool {
        Self::from_path(path).is_ok()
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }

    /// Decode `content` as this format.
    pub fn decode<T: DeserializeOwned>(self, path: &Path, content: &str) -> Result<T> {
        let parsed = match self {
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| Error::Parse {
            path: path.to_path_buf(),
            format: self.label().into(),
            message,
        })
    }

    /// Encode `value` as this format.
    pub fn encode<T: Serialize>(self, path: &Path, value: &T) -> Result<String> {
        let encoded = match self {
            Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        };
        encoded.map_err(|message| Error::Serialize {
            path: path.to_path_buf(),
            format: self.label().into(),
            message,
        })
    }
}

/// Loads and saves serde documents, picking the format from the extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentStore;

impl DocumentStore {
    pub fn new() -> Self {
        Self
    }

    /// Load a document from disk.
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let format = DocumentFormat::from_path(path)?;
        let content = io::read_locked(path)?;
        format.decode(path, &content)
    }

    /// Save a document atomically.
    pub fn save<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let format = DocumentFormat::from_path(path)?;
        let content = format.encode(path, value)?;
        io::write_atomic(path, content.as_bytes())
    }
}
