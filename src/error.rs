use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use serde_json::Error as JsonError;
use serde_yaml::Error as YamlError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum OntographError {
    #[error("Graph artifact error: {0}")]
    Artifact(String),
    #[error("System-of-record error: {0}")]
    Corpus(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl From<io::Error> for OntographError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => OntographError::NotFound(format!("{x}")),
            _ => OntographError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<YamlError> for OntographError {
    fn from(src: YamlError) -> OntographError {
        OntographError::Serialization(format!("YAML (de)serialization error: {src}"))
    }
}

impl From<JsonError> for OntographError {
    fn from(src: JsonError) -> OntographError {
        OntographError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<toml::de::Error> for OntographError {
    fn from(src: toml::de::Error) -> OntographError {
        OntographError::Serialization(format!("Toml deserialization error: {src}"))
    }
}
