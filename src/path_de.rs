use serde::de::DeserializeOwned;

/// Deserialization error with the JSON path it happened at.
#[derive(Debug, thiserror::Error)]
#[error("at JSON path {path} → {reason}")]
pub struct PathError {
    pub path: String,
    reason: serde_json::Error,
}

impl From<serde_path_to_error::Error<serde_json::Error>> for PathError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        Self { path, reason: err.into_inner() }
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    Ok(serde_path_to_error::deserialize::<_, T>(de)?)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    Ok(serde_path_to_error::deserialize::<_, T>(de)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn message_names_the_path_once() {
        let err = from_str_with_path::<BTreeMap<String, u8>>(r#"{"a": 1, "b": "x"}"#).unwrap_err();
        assert_eq!(err.path, "b");
        assert!(std::error::Error::source(&err).is_none());
        let msg = err.to_string();
        assert!(msg.starts_with("at JSON path b → invalid type"), "{msg}");
        assert_eq!(msg.matches("invalid type").count(), 1);
    }
}
