pub mod certificate;
pub mod user;

pub use certificate::{
    Certificate, CertificateFile, CertificateForm, CertificateList, CERTIFICATE_FILE_FIELD,
    DEFAULT_CERTIFICATE_STATE,
};
pub use user::{LoginForm, LoginResponse, UserData, UserProfile};

use serde::{Deserialize, Deserializer};

/// Accept a JSON string or number (or null) and keep its textual form.
///
/// The backend sends ids and point counts as either, depending on the
/// endpoint.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept an id sent either as a JSON number or as a numeric string.
pub(crate) fn numeric_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid id {}", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id {:?}", s))),
        other => Err(serde::de::Error::custom(format!("invalid id {}", other))),
    }
}

/// Collapse validator output into one message, deterministic across runs.
pub(crate) fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string())
        })
        .collect();
    messages.sort();
    messages.dedup();
    messages.join("; ")
}
