use serde::Serialize;

use super::result::ApiError;
use super::transport::TransportError;

/// What a request carries. The caller picks the variant; the gateway never
/// inspects a body to guess its encoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized as JSON with `Content-Type: application/json`.
    Json(serde_json::Value),
    /// Passed to the transport untouched; the transport sets the boundary.
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::Encode(format!("Failed to encode request body: {}", e)))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

impl From<MultipartForm> for RequestBody {
    fn from(form: MultipartForm) -> Self {
        RequestBody::Multipart(form)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartContent {
    Text(String),
    File {
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub content: PartContent,
}

/// Owned multipart payload. Kept inspectable so tests can assert on it,
/// converted to `reqwest::multipart::Form` only at send time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            content: PartContent::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            content: PartContent::File {
                file_name: file_name.into(),
                mime_type: mime_type.into(),
                bytes,
            },
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn into_reqwest(self) -> Result<reqwest::multipart::Form, TransportError> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part.content {
                PartContent::Text(value) => form.text(part.name, value),
                PartContent::File {
                    file_name,
                    mime_type,
                    bytes,
                } => {
                    let file_part = reqwest::multipart::Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&mime_type)
                        .map_err(|e| {
                            TransportError::InvalidRequest(format!(
                                "Invalid mime type '{}': {}",
                                mime_type, e
                            ))
                        })?;
                    form.part(part.name, file_part)
                }
            };
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_body_from_struct() {
        #[derive(Serialize)]
        struct Credentials<'a> {
            email: &'a str,
        }

        let body = RequestBody::json(&Credentials { email: "a@b.co" }).unwrap();
        assert_eq!(body, RequestBody::Json(serde_json::json!({ "email": "a@b.co" })));
    }

    #[test]
    fn multipart_keeps_part_order() {
        let form = MultipartForm::new()
            .text("full_name", "Jane")
            .file("certificate_file", "c.pdf", "application/pdf", vec![1, 2]);

        let names: Vec<_> = form.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["full_name", "certificate_file"]);
        assert!(!RequestBody::from(form).is_empty());
    }

    #[test]
    fn invalid_mime_is_rejected() {
        let form = MultipartForm::new().file("f", "x.bin", "not a mime", vec![]);
        assert!(matches!(
            form.into_reqwest(),
            Err(TransportError::InvalidRequest(_))
        ));
    }
}
