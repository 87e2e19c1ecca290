use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{numeric_id, string_or_number, validation_message};
use crate::gateway::{ApiError, MultipartForm};

pub const DEFAULT_CERTIFICATE_STATE: &str = "Generate";

/// Multipart field name the backend expects for generated PDFs.
pub const CERTIFICATE_FILE_FIELD: &str = "certificate_file";

const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";

fn default_state() -> String {
    DEFAULT_CERTIFICATE_STATE.to_string()
}

/// A CPD certificate record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(deserialize_with = "numeric_id")]
    pub id: u64,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(rename = "CPD_activity_title", default)]
    pub cpd_activity_title: Option<String>,
    #[serde(rename = "CPD_activity_code", default)]
    pub cpd_activity_code: Option<String>,
    #[serde(rename = "date_of_CPD_activity", default)]
    pub date_of_cpd_activity: Option<String>,
    #[serde(
        rename = "no_CPD_hours_points",
        default,
        deserialize_with = "string_or_number"
    )]
    pub no_cpd_hours_points: Option<String>,
    #[serde(default = "default_state")]
    pub certificate_state: String,
    #[serde(default)]
    pub certificate_file: Option<String>,
    #[serde(default)]
    pub certificate_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Certificate {
    /// Date part of `date_of_CPD_activity`, which may carry a time suffix.
    pub fn activity_date(&self) -> Option<NaiveDate> {
        let raw = self.date_of_cpd_activity.as_deref()?;
        let date_part = raw.split('T').next()?.trim();
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }

    pub fn is_generated(&self) -> bool {
        self.certificate_state != DEFAULT_CERTIFICATE_STATE
    }

    /// `CPD_Certificate_<name>_<id>.pdf` with whitespace runs in the name
    /// replaced by underscores.
    pub fn pdf_file_name(&self) -> String {
        let name = self
            .full_name
            .as_deref()
            .map(|n| n.split_whitespace().collect::<Vec<_>>().join("_"))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "certificate".to_string());
        format!("CPD_Certificate_{}_{}.pdf", name, self.id)
    }
}

/// Envelope of `GET /cpd-certificates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateList {
    #[serde(default)]
    pub certificates: Vec<Certificate>,
}

impl CertificateList {
    pub fn find(&self, id: u64) -> Option<&Certificate> {
        self.certificates.iter().find(|c| c.id == id)
    }
}

/// Body of create and JSON update requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CertificateForm {
    #[validate(length(min = 1, message = "Please fill in all required fields"))]
    pub full_name: String,

    #[serde(rename = "CPD_activity_title")]
    #[validate(length(min = 1, message = "Please fill in all required fields"))]
    pub cpd_activity_title: String,

    #[serde(rename = "CPD_activity_code")]
    #[validate(length(min = 1, message = "Please fill in all required fields"))]
    pub cpd_activity_code: String,

    #[serde(rename = "date_of_CPD_activity")]
    #[validate(length(min = 1, message = "Please fill in all required fields"))]
    pub date_of_cpd_activity: String,

    #[serde(rename = "no_CPD_hours_points")]
    #[validate(length(min = 1, message = "Please fill in all required fields"))]
    pub no_cpd_hours_points: String,

    #[serde(default = "default_state")]
    pub certificate_state: String,
}

impl Default for CertificateForm {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            cpd_activity_title: String::new(),
            cpd_activity_code: String::new(),
            date_of_cpd_activity: String::new(),
            no_cpd_hours_points: String::new(),
            certificate_state: default_state(),
        }
    }
}

impl CertificateForm {
    /// Prefill an edit form from an existing record.
    pub fn from_certificate(certificate: &Certificate) -> Self {
        Self {
            full_name: certificate.full_name.clone().unwrap_or_default(),
            cpd_activity_title: certificate.cpd_activity_title.clone().unwrap_or_default(),
            cpd_activity_code: certificate.cpd_activity_code.clone().unwrap_or_default(),
            date_of_cpd_activity: certificate
                .date_of_cpd_activity
                .as_deref()
                .and_then(|d| d.split('T').next())
                .unwrap_or_default()
                .to_string(),
            no_cpd_hours_points: certificate.no_cpd_hours_points.clone().unwrap_or_default(),
            certificate_state: certificate.certificate_state.clone(),
        }
    }

    /// The same fields as text parts, for edits that also carry a file.
    pub fn to_multipart(&self) -> MultipartForm {
        MultipartForm::new()
            .text("full_name", self.full_name.as_str())
            .text("CPD_activity_title", self.cpd_activity_title.as_str())
            .text("CPD_activity_code", self.cpd_activity_code.as_str())
            .text("date_of_CPD_activity", self.date_of_cpd_activity.as_str())
            .text("no_CPD_hours_points", self.no_cpd_hours_points.as_str())
            .text("certificate_state", self.certificate_state.as_str())
    }

    pub fn check(&self) -> Result<(), ApiError> {
        self.validate().map_err(|e| {
            let message = validation_message(&e);
            if message.is_empty() {
                ApiError::Validation(REQUIRED_FIELDS_MESSAGE.to_string())
            } else {
                ApiError::Validation(message)
            }
        })
    }
}

/// A rendered certificate PDF ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CertificateFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn for_certificate(certificate: &Certificate, bytes: Vec<u8>) -> Self {
        Self::new(certificate.pdf_file_name(), bytes)
    }

    pub fn into_form(self) -> MultipartForm {
        self.attach(MultipartForm::new())
    }

    /// Append this file to `form` as the `certificate_file` part.
    pub fn attach(self, form: MultipartForm) -> MultipartForm {
        form.file(
            CERTIFICATE_FILE_FIELD,
            self.file_name,
            "application/pdf",
            self.bytes,
        )
    }
}
