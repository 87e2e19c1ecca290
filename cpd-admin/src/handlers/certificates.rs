use serde_json::{json, Value};
use std::path::Path;

use super::into_envelope;
use crate::api::CertificateUpdate;
use crate::cli::CertificateFields;
use crate::gateway::{ApiError, ApiResult, MultipartForm};
use crate::models::{CertificateFile, CertificateForm, CERTIFICATE_FILE_FIELD};
use crate::AppState;

async fn read_file(path: &Path) -> Result<Vec<u8>, ApiError> {
    tokio::fs::read(path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read file");
        ApiError::Encode(format!("Could not read {}: {}", path.display(), e))
    })
}

fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

pub async fn list(state: &AppState) -> ApiResult<Value> {
    into_envelope(state.api.certificates().list().await)
}

pub async fn show(state: &AppState, id: u64) -> ApiResult<Value> {
    into_envelope(state.api.certificates().get(id).await)
}

pub async fn create(state: &AppState, fields: CertificateFields) -> ApiResult<Value> {
    state.api.certificates().create(&fields.into_form()).await
}

/// Prefill from the stored record, overlay the given fields, then send as
/// JSON or, with a file, as multipart.
pub async fn update(
    state: &AppState,
    id: u64,
    fields: CertificateFields,
    file: Option<&Path>,
) -> ApiResult<Value> {
    let certificates = state.api.certificates();
    let current = match certificates.get(id).await {
        ApiResult::Success(certificate) => certificate,
        ApiResult::Failure(err) => return ApiResult::Failure(err),
    };

    let mut form = CertificateForm::from_certificate(&current);
    fields.apply(&mut form);
    if let Err(err) = form.check() {
        return ApiResult::Failure(err);
    }

    let update = match file {
        Some(path) => match read_file(path).await {
            Ok(bytes) => CertificateUpdate::Multipart(
                CertificateFile::for_certificate(&current, bytes).attach(form.to_multipart()),
            ),
            Err(err) => return ApiResult::Failure(err),
        },
        None => CertificateUpdate::Json(form),
    };
    certificates.update(id, update).await
}

pub async fn delete(state: &AppState, id: u64) -> ApiResult<Value> {
    state.api.certificates().delete(id).await
}

pub async fn mark_generated(state: &AppState, id: u64, pdf: &Path) -> ApiResult<Value> {
    let certificates = state.api.certificates();
    let certificate = match certificates.get(id).await {
        ApiResult::Success(certificate) => certificate,
        ApiResult::Failure(err) => return ApiResult::Failure(err),
    };
    let bytes = match read_file(pdf).await {
        Ok(bytes) => bytes,
        Err(err) => return ApiResult::Failure(err),
    };

    let file = CertificateFile::for_certificate(&certificate, bytes);
    let file_name = file.file_name.clone();
    certificates
        .mark_generated(id, file)
        .await
        .map(|response| json!({ "file_name": file_name, "response": response }))
}

pub async fn upload(state: &AppState, id: u64, path: &Path) -> ApiResult<Value> {
    let bytes = match read_file(path).await {
        Ok(bytes) => bytes,
        Err(err) => return ApiResult::Failure(err),
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("certificate.pdf");

    let form = MultipartForm::new().file(
        CERTIFICATE_FILE_FIELD,
        file_name,
        mime_type_for(path),
        bytes,
    );
    state.api.certificates().upload_certificate(id, form).await
}
