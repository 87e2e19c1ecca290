use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::gateway::{ApiGateway, ApiResult, MultipartForm, RequestBody, RequestOptions};
use crate::models::{Certificate, CertificateFile, CertificateForm, CertificateList};

pub const CERTIFICATES_ENDPOINT: &str = "/cpd-certificates";

fn certificate_path(id: u64) -> String {
    format!("{}/{}", CERTIFICATES_ENDPOINT, id)
}

/// `GET /cpd-certificates/{id}` answers either `{"certificate": {...}}` or
/// the bare record.
#[derive(Deserialize)]
#[serde(untagged)]
enum CertificateEnvelope {
    Wrapped { certificate: Certificate },
    Bare(Certificate),
}

/// The two shapes an update can take.
#[derive(Debug, Clone)]
pub enum CertificateUpdate {
    /// Field edit, sent as `PUT`.
    Json(CertificateForm),
    /// File-bearing edit, sent as `POST` to the same path.
    Multipart(MultipartForm),
}

#[derive(Clone)]
pub struct CertificateApi {
    gateway: Arc<ApiGateway>,
}

impl CertificateApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> ApiResult<CertificateList> {
        self.gateway
            .request_as(CERTIFICATES_ENDPOINT, RequestOptions::get())
            .await
    }

    pub async fn get(&self, id: u64) -> ApiResult<Certificate> {
        self.gateway
            .request_as::<CertificateEnvelope>(&certificate_path(id), RequestOptions::get())
            .await
            .map(|envelope| match envelope {
                CertificateEnvelope::Wrapped { certificate } => certificate,
                CertificateEnvelope::Bare(certificate) => certificate,
            })
    }

    /// Validated locally; an incomplete form never reaches the network.
    pub async fn create(&self, form: &CertificateForm) -> ApiResult<Value> {
        if let Err(err) = form.check() {
            return ApiResult::Failure(err);
        }
        let body = match RequestBody::json(form) {
            Ok(body) => body,
            Err(err) => return ApiResult::Failure(err),
        };
        self.gateway
            .request(CERTIFICATES_ENDPOINT, RequestOptions::post(body))
            .await
    }

    pub async fn update(&self, id: u64, update: CertificateUpdate) -> ApiResult<Value> {
        let options = match update {
            CertificateUpdate::Json(form) => {
                if let Err(err) = form.check() {
                    return ApiResult::Failure(err);
                }
                match RequestBody::json(&form) {
                    Ok(body) => RequestOptions::put(body),
                    Err(err) => return ApiResult::Failure(err),
                }
            }
            CertificateUpdate::Multipart(form) => RequestOptions::post(form.into()),
        };
        self.gateway.request(&certificate_path(id), options).await
    }

    pub async fn delete(&self, id: u64) -> ApiResult<Value> {
        self.gateway
            .request(&certificate_path(id), RequestOptions::delete())
            .await
    }

    pub async fn upload_certificate(&self, id: u64, form: MultipartForm) -> ApiResult<Value> {
        let endpoint = format!("{}/upload-certificate", certificate_path(id));
        self.gateway
            .request(&endpoint, RequestOptions::post(form.into()))
            .await
    }

    /// Attach the rendered PDF and flip the record out of `Generate`.
    pub async fn mark_generated(&self, id: u64, file: CertificateFile) -> ApiResult<Value> {
        let endpoint = format!("{}/mark-generated", certificate_path(id));
        self.gateway
            .request(&endpoint, RequestOptions::post(file.into_form().into()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ApiError, MockTransport, PartContent, RecordingNavigator};
    use crate::session::SessionStore;
    use reqwest::header::CONTENT_TYPE;
    use reqwest::Method;
    use serde_json::json;

    fn certificate_api() -> (CertificateApi, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let gateway = ApiGateway::new(
            "https://api.test/api",
            transport.clone(),
            Arc::new(SessionStore::in_memory()),
        )
        .with_navigator(Arc::new(RecordingNavigator::new()));
        (CertificateApi::new(Arc::new(gateway)), transport)
    }

    fn filled_form() -> CertificateForm {
        CertificateForm {
            full_name: "Jane Doe".into(),
            cpd_activity_title: "Teaching English Online".into(),
            cpd_activity_code: "TEO-101".into(),
            date_of_cpd_activity: "2024-03-05".into(),
            no_cpd_hours_points: "10".into(),
            ..CertificateForm::default()
        }
    }

    #[tokio::test]
    async fn list_decodes_envelope() {
        let (api, transport) = certificate_api();
        transport.push_json(
            200,
            json!({ "certificates": [{ "id": 1, "full_name": "Jane Doe" }, { "id": 2 }] }),
        );

        let list = api.list().await.into_result().unwrap();
        assert_eq!(list.certificates.len(), 2);
        assert_eq!(list.find(1).unwrap().full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(
            transport.last_request().unwrap().url,
            "https://api.test/api/cpd-certificates"
        );
    }

    #[tokio::test]
    async fn list_accepts_string_ids() {
        let (api, transport) = certificate_api();
        transport.push_json(
            200,
            json!({ "certificates": [{ "id": "4", "full_name": "Jane Doe" }, { "id": 5 }] }),
        );

        let list = api.list().await.into_result().unwrap();
        assert_eq!(list.find(4).unwrap().full_name.as_deref(), Some("Jane Doe"));
        assert!(list.find(5).is_some());
    }

    #[tokio::test]
    async fn list_with_wrong_shape_is_decode_error() {
        let (api, transport) = certificate_api();
        transport.push_json(200, json!({ "certificates": "nope" }));

        let err = api.list().await.into_result().unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn get_accepts_wrapped_and_bare_records() {
        let (api, transport) = certificate_api();
        transport
            .push_json(200, json!({ "certificate": { "id": 5 } }))
            .push_json(200, json!({ "id": 6, "certificate_state": "Generated" }));

        assert_eq!(api.get(5).await.into_result().unwrap().id, 5);
        let bare = api.get(6).await.into_result().unwrap();
        assert!(bare.is_generated());
        assert_eq!(
            transport.last_request().unwrap().url,
            "https://api.test/api/cpd-certificates/6"
        );
    }

    #[tokio::test]
    async fn create_rejects_incomplete_form_without_sending() {
        let (api, transport) = certificate_api();
        let form = CertificateForm {
            full_name: "Jane Doe".into(),
            ..CertificateForm::default()
        };

        let result = api.create(&form).await;

        assert_eq!(
            result.error(),
            Some(&ApiError::Validation(
                "Please fill in all required fields".into()
            ))
        );
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn create_posts_backend_field_names() {
        let (api, transport) = certificate_api();
        transport.push_json(201, json!({ "message": "Created", "certificate": { "id": 9 } }));

        assert!(api.create(&filled_form()).await.is_success());

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.method, Method::POST);
        match sent.body {
            RequestBody::Json(body) => {
                assert_eq!(body["CPD_activity_code"], "TEO-101");
                assert_eq!(body["certificate_state"], "Generate");
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_method_follows_body_shape() {
        let (api, transport) = certificate_api();
        transport
            .push_json(200, json!({ "message": "Updated" }))
            .push_json(200, json!({ "message": "Updated" }));

        api.update(4, CertificateUpdate::Json(filled_form())).await;
        let json_update = transport.last_request().unwrap();
        assert_eq!(json_update.method, Method::PUT);
        assert_eq!(json_update.headers.get(CONTENT_TYPE).unwrap(), "application/json");

        let multipart = MultipartForm::new().text("full_name", "Jane Doe");
        api.update(4, CertificateUpdate::Multipart(multipart)).await;
        let multipart_update = transport.last_request().unwrap();
        assert_eq!(multipart_update.method, Method::POST);
        assert_eq!(multipart_update.url, "https://api.test/api/cpd-certificates/4");
        assert!(multipart_update.headers.get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn delete_uses_delete_method() {
        let (api, transport) = certificate_api();
        transport.push_json(200, json!({ "message": "Deleted" }));

        assert!(api.delete(8).await.is_success());
        let sent = transport.last_request().unwrap();
        assert_eq!(sent.method, Method::DELETE);
        assert_eq!(sent.url, "https://api.test/api/cpd-certificates/8");
    }

    #[tokio::test]
    async fn file_endpoints_send_multipart() {
        let (api, transport) = certificate_api();
        transport
            .push_json(200, json!({ "message": "Uploaded" }))
            .push_json(200, json!({ "message": "Marked" }));

        let upload = MultipartForm::new().file("certificate_file", "a.pdf", "application/pdf", vec![1]);
        api.upload_certificate(3, upload).await;
        assert_eq!(
            transport.last_request().unwrap().url,
            "https://api.test/api/cpd-certificates/3/upload-certificate"
        );

        let file = CertificateFile::new("CPD_Certificate_Jane_Doe_3.pdf", b"%PDF".to_vec());
        api.mark_generated(3, file).await;
        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, "https://api.test/api/cpd-certificates/3/mark-generated");
        match sent.body {
            RequestBody::Multipart(form) => match &form.parts()[0].content {
                PartContent::File { file_name, .. } => {
                    assert_eq!(file_name, "CPD_Certificate_Jane_Doe_3.pdf")
                }
                other => panic!("unexpected part {:?}", other),
            },
            other => panic!("unexpected body {:?}", other),
        }
    }
}
