// region:    --- Imports
use super::blob::Upload;
use crate::error::AppError;
use crate::users::model::DocumentType;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::info;

// endregion: --- Imports

/// 신원 확인 요청
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub document_type: DocumentType,
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    pub city: String,
    pub image: Upload,
}

/// 신원 확인 포트: 신분증 이미지와 신청자 정보로 유효 여부 판단
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, request: &VerificationRequest) -> Result<bool, AppError>;
}

// region:    --- Http Verifier
#[derive(Deserialize)]
struct VerifyResponse {
    is_valid_id: bool,
}

/// 외부 신원 확인 서버 (multipart POST /api/upload)
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityVerifier {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<bool, AppError> {
        let url = format!("{}/api/upload", self.base_url);
        info!(
            "{:<12} --> 신원 확인 요청: {} ({})",
            "Verifier",
            url,
            request.document_type.as_str()
        );

        let photo = Part::bytes(request.image.bytes.clone())
            .file_name(request.image.file_name.clone())
            .mime_str(&request.image.content_type)?;
        let form = Form::new()
            .part("photo", photo)
            .text("document_type", request.document_type.as_str())
            .text("first_name", request.first_name.clone())
            .text("last_name", request.last_name.clone())
            .text("address_line1", request.address_line1.clone())
            .text("city", request.city.clone());

        let response = self.client.post(&url).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(AppError::unavailable(format!(
                "신원 확인 서버 응답 HTTP {}",
                response.status()
            )));
        }
        let body: VerifyResponse = response.json().await?;
        Ok(body.is_valid_id)
    }
}
// endregion: --- Http Verifier

// region:    --- Fixed Verifier
/// 고정 결과를 돌려주고 요청을 기록하는 확인기 (로컬 실행, 테스트용)
pub struct FixedVerifier {
    answer: bool,
    requests: Mutex<Vec<VerificationRequest>>,
}

impl FixedVerifier {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<VerificationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl IdentityVerifier for FixedVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<bool, AppError> {
        self.requests.lock().push(request.clone());
        Ok(self.answer)
    }
}
// endregion: --- Fixed Verifier
