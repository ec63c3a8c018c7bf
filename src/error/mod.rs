/// 서비스 전역 에러 분류
/// 1. 입력 검증 실패 (ValidationError)
/// 2. 입찰 거절 (BidRejection)
/// 3. 동시성 충돌 (StaleState)
/// 4. 외부 서비스 장애 (CollaboratorUnavailable)
/// 5. 대상 없음 (NotFound)
// region:    --- Imports
use crate::bidding::model::BidRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt::Display;
use thiserror::Error;
use tracing::{error, warn};

// endregion: --- Imports

// region:    --- Validation Error
/// 사용자 입력이 형식 또는 업무 규칙을 만족하지 못함
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
// endregion: --- Validation Error

// region:    --- App Error
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Bid(#[from] BidRejection),

    #[error("다른 요청이 먼저 반영되었습니다. 최신 상태를 다시 조회한 뒤 재시도하세요.")]
    StaleState,

    #[error("외부 서비스 호출 실패: {0}")]
    CollaboratorUnavailable(String),

    #[error("{kind}을(를) 찾을 수 없습니다: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl AppError {
    pub fn not_found(kind: &'static str, id: impl Display) -> Self {
        AppError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn unavailable(e: impl Display) -> Self {
        AppError::CollaboratorUnavailable(e.to_string())
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::new(field, message))
    }

    /// 클라이언트에 노출되는 고정 코드
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Bid(rejection) => rejection.code(),
            AppError::StaleState => "STALE_STATE",
            AppError::CollaboratorUnavailable(_) => "COLLABORATOR_UNAVAILABLE",
            AppError::NotFound { .. } => "NOT_FOUND",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Bid(_) => StatusCode::BAD_REQUEST,
            AppError::StaleState => StatusCode::CONFLICT,
            AppError::CollaboratorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        error!("{:<12} --> 데이터베이스 오류: {:?}", "Error", e);
        AppError::unavailable(e)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        warn!("{:<12} --> HTTP 호출 오류: {:?}", "Error", e);
        AppError::unavailable(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        if let AppError::Validation(ValidationError { field, .. }) = &self {
            body["field"] = serde_json::json!(field);
        }
        (self.status(), Json(body)).into_response()
    }
}
// endregion: --- App Error
