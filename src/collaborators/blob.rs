// region:    --- Imports
use crate::error::AppError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;

// endregion: --- Imports

/// 업로드할 파일
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// 파일 저장소 포트: 경로에 업로드하고 조회 가능한 URL을 돌려준다
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, upload: &Upload) -> Result<String, AppError>;
}

/// 파일명에서 경로에 쓸 수 없는 문자를 걸러낸다
pub fn object_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}", uuid::Uuid::new_v4(), cleaned)
}

// region:    --- Http Blob Store
/// HTTP PUT 기반 오브젝트 스토리지
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBlobStore {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, path: &str, upload: &Upload) -> Result<String, AppError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        info!("{:<12} --> 파일 업로드: {}", "Blob", url);
        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, upload.content_type.as_str())
            .body(upload.bytes.clone())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::unavailable(format!(
                "파일 업로드 실패 HTTP {}",
                response.status()
            )));
        }
        Ok(url)
    }
}
// endregion: --- Http Blob Store

// region:    --- Memory Blob Store
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Upload>>,
}

impl MemoryBlobStore {
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.lock().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, upload: &Upload) -> Result<String, AppError> {
        self.objects.lock().insert(path.to_string(), upload.clone());
        Ok(format!("memory://{}", path))
    }
}
// endregion: --- Memory Blob Store
