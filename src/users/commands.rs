/// 사용자 관련 커맨드 처리
/// 1. 가입
/// 2. 프로필 수정
/// 3. 신원 인증
// region:    --- Imports
use crate::clock::Clock;
use crate::collaborators::blob::{object_name, BlobStore, Upload};
use crate::collaborators::verifier::{IdentityVerifier, VerificationRequest};
use crate::error::{AppError, ValidationError};
use crate::notify::{publish_or_warn, ChangeEvent, ChangeNotifier};
use crate::store::UserRepository;
use crate::users::model::{DocumentType, NewUser, ProfilePatch, User};
use crate::users::validation::{validate_email, validate_profile, validate_username};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

/// 신원 인증 결과
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub is_valid_id: bool,
    pub user: User,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    blobs: Arc<dyn BlobStore>,
    verifier: Arc<dyn IdentityVerifier>,
    notifier: Arc<dyn ChangeNotifier>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        blobs: Arc<dyn BlobStore>,
        verifier: Arc<dyn IdentityVerifier>,
        notifier: Arc<dyn ChangeNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            blobs,
            verifier,
            notifier,
            clock,
        }
    }

    /// 1. 가입 (미인증 상태로 생성)
    pub async fn register(&self, new_user: NewUser) -> Result<User, AppError> {
        info!("{:<12} --> 가입 요청: {}", "Command", new_user.username);
        validate_username(&new_user.username)?;
        if self.users.find_by_username(&new_user.username).await?.is_some() {
            return Err(ValidationError::new(
                "username",
                "Username already exists. Please choose another one.",
            )
            .into());
        }
        validate_email(&new_user.email)?;
        if self.users.find_by_email(&new_user.email).await?.is_some() {
            return Err(ValidationError::new("email", "Email already exists. Please login").into());
        }
        self.users.insert(new_user, self.clock.now()).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("사용자", user_id))
    }

    /// 2. 프로필 수정 (입력된 필드만 병합)
    pub async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<User, AppError> {
        validate_profile(&patch)?;
        self.users
            .update_profile(user_id, &patch)
            .await?
            .ok_or_else(|| AppError::not_found("사용자", user_id))
    }

    /// 3. 신원 인증
    /// 프로필이 완성되어 있어야 하며, 성공 시에만 인증 플래그를 켠다 (해제하지 않음).
    pub async fn verify_identity(
        &self,
        user_id: &str,
        document_type: DocumentType,
        image: Upload,
    ) -> Result<VerificationOutcome, AppError> {
        let user = self.get_user(user_id).await?;
        if !user.profile_complete() {
            return Err(ValidationError::new("profile", "You must fill in your profile details").into());
        }

        let path = format!("id-documents/{}/{}", user.id, object_name(&image.file_name));
        self.blobs.upload(&path, &image).await?;

        let request = VerificationRequest {
            document_type,
            first_name: user.first_name.clone().unwrap_or_default(),
            last_name: user.last_name.clone().unwrap_or_default(),
            address_line1: user.address_line1.clone().unwrap_or_default(),
            city: user.city.clone().unwrap_or_default(),
            image,
        };
        let is_valid_id = self.verifier.verify(&request).await?;
        info!(
            "{:<12} --> 신원 확인 결과: {} -> {}",
            "Command", user.id, is_valid_id
        );

        if !is_valid_id || user.verified {
            return Ok(VerificationOutcome { is_valid_id, user });
        }

        self.users.mark_verified(&user.id).await?;
        publish_or_warn(
            self.notifier.as_ref(),
            ChangeEvent::UserVerified {
                user_id: user.id.clone(),
                timestamp: self.clock.now(),
            },
        )
        .await;
        let user = self.get_user(user_id).await?;
        Ok(VerificationOutcome { is_valid_id, user })
    }
}
