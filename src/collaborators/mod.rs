/// 외부 협력 서비스 (파일 저장소, 신원 확인)
pub mod blob;
pub mod verifier;

pub use blob::{BlobStore, HttpBlobStore, MemoryBlobStore, Upload};
pub use verifier::{FixedVerifier, HttpIdentityVerifier, IdentityVerifier, VerificationRequest};
