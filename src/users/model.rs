use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 사용자 모델
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
}

// 가입 요청 (id는 인증 제공자가 발급)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub username: String,
}

// 프로필 부분 수정 (None 필드는 유지)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

impl ProfilePatch {
    pub fn apply_to(&self, user: &mut User) {
        fn merge(target: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }
        merge(&mut user.first_name, &self.first_name);
        merge(&mut user.last_name, &self.last_name);
        merge(&mut user.phone_number, &self.phone_number);
        merge(&mut user.address_line1, &self.address_line1);
        merge(&mut user.address_line2, &self.address_line2);
        merge(&mut user.country, &self.country);
        merge(&mut user.city, &self.city);
    }
}

impl User {
    /// 신원 인증에 필요한 프로필이 모두 채워졌는지
    pub fn profile_complete(&self) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.phone_number,
            &self.address_line1,
            &self.country,
            &self.city,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

/// 신분증 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "Driving licence")]
    DrivingLicence,
    #[serde(rename = "Passport")]
    Passport,
    #[serde(rename = "ID card")]
    IdCard,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::DrivingLicence => "Driving licence",
            DocumentType::Passport => "Passport",
            DocumentType::IdCard => "ID card",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Driving licence" => Some(DocumentType::DrivingLicence),
            "Passport" => Some(DocumentType::Passport),
            "ID card" => Some(DocumentType::IdCard),
            _ => None,
        }
    }
}
