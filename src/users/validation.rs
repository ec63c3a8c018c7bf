/// 가입 / 프로필 입력 검증 규칙
use crate::error::ValidationError;
use crate::users::model::ProfilePatch;
use regex::Regex;
use std::sync::LazyLock;

/// local@domain.tld 형태, 공백과 추가 '@' 없음
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex is valid"));

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() || !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new(
            "username",
            "Username must contain only letters and numbers",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::new(
            "email",
            "Please enter a valid email address in the format 'example@example.com'.",
        ));
    }
    Ok(())
}

fn check(
    value: &Option<String>,
    field: &'static str,
    message: &str,
    allowed: impl Fn(&str) -> bool,
) -> Result<(), ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() && !allowed(v) => Err(ValidationError::new(field, message)),
        _ => Ok(()),
    }
}

/// 입력된 필드만 검사한다
pub fn validate_profile(patch: &ProfilePatch) -> Result<(), ValidationError> {
    let letters = |v: &str| v.chars().all(|c| c.is_ascii_alphabetic());
    let address = |v: &str| v.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ');

    check(
        &patch.first_name,
        "first_name",
        "First name should contain only letters",
        letters,
    )?;
    check(
        &patch.last_name,
        "last_name",
        "Last name should contain only letters",
        letters,
    )?;
    check(
        &patch.phone_number,
        "phone_number",
        "Phone number should contain only digits",
        |v| v.chars().all(|c| c.is_ascii_digit()),
    )?;
    check(
        &patch.address_line1,
        "address_line1",
        "Address Line 1 should not contain symbols",
        address,
    )?;
    check(
        &patch.address_line2,
        "address_line2",
        "Address Line 2 should not contain symbols",
        address,
    )?;
    Ok(())
}
