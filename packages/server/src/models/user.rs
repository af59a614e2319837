use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::user;
use crate::error::AppError;
use crate::repository::account::{NewAccount, ProfileUpdate, normalize_email};

use super::shared::MAX_TEXT_LEN;

pub const MIN_PASSWORD_LEN: usize = 5;

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "test@example.com")]
    pub email: String,
    /// Write-only. At least 5 characters.
    #[schema(example = "testpass")]
    pub password: String,
    #[serde(default)]
    #[schema(example = "Test Name")]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TokenRequest {
    #[schema(example = "test@example.com")]
    pub email: String,
    #[schema(example = "testpass")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
}

/// Body of `PUT /user/me`. Email and password are required.
#[derive(Deserialize, ToSchema)]
pub struct ReplaceMeRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Body of `PATCH /user/me`. Omitted fields keep their value.
#[derive(Deserialize, Default, ToSchema)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            email: m.email,
            name: m.name,
        }
    }
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::Validation("The email is required.".into()));
    }
    if !email.contains('@') || email.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation("Enter a valid email address.".into()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "Name must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<NewAccount, AppError> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_name(&self.name)?;
        Ok(NewAccount {
            name: self.name.clone(),
            ..Default::default()
        })
    }
}

impl ReplaceMeRequest {
    pub fn into_update(self) -> Result<ProfileUpdate, AppError> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_name(&self.name)?;
        Ok(ProfileUpdate {
            email: Some(self.email),
            name: Some(self.name),
            password: Some(self.password),
            ..Default::default()
        })
    }
}

impl UpdateMeRequest {
    pub fn into_update(self) -> Result<ProfileUpdate, AppError> {
        if let Some(ref email) = self.email {
            validate_email(email)?;
        }
        if let Some(ref password) = self.password {
            validate_password(password)?;
        }
        if let Some(ref name) = self.name {
            validate_name(name)?;
        }
        Ok(ProfileUpdate {
            email: self.email,
            name: self.name,
            password: self.password,
            ..Default::default()
        })
    }
}
