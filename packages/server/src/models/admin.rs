use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::user;
use crate::error::AppError;
use crate::repository::account::{NewAccount, ProfileUpdate};

use super::shared::validate_text;
use super::user::{validate_email, validate_password};

#[derive(Deserialize, ToSchema)]
pub struct AdminCreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_staff: bool,
}

/// Account fields an administrator may change.
#[derive(Deserialize, Default, ToSchema)]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct AdminUserResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for AdminUserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            name: m.name,
            is_active: m.is_active,
            is_staff: m.is_staff,
            is_superuser: m.is_superuser,
            created_at: m.created_at,
        }
    }
}

impl AdminCreateUserRequest {
    pub fn validate(&self) -> Result<NewAccount, AppError> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        Ok(NewAccount {
            name: self.name.clone(),
            is_staff: self.is_staff,
            is_superuser: false,
        })
    }
}

impl AdminUpdateUserRequest {
    pub fn into_update(self) -> Result<ProfileUpdate, AppError> {
        let name = match self.name {
            Some(ref name) if name.trim().is_empty() => Some(String::new()),
            Some(ref name) => Some(validate_text("Name", name)?),
            None => None,
        };
        Ok(ProfileUpdate {
            name,
            is_active: self.is_active,
            is_staff: self.is_staff,
            ..Default::default()
        })
    }
}
