use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use tracing::instrument;

use crate::entity::user;
use crate::error::AppError;
use crate::utils::hash;

/// Optional attributes for a new account.
#[derive(Debug, Default)]
pub struct NewAccount {
    pub name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Changes to an existing account. `None` leaves a field untouched.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

/// Lower-case and trim an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Persistence for accounts.
pub struct AccountStore<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> AccountStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Create an account. The email is required and stored lower-cased; the
    /// password is stored as a salted hash.
    #[instrument(skip(self, password, extra), fields(email = %email))]
    pub async fn create(
        &self,
        email: &str,
        password: &str,
        extra: NewAccount,
    ) -> Result<user::Model, AppError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::Validation("The email is required.".into()));
        }

        let hash = hash::hash_password(password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

        let new_user = user::ActiveModel {
            email: Set(email),
            name: Set(extra.name.trim().to_string()),
            password: Set(hash),
            is_active: Set(true),
            is_staff: Set(extra.is_staff),
            is_superuser: Set(extra.is_superuser),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        new_user.insert(self.conn).await.map_err(duplicate_email)
    }

    /// Create an account with staff and superuser rights.
    pub async fn create_privileged(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, AppError> {
        self.create(
            email,
            password,
            NewAccount {
                is_staff: true,
                is_superuser: true,
                ..Default::default()
            },
        )
        .await
    }

    /// Look up an active account by credentials.
    ///
    /// Unknown email, wrong password and inactive account all yield `None`.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<user::Model>, AppError> {
        let Some(account) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        let is_valid = hash::verify_password(password, &account.password)
            .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

        if !is_valid || !account.is_active {
            return Ok(None);
        }
        Ok(Some(account))
    }

    pub async fn find(&self, id: i32) -> Result<user::Model, AppError> {
        user::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AppError> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(self.conn)
            .await?)
    }

    /// All accounts, oldest first.
    pub async fn list(&self) -> Result<Vec<user::Model>, AppError> {
        Ok(user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(self.conn)
            .await?)
    }

    /// Apply a profile update. A new password is re-hashed; a new email is
    /// normalized and must not belong to another account.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        id: i32,
        update: ProfileUpdate,
    ) -> Result<user::Model, AppError> {
        let existing = self.find(id).await?;
        let mut active: user::ActiveModel = existing.into();

        if let Some(email) = update.email {
            let email = normalize_email(&email);
            if email.is_empty() {
                return Err(AppError::Validation("The email is required.".into()));
            }
            active.email = Set(email);
        }
        if let Some(name) = update.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(password) = update.password {
            let hash = hash::hash_password(&password)
                .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
            active.password = Set(hash);
        }
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(is_staff) = update.is_staff {
            active.is_staff = Set(is_staff);
        }

        if !active.is_changed() {
            return self.find(id).await;
        }

        active.update(self.conn).await.map_err(duplicate_email)
    }
}

fn duplicate_email(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Unique constraint on email caught on write");
            AppError::Validation("A user with this email already exists.".into())
        }
        _ => AppError::from(err),
    }
}
