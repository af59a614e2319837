use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::repository::attribute::Attribute;

use super::shared::{parse_flag, validate_text};

/// Body for creating or replacing a tag or ingredient.
#[derive(Deserialize, ToSchema)]
pub struct AttributeRequest {
    #[schema(example = "Vegan")]
    pub name: String,
}

/// Body for partially updating a tag or ingredient.
#[derive(Deserialize, Default, ToSchema)]
pub struct AttributePatchRequest {
    pub name: Option<String>,
}

/// A tag or an ingredient.
#[derive(Serialize, ToSchema)]
pub struct AttributeResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Vegan")]
    pub name: String,
}

impl From<Attribute> for AttributeResponse {
    fn from(a: Attribute) -> Self {
        Self {
            id: a.id,
            name: a.name,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttributeListQuery {
    /// `1`/`true` to only return entries assigned to at least one recipe.
    pub assigned_only: Option<String>,
}

impl AttributeListQuery {
    pub fn assigned_only(&self) -> Result<bool, AppError> {
        match self.assigned_only {
            Some(ref raw) => parse_flag("assigned_only", raw),
            None => Ok(false),
        }
    }
}

impl AttributeRequest {
    pub fn validated_name(&self) -> Result<String, AppError> {
        validate_text("Name", &self.name)
    }
}

impl AttributePatchRequest {
    pub fn validated_name(&self) -> Result<Option<String>, AppError> {
        self.name
            .as_deref()
            .map(|name| validate_text("Name", name))
            .transpose()
    }
}
