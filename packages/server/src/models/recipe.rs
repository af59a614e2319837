use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::recipe;
use crate::error::AppError;
use crate::repository::recipe::{
    NewRecipe, RecipeChanges, RecipeDetail, RecipeFilter, RecipeRecord,
};

use super::attribute::AttributeResponse;
use super::shared::{parse_id_list, validate_text};

/// Prices are below this bound (five digits, two of them fractional).
const MAX_PRICE_EXCLUSIVE: i64 = 1000;
const MAX_TIME_MINUTES: i32 = 32767;

/// Body for creating or fully replacing a recipe.
#[derive(Deserialize, ToSchema)]
pub struct RecipeRequest {
    #[schema(example = "Sample recipe")]
    pub title: String,
    #[schema(example = 10)]
    pub time_minutes: i32,
    /// Decimal with at most two fractional digits, `0 <= price < 1000`.
    /// Accepted as a JSON string or number.
    #[schema(value_type = String, example = "5.25")]
    pub price: Decimal,
    #[serde(default)]
    #[schema(example = "https://example.com/recipe.pdf")]
    pub link: String,
    /// Tag ids. Omitted means none.
    #[serde(default)]
    pub tags: Vec<i32>,
    /// Ingredient ids. Omitted means none.
    #[serde(default)]
    pub ingredients: Vec<i32>,
}

/// Body for partially updating a recipe. Omitted fields, including the
/// tag and ingredient lists, are left as they are.
#[derive(Deserialize, Default, ToSchema)]
pub struct RecipePatchRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    #[schema(value_type = Option<String>, example = "5.25")]
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<i32>>,
}

/// List form of a recipe: linked tags and ingredients as ids.
#[derive(Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub title: String,
    pub ingredients: Vec<i32>,
    pub tags: Vec<i32>,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.00")]
    pub price: Decimal,
    pub link: String,
    /// Public URL of the image, if one was uploaded.
    #[schema(example = "/media/uploads/recipe/0b6f3a1e-7d2c-4c1e-9a55-1f2d3c4b5a69.png")]
    pub image: Option<String>,
}

/// Detail form of a recipe: linked tags and ingredients as objects.
#[derive(Serialize, ToSchema)]
pub struct RecipeDetailResponse {
    pub id: i32,
    pub title: String,
    pub ingredients: Vec<AttributeResponse>,
    pub tags: Vec<AttributeResponse>,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.00")]
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RecipeImageResponse {
    pub id: i32,
    #[schema(example = "/media/uploads/recipe/0b6f3a1e-7d2c-4c1e-9a55-1f2d3c4b5a69.png")]
    pub image: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    /// Comma-separated tag ids, e.g. `1,3`. Matches recipes with any of them.
    pub tags: Option<String>,
    /// Comma-separated ingredient ids. Matches recipes with any of them.
    pub ingredients: Option<String>,
}

impl RecipeListQuery {
    pub fn to_filter(&self) -> Result<RecipeFilter, AppError> {
        Ok(RecipeFilter {
            tags: match self.tags {
                Some(ref raw) => parse_id_list("tags", raw)?,
                None => Vec::new(),
            },
            ingredients: match self.ingredients {
                Some(ref raw) => parse_id_list("ingredients", raw)?,
                None => Vec::new(),
            },
        })
    }
}

/// Public URL for a file stored under the media root.
pub fn media_url(path: &str) -> String {
    format!("/media/{path}")
}

pub fn cents_to_price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Validate a price and convert it to whole cents.
pub fn price_to_cents(price: Decimal) -> Result<i64, AppError> {
    if price.normalize().scale() > 2 {
        return Err(AppError::Validation(
            "Ensure that there are no more than 2 decimal places.".into(),
        ));
    }
    if price < Decimal::ZERO {
        return Err(AppError::Validation(
            "Ensure this value is greater than or equal to 0.".into(),
        ));
    }
    if price >= Decimal::from(MAX_PRICE_EXCLUSIVE) {
        return Err(AppError::Validation(
            "Ensure that there are no more than 5 digits in total.".into(),
        ));
    }

    let mut cents = price;
    cents.rescale(2);
    i64::try_from(cents.mantissa())
        .map_err(|_| AppError::Validation("Price is out of range.".into()))
}

fn validate_time_minutes(minutes: i32) -> Result<i32, AppError> {
    if !(1..=MAX_TIME_MINUTES).contains(&minutes) {
        return Err(AppError::Validation(format!(
            "time_minutes must be 1-{MAX_TIME_MINUTES}"
        )));
    }
    Ok(minutes)
}

fn validate_link(link: &str) -> Result<String, AppError> {
    let link = link.trim();
    if link.chars().count() > 255 {
        return Err(AppError::Validation(
            "Link must be at most 255 characters".into(),
        ));
    }
    Ok(link.to_string())
}

impl RecipeRequest {
    pub fn into_new(self) -> Result<NewRecipe, AppError> {
        Ok(NewRecipe {
            title: validate_text("Title", &self.title)?,
            time_minutes: validate_time_minutes(self.time_minutes)?,
            price_cents: price_to_cents(self.price)?,
            link: validate_link(&self.link)?,
            tags: self.tags,
            ingredients: self.ingredients,
        })
    }

    /// Full replacement: every field is set and the link sets are replaced
    /// by what was sent, so omitted lists clear the links.
    pub fn into_changes(self) -> Result<RecipeChanges, AppError> {
        let new = self.into_new()?;
        Ok(RecipeChanges {
            title: Some(new.title),
            time_minutes: Some(new.time_minutes),
            price_cents: Some(new.price_cents),
            link: Some(new.link),
            tags: Some(new.tags),
            ingredients: Some(new.ingredients),
        })
    }
}

impl RecipePatchRequest {
    pub fn into_changes(self) -> Result<RecipeChanges, AppError> {
        Ok(RecipeChanges {
            title: self
                .title
                .as_deref()
                .map(|t| validate_text("Title", t))
                .transpose()?,
            time_minutes: self.time_minutes.map(validate_time_minutes).transpose()?,
            price_cents: self.price.map(price_to_cents).transpose()?,
            link: self.link.as_deref().map(validate_link).transpose()?,
            tags: self.tags,
            ingredients: self.ingredients,
        })
    }
}

impl From<RecipeRecord> for RecipeResponse {
    fn from(r: RecipeRecord) -> Self {
        Self {
            id: r.recipe.id,
            title: r.recipe.title,
            ingredients: r.ingredient_ids,
            tags: r.tag_ids,
            time_minutes: r.recipe.time_minutes,
            price: cents_to_price(r.recipe.price_cents),
            link: r.recipe.link,
            image: r.recipe.image.as_deref().map(media_url),
        }
    }
}

impl From<RecipeDetail> for RecipeDetailResponse {
    fn from(d: RecipeDetail) -> Self {
        Self {
            id: d.recipe.id,
            title: d.recipe.title,
            ingredients: d.ingredients.into_iter().map(Into::into).collect(),
            tags: d.tags.into_iter().map(Into::into).collect(),
            time_minutes: d.recipe.time_minutes,
            price: cents_to_price(d.recipe.price_cents),
            link: d.recipe.link,
            image: d.recipe.image.as_deref().map(media_url),
        }
    }
}

impl From<recipe::Model> for RecipeImageResponse {
    fn from(m: recipe::Model) -> Self {
        Self {
            id: m.id,
            image: m.image.as_deref().map(media_url),
        }
    }
}
