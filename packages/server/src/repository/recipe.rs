use std::collections::BTreeMap;

use chrono::Utc;
use common::storage::MediaStore;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::instrument;

use super::attribute::Attribute;
use super::scoped::{ensure_exist, find_owned, scoped_find};
use crate::entity::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};
use crate::error::AppError;
use crate::utils::image::check_image;

/// Directory, relative to the media root, that recipe images are stored in.
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

/// Restricts a recipe listing. Within one list any id matches; the two lists
/// are combined with AND. Empty lists do not filter.
#[derive(Debug, Default)]
pub struct RecipeFilter {
    pub tags: Vec<i32>,
    pub ingredients: Vec<i32>,
}

#[derive(Debug)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price_cents: i64,
    pub link: String,
    pub tags: Vec<i32>,
    pub ingredients: Vec<i32>,
}

/// Field changes for an existing recipe. `None` keeps the current value; a
/// `Some` link list replaces the whole set.
#[derive(Debug, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price_cents: Option<i64>,
    pub link: Option<String>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<i32>>,
}

/// A recipe with the ids it links to, both ascending.
#[derive(Debug)]
pub struct RecipeRecord {
    pub recipe: recipe::Model,
    pub tag_ids: Vec<i32>,
    pub ingredient_ids: Vec<i32>,
}

/// A recipe with its linked tags and ingredients resolved, both by id.
#[derive(Debug)]
pub struct RecipeDetail {
    pub recipe: recipe::Model,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
}

pub struct RecipeRepo<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RecipeRepo<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Recipes owned by `owner_id`, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        owner_id: i32,
        filter: &RecipeFilter,
    ) -> Result<Vec<RecipeRecord>, AppError> {
        let mut select = scoped_find::<recipe::Entity>(owner_id);

        if !filter.tags.is_empty() {
            select = select.filter(
                recipe::Column::Id.in_subquery(
                    recipe_tag::Entity::find()
                        .select_only()
                        .column(recipe_tag::Column::RecipeId)
                        .filter(recipe_tag::Column::TagId.is_in(filter.tags.iter().copied()))
                        .into_query(),
                ),
            );
        }
        if !filter.ingredients.is_empty() {
            select = select.filter(
                recipe::Column::Id.in_subquery(
                    recipe_ingredient::Entity::find()
                        .select_only()
                        .column(recipe_ingredient::Column::RecipeId)
                        .filter(
                            recipe_ingredient::Column::IngredientId
                                .is_in(filter.ingredients.iter().copied()),
                        )
                        .into_query(),
                ),
            );
        }

        let recipes = select
            .order_by_desc(recipe::Column::Id)
            .all(self.db)
            .await?;

        let ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
        let mut tag_links = tag_ids_by_recipe(self.db, &ids).await?;
        let mut ingredient_links = ingredient_ids_by_recipe(self.db, &ids).await?;

        Ok(recipes
            .into_iter()
            .map(|recipe| RecipeRecord {
                tag_ids: tag_links.remove(&recipe.id).unwrap_or_default(),
                ingredient_ids: ingredient_links.remove(&recipe.id).unwrap_or_default(),
                recipe,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, owner_id: i32, id: i32) -> Result<RecipeDetail, AppError> {
        let recipe = find_owned::<recipe::Entity, _>(self.db, owner_id, id).await?;

        let tags = tag::Entity::find()
            .filter(
                tag::Column::Id.in_subquery(
                    recipe_tag::Entity::find()
                        .select_only()
                        .column(recipe_tag::Column::TagId)
                        .filter(recipe_tag::Column::RecipeId.eq(id))
                        .into_query(),
                ),
            )
            .select_only()
            .column(tag::Column::Id)
            .column(tag::Column::Name)
            .order_by_asc(tag::Column::Id)
            .into_model::<Attribute>()
            .all(self.db)
            .await?;

        let ingredients = ingredient::Entity::find()
            .filter(
                ingredient::Column::Id.in_subquery(
                    recipe_ingredient::Entity::find()
                        .select_only()
                        .column(recipe_ingredient::Column::IngredientId)
                        .filter(recipe_ingredient::Column::RecipeId.eq(id))
                        .into_query(),
                ),
            )
            .select_only()
            .column(ingredient::Column::Id)
            .column(ingredient::Column::Name)
            .order_by_asc(ingredient::Column::Id)
            .into_model::<Attribute>()
            .all(self.db)
            .await?;

        Ok(RecipeDetail {
            recipe,
            tags,
            ingredients,
        })
    }

    /// Create a recipe owned by `owner_id` and link it in one transaction.
    #[instrument(skip(self, new), fields(title = %new.title))]
    pub async fn create(&self, owner_id: i32, new: NewRecipe) -> Result<RecipeRecord, AppError> {
        let txn = self.db.begin().await?;

        let tag_ids = ensure_exist::<tag::Entity, _>(&txn, &new.tags).await?;
        let ingredient_ids = ensure_exist::<ingredient::Entity, _>(&txn, &new.ingredients).await?;

        let recipe = recipe::ActiveModel {
            title: Set(new.title),
            time_minutes: Set(new.time_minutes),
            price_cents: Set(new.price_cents),
            link: Set(new.link),
            image: Set(None),
            user_id: Set(owner_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        link_tags(&txn, recipe.id, &tag_ids).await?;
        link_ingredients(&txn, recipe.id, &ingredient_ids).await?;

        txn.commit().await?;

        Ok(RecipeRecord {
            recipe,
            tag_ids,
            ingredient_ids,
        })
    }

    /// Apply `changes` to a recipe owned by `owner_id`.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        owner_id: i32,
        id: i32,
        changes: RecipeChanges,
    ) -> Result<RecipeRecord, AppError> {
        let txn = self.db.begin().await?;
        let existing = find_owned::<recipe::Entity, _>(&txn, owner_id, id).await?;

        let tag_ids = match changes.tags {
            Some(ids) => {
                let ids = ensure_exist::<tag::Entity, _>(&txn, &ids).await?;
                recipe_tag::Entity::delete_many()
                    .filter(recipe_tag::Column::RecipeId.eq(id))
                    .exec(&txn)
                    .await?;
                link_tags(&txn, id, &ids).await?;
                ids
            }
            None => tag_ids_by_recipe(&txn, &[id])
                .await?
                .remove(&id)
                .unwrap_or_default(),
        };

        let ingredient_ids = match changes.ingredients {
            Some(ids) => {
                let ids = ensure_exist::<ingredient::Entity, _>(&txn, &ids).await?;
                recipe_ingredient::Entity::delete_many()
                    .filter(recipe_ingredient::Column::RecipeId.eq(id))
                    .exec(&txn)
                    .await?;
                link_ingredients(&txn, id, &ids).await?;
                ids
            }
            None => ingredient_ids_by_recipe(&txn, &[id])
                .await?
                .remove(&id)
                .unwrap_or_default(),
        };

        let mut active: recipe::ActiveModel = existing.clone().into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(time_minutes) = changes.time_minutes {
            active.time_minutes = Set(time_minutes);
        }
        if let Some(price_cents) = changes.price_cents {
            active.price_cents = Set(price_cents);
        }
        if let Some(link) = changes.link {
            active.link = Set(link);
        }

        let recipe = if active.is_changed() {
            active.update(&txn).await?
        } else {
            existing
        };

        txn.commit().await?;

        Ok(RecipeRecord {
            recipe,
            tag_ids,
            ingredient_ids,
        })
    }

    /// Delete a recipe and its links. The image file, if any, is removed
    /// afterwards on a best-effort basis.
    #[instrument(skip(self, media))]
    pub async fn delete(
        &self,
        media: &dyn MediaStore,
        owner_id: i32,
        id: i32,
    ) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        let existing = find_owned::<recipe::Entity, _>(&txn, owner_id, id).await?;

        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        recipe::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        if let Some(old) = existing.image {
            remove_media(media, &old).await;
        }
        Ok(())
    }

    /// Store `data` as the recipe's image.
    ///
    /// The payload must decode as an image and any client file extension
    /// must belong to the decoded format. The stored reference only changes
    /// once the new file is written, and only if no other upload replaced it
    /// in the meantime; the previous file is then removed on a best-effort
    /// basis.
    #[instrument(skip(self, media, data), fields(size = data.len()))]
    pub async fn attach_image(
        &self,
        media: &dyn MediaStore,
        owner_id: i32,
        id: i32,
        data: Vec<u8>,
        filename: Option<&str>,
    ) -> Result<recipe::Model, AppError> {
        let existing = find_owned::<recipe::Entity, _>(self.db, owner_id, id).await?;

        let (data, checked) = tokio::task::spawn_blocking(move || {
            let checked = check_image(&data);
            (data, checked)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Image check task failed: {e}")))?;
        let checked = checked?;

        let extension = checked.storage_extension(filename)?;
        let path = media.put(RECIPE_IMAGE_DIR, extension, &data).await?;

        // Compare-and-swap on the image column so a concurrent upload cannot
        // have its file deleted or orphaned by this one.
        let previous = match existing.image.as_deref() {
            Some(old) => recipe::Column::Image.eq(old),
            None => recipe::Column::Image.is_null(),
        };
        let swapped = recipe::Entity::update_many()
            .col_expr(recipe::Column::Image, Expr::value(Some(path.clone())))
            .filter(recipe::Column::Id.eq(id))
            .filter(recipe::Column::UserId.eq(owner_id))
            .filter(previous)
            .exec(self.db)
            .await;

        match swapped {
            Ok(res) if res.rows_affected == 1 => {}
            Ok(_) => {
                remove_media(media, &path).await;
                return Err(AppError::Conflict(
                    "The recipe image was changed by another request.".into(),
                ));
            }
            Err(e) => {
                remove_media(media, &path).await;
                return Err(e.into());
            }
        }

        if let Some(old) = existing.image {
            remove_media(media, &old).await;
        }

        tracing::info!(
            recipe_id = id,
            path = %path,
            width = checked.width,
            height = checked.height,
            "Recipe image stored"
        );
        Ok(recipe::Model {
            image: Some(path),
            ..existing
        })
    }
}

async fn remove_media(media: &dyn MediaStore, path: &str) {
    if let Err(e) = media.delete(path).await {
        tracing::warn!(path, error = %e, "Failed to remove media file");
    }
}

async fn link_tags<C: ConnectionTrait>(db: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<(), DbErr> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    recipe_tag::Entity::insert_many(tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
        ..Default::default()
    }))
    .exec_without_returning(db)
    .await?;
    Ok(())
}

async fn link_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    ingredient_ids: &[i32],
) -> Result<(), DbErr> {
    if ingredient_ids.is_empty() {
        return Ok(());
    }
    recipe_ingredient::Entity::insert_many(ingredient_ids.iter().map(|&ingredient_id| {
        recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(ingredient_id),
            ..Default::default()
        }
    }))
    .exec_without_returning(db)
    .await?;
    Ok(())
}

async fn tag_ids_by_recipe<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[i32],
) -> Result<BTreeMap<i32, Vec<i32>>, DbErr> {
    if recipe_ids.is_empty() {
        return Ok(BTreeMap::new());
    }
    let rows = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(recipe_tag::Column::TagId)
        .all(db)
        .await?;

    let mut by_recipe: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
    for row in rows {
        by_recipe.entry(row.recipe_id).or_default().push(row.tag_id);
    }
    Ok(by_recipe)
}

async fn ingredient_ids_by_recipe<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[i32],
) -> Result<BTreeMap<i32, Vec<i32>>, DbErr> {
    if recipe_ids.is_empty() {
        return Ok(BTreeMap::new());
    }
    let rows = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(recipe_ingredient::Column::IngredientId)
        .all(db)
        .await?;

    let mut by_recipe: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
    for row in rows {
        by_recipe
            .entry(row.recipe_id)
            .or_default()
            .push(row.ingredient_id);
    }
    Ok(by_recipe)
}
