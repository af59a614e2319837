use std::collections::BTreeSet;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Select,
};

use crate::entity::{ingredient, recipe, tag};
use crate::error::AppError;

/// An entity whose rows are owned by a single account.
///
/// Every read or write through the API must only see rows owned by the
/// caller; the functions below build those restricted queries once for
/// tags, ingredients and recipes.
pub trait OwnedEntity: EntityTrait {
    /// Human-readable name used in error messages ("Tag", "Recipe", ...).
    const LABEL: &'static str;

    /// Column holding the owning account's id.
    fn owner_column() -> Self::Column;

    /// Integer primary key column.
    fn id_column() -> Self::Column;
}

impl OwnedEntity for tag::Entity {
    const LABEL: &'static str = "Tag";

    fn owner_column() -> Self::Column {
        tag::Column::UserId
    }

    fn id_column() -> Self::Column {
        tag::Column::Id
    }
}

impl OwnedEntity for ingredient::Entity {
    const LABEL: &'static str = "Ingredient";

    fn owner_column() -> Self::Column {
        ingredient::Column::UserId
    }

    fn id_column() -> Self::Column {
        ingredient::Column::Id
    }
}

impl OwnedEntity for recipe::Entity {
    const LABEL: &'static str = "Recipe";

    fn owner_column() -> Self::Column {
        recipe::Column::UserId
    }

    fn id_column() -> Self::Column {
        recipe::Column::Id
    }
}

/// `SELECT ... FROM <entity> WHERE <owner> = owner_id`.
pub fn scoped_find<E: OwnedEntity>(owner_id: i32) -> Select<E> {
    E::find().filter(E::owner_column().eq(owner_id))
}

/// Fetch a row by id, but only if `owner_id` owns it.
///
/// Rows of other accounts produce the same `NotFound` as ids that do not
/// exist at all.
pub async fn find_owned<E, C>(db: &C, owner_id: i32, id: i32) -> Result<E::Model, AppError>
where
    E: OwnedEntity,
    C: ConnectionTrait,
{
    scoped_find::<E>(owner_id)
        .filter(E::id_column().eq(id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", E::LABEL)))
}

/// Check that every id refers to an existing row of `E`, regardless of owner.
///
/// Returns the ids de-duplicated and sorted.
pub async fn ensure_exist<E, C>(db: &C, ids: &[i32]) -> Result<Vec<i32>, AppError>
where
    E: OwnedEntity,
    C: ConnectionTrait,
{
    let wanted: BTreeSet<i32> = ids.iter().copied().collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let found: BTreeSet<i32> = E::find()
        .filter(E::id_column().is_in(wanted.iter().copied()))
        .select_only()
        .column(E::id_column())
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    if let Some(missing) = wanted.difference(&found).next() {
        return Err(AppError::Validation(format!(
            "Invalid pk \"{missing}\" - {} does not exist.",
            E::LABEL.to_lowercase()
        )));
    }

    Ok(wanted.into_iter().collect())
}
