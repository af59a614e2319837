use std::future::Future;
use std::marker::PhantomData;

use sea_orm::*;
use tracing::instrument;

use super::scoped::{OwnedEntity, find_owned, scoped_find};
use crate::entity::{ingredient, recipe_ingredient, recipe_tag, tag};
use crate::error::AppError;

/// A tag or ingredient row, without its owner.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct Attribute {
    pub id: i32,
    pub name: String,
}

/// Per-kind plumbing for [`AttributeRepo`]. Tags and ingredients are both
/// `{id, name}` labels linked to recipes through a join table.
pub trait AttributeKind {
    type Entity: OwnedEntity;
    /// Join table linking recipes to this kind.
    type Link: EntityTrait;

    fn name_column() -> <Self::Entity as EntityTrait>::Column;

    /// Column of [`Self::Link`] referencing this kind's id.
    fn link_column() -> <Self::Link as EntityTrait>::Column;

    fn insert(
        db: &DatabaseConnection,
        owner_id: i32,
        name: String,
    ) -> impl Future<Output = Result<Attribute, DbErr>> + Send;

    fn rename(
        db: &DatabaseConnection,
        id: i32,
        name: String,
    ) -> impl Future<Output = Result<Attribute, DbErr>> + Send;
}

pub struct TagKind;

impl AttributeKind for TagKind {
    type Entity = tag::Entity;
    type Link = recipe_tag::Entity;

    fn name_column() -> tag::Column {
        tag::Column::Name
    }

    fn link_column() -> recipe_tag::Column {
        recipe_tag::Column::TagId
    }

    async fn insert(db: &DatabaseConnection, owner_id: i32, name: String) -> Result<Attribute, DbErr> {
        let model = tag::ActiveModel {
            name: Set(name),
            user_id: Set(owner_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(Attribute {
            id: model.id,
            name: model.name,
        })
    }

    async fn rename(db: &DatabaseConnection, id: i32, name: String) -> Result<Attribute, DbErr> {
        let model = tag::ActiveModel {
            id: Unchanged(id),
            name: Set(name),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(Attribute {
            id: model.id,
            name: model.name,
        })
    }
}

pub struct IngredientKind;

impl AttributeKind for IngredientKind {
    type Entity = ingredient::Entity;
    type Link = recipe_ingredient::Entity;

    fn name_column() -> ingredient::Column {
        ingredient::Column::Name
    }

    fn link_column() -> recipe_ingredient::Column {
        recipe_ingredient::Column::IngredientId
    }

    async fn insert(db: &DatabaseConnection, owner_id: i32, name: String) -> Result<Attribute, DbErr> {
        let model = ingredient::ActiveModel {
            name: Set(name),
            user_id: Set(owner_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(Attribute {
            id: model.id,
            name: model.name,
        })
    }

    async fn rename(db: &DatabaseConnection, id: i32, name: String) -> Result<Attribute, DbErr> {
        let model = ingredient::ActiveModel {
            id: Unchanged(id),
            name: Set(name),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(Attribute {
            id: model.id,
            name: model.name,
        })
    }
}

/// Owner-scoped CRUD for one attribute kind.
pub struct AttributeRepo<'a, K> {
    db: &'a DatabaseConnection,
    _kind: PhantomData<K>,
}

impl<'a, K: AttributeKind> AttributeRepo<'a, K> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            db,
            _kind: PhantomData,
        }
    }

    /// Rows owned by `owner_id`, by name then id, both descending.
    ///
    /// With `assigned_only`, only rows linked to at least one recipe are
    /// returned. The filter is a semi-join so every row appears once no
    /// matter how many recipes reference it.
    #[instrument(skip(self), fields(kind = K::Entity::LABEL))]
    pub async fn list(&self, owner_id: i32, assigned_only: bool) -> Result<Vec<Attribute>, AppError> {
        let id_column = K::Entity::id_column();
        let mut select = scoped_find::<K::Entity>(owner_id);

        if assigned_only {
            let linked = K::Link::find()
                .select_only()
                .column(K::link_column())
                .into_query();
            select = select.filter(id_column.in_subquery(linked));
        }

        Ok(select
            .select_only()
            .column_as(id_column, "id")
            .column_as(K::name_column(), "name")
            .order_by_desc(K::name_column())
            .order_by_desc(id_column)
            .into_model::<Attribute>()
            .all(self.db)
            .await?)
    }

    pub async fn create(&self, owner_id: i32, name: String) -> Result<Attribute, AppError> {
        Ok(K::insert(self.db, owner_id, name).await?)
    }

    pub async fn retrieve(&self, owner_id: i32, id: i32) -> Result<Attribute, AppError> {
        self.find(owner_id, id).await
    }

    /// Rename a row. `None` leaves it as is.
    #[instrument(skip(self, name), fields(kind = K::Entity::LABEL))]
    pub async fn update(
        &self,
        owner_id: i32,
        id: i32,
        name: Option<String>,
    ) -> Result<Attribute, AppError> {
        let existing = self.find(owner_id, id).await?;
        match name {
            Some(name) if name != existing.name => Ok(K::rename(self.db, id, name).await?),
            _ => Ok(existing),
        }
    }

    /// Delete a row together with its recipe links.
    #[instrument(skip(self), fields(kind = K::Entity::LABEL))]
    pub async fn delete(&self, owner_id: i32, id: i32) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        find_owned::<K::Entity, _>(&txn, owner_id, id).await?;

        K::Link::delete_many()
            .filter(K::link_column().eq(id))
            .exec(&txn)
            .await?;
        K::Entity::delete_many()
            .filter(K::Entity::id_column().eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn find(&self, owner_id: i32, id: i32) -> Result<Attribute, AppError> {
        scoped_find::<K::Entity>(owner_id)
            .filter(K::Entity::id_column().eq(id))
            .select_only()
            .column_as(K::Entity::id_column(), "id")
            .column_as(K::name_column(), "name")
            .into_model::<Attribute>()
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} not found", K::Entity::LABEL)))
    }
}
