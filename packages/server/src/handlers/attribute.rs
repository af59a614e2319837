use axum::{Json, http::StatusCode};
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::models::attribute::{
    AttributeListQuery, AttributePatchRequest, AttributeRequest, AttributeResponse,
};
use crate::repository::attribute::{AttributeKind, AttributeRepo};

// Shared by the tag and ingredient endpoints.

pub(super) async fn list<K: AttributeKind>(
    db: &DatabaseConnection,
    owner_id: i32,
    query: &AttributeListQuery,
) -> Result<Json<Vec<AttributeResponse>>, AppError> {
    let assigned_only = query.assigned_only()?;
    let rows = AttributeRepo::<K>::new(db)
        .list(owner_id, assigned_only)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub(super) async fn create<K: AttributeKind>(
    db: &DatabaseConnection,
    owner_id: i32,
    payload: AttributeRequest,
) -> Result<(StatusCode, Json<AttributeResponse>), AppError> {
    let name = payload.validated_name()?;
    let row = AttributeRepo::<K>::new(db).create(owner_id, name).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

pub(super) async fn retrieve<K: AttributeKind>(
    db: &DatabaseConnection,
    owner_id: i32,
    id: i32,
) -> Result<Json<AttributeResponse>, AppError> {
    let row = AttributeRepo::<K>::new(db).retrieve(owner_id, id).await?;
    Ok(Json(row.into()))
}

pub(super) async fn replace<K: AttributeKind>(
    db: &DatabaseConnection,
    owner_id: i32,
    id: i32,
    payload: AttributeRequest,
) -> Result<Json<AttributeResponse>, AppError> {
    let name = payload.validated_name()?;
    let row = AttributeRepo::<K>::new(db)
        .update(owner_id, id, Some(name))
        .await?;
    Ok(Json(row.into()))
}

pub(super) async fn update<K: AttributeKind>(
    db: &DatabaseConnection,
    owner_id: i32,
    id: i32,
    payload: AttributePatchRequest,
) -> Result<Json<AttributeResponse>, AppError> {
    let name = payload.validated_name()?;
    let row = AttributeRepo::<K>::new(db).update(owner_id, id, name).await?;
    Ok(Json(row.into()))
}

pub(super) async fn delete<K: AttributeKind>(
    db: &DatabaseConnection,
    owner_id: i32,
    id: i32,
) -> Result<StatusCode, AppError> {
    AttributeRepo::<K>::new(db).delete(owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
