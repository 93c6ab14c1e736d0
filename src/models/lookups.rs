// src/models/lookups.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfficeStage {
    pub id: Uuid,
    #[schema(example = "Concept")]
    pub name: String,
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfficeLocation {
    pub id: Uuid,
    #[schema(example = "Lisbon")]
    pub city: String,
    #[schema(example = "PT")]
    pub country: String,
    #[schema(example = "LIS")]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectArea {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub country: Option<String>,
}
