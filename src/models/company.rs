// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    #[schema(example = "Studio Arquitetura")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Studio Arquitetura")]
    pub name: String,

    // Perfil do dono, criado junto com a empresa
    #[validate(length(min = 1, message = "required"))]
    pub first_name: String,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub department: Option<String>,
}
