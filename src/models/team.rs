// src/models/team.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Membro ativo (usuário registrado)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
    pub weekly_capacity: Option<f64>,
    pub location: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
}

// Membro pré-registrado (convite ainda não aceito)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub weekly_capacity: Option<f64>,
    pub location: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
}

/// Um membro da equipe: perfil ativo ou convite pendente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TeamMember {
    Active(Profile),
    Pending(Invite),
}

fn display_name(first: Option<&str>, last: Option<&str>, fallback: Option<&str>) -> String {
    let joined = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        fallback.unwrap_or("Unknown").to_string()
    } else {
        joined
    }
}

impl TeamMember {
    pub fn id(&self) -> Uuid {
        match self {
            TeamMember::Active(p) => p.id,
            TeamMember::Pending(i) => i.id,
        }
    }

    pub fn name(&self) -> String {
        match self {
            TeamMember::Active(p) => {
                display_name(p.first_name.as_deref(), p.last_name.as_deref(), Some(&p.email))
            }
            TeamMember::Pending(i) => {
                display_name(i.first_name.as_deref(), i.last_name.as_deref(), i.email.as_deref())
            }
        }
    }

    pub fn weekly_capacity(&self) -> Option<f64> {
        match self {
            TeamMember::Active(p) => p.weekly_capacity,
            TeamMember::Pending(i) => i.weekly_capacity,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            TeamMember::Active(p) => p.location.as_deref(),
            TeamMember::Pending(i) => i.location.as_deref(),
        }
    }

    pub fn department(&self) -> Option<&str> {
        match self {
            TeamMember::Active(p) => p.department.as_deref(),
            TeamMember::Pending(i) => i.department.as_deref(),
        }
    }

    /// Valor gravado em `project_resource_allocations.resource_type`.
    pub fn resource_type(&self) -> &'static str {
        match self {
            TeamMember::Active(_) => "active",
            TeamMember::Pending(_) => "pending",
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TeamListQuery {
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitePayload {
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub first_name: String,
    pub last_name: Option<String>,
    #[validate(range(min = 0.0, max = 168.0, message = "invalid_range"))]
    pub weekly_capacity: Option<f64>,
    pub location: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(first: Option<&str>, email: Option<&str>) -> TeamMember {
        TeamMember::Pending(Invite {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            email: email.map(String::from),
            first_name: first.map(String::from),
            last_name: None,
            weekly_capacity: Some(30.0),
            location: Some("Lisbon".into()),
            department: None,
            job_title: None,
        })
    }

    #[test]
    fn pending_members_fall_back_to_email() {
        assert_eq!(invite(None, Some("x@y.com")).name(), "x@y.com");
        assert_eq!(invite(Some(" Rui "), None).name(), "Rui");
        assert_eq!(invite(None, None).name(), "Unknown");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let value = serde_json::to_value(invite(Some("Rui"), None)).expect("json");
        assert_eq!(value["kind"], "pending");
        assert_eq!(value["weeklyCapacity"], 30.0);
    }
}
