use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user_company::{Role, UserCompany};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub registration_number: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub country_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Company data supplied with a registration request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    pub name: String,
    #[serde(alias = "nit")]
    pub registration_number: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub country_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
}

/// A company as seen from one of its members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMembership {
    pub user_company_id: Uuid,
    pub role: Role,
    pub is_selected: bool,
    pub company: Company,
}

impl CompanyMembership {
    pub fn new(membership: UserCompany, company: Company) -> Self {
        Self {
            user_company_id: membership.id,
            role: membership.role,
            is_selected: membership.is_selected,
            company,
        }
    }
}
