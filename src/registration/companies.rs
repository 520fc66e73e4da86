use uuid::Uuid;

use crate::db::{COMPANY_REGISTRATION_KEY, Store};
use crate::error::AppError;
use crate::models::{Company, NewCompany};

#[derive(Debug, Clone)]
pub struct ResolvedCompany {
    pub company: Company,
    pub is_new: bool,
}

/// Resolve the company a registration targets. Exactly one of `company_id`
/// and `payload` must be given.
///
/// A payload whose registration number is already on file returns the
/// stored company untouched.
pub async fn resolve(
    store: &Store,
    company_id: Option<Uuid>,
    payload: Option<&NewCompany>,
) -> Result<ResolvedCompany, AppError> {
    match (company_id, payload) {
        (Some(id), None) => {
            let company = store
                .companies
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
            Ok(ResolvedCompany {
                company,
                is_new: false,
            })
        }
        (None, Some(payload)) => find_or_create(store, payload).await,
        _ => Err(AppError::BadRequest(
            "Provide either companyId or company data".to_string(),
        )),
    }
}

async fn find_or_create(store: &Store, payload: &NewCompany) -> Result<ResolvedCompany, AppError> {
    let payload = normalize(payload)?;

    if let Some(company) = store
        .companies
        .find_by_registration_number(&payload.registration_number)
        .await?
    {
        return Ok(ResolvedCompany {
            company,
            is_new: false,
        });
    }

    validate_location(store, &payload).await?;

    match store.companies.create(&payload).await {
        Ok(company) => {
            tracing::info!(company_id = %company.id, "Company created");
            Ok(ResolvedCompany {
                company,
                is_new: true,
            })
        }
        // Lost a race with a concurrent registration for the same number.
        Err(err) if err.is_unique_violation_on(COMPANY_REGISTRATION_KEY) => {
            let company = store
                .companies
                .find_by_registration_number(&payload.registration_number)
                .await?
                .ok_or_else(|| AppError::Internal("Company vanished after conflict".to_string()))?;
            Ok(ResolvedCompany {
                company,
                is_new: false,
            })
        }
        Err(err) => Err(err.into()),
    }
}

fn normalize(payload: &NewCompany) -> Result<NewCompany, AppError> {
    let mut company = payload.clone();
    company.name = company.name.trim().to_string();
    company.registration_number = company.registration_number.trim().to_string();
    company.email = company.email.trim().to_string();

    if company.name.is_empty() {
        return Err(AppError::BadRequest("Company name is required".to_string()));
    }
    if company.registration_number.is_empty() {
        return Err(AppError::BadRequest(
            "Company registration number is required".to_string(),
        ));
    }
    if company.email.is_empty() {
        return Err(AppError::BadRequest("Company email is required".to_string()));
    }
    Ok(company)
}

async fn validate_location(store: &Store, payload: &NewCompany) -> Result<(), AppError> {
    if let Some(country_id) = payload.country_id {
        if store.locations.find_country(country_id).await?.is_none() {
            return Err(AppError::BadRequest("Unknown country".to_string()));
        }
    }

    if let Some(city_id) = payload.city_id {
        let city = store
            .locations
            .find_city(city_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Unknown city".to_string()))?;

        if let (Some(country_id), Some(city_country)) = (payload.country_id, city.country_id) {
            if country_id != city_country {
                return Err(AppError::BadRequest(
                    "City does not belong to the given country".to_string(),
                ));
            }
        }
    }
    Ok(())
}
