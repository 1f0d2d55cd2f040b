//! Address handlers: owner-scoped CRUD plus the anonymous
//! lookup/suggest proxy over the PDOK adapter.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use groenmarkt_core::{AddressId, Postcode};

use crate::db::addresses::{AddressInput, AddressRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::AddressType;
use crate::state::AppState;

/// Address create/update payload.
#[derive(Debug, Deserialize)]
pub struct AddressPayload {
    #[serde(default = "default_address_type")]
    pub address_type: AddressType,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    pub street: String,
    pub house_number: String,
    #[serde(default)]
    pub house_number_addition: String,
    pub postal_code: String,
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub is_default_shipping: bool,
    #[serde(default)]
    pub is_default_billing: bool,
}

const fn default_address_type() -> AddressType {
    AddressType::Shipping
}

fn default_country() -> String {
    "Nederland".to_owned()
}

/// Validate required fields and canonicalize the postcode.
fn validate(payload: &AddressPayload) -> Result<AddressInput> {
    for (value, field) in [
        (&payload.first_name, "first_name"),
        (&payload.last_name, "last_name"),
        (&payload.street, "street"),
        (&payload.house_number, "house_number"),
        (&payload.city, "city"),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
    }

    let postcode = Postcode::parse(&payload.postal_code)
        .map_err(|e| AppError::BadRequest(format!("postal_code: {e}")))?;

    Ok(AddressInput {
        address_type: payload.address_type,
        first_name: payload.first_name.trim().to_owned(),
        last_name: payload.last_name.trim().to_owned(),
        company: payload.company.trim().to_owned(),
        street: payload.street.trim().to_owned(),
        house_number: payload.house_number.trim().to_owned(),
        house_number_addition: payload.house_number_addition.trim().to_owned(),
        postal_code: postcode.to_string(),
        city: payload.city.trim().to_owned(),
        province: payload.province.trim().to_owned(),
        country: payload.country.trim().to_owned(),
        is_default_shipping: payload.is_default_shipping,
        is_default_billing: payload.is_default_billing,
    })
}

/// `GET /api/addresses`
pub async fn list(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Value>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    let formatted: Vec<Value> = addresses
        .iter()
        .map(|a| {
            let mut v = serde_json::to_value(a).unwrap_or_default();
            if let Some(obj) = v.as_object_mut() {
                obj.insert("full_address".to_owned(), json!(a.formatted()));
            }
            v
        })
        .collect();
    Ok(Json(json!({ "count": formatted.len(), "addresses": formatted })))
}

/// `POST /api/addresses`
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(payload): Json<AddressPayload>,
) -> Result<(StatusCode, Json<Value>)> {
    let input = validate(&payload)?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "address created",
            "address": address,
            "full_address": address.formatted(),
        })),
    ))
}

/// `PUT /api/addresses/{id}` — owner-scoped.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(payload): Json<AddressPayload>,
) -> Result<Json<Value>> {
    let input = validate(&payload)?;
    let address = AddressRepository::new(state.pool())
        .update(id, user.id, &input)
        .await?;
    Ok(Json(json!({
        "message": "address updated",
        "address": address,
        "full_address": address.formatted(),
    })))
}

/// `DELETE /api/addresses/{id}` — owner-scoped.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Value>> {
    AddressRepository::new(state.pool()).delete(id, user.id).await?;
    Ok(Json(json!({ "message": format!("address {id} deleted") })))
}

// =============================================================================
// PDOK proxy (anonymous)
// =============================================================================

/// Query parameters for `GET /api/address/lookup`.
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub house_number: String,
    #[serde(default)]
    pub addition: String,
}

/// `GET /api/address/lookup?postcode=1015CR&house_number=12`
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Value>> {
    let resolved = state
        .lookup()
        .lookup(&query.postcode, &query.house_number, &query.addition)
        .await?;
    Ok(Json(json!({ "address": resolved })))
}

/// Query parameters for `GET /api/address/suggest`.
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

/// `GET /api/address/suggest?q=keizersgr` — best-effort, never fails.
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> Json<Value> {
    let suggestions = state.lookup().suggest(&query.q).await;
    Json(json!({ "count": suggestions.len(), "suggestions": suggestions }))
}
