use axum::{
    extract::{Extension, Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::Product;
use crate::error::ApiError;
use crate::forms::product::{FormError, SubmitOutcome, NAME_NOT_UNIQUE};
use crate::forms::validators::{parse_decimal, parse_int};
use crate::forms::ProductForm;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::Role;

use super::{caller_role, require_admin};

/// Product payload. Numbers may arrive as JSON numbers or as text; anything
/// that does not parse reaches the form as a missing value. Absent keys keep
/// the form's current value.
#[derive(Debug, Default, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub quantity: Option<Value>,
}

impl ProductInput {
    fn apply(&self, form: &mut ProductForm) -> Result<(), FormError> {
        if let Some(name) = &self.name {
            form.set_name(name.clone())?;
        }
        if let Some(price) = &self.price {
            form.set_price(decimal_input(price))?;
        }
        if let Some(quantity) = &self.quantity {
            form.set_quantity(int_input(quantity))?;
        }
        Ok(())
    }
}

fn decimal_input(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn int_input(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => parse_int(s),
        _ => None,
    }
}

/// Map a non-successful submit outcome to a response
fn submit_failure(outcome: SubmitOutcome) -> ApiError {
    match outcome {
        SubmitOutcome::Failed(NAME_NOT_UNIQUE) => ApiError::conflict(NAME_NOT_UNIQUE),
        SubmitOutcome::Failed(message) => ApiError::internal_server_error(message),
        SubmitOutcome::Succeeded(_) | SubmitOutcome::Discarded => {
            ApiError::internal_server_error("Form closed before the save completed")
        }
    }
}

/// GET /api/products - all products, newest first
pub async fn products_get(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    let products = state.backend.list_products().await?;
    Ok(ApiResponse::success(products))
}

/// POST /api/products - create a product (admin only)
pub async fn products_post(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Product> {
    require_admin(&state, &user, "create products").await?;

    let mut form = ProductForm::create(Role::Admin);
    input.apply(&mut form)?;
    let fields = form.begin_submit()?;

    let result = state.backend.insert_product(&user, fields).await;
    match form.finish_submit(result) {
        SubmitOutcome::Succeeded(product) => Ok(ApiResponse::created(product)),
        outcome => Err(submit_failure(outcome)),
    }
}

/// PUT /api/products/:id - edit a product
///
/// Admins may change every field. Cashiers may only lower the quantity; name
/// and price must be sent unchanged or left out.
pub async fn products_put(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Product> {
    let role = caller_role(&state, &user).await?;
    if !role.is_resolved() {
        return Err(FormError::RoleUnresolved.into());
    }

    let original = state.backend.get_product(id).await?;
    let mut form = ProductForm::edit(role, &original);
    input.apply(&mut form)?;
    if let Some(delta) = form.quantity_delta() {
        tracing::debug!("{} adjusting {} by {}", user.email, original.name, delta);
    }
    let fields = form.begin_submit()?;

    let result = state.backend.update_product(&user, id, fields).await;
    match form.finish_submit(result) {
        SubmitOutcome::Succeeded(product) => Ok(ApiResponse::success(product)),
        outcome => Err(submit_failure(outcome)),
    }
}

/// DELETE /api/products/:id - remove a product (admin only)
pub async fn products_delete(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    require_admin(&state, &user, "delete products").await?;
    state.backend.delete_product(&user, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
