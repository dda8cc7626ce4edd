use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::forms::validators::storable_price;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Writable product columns, as emitted by a validated product form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl ProductFields {
    /// Storage-level invariant shared by every backend
    pub fn is_storable(&self) -> bool {
        !self.name.is_empty() && self.quantity >= 0 && self.price >= Decimal::ZERO && storable_price(self.price)
    }
}

impl Product {
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.clone(),
            quantity: self.quantity,
            price: self.price,
        }
    }
}
