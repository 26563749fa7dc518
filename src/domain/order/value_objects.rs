use serde::{Deserialize, Serialize};

use super::errors::{DeliveryError, ItemError, PaymentError};

// ============================================================================
// Order Value Objects
// ============================================================================
//
// Owned sub-entities of an Order. Each one validates its own mandatory
// fields; the Order aggregate composes those checks. Absent JSON keys
// decode to zero values so that validation, not decoding, rejects them.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, sqlx::FromRow)]
#[serde(default)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

impl Delivery {
    pub fn validate(&self) -> Result<(), DeliveryError> {
        if self.name.is_empty() {
            return Err(DeliveryError::EmptyName);
        }
        if self.phone.is_empty() {
            return Err(DeliveryError::EmptyPhone);
        }
        if self.city.is_empty() {
            return Err(DeliveryError::EmptyCity);
        }
        if self.address.is_empty() {
            return Err(DeliveryError::EmptyAddress);
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, sqlx::FromRow)]
#[serde(default)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

impl Payment {
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.transaction.is_empty() {
            return Err(PaymentError::EmptyTransaction);
        }
        if self.currency.is_empty() {
            return Err(PaymentError::EmptyCurrency);
        }
        if self.amount <= 0 {
            return Err(PaymentError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, sqlx::FromRow)]
#[serde(default)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i64,
}

impl Item {
    pub fn validate(&self) -> Result<(), ItemError> {
        if self.chrt_id <= 0 {
            return Err(ItemError::NonPositiveChrtId(self.chrt_id));
        }
        if self.name.is_empty() {
            return Err(ItemError::EmptyName);
        }
        if self.price < 0 {
            return Err(ItemError::NegativePrice(self.price));
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
