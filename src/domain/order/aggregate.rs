use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{DecodeError, ValidationError};
use super::value_objects::{Delivery, Item, Payment};

/// How far ahead of the processing clock `date_created` may be.
pub const MAX_CLOCK_SKEW_MINUTES: i64 = 5;

// ============================================================================
// Order Aggregate
// ============================================================================
//
// The aggregate root of an ingested order. It is created once, after
// validation, and never mutated afterwards; the field names double as the
// JSON wire format for both the inbound stream and the HTTP API.
//
// `date_created` is held in canonical form once accepted: UTC, at most
// microsecond precision, `Z` suffix. That is also what the store returns,
// so a cached copy and a stored copy render identically.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Order {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    pub items: Vec<Item>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: String,
    pub oof_shard: String,
}

/// Render a timestamp the way `date_created` is stored.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.trunc_subsecs(6).to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl Order {
    /// Decode a raw message payload. Structural problems only; business
    /// rules are checked by [`Order::validate`].
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }
        Ok(serde_json::from_slice(payload)?)
    }

    /// Parse `date_created` as an RFC 3339 timestamp.
    pub fn created_at(&self) -> Result<DateTime<Utc>, ValidationError> {
        DateTime::parse_from_rfc3339(&self.date_created)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| ValidationError::InvalidDateCreated(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_at(Utc::now())
    }

    /// Rewrite `date_created` in canonical form. Left untouched when it does
    /// not parse, which validation reports separately.
    pub fn normalize_date_created(&mut self) {
        if let Ok(ts) = self.created_at() {
            self.date_created = format_timestamp(ts);
        }
    }

    /// Validate against an explicit processing time.
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.order_uid.is_empty() {
            return Err(ValidationError::EmptyOrderUid);
        }
        if self.track_number.is_empty() {
            return Err(ValidationError::EmptyTrackNumber);
        }
        if self.customer_id.is_empty() {
            return Err(ValidationError::EmptyCustomerId);
        }
        if self.date_created.is_empty() {
            return Err(ValidationError::EmptyDateCreated);
        }

        let created_at = self.created_at()?;
        if created_at > now + Duration::minutes(MAX_CLOCK_SKEW_MINUTES) {
            return Err(ValidationError::DateCreatedInFuture(self.date_created.clone()));
        }

        self.delivery.validate()?;
        self.payment.validate()?;

        if self.items.is_empty() {
            return Err(ValidationError::EmptyItems);
        }
        for (index, item) in self.items.iter().enumerate() {
            item.validate()
                .map_err(|source| ValidationError::Item { index, source })?;
        }

        Ok(())
    }
}

// ============================================================================
// Test fixtures
// ============================================================================


// ============================================================================
// Unit Tests
// ============================================================================
