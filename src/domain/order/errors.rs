// ============================================================================
// Order Validation Errors
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DeliveryError {
    #[error("name is empty")]
    EmptyName,

    #[error("phone is empty")]
    EmptyPhone,

    #[error("city is empty")]
    EmptyCity,

    #[error("address is empty")]
    EmptyAddress,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PaymentError {
    #[error("transaction is empty")]
    EmptyTransaction,

    #[error("currency is empty")]
    EmptyCurrency,

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(i64),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ItemError {
    #[error("chrt_id must be positive, got {0}")]
    NonPositiveChrtId(i64),

    #[error("name is empty")]
    EmptyName,

    #[error("price must be >= 0, got {0}")]
    NegativePrice(i64),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("order_uid is empty")]
    EmptyOrderUid,

    #[error("track_number is empty")]
    EmptyTrackNumber,

    #[error("customer_id is empty")]
    EmptyCustomerId,

    #[error("date_created is empty")]
    EmptyDateCreated,

    #[error("date_created has invalid format: {0}")]
    InvalidDateCreated(String),

    #[error("date_created is in the future: {0}")]
    DateCreatedInFuture(String),

    #[error("delivery validation failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("payment validation failed: {0}")]
    Payment(#[from] PaymentError),

    #[error("items list is empty")]
    EmptyItems,

    #[error("items[{index}] validation failed: {source}")]
    Item {
        index: usize,
        #[source]
        source: ItemError,
    },
}

/// Failure to turn a raw message payload into an [`Order`](super::Order).
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is empty")]
    EmptyPayload,

    #[error("malformed order payload: {0}")]
    Json(#[from] serde_json::Error),
}
