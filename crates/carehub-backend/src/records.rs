//! Writes: bookings and orders
//!
//! Booking inserts are idempotent. The row carries its idempotency key and the
//! insert asks the backend to skip a row whose key already exists; when that
//! happens the existing booking is looked up and its id returned.

use crate::client::Backend;
use crate::error::{BackendError, BackendResult};
use crate::query::{InsertOptions, Query};
use carehub_core::booking::NewBooking;
use carehub_core::cart::{CartLineItem, CartSummary};
use carehub_core::location::LocationState;
use carehub_core::types::{BookingId, ProfileId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Booking rows
pub const BOOKINGS_TABLE: &str = "bookings";
/// Order rows
pub const ORDERS_TABLE: &str = "orders";

/// Column carrying the booking idempotency key
pub const IDEMPOTENCY_COLUMN: &str = "idempotency_key";

/// Insert a booking, returning the id of the stored row
///
/// # Errors
/// Backend failures, or `Decode` when neither the insert nor the lookup
/// returned a row id.
pub async fn insert_booking(backend: &dyn Backend, booking: &NewBooking) -> BackendResult<BookingId> {
    let row = serde_json::to_value(booking)?;
    let inserted = backend
        .insert(BOOKINGS_TABLE, row, &InsertOptions::ignore_duplicates_on(IDEMPOTENCY_COLUMN))
        .await?;

    if let Some(id) = inserted.first().and_then(row_id) {
        tracing::info!(booking_id = %id, booking_type = booking.booking_type.as_str(), "booking created");
        return Ok(BookingId::new(id));
    }

    // Duplicate skipped: resolve the booking created by the earlier attempt
    tracing::info!(key = %booking.idempotency_key, "duplicate booking ignored, resolving existing row");
    let query = Query::new()
        .select("id")
        .eq(IDEMPOTENCY_COLUMN, &booking.idempotency_key)
        .limit(1);
    let existing = backend.select(BOOKINGS_TABLE, &query).await?;
    existing
        .first()
        .and_then(row_id)
        .map(BookingId::new)
        .ok_or_else(|| BackendError::Decode("booking insert returned no row".into()))
}

/// Order row placed from the cart
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub profile_id: ProfileId,
    pub items: Vec<CartLineItem>,
    pub item_count: u32,
    pub subtotal: f64,
    pub mrp_total: f64,
    pub total_amount: f64,
    pub requires_prescription: bool,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    pub status: String,
}

impl NewOrder {
    /// Pending order for the cart as summarised
    #[must_use]
    pub fn from_summary(profile_id: ProfileId, summary: &CartSummary, location: &LocationState) -> Self {
        Self {
            profile_id,
            items: summary.lines.clone(),
            item_count: summary.item_count,
            subtotal: summary.subtotal,
            mrp_total: summary.mrp_total,
            total_amount: summary.subtotal,
            requires_prescription: summary.requires_prescription,
            city: location.city.clone(),
            pincode: location.pincode.clone(),
            status: "pending".to_string(),
        }
    }
}

/// Insert an order, returning its id
///
/// # Errors
/// Backend failures, or `Decode` when the insert returned no row id.
pub async fn insert_order(backend: &dyn Backend, order: &NewOrder) -> BackendResult<String> {
    let row = serde_json::to_value(order)?;
    let inserted = backend.insert(ORDERS_TABLE, row, &InsertOptions::new()).await?;
    let id = inserted
        .first()
        .and_then(row_id)
        .ok_or_else(|| BackendError::Decode("order insert returned no row".into()))?;
    tracing::info!(order_id = %id, items = order.items.len(), "order placed");
    Ok(id)
}

/// `id` column as text; numeric ids are accepted
fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
