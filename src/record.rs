// 🧾 Transaction records - the engine's only input
// One row per line item sold, as handed over by the ingestion layer.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Customer identifier (integer-like in the source data)
pub type CustomerId = u64;

/// TransactionRecord - one sold line item
///
/// Immutable once built; every pipeline stage produces new values instead of
/// editing records in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub invoice_id: String,
    pub customer_id: Option<CustomerId>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub invoice_timestamp: NaiveDateTime,
}

impl TransactionRecord {
    pub fn new(
        invoice_id: impl Into<String>,
        customer_id: Option<CustomerId>,
        quantity: i64,
        unit_price: Decimal,
        invoice_timestamp: NaiveDateTime,
    ) -> Self {
        TransactionRecord {
            invoice_id: invoice_id.into(),
            customer_id,
            quantity,
            unit_price,
            invoice_timestamp,
        }
    }

    /// Cancelled invoices carry a `C` somewhere in the invoice id.
    ///
    /// The data dictionary says "starts with C", but the scoring workflow has
    /// always matched the letter anywhere in the id; that is what we keep.
    pub fn is_cancelled(&self) -> bool {
        self.invoice_id.contains('C')
    }

    /// Line total: quantity * unit price, `None` if it leaves Decimal's range
    pub fn line_total(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }
}
