//! Order payload carried in `PaymentIntent` metadata.
//!
//! Stripe metadata values are limited to 500 characters and 50 keys, so the
//! JSON payload is split across `order_0..order_{n-1}` with the chunk count
//! stored under `order_chunks`. The webhook reassembles it to build the order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use moonstone_core::Money;
use moonstone_db::models::NewAddress;

/// Maximum characters per metadata value.
pub const CHUNK_SIZE: usize = 500;

/// Upper bound on chunks, leaving headroom under Stripe's 50-key limit.
pub const MAX_CHUNKS: usize = 40;

/// Metadata key holding the chunk count.
pub const CHUNK_COUNT_KEY: &str = "order_chunks";

/// Errors encoding or decoding order metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("no order payload in metadata")]
    Missing,

    #[error("invalid chunk count: {0}")]
    InvalidChunkCount(String),

    #[error("metadata chunk {0} is missing")]
    MissingChunk(usize),

    #[error("order too large for payment metadata ({chunks} chunks, max {MAX_CHUNKS})")]
    TooLarge { chunks: usize },

    #[error("order payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the webhook needs to rebuild an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub customer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<NewAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    pub items: Vec<CompactItem>,
}

/// One cart line in compact form: `{"c": id, "q": qty, "p": unit cents}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactItem {
    #[serde(rename = "c")]
    pub crystal_id: i32,
    #[serde(rename = "q")]
    pub quantity: u32,
    #[serde(rename = "p")]
    pub unit_cents: i64,
}

impl CompactItem {
    /// Unit price as money.
    #[must_use]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_cents)
    }
}

impl OrderPayload {
    /// Sum of the item lines at the prices the customer was charged.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .map(|item| item.unit_price().times(item.quantity))
            .sum()
    }
}

fn chunk_key(index: usize) -> String {
    format!("order_{index}")
}

/// Serialize and split a payload into metadata entries.
///
/// # Errors
///
/// Returns [`MetadataError::TooLarge`] when the payload needs more than
/// [`MAX_CHUNKS`] chunks.
pub fn encode(payload: &OrderPayload) -> Result<BTreeMap<String, String>, MetadataError> {
    let json = serde_json::to_string(payload)?;
    let chars: Vec<char> = json.chars().collect();
    let chunks: Vec<String> = chars
        .chunks(CHUNK_SIZE)
        .map(|chunk| chunk.iter().collect())
        .collect();

    if chunks.len() > MAX_CHUNKS {
        return Err(MetadataError::TooLarge {
            chunks: chunks.len(),
        });
    }

    let mut metadata = BTreeMap::new();
    metadata.insert(CHUNK_COUNT_KEY.to_owned(), chunks.len().to_string());
    for (index, chunk) in chunks.into_iter().enumerate() {
        metadata.insert(chunk_key(index), chunk);
    }
    Ok(metadata)
}

/// Reassemble a payload from metadata.
///
/// # Errors
///
/// Returns [`MetadataError::Missing`] when there is no chunk count, and the
/// other variants when chunks are missing or the JSON does not parse.
pub fn decode(metadata: &HashMap<String, String>) -> Result<OrderPayload, MetadataError> {
    let raw_count = metadata.get(CHUNK_COUNT_KEY).ok_or(MetadataError::Missing)?;
    let count: usize = raw_count
        .trim()
        .parse()
        .map_err(|_| MetadataError::InvalidChunkCount(raw_count.clone()))?;
    if count == 0 || count > MAX_CHUNKS {
        return Err(MetadataError::InvalidChunkCount(raw_count.clone()));
    }

    let mut json = String::with_capacity(count * CHUNK_SIZE);
    for index in 0..count {
        let chunk = metadata
            .get(&chunk_key(index))
            .ok_or(MetadataError::MissingChunk(index))?;
        json.push_str(chunk);
    }

    Ok(serde_json::from_str(&json)?)
}
