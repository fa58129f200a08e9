//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product entity (one row per product in the `Product` collection)
///
/// `price` is a fixed-point decimal; stock is mutated by admin edits and by
/// the intake pipeline's decrement, always under a concurrency token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub product_name: String,
    pub description: String,
    /// Serialized as a plain JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock_available: i32,
    pub image_url: String,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub product_name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock_available: i32,
    pub image_url: Option<String>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub product_name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub stock_available: Option<i32>,
    pub image_url: Option<String>,
}
