use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::products;

#[derive(Debug, Clone, Serialize)]
pub struct ProductDto {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub inventory: i32,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl From<products::Model> for ProductDto {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            inventory: model.inventory,
            category: model.category,
            image_url: model.image_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductDto>,
}

/// Body for successful mutations; `id` is only present on creation.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
}

impl MutationResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
        }
    }

    pub fn created(message: impl Into<String>, id: i32) -> Self {
        Self {
            message: message.into(),
            id: Some(id),
        }
    }
}

/// Creation body. Price and inventory are accepted either as JSON numbers
/// or as numeric strings, so form-built clients keep working.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub price: Option<Value>,
    pub inventory: Option<Value>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// Partial update body; absent fields leave the stored value untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<Value>,
    pub inventory: Option<Value>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

pub fn coerce_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn coerce_inventory(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn price_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_price(&json!(19.99)), Some(19.99));
        assert_eq!(coerce_price(&json!("19.99")), Some(19.99));
        assert_eq!(coerce_price(&json!(5)), Some(5.0));
        assert_eq!(coerce_price(&json!("abc")), None);
        assert_eq!(coerce_price(&json!(null)), None);
    }

    #[test]
    fn inventory_accepts_integers_and_numeric_strings() {
        assert_eq!(coerce_inventory(&json!(10)), Some(10));
        assert_eq!(coerce_inventory(&json!("10")), Some(10));
        assert_eq!(coerce_inventory(&json!(3.9)), Some(3));
        assert_eq!(coerce_inventory(&json!("ten")), None);
        assert_eq!(coerce_inventory(&json!([])), None);
    }
}
