//! Catalogue records.

use serde::{Deserialize, Serialize};

use fitwear_core::{CategoryId, Price, ProductId, SupplierId};

/// A product as listed by the API.
///
/// `selling_price` is optional: not every endpoint that embeds a product
/// includes it, and a cart line built from such a record prices at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub selling_price: Option<Price>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// One page of the product listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
    #[serde(default = "first_page")]
    pub current_page: u32,
}

const fn first_page() -> u32 {
    1
}

/// Filters for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl ProductQuery {
    /// Query-string pairs for the listing endpoint.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(category_id) = self.category_id {
            pairs.push(("category_id", category_id.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_without_price_decodes() {
        let product: Product = serde_json::from_str(r#"{"id": 3, "name": "Grip Socks"}"#).unwrap();
        assert_eq!(product.selling_price, None);
        assert!(product.is_active);
    }

    #[test]
    fn test_product_with_float_price() {
        let product: Product = serde_json::from_str(
            r#"{"id": 1, "name": "Tee", "selling_price": 24.5, "cost_price": 9.0}"#,
        )
        .unwrap();
        assert_eq!(product.selling_price, Some(Price::from_cents(2450)));
    }

    #[test]
    fn test_query_pairs_skip_blank_search() {
        let query = ProductQuery {
            page: Some(2),
            search: Some("   ".to_string()),
            category_id: Some(CategoryId::new(5)),
            ..ProductQuery::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![("page", "2".to_string()), ("category_id", "5".to_string())]
        );
    }
}
