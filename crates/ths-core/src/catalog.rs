//! Product list filtering for the search box.
//!
//! Recomputed on every keystroke. A linear scan is fine at register catalog
//! sizes; there is no index.

use crate::types::Product;

/// Case-insensitive substring match over barcode and name.
///
/// An empty (or all-whitespace) query matches everything.
///
/// ## Example
/// ```rust
/// use ths_core::catalog::matches_query;
/// use ths_core::{Money, Product};
///
/// let product = Product {
///     id: 7,
///     barcode: "7501000111".into(),
///     name: "Filtro de Aceite".into(),
///     brand: String::new(),
///     image: String::new(),
///     internal_reference: None,
///     cost: Money::zero(),
///     sale_price: Money::from_cents(12000),
///     stock_quantity: 4,
///     storehouse_id: 1,
/// };
/// assert!(matches_query(&product, "aceite"));
/// assert!(matches_query(&product, "1000"));
/// assert!(!matches_query(&product, "bujía"));
/// ```
pub fn matches_query(product: &Product, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    matches_lowered(product, &needle)
}

fn matches_lowered(product: &Product, needle: &str) -> bool {
    needle.is_empty()
        || product.barcode.to_lowercase().contains(needle)
        || product.name.to_lowercase().contains(needle)
}

/// Returns the products matching `query`, in catalog order.
pub fn filter_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();
    products
        .iter()
        .filter(|p| matches_lowered(p, &needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn product(barcode: &str, name: &str) -> Product {
        Product {
            id: 1,
            barcode: barcode.to_string(),
            name: name.to_string(),
            brand: String::new(),
            image: String::new(),
            internal_reference: None,
            cost: Money::zero(),
            sale_price: Money::from_cents(100),
            stock_quantity: 1,
            storehouse_id: 1,
        }
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let products = vec![
            product("ABC-1", "Balata Delantera"),
            product("XYZ-9", "Balata Trasera"),
            product("QQQ-2", "Anticongelante"),
        ];

        assert_eq!(filter_products(&products, "balata").len(), 2);
        assert_eq!(filter_products(&products, "abc").len(), 1);
        assert_eq!(filter_products(&products, "  TRASERA ").len(), 1);
        assert_eq!(filter_products(&products, "").len(), 3);
        assert!(filter_products(&products, "llanta").is_empty());
    }

    #[test]
    fn test_filter_keeps_catalog_order() {
        let products = vec![product("2", "Aceite 2"), product("1", "Aceite 1")];
        let hits = filter_products(&products, "aceite");
        assert_eq!(hits[0].barcode, "2");
        assert_eq!(hits[1].barcode, "1");
    }
}
