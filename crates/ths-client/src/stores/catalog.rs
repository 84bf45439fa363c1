//! # Catalog Store
//!
//! Product list, live search box, and scan-to-cart.
//!
//! ## User Workflow
//! ```text
//! Type in search box ──► set_search_query() ──► filtered_products()
//!                                                  └── exactly one hit + Enter
//!                                                      → add_single_product_to_cart()
//! Scan barcode ────────► search_by_barcode()  ──► one in-stock match → cart
//! Search by name ──────► search_by_name()     ──► product list replaced,
//!                                                  filter runs over the hits
//! ```

use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

use ths_core::catalog::filter_products;
use ths_core::validation::{validate_barcode, validate_product_name, validate_search_query};
use ths_core::{CoreError, NewProduct, Product};

use super::{CartStore, Loading, Services};
use crate::error::{ClientError, ClientResult};

pub struct CatalogStore {
    services: Services,
    cart: Arc<CartStore>,
    products: RwLock<Vec<Product>>,
    query: RwLock<String>,
    loading: Loading,
}

impl CatalogStore {
    pub fn new(services: Services, cart: Arc<CartStore>) -> Self {
        Self {
            services,
            cart,
            products: RwLock::new(Vec::new()),
            query: RwLock::new(String::new()),
            loading: Loading::default(),
        }
    }

    /// True while a catalog request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    fn replace_products(&self, products: Vec<Product>) {
        *self.products.write().unwrap_or_else(|e| e.into_inner()) = products;
    }

    /// Loads the full product list.
    pub async fn load_all_products(&self) -> ClientResult<Vec<Product>> {
        let _loading = self.loading.start();
        let products = self.services.api.fetch_products().await.map_err(|e| {
            error!(error = %e, "Failed to load products");
            e
        })?;
        info!(count = products.len(), "Products loaded");
        self.replace_products(products.clone());
        Ok(products)
    }

    pub fn products(&self) -> Vec<Product> {
        self.products
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Server-side name search. Hits replace the product list, so the live
    /// filter narrows them further. Returns `false` and toasts when nothing
    /// matches, leaving the list as it was.
    pub async fn search_by_name(&self, name: &str) -> bool {
        let query = match validate_search_query(name) {
            Ok(query) if !query.is_empty() => query,
            Ok(_) => return false,
            Err(e) => {
                self.services.notifier.error(&e.to_string());
                return false;
            }
        };

        let _loading = self.loading.start();
        match self.services.api.search_products_by_name(&query).await {
            Ok(found) if found.is_empty() => {
                debug!(query = %query, "Name search found nothing");
                self.services
                    .notifier
                    .error(&format!("No products match \"{}\"", query));
                false
            }
            Ok(found) => {
                debug!(query = %query, count = found.len(), "Name search");
                self.replace_products(found);
                true
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Name search failed");
                self.services
                    .notifier
                    .error(&format!("Search failed: {}", e));
                false
            }
        }
    }

    /// Scan-to-cart: one in-stock match goes straight into the cart.
    pub async fn search_by_barcode(&self, barcode: &str) -> bool {
        let barcode = match validate_barcode(barcode) {
            Ok(barcode) => barcode,
            Err(e) => {
                self.services.notifier.error(&e.to_string());
                return false;
            }
        };

        let _loading = self.loading.start();
        match self.services.api.search_products_by_barcode(&barcode).await {
            Ok(found) => {
                let single = match found.as_slice() {
                    [product] => Some(product),
                    _ => None,
                };
                self.add_single(&barcode, single)
            }
            Err(e) => {
                warn!(barcode = %barcode, error = %e, "Barcode search failed");
                self.services
                    .notifier
                    .error(&format!("Search failed: {}", e));
                false
            }
        }
    }

    fn add_single(&self, barcode: &str, product: Option<&Product>) -> bool {
        let rejection = match product {
            Some(p) if p.in_stock() => {
                if !self.cart.add_to_cart(p) {
                    return false;
                }
                self.services
                    .notifier
                    .success(&format!("{} added to cart", p.name));
                return true;
            }
            Some(p) => CoreError::OutOfStock(p.barcode.clone()),
            None => CoreError::ProductNotFound(barcode.to_string()),
        };
        self.services.notifier.error(&rejection.to_string());
        false
    }

    // =========================================================================
    // Live Filter
    // =========================================================================

    pub fn set_search_query(&self, query: &str) {
        *self.query.write().unwrap_or_else(|e| e.into_inner()) = query.to_string();
    }

    pub fn search_query(&self) -> String {
        self.query.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Products matching the search box, recomputed on every call.
    pub fn filtered_products(&self) -> Vec<Product> {
        let query = self.search_query();
        let products = self.products.read().unwrap_or_else(|e| e.into_inner());
        filter_products(&products, &query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Adds the only product left by the filter. `false` unless exactly one.
    pub fn add_single_product_to_cart(&self) -> bool {
        let filtered = self.filtered_products();
        match filtered.as_slice() {
            [product] => self.add_single(&product.barcode, Some(product)),
            _ => false,
        }
    }

    // =========================================================================
    // Catalog Admin
    // =========================================================================

    /// Registers a product in the catalog service.
    pub async fn create_product(&self, product: NewProduct) -> ClientResult<Value> {
        let checked = validate_barcode(&product.barcode)
            .and_then(|_| validate_product_name(&product.name));
        if let Err(e) = checked {
            self.services.notifier.error(&e.to_string());
            return Err(ClientError::from(e));
        }

        let _loading = self.loading.start();
        match self.services.api.create_product(&product).await {
            Ok(created) => {
                info!(barcode = %product.barcode, "Product created");
                self.services
                    .notifier
                    .success(&format!("{} created", product.name));
                Ok(created)
            }
            Err(e) => {
                error!(barcode = %product.barcode, error = %e, "Failed to create product");
                self.services
                    .notifier
                    .error(&format!("Failed to create product: {}", e));
                Err(e)
            }
        }
    }
}
