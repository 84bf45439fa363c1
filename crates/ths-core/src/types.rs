//! # Domain Types
//!
//! Core domain types shared by the stores, the REST gateway and the local cache.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    NewOrder     │   │     Shift       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  total          │   │  id             │       │
//! │  │  barcode        │   │  payment_method │   │  cashier_id     │       │
//! │  │  sale_price     │   │  products[]     │   │  initial_cash   │       │
//! │  │  stock_quantity │   │  shift_id       │   │  status         │       │
//! │  │  storehouse_id  │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Warehouse     │   │  NewTransfer    │   │   PromoCode     │       │
//! │  │  id, name       │   │  from / to      │   │  code, discount │       │
//! │  │  location       │   │  products[]     │   │  is_active      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! All types use camelCase field names, matching the backend. Numeric fields
//! are decoded leniently (numbers or numeric strings).

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::{Money, Percentage};
use crate::wire::{lenient_bool, lenient_i64, lenient_opt_i64, lenient_string};

// =============================================================================
// Product
// =============================================================================

/// A product available for sale, as returned by the catalog service.
///
/// Immutable from the client's perspective, except for the sale price
/// override applied to a cart line at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,

    /// Barcode, unique within a warehouse.
    #[serde(deserialize_with = "lenient_string")]
    pub barcode: String,

    /// Display name shown to the cashier and on the receipt.
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub brand: String,

    /// Image URL.
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_reference: Option<String>,

    /// Purchase cost.
    #[serde(default)]
    pub cost: Money,

    /// Unit sale price.
    pub sale_price: Money,

    /// Units on hand in `storehouse_id`.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub stock_quantity: i64,

    /// Owning warehouse.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub storehouse_id: i64,
}

impl Product {
    /// True when at least one unit is on hand.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// Payload for registering a new product in the catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub image: String,
    pub cost: Money,
    pub sale_price: Money,
    pub stock_quantity: i64,
    pub storehouse_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_reference: Option<String>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays. Mixed methods split into a cash and an electronic part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    CashCard,
    CashTransfer,
}

impl PaymentMethod {
    /// All methods, in the order the tender screen lists them.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
        PaymentMethod::CashCard,
        PaymentMethod::CashTransfer,
    ];

    /// Label shown on the tender screen.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Efectivo",
            PaymentMethod::Card => "Tarjeta",
            PaymentMethod::Transfer => "Transferencia",
            PaymentMethod::CashCard => "Efectivo + Tarjeta",
            PaymentMethod::CashTransfer => "Efectivo + Transferencia",
        }
    }

    /// Wire identifier (`cash`, `cash_card`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::CashCard => "cash_card",
            PaymentMethod::CashTransfer => "cash_transfer",
        }
    }

    /// True when part of the payment goes into the cash drawer.
    pub fn involves_cash(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Cash | PaymentMethod::CashCard | PaymentMethod::CashTransfer
        )
    }

    /// True when part of the payment is card or bank transfer.
    pub fn involves_electronic(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One line of an order payload.
///
/// Prices are not re-captured: the backend recomputes them from `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub quantity: i64,
    #[serde(default)]
    pub discount: Percentage,
}

/// Order payload submitted at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: i64,
    pub user_pin: String,
    pub total: Money,
    pub status: String,
    pub payment_method: PaymentMethod,
    pub discount: Percentage,
    pub cash_received: Money,
    pub physical_amount: Money,
    pub electronic_amount: Money,
    pub commission: Money,
    pub products: Vec<OrderLine>,
    pub shift_id: Option<i64>,
}

/// A registered order as listed by `GET /orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub user_id: i64,
    #[serde(default)]
    pub total: Money,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_method: String,
    #[serde(default)]
    pub discount: Percentage,
    #[serde(default)]
    pub cash_received: Money,
    #[serde(default)]
    pub physical_amount: Money,
    #[serde(default)]
    pub electronic_amount: Money,
    #[serde(default)]
    pub commission: Money,
    #[serde(default)]
    pub products: Vec<OrderLine>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub shift_id: Option<i64>,
}

/// A line of a registered order, with the price the backend charged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub order_id: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub product_id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_name: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Money,
    #[serde(default)]
    pub discount: Percentage,
}

/// Printable receipt returned by the order endpoint.
///
/// Opaque to the client: typically a PDF that the UI hands to a viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Receipt {
    /// True when the backend sent a PDF document.
    pub fn is_pdf(&self) -> bool {
        self.content_type.starts_with("application/pdf") || self.bytes.starts_with(b"%PDF")
    }
}

// =============================================================================
// Shifts
// =============================================================================

/// A cashier's working session as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub cashier_id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub initial_cash: Money,
    #[serde(default)]
    pub final_cash: Option<Money>,
    #[serde(default)]
    pub total_sales: Option<Money>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Shift {
    /// Parses the start timestamp, if the backend sent a recognizable one.
    pub fn started_at(&self) -> Option<NaiveDateTime> {
        parse_server_timestamp(&self.start)
    }
}

/// Sales of one payment method within a shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesByMethod {
    pub payment_method: PaymentMethod,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_orders: i64,
    #[serde(default)]
    pub total_by_type: Money,
}

/// Aggregated sales report for a shift (`GET /orders/shift/:id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSales {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub number_of_sales_in_shift: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub shift_id: i64,
    #[serde(default)]
    pub total_sales_in_shift: Money,
    #[serde(default)]
    pub total_physical_amount: Money,
    #[serde(default)]
    pub total_electronic_amount: Money,
    #[serde(default)]
    pub sales: Vec<SalesByMethod>,
}

// =============================================================================
// Warehouses & Transfers
// =============================================================================

/// A physical location holding stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
}

/// Product reference inside a transfer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLine {
    pub id: i64,
}

/// Payload for `POST /transfers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransfer {
    pub from_storehouse_id: i64,
    pub to_storehouse_id: i64,
    pub status: String,
    pub products: Vec<TransferLine>,
}

/// One row of the transfer history (one product moved per row).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_at: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub from_storehouse_id: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub to_storehouse_id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_barcode: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub product_stock: i64,
    #[serde(rename = "productTursoID", default, deserialize_with = "lenient_i64")]
    pub product_remote_id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
}

// =============================================================================
// Promo Codes, Users, Held Sales
// =============================================================================

/// A discount code. Never merged into the cart automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(default)]
    pub discount: Percentage,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_active: bool,
}

/// A cashier account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pin: String,
}

/// Serialized cart parked on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldCartInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub string: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub json: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub pass: i64,
}

/// A sale in process, parked so the register can serve another customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldSale {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: String,
    pub cart_info: HeldCartInfo,
}

// =============================================================================
// Timestamps
// =============================================================================

/// Format the backend expects for timestamps sent in requests:
/// `YYYY-MM-DD HH:MM:SS.mmm` in local time.
pub const REQUEST_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Formats a local timestamp for a request body.
pub fn format_request_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    date.with_timezone(&Local)
        .format(REQUEST_DATE_FORMAT)
        .to_string()
}

/// Parses a timestamp as the backend sends it (RFC 3339 or the request format).
pub fn parse_server_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, REQUEST_DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_normalizes_text_numbers() {
        let json = r#"{
            "id": "12",
            "barcode": 7501000111,
            "name": "Filtro de aceite",
            "brand": null,
            "image": "",
            "cost": "80.50",
            "salePrice": "120",
            "stockQuantity": "4",
            "storehouseId": 2
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 12);
        assert_eq!(product.barcode, "7501000111");
        assert_eq!(product.brand, "");
        assert_eq!(product.cost.cents(), 8050);
        assert_eq!(product.sale_price.cents(), 12000);
        assert_eq!(product.stock_quantity, 4);
        assert!(product.in_stock());
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashTransfer).unwrap(),
            "\"cash_transfer\""
        );
        assert!(PaymentMethod::CashCard.involves_cash());
        assert!(PaymentMethod::CashCard.involves_electronic());
        assert!(!PaymentMethod::Card.involves_cash());
        assert!(!PaymentMethod::Cash.involves_electronic());
        assert_eq!(PaymentMethod::Transfer.label(), "Transferencia");
    }

    #[test]
    fn test_promo_code_active_flag_from_integer() {
        let code: PromoCode =
            serde_json::from_str(r#"{"id":1,"code":"VERANO","discount":15,"isActive":1}"#)
                .unwrap();
        assert!(code.is_active);
        assert_eq!(code.discount, Percentage::from_percent(15));
    }

    #[test]
    fn test_shift_sales_decoding() {
        let json = r#"{
            "numberOfSalesInShift": 3,
            "shiftId": 9,
            "totalSalesInShift": "450.00",
            "totalPhysicalAmount": 300,
            "totalElectronicAmount": 150,
            "sales": [{"paymentMethod": "cash", "totalOrders": 2, "totalByType": 300}]
        }"#;
        let sales: ShiftSales = serde_json::from_str(json).unwrap();
        assert_eq!(sales.total_sales_in_shift.cents(), 45000);
        assert_eq!(sales.sales[0].payment_method, PaymentMethod::Cash);
    }

    #[test]
    fn test_timestamp_parsing() {
        assert!(parse_server_timestamp("2024-11-20 10:15:00.123").is_some());
        assert!(parse_server_timestamp("2024-11-20T10:15:00Z").is_some());
        assert!(parse_server_timestamp("2024-11-20 10:15:00").is_some());
        assert!(parse_server_timestamp("yesterday").is_none());
        assert!(parse_server_timestamp("").is_none());
    }

    #[test]
    fn test_receipt_detection() {
        let receipt = Receipt {
            content_type: "application/octet-stream".into(),
            bytes: b"%PDF-1.7 ...".to_vec(),
        };
        assert!(receipt.is_pdf());
    }
}
