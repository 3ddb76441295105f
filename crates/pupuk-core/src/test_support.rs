//! Builders shared by the unit tests.

use chrono::{TimeZone, Utc};

use crate::money::Money;
use crate::types::{
    CartItem, Packaging, Product, ProductType, ShippingMethod, Transaction, TransactionStatus, Variant,
};

/// Product of type `type_id` with one variant per `(packaging_id, price)`.
pub fn product(id: &str, name: &str, type_id: &str, variants: &[(&str, i64)]) -> Product {
    let created = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{} untuk tanaman pangan", name),
        npk_formula: None,
        product_type: ProductType {
            id: type_id.to_string(),
            name: type_id.to_uppercase(),
        },
        image_url: None,
        variants: variants
            .iter()
            .map(|(packaging_id, price)| Variant {
                id: format!("{}-{}", id, packaging_id),
                product_id: id.to_string(),
                packaging: Packaging {
                    id: packaging_id.to_string(),
                    name: format!("Karung {}", packaging_id),
                    weight_kg: None,
                },
                price: Money::from_rupiah(*price),
                stock: 10,
                sku: None,
            })
            .collect(),
        is_active: true,
        created_at: created,
        updated_at: created,
    }
}

/// Server-side cart line for `variant_id`.
pub fn cart_item(id: &str, variant_id: &str, price: i64, quantity: i64) -> CartItem {
    CartItem {
        id: id.to_string(),
        variant_id: variant_id.to_string(),
        product_id: format!("product-of-{}", variant_id),
        product_name: format!("Pupuk {}", variant_id),
        packaging_name: "Karung 50 kg".to_string(),
        price: Money::from_rupiah(price),
        quantity,
    }
}

/// Regular-shipping order with no lines, in `status`.
pub fn transaction(id: &str, status: TransactionStatus, total: i64) -> Transaction {
    let created = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
    Transaction {
        id: id.to_string(),
        invoice_number: format!("INV-{}", id),
        user_id: "u1".to_string(),
        customer_name: None,
        status,
        items: Vec::new(),
        subtotal: Money::from_rupiah(total),
        ppn_amount: Money::zero(),
        shipping_method: ShippingMethod::Regular,
        shipping_cost: Money::zero(),
        total: Money::from_rupiah(total),
        shipping_address: Default::default(),
        notes: None,
        payment: None,
        created_at: created,
        updated_at: created,
    }
}
