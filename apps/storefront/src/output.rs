//! # Output Rendering
//!
//! Turns records into terminal text. Every function here is pure; the
//! commands decide between these tables and `--json`.

use std::fmt::Write as _;

use pupuk_client::resources::settings::LogoConfig;
use pupuk_client::{OrderEvent, PaymentHandoff, PaymentOutcome, PaymentReturn};
use pupuk_core::cart::Cart;
use pupuk_core::catalog::{CatalogFacets, Page};
use pupuk_core::checkout::CheckoutSummary;
use pupuk_core::report::{ReportSummary, SalesPoint, TopProduct};
use pupuk_core::{
    CompanyInfo, Money, Packaging, PpnConfig, Product, ProductType, ShippingMethod, Transaction,
    TransactionStatus, User,
};

/// Widest bar of the sales chart.
const CHART_WIDTH: usize = 40;

// =============================================================================
// Table
// =============================================================================

/// Left-aligned text table sized to its widest cells.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }

        let line = |cells: &[String]| -> String {
            let padded: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
                .collect();
            padded.join("  ").trim_end().to_string()
        };

        let mut out = String::new();
        out.push_str(&line(&self.headers));
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("  "));
        for row in &self.rows {
            out.push('\n');
            out.push_str(&line(row));
        }
        out
    }
}

fn or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Rows are numbered from 1 on every page, the numbers `open <n>` takes.
pub fn catalog_page(page: &Page<Product>) -> String {
    if page.items.is_empty() {
        return "No products match your search.".to_string();
    }

    let mut table = Table::new(["#", "ID", "PRODUCT", "TYPE", "NPK", "PRICE", "STOCK"]);
    for (i, product) in page.items.iter().enumerate() {
        table.row([
            (i + 1).to_string(),
            product.id.clone(),
            product.name.clone(),
            product.product_type.name.clone(),
            or_dash(product.npk_formula.as_deref()),
            product.price_label(),
            product.total_stock().to_string(),
        ]);
    }

    format!(
        "{}\n\nPage {} of {} ({} products)",
        table.render(),
        page.page,
        page.total_pages,
        page.total_items
    )
}

pub fn product_detail(product: &Product) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", product.name, product.id);
    let _ = writeln!(out, "Type: {}", product.product_type.name);
    if let Some(npk) = product.npk_formula.as_deref() {
        let _ = writeln!(out, "NPK:  {}", npk);
    }
    if !product.is_active {
        let _ = writeln!(out, "Not for sale");
    }
    if !product.description.trim().is_empty() {
        let _ = writeln!(out, "\n{}", product.description.trim());
    }

    if product.variants.is_empty() {
        out.push_str("\nNo packagings available.");
        return out;
    }

    let mut table = Table::new(["#", "VARIANT", "PACKAGING", "PRICE", "STOCK"]);
    for (i, variant) in product.variants.iter().enumerate() {
        let stock = if variant.in_stock() {
            variant.stock.to_string()
        } else {
            "sold out".to_string()
        };
        table.row([
            (i + 1).to_string(),
            variant.id.clone(),
            variant.packaging.name.clone(),
            variant.price.to_string(),
            stock,
        ]);
    }
    let _ = write!(out, "\n{}", table.render());
    out
}

pub fn facets(facets: &CatalogFacets) -> String {
    let mut out = String::from("Product types:\n");
    for t in &facets.product_types {
        let _ = writeln!(out, "  {:<12} {}", t.id, t.name);
    }
    out.push_str("Packagings:\n");
    for p in &facets.packagings {
        let _ = writeln!(out, "  {:<12} {}", p.id, p.name);
    }
    match (facets.min_price, facets.max_price) {
        (Some(min), Some(max)) => {
            let _ = write!(out, "Price: {} - {}", min, max);
        }
        _ => out.push_str("Price: -"),
    }
    out
}

pub fn product_types(types: &[ProductType]) -> String {
    let mut table = Table::new(["ID", "NAME"]);
    for t in types {
        table.row([t.id.clone(), t.name.clone()]);
    }
    table.render()
}

pub fn packagings(packagings: &[Packaging]) -> String {
    let mut table = Table::new(["ID", "NAME", "WEIGHT"]);
    for p in packagings {
        let weight = p.weight_kg.map(|w| format!("{} kg", w)).unwrap_or_else(|| "-".to_string());
        table.row([p.id.clone(), p.name.clone(), weight]);
    }
    table.render()
}

/// Admin product table: every product with status.
pub fn product_list(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products yet.".to_string();
    }
    let mut table = Table::new(["ID", "PRODUCT", "TYPE", "VARIANTS", "PRICE", "STOCK", "ACTIVE"]);
    for p in products {
        table.row([
            p.id.clone(),
            p.name.clone(),
            p.product_type.name.clone(),
            p.variants.len().to_string(),
            p.price_label(),
            p.total_stock().to_string(),
            if p.is_active { "yes" } else { "no" }.to_string(),
        ]);
    }
    table.render()
}

// =============================================================================
// Cart & Checkout
// =============================================================================

pub fn cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty.".to_string();
    }

    let mut table = Table::new(["#", "LINE ID", "PRODUCT", "PACKAGING", "QTY", "PRICE", "SUBTOTAL"]);
    for (i, item) in cart.items.iter().enumerate() {
        table.row([
            (i + 1).to_string(),
            item.id.clone(),
            item.product_name.clone(),
            item.packaging_name.clone(),
            item.quantity.to_string(),
            item.price.to_string(),
            item.line_total().to_string(),
        ]);
    }

    format!(
        "{}\n\n{} items, total {}",
        table.render(),
        cart.total_quantity(),
        cart.total()
    )
}

pub fn checkout_summary(summary: &CheckoutSummary, method: ShippingMethod, ppn: &PpnConfig) -> String {
    let ppn_label = if ppn.is_active {
        format!("PPN {}%", ppn.effective_rate().percentage())
    } else {
        "PPN (not charged)".to_string()
    };

    let rows = [
        ("Subtotal".to_string(), summary.subtotal),
        (ppn_label, summary.ppn_amount),
        (format!("Shipping ({})", method), summary.shipping_cost),
        ("Total".to_string(), summary.total),
    ];
    let width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, amount)| format!("{:<width$}  {:>14}", label, amount.to_string(), width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn order_placed(transaction: &Transaction, handoff: &PaymentHandoff) -> String {
    let mut out = format!(
        "Order {} placed, total {}.",
        transaction.invoice_number, transaction.total
    );
    match handoff {
        PaymentHandoff::Redirect(url) => {
            let _ = write!(out, "\nComplete the payment at:\n  {}", url);
        }
        PaymentHandoff::Embedded(token) => {
            let _ = write!(out, "\nPayment token: {}", token);
        }
        PaymentHandoff::None => {}
    }
    out
}

pub fn payment_return(ret: &PaymentReturn) -> String {
    let mark = match ret.outcome {
        PaymentOutcome::Success => "✔",
        PaymentOutcome::Pending => "…",
        PaymentOutcome::Failed => "✘",
    };
    format!("{} {}", mark, ret.message())
}

// =============================================================================
// Orders
// =============================================================================

pub fn transactions(list: &[Transaction]) -> String {
    if list.is_empty() {
        return "No orders yet.".to_string();
    }

    let mut table = Table::new(["ID", "INVOICE", "DATE", "CUSTOMER", "ITEMS", "TOTAL", "STATUS"]);
    for t in list {
        table.row([
            t.id.clone(),
            t.invoice_number.clone(),
            t.created_at.format("%Y-%m-%d").to_string(),
            or_dash(t.customer_name.as_deref()),
            t.item_count().to_string(),
            t.total.to_string(),
            t.status.to_string(),
        ]);
    }
    table.render()
}

pub fn transaction_detail(t: &Transaction) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Invoice {}  [{}]", t.invoice_number, t.status);
    let _ = writeln!(out, "Placed  {}", t.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(customer) = t.customer_name.as_deref() {
        let _ = writeln!(out, "Customer {}", customer);
    }

    let address = &t.shipping_address;
    let _ = writeln!(out, "Ship via {} to {} ({})", t.shipping_method, address.recipient_name, address.phone);
    if t.shipping_method.requires_address() {
        let _ = writeln!(out, "  {}, {} {}", address.address, address.city, address.postal_code);
    }
    if let Some(notes) = t.notes.as_deref() {
        let _ = writeln!(out, "Notes: {}", notes);
    }

    let mut table = Table::new(["PRODUCT", "PACKAGING", "QTY", "PRICE", "SUBTOTAL"]);
    for item in &t.items {
        table.row([
            item.product_name.clone(),
            item.packaging_name.clone(),
            item.quantity.to_string(),
            item.price.to_string(),
            item.line_total.to_string(),
        ]);
    }
    let _ = writeln!(out, "\n{}\n", table.render());

    let _ = writeln!(out, "Subtotal  {}", t.subtotal);
    let _ = writeln!(out, "PPN       {}", t.ppn_amount);
    let _ = writeln!(out, "Shipping  {}", t.shipping_cost);
    let _ = write!(out, "Total     {}", t.total);

    let next = t.status.next_statuses();
    if !next.is_empty() {
        let names: Vec<&str> = next.iter().map(TransactionStatus::as_str).collect();
        let _ = write!(out, "\n\nCan move to: {}", names.join(", "));
    }
    out
}

pub fn order_event(event: &OrderEvent) -> String {
    format!(
        "{}  {}  {}",
        event.updated_at.format("%H:%M:%S"),
        event.invoice_number,
        event.status
    )
}

// =============================================================================
// Reports
// =============================================================================

pub fn report_summary(summary: &ReportSummary) -> String {
    format!(
        "Revenue          {}\nOrders           {}\nPending orders   {}\nCustomers        {}\nProducts         {}",
        summary.total_revenue,
        summary.total_orders,
        summary.pending_orders,
        summary.total_customers,
        summary.total_products
    )
}

pub fn status_breakdown(counts: &[(TransactionStatus, usize)]) -> String {
    let mut table = Table::new(["STATUS", "ORDERS"]);
    for (status, count) in counts {
        table.row([status.to_string(), count.to_string()]);
    }
    table.render()
}

/// One bar per day, scaled to the best day.
pub fn sales_chart(points: &[SalesPoint]) -> String {
    let best = points.iter().map(|p| p.revenue).max().unwrap_or(Money::zero());

    let mut out = String::new();
    for point in points {
        let bar = if best.is_zero() {
            0
        } else {
            (point.revenue.rupiah() as i128 * CHART_WIDTH as i128 / best.rupiah() as i128) as usize
        };
        let _ = writeln!(
            out,
            "{}  {:<width$}  {} ({} orders)",
            point.date.format("%d %b"),
            "#".repeat(bar),
            point.revenue,
            point.orders,
            width = CHART_WIDTH
        );
    }
    let total = points.iter().fold(Money::zero(), |acc, p| acc + p.revenue);
    let _ = write!(out, "Total {}", total);
    out
}

pub fn top_products(rows: &[TopProduct]) -> String {
    if rows.is_empty() {
        return "No sales in this period.".to_string();
    }
    let mut table = Table::new(["#", "PRODUCT", "SOLD", "REVENUE"]);
    for (i, row) in rows.iter().enumerate() {
        table.row([
            (i + 1).to_string(),
            row.product_name.clone(),
            row.quantity_sold.to_string(),
            row.revenue.to_string(),
        ]);
    }
    table.render()
}

// =============================================================================
// Accounts & Settings
// =============================================================================

pub fn user(user: &User) -> String {
    format!(
        "{} <{}>\nRole:    {:?}\nPhone:   {}\nAddress: {}",
        user.name,
        user.email,
        user.role,
        or_dash(user.phone.as_deref()),
        or_dash(user.address.as_deref())
    )
}

pub fn users(users: &[User]) -> String {
    if users.is_empty() {
        return "No customers yet.".to_string();
    }
    let mut table = Table::new(["ID", "NAME", "EMAIL", "PHONE", "JOINED"]);
    for u in users {
        table.row([
            u.id.clone(),
            u.name.clone(),
            u.email.clone(),
            or_dash(u.phone.as_deref()),
            u.created_at.format("%Y-%m-%d").to_string(),
        ]);
    }
    table.render()
}

pub fn settings(info: &CompanyInfo, ppn: &PpnConfig, logo: &LogoConfig) -> String {
    format!(
        "{}\n\n{}\nLogo: {}",
        company_info(info),
        ppn_config(ppn),
        or_dash(logo.url.as_deref())
    )
}

pub fn company_info(info: &CompanyInfo) -> String {
    format!(
        "{}\n{}\nPhone: {}\nEmail: {}\nNPWP:  {}\nBank:  {} {}",
        info.name,
        info.address,
        info.phone,
        info.email,
        or_dash(info.npwp.as_deref()),
        or_dash(info.bank_name.as_deref()),
        info.bank_account.as_deref().unwrap_or_default()
    )
    .trim_end()
    .to_string()
}

pub fn ppn_config(ppn: &PpnConfig) -> String {
    if ppn.is_active {
        format!("PPN: {}% ({} bps)", ppn.effective_rate().percentage(), ppn.rate_bps)
    } else {
        format!("PPN: not charged ({} bps when active)", ppn.rate_bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pupuk_core::{CartItem, ShippingAddress, TransactionItem, Variant};

    fn product() -> Product {
        let packaging = Packaging {
            id: "pk-50".to_string(),
            name: "Karung 50 kg".to_string(),
            weight_kg: Some(50.0),
        };
        Product {
            id: "p1".to_string(),
            name: "NPK Mutiara".to_string(),
            description: "Pupuk majemuk".to_string(),
            npk_formula: Some("16-16-16".to_string()),
            product_type: ProductType {
                id: "t1".to_string(),
                name: "Majemuk".to_string(),
            },
            image_url: None,
            variants: vec![
                Variant {
                    id: "v1".to_string(),
                    product_id: "p1".to_string(),
                    packaging: packaging.clone(),
                    price: Money::from_rupiah(310_000),
                    stock: 25,
                    sku: None,
                },
                Variant {
                    id: "v2".to_string(),
                    product_id: "p1".to_string(),
                    packaging: Packaging {
                        id: "pk-1".to_string(),
                        name: "1 kg".to_string(),
                        weight_kg: Some(1.0),
                    },
                    price: Money::from_rupiah(9_000),
                    stock: 0,
                    sku: None,
                },
            ],
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_table_aligns_columns() {
        let mut table = Table::new(["ID", "NAME"]);
        table.row(["1", "Urea"]).row(["100", "NPK"]);
        assert_eq!(table.render(), "ID   NAME\n---  ----\n1    Urea\n100  NPK");
    }

    #[test]
    fn test_catalog_page_numbers_rows_within_the_page() {
        let page = Page {
            items: vec![product()],
            page: 2,
            page_size: 12,
            total_items: 13,
            total_pages: 2,
        };
        let text = catalog_page(&page);
        assert!(text.contains("1  p1"));
        assert!(text.contains("Rp 9.000 - Rp 310.000"));
        assert!(text.ends_with("Page 2 of 2 (13 products)"));

        let empty = Page::<Product> {
            items: vec![],
            page: 1,
            page_size: 12,
            total_items: 0,
            total_pages: 0,
        };
        assert_eq!(catalog_page(&empty), "No products match your search.");
    }

    #[test]
    fn test_product_detail_marks_sold_out() {
        let text = product_detail(&product());
        assert!(text.starts_with("NPK Mutiara (p1)"));
        assert!(text.contains("NPK:  16-16-16"));
        assert!(text.contains("sold out"));
    }

    #[test]
    fn test_cart_totals() {
        let filled = Cart::from_items(vec![CartItem {
            id: "c1".to_string(),
            variant_id: "v1".to_string(),
            product_id: "p1".to_string(),
            product_name: "NPK Mutiara".to_string(),
            packaging_name: "Karung 50 kg".to_string(),
            price: Money::from_rupiah(310_000),
            quantity: 2,
        }]);
        let text = cart(&filled);
        assert!(text.contains("1  c1"));
        assert!(text.contains("Rp 620.000"));
        assert!(text.ends_with("2 items, total Rp 620.000"));
        assert_eq!(cart(&Cart::new()), "Your cart is empty.");
    }

    #[test]
    fn test_checkout_summary_lines() {
        let summary = CheckoutSummary {
            subtotal: Money::from_rupiah(500_000),
            ppn_amount: Money::from_rupiah(55_000),
            shipping_cost: Money::from_rupiah(25_000),
            total: Money::from_rupiah(580_000),
        };
        let text = checkout_summary(&summary, ShippingMethod::Regular, &PpnConfig::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("PPN 11%"));
        assert!(lines[2].starts_with("Shipping (regular)"));
        assert!(lines[3].ends_with("Rp 580.000"));
    }

    #[test]
    fn test_order_placed_shows_payment_link() {
        let t = Transaction {
            id: "t1".to_string(),
            invoice_number: "INV-2026-0009".to_string(),
            user_id: "u1".to_string(),
            customer_name: Some("Budi".to_string()),
            status: TransactionStatus::Pending,
            items: vec![TransactionItem {
                id: "ti1".to_string(),
                variant_id: "v1".to_string(),
                product_name: "NPK Mutiara".to_string(),
                packaging_name: "Karung 50 kg".to_string(),
                price: Money::from_rupiah(310_000),
                quantity: 1,
                line_total: Money::from_rupiah(310_000),
            }],
            subtotal: Money::from_rupiah(310_000),
            ppn_amount: Money::from_rupiah(34_100),
            shipping_method: ShippingMethod::Pickup,
            shipping_cost: Money::zero(),
            total: Money::from_rupiah(344_100),
            shipping_address: ShippingAddress {
                recipient_name: "Budi".to_string(),
                phone: "081234567890".to_string(),
                ..ShippingAddress::default()
            },
            notes: None,
            payment: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap(),
        };

        let text = order_placed(&t, &PaymentHandoff::Redirect("https://pay.example/snap-1".to_string()));
        assert!(text.starts_with("Order INV-2026-0009 placed, total Rp 344.100."));
        assert!(text.ends_with("https://pay.example/snap-1"));

        let detail = transaction_detail(&t);
        assert!(detail.contains("Ship via pickup to Budi"));
        assert!(detail.ends_with("Can move to: paid, cancelled, expired"));
    }

    #[test]
    fn test_sales_chart_scales_to_best_day() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        let points = vec![
            SalesPoint {
                date: d(1),
                revenue: Money::from_rupiah(1_000_000),
                orders: 4,
            },
            SalesPoint {
                date: d(2),
                revenue: Money::zero(),
                orders: 0,
            },
            SalesPoint {
                date: d(3),
                revenue: Money::from_rupiah(500_000),
                orders: 2,
            },
        ];
        let text = sales_chart(&points);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0].matches('#').count(), CHART_WIDTH);
        assert_eq!(lines[1].matches('#').count(), 0);
        assert_eq!(lines[2].matches('#').count(), CHART_WIDTH / 2);
        assert_eq!(lines[3], "Total Rp 1.500.000");
    }

    #[test]
    fn test_ppn_config_text() {
        assert_eq!(ppn_config(&PpnConfig::default()), "PPN: 11% (1100 bps)");
        let off = PpnConfig {
            rate_bps: 1100,
            is_active: false,
        };
        assert_eq!(ppn_config(&off), "PPN: not charged (1100 bps when active)");
    }
}
