//! # Back-Office Commands
//!
//! ```text
//! pupuk admin dashboard            summary + orders per status
//! pupuk admin products  ...        list / create / update / delete
//! pupuk admin orders    ...        list / show / set-status
//! pupuk admin customers ...        list / show / update / delete
//! pupuk admin reports   ...        summary / sales / top
//! pupuk admin settings  ...        show / company / ppn / logo
//! ```
//!
//! Every command checks the admin route first; a customer session gets
//! `FORBIDDEN`, no session gets `UNAUTHORIZED`.

use std::path::Path;

use chrono::{Local, NaiveDate};
use pupuk_client::resources::transactions::OrderFilter;
use pupuk_core::auth::Route;
use pupuk_core::report::{status_breakdown, DateRange, ReportSummary};
use pupuk_core::validation::ProductForm;
use pupuk_core::{CompanyInfo, PpnConfig, TransactionStatus};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{
    AdminCommand, AdminCustomerCommand, AdminOrderCommand, AdminProductCommand, RangeArgs,
    ReportCommand, SettingsCommand,
};
use crate::commands::account::merge_profile;
use crate::commands::{render, OutputFormat};
use crate::error::{ApiError, ApiResult};
use crate::output;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: TransactionStatus,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub summary: ReportSummary,
    pub orders_by_status: Vec<StatusCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub company: CompanyInfo,
    pub ppn: PpnConfig,
    pub logo: pupuk_client::resources::settings::LogoConfig,
}

pub async fn run(state: &AppState, command: &AdminCommand, format: OutputFormat) -> ApiResult<String> {
    match command {
        AdminCommand::Dashboard => dashboard(state, format).await,
        AdminCommand::Products(cmd) => products(state, cmd, format).await,
        AdminCommand::Orders(cmd) => orders(state, cmd, format).await,
        AdminCommand::Customers(cmd) => customers(state, cmd, format).await,
        AdminCommand::Reports(cmd) => reports(state, cmd, format).await,
        AdminCommand::Settings(cmd) => settings(state, cmd, format).await,
    }
}

async fn dashboard(state: &AppState, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    storefront.session().require(&Route::AdminDashboard).await?;
    debug!("dashboard");

    let summary = storefront.reports().summary().await?;
    let orders = storefront.transactions().list_all().await?;
    let dashboard = Dashboard {
        summary,
        orders_by_status: status_breakdown(&orders)
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
    };

    render(format, &dashboard, |d| {
        let counts: Vec<(TransactionStatus, usize)> =
            d.orders_by_status.iter().map(|s| (s.status, s.count)).collect();
        format!(
            "{}\n\n{}",
            output::report_summary(&d.summary),
            output::status_breakdown(&counts)
        )
    })
}

async fn products(state: &AppState, command: &AdminProductCommand, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    storefront.session().require(&Route::AdminProducts).await?;
    let products = storefront.products();

    match command {
        AdminProductCommand::List => {
            let list = products.refetch_list().await?;
            render(format, &list, |l| output::product_list(l))
        }
        AdminProductCommand::Create { file } => {
            let form: ProductForm = read_json(file)?;
            let created = products.create(&form).await?;
            info!(product_id = %created.id, "Product created");
            render(format, &created, output::product_detail)
        }
        AdminProductCommand::Update { id, file } => {
            let form: ProductForm = read_json(file)?;
            let updated = products.update(id, &form).await?;
            info!(product_id = %id, "Product updated");
            render(format, &updated, output::product_detail)
        }
        AdminProductCommand::Delete { id } => {
            products.delete(id).await?;
            info!(product_id = %id, "Product deleted");
            Ok(format!("Product {} deleted.", id))
        }
        AdminProductCommand::Types => {
            let types = products.product_types().await?;
            render(format, &types, |t| output::product_types(t))
        }
        AdminProductCommand::Packagings => {
            let packagings = products.packagings().await?;
            render(format, &packagings, |p| output::packagings(p))
        }
    }
}

async fn orders(state: &AppState, command: &AdminOrderCommand, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    storefront.session().require(&Route::AdminOrders).await?;
    let transactions = storefront.transactions();

    match command {
        AdminOrderCommand::List { status, search } => {
            let filter = OrderFilter {
                status: *status,
                search: search.trim().to_string(),
            };
            debug!(?filter, "admin_orders");
            let mut list = transactions.list_all_filtered(&filter).await?;
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            render(format, &list, |l| output::transactions(l))
        }
        AdminOrderCommand::Show { id } => {
            let transaction = transactions.get(id).await?;
            render(format, &transaction, output::transaction_detail)
        }
        AdminOrderCommand::SetStatus { id, status } => {
            let updated = transactions.update_status(id, *status).await?;
            render(format, &updated, output::transaction_detail)
        }
    }
}

async fn customers(state: &AppState, command: &AdminCustomerCommand, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    storefront.session().require(&Route::AdminCustomers).await?;
    let users = storefront.users();

    match command {
        AdminCustomerCommand::List => {
            let list = users.customers().await?;
            render(format, &list, |l| output::users(l))
        }
        AdminCustomerCommand::Show { id } => {
            let user = users.get(id).await?;
            render(format, &user, output::user)
        }
        AdminCustomerCommand::Update { id, profile } => {
            let current = users.get(id).await?;
            let form = merge_profile(&current, profile);
            let updated = users.update(id, &form).await?;
            info!(user_id = %id, "Customer updated");
            render(format, &updated, output::user)
        }
        AdminCustomerCommand::Delete { id } => {
            users.delete(id).await?;
            info!(user_id = %id, "Customer deleted");
            Ok(format!("Customer {} deleted.", id))
        }
    }
}

async fn reports(state: &AppState, command: &ReportCommand, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    storefront.session().require(&Route::AdminReports).await?;
    let reports = storefront.reports();
    let today = Local::now().date_naive();

    match command {
        ReportCommand::Summary => {
            let summary = reports.summary().await?;
            render(format, &summary, output::report_summary)
        }
        ReportCommand::Sales { range } => {
            let range = resolve_range(range, today)?;
            debug!(start = %range.start(), end = %range.end(), "sales_chart");
            let points = reports.sales_chart(&range).await?;
            render(format, &points, |p| output::sales_chart(p))
        }
        ReportCommand::Top { range, limit } => {
            let range = resolve_range(range, today)?;
            let rows = reports.top_products(&range, *limit).await?;
            render(format, &rows, |r| output::top_products(r))
        }
    }
}

async fn settings(state: &AppState, command: &SettingsCommand, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    storefront.session().require(&Route::AdminSettings).await?;
    let settings = storefront.settings();

    match command {
        SettingsCommand::Show => {
            let view = SettingsView {
                company: settings.company_info().await?,
                ppn: settings.ppn().await?,
                logo: settings.logo().await?,
            };
            render(format, &view, |v| output::settings(&v.company, &v.ppn, &v.logo))
        }
        SettingsCommand::Company { file } => {
            let info: CompanyInfo = read_json(file)?;
            let saved = settings.update_company_info(&info).await?;
            render(format, &saved, output::company_info)
        }
        SettingsCommand::Ppn { rate_bps, inactive } => {
            let config = PpnConfig {
                rate_bps: *rate_bps,
                is_active: !inactive,
            };
            let saved = settings.update_ppn(&config).await?;
            render(format, &saved, output::ppn_config)
        }
        SettingsCommand::Logo { file } => {
            let bytes = std::fs::read(file)
                .map_err(|e| ApiError::validation(format!("Cannot read {}: {}", file.display(), e)))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| ApiError::validation("Logo path has no file name"))?;
            let saved = settings.upload_logo(file_name, bytes).await?;
            render(format, &saved, |l| {
                format!("Logo uploaded: {}", l.url.as_deref().unwrap_or("-"))
            })
        }
    }
}

/// `--from/--to` when given, otherwise the last `--days` days up to `today`.
pub fn resolve_range(args: &RangeArgs, today: NaiveDate) -> ApiResult<DateRange> {
    let range = match (args.from, args.to) {
        (Some(from), Some(to)) => DateRange::new(from, to)?,
        _ => DateRange::last_days(today, args.days)?,
    };
    Ok(range)
}

/// Reads a JSON form the admin prepared in a file.
fn read_json<T: DeserializeOwned>(path: &Path) -> ApiResult<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ApiError::validation(format!("Cannot read {}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&text)?)
}
