//! Command line definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use pupuk_core::{ShippingMethod, TransactionStatus};

#[derive(Debug, Parser)]
#[command(
    name = "pupuk",
    version,
    about = "Fertilizer storefront and back-office",
    long_about = "Browse the catalog, manage your cart and orders, and run the admin back-office against a Pupuk backend."
)]
pub struct Cli {
    /// Path to storefront.toml (defaults to the platform config dir)
    #[arg(long, global = true, env = "PUPUK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. https://api.tanisubur.co.id/api
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Log requests and session changes to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse the catalog
    Catalog(CatalogArgs),

    /// Show one product with its packagings
    Product {
        /// Product id
        id: String,
    },

    /// Product types, packagings and price range the filters accept
    Facets,

    /// Your shopping cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// Place an order for everything in the cart
    Checkout(CheckoutArgs),

    /// Your orders
    Orders,

    /// One of your orders
    Order {
        /// Transaction id
        id: String,
    },

    /// Read the URL the payment gateway sent you back to
    PaymentFinish {
        /// Full return URL, e.g. https://toko.example/payment/finish?order_id=...
        url: String,
    },

    /// Follow order updates as they happen
    Watch,

    /// Sign in
    Login(LoginArgs),

    /// Create an account
    Register(RegisterArgs),

    /// Sign out and forget the saved session
    Logout,

    /// Show who is signed in
    Whoami,

    /// Email a password reset link
    ForgotPassword {
        email: String,
    },

    /// Set a new password with the token from the reset email
    ResetPassword(ResetPasswordArgs),

    /// Update your name, email, phone or address
    Profile(ProfileArgs),

    /// Back-office (admin accounts only)
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Interactive shopping session
    Shop,
}

// =============================================================================
// Shopping
// =============================================================================

#[derive(Debug, Clone, Default, Args)]
pub struct CatalogArgs {
    /// Match name, description, NPK formula or type
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Product type id
    #[arg(long = "type")]
    pub product_type: Option<String>,

    /// Packaging id (repeatable, any may match)
    #[arg(long = "packaging")]
    pub packagings: Vec<String>,

    /// Lowest price in rupiah
    #[arg(long)]
    pub min_price: Option<i64>,

    /// Highest price in rupiah
    #[arg(long)]
    pub max_price: Option<i64>,

    /// Page number, starting at 1
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    /// Products per page (defaults to the configured page size)
    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Show the cart
    Show,

    /// Add a packaging of a product
    Add {
        /// Product id
        product_id: String,
        /// Variant (packaging) id
        variant_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },

    /// Change the quantity of a line (0 removes it)
    Set {
        /// Cart line id
        item_id: String,
        quantity: i64,
    },

    /// Remove a line
    Remove {
        /// Cart line id
        item_id: String,
    },

    /// Empty the cart
    Clear,
}

#[derive(Debug, Clone, Args)]
pub struct CheckoutArgs {
    /// pickup, regular, express or cargo
    #[arg(short, long, default_value = "regular")]
    pub method: ShippingMethod,

    /// Recipient name (defaults to your profile name)
    #[arg(long)]
    pub recipient: Option<String>,

    /// Recipient phone (defaults to your profile phone)
    #[arg(long)]
    pub phone: Option<String>,

    /// Street address (defaults to your profile address)
    #[arg(long)]
    pub address: Option<String>,

    #[arg(long, default_value = "")]
    pub city: String,

    #[arg(long, default_value = "")]
    pub postal_code: String,

    #[arg(long)]
    pub notes: Option<String>,

    /// Show the order summary without placing the order
    #[arg(long)]
    pub dry_run: bool,
}

// =============================================================================
// Account
// =============================================================================

#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    pub email: String,

    #[arg(long, env = "PUPUK_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Page to continue to afterwards, e.g. /checkout
    #[arg(long)]
    pub redirect: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long, env = "PUPUK_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Args)]
pub struct ResetPasswordArgs {
    /// Token from the reset email
    #[arg(long)]
    pub token: String,

    #[arg(long, env = "PUPUK_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub confirm_password: String,
}

/// Fields left out keep their current value.
#[derive(Debug, Clone, Default, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub address: Option<String>,
}

// =============================================================================
// Back-office
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Headline numbers and orders per status
    Dashboard,

    /// Manage products
    #[command(subcommand)]
    Products(AdminProductCommand),

    /// Manage every customer's orders
    #[command(subcommand)]
    Orders(AdminOrderCommand),

    /// Manage customer accounts
    #[command(subcommand)]
    Customers(AdminCustomerCommand),

    /// Sales reports
    #[command(subcommand)]
    Reports(ReportCommand),

    /// Company info, PPN and logo
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Subcommand)]
pub enum AdminProductCommand {
    /// Every product, active or not
    List,

    /// Create a product from a JSON product form
    Create {
        #[arg(long)]
        file: PathBuf,
    },

    /// Replace a product with a JSON product form
    Update {
        id: String,
        #[arg(long)]
        file: PathBuf,
    },

    Delete {
        id: String,
    },

    /// Product types for the form's type field
    Types,

    /// Packagings for the form's variant rows
    Packagings,
}

#[derive(Debug, Subcommand)]
pub enum AdminOrderCommand {
    List {
        #[arg(long)]
        status: Option<TransactionStatus>,

        /// Invoice number or customer name
        #[arg(short, long, default_value = "")]
        search: String,
    },

    Show {
        id: String,
    },

    /// Move an order along its lifecycle
    SetStatus {
        id: String,
        status: TransactionStatus,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminCustomerCommand {
    List,

    Show {
        id: String,
    },

    Update {
        id: String,
        #[command(flatten)]
        profile: ProfileArgs,
    },

    Delete {
        id: String,
    },
}

/// Report period: `--from/--to`, or the last `--days` days.
#[derive(Debug, Clone, Args)]
pub struct RangeArgs {
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    #[arg(long, default_value_t = 30, conflicts_with = "from")]
    pub days: i64,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    Summary,

    /// Revenue per day
    Sales {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Best-selling products
    Top {
        #[command(flatten)]
        range: RangeArgs,

        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Company info, PPN and logo
    Show,

    /// Replace company info from a JSON file
    Company {
        #[arg(long)]
        file: PathBuf,
    },

    /// Set the PPN rate
    Ppn {
        /// Rate in basis points (1100 = 11%)
        #[arg(long)]
        rate_bps: u32,

        /// Stop charging PPN
        #[arg(long)]
        inactive: bool,
    },

    /// Upload a new logo (png, jpg, svg or webp, at most 2 MB)
    Logo {
        #[arg(long)]
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_catalog_flags() {
        let cli = Cli::parse_from([
            "pupuk", "catalog", "-s", "npk", "--type", "t1", "--packaging", "pk-50",
            "--packaging", "pk-25", "--max-price", "400000", "-p", "2",
        ]);
        let Command::Catalog(args) = cli.command else {
            panic!("expected catalog");
        };
        assert_eq!(args.search, "npk");
        assert_eq!(args.product_type.as_deref(), Some("t1"));
        assert_eq!(args.packagings, vec!["pk-50", "pk-25"]);
        assert_eq!(args.max_price, Some(400_000));
        assert_eq!(args.page, 2);
    }

    #[test]
    fn test_checkout_method_parses_local_names() {
        let cli = Cli::parse_from(["pupuk", "checkout", "--method", "ambil", "--dry-run"]);
        let Command::Checkout(args) = cli.command else {
            panic!("expected checkout");
        };
        assert_eq!(args.method, ShippingMethod::Pickup);
        assert!(args.dry_run);

        assert!(Cli::try_parse_from(["pupuk", "checkout", "--method", "drone"]).is_err());
    }

    #[test]
    fn test_admin_set_status() {
        let cli = Cli::parse_from(["pupuk", "--json", "admin", "orders", "set-status", "t1", "shipped"]);
        assert!(cli.json);
        let Command::Admin(AdminCommand::Orders(AdminOrderCommand::SetStatus { id, status })) = cli.command
        else {
            panic!("expected set-status");
        };
        assert_eq!(id, "t1");
        assert_eq!(status, TransactionStatus::Shipped);
    }

    #[test]
    fn test_report_range_needs_both_ends() {
        assert!(Cli::try_parse_from(["pupuk", "admin", "reports", "sales", "--from", "2026-03-01"]).is_err());

        let cli = Cli::parse_from([
            "pupuk", "admin", "reports", "sales", "--from", "2026-03-01", "--to", "2026-03-07",
        ]);
        let Command::Admin(AdminCommand::Reports(ReportCommand::Sales { range })) = cli.command else {
            panic!("expected sales");
        };
        assert_eq!(range.from, NaiveDate::from_ymd_opt(2026, 3, 1));
    }
}
