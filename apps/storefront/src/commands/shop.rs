//! # Interactive Shop
//!
//! A line-oriented version of the storefront pages: browse the catalog,
//! open a product, fill the cart and check out without leaving the prompt.
//!
//! ```text
//! catalog> search npk
//! catalog> open 2
//! detail(p-17)> add 1 4
//! detail(p-17)> cart
//! cart> checkout express
//! checkout> place Cianjur 43211
//! ```
//!
//! Errors are printed and the prompt stays on the same page.

use std::io::Write;

use pupuk_client::PaymentHandoff;
use pupuk_core::auth::Route;
use pupuk_core::checkout::summarize;
use pupuk_core::validation::validate_search_query;
use pupuk_core::view::{PageView, RequestState};
use pupuk_core::{Money, PpnConfig, ShippingMethod};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::cli::CheckoutArgs;
use crate::commands::checkout::build_form;
use crate::error::{ApiError, ApiResult};
use crate::output;
use crate::state::{AppState, ShopState};

const HELP: &str = "\
Catalog:   search [term] | type <id|-> | pack <id,...|-> | price <min|-> <max|->
           clear | next | prev | open <n|product id>
Product:   add <variant n> [qty] | back
Cart:      cart | qty <line> <qty> | rm <line> | checkout [method]
Checkout:  place [city] [postal code] [notes...] | back
           help | quit";

/// Which product to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// 1-based position on the current catalog page.
    Position(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopCommand {
    Search(String),
    Type(Option<String>),
    Pack(Vec<String>),
    Price { min: Option<Money>, max: Option<Money> },
    ClearFilter,
    Next,
    Prev,
    Open(Target),
    Add { variant: usize, quantity: i64 },
    Cart,
    Quantity { line: usize, quantity: i64 },
    Remove { line: usize },
    Checkout(Option<ShippingMethod>),
    Place { city: String, postal_code: String, notes: Option<String> },
    Back,
    Help,
    Quit,
}

fn number<T: std::str::FromStr>(what: &str, word: Option<&str>) -> ApiResult<T> {
    let word = word.ok_or_else(|| ApiError::validation(format!("Missing {}", what)))?;
    word.parse()
        .map_err(|_| ApiError::validation(format!("{} must be a number, got '{}'", what, word)))
}

/// `-` clears an optional value.
fn optional_price(word: Option<&str>) -> ApiResult<Option<Money>> {
    match word {
        None | Some("-") => Ok(None),
        Some(_) => number::<i64>("price", word).map(|rp| Some(Money::from_rupiah(rp))),
    }
}

/// Parses one prompt line. Blank lines give `None`.
pub fn parse_line(line: &str) -> ApiResult<Option<ShopCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let arg = rest.first().copied();

    let command = match verb.to_lowercase().as_str() {
        "search" | "s" => ShopCommand::Search(rest.join(" ")),
        "type" => ShopCommand::Type(arg.filter(|t| *t != "-").map(str::to_string)),
        "pack" => ShopCommand::Pack(match arg {
            None | Some("-") => Vec::new(),
            Some(_) => rest
                .join(",")
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        }),
        "price" => ShopCommand::Price {
            min: optional_price(arg)?,
            max: optional_price(rest.get(1).copied())?,
        },
        "clear" => ShopCommand::ClearFilter,
        "next" | "n" => ShopCommand::Next,
        "prev" | "p" => ShopCommand::Prev,
        "open" | "o" => {
            let word = arg.ok_or_else(|| ApiError::validation("Open which product?"))?;
            match word.parse::<usize>() {
                Ok(position) => ShopCommand::Open(Target::Position(position)),
                Err(_) => ShopCommand::Open(Target::Id(word.to_string())),
            }
        }
        "add" | "a" => ShopCommand::Add {
            variant: number("variant", arg)?,
            quantity: match rest.get(1) {
                Some(_) => number("quantity", rest.get(1).copied())?,
                None => 1,
            },
        },
        "cart" | "c" => ShopCommand::Cart,
        "qty" => ShopCommand::Quantity {
            line: number("line", arg)?,
            quantity: number("quantity", rest.get(1).copied())?,
        },
        "rm" | "remove" => ShopCommand::Remove {
            line: number("line", arg)?,
        },
        "checkout" => ShopCommand::Checkout(arg.map(str::parse).transpose()?),
        "place" => ShopCommand::Place {
            city: arg.unwrap_or_default().to_string(),
            postal_code: rest.get(1).copied().unwrap_or_default().to_string(),
            notes: (rest.len() > 2).then(|| rest[2..].join(" ")),
        },
        "back" | "b" => ShopCommand::Back,
        "help" | "?" => ShopCommand::Help,
        "quit" | "exit" | "q" => ShopCommand::Quit,
        other => {
            return Err(ApiError::validation(format!(
                "Unknown command '{}'. Type `help`.",
                other
            )))
        }
    };
    Ok(Some(command))
}

/// What a page shows for one request: data, a loading line or the error.
fn show<T>(state: &RequestState<T>, render: impl FnOnce(&T) -> String) -> String {
    match state {
        RequestState::Idle => String::new(),
        RequestState::Loading => "Loading...".to_string(),
        RequestState::Loaded(value) => render(value),
        RequestState::Failed(message) => format!("! {}", message),
    }
}

struct ShopSession<'a> {
    state: &'a AppState,
    shop: ShopState,
    method: ShippingMethod,
    ppn: Option<PpnConfig>,
    notice: Option<String>,
}

impl<'a> ShopSession<'a> {
    fn new(state: &'a AppState) -> Self {
        ShopSession {
            state,
            shop: ShopState::new(state.storefront().config().catalog.page_size),
            method: ShippingMethod::default(),
            ppn: None,
            notice: None,
        }
    }

    async fn start(&mut self) {
        self.load_catalog().await;
        if self.state.storefront().session().is_authenticated().await {
            let cart = self.state.storefront().cart().get().await;
            self.shop.settle_cart(cart);
        }
    }

    async fn load_catalog(&mut self) {
        self.shop.loading_catalog();
        let page = self
            .state
            .storefront()
            .products()
            .catalog_page(self.shop.query())
            .await;
        self.shop.settle_catalog(page);
    }

    /// Reloads the catalog and shows it, leaving detail or cart if needed.
    async fn show_catalog(&mut self) -> ApiResult<()> {
        if self.shop.page() != &PageView::Catalog {
            self.shop.open_catalog()?;
        }
        self.load_catalog().await;
        Ok(())
    }

    async fn apply(&mut self, command: ShopCommand) -> ApiResult<()> {
        let state = self.state;
        let storefront = state.storefront();
        debug!(?command, page = %self.shop.page(), "shop");

        match command {
            ShopCommand::Search(term) => {
                let term = validate_search_query(&term)?;
                self.shop.set_search(&term);
                self.show_catalog().await?;
            }
            ShopCommand::Type(type_id) => {
                self.shop.filter_mut().product_type_id = type_id;
                self.show_catalog().await?;
            }
            ShopCommand::Pack(ids) => {
                self.shop.filter_mut().packaging_ids = ids.into_iter().collect();
                self.show_catalog().await?;
            }
            ShopCommand::Price { min, max } => {
                let filter = self.shop.filter_mut();
                filter.min_price = min;
                filter.max_price = max;
                self.show_catalog().await?;
            }
            ShopCommand::ClearFilter => {
                self.shop.set_filter(Default::default());
                self.show_catalog().await?;
            }
            ShopCommand::Next => {
                if !self.shop.next_page() {
                    return Err(ApiError::validation("Already on the last page"));
                }
                self.load_catalog().await;
            }
            ShopCommand::Prev => {
                if !self.shop.previous_page() {
                    return Err(ApiError::validation("Already on the first page"));
                }
                self.load_catalog().await;
            }
            ShopCommand::Open(target) => {
                let id = match target {
                    Target::Id(id) => id,
                    Target::Position(n) => self
                        .shop
                        .product_at(n)
                        .map(|p| p.id.clone())
                        .ok_or_else(|| ApiError::validation(format!("No product #{} on this page", n)))?,
                };
                self.shop.open_product(&id)?;
                let product = storefront.products().get(&id).await;
                self.shop.settle_product(product);
            }
            ShopCommand::Add { variant, quantity } => {
                let product = self
                    .shop
                    .product()
                    .data()
                    .cloned()
                    .ok_or_else(|| ApiError::validation("Open a product first"))?;
                let chosen = variant
                    .checked_sub(1)
                    .and_then(|i| product.variants.get(i))
                    .ok_or_else(|| ApiError::validation(format!("No packaging #{}", variant)))?;
                storefront.session().require(&Route::Cart).await?;

                let cart = storefront.cart().add(&product, &chosen.id, quantity).await?;
                self.notice = Some(format!(
                    "Added {} x {} {}",
                    quantity, product.name, chosen.packaging.name
                ));
                self.shop.settle_cart(Ok(cart));
            }
            ShopCommand::Cart => {
                storefront.session().require(&Route::Cart).await?;
                self.shop.open_cart()?;
                let cart = storefront.cart().get().await;
                self.shop.settle_cart(cart);
            }
            ShopCommand::Quantity { line, quantity } => {
                let item_id = self.cart_line(line)?;
                let cart = storefront.cart().set_quantity(&item_id, quantity).await?;
                self.shop.settle_cart(Ok(cart));
            }
            ShopCommand::Remove { line } => {
                let item_id = self.cart_line(line)?;
                let cart = storefront.cart().remove(&item_id).await?;
                self.shop.settle_cart(Ok(cart));
            }
            ShopCommand::Checkout(method) => {
                storefront.session().require(&Route::Checkout).await?;
                if let Some(method) = method {
                    self.method = method;
                }
                if self.shop.page() != &PageView::Checkout {
                    self.shop.open_checkout()?;
                }
                self.ppn = Some(storefront.settings().ppn().await?);
            }
            ShopCommand::Place {
                city,
                postal_code,
                notes,
            } => self.place(city, postal_code, notes).await?,
            ShopCommand::Back => {
                self.shop.back();
            }
            // Handled by the prompt loop.
            ShopCommand::Help | ShopCommand::Quit => {}
        }
        Ok(())
    }

    fn cart_line(&self, line: usize) -> ApiResult<String> {
        let cart = self.shop.cart();
        line.checked_sub(1)
            .and_then(|i| cart.items.get(i))
            .map(|item| item.id.clone())
            .ok_or_else(|| ApiError::validation(format!("No cart line #{}", line)))
    }

    async fn place(&mut self, city: String, postal_code: String, notes: Option<String>) -> ApiResult<()> {
        if self.shop.page() != &PageView::Checkout {
            return Err(ApiError::validation("Go to checkout first"));
        }
        let state = self.state;
        let storefront = state.storefront();
        let user = storefront.session().require(&Route::Checkout).await?;
        let ppn = match self.ppn {
            Some(ppn) => ppn,
            None => storefront.settings().ppn().await?,
        };

        let args = CheckoutArgs {
            method: self.method,
            recipient: None,
            phone: None,
            address: None,
            city,
            postal_code,
            notes,
            dry_run: false,
        };
        let form = build_form(&args, &user);
        let cart = self.shop.cart();
        let transaction = storefront
            .transactions()
            .checkout(&cart, &form, &storefront.config().shipping, &ppn)
            .await?;

        info!(invoice = %transaction.invoice_number, "Order placed from shop");
        self.notice = Some(output::order_placed(
            &transaction,
            &PaymentHandoff::for_transaction(&transaction),
        ));
        self.shop.order_placed();
        self.ppn = None;
        self.load_catalog().await;
        Ok(())
    }

    /// The current page, preceded by the last notice.
    fn screen(&mut self) -> String {
        let body = match self.shop.page() {
            PageView::Catalog => show(self.shop.catalog(), output::catalog_page),
            PageView::Detail { .. } => show(self.shop.product(), output::product_detail),
            PageView::Cart => show(self.shop.cart_state(), output::cart),
            PageView::Checkout => {
                let cart = self.shop.cart();
                let ppn = self.ppn.unwrap_or(PpnConfig {
                    rate_bps: 0,
                    is_active: false,
                });
                let rates = self.state.storefront().config().shipping;
                let summary = summarize(&cart, self.method, &rates, &ppn);
                let hint = if self.method.requires_address() {
                    "Type `place <city> <postal code> [notes]` to order."
                } else {
                    "Type `place` to order."
                };
                format!("{}\n\n{}", output::checkout_summary(&summary, self.method, &ppn), hint)
            }
        };

        match self.notice.take() {
            Some(notice) => format!("{}\n\n{}", notice, body),
            None => body,
        }
    }
}

/// Runs the prompt on stdin until `quit` or end of input.
pub async fn run(state: &AppState) -> ApiResult<()> {
    let mut session = ShopSession::new(state);
    session.start().await;

    let mut out = std::io::stdout();
    writeln!(out, "{}\n\nType `help` for commands.", session.screen())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(out, "{}> ", session.shop.page())?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(ShopCommand::Quit)) => break,
            Ok(Some(ShopCommand::Help)) => writeln!(out, "{}", HELP)?,
            Ok(Some(command)) => match session.apply(command).await {
                Ok(()) => writeln!(out, "{}", session.screen())?,
                Err(e) => writeln!(out, "! {}", e.message)?,
            },
            Err(e) => writeln!(out, "! {}", e.message)?,
        }
    }

    writeln!(out)?;
    Ok(())
}
