//! # Cart Commands
//!
//! Every cart command needs a session; the cart lives on the backend per
//! user. Stock and quantity limits are checked locally before anything is
//! sent.

use pupuk_core::auth::Route;
use pupuk_core::cart::{Cart, CartTotals};
use pupuk_core::CartItem;
use serde::Serialize;
use tracing::debug;

use crate::cli::CartCommand;
use crate::commands::{render, OutputFormat};
use crate::error::ApiResult;
use crate::output;
use crate::state::AppState;

/// `--json` shape: the lines plus their totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            items: cart.items.clone(),
            totals: CartTotals::from(cart),
        }
    }
}

fn render_cart(cart: &Cart, format: OutputFormat) -> ApiResult<String> {
    match format {
        OutputFormat::Text => Ok(output::cart(cart)),
        OutputFormat::Json => render(format, &CartResponse::from(cart), |_| String::new()),
    }
}

pub async fn run(state: &AppState, command: &CartCommand, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    storefront.session().require(&Route::Cart).await?;
    let cart = storefront.cart();

    let updated = match command {
        CartCommand::Show => {
            debug!("get_cart");
            cart.get().await?
        }
        CartCommand::Add {
            product_id,
            variant_id,
            quantity,
        } => {
            debug!(product_id = %product_id, variant_id = %variant_id, quantity, "add_to_cart");
            let product = storefront.products().get(product_id).await?;
            cart.add(&product, variant_id, *quantity).await?
        }
        CartCommand::Set { item_id, quantity } => {
            debug!(item_id = %item_id, quantity, "update_cart_item");
            cart.set_quantity(item_id, *quantity).await?
        }
        CartCommand::Remove { item_id } => {
            debug!(item_id = %item_id, "remove_from_cart");
            cart.remove(item_id).await?
        }
        CartCommand::Clear => {
            debug!("clear_cart");
            cart.clear().await?
        }
    };

    render_cart(&updated, format)
}
