//! # Commands Module
//!
//! One function per CLI subcommand.
//!
//! ## Command Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Structure                                    │
//! │                                                                         │
//! │  pub async fn command_name(                                             │
//! │      state: &AppState,           ◄── connected Storefront              │
//! │      args...,                    ◄── parsed by clap                    │
//! │      format: OutputFormat,       ◄── table or --json                   │
//! │  ) -> ApiResult<String> {        ◄── text to print, or the error       │
//! │      // 1. Check the route guard                                       │
//! │      // 2. Call the resource                                           │
//! │      // 3. Render                                                      │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`catalog`] - Browse, product detail, filter options
//! - [`cart`] - Show and change the cart
//! - [`checkout`] - Order summary, place order, payment return
//! - [`orders`] - Order history and live updates
//! - [`account`] - Login, registration, password reset, profile
//! - [`admin`] - Back-office
//! - [`shop`] - Interactive session

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod shop;

use serde::Serialize;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Renders `value` as text with `text`, or as pretty JSON.
pub fn render<T, F>(format: OutputFormat, value: &T, text: F) -> ApiResult<String>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Text => Ok(text(value)),
        OutputFormat::Json => serde_json::to_string_pretty(value).map_err(ApiError::internal),
    }
}
