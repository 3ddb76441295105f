//! # Order Commands
//!
//! Order history for the signed-in customer, and a live feed of order
//! updates over the notification websocket.

use std::future::Future;
use std::io::Write;

use pupuk_client::OrderEvent;
use pupuk_core::auth::Route;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::commands::{render, OutputFormat};
use crate::error::{ApiError, ApiResult};
use crate::output;
use crate::state::AppState;

pub async fn list(state: &AppState, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    storefront.session().require(&Route::Orders).await?;
    debug!("list_orders");

    let mut orders = storefront.transactions().list_mine().await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    render(format, &orders, |o| output::transactions(o))
}

pub async fn show(state: &AppState, id: &str, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    storefront
        .session()
        .require(&Route::OrderDetail(id.to_string()))
        .await?;
    debug!(transaction_id = %id, "get_order");

    let transaction = storefront.transactions().get(id).await?;
    render(format, &transaction, output::transaction_detail)
}

/// Prints order events until Ctrl-C or until the notifier gives up.
pub async fn watch(state: &AppState, format: OutputFormat) -> ApiResult<()> {
    let storefront = state.storefront();
    storefront.session().require(&Route::Orders).await?;

    let (handle, mut events) = storefront.notifier()?;
    info!("Watching order updates");
    eprintln!("Watching order updates. Press Ctrl-C to stop.");

    let stop = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let mut stdout = std::io::stdout();
    let seen = follow(&mut events, stop, format, &mut stdout).await?;

    if let Err(e) = handle.shutdown().await {
        debug!(error = %e, "Notifier already stopped");
    }
    info!(events = seen, "Stopped watching order updates");
    Ok(())
}

/// Writes one line per event until `stop` completes or the channel closes.
pub async fn follow<W, S>(
    events: &mut mpsc::Receiver<OrderEvent>,
    stop: S,
    format: OutputFormat,
    out: &mut W,
) -> ApiResult<usize>
where
    W: Write,
    S: Future<Output = ()>,
{
    tokio::pin!(stop);
    let mut seen = 0;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let line = match format {
                    OutputFormat::Text => output::order_event(&event),
                    OutputFormat::Json => serde_json::to_string(&event).map_err(ApiError::internal)?,
                };
                writeln!(out, "{}", line)?;
                out.flush()?;
                seen += 1;
            }
            _ = &mut stop => break,
        }
    }

    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pupuk_client::notifications::OrderEventKind;
    use pupuk_core::TransactionStatus;

    fn event(invoice: &str, status: TransactionStatus) -> OrderEvent {
        OrderEvent {
            kind: OrderEventKind::OrderUpdated,
            transaction_id: "t1".to_string(),
            invoice_number: invoice.to_string(),
            status,
            updated_at: Utc.with_ymd_and_hms(2026, 3, 2, 14, 5, 9).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_follow_prints_until_channel_closes() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(event("INV-1", TransactionStatus::Paid)).await.unwrap();
        tx.send(event("INV-1", TransactionStatus::Processing)).await.unwrap();
        drop(tx);

        let mut out = Vec::new();
        let seen = follow(&mut rx, std::future::pending(), OutputFormat::Text, &mut out)
            .await
            .unwrap();

        assert_eq!(seen, 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "14:05:09  INV-1  paid\n14:05:09  INV-1  processing\n");
    }

    #[tokio::test]
    async fn test_follow_stops_on_signal() {
        let (_tx, mut rx) = mpsc::channel::<OrderEvent>(8);
        let mut out = Vec::new();
        let seen = follow(&mut rx, async {}, OutputFormat::Json, &mut out).await.unwrap();
        assert_eq!(seen, 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_follow_json_lines() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(event("INV-7", TransactionStatus::Shipped)).await.unwrap();
        drop(tx);

        let mut out = Vec::new();
        follow(&mut rx, std::future::pending(), OutputFormat::Json, &mut out)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["type"], "order_updated");
        assert_eq!(value["invoiceNumber"], "INV-7");
    }
}
