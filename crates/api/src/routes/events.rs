//! Live admin feed over Server-Sent Events.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use domain::LiveEvent;
use futures_util::Stream;
use futures_util::stream;
use store::Store;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;

use super::AppState;
use crate::auth::AdminUser;

/// GET /admin/events: stream `lowStockAlert` and `newOrder` events.
///
/// Only events published while the client is connected are delivered.
pub async fn stream<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    admin: AdminUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.notifier.subscribe();
    tracing::info!(
        admin_id = %admin.0.id,
        subscribers = state.notifier.subscriber_count(),
        "admin subscribed to live events"
    );

    Sse::new(live_events(receiver)).keep_alive(KeepAlive::default())
}

/// Counts one open stream in `live_event_subscribers` for as long as it lives.
struct SubscriberGauge;

impl SubscriberGauge {
    fn open() -> Self {
        metrics::gauge!("live_event_subscribers").increment(1.0);
        Self
    }
}

impl Drop for SubscriberGauge {
    fn drop(&mut self) {
        metrics::gauge!("live_event_subscribers").decrement(1.0);
    }
}

/// The gauge is released when the stream is dropped, either on client
/// disconnect or after the channel closes.
fn live_events(receiver: Receiver<LiveEvent>) -> impl Stream<Item = Result<Event, Infallible>> {
    let gauge = SubscriberGauge::open();
    stream::unfold((receiver, gauge), |(mut receiver, gauge)| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => return Some((Ok(to_sse(&event)), (receiver, gauge))),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "live event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

fn to_sse(event: &LiveEvent) -> Event {
    let data = match serde_json::to_value(event) {
        Ok(mut value) => value
            .get_mut("data")
            .map(serde_json::Value::take)
            .unwrap_or_default(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode live event");
            serde_json::Value::Null
        }
    };
    Event::default().event(event.name()).data(data.to_string())
}
