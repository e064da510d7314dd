//! Observation API Handler
//!
//! WebSocket endpoint for observers. Each connection receives the `init`
//! snapshot followed by every broadcast event, in order. Anything the observer
//! sends is ignored apart from close frames.

use axum::{
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::api::SharedStore;
use crate::service::Subscription;

/// GET /ws
/// Upgrade to the observation channel
pub async fn observe(ws: WebSocketUpgrade, State(store): State<SharedStore>) -> Response {
    ws.on_upgrade(move |socket| stream_events(socket, store))
}

async fn stream_events(socket: WebSocket, store: SharedStore) {
    let Subscription { id, mut events } = store.subscribe().await;
    let (mut sink, mut incoming) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                // The hub closes the queue when this observer fell too far behind
                let Some(event) = event else {
                    debug!("Observer {} was dropped by the hub", id);
                    break;
                };

                let text = match event.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode '{}' event: {}", event.event, e);
                        continue;
                    }
                };

                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    debug!("Observer {} send failed: {}", id, e);
                    break;
                }
            }
            message = incoming.next() => {
                match message {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    store.unsubscribe(id).await;
    let _ = sink.close().await;
}
