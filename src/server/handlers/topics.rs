use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Extension, Path};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::api::DynAPI;
use crate::auth::User;
use crate::entities::Booking;
use crate::error::Error;
use crate::notify::Topic;

pub async fn subscribe(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path((role, id)): Path<(String, String)>,
    upgrade: WebSocketUpgrade,
) -> Result<Response, Error> {
    let topic = Topic::parse(&role, &id)?;
    let updates = api.subscribe(user, topic.clone()).await?;

    Ok(upgrade.on_upgrade(move |socket| forward(socket, topic, updates)))
}

/// Pushes every snapshot on the topic to the socket as a JSON text frame until
/// either side goes away. Inbound frames other than close are ignored.
#[tracing::instrument(skip(socket, updates), fields(topic = %topic))]
async fn forward(socket: WebSocket, topic: Topic, mut updates: broadcast::Receiver<Booking>) {
    let (mut outbound, mut inbound) = socket.split();

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(booking) => {
                    let text = match serde_json::to_string(&booking) {
                        Ok(text) => text,
                        Err(err) => {
                            tracing::warn!("failed to encode booking {}: {}", booking.id, err);
                            continue;
                        }
                    };

                    if outbound.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            message = inbound.next() => match message {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!("subscriber disconnected");
}
