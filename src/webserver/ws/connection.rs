/// WebSocket connection handler
///
/// One task per subscriber:
/// - registers with the hub (queue starts with INITIAL_STATE)
/// - forwards hub envelopes to the client as `{type, data}` text frames
/// - answers client pings; pings silent clients on a fixed ticker
/// - unregisters on any exit path
///
/// Subscribers are receive-only; text frames from the client count as
/// activity and are otherwise ignored.
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::time::Instant;

use crate::{
    arguments::is_debug_webserver_enabled,
    broadcast::{Envelope, SubscriberId},
    logger::{self, LogTag},
    webserver::state::AppState,
};

use super::health::{DisconnectReason, HeartbeatAction, HeartbeatConfig, SubscriberHeartbeat};

pub async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    let service = state.service.clone();
    let (conn_id, mut hub_rx) = service.subscribe();

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut heartbeat = SubscriberHeartbeat::new(
        HeartbeatConfig::from_config(&state.config.websocket),
        Instant::now(),
    );
    let mut ticker = heartbeat.ticker();
    let mut sent: u64 = 0;

    if is_debug_webserver_enabled() {
        logger::debug(LogTag::Webserver, &format!("Connection {} started", conn_id));
    }

    loop {
        tokio::select! {
            biased;

            envelope = hub_rx.recv() => {
                let Some(envelope) = envelope else {
                    // Hub dropped us (queue closed)
                    break;
                };
                if let Err(e) = forward_to_client(&mut ws_tx, &envelope, conn_id).await {
                    logger::warning(
                        LogTag::Webserver,
                        &format!("Connection {}: failed to send message: {}", conn_id, e),
                    );
                    break;
                }
                sent += 1;
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Ping(payload))) => {
                        heartbeat.heard(Instant::now());
                        if ws_tx.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Text(_))) | Some(Ok(Message::Binary(_))) | Some(Ok(Message::Pong(_))) => {
                        heartbeat.heard(Instant::now());
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        if is_debug_webserver_enabled() {
                            logger::debug(
                                LogTag::Webserver,
                                &format!("Connection {}: client closed", conn_id),
                            );
                        }
                        break;
                    }
                    Some(Err(e)) => {
                        logger::warning(
                            LogTag::Webserver,
                            &format!("Connection {}: websocket error: {}", conn_id, e),
                        );
                        break;
                    }
                }
            }

            _ = ticker.tick() => {
                let now = Instant::now();
                match heartbeat.poll(now) {
                    HeartbeatAction::Wait => {}
                    HeartbeatAction::SendPing => {
                        if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                            break;
                        }
                    }
                    HeartbeatAction::Disconnect(reason) => {
                        let what = match reason {
                            DisconnectReason::PongTimeout => "pong timeout",
                            DisconnectReason::Idle => "idle timeout",
                        };
                        logger::warning(
                            LogTag::Webserver,
                            &format!(
                                "Connection {}: {} (silent {}s)",
                                conn_id,
                                what,
                                heartbeat.silent_for(now).as_secs()
                            ),
                        );
                        break;
                    }
                }
            }
        }
    }

    service.unsubscribe(conn_id);
    let _ = ws_tx.close().await;

    if is_debug_webserver_enabled() {
        logger::debug(
            LogTag::Webserver,
            &format!(
                "Connection {} closed (sent={}, pings={})",
                conn_id,
                sent,
                heartbeat.pings_sent()
            ),
        );
    }
}

async fn forward_to_client(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    envelope: &Envelope,
    conn_id: SubscriberId,
) -> Result<(), axum::Error> {
    match envelope.to_json() {
        Ok(json) => ws_tx.send(Message::Text(json)).await,
        Err(e) => {
            logger::error(
                LogTag::Webserver,
                &format!("Connection {}: failed to serialize {}: {}", conn_id, envelope.kind, e),
            );
            // Don't break connection on serialization error
            Ok(())
        }
    }
}
