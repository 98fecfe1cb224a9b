//! Native WebSocket implementation using tokio-tungstenite.

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{Connector, TransportEvent, WsCommand, WsHandle, WsLink};

/// Opens real WebSocket connections on the current tokio runtime.
///
/// Each [`Connector::open`] spawns one task that owns the socket until the
/// peer closes, an error occurs, or the handle asks it to close. There is
/// no reconnect: the task always finishes by emitting
/// [`TransportEvent::Closed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    /// Must be called from within a tokio runtime.
    fn open(&self, endpoint: &str) -> WsLink {
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();

        tokio::spawn(run_connection(endpoint.to_string(), command_rx, event_tx));

        WsLink::new(WsHandle::new(command_tx, endpoint), event_rx)
    }
}

async fn run_connection(
    url: String,
    mut commands: UnboundedReceiver<WsCommand>,
    events: UnboundedSender<TransportEvent>,
) {
    // The session may have dropped its receiver already; nothing to report to then.
    let emit = |event: TransportEvent| {
        let _ = events.unbounded_send(event);
    };

    let ws_stream = match connect_async(url.as_str()).await {
        Ok((ws_stream, _response)) => ws_stream,
        Err(e) => {
            crate::log_error!("WebSocket connect to {} failed: {}", url, e);
            emit(TransportEvent::Errored(e.to_string()));
            emit(TransportEvent::Closed);
            return;
        }
    };

    crate::log_info!("WebSocket connected to {}", url);
    emit(TransportEvent::Opened);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            command = commands.next() => match command {
                Some(WsCommand::Text(json)) => {
                    if let Err(e) = write.send(Message::text(json)).await {
                        crate::log_error!("Send to {} failed: {}", url, e);
                        emit(TransportEvent::Errored(e.to_string()));
                        break;
                    }
                }
                Some(WsCommand::Close) | None => {
                    crate::log_info!("Closing WebSocket to {}", url);
                    if let Err(e) = write.send(Message::Close(None)).await {
                        crate::log_debug!("Close frame to {} not sent: {}", url, e);
                    }
                    break;
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let text = text.to_string();
                    crate::log_debug!("WebSocket received: {}", text);
                    emit(TransportEvent::Frame(text));
                }
                Some(Ok(Message::Close(_))) | None => {
                    crate::log_info!("WebSocket to {} received close frame", url);
                    break;
                }
                Some(Ok(Message::Binary(data))) => {
                    crate::log_warn!("Ignoring {}-byte binary frame from {}", data.len(), url);
                }
                Some(Ok(_)) => {
                    // Ping/pong are answered by tungstenite.
                }
                Some(Err(e)) => {
                    crate::log_error!("WebSocket read error from {}: {}", url, e);
                    emit(TransportEvent::Errored(e.to_string()));
                    break;
                }
            },
        }
    }

    crate::log_info!("WebSocket to {} closed", url);
    emit(TransportEvent::Closed);
}
