//! WebSocket transport to the assistant

use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::{Connector, Link};
use crate::{Error, Result};

/// Connects to a `ws://` or `wss://` assistant endpoint
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: Url,
}

impl WebSocketConnector {
    /// Create a connector for `endpoint`
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is not a valid `ws`/`wss` URL
    pub fn new(endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint)?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::Config(format!(
                "assistant endpoint must use ws:// or wss://, got {endpoint}"
            )));
        }

        Ok(Self { url })
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    fn endpoint(&self) -> String {
        self.url.to_string()
    }

    async fn connect(&self) -> Result<Link> {
        let (ws, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| Error::Transport(format!("websocket connect failed: {e}")))?;

        let (write, read) = ws.split();

        // One text frame per utterance or reply; control and binary frames carry nothing
        let incoming = read
            .filter_map(|frame| {
                future::ready(match frame {
                    Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                    Ok(Message::Close(frame)) => {
                        tracing::debug!(?frame, "close frame received");
                        None
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(Error::Transport(e.to_string()))),
                })
            })
            .boxed();

        let outgoing = write
            .sink_map_err(|e| Error::Transport(e.to_string()))
            .with(|text: String| future::ready(Ok::<_, Error>(Message::Text(text.into()))));

        Ok(Link {
            incoming,
            outgoing: Box::pin(outgoing),
        })
    }
}
