use crate::config::FeedConfig;
use crate::error::TransportError;
use futures::future::{self, BoxFuture};
use futures::stream::{BoxStream, StreamExt};
use tokio_tungstenite::tungstenite::Message;

/// Text frames from an open connection. A close frame ends the stream; a
/// broken connection yields an error.
pub type FrameStream = BoxStream<'static, Result<String, TransportError>>;

pub type ConnectFuture = BoxFuture<'static, Result<FrameStream, TransportError>>;

/// Opens streaming connections to the telemetry source. Dropping the returned
/// stream closes the connection.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> ConnectFuture;
}

/// WebSocket connector for the broadcaster's `/ws/telemetry` endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.endpoint())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    fn connect(&self) -> ConnectFuture {
        let url = self.url.clone();
        Box::pin(async move {
            let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|err| TransportError::Connect {
                    reason: err.to_string(),
                })?;
            let frames = socket
                .take_while(|item| future::ready(!matches!(item, Ok(Message::Close(_)))))
                .filter_map(|item| async move {
                    match item {
                        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                        Ok(_) => None,
                        Err(err) => Some(Err(TransportError::Protocol {
                            reason: err.to_string(),
                        })),
                    }
                });
            Ok(frames.boxed())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::SinkExt;

    #[test]
    fn test_url_from_config() {
        let config = FeedConfig {
            host: "backend".to_string(),
            port: 9100,
            ..FeedConfig::default()
        };
        assert_eq!(WsConnector::from_config(&config).url(), "ws://backend:9100/ws/telemetry");
    }

    #[tokio::test]
    async fn test_connect_refused_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let connector = WsConnector::new(format!("ws://127.0.0.1:{port}/ws/telemetry"));
        let result = connector.connect().await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_close_frame_ends_the_stream() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(tcp).await.unwrap();
            socket.send(Message::Text("first".to_string().into())).await.unwrap();
            socket.close(None).await.unwrap();
            while socket.next().await.is_some() {}
        });

        let connector = WsConnector::new(format!("ws://{addr}/ws/telemetry"));
        let frames = connector.connect().await.unwrap();
        let received: Vec<_> = frames.collect().await;
        assert_eq!(received, vec![Ok("first".to_string())]);
        server.await.unwrap();
    }
}
