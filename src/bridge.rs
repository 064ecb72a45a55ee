use crate::constants::BRIDGE_QUEUE_BUFFER;
use crate::dispatcher::Dispatcher;
use crate::query::{QueryError, QueryRequest, QueryResult};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const UNREACHABLE_MESSAGE: &str = "could not reach the background worker";

/// Messages sent from the page side to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeRequest {
    #[serde(rename = "AI_QUERY")]
    Query { text: String },
    #[serde(rename = "AI_QUERY_CUSTOM")]
    CustomQuery { text: String, question: String },
}

impl From<BridgeRequest> for QueryRequest {
    fn from(request: BridgeRequest) -> Self {
        match request {
            BridgeRequest::Query { text } => QueryRequest::explain(text),
            BridgeRequest::CustomQuery { text, question } => QueryRequest::custom(text, question),
        }
    }
}

type Envelope = (BridgeRequest, oneshot::Sender<QueryResult>);

/// The worker side of the bridge. Owns the dispatcher; every request gets its own task
/// so a slow provider call never blocks later requests.
pub struct Bridge {
    client: BridgeClient,
    worker_handle: JoinHandle<()>,
}

impl Bridge {
    pub fn spawn(dispatcher: Dispatcher) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Envelope>(BRIDGE_QUEUE_BUFFER);

        let worker_handle = tokio::spawn(async move {
            while let Some((request, reply)) = receiver.recv().await {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    let result = dispatcher.dispatch(request.into()).await;
                    // The requester may have gone away; the result is simply dropped.
                    if reply.send(result).is_err() {
                        tracing::debug!("Bridge reply dropped, requester gone");
                    }
                });
            }
            tracing::debug!("Bridge worker shutting down");
        });

        Self {
            client: BridgeClient { sender },
            worker_handle,
        }
    }

    pub fn client(&self) -> BridgeClient {
        self.client.clone()
    }

    /// Stops accepting requests. Requests already handed to a task still finish.
    pub async fn shutdown(self) {
        self.worker_handle.abort();
        match self.worker_handle.await {
            Ok(()) => tracing::debug!("Bridge worker shut down cleanly"),
            Err(e) if e.is_cancelled() => tracing::debug!("Bridge worker stopped"),
            Err(e) => tracing::warn!("Bridge worker panicked: {}", e),
        }
    }
}

/// Page-side handle. Each request resolves exactly once.
#[derive(Clone)]
pub struct BridgeClient {
    sender: mpsc::Sender<Envelope>,
}

impl BridgeClient {
    pub async fn request(&self, request: BridgeRequest) -> QueryResult {
        let (reply, response) = oneshot::channel();
        if self.sender.send((request, reply)).await.is_err() {
            tracing::warn!("Bridge worker is not running");
            return QueryResult::failure(&QueryError::Bridge(UNREACHABLE_MESSAGE.to_string()));
        }
        response.await.unwrap_or_else(|_| {
            tracing::warn!("Bridge worker dropped the reply");
            QueryResult::failure(&QueryError::Bridge(UNREACHABLE_MESSAGE.to_string()))
        })
    }

    /// Wire-level entry: a JSON request in, a JSON `QueryResult` out.
    pub async fn request_json(&self, raw: &str) -> String {
        let result = match serde_json::from_str::<BridgeRequest>(raw) {
            Ok(request) => self.request(request).await,
            Err(e) => {
                tracing::warn!("Malformed bridge message: {}", e);
                QueryResult::failure(&QueryError::Bridge(format!("malformed message: {}", e)))
            }
        };
        serde_json::to_string(&result)
            .unwrap_or_else(|_| r#"{"success":false,"error":"internal error"}"#.to_string())
    }
}
