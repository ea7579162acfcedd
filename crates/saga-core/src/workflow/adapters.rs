//! Transport traits the orchestrator dispatches steps through. Concrete
//! implementations (reqwest, rdkafka) live in the runtime crate; the core
//! only ever depends on these interfaces.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A synchronous request/response transport for `api` steps.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<Value>,
    ) -> Result<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

/// A publish-with-ack transport for `bus` steps.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        key: Option<String>,
        headers: HashMap<String, String>,
        value: Value,
    ) -> Result<BusAck>;
}

#[derive(Debug, Clone)]
pub struct BusAck {
    pub partition: i32,
    pub offset: i64,
}
