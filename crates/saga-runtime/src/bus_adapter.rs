//! `BusPublisher` backed by an `rdkafka` producer, held for the lifetime of
//! one execution.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;
use saga_core::{BusAck, BusPublisher, Result, SagaError};
use serde_json::Value;

/// Concrete message-bus transport for `bus` steps and rollbacks.
///
/// One producer is built per execution and released when the execution
/// reaches a terminal state, mirroring the original's lazily-constructed,
/// execution-scoped Kafka producer.
pub struct RdKafkaBusPublisher {
    producer: FutureProducer,
    ack_timeout: Duration,
}

impl RdKafkaBusPublisher {
    pub fn new(bootstrap_servers: &str, ack_timeout: Duration) -> Result<Self> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", ack_timeout.as_millis().to_string())
            .create()
            .map_err(|e| SagaError::StepTransport(e.to_string()))?;

        Ok(Self {
            producer,
            ack_timeout,
        })
    }
}

#[async_trait]
impl BusPublisher for RdKafkaBusPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: Option<String>,
        headers: HashMap<String, String>,
        value: Value,
    ) -> Result<BusAck> {
        let payload = serde_json::to_vec(&value)?;

        let mut kafka_headers = OwnedHeaders::new();
        for (name, value) in &headers {
            kafka_headers = kafka_headers.insert(Header {
                key: name,
                value: Some(value),
            });
        }

        let mut record = FutureRecord::to(topic)
            .payload(&payload)
            .headers(kafka_headers);
        if let Some(key) = &key {
            record = record.key(key);
        }

        match self
            .producer
            .send(record, Timeout::After(self.ack_timeout))
            .await
        {
            Ok((partition, offset)) => Ok(BusAck { partition, offset }),
            Err((e, _)) => Err(SagaError::StepTransport(e.to_string())),
        }
    }
}
