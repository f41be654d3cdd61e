//! AMQP consumer loop for user-created events.

use futures_util::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions, BasicRejectOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use std::time::Duration;
use uuid::Uuid;

use crate::config::BrokerConfig;
use crate::error::{FollowError, Result};
use crate::events::{handle_payload, Disposition};
use crate::store::UserStore;

/// Long-lived consumer: one message at a time, ack only after the store write.
pub struct UserEventConsumer {
    users: UserStore,
    config: BrokerConfig,
}

impl UserEventConsumer {
    pub fn new(users: UserStore, config: BrokerConfig) -> Self {
        Self { users, config }
    }

    /// Consume forever, reconnecting after `reconnect_delay_ms` on any broker failure.
    pub async fn run(self) {
        let delay = Duration::from_millis(self.config.reconnect_delay_ms);
        loop {
            match self.consume().await {
                Ok(()) => log::warn!("Consumer stream for '{}' ended", self.config.queue),
                Err(e) => log::error!("User event consumer failed: {}", e),
            }
            log::info!("Reconnecting to broker in {} ms", delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    }

    async fn consume(&self) -> Result<()> {
        let connection = Connection::connect(&self.config.url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        self.declare_topology(&channel).await?;

        // One unacknowledged message at a time.
        channel.basic_qos(1, BasicQosOptions::default()).await?;

        let consumer_tag = format!("{}-{}", self.config.consumer_tag, Uuid::new_v4());
        let mut consumer = channel
            .basic_consume(
                &self.config.queue,
                &consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        log::info!(
            "Listening to the queue '{}' for user creation events...",
            self.config.queue
        );

        while let Some(delivery) = consumer.next().await {
            let delivery = delivery?;
            match handle_payload(&self.users, &delivery.data).await {
                Disposition::Ack => delivery.ack(BasicAckOptions::default()).await?,
                Disposition::Reject => {
                    delivery
                        .reject(BasicRejectOptions { requeue: false })
                        .await?
                }
                Disposition::Requeue => {
                    delivery
                        .nack(BasicNackOptions {
                            multiple: false,
                            requeue: true,
                        })
                        .await?
                }
            }
        }

        Ok(())
    }

    async fn declare_topology(&self, channel: &Channel) -> Result<()> {
        channel
            .queue_declare(
                &self.config.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        if self.config.exchange.is_empty() {
            return Ok(());
        }

        channel
            .exchange_declare(
                &self.config.exchange,
                exchange_kind(&self.config.exchange_kind)?,
                ExchangeDeclareOptions {
                    durable: true,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_bind(
                &self.config.queue,
                &self.config.exchange,
                &self.config.routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        log::debug!(
            "Queue '{}' bound to exchange '{}' with key '{}'",
            self.config.queue,
            self.config.exchange,
            self.config.routing_key
        );
        Ok(())
    }
}

fn exchange_kind(kind: &str) -> Result<ExchangeKind> {
    match kind.to_ascii_lowercase().as_str() {
        "direct" => Ok(ExchangeKind::Direct),
        "fanout" => Ok(ExchangeKind::Fanout),
        "topic" => Ok(ExchangeKind::Topic),
        "headers" => Ok(ExchangeKind::Headers),
        other => Err(FollowError::Config(format!(
            "Unsupported broker.exchange_kind '{}'",
            other
        ))),
    }
}
