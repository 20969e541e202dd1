use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::Reservation;
use crate::services::store::{GeoStore, StoreError};

/// Errors that can occur while delivering daily reminders
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Webhook rejected delivery with status {0}")]
    Rejected(u16),
}

/// Delivers the reminders for reservations due on a given day
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the number of reservations delivered
    async fn send_daily_reservations(&self, date: NaiveDate) -> Result<usize, NotifierError>;
}

/// Payload POSTed to the reminder webhook
#[derive(Debug, Serialize)]
struct DailyDigest<'a> {
    date: NaiveDate,
    reservations: &'a [Reservation],
}

/// Sends the day's reservations as one JSON digest to an HTTP endpoint
pub struct WebhookNotifier {
    store: Arc<dyn GeoStore>,
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(store: Arc<dyn GeoStore>, url: impl Into<String>, timeout_secs: u64) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            store,
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_daily_reservations(&self, date: NaiveDate) -> Result<usize, NotifierError> {
        let due = self.store.reservations_due(date).await?;
        if due.is_empty() {
            tracing::debug!(%date, "No reservations to notify");
            return Ok(0);
        }

        let response = self
            .client
            .post(&self.url)
            .json(&DailyDigest { date, reservations: &due })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifierError::Rejected(response.status().as_u16()));
        }

        tracing::info!(%date, delivered = due.len(), "Daily reservation digest delivered");
        Ok(due.len())
    }
}

/// Notifier used when no webhook is configured: reports due reservations in the log
pub struct LogNotifier {
    store: Arc<dyn GeoStore>,
}

impl LogNotifier {
    pub fn new(store: Arc<dyn GeoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_daily_reservations(&self, date: NaiveDate) -> Result<usize, NotifierError> {
        let due = self.store.reservations_due(date).await?;
        for reservation in &due {
            tracing::info!(
                reservation_id = reservation.id,
                office_id = reservation.office_id,
                time = %reservation.time,
                "Reservation due today"
            );
        }
        Ok(due.len())
    }
}
