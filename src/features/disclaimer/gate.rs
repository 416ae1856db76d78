use anyhow::Result;
use chrono::NaiveDateTime;
use log::{info, warn};
use std::sync::Arc;

use crate::core::{Clock, KeyValueStore};

pub const ACCEPTED_KEY: &str = "disclaimer_accepted";
pub const ACCEPTED_AT_KEY: &str = "disclaimer_accepted_at";

pub const DISCLAIMER_TEXT: &str = "This app only reminds you to take supplements you have already \
decided to take. It does not give medical advice. Talk to a doctor or pharmacist before starting, \
stopping or changing any supplement.";

pub struct DisclaimerGate {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl DisclaimerGate {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        DisclaimerGate { store, clock }
    }

    /// Missing or unreadable flag counts as not accepted
    pub async fn has_accepted(&self) -> bool {
        match self.store.get(ACCEPTED_KEY).await {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                warn!("Failed to read disclaimer flag: {e}");
                false
            }
        }
    }

    pub async fn accepted_at(&self) -> Option<NaiveDateTime> {
        let raw = self.store.get(ACCEPTED_AT_KEY).await.ok()??;
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S").ok()
    }

    pub async fn accept(&self) -> Result<()> {
        let now = self.clock.now();
        self.store.set(ACCEPTED_KEY, "true").await?;
        self.store
            .set(ACCEPTED_AT_KEY, &now.format("%Y-%m-%dT%H:%M:%S").to_string())
            .await?;
        info!("Medical disclaimer accepted");
        Ok(())
    }

    pub async fn revoke(&self) -> Result<()> {
        self.store.remove(ACCEPTED_KEY).await?;
        self.store.remove(ACCEPTED_AT_KEY).await?;
        info!("Medical disclaimer acceptance revoked");
        Ok(())
    }
}
