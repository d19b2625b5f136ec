//! Delivery transport seam.
//!
//! The scheduler only needs four capabilities: resolve a channel, resolve a
//! user, open a DM, and send a payload. [`DiscordTransport`] implements them
//! over the serenity HTTP client; tests substitute a mock.

use super::embeds::TimerNotification;
use crate::core::TimerError;
use async_trait::async_trait;
use log::warn;
use serenity::http::Http;
use serenity::model::id::{ChannelId, UserId};
use std::sync::Arc;

#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    /// Resolve a stored channel id to a sendable channel. `None` when the
    /// channel no longer exists or the bot lost access.
    async fn resolve_channel(&self, channel_id: &str) -> Result<Option<String>, TimerError>;

    /// Resolve a stored user id. `None` when the user cannot be found.
    async fn resolve_user(&self, user_id: &str) -> Result<Option<String>, TimerError>;

    /// Open (or reuse) a direct conversation with a user, returning its
    /// channel id.
    async fn open_direct_channel(&self, user_id: &str) -> Result<String, TimerError>;

    /// Deliver a notification to a resolved channel.
    async fn send(&self, channel_id: &str, note: &TimerNotification) -> Result<(), TimerError>;
}

/// Discord implementation over the serenity HTTP client.
pub struct DiscordTransport {
    http: Arc<Http>,
}

impl DiscordTransport {
    pub fn new(http: Arc<Http>) -> Self {
        DiscordTransport { http }
    }
}

fn parse_snowflake(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok()
}

#[async_trait]
impl DeliveryTransport for DiscordTransport {
    async fn resolve_channel(&self, channel_id: &str) -> Result<Option<String>, TimerError> {
        let Some(id) = parse_snowflake(channel_id) else {
            return Ok(None);
        };
        match self.http.get_channel(id).await {
            Ok(channel) => Ok(Some(channel.id().0.to_string())),
            Err(err) => {
                warn!("could not resolve channel {channel_id}: {err}");
                Ok(None)
            }
        }
    }

    async fn resolve_user(&self, user_id: &str) -> Result<Option<String>, TimerError> {
        let Some(id) = parse_snowflake(user_id) else {
            return Ok(None);
        };
        match self.http.get_user(id).await {
            Ok(user) => Ok(Some(user.id.0.to_string())),
            Err(err) => {
                warn!("could not resolve user {user_id}: {err}");
                Ok(None)
            }
        }
    }

    async fn open_direct_channel(&self, user_id: &str) -> Result<String, TimerError> {
        let id = parse_snowflake(user_id).ok_or_else(|| {
            TimerError::DestinationUnresolved(format!("malformed user id {user_id}"))
        })?;
        let channel = UserId(id)
            .create_dm_channel(&self.http)
            .await
            .map_err(|err| {
                TimerError::DestinationUnresolved(format!("could not open DM with {user_id}: {err}"))
            })?;
        Ok(channel.id.0.to_string())
    }

    async fn send(&self, channel_id: &str, note: &TimerNotification) -> Result<(), TimerError> {
        let id = parse_snowflake(channel_id).ok_or_else(|| {
            TimerError::DestinationUnresolved(format!("malformed channel id {channel_id}"))
        })?;
        let embed = note.to_embed();
        ChannelId(id)
            .send_message(&self.http, |message| {
                if let Some(content) = &note.content {
                    message.content(content);
                }
                message.set_embed(embed)
            })
            .await
            .map_err(TimerError::transport)?;
        Ok(())
    }
}
