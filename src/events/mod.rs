use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventKind {
    TokenRevoked,
    TokenRejected,
    RateLimited,
    AccessDenied,
}

impl SecurityEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityEventKind::TokenRevoked => "token_revoked",
            SecurityEventKind::TokenRejected => "token_rejected",
            SecurityEventKind::RateLimited => "rate_limited",
            SecurityEventKind::AccessDenied => "access_denied",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub kind: SecurityEventKind,
    pub occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    pub details: Value,
}

impl SecurityEvent {
    /// `occurred_at` comes from the caller's clock so tests can pin it.
    pub fn new(
        kind: SecurityEventKind,
        occurred_at: DateTime<Utc>,
        actor_id: Option<String>,
        workspace_id: Option<String>,
        details: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            occurred_at,
            actor_id,
            workspace_id,
            details,
        }
    }

    pub fn token_revoked(at: DateTime<Utc>, actor_id: &str, workspace_id: &str, jti: &str) -> Self {
        Self::new(
            SecurityEventKind::TokenRevoked,
            at,
            Some(actor_id.to_string()),
            Some(workspace_id.to_string()),
            json!({ "jti": jti }),
        )
    }

    pub fn token_rejected(at: DateTime<Utc>, fingerprint: String) -> Self {
        Self::new(
            SecurityEventKind::TokenRejected,
            at,
            None,
            None,
            json!({ "token": fingerprint }),
        )
    }

    pub fn rate_limited(at: DateTime<Utc>, key: &str, limit: u32) -> Self {
        Self::new(
            SecurityEventKind::RateLimited,
            at,
            None,
            None,
            json!({ "key": key, "limit": limit }),
        )
    }

    pub fn access_denied(at: DateTime<Utc>, actor_id: &str, workspace_id: &str, permission: &str) -> Self {
        Self::new(
            SecurityEventKind::AccessDenied,
            at,
            Some(actor_id.to_string()),
            Some(workspace_id.to_string()),
            json!({ "permission": permission }),
        )
    }
}

/// Fan-out channel for security events. Subscribers are optional.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SecurityEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SecurityEvent> {
        self.sender.subscribe()
    }

    /// Logs the event and hands it to any subscribers.
    pub fn publish(&self, event: SecurityEvent) {
        tracing::info!(
            event = event.kind.as_str(),
            actor_id = event.actor_id.as_deref().unwrap_or("-"),
            workspace_id = event.workspace_id.as_deref().unwrap_or("-"),
            details = %event.details,
            "security event"
        );

        // No receivers is fine.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
