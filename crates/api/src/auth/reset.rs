use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

const TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Clone, Debug)]
struct ResetEntry {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// Single-use password reset tokens, kept in memory with a fixed TTL.
/// A restart voids outstanding tokens, which is acceptable: the user
/// just requests a new one.
#[derive(Clone)]
pub struct PasswordResetService {
    tokens: Arc<RwLock<HashMap<String, ResetEntry>>>,
}

impl PasswordResetService {
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Issue a fresh token for the user. Expired entries are swept here
    /// so the map cannot grow without bound.
    pub async fn issue(&self, user_id: Uuid) -> String {
        let token = URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>());
        let now = Utc::now();

        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, entry| entry.expires_at > now);
        tokens.insert(
            token.clone(),
            ResetEntry {
                user_id,
                expires_at: now + Duration::minutes(TOKEN_TTL_MINUTES),
            },
        );

        token
    }

    /// Redeem a token. The entry is removed whether or not it is still
    /// valid, so a token can never be tried twice.
    pub async fn consume(&self, token: &str) -> Option<Uuid> {
        let mut tokens = self.tokens.write().await;
        let entry = tokens.remove(token)?;
        if entry.expires_at <= Utc::now() {
            return None;
        }
        Some(entry.user_id)
    }
}

impl Default for PasswordResetService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_tokens_redeem_once() {
        let service = PasswordResetService::new();
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id).await;
        assert_eq!(service.consume(&token).await, Some(user_id));
        assert_eq!(service.consume(&token).await, None);
    }

    #[tokio::test]
    async fn unknown_tokens_are_rejected() {
        let service = PasswordResetService::new();
        assert_eq!(service.consume("not-a-token").await, None);
    }

    #[tokio::test]
    async fn tokens_are_unique_per_issue() {
        let service = PasswordResetService::new();
        let user_id = Uuid::new_v4();

        let first = service.issue(user_id).await;
        let second = service.issue(user_id).await;
        assert_ne!(first, second);
    }
}
