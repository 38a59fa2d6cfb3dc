//! Drop confirmation registry
//!
//! A destructive drop needs an explicit button press from the requesting
//! user within a bounded window. Each request is one registry entry that
//! exists only while the drop is pending: confirmation and expiry both
//! remove it, so the bulk store mutation is reachable exactly once and the
//! registry never accumulates finished requests. Entries are keyed by a
//! uuid custom id and independent across users.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

/// How long the user has to press the confirm button.
pub const DROP_CONFIRM_WINDOW: Duration = Duration::from_secs(10);

#[derive(Debug)]
struct PendingDrop {
    /// Only this user may confirm
    user_id: String,
    /// Store keys staged for the exclude-flag update
    record_ids: Vec<String>,
}

/// What a confirmation attempt resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The pending entry was claimed; carries the staged record ids
    Confirmed(Vec<String>),
    /// Someone other than the requester pressed the button
    WrongUser,
    /// No pending request under this id: already confirmed, already
    /// expired, or never registered
    Unknown,
}

/// Registry of in-flight drop confirmations.
#[derive(Debug, Default)]
pub struct ConfirmRegistry {
    entries: Mutex<HashMap<String, PendingDrop>>,
}

impl ConfirmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending drop and return its button custom id.
    pub async fn register(&self, user_id: &str, record_ids: Vec<String>) -> String {
        let custom_id = format!("confirm-drop-{}", Uuid::new_v4());
        let mut entries = self.entries.lock().await;
        entries.insert(
            custom_id.clone(),
            PendingDrop {
                user_id: user_id.to_string(),
                record_ids,
            },
        );
        custom_id
    }

    /// Claim the pending entry for `user_id`. A successful claim removes
    /// it, so a second press (or a late timer) finds nothing.
    pub async fn try_confirm(&self, custom_id: &str, user_id: &str) -> ConfirmOutcome {
        let mut entries = self.entries.lock().await;
        match entries.get(custom_id) {
            None => return ConfirmOutcome::Unknown,
            Some(entry) if entry.user_id != user_id => return ConfirmOutcome::WrongUser,
            Some(_) => {}
        }
        match entries.remove(custom_id) {
            Some(entry) => ConfirmOutcome::Confirmed(entry.record_ids),
            None => ConfirmOutcome::Unknown,
        }
    }

    /// Drop the pending entry. Returns true when the timer won the race,
    /// false when the entry was already claimed (or unknown).
    pub async fn expire(&self, custom_id: &str) -> bool {
        let mut entries = self.entries.lock().await;
        entries.remove(custom_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_confirm_happy_path() {
        let registry = ConfirmRegistry::new();
        let id = registry
            .register("user-1", vec!["recA".into(), "recB".into()])
            .await;
        match registry.try_confirm(&id, "user-1").await {
            ConfirmOutcome::Confirmed(ids) => assert_eq!(ids, vec!["recA", "recB"]),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_user_cannot_confirm() {
        let registry = ConfirmRegistry::new();
        let id = registry.register("user-1", vec!["recA".into()]).await;
        assert_eq!(
            registry.try_confirm(&id, "user-2").await,
            ConfirmOutcome::WrongUser
        );
        // Still pending for the real requester
        assert!(matches!(
            registry.try_confirm(&id, "user-1").await,
            ConfirmOutcome::Confirmed(_)
        ));
    }

    #[tokio::test]
    async fn test_expiry_wins_over_late_confirm() {
        let registry = ConfirmRegistry::new();
        let id = registry.register("user-1", vec!["recA".into()]).await;
        assert!(registry.expire(&id).await);
        assert_eq!(
            registry.try_confirm(&id, "user-1").await,
            ConfirmOutcome::Unknown
        );
    }

    #[tokio::test]
    async fn test_confirm_wins_over_late_expiry() {
        let registry = ConfirmRegistry::new();
        let id = registry.register("user-1", vec!["recA".into()]).await;
        assert!(matches!(
            registry.try_confirm(&id, "user-1").await,
            ConfirmOutcome::Confirmed(_)
        ));
        assert!(!registry.expire(&id).await);
    }

    #[tokio::test]
    async fn test_double_confirm_rejected() {
        let registry = ConfirmRegistry::new();
        let id = registry.register("user-1", vec!["recA".into()]).await;
        assert!(matches!(
            registry.try_confirm(&id, "user-1").await,
            ConfirmOutcome::Confirmed(_)
        ));
        assert_eq!(
            registry.try_confirm(&id, "user-1").await,
            ConfirmOutcome::Unknown
        );
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let registry = ConfirmRegistry::new();
        assert_eq!(
            registry.try_confirm("confirm-drop-missing", "user-1").await,
            ConfirmOutcome::Unknown
        );
        assert!(!registry.expire("confirm-drop-missing").await);
    }

    #[tokio::test]
    async fn test_concurrent_users_are_independent() {
        let registry = ConfirmRegistry::new();
        let a = registry.register("user-1", vec!["recA".into()]).await;
        let b = registry.register("user-2", vec!["recB".into()]).await;
        assert!(registry.expire(&a).await);
        match registry.try_confirm(&b, "user-2").await {
            ConfirmOutcome::Confirmed(ids) => assert_eq!(ids, vec!["recB"]),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_finished_requests_leave_no_entry_behind() {
        let registry = ConfirmRegistry::new();

        // Confirmed entries are gone, not just marked done
        let confirmed = registry.register("user-1", vec!["recA".into()]).await;
        assert!(matches!(
            registry.try_confirm(&confirmed, "user-1").await,
            ConfirmOutcome::Confirmed(_)
        ));
        assert_eq!(
            registry.try_confirm(&confirmed, "user-1").await,
            ConfirmOutcome::Unknown
        );
        assert!(!registry.expire(&confirmed).await);

        // Expired entries likewise
        let expired = registry.register("user-1", vec!["recB".into()]).await;
        assert!(registry.expire(&expired).await);
        assert_eq!(
            registry.try_confirm(&expired, "user-1").await,
            ConfirmOutcome::Unknown
        );
        assert!(!registry.expire(&expired).await);

        let entries = registry.entries.lock().await;
        assert!(entries.is_empty());
    }
}
