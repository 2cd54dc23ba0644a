//! Whole-collection purge.

use serde::Serialize;
use std::sync::Arc;

use recordops_core::{traits::RecordStore, types::Credential, Error, Result};

/// Outcome of a class purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    pub class_name: String,
    /// Count taken before the purge. Writes racing with the purge are not
    /// reflected, so this is a snapshot rather than an exact tally.
    pub deleted_objects: usize,
}

/// Counts and then wipes an entire collection.
pub struct ClassPurger {
    store: Arc<dyn RecordStore>,
}

impl ClassPurger {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Purge `class_name`, reporting the pre-purge count.
    pub async fn purge(&self, credential: &Credential, class_name: &str) -> Result<PurgeReport> {
        if class_name.trim().is_empty() {
            return Err(Error::invalid_request(
                "Parameter \"className\" is required and must be a string.",
            ));
        }
        let user = credential.require_authenticated()?;
        let elevated = credential.elevate();

        let failed = |e: Error| {
            Error::storage(format!("Failed to purge class \"{}\": {}", class_name, e))
        };
        let count = self
            .store
            .count(&elevated, class_name)
            .await
            .map_err(failed)?;
        self.store
            .purge_class(&elevated, class_name)
            .await
            .map_err(failed)?;

        tracing::info!(
            class = class_name,
            user = user,
            deleted = count,
            "Purged class"
        );

        Ok(PurgeReport {
            class_name: class_name.to_string(),
            deleted_objects: count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRecordStore;
    use chrono::Utc;
    use recordops_core::mocks::{FlakyRecordStore, StoreCall};
    use recordops_core::types::Fields;

    fn seeded(n: usize) -> Arc<InMemoryRecordStore> {
        let store = Arc::new(InMemoryRecordStore::new());
        for _ in 0..n {
            store.insert_at("DataStore", Utc::now(), Fields::new());
        }
        store
    }

    #[tokio::test]
    async fn test_purge_reports_count_and_empties() {
        let store = seeded(12);
        let purger = ClassPurger::new(store.clone());
        let user = Credential::user("alice");

        let report = purger.purge(&user, "DataStore").await.unwrap();
        assert_eq!(report.deleted_objects, 12);
        assert_eq!(report.class_name, "DataStore");
        assert_eq!(store.count(&user, "DataStore").await.unwrap(), 0);

        let again = purger.purge(&user, "DataStore").await.unwrap();
        assert_eq!(again.deleted_objects, 0);
        assert_eq!(store.count(&user, "DataStore").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_precedes_purge() {
        let flaky = Arc::new(FlakyRecordStore::new(seeded(3)));
        ClassPurger::new(flaky.clone())
            .purge(&Credential::user("alice"), "DataStore")
            .await
            .unwrap();

        assert_eq!(
            flaky.calls(),
            vec![
                StoreCall::Count { class_name: "DataStore".into() },
                StoreCall::PurgeClass { class_name: "DataStore".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_validation_and_auth_have_no_side_effects() {
        let flaky = Arc::new(FlakyRecordStore::new(seeded(3)));
        let purger = ClassPurger::new(flaky.clone());

        let err = purger.purge(&Credential::user("alice"), "  ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));

        let err = purger.purge(&Credential::anonymous(), "DataStore").await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));

        assert!(flaky.calls().is_empty());
    }

    #[tokio::test]
    async fn test_purge_failure_names_class() {
        let flaky = Arc::new(FlakyRecordStore::new(seeded(3)).fail_purge());
        let err = ClassPurger::new(flaky)
            .purge(&Credential::user("alice"), "DataStore")
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Failed to purge class \"DataStore\""), "{message}");
        assert!(message.contains("injected failure on purge"), "{message}");
    }
}
