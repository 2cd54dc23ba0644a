//! Replace-all CSV import.
//!
//! The dataset is parsed completely before anything is written. The target
//! collection is then purged and every row is saved one at a time, in file
//! order. A failed save ends the import; rows saved before it are kept.

use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use recordops_core::{
    traits::RecordStore,
    types::{Credential, Fields, IMPORTED_ID_FIELD},
    Error, Result,
};

use crate::purge::ClassPurger;

/// Rows parsed from CSV text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDataset {
    pub headers: Vec<String>,
    pub rows: Vec<Fields>,
}

impl ParsedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse CSV text using the header row as field names.
///
/// Blank rows are skipped. A column named `id` is stored as
/// [`IMPORTED_ID_FIELD`] so it cannot collide with the store's identifier.
pub fn parse_csv(text: &str) -> Result<ParsedDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::csv_parse(e.to_string()))?
        .iter()
        .map(|h| {
            if h == "id" {
                IMPORTED_ID_FIELD.to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| Error::csv_parse(e.to_string()))?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let fields: Fields = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), Value::String(v.to_string())))
            .collect();
        rows.push(fields);
    }

    Ok(ParsedDataset { headers, rows })
}

/// Outcome of saving one row.
#[derive(Debug)]
pub struct RowOutcome {
    /// 1-based row number; equals the completed count on success.
    pub row: usize,
    /// Store id of the saved record.
    pub result: Result<String>,
}

/// Final counts of a replace-all import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub previous_count: usize,
    pub new_count: usize,
}

/// A purged collection waiting for its rows.
pub struct PreparedImport {
    store: Arc<dyn RecordStore>,
    credential: Credential,
    class_name: String,
    rows: Vec<Fields>,
    previous_count: usize,
}

impl std::fmt::Debug for PreparedImport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedImport")
            .field("class_name", &self.class_name)
            .field("rows", &self.rows.len())
            .field("previous_count", &self.previous_count)
            .finish()
    }
}

impl PreparedImport {
    /// Rows that will be saved.
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    /// Objects removed by the purge.
    pub fn previous_count(&self) -> usize {
        self.previous_count
    }

    /// Save rows lazily, one per poll, in dataset order.
    ///
    /// The stream ends after the last row or right after the first failure.
    pub fn into_outcomes(self) -> BoxStream<'static, RowOutcome> {
        let PreparedImport {
            store,
            credential,
            class_name,
            rows,
            ..
        } = self;
        let state = (rows.into_iter().enumerate(), false);

        stream::unfold(state, move |(mut rows, failed)| {
            let store = store.clone();
            let credential = credential.clone();
            let class_name = class_name.clone();
            async move {
                if failed {
                    return None;
                }
                let (index, fields) = rows.next()?;
                let row = index + 1;
                let result = store
                    .create(&credential, &class_name, fields)
                    .await
                    .map(|record| record.object_id);

                match &result {
                    Ok(id) => tracing::trace!(class = %class_name, row, object_id = %id, "Saved row"),
                    Err(e) => tracing::warn!(class = %class_name, row, error = %e, "Row save failed"),
                }
                let failed = result.is_err();
                Some((RowOutcome { row, result }, (rows, failed)))
            }
        })
        .boxed()
    }

    /// Drive the outcome stream, reporting the completed count after each save.
    pub async fn run(self, mut on_progress: impl FnMut(usize) + Send) -> Result<ImportSummary> {
        let previous_count = self.previous_count;
        let class_name = self.class_name.clone();
        let mut outcomes = self.into_outcomes();
        let mut completed = 0;

        while let Some(outcome) = outcomes.next().await {
            match outcome.result {
                Ok(_) => {
                    completed = outcome.row;
                    on_progress(completed);
                }
                Err(e) => {
                    return Err(Error::PartialImport {
                        row: outcome.row,
                        completed,
                        cause: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            class = %class_name,
            previous = previous_count,
            imported = completed,
            "Replace-all import complete"
        );

        Ok(ImportSummary {
            previous_count,
            new_count: completed,
        })
    }
}

/// Replaces the contents of a collection with a CSV dataset.
pub struct ReplaceAllImporter {
    store: Arc<dyn RecordStore>,
    purger: ClassPurger,
}

impl ReplaceAllImporter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            purger: ClassPurger::new(store.clone()),
            store,
        }
    }

    /// Purge the collection and return the pending row saves.
    pub async fn prepare(
        &self,
        credential: &Credential,
        class_name: &str,
        dataset: ParsedDataset,
    ) -> Result<PreparedImport> {
        let report = self.purger.purge(credential, class_name).await?;
        Ok(PreparedImport {
            store: self.store.clone(),
            credential: credential.clone(),
            class_name: class_name.to_string(),
            rows: dataset.rows,
            previous_count: report.deleted_objects,
        })
    }

    /// Parse, purge and re-insert in one call.
    pub async fn import_csv(
        &self,
        credential: &Credential,
        class_name: &str,
        csv_text: &str,
        on_progress: impl FnMut(usize) + Send,
    ) -> Result<ImportSummary> {
        let dataset = parse_csv(csv_text)?;
        self.prepare(credential, class_name, dataset)
            .await?
            .run(on_progress)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRecordStore;
    use chrono::Utc;
    use recordops_core::mocks::FlakyRecordStore;
    use recordops_core::types::RecordQuery;

    const CSV: &str = "id,company,tel\n7,Acme,111\n8,Globex,222\n\n9,Initech,333\n";

    fn seeded(n: usize) -> Arc<InMemoryRecordStore> {
        let store = Arc::new(InMemoryRecordStore::new());
        for _ in 0..n {
            store.insert_at("DataStore", Utc::now(), Fields::new());
        }
        store
    }

    #[test]
    fn test_parse_maps_id_column() {
        let dataset = parse_csv(CSV).unwrap();
        assert_eq!(dataset.headers, vec!["ID", "company", "tel"]);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.rows[0]["ID"], "7");
        assert!(dataset.rows[0].get("id").is_none());
        assert_eq!(dataset.rows[2]["company"], "Initech");
    }

    #[test]
    fn test_parse_skips_blank_rows() {
        let dataset = parse_csv("a,b\n,\n1,2\n  ,  \n").unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let err = parse_csv("a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, Error::CsvParse(_)));
    }

    #[tokio::test]
    async fn test_replace_all_semantics() {
        let store = seeded(5);
        let importer = ReplaceAllImporter::new(store.clone());
        let mut progress = Vec::new();

        let summary = importer
            .import_csv(&Credential::user("alice"), "DataStore", CSV, |n| progress.push(n))
            .await
            .unwrap();

        assert_eq!(summary, ImportSummary { previous_count: 5, new_count: 3 });
        assert_eq!(progress, vec![1, 2, 3]);
        assert_eq!(store.len("DataStore"), 3);

        let rows = store
            .find(&Credential::user("alice"), "DataStore", &RecordQuery::new())
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().filter_map(|r| r.get_str("ID")).collect();
        assert_eq!(ids, vec!["7", "8", "9"]);
    }

    #[tokio::test]
    async fn test_parse_error_performs_no_mutation() {
        let flaky = Arc::new(FlakyRecordStore::new(seeded(4)));
        let importer = ReplaceAllImporter::new(flaky.clone());

        let err = importer
            .import_csv(&Credential::user("alice"), "DataStore", "a,b\n1\n", |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CsvParse(_)));
        assert!(flaky.calls().is_empty());
        assert_eq!(flaky.count(&Credential::user("alice"), "DataStore").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_partial_failure_stops_at_failing_row() {
        let store = seeded(0);
        let flaky = Arc::new(FlakyRecordStore::new(store.clone()).fail_create_at(2));
        let importer = ReplaceAllImporter::new(flaky.clone());
        let mut progress = Vec::new();

        let err = importer
            .import_csv(&Credential::user("alice"), "DataStore", CSV, |n| progress.push(n))
            .await
            .unwrap_err();

        match err {
            Error::PartialImport { row, completed, cause } => {
                assert_eq!(row, 2);
                assert_eq!(completed, 1);
                assert!(cause.contains("injected failure on create #2"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(progress, vec![1]);
        assert_eq!(flaky.create_calls(), 2);
        assert_eq!(store.len("DataStore"), 1);
    }

    #[tokio::test]
    async fn test_outcome_stream_is_lazy() {
        let store = seeded(2);
        let flaky = Arc::new(FlakyRecordStore::new(store.clone()));
        let importer = ReplaceAllImporter::new(flaky.clone());

        let prepared = importer
            .prepare(&Credential::user("alice"), "DataStore", parse_csv(CSV).unwrap())
            .await
            .unwrap();
        assert_eq!(prepared.total(), 3);
        assert_eq!(prepared.previous_count(), 2);
        assert_eq!(store.len("DataStore"), 0);

        let mut outcomes = prepared.into_outcomes();
        assert_eq!(flaky.create_calls(), 0);

        let first = outcomes.next().await.unwrap();
        assert_eq!(first.row, 1);
        assert!(first.result.is_ok());
        assert_eq!(flaky.create_calls(), 1);

        let rest: Vec<_> = outcomes.collect().await;
        assert_eq!(rest.iter().map(|o| o.row).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_unauthenticated_import_rejected() {
        let flaky = Arc::new(FlakyRecordStore::new(seeded(1)));
        let err = ReplaceAllImporter::new(flaky.clone())
            .import_csv(&Credential::anonymous(), "DataStore", CSV, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));
        assert!(flaky.calls().is_empty());
    }
}
