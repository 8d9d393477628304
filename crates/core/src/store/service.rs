//! Structure store implementation using Apache OpenDAL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opendal::{ErrorKind, Operator, services};
use reportree_shared::types::{ReportLineId, ReportTemplateId};
use reportree_shared::{StoreConfig, StoreProvider};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::error::StoreError;
use super::record::ReportLineRecord;

/// Persistence seam of the structure editor.
///
/// Implementations must tolerate concurrent `delete_line` calls for lines of
/// the same report.
#[async_trait]
pub trait StructureStore: Send + Sync {
    /// Loads every persisted line of a report. Unknown reports load empty.
    async fn load_structure(
        &self,
        report_id: ReportTemplateId,
    ) -> Result<Vec<ReportLineRecord>, StoreError>;

    /// Replaces the persisted structure of a report with `lines`.
    async fn save_structure(
        &self,
        report_id: ReportTemplateId,
        lines: Vec<ReportLineRecord>,
    ) -> Result<(), StoreError>;

    /// Deletes one persisted line. Deleting an unknown line succeeds.
    async fn delete_line(
        &self,
        report_id: ReportTemplateId,
        line_id: ReportLineId,
    ) -> Result<(), StoreError>;
}

/// Stored document holding one report structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDocument {
    /// Report the lines belong to.
    pub report_id: ReportTemplateId,
    /// When the document was last written.
    pub saved_at: DateTime<Utc>,
    /// Persisted lines in tree order.
    pub lines: Vec<ReportLineRecord>,
}

/// Structure store writing one JSON document per report.
pub struct OpendalStructureStore {
    operator: Operator,
    config: StoreConfig,
    write_lock: Mutex<()>,
}

impl OpendalStructureStore {
    /// Create a new store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StoreConfig) -> Result<Self, StoreError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self {
            operator,
            config,
            write_lock: Mutex::new(()),
        })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StoreProvider) -> Result<Operator, StoreError> {
        let operator = match provider {
            StoreProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StoreError::configuration(e.to_string()))?
                .finish(),
            StoreProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StoreError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StoreError::configuration(e.to_string()))?
                    .finish()
            }
            StoreProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StoreError::configuration(e.to_string()))?
                    .finish()
            }
        };
        Ok(operator)
    }

    /// Storage key of a report's document.
    ///
    /// Format: `{prefix}/{report_id}.json`
    #[must_use]
    pub fn document_key(&self, report_id: ReportTemplateId) -> String {
        let prefix = self.config.prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{report_id}.json")
        } else {
            format!("{prefix}/{report_id}.json")
        }
    }

    /// Reads a report's document, if one was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the document is malformed.
    pub async fn read_document(
        &self,
        report_id: ReportTemplateId,
    ) -> Result<Option<StructureDocument>, StoreError> {
        let key = self.document_key(report_id);
        match self.operator.read(&key).await {
            Ok(buffer) => Ok(Some(serde_json::from_slice(&buffer.to_vec())?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, document: &StructureDocument) -> Result<(), StoreError> {
        let key = self.document_key(document.report_id);
        let body = serde_json::to_vec_pretty(document)?;
        self.operator.write(&key, body).await?;
        debug!(%key, lines = document.lines.len(), "structure document written");
        Ok(())
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait]
impl StructureStore for OpendalStructureStore {
    async fn load_structure(
        &self,
        report_id: ReportTemplateId,
    ) -> Result<Vec<ReportLineRecord>, StoreError> {
        Ok(self
            .read_document(report_id)
            .await?
            .map(|document| document.lines)
            .unwrap_or_default())
    }

    async fn save_structure(
        &self,
        report_id: ReportTemplateId,
        lines: Vec<ReportLineRecord>,
    ) -> Result<(), StoreError> {
        if let Some(line) = lines.iter().find(|line| line.report_id != report_id) {
            return Err(StoreError::invalid_record(
                line.id,
                format!("belongs to report {}", line.report_id),
            ));
        }

        debug!(%report_id, lines = lines.len(), "saving structure");
        let _guard = self.write_lock.lock().await;
        self.write_document(&StructureDocument {
            report_id,
            saved_at: Utc::now(),
            lines,
        })
        .await
    }

    async fn delete_line(
        &self,
        report_id: ReportTemplateId,
        line_id: ReportLineId,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let Some(mut document) = self.read_document(report_id).await? else {
            return Ok(());
        };

        let before = document.lines.len();
        document.lines.retain(|line| line.id != line_id);
        if document.lines.len() == before {
            return Ok(());
        }

        debug!(%report_id, %line_id, "persisted line deleted");
        document.saved_at = Utc::now();
        self.write_document(&document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{LineType, ReportLine};
    use futures::future::try_join_all;

    fn memory_store() -> OpendalStructureStore {
        OpendalStructureStore::from_config(StoreConfig::default()).expect("memory store")
    }

    fn records(report_id: ReportTemplateId, names: &[&str]) -> Vec<ReportLineRecord> {
        names
            .iter()
            .enumerate()
            .map(|(order, name)| {
                let line = ReportLine::new(report_id, None, *name, order).with_type(LineType::Header);
                ReportLineRecord::from_line(&line).expect("record")
            })
            .collect()
    }

    #[test]
    fn test_document_key() {
        let store = memory_store();
        let report_id = ReportTemplateId::new();
        assert_eq!(
            store.document_key(report_id),
            format!("structures/{report_id}.json")
        );

        let bare = OpendalStructureStore::from_config(StoreConfig::default().with_prefix("/"))
            .expect("memory store");
        assert_eq!(bare.document_key(report_id), format!("{report_id}.json"));
        assert_eq!(bare.provider_name(), "memory");
    }

    #[tokio::test]
    async fn test_unknown_report_loads_empty() {
        let store = memory_store();
        let loaded = store.load_structure(ReportTemplateId::new()).await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = memory_store();
        let report_id = ReportTemplateId::new();
        let lines = records(report_id, &["Receita", "Custos"]);

        store.save_structure(report_id, lines.clone()).await.unwrap();

        assert_eq!(store.load_structure(report_id).await.unwrap(), lines);
        let document = store.read_document(report_id).await.unwrap().unwrap();
        assert_eq!(document.report_id, report_id);
    }

    #[tokio::test]
    async fn test_save_rejects_foreign_lines() {
        let store = memory_store();
        let lines = records(ReportTemplateId::new(), &["Receita"]);

        let err = store
            .save_structure(ReportTemplateId::new(), lines)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_deletes_all_apply() {
        let store = memory_store();
        let report_id = ReportTemplateId::new();
        let lines = records(report_id, &["A", "B", "C", "D"]);
        store.save_structure(report_id, lines.clone()).await.unwrap();

        try_join_all(
            lines[..3]
                .iter()
                .map(|line| store.delete_line(report_id, line.id)),
        )
        .await
        .unwrap();

        let remaining = store.load_structure(report_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "D");
    }

    #[tokio::test]
    async fn test_delete_unknown_line_is_noop() {
        let store = memory_store();
        let report_id = ReportTemplateId::new();
        store
            .delete_line(report_id, ReportLineId::new())
            .await
            .unwrap();
        assert!(store.read_document(report_id).await.unwrap().is_none());
    }
}
