//! Reconciliation between the local store and the remote table
//!
//! A sync uploads every local record (upsert keyed by name), reads the whole
//! remote table back, carries the local-only flags over by name, and swaps
//! the local table for the merged set. The remote side wins for every other
//! field. Nothing is retried; a failure before the final swap leaves local
//! data as it was.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::{DockyardError, DockyardResult};
use crate::models::ServiceTemplate;
use crate::remote::{NetworkProbe, RemoteStore, ServiceTemplateDto, SupabaseClient, TcpProbe};
use crate::storage::Storage;

/// Remote store plus the probe that gates it
#[derive(Clone)]
pub struct RemoteHandle {
    store: Arc<dyn RemoteStore>,
    probe: Arc<dyn NetworkProbe>,
}

impl RemoteHandle {
    pub fn new(store: Arc<dyn RemoteStore>, probe: Arc<dyn NetworkProbe>) -> Self {
        Self { store, probe }
    }

    /// Build the Supabase client and TCP probe described by the settings
    pub fn from_settings(settings: &Settings) -> DockyardResult<Self> {
        let client = SupabaseClient::new(&settings.remote)?;
        let probe = TcpProbe::from_settings(&settings.remote).ok_or_else(|| {
            DockyardError::Config(format!(
                "Remote URL has no host to connect to: '{}'",
                settings.remote.url
            ))
        })?;

        Ok(Self::new(Arc::new(client), Arc::new(probe)))
    }
}

/// Counts from a finished sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub uploaded: usize,
    pub downloaded: usize,
    /// Downloaded records that picked up flags from a same-named local record
    pub matched: usize,
}

/// Copy favorite/last-used from same-named local records onto remote rows
///
/// When several local records share a name, the most recently inserted one
/// (first in `local`) provides the flags.
pub fn merge_remote(
    remote: Vec<ServiceTemplateDto>,
    local: &[ServiceTemplate],
) -> (Vec<ServiceTemplate>, usize) {
    let mut flags: HashMap<&str, (bool, i64)> = HashMap::with_capacity(local.len());
    for template in local {
        flags
            .entry(template.name.as_str())
            .or_insert((template.is_favorite, template.last_used));
    }

    let mut matched = 0;
    let merged = remote
        .into_iter()
        .map(|row| {
            let name = row.name.as_deref().unwrap_or_default();
            match flags.get(name) {
                Some(&(favorite, last_used)) => {
                    matched += 1;
                    row.into_template(favorite, last_used)
                }
                None => row.into_template(false, 0),
            }
        })
        .collect();

    (merged, matched)
}

/// Service for moving templates between the local and remote stores
pub struct SyncService<'a> {
    storage: &'a Storage,
    remote: &'a RemoteHandle,
}

impl<'a> SyncService<'a> {
    pub fn new(storage: &'a Storage, remote: &'a RemoteHandle) -> Self {
        Self { storage, remote }
    }

    async fn ensure_network(&self) -> DockyardResult<()> {
        if self.remote.probe.is_available().await {
            Ok(())
        } else {
            warn!("Network unavailable, skipping remote call");
            Err(DockyardError::NetworkUnavailable)
        }
    }

    /// Upload every local template (upsert by name)
    pub async fn upload(&self) -> DockyardResult<usize> {
        self.ensure_network().await?;
        let local = self.storage.templates.get_all()?;
        self.upload_rows(&local).await
    }

    async fn upload_rows(&self, local: &[ServiceTemplate]) -> DockyardResult<usize> {
        if local.is_empty() {
            return Ok(0);
        }

        // one row per name, or the conflict target is hit twice in one statement
        let mut seen = HashSet::new();
        let rows: Vec<ServiceTemplateDto> = local
            .iter()
            .filter(|t| seen.insert(t.name.as_str()))
            .map(ServiceTemplateDto::from_template)
            .collect();
        if rows.len() < local.len() {
            warn!(
                skipped = local.len() - rows.len(),
                "Skipping older local templates with duplicate names"
            );
        }

        self.remote.store.upsert(&rows).await.inspect_err(|e| {
            error!(error = %e, "Failed to upload templates");
        })?;

        info!(count = rows.len(), "Uploaded templates");
        Ok(rows.len())
    }

    /// Replace local templates with the remote table, keeping local flags
    pub async fn download(&self) -> DockyardResult<SyncReport> {
        self.ensure_network().await?;
        let local = self.storage.templates.get_all()?;
        self.download_and_merge(&local).await
    }

    async fn download_and_merge(&self, local: &[ServiceTemplate]) -> DockyardResult<SyncReport> {
        let remote = self.remote.store.list().await.inspect_err(|e| {
            error!(error = %e, "Failed to download templates");
        })?;

        let (merged, matched) = merge_remote(remote, local);
        let downloaded = merged.len();
        self.storage.templates.replace_all(merged)?;

        info!(downloaded, matched, "Downloaded templates");
        Ok(SyncReport {
            uploaded: 0,
            downloaded,
            matched,
        })
    }

    /// Full reconciliation: upload, download, merge, replace
    pub async fn sync(&self) -> DockyardResult<SyncReport> {
        let result = self.run_sync().await;
        if let Err(e) = &result {
            error!(error = %e, "Sync failed");
        }
        result
    }

    async fn run_sync(&self) -> DockyardResult<SyncReport> {
        self.ensure_network().await?;

        let local = self.storage.templates.get_all()?;
        let uploaded = self.upload_rows(&local).await?;
        let report = self.download_and_merge(&local).await?;

        info!(uploaded, downloaded = report.downloaded, "Sync completed");
        Ok(SyncReport {
            uploaded,
            ..report
        })
    }

    /// Verify the remote store answers, returning its row count
    pub async fn check_connection(&self) -> DockyardResult<usize> {
        self.ensure_network().await?;
        let rows = self.remote.store.list().await?;
        Ok(rows.len())
    }

    /// Upsert a single template
    pub async fn push_one(&self, template: &ServiceTemplate) -> DockyardResult<()> {
        self.ensure_network().await?;
        let row = ServiceTemplateDto::from_template(template);
        self.remote.store.upsert(std::slice::from_ref(&row)).await
    }

    /// Push a saved template, logging instead of failing
    ///
    /// The local save has already succeeded; the next full sync picks up
    /// anything that could not be pushed here.
    pub async fn push_best_effort(&self, template: &ServiceTemplate) -> bool {
        match self.push_one(template).await {
            Ok(()) => {
                info!(name = %template.name, "Template pushed to remote");
                true
            }
            Err(e) => {
                warn!(name = %template.name, error = %e, "Template kept local only");
                false
            }
        }
    }

    /// Delete the remote copy of a template by its remote id
    ///
    /// Returns `false` without contacting the remote store when the template
    /// has never been downloaded and so has no remote id.
    pub async fn delete_remote(&self, template: &ServiceTemplate) -> DockyardResult<bool> {
        let Some(remote_id) = template.remote_id else {
            return Ok(false);
        };

        self.ensure_network().await?;
        self.remote.store.delete(remote_id).await?;
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory remote store and switchable probe

    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryRemote {
        pub rows: Mutex<Vec<ServiceTemplateDto>>,
        pub calls: AtomicUsize,
        pub fail: AtomicBool,
        next_id: AtomicUsize,
    }

    impl MemoryRemote {
        pub fn with_rows(rows: Vec<ServiceTemplateDto>) -> Self {
            let remote = Self::default();
            for mut row in rows {
                row.id = Some(remote.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 100);
                remote.rows.lock().unwrap().push(row);
            }
            remote
        }

        pub fn names(&self) -> Vec<String> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .filter_map(|r| r.name.clone())
                .collect()
        }

        fn enter(&self) -> DockyardResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(DockyardError::RemoteStatus {
                    status: 500,
                    body: "boom".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl RemoteStore for MemoryRemote {
        async fn list(&self) -> DockyardResult<Vec<ServiceTemplateDto>> {
            self.enter()?;
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn upsert(&self, rows: &[ServiceTemplateDto]) -> DockyardResult<()> {
            self.enter()?;
            let mut names = HashSet::new();
            if !rows.iter().all(|r| names.insert(r.name.clone())) {
                return Err(DockyardError::RemoteStatus {
                    status: 500,
                    body: "ON CONFLICT DO UPDATE command cannot affect row a second time".into(),
                });
            }

            let mut stored = self.rows.lock().unwrap();
            for row in rows {
                match stored.iter_mut().find(|r| r.name == row.name) {
                    Some(existing) => {
                        let id = existing.id;
                        *existing = row.clone();
                        existing.id = id;
                    }
                    None => {
                        let mut row = row.clone();
                        row.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 100);
                        stored.push(row);
                    }
                }
            }
            Ok(())
        }

        async fn delete(&self, remote_id: i64) -> DockyardResult<()> {
            self.enter()?;
            self.rows
                .lock()
                .unwrap()
                .retain(|r| r.id != Some(remote_id));
            Ok(())
        }
    }

    pub struct SwitchProbe(pub AtomicBool);

    impl SwitchProbe {
        pub fn new(online: bool) -> Self {
            Self(AtomicBool::new(online))
        }
    }

    #[async_trait]
    impl NetworkProbe for SwitchProbe {
        async fn is_available(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    pub fn remote_row(name: &str, image: &str) -> ServiceTemplateDto {
        ServiceTemplateDto {
            name: Some(name.into()),
            image: Some(image.into()),
            ..Default::default()
        }
    }
}
