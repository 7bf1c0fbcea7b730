//! Live queries over the template repository
//!
//! A `LiveQuery` yields its result once right away and again after every
//! committed mutation of the repository. Mutations that land while the
//! consumer is busy are coalesced into one re-emission.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::DockyardResult;
use crate::models::ServiceTemplate;

use super::templates::TemplateRepository;

/// Which query a `LiveQuery` re-runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    All,
    Search(String),
}

/// Subscription to a repository query
pub struct LiveQuery {
    repo: Arc<TemplateRepository>,
    revisions: watch::Receiver<u64>,
    kind: QueryKind,
    emitted: bool,
}

impl LiveQuery {
    pub(crate) fn new(
        repo: Arc<TemplateRepository>,
        revisions: watch::Receiver<u64>,
        kind: QueryKind,
    ) -> Self {
        Self {
            repo,
            revisions,
            kind,
            emitted: false,
        }
    }

    pub fn kind(&self) -> &QueryKind {
        &self.kind
    }

    /// Run the query against the current repository state
    pub fn current(&self) -> DockyardResult<Vec<ServiceTemplate>> {
        match &self.kind {
            QueryKind::All => self.repo.get_all(),
            QueryKind::Search(query) => self.repo.search(query),
        }
    }

    /// Wait for the next result
    ///
    /// The first call returns immediately. Returns `None` once the
    /// repository's revision channel is closed.
    pub async fn next(&mut self) -> Option<DockyardResult<Vec<ServiceTemplate>>> {
        if self.emitted {
            self.revisions.changed().await.ok()?;
        }
        self.revisions.borrow_and_update();
        self.emitted = true;
        Some(self.current())
    }
}
