//! Build requests and the channel carrying them to the orchestrator

use std::sync::mpsc::{self, Receiver, Sender};

use uuid::Uuid;

use crate::{Error, Result};

/// One build to perform: an optional repository scope and, once the build
/// ran, its exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    id: Uuid,
    repository: Option<String>,
    status: Option<i32>,
}

impl BuildRequest {
    pub fn new(repository: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            repository,
            status: None,
        }
    }

    /// Build every repository.
    pub fn all() -> Self {
        Self::new(None)
    }

    pub fn for_repository(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    /// `None` until the build completed.
    pub fn status(&self) -> Option<i32> {
        self.status
    }

    pub fn set_status(&mut self, status: i32) {
        self.status = Some(status);
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }
}

pub(crate) struct QueuedBuild {
    pub(crate) request: BuildRequest,
    pub(crate) reply: Sender<BuildRequest>,
}

/// Sending half of the build channel. Clone it for every producer.
#[derive(Clone)]
pub struct BuildTrigger {
    sender: Sender<QueuedBuild>,
}

/// Receiving half of the build channel, consumed by
/// [`BuildOrchestrator::serve`](super::BuildOrchestrator::serve).
pub struct BuildQueue {
    pub(crate) receiver: Receiver<QueuedBuild>,
}

/// A queued request; [`PendingBuild::wait`] returns it with its status.
#[derive(Debug)]
pub struct PendingBuild {
    id: Uuid,
    reply: Receiver<BuildRequest>,
}

/// Create a connected trigger and queue.
pub fn build_channel() -> (BuildTrigger, BuildQueue) {
    let (sender, receiver) = mpsc::channel();
    (BuildTrigger { sender }, BuildQueue { receiver })
}

impl BuildTrigger {
    /// Queue `request` for the orchestrator.
    pub fn request(&self, request: BuildRequest) -> Result<PendingBuild> {
        let (reply, pending) = mpsc::channel();
        let id = request.id();
        tracing::debug!(%id, repository = ?request.repository(), "build requested");
        self.sender
            .send(QueuedBuild { request, reply })
            .map_err(|_| Error::BuildQueueClosed)?;
        Ok(PendingBuild { id, reply: pending })
    }
}

impl std::fmt::Debug for BuildTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildTrigger").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for BuildQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildQueue").finish_non_exhaustive()
    }
}

impl PendingBuild {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Block until the orchestrator reports back.
    pub fn wait(self) -> Result<BuildRequest> {
        self.reply.recv().map_err(|_| Error::BuildQueueClosed)
    }
}
