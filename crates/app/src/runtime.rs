//! Per-entry runtime: one task per configuration entry owning its
//! coordinator, fed by a command channel and the host event stream.
//!
//! The task serialises everything — host events, timer firings, and service
//! calls — so coordinator state never observes concurrent mutation. Entries
//! run independently of each other.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{error, warn};

use zonehub_domain::error::{CommandError, NotFoundError, ZoneHubError};
use zonehub_domain::id::EntryId;
use zonehub_domain::snapshot::StateChange;
use zonehub_domain::time::{Timestamp, now};

use crate::coordinator::Coordinator;
use crate::ports::{
    ClimateCommands, ControlService, Notifier, StateProvider, StateStore, VentCommands,
};
use crate::status::EntryStatus;

/// Service calls delivered to an entry task.
pub enum EntryCommand {
    Pause(oneshot::Sender<()>),
    Resume(oneshot::Sender<()>),
    Recalculate(oneshot::Sender<()>),
    Status(oneshot::Sender<EntryStatus>),
}

/// Client side of one entry task.
#[derive(Clone)]
pub struct EntryHandle {
    id: EntryId,
    commands: mpsc::Sender<EntryCommand>,
}

impl EntryHandle {
    #[must_use]
    pub fn new(id: EntryId, commands: mpsc::Sender<EntryCommand>) -> Self {
        Self { id, commands }
    }

    async fn request<T>(
        &self,
        service: &'static str,
        make: impl FnOnce(oneshot::Sender<T>) -> EntryCommand,
    ) -> Result<T, ZoneHubError> {
        let (reply, response) = oneshot::channel();
        let task_gone = |reason: &str| -> ZoneHubError {
            CommandError {
                entity: self.id.to_string(),
                service,
                reason: reason.to_string(),
            }
            .into()
        };
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| task_gone("entry task stopped"))?;
        response.await.map_err(|_| task_gone("entry task dropped reply"))
    }
}

/// Registry of entry handles; the daemon's [`ControlService`].
#[derive(Default)]
pub struct EntryRegistry {
    entries: HashMap<String, EntryHandle>,
}

impl EntryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: EntryHandle) {
        self.entries.insert(handle.id.to_string(), handle);
    }

    fn get(&self, entry: &EntryId) -> Result<&EntryHandle, ZoneHubError> {
        self.entries.get(entry.as_str()).ok_or_else(|| {
            NotFoundError {
                kind: "Entry",
                id: entry.to_string(),
            }
            .into()
        })
    }
}

impl ControlService for EntryRegistry {
    fn pause(&self, entry: &EntryId) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
        async move {
            self.get(entry)?.request("pause", EntryCommand::Pause).await
        }
    }

    fn resume(&self, entry: &EntryId) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
        async move {
            self.get(entry)?
                .request("resume", EntryCommand::Resume)
                .await
        }
    }

    fn recalculate(
        &self,
        entry: &EntryId,
    ) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
        async move {
            self.get(entry)?
                .request("recalculate", EntryCommand::Recalculate)
                .await
        }
    }

    fn status(
        &self,
        entry: &EntryId,
    ) -> impl Future<Output = Result<EntryStatus, ZoneHubError>> + Send {
        async move {
            self.get(entry)?
                .request("status", EntryCommand::Status)
                .await
        }
    }

    fn entries(&self) -> impl Future<Output = Vec<EntryId>> + Send {
        let mut ids: Vec<EntryId> = self
            .entries
            .values()
            .map(|handle| handle.id.clone())
            .collect();
        ids.sort();
        async move { ids }
    }
}

/// Run one entry's control loop until its command channel closes, then
/// persist state.
pub async fn run_entry<S, C, V, N, P>(
    mut coordinator: Coordinator<S, C, V, N, P>,
    mut commands: mpsc::Receiver<EntryCommand>,
    mut events: broadcast::Receiver<StateChange>,
) where
    S: StateProvider,
    C: ClimateCommands,
    V: VentCommands,
    N: Notifier,
    P: StateStore,
{
    coordinator.setup(now()).await;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None => break,
                Some(EntryCommand::Pause(reply)) => {
                    coordinator.pause(now()).await;
                    let _ = reply.send(());
                }
                Some(EntryCommand::Resume(reply)) => {
                    coordinator.resume(now()).await;
                    let _ = reply.send(());
                }
                Some(EntryCommand::Recalculate(reply)) => {
                    coordinator.recalculate(now()).await;
                    let _ = reply.send(());
                }
                Some(EntryCommand::Status(reply)) => {
                    let _ = reply.send(coordinator.status(now()).await);
                }
            },
            event = events.recv() => match event {
                Ok(change) => coordinator.handle_change(&change, now()).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // we lost event delivery; recompute from current inputs
                    warn!(entry = %coordinator.entry_id(), skipped, "event stream lagged, recalculating");
                    coordinator.recalculate(now()).await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            () = wait_until(coordinator.next_deadline()) => {
                let fired_at = now();
                for key in coordinator.due_timers(fired_at) {
                    coordinator.handle_timer(key, fired_at).await;
                }
            }
        }
    }

    if let Err(err) = coordinator.shutdown(now()).await {
        error!(entry = %coordinator.entry_id(), error = %err, "failed to persist state on shutdown");
    }
}

/// Sleep until `deadline`; pend forever when there is none.
async fn wait_until(deadline: Option<Timestamp>) {
    match deadline {
        Some(deadline) => {
            let wait = (deadline - now())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);
            tokio::time::sleep(wait).await;
        }
        None => std::future::pending().await,
    }
}
