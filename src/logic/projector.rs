//! Turns remote calls into view-state streams.
//!
//! Every operation hands back a fresh [`ViewStream`]. `Loading` is queued on
//! it before the call is spawned, and exactly one terminal value (`Loaded`
//! or `Error`) follows once the call settles. Successful calls patch the
//! [`SnapshotStore`] first, so a terminal `Loaded` never runs ahead of the
//! store. Failures are reported through the [`Notifier`] and never go
//! further than the stream.

use super::api::{NOTHING_LOADED, ServerApi};
use super::error::RemoteCallFailure;
use super::notifier::Notifier;
use super::store::SnapshotStore;
use crate::model::{Operation, ServerDraft, Snapshot, StatusFilter, ViewState};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// View states produced by one operation invocation.
#[derive(Debug)]
pub struct ViewStream {
    operation: Operation,
    receiver: mpsc::UnboundedReceiver<ViewState>,
}

impl ViewStream {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Next value if one is already queued. Never blocks.
    pub fn try_next(&mut self) -> Option<ViewState> {
        self.receiver.try_recv().ok()
    }

    /// Waits for the next value; `None` once the stream is finished.
    pub async fn next(&mut self) -> Option<ViewState> {
        self.receiver.recv().await
    }

    /// Waits for the whole stream.
    pub async fn collect(mut self) -> Vec<ViewState> {
        let mut states = Vec::new();
        while let Some(state) = self.next().await {
            states.push(state);
        }
        states
    }
}

type RepaintHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct Projector {
    api: Arc<dyn ServerApi>,
    notifier: Arc<dyn Notifier>,
    store: Arc<SnapshotStore>,
    runtime: Handle,
    on_settle: Option<RepaintHook>,
}

impl Projector {
    pub fn new(
        api: Arc<dyn ServerApi>,
        notifier: Arc<dyn Notifier>,
        store: Arc<SnapshotStore>,
        runtime: Handle,
    ) -> Self {
        Self {
            api,
            notifier,
            store,
            runtime,
            on_settle: None,
        }
    }

    /// Called after every terminal value, e.g. to wake the UI.
    pub fn with_settle_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_settle = Some(Arc::new(hook));
        self
    }

    /// Same store and notifier, different backend.
    pub fn with_api(&self, api: Arc<dyn ServerApi>) -> Self {
        Self {
            api,
            ..self.clone()
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    fn launch<F>(&self, operation: Operation, call: F) -> ViewStream
    where
        F: Future<Output = ViewState> + Send + 'static,
    {
        let (tx, receiver) = mpsc::unbounded_channel();
        // The receiver is alive here, so this cannot fail
        let _ = tx.send(ViewState::Loading);

        let on_settle = self.on_settle.clone();
        self.runtime.spawn(async move {
            let terminal = call.await;
            // A dropped stream just means nobody is watching anymore
            let _ = tx.send(terminal);
            if let Some(hook) = on_settle {
                hook();
            }
        });

        ViewStream {
            operation,
            receiver,
        }
    }

    /// Fetches the whole collection and stores it most-recent-first.
    pub fn load_all(&self) -> ViewStream {
        debug!(op = Operation::LoadAll.name(), "requesting server list");
        let (api, notifier, store) = self.parts();

        self.launch(Operation::LoadAll, async move {
            match api.list_servers().await {
                Ok(envelope) => {
                    let snapshot = Snapshot::from_envelope(envelope).reversed();
                    store.replace(snapshot.clone());
                    notifier.notify_success(&snapshot.envelope().message);
                    ViewState::Loaded(snapshot.envelope().clone())
                }
                Err(failure) => settle_failure(Operation::LoadAll, notifier.as_ref(), failure),
            }
        })
    }

    /// Pings one server and swaps its record in the snapshot. The address
    /// stays highlighted until the call settles.
    pub fn ping(&self, address: &str) -> ViewStream {
        debug!(op = Operation::Ping.name(), %address, "pinging server");
        let (api, notifier, store) = self.parts();
        let address = address.to_string();
        store.set_highlighted(&address);

        self.launch(Operation::Ping, async move {
            let outcome = api.ping_server(&address).await.and_then(|envelope| {
                let record = envelope
                    .server()
                    .cloned()
                    .ok_or_else(|| RemoteCallFailure::new("Ping response carried no server"))?;
                let snapshot = store
                    .patch(|s| s.with_replaced(record))
                    .ok_or_else(|| RemoteCallFailure::new(NOTHING_LOADED))?;
                Ok((envelope, snapshot))
            });
            store.clear_highlighted(&address);

            match outcome {
                Ok((envelope, snapshot)) => {
                    notifier.notify_info(&envelope.message);
                    ViewState::Loaded(snapshot.envelope().clone())
                }
                Err(failure) => settle_failure(Operation::Ping, notifier.as_ref(), failure),
            }
        })
    }

    /// Shows the filtered view. The snapshot is left alone.
    pub fn filter_by_status(&self, filter: StatusFilter) -> ViewStream {
        debug!(op = Operation::Filter.name(), filter = filter.label(), "filtering servers");
        let (api, notifier, store) = self.parts();
        let snapshot = store.snapshot();

        self.launch(Operation::Filter, async move {
            match api.filter_servers(filter, snapshot.as_ref()).await {
                Ok(envelope) => {
                    notifier.notify_info(&envelope.message);
                    ViewState::Loaded(envelope)
                }
                Err(failure) => settle_failure(Operation::Filter, notifier.as_ref(), failure),
            }
        })
    }

    /// Creates a server and puts it first in the snapshot. The store is
    /// busy until the call settles.
    pub fn save(&self, draft: ServerDraft) -> ViewStream {
        debug!(op = Operation::Save.name(), address = %draft.address, "creating server");
        let (api, notifier, store) = self.parts();
        store.begin_busy();

        self.launch(Operation::Save, async move {
            let outcome = api.create_server(&draft).await.and_then(|envelope| {
                let record = envelope
                    .server()
                    .cloned()
                    .ok_or_else(|| RemoteCallFailure::new("Save response carried no server"))?;
                let snapshot = store.patch_or_seed(
                    |s| s.with_prepended(record.clone()).retagged(&envelope),
                    || Snapshot::from_envelope(envelope.with_servers(vec![record.clone()])),
                );
                Ok((envelope, snapshot))
            });
            store.end_busy();

            match outcome {
                Ok((envelope, snapshot)) => {
                    notifier.notify_success(&envelope.message);
                    ViewState::Loaded(snapshot.envelope().clone())
                }
                Err(failure) => settle_failure(Operation::Save, notifier.as_ref(), failure),
            }
        })
    }

    /// Deletes a server and drops it from the snapshot.
    pub fn delete(&self, id: u64) -> ViewStream {
        debug!(op = Operation::Delete.name(), id, "deleting server");
        let (api, notifier, store) = self.parts();

        self.launch(Operation::Delete, async move {
            let outcome = api.delete_server(id).await.and_then(|envelope| {
                let snapshot = store
                    .patch(|s| s.without(id).retagged(&envelope))
                    .ok_or_else(|| RemoteCallFailure::new(NOTHING_LOADED))?;
                Ok((envelope, snapshot))
            });

            match outcome {
                Ok((envelope, snapshot)) => {
                    notifier.notify_info(&envelope.message);
                    ViewState::Loaded(snapshot.envelope().clone())
                }
                Err(failure) => settle_failure(Operation::Delete, notifier.as_ref(), failure),
            }
        })
    }

    fn parts(&self) -> (Arc<dyn ServerApi>, Arc<dyn Notifier>, Arc<SnapshotStore>) {
        (
            self.api.clone(),
            self.notifier.clone(),
            self.store.clone(),
        )
    }
}

fn settle_failure(op: Operation, notifier: &dyn Notifier, failure: RemoteCallFailure) -> ViewState {
    warn!(op = op.name(), error = %failure, "remote call failed");
    notifier.notify_error(failure.reason());
    ViewState::Error(failure.into_reason())
}

#[cfg(test)]
#[path = "projector_tests.rs"]
mod tests;
