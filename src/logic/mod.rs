pub mod api;
pub mod error;
pub mod notifier;
pub mod projector;
pub mod report;
pub mod store;

pub use api::{HttpServerApi, ServerApi};
pub use error::{RemoteCallFailure, ReportError};
pub use notifier::{Notifier, Toast, ToastKind, ToastNotifier};
pub use projector::{Projector, ViewStream};
pub use store::SnapshotStore;
