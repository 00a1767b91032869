pub mod response;
pub mod server;
pub mod settings;
pub mod snapshot;
pub mod view_state;

pub use response::{ResponseData, ResponseEnvelope};
pub use server::{DraftError, ServerDraft, ServerRecord, ServerStatus, StatusFilter};
pub use settings::AppSettings;
pub use snapshot::Snapshot;
pub use view_state::{Operation, ViewState};
