use super::response::ResponseEnvelope;

/// What the window renders from.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Loaded(ResponseEnvelope),
    Error(String),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    /// `Loaded` and `Error` end a view stream.
    pub fn is_terminal(&self) -> bool {
        !self.is_loading()
    }

    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            ViewState::Loaded(envelope) => Some(envelope),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(reason) => Some(reason),
            _ => None,
        }
    }
}

/// The projector operation a view stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadAll,
    Ping,
    Filter,
    Save,
    Delete,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::LoadAll => "load_all",
            Operation::Ping => "ping",
            Operation::Filter => "filter",
            Operation::Save => "save",
            Operation::Delete => "delete",
        }
    }
}
