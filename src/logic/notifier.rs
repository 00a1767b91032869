use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Fire-and-forget user notifications.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, text: &str);
    fn notify_error(&self, text: &str);
    fn notify_info(&self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
    pub created: Instant,
}

const MAX_TOASTS: usize = 5;
const TOAST_LIFETIME: Duration = Duration::from_secs(4);

/// Notifier backing the toast stack in the bottom-right corner.
#[derive(Debug, Clone, Default)]
pub struct ToastNotifier {
    toasts: Arc<Mutex<VecDeque<Toast>>>,
}

impl ToastNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Toast>> {
        self.toasts.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, kind: ToastKind, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut toasts = self.queue();
        toasts.push_back(Toast {
            kind,
            text: text.to_string(),
            created: Instant::now(),
        });
        while toasts.len() > MAX_TOASTS {
            toasts.pop_front();
        }
    }

    /// Toasts younger than the lifetime, oldest first. Expired ones are dropped.
    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Instant::now())
    }

    fn active_at(&self, now: Instant) -> Vec<Toast> {
        let mut toasts = self.queue();
        toasts.retain(|t| now.saturating_duration_since(t.created) < TOAST_LIFETIME);
        toasts.iter().cloned().collect()
    }

    pub fn dismiss_all(&self) {
        self.queue().clear();
    }
}

impl Notifier for ToastNotifier {
    fn notify_success(&self, text: &str) {
        info!(kind = "success", "{text}");
        self.push(ToastKind::Success, text);
    }

    fn notify_error(&self, text: &str) {
        error!(kind = "error", "{text}");
        self.push(ToastKind::Error, text);
    }

    fn notify_info(&self, text: &str) {
        info!(kind = "info", "{text}");
        self.push(ToastKind::Info, text);
    }
}
