//! User-visible notifications: toasts, the page banner and page status.

use crate::error::DashboardError;

/// Toast flavour
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    /// Neutral information
    Info,
    /// An action succeeded
    Success,
    /// Input was adjusted or data is partial
    Warning,
    /// An action failed
    Error,
}

/// Navigation offered from a toast
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    /// Jump to the bookings list
    ViewBookings,
}

/// A transient notification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    /// Identifier used to dismiss the toast
    pub id: u64,
    /// Flavour
    pub kind: ToastKind,
    /// Text shown to the user
    pub message: String,
    /// Optional navigation
    pub shortcut: Option<Shortcut>,
}

/// Most toasts kept visible; older ones are dropped first
pub const MAX_TOASTS: usize = 20;

/// Queue of visible toasts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Notifications {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl Notifications {
    /// Show a toast and return its ID
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>, shortcut: Option<Shortcut>) -> u64 {
        self.next_id += 1;
        self.toasts.push(Toast {
            id: self.next_id,
            kind,
            message: message.into(),
            shortcut,
        });
        if self.toasts.len() > MAX_TOASTS {
            let overflow = self.toasts.len() - MAX_TOASTS;
            self.toasts.drain(..overflow);
        }
        self.next_id
    }

    /// Remove a toast; returns whether it was visible
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        self.toasts.len() != before
    }

    /// Visible toasts, oldest first
    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Most recent toast
    #[must_use]
    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    /// Visible toasts of one kind
    pub fn of_kind(&self, kind: ToastKind) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().filter(move |toast| toast.kind == kind)
    }
}

/// Dismissible inline banner for page-level failures
#[derive(Clone, Debug, PartialEq)]
pub struct Banner {
    /// Text shown to the user
    pub message: String,
    /// Underlying error
    pub error: DashboardError,
}

impl From<DashboardError> for Banner {
    fn from(error: DashboardError) -> Self {
        Self {
            message: error.to_string(),
            error,
        }
    }
}

/// Loading state of the dashboard page
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PageStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A load is in flight
    Loading,
    /// Data is shown
    Ready,
    /// Full-page error with a retry control
    Failed {
        /// What went wrong
        error: DashboardError,
    },
}

impl PageStatus {
    /// Whether the retry control should be shown
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
