//! Update lifecycle states and the events published to the presentation side

use std::fmt;

use crate::download::DownloadProgress;

/// Step of an update run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallationState {
    Idle,
    Preparing,
    Downloading,
    Extracting,
    WritingVersion,
    CreatingShortcut,
    Completed,
    Cancelled,
    Failed(String),
}

impl InstallationState {
    /// Whether the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed(_))
    }

    /// Position along the forward path; terminal branches have none
    fn ordinal(&self) -> Option<u8> {
        match self {
            Self::Idle => Some(0),
            Self::Preparing => Some(1),
            Self::Downloading => Some(2),
            Self::Extracting => Some(3),
            Self::WritingVersion => Some(4),
            Self::CreatingShortcut => Some(5),
            Self::Completed => Some(6),
            Self::Cancelled | Self::Failed(_) => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition
    ///
    /// States advance one step at a time. Cancellation is only observed while
    /// downloading; failure can end any step before shortcut creation.
    pub fn can_transition_to(&self, next: &InstallationState) -> bool {
        match next {
            Self::Cancelled => matches!(self, Self::Downloading),
            Self::Failed(_) => matches!(
                self,
                Self::Preparing | Self::Downloading | Self::Extracting | Self::WritingVersion
            ),
            _ => match (self.ordinal(), next.ordinal()) {
                (Some(from), Some(to)) => to == from + 1,
                _ => false,
            },
        }
    }
}

impl fmt::Display for InstallationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Preparing => write!(f, "preparing"),
            Self::Downloading => write!(f, "downloading"),
            Self::Extracting => write!(f, "extracting"),
            Self::WritingVersion => write!(f, "writing version"),
            Self::CreatingShortcut => write!(f, "creating shortcut"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Notification from the update worker
///
/// The worker never touches presentation state; it publishes these onto a
/// single queue drained by the coordination loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    /// A download chunk was written
    ProgressUpdated(DownloadProgress),

    /// Short user-facing status text
    StatusChanged(String),

    /// The run moved to a new step
    StepTransitioned(InstallationState),

    /// Remote version for display, fetched at startup
    VersionResolved(String),
}
