use super::error::ExportError;
use super::export_result::ExportReport;

/// Export state machine.
///
/// State transitions:
/// ```text
/// idle → formats built → container open → streaming → completed
///   ↓          ↓               ↓              ↓
///   └──────────┴───────────→ failed ←─────────┘
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ExportState {
    Idle,
    FormatsBuilt,
    ContainerOpen,
    Streaming { frames_written: u64, total_frames: u64 },
    Completed(Box<ExportReport>),
    Failed(ExportError),
}

impl ExportState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    /// Whether an export is between `Idle` and a terminal state.
    pub fn is_busy(&self) -> bool {
        !self.is_idle() && !self.is_terminal()
    }

    /// Fraction of frames written, if streaming or done.
    pub fn progress(&self) -> Option<f64> {
        match self {
            Self::Streaming { total_frames: 0, .. } => Some(0.0),
            Self::Streaming {
                frames_written,
                total_frames,
            } => Some(*frames_written as f64 / *total_frames as f64),
            Self::Completed(_) => Some(1.0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!ExportState::Idle.is_terminal());
        assert!(!ExportState::ContainerOpen.is_terminal());
        assert!(ExportState::Failed(ExportError::ContainerCreate("x".into())).is_terminal());
    }

    #[test]
    fn busy_between_idle_and_terminal() {
        assert!(!ExportState::Idle.is_busy());
        assert!(ExportState::FormatsBuilt.is_busy());
        assert!(ExportState::Streaming {
            frames_written: 0,
            total_frames: 10
        }
        .is_busy());
        assert!(!ExportState::Failed(ExportError::Storage("x".into())).is_busy());
    }

    #[test]
    fn streaming_progress() {
        let state = ExportState::Streaming {
            frames_written: 8192,
            total_frames: 16384,
        };
        assert_eq!(state.progress(), Some(0.5));
        assert_eq!(ExportState::Idle.progress(), None);
    }
}
