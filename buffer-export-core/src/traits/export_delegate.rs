use crate::models::error::ExportError;
use crate::models::export_result::ExportReport;
use crate::models::state::ExportState;

/// Event delegate for export notifications.
///
/// All methods are called on the thread running the export.
/// Implementations should marshal to a UI thread if needed.
pub trait ExportDelegate: Send + Sync {
    /// Called when the exporter state changes.
    fn on_state_changed(&self, state: &ExportState);

    /// Called after each block is written.
    fn on_progress(&self, frames_written: u64, total_frames: u64);

    /// Called for non-fatal problems, e.g. a rejected bit rate.
    fn on_warning(&self, warning: &ExportError);

    /// Called once the container is closed and the export succeeded.
    fn on_export_finished(&self, report: &ExportReport);
}
