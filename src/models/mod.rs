// Data Models
pub mod archive_entry;
pub mod operation;
pub mod sort;

pub use archive_entry::{ArchiveEntry, UNKNOWN_TIME};
pub use operation::{
    ConflictResolution, NoProgress, OperationSummary, ProgressEvent, ProgressSink,
};
pub use sort::{EntryKind, SortBy};
