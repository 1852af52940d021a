mod notifier;
mod snapshot;

pub use notifier::{
    plan, Dismissal, Presentation, PresentationReport, Presenter, ProgressionNotifier, Reveal,
    LEVEL_UP_REVEAL,
};
pub use snapshot::{SnapshotCache, UserProgressionSnapshot};
