//! Intake → normalize → preview → batch, and correlation of service results.

pub mod batch;
pub mod correlate;
pub mod intake;
pub mod normalize;
pub mod preview;
pub mod source;

pub use batch::{Batch, BatchEntry, Truncation};
pub use correlate::{ClusterView, correlate};
pub use intake::{IntakeController, IntakeReport};
pub use normalize::{NormalizeOutcome, NormalizedImage, normalize};
pub use preview::{DataUriEncoder, PreviewEncoder};
pub use source::{FileSource, PathSource};
