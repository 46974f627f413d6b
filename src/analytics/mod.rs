//! Visit recording and click analytics
//!
//! Every resolved redirect appends a visit event with classified client
//! metadata; the aggregator folds the event log into per-link summaries.

pub mod aggregator;
pub mod classifier;
pub mod ip;
pub mod models;
pub mod recorder;

pub use aggregator::AnalyticsAggregator;
pub use classifier::{classify, Classification, DeviceProfile};
pub use models::{AnalyticsReport, RequestMeta, VisitEvent};
pub use recorder::VisitRecorder;
