//! Context preparation ahead of narrative synthesis: perception
//! extraction (C11), coverage anomaly detection (C12), and context
//! curation under a token budget (C13).

mod anomaly;
mod curator;
mod perception;

pub use anomaly::{detect_anomalies, AnomalyDetectorConfig};
pub use curator::{curate_for_narrative_synthesis, resolve_perspective, CuratedContext, HistoricalEntry};
pub use perception::extract_perception;
