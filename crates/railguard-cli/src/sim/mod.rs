//! Deterministic train movement simulation.
//!
//! This is an explicit test-fixture boundary: every position the
//! simulator posts comes from a scripted track segment, never from
//! random drift, so the server only ever sees telemetry a real train
//! unit could have sent.

pub mod scenarios;
pub mod tracks;

pub use scenarios::{clear_section_scenario, animal_on_track_scenario, Scenario};
pub use tracks::{LinearTrack, TrackPath};
