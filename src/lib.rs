//! Browse epoched EEG recordings stored as `.npz` archives.
//!
//! The archive holds `x` (epochs × samples × channels, µV), `label` and `fs`.
//! [`data::loader::load_file`] turns it into a continuous
//! [`data::model::RawRecording`] in volts and [`app::show`] opens it in an
//! egui browser.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;
