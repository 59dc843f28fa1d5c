use std::collections::BTreeMap;
use std::ops::Range;
use std::path::PathBuf;

use eframe::egui::Color32;

use crate::color::generate_palette;
use crate::config::{ViewConfig, DEFAULT_EEG_SCALING};
use crate::data::model::{ChannelType, RawRecording};

/// Shortest time window the browser zooms in to, in seconds.
pub const MIN_DURATION: f64 = 0.5;

// ---------------------------------------------------------------------------
// Browser state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct BrowserState {
    /// Loaded recording (None until a file is loaded).
    pub recording: Option<RawRecording>,

    /// Where `recording` came from, for the title bar.
    pub source: Option<PathBuf>,

    /// Left edge of the visible window, seconds.
    pub start: f64,

    /// Width of the visible window, seconds.
    pub duration: f64,

    /// Volts spanning one channel lane, per channel type.
    pub scalings: BTreeMap<ChannelType, f64>,

    /// Per-channel visibility, indexed like the recording's channels.
    pub visible: Vec<bool>,

    /// Per-channel trace colours.
    pub colors: Vec<Color32>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl BrowserState {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            recording: None,
            source: None,
            start: config.start,
            duration: config.duration,
            scalings: config.scalings.clone(),
            visible: Vec::new(),
            colors: Vec::new(),
            status_message: None,
        }
    }

    /// Ingest a newly loaded recording; the window keeps its width and start.
    pub fn set_recording(&mut self, recording: RawRecording, source: Option<PathBuf>) {
        let n = recording.n_channels();
        self.visible = vec![true; n];
        self.colors = generate_palette(n);
        self.recording = Some(recording);
        self.source = source;
        self.status_message = None;
        self.set_start(self.start);
    }

    pub fn total_duration(&self) -> f64 {
        self.recording
            .as_ref()
            .map_or(0.0, RawRecording::duration_secs)
    }

    /// Latest start that still shows data; zero when the window covers it all.
    pub fn max_start(&self) -> f64 {
        (self.total_duration() - self.duration).max(0.0)
    }

    pub fn set_start(&mut self, start: f64) {
        self.start = start.clamp(0.0, self.max_start());
    }

    /// Move the window by `fraction` of its own width (negative = back).
    pub fn scroll(&mut self, fraction: f64) {
        self.set_start(self.start + fraction * self.duration);
    }

    /// Multiply the window width by `factor`.
    pub fn zoom_time(&mut self, factor: f64) {
        let longest = self.total_duration().max(MIN_DURATION);
        self.duration = (self.duration * factor).clamp(MIN_DURATION, longest.max(self.duration));
        self.set_start(self.start);
    }

    /// Make traces `factor` times taller (< 1 shrinks them).
    pub fn amplify(&mut self, factor: f64) {
        for scaling in self.scalings.values_mut() {
            *scaling /= factor;
        }
    }

    pub fn scaling_for(&self, ch_type: ChannelType) -> f64 {
        self.scalings
            .get(&ch_type)
            .copied()
            .unwrap_or(DEFAULT_EEG_SCALING)
    }

    /// Sample indices covered by the visible window.
    pub fn window_samples(&self) -> Range<usize> {
        let Some(rec) = &self.recording else {
            return 0..0;
        };
        let n = rec.n_samples();
        let sfreq = rec.info.sfreq;
        let first = ((self.start * sfreq).floor() as usize).min(n);
        let last = (((self.start + self.duration) * sfreq).ceil() as usize + 1).min(n);
        first..last
    }

    /// Indices of channels currently shown, in recording order.
    pub fn visible_channels(&self) -> Vec<usize> {
        self.visible
            .iter()
            .enumerate()
            .filter(|(_, shown)| **shown)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn toggle_channel(&mut self, channel: usize) {
        if let Some(shown) = self.visible.get_mut(channel) {
            *shown = !*shown;
        }
    }

    pub fn show_all(&mut self) {
        self.visible.iter_mut().for_each(|v| *v = true);
    }

    pub fn hide_all(&mut self) {
        self.visible.iter_mut().for_each(|v| *v = false);
    }
}
