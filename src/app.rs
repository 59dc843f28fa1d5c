use std::path::PathBuf;

use anyhow::{bail, Result};
use eframe::egui::{self, Key};

use crate::config::ViewConfig;
use crate::data::model::RawRecording;
use crate::state::BrowserState;
use crate::ui::panels::{self, GAIN_STEP};
use crate::ui::plot;

/// Time-window growth per Home/End press.
const ZOOM_STEP: f64 = 1.5;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct EegBrowserApp {
    pub state: BrowserState,
}

impl EegBrowserApp {
    pub fn new(state: BrowserState) -> Self {
        Self { state }
    }
}

impl eframe::App for EegBrowserApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        handle_keys(ctx, &mut self.state);

        // ---- Top panel: menu bar + navigation ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: channels ----
        egui::SidePanel::left("channel_panel")
            .default_width(160.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: traces ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::trace_plot(ui, &self.state);
        });
    }
}

/// Keyboard navigation, modelled on the usual raw-data browser bindings.
fn handle_keys(ctx: &egui::Context, state: &mut BrowserState) {
    let close = ctx.input(|i| {
        if i.key_pressed(Key::ArrowRight) {
            state.scroll(0.25);
        }
        if i.key_pressed(Key::ArrowLeft) {
            state.scroll(-0.25);
        }
        if i.key_pressed(Key::PageDown) {
            state.scroll(1.0);
        }
        if i.key_pressed(Key::PageUp) {
            state.scroll(-1.0);
        }
        if i.key_pressed(Key::Home) {
            state.zoom_time(1.0 / ZOOM_STEP);
        }
        if i.key_pressed(Key::End) {
            state.zoom_time(ZOOM_STEP);
        }
        if i.key_pressed(Key::Plus) || i.key_pressed(Key::Equals) {
            state.amplify(GAIN_STEP);
        }
        if i.key_pressed(Key::Minus) {
            state.amplify(1.0 / GAIN_STEP);
        }
        i.key_pressed(Key::Escape)
    });
    if close {
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Open the browser on `recording` and return once the user closes it.
pub fn show(recording: RawRecording, source: PathBuf, config: &ViewConfig) -> Result<()> {
    if !config.block {
        bail!("non-blocking display is not supported: the window needs the main thread");
    }

    let title = match source.file_name() {
        Some(name) => format!("{} – EEG browser", name.to_string_lossy()),
        None => "EEG browser".to_string(),
    };
    let mut state = BrowserState::new(config);
    state.set_recording(recording, Some(source));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(EegBrowserApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;
    use crate::data::model::{ChannelInfo, ChannelType};

    #[test]
    fn non_blocking_display_is_refused() {
        let info = ChannelInfo::new(vec!["Cz".into()], 128.0, ChannelType::Eeg);
        let rec = RawRecording::new(Array2::zeros((1, 128)), info).unwrap();
        let config = ViewConfig {
            block: false,
            ..ViewConfig::default()
        };
        let err = show(rec, PathBuf::from("rec.npz"), &config).unwrap_err();
        assert!(err.to_string().contains("non-blocking"));
    }
}
