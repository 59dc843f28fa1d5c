use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::loader::MICROVOLTS_TO_VOLTS;
use crate::data::model::ChannelType;
use crate::state::BrowserState;

/// Scale step applied by the amplitude buttons and +/- keys.
pub const GAIN_STEP: f64 = 1.25;

// ---------------------------------------------------------------------------
// Left side panel – channel list
// ---------------------------------------------------------------------------

/// Render the channel visibility panel.
pub fn side_panel(ui: &mut Ui, state: &mut BrowserState) {
    ui.heading("Channels");
    ui.separator();

    let names = match &state.recording {
        Some(rec) => rec.info.ch_names.clone(),
        None => {
            ui.label("No recording loaded.");
            return;
        }
    };

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.show_all();
        }
        if ui.small_button("None").clicked() {
            state.hide_all();
        }
        ui.label(format!(
            "{}/{} shown",
            state.visible_channels().len(),
            names.len()
        ));
    });
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (ch, name) in names.iter().enumerate() {
                let mut checked = state.visible[ch];
                let text = RichText::new(name).color(state.colors[ch]);
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_channel(ch);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut BrowserState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(name) = state.source.as_ref().and_then(|p| p.file_name()) {
            ui.strong(name.to_string_lossy().to_string());
            ui.separator();
        }

        if state.recording.is_some() {
            if ui.button("<<").on_hover_text("Back one window (PageUp)").clicked() {
                state.scroll(-1.0);
            }
            if ui.button("<").on_hover_text("Back a quarter window (←)").clicked() {
                state.scroll(-0.25);
            }
            if ui.button(">").on_hover_text("Forward a quarter window (→)").clicked() {
                state.scroll(0.25);
            }
            if ui.button(">>").on_hover_text("Forward one window (PageDown)").clicked() {
                state.scroll(1.0);
            }

            ui.label(format!(
                "{:.1}–{:.1} s of {:.1} s",
                state.start,
                state.start + state.duration,
                state.total_duration()
            ));

            ui.separator();

            if ui.button("-").on_hover_text("Smaller traces (-)").clicked() {
                state.amplify(1.0 / GAIN_STEP);
            }
            ui.label(format!(
                "{:.1} µV",
                state.scaling_for(ChannelType::Eeg) / MICROVOLTS_TO_VOLTS
            ));
            if ui.button("+").on_hover_text("Larger traces (+)").clicked() {
                state.amplify(GAIN_STEP);
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Ask the user for an archive; `None` when the dialog is cancelled.
pub fn pick_archive() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open EEG recording")
        .add_filter("NumPy archive", &["npz"])
        .pick_file()
}

pub fn open_file_dialog(state: &mut BrowserState) {
    let Some(path) = pick_archive() else {
        return;
    };
    match crate::data::loader::load_file(&path) {
        Ok(recording) => {
            log::info!(
                "Opened {} with channels {:?}",
                path.display(),
                recording.info.ch_names
            );
            state.set_recording(recording, Some(path));
        }
        Err(e) => {
            log::error!("Failed to load {}: {e:#}", path.display());
            state.status_message = Some(format!("Error ({}): {e}", e.kind()));
        }
    }
}
