use eframe::egui::{Align2, Ui};
use egui_plot::{Line, Plot, PlotBounds, PlotPoint, PlotPoints, Text};

use crate::state::BrowserState;

// ---------------------------------------------------------------------------
// Trace plot (central panel)
// ---------------------------------------------------------------------------

/// Vertical centre of lane `lane` when `n_lanes` are stacked; lane 0 on top.
pub fn lane_offset(lane: usize, n_lanes: usize) -> f64 {
    (n_lanes - 1 - lane) as f64
}

/// Plot y of a sample: ± `scaling` volts reaches the edges of its lane.
pub fn lane_y(value: f64, scaling: f64, offset: f64) -> f64 {
    offset + 0.5 * value / scaling
}

/// Render the stacked channel traces for the visible window.
pub fn trace_plot(ui: &mut Ui, state: &BrowserState) {
    let recording = match &state.recording {
        Some(rec) => rec,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a recording to browse it  (File → Open…)");
            });
            return;
        }
    };

    let channels = state.visible_channels();
    let n_lanes = channels.len();
    let samples = state.window_samples();
    let sfreq = recording.info.sfreq;
    let (t_min, t_max) = (state.start, state.start + state.duration);

    Plot::new("eeg_traces")
        .x_axis_label("Time (s)")
        .show_axes([true, false])
        .show_grid([true, false])
        .allow_boxed_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_double_click_reset(false)
        .show(ui, |plot_ui| {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                [t_min, -1.0],
                [t_max, n_lanes.max(1) as f64],
            ));

            for (lane, &ch) in channels.iter().enumerate() {
                let offset = lane_offset(lane, n_lanes);
                let scaling = state.scaling_for(recording.info.ch_types[ch]);
                let row = recording.data.row(ch);
                let name = &recording.info.ch_names[ch];

                let points: PlotPoints = samples
                    .clone()
                    .map(|s| [s as f64 / sfreq, lane_y(row[s], scaling, offset)])
                    .collect();

                plot_ui.line(
                    Line::new(points)
                        .name(name)
                        .color(state.colors[ch])
                        .width(1.0),
                );
                plot_ui.text(
                    Text::new(PlotPoint::new(t_min, offset + 0.35), name.as_str())
                        .anchor(Align2::LEFT_BOTTOM),
                );
            }
        });
}
