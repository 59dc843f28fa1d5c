use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use eegview::config::ViewConfig;
use eegview::data::loader;
use eegview::data::npy::NpzArchive;
use eegview::ui::panels;

#[derive(Parser)]
#[command(name = "eegview")]
#[command(version)]
#[command(about = "Browse an epoched EEG recording stored as a .npz archive")]
#[command(long_about = "Browse an epoched EEG recording stored as a .npz archive.

The archive needs `x` (epochs, samples, channels) in microvolts, `label` with \
one name per channel and `fs` with the sampling rate. Labels must be saved with \
a string dtype; pickled object arrays (dtype `|O`) are rejected. Re-save them \
with e.g. `np.savez(path, x=x, label=np.array(names, dtype=str).reshape(-1, 1, 1), fs=fs)`.")]
struct Cli {
    /// Archive holding `x`, `label` and `fs` (a file dialog opens when omitted)
    path: Option<PathBuf>,

    /// Print the channel descriptor as JSON and exit without opening the viewer
    #[arg(long)]
    info: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let path = match cli.path {
        Some(path) => path,
        None => match panels::pick_archive() {
            Some(path) => path,
            None => {
                log::info!("No file selected");
                return Ok(());
            }
        },
    };

    println!("Loading file {}", path.display());
    let mut archive = NpzArchive::open(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    println!("{:?}", archive.keys());
    let recording = loader::load_archive(&mut archive)
        .with_context(|| format!("loading {}", path.display()))?;
    drop(archive);

    if cli.info {
        let summary = serde_json::to_string_pretty(&recording.summary())
            .context("serializing channel info")?;
        println!("{summary}");
        return Ok(());
    }

    eegview::app::show(recording, path, &ViewConfig::default())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn long_help_explains_label_dtype() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("string dtype"));
        assert!(help.contains("|O"));
    }

    #[test]
    fn path_and_info_flag_parse() {
        let cli = Cli::try_parse_from(["eegview", "rec.npz", "--info"]).unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("rec.npz")));
        assert!(cli.info);
    }
}
