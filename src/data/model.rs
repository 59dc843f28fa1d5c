use std::fmt;

use ndarray::Array2;
use serde::Serialize;

use super::error::{LoadError, LoadResult};

// ---------------------------------------------------------------------------
// ChannelType
// ---------------------------------------------------------------------------

/// Sensor type of a channel. Scalings are looked up per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Eeg,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Eeg => "eeg",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChannelInfo – the channel descriptor
// ---------------------------------------------------------------------------

/// Ordered channel names, one type per channel, and the sampling rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelInfo {
    pub ch_names: Vec<String>,
    /// Sampling rate in Hz.
    pub sfreq: f64,
    pub ch_types: Vec<ChannelType>,
}

impl ChannelInfo {
    /// Every channel gets the same `ch_type`.
    pub fn new(ch_names: Vec<String>, sfreq: f64, ch_type: ChannelType) -> Self {
        let ch_types = vec![ch_type; ch_names.len()];
        ChannelInfo {
            ch_names,
            sfreq,
            ch_types,
        }
    }

    pub fn n_channels(&self) -> usize {
        self.ch_names.len()
    }
}

/// Channel names must line up one-to-one with the data's channel axis.
pub fn check_channel_count(info: &ChannelInfo, channels: usize) -> LoadResult<()> {
    if info.n_channels() != channels {
        return Err(LoadError::Validation {
            labels: info.n_channels(),
            channels,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// RawRecording – continuous data handed to the viewer
// ---------------------------------------------------------------------------

/// A continuous recording: `data` is (channels, samples) in volts.
#[derive(Debug, Clone)]
pub struct RawRecording {
    pub data: Array2<f64>,
    pub info: ChannelInfo,
}

impl RawRecording {
    pub fn new(data: Array2<f64>, info: ChannelInfo) -> LoadResult<Self> {
        check_channel_count(&info, data.nrows())?;
        Ok(RawRecording { data, info })
    }

    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Length of the recording in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.n_samples() as f64 / self.info.sfreq
    }

    /// What `--info` prints.
    pub fn summary(&self) -> RecordingSummary<'_> {
        RecordingSummary {
            info: &self.info,
            n_samples: self.n_samples(),
            duration_secs: self.duration_secs(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordingSummary<'a> {
    #[serde(flatten)]
    pub info: &'a ChannelInfo,
    pub n_samples: usize,
    pub duration_secs: f64,
}
