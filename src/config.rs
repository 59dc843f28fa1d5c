use std::collections::BTreeMap;

use crate::data::model::ChannelType;

/// Default amplitude scaling for EEG traces, in volts.
pub const DEFAULT_EEG_SCALING: f64 = 75e-6;

/// How the browser opens: visible window, first time shown, amplitude
/// scaling per channel type, and whether the call blocks until closed.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    /// Width of the visible window in seconds.
    pub duration: f64,
    /// Initial time offset in seconds.
    pub start: f64,
    /// Volts spanning one channel lane, per channel type.
    pub scalings: BTreeMap<ChannelType, f64>,
    pub block: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            duration: 30.0,
            start: 0.0,
            scalings: BTreeMap::from([(ChannelType::Eeg, DEFAULT_EEG_SCALING)]),
            block: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_fixed_view() {
        let cfg = ViewConfig::default();
        assert_eq!(cfg.duration, 30.0);
        assert_eq!(cfg.start, 0.0);
        assert_eq!(cfg.scalings.get(&ChannelType::Eeg), Some(&75e-6));
        assert!(cfg.block);
    }
}
