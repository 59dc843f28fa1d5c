/// Data layer: archive access, the epoch → continuous transform, and types.
///
/// Architecture:
/// ```text
///  recording.npz  { x, label, fs }
///        │
///        ▼
///   ┌──────────┐
///   │   npy     │  zip entries → ndarray (numeric / string dtypes)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  unwrap names + rate, merge epochs, µV → V
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ RawRecording  │  (channels × samples) volts + ChannelInfo
///   └──────────────┘
/// ```

pub mod error;
pub mod loader;
pub mod model;
pub mod nested;
pub mod npy;
