use std::io::{Read, Seek};
use std::path::Path;

use ndarray::{Array2, Array3, ArrayD, Axis, Ix3};

use super::error::{LoadError, LoadResult};
use super::model::{check_channel_count, ChannelInfo, ChannelType, RawRecording};
use super::nested::unwrap_scalar;
use super::npy::NpzArchive;

/// Epoched signal, (epochs, samples, channels) in microvolts.
pub const KEY_SIGNAL: &str = "x";
/// Per-channel name wrappers.
pub const KEY_LABELS: &str = "label";
/// Wrapped sampling rate in Hz.
pub const KEY_SFREQ: &str = "fs";

/// Microvolt to volt conversion applied to every sample.
pub const MICROVOLTS_TO_VOLTS: f64 = 1e-6;

/// Wrapper levels around each channel name, below the label array itself.
const LABEL_NESTING: usize = 2;
/// The `fs` array itself plus one wrapper level.
const SFREQ_NESTING: usize = 2;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load an epoched `.npz` recording from disk as continuous data in volts.
pub fn load_file(path: &Path) -> LoadResult<RawRecording> {
    let mut archive = NpzArchive::open(path)?;
    load_archive(&mut archive)
}

/// Load from an already opened archive.
///
/// The archive must hold `x` (epochs × samples × channels, µV), `label`
/// (one nested name per channel) and `fs` (nested sampling rate).
pub fn load_archive<R: Read + Seek>(archive: &mut NpzArchive<R>) -> LoadResult<RawRecording> {
    archive.require_keys(&[KEY_SIGNAL, KEY_LABELS, KEY_SFREQ])?;

    let signal = epochs_from_dyn(archive.float_array(KEY_SIGNAL)?)?;
    let (n_epochs, n_times, n_channels) = signal.dim();
    log::debug!("'{KEY_SIGNAL}': {n_epochs} epochs × {n_times} samples × {n_channels} channels");

    let ch_names = channel_names(&archive.text_array(KEY_LABELS)?)?;
    let sfreq = sampling_rate(&archive.float_array(KEY_SFREQ)?)?;

    let info = ChannelInfo::new(ch_names, sfreq, ChannelType::Eeg);
    check_channel_count(&info, n_channels)?;

    let recording = RawRecording::new(flatten_epochs(&signal), info)?;
    log::info!(
        "Loaded {} channels × {} samples at {} Hz ({:.1} s)",
        recording.n_channels(),
        recording.n_samples(),
        recording.info.sfreq,
        recording.duration_secs()
    );
    Ok(recording)
}

// ---------------------------------------------------------------------------
// Transform steps
// ---------------------------------------------------------------------------

/// `x` must be exactly (epochs, samples, channels).
pub fn epochs_from_dyn(x: ArrayD<f64>) -> LoadResult<Array3<f64>> {
    let ndim = x.ndim();
    x.into_dimensionality::<Ix3>()
        .map_err(|_| LoadError::Shape { ndim })
}

/// Merge epochs into one sample axis and convert to (channels, samples) volts.
///
/// Row-major merge: all samples of epoch 0 come before epoch 1, and channel
/// `c` of the input is row `c` of the output.
pub fn flatten_epochs(signal: &Array3<f64>) -> Array2<f64> {
    let (n_epochs, n_times, n_channels) = signal.dim();
    Array2::from_shape_fn((n_channels, n_epochs * n_times), |(channel, sample)| {
        signal[[sample / n_times, sample % n_times, channel]] * MICROVOLTS_TO_VOLTS
    })
}

/// One name per element along the first axis of `label`.
pub fn channel_names(labels: &ArrayD<String>) -> LoadResult<Vec<String>> {
    if labels.ndim() == 0 {
        return Err(LoadError::format(format!(
            "'{KEY_LABELS}' must be an array of channel names, found a scalar"
        )));
    }
    labels
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(i, wrapped)| unwrap_scalar(wrapped, LABEL_NESTING, &format!("{KEY_LABELS}[{i}]")))
        .collect()
}

/// A single finite, positive rate in Hz.
pub fn sampling_rate(fs: &ArrayD<f64>) -> LoadResult<f64> {
    let sfreq = unwrap_scalar(fs.view(), SFREQ_NESTING, KEY_SFREQ)?;
    if !sfreq.is_finite() || sfreq <= 0.0 {
        return Err(LoadError::format(format!(
            "'{KEY_SFREQ}' must be a positive sampling rate, got {sfreq}"
        )));
    }
    Ok(sfreq)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use approx::assert_relative_eq;
    use ndarray::{Array, Array2, IxDyn};

    use super::*;
    use crate::data::error::ErrorKind;
    use crate::data::npy::{NpyHeader, NpzWriter};

    type MemArchive = NpzArchive<Cursor<Vec<u8>>>;

    /// x[e, t, c] = 1000·e + 10·t + c, so every value names its position.
    fn signal(n_epochs: usize, n_times: usize, n_channels: usize) -> Array3<f64> {
        Array3::from_shape_fn((n_epochs, n_times, n_channels), |(e, t, c)| {
            1000.0 * e as f64 + 10.0 * t as f64 + c as f64
        })
    }

    fn labels(names: &[&str]) -> ArrayD<String> {
        ArrayD::from_shape_vec(
            IxDyn(&[names.len(), 1, 1]),
            names.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    fn archive_with(build: impl FnOnce(&mut NpzWriter<Cursor<Vec<u8>>>)) -> MemArchive {
        let mut writer = NpzWriter::new(Cursor::new(Vec::new()));
        build(&mut writer);
        let bytes = writer.finish().unwrap().into_inner();
        NpzArchive::new(Cursor::new(bytes)).unwrap()
    }

    fn archive(x: &Array3<f64>, names: &[&str], fs: f64) -> MemArchive {
        archive_with(|w| {
            w.add_array(KEY_SIGNAL, x).unwrap();
            w.add_text(KEY_LABELS, &labels(names)).unwrap();
            w.add_array(KEY_SFREQ, &Array2::from_elem((1, 1), fs)).unwrap();
        })
    }

    const NAMES: [&str; 4] = ["Fp1", "Fp2", "C3", "C4"];

    #[test]
    fn end_to_end_scenario() {
        let x = signal(2, 100, 4);
        let rec = load_archive(&mut archive(&x, &NAMES, 128.0)).unwrap();
        assert_eq!(rec.data.dim(), (4, 200));
        assert_eq!(rec.info.ch_names, NAMES.to_vec());
        assert_eq!(rec.info.sfreq, 128.0);
        assert_eq!(rec.info.ch_types, vec![ChannelType::Eeg; 4]);
    }

    #[test]
    fn epochs_are_concatenated_in_order() {
        let x = signal(3, 5, 2);
        let flat = flatten_epochs(&x);
        assert_eq!(flat.dim(), (2, 15));
        // Last sample of epoch 0 is followed by the first sample of epoch 1.
        assert_eq!(flat[[1, 4]], x[[0, 4, 1]] * MICROVOLTS_TO_VOLTS);
        assert_eq!(flat[[1, 5]], x[[1, 0, 1]] * MICROVOLTS_TO_VOLTS);
        assert_eq!(flat[[0, 14]], x[[2, 4, 0]] * MICROVOLTS_TO_VOLTS);
    }

    #[test]
    fn every_value_is_scaled_by_exactly_1e_minus_6() {
        let x = signal(2, 7, 3);
        let flat = flatten_epochs(&x);
        for ((e, t, c), &v) in x.indexed_iter() {
            assert_eq!(flat[[c, e * 7 + t]], v * 1e-6);
        }
    }

    #[test]
    fn reshaping_back_recovers_the_input() {
        let x = signal(4, 16, 3);
        let flat = flatten_epochs(&x);
        let restored = flat
            .t()
            .to_shape((4, 16, 3))
            .unwrap()
            .mapv(|v| v / MICROVOLTS_TO_VOLTS);
        for (a, b) in restored.iter().zip(x.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }

    #[test]
    fn fortran_order_signal_matches_c_order() {
        let x = signal(3, 8, 4);
        let header = NpyHeader {
            descr: "<f8".to_string(),
            fortran_order: true,
            shape: x.shape().to_vec(),
        };
        let mut npy = header.to_bytes().unwrap();
        for v in x.t().iter() {
            npy.extend_from_slice(&v.to_le_bytes());
        }
        let mut archive = archive_with(|w| {
            w.add_npy_bytes(KEY_SIGNAL, &npy).unwrap();
            w.add_text(KEY_LABELS, &labels(&NAMES)).unwrap();
            w.add_array(KEY_SFREQ, &Array2::from_elem((1, 1), 128.0)).unwrap();
        });
        let rec = load_archive(&mut archive).unwrap();
        assert_eq!(rec.data, flatten_epochs(&x));
    }

    #[test]
    fn float32_signal_is_accepted() {
        let x = signal(1, 8, 4).mapv(|v| v as f32);
        let mut archive = archive_with(|w| {
            w.add_array(KEY_SIGNAL, &x).unwrap();
            w.add_text(KEY_LABELS, &labels(&NAMES)).unwrap();
            w.add_array(KEY_SFREQ, &Array2::from_elem((1, 1), 256.0_f32)).unwrap();
        });
        let rec = load_archive(&mut archive).unwrap();
        assert_eq!(rec.data.dim(), (4, 8));
        assert_eq!(rec.info.sfreq, 256.0);
    }

    #[test]
    fn missing_fs_is_a_format_error() {
        let x = signal(2, 10, 4);
        let mut archive = archive_with(|w| {
            w.add_array(KEY_SIGNAL, &x).unwrap();
            w.add_text(KEY_LABELS, &labels(&NAMES)).unwrap();
        });
        let err = load_archive(&mut archive).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("'fs'"));
    }

    #[test]
    fn two_axis_signal_is_a_shape_error() {
        let x = Array::from_elem((200, 4), 1.0_f64);
        let mut archive = archive_with(|w| {
            w.add_array(KEY_SIGNAL, &x).unwrap();
            w.add_text(KEY_LABELS, &labels(&NAMES)).unwrap();
            w.add_array(KEY_SFREQ, &Array2::from_elem((1, 1), 128.0)).unwrap();
        });
        let err = load_archive(&mut archive).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
        assert!(matches!(err, LoadError::Shape { ndim: 2 }));
    }

    #[test]
    fn five_labels_for_four_channels_is_a_validation_error() {
        let x = signal(2, 10, 4);
        let mut archive = archive(&x, &["Fp1", "Fp2", "C3", "C4", "Cz"], 128.0);
        let err = load_archive(&mut archive).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(
            err,
            LoadError::Validation {
                labels: 5,
                channels: 4
            }
        ));
    }

    #[test]
    fn nonexistent_path_is_file_not_found() {
        let err = load_file(Path::new("/definitely/not/here/recording.npz")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn non_positive_rate_is_rejected() {
        let fs = Array2::from_elem((1, 1), 0.0).into_dyn();
        assert_eq!(sampling_rate(&fs).unwrap_err().kind(), ErrorKind::Format);
        let fs = Array2::from_elem((1, 1), f64::NAN).into_dyn();
        assert_eq!(sampling_rate(&fs).unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn rate_with_several_values_is_rejected() {
        let fs = Array2::from_shape_vec((1, 2), vec![128.0, 256.0]).unwrap().into_dyn();
        assert_eq!(sampling_rate(&fs).unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn flat_label_list_does_not_unwrap() {
        let flat = ArrayD::from_shape_vec(
            IxDyn(&[2]),
            vec!["Fp1".to_string(), "Fp2".to_string()],
        )
        .unwrap();
        let err = channel_names(&flat).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("label[0]"));
    }

    #[test]
    fn numeric_labels_are_a_format_error() {
        let x = signal(1, 4, 2);
        let mut archive = archive_with(|w| {
            w.add_array(KEY_SIGNAL, &x).unwrap();
            w.add_array(KEY_LABELS, &Array::from_elem((2, 1, 1), 1.0_f64)).unwrap();
            w.add_array(KEY_SFREQ, &Array2::from_elem((1, 1), 128.0)).unwrap();
        });
        let err = load_archive(&mut archive).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
