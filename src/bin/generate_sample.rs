use ndarray::{Array2, Array3, ArrayD, IxDyn};

use eegview::data::loader::{KEY_LABELS, KEY_SFREQ, KEY_SIGNAL};
use eegview::data::npy::NpzWriter;

const SFREQ: f64 = 128.0;
const EPOCH_SECS: usize = 30;
const N_EPOCHS: usize = 20;
const CHANNELS: [&str; 8] = ["Fp1", "Fp2", "C3", "C4", "P3", "P4", "O1", "O2"];

/// Seeded xoshiro256** so every run writes the same recording.
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Gaussian sample noise in µV.
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Blink artefact: a ~300 ms positive bump, strongest over frontal sites.
fn blink(t: f64, onset: f64) -> f64 {
    let dt = (t - onset) / 0.1;
    150.0 * (-dt * dt).exp()
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let n_times = EPOCH_SECS * SFREQ as usize;
    let two_pi = 2.0 * std::f64::consts::PI;

    // Per-channel alpha amplitude (µV): posterior sites carry the most.
    let alpha_gain = [4.0, 4.0, 8.0, 8.0, 14.0, 14.0, 20.0, 20.0];
    let blinks: Vec<f64> = (0..N_EPOCHS * EPOCH_SECS / 7)
        .map(|i| i as f64 * 7.0 + 3.0 * rng.next_f64())
        .collect();

    // x[epoch, sample, channel] in microvolts
    let mut x = Array3::<f64>::zeros((N_EPOCHS, n_times, CHANNELS.len()));
    for ((epoch, sample, ch), v) in x.indexed_iter_mut() {
        let t = (epoch * n_times + sample) as f64 / SFREQ;
        let alpha = alpha_gain[ch] * (two_pi * 10.0 * t + ch as f64).sin();
        let drift = 10.0 * (two_pi * 0.1 * t).sin();
        let frontal = if ch < 2 {
            blinks.iter().map(|&onset| blink(t, onset)).sum::<f64>()
        } else {
            0.0
        };
        *v = alpha + drift + frontal + rng.gauss(0.0, 5.0);
    }

    // Names and rate wrapped the way the upstream export stores them.
    let labels = ArrayD::from_shape_vec(
        IxDyn(&[CHANNELS.len(), 1, 1]),
        CHANNELS.iter().map(|s| s.to_string()).collect(),
    )
    .expect("label shape matches channel count");
    let fs = Array2::from_elem((1, 1), SFREQ);

    let output_path = "sample_eeg.npz";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = NpzWriter::new(file);
    writer.add_array(KEY_SIGNAL, &x).expect("Failed to write x");
    writer.add_text(KEY_LABELS, &labels).expect("Failed to write label");
    writer.add_array(KEY_SFREQ, &fs).expect("Failed to write fs");
    writer.finish().expect("Failed to close archive");

    println!(
        "Wrote {N_EPOCHS} epochs × {n_times} samples × {} channels at {SFREQ} Hz to {output_path}",
        CHANNELS.len()
    );
}
