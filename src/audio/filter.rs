//! Second-order IIR filters used to band-limit analysis taps.

use std::f32::consts::PI;

pub const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Filter response shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterKind {
    LowPass { cutoff_hz: f32 },
    HighPass { cutoff_hz: f32 },
    BandPass { center_hz: f32, q: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoeffs {
    fn identity() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    pub fn design(kind: FilterKind, fs_hz: f32) -> Self {
        if !fs_hz.is_finite() || fs_hz <= 0.0 {
            return Self::identity();
        }

        match kind {
            FilterKind::LowPass { cutoff_hz } => {
                let (cos_w0, alpha) = prewarp(fs_hz, cutoff_hz, BUTTERWORTH_Q);
                normalize(
                    (1.0 - cos_w0) * 0.5,
                    1.0 - cos_w0,
                    (1.0 - cos_w0) * 0.5,
                    1.0 + alpha,
                    -2.0 * cos_w0,
                    1.0 - alpha,
                )
            }
            FilterKind::HighPass { cutoff_hz } => {
                let (cos_w0, alpha) = prewarp(fs_hz, cutoff_hz, BUTTERWORTH_Q);
                normalize(
                    (1.0 + cos_w0) * 0.5,
                    -(1.0 + cos_w0),
                    (1.0 + cos_w0) * 0.5,
                    1.0 + alpha,
                    -2.0 * cos_w0,
                    1.0 - alpha,
                )
            }
            FilterKind::BandPass { center_hz, q } => {
                // Constant 0 dB peak gain
                let (cos_w0, alpha) = prewarp(fs_hz, center_hz, q.max(0.01));
                normalize(
                    alpha,
                    0.0,
                    -alpha,
                    1.0 + alpha,
                    -2.0 * cos_w0,
                    1.0 - alpha,
                )
            }
        }
    }
}

fn clamp_freq_hz(fs_hz: f32, freq_hz: f32) -> f32 {
    let nyquist = fs_hz * 0.5;
    let max_hz = (nyquist * 0.9).max(1.0);
    freq_hz.clamp(1.0, max_hz)
}

fn prewarp(fs_hz: f32, freq_hz: f32, q: f32) -> (f32, f32) {
    let freq_hz = clamp_freq_hz(fs_hz, freq_hz);
    let w0 = 2.0 * PI * freq_hz / fs_hz;
    (w0.cos(), w0.sin() / (2.0 * q))
}

fn normalize(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> BiquadCoeffs {
    if !a0.is_finite() || a0.abs() < 1e-12 {
        return BiquadCoeffs::identity();
    }

    let inv_a0 = 1.0 / a0;
    let coeffs = BiquadCoeffs {
        b0: b0 * inv_a0,
        b1: b1 * inv_a0,
        b2: b2 * inv_a0,
        a1: a1 * inv_a0,
        a2: a2 * inv_a0,
    };

    if [coeffs.b0, coeffs.b1, coeffs.b2, coeffs.a1, coeffs.a2]
        .iter()
        .all(|v| v.is_finite())
    {
        coeffs
    } else {
        BiquadCoeffs::identity()
    }
}

/// One filter instance (coefficients plus its own delay line).
///
/// Never share an instance between channels: the delay line would mix them.
#[derive(Debug, Clone)]
pub struct Biquad {
    kind: FilterKind,
    coeffs: BiquadCoeffs,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(kind: FilterKind, fs_hz: f32) -> Self {
        Self {
            kind,
            coeffs: BiquadCoeffs::design(kind, fs_hz),
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Transposed direct form II
    pub fn process(&mut self, x: f32) -> f32 {
        let c = self.coeffs;
        let y = c.b0 * x + self.z1;
        self.z1 = c.b1 * x - c.a1 * y + self.z2;
        self.z2 = c.b2 * x - c.a2 * y;
        y
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}
