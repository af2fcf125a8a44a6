#![allow(dead_code)]

use chrono::NaiveDate;
use ndarray::Array1;
use orbfit::core::build_pixel_design_matrix;
use orbfit::{Epoch, Ifg, PhaseImage, PolyDegree};

pub const X_SIZE: f64 = 90.0;
pub const Y_SIZE: f64 = 89.5;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn epochs() -> Vec<Epoch> {
    [
        (2006, 6, 19),
        (2006, 8, 28),
        (2006, 10, 2),
        (2006, 11, 6),
        (2006, 12, 11),
        (2007, 1, 15),
    ]
    .iter()
    .map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
    .collect()
}

/// Master/slave epoch indices: a chain with one branch, six epochs in total
pub const PAIRS: [(usize, usize); 5] = [(0, 1), (1, 2), (2, 3), (2, 4), (4, 5)];

/// Five 4x3 interferograms with a non-planar phase pattern
pub fn mock_ifgs() -> Vec<Ifg> {
    let e = epochs();
    PAIRS
        .iter()
        .enumerate()
        .map(|(k, &(m, s))| {
            let phase = PhaseImage::from_shape_fn((4, 3), |(r, c)| {
                let (r, c) = (r as f32, c as f32);
                0.3 * (k as f32 + 1.0) * c + 0.2 * r * r - 0.1 * (c * r).sin() + 0.05 * k as f32
            });
            Ifg::new(phase, X_SIZE, Y_SIZE, e[m], e[s])
        })
        .collect()
}

/// Synthetic orbital coefficients for epoch `k`
pub fn epoch_coefficients(degree: PolyDegree, k: usize) -> Array1<f64> {
    let k = k as f64;
    match degree {
        PolyDegree::Planar => Array1::from(vec![1e-3 * (k + 1.0), -5e-4 * k + 2e-4]),
        PolyDegree::Quadratic => Array1::from(vec![
            1e-3 * (k + 1.0),
            -2e-3 * k,
            5e-4 * (k - 2.0),
            0.01 * k,
            -0.02 * (k + 0.5),
        ]),
        PolyDegree::PartCubic => Array1::from(vec![
            1e-4 * k,
            1e-3 * (k + 1.0),
            -2e-3 * k,
            5e-4 * (k - 2.0),
            0.01 * k,
            -0.02 * (k + 0.5),
        ]),
    }
}

/// Interferograms whose phase is exactly surface(slave) - surface(master)
/// plus an optional constant per interferogram
pub fn synthetic_ifgs(
    degree: PolyDegree,
    shape: (usize, usize),
    x_size: f64,
    y_size: f64,
    biases: Option<&[f64]>,
) -> Vec<Ifg> {
    let e = epochs();
    PAIRS
        .iter()
        .enumerate()
        .map(|(i, &(m, s))| {
            let mut ifg = Ifg::new(PhaseImage::zeros(shape), x_size, y_size, e[m], e[s]);
            let dm = build_pixel_design_matrix(&ifg, degree, false);
            let diff = epoch_coefficients(degree, s) - epoch_coefficients(degree, m);
            let bias = biases.map_or(0.0, |b| b[i]);
            let surface = dm.dot(&diff);
            for (p, v) in ifg.phase_data.iter_mut().zip(surface.iter()) {
                *p = (v + bias) as f32;
            }
            ifg
        })
        .collect()
}

pub fn valid_values(ifg: &Ifg) -> Vec<f32> {
    ifg.phase_data.iter().copied().filter(|v| !v.is_nan()).collect()
}
