use crate::types::{Ifg, OrbitalError, OrbitalResult, PhaseImage};

/// Multilooking parameters for the network observation set
#[derive(Debug, Clone)]
pub struct MultilookParams {
    /// Number of looks along x (columns)
    pub x_looks: usize,
    /// Number of looks along y (rows)
    pub y_looks: usize,
    /// Maximum fraction of NaN pixels tolerated in a window
    pub nan_threshold: f64,
}

impl Default for MultilookParams {
    fn default() -> Self {
        Self {
            x_looks: 4,
            y_looks: 4,
            nan_threshold: 0.5,
        }
    }
}

/// Reduces interferogram resolution by NaN-aware block averaging
pub struct PhaseMultilooker {
    params: MultilookParams,
}

impl PhaseMultilooker {
    /// Create a new multilooker
    pub fn new(params: MultilookParams) -> OrbitalResult<Self> {
        if params.x_looks == 0 || params.y_looks == 0 {
            return Err(OrbitalError::InvalidParameter(format!(
                "multilook factors must be positive, got {}x{}",
                params.x_looks, params.y_looks
            )));
        }
        if !(0.0..=1.0).contains(&params.nan_threshold) {
            return Err(OrbitalError::InvalidParameter(format!(
                "NaN threshold {} outside [0, 1]",
                params.nan_threshold
            )));
        }
        Ok(Self { params })
    }

    /// Create multilooker with standard parameters
    pub fn standard() -> Self {
        Self {
            params: MultilookParams::default(),
        }
    }

    pub fn params(&self) -> &MultilookParams {
        &self.params
    }

    /// Multilook a phase array
    ///
    /// Each output pixel is the mean of the valid pixels in its
    /// `y_looks x x_looks` window. Trailing rows/columns that do not fill a
    /// whole window are dropped. Windows with a NaN fraction above the
    /// threshold, or with no valid pixels at all, become NaN.
    pub fn multilook_phase(&self, phase: &PhaseImage) -> OrbitalResult<PhaseImage> {
        let (rows, cols) = phase.dim();
        let (y_looks, x_looks) = (self.params.y_looks, self.params.x_looks);

        let out_rows = rows / y_looks;
        let out_cols = cols / x_looks;

        if out_rows == 0 || out_cols == 0 {
            return Err(OrbitalError::InvalidParameter(format!(
                "multilook factors {}x{} too large for {}x{} interferogram",
                x_looks, y_looks, rows, cols
            )));
        }

        let window_size = (y_looks * x_looks) as f64;
        let mut output = PhaseImage::zeros((out_rows, out_cols));

        for out_row in 0..out_rows {
            for out_col in 0..out_cols {
                let mut sum = 0.0f64; // f64 accumulation
                let mut count = 0usize;

                let start_row = out_row * y_looks;
                let start_col = out_col * x_looks;

                for in_row in start_row..start_row + y_looks {
                    for in_col in start_col..start_col + x_looks {
                        let value = phase[[in_row, in_col]];
                        if !value.is_nan() {
                            sum += value as f64;
                            count += 1;
                        }
                    }
                }

                let nan_fraction = (window_size - count as f64) / window_size;
                output[[out_row, out_col]] = if count == 0 || nan_fraction > self.params.nan_threshold {
                    f32::NAN
                } else {
                    (sum / count as f64) as f32
                };
            }
        }

        Ok(output)
    }

    /// Multilook an interferogram, scaling its cell sizes by the look factors
    ///
    /// Each output pixel is placed at the centre of its window so that a
    /// fitted surface matches the full resolution grid.
    pub fn multilook_ifg(&self, ifg: &Ifg) -> OrbitalResult<Ifg> {
        let phase = self.multilook_phase(&ifg.phase_data)?;
        let (rows, cols) = ifg.shape();
        let (x_looks, y_looks) = (self.params.x_looks as f64, self.params.y_looks as f64);

        log::debug!(
            "Multilooked {}: {}x{} -> {}x{}",
            ifg.label(),
            rows,
            cols,
            phase.nrows(),
            phase.ncols()
        );

        Ok(Ifg {
            phase_data: phase,
            x_size: ifg.x_size * x_looks,
            y_size: ifg.y_size * y_looks,
            origin: (
                ifg.origin.0 + (x_looks - 1.0) / 2.0 * ifg.x_size,
                ifg.origin.1 + (y_looks - 1.0) / 2.0 * ifg.y_size,
            ),
            master: ifg.master,
            slave: ifg.slave,
            name: ifg.name.clone(),
        })
    }

    /// Multilook every interferogram of a collection, preserving order
    pub fn multilook_ifgs(&self, ifgs: &[Ifg]) -> OrbitalResult<Vec<Ifg>> {
        log::info!(
            "Multilooking {} interferograms with {}x{} looks",
            ifgs.len(),
            self.params.x_looks,
            self.params.y_looks
        );
        ifgs.iter().map(|ifg| self.multilook_ifg(ifg)).collect()
    }
}
