//! Orbital error estimation and removal
//!
//! Orbital trajectory error shows up as a smooth low-order polynomial surface
//! across each interferogram. Two estimators are available:
//!
//! * independent: every interferogram is fitted on its own;
//! * network: one surface per epoch is fitted jointly over all
//!   interferograms, and each interferogram is corrected with the difference
//!   of its slave and master surfaces.
//!
//! Phase data is corrected in place.

use crate::core::design_matrix::{build_pixel_design_matrix, num_params};
use crate::core::lstsq::{solve_least_squares, solve_min_norm, NETWORK_RCOND};
use crate::core::multilook::{MultilookParams, PhaseMultilooker};
use crate::core::network::{assemble, check_consistent_geometry, EpochIndex};
use crate::types::{CorrectionMethod, Epoch, Ifg, OrbitalError, OrbitalResult, PolyDegree};
use ndarray::{Array1, Array2, Zip};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Parameters for orbital correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalParams {
    /// Polynomial degree of the orbital surface
    pub degree: PolyDegree,
    /// Estimation strategy
    pub method: CorrectionMethod,
    /// Whether to model a constant offset
    pub offset: bool,
    /// Looks (x, y) used to build the network observation set
    pub looks: (usize, usize),
    /// NaN fraction tolerated per multilook window
    pub nan_threshold: f64,
}

impl Default for OrbitalParams {
    fn default() -> Self {
        Self {
            degree: PolyDegree::Planar,
            method: CorrectionMethod::Independent,
            offset: true,
            looks: (1, 1),
            nan_threshold: 0.5,
        }
    }
}

impl OrbitalParams {
    pub fn validate(&self) -> OrbitalResult<()> {
        if self.looks.0 == 0 || self.looks.1 == 0 {
            return Err(OrbitalError::InvalidParameter(format!(
                "orbital fit looks must be positive, got {}x{}",
                self.looks.0, self.looks.1
            )));
        }
        if !(0.0..=1.0).contains(&self.nan_threshold) {
            return Err(OrbitalError::InvalidParameter(format!(
                "NaN threshold {} outside [0, 1]",
                self.nan_threshold
            )));
        }
        Ok(())
    }

    fn multilooks(&self) -> bool {
        self.looks != (1, 1)
    }
}

/// Orbital correction processor
pub struct OrbitalCorrector {
    params: OrbitalParams,
}

impl OrbitalCorrector {
    /// Create a new corrector, validating the parameters
    pub fn new(params: OrbitalParams) -> OrbitalResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Create corrector with standard parameters
    pub fn standard() -> Self {
        Self {
            params: OrbitalParams::default(),
        }
    }

    pub fn params(&self) -> &OrbitalParams {
        &self.params
    }

    /// Remove orbital error from the interferograms
    ///
    /// For the network method with looks other than 1x1 the observation set
    /// is multilooked first.
    pub fn correct(&self, ifgs: &mut [Ifg]) -> OrbitalResult<()> {
        if self.params.method == CorrectionMethod::Network && self.params.multilooks() {
            let multilooker = PhaseMultilooker::new(MultilookParams {
                x_looks: self.params.looks.0,
                y_looks: self.params.looks.1,
                nan_threshold: self.params.nan_threshold,
            })?;
            let mlooked = multilooker.multilook_ifgs(ifgs)?;
            return self.correct_with_multilooked(ifgs, Some(&mlooked));
        }

        if self.params.multilooks() {
            log::debug!("Looks are only used by the network method, ignoring");
        }
        self.correct_with_multilooked(ifgs, None)
    }

    /// Remove orbital error, estimating the network model from caller
    /// supplied multilooked copies of `ifgs`
    pub fn correct_with_multilooked(&self, ifgs: &mut [Ifg], multilooked: Option<&[Ifg]>) -> OrbitalResult<()> {
        let OrbitalParams {
            degree, method, offset, ..
        } = self.params;

        log::info!(
            "Orbital correction of {} interferograms: {} method, {} degree, offset {}",
            ifgs.len(),
            method,
            degree,
            offset
        );

        if let Some(mlooked) = multilooked {
            validate_multilooked(mlooked, ifgs)?;
            if method == CorrectionMethod::Independent {
                log::debug!("Multilooked interferograms are only used by the network method, ignoring");
            }
        }

        match method {
            CorrectionMethod::Network => network_correction(ifgs, degree, offset, multilooked)?,
            CorrectionMethod::Independent => {
                for result in independent_corrections(ifgs, degree, offset) {
                    result?;
                }
            }
        }

        log::info!("Orbital correction completed");
        Ok(())
    }
}

/// Remove orbital error from `ifgs` in place
///
/// `multilooked`, when given, must hold one reduced-resolution copy per
/// interferogram in the same order. It is checked for either method but only
/// used by the network method.
pub fn apply_orbital_correction(
    ifgs: &mut [Ifg],
    degree: PolyDegree,
    method: CorrectionMethod,
    multilooked: Option<&[Ifg]>,
    offset: bool,
) -> OrbitalResult<()> {
    let corrector = OrbitalCorrector::new(OrbitalParams {
        degree,
        method,
        offset,
        ..OrbitalParams::default()
    })?;
    corrector.correct_with_multilooked(ifgs, multilooked)
}

/// Sanity check multilooked interferograms against the originals
pub fn validate_multilooked(mlooked: &[Ifg], ifgs: &[Ifg]) -> OrbitalResult<()> {
    if mlooked.len() != ifgs.len() {
        return Err(OrbitalError::MultilookMismatch(format!(
            "{} interferograms but {} multilooked interferograms",
            ifgs.len(),
            mlooked.len()
        )));
    }

    for (i, (m, ifg)) in mlooked.iter().zip(ifgs).enumerate() {
        if m.epochs() != ifg.epochs() {
            return Err(OrbitalError::MultilookMismatch(format!(
                "item {} pairs {}-{} but the interferogram pairs {}-{}",
                i, m.master, m.slave, ifg.master, ifg.slave
            )));
        }
    }

    Ok(())
}

/// Fitted orbital surface for a single interferogram, without modifying it
pub fn independent_surface(ifg: &Ifg, degree: PolyDegree, offset: bool) -> OrbitalResult<Array2<f64>> {
    let dm = build_pixel_design_matrix(ifg, degree, offset);
    let vphase: Array1<f64> = ifg.phase_data.iter().map(|&v| v as f64).collect();

    let model = solve_least_squares(dm.view(), vphase.view())?;
    reshape_surface(dm.dot(&model), ifg.shape())
}

/// Fit and subtract the orbital surface of one interferogram
///
/// On failure the phase data is left untouched and the error names the
/// epoch pair.
pub fn independent_correction(ifg: &mut Ifg, degree: PolyDegree, offset: bool) -> OrbitalResult<()> {
    if ifg.nan_fraction() > 0.5 {
        log::warn!("{} is {:.0}% no-data", ifg.label(), ifg.nan_fraction() * 100.0);
    }

    let surface = independent_surface(ifg, degree, offset).map_err(|e| OrbitalError::FitFailed {
        master: ifg.master,
        slave: ifg.slave,
        source: Box::new(e),
    })?;

    subtract_surface(ifg, &surface, 0.0);
    Ok(())
}

/// Independent correction of every interferogram, one result per item
///
/// Items are independent of each other; a failed item is not modified and
/// does not stop the others.
#[cfg(feature = "parallel")]
pub fn independent_corrections(ifgs: &mut [Ifg], degree: PolyDegree, offset: bool) -> Vec<OrbitalResult<()>> {
    ifgs.par_iter_mut()
        .map(|ifg| independent_correction(ifg, degree, offset))
        .collect()
}

/// Independent correction of every interferogram, one result per item
#[cfg(not(feature = "parallel"))]
pub fn independent_corrections(ifgs: &mut [Ifg], degree: PolyDegree, offset: bool) -> Vec<OrbitalResult<()>> {
    ifgs.iter_mut()
        .map(|ifg| independent_correction(ifg, degree, offset))
        .collect()
}

/// Per-epoch orbital surface coefficients from a joint network fit
#[derive(Debug, Clone)]
pub struct NetworkModel {
    degree: PolyDegree,
    epochs: EpochIndex,
    coefficients: Vec<Array1<f64>>,
    offsets: Option<Array1<f64>>,
}

impl NetworkModel {
    pub fn degree(&self) -> PolyDegree {
        self.degree
    }

    pub fn epochs(&self) -> &EpochIndex {
        &self.epochs
    }

    /// Polynomial coefficients of one epoch
    pub fn coefficients(&self, epoch: &Epoch) -> Option<&Array1<f64>> {
        self.epochs.get(epoch).map(|i| &self.coefficients[i])
    }

    /// Jointly fitted offsets, one per interferogram, if modelled
    pub fn offsets(&self) -> Option<&Array1<f64>> {
        self.offsets.as_ref()
    }

    /// Coefficients of the surface observed by a master/slave pair
    pub fn pair_coefficients(&self, master: &Epoch, slave: &Epoch) -> OrbitalResult<Array1<f64>> {
        let m = &self.coefficients[self.epochs.index_of(master)?];
        let s = &self.coefficients[self.epochs.index_of(slave)?];
        Ok(s - m)
    }
}

/// Joint least-squares fit of per-epoch orbital surfaces
pub fn estimate_network_model(ifgs: &[Ifg], degree: PolyDegree, offset: bool) -> OrbitalResult<NetworkModel> {
    let num_cells = check_consistent_geometry(ifgs)?;
    let epochs = EpochIndex::from_ifgs(ifgs);

    let vphase: Array1<f64> = ifgs
        .iter()
        .flat_map(|ifg| ifg.phase_data.iter().map(|&v| v as f64))
        .collect();
    let dm = assemble(ifgs, &epochs, num_cells, degree, offset)?;

    if vphase.iter().filter(|v| !v.is_nan()).count() < dm.ncols() {
        log::warn!(
            "Network system has fewer valid observations than {} unknowns",
            dm.ncols()
        );
    }

    let model = solve_min_norm(dm.view(), vphase.view(), NETWORK_RCOND)?;

    let ncoef = num_params(degree, false);
    let coefficients = model
        .exact_chunks(ncoef)
        .into_iter()
        .take(epochs.len())
        .map(|chunk| chunk.to_owned())
        .collect();
    let offsets = offset.then(|| model.slice(ndarray::s![epochs.len() * ncoef..]).to_owned());

    Ok(NetworkModel {
        degree,
        epochs,
        coefficients,
        offsets,
    })
}

/// Network method orbital correction, in place
///
/// The model is estimated from `multilooked` when given, else from `ifgs`
/// themselves. With `offset`, each corrected interferogram is additionally
/// re-centred on the median of its residual; the jointly fitted offsets are
/// not reused.
pub fn network_correction(
    ifgs: &mut [Ifg],
    degree: PolyDegree,
    offset: bool,
    multilooked: Option<&[Ifg]>,
) -> OrbitalResult<()> {
    check_consistent_geometry(ifgs)?;
    if let Some(mlooked) = multilooked {
        validate_multilooked(mlooked, ifgs)?;
    }

    let model = match multilooked {
        Some(mlooked) => estimate_network_model(mlooked, degree, offset)?,
        None => estimate_network_model(ifgs, degree, offset)?,
    };

    // every ifg shares the geometry of the first
    let dm = build_pixel_design_matrix(&ifgs[0], degree, false);
    let shape = ifgs[0].shape();

    // compute all surfaces before touching any phase data
    let surfaces = ifgs
        .iter()
        .map(|ifg| {
            let coefs = model.pair_coefficients(&ifg.master, &ifg.slave)?;
            reshape_surface(dm.dot(&coefs), shape)
        })
        .collect::<OrbitalResult<Vec<_>>>()?;

    for (ifg, surface) in ifgs.iter_mut().zip(&surfaces) {
        let bias = if offset {
            residual_median(ifg, surface).unwrap_or_else(|| {
                log::warn!("{} has no valid pixels, skipping offset", ifg.label());
                0.0
            })
        } else {
            0.0
        };
        subtract_surface(ifg, surface, bias);
    }

    Ok(())
}

fn reshape_surface(flat: Array1<f64>, shape: (usize, usize)) -> OrbitalResult<Array2<f64>> {
    flat.into_shape(shape)
        .map_err(|e| OrbitalError::DimensionMismatch(format!("cannot reshape orbital surface: {}", e)))
}

fn subtract_surface(ifg: &mut Ifg, surface: &Array2<f64>, bias: f64) {
    Zip::from(&mut ifg.phase_data)
        .and(surface)
        .for_each(|p, &s| *p -= (s + bias) as f32);
}

/// Median of phase minus surface over valid pixels
fn residual_median(ifg: &Ifg, surface: &Array2<f64>) -> Option<f64> {
    let residual: Vec<f64> = ifg
        .phase_data
        .iter()
        .zip(surface.iter())
        .filter(|(p, _)| !p.is_nan())
        .map(|(&p, &s)| p as f64 - s)
        .collect();
    median(residual)
}

pub(crate) fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
