//! Python bindings

use crate::core::{OrbitalCorrector, OrbitalParams};
use crate::types::{CorrectionMethod, Epoch, Ifg, PolyDegree};
use numpy::{PyReadonlyArray2, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyList;

fn parse_date(value: &str) -> PyResult<Epoch> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| PyValueError::new_err(format!("Invalid epoch '{}': {}", value, e)))
}

/// Remove orbital error from a list of float32 phase arrays
///
/// `epochs` holds one (master, slave) pair of ISO dates per array. Returns
/// the corrected arrays in the same order.
#[pyfunction]
#[pyo3(signature = (phases, epochs, x_size, y_size, degree="planar", method="independent", offset=true, looks=(1, 1)))]
#[allow(clippy::too_many_arguments)]
fn orbital_correction(
    py: Python,
    phases: Vec<PyReadonlyArray2<f32>>,
    epochs: Vec<(String, String)>,
    x_size: f64,
    y_size: f64,
    degree: &str,
    method: &str,
    offset: bool,
    looks: (usize, usize),
) -> PyResult<PyObject> {
    if phases.len() != epochs.len() {
        return Err(PyValueError::new_err(format!(
            "{} phase arrays but {} epoch pairs",
            phases.len(),
            epochs.len()
        )));
    }

    let degree: PolyDegree = degree.parse().map_err(|e| PyValueError::new_err(format!("{}", e)))?;
    let method: CorrectionMethod = method.parse().map_err(|e| PyValueError::new_err(format!("{}", e)))?;

    let mut ifgs = phases
        .iter()
        .zip(&epochs)
        .map(|(phase, (master, slave))| -> PyResult<Ifg> {
            Ok(Ifg::new(
                phase.as_array().to_owned(),
                x_size,
                y_size,
                parse_date(master)?,
                parse_date(slave)?,
            ))
        })
        .collect::<PyResult<Vec<_>>>()?;

    let corrector = OrbitalCorrector::new(OrbitalParams {
        degree,
        method,
        offset,
        looks,
        ..OrbitalParams::default()
    })
    .map_err(|e| PyValueError::new_err(format!("{}", e)))?;

    corrector
        .correct(&mut ifgs)
        .map_err(|e| PyValueError::new_err(format!("Orbital correction failed: {}", e)))?;

    let result = PyList::empty(py);
    for ifg in &ifgs {
        result.append(ifg.phase_data.to_pyarray(py))?;
    }
    Ok(result.into())
}

/// Python module definition
#[pymodule]
fn _orbfit(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(orbital_correction, m)?)?;
    Ok(())
}
