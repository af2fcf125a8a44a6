use chrono::NaiveDate;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Acquisition epoch identifier
pub type Epoch = NaiveDate;

/// Unwrapped phase value (radians or millimetres, caller's choice)
pub type Phase = f32;

/// 2D unwrapped phase array (rows x cols), NaN marks no-data
pub type PhaseImage = Array2<Phase>;

/// Polynomial degree of the modelled orbital surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolyDegree {
    /// x, y
    Planar,
    /// x², y², xy, x, y
    Quadratic,
    /// xy², x², y², xy, x, y
    PartCubic,
}

impl PolyDegree {
    pub const ALL: [PolyDegree; 3] = [PolyDegree::Planar, PolyDegree::Quadratic, PolyDegree::PartCubic];

    /// Number of polynomial terms, excluding any offset column
    pub fn num_terms(self) -> usize {
        match self {
            PolyDegree::Planar => 2,
            PolyDegree::Quadratic => 5,
            PolyDegree::PartCubic => 6,
        }
    }
}

impl fmt::Display for PolyDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolyDegree::Planar => write!(f, "planar"),
            PolyDegree::Quadratic => write!(f, "quadratic"),
            PolyDegree::PartCubic => write!(f, "part-cubic"),
        }
    }
}

impl TryFrom<i64> for PolyDegree {
    type Error = OrbitalError;

    /// Legacy numeric codes: 1 = planar, 2 = quadratic, 3 = part-cubic
    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(PolyDegree::Planar),
            2 => Ok(PolyDegree::Quadratic),
            3 => Ok(PolyDegree::PartCubic),
            other => Err(OrbitalError::InvalidDegree(other.to_string())),
        }
    }
}

impl FromStr for PolyDegree {
    type Err = OrbitalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "planar" | "1" => Ok(PolyDegree::Planar),
            "quadratic" | "2" => Ok(PolyDegree::Quadratic),
            "part-cubic" | "partcubic" | "3" => Ok(PolyDegree::PartCubic),
            _ => Err(OrbitalError::InvalidDegree(s.to_string())),
        }
    }
}

/// Orbital correction estimation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrectionMethod {
    /// Fit each interferogram on its own
    Independent,
    /// Joint fit of per-epoch surfaces across the whole network
    Network,
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionMethod::Independent => write!(f, "independent"),
            CorrectionMethod::Network => write!(f, "network"),
        }
    }
}

impl TryFrom<i64> for CorrectionMethod {
    type Error = OrbitalError;

    /// Legacy numeric codes: 1 = independent, 2 = network
    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(CorrectionMethod::Independent),
            2 => Ok(CorrectionMethod::Network),
            other => Err(OrbitalError::InvalidMethod(other.to_string())),
        }
    }
}

impl FromStr for CorrectionMethod {
    type Err = OrbitalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "independent" | "1" => Ok(CorrectionMethod::Independent),
            "network" | "2" => Ok(CorrectionMethod::Network),
            _ => Err(OrbitalError::InvalidMethod(s.to_string())),
        }
    }
}

/// Unwrapped interferogram between two acquisition epochs
#[derive(Debug, Clone)]
pub struct Ifg {
    /// Phase values, row-major, NaN = no-data
    pub phase_data: PhaseImage,
    /// Pixel size along x (columns)
    pub x_size: f64,
    /// Pixel size along y (rows)
    pub y_size: f64,
    /// Coordinates of the first pixel, (x, y)
    ///
    /// Zero at full resolution. A multilooked interferogram sits at the
    /// centre of its first look window.
    pub origin: (f64, f64),
    /// Earlier (reference) acquisition
    pub master: Epoch,
    /// Later (secondary) acquisition
    pub slave: Epoch,
    /// Source name, if the interferogram came from a file
    pub name: Option<String>,
}

impl Ifg {
    pub fn new(phase_data: PhaseImage, x_size: f64, y_size: f64, master: Epoch, slave: Epoch) -> Self {
        Self {
            phase_data,
            x_size,
            y_size,
            origin: (0.0, 0.0),
            master,
            slave,
            name: None,
        }
    }

    pub fn nrows(&self) -> usize {
        self.phase_data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.phase_data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.phase_data.dim()
    }

    pub fn num_cells(&self) -> usize {
        self.phase_data.len()
    }

    pub fn epochs(&self) -> (Epoch, Epoch) {
        (self.master, self.slave)
    }

    /// Number of no-data pixels
    pub fn nan_count(&self) -> usize {
        self.phase_data.iter().filter(|v| v.is_nan()).count()
    }

    pub fn nan_fraction(&self) -> f64 {
        if self.num_cells() == 0 {
            return 0.0;
        }
        self.nan_count() as f64 / self.num_cells() as f64
    }

    /// Human readable identifier used in log and error messages
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}-{}", self.master, self.slave),
        }
    }
}

/// Error types for orbital correction
#[derive(Debug, thiserror::Error)]
pub enum OrbitalError {
    #[error("Invalid degree of {0} for orbital correction")]
    InvalidDegree(String),

    #[error("Unknown method '{0}', need independent or network method")]
    InvalidMethod(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Mismatching multilooked interferograms: {0}")]
    MultilookMismatch(String),

    #[error("Invalid number of interferograms: at least one is required")]
    EmptyCollection,

    #[error("Interferogram {index} has {found} cells, expected {expected}")]
    GeometryMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("No valid (non-NaN) observations to fit")]
    NoValidData,

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Orbital fit failed for interferogram {master}-{slave}: {source}")]
    FitFailed {
        master: Epoch,
        slave: Epoch,
        #[source]
        source: Box<OrbitalError>,
    },

    #[error("Cannot parse epochs from '{0}'")]
    EpochParse(String),
}

/// Result type for orbital correction operations
pub type OrbitalResult<T> = Result<T, OrbitalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_codes() {
        assert_eq!(PolyDegree::try_from(1).unwrap(), PolyDegree::Planar);
        assert_eq!(PolyDegree::try_from(3).unwrap(), PolyDegree::PartCubic);
        for code in [-5, -1, 0, 4, 5] {
            assert!(matches!(PolyDegree::try_from(code), Err(OrbitalError::InvalidDegree(_))));
        }
        assert_eq!("Part_Cubic".parse::<PolyDegree>().unwrap(), PolyDegree::PartCubic);
        assert!("cubic".parse::<PolyDegree>().is_err());
    }

    #[test]
    fn test_method_codes() {
        assert_eq!(CorrectionMethod::try_from(2).unwrap(), CorrectionMethod::Network);
        for code in [-3, -1, 0, 5, 45] {
            assert!(matches!(CorrectionMethod::try_from(code), Err(OrbitalError::InvalidMethod(_))));
        }
        assert_eq!(" Network ".parse::<CorrectionMethod>().unwrap(), CorrectionMethod::Network);
        assert!("mst".parse::<CorrectionMethod>().is_err());
    }

    #[test]
    fn test_ifg_accessors() {
        let mut phase = PhaseImage::zeros((2, 3));
        phase[[1, 2]] = f32::NAN;
        let master = NaiveDate::from_ymd_opt(2006, 6, 19).unwrap();
        let slave = NaiveDate::from_ymd_opt(2006, 10, 2).unwrap();
        let ifg = Ifg::new(phase, 90.0, 89.5, master, slave);

        assert_eq!(ifg.shape(), (2, 3));
        assert_eq!(ifg.num_cells(), 6);
        assert_eq!(ifg.nan_count(), 1);
        assert!((ifg.nan_fraction() - 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(ifg.label(), "2006-06-19-2006-10-02");
    }
}
