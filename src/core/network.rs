use crate::core::design_matrix::{build_pixel_design_matrix, num_params};
use crate::types::{Epoch, Ifg, OrbitalError, OrbitalResult, PolyDegree};
use ndarray::{s, Array2};
use std::collections::HashMap;

/// Mapping from epoch to a dense column-block index
///
/// Indices are handed out in first-seen order over all master epochs, then
/// all slave epochs, of the collection.
#[derive(Debug, Clone, Default)]
pub struct EpochIndex {
    ids: HashMap<Epoch, usize>,
    epochs: Vec<Epoch>,
}

impl EpochIndex {
    pub fn from_ifgs(ifgs: &[Ifg]) -> Self {
        let masters = ifgs.iter().map(|ifg| ifg.master);
        let slaves = ifgs.iter().map(|ifg| ifg.slave);
        let mut index = Self::default();
        for epoch in masters.chain(slaves) {
            index.insert(epoch);
        }
        index
    }

    fn insert(&mut self, epoch: Epoch) {
        if !self.ids.contains_key(&epoch) {
            self.ids.insert(epoch, self.epochs.len());
            self.epochs.push(epoch);
        }
    }

    pub fn get(&self, epoch: &Epoch) -> Option<usize> {
        self.ids.get(epoch).copied()
    }

    /// Index of an epoch known to belong to the collection
    pub fn index_of(&self, epoch: &Epoch) -> OrbitalResult<usize> {
        self.get(epoch)
            .ok_or_else(|| OrbitalError::InvalidParameter(format!("epoch {} is not part of the network", epoch)))
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Epochs in index order
    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }
}

/// Check that every interferogram has the same number of cells as the first
pub fn check_consistent_geometry(ifgs: &[Ifg]) -> OrbitalResult<usize> {
    let first = ifgs.first().ok_or(OrbitalError::EmptyCollection)?;
    let expected = first.num_cells();

    for (index, ifg) in ifgs.iter().enumerate().skip(1) {
        if ifg.num_cells() != expected {
            return Err(OrbitalError::GeometryMismatch {
                index,
                expected,
                found: ifg.num_cells(),
            });
        }
    }

    Ok(expected)
}

/// Block design matrix for the network method
///
/// Shape is `(num_cells * n_ifgs, ncoef * n_epochs [+ n_ifgs])`. Each
/// interferogram owns one row block holding the pixel design matrix negated
/// under its master epoch and positive under its slave epoch. With `offset`,
/// one extra indicator column per interferogram follows the epoch blocks.
/// Rows for NaN pixels are included; filtering happens in the solver.
pub fn build_network_design_matrix(ifgs: &[Ifg], degree: PolyDegree, offset: bool) -> OrbitalResult<Array2<f64>> {
    let num_cells = check_consistent_geometry(ifgs)?;
    let index = EpochIndex::from_ifgs(ifgs);
    assemble(ifgs, &index, num_cells, degree, offset)
}

pub(crate) fn assemble(
    ifgs: &[Ifg],
    index: &EpochIndex,
    num_cells: usize,
    degree: PolyDegree,
    offset: bool,
) -> OrbitalResult<Array2<f64>> {
    let nifgs = ifgs.len();
    let nepochs = index.len();
    let ncoef = num_params(degree, false);
    let offset_col = nepochs * ncoef;
    let ncols = if offset { offset_col + nifgs } else { offset_col };

    log::debug!(
        "Assembling network design matrix: {} ifgs, {} epochs, {}x{}",
        nifgs,
        nepochs,
        num_cells * nifgs,
        ncols
    );

    let mut ndm = Array2::<f64>::zeros((num_cells * nifgs, ncols));

    // geometry is shared, so one template serves every row block
    let template = build_pixel_design_matrix(&ifgs[0], degree, false);
    let negated = template.mapv(|v| -v);

    for (i, ifg) in ifgs.iter().enumerate() {
        let rs = i * num_cells;
        let re = rs + num_cells;
        let m = index.index_of(&ifg.master)? * ncoef;
        let s = index.index_of(&ifg.slave)? * ncoef;

        ndm.slice_mut(s![rs..re, m..m + ncoef]).assign(&negated);
        ndm.slice_mut(s![rs..re, s..s + ncoef]).assign(&template);

        if offset {
            ndm.slice_mut(s![rs..re, offset_col + i]).fill(1.0);
        }
    }

    Ok(ndm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PhaseImage;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Epoch {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ifg(master: Epoch, slave: Epoch) -> Ifg {
        Ifg::new(PhaseImage::zeros((4, 3)), 90.0, 89.5, master, slave)
    }

    #[test]
    fn test_epoch_index_first_seen_order() {
        let (a, b, c) = (date(2006, 6, 19), date(2006, 8, 28), date(2006, 10, 2));
        let ifgs = vec![ifg(b, c), ifg(a, b)];
        let index = EpochIndex::from_ifgs(&ifgs);

        assert_eq!(index.len(), 3);
        assert_eq!(index.get(&b), Some(0));
        assert_eq!(index.get(&a), Some(1));
        assert_eq!(index.get(&c), Some(2));
        assert_eq!(index.epochs(), &[b, a, c]);
        assert!(index.index_of(&date(2007, 1, 1)).is_err());
    }

    #[test]
    fn test_empty_collection_rejected() {
        let result = build_network_design_matrix(&[], PolyDegree::Planar, true);
        assert!(matches!(result, Err(OrbitalError::EmptyCollection)));
    }

    #[test]
    fn test_mixed_geometry_rejected() {
        let (a, b, c) = (date(2006, 6, 19), date(2006, 8, 28), date(2006, 10, 2));
        let mut ifgs = vec![ifg(a, b), ifg(b, c)];
        ifgs[1].phase_data = PhaseImage::zeros((2, 3));

        match build_network_design_matrix(&ifgs, PolyDegree::Planar, false) {
            Err(OrbitalError::GeometryMismatch { index, expected, found }) => {
                assert_eq!((index, expected, found), (1, 12, 6));
            }
            other => panic!("expected geometry mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_single_ifg_network() {
        let ifgs = vec![ifg(date(2006, 6, 19), date(2006, 10, 2))];
        let ndm = build_network_design_matrix(&ifgs, PolyDegree::Planar, true).unwrap();
        assert_eq!(ndm.dim(), (12, 5));
        assert!(ndm.column(4).iter().all(|&v| v == 1.0));
    }
}
