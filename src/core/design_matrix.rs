use crate::types::{Ifg, PolyDegree};
use ndarray::Array2;

/// Number of model parameters for a polynomial degree, plus one if the
/// constant offset is modelled
pub fn num_params(degree: PolyDegree, offset: bool) -> usize {
    degree.num_terms() + usize::from(offset)
}

/// Design matrix for one interferogram: one row per pixel (row-major, same
/// order as the phase array flattening), one column per model parameter.
pub fn build_pixel_design_matrix(ifg: &Ifg, degree: PolyDegree, offset: bool) -> Array2<f64> {
    build_design_matrix(ifg.nrows(), ifg.ncols(), ifg.x_size, ifg.y_size, ifg.origin, degree, offset)
}

/// Design matrix from raw grid geometry
///
/// Pixel coordinates are multiplied by the cell size so that the fitted
/// coefficients are expressed per unit distance rather than per pixel.
/// `origin` is the (x, y) coordinate of the first pixel.
pub fn build_design_matrix(
    nrows: usize,
    ncols: usize,
    x_size: f64,
    y_size: f64,
    origin: (f64, f64),
    degree: PolyDegree,
    offset: bool,
) -> Array2<f64> {
    let num_cells = nrows * ncols;
    let nparams = num_params(degree, offset);
    let mut data = Array2::<f64>::zeros((num_cells, nparams));

    for row in 0..nrows {
        let y = origin.1 + row as f64 * y_size;
        for col in 0..ncols {
            let x = origin.0 + col as f64 * x_size;
            let mut out = data.row_mut(row * ncols + col);

            match degree {
                PolyDegree::Planar => {
                    out[0] = x;
                    out[1] = y;
                }
                PolyDegree::Quadratic => {
                    out[0] = x * x;
                    out[1] = y * y;
                    out[2] = x * y;
                    out[3] = x;
                    out[4] = y;
                }
                PolyDegree::PartCubic => {
                    out[0] = x * y * y;
                    out[1] = x * x;
                    out[2] = y * y;
                    out[3] = x * y;
                    out[4] = x;
                    out[5] = y;
                }
            }

            if offset {
                out[nparams - 1] = 1.0;
            }
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PhaseImage;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use ndarray::s;

    fn test_ifg(nrows: usize, ncols: usize) -> Ifg {
        Ifg::new(
            PhaseImage::zeros((nrows, ncols)),
            0.6,
            0.7,
            NaiveDate::from_ymd_opt(2006, 6, 19).unwrap(),
            NaiveDate::from_ymd_opt(2006, 10, 2).unwrap(),
        )
    }

    #[test]
    fn test_num_params() {
        assert_eq!(num_params(PolyDegree::Planar, false), 2);
        assert_eq!(num_params(PolyDegree::Quadratic, false), 5);
        assert_eq!(num_params(PolyDegree::PartCubic, false), 6);
        assert_eq!(num_params(PolyDegree::Planar, true), 3);
        assert_eq!(num_params(PolyDegree::Quadratic, true), 6);
        assert_eq!(num_params(PolyDegree::PartCubic, true), 7);
    }

    #[test]
    fn test_design_matrix_planar() {
        let ifg = test_ifg(2, 3);
        let dm = build_pixel_design_matrix(&ifg, PolyDegree::Planar, true);
        assert_eq!(dm.dim(), (6, 3));

        // row-major: second row of the grid starts at index 3
        assert_abs_diff_eq!(dm[[0, 0]], 0.0);
        assert_abs_diff_eq!(dm[[2, 0]], 1.2, epsilon = 1e-12);
        assert_abs_diff_eq!(dm[[2, 1]], 0.0);
        assert_abs_diff_eq!(dm[[3, 0]], 0.0);
        assert_abs_diff_eq!(dm[[3, 1]], 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(dm[[5, 0]], 1.2, epsilon = 1e-12);
        assert!(dm.column(2).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_design_matrix_quadratic_terms() {
        let ifg = test_ifg(3, 5);
        let dm = build_pixel_design_matrix(&ifg, PolyDegree::Quadratic, false);
        assert_eq!(dm.dim(), (15, 5));

        // pixel (row 2, col 4)
        let (x, y) = (4.0 * 0.6, 2.0 * 0.7);
        let r = dm.row(14);
        assert_abs_diff_eq!(r[0], x * x, epsilon = 1e-12);
        assert_abs_diff_eq!(r[1], y * y, epsilon = 1e-12);
        assert_abs_diff_eq!(r[2], x * y, epsilon = 1e-12);
        assert_abs_diff_eq!(r[3], x, epsilon = 1e-12);
        assert_abs_diff_eq!(r[4], y, epsilon = 1e-12);
    }

    #[test]
    fn test_design_matrix_part_cubic_terms() {
        let ifg = test_ifg(3, 4);
        let dm = build_pixel_design_matrix(&ifg, PolyDegree::PartCubic, false);
        assert_eq!(dm.dim(), (12, 6));

        let (x, y) = (3.0 * 0.6, 1.0 * 0.7);
        let r = dm.row(7);
        assert_abs_diff_eq!(r[0], x * y * y, epsilon = 1e-12);
        assert_abs_diff_eq!(r[1], x * x, epsilon = 1e-12);
        assert_abs_diff_eq!(r[5], y, epsilon = 1e-12);
    }

    #[test]
    fn test_design_matrix_origin_shift() {
        let mut ifg = test_ifg(2, 3);
        ifg.origin = (0.3, 0.35);
        let dm = build_pixel_design_matrix(&ifg, PolyDegree::Planar, false);

        assert_abs_diff_eq!(dm[[0, 0]], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(dm[[0, 1]], 0.35, epsilon = 1e-12);
        assert_abs_diff_eq!(dm[[5, 0]], 0.3 + 1.2, epsilon = 1e-12);
        assert_abs_diff_eq!(dm[[5, 1]], 0.35 + 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_offset_column_only_difference() {
        let ifg = test_ifg(4, 3);
        for degree in PolyDegree::ALL {
            let with = build_pixel_design_matrix(&ifg, degree, true);
            let without = build_pixel_design_matrix(&ifg, degree, false);
            let n = num_params(degree, false);

            assert_eq!(with.ncols(), n + 1);
            assert_eq!(with.slice(s![.., ..n]), without);
            assert!(with.column(n).iter().all(|&v| v == 1.0));
        }
    }
}
