//! Two-phase simplex LP solver over a dense tableau, with a small
//! constraint DSL, a dual formulation sharing the same pivot engine, and
//! the negative-variable splitting trick.
//!
//! The tableau representation here is row-major (one row per constraint,
//! reduced costs kept in a single row) rather than the column-of-structs
//! shape sketched informally elsewhere: the pivot arithmetic is identical
//! either way, and a dense row tableau is the simpler of the two to keep
//! correct under Bland's rule.

use crate::array::Array;
use numopt_core::errors::{Error, Result};
use numopt_core::Real;

/// Relational operator of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`.
    Eq,
    /// `≤`.
    Le,
    /// `≥`.
    Ge,
}

/// A linear constraint `coeffs · x <op> rhs`.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Coefficient vector, length equal to the number of decision variables.
    pub coeffs: Array,
    /// Relational operator.
    pub op: Operator,
    /// Right-hand side.
    pub rhs: Real,
}

impl Constraint {
    /// Build a constraint directly.
    pub fn new(coeffs: Array, op: Operator, rhs: Real) -> Self {
        Self { coeffs, op, rhs }
    }
}

/// Builder methods for turning a coefficient vector into a [`Constraint`].
pub trait LinearExpr {
    /// `self · x = rhs`.
    fn equ(&self, rhs: Real) -> Constraint;
    /// `self · x ≤ rhs`.
    fn le(&self, rhs: Real) -> Constraint;
    /// `self · x ≥ rhs`.
    fn ge(&self, rhs: Real) -> Constraint;
}

impl LinearExpr for Array {
    fn equ(&self, rhs: Real) -> Constraint {
        Constraint::new(self.clone(), Operator::Eq, rhs)
    }
    fn le(&self, rhs: Real) -> Constraint {
        Constraint::new(self.clone(), Operator::Le, rhs)
    }
    fn ge(&self, rhs: Real) -> Constraint {
        Constraint::new(self.clone(), Operator::Ge, rhs)
    }
}

/// A constraint whose left-hand side is a general closure rather than a
/// known coefficient vector. The solver only accepts it once it has been
/// linearised by [`linearize`].
pub struct GeneralConstraint<'a> {
    /// The closure being probed for linearity.
    pub f: &'a dyn Fn(&Array) -> Real,
    /// Relational operator.
    pub op: Operator,
    /// Right-hand side.
    pub rhs: Real,
}

/// Probe `f` at `{0, e1, .., en}` and a further combined point, and
/// accept the affine fit within `tol`; otherwise fail with
/// [`Error::NonLinearConstraint`].
pub fn linearize(gc: &GeneralConstraint, n: usize, tol: Real) -> Result<Constraint> {
    if n == 0 {
        return Err(Error::InvalidArgument(
            "cannot linearise a constraint over zero variables".into(),
        ));
    }
    let zero = Array::zeros(n);
    let f0 = (gc.f)(&zero);
    let mut coeffs = vec![0.0; n];
    for i in 0..n {
        let mut e = Array::zeros(n);
        e[i] = 1.0;
        coeffs[i] = (gc.f)(&e) - f0;
    }

    let probe = Array::from_vec(vec![1.0; n]);
    let predicted = f0 + coeffs.iter().sum::<Real>();
    let actual = (gc.f)(&probe);
    let scale = actual.abs().max(predicted.abs()).max(1.0);
    if (predicted - actual).abs() > tol.max(1e-9) * scale {
        return Err(Error::NonLinearConstraint(format!(
            "closure does not fit an affine model: predicted {predicted}, got {actual}"
        )));
    }

    Ok(Constraint::new(
        Array::from_vec(coeffs),
        gc.op,
        gc.rhs - f0,
    ))
}

/// Whether the LP maximises or minimises its objective.
#[derive(Debug, Clone)]
enum Sense {
    Min(Array),
    Max(Array),
}

/// Builds an LP problem: `min(c) | max(c)` followed by `subject_to`.
#[derive(Debug, Clone)]
pub struct LpBuilder {
    sense: Sense,
    constraints: Vec<Constraint>,
    split_negative: bool,
}

/// Configuration for [`LpBuilder::solve`].
#[derive(Debug, Clone, Copy)]
pub struct SimplexConfig {
    /// Tolerance used for feasibility/optimality comparisons.
    pub tol: Real,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self { tol: 1e-9 }
    }
}

/// A solved LP: the decision-variable vector (in the caller's original
/// ordering) and the objective value.
#[derive(Debug, Clone)]
pub struct LpSolution {
    /// Decision variables.
    pub x: Array,
    /// Objective value (in the caller's `min`/`max` sense, not the
    /// internal minimisation form).
    pub objective: Real,
}

impl LpBuilder {
    /// Minimise `c · x`.
    pub fn min(c: Array) -> Self {
        Self {
            sense: Sense::Min(c),
            constraints: Vec::new(),
            split_negative: false,
        }
    }

    /// Maximise `c · x`.
    pub fn max(c: Array) -> Self {
        Self {
            sense: Sense::Max(c),
            constraints: Vec::new(),
            split_negative: false,
        }
    }

    /// Append constraints.
    pub fn subject_to(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// Apply the standard variable-splitting trick (`x = x⁺ − x⁻`) so
    /// decision variables are not implicitly bounded below by zero.
    pub fn with_negative_variables(mut self) -> Self {
        self.split_negative = true;
        self
    }

    fn num_vars(&self) -> usize {
        match &self.sense {
            Sense::Min(c) | Sense::Max(c) => c.size(),
        }
    }

    /// Solve the primal problem with the standard two-phase simplex.
    pub fn solve(&self, cfg: &SimplexConfig) -> Result<LpSolution> {
        let n = self.num_vars();
        if n == 0 {
            return Err(Error::InvalidArgument(
                "LP requires a non-empty objective".into(),
            ));
        }
        for c in &self.constraints {
            if c.coeffs.size() != n {
                return Err(Error::InvalidArgument(format!(
                    "constraint has {} coefficients, expected {n}",
                    c.coeffs.size()
                )));
            }
        }

        let (minimize_c, flip_sign) = match &self.sense {
            Sense::Min(c) => (c.clone(), false),
            Sense::Max(c) => (c.scale(-1.0), true),
        };

        let var_cols = if self.split_negative { 2 * n } else { n };
        let mut cost = vec![0.0; var_cols];
        for j in 0..n {
            cost[j] = minimize_c[j];
            if self.split_negative {
                cost[n + j] = -minimize_c[j];
            }
        }

        let mut tableau = build_tableau(&self.constraints, var_cols, n, self.split_negative)?;
        cost.resize(tableau.num_cols, 0.0);
        let x_full = solve_tableau(&mut tableau, &cost, cfg)?;

        let x = if self.split_negative {
            Array::from_vec((0..n).map(|j| x_full[j] - x_full[n + j]).collect())
        } else {
            Array::from_vec(x_full[0..n].to_vec())
        };

        let raw_objective = minimize_c.dot(&x);
        let objective = if flip_sign { -raw_objective } else { raw_objective };
        Ok(LpSolution { x, objective })
    }

    /// Solve the dual of this problem (built by transposing the primal)
    /// through the same pivot engine, mapping the result back to the
    /// primal's decision-variable ordering via strong duality: the primal
    /// optimum equals the dual optimum, and the dual solution vector `y`
    /// is itself returned as `LpSolution::x` since it is the dual's own
    /// decision vector. Requires a maximisation problem with only `≤`
    /// constraints (the canonical form a dual transpose assumes).
    pub fn solve_dual(&self, cfg: &SimplexConfig) -> Result<LpSolution> {
        let n = self.num_vars();
        let c = match &self.sense {
            Sense::Max(c) => c.clone(),
            Sense::Min(_) => {
                return Err(Error::InvalidArgument(
                    "dual transpose requires a maximisation problem".into(),
                ))
            }
        };
        if self.constraints.iter().any(|c| c.op != Operator::Le) {
            return Err(Error::InvalidArgument(
                "dual transpose requires every constraint to be ≤".into(),
            ));
        }

        let m = self.constraints.len();
        let b = Array::from_vec(self.constraints.iter().map(|c| c.rhs).collect());
        let mut dual_rows = Vec::with_capacity(n);
        for j in 0..n {
            let coeffs = Array::from_vec(
                self.constraints
                    .iter()
                    .map(|constraint| constraint.coeffs[j])
                    .collect(),
            );
            dual_rows.push(coeffs.ge(c[j]));
        }

        let dual = LpBuilder::min(b).subject_to(dual_rows);
        dual.solve(cfg)
    }
}

/// The dense tableau: `a` holds the constraint coefficients (including
/// slack/excess/artificial columns), `b` the right-hand side, `basis[i]`
/// the column currently basic in row `i`.
struct Tableau {
    a: Vec<Vec<Real>>,
    b: Vec<Real>,
    basis: Vec<usize>,
    artificial_cols: Vec<usize>,
    num_cols: usize,
}

fn build_tableau(
    constraints: &[Constraint],
    var_cols: usize,
    n: usize,
    split_negative: bool,
) -> Result<Tableau> {
    let m = constraints.len();
    if m == 0 {
        return Err(Error::InvalidArgument(
            "LP requires at least one constraint".into(),
        ));
    }

    // Slack/excess columns: one per row. Artificial columns added lazily,
    // one per row that still lacks a ready-made basic column after slack
    // introduction (every `Ge` and `Eq` row).
    let mut a: Vec<Vec<Real>> = Vec::with_capacity(m);
    let mut b: Vec<Real> = Vec::with_capacity(m);
    let mut slack_sign: Vec<Real> = Vec::with_capacity(m);
    let mut needs_artificial: Vec<bool> = Vec::with_capacity(m);

    for c in constraints {
        let mut row = vec![0.0; var_cols];
        for j in 0..n {
            row[j] = c.coeffs[j];
            if split_negative {
                row[n + j] = -c.coeffs[j];
            }
        }
        let mut rhs = c.rhs;
        let mut op = c.op;
        if rhs < 0.0 {
            for v in row.iter_mut() {
                *v = -*v;
            }
            rhs = -rhs;
            op = match op {
                Operator::Le => Operator::Ge,
                Operator::Ge => Operator::Le,
                Operator::Eq => Operator::Eq,
            };
        }
        let sign = match op {
            Operator::Le => 1.0,
            Operator::Ge => -1.0,
            Operator::Eq => 0.0,
        };
        needs_artificial.push(op != Operator::Le);
        slack_sign.push(sign);
        a.push(row);
        b.push(rhs);
    }

    let num_slack = slack_sign.iter().filter(|&&s| s != 0.0).count();
    let num_artificial = needs_artificial.iter().filter(|&&v| v).count();
    let num_cols = var_cols + num_slack + num_artificial;

    for row in a.iter_mut() {
        row.resize(num_cols, 0.0);
    }

    let mut basis = vec![0usize; m];
    let mut artificial_cols = Vec::new();
    let mut next_col = var_cols;
    for i in 0..m {
        if slack_sign[i] != 0.0 {
            a[i][next_col] = slack_sign[i];
            if slack_sign[i] > 0.0 {
                basis[i] = next_col;
            }
            next_col += 1;
        }
    }
    for i in 0..m {
        if needs_artificial[i] {
            a[i][next_col] = 1.0;
            basis[i] = next_col;
            artificial_cols.push(next_col);
            next_col += 1;
        }
    }
    debug_assert_eq!(next_col, num_cols);

    Ok(Tableau {
        a,
        b,
        basis,
        artificial_cols,
        num_cols,
    })
}

/// Price out the current basis against `cost`, producing the reduced
/// cost row `cost − cᵦ·B⁻¹A` (here `B⁻¹A` is just `a` itself, since the
/// tableau is always kept in canonical form with an identity basis).
fn reduced_costs(tableau: &Tableau, cost: &[Real]) -> Vec<Real> {
    let mut row = cost.to_vec();
    for (i, &basic_col) in tableau.basis.iter().enumerate() {
        let c_b = cost[basic_col];
        if c_b != 0.0 {
            for j in 0..tableau.num_cols {
                row[j] -= c_b * tableau.a[i][j];
            }
        }
    }
    row
}

fn reduced_cost_obj(tableau: &Tableau, cost: &[Real]) -> Real {
    tableau
        .basis
        .iter()
        .zip(tableau.b.iter())
        .map(|(&col, &bi)| cost[col] * bi)
        .sum()
}

/// Entering column: most negative reduced cost, Bland's-rule tie-break on
/// smallest column index among ties within `tol`.
fn find_entering(reduced: &[Real], tol: Real) -> Option<usize> {
    let mut best: Option<(usize, Real)> = None;
    for (j, &rc) in reduced.iter().enumerate() {
        if rc < -tol {
            match best {
                Some((_, best_rc)) if rc < best_rc - tol => best = Some((j, rc)),
                None => best = Some((j, rc)),
                _ => {}
            }
        }
    }
    best.map(|(j, _)| j)
}

/// Leaving row: minimum ratio `b[i]/a[i][col]` over rows with
/// `a[i][col] > tol`, Bland's-rule tie-break on smallest basic-column
/// index.
fn find_leaving(tableau: &Tableau, col: usize, tol: Real) -> Option<usize> {
    let mut best: Option<(usize, Real)> = None;
    for i in 0..tableau.a.len() {
        let coeff = tableau.a[i][col];
        if coeff > tol {
            let ratio = tableau.b[i] / coeff;
            match best {
                None => best = Some((i, ratio)),
                Some((bi, br)) => {
                    if ratio < br - tol {
                        best = Some((i, ratio));
                    } else if (ratio - br).abs() <= tol && tableau.basis[i] < tableau.basis[bi] {
                        best = Some((i, ratio));
                    }
                }
            }
        }
    }
    best.map(|(i, _)| i)
}

fn pivot(tableau: &mut Tableau, row: usize, col: usize) {
    let pivot_val = tableau.a[row][col];
    for j in 0..tableau.num_cols {
        tableau.a[row][j] /= pivot_val;
    }
    tableau.b[row] /= pivot_val;
    for i in 0..tableau.a.len() {
        if i == row {
            continue;
        }
        let factor = tableau.a[i][col];
        if factor == 0.0 {
            continue;
        }
        for j in 0..tableau.num_cols {
            tableau.a[i][j] -= factor * tableau.a[row][j];
        }
        tableau.b[i] -= factor * tableau.b[row];
    }
    tableau.basis[row] = col;
}

/// Run simplex iterations against `cost` until optimal, unbounded, or the
/// pivot budget is exhausted.
fn run_phase(tableau: &mut Tableau, cost: &[Real], max_pivots: usize, tol: Real) -> Result<usize> {
    let mut reduced = reduced_costs(tableau, cost);
    let mut pivots = 0;
    loop {
        let Some(col) = find_entering(&reduced, tol) else {
            return Ok(pivots);
        };
        let Some(row) = find_leaving(tableau, col, tol) else {
            return Err(Error::Unbounded);
        };
        pivot(tableau, row, col);
        reduced = reduced_costs(tableau, cost);
        pivots += 1;
        if pivots > max_pivots {
            return Err(Error::MaxIter("simplex".into()));
        }
    }
}

fn solve_tableau(tableau: &mut Tableau, cost: &[Real], cfg: &SimplexConfig) -> Result<Vec<Real>> {
    let m = tableau.a.len();
    let max_pivots = (m * tableau.num_cols).max(1);

    if !tableau.artificial_cols.is_empty() {
        let mut phase1_cost = vec![0.0; tableau.num_cols];
        for &col in &tableau.artificial_cols {
            phase1_cost[col] = 1.0;
        }
        run_phase(tableau, &phase1_cost, max_pivots, cfg.tol)?;
        let phase1_value = reduced_cost_obj(tableau, &phase1_cost);
        if phase1_value.abs() > cfg.tol.max(1e-7) {
            return Err(Error::Infeasible);
        }
        // Drive out any artificial variable left in the basis at zero
        // level, then block the artificial columns from re-entering.
        for i in 0..m {
            if tableau.artificial_cols.contains(&tableau.basis[i]) {
                if let Some(col) = (0..tableau.num_cols)
                    .find(|&j| !tableau.artificial_cols.contains(&j) && tableau.a[i][j].abs() > cfg.tol)
                {
                    pivot(tableau, i, col);
                }
            }
        }
        for &col in &tableau.artificial_cols {
            for row in tableau.a.iter_mut() {
                row[col] = 0.0;
            }
        }
    }

    run_phase(tableau, cost, max_pivots, cfg.tol)?;

    let mut x = vec![0.0; tableau.num_cols];
    for (i, &col) in tableau.basis.iter().enumerate() {
        x[col] = tableau.b[i];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximizes_simple_lp() {
        // max 3x + 2y s.t. x + y <= 4, x + 3y <= 6, x,y >= 0.
        let c = Array::from_slice(&[3.0, 2.0]);
        let constraints = vec![
            Array::from_slice(&[1.0, 1.0]).le(4.0),
            Array::from_slice(&[1.0, 3.0]).le(6.0),
        ];
        let lp = LpBuilder::max(c).subject_to(constraints);
        let cfg = SimplexConfig::default();
        let sol = lp.solve(&cfg).unwrap();
        assert!((sol.objective - 12.0).abs() < 1e-6, "obj = {}", sol.objective);
        assert!((sol.x[0] - 4.0).abs() < 1e-6);
        assert!((sol.x[1] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn solves_equality_constraint_with_two_phase_method() {
        // min x + y s.t. x + y = 10, x >= 2, y >= 0 -> x=2, y=8 (cost 10) is
        // not optimal; the true minimum is any point on x+y=10, cost 10.
        let c = Array::from_slice(&[1.0, 1.0]);
        let constraints = vec![
            Array::from_slice(&[1.0, 1.0]).equ(10.0),
            Array::from_slice(&[1.0, 0.0]).ge(2.0),
        ];
        let lp = LpBuilder::min(c).subject_to(constraints);
        let cfg = SimplexConfig::default();
        let sol = lp.solve(&cfg).unwrap();
        assert!((sol.objective - 10.0).abs() < 1e-6, "obj = {}", sol.objective);
    }

    #[test]
    fn detects_infeasible_problem() {
        // x <= 1 and x >= 5 cannot both hold.
        let c = Array::from_slice(&[1.0]);
        let constraints = vec![
            Array::from_slice(&[1.0]).le(1.0),
            Array::from_slice(&[1.0]).ge(5.0),
        ];
        let lp = LpBuilder::min(c).subject_to(constraints);
        let cfg = SimplexConfig::default();
        assert!(matches!(lp.solve(&cfg), Err(Error::Infeasible)));
    }

    #[test]
    fn detects_unbounded_problem() {
        // max x, x >= 0 with no upper bound.
        let c = Array::from_slice(&[1.0]);
        let constraints = vec![Array::from_slice(&[1.0]).ge(0.0)];
        let lp = LpBuilder::max(c).subject_to(constraints);
        let cfg = SimplexConfig::default();
        assert!(matches!(lp.solve(&cfg), Err(Error::Unbounded)));
    }

    #[test]
    fn negative_variables_are_split_and_recombined() {
        // min x s.t. x >= -5, x <= 10 -- optimum is x = -5.
        let c = Array::from_slice(&[1.0]);
        let constraints = vec![
            Array::from_slice(&[1.0]).ge(-5.0),
            Array::from_slice(&[1.0]).le(10.0),
        ];
        let lp = LpBuilder::min(c)
            .subject_to(constraints)
            .with_negative_variables();
        let cfg = SimplexConfig::default();
        let sol = lp.solve(&cfg).unwrap();
        assert!((sol.x[0] - (-5.0)).abs() < 1e-6, "x = {}", sol.x[0]);
        assert!((sol.objective - (-5.0)).abs() < 1e-6);
    }

    #[test]
    fn rejects_nonlinear_constraint() {
        let quadratic = |x: &Array| x[0] * x[0];
        let gc = GeneralConstraint {
            f: &quadratic,
            op: Operator::Le,
            rhs: 4.0,
        };
        assert!(matches!(
            linearize(&gc, 1, 1e-9),
            Err(Error::NonLinearConstraint(_))
        ));
    }

    #[test]
    fn accepts_affine_general_constraint() {
        let affine = |x: &Array| 2.0 * x[0] + 3.0 * x[1] + 1.0;
        let gc = GeneralConstraint {
            f: &affine,
            op: Operator::Le,
            rhs: 10.0,
        };
        let constraint = linearize(&gc, 2, 1e-9).unwrap();
        assert!((constraint.coeffs[0] - 2.0).abs() < 1e-9);
        assert!((constraint.coeffs[1] - 3.0).abs() < 1e-9);
        assert!((constraint.rhs - 9.0).abs() < 1e-9);
    }

    #[test]
    fn duality_matches_primal_optimum() {
        let c = Array::from_slice(&[3.0, 2.0]);
        let constraints = vec![
            Array::from_slice(&[1.0, 1.0]).le(4.0),
            Array::from_slice(&[1.0, 3.0]).le(6.0),
        ];
        let lp = LpBuilder::max(c).subject_to(constraints);
        let cfg = SimplexConfig::default();
        let primal = lp.solve(&cfg).unwrap();
        let dual = lp.solve_dual(&cfg).unwrap();
        assert!(
            (primal.objective - dual.objective).abs() < 1e-6,
            "primal = {}, dual = {}",
            primal.objective,
            dual.objective
        );
    }
}
