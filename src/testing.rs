//! Hypothesis testing.
//!
//! Two-sample t-tests (Welch and pooled Student) and the chi-squared test of
//! independence on contingency tables, with optional Yates continuity
//! correction for 2×2 tables.
//!
//! # Examples
//!
//! ```
//! use u_abtest::testing::two_sample_t_test;
//!
//! let a = [5.1, 4.9, 5.2, 5.0, 4.8];
//! let b = [7.1, 6.9, 7.2, 7.0, 6.8];
//! let r = two_sample_t_test(&a, &b).unwrap();
//! assert!(r.p_value < 0.01); // means clearly differ
//! ```

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};
use u_numflow::stats;

/// Result of a hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestResult {
    /// Test statistic (t or χ² depending on test).
    pub statistic: f64,
    /// Degrees of freedom (may be fractional for Welch).
    pub df: f64,
    /// p-value (two-tailed for t-tests, upper tail for χ²).
    pub p_value: f64,
}

/// Two-tailed p-value of a t statistic with `df` degrees of freedom.
fn t_two_tailed_p(t: f64, df: f64) -> Option<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

/// Upper-tail p-value of a χ² statistic.
fn chi_squared_upper_p(chi2: f64, df: f64) -> Option<f64> {
    let dist = ChiSquared::new(df).ok()?;
    Some(dist.sf(chi2).clamp(0.0, 1.0))
}

// ---------------------------------------------------------------------------
// t-tests
// ---------------------------------------------------------------------------

/// Size, mean and sample variance of one t-test sample.
struct Moments {
    n: f64,
    mean: f64,
    var: f64,
}

impl Moments {
    /// `None` for fewer than 2 observations or any non-finite value.
    fn of(data: &[f64]) -> Option<Self> {
        Some(Self {
            n: data.len() as f64,
            mean: stats::mean(data)?,
            var: stats::variance(data)?,
        })
    }
}

/// Two-sample Welch t-test: H₀: μ₁ = μ₂ (unequal variances).
///
/// # Algorithm
///
/// t = (x̄₁ - x̄₂) / √(s₁²/n₁ + s₂²/n₂)
/// df = Welch-Satterthwaite approximation.
///
/// # Returns
///
/// `None` if either sample has fewer than 2 observations, contains
/// non-finite values, or both samples have zero variance.
///
/// # References
///
/// Welch (1947). "The generalization of Student's problem when several
/// different population variances are involved". Biometrika, 34, 28–35.
///
/// # Examples
///
/// ```
/// use u_abtest::testing::two_sample_t_test;
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [2.0, 4.0, 6.0, 8.0, 10.0];
/// let r = two_sample_t_test(&a, &b).unwrap();
/// assert!(r.statistic < 0.0);
/// assert!(r.df < 8.0); // fewer than pooled n₁ + n₂ - 2
/// ```
pub fn two_sample_t_test(a: &[f64], b: &[f64]) -> Option<TestResult> {
    let s1 = Moments::of(a)?;
    let s2 = Moments::of(b)?;

    let v1 = s1.var / s1.n;
    let v2 = s2.var / s2.n;
    let se_sq = v1 + v2;
    if se_sq < 1e-300 {
        return None;
    }

    let t = (s1.mean - s2.mean) / se_sq.sqrt();

    // Welch-Satterthwaite degrees of freedom
    let df = se_sq.powi(2) / (v1 * v1 / (s1.n - 1.0) + v2 * v2 / (s2.n - 1.0));

    let p_value = t_two_tailed_p(t, df)?;

    Some(TestResult {
        statistic: t,
        df,
        p_value,
    })
}

/// Two-sample Student t-test with pooled variance: H₀: μ₁ = μ₂.
///
/// Assumes equal population variances.
///
/// # Algorithm
///
/// s²ₚ = ((n₁-1)s₁² + (n₂-1)s₂²) / (n₁+n₂-2)
/// t = (x̄₁ - x̄₂) / √(s²ₚ (1/n₁ + 1/n₂)), df = n₁+n₂-2.
///
/// # Returns
///
/// `None` under the same conditions as [`two_sample_t_test`].
pub fn pooled_t_test(a: &[f64], b: &[f64]) -> Option<TestResult> {
    let s1 = Moments::of(a)?;
    let s2 = Moments::of(b)?;
    let df = s1.n + s2.n - 2.0;

    let pooled = ((s1.n - 1.0) * s1.var + (s2.n - 1.0) * s2.var) / df;
    let se_sq = pooled * (1.0 / s1.n + 1.0 / s2.n);
    if se_sq < 1e-300 {
        return None;
    }

    let t = (s1.mean - s2.mean) / se_sq.sqrt();
    let p_value = t_two_tailed_p(t, df)?;

    Some(TestResult {
        statistic: t,
        df,
        p_value,
    })
}

// ---------------------------------------------------------------------------
// Chi-squared test of independence
// ---------------------------------------------------------------------------

/// Result of a chi-squared test of independence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContingencyTest {
    /// χ² statistic, df and p-value.
    pub result: TestResult,
    /// Expected frequencies under independence, row-major.
    pub expected: Vec<f64>,
    /// Whether the Yates continuity correction was applied.
    pub corrected: bool,
}

impl ContingencyTest {
    /// Smallest expected cell frequency.
    pub fn min_expected(&self) -> f64 {
        self.expected.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// Chi-squared test of independence on a contingency table.
///
/// # Arguments
///
/// * `table` — Flat row-major contingency table (rows × cols observed frequencies).
/// * `n_rows` — Number of rows.
/// * `n_cols` — Number of columns.
/// * `yates` — Apply the Yates continuity correction when df = 1.
///
/// # Algorithm
///
/// Expected: Eᵢⱼ = (row_sumᵢ × col_sumⱼ) / N.
/// χ² = Σᵢⱼ (Oᵢⱼ - Eᵢⱼ)² / Eᵢⱼ, df = (r-1)(c-1).
///
/// With the correction, each |Oᵢⱼ - Eᵢⱼ| is shrunk by min(0.5, |Oᵢⱼ - Eᵢⱼ|)
/// before squaring, so a table that already matches its expectation keeps
/// χ² = 0.
///
/// # Returns
///
/// `None` if fewer than 2 rows or columns, any cell is negative, or
/// any marginal is zero.
///
/// # References
///
/// Yates (1934). "Contingency tables involving small numbers and the χ²
/// test". Supplement to the JRSS, 1(2), 217–235.
///
/// # Examples
///
/// ```
/// use u_abtest::testing::chi_squared_independence;
///
/// // 2×2 contingency table
/// let table = [30.0, 10.0, 20.0, 40.0];
/// let r = chi_squared_independence(&table, 2, 2, true).unwrap();
/// assert!(r.result.p_value < 0.01);
/// assert_eq!(r.expected, vec![20.0, 20.0, 30.0, 30.0]);
/// ```
pub fn chi_squared_independence(
    table: &[f64],
    n_rows: usize,
    n_cols: usize,
    yates: bool,
) -> Option<ContingencyTest> {
    if n_rows < 2 || n_cols < 2 || table.len() != n_rows * n_cols {
        return None;
    }

    for &v in table {
        if v < 0.0 || !v.is_finite() {
            return None;
        }
    }

    // Row sums and column sums
    let mut row_sums = vec![0.0; n_rows];
    let mut col_sums = vec![0.0; n_cols];
    let mut total = 0.0;

    for i in 0..n_rows {
        for j in 0..n_cols {
            let val = table[i * n_cols + j];
            row_sums[i] += val;
            col_sums[j] += val;
            total += val;
        }
    }

    if total <= 0.0 {
        return None;
    }

    // Check no zero marginals
    if row_sums.iter().chain(col_sums.iter()).any(|&m| m <= 0.0) {
        return None;
    }

    let df = ((n_rows - 1) * (n_cols - 1)) as f64;
    let corrected = yates && df == 1.0;

    let mut expected = Vec::with_capacity(table.len());
    let mut chi2 = 0.0;
    for i in 0..n_rows {
        for j in 0..n_cols {
            let observed = table[i * n_cols + j];
            let e = row_sums[i] * col_sums[j] / total;
            let mut diff = (observed - e).abs();
            if corrected {
                diff -= diff.min(0.5);
            }
            chi2 += diff * diff / e;
            expected.push(e);
        }
    }

    let p_value = chi_squared_upper_p(chi2, df)?;

    Some(ContingencyTest {
        result: TestResult {
            statistic: chi2,
            df,
            p_value,
        },
        expected,
        corrected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Two-sample t-test
    // -----------------------------------------------------------------------

    #[test]
    fn two_sample_same_mean() {
        let a = [5.0, 5.1, 4.9, 5.0, 5.1, 4.9, 5.0, 5.0];
        let b = [5.0, 5.2, 4.8, 5.1, 4.9, 5.0, 5.1, 4.9];
        let r = two_sample_t_test(&a, &b).expect("should compute");
        assert!(r.p_value > 0.3, "p = {}", r.p_value);
    }

    #[test]
    fn two_sample_different_means() {
        let a = [1.0, 2.0, 3.0, 2.0, 1.5, 2.5];
        let b = [10.0, 11.0, 12.0, 10.5, 11.5, 10.5];
        let r = two_sample_t_test(&a, &b).expect("should compute");
        assert!(r.p_value < 0.001, "p = {}", r.p_value);
    }

    #[test]
    fn welch_statistic_and_df() {
        // x̄ = 3, 6; s² = 2.5, 10; se² = 0.5 + 2.0
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 4.0, 6.0, 8.0, 10.0];
        let r = two_sample_t_test(&a, &b).expect("should compute");
        assert!((r.statistic - (-3.0 / 2.5_f64.sqrt())).abs() < 1e-12);
        let df = 6.25 / (0.25 / 4.0 + 4.0 / 4.0);
        assert!((r.df - df).abs() < 1e-12, "df = {}", r.df);
    }

    #[test]
    fn pooled_uses_integer_df() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 4.0, 6.0, 8.0, 10.0];
        let r = pooled_t_test(&a, &b).expect("should compute");
        assert_eq!(r.df, 8.0);
        // Equal sizes: pooled and Welch statistics coincide
        assert!((r.statistic - (-3.0 / 2.5_f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn two_sample_edge_cases() {
        assert!(two_sample_t_test(&[1.0], &[2.0, 3.0]).is_none());
        assert!(two_sample_t_test(&[1.0, 2.0], &[3.0]).is_none());
        assert!(two_sample_t_test(&[1.0, 1.0], &[1.0, 1.0]).is_none()); // zero var
        assert!(pooled_t_test(&[0.0, 0.0, 0.0], &[1.0, 1.0]).is_none());
        assert!(two_sample_t_test(&[1.0, f64::NAN], &[2.0, 3.0]).is_none());
    }

    // -----------------------------------------------------------------------
    // Chi-squared independence
    // -----------------------------------------------------------------------

    #[test]
    fn chi2_independence_uncorrected() {
        let table = [30.0, 10.0, 20.0, 40.0];
        let r = chi_squared_independence(&table, 2, 2, false).expect("should compute");
        assert!((r.result.statistic - 50.0 / 3.0).abs() < 1e-10);
        assert_eq!(r.result.df, 1.0);
        assert!(!r.corrected);
    }

    #[test]
    fn chi2_independence_yates() {
        // |O - E| = 10 shrinks to 9.5
        let table = [30.0, 10.0, 20.0, 40.0];
        let r = chi_squared_independence(&table, 2, 2, true).expect("should compute");
        let expected = 2.0 * 90.25 / 20.0 + 2.0 * 90.25 / 30.0;
        assert!((r.result.statistic - expected).abs() < 1e-10);
        assert!(r.result.p_value < 0.001, "p = {}", r.result.p_value);
        assert!(r.corrected);
    }

    #[test]
    fn yates_never_overshoots() {
        // Observed equals expected: correction must not push χ² above zero
        let table = [10.0, 10.0, 10.0, 10.0];
        let r = chi_squared_independence(&table, 2, 2, true).expect("should compute");
        assert_eq!(r.result.statistic, 0.0);
        assert!((r.result.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn yates_only_for_one_df() {
        let table = [10.0, 20.0, 30.0, 20.0, 15.0, 25.0];
        let r = chi_squared_independence(&table, 2, 3, true).expect("should compute");
        assert_eq!(r.result.df, 2.0);
        assert!(!r.corrected);
    }

    #[test]
    fn chi2_min_expected() {
        let table = [1.0, 3.0, 0.0, 4.0];
        let r = chi_squared_independence(&table, 2, 2, true).expect("should compute");
        assert!((r.min_expected() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn chi2_independence_edge_cases() {
        assert!(chi_squared_independence(&[10.0, 20.0], 1, 2, true).is_none()); // 1 row
        assert!(chi_squared_independence(&[10.0, 20.0], 2, 1, true).is_none()); // 1 col
        assert!(chi_squared_independence(&[10.0], 2, 2, true).is_none()); // wrong size
        assert!(chi_squared_independence(&[5.0, 0.0, 7.0, 0.0], 2, 2, true).is_none()); // zero col
        assert!(chi_squared_independence(&[-1.0, 2.0, 3.0, 4.0], 2, 2, false).is_none());
    }
}
