// Dense least-squares helpers for the model fit.
//
// Matrices are row-major `Vec<f64>`; the systems involved are a few dozen
// columns wide, so nothing fancier is needed.

/// Accumulate `XᵀX` and `Xᵀy` from design rows.
pub fn normal_equations(rows: &[Vec<f64>], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let p = rows.first().map_or(0, Vec::len);
    let mut xtx = vec![0.0; p * p];
    let mut xty = vec![0.0; p];
    for (row, &target) in rows.iter().zip(y) {
        for i in 0..p {
            let xi = row[i];
            if xi == 0.0 {
                continue;
            }
            xty[i] += xi * target;
            for j in i..p {
                xtx[i * p + j] += xi * row[j];
            }
        }
    }
    // Mirror the upper triangle.
    for i in 0..p {
        for j in 0..i {
            xtx[i * p + j] = xtx[j * p + i];
        }
    }
    (xtx, xty)
}

/// Solve `A x = b` for symmetric positive-definite `A` by Cholesky
/// factorisation. Returns `None` when `A` is not numerically positive-definite.
pub fn solve_spd(a: &[f64], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if a.len() != n * n {
        return None;
    }
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if !(sum > 1e-300) || !sum.is_finite() {
                    return None;
                }
                l[i * n + i] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }

    // Forward substitution: L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i * n + k] * z[k];
        }
        z[i] = sum / l[i * n + i];
    }
    // Back substitution: Lᵀ x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[k * n + i] * x[k];
        }
        x[i] = sum / l[i * n + i];
    }
    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
