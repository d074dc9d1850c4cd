//! Corrección Benjamini-Hochberg.

/// Identificador del método registrado en artifacts y familias FDR.
pub const BH_METHOD: &str = "BH";

/// q-values BH (step-up monótono), en el mismo orden que `p_values`.
///
/// `q_(k) = min_{j >= k} p_(j) * m / j`, acotado a 1.
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let mut q = vec![1.0; m];
    let mut running = 1.0_f64;
    for (rank0, &idx) in order.iter().enumerate().rev() {
        let raw = p_values[idx] * m as f64 / (rank0 + 1) as f64;
        running = running.min(raw);
        q[idx] = running.clamp(0.0, 1.0);
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn bh_reference_values() {
        let q = benjamini_hochberg(&[0.01, 0.04, 0.03, 0.005]);
        let expected = [0.02, 0.04, 0.04, 0.02];
        for (a, b) in q.iter().zip(expected) {
            assert!((a - b).abs() < EPS, "{a} vs {b}");
        }
    }

    #[test]
    fn bh_is_monotone_and_capped() {
        let q = benjamini_hochberg(&[0.9, 0.5, 0.95]);
        assert!(q.iter().all(|v| *v <= 1.0));
        assert!(q[1] <= q[0] && q[0] <= q[2]);
    }

    #[test]
    fn bh_empty() {
        assert!(benjamini_hochberg(&[]).is_empty());
    }
}
