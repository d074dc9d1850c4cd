//! Kernels de correlación y estadísticos descriptivos.
//!
//! Convenciones:
//! - Los kernels reciben slices ya pareados y sin faltantes
//!   (ver `paired_finite`).
//! - Longitudes distintas, entrada vacía o varianza nula devuelven `0.0`
//!   en vez de `NaN`.

use statrs::distribution::{ContinuousCDF, StudentsT};

use hypo_core::model::{NullDistributionSummary, TestType};

/// Umbral por debajo del cual una varianza se considera nula.
pub const ZERO_VARIANCE_EPS: f64 = 1e-10;

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Varianza muestral (ddof = 1). `0.0` con menos de dos valores.
pub fn sample_variance(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (xs.len() - 1) as f64
}

/// Desvío estándar poblacional (ddof = 0).
pub fn population_std(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    (xs.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / xs.len() as f64).sqrt()
}

/// `true` si todos los valores están a menos de `tol` del primero.
pub fn is_constant(xs: &[f64], tol: f64) -> bool {
    match xs.first() {
        Some(first) => xs.iter().all(|v| (v - first).abs() < tol),
        None => true,
    }
}

/// Filas donde ambos valores son finitos.
pub fn paired_finite(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
     .zip(y)
     .filter(|(a, b)| a.is_finite() && b.is_finite())
     .map(|(a, b)| (*a, *b))
     .unzip()
}

/// Coeficiente de Pearson centrado en la media, acotado a [-1, 1].
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }
    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (sxy / denom).clamp(-1.0, 1.0)
}

/// Rangos 1-based; los empates reciben el rango promedio.
pub fn rank_average(xs: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..xs.len()).collect();
    order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));

    let mut ranks = vec![0.0; xs.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && xs[order[j + 1]] == xs[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Spearman: Pearson sobre rangos promedio.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }
    pearson(&rank_average(x), &rank_average(y))
}

pub fn correlation(test: TestType, x: &[f64], y: &[f64]) -> f64 {
    match test {
        TestType::Pearson => pearson(x, y),
        TestType::Spearman => spearman(x, y),
    }
}

/// p-value bilateral del test t para un coeficiente de correlación con
/// `n` pares (`df = n - 2`).
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 || !r.is_finite() {
        return 1.0;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r.abs() * (df / (1.0 - r * r)).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Percentil con interpolación lineal sobre una muestra ordenada
/// (`index = p/100 * (n - 1)`).
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let index = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = index.floor() as usize;
            let upper = index.ceil() as usize;
            if lower == upper {
                return sorted[lower];
            }
            let weight = index - lower as f64;
            sorted[lower] * (1.0 - weight) + sorted[upper] * weight
        }
    }
}

/// Resumen de una distribución nula. Vacía → todo en cero.
pub fn summarize(values: &[f64]) -> NullDistributionSummary {
    if values.is_empty() {
        return NullDistributionSummary::default();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    NullDistributionSummary { mean: mean(&sorted),
                              std_dev: population_std(&sorted),
                              min: sorted[0],
                              max: sorted[sorted.len() - 1],
                              p95: percentile(&sorted, 95.0),
                              p99: percentile(&sorted, 99.0) }
}
