mod common;

use hypo_core::model::{RejectionReason, TestType, VerdictStatus};
use chrono::{TimeZone, Utc};
use hypo_core::{DeterministicRng, Lag, MatrixBundle, StatisticalType};
use hypo_stats::correlation::pearson;
use hypo_stats::{HypothesisSpec, PermutationReferee, RefereeConfig, RefereeContext};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

fn referee(config: RefereeConfig) -> PermutationReferee {
    PermutationReferee::with_config(Arc::new(DeterministicRng::new()), config)
}

fn ctx(seed: i64) -> RefereeContext<'static> {
    RefereeContext::new("run-1", "battery", seed)
}

fn pair_bundle(x: Vec<f64>, y: Vec<f64>) -> MatrixBundle {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut b = MatrixBundle::new("snap-1".into(), "cohort-1".into(), at, Lag::default());
    b.add_column("x", x, StatisticalType::Numeric).unwrap();
    b.add_column("y", y, StatisticalType::Numeric).unwrap();
    b
}

fn uniform(rng: &mut ChaCha8Rng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.gen::<f64>()).collect()
}

#[test]
fn num_shuffles_clamped_to_bounds() {
    let mut r = referee(RefereeConfig::default());
    assert_eq!(r.config().num_shuffles(), 1_000);
    r.set_num_shuffles(500);
    assert_eq!(r.config().num_shuffles(), 1_000);
    r.set_num_shuffles(200_000);
    assert_eq!(r.config().num_shuffles(), 100_000);
}

#[test]
fn strong_signal_is_validated() {
    let b = common::bundle();
    let h = HypothesisSpec::new("h-signal", "dose", "response");
    let r = referee(RefereeConfig::default()).validate_hypothesis(&ctx(42), &h, &b).unwrap();

    assert_eq!(r.status, VerdictStatus::Validated);
    assert_eq!(r.reason, RejectionReason::StatisticallySignificant);
    assert_eq!(r.p_value, 0.0);
    assert_eq!(r.confidence, 1.0);
    assert!(r.effect_size > 0.99);
    assert_eq!(r.null_percentile, 1.0);
    assert!(r.falsification_log.is_none());
    assert!(r.is_consistent());
    assert_eq!(r.metadata["test_used"], "pearson");
    assert_eq!(r.metadata["variable_x"], "dose");
}

#[test]
fn uncorrelated_pair_is_rejected_with_log() {
    let b = common::bundle();
    let h = HypothesisSpec::new("h-noise", "dose", "squared");
    let r = referee(RefereeConfig::default().with_early_stop(false)).validate_hypothesis(&ctx(42), &h, &b)
                                                                     .unwrap();

    assert_eq!(r.status, VerdictStatus::Rejected);
    assert_eq!(r.reason, RejectionReason::LikelyRandom);
    assert_eq!(r.observed_statistic, 0.0);
    assert_eq!(r.p_value, 1.0);
    assert_eq!(r.num_permutations, 1_000);
    let log = r.falsification_log.as_ref().expect("rejected verdict carries a log");
    assert_eq!(log.sample_size, common::ROWS);
    assert_eq!(log.rejection_reason, RejectionReason::LikelyRandom);
    assert_eq!(log.variable_y.as_str(), "squared");
    assert!(log.null_distribution.max >= log.null_distribution.p99);
    assert!(log.null_distribution.p99 >= log.null_distribution.p95);
    // nula con signo, centrada en 0
    assert!(log.null_distribution.min < 0.0);
    assert!(log.null_distribution.max > 0.0);
    assert!(log.null_distribution.mean.abs() < 0.05);
}

#[test]
fn early_stop_keeps_the_full_decision() {
    let b = common::bundle();
    let noise = HypothesisSpec::new("h-noise", "dose", "squared");
    let early = referee(RefereeConfig::default()).validate_hypothesis(&ctx(7), &noise, &b).unwrap();
    let full = referee(RefereeConfig::default().with_early_stop(false)).validate_hypothesis(&ctx(7), &noise, &b)
                                                                        .unwrap();
    assert_eq!(early.num_permutations, 100);
    assert_eq!(full.num_permutations, 1_000);
    assert_eq!(early.status, full.status);
    assert_eq!(early.metadata["early_stopped"], true);

    let signal = HypothesisSpec::new("h-signal", "dose", "response");
    let early = referee(RefereeConfig::default().with_num_shuffles(10_000)).validate_hypothesis(&ctx(7), &signal, &b)
                                                                           .unwrap();
    assert_eq!(early.status, VerdictStatus::Validated);
    assert_eq!(early.num_permutations, 9_600);
}

#[test]
fn same_seed_same_null_regardless_of_thread_count() {
    let b = common::bundle();
    let h = HypothesisSpec::new("h-mid", "dose", "noise");
    let config = RefereeConfig::default().with_early_stop(false);

    let pooled = referee(config.clone()).validate_hypothesis(&ctx(42), &h, &b).unwrap();
    let single = rayon::ThreadPoolBuilder::new().num_threads(1)
                                                .build()
                                                .unwrap()
                                                .install(|| referee(config.clone()).validate_hypothesis(&ctx(42), &h, &b))
                                                .unwrap();

    assert_eq!(pooled.p_value, single.p_value);
    assert_eq!(pooled.null_percentile, single.null_percentile);
    assert_eq!(pooled.status, single.status);
    assert_eq!(pooled.falsification_log.map(|l| l.null_distribution),
               single.falsification_log.map(|l| l.null_distribution));
}

#[test]
fn different_seed_draws_a_different_null() {
    let b = common::bundle();
    let h = HypothesisSpec::new("h-noise", "dose", "squared");
    let r = referee(RefereeConfig::default().with_early_stop(false));
    let a = r.validate_hypothesis(&ctx(1), &h, &b).unwrap();
    let c = r.validate_hypothesis(&ctx(2), &h, &b).unwrap();
    let null_a = a.falsification_log.unwrap().null_distribution;
    let null_c = c.falsification_log.unwrap().null_distribution;
    assert_ne!(null_a.mean, null_c.mean);
}

#[test]
fn spearman_uses_ranks() {
    let b = common::bundle();
    let h = HypothesisSpec::new("h-rank", "dose", "cubed");
    let r = referee(RefereeConfig::default().with_test(TestType::Spearman)).validate_hypothesis(&ctx(42), &h, &b)
                                                                            .unwrap();
    assert_eq!(r.test_used, TestType::Spearman);
    assert!((r.observed_statistic - 1.0).abs() < 1e-12);
    assert_eq!(r.status, VerdictStatus::Validated);
}

#[test]
fn categorical_columns_fall_back_to_pearson() {
    let b = common::bundle();
    let r = referee(RefereeConfig::default().with_test(TestType::Spearman));
    assert_eq!(r.select_test(&b, &"category".into(), &"response".into()), TestType::Pearson);
}

#[test]
fn primary_relationship_ignores_non_numeric_columns() {
    let b = common::bundle();
    let primary = referee(RefereeConfig::default()).find_primary_relationship(&b).unwrap();
    assert_eq!(primary.variable_x.as_str(), "dose");
    assert_eq!(primary.variable_y.as_str(), "response");
    assert!(primary.effect_size > 0.99);
}

#[test]
fn linear_signal_with_noise_is_validated() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let x: Vec<f64> = (0..100).map(f64::from).collect();
    let y: Vec<f64> = x.iter().map(|v| v + (rng.gen::<f64>() - 0.5) * 20.0).collect();
    let r = referee(RefereeConfig::default()).validate_hypothesis(&ctx(42), &HypothesisSpec::new("h", "x", "y"),
                                                                  &pair_bundle(x, y))
                                             .unwrap();
    assert_eq!(r.status, VerdictStatus::Validated);
    assert_eq!(r.p_value, 0.0);
    assert!(r.effect_size > 0.9);
    assert!(r.falsification_log.is_none());
}

#[test]
fn identical_columns_have_zero_p_value() {
    let x: Vec<f64> = (0..100).map(f64::from).collect();
    let r = referee(RefereeConfig::default()).validate_hypothesis(&ctx(42), &HypothesisSpec::new("h", "x", "y"),
                                                                  &pair_bundle(x.clone(), x))
                                             .unwrap();
    assert_eq!(r.status, VerdictStatus::Validated);
    assert_eq!(r.p_value, 0.0);
    assert!((r.observed_statistic - 1.0).abs() < 1e-12);
}

#[test]
fn independent_uniform_columns_are_rejected() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let referee = referee(RefereeConfig::default());
    let mut rejected = 0;
    for i in 0..20 {
        let x = uniform(&mut rng, 100);
        let y = uniform(&mut rng, 100);
        let weak = pearson(&x, &y).abs() < 0.1;
        let r = referee.validate_hypothesis(&ctx(i), &HypothesisSpec::new("h", "x", "y"), &pair_bundle(x, y))
                       .unwrap();
        if r.status == VerdictStatus::Rejected {
            rejected += 1;
            let log = r.falsification_log.as_ref().expect("rejected verdict carries a log");
            assert_eq!(log.sample_size, 100);
            assert!(log.null_distribution.min < 0.0 && log.null_distribution.max > 0.0);
        }
        // |r| < 0.1 con n = 100 queda muy lejos de la región de rechazo
        if weak {
            assert_eq!(r.status, VerdictStatus::Rejected);
            assert_eq!(r.reason, RejectionReason::LikelyRandom);
        }
    }
    assert!(rejected >= 16, "rejected {rejected} of 20");
}
