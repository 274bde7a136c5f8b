use hiveforge::optimizer::{RandomSampler, SelectionSampler};
use hiveforge::DomainError;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case(1)]
#[case(42)]
#[case(9_001)]
fn test_roulette_only_hits_positive_weight(#[case] seed: u64) {
    let mut s = RandomSampler::new(Some(seed));
    for _ in 0..200 {
        assert_eq!(s.roulette_draw(&[0.0, 0.0, 5.0]).unwrap(), 2);
    }
}

#[rstest]
#[case(vec![], DomainError::EmptyWeights)]
#[case(vec![0.0, 0.0], DomainError::ZeroWeights)]
#[case(vec![1.0, -0.5], DomainError::InvalidWeight { index: 1, value: -0.5 })]
fn test_roulette_rejects_bad_weights(#[case] weights: Vec<f64>, #[case] expected: DomainError) {
    let mut s = RandomSampler::new(Some(5));
    assert_eq!(s.roulette_draw(&weights).unwrap_err(), expected);
}

#[test]
fn test_roulette_rejects_nan_weight() {
    let mut s = RandomSampler::new(Some(5));
    assert!(matches!(
        s.roulette_draw(&[1.0, f64::NAN]),
        Err(DomainError::InvalidWeight { index: 1, .. })
    ));
}

#[test]
fn test_roulette_rejects_overflowing_sum() {
    let mut s = RandomSampler::new(Some(5));
    assert_eq!(
        s.roulette_draw(&[1.0, f64::MAX, f64::MAX]).unwrap_err(),
        DomainError::InvalidWeight {
            index: 2,
            value: f64::MAX
        }
    );
}

#[test]
fn test_roulette_frequencies_follow_weights() {
    let mut s = RandomSampler::new(Some(77));
    let mut hits = [0usize; 3];
    let draws = 30_000;
    for _ in 0..draws {
        hits[s.roulette_draw(&[1.0, 2.0, 7.0]).unwrap()] += 1;
    }
    let expected = [0.1, 0.2, 0.7];
    for (h, e) in hits.iter().zip(expected) {
        let freq = *h as f64 / draws as f64;
        assert!((freq - e).abs() < 0.02, "freq {} vs {}", freq, e);
    }
}

#[rstest]
#[case(0, 0)]
#[case(1, 0)]
fn test_excluding_needs_two_slots(#[case] n: usize, #[case] exclude: usize) {
    let mut s = RandomSampler::new(Some(1));
    assert_eq!(
        s.uniform_excluding(n, exclude).unwrap_err(),
        DomainError::PopulationTooSmall(n)
    );
}

#[test]
fn test_excluding_rejects_out_of_range_slot() {
    let mut s = RandomSampler::new(Some(1));
    assert_eq!(
        s.uniform_excluding(4, 4).unwrap_err(),
        DomainError::IndexOutOfRange { index: 4, len: 4 }
    );
}

#[test]
fn test_excluding_covers_every_other_slot() {
    let mut s = RandomSampler::new(Some(11));
    let mut seen = [false; 5];
    for _ in 0..500 {
        seen[s.uniform_excluding(5, 2).unwrap()] = true;
    }
    assert_eq!(seen, [true, true, false, true, true]);
}

#[test]
fn test_same_seed_same_stream() {
    let mut a = RandomSampler::new(Some(123));
    let mut b = RandomSampler::new(Some(123));
    for _ in 0..32 {
        assert_eq!(a.uniform(-3.0, 3.0), b.uniform(-3.0, 3.0));
        assert_eq!(
            a.roulette_draw(&[0.3, 0.3, 0.4]).unwrap(),
            b.roulette_draw(&[0.3, 0.3, 0.4]).unwrap()
        );
    }
}

#[test]
fn test_selection_sampler_prefers_cheaper_slots() {
    let selector = SelectionSampler::new(&[0.5, 10.0, 10.0, 10.0], 7.625).unwrap();
    let mut s = RandomSampler::new(Some(8));
    let cheap = (0..2_000)
        .filter(|_| selector.draw(&mut s).unwrap() == 0)
        .count();
    assert!(cheap > 500, "cheap slot drawn {} times", cheap);
}

prop_compose! {
    fn arb_weights()(
        weights in prop::collection::vec(0.0..100.0f64, 1..32),
        boost in any::<prop::sample::Index>()
    ) -> Vec<f64> {
        let mut weights = weights;
        let i = boost.index(weights.len());
        weights[i] += 1.0;
        weights
    }
}

proptest! {
    #[test]
    fn prop_roulette_returns_positive_weight_index(seed in any::<u64>(), weights in arb_weights()) {
        let mut s = RandomSampler::new(Some(seed));
        let i = s.roulette_draw(&weights).unwrap();
        prop_assert!(i < weights.len());
        prop_assert!(weights[i] > 0.0);
    }

    #[test]
    fn prop_uniform_stays_in_range(seed in any::<u64>(), lo in -1e6..1e6f64, span in 1e-6..1e6f64) {
        let mut s = RandomSampler::new(Some(seed));
        let v = s.uniform(lo, lo + span);
        prop_assert!(v >= lo && v <= lo + span);
    }
}
