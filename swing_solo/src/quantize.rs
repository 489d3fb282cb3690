// Duration quantization onto the sixteenth / sixteenth-triplet grids.
//
// A performed duration in seconds is converted to beats at the tempo in
// force, then snapped to whichever of the two grids it sits closer to.
// Ties go to the straight sixteenth grid. Durations too long to count in
// twelfths of a beat have no grid value.

use crate::symbol::Beats;

/// Snap `duration_seconds` at `tempo_bpm` to the nearest grid duration.
/// Returns `None` when the result would not fit in a `Beats`.
pub fn quantize(duration_seconds: f64, tempo_bpm: f64) -> Option<Beats> {
    let beat_length = 60.0 / tempo_bpm;
    let beats = (duration_seconds / beat_length).max(0.0);

    let sixteenths = beats * 4.0;
    let triplets = beats * 6.0;
    let sixteenth_distance = (sixteenths.round() - sixteenths).abs();
    let triplet_distance = (triplets.round() - triplets).abs();

    if sixteenth_distance <= triplet_distance {
        grid_steps(sixteenths).and_then(Beats::checked_from_sixteenths)
    } else {
        grid_steps(triplets).and_then(Beats::checked_from_triplet_sixteenths)
    }
}

fn grid_steps(steps: f64) -> Option<u32> {
    let rounded = steps.round();
    (rounded.is_finite() && rounded <= u32::MAX as f64).then_some(rounded as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_is_zero() {
        assert_eq!(quantize(0.0, 120.0), Some(Beats::ZERO));
    }

    #[test]
    fn test_quarter_note_at_120() {
        assert_eq!(quantize(0.5, 120.0), Some(Beats::QUARTER));
    }

    #[test]
    fn test_triplet_wins_when_closer() {
        // 1/6 beat at 60 BPM.
        assert_eq!(quantize(1.0 / 6.0, 60.0), Some(Beats::TRIPLET_SIXTEENTH));
        // Slightly sloppy triplet eighth (1/3 beat = 4/12).
        assert_eq!(quantize(0.34, 60.0), Some(Beats::from_triplet_sixteenths(2)));
    }

    #[test]
    fn test_sixteenth_wins_when_closer() {
        assert_eq!(quantize(0.26, 60.0), Some(Beats::SIXTEENTH));
        assert_eq!(quantize(0.74, 60.0), Some(Beats::from_sixteenths(3)));
    }

    #[test]
    fn test_tie_prefers_sixteenth_grid() {
        // 0.2 beat is 0.2 grid steps from both 1/4 and 1/6.
        assert_eq!(quantize(0.2, 60.0), Some(Beats::SIXTEENTH));
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(quantize(-0.2, 120.0), Some(Beats::ZERO));
    }

    #[test]
    fn test_overlong_duration_has_no_grid_value() {
        // About 5.4e8 beats: the sixteenth count fits in u32, the twelfths do not.
        assert_eq!(quantize(5.4e8, 60.0), None);
        assert_eq!(quantize(1e300, 60.0), None);
        assert_eq!(quantize(f64::INFINITY, 120.0), None);
        // Largest sixteenth count that still fits.
        let seconds = (u32::MAX / 3) as f64 / 4.0;
        assert_eq!(quantize(seconds, 60.0), Beats::checked_from_sixteenths(u32::MAX / 3));
    }

    proptest! {
        #[test]
        fn test_sixteenth_grid_is_fixed_point(n in 0u32..64, tempo in 40.0f64..300.0) {
            let expected = Beats::from_sixteenths(n);
            let seconds = expected.as_f64() * 60.0 / tempo;
            let got = quantize(seconds, tempo).unwrap();
            prop_assert!((got.as_f64() - expected.as_f64()).abs() < 1e-6);
        }

        #[test]
        fn test_triplet_grid_is_fixed_point(m in 0u32..96, tempo in 40.0f64..300.0) {
            let expected = Beats::from_triplet_sixteenths(m);
            let seconds = expected.as_f64() * 60.0 / tempo;
            let got = quantize(seconds, tempo).unwrap();
            prop_assert!((got.as_f64() - expected.as_f64()).abs() < 1e-6);
        }
    }
}
