//! Head speed calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::*;
use crate::seg_map::HeadSegment;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Head speed demanded by the head slider mapping.
///
/// Units: radians/second
pub fn target_head_radps(mapping: &Mapping<HeadSegment>, params: &Params) -> f64 {
    params.max_head_speed_radps 
        * clamp(&mapping.magnitude, &0.0, &1.0) 
        * mapping.segment.sign()
}

/// Synthesise a head speed from the head slider mapping.
///
/// Returns the speed to send, or `None` if the last sent speed should be
/// kept. A return to (near) zero while the head is still moving always
/// produces an explicit zero.
///
/// Units: radians/second
pub fn synthesize_head(
    mapping: &Mapping<HeadSegment>,
    last_sent_radps: f64,
    params: &Params
) -> Option<f64> {
    let thr = params.head_speed_change_threshold_radps;
    let target_radps = target_head_radps(mapping, params);

    if is_near_zero(target_radps, thr) {
        if is_near_zero(last_sent_radps, thr) {
            None
        }
        else {
            Some(0.0)
        }
    }
    else if differs_by_more_than(target_radps, last_sent_radps, thr) {
        Some(target_radps)
    }
    else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn head(segment: HeadSegment, magnitude: f64) -> Mapping<HeadSegment> {
        Mapping { segment, magnitude }
    }

    #[test]
    fn test_head_speeds() {
        let p = Params::default();

        assert_eq!(
            synthesize_head(&head(HeadSegment::Forward, 1.0), 0.0, &p),
            Some(p.max_head_speed_radps)
        );
        assert_eq!(
            synthesize_head(&head(HeadSegment::Reverse, 0.5), 0.0, &p),
            Some(-0.5 * p.max_head_speed_radps)
        );
    }

    #[test]
    fn test_head_change_threshold() {
        let p = Params::default();

        assert_eq!(
            synthesize_head(&head(HeadSegment::Forward, 0.5), 1.01, &p),
            None
        );
    }

    #[test]
    fn test_head_explicit_stop() {
        let p = Params::default();

        assert_eq!(synthesize_head(&head(HeadSegment::Neutral, 0.0), 1.0, &p), Some(0.0));
        assert_eq!(synthesize_head(&head(HeadSegment::Neutral, 0.0), 0.0, &p), None);

        // Tiny residual demand also stops the head
        assert_eq!(synthesize_head(&head(HeadSegment::Forward, 0.01), 1.0, &p), Some(0.0));
    }
}
