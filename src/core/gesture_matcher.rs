// Gesture matching: best-of-samples nearest neighbour over the trained library

use crate::core::comparator::{sample_similarity, SimilarityTransform};
use crate::core::normalizer::{normalize_sample, NormalizationMethod};
use crate::models::detection::{meets_threshold, CandidateScore, MatchOutcome};
use crate::models::gesture::{Gesture, GestureCandidate, SampleLandmarks, TrainingSample};
use crate::models::landmark::{HandCount, Observation};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatcherOptions {
    pub normalization: NormalizationMethod,
    pub similarity: SimilarityTransform,
    /// How many per-gesture scores to keep in the ranked list
    pub max_ranked: usize,
}

impl MatcherOptions {
    /// Wrist/fingertip scale with exponential decay, as used for detection
    pub fn live_detection() -> Self {
        Self {
            normalization: NormalizationMethod::WristToMiddleTip,
            similarity: SimilarityTransform::ExponentialDecay,
            max_ranked: 5,
        }
    }

    pub fn with_max_ranked(mut self, max_ranked: usize) -> Self {
        self.max_ranked = max_ranked;
        self
    }
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self::live_detection()
    }
}

/// Stateless matcher; one call is one pass over the candidates
#[derive(Debug, Clone, Default)]
pub struct GestureMatcher {
    options: MatcherOptions,
}

impl GestureMatcher {
    pub fn new(options: MatcherOptions) -> Self {
        Self { options }
    }

    /// Match an observation against the candidate library.
    ///
    /// Each gesture scores as its single best validated sample. The global
    /// winner is picked by strict `>` so ties keep the earlier candidate.
    pub fn match_observation(&self, observation: &Observation, candidates: &[GestureCandidate]) -> MatchOutcome {
        if !candidates.iter().any(GestureCandidate::is_trained) {
            return MatchOutcome::NothingTrained;
        }

        let hand_count = observation.hand_count();
        let query = normalize_sample(&SampleLandmarks::from(observation), self.options.normalization);

        let mut best: Option<CandidateScore> = None;
        let mut scored: Vec<CandidateScore> = Vec::new();

        for candidate in candidates {
            if !accepts(&candidate.gesture, hand_count) {
                continue;
            }

            let Some((score, samples_compared)) = self.best_sample_score(&query, hand_count, &candidate.samples) else {
                continue;
            };

            let entry = CandidateScore {
                gesture: candidate.gesture.summary(),
                score,
                samples_compared,
            };
            if best.as_ref().map_or(true, |b| entry.score > b.score) {
                best = Some(entry.clone());
            }
            scored.push(entry);
        }

        // stable sort keeps candidate order among equal scores
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(self.options.max_ranked);

        tracing::debug!(
            hand_count = u8::from(hand_count),
            scored = scored.len(),
            best = best.as_ref().map(|b| b.score),
            "gesture match pass complete"
        );

        match best {
            Some(winner) if meets_threshold(winner.score) => MatchOutcome::Matched { winner, ranked: scored },
            best => MatchOutcome::NoMatch { best, ranked: scored },
        }
    }

    /// Highest similarity over the validated samples with the query's hand count,
    /// with the number of samples compared. `None` when nothing was comparable.
    fn best_sample_score(
        &self,
        query: &SampleLandmarks,
        hand_count: HandCount,
        samples: &[TrainingSample],
    ) -> Option<(f64, usize)> {
        let mut best: Option<f64> = None;
        let mut compared = 0;

        for sample in samples {
            if !sample.is_validated || sample.hand_count != hand_count {
                continue;
            }
            let reference = self.reference_form(sample);
            let score = sample_similarity(query, &reference, self.options.similarity);
            compared += 1;
            if best.map_or(true, |b| score > b) {
                best = Some(score);
            }
        }

        best.map(|score| (score, compared))
    }

    /// The sample's cached normalized form when it was produced by the same
    /// method, otherwise a fresh normalization of the raw landmarks.
    fn reference_form<'a>(&self, sample: &'a TrainingSample) -> Cow<'a, SampleLandmarks> {
        match (&sample.normalized, self.options.normalization) {
            (Some(cached), NormalizationMethod::WristToMiddleTip) => Cow::Borrowed(cached),
            _ => Cow::Owned(normalize_sample(&sample.landmarks, self.options.normalization)),
        }
    }
}

/// Active gestures whose hand requirement equals the observation's.
/// Mismatched hand counts are excluded outright rather than penalized.
fn accepts(gesture: &Gesture, hand_count: HandCount) -> bool {
    gesture.is_active && gesture.required_hand_count() == hand_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{
        candidate, distorted_open_hand, dual_observation, fist, gesture, open_hand, sample, single_observation,
    };
    use crate::core::normalizer::normalize;
    use crate::models::detection::{round_confidence, CONFIDENCE_THRESHOLD};
    use crate::models::landmark::Landmark;

    /// A validated sample whose cached normalized form sits at a fixed
    /// per-point distance from the open hand, so it scores exactly `target`.
    fn sample_scoring(id: &str, gesture_id: &str, target: f64) -> TrainingSample {
        let distance = -target.ln() / 10.0;
        let shifted: Vec<Landmark> = normalize(&open_hand())
            .into_iter()
            .map(|p| Landmark::new(p.x + distance, p.y, p.z))
            .collect();
        let mut s = sample(id, gesture_id, SampleLandmarks::Single(open_hand()));
        s.normalized = Some(SampleLandmarks::Single(shifted));
        s
    }

    #[test]
    fn test_end_to_end_open_hand_matches_hello() {
        let hello = gesture("g-hello", "Hello", false);
        let mut near = open_hand();
        near[8].x += 0.0005;
        let library = vec![candidate(
            hello,
            vec![
                sample("s1", "g-hello", SampleLandmarks::Single(open_hand())),
                sample("s2", "g-hello", SampleLandmarks::Single(near)),
            ],
        )];

        let matcher = GestureMatcher::default();
        let outcome = matcher.match_observation(&single_observation(open_hand()), &library);
        assert!(outcome.meets_threshold());
        let winner = outcome.winner().unwrap();
        assert_eq!(winner.gesture.label, "Hello");
        assert!((winner.score - 1.0).abs() < 1e-9);
        assert_eq!(winner.samples_compared, 2);

        let distorted = matcher.match_observation(&single_observation(distorted_open_hand(0.5)), &library);
        assert!(!distorted.meets_threshold());
        assert!(distorted.best_score() < 0.01);
    }

    #[test]
    fn test_translated_query_still_matches() {
        let library = vec![candidate(
            gesture("g-hello", "Hello", false),
            vec![sample("s1", "g-hello", SampleLandmarks::Single(open_hand()))],
        )];
        let shifted: Vec<Landmark> = open_hand()
            .into_iter()
            .map(|p| Landmark::new(p.x + 0.5, p.y, p.z))
            .collect();

        let outcome = GestureMatcher::default().match_observation(&single_observation(shifted), &library);
        assert!(outcome.meets_threshold());
    }

    #[test]
    fn test_dual_hand_gesture_never_matches_single_query() {
        let library = vec![candidate(
            gesture("g-dual", "Together", true),
            vec![sample(
                "s1",
                "g-dual",
                SampleLandmarks::Dual { left: open_hand(), right: open_hand() },
            )],
        )];

        let outcome = GestureMatcher::default().match_observation(&single_observation(open_hand()), &library);
        assert_eq!(outcome, MatchOutcome::NoMatch { best: None, ranked: vec![] });
    }

    #[test]
    fn test_single_hand_gesture_excluded_from_dual_query() {
        let library = vec![
            candidate(
                gesture("g-single", "Hello", false),
                vec![sample("s1", "g-single", SampleLandmarks::Single(open_hand()))],
            ),
            candidate(
                gesture("g-dual", "Together", true),
                vec![sample(
                    "s2",
                    "g-dual",
                    SampleLandmarks::Dual { left: open_hand(), right: fist() },
                )],
            ),
        ];

        let outcome = GestureMatcher::default().match_observation(&dual_observation(open_hand(), fist()), &library);
        let winner = outcome.winner().expect("dual gesture should match");
        assert_eq!(winner.gesture.id, "g-dual");
        assert_eq!(outcome.ranked().len(), 1);
    }

    #[test]
    fn test_best_of_samples_is_max_not_average() {
        let library = vec![candidate(
            gesture("g-hello", "Hello", false),
            vec![
                sample_scoring("s1", "g-hello", 0.5),
                sample_scoring("s2", "g-hello", 0.9),
                sample_scoring("s3", "g-hello", 0.3),
            ],
        )];

        let outcome = GestureMatcher::default().match_observation(&single_observation(open_hand()), &library);
        let winner = outcome.winner().unwrap();
        assert!((round_confidence(winner.score) - 0.9).abs() < 1e-4);
        assert_eq!(winner.samples_compared, 3);
    }

    #[test]
    fn test_below_threshold_reports_raw_best() {
        let library = vec![candidate(
            gesture("g-hello", "Hello", false),
            vec![sample_scoring("s1", "g-hello", 0.65)],
        )];

        let outcome = GestureMatcher::default().match_observation(&single_observation(open_hand()), &library);
        match outcome {
            MatchOutcome::NoMatch { best: Some(best), ranked } => {
                assert!((best.score - 0.65).abs() < 1e-9);
                assert!(best.score <= CONFIDENCE_THRESHOLD);
                assert_eq!(ranked.len(), 1);
            }
            other => panic!("expected a below-threshold outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_threshold_boundary_splits_match_from_no_match() {
        let matcher = GestureMatcher::default();
        let query = single_observation(open_hand());

        let above = vec![candidate(
            gesture("g-hello", "Hello", false),
            vec![sample_scoring("s1", "g-hello", 0.7001)],
        )];
        match matcher.match_observation(&query, &above) {
            MatchOutcome::Matched { winner, .. } => {
                assert!(winner.score > CONFIDENCE_THRESHOLD);
                assert!((winner.score - 0.7001).abs() < 1e-9);
            }
            other => panic!("expected a match just above the threshold, got {:?}", other),
        }

        let below = vec![candidate(
            gesture("g-hello", "Hello", false),
            vec![sample_scoring("s1", "g-hello", 0.6999)],
        )];
        match matcher.match_observation(&query, &below) {
            MatchOutcome::NoMatch { best: Some(best), .. } => {
                assert!(best.score <= CONFIDENCE_THRESHOLD);
            }
            other => panic!("expected no match just below the threshold, got {:?}", other),
        }
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let library = vec![
            candidate(
                gesture("g-first", "First", false),
                vec![sample("s1", "g-first", SampleLandmarks::Single(open_hand()))],
            ),
            candidate(
                gesture("g-second", "Second", false),
                vec![sample("s2", "g-second", SampleLandmarks::Single(open_hand()))],
            ),
        ];

        let outcome = GestureMatcher::default().match_observation(&single_observation(open_hand()), &library);
        assert_eq!(outcome.winner().unwrap().gesture.id, "g-first");
        assert_eq!(outcome.ranked()[0].gesture.id, "g-first");
    }

    #[test]
    fn test_picks_closest_gesture() {
        let library = vec![
            candidate(
                gesture("g-fist", "Fist", false),
                vec![sample("s1", "g-fist", SampleLandmarks::Single(fist()))],
            ),
            candidate(
                gesture("g-hello", "Hello", false),
                vec![sample("s2", "g-hello", SampleLandmarks::Single(open_hand()))],
            ),
        ];

        let outcome = GestureMatcher::default().match_observation(&single_observation(fist()), &library);
        assert_eq!(outcome.winner().unwrap().gesture.label, "Fist");
        let ranked = outcome.ranked();
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_nothing_trained() {
        let matcher = GestureMatcher::default();
        let query = single_observation(open_hand());
        assert_eq!(matcher.match_observation(&query, &[]), MatchOutcome::NothingTrained);

        let mut unvalidated = sample("s1", "g-hello", SampleLandmarks::Single(open_hand()));
        unvalidated.is_validated = false;
        let library = vec![candidate(gesture("g-hello", "Hello", false), vec![unvalidated])];
        assert_eq!(matcher.match_observation(&query, &library), MatchOutcome::NothingTrained);

        let mut inactive = gesture("g-off", "Off", false);
        inactive.is_active = false;
        let library = vec![candidate(
            inactive,
            vec![sample("s2", "g-off", SampleLandmarks::Single(open_hand()))],
        )];
        assert_eq!(matcher.match_observation(&query, &library), MatchOutcome::NothingTrained);
    }

    #[test]
    fn test_unvalidated_samples_do_not_score() {
        let mut perfect = sample("s1", "g-hello", SampleLandmarks::Single(open_hand()));
        perfect.is_validated = false;
        let library = vec![candidate(
            gesture("g-hello", "Hello", false),
            vec![perfect, sample("s2", "g-hello", SampleLandmarks::Single(fist()))],
        )];

        let outcome = GestureMatcher::default().match_observation(&single_observation(open_hand()), &library);
        assert!(!outcome.meets_threshold());
        assert_eq!(outcome.ranked()[0].samples_compared, 1);
    }

    #[test]
    fn test_cached_normalized_form_is_used() {
        let mut cached = sample("s1", "g-hello", SampleLandmarks::Single(fist()));
        // a cache that disagrees with the raw data proves which one is read
        cached.normalized = Some(SampleLandmarks::Single(normalize(&open_hand())));
        let library = vec![candidate(gesture("g-hello", "Hello", false), vec![cached])];

        let outcome = GestureMatcher::default().match_observation(&single_observation(open_hand()), &library);
        assert!(outcome.meets_threshold());
    }

    #[test]
    fn test_ranked_list_is_truncated() {
        let library: Vec<_> = (0..4)
            .map(|i| {
                let id = format!("g{}", i);
                candidate(
                    gesture(&id, &format!("Gesture {}", i), false),
                    vec![sample(&format!("s{}", i), &id, SampleLandmarks::Single(open_hand()))],
                )
            })
            .collect();

        let matcher = GestureMatcher::new(MatcherOptions::live_detection().with_max_ranked(2));
        let outcome = matcher.match_observation(&single_observation(open_hand()), &library);
        assert_eq!(outcome.ranked().len(), 2);
        assert_eq!(outcome.winner().unwrap().gesture.id, "g0");
    }
}
