//! Geometric disambiguation of the coarse classifier output.
//!
//! ## Stages
//!
//! ```text
//! scores[8] ──top_two──► (g1, g2)
//!                           │
//!              rules::correct_group(pair, raw landmarks)   first matching rule wins
//!                           │
//!                      corrected group
//!                           │
//!              resolve::resolve_letter(group, raw landmarks)
//!                           │
//!                         letter
//! ```
//!
//! Everything here is a pure function of `(scores, landmarks, thresholds)`.
//! Landmarks are the raw pixel-space points, not the normalized ones: the
//! distance thresholds are calibrated in source-frame pixels.

pub mod resolve;
pub mod rules;

use serde::{Deserialize, Serialize};

use crate::classifier::{ClassificationGroup, GroupScores};
use crate::landmarks::LandmarkSet;

pub use resolve::resolve_letter;
pub use rules::{correct_group, Rule, RULES};

/// Pixel thresholds used by the rule table and the per-group resolvers.
///
/// Defaults are the hand-tuned heuristic values, measured on
/// a 640×480 source frame. They depend on camera resolution and hand
/// distance and are expected to be re-tuned against labelled recordings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisambiguationThresholds {
    /// Index-tip ↔ ring-tip distance below which an X vote becomes C/O.
    pub co_max_index_ring_spread: f32,
    /// Index-tip ↔ ring-tip distance above which a C/O vote becomes X.
    pub x_min_index_ring_spread: f32,
    /// Thumb-tip ↔ middle-DIP distance above which an X vote becomes L.
    pub l_min_thumb_reach: f32,
    /// Thumb-tip ↔ middle-DIP distance above which a D-shaped hand is L.
    pub l_over_d_min_thumb_reach: f32,
    /// Thumb-tip ↔ middle-DIP distance below which an L vote becomes X.
    pub x_max_thumb_reach: f32,
    /// Thumb-tip ↔ middle-DIP distance below which an L vote with a D shape is D.
    pub d_max_thumb_reach: f32,
    /// Thumb-tip ↔ middle-DIP distance below which a neutral wrist reads as W.
    pub w_max_thumb_reach: f32,
    /// Vertical margin between thumb MCP and ring tip for the G/H override.
    pub gh_thumb_base_margin: f32,
    /// Vertical slack for "thumb tip below every fingertip" (P/Q/Z).
    pub pqz_thumb_margin: f32,
    /// Horizontal margin between thumb tip and index knuckle.
    pub thumb_knuckle_margin: f32,
    /// Horizontal dead zone around the wrist for the W override.
    pub w_wrist_margin: f32,
    /// Extra index/middle spread (tips vs. mid joints) that separates V from U.
    pub uv_spread_delta: f32,
    /// Thumb-tip ↔ middle-tip distance above which C (open) beats O (closed).
    pub co_thumb_middle_distance: f32,
    /// Index-tip ↔ middle-tip distance above which G beats H.
    pub gh_index_middle_distance: f32,
    /// Thumb-tip ↔ index-tip distance above which Y beats J.
    pub jy_thumb_index_distance: f32,
}

impl Default for DisambiguationThresholds {
    fn default() -> Self {
        Self {
            co_max_index_ring_spread: 52.0,
            x_min_index_ring_spread: 50.0,
            l_min_thumb_reach: 55.0,
            l_over_d_min_thumb_reach: 50.0,
            x_max_thumb_reach: 60.0,
            d_max_thumb_reach: 50.0,
            w_max_thumb_reach: 50.0,
            gh_thumb_base_margin: 15.0,
            pqz_thumb_margin: 17.0,
            thumb_knuckle_margin: 15.0,
            w_wrist_margin: 13.0,
            uv_spread_delta: 8.0,
            co_thumb_middle_distance: 42.0,
            gh_index_middle_distance: 72.0,
            jy_thumb_index_distance: 42.0,
        }
    }
}

impl DisambiguationThresholds {
    /// Replace negative or non-finite values with the defaults.
    pub fn normalize(&mut self) {
        let defaults = Self::default();
        let fields: [(&mut f32, f32); 15] = [
            (&mut self.co_max_index_ring_spread, defaults.co_max_index_ring_spread),
            (&mut self.x_min_index_ring_spread, defaults.x_min_index_ring_spread),
            (&mut self.l_min_thumb_reach, defaults.l_min_thumb_reach),
            (&mut self.l_over_d_min_thumb_reach, defaults.l_over_d_min_thumb_reach),
            (&mut self.x_max_thumb_reach, defaults.x_max_thumb_reach),
            (&mut self.d_max_thumb_reach, defaults.d_max_thumb_reach),
            (&mut self.w_max_thumb_reach, defaults.w_max_thumb_reach),
            (&mut self.gh_thumb_base_margin, defaults.gh_thumb_base_margin),
            (&mut self.pqz_thumb_margin, defaults.pqz_thumb_margin),
            (&mut self.thumb_knuckle_margin, defaults.thumb_knuckle_margin),
            (&mut self.w_wrist_margin, defaults.w_wrist_margin),
            (&mut self.uv_spread_delta, defaults.uv_spread_delta),
            (&mut self.co_thumb_middle_distance, defaults.co_thumb_middle_distance),
            (&mut self.gh_index_middle_distance, defaults.gh_index_middle_distance),
            (&mut self.jy_thumb_index_distance, defaults.jy_thumb_index_distance),
        ];
        for (value, default) in fields {
            if !value.is_finite() || *value < 0.0 {
                *value = default;
            }
        }
    }
}

/// Full trace of one disambiguation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disambiguation {
    /// Classifier's top two groups, before correction.
    pub coarse: (usize, usize),
    /// Name of the rule that overrode `g1`, if any.
    pub rule: Option<&'static str>,
    /// Group after correction.
    pub group: ClassificationGroup,
    pub letter: char,
}

/// Stateless engine holding the threshold set.
#[derive(Debug, Clone, Default)]
pub struct DisambiguationEngine {
    thresholds: DisambiguationThresholds,
}

impl DisambiguationEngine {
    pub fn new(thresholds: DisambiguationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &DisambiguationThresholds {
        &self.thresholds
    }

    /// Pick the letter for `probabilities` and the raw pixel-space landmarks.
    pub fn disambiguate(&self, probabilities: &GroupScores, raw: &LandmarkSet) -> char {
        self.explain(probabilities, raw).letter
    }

    /// Like [`disambiguate`](Self::disambiguate), but keeps the intermediate
    /// decisions for logging and tests.
    pub fn explain(&self, probabilities: &GroupScores, raw: &LandmarkSet) -> Disambiguation {
        let coarse = top_two(probabilities);
        let (group, rule) = correct_group(coarse, raw, &self.thresholds);
        let letter = resolve_letter(group, raw, &self.thresholds);
        Disambiguation {
            coarse,
            rule,
            group,
            letter,
        }
    }
}

/// Top-two group indices.
///
/// `g1` is the first maximum; its entry is then zeroed and `g2` is the first
/// maximum of the remainder. NaN never wins. An all-zero remainder yields
/// `g2 = 0`, so `(0, 0)` is a reachable pair.
pub fn top_two(scores: &GroupScores) -> (usize, usize) {
    let first = argmax(scores);
    let mut rest = *scores;
    rest[first] = 0.0;
    (first, argmax(&rest))
}

fn argmax(scores: &GroupScores) -> usize {
    let rank = |v: f32| if v.is_nan() { f32::NEG_INFINITY } else { v };
    let mut best = 0;
    for (i, v) in scores.iter().enumerate().skip(1) {
        if rank(*v) > rank(scores[best]) {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::fixtures::{collapsed, open_palm};
    use crate::landmarks::{Landmark, THUMB_TIP};

    fn scores_with(top: usize, second: usize) -> GroupScores {
        let mut s = [0.01; 8];
        s[top] = 0.7;
        s[second] = 0.2;
        s
    }

    #[test]
    fn top_two_breaks_ties_by_lowest_index() {
        assert_eq!(top_two(&[0.1, 0.4, 0.4, 0.1, 0.0, 0.0, 0.0, 0.0]), (1, 2));
        assert_eq!(top_two(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.3, 0.3, 0.3]), (5, 6));
        assert_eq!(top_two(&[0.125; 8]), (0, 1));
    }

    #[test]
    fn top_two_zeroes_winner_so_all_zero_remainder_points_at_zero() {
        assert_eq!(top_two(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]), (0, 0));
        assert_eq!(top_two(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]), (3, 0));
    }

    #[test]
    fn top_two_ignores_nan() {
        let s = [f32::NAN, 0.2, f32::NAN, 0.5, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(top_two(&s), (3, 1));
        assert_eq!(top_two(&[f32::NAN; 8]), (0, 0));
    }

    #[test]
    fn disambiguation_is_deterministic() {
        let engine = DisambiguationEngine::default();
        let hand = open_palm();
        for g1 in 0..8 {
            for g2 in 0..8 {
                if g1 == g2 {
                    continue;
                }
                let s = scores_with(g1, g2);
                let first = engine.explain(&s, &hand);
                for _ in 0..3 {
                    assert_eq!(engine.explain(&s, &hand), first);
                }
            }
        }
    }

    #[test]
    fn raised_fingers_with_pqz_over_co_vote_override_to_fist_group() {
        let engine = DisambiguationEngine::default();

        // Thumb tip right of the mid joints: resolves to S.
        let mut points = *open_palm().points();
        points[THUMB_TIP] = Landmark::new(380.0, 300.0, 0.0);
        let hand = LandmarkSet::new(points);
        let trace = engine.explain(&scores_with(5, 2), &hand);
        assert_eq!(trace.coarse, (5, 2));
        assert_eq!(trace.group, ClassificationGroup::Aemnst);
        assert_eq!(trace.rule, Some("fist-collapse"));
        assert_eq!(trace.letter, 'S');

        // Thumb tip left of every mid joint: resolves to A.
        assert_eq!(engine.disambiguate(&scores_with(5, 2), &open_palm()), 'A');
    }

    #[test]
    fn fully_degenerate_hand_still_yields_a_group_letter() {
        let engine = DisambiguationEngine::default();
        let flat = collapsed(120.0, 240.0);
        for g1 in 0..8 {
            let mut s = [0.0; 8];
            s[g1] = 1.0;
            let trace = engine.explain(&s, &flat);
            assert!(
                trace.group.letters().contains(&trace.letter),
                "group {g1} -> {trace:?}"
            );
        }
        let mut s = [0.0; 8];
        s[0] = 1.0;
        assert_eq!(engine.disambiguate(&s, &flat), 'S');
    }

    #[test]
    fn thresholds_are_configurable() {
        // (2, 3) is not keyed by any rule, so only the C/O split decides.
        let mut s = [0.0; 8];
        s[2] = 0.9;
        s[3] = 0.1;
        let tight = DisambiguationEngine::new(DisambiguationThresholds {
            co_thumb_middle_distance: 1.0,
            ..DisambiguationThresholds::default()
        });
        let loose = DisambiguationEngine::new(DisambiguationThresholds {
            co_thumb_middle_distance: 10_000.0,
            ..DisambiguationThresholds::default()
        });
        assert_eq!(tight.disambiguate(&s, &open_palm()), 'C');
        assert_eq!(loose.disambiguate(&s, &open_palm()), 'O');
    }

    #[test]
    fn normalize_restores_invalid_thresholds() {
        let mut t = DisambiguationThresholds {
            uv_spread_delta: f32::NAN,
            gh_index_middle_distance: -3.0,
            jy_thumb_index_distance: 12.0,
            ..DisambiguationThresholds::default()
        };
        t.normalize();
        assert_eq!(t.uv_spread_delta, 8.0);
        assert_eq!(t.gh_index_middle_distance, 72.0);
        assert_eq!(t.jy_thumb_index_distance, 12.0);
    }
}
