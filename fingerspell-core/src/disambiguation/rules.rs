//! Ordered correction table for the classifier's coarse group vote.
//!
//! Each [`Rule`] is keyed by the `(g1, g2)` pairs it applies to and carries a
//! geometric predicate over the raw landmarks. The table is scanned top to
//! bottom with the classifier's own pair; the first rule whose key and
//! predicate both match replaces `g1` with its target. Order is priority.

use crate::classifier::ClassificationGroup::{self, Aemnst, Bdfikruvw, Co, Gh, Jy, Pqz, L, X};
use crate::disambiguation::DisambiguationThresholds;
use crate::landmarks::{
    Finger, LandmarkSet, INDEX_MCP, INDEX_TIP, MIDDLE_DIP, MIDDLE_PIP, MIDDLE_TIP,
    PINKY_TIP, RING_PIP, RING_TIP, THUMB_CMC, THUMB_IP, THUMB_MCP, THUMB_TIP, WRIST,
};

pub type Predicate = fn(&LandmarkSet, &DisambiguationThresholds) -> bool;

/// One `{pairs, predicate, target}` correction.
pub struct Rule {
    pub name: &'static str,
    pub pairs: &'static [(usize, usize)],
    pub predicate: Predicate,
    pub target: ClassificationGroup,
}

impl Rule {
    pub fn applies(
        &self,
        pair: (usize, usize),
        raw: &LandmarkSet,
        thresholds: &DisambiguationThresholds,
    ) -> bool {
        self.pairs.contains(&pair) && (self.predicate)(raw, thresholds)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Correct `g1` of `pair`. Returns the resulting group and the name of the
/// rule that fired, if any.
pub fn correct_group(
    pair: (usize, usize),
    raw: &LandmarkSet,
    thresholds: &DisambiguationThresholds,
) -> (ClassificationGroup, Option<&'static str>) {
    match RULES.iter().find(|rule| rule.applies(pair, raw, thresholds)) {
        Some(rule) => (rule.target, Some(rule.name)),
        None => (
            ClassificationGroup::from_index(pair.0).unwrap_or(ClassificationGroup::Aemnst),
            None,
        ),
    }
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "fist-collapse",
        pairs: &[
            (5, 2), (5, 3), (3, 5), (3, 6), (3, 0), (3, 2), (6, 4), (6, 1), (6, 2), (6, 7),
            (6, 0), (6, 5), (4, 1), (1, 0), (6, 3), (1, 6), (5, 6), (5, 1), (4, 5), (1, 4),
            (1, 5), (2, 0), (2, 6), (4, 6), (5, 7), (7, 6), (2, 5), (7, 1), (5, 4), (7, 0),
            (7, 5), (7, 2),
        ],
        predicate: all_raised,
        target: Aemnst,
    },
    Rule {
        name: "o-to-s",
        pairs: &[(2, 1)],
        predicate: thumb_right_of_index_knuckle,
        target: Aemnst,
    },
    Rule {
        name: "c-wrist-trailing",
        pairs: &[(0, 0), (0, 6), (0, 2), (0, 5), (0, 1), (0, 7), (5, 2), (7, 6), (7, 1)],
        predicate: wrist_trails_hand,
        target: Co,
    },
    Rule {
        name: "c-narrow-spread",
        pairs: &[(6, 0), (6, 2)],
        predicate: narrow_index_ring_spread,
        target: Co,
    },
    Rule {
        name: "g-pointing-sideways",
        pairs: &[(1, 4), (1, 5), (1, 6), (1, 3), (1, 0)],
        predicate: index_points_away_from_wrist,
        target: Gh,
    },
    Rule {
        name: "g-over-l",
        pairs: &[(4, 6), (4, 1), (4, 5), (4, 3), (4, 7)],
        predicate: thumb_right_of_wrist,
        target: Gh,
    },
    Rule {
        name: "g-over-pqz",
        pairs: &[(5, 3), (5, 0), (5, 7), (5, 4), (5, 2), (5, 1)],
        predicate: thumb_base_above_ring_tip,
        target: Gh,
    },
    Rule {
        name: "l-over-x",
        pairs: &[(6, 4), (6, 1), (6, 2)],
        predicate: long_thumb_reach,
        target: L,
    },
    Rule {
        name: "l-over-d",
        pairs: &[(1, 4), (1, 6)],
        predicate: index_only_with_open_thumb,
        target: L,
    },
    Rule {
        name: "l-over-gh",
        pairs: &[(3, 6), (3, 4)],
        predicate: thumb_left_of_wrist,
        target: L,
    },
    Rule {
        name: "l-over-co",
        pairs: &[(2, 5), (2, 4)],
        predicate: thumb_base_left_of_middle_tip,
        target: L,
    },
    Rule {
        name: "z-over-gh",
        pairs: &[(3, 6), (3, 5), (3, 4)],
        predicate: index_only_with_low_thumb,
        target: Pqz,
    },
    Rule {
        name: "pqz-over-gh",
        pairs: &[(3, 2), (3, 1), (3, 6)],
        predicate: thumb_below_fingertips,
        target: Pqz,
    },
    Rule {
        name: "pqz-over-l",
        pairs: &[(4, 2), (7, 5), (7, 6), (7, 0)],
        predicate: thumb_right_of_wrist,
        target: Pqz,
    },
    Rule {
        name: "pqz-over-fist",
        pairs: &[(0, 2), (0, 6), (0, 1), (0, 5), (0, 0), (0, 7), (0, 4), (0, 3), (2, 7)],
        predicate: wrist_leads_hand,
        target: Pqz,
    },
    Rule {
        name: "jy-over-pqz",
        pairs: &[(5, 7), (5, 2), (5, 6)],
        predicate: thumb_joint_left_of_wrist,
        target: Jy,
    },
    Rule {
        name: "jy-over-l",
        pairs: &[(4, 6), (4, 2), (4, 1), (4, 5), (4, 7)],
        predicate: index_curled,
        target: Jy,
    },
    Rule {
        name: "jy-over-x",
        pairs: &[(6, 7), (0, 7), (0, 1), (0, 0), (6, 4), (6, 5), (6, 1)],
        predicate: pinky_raised,
        target: Jy,
    },
    Rule {
        name: "x-over-fist",
        pairs: &[(0, 4), (0, 2), (0, 3), (0, 1), (0, 6)],
        predicate: index_knuckle_right_of_ring_tip,
        target: X,
    },
    Rule {
        name: "x-over-jy",
        pairs: &[(7, 2)],
        predicate: pinky_curled_index_high,
        target: X,
    },
    Rule {
        name: "x-over-co",
        pairs: &[(2, 1), (2, 6), (2, 7), (2, 0)],
        predicate: wide_index_ring_spread,
        target: X,
    },
    Rule {
        name: "d-short-reach",
        pairs: &[(4, 1), (4, 2)],
        predicate: index_only_with_closed_thumb,
        target: Bdfikruvw,
    },
    Rule {
        name: "x-over-l",
        pairs: &[(4, 6), (4, 2), (4, 1)],
        predicate: short_thumb_reach,
        target: X,
    },
    Rule {
        name: "x-over-d",
        pairs: &[(1, 4), (1, 6), (1, 0), (1, 2)],
        predicate: thumb_well_left_of_index_knuckle,
        target: X,
    },
    Rule {
        name: "b-all-raised",
        pairs: &[(5, 0), (0, 2), (7, 4)],
        predicate: all_raised,
        target: Bdfikruvw,
    },
    Rule {
        name: "f-index-curled",
        pairs: &[
            (6, 0), (0, 3), (0, 6), (6, 2), (7, 6), (0, 2), (7, 1), (7, 4), (7, 2), (7, 5),
        ],
        predicate: f_shape,
        target: Bdfikruvw,
    },
    Rule {
        name: "f-three-raised",
        pairs: &[(6, 0), (4, 2), (4, 1), (4, 6)],
        predicate: outer_three_raised,
        target: Bdfikruvw,
    },
    Rule {
        name: "d-thumb-tucked",
        pairs: &[
            (5, 0), (3, 4), (3, 0), (3, 1), (3, 5), (5, 4), (5, 1), (7, 6), (3, 6),
        ],
        predicate: index_only_with_tucked_thumb,
        target: Bdfikruvw,
    },
    Rule {
        name: "d-thumb-across",
        pairs: &[(6, 4), (6, 1), (6, 2)],
        predicate: thumb_near_index_knuckle,
        target: Bdfikruvw,
    },
    Rule {
        name: "i-pinky-only",
        pairs: &[
            (5, 4), (5, 1), (0, 3), (5, 0), (0, 2), (6, 2), (7, 5), (7, 1), (7, 6),
        ],
        predicate: pinky_only,
        target: Bdfikruvw,
    },
    Rule {
        name: "jy-over-i",
        pairs: &[(1, 5), (1, 7), (1, 6), (1, 3), (1, 0)],
        predicate: pinky_only_with_thumb_in,
        target: Jy,
    },
    Rule {
        name: "uvr-two-raised",
        pairs: &[(5, 0), (5, 4), (5, 1), (4, 6), (4, 1), (7, 6), (3, 0), (3, 5)],
        predicate: two_raised_with_low_thumb,
        target: Bdfikruvw,
    },
    Rule {
        name: "w-neutral-wrist",
        pairs: &[(3, 5), (3, 0), (3, 6), (5, 1), (2, 0), (5, 0)],
        predicate: neutral_wrist_closed_thumb,
        target: Bdfikruvw,
    },
    Rule {
        name: "w-three-raised",
        pairs: &[(5, 0), (0, 1)],
        predicate: inner_three_raised,
        target: Bdfikruvw,
    },
];

const TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

#[derive(Clone, Copy)]
enum Pose {
    Up,
    Down,
}

/// Every finger matches its expected pose, strictly.
fn pose(l: &LandmarkSet, expected: [Pose; 4]) -> bool {
    Finger::ALL
        .iter()
        .zip(expected)
        .all(|(finger, want)| match want {
            Pose::Up => l.is_raised(*finger),
            Pose::Down => l.is_curled(*finger),
        })
}

fn all_raised(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    Finger::ALL.iter().all(|f| l.is_raised(*f))
}

fn thumb_right_of_index_knuckle(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    l[INDEX_MCP].x < l[THUMB_TIP].x
}

fn wrist_trails_hand(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    let wrist = l[WRIST].x;
    wrist > l[THUMB_TIP].x
        && TIPS.iter().all(|tip| wrist > l[*tip].x)
        && l[INDEX_MCP].x > l[THUMB_TIP].x
}

fn narrow_index_ring_spread(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    l.distance(INDEX_TIP, RING_TIP) < t.co_max_index_ring_spread
}

fn wide_index_ring_spread(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    l.distance(INDEX_TIP, RING_TIP) > t.x_min_index_ring_spread
}

fn index_points_away_from_wrist(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    l.is_raised(Finger::Index)
        && l.is_curled(Finger::Ring)
        && l.is_curled(Finger::Pinky)
        && wrist_leads_hand(l, t)
}

fn wrist_leads_hand(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    TIPS.iter().all(|tip| l[WRIST].x < l[*tip].x)
}

fn thumb_right_of_wrist(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    l[THUMB_TIP].x > l[WRIST].x
}

fn thumb_left_of_wrist(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    l[THUMB_TIP].x < l[WRIST].x
}

fn thumb_joint_left_of_wrist(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    l[THUMB_IP].x < l[WRIST].x
}

fn thumb_base_above_ring_tip(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    l[THUMB_MCP].y + t.gh_thumb_base_margin < l[RING_TIP].y
}

fn thumb_base_left_of_middle_tip(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    l[THUMB_CMC].x < l[MIDDLE_TIP].x
}

fn long_thumb_reach(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    l.distance(THUMB_TIP, MIDDLE_DIP) > t.l_min_thumb_reach
}

fn short_thumb_reach(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    l.distance(THUMB_TIP, MIDDLE_DIP) < t.x_max_thumb_reach
}

fn index_only(l: &LandmarkSet) -> bool {
    pose(l, [Pose::Up, Pose::Down, Pose::Down, Pose::Down])
}

fn index_only_with_open_thumb(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    l.distance(THUMB_TIP, MIDDLE_DIP) > t.l_over_d_min_thumb_reach && index_only(l)
}

fn index_only_with_closed_thumb(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    l.distance(THUMB_TIP, MIDDLE_DIP) < t.d_max_thumb_reach && index_only(l)
}

fn index_only_with_low_thumb(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    index_only(l) && l[THUMB_TIP].y > l[MIDDLE_PIP].y
}

fn index_only_with_tucked_thumb(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    index_only(l) && l[THUMB_MCP].x < l[WRIST].x && l[THUMB_TIP].y > l[RING_PIP].y
}

fn thumb_below_fingertips(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    let thumb = l[THUMB_TIP].y + t.pqz_thumb_margin;
    TIPS.iter().all(|tip| thumb > l[*tip].y)
}

fn index_curled(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    l.is_curled(Finger::Index)
}

fn pinky_raised(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    l.is_raised(Finger::Pinky)
}

fn index_knuckle_right_of_ring_tip(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    l[INDEX_MCP].x > l[RING_TIP].x
}

fn pinky_curled_index_high(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    l.is_curled(Finger::Pinky) && l[INDEX_TIP].y < l[MIDDLE_PIP].y
}

fn thumb_well_left_of_index_knuckle(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    l[INDEX_MCP].x - l[THUMB_TIP].x - t.thumb_knuckle_margin > 0.0
}

fn thumb_near_index_knuckle(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    l[INDEX_MCP].x - l[THUMB_TIP].x - t.thumb_knuckle_margin < 0.0
}

fn f_shape(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    pose(l, [Pose::Down, Pose::Up, Pose::Up, Pose::Up])
}

fn outer_three_raised(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    l.is_raised(Finger::Middle) && l.is_raised(Finger::Ring) && l.is_raised(Finger::Pinky)
}

fn inner_three_raised(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    l.is_raised(Finger::Index) && l.is_raised(Finger::Middle) && l.is_raised(Finger::Ring)
}

fn pinky_only(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    pose(l, [Pose::Down, Pose::Down, Pose::Down, Pose::Up])
}

fn pinky_only_with_thumb_in(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    l[THUMB_TIP].x < l[INDEX_MCP].x + t.thumb_knuckle_margin && pinky_only(l, t)
}

fn two_raised_with_low_thumb(l: &LandmarkSet, _: &DisambiguationThresholds) -> bool {
    pose(l, [Pose::Up, Pose::Up, Pose::Down, Pose::Down]) && l[THUMB_TIP].y > l[RING_PIP].y
}

fn neutral_wrist_closed_thumb(l: &LandmarkSet, t: &DisambiguationThresholds) -> bool {
    let wrist = l[WRIST].x;
    let clearly_right = TIPS.iter().all(|tip| wrist + t.w_wrist_margin < l[*tip].x);
    let clearly_left = TIPS.iter().all(|tip| wrist > l[*tip].x);
    !clearly_right && !clearly_left && l.distance(THUMB_TIP, MIDDLE_DIP) < t.w_max_thumb_reach
}
