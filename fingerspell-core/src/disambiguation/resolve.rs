//! Per-group letter resolution.
//!
//! One small decision function per [`ClassificationGroup`]. Each is total: a
//! residual branch names the group's default letter, so every input
//! (including a fully collapsed hand) yields a letter from that group.

use crate::classifier::ClassificationGroup;
use crate::disambiguation::DisambiguationThresholds;
use crate::landmarks::{
    Finger, LandmarkSet, INDEX_MCP, INDEX_PIP, INDEX_TIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP,
    PINKY_PIP, PINKY_TIP, RING_PIP, RING_TIP, THUMB_TIP,
};

pub fn resolve_letter(
    group: ClassificationGroup,
    raw: &LandmarkSet,
    thresholds: &DisambiguationThresholds,
) -> char {
    match group {
        ClassificationGroup::Aemnst => resolve_fist(raw),
        ClassificationGroup::Bdfikruvw => resolve_raised(raw, thresholds),
        ClassificationGroup::Co => {
            if raw.distance(MIDDLE_TIP, THUMB_TIP) > thresholds.co_thumb_middle_distance {
                'C'
            } else {
                'O'
            }
        }
        ClassificationGroup::Gh => {
            if raw.distance(INDEX_TIP, MIDDLE_TIP) > thresholds.gh_index_middle_distance {
                'G'
            } else {
                'H'
            }
        }
        ClassificationGroup::L => 'L',
        ClassificationGroup::Pqz => resolve_pqz(raw),
        ClassificationGroup::X => 'X',
        ClassificationGroup::Jy => {
            if raw.distance(INDEX_TIP, THUMB_TIP) > thresholds.jy_thumb_index_distance {
                'Y'
            } else {
                'J'
            }
        }
    }
}

/// A E M N S T, told apart by where the thumb tip sits against the folded
/// fingers. With any finger raised only A or S remain.
fn resolve_fist(l: &LandmarkSet) -> char {
    let thumb = l[THUMB_TIP];
    let left_of_every_mid_joint = Finger::ALL
        .iter()
        .all(|f| thumb.x < l[f.mid_joint()].x);

    if Finger::ALL.iter().any(|f| l.is_raised(*f)) {
        return if left_of_every_mid_joint { 'A' } else { 'S' };
    }

    let (index, middle, ring, pinky) = (l[INDEX_PIP], l[MIDDLE_PIP], l[RING_PIP], l[PINKY_PIP]);

    if thumb.x > index.x && thumb.x > middle.x && thumb.y < ring.y && thumb.y < pinky.y {
        'N'
    } else if thumb.x > index.x && thumb.x > middle.x && thumb.x > ring.x && thumb.y < pinky.y {
        'M'
    } else if [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP]
        .iter()
        .all(|tip| thumb.y > l[*tip].y)
    {
        'E'
    } else if thumb.x > index.x
        && thumb.x < middle.x
        && thumb.x < ring.x
        && thumb.x < pinky.x
        && thumb.y < ring.y
        && thumb.y < pinky.y
    {
        'T'
    } else if left_of_every_mid_joint {
        'A'
    } else {
        'S'
    }
}

/// B D F I K R U V W, by which fingers are raised; the two-finger shapes are
/// split further by crossing, spread and thumb height.
fn resolve_raised(l: &LandmarkSet, t: &DisambiguationThresholds) -> char {
    let up = Finger::ALL.map(|f| l.is_raised(f));
    let down = Finger::ALL.map(|f| l.is_curled(f));
    let shape = |want: [bool; 4]| {
        (0..4).all(|i| if want[i] { up[i] } else { down[i] })
    };

    let thumb = l[THUMB_TIP];
    let spread_gain = l.distance(INDEX_TIP, MIDDLE_TIP) - l.distance(INDEX_PIP, MIDDLE_PIP);
    let two_up = shape([true, true, false, false]);

    if two_up && l[INDEX_TIP].x > l[MIDDLE_TIP].x {
        'R'
    } else if two_up && spread_gain >= t.uv_spread_delta && thumb.y > l[MIDDLE_MCP].y {
        'V'
    } else if two_up && spread_gain < t.uv_spread_delta {
        'U'
    } else if two_up && thumb.y < l[MIDDLE_MCP].y {
        'K'
    } else if shape([true, true, true, false]) {
        'W'
    } else if shape([false, false, false, true]) {
        'I'
    } else if shape([false, true, true, true]) {
        'F'
    } else if shape([true, false, false, false]) {
        'D'
    } else {
        'B'
    }
}

/// P Q Z: thumb out past the outer fingertips means Q or Z, and Z points the
/// index upward.
fn resolve_pqz(l: &LandmarkSet) -> char {
    let thumb = l[THUMB_TIP];
    let thumb_out = [MIDDLE_TIP, RING_TIP, PINKY_TIP]
        .iter()
        .all(|tip| thumb.x > l[*tip].x);
    if !thumb_out {
        'P'
    } else if l[INDEX_TIP].y < l[INDEX_MCP].y {
        'Z'
    } else {
        'Q'
    }
}
