//! The eight coarse groups the learned classifier scores.
//!
//! Groups are disjoint and together cover all 26 letters. Group indices are
//! the classifier's output order and must not be renumbered.

use serde::{Deserialize, Serialize};

/// Number of coarse groups produced by the classifier.
pub const GROUP_COUNT: usize = 8;

/// Dense score vector, one entry per [`ClassificationGroup`] in index order.
pub type GroupScores = [f32; GROUP_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationGroup {
    /// A E M N S T: closed fist variants.
    Aemnst = 0,
    /// B D F I K R U V W: raised-finger shapes.
    Bdfikruvw = 1,
    /// C O
    Co = 2,
    /// G H
    Gh = 3,
    /// L
    L = 4,
    /// P Q Z
    Pqz = 5,
    /// X
    X = 6,
    /// J Y
    Jy = 7,
}

impl ClassificationGroup {
    pub const ALL: [ClassificationGroup; GROUP_COUNT] = [
        ClassificationGroup::Aemnst,
        ClassificationGroup::Bdfikruvw,
        ClassificationGroup::Co,
        ClassificationGroup::Gh,
        ClassificationGroup::L,
        ClassificationGroup::Pqz,
        ClassificationGroup::X,
        ClassificationGroup::Jy,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Letters this group can resolve to.
    pub const fn letters(self) -> &'static [char] {
        match self {
            ClassificationGroup::Aemnst => &['A', 'E', 'M', 'N', 'S', 'T'],
            ClassificationGroup::Bdfikruvw => &['B', 'D', 'F', 'I', 'K', 'R', 'U', 'V', 'W'],
            ClassificationGroup::Co => &['C', 'O'],
            ClassificationGroup::Gh => &['G', 'H'],
            ClassificationGroup::L => &['L'],
            ClassificationGroup::Pqz => &['P', 'Q', 'Z'],
            ClassificationGroup::X => &['X'],
            ClassificationGroup::Jy => &['J', 'Y'],
        }
    }

    /// The group a letter belongs to, if it is an uppercase A–Z letter.
    pub fn of_letter(letter: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|group| group.letters().contains(&letter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_partition_the_alphabet() {
        for letter in 'A'..='Z' {
            let owners = ClassificationGroup::ALL
                .iter()
                .filter(|g| g.letters().contains(&letter))
                .count();
            assert_eq!(owners, 1, "letter {letter} owned by {owners} groups");
        }
        let total: usize = ClassificationGroup::ALL.iter().map(|g| g.letters().len()).sum();
        assert_eq!(total, 26);
    }

    #[test]
    fn index_order_matches_classifier_output() {
        for (i, group) in ClassificationGroup::ALL.iter().enumerate() {
            assert_eq!(group.index(), i);
            assert_eq!(ClassificationGroup::from_index(i), Some(*group));
        }
        assert_eq!(ClassificationGroup::from_index(8), None);
        assert_eq!(ClassificationGroup::of_letter('Q'), Some(ClassificationGroup::Pqz));
        assert_eq!(ClassificationGroup::of_letter('q'), None);
    }
}
