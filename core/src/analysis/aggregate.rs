use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{Enumeration, Tag};
use crate::*;

/// How many facts to pull out of an enumeration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extraction {
    /// Every guaranteed fact.
    All,
    /// The first guaranteed safe cell, otherwise the first guaranteed mine.
    FirstFact,
}

/// A frontier cell together with how often it was a mine in one pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskEstimate {
    pub coords: Coord2,
    /// Assignments with a mine at `coords`.
    pub bombs: usize,
    /// Assignments in the pass.
    pub out_of: usize,
}

impl RiskEstimate {
    pub fn probability(&self) -> f64 {
        if self.out_of == 0 {
            return 1.0;
        }
        self.bombs as f64 / self.out_of as f64
    }

    /// Compares estimates from passes of different sizes as fractions.
    pub fn cmp_risk(&self, other: &Self) -> Ordering {
        let lhs = self.bombs as u128 * other.out_of as u128;
        let rhs = other.bombs as u128 * self.out_of as u128;
        lhs.cmp(&rhs)
    }

    pub fn is_lower_than(&self, other: &Self) -> bool {
        self.cmp_risk(other) == Ordering::Less
    }
}

/// Facts derived from one enumeration pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Facts {
    pub safe: Vec<Coord2>,
    pub mines: Vec<Coord2>,
    /// Least often mined cell among those that are not facts.
    pub lowest_risk: Option<RiskEstimate>,
}

impl Facts {
    pub fn is_empty(&self) -> bool {
        self.safe.is_empty() && self.mines.is_empty()
    }
}

/// Reduces the assignments of a pass to guaranteed facts and the lowest-risk
/// candidate. Facts are only drawn from complete passes.
pub fn aggregate(enumeration: &Enumeration, extraction: Extraction) -> Facts {
    let assignments = &enumeration.assignments;
    let mut facts = Facts::default();

    let Some((first, rest)) = assignments.split_first() else {
        return facts;
    };
    let out_of = assignments.len();

    for (index, &coords) in enumeration.cells.iter().enumerate() {
        let tag = first[index];
        let mut bombs = usize::from(tag == Tag::Bomb);
        let mut mixed = false;
        let mut cut_short = false;

        for (seen, assignment) in rest.iter().enumerate() {
            if assignment[index] == Tag::Bomb {
                bombs += 1;
            }
            mixed |= assignment[index] != tag;

            // A mixed cell only matters if it could still be the lowest risk.
            let beaten = facts
                .lowest_risk
                .is_some_and(|lowest| bombs > lowest.bombs);
            if mixed && (beaten || !facts.safe.is_empty()) && seen + 1 < rest.len() {
                cut_short = true;
                break;
            }
        }

        if !mixed && enumeration.complete {
            match tag {
                Tag::Safe => {
                    facts.safe.push(coords);
                    if extraction == Extraction::FirstFact {
                        facts.mines.clear();
                        break;
                    }
                }
                Tag::Bomb => facts.mines.push(coords),
            }
            continue;
        }

        if cut_short {
            continue;
        }

        let candidate = RiskEstimate {
            coords,
            bombs,
            out_of,
        };
        if facts
            .lowest_risk
            .is_none_or(|lowest| candidate.is_lower_than(&lowest))
        {
            facts.lowest_risk = Some(candidate);
        }
    }

    if extraction == Extraction::FirstFact {
        facts.mines.truncate(1);
    }

    debug!(
        "Aggregated {out_of} assignments: {} safe, {} mines, lowest risk {:?}",
        facts.safe.len(),
        facts.mines.len(),
        facts.lowest_risk
    );
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::EnumerationMode;
    use Tag::*;

    fn enumeration(cells: &[Coord2], assignments: &[&[Tag]]) -> Enumeration {
        Enumeration {
            mode: EnumerationMode::Full,
            cells: cells.to_vec(),
            assignments: assignments.iter().map(|a| a.to_vec()).collect(),
            complete: true,
            nodes: 0,
        }
    }

    const A: Coord2 = (1, 0);
    const B: Coord2 = (1, 1);
    const C: Coord2 = (1, 2);

    #[test]
    fn no_assignments_give_no_facts() {
        let facts = aggregate(&enumeration(&[A, B], &[]), Extraction::All);

        assert_eq!(facts, Facts::default());
    }

    #[test]
    fn single_assignment_is_all_facts() {
        let facts = aggregate(&enumeration(&[A, B, C], &[&[Bomb, Safe, Bomb]]), Extraction::All);

        assert_eq!(facts.safe, vec![B]);
        assert_eq!(facts.mines, vec![A, C]);
        assert_eq!(facts.lowest_risk, None);
    }

    #[test]
    fn agreeing_cell_is_safe_and_disagreeing_cells_carry_risk() {
        let out = enumeration(&[A, B, C], &[&[Safe, Bomb, Safe], &[Safe, Safe, Bomb]]);

        let facts = aggregate(&out, Extraction::All);

        assert_eq!(facts.safe, vec![A]);
        assert!(facts.mines.is_empty());
        assert_eq!(
            facts.lowest_risk,
            Some(RiskEstimate {
                coords: B,
                bombs: 1,
                out_of: 2
            })
        );
    }

    #[test]
    fn scanning_stops_early_once_a_safe_cell_is_known() {
        let out = enumeration(
            &[A, B],
            &[&[Safe, Bomb], &[Safe, Safe], &[Safe, Bomb], &[Safe, Bomb]],
        );

        let facts = aggregate(&out, Extraction::All);

        assert_eq!(facts.safe, vec![A]);
        assert_eq!(facts.lowest_risk, None);
    }

    #[test]
    fn lowest_risk_cell_is_tracked_without_facts() {
        let out = enumeration(
            &[A, B, C],
            &[&[Bomb, Bomb, Safe], &[Safe, Bomb, Bomb], &[Bomb, Safe, Safe]],
        );

        let facts = aggregate(&out, Extraction::All);

        assert!(facts.is_empty());
        assert_eq!(
            facts.lowest_risk,
            Some(RiskEstimate {
                coords: C,
                bombs: 1,
                out_of: 3
            })
        );
    }

    #[test]
    fn ties_keep_the_first_cell() {
        let out = enumeration(&[A, B], &[&[Bomb, Safe], &[Safe, Bomb]]);

        let facts = aggregate(&out, Extraction::All);

        assert_eq!(facts.lowest_risk.map(|risk| risk.coords), Some(A));
    }

    #[test]
    fn first_fact_stops_at_first_safe_cell() {
        let out = enumeration(&[A, B, C], &[&[Bomb, Safe, Safe], &[Bomb, Safe, Safe]]);

        let facts = aggregate(&out, Extraction::FirstFact);

        assert_eq!(facts.safe, vec![B]);
        assert!(facts.mines.is_empty());
    }

    #[test]
    fn first_fact_falls_back_to_one_mine() {
        let out = enumeration(&[A, B, C], &[&[Bomb, Bomb, Safe], &[Bomb, Bomb, Bomb]]);

        let facts = aggregate(&out, Extraction::FirstFact);

        assert!(facts.safe.is_empty());
        assert_eq!(facts.mines, vec![A]);
    }

    #[test]
    fn incomplete_pass_yields_only_risk() {
        let mut out = enumeration(&[A, B], &[&[Safe, Bomb], &[Safe, Bomb]]);
        out.complete = false;

        let facts = aggregate(&out, Extraction::All);

        assert!(facts.is_empty());
        assert_eq!(facts.lowest_risk.map(|risk| (risk.coords, risk.bombs)), Some((A, 0)));
    }

    #[test]
    fn risk_comparison_survives_large_passes() {
        let limit = 1_000_000;
        let lower = RiskEstimate {
            coords: A,
            bombs: limit - 1,
            out_of: limit,
        };
        let higher = RiskEstimate {
            coords: B,
            bombs: limit,
            out_of: limit,
        };

        assert!(lower.is_lower_than(&higher));
        assert!(!higher.is_lower_than(&lower));
        assert_eq!(higher.cmp_risk(&higher), Ordering::Equal);
    }

    #[test]
    fn risks_compare_as_fractions() {
        let low = RiskEstimate {
            coords: A,
            bombs: 1,
            out_of: 4,
        };
        let high = RiskEstimate {
            coords: B,
            bombs: 1,
            out_of: 3,
        };

        assert!(low.is_lower_than(&high));
        assert!(!high.is_lower_than(&low));
        assert!((low.probability() - 0.25).abs() < f64::EPSILON);
    }
}
