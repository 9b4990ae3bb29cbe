use super::{FeatureError, Matcher};
use crate::types::{DescriptorData, DescriptorFamily, Descriptors, Match, SelectorKind};

/// Lowe's ratio used by the k-nearest selector.
pub const DEFAULT_RATIO: f32 = 0.8;

/// Exhaustive matcher: Hamming distance for binary descriptors, L2 for float descriptors.
#[derive(Debug, Clone)]
pub struct BruteForceMatcher {
    pub selector: SelectorKind,
    pub family: DescriptorFamily,
    pub ratio: f32,
}

impl BruteForceMatcher {
    pub fn new(selector: SelectorKind, family: DescriptorFamily) -> Self {
        BruteForceMatcher {
            selector,
            family,
            ratio: DEFAULT_RATIO,
        }
    }

    /// Best and second best `(train_idx, distance)` for every query row.
    fn two_nearest(
        &self,
        query: &Descriptors,
        train: &Descriptors,
    ) -> Vec<(Option<(usize, f32)>, Option<(usize, f32)>)> {
        let distance = |q: usize, t: usize| -> f32 {
            match (query.data(), train.data()) {
                (DescriptorData::Binary(_), DescriptorData::Binary(_)) => {
                    match (query.binary_row(q), train.binary_row(t)) {
                        (Some(a), Some(b)) => hamming(a, b) as f32,
                        _ => f32::INFINITY,
                    }
                }
                _ => match (query.float_row(q), train.float_row(t)) {
                    (Some(a), Some(b)) => l2(a, b),
                    _ => f32::INFINITY,
                },
            }
        };
        (0..query.rows())
            .map(|q| {
                let mut best: Option<(usize, f32)> = None;
                let mut second: Option<(usize, f32)> = None;
                for t in 0..train.rows() {
                    let d = distance(q, t);
                    if best.is_none_or(|(_, bd)| d < bd) {
                        second = best;
                        best = Some((t, d));
                    } else if second.is_none_or(|(_, sd)| d < sd) {
                        second = Some((t, d));
                    }
                }
                (best, second)
            })
            .collect()
    }
}

pub fn hamming(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

pub fn l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

impl Matcher for BruteForceMatcher {
    fn match_descriptors(
        &self,
        query: &Descriptors,
        train: &Descriptors,
    ) -> Result<Vec<Match>, FeatureError> {
        if query.family() != train.family() || query.family() != self.family {
            return Err(FeatureError::FamilyMismatch {
                query: query.family(),
                train: train.family(),
            });
        }
        if query.width() != train.width() {
            return Err(FeatureError::Internal(format!(
                "descriptor widths differ: {} vs {}",
                query.width(),
                train.width()
            )));
        }
        let candidates = self.two_nearest(query, train);
        let matches = candidates
            .into_iter()
            .enumerate()
            .filter_map(|(query_idx, (best, second))| {
                let (train_idx, distance) = best?;
                let keep = match self.selector {
                    SelectorKind::NearestNeighbor => true,
                    SelectorKind::KNearest => match second {
                        Some((_, sd)) => distance < self.ratio * sd,
                        None => false,
                    },
                };
                keep.then_some(Match {
                    query_idx,
                    train_idx,
                    distance,
                })
            })
            .collect();
        Ok(matches)
    }
}
