//! The weighted-draw-with-exclusion algorithm shared by partition sampling and
//! group sampling. Both call sites adapt their own data shape into a sequence
//! of (weight, candidate collection) pairs; every candidate inherits its
//! collection's weight, and the whole selection consumes exactly one uniform
//! draw from the caller's random stream.

use rand::Rng;

use crate::error::SimdexError;
use crate::hashing::HashSet;
use crate::people::PersonId;

/// One weighted candidate collection: either a borrowed member set (a partition
/// bucket, or the degenerate partition's single set) or an owned member list
/// (a group's membership, or people regrouped from a count-only partition).
pub enum WeightedCandidates<'a> {
    Set(&'a HashSet<PersonId>),
    List(Vec<PersonId>),
}

impl WeightedCandidates<'_> {
    fn len(&self) -> usize {
        match self {
            WeightedCandidates::Set(members) => members.len(),
            WeightedCandidates::List(members) => members.len(),
        }
    }

    fn contains(&self, person_id: PersonId) -> bool {
        match self {
            WeightedCandidates::Set(members) => members.contains(&person_id),
            WeightedCandidates::List(members) => members.contains(&person_id),
        }
    }

    fn iter(&self) -> Box<dyn Iterator<Item = PersonId> + '_> {
        match self {
            WeightedCandidates::Set(members) => Box::new(members.iter().copied()),
            WeightedCandidates::List(members) => Box::new(members.iter().copied()),
        }
    }
}

/// Rejects the weights a weighting function must not produce.
pub(crate) fn check_weight(weight: f64) -> Result<f64, SimdexError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(SimdexError::SimdexError(format!(
            "weighting function produced an invalid weight: {weight}"
        )));
    }
    Ok(weight)
}

/// Draws one person proportionally to per-person weight, where each person's
/// weight is their collection's weight. A zero-weight collection contributes no
/// candidates; the excluded person is removed after weight assignment. An empty
/// eligible set yields `None` — "no selection" is a normal result, not a fault.
///
/// The single uniform draw in `[0, total)` selects both the collection and the
/// member index within it, so reproducibility only depends on one stream value
/// per successful call.
pub fn sample_weighted<R: Rng + ?Sized>(
    rng: &mut R,
    sources: &[(f64, WeightedCandidates)],
    excluded: Option<PersonId>,
) -> Option<PersonId> {
    let mut eligible_counts = Vec::with_capacity(sources.len());
    let mut total_weight = 0.0_f64;
    for (weight, candidates) in sources {
        let mut count = candidates.len();
        if *weight <= 0.0 {
            count = 0;
        } else if let Some(excluded) = excluded {
            if candidates.contains(excluded) {
                count -= 1;
            }
        }
        eligible_counts.push(count);
        total_weight += weight * count as f64;
    }
    if total_weight <= 0.0 {
        return None;
    }

    let mut remaining = rng.random_range(0.0..total_weight);
    let mut fallback = None;
    for ((weight, candidates), count) in sources.iter().zip(eligible_counts) {
        if count == 0 {
            continue;
        }
        let mass = weight * count as f64;
        if remaining < mass {
            let index = ((remaining / weight) as usize).min(count - 1);
            return nth_eligible(candidates, excluded, index);
        }
        remaining -= mass;
        fallback = Some((candidates, count));
    }

    // Floating-point slop consumed the draw without landing in a collection;
    // the last nonempty collection takes it.
    let (candidates, count) = fallback?;
    nth_eligible(candidates, excluded, count - 1)
}

fn nth_eligible(
    candidates: &WeightedCandidates,
    excluded: Option<PersonId>,
    index: usize,
) -> Option<PersonId> {
    candidates
        .iter()
        .filter(|person_id| Some(*person_id) != excluded)
        .nth(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashMap;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn list(ids: &[usize]) -> WeightedCandidates<'static> {
        WeightedCandidates::List(ids.iter().map(|id| PersonId(*id)).collect())
    }

    #[test]
    fn empty_sources_yield_no_selection() {
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(sample_weighted(&mut rng, &[], None), None);
        assert_eq!(sample_weighted(&mut rng, &[(1.0, list(&[]))], None), None);
    }

    #[test]
    fn zero_total_weight_yields_no_selection() {
        let mut rng = StdRng::seed_from_u64(42);
        let sources = [(0.0, list(&[1, 2, 3]))];
        assert_eq!(sample_weighted(&mut rng, &sources, None), None);
    }

    #[test]
    fn excluding_the_only_candidate_yields_no_selection() {
        let mut rng = StdRng::seed_from_u64(42);
        let sources = [(1.0, list(&[5]))];
        assert_eq!(
            sample_weighted(&mut rng, &sources, Some(PersonId(5))),
            None
        );
    }

    #[test]
    fn never_returns_an_ineligible_person() {
        let mut rng = StdRng::seed_from_u64(42);
        let sources = [
            (1.0, list(&[0, 1])),
            (0.0, list(&[2, 3])),
            (2.0, list(&[4, 5])),
        ];
        for _ in 0..500 {
            let selected = sample_weighted(&mut rng, &sources, Some(PersonId(4))).unwrap();
            assert!(matches!(selected.0, 0 | 1 | 5), "selected {selected:?}");
        }
    }

    #[test]
    fn exhausts_the_eligible_set() {
        let mut rng = StdRng::seed_from_u64(42);
        let sources = [(1.0, list(&[0, 1, 2])), (3.0, list(&[3, 4]))];
        let mut seen = crate::HashSet::default();
        for _ in 0..1000 {
            seen.insert(sample_weighted(&mut rng, &sources, None).unwrap());
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn draws_proportionally_to_collection_weight() {
        let mut rng = StdRng::seed_from_u64(42);
        // One person of weight 1 against one person of weight 3: expect 1:3.
        let sources = [(1.0, list(&[0])), (3.0, list(&[1]))];
        let trials = 40_000;
        let mut counts: HashMap<PersonId, usize> = HashMap::default();
        for _ in 0..trials {
            let selected = sample_weighted(&mut rng, &sources, None).unwrap();
            *counts.entry(selected).or_insert(0) += 1;
        }
        let share = counts[&PersonId(1)] as f64 / trials as f64;
        assert_approx_eq::assert_approx_eq!(share, 0.75, 0.02);
    }

    #[test]
    fn unit_weights_degenerate_to_uniform() {
        let mut rng = StdRng::seed_from_u64(42);
        let sources = [(1.0, list(&[0, 1])), (1.0, list(&[2]))];
        let trials = 30_000;
        let mut counts: HashMap<PersonId, usize> = HashMap::default();
        for _ in 0..trials {
            let selected = sample_weighted(&mut rng, &sources, None).unwrap();
            *counts.entry(selected).or_insert(0) += 1;
        }
        for id in 0..3 {
            let share = counts[&PersonId(id)] as f64 / trials as f64;
            assert_approx_eq::assert_approx_eq!(share, 1.0 / 3.0, 0.02);
        }
    }

    #[test]
    fn check_weight_rejects_negative_and_non_finite() {
        assert!(check_weight(0.0).is_ok());
        assert!(check_weight(2.5).is_ok());
        assert!(check_weight(-1.0).is_err());
        assert!(check_weight(f64::NAN).is_err());
        assert!(check_weight(f64::INFINITY).is_err());
    }
}
