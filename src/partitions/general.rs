//! The general partition implementation: a filter plus one or more labelers.
//!
//! Members are classified into buckets keyed by their realized per-dimension
//! label-index tuple. Label values are discovered at runtime: each dimension
//! owns an append-only label table assigning the next free small index to each
//! newly-seen value. Indices are never reassigned, so stored bucket addresses
//! stay valid as dimensions grow. Aggregate queries enumerate the Cartesian
//! product of the unconstrained dimensions with a [`Tuplator`], fixing the
//! constrained digits.

use std::any::{Any, TypeId};
use std::rc::Rc;

use log::trace;

use crate::error::SimdexError;
use crate::events::FilterSensitivity;
use crate::filters::Filter;
use crate::hashing::{HashMap, HashSet};
use crate::label_set::{Label, LabelSet};
use crate::labeler::{DimensionId, Labeler};
use crate::partitions::Partition;
use crate::people::PersonId;
use crate::sampling::{check_weight, WeightedCandidates};
use crate::tuplator::Tuplator;

/// A bucket address: one label index per dimension, in labeler order.
type Cell = Rc<[usize]>;

/// One dimension's append-only label interning table.
#[derive(Default)]
struct DimensionTable {
    labels: Vec<Label>,
    index_of: HashMap<Label, usize>,
}

impl DimensionTable {
    /// The index for `label`, assigning the next free one on first sight.
    fn intern(&mut self, label: Label) -> usize {
        if let Some(index) = self.index_of.get(&label) {
            return *index;
        }
        let index = self.labels.len();
        self.labels.push(label.clone());
        self.index_of.insert(label, index);
        index
    }

    fn index_of(&self, label: &Label) -> Option<usize> {
        self.index_of.get(label).copied()
    }

    fn label(&self, index: usize) -> &Label {
        &self.labels[index]
    }

    fn cardinality(&self) -> usize {
        self.labels.len()
    }
}

enum Bucket {
    Members(HashSet<PersonId>),
    Count(usize),
}

impl Bucket {
    fn new(retain_person_keys: bool) -> Self {
        if retain_person_keys {
            Bucket::Members(HashSet::default())
        } else {
            Bucket::Count(0)
        }
    }

    fn insert(&mut self, person_id: PersonId) {
        match self {
            Bucket::Members(members) => {
                members.insert(person_id);
            }
            Bucket::Count(count) => *count += 1,
        }
    }

    fn remove(&mut self, person_id: PersonId) {
        match self {
            Bucket::Members(members) => {
                members.remove(&person_id);
            }
            Bucket::Count(count) => *count = count.saturating_sub(1),
        }
    }

    fn len(&self) -> usize {
        match self {
            Bucket::Members(members) => members.len(),
            Bucket::Count(count) => *count,
        }
    }
}

pub(crate) struct GeneralPartition<C> {
    filter: Option<Rc<dyn Filter<C>>>,
    labelers: Vec<Rc<dyn Labeler<C>>>,
    retain_person_keys: bool,
    dimensions: Vec<DimensionTable>,
    dimension_index: HashMap<DimensionId, usize>,
    buckets: HashMap<Cell, Bucket>,
    person_cells: HashMap<PersonId, Cell>,
    filter_sensitivities: HashMap<TypeId, Vec<FilterSensitivity<C>>>,
    labeler_sensitivities: HashMap<TypeId, Vec<(usize, FilterSensitivity<C>)>>,
}

impl<C> GeneralPartition<C> {
    pub(crate) fn new(partition: Partition<C>) -> Result<Self, SimdexError> {
        if partition.is_degenerate() {
            return Err(SimdexError::PartitionMisuse(
                "general partition implementation given a declaration without labelers".to_string(),
            ));
        }

        let mut filter_sensitivities: HashMap<TypeId, Vec<FilterSensitivity<C>>> =
            HashMap::default();
        if let Some(filter) = &partition.filter {
            for sensitivity in filter.filter_sensitivities() {
                filter_sensitivities
                    .entry(sensitivity.event_type())
                    .or_default()
                    .push(sensitivity);
            }
        }

        let mut dimension_index = HashMap::default();
        let mut labeler_sensitivities: HashMap<TypeId, Vec<(usize, FilterSensitivity<C>)>> =
            HashMap::default();
        for (index, labeler) in partition.labelers.iter().enumerate() {
            dimension_index.insert(labeler.dimension(), index);
            for sensitivity in labeler.labeler_sensitivities() {
                labeler_sensitivities
                    .entry(sensitivity.event_type())
                    .or_default()
                    .push((index, sensitivity));
            }
        }

        let dimensions = partition
            .labelers
            .iter()
            .map(|_| DimensionTable::default())
            .collect();

        Ok(Self {
            filter: partition.filter,
            labelers: partition.labelers,
            retain_person_keys: partition.retain_person_keys,
            dimensions,
            dimension_index,
            buckets: HashMap::default(),
            person_cells: HashMap::default(),
            filter_sensitivities,
            labeler_sensitivities,
        })
    }

    fn passes(&self, context: &C, person_id: PersonId) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| filter.evaluate(context, person_id))
    }

    /// Labels the person on every dimension, interning newly-seen values.
    fn compute_cell(&mut self, context: &C, person_id: PersonId) -> Cell {
        let mut digits = Vec::with_capacity(self.labelers.len());
        for (index, labeler) in self.labelers.iter().enumerate() {
            let label = labeler.get_label(context, person_id);
            digits.push(self.dimensions[index].intern(label));
        }
        Rc::from(digits)
    }

    fn insert_into_bucket(&mut self, cell: Cell, person_id: PersonId) {
        self.buckets
            .entry(cell)
            .or_insert_with(|| Bucket::new(self.retain_person_keys))
            .insert(person_id);
    }

    fn remove_from_bucket(&mut self, cell: &Cell, person_id: PersonId) {
        if let Some(bucket) = self.buckets.get_mut(cell) {
            bucket.remove(person_id);
            if bucket.len() == 0 {
                self.buckets.remove(cell);
            }
        }
    }

    pub(crate) fn handle_person_addition(&mut self, context: &C, person_id: PersonId) {
        if self.person_cells.contains_key(&person_id) || !self.passes(context, person_id) {
            return;
        }
        let cell = self.compute_cell(context, person_id);
        trace!("partition insert {person_id:?} into cell {cell:?}");
        self.insert_into_bucket(Rc::clone(&cell), person_id);
        self.person_cells.insert(person_id, cell);
    }

    pub(crate) fn handle_person_removal(&mut self, person_id: PersonId) {
        if let Some(cell) = self.person_cells.remove(&person_id) {
            self.remove_from_bucket(&cell, person_id);
        }
    }

    /// Routes an event through the declared sensitivities: a filter hit
    /// triggers a full membership-and-labels refresh for the affected person;
    /// a labeler hit recomputes only that dimension and moves the person
    /// between buckets.
    pub(crate) fn handle_event(&mut self, context: &C, event: &dyn Any) {
        let event_type = Any::type_id(event);

        let mut refreshed: Vec<PersonId> = Vec::new();
        if let Some(list) = self.filter_sensitivities.get(&event_type) {
            for person_id in list
                .iter()
                .filter_map(|sensitivity| sensitivity.affected_person(context, event))
                .collect::<Vec<_>>()
            {
                if !refreshed.contains(&person_id) {
                    refreshed.push(person_id);
                }
            }
        }

        let mut relabels: Vec<(usize, PersonId)> = Vec::new();
        if let Some(list) = self.labeler_sensitivities.get(&event_type) {
            for (labeler_index, sensitivity) in list {
                if let Some(person_id) = sensitivity.affected_person(context, event) {
                    // A full refresh recomputes every dimension already.
                    if !refreshed.contains(&person_id) {
                        relabels.push((*labeler_index, person_id));
                    }
                }
            }
        }

        for person_id in refreshed {
            self.refresh_person(context, person_id);
        }
        for (labeler_index, person_id) in relabels {
            self.relabel_person(context, person_id, labeler_index);
        }
    }

    /// Re-evaluates filter membership and, for continuing members, the full
    /// label tuple.
    fn refresh_person(&mut self, context: &C, person_id: PersonId) {
        let is_member = self.person_cells.contains_key(&person_id);
        let should_be_member = self.passes(context, person_id);
        match (is_member, should_be_member) {
            (false, true) => self.handle_person_addition(context, person_id),
            (true, false) => self.handle_person_removal(person_id),
            (true, true) => {
                let cell = self.compute_cell(context, person_id);
                self.move_person(person_id, cell);
            }
            (false, false) => {}
        }
    }

    /// Recomputes one dimension's label for a current member.
    fn relabel_person(&mut self, context: &C, person_id: PersonId, labeler_index: usize) {
        let Some(cell) = self.person_cells.get(&person_id).cloned() else {
            return;
        };
        let label = self.labelers[labeler_index].get_label(context, person_id);
        let digit = self.dimensions[labeler_index].intern(label);
        if cell[labeler_index] == digit {
            return;
        }
        let mut digits = cell.to_vec();
        digits[labeler_index] = digit;
        self.move_person(person_id, Rc::from(digits));
    }

    fn move_person(&mut self, person_id: PersonId, new_cell: Cell) {
        let old_cell = match self.person_cells.get(&person_id) {
            Some(cell) if *cell == new_cell => return,
            Some(cell) => Rc::clone(cell),
            None => return,
        };
        trace!("partition move {person_id:?} from {old_cell:?} to {new_cell:?}");
        self.remove_from_bucket(&old_cell, person_id);
        self.insert_into_bucket(Rc::clone(&new_cell), person_id);
        self.person_cells.insert(person_id, new_cell);
    }

    pub(crate) fn sensitive_event_types(&self) -> Vec<TypeId> {
        let mut event_types: Vec<TypeId> = self.filter_sensitivities.keys().copied().collect();
        for event_type in self.labeler_sensitivities.keys() {
            if !event_types.contains(event_type) {
                event_types.push(*event_type);
            }
        }
        event_types
    }

    pub(crate) fn contains(&self, person_id: PersonId) -> bool {
        self.person_cells.contains_key(&person_id)
    }

    /// True iff the person is a member and their realized labels agree with
    /// every dimension the label set names.
    pub(crate) fn contains_with(
        &self,
        person_id: PersonId,
        label_set: &LabelSet,
    ) -> Result<bool, SimdexError> {
        let Some(constraints) = self.resolve_constraints(label_set)? else {
            return Ok(false);
        };
        Ok(self
            .person_cells
            .get(&person_id)
            .is_some_and(|cell| cell_matches(cell, &constraints)))
    }

    pub(crate) fn get_people_count(&self) -> usize {
        self.person_cells.len()
    }

    pub(crate) fn get_people(&self) -> Vec<PersonId> {
        self.person_cells.keys().copied().collect()
    }

    pub(crate) fn get_people_count_for(&self, label_set: &LabelSet) -> Result<usize, SimdexError> {
        let Some(constraints) = self.resolve_constraints(label_set)? else {
            return Ok(0);
        };
        Ok(self
            .matching_cells(&constraints)
            .iter()
            .filter_map(|cell| self.buckets.get(cell))
            .map(Bucket::len)
            .sum())
    }

    pub(crate) fn get_people_for(
        &self,
        label_set: &LabelSet,
    ) -> Result<Vec<PersonId>, SimdexError> {
        let Some(constraints) = self.resolve_constraints(label_set)? else {
            return Ok(Vec::new());
        };
        if self.retain_person_keys {
            let mut people = Vec::new();
            for cell in self.matching_cells(&constraints) {
                if let Some(Bucket::Members(members)) = self.buckets.get(&cell) {
                    people.extend(members.iter().copied());
                }
            }
            Ok(people)
        } else {
            // Count-only buckets: fall back to the person->cell map.
            Ok(self
                .person_cells
                .iter()
                .filter(|(_, cell)| cell_matches(cell, &constraints))
                .map(|(person_id, _)| *person_id)
                .collect())
        }
    }

    /// Group-by over the unconstrained dimensions: one entry per realized
    /// bucket consistent with the query, keyed by that bucket's full label set.
    pub(crate) fn get_people_count_map(
        &self,
        label_set: &LabelSet,
    ) -> Result<HashMap<LabelSet, usize>, SimdexError> {
        let mut counts = HashMap::default();
        let Some(constraints) = self.resolve_constraints(label_set)? else {
            return Ok(counts);
        };
        for cell in self.matching_cells(&constraints) {
            if let Some(bucket) = self.buckets.get(&cell) {
                counts.insert(self.realized_label_set(&cell), bucket.len());
            }
        }
        Ok(counts)
    }

    pub(crate) fn validate_label_set(&self, label_set: &LabelSet) -> Result<(), SimdexError> {
        for dimension in label_set.dimensions() {
            if !self.dimension_index.contains_key(&dimension) {
                return Err(SimdexError::unknown_dimension(dimension));
            }
        }
        Ok(())
    }

    /// Adapts the matching buckets into the shared sampling shape. The
    /// weighting function is evaluated once per bucket, not once per person.
    pub(crate) fn collect_sources(
        &self,
        context: &C,
        label_set: Option<&LabelSet>,
        weighting: Option<&dyn Fn(&C, &LabelSet) -> f64>,
    ) -> Result<Vec<(f64, WeightedCandidates)>, SimdexError> {
        let constraints = match label_set {
            Some(label_set) => match self.resolve_constraints(label_set)? {
                Some(constraints) => constraints,
                None => return Ok(Vec::new()),
            },
            None => Vec::new(),
        };

        let cells = self.matching_cells(&constraints);
        let mut sources = Vec::with_capacity(cells.len());
        if self.retain_person_keys {
            for cell in &cells {
                let Some(Bucket::Members(members)) = self.buckets.get(cell) else {
                    continue;
                };
                let weight = self.bucket_weight(context, cell, weighting)?;
                sources.push((weight, WeightedCandidates::Set(members)));
            }
        } else {
            let mut grouped: HashMap<Cell, (f64, Vec<PersonId>)> = HashMap::default();
            for cell in &cells {
                let weight = self.bucket_weight(context, cell, weighting)?;
                grouped.insert(Rc::clone(cell), (weight, Vec::new()));
            }
            for (person_id, cell) in &self.person_cells {
                if let Some((_, members)) = grouped.get_mut(cell) {
                    members.push(*person_id);
                }
            }
            sources.extend(
                grouped
                    .into_values()
                    .map(|(weight, members)| (weight, WeightedCandidates::List(members))),
            );
        }
        Ok(sources)
    }

    fn bucket_weight(
        &self,
        context: &C,
        cell: &Cell,
        weighting: Option<&dyn Fn(&C, &LabelSet) -> f64>,
    ) -> Result<f64, SimdexError> {
        match weighting {
            Some(weighting) => check_weight(weighting(context, &self.realized_label_set(cell))),
            None => Ok(1.0),
        }
    }

    /// Maps each constrained dimension to (dimension index, label index).
    /// `Ok(None)` means the query names a label value no member has realized,
    /// so nothing can match.
    fn resolve_constraints(
        &self,
        label_set: &LabelSet,
    ) -> Result<Option<Vec<(usize, usize)>>, SimdexError> {
        let mut constraints = Vec::with_capacity(label_set.len());
        for (dimension, label) in label_set.iter() {
            let index = *self
                .dimension_index
                .get(&dimension)
                .ok_or_else(|| SimdexError::unknown_dimension(dimension))?;
            match self.dimensions[index].index_of(label) {
                Some(label_index) => constraints.push((index, label_index)),
                None => return Ok(None),
            }
        }
        Ok(Some(constraints))
    }

    /// Enumerates every realized bucket address consistent with the
    /// constraints, walking the Cartesian product of the unconstrained
    /// dimensions with a [`Tuplator`].
    fn matching_cells(&self, constraints: &[(usize, usize)]) -> Vec<Cell> {
        let dimension_count = self.labelers.len();
        let mut fixed: Vec<Option<usize>> = vec![None; dimension_count];
        for (dimension, label_index) in constraints {
            fixed[*dimension] = Some(*label_index);
        }
        let free: Vec<usize> = (0..dimension_count)
            .filter(|dimension| fixed[*dimension].is_none())
            .collect();
        if free
            .iter()
            .any(|dimension| self.dimensions[*dimension].cardinality() == 0)
        {
            // A dimension nobody has been labeled on yet has no realized buckets.
            return Vec::new();
        }

        let mut builder = Tuplator::builder();
        for dimension in &free {
            builder = builder.add_dimension(self.dimensions[*dimension].cardinality());
        }
        let tuplator = builder.build();

        let mut cells = Vec::new();
        let mut free_digits = vec![0; free.len()];
        let mut cell = vec![0; dimension_count];
        for (dimension, label_index) in fixed.iter().enumerate() {
            if let Some(label_index) = label_index {
                cell[dimension] = *label_index;
            }
        }
        for flat_index in 0..tuplator.size() {
            tuplator.fill_tuple(flat_index, &mut free_digits);
            for (position, dimension) in free.iter().enumerate() {
                cell[*dimension] = free_digits[position];
            }
            if let Some((key, _)) = self.buckets.get_key_value(cell.as_slice()) {
                cells.push(Rc::clone(key));
            }
        }
        cells
    }

    /// The fully realized label set of one bucket.
    fn realized_label_set(&self, cell: &Cell) -> LabelSet {
        let mut label_set = LabelSet::new();
        for (index, labeler) in self.labelers.iter().enumerate() {
            label_set = label_set.with_label(
                labeler.dimension(),
                self.dimensions[index].label(cell[index]).clone(),
            );
        }
        label_set
    }
}

fn cell_matches(cell: &Cell, constraints: &[(usize, usize)]) -> bool {
    constraints
        .iter()
        .all(|(dimension, label_index)| cell[*dimension] == *label_index)
}
