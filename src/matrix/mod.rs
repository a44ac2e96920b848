//! Relationship matrices: primary × secondary boolean tables for one
//! relationship name, splittable into bounded pages.

mod builder;

pub use builder::{MatrixBuilder, MatrixRequest};

use std::collections::{BTreeMap, BTreeSet};

use crate::model::Item;

/// Tag-ordered relation between primaries and secondaries.
///
/// Only items taking part in at least one pair appear as rows or columns.
#[derive(Debug, Clone)]
pub struct Matrix<'a> {
    relationship: String,
    opposite: String,
    primaries: Vec<&'a Item>,
    secondaries: Vec<&'a Item>,
    relatives: BTreeMap<&'a str, BTreeSet<&'a str>>,
}

impl<'a> Matrix<'a> {
    pub fn new(relationship: impl Into<String>, opposite: impl Into<String>) -> Self {
        Self {
            relationship: relationship.into(),
            opposite: opposite.into(),
            primaries: Vec::new(),
            secondaries: Vec::new(),
            relatives: BTreeMap::new(),
        }
    }

    /// Relationship read from primaries to secondaries.
    pub fn relationship(&self) -> &str {
        &self.relationship
    }

    /// Relationship read from secondaries back to primaries.
    pub fn opposite(&self) -> &str {
        &self.opposite
    }

    /// Record that `secondary` is related to `primary`.
    pub fn add_pair(&mut self, primary: &'a Item, secondary: &'a Item) {
        insert_sorted(&mut self.primaries, primary);
        insert_sorted(&mut self.secondaries, secondary);
        self.relatives
            .entry(primary.tag.as_str())
            .or_default()
            .insert(secondary.tag.as_str());
    }

    pub fn primaries(&self) -> &[&'a Item] {
        &self.primaries
    }

    pub fn secondaries(&self) -> &[&'a Item] {
        &self.secondaries
    }

    /// Secondaries related to `primary`, in tag order.
    pub fn relatives(&self, primary: &str) -> impl Iterator<Item = &'a str> + '_ {
        self.relatives
            .get(primary)
            .into_iter()
            .flat_map(|tags| tags.iter().copied())
    }

    pub fn is_related(&self, primary: &str, secondary: &str) -> bool {
        self.relatives
            .get(primary)
            .is_some_and(|tags| tags.contains(secondary))
    }

    /// One flag per secondary column, in column order.
    pub fn boolean_row(&self, primary: &str) -> Vec<bool> {
        self.secondaries
            .iter()
            .map(|secondary| self.is_related(primary, &secondary.tag))
            .collect()
    }

    /// Every related `(primary, secondary)` pair.
    pub fn pairs(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.relatives
            .iter()
            .flat_map(|(primary, secondaries)| secondaries.iter().map(move |s| (*primary, *s)))
    }

    pub fn is_empty(&self) -> bool {
        self.relatives.is_empty()
    }

    /// Partition into sub-matrices of at most `max_secondaries` columns and
    /// `max_primaries` rows (`None` or 0: no limit).
    ///
    /// Sub-matrices come primary range first, then secondary range. Each keeps
    /// exactly the pairs whose row and column fall inside it, so together they
    /// hold the same pairs as `self`.
    pub fn split(&self, max_secondaries: Option<usize>, max_primaries: Option<usize>) -> Vec<Matrix<'a>> {
        let primary_ranges = calculate_ranges(self.primaries.len(), max_primaries);
        let secondary_ranges = calculate_ranges(self.secondaries.len(), max_secondaries);

        let mut submatrices = Vec::with_capacity(primary_ranges.len() * secondary_ranges.len());
        for &(p_start, p_end) in &primary_ranges {
            for &(s_start, s_end) in &secondary_ranges {
                submatrices.push(self.submatrix(p_start..p_end, s_start..s_end));
            }
        }
        submatrices
    }

    fn submatrix(&self, rows: std::ops::Range<usize>, columns: std::ops::Range<usize>) -> Matrix<'a> {
        let primaries = self.primaries[rows].to_vec();
        let secondaries = self.secondaries[columns].to_vec();
        let column_tags: BTreeSet<&str> = secondaries.iter().map(|s| s.tag.as_str()).collect();

        let relatives = primaries
            .iter()
            .filter_map(|&primary| {
                let related: BTreeSet<&'a str> = self
                    .relatives(&primary.tag)
                    .filter(|tag| column_tags.contains(tag))
                    .collect();
                (!related.is_empty()).then(|| (primary.tag.as_str(), related))
            })
            .collect();

        Matrix {
            relationship: self.relationship.clone(),
            opposite: self.opposite.clone(),
            primaries,
            secondaries,
            relatives,
        }
    }
}

fn insert_sorted<'a>(items: &mut Vec<&'a Item>, item: &'a Item) {
    if let Err(pos) = items.binary_search_by(|probe| probe.tag.as_str().cmp(&item.tag)) {
        items.insert(pos, item);
    }
}

/// Contiguous `[start, end)` ranges of at most `size` covering `0..len`.
///
/// ```
/// use traceables::matrix::calculate_ranges;
/// assert_eq!(calculate_ranges(5, Some(2)), vec![(0, 2), (2, 4), (4, 5)]);
/// assert_eq!(calculate_ranges(5, None), vec![(0, 5)]);
/// ```
pub fn calculate_ranges(len: usize, size: Option<usize>) -> Vec<(usize, usize)> {
    match size {
        Some(size) if size > 0 && size < len => (0..len)
            .step_by(size)
            .map(|start| (start, (start + size).min(len)))
            .collect(),
        _ => vec![(0, len)],
    }
}
