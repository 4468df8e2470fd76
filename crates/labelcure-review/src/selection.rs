//! Which record the reviewer sees next.

use std::collections::HashSet;

use labelcure_core::{Category, CurationPolicy, DiscrepancyRecord, Ledger};

/// Ordering key of a candidate inside its category.
///
/// Confident detections are proposed for addition first; large boxes are
/// proposed for removal first.
pub fn priority(record: &DiscrepancyRecord, category: Category) -> f32 {
    match category {
        Category::Add => record.confidence,
        Category::Remove => record.bbox.area(),
    }
}

/// Best untreated record of `category`, optionally restricted to one class.
///
/// Indices in `skipped` are ignored. Ties go to the record that comes first
/// in the ledger.
pub fn select_candidate(
    ledger: &Ledger,
    policy: &CurationPolicy,
    category: Category,
    pinned_class: Option<u32>,
    skipped: &HashSet<usize>,
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, record) in ledger.iter() {
        if skipped.contains(&index)
            || record.category(policy) != Some(category)
            || pinned_class.is_some_and(|class| class != record.class_id)
        {
            continue;
        }
        let key = priority(record, category);
        if best.is_none_or(|(_, top)| key > top) {
            best = Some((index, key));
        }
    }
    best.map(|(index, _)| index)
}

/// Untreated records of `category` that have not been skipped.
pub fn remaining(
    ledger: &Ledger,
    policy: &CurationPolicy,
    category: Category,
    skipped: &HashSet<usize>,
) -> usize {
    ledger
        .iter()
        .filter(|(index, r)| !skipped.contains(index) && r.category(policy) == Some(category))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelcure_core::BoundingBox;

    fn add(class_id: u32, confidence: f32) -> DiscrepancyRecord {
        DiscrepancyRecord::new(class_id, BoundingBox::new(0.1, 0.1, 0.1, 0.1), confidence, 0.0, "a")
    }

    fn remove(class_id: u32, side: f32) -> DiscrepancyRecord {
        DiscrepancyRecord::new(class_id, BoundingBox::new(0.0, 0.0, side, side), -1.0, 0.0, "b")
    }

    fn ledger() -> Ledger {
        Ledger::from_records(vec![
            add(0, 0.6),
            remove(0, 0.2),
            add(1, 0.9),
            remove(1, 0.5),
            add(0, 0.9),
            remove(0, 0.5),
        ])
    }

    #[test]
    fn add_prefers_confidence_and_first_on_ties() {
        let policy = CurationPolicy::default();
        let none = HashSet::new();
        assert_eq!(
            select_candidate(&ledger(), &policy, Category::Add, None, &none),
            Some(2)
        );
    }

    #[test]
    fn remove_prefers_area() {
        let policy = CurationPolicy::default();
        let none = HashSet::new();
        assert_eq!(
            select_candidate(&ledger(), &policy, Category::Remove, None, &none),
            Some(3)
        );
        assert_eq!(
            select_candidate(&ledger(), &policy, Category::Remove, Some(0), &none),
            Some(5)
        );
    }

    #[test]
    fn treated_skipped_and_deleted_records_are_not_selected() {
        let policy = CurationPolicy::default();
        let mut ledger = ledger();
        ledger.get_mut(2).expect("record").treated = true;
        ledger.remove(4);
        let skipped = HashSet::from([0]);
        assert_eq!(
            select_candidate(&ledger, &policy, Category::Add, None, &skipped),
            None
        );
        assert_eq!(remaining(&ledger, &policy, Category::Add, &skipped), 0);
        assert_eq!(remaining(&ledger, &policy, Category::Remove, &skipped), 3);
    }

    #[test]
    fn pinned_class_restricts_selection() {
        let policy = CurationPolicy::default();
        let none = HashSet::new();
        assert_eq!(
            select_candidate(&ledger(), &policy, Category::Add, Some(0), &none),
            Some(4)
        );
        assert_eq!(
            select_candidate(&ledger(), &policy, Category::Add, Some(7), &none),
            None
        );
    }
}
