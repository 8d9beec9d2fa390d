//! Copy-on-write operations over nested collections.
//!
//! Lists (benefits, information, FAQs, images, references) share the free
//! functions below. The specification map has its own methods because it is
//! addressed by label rather than by position.

use super::EditError;
use crate::models::{SpecEntry, SpecValue, Specification};

const NEW_SPECIFICATION_PREFIX: &str = "New Specification";

pub fn append<T: Clone>(items: &[T], item: T) -> Vec<T> {
    let mut next = Vec::with_capacity(items.len() + 1);
    next.extend_from_slice(items);
    next.push(item);
    next
}

pub fn update_at<T: Clone>(items: &[T], index: usize, item: T) -> Result<Vec<T>, EditError> {
    check_index(items, index)?;
    let mut next = items.to_vec();
    next[index] = item;
    Ok(next)
}

pub fn remove_at<T: Clone>(items: &[T], index: usize) -> Result<Vec<T>, EditError> {
    check_index(items, index)?;
    let mut next = items.to_vec();
    next.remove(index);
    Ok(next)
}

/// Overwrites `index` when given, appends otherwise. Used for image uploads.
pub fn put_slot<T: Clone>(items: &[T], index: Option<usize>, item: T) -> Result<Vec<T>, EditError> {
    match index {
        Some(index) => update_at(items, index, item),
        None => Ok(append(items, item)),
    }
}

/// Appends unless an element matching `same` is already present.
pub fn append_unique<T, F>(items: &[T], item: T, same: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    if items.iter().any(same) {
        return items.to_vec();
    }
    append(items, item)
}

/// Drops every element matching `matches`; absence is not an error.
pub fn remove_matching<T, F>(items: &[T], matches: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    items.iter().filter(|item| !matches(*item)).cloned().collect()
}

fn check_index<T>(items: &[T], index: usize) -> Result<(), EditError> {
    if index >= items.len() {
        return Err(EditError::OutOfRange {
            index,
            len: items.len(),
        });
    }
    Ok(())
}

impl Specification {
    /// Appends a blank entry labelled `New Specification N`, picking the first
    /// free N starting at `len + 1`.
    pub fn with_blank_entry(&self) -> Specification {
        let mut n = self.len() + 1;
        let label = loop {
            let candidate = format!("{NEW_SPECIFICATION_PREFIX} {n}");
            if !self.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        let mut next = self.clone();
        next.entries_mut().push(SpecEntry {
            label,
            value: SpecValue::default(),
        });
        next
    }

    /// Renames an entry in place; the value and the position are kept.
    pub fn with_renamed(&self, from: &str, to: &str) -> Result<Specification, EditError> {
        let idx = self
            .position(from)
            .ok_or_else(|| EditError::KeyNotFound(from.to_string()))?;
        if from == to {
            return Ok(self.clone());
        }
        if to.trim().is_empty() {
            return Err(EditError::Invalid {
                field: "specification",
                reason: "label must not be empty".into(),
            });
        }
        if self.contains(to) {
            return Err(EditError::DuplicateKey(to.to_string()));
        }
        let mut next = self.clone();
        next.entries_mut()[idx].label = to.to_string();
        Ok(next)
    }

    pub fn with_value(&self, label: &str, value: SpecValue) -> Result<Specification, EditError> {
        let idx = self
            .position(label)
            .ok_or_else(|| EditError::KeyNotFound(label.to_string()))?;
        let mut next = self.clone();
        next.entries_mut()[idx].value = value;
        Ok(next)
    }

    pub fn without(&self, label: &str) -> Result<Specification, EditError> {
        let idx = self
            .position(label)
            .ok_or_else(|| EditError::KeyNotFound(label.to_string()))?;
        let mut next = self.clone();
        next.entries_mut().remove(idx);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn benefits() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn remove_last_of_three() {
        let items = benefits();
        let next = remove_at(&items, 2).unwrap();
        assert_eq!(next, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn remove_out_of_range_is_an_error() {
        assert_eq!(
            remove_at(&benefits(), 3),
            Err(EditError::OutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            update_at(&Vec::<String>::new(), 0, "x".to_string()),
            Err(EditError::OutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn update_keeps_order() {
        let next = update_at(&benefits(), 1, "B".to_string()).unwrap();
        assert_eq!(next, vec!["a".to_string(), "B".to_string(), "c".to_string()]);
    }

    #[test]
    fn put_slot_replaces_or_appends() {
        let images = vec!["/1.png".to_string()];
        assert_eq!(
            put_slot(&images, Some(0), "/2.png".to_string()).unwrap(),
            vec!["/2.png".to_string()]
        );
        assert_eq!(
            put_slot(&images, None, "/2.png".to_string()).unwrap(),
            vec!["/1.png".to_string(), "/2.png".to_string()]
        );
        assert!(put_slot(&images, Some(4), "/2.png".to_string()).is_err());
    }

    #[test]
    fn append_unique_is_idempotent() {
        let once = append_unique(&[1, 2], 3, |x| *x == 3);
        let twice = append_unique(&once, 3, |x| *x == 3);
        assert_eq!(once, twice);
        assert_eq!(twice, vec![1, 2, 3]);
    }

    #[test]
    fn remove_matching_tolerates_absence() {
        let empty: Vec<i32> = Vec::new();
        assert!(remove_matching(&empty, |x| *x == 1).is_empty());
        assert_eq!(remove_matching(&[1, 2, 1], |x| *x == 1), vec![2]);
    }

    #[test]
    fn blank_entry_then_rename_keeps_value() {
        let spec = Specification::default().with_blank_entry();
        assert!(spec.contains("New Specification 1"));
        let spec = spec
            .with_value("New Specification 1", SpecValue::Text("12 t".into()))
            .unwrap();
        let renamed = spec.with_renamed("New Specification 1", "Weight").unwrap();
        assert_eq!(renamed.get("Weight"), Some(&SpecValue::Text("12 t".into())));
        assert!(!renamed.contains("New Specification 1"));
        assert!(spec.contains("New Specification 1"));
    }

    #[test]
    fn rename_keeps_position() {
        let spec = Specification::from_entries([
            ("Engine", SpecValue::Text("V8".into())),
            ("Weight", SpecValue::Text("12 t".into())),
            ("Reach", SpecValue::Text("9 m".into())),
        ]);
        let renamed = spec.with_renamed("Weight", "Operating weight").unwrap();
        let labels: Vec<_> = renamed.labels().collect();
        assert_eq!(labels, vec!["Engine", "Operating weight", "Reach"]);
    }

    #[test]
    fn rename_onto_existing_label_fails() {
        let spec = Specification::from_entries([
            ("Engine", SpecValue::default()),
            ("Weight", SpecValue::default()),
        ]);
        assert_eq!(
            spec.with_renamed("Engine", "Weight"),
            Err(EditError::DuplicateKey("Weight".into()))
        );
        assert_eq!(
            spec.with_renamed("Colour", "Paint"),
            Err(EditError::KeyNotFound("Colour".into()))
        );
    }

    #[test]
    fn blank_entries_skip_taken_labels() {
        let spec = Specification::from_entries([("New Specification 2", SpecValue::default())]);
        let next = spec.with_blank_entry();
        assert!(next.contains("New Specification 3"));
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn without_missing_label_fails() {
        let spec = Specification::default();
        assert_eq!(
            spec.without("Weight"),
            Err(EditError::KeyNotFound("Weight".into()))
        );
    }
}
