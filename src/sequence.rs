//! Slice-level helpers shared by the selection partitioning methods.

use crate::error::{Error, Result};
use num_rational::Ratio;

/// Splits `items` into consecutive parts of the given sizes.
///
/// With `cyclic` the counts repeat until the items run out. With
/// `enchain` each part after the first starts with the last item of the
/// part before it. With `overhang` a trailing part shorter than its count
/// is kept.
pub fn partition_by_counts<T: Clone>(
    items: &[T],
    counts: &[usize],
    cyclic: bool,
    enchain: bool,
    overhang: bool,
) -> Result<Vec<Vec<T>>> {
    if counts.is_empty() {
        return Err(Error::Value("counts must not be empty".to_string()));
    }
    if cyclic && counts.iter().all(|count| *count == 0) {
        return Err(Error::Value(
            "cyclic counts need at least one positive count".to_string(),
        ));
    }

    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    loop {
        // with enchain the first item of the tail is already in the
        // previous part
        let fresh = if enchain && i > 0 { start + 1 } else { start };
        if !cyclic && i == counts.len() {
            if overhang && fresh < items.len() {
                parts.push(items[start..].to_vec());
            }
            break;
        }
        let count = counts[i % counts.len()];
        let stop = start + count;
        if stop > items.len() {
            if overhang && fresh < items.len() {
                parts.push(items[start..].to_vec());
            }
            break;
        }
        parts.push(items[start..stop].to_vec());
        start = if enchain && count > 1 { stop - 1 } else { stop };
        i += 1;
        if cyclic && start >= items.len() {
            break;
        }
    }
    Ok(parts)
}

fn round_half_up(value: Ratio<i64>) -> i64 {
    (value + Ratio::new(1, 2)).floor().to_integer()
}

/// Integer partition of `n` proportional to `ratio`.
///
/// Cumulative shares are rounded half up and differenced, so the
/// parts always sum to `n`. Signs of the ratio terms carry over to the
/// parts.
pub fn partition_integer_by_ratio(n: usize, ratio: &[i64]) -> Result<Vec<i64>> {
    let total: i64 = ratio.iter().map(|term| term.abs()).sum();
    if ratio.is_empty() || total == 0 {
        return Err(Error::Value(format!(
            "ratio {:?} has no positive weight",
            ratio
        )));
    }
    let mut parts = Vec::with_capacity(ratio.len());
    let mut cumulative = Ratio::from_integer(0);
    let mut previous = 0;
    for term in ratio {
        cumulative += Ratio::new(n as i64 * term.abs(), total);
        let rounded = round_half_up(cumulative);
        let part = rounded - previous;
        parts.push(if *term < 0 { -part } else { part });
        previous = rounded;
    }
    Ok(parts)
}

/// Runs of consecutive items sharing the same key.
pub fn group_consecutive<T: Clone, K: PartialEq>(
    items: &[T],
    key: impl Fn(&T) -> K,
) -> Vec<Vec<T>> {
    let mut groups: Vec<Vec<T>> = Vec::new();
    let mut current_key: Option<K> = None;
    for item in items {
        let item_key = key(item);
        if current_key.as_ref() == Some(&item_key)
            && let Some(group) = groups.last_mut()
        {
            group.push(item.clone());
        } else {
            groups.push(vec![item.clone()]);
            current_key = Some(item_key);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbers(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn test_partition_by_counts() {
        let items = numbers(10);
        assert_eq!(
            partition_by_counts(&items, &[3], false, false, false).unwrap(),
            vec![vec![0, 1, 2]]
        );
        assert_eq!(
            partition_by_counts(&items, &[3], true, false, false).unwrap(),
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]
        );
        assert_eq!(
            partition_by_counts(&items, &[3], true, false, true).unwrap(),
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8], vec![9]]
        );
        assert_eq!(
            partition_by_counts(&items, &[4, 3], false, false, true).unwrap(),
            vec![vec![0, 1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]
        );
    }

    #[test]
    fn test_partition_by_counts_enchained() {
        let items = numbers(16);
        let parts = partition_by_counts(&items, &[3], true, true, true).unwrap();
        assert_eq!(parts.len(), 8);
        assert_eq!(parts[1], vec![2, 3, 4]);
        assert_eq!(parts[6], vec![12, 13, 14]);
        assert_eq!(parts[7], vec![14, 15]);
    }

    #[test]
    fn test_partition_by_counts_rejects_bad_counts() {
        let items = numbers(4);
        assert!(partition_by_counts(&items, &[], false, false, false).is_err());
        assert!(partition_by_counts(&items, &[0], true, false, false).is_err());
    }

    #[test]
    fn test_partition_integer_by_ratio() {
        assert_eq!(partition_integer_by_ratio(8, &[1, 1]).unwrap(), vec![4, 4]);
        assert_eq!(partition_integer_by_ratio(5, &[1, 1]).unwrap(), vec![3, 2]);
        assert_eq!(partition_integer_by_ratio(7, &[1, 1, 1, 1]).unwrap(), vec![2, 2, 1, 2]);
        assert_eq!(
            partition_integer_by_ratio(8, &[1, 1, 1]).unwrap(),
            vec![3, 2, 3]
        );
        assert_eq!(
            partition_integer_by_ratio(10, &[1, -2, 2]).unwrap(),
            vec![2, -4, 4]
        );
        assert!(partition_integer_by_ratio(8, &[0, 0]).is_err());
    }

    #[test]
    fn test_group_consecutive() {
        let groups = group_consecutive(&[1, 1, 2, 2, 2, 1], |n| *n);
        assert_eq!(groups, vec![vec![1, 1], vec![2, 2, 2], vec![1]]);
        assert!(group_consecutive(&Vec::<i32>::new(), |n| *n).is_empty());
    }
}
