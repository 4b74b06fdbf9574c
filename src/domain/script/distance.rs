//! Edit distance over folded keys

/// Levenshtein distance with an early-exit cap.
///
/// Returns `Some(distance)` when the distance is at most `max_dist`,
/// `None` otherwise. Operates on characters, not bytes.
pub fn bounded_edit_distance(a: &str, b: &str, max_dist: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > max_dist {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        let d = a.len().max(b.len());
        return (d <= max_dist).then_some(d);
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for j in 1..=b.len() {
            let cost = usize::from(*ca != b[j - 1]);
            let d = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            curr[j] = d;
            row_min = row_min.min(d);
        }

        if row_min > max_dist {
            return None;
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    let d = prev[b.len()];
    (d <= max_dist).then_some(d)
}

/// Unbounded Levenshtein distance
pub fn edit_distance(a: &str, b: &str) -> usize {
    let bound = a.chars().count().max(b.chars().count());
    bounded_edit_distance(a, b, bound).unwrap_or(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("قمح", "قمح"), 0);
        assert_eq!(edit_distance("كسكس", "كسكسو"), 1);
    }

    #[test]
    fn test_bounded_edit_distance_cap() {
        assert_eq!(bounded_edit_distance("couscous", "kuskus", 4), Some(4));
        assert_eq!(bounded_edit_distance("couscous", "kuskus", 3), None);
        assert_eq!(bounded_edit_distance("rice", "barley", 1), None);
        assert_eq!(bounded_edit_distance("", "", 0), Some(0));
    }
}
