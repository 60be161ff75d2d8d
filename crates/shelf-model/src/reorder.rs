//! Display-order moves for user-sortable lists.

/// Move the item keyed `moved` to the current index of the item keyed
/// `target`, shifting the items in between by one.
///
/// Returns false (leaving `items` untouched) when either key is missing.
pub fn move_to_target<T, K: PartialEq>(
    items: &mut Vec<T>,
    key: impl Fn(&T) -> K,
    moved: &K,
    target: &K,
) -> bool {
    let from = items.iter().position(|item| key(item) == *moved);
    let to = items.iter().position(|item| key(item) == *target);
    match (from, to) {
        (Some(from), Some(to)) => {
            let item = items.remove(from);
            items.insert(to, item);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_forward() {
        let mut items = vec![1, 2, 3, 4];
        assert!(move_to_target(&mut items, |v| *v, &1, &3));
        assert_eq!(items, vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_move_backward() {
        let mut items = vec![1, 2, 3, 4];
        assert!(move_to_target(&mut items, |v| *v, &4, &2));
        assert_eq!(items, vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_missing_key_is_noop() {
        let mut items = vec![1, 2, 3];
        assert!(!move_to_target(&mut items, |v| *v, &9, &2));
        assert_eq!(items, vec![1, 2, 3]);
    }
}
