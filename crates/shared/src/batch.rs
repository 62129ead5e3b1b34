//! Splitting work into bounded-size outbound batches.

/// Split `items` into consecutive chunks of at most `size` elements,
/// preserving order. A size of zero is treated as one.
pub fn into_batches<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(|chunk| chunk.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_batches_are_bounded() {
        let items: Vec<u32> = (0..65).collect();
        let batches = into_batches(&items, 30);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2].len(), 5);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<u32> = Vec::new();
        assert!(into_batches(&items, 30).is_empty());
    }

    proptest! {
        #[test]
        fn prop_batches_preserve_items(items in proptest::collection::vec(any::<u16>(), 0..200), size in 0usize..50) {
            let batches = into_batches(&items, size);
            prop_assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size.max(1)));
            let flattened: Vec<u16> = batches.into_iter().flatten().collect();
            prop_assert_eq!(flattened, items);
        }
    }
}
