use super::ChunkSizeIterator;

/// Starts at a minimum and doubles each chunk, capped at a maximum.
#[derive(Debug, Clone)]
pub struct DoublingIterator {
    current: u64,
    /// `None` disables chunking.
    min: Option<u64>,
    max: u64,
}

impl DoublingIterator {
    /// A `min` of zero disables chunking; a `max` of `None` means no cap.
    /// A `max` below `min` is raised to `min`.
    pub fn new(min: u64, max: Option<u64>) -> Self {
        if min == 0 {
            return Self {
                current: 0,
                min: None,
                max: 0,
            };
        }
        Self {
            current: 0,
            min: Some(min),
            max: max.map_or(u64::MAX, |max| max.max(min)),
        }
    }
}

impl ChunkSizeIterator for DoublingIterator {
    fn next_chunk_size(&mut self) -> Option<u64> {
        let min = self.min?;
        self.current = if self.current < min {
            min
        } else {
            self.current.saturating_mul(2).min(self.max)
        };
        Some(self.current)
    }

    fn reset(&mut self, _length: Option<u64>) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(it: &mut DoublingIterator, n: usize) -> Vec<Option<u64>> {
        (0..n).map(|_| it.next_chunk_size()).collect()
    }

    #[test]
    fn test_doubles_up_to_max() {
        let mut it = DoublingIterator::new(2, Some(16));
        let sizes = take(&mut it, 6);
        assert_eq!(sizes, [2, 4, 8, 16, 16, 16].map(Some).to_vec());
    }

    #[test]
    fn test_max_not_power_of_two_multiple() {
        let mut it = DoublingIterator::new(3, Some(10));
        assert_eq!(take(&mut it, 4), [3, 6, 10, 10].map(Some).to_vec());
    }

    #[test]
    fn test_zero_min_is_unbounded() {
        let mut it = DoublingIterator::new(0, Some(16));
        assert_eq!(take(&mut it, 3), vec![None, None, None]);
        it.reset(Some(5));
        assert_eq!(it.next_chunk_size(), None);
    }

    #[test]
    fn test_max_below_min_is_raised() {
        let mut it = DoublingIterator::new(8, Some(2));
        assert_eq!(take(&mut it, 3), [8, 8, 8].map(Some).to_vec());
    }

    #[test]
    fn test_no_max_keeps_doubling() {
        let mut it = DoublingIterator::new(1, None);
        assert_eq!(take(&mut it, 5), [1, 2, 4, 8, 16].map(Some).to_vec());
    }

    #[test]
    fn test_no_max_saturates() {
        let mut it = DoublingIterator::new(u64::MAX / 2 + 1, None);
        assert_eq!(it.next_chunk_size(), Some(u64::MAX / 2 + 1));
        assert_eq!(it.next_chunk_size(), Some(u64::MAX));
        assert_eq!(it.next_chunk_size(), Some(u64::MAX));
    }

    #[test]
    fn test_reset_restarts_and_ignores_length() {
        let mut it = DoublingIterator::new(2, Some(16));
        take(&mut it, 3);
        it.reset(Some(1000));
        assert_eq!(take(&mut it, 2), [2, 4].map(Some).to_vec());
    }
}
