//! Batch window sizing.

/// Maximum number of keys the store accepts in one batch-get call.
pub const MAX_BATCH_GET: usize = 100;

/// Maximum number of writes the store accepts in one batch-write call.
pub const MAX_BATCH_WRITE: usize = 25;

/// Window sizes used by the batch operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub get: usize,
    pub write: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            get: MAX_BATCH_GET,
            write: MAX_BATCH_WRITE,
        }
    }
}

impl BatchLimits {
    /// Limits clamped to `1..=store maximum`.
    pub fn clamped(self) -> Self {
        Self {
            get: self.get.clamp(1, MAX_BATCH_GET),
            write: self.write.clamp(1, MAX_BATCH_WRITE),
        }
    }
}

/// Lazily splits an iterator into vectors of at most `size` elements.
///
/// Unlike `slice::chunks` this works on any iterator and never materializes
/// more than one window.
pub fn windows<I>(iter: I, size: usize) -> Windows<I::IntoIter>
where
    I: IntoIterator,
{
    Windows {
        inner: iter.into_iter(),
        size: size.max(1),
    }
}

/// Iterator returned by [`windows`].
#[derive(Debug)]
pub struct Windows<I> {
    inner: I,
    size: usize,
}

impl<I: Iterator> Iterator for Windows<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let window: Vec<_> = self.inner.by_ref().take(self.size).collect();
        if window.is_empty() {
            None
        } else {
            Some(window)
        }
    }
}

/// Number of windows needed for `len` elements.
pub fn window_count(len: usize, size: usize) -> usize {
    len.div_ceil(size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_preserve_order() {
        let windows: Vec<Vec<u32>> = windows(1..=7, 3).collect();
        assert_eq!(windows, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
    }

    #[test]
    fn test_windows_of_empty_input() {
        assert_eq!(windows(Vec::<u32>::new(), 25).count(), 0);
    }

    #[test]
    fn test_windows_are_lazy() {
        let mut pulled = 0;
        let source = (0..1000).inspect(|_| pulled += 1);

        let first = windows(source, 25).next().unwrap();

        assert_eq!(first.len(), 25);
        assert_eq!(pulled, 25);
    }

    #[test]
    fn test_window_count() {
        assert_eq!(window_count(60, 25), 3);
        assert_eq!(window_count(50, 25), 2);
        assert_eq!(window_count(0, 25), 0);
    }

    #[test]
    fn test_limits_are_clamped() {
        let limits = BatchLimits { get: 500, write: 0 }.clamped();
        assert_eq!(limits, BatchLimits { get: 100, write: 1 });
    }
}
