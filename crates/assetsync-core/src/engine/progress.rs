//! Fraction-complete reporting for downloads.

/// Turns byte counts into a non-decreasing fraction in `[0.0, 1.0]` and
/// forwards it to the caller's callback, once per chunk.
pub(crate) struct ProgressTracker<'p> {
    total: Option<u64>,
    done: u64,
    last: f64,
    sink: &'p mut dyn FnMut(f64),
}

impl<'p> ProgressTracker<'p> {
    /// `total` is the expected ciphertext length; without it intermediate
    /// reports stay at 0.0 until `finish`.
    pub(crate) fn new(total: Option<u64>, sink: &'p mut dyn FnMut(f64)) -> Self {
        Self {
            total,
            done: 0,
            last: 0.0,
            sink,
        }
    }

    pub(crate) fn advance(&mut self, bytes: u64) {
        self.done += bytes;
        let fraction = match self.total {
            Some(0) => 1.0,
            Some(total) => (self.done as f64 / total as f64).min(1.0),
            None => 0.0,
        };
        if fraction > self.last {
            self.last = fraction;
        }
        (self.sink)(self.last);
    }

    /// Report exactly 1.0. Only called once the transfer has succeeded.
    pub(crate) fn finish(&mut self) {
        self.last = 1.0;
        (self.sink)(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(total: Option<u64>, chunks: &[u64]) -> Vec<f64> {
        let mut seen = Vec::new();
        {
            let mut sink = |f: f64| seen.push(f);
            let mut t = ProgressTracker::new(total, &mut sink);
            for c in chunks {
                t.advance(*c);
            }
            t.finish();
        }
        seen
    }

    #[test]
    fn fractions_are_monotonic_and_end_at_one() {
        let seen = collect(Some(100), &[10, 30, 60]);
        assert_eq!(seen, vec![0.1, 0.4, 1.0, 1.0]);
    }

    #[test]
    fn overshoot_is_clamped() {
        let seen = collect(Some(10), &[8, 8]);
        assert_eq!(seen, vec![0.8, 1.0, 1.0]);
    }

    #[test]
    fn unknown_total_reports_zero_until_finish() {
        let seen = collect(None, &[5, 5]);
        assert_eq!(seen, vec![0.0, 0.0, 1.0]);
    }
}
