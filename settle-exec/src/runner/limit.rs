use std::fmt;
use std::num::NonZeroUsize;

/// Worker count used when nothing else is configured.
pub const DEFAULT_MAX_PARALLELISM: NonZeroUsize = match NonZeroUsize::new(16) {
    Some(n) => n,
    None => unreachable!(),
};

/// Upper bound on how many tasks of one batch run at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerLimit {
    /// One worker per target.
    Unbounded,
    Bounded(NonZeroUsize),
}

impl Default for WorkerLimit {
    fn default() -> Self {
        Self::Bounded(DEFAULT_MAX_PARALLELISM)
    }
}

impl WorkerLimit {
    /// `Bounded(n)`; zero is clamped to a single worker.
    pub fn bounded(n: usize) -> Self {
        Self::Bounded(NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN))
    }

    /// `None` means unbounded, mirroring [`settle_core::WorkerSettings::limit`].
    pub fn from_settings(limit: Option<usize>) -> Self {
        match limit {
            Some(n) => Self::bounded(n),
            None => Self::Unbounded,
        }
    }

    /// Effective pool size for a batch of `targets` tasks: `min(limit, targets)`.
    pub fn pool_size(&self, targets: usize) -> usize {
        match self {
            Self::Unbounded => targets,
            Self::Bounded(n) => n.get().min(targets),
        }
    }
}

impl fmt::Display for WorkerLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::Bounded(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_bounded() {
        assert_eq!(WorkerLimit::default().pool_size(100), 16);
        assert_eq!(WorkerLimit::default().pool_size(3), 3);
    }

    #[test]
    fn unbounded_matches_target_count() {
        assert_eq!(WorkerLimit::Unbounded.pool_size(40), 40);
        assert_eq!(WorkerLimit::from_settings(None), WorkerLimit::Unbounded);
    }

    #[test]
    fn zero_is_clamped_to_one() {
        assert_eq!(WorkerLimit::bounded(0).pool_size(5), 1);
    }
}
