//! Object filter trait.

/// Trait for deciding whether a listed object should be read.
///
/// Invoked exactly once per listed object, before the object is queued for a
/// worker. Rejected objects are never opened.
pub trait ObjectFilter: Send + Sync {
    /// Check if the object named `name` should be read.
    fn accept(&self, name: &str) -> bool;

    /// Get a human-readable description of this filter.
    fn description(&self) -> String {
        "custom".to_string()
    }
}

/// A filter that accepts every object (no filtering).
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ObjectFilter for AcceptAll {
    fn accept(&self, _name: &str) -> bool {
        true
    }

    fn description(&self) -> String {
        "accept_all".to_string()
    }
}

/// Adapter turning a closure into an [`ObjectFilter`].
pub struct FnFilter<F> {
    f: F,
}

impl<F> FnFilter<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ObjectFilter for FnFilter<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn accept(&self, name: &str) -> bool {
        (self.f)(name)
    }
}
