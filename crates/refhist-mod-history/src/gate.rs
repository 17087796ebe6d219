/// Commit gate: decides whether an observed change becomes a history point.

type Predicate<T> = Box<dyn Fn(Option<&T>, &T) -> bool>;

/// Predicate evaluated before every tracked or manual commit.
///
/// Receives the last raw value that went through the gate (`None` before
/// the first one) and the candidate value. A rejected candidate leaves the
/// history untouched and does not replace the previous value.
pub struct CommitGate<T> {
    predicate: Option<Predicate<T>>,
}

impl<T> Default for CommitGate<T> {
    fn default() -> Self {
        Self::always()
    }
}

impl<T> std::fmt::Debug for CommitGate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitGate")
            .field("custom", &self.is_custom())
            .finish()
    }
}

impl<T> CommitGate<T> {
    /// A gate that admits every change.
    pub fn always() -> Self {
        Self { predicate: None }
    }

    /// A gate backed by `predicate(previous, candidate)`.
    pub fn new(predicate: impl Fn(Option<&T>, &T) -> bool + 'static) -> Self {
        Self {
            predicate: Some(Box::new(predicate)),
        }
    }

    pub fn admit(&self, previous: Option<&T>, candidate: &T) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(previous, candidate),
            None => true,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.predicate.is_some()
    }
}
