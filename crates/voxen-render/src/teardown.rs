//! Ordered teardown of acquired graphics objects.

/// Objects in acquisition order, released newest first.
pub struct ResourceStack<R> {
    resources: Vec<R>,
}

impl<R> Default for ResourceStack<R> {
    fn default() -> Self {
        Self {
            resources: Vec::new(),
        }
    }
}

impl<R> ResourceStack<R> {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly acquired object.
    pub fn push(&mut self, resource: R) {
        self.resources.push(resource);
    }

    /// Number of objects still held.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Hand every object to `release`, newest first, leaving the stack empty.
    pub fn release_all(&mut self, mut release: impl FnMut(R)) {
        while let Some(resource) = self.resources.pop() {
            release(resource);
        }
    }
}
