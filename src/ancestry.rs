//! Per-post ancestor tracking for indentation-encoded reply trees.
//!
//! The stack holds `(level, id)` pairs with strictly increasing levels. Resolving a
//! new line at `level` pops every entry at `level` or deeper: those branches are closed
//! because a line at the same or a shallower indentation came after them. Whatever is
//! left on top is the nearest enclosing ancestor. Each line is pushed and popped at most
//! once, so lookups are amortized O(1).
//!
//! Level 0 belongs to the post. After `reset(post)` the post sits at the bottom of the
//! stack and is never popped; a comment found at column 0 replies to the post directly
//! and does not take over the post's slot.

#[derive(Debug, Default)]
pub struct AncestorStack {
    entries: Vec<(usize, String)>,
    rooted: bool,
}

impl AncestorStack {
    /// Empty stack: no post is open, every lookup fails until `reset`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new post. Everything from the previous post is forgotten.
    pub fn reset(&mut self, post_id: &str) {
        self.entries.clear();
        self.entries.push((0, post_id.to_string()));
        self.rooted = true;
    }

    /// Close the current post without opening another one.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.rooted = false;
    }

    /// Whether a post is currently open.
    pub fn is_rooted(&self) -> bool {
        self.rooted
    }

    /// Nearest open ancestor strictly shallower than `level`, closing deeper branches.
    pub fn resolve(&mut self, level: usize) -> Option<&str> {
        let floor = usize::from(self.rooted);
        while self.entries.len() > floor
            && self.entries.last().map_or(false, |(top, _)| *top >= level)
        {
            self.entries.pop();
        }
        match self.entries.last() {
            Some((top, id)) if *top < level => Some(id.as_str()),
            // Column-0 comments reply straight to the post.
            Some((0, id)) if self.rooted && level == 0 => Some(id.as_str()),
            _ => None,
        }
    }

    /// Record `id` as the most recent line at `level`. Call after `resolve(level)`.
    /// Nothing is recorded while no post is open, so unrooted lines never become
    /// ancestors.
    pub fn push(&mut self, level: usize, id: &str) {
        if !self.rooted || level == 0 {
            return;
        }
        self.entries.push((level, id.to_string()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
