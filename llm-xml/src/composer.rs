//! Indentation-aware output builders.

/// Append-only text sink the encoder writes through.
///
/// Methods return `&mut Self` so calls chain:
/// `composer.append_line().append("<a>")`.
pub trait Composer {
    /// Increase the nesting level.
    fn indent(&mut self) -> &mut Self;

    /// Decrease the nesting level.
    ///
    /// # Panics
    ///
    /// Panics if the level is already zero.
    fn unindent(&mut self) -> &mut Self;

    /// Append raw text.
    fn append(&mut self, text: &str) -> &mut Self;

    /// Start a new line at the current nesting level.
    fn append_line(&mut self) -> &mut Self;

    /// Separator emitted before each attribute of an opening tag.
    fn new_attribute(&mut self) -> &mut Self;

    /// Consume the composer and return the accumulated text.
    fn finish(self) -> String;
}

/// Pretty-printing composer: newline plus `level * width` spaces per line.
#[derive(Debug, Clone)]
pub struct PrettyComposer {
    out: String,
    level: usize,
    width: usize,
}

impl PrettyComposer {
    /// Create a composer indenting by `width` spaces per level.
    pub fn new(width: usize) -> Self {
        PrettyComposer {
            out: String::new(),
            level: 0,
            width,
        }
    }

    /// Current nesting level.
    pub fn level(&self) -> usize {
        self.level
    }
}

impl Default for PrettyComposer {
    fn default() -> Self {
        PrettyComposer::new(2)
    }
}

impl Composer for PrettyComposer {
    fn indent(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    fn unindent(&mut self) -> &mut Self {
        assert!(self.level > 0, "unindent below level zero");
        self.level -= 1;
        self
    }

    fn append(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self
    }

    fn append_line(&mut self) -> &mut Self {
        self.out.push('\n');
        for _ in 0..self.level * self.width {
            self.out.push(' ');
        }
        self
    }

    fn new_attribute(&mut self) -> &mut Self {
        self.out.push(' ');
        self
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Compact composer: everything but [`Composer::append`] and
/// [`Composer::new_attribute`] is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CompactComposer {
    out: String,
}

impl CompactComposer {
    /// Create an empty compact composer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Composer for CompactComposer {
    fn indent(&mut self) -> &mut Self {
        self
    }

    fn unindent(&mut self) -> &mut Self {
        self
    }

    fn append(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self
    }

    fn append_line(&mut self) -> &mut Self {
        self
    }

    fn new_attribute(&mut self) -> &mut Self {
        self.out.push(' ');
        self
    }

    fn finish(self) -> String {
        self.out
    }
}
