//! Result type shared by the text-backed modules.

use dico::ModuleResult;
use dico::stream::{ByteStream, StreamError};

/// Items rendered verbatim: headwords for matches, bodies for definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextResult {
    items: Vec<String>,
    compared: usize,
}

impl TextResult {
    /// Wraps `items`, recording how many candidates were compared.
    #[must_use]
    pub const fn new(items: Vec<String>, compared: usize) -> Self {
        Self { items, compared }
    }

    /// Boxes the result, or returns `None` when it holds no items.
    #[must_use]
    pub fn boxed(self) -> Option<Box<dyn ModuleResult>> {
        if self.items.is_empty() {
            None
        } else {
            Some(Box::new(self))
        }
    }
}

impl ModuleResult for TextResult {
    fn count(&self) -> usize {
        self.items.len()
    }

    fn compare_count(&self) -> usize {
        self.compared
    }

    fn output(&self, index: usize, out: &mut dyn ByteStream) -> Result<(), StreamError> {
        self.items
            .get(index)
            .map_or(Ok(()), |item| out.write_str(item))
    }
}
