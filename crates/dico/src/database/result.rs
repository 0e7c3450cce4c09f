//! Engine-side wrapper around module results.

use std::fmt;
use std::sync::Arc;

use once_cell::unsync::OnceCell;

use crate::header::HeaderList;
use crate::module::{EntryPoint, ModuleResult};
use crate::stream::{ByteStream, StreamError};

use super::DatabaseInstance;

/// Result of one match or define call.
///
/// Counts are asked of the module at most once and cached. Dropping the
/// handle returns the module result to the backend that produced it.
pub struct ResultHandle {
    database: Arc<DatabaseInstance>,
    result: Option<Box<dyn ModuleResult>>,
    count: OnceCell<usize>,
    compare_count: OnceCell<usize>,
}

impl ResultHandle {
    pub(crate) fn new(database: Arc<DatabaseInstance>, result: Box<dyn ModuleResult>) -> Self {
        Self {
            database,
            result: Some(result),
            count: OnceCell::new(),
            compare_count: OnceCell::new(),
        }
    }

    /// Database the query was issued against.
    #[must_use]
    pub const fn database(&self) -> &Arc<DatabaseInstance> {
        &self.database
    }

    fn declares(&self, entry: EntryPoint) -> bool {
        self.database.module().descriptor().declares(entry)
    }

    /// Number of items.
    #[must_use]
    pub fn count(&self) -> usize {
        *self
            .count
            .get_or_init(|| self.result.as_ref().map_or(0, |result| result.count()))
    }

    /// Number of comparisons the module performed; zero when the module does
    /// not report it.
    #[must_use]
    pub fn compare_count(&self) -> usize {
        *self.compare_count.get_or_init(|| {
            if !self.declares(EntryPoint::CompareCount) {
                return 0;
            }
            self.result
                .as_ref()
                .map_or(0, |result| result.compare_count())
        })
    }

    /// Returns `true` when the result holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Writes item `index`.
    ///
    /// # Errors
    ///
    /// Propagates stream failures.
    pub fn output(&self, index: usize, out: &mut dyn ByteStream) -> Result<(), StreamError> {
        match &self.result {
            Some(result) => result.output(index, out),
            None => Ok(()),
        }
    }

    /// Database that produced item `index`: the federated member when the
    /// module reports one, otherwise the queried database.
    #[must_use]
    pub fn database_for(&self, index: usize) -> Arc<DatabaseInstance> {
        self.result
            .as_ref()
            .filter(|_| self.declares(EntryPoint::ResultDb))
            .and_then(|result| result.result_db(index))
            .unwrap_or_else(|| Arc::clone(&self.database))
    }

    /// MIME headers describing item `index`.
    #[must_use]
    pub fn headers(&self, index: usize) -> HeaderList {
        self.database_for(index).mime_headers().clone()
    }
}

impl Drop for ResultHandle {
    fn drop(&mut self) {
        if let Some(result) = self.result.take() {
            self.database.free_result(result);
        }
    }
}

impl fmt::Debug for ResultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandle")
            .field("database", &self.database.name())
            .field("count", &self.count.get())
            .finish_non_exhaustive()
    }
}
