//! # Batch Paginator
//!
//! Offset-based walk over one tenant store. Pages are requested with a
//! fixed limit; a page shorter than the limit ends the walk. The offset only
//! ever grows by exactly one limit per full page, so under a stable record
//! count every record is visited exactly once.

use crate::error::{PropagationError, PropagationResult};
use crate::models::{Record, TenantStoreId};
use crate::store::{RecordFilter, RecordStore};

pub struct BatchPaginator<'a> {
    store: &'a dyn RecordStore,
    tenant_store: &'a TenantStoreId,
    filter: RecordFilter,
    limit: u64,
    offset: u64,
    pages_fetched: usize,
    exhausted: bool,
}

impl<'a> BatchPaginator<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        tenant_store: &'a TenantStoreId,
        filter: RecordFilter,
        limit: u64,
    ) -> Self {
        Self {
            store,
            tenant_store,
            filter,
            limit,
            offset: 0,
            pages_fetched: 0,
            exhausted: false,
        }
    }

    /// Start from `offset` instead of the first record
    pub fn starting_at(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Fetch the next page.
    ///
    /// Returns `Ok(None)` once the store is exhausted; an empty page is never
    /// returned. A store failure is returned as-is and leaves the cursor
    /// where it was.
    pub async fn next_page(&mut self) -> PropagationResult<Option<Vec<Record>>> {
        if self.exhausted {
            return Ok(None);
        }

        if self.limit == 0 {
            return Err(PropagationError::Configuration {
                message: "page size must be greater than 0".to_string(),
            });
        }

        let page = self
            .store
            .get_page(self.tenant_store, self.offset, self.limit, &self.filter)
            .await?;
        self.pages_fetched += 1;

        if page.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        if (page.len() as u64) < self.limit {
            self.exhausted = true;
        } else {
            self.offset += self.limit;
        }

        Ok(Some(page))
    }

    /// Offset of the next page to request
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
