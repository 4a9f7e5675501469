/// Residency management: bringing pages in, pushing them out.
///
/// The residency queue is FIFO by the time a page became resident. When a
/// request pushes the resident count over the bound, the oldest page is
/// evicted. The page that was just requested is never its own victim: if it
/// sits at the head it is rotated to the tail first.
use tracing::{debug, info};

use page::Page;

use crate::addressing::Addressing;
use crate::error::Result;
use crate::files::IndexRecord;
use crate::PageStore;

impl<A: Addressing> PageStore<A> {
    /// Makes page `address` resident and returns it.
    ///
    /// 1. If the page is not resident, [`Addressing::open_page`] loads it from
    ///    disk or creates it empty, and it joins the tail of the queue.
    /// 2. While more than `max_resident_pages` pages are resident, the queue
    ///    head is evicted; if the head is `address` it is moved to the tail
    ///    instead.
    ///
    /// Afterwards the resident count is within the bound and `address` is
    /// resident.
    pub fn guarantee(&mut self, address: u64) -> Result<&mut A::Page> {
        self.ensure_open()?;

        if !self.pages.contains_key(&address) {
            let page = self.addressing.open_page(address, &self.files)?;
            self.pages.insert(address, page);
            self.queue.push_back(address);
        }

        while self.queue.len() > self.config.max_resident_pages {
            if self.queue.front() == Some(&address) {
                self.queue.rotate_left(1);
            }
            match self.queue.front().copied() {
                Some(head) => self.persist_and_evict(head)?,
                None => break,
            }
        }

        self.peak_resident = self.peak_resident.max(self.pages.len());
        Ok(self.pages.entry(address).or_default())
    }

    /// Persists the index, then writes page `address` out and drops it from
    /// memory. An empty page is not written: its address is forgotten
    /// instead, so no zero-entry page file ever exists.
    pub fn persist_and_evict(&mut self, address: u64) -> Result<()> {
        self.store_index()?;

        if let Some(page) = self.pages.get(&address) {
            if page.is_empty() {
                self.addressing.page_removed(address);
                debug!(address, "empty page pruned");
            } else {
                self.files.store_page(address, page)?;
            }
            self.pages.remove(&address);
        }

        if let Some(pos) = self.queue.iter().position(|&a| a == address) {
            self.queue.remove(pos);
        }
        Ok(())
    }

    /// Writes the index record (page capacity + length).
    pub fn store_index(&self) -> Result<()> {
        self.files.store_index(&IndexRecord {
            page_capacity: self.config.page_capacity as u64,
            length: self.length,
        })
    }

    /// Evicts every resident page and writes the index. The store stays
    /// usable; pages are reloaded on the next access.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.flush_all()
    }

    fn flush_all(&mut self) -> Result<()> {
        let resident: Vec<u64> = self.queue.iter().copied().collect();
        for address in resident {
            self.persist_and_evict(address)?;
        }
        // Pages outside the queue would break the queue invariant; flush them
        // too rather than lose them.
        let stray: Vec<u64> = self.pages.keys().copied().collect();
        for address in stray {
            self.persist_and_evict(address)?;
        }
        self.store_index()
    }

    /// Flushes everything and marks the store closed. Calling it again is a
    /// no-op. Any later operation fails with
    /// [`StoreError::Closed`](crate::StoreError::Closed).
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush_all()?;
        self.closed = true;
        info!(base = %self.files.base_path().display(), length = self.length, "store closed");
        Ok(())
    }

    /// Removes every entry and every page file. The index is rewritten with a
    /// zero length.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_open()?;
        for address in self.addressing.addresses() {
            if !self.pages.contains_key(&address) {
                self.files.remove_page(address)?;
            }
        }
        self.pages.clear();
        self.queue.clear();
        self.addressing.reset();
        self.length = 0;
        self.store_index()
    }
}
