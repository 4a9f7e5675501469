/// Cold-start logic: leftover temp cleanup and page discovery.
///
/// Hash-paged containers do not persist their set of page addresses.
/// Instead the directory is scanned for `<base_name><digits>` files on open;
/// every such file is a page that was evicted and not reloaded since.
use std::collections::BTreeSet;
use std::fs;
use std::io;
use tracing::{debug, warn};

use codec::TMP_SUFFIX;
use config::INDEX_SUFFIX;

use page::Page;

use crate::error::Result;
use crate::files::PageFiles;

impl PageFiles {
    /// Returns the addresses of every page file under this base path.
    ///
    /// Files whose suffix after the base name is not purely decimal (the index
    /// file, temp files, other containers' files) are ignored. A base name that
    /// is a prefix of another container's base name followed by digits cannot
    /// be told apart; give containers distinct, non-numeric-suffixed names.
    pub fn scan_addresses(&self) -> Result<BTreeSet<u64>> {
        let entries = match fs::read_dir(self.dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = self.base_name();
        let mut found = BTreeSet::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(suffix) = name.strip_prefix(prefix) else {
                continue;
            };
            if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if let Ok(address) = suffix.parse::<u64>() {
                found.insert(address);
            }
        }
        debug!(pages = found.len(), base = %self.base_path().display(), "scanned page files");
        Ok(found)
    }

    /// Total entries over the page files at `addresses`. The files are read
    /// in place, not consumed.
    pub fn count_entries<P: Page>(&self, addresses: &BTreeSet<u64>) -> Result<u64> {
        let mut total = 0u64;
        for &address in addresses {
            let page: P = codec::read_file(self.page_path(address))?;
            total += page.entry_count() as u64;
        }
        if !addresses.is_empty() {
            warn!(
                base = %self.base_path().display(),
                length = total,
                "index file missing, length recounted from pages"
            );
        }
        Ok(total)
    }

    /// Removes `.tmp` files left behind by writes interrupted mid-rename.
    ///
    /// Only this container's own temp files match: `<base><digits>.tmp` and
    /// `<base>Len.tmp`. A failed removal is logged and skipped.
    pub(crate) fn cleanup_tmp_files(&self) {
        let Ok(entries) = fs::read_dir(self.dir()) else {
            return;
        };
        for entry in entries.flatten() {
            let p = entry.path();
            let Some(name) = p.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !self.owns_tmp_file(name) {
                continue;
            }
            debug!(file = name, "removing leftover temp file");
            if let Err(e) = fs::remove_file(&p) {
                warn!(file = name, error = %e, "failed to remove leftover temp file");
            }
        }
    }

    fn owns_tmp_file(&self, name: &str) -> bool {
        let Some(stem) = name
            .strip_prefix(self.base_name())
            .and_then(|rest| rest.strip_suffix(TMP_SUFFIX))
        else {
            return false;
        };
        stem == INDEX_SUFFIX || (!stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()))
    }
}
