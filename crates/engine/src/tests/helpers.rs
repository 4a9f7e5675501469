use std::fs;
use std::path::Path;

use config::StoreConfig;

/// Config rooted in a test directory.
pub fn cfg(dir: &Path, name: &str, capacity: usize, pages: usize) -> StoreConfig {
    StoreConfig::new(name)
        .location(dir)
        .page_capacity(capacity)
        .max_resident_pages(pages)
}

/// Addresses of the page files named `<name><digits>` in `dir`, sorted.
pub fn page_files(dir: &Path, name: &str) -> Vec<u64> {
    let mut found: Vec<u64> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter_map(|n| n.strip_prefix(name).map(str::to_string))
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|s| s.parse().ok())
        .collect();
    found.sort_unstable();
    found
}
