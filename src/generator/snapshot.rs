//! Content hashes of the destination tree, used to tell re-rendered pages
//! from changed ones.

use jwalk::WalkDir;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::utils::path::{relative_to, to_slash};

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Convert to hex string (for debugging/display).
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Compute blake3 hash of file contents, `None` if unreadable.
pub fn compute_file_hash(path: &Path) -> Option<ContentHash> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return None,
        }
    }

    Some(ContentHash::new(*hasher.finalize().as_bytes()))
}

/// Every file under `destination` as an output page path (`/a/index.html`).
pub fn output_pages(destination: &Path) -> Vec<String> {
    if !destination.is_dir() {
        return Vec::new();
    }
    WalkDir::new(destination)
        .skip_hidden(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| relative_to(&e.path(), destination))
        .map(|rel| format!("/{}", to_slash(&rel)))
        .collect()
}

/// Output page → content hash.
#[derive(Debug, Default, Clone)]
pub struct OutputSnapshot {
    hashes: FxHashMap<String, ContentHash>,
}

impl OutputSnapshot {
    /// Hash every file under `destination` (in parallel).
    pub fn scan(destination: &Path) -> Self {
        let hashes = output_pages(destination)
            .into_par_iter()
            .filter_map(|page| {
                let hash = compute_file_hash(&destination.join(page.trim_start_matches('/')))?;
                Some((page, hash))
            })
            .collect();
        Self { hashes }
    }

    pub fn get(&self, page: &str) -> Option<ContentHash> {
        self.hashes.get(page).copied()
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Whether `page` is present in `self` with content differing from `before`.
    pub fn differs_from(&self, before: &Self, page: &str) -> bool {
        match (self.get(page), before.get(page)) {
            (Some(now), Some(then)) => now != then,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
