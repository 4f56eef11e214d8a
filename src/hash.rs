//! Content Hasher: BLAKE3 over file bytes, reduced to a 32-bit fingerprint (§4.4).

use std::io::Read;
use std::path::Path;

/// 32-bit reduction of a BLAKE3 digest. Two files with equal fingerprints are treated as
/// identical for cache purposes; collision is tolerated at project scale.
pub type Fingerprint = u32;

/// Sentinel for "file absent at planning time" — compares unequal to every real digest,
/// since BLAKE3's first four bytes being exactly zero is astronomically unlikely.
pub const MISSING: Fingerprint = 0;

const CHUNK_SIZE: usize = 64 * 1024;

/// Hashes `path`'s contents in fixed-size chunks and reduces the digest to its leading
/// four bytes, big-endian assembled. Returns [`MISSING`] if the file cannot be read.
pub fn fingerprint(path: &Path) -> Fingerprint {
    let Ok(mut f) = std::fs::File::open(path) else {
        return MISSING;
    };
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        match f.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buf[..n]);
            }
            Err(_) => return MISSING,
        }
    }
    reduce(hasher.finalize().as_bytes())
}

fn reduce(digest: &[u8; 32]) -> Fingerprint {
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Fingerprints every file, in order, for writing the hash cache after a build.
pub fn fingerprint_all(files: &[crate::source::SourceFile]) -> Vec<Fingerprint> {
    files.iter().map(|f| fingerprint(&f.path)).collect()
}
