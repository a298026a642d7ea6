//! Content hashing for deterministic rendering verification.
//!
//! Produces a SHA-256 hash of surface data so rendered tiles can be compared
//! bit-exactly across runs.

use sha2::{Digest, Sha256};

use crate::frame::FrameBuffer;

/// A content hash digest (SHA-256, 32 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash {
    bytes: [u8; 32],
}

impl ContentHash {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

fn update_surface(hasher: &mut Sha256, surface: &FrameBuffer) {
    // Dimensions are hashed so equal bytes at different sizes differ.
    hasher.update(surface.width.to_le_bytes());
    hasher.update(surface.height.to_le_bytes());
    hasher.update(&surface.data);
}

fn finish(hasher: Sha256) -> ContentHash {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    ContentHash::from_bytes(bytes)
}

/// Compute the content hash of a single surface.
pub fn hash_surface(surface: &FrameBuffer) -> ContentHash {
    let mut hasher = Sha256::new();
    update_surface(&mut hasher, surface);
    finish(hasher)
}

/// Compute the content hash of an ordered sequence of surfaces (e.g. all tiles).
pub fn hash_surfaces<'a>(surfaces: impl IntoIterator<Item = &'a FrameBuffer>) -> ContentHash {
    let mut hasher = Sha256::new();
    let mut count = 0u64;
    for surface in surfaces {
        update_surface(&mut hasher, surface);
        count += 1;
    }
    hasher.update(count.to_le_bytes());
    finish(hasher)
}
