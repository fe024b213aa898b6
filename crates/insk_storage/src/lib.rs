use std::sync::Arc;

use insk_core::{DocumentIndex, Error, Result};

pub mod backends;

pub use backends::*;

pub const DEFAULT_VECTOR_SIZE: usize = 768;

/// Build a similarity index by backend name.
pub fn create_index(backend: &str) -> Result<Arc<dyn DocumentIndex>> {
    match backend {
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        other => Err(Error::Config(format!("Unknown index backend: {}", other))),
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, na, nb) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f32, 0.0f32, 0.0f32), |(d, aa, bb), (x, y)| {
            (d + (x * y), aa + (x * x), bb + (y * y))
        });

    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{cosine_similarity, create_index};
}
