use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x8b5ad4a0c7d8e9f1;

/// Deterministic hasher for recording fingerprints.
///
/// Floats are hashed by bit pattern, so `0.0` and `-0.0` fingerprint differently.
pub(crate) struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    pub(crate) fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    pub(crate) fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    pub(crate) fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    pub(crate) fn write_point(&mut self, p: kurbo::Point) {
        self.write_f64(p.x);
        self.write_f64(p.y);
    }

    pub(crate) fn write_rect(&mut self, r: kurbo::Rect) {
        self.write_f64(r.x0);
        self.write_f64(r.y0);
        self.write_f64(r.x1);
        self.write_f64(r.y1);
    }

    pub(crate) fn finish(self) -> u64 {
        self.inner.digest()
    }
}

/// Fold one operation fingerprint into a running modification stamp.
///
/// Order-sensitive: the same operations recorded in a different order give a different stamp.
pub(crate) fn fold_stamp(stamp: u64, op: u64) -> u64 {
    let mut h = StableHasher::new();
    h.write_u64(stamp);
    h.write_u64(op);
    h.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/fingerprint.rs"]
mod tests;
