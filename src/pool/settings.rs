use crate::{
    foundation::error::{DrawPoolError, DrawPoolResult},
    render::framebuffer::MAX_TARGET_EDGE,
};

/// Tuning knobs shared by pools.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of recorded objects inspected when looking for a batch to merge into.
    pub merge_search_depth: usize,
    /// Allow merging into an older object when every object after it is disjoint from the new
    /// primitive. When `false` only the newest object is considered.
    pub reorder_disjoint: bool,
    /// Largest edge, in pixels, a framed pool's target may be resized to.
    pub max_target_size: u32,
    /// Smoothing flag for newly created framed pool targets.
    pub default_smooth: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            merge_search_depth: 64,
            reorder_disjoint: true,
            max_target_size: 16_384,
            default_smooth: false,
        }
    }
}

impl PoolSettings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> DrawPoolResult<Self> {
        let settings: Self = serde_json::from_str(s)
            .map_err(|e| DrawPoolError::config(format!("invalid pool settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `DRAWPOOL_MERGE_SEARCH_DEPTH` and `DRAWPOOL_MAX_TARGET_SIZE` when set to positive
    /// integers. Other values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = env_positive::<usize>("DRAWPOOL_MERGE_SEARCH_DEPTH") {
            self.merge_search_depth = n;
        }
        if let Some(n) = env_positive::<u32>("DRAWPOOL_MAX_TARGET_SIZE") {
            self.max_target_size = n.min(MAX_TARGET_EDGE);
        }
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> DrawPoolResult<()> {
        if self.merge_search_depth == 0 {
            return Err(DrawPoolError::config("merge_search_depth must be >= 1"));
        }
        if self.max_target_size == 0 || self.max_target_size > MAX_TARGET_EDGE {
            return Err(DrawPoolError::config(format!(
                "max_target_size must be in 1..={MAX_TARGET_EDGE}"
            )));
        }
        Ok(())
    }
}

fn env_positive<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|n| *n > T::default())
}

#[cfg(test)]
#[path = "../../tests/unit/pool/settings.rs"]
mod tests;
