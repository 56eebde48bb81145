/*!
 * Region Profiling
 * Cumulative, peak and current counters for regions, pages and words
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// One profiled quantity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUnit {
    /// Sum of all increments
    pub total: u64,
    /// High-water mark of `current`
    pub max: u64,
    pub current: u64,
}

impl ProfileUnit {
    pub fn update(&mut self, delta: i64) {
        if delta >= 0 {
            let delta = delta as u64;
            self.current += delta;
            self.total += delta;
        } else {
            self.current = self.current.saturating_sub(delta.unsigned_abs());
        }
        self.max = self.max.max(self.current);
    }
}

/// Read-only profiling dump
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub regions: ProfileUnit,
    pub pages: ProfileUnit,
    pub words: ProfileUnit,
    /// Pages obtained from the system allocator
    pub pages_requested: u64,
    /// Largest word count reached by any destroyed region
    pub biggest_region_words: u64,
}

impl fmt::Display for ProfileSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_unit(f, "Regions", &self.regions)?;
        writeln!(f, "Biggest region size: {}.", self.biggest_region_words)?;
        write_unit(f, "Words", &self.words)?;
        write_unit(f, "Pages used", &self.pages)?;
        writeln!(f, "Pages requested: {}.", self.pages_requested)
    }
}

fn write_unit(f: &mut fmt::Formatter<'_>, label: &str, unit: &ProfileUnit) -> fmt::Result {
    writeln!(f, "{}:", label)?;
    writeln!(f, "\tTotal: {}.", unit.total)?;
    writeln!(f, "\tMaximum: {}.", unit.max)?;
    writeln!(f, "\tCurrent: {}.", unit.current)
}

/// Counter set updated by the region manager. Every hook is a no-op when
/// the profiler is disabled.
#[derive(Debug, Clone, Default)]
pub struct RegionProfiler {
    enabled: bool,
    data: ProfileSnapshot,
}

impl RegionProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            data: ProfileSnapshot::default(),
        }
    }

    #[inline]
    pub fn region_created(&mut self) {
        if self.enabled {
            self.data.regions.update(1);
        }
    }

    #[inline]
    pub fn page_acquired(&mut self) {
        if self.enabled {
            self.data.pages.update(1);
        }
    }

    #[inline]
    pub fn pages_requested(&mut self, pages: usize) {
        if self.enabled {
            self.data.pages_requested += pages as u64;
        }
    }

    #[inline]
    pub fn words_allocated(&mut self, words: usize) {
        if self.enabled {
            self.data.words.update(words as i64);
        }
    }

    pub fn region_destroyed(&mut self, pages: usize, allocated_words: usize) {
        if !self.enabled {
            return;
        }
        self.data.regions.update(-1);
        self.data.pages.update(-(pages as i64));
        self.data.words.update(-(allocated_words as i64));
        self.data.biggest_region_words = self.data.biggest_region_words.max(allocated_words as u64);
    }

    /// `None` when profiling is disabled
    pub fn snapshot(&self) -> Option<ProfileSnapshot> {
        self.enabled.then(|| self.data.clone())
    }
}
