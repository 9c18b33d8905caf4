//! Staggered daily refresh schedule.
//!
//! Each region owns one UTC hour per day; regions never refresh
//! concurrently, so each cache slot has at most one writer at a time.

use std::collections::HashMap;

use snowline_core::Region;
use time::{Date, OffsetDateTime};

/// The UTC hour assigned to the region at `index` in schedule order.
pub fn region_hour(index: usize, base_hour: u8, stagger_hours: u8) -> u8 {
    ((base_hour as usize + index * stagger_hours as usize) % 24) as u8
}

/// Tracks which regions have already refreshed on the current UTC day.
pub struct RegionSchedule {
    base_hour: u8,
    stagger_hours: u8,
    last_run: HashMap<Region, Date>,
}

impl RegionSchedule {
    pub fn new(base_hour: u8, stagger_hours: u8) -> Self {
        RegionSchedule {
            base_hour,
            stagger_hours,
            last_run: HashMap::new(),
        }
    }

    /// Regions whose slot has arrived and which have not yet run today.
    pub fn due(&self, now: OffsetDateTime) -> Vec<Region> {
        Region::all()
            .iter()
            .enumerate()
            .filter(|(index, region)| {
                now.hour() == region_hour(*index, self.base_hour, self.stagger_hours)
                    && self.last_run.get(*region) != Some(&now.date())
            })
            .map(|(_, region)| *region)
            .collect()
    }

    pub fn mark_run(&mut self, region: Region, now: OffsetDateTime) {
        self.last_run.insert(region, now.date());
    }
}
