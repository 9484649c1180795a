//! Splitting a selection into reservable units.
//!
//! The portal only accepts a short contiguous run of slots on one court per
//! reserve call. Chosen slots are grouped by court, ordered by start time and
//! cut into runs bounded both by gap and by size.

use std::collections::BTreeMap;

use crate::config::BookingConfig;
use crate::domain::{BookingUnit, CourtId, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    pub max_unit_size: usize,
    /// Seconds; a gap equal to this is still contiguous.
    pub max_contiguous_gap: i64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_unit_size: 2,
            max_contiguous_gap: 60,
        }
    }
}

impl From<&BookingConfig> for SplitConfig {
    fn from(config: &BookingConfig) -> Self {
        Self {
            max_unit_size: config.max_unit_size.max(1),
            max_contiguous_gap: config.max_contiguous_gap_secs,
        }
    }
}

pub fn split_court_ranges(chosen: &[&Slot], config: &SplitConfig) -> Vec<BookingUnit> {
    let max_size = config.max_unit_size.max(1);

    let mut by_court: BTreeMap<&CourtId, Vec<&Slot>> = BTreeMap::new();
    for &slot in chosen {
        by_court.entry(&slot.court_id).or_default().push(slot);
    }

    let mut units = Vec::new();
    for mut run_source in by_court.into_values() {
        run_source.sort_by_key(|s| s.span.start);

        let mut run: Vec<&Slot> = Vec::with_capacity(max_size);
        for slot in run_source {
            let gap_too_wide = run
                .last()
                .is_some_and(|prev| slot.span.start - prev.span.end > config.max_contiguous_gap);
            if gap_too_wide || run.len() == max_size {
                units.push(to_unit(&run));
                run.clear();
            }
            run.push(slot);
        }
        if !run.is_empty() {
            units.push(to_unit(&run));
        }
    }
    units
}

fn to_unit(run: &[&Slot]) -> BookingUnit {
    run.iter()
        .map(|s| (s.stock_id.clone(), s.court_id.clone()))
        .collect()
}
