//! Preference matching.
//!
//! Candidates are slots overlapping the desired span. Slots sharing a stock
//! id are alternatives for the same time range; exactly one is chosen per
//! stock id, preferring the court names listed in the preference.

use std::collections::BTreeMap;

use crate::domain::{SingleBook, Slot, StockId};

/// Candidates overlapping `preference`, grouped and ordered by stock id.
/// Within a group, slots keep their encounter order.
pub fn candidate_groups<'a>(
    slots: &'a [Slot],
    preference: &SingleBook,
) -> BTreeMap<&'a StockId, Vec<&'a Slot>> {
    let want = preference.span();
    let mut groups: BTreeMap<&StockId, Vec<&Slot>> = BTreeMap::new();
    for slot in slots.iter().filter(|s| want.overlaps(&s.span)) {
        groups.entry(&slot.stock_id).or_default().push(slot);
    }
    groups
}

/// One slot per stock id: the first preferred court name found among the
/// group's candidates, else the first candidate encountered.
pub fn choose_slots<'a>(slots: &'a [Slot], preference: &SingleBook) -> Vec<&'a Slot> {
    candidate_groups(slots, preference)
        .into_values()
        .filter_map(|group| pick(&group, &preference.court_name_preference))
        .collect()
}

fn pick<'a>(group: &[&'a Slot], names: &[String]) -> Option<&'a Slot> {
    names
        .iter()
        .find_map(|name| group.iter().find(|s| &s.court_name == name))
        .or_else(|| group.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::booking::testing::slot;

    fn pref(start: i64, dur: i64, names: &[&str]) -> SingleBook {
        SingleBook {
            start_time_sec: start,
            duration_sec: dur,
            court_name_preference: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn touching_slots_are_not_candidates() {
        let slots = vec![
            slot("s1", "c1", "A1", 0, 3600),
            slot("s2", "c1", "A1", 3600, 7200),
            slot("s3", "c1", "A1", 7200, 10800),
        ];
        let chosen = choose_slots(&slots, &pref(3600, 3600, &[]));
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].stock_id.as_str(), "s2");
    }

    #[test]
    fn partially_overlapping_slots_are_candidates() {
        let slots = vec![slot("s1", "c1", "A1", 3000, 4000)];
        assert_eq!(choose_slots(&slots, &pref(3600, 3600, &[])).len(), 1);
        assert!(choose_slots(&slots, &pref(4000, 60, &[])).is_empty());
    }

    #[test]
    fn first_listed_name_present_wins() {
        let slots = vec![
            slot("s1", "c1", "A1", 0, 3600),
            slot("s1", "c2", "A2", 0, 3600),
            slot("s1", "c3", "A3", 0, 3600),
        ];
        let chosen = choose_slots(&slots, &pref(0, 3600, &["B9", "A3", "A2"]));
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].court_name, "A3");
    }

    #[test]
    fn falls_back_to_first_encountered() {
        let slots = vec![
            slot("s1", "c2", "A2", 0, 3600),
            slot("s1", "c1", "A1", 0, 3600),
        ];
        let chosen = choose_slots(&slots, &pref(0, 3600, &["Z"]));
        assert_eq!(chosen[0].court_name, "A2");
    }

    #[test]
    fn one_slot_per_stock_id() {
        let slots = vec![
            slot("s1", "c1", "A1", 0, 3600),
            slot("s2", "c1", "A1", 3600, 7200),
            slot("s1", "c2", "A2", 0, 3600),
        ];
        let groups = candidate_groups(&slots, &pref(0, 7200, &[]));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&StockId::new("s1")].len(), 2);
        assert_eq!(choose_slots(&slots, &pref(0, 7200, &["A1"])).len(), 2);
    }
}
