//! Date grouping of waypoints
//!
//! All "which file does this waypoint go to" decisions live here.

use std::collections::BTreeMap;

use crate::models::{GroupLabel, Waypoint, WaypointGroup};

/// Partition waypoints into output groups.
///
/// Without `split` there is a single `Combined` group. With `split` there is
/// one group per date in ascending order, followed by a `NoDate` group when
/// at least one waypoint has no date. Groups keep the input order.
#[must_use]
pub fn group_waypoints(waypoints: &[Waypoint], split: bool) -> Vec<WaypointGroup> {
    if !split {
        return vec![WaypointGroup::new(GroupLabel::Combined, waypoints.to_vec())];
    }

    let mut buckets: BTreeMap<GroupLabel, Vec<Waypoint>> = BTreeMap::new();
    for waypoint in waypoints {
        let label = waypoint.date().map_or(GroupLabel::NoDate, GroupLabel::Date);
        buckets.entry(label).or_default().push(waypoint.clone());
    }

    // GroupLabel orders dates ascending with NoDate after every date.
    buckets
        .into_iter()
        .map(|(label, members)| WaypointGroup::new(label, members))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2023, 6, d)
    }

    fn waypoints() -> Vec<Waypoint> {
        [
            ("Eiffel Tower", day(15)),
            ("Versailles", None),
            ("Sacré-Cœur", day(16)),
            ("Louvre", day(15)),
            ("Giverny", None),
        ]
        .iter()
        .enumerate()
        .map(|(i, (name, date))| {
            let coordinate = Coordinate::new(48.0 + i as f64 / 10.0, 2.0).unwrap();
            Waypoint::new(name, coordinate, *date, i).unwrap()
        })
        .collect()
    }

    #[test]
    fn test_no_split_is_one_combined_group() {
        let groups = group_waypoints(&waypoints(), false);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, GroupLabel::Combined);
        assert_eq!(groups[0].waypoints, waypoints());
    }

    #[test]
    fn test_split_orders_dates_then_no_date() {
        let groups = group_waypoints(&waypoints(), true);
        let labels: Vec<_> = groups.iter().map(|g| g.label).collect();
        assert_eq!(
            labels,
            vec![
                GroupLabel::Date(day(15).unwrap()),
                GroupLabel::Date(day(16).unwrap()),
                GroupLabel::NoDate
            ]
        );
        let first: Vec<_> = groups[0].waypoints.iter().map(|w| w.name()).collect();
        assert_eq!(first, vec!["Eiffel Tower", "Louvre"]);
    }

    #[test]
    fn test_split_groups_are_complete_and_ordered() {
        let all = waypoints();
        let groups = group_waypoints(&all, true);

        let members: Vec<usize> = groups
            .iter()
            .flat_map(|g| g.waypoints.iter().map(Waypoint::source_order))
            .collect();
        let unique: HashSet<usize> = members.iter().copied().collect();
        assert_eq!(members.len(), all.len());
        assert_eq!(unique.len(), all.len());

        for group in &groups {
            assert!(
                group
                    .waypoints
                    .windows(2)
                    .all(|w| w[0].source_order() <= w[1].source_order())
            );
        }
    }

    #[test]
    fn test_no_date_group_only_when_needed() {
        let dated: Vec<Waypoint> = waypoints().into_iter().filter(|w| w.date().is_some()).collect();
        let groups = group_waypoints(&dated, true);
        assert!(groups.iter().all(|g| g.label != GroupLabel::NoDate));
        assert_eq!(groups.len(), 2);
    }
}
