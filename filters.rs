//! Climb list filtering and logbook session segmentation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grades;
use crate::models::Climb;

/// Optional criteria for narrowing a wall's climb list. Every field defaults
/// to "don't care".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClimbFilters {
    pub search: Option<String>,
    pub grade_min: Option<String>,
    pub grade_max: Option<String>,
    pub established: Option<bool>,
    pub ticked: Option<bool>,
    pub match_allowed: Option<bool>,
}

impl ClimbFilters {
    pub fn matches(&self, climb: &Climb) -> bool {
        if let Some(search) = self.search.as_deref() {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() && !climb.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        // An active grade bound excludes climbs that have no grade at all.
        if self.grade_min.is_some() || self.grade_max.is_some() {
            match climb.difficulty() {
                Some(grade) => {
                    if !grades::grade_in_range(
                        grade,
                        self.grade_min.as_deref(),
                        self.grade_max.as_deref(),
                    ) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        if let Some(established) = self.established {
            if climb.is_established() != established {
                return false;
            }
        }
        if let Some(ticked) = self.ticked {
            if climb.is_ticked() != ticked {
                return false;
            }
        }
        if let Some(match_allowed) = self.match_allowed {
            if climb.match_allowed != match_allowed {
                return false;
            }
        }
        true
    }
}

pub fn filter_climbs<'a>(climbs: &'a [Climb], filters: &ClimbFilters) -> Vec<&'a Climb> {
    climbs.iter().filter(|c| filters.matches(c)).collect()
}

/// One logged send, flattened out of a climb's tick history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub climb_id: Uuid,
    pub climb_name: String,
    pub ticked_at: DateTime<Utc>,
}

/// A cluster of sends close together in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub entries: Vec<LogEntry>,
}

impl Session {
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.entries.first().map(|e| e.ticked_at)
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.entries.last().map(|e| e.ticked_at)
    }

    pub fn send_count(&self) -> usize {
        self.entries.len()
    }
}

/// Every tick of every climb as a flat list of log entries.
pub fn log_entries(climbs: &[Climb]) -> Vec<LogEntry> {
    climbs
        .iter()
        .flat_map(|climb| {
            climb.tick_dates().iter().map(|ticked_at| LogEntry {
                climb_id: climb.id,
                climb_name: climb.name.clone(),
                ticked_at: *ticked_at,
            })
        })
        .collect()
}

/// Clusters log entries into sessions, reported most-recent-first.
///
/// Entries are walked in ascending time order; a session collects every
/// tick within `max_gap` of its opening tick, and the first tick past that
/// window opens the next session.
pub fn segment_sessions(mut entries: Vec<LogEntry>, max_gap: Duration) -> Vec<Session> {
    entries.sort_by_key(|e| e.ticked_at);

    let mut sessions: Vec<Session> = Vec::new();
    for entry in entries {
        let append = sessions
            .last()
            .and_then(|s| s.entries.first())
            .map(|first| entry.ticked_at - first.ticked_at <= max_gap)
            .unwrap_or(false);
        if append {
            if let Some(session) = sessions.last_mut() {
                session.entries.push(entry);
            }
        } else {
            sessions.push(Session {
                entries: vec![entry],
            });
        }
    }

    sessions.reverse();
    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ticked_climb(name: &str, grade: Option<&str>, hours: &[i64]) -> Climb {
        let mut climb = Climb::new(name);
        for &h in hours {
            let at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap() + Duration::hours(h);
            climb
                .record_tick(at, grade.map(|g| g.to_string()), None)
                .unwrap();
        }
        climb
    }

    fn entry(hours: i64) -> LogEntry {
        LogEntry {
            climb_id: Uuid::new_v4(),
            climb_name: "any".to_string(),
            ticked_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap() + Duration::hours(hours),
        }
    }

    #[test]
    fn grade_bound_excludes_ungraded_climbs() {
        let graded = ticked_climb("Slab", Some("V4"), &[0]);
        let ungraded = Climb::new("Project");
        let filters = ClimbFilters {
            grade_min: Some("V3".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&graded));
        assert!(!filters.matches(&ungraded));
    }

    #[test]
    fn grade_range_is_inclusive() {
        let climb = ticked_climb("Slab", Some("V5"), &[0]);
        let filters = ClimbFilters {
            grade_min: Some("V5".to_string()),
            grade_max: Some("V5".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&climb));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let climb = Climb::new("Left Arete Direct");
        let filters = ClimbFilters {
            search: Some("arete".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&climb));
        let filters = ClimbFilters {
            search: Some("roof".to_string()),
            ..Default::default()
        };
        assert!(!filters.matches(&climb));
    }

    #[test]
    fn ticked_and_established_narrow_the_list() {
        let mut established = ticked_climb("Done", Some("V2"), &[0]);
        established.holds_mut().unwrap().push(crate::models::Hold {
            relative_x: 0.5,
            relative_y: 0.5,
            relative_size: 0.08,
            color: crate::models::HoldColor::Red,
        });
        established.establish().unwrap();
        let draft = Climb::new("Idea");
        let climbs = vec![established, draft];

        let filters = ClimbFilters {
            established: Some(true),
            ticked: Some(true),
            ..Default::default()
        };
        let matched = filter_climbs(&climbs, &filters);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "Done");
    }

    #[test]
    fn four_hour_window_splits_sessions() {
        let entries = vec![entry(0), entry(3), entry(5)];
        let sessions = segment_sessions(entries, Duration::hours(4));
        assert_eq!(sessions.len(), 2);
        // Most recent first: the lone tick five hours in leads.
        assert_eq!(sessions[0].send_count(), 1);
        assert_eq!(sessions[1].send_count(), 2);
        assert!(sessions[0].started_at() > sessions[1].ended_at());
    }

    #[test]
    fn unsorted_entries_are_ordered_before_clustering() {
        let entries = vec![entry(5), entry(0), entry(3)];
        let sessions = segment_sessions(entries, Duration::hours(4));
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[1].send_count(), 2);
    }

    #[test]
    fn no_entries_means_no_sessions() {
        let sessions = segment_sessions(Vec::new(), Duration::hours(4));
        assert!(sessions.is_empty());
    }

    #[test]
    fn log_entries_flatten_repeat_sends() {
        let climbs = vec![
            ticked_climb("A", None, &[0, 1]),
            ticked_climb("B", None, &[2]),
        ];
        let entries = log_entries(&climbs);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries.iter().filter(|e| e.climb_name == "A").count(),
            2
        );
    }
}
