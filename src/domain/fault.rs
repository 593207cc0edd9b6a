// Fault events and per-diagnostic aggregation
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

const UNKNOWN_DIAGNOSTIC: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultState {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub code: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultLamps {
    pub amber: bool,
    pub red_stop: bool,
    pub protect: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultEvent {
    pub id: String,
    pub date_time: DateTime<Utc>,
    pub fault_state: FaultState,
    pub diagnostic: Option<DiagnosticRef>,
    pub source_address: Option<i64>,
    pub spn: Option<i64>,
    pub fmi: Option<i64>,
    pub controller: Option<String>,
    pub failure_mode: Option<String>,
    pub dismiss_date_time: Option<DateTime<Utc>>,
    pub dismiss_user: Option<String>,
    pub lamps: FaultLamps,
}

impl FaultEvent {
    /// Grouping key: diagnostic name, then id, then "Unknown"
    pub fn diagnostic_key(&self) -> &str {
        self.diagnostic
            .as_ref()
            .and_then(|d| d.name.as_deref().or(d.id.as_deref()))
            .unwrap_or(UNKNOWN_DIAGNOSTIC)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultGroup {
    pub diagnostic_name: String,
    pub diagnostic_id: Option<String>,
    pub diagnostic_code: Option<i64>,
    pub count: usize,
    pub active_faults: usize,
    pub inactive_faults: usize,
    pub most_recent_date: DateTime<Utc>,
    pub oldest_date: DateTime<Utc>,
    /// Input order, not re-sorted
    pub instances: Vec<FaultEvent>,
}

impl FaultGroup {
    fn start(key: String, event: FaultEvent) -> Self {
        let diagnostic = event.diagnostic.clone().unwrap_or_default();
        let mut group = Self {
            diagnostic_name: key,
            diagnostic_id: diagnostic.id,
            diagnostic_code: diagnostic.code,
            count: 0,
            active_faults: 0,
            inactive_faults: 0,
            most_recent_date: event.date_time,
            oldest_date: event.date_time,
            instances: Vec::new(),
        };
        group.push(event);
        group
    }

    fn push(&mut self, event: FaultEvent) {
        self.count += 1;
        match event.fault_state {
            FaultState::Active => self.active_faults += 1,
            FaultState::Inactive => self.inactive_faults += 1,
        }
        self.most_recent_date = self.most_recent_date.max(event.date_time);
        self.oldest_date = self.oldest_date.min(event.date_time);
        self.instances.push(event);
    }
}

/// Group fault events by diagnostic, most recently active group first.
pub fn group_faults(events: Vec<FaultEvent>) -> Vec<FaultGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<FaultGroup> = Vec::new();

    for event in events {
        let key = event.diagnostic_key().to_string();
        match index.get(&key) {
            Some(&slot) => groups[slot].push(event),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(FaultGroup::start(key, event));
            }
        }
    }

    // Stable, so ties keep first-seen order
    groups.sort_by(|a, b| b.most_recent_date.cmp(&a.most_recent_date));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: &str, day: u32, state: FaultState, name: Option<&str>) -> FaultEvent {
        FaultEvent {
            id: id.to_string(),
            date_time: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            fault_state: state,
            diagnostic: name.map(|n| DiagnosticRef {
                id: Some(format!("Diag{}", n)),
                name: Some(n.to_string()),
                code: Some(110),
            }),
            source_address: None,
            spn: Some(110),
            fmi: Some(0),
            controller: None,
            failure_mode: None,
            dismiss_date_time: None,
            dismiss_user: None,
            lamps: FaultLamps::default(),
        }
    }

    #[test]
    fn test_group_counts_and_order() {
        let events = vec![
            event("f1", 2, FaultState::Active, Some("EngineTemp")),
            event("f2", 5, FaultState::Inactive, Some("EngineTemp")),
            event("f3", 10, FaultState::Active, None),
            event("f4", 3, FaultState::Active, Some("EngineTemp")),
        ];

        let groups = group_faults(events);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].diagnostic_name, "Unknown");
        assert_eq!(groups[0].count, 1);

        let engine = &groups[1];
        assert_eq!(engine.diagnostic_name, "EngineTemp");
        assert_eq!(engine.count, 3);
        assert_eq!(engine.active_faults, 2);
        assert_eq!(engine.inactive_faults, 1);
        assert_eq!(engine.most_recent_date.format("%d").to_string(), "05");
        assert_eq!(engine.oldest_date.format("%d").to_string(), "02");
        assert_eq!(engine.diagnostic_id.as_deref(), Some("DiagEngineTemp"));
    }

    #[test]
    fn test_instances_keep_input_order() {
        let events = vec![
            event("late", 9, FaultState::Active, Some("Oil")),
            event("early", 1, FaultState::Active, Some("Oil")),
        ];
        let groups = group_faults(events);
        let ids: Vec<&str> = groups[0].instances.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["late", "early"]);
    }

    #[test]
    fn test_key_falls_back_to_id() {
        let mut e = event("f1", 1, FaultState::Active, None);
        e.diagnostic = Some(DiagnosticRef {
            id: Some("DiagnosticEngineSpeedId".to_string()),
            name: None,
            code: None,
        });
        assert_eq!(e.diagnostic_key(), "DiagnosticEngineSpeedId");

        e.diagnostic = Some(DiagnosticRef::default());
        assert_eq!(e.diagnostic_key(), "Unknown");
    }

    #[test]
    fn test_flattening_preserves_every_event() {
        let events = vec![
            event("a", 1, FaultState::Active, Some("A")),
            event("b", 2, FaultState::Inactive, Some("B")),
            event("c", 3, FaultState::Active, Some("A")),
            event("d", 4, FaultState::Inactive, None),
            event("e", 5, FaultState::Active, Some("B")),
        ];
        let total = events.len();

        let groups = group_faults(events);
        for group in &groups {
            assert_eq!(group.count, group.instances.len());
            assert_eq!(group.count, group.active_faults + group.inactive_faults);
            assert!(group.instances.iter().all(|e| e.diagnostic_key() == group.diagnostic_name));
        }

        let mut flattened: Vec<String> = groups
            .into_iter()
            .flat_map(|g| g.instances.into_iter().map(|e| e.id))
            .collect();
        flattened.sort();
        assert_eq!(flattened.len(), total);
        assert_eq!(flattened, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_faults(Vec::new()).is_empty());
    }
}
