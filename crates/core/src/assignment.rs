//! Outlet assignment over the area→outlet reference table. Pure functions:
//! the caller supplies the reference rows, nothing here touches storage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::outlet::{AreaMapping, Outlet};

/// The single serviced region. Addresses outside it are rejected during the
/// address-collection step.
pub const SERVICED_REGION: &str = "pune";

/// Known sub-areas used when the reference table cannot be read. Several of
/// these (Viman Nagar, Kothrud) do not contain the region name themselves.
pub const FALLBACK_AREAS: &[&str] = &[
    "pune",
    "viman nagar",
    "kothrud",
    "hinjewadi",
    "fc road",
    "camp",
    "aundh",
    "baner",
    "pimple saudagar",
    "wakad",
    "hadapsar",
    "kondhwa",
    "shivajinagar",
    "deccan",
    "karve road",
    "sinhagad road",
    "koregaon park",
    "mg road",
    "sb road",
    "jm road",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutletAssignment {
    pub outlet: Outlet,
    /// Present only when the area-matched outlet was under maintenance and a
    /// substitute was chosen.
    pub note: Option<String>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("no active outlets are available")]
    NoActiveOutlets,
}

/// True when the address names the serviced region or any known sub-area,
/// case-insensitively. The literal "skip" is never a valid address.
pub fn serves_address(address: &str, area_names: &[String]) -> bool {
    let raw = address.trim().to_ascii_lowercase();
    if raw.is_empty() || raw == "skip" {
        return false;
    }
    if raw.contains(SERVICED_REGION) {
        return true;
    }
    if area_names.is_empty() {
        return FALLBACK_AREAS.iter().any(|area| raw.contains(area));
    }
    area_names.iter().any(|area| {
        let area = area.trim().to_ascii_lowercase();
        !area.is_empty() && raw.contains(&area)
    })
}

/// The outlet whose area appears in the address, informational only: shown to
/// the customer during address collection, never used to fix assignment.
pub fn nearby_outlet<'a>(
    address: &str,
    areas: &'a [AreaMapping],
    outlets: &'a [Outlet],
) -> Option<(&'a AreaMapping, &'a Outlet)> {
    let raw = address.trim().to_ascii_lowercase();
    areas.iter().find_map(|mapping| {
        let area = mapping.area_name.trim().to_ascii_lowercase();
        if area.is_empty() || !raw.contains(&area) {
            return None;
        }
        outlets.iter().find(|outlet| outlet.id == mapping.outlet_id).map(|outlet| (mapping, outlet))
    })
}

/// Resolves which outlet serves an address. An area match wins when its outlet
/// is active; a maintenance-flagged match falls back to any active outlet with
/// an explanatory note; no match falls back silently. Zero active outlets is a
/// distinct service-unavailable condition.
pub fn assign_outlet(
    address: &str,
    areas: &[AreaMapping],
    outlets: &[Outlet],
) -> Result<OutletAssignment, AssignmentError> {
    let first_active =
        outlets.iter().find(|outlet| outlet.is_active).ok_or(AssignmentError::NoActiveOutlets)?;

    match nearby_outlet(address, areas, outlets) {
        Some((_, matched)) if matched.is_active => {
            Ok(OutletAssignment { outlet: matched.clone(), note: None })
        }
        Some((mapping, matched)) => Ok(OutletAssignment {
            outlet: first_active.clone(),
            note: Some(format!(
                "{} ({}) is under maintenance, so your order goes to {} instead.",
                matched.name,
                mapping.area_name.trim(),
                first_active.name
            )),
        }),
        None => Ok(OutletAssignment { outlet: first_active.clone(), note: None }),
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::domain::outlet::{AreaMapping, Outlet, OutletId};

    use super::{assign_outlet, nearby_outlet, serves_address, AssignmentError};

    fn outlet(name: &str, active: bool) -> Outlet {
        Outlet { id: OutletId(Uuid::new_v4()), name: name.to_string(), is_active: active }
    }

    fn area(name: &str, outlet: &Outlet) -> AreaMapping {
        AreaMapping { area_name: name.to_string(), outlet_id: outlet.id.clone() }
    }

    #[test]
    fn region_name_alone_is_enough() {
        assert!(serves_address("123 MG Road, Pune 411001", &[]));
        assert!(!serves_address("123 MG Road Mumbai", &["kothrud".to_string()]));
    }

    #[test]
    fn sub_area_matches_without_region_name() {
        let areas = vec!["viman nagar".to_string(), "kothrud".to_string()];
        assert!(serves_address("Flat 4, Viman Nagar", &areas));
        assert!(serves_address("kothrud depot lane", &areas));
    }

    #[test]
    fn skip_is_never_a_valid_address() {
        assert!(!serves_address("skip", &[]));
        assert!(!serves_address("  SKIP  ", &["skip".to_string()]));
        assert!(!serves_address("", &[]));
    }

    #[test]
    fn fallback_area_list_is_used_when_table_is_empty() {
        assert!(serves_address("near Hinjewadi phase 2", &[]));
    }

    #[test]
    fn matched_active_outlet_is_always_chosen() {
        let a = outlet("Outlet Kothrud", true);
        let b = outlet("Outlet Baner", true);
        let areas = vec![area("kothrud", &a), area("baner", &b)];
        let outlets = vec![a.clone(), b];

        let assigned =
            assign_outlet("12 Main St, Kothrud", &areas, &outlets).expect("assignment");
        assert_eq!(assigned.outlet, a);
        assert_eq!(assigned.note, None);
    }

    #[test]
    fn maintenance_match_falls_back_with_a_note() {
        let down = outlet("Outlet Kothrud", false);
        let up = outlet("Outlet Baner", true);
        let areas = vec![area("kothrud", &down)];
        let outlets = vec![down, up.clone()];

        let assigned = assign_outlet("Kothrud, Pune", &areas, &outlets).expect("assignment");
        assert_eq!(assigned.outlet, up);
        let note = assigned.note.expect("maintenance note");
        assert!(note.contains("maintenance"));
        assert!(note.contains("Outlet Baner"));
    }

    #[test]
    fn unmatched_address_falls_back_without_a_note() {
        let up = outlet("Outlet Baner", true);
        let outlets = vec![up.clone()];

        let assigned = assign_outlet("Somewhere in Pune", &[], &outlets).expect("assignment");
        assert_eq!(assigned.outlet, up);
        assert_eq!(assigned.note, None);
    }

    #[test]
    fn zero_active_outlets_is_a_distinct_failure() {
        let down = outlet("Outlet Kothrud", false);
        let outlets = vec![down];

        let error = assign_outlet("Kothrud", &[], &outlets).expect_err("no active outlets");
        assert_eq!(error, AssignmentError::NoActiveOutlets);
    }

    #[test]
    fn nearby_outlet_is_informational() {
        let down = outlet("Outlet Kothrud", false);
        let areas = vec![area("kothrud", &down)];
        let outlets = vec![down.clone()];

        let (mapping, matched) =
            nearby_outlet("Kothrud lane 3", &areas, &outlets).expect("nearby match");
        assert_eq!(mapping.area_name, "kothrud");
        assert_eq!(matched, &down);
    }
}
