use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutletId(pub Uuid);

/// A physical service location. `is_active` is the maintenance flag: inactive
/// outlets are never assigned and trigger reassignment when matched by area.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outlet {
    pub id: OutletId,
    pub name: String,
    pub is_active: bool,
}

/// Reference row linking a named sub-region to the outlet that serves it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaMapping {
    pub area_name: String,
    pub outlet_id: OutletId,
}
