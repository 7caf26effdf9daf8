use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for one of the fixed interview stages.
///
/// Discriminants are the catalog order, which is also the wire representation used by the
/// scheduling endpoint (`1` = HR through `5` = Offer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Hr = 1,
    Cultural = 2,
    Technical = 3,
    Final = 4,
    Offer = 5,
}

impl StageId {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Hr,
            Self::Cultural,
            Self::Technical,
            Self::Final,
            Self::Offer,
        ]
    }

    pub const fn order(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Hr => "HR Interview",
            Self::Cultural => "Cultural Fit Interview",
            Self::Technical => "Technical Interview",
            Self::Final => "Final Interview",
            Self::Offer => "Offer",
        }
    }

    pub const fn from_order(order: u8) -> Option<Self> {
        match order {
            1 => Some(Self::Hr),
            2 => Some(Self::Cultural),
            3 => Some(Self::Technical),
            4 => Some(Self::Final),
            5 => Some(Self::Offer),
            _ => None,
        }
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Hr => Some(Self::Cultural),
            Self::Cultural => Some(Self::Technical),
            Self::Technical => Some(Self::Final),
            Self::Final => Some(Self::Offer),
            Self::Offer => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Offer)
    }

    /// Number of live interviews a single applicant may hold for this stage.
    pub const fn attempt_limit(self) -> u8 {
        match self {
            Self::Final => 2,
            _ => 1,
        }
    }

    /// Technical rounds must be run by an interviewer from the job's function.
    pub const fn requires_function_match(self) -> bool {
        matches!(self, Self::Technical)
    }

    pub fn stage(self) -> Stage {
        Stage {
            id: self,
            order: self.order(),
            name: self.label(),
        }
    }
}

impl PartialOrd for StageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StageId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order().cmp(&other.order())
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Catalog entry describing a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub id: StageId,
    pub order: u8,
    pub name: &'static str,
}

/// The complete, ordered stage list.
pub fn stages() -> [Stage; 5] {
    StageId::ordered().map(StageId::stage)
}
