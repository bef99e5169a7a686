use serde::{Deserialize, Serialize};

use super::geometry::{Opening, RoomDimensions};
use super::scope::DamageObservation;

fn default_room_type() -> String {
    "room".to_string()
}

/// One inspected room as captured in the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub name: String,
    /// Structure the room belongs to; `None` means the main dwelling.
    #[serde(default)]
    pub structure: Option<String>,
    #[serde(default = "default_room_type")]
    pub room_type: String,
    #[serde(default)]
    pub dimensions: Option<RoomDimensions>,
    #[serde(default)]
    pub openings: Vec<Opening>,
    #[serde(default)]
    pub damages: Vec<DamageObservation>,
    /// Age of the finishes in this room, applied to every generated line item.
    #[serde(default)]
    pub age_years: Option<f64>,
}

impl Room {
    pub fn new(room_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            name: name.into(),
            structure: None,
            room_type: default_room_type(),
            dimensions: None,
            openings: Vec::new(),
            damages: Vec::new(),
            age_years: None,
        }
    }

    pub fn of_type(mut self, room_type: impl Into<String>) -> Self {
        self.room_type = room_type.into();
        self
    }

    pub fn in_structure(mut self, structure: impl Into<String>) -> Self {
        self.structure = Some(structure.into());
        self
    }

    pub fn measured(mut self, dimensions: RoomDimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_opening(mut self, opening: Opening) -> Self {
        self.openings.push(opening);
        self
    }

    pub fn with_damage(mut self, damage: DamageObservation) -> Self {
        self.damages.push(damage);
        self
    }

    pub fn aged(mut self, age_years: f64) -> Self {
        self.age_years = Some(age_years);
        self
    }
}
