use teamgrid_core::{GridError, GridResult};
use teamgrid_domain::PersonId;

/// The visible, ordered list of people on the grid. Reordering is local;
/// the order reaches the settings store only on an explicit save.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    people: Vec<PersonId>,
}

impl Roster {
    pub fn new(people: Vec<PersonId>) -> Self {
        Self { people }
    }

    pub fn people(&self) -> &[PersonId] {
        &self.people
    }

    pub fn people_mut(&mut self) -> &mut Vec<PersonId> {
        &mut self.people
    }

    pub fn to_settings_value(&self) -> GridResult<serde_json::Value> {
        serde_json::to_value(&self.people).map_err(|e| GridError::Serialization(e.to_string()))
    }

    pub fn from_settings_value(value: serde_json::Value) -> GridResult<Self> {
        let people = serde_json::from_value(value)
            .map_err(|e| GridError::Serialization(e.to_string()))?;
        Ok(Self { people })
    }
}
