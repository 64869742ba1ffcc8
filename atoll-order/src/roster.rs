use atoll_core::booking::{Passenger, PassengerType};
use atoll_shared::pii::Masked;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{BookingFormat, PassengerCounts};

/// Single editable field on a roster entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PassengerField {
    Name,
    Passport,
    Email,
    Phone,
    CountryCode,
    #[serde(rename = "type")]
    Type,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("Maximum {max} passengers allowed")]
    MaximumPassengers { max: usize },

    #[error("The primary passenger cannot be removed")]
    PrimaryNotRemovable,

    #[error("Unknown passenger: {0}")]
    UnknownPassenger(u32),

    #[error("Invalid passenger type: {0}")]
    InvalidPassengerType(String),

    #[error("Please fill in all required fields for the primary passenger")]
    PrimaryContactIncomplete,

    #[error("Please fill in name and passport for passenger {position}")]
    PassengerIncomplete { position: usize },
}

impl RosterError {
    pub fn code(&self) -> &'static str {
        match self {
            RosterError::MaximumPassengers { .. } => "maximum_passengers",
            RosterError::PrimaryNotRemovable => "primary_not_removable",
            RosterError::UnknownPassenger(_) => "unknown_passenger",
            RosterError::InvalidPassengerType(_) => "invalid_passenger_type",
            RosterError::PrimaryContactIncomplete => "primary_contact_incomplete",
            RosterError::PassengerIncomplete { .. } => "passenger_incomplete",
        }
    }
}

/// Ordered passenger list. Position 0 is the primary passenger and is always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassengerRoster {
    passengers: Vec<Passenger>,
    capacity: usize,
}

impl PassengerRoster {
    pub fn new(capacity: usize) -> Self {
        Self {
            passengers: vec![Passenger::blank(1, PassengerType::Adult)],
            capacity: capacity.max(1),
        }
    }

    pub fn for_format(format: BookingFormat) -> Self {
        Self::new(format.max_passengers())
    }

    pub fn passengers(&self) -> &[Passenger] {
        &self.passengers
    }

    pub fn primary(&self) -> &Passenger {
        &self.passengers[0]
    }

    pub fn len(&self) -> usize {
        self.passengers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passengers.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn next_id(&self) -> u32 {
        self.passengers.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    /// Appends a blank adult. The roster is left untouched when already full.
    pub fn add(&mut self) -> Result<u32, RosterError> {
        if self.passengers.len() >= self.capacity {
            return Err(RosterError::MaximumPassengers { max: self.capacity });
        }
        let id = self.next_id();
        self.passengers.push(Passenger::blank(id, PassengerType::Adult));
        Ok(id)
    }

    pub fn remove(&mut self, id: u32) -> Result<(), RosterError> {
        let position = self
            .passengers
            .iter()
            .position(|p| p.id == id)
            .ok_or(RosterError::UnknownPassenger(id))?;
        if position == 0 {
            return Err(RosterError::PrimaryNotRemovable);
        }
        self.passengers.remove(position);
        Ok(())
    }

    pub fn update(&mut self, id: u32, field: PassengerField, value: &str) -> Result<(), RosterError> {
        // Parse before borrowing so a bad type leaves the entry unchanged.
        let parsed_type = match field {
            PassengerField::Type => Some(
                PassengerType::from_str(value)
                    .map_err(|_| RosterError::InvalidPassengerType(value.to_string()))?,
            ),
            _ => None,
        };

        let passenger = self
            .passengers
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RosterError::UnknownPassenger(id))?;

        let value = value.to_string();
        match field {
            PassengerField::Name => passenger.name = value,
            PassengerField::Passport => passenger.passport = Masked::new(value),
            PassengerField::Email => passenger.email = Masked::new(value),
            PassengerField::Phone => passenger.phone = Masked::new(value),
            PassengerField::CountryCode => passenger.country_code = value,
            PassengerField::Type => {
                if let Some(t) = parsed_type {
                    passenger.passenger_type = t;
                }
            }
        }
        Ok(())
    }

    /// Required-field gate run when the passenger form is submitted.
    pub fn validate(&self) -> Result<(), RosterError> {
        let primary = self.primary();
        if primary.name.trim().is_empty()
            || primary.email.is_blank()
            || primary.phone.is_blank()
            || primary.passport.is_blank()
        {
            return Err(RosterError::PrimaryContactIncomplete);
        }

        for (index, passenger) in self.passengers.iter().enumerate() {
            if passenger.name.trim().is_empty() || passenger.passport.is_blank() {
                return Err(RosterError::PassengerIncomplete { position: index + 1 });
            }
        }
        Ok(())
    }

    /// Grows or shrinks the roster to match the selected seat counts.
    ///
    /// Existing entries keep their position and details; types are reassigned
    /// so adults come first, then children, then seniors.
    pub fn resize_to(&mut self, counts: &PassengerCounts) {
        let target = (counts.total() as usize).clamp(1, self.capacity);

        self.passengers.truncate(target);
        while self.passengers.len() < target {
            let id = self.next_id();
            self.passengers.push(Passenger::blank(id, PassengerType::Adult));
        }

        let adults = counts.adults as usize;
        let children = counts.children as usize;
        for (index, passenger) in self.passengers.iter_mut().enumerate() {
            passenger.passenger_type = if index < adults {
                PassengerType::Adult
            } else if index < adults + children {
                PassengerType::Child
            } else if index < counts.total() as usize {
                PassengerType::Senior
            } else {
                PassengerType::Adult
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(roster: &mut PassengerRoster, id: u32, name: &str) {
        roster.update(id, PassengerField::Name, name).unwrap();
        roster.update(id, PassengerField::Passport, "P1234567").unwrap();
    }

    #[test]
    fn test_add_until_full_is_rejected_without_mutation() {
        let mut roster = PassengerRoster::for_format(BookingFormat::Activity);
        for _ in 1..10 {
            roster.add().unwrap();
        }
        assert_eq!(roster.len(), 10);

        let before = roster.clone();
        assert_eq!(roster.add(), Err(RosterError::MaximumPassengers { max: 10 }));
        assert_eq!(roster, before);
    }

    #[test]
    fn test_ids_are_not_reused_after_removal() {
        let mut roster = PassengerRoster::new(15);
        let second = roster.add().unwrap();
        let third = roster.add().unwrap();
        assert_eq!((second, third), (2, 3));

        roster.remove(second).unwrap();
        assert_eq!(roster.add().unwrap(), 4);
    }

    #[test]
    fn test_primary_cannot_be_removed() {
        let mut roster = PassengerRoster::new(15);
        roster.add().unwrap();
        assert_eq!(roster.remove(1), Err(RosterError::PrimaryNotRemovable));
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut roster = PassengerRoster::new(15);
        for _ in 0..3 {
            roster.add().unwrap();
        }
        roster.remove(3).unwrap();
        let ids: Vec<u32> = roster.passengers().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert_eq!(roster.remove(3), Err(RosterError::UnknownPassenger(3)));
    }

    #[test]
    fn test_update_replaces_single_field() {
        let mut roster = PassengerRoster::new(15);
        roster.add().unwrap();
        roster.update(2, PassengerField::Name, "Aisha").unwrap();
        roster.update(2, PassengerField::Type, "Child").unwrap();

        let second = &roster.passengers()[1];
        assert_eq!(second.name, "Aisha");
        assert_eq!(second.passenger_type, PassengerType::Child);
        assert!(second.passport.is_blank());

        assert_eq!(
            roster.update(2, PassengerField::Type, "infant"),
            Err(RosterError::InvalidPassengerType("infant".to_string()))
        );
        assert_eq!(roster.passengers()[1].passenger_type, PassengerType::Child);
    }

    #[test]
    fn test_validate_requires_primary_contact() {
        let mut roster = PassengerRoster::new(15);
        filled(&mut roster, 1, "Ahmed");
        assert_eq!(roster.validate(), Err(RosterError::PrimaryContactIncomplete));

        roster.update(1, PassengerField::Email, "ahmed@example.com").unwrap();
        roster.update(1, PassengerField::Phone, "7771234").unwrap();
        assert_eq!(roster.validate(), Ok(()));
    }

    #[test]
    fn test_validate_requires_name_and_passport_for_everyone() {
        let mut roster = PassengerRoster::new(15);
        filled(&mut roster, 1, "Ahmed");
        roster.update(1, PassengerField::Email, "ahmed@example.com").unwrap();
        roster.update(1, PassengerField::Phone, "7771234").unwrap();
        let id = roster.add().unwrap();
        roster.update(id, PassengerField::Name, "Mariyam").unwrap();

        assert_eq!(
            roster.validate(),
            Err(RosterError::PassengerIncomplete { position: 2 })
        );
        roster.update(id, PassengerField::Passport, "Q7654321").unwrap();
        assert_eq!(roster.validate(), Ok(()));
    }

    #[test]
    fn test_resize_keeps_entries_and_assigns_types() {
        let mut roster = PassengerRoster::new(15);
        filled(&mut roster, 1, "Ahmed");
        roster.resize_to(&PassengerCounts { adults: 1, children: 1, seniors: 1 });

        assert_eq!(roster.len(), 3);
        assert_eq!(roster.primary().name, "Ahmed");
        let types: Vec<PassengerType> =
            roster.passengers().iter().map(|p| p.passenger_type).collect();
        assert_eq!(
            types,
            vec![PassengerType::Adult, PassengerType::Child, PassengerType::Senior]
        );

        roster.resize_to(&PassengerCounts { adults: 0, children: 0, seniors: 0 });
        assert_eq!(roster.len(), 1);
    }
}
