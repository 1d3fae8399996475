use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A timed location on the course. `order` is the position along the route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AidStation {
    pub id: String,
    pub name: String,
    pub order: u32,
}

impl AidStation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order,
        }
    }

    fn matches(&self, key: &str) -> bool {
        self.id.eq_ignore_ascii_case(key) || self.name.eq_ignore_ascii_case(key)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CourseError {
    #[error("station id '{0}' is listed more than once")]
    DuplicateId(String),
    #[error("station order {0} is used by more than one station")]
    DuplicateOrder(u32),
}

/// Ordered station list for one race year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Course {
    stations: Vec<AidStation>,
}

impl Course {
    pub fn new(mut stations: Vec<AidStation>) -> Result<Self, CourseError> {
        let mut ids = HashSet::new();
        let mut orders = HashSet::new();
        for station in &stations {
            if !ids.insert(station.id.to_ascii_lowercase()) {
                return Err(CourseError::DuplicateId(station.id.clone()));
            }
            if !orders.insert(station.order) {
                return Err(CourseError::DuplicateOrder(station.order));
            }
        }
        stations.sort_by_key(|s| s.order);
        Ok(Self { stations })
    }

    /// Resolves a raw station cell by id first, then by display name.
    pub fn lookup(&self, key: &str) -> Option<&AidStation> {
        let key = key.trim();
        self.stations
            .iter()
            .find(|s| s.id.eq_ignore_ascii_case(key))
            .or_else(|| self.stations.iter().find(|s| s.matches(key)))
    }

    pub fn stations(&self) -> &[AidStation] {
        &self.stations
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Resolves a raw station cell to its id and course position.
    ///
    /// Without reference data the position is taken from the trailing number of
    /// the identifier (`AS5` is fifth), which is how the timing exports key
    /// their stations.
    pub fn resolve(&self, key: &str) -> Option<(String, u32)> {
        if self.stations.is_empty() {
            let key = key.trim();
            return trailing_number(key).map(|order| (key.to_ascii_uppercase(), order));
        }
        self.lookup(key).map(|s| (s.id.clone(), s.order))
    }
}

fn trailing_number(value: &str) -> Option<u32> {
    let digits = value.len() - value.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    value[value.len() - digits..].parse().ok()
}
