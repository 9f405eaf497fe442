use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Per-entity version selection for one resolution.
///
/// Entities without a pin use their latest stable version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionPins(BTreeMap<String, u64>);

impl VersionPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(&mut self, entity: impl Into<String>, id: u64) -> &mut Self {
        self.0.insert(entity.into(), id);
        self
    }

    pub fn with(mut self, entity: impl Into<String>, id: u64) -> Self {
        self.pin(entity, id);
        self
    }

    pub fn get(&self, entity: &str) -> Option<u64> {
        self.0.get(entity).copied()
    }

    pub fn remove(&mut self, entity: &str) -> Option<u64> {
        self.0.remove(entity)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Add pins parsed from `name=id` strings.
    pub fn extend_parsed<'a>(&mut self, items: impl IntoIterator<Item = &'a str>) -> crate::Result<()> {
        for text in items {
            let (name, id) = parse_pin(text)?;
            self.0.insert(name, id);
        }
        Ok(())
    }
}

impl FromIterator<(String, u64)> for VersionPins {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for VersionPins {
    type Err = Error;

    /// Parse a comma-separated list of `name=id` pins.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut pins = Self::new();
        pins.extend_parsed(s.split(',').map(str::trim).filter(|p| !p.is_empty()))?;
        Ok(pins)
    }
}

fn parse_pin(text: &str) -> crate::Result<(String, u64)> {
    let invalid = || Error::InvalidPin {
        pin: text.to_string(),
    };
    // Entity names may contain '=', the id never does.
    let (name, id) = text.rsplit_once('=').ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }
    let id = id.trim().parse::<u64>().map_err(|_| invalid())?;
    Ok((name.to_string(), id))
}
