use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

/// Normalized species identity: lowercase `genus species`.
///
/// The key is the grouping identity for aggregation, so two records that
/// differ only in casing of their genus/species fields must produce equal
/// keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesKey(String);

impl SpeciesKey {
    pub fn new(genus: &str, species: &str) -> Result<Self, HarvestError> {
        let genus = genus.trim().to_lowercase();
        let species = species.trim().to_lowercase();
        if genus.is_empty() || species.is_empty() {
            return Err(HarvestError::InvalidSpecies(format!(
                "{genus} {species}"
            )));
        }
        Ok(Self(format!("{genus} {species}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn genus(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or("")
    }

    pub fn species(&self) -> &str {
        self.0.split_whitespace().nth(1).unwrap_or("")
    }

    /// Scientific name with the genus capitalized, e.g. `Turdus rufiventris`.
    pub fn display_name(&self) -> String {
        format!("{} {}", capitalize(self.genus()), self.species())
    }

    /// Directory-safe name, e.g. `Turdus_rufiventris`.
    pub fn folder_name(&self) -> String {
        self.display_name().replace(' ', "_").replace('/', "-")
    }
}

impl fmt::Display for SpeciesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SpeciesKey {
    type Err = HarvestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(genus), Some(species), None) => SpeciesKey::new(genus, species),
            _ => Err(HarvestError::InvalidSpecies(value.to_string())),
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Geographic bounds in the order the catalog API expects:
/// `lat_min,lon_min,lat_max,lon_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.lat_min, self.lon_min, self.lat_max, self.lon_max
        )
    }
}

impl FromStr for BoundingBox {
    type Err = HarvestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts = value
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| HarvestError::InvalidBoundingBox(value.to_string()))?;
        let [lat_min, lon_min, lat_max, lon_max] = parts.as_slice() else {
            return Err(HarvestError::InvalidBoundingBox(value.to_string()));
        };
        if !parts.iter().all(|bound| bound.is_finite()) {
            return Err(HarvestError::InvalidBoundingBox(value.to_string()));
        }
        Ok(Self {
            lat_min: *lat_min,
            lon_min: *lon_min,
            lat_max: *lat_max,
            lon_max: *lon_max,
        })
    }
}

/// Query string sent verbatim to the catalog API. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn for_species(key: &SpeciesKey, country: Option<&str>) -> Self {
        let mut parts = vec![
            format!("gen:{}", key.genus()),
            format!("sp:{}", key.species()),
        ];
        if let Some(country) = country {
            parts.push(format!("cnt:{country}"));
        }
        Self(parts.join(" "))
    }

    pub fn for_area(area: &BoundingBox) -> Self {
        Self(format!("box:{area}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
