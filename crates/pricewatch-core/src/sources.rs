use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::records::MISSING;
use crate::ConfigError;

/// A canonical field a source layout can map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Page,
    Name,
    Price,
    Brand,
    Url,
    Offer,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Page,
        Field::Name,
        Field::Price,
        Field::Brand,
        Field::Url,
        Field::Offer,
    ];
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Page => write!(f, "page"),
            Field::Name => write!(f, "name"),
            Field::Price => write!(f, "price"),
            Field::Brand => write!(f, "brand"),
            Field::Url => write!(f, "url"),
            Field::Offer => write!(f, "offer"),
        }
    }
}

/// Zero-based positions of each canonical field within a source's raw record.
///
/// `page` and `price` must always be mapped. The rest are optional; an
/// unmapped field is filled with its sentinel during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPositions {
    pub page: usize,
    pub price: usize,
    #[serde(default)]
    pub name: Option<usize>,
    #[serde(default)]
    pub brand: Option<usize>,
    #[serde(default)]
    pub url: Option<usize>,
    #[serde(default)]
    pub offer: Option<usize>,
}

impl FieldPositions {
    #[must_use]
    pub fn position(&self, field: Field) -> Option<usize> {
        match field {
            Field::Page => Some(self.page),
            Field::Price => Some(self.price),
            Field::Name => self.name,
            Field::Brand => self.brand,
            Field::Url => self.url,
            Field::Offer => self.offer,
        }
    }
}

/// How one retailer lays out its raw records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceLayout {
    /// Stable identifier, e.g. `"globalgolf"`. Written into every record.
    pub id: String,
    pub fields: FieldPositions,
    /// Optional fields that must nonetheless be present for a record to be
    /// kept. `page` and `price` are always required.
    #[serde(default)]
    pub required: Vec<Field>,
    /// Value written into `offer` when the source does not supply one.
    #[serde(default)]
    pub offer_default: Option<String>,
}

impl SourceLayout {
    #[must_use]
    pub fn is_required(&self, field: Field) -> bool {
        matches!(field, Field::Page | Field::Price) || self.required.contains(&field)
    }

    /// Minimum record length that covers every required field.
    #[must_use]
    pub fn min_arity(&self) -> usize {
        Field::ALL
            .iter()
            .filter(|f| self.is_required(**f))
            .filter_map(|f| self.fields.position(*f))
            .max()
            .map_or(0, |p| p + 1)
    }

    #[must_use]
    pub fn offer_default(&self) -> &str {
        self.offer_default.as_deref().unwrap_or(MISSING)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesFile {
    pub sources: Vec<SourceLayout>,
}

impl SourcesFile {
    /// Source ids in configured order. This order is the tie-break for every
    /// cross-source ranking.
    #[must_use]
    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.id.as_str()).collect()
    }

    #[must_use]
    pub fn layout(&self, id: &str) -> Option<&SourceLayout> {
        self.sources.iter().find(|s| s.id == id)
    }
}

/// Load and validate the source layouts from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_sources(&content)
}

/// Parse and validate source layouts from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text does not parse or fails validation.
pub fn parse_sources(content: &str) -> Result<SourcesFile, ConfigError> {
    let sources_file: SourcesFile = serde_yaml::from_str(content)?;
    validate_sources(&sources_file)?;
    Ok(sources_file)
}

fn validate_sources(sources_file: &SourcesFile) -> Result<(), ConfigError> {
    if sources_file.sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one source must be configured".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();

    for source in &sources_file.sources {
        let id = source.id.as_str();
        if id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source id must be non-empty".to_string(),
            ));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(ConfigError::Validation(format!(
                "source id '{id}' must be lowercase ascii letters, digits, '-' or '_'"
            )));
        }

        if !seen_ids.insert(id) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id: '{id}'"
            )));
        }

        let mut seen_positions: HashMap<usize, Field> = HashMap::new();
        for field in Field::ALL {
            let Some(position) = source.fields.position(field) else {
                continue;
            };
            if let Some(other) = seen_positions.insert(position, field) {
                return Err(ConfigError::Validation(format!(
                    "source '{id}' maps both {other} and {field} to position {position}"
                )));
            }
        }

        for field in &source.required {
            if source.fields.position(*field).is_none() {
                return Err(ConfigError::Validation(format!(
                    "source '{id}' requires {field} but does not map a position for it"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
