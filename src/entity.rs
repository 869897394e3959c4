//! Core record types for the discovery pipeline, plus seed-list loading
//!
//! Supports:
//! - CSV seed files with a header row (`name`, `state`, `category`, `distance`,
//!   optional `county`)
//! - JSON seed files with an array of entity objects
//! - Error resilience is deliberately NOT applied here: a malformed seed
//!   record is a fatal input error, unlike network failures during discovery

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Category of an entity targeted for contact discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Government,
    RetirementCommunity,
    Hospital,
    ChamberOfCommerce,
}

impl EntityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Government => "government",
            EntityCategory::RetirementCommunity => "retirement_community",
            EntityCategory::Hospital => "hospital",
            EntityCategory::ChamberOfCommerce => "chamber_of_commerce",
        }
    }

    /// Human-readable label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            EntityCategory::Government => "Government",
            EntityCategory::RetirementCommunity => "Retirement Community",
            EntityCategory::Hospital => "Hospital",
            EntityCategory::ChamberOfCommerce => "Chamber of Commerce",
        }
    }
}

impl std::fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "government" => Ok(EntityCategory::Government),
            "retirement_community" => Ok(EntityCategory::RetirementCommunity),
            "hospital" => Ok(EntityCategory::Hospital),
            "chamber_of_commerce" => Ok(EntityCategory::ChamberOfCommerce),
            other => Err(format!(
                "Unknown category '{}' (expected government, retirement_community, hospital, or chamber_of_commerce)",
                other
            )),
        }
    }
}

/// An organization or department targeted for contact discovery.
/// Immutable once loaded from the seed list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity name, e.g. "Frederick County"
    pub name: String,
    /// Home county, when the entity itself is not a county
    #[serde(default)]
    pub county: Option<String>,
    /// Two-letter state abbreviation
    pub state: String,
    /// Entity category (drives URL patterns, keywords, and search terms)
    pub category: EntityCategory,
    /// Road distance in miles from the base point
    pub distance: f64,
}

impl Entity {
    /// Stable identity used to key checkpoint records
    pub fn id(&self) -> String {
        format!("{}|{}", self.name.to_lowercase(), self.state.to_lowercase())
    }

    /// Jurisdiction string for reports, e.g. "Frederick County, MD"
    pub fn jurisdiction(&self) -> String {
        match &self.county {
            Some(county) => format!("{}, {}", county, self.state),
            None => format!("{}, {}", self.name, self.state),
        }
    }
}

/// An email address found on a specific page.
/// Deduplication key is the whole record: (email, source page).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtractedEmail {
    pub email: String,
    pub source_url: String,
}

/// A (name, title) pair found near each other in page text.
/// Deduplication key is the whole record: (name, title, source page).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtractedContact {
    pub name: String,
    /// The matched title keyword, e.g. "Director"
    pub title: String,
    pub source_url: String,
}

/// How much the pipeline discovered for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Site resolved and at least one email or contact extracted
    Found,
    /// Site resolved but nothing extracted from any page
    Partial,
    /// No candidate URL resolved to a site
    Unresolved,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Found => "found",
            ResolutionStatus::Partial => "partial",
            ResolutionStatus::Unresolved => "unresolved",
        }
    }
}

impl std::fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accumulated output for one entity. Built incrementally by the pipeline,
/// finalized once candidates and discovered links are exhausted.
///
/// BTreeSets keep email/contact ordering deterministic so reprocessing the
/// same entity against the same responses yields an identical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResult {
    pub entity: Entity,
    /// The one accepted site URL (first successful probe wins)
    pub site_url: Option<String>,
    /// Department pages fetched successfully, in discovery order
    pub department_pages: Vec<String>,
    pub emails: BTreeSet<ExtractedEmail>,
    pub contacts: BTreeSet<ExtractedContact>,
    pub status: ResolutionStatus,
}

impl EntityResult {
    /// An empty result for an entity whose every candidate failed
    pub fn unresolved(entity: Entity) -> Self {
        Self {
            entity,
            site_url: None,
            department_pages: Vec::new(),
            emails: BTreeSet::new(),
            contacts: BTreeSet::new(),
            status: ResolutionStatus::Unresolved,
        }
    }
}

/// A record directing a human to complete research the automated pipeline
/// could not. Created at aggregation time, consumed by the report writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualResearchItem {
    pub entity_name: String,
    pub state: String,
    pub category: EntityCategory,
    /// Suggested search-engine query, e.g. "Frederick County MD official government website"
    pub search_query: String,
}

/// Input format for seed files
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeedFormat {
    Csv,
    Json,
}

impl SeedFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("csv") => Some(Self::Csv),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse the entity seed list from a file (auto-detects format from extension)
pub fn parse_seed_file(path: &Path) -> Result<Vec<Entity>> {
    let format = SeedFormat::from_path(path).context(format!(
        "Cannot determine seed format from file extension. Expected .csv or .json: {}",
        path.display()
    ))?;

    let content = fs::read_to_string(path)
        .context(format!("Failed to read seed file: {}", path.display()))?;

    match format {
        SeedFormat::Csv => parse_csv_seeds(&content),
        SeedFormat::Json => parse_json_seeds(&content),
    }
}

/// Parse entities from CSV content with a header row.
/// Required columns: name, state, category, distance. Optional: county.
pub fn parse_csv_seeds(content: &str) -> Result<Vec<Entity>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers().context("Failed to read CSV header row")?;
    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let name_idx = col("name").context("Seed CSV is missing a 'name' column")?;
    let state_idx = col("state").context("Seed CSV is missing a 'state' column")?;
    let category_idx = col("category").context("Seed CSV is missing a 'category' column")?;
    let distance_idx = col("distance").context("Seed CSV is missing a 'distance' column")?;
    let county_idx = col("county");

    let mut entities = Vec::new();
    for (row_num, record) in reader.records().enumerate() {
        let record = record.context(format!("Failed to parse CSV row {}", row_num + 2))?;

        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();

        let name = field(name_idx);
        if name.is_empty() {
            bail!("Seed CSV row {}: entity name is empty", row_num + 2);
        }
        let state = field(state_idx).to_uppercase();
        if state.is_empty() {
            bail!("Seed CSV row {} ({}): state is empty", row_num + 2, name);
        }
        let category: EntityCategory = field(category_idx)
            .parse()
            .map_err(|e| anyhow::anyhow!("Seed CSV row {} ({}): {}", row_num + 2, name, e))?;
        let distance: f64 = field(distance_idx).parse().context(format!(
            "Seed CSV row {} ({}): distance is not a number",
            row_num + 2,
            name
        ))?;
        let county = county_idx
            .map(|idx| field(idx))
            .filter(|c| !c.is_empty());

        entities.push(Entity {
            name,
            county,
            state,
            category,
            distance,
        });
    }

    Ok(entities)
}

/// Parse entities from a JSON array of entity objects
pub fn parse_json_seeds(content: &str) -> Result<Vec<Entity>> {
    let entities: Vec<Entity> =
        serde_json::from_str(content).context("Failed to parse JSON seed file")?;

    for entity in &entities {
        if entity.name.is_empty() {
            bail!("JSON seed file contains an entity with an empty name");
        }
        if entity.state.is_empty() {
            bail!("JSON seed entity '{}' has an empty state", entity.name);
        }
    }

    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for cat in [
            EntityCategory::Government,
            EntityCategory::RetirementCommunity,
            EntityCategory::Hospital,
            EntityCategory::ChamberOfCommerce,
        ] {
            let parsed: EntityCategory = cat.as_str().parse().unwrap();
            assert_eq!(parsed, cat);
        }
        assert!("parks".parse::<EntityCategory>().is_err());
    }

    #[test]
    fn test_entity_id_is_case_insensitive() {
        let a = Entity {
            name: "Frederick County".to_string(),
            county: None,
            state: "MD".to_string(),
            category: EntityCategory::Government,
            distance: 0.0,
        };
        let b = Entity {
            name: "frederick county".to_string(),
            county: None,
            state: "md".to_string(),
            ..a.clone()
        };
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_jurisdiction_prefers_county() {
        let hospital = Entity {
            name: "Meritus Medical Center".to_string(),
            county: Some("Washington County".to_string()),
            state: "MD".to_string(),
            category: EntityCategory::Hospital,
            distance: 25.0,
        };
        assert_eq!(hospital.jurisdiction(), "Washington County, MD");

        let county = Entity {
            name: "Frederick County".to_string(),
            county: None,
            state: "MD".to_string(),
            category: EntityCategory::Government,
            distance: 0.0,
        };
        assert_eq!(county.jurisdiction(), "Frederick County, MD");
    }

    #[test]
    fn test_parse_csv_seeds() {
        let csv = "name,state,category,distance,county\n\
                   Frederick County,MD,government,0,\n\
                   Meritus Medical Center,md,hospital,25,Washington County\n";
        let entities = parse_csv_seeds(csv).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].name, "Frederick County");
        assert_eq!(entities[0].category, EntityCategory::Government);
        assert_eq!(entities[0].county, None);
        assert_eq!(entities[1].state, "MD");
        assert_eq!(entities[1].county.as_deref(), Some("Washington County"));
    }

    #[test]
    fn test_parse_csv_rejects_bad_category() {
        let csv = "name,state,category,distance\nSomewhere,MD,theme_park,10\n";
        let err = parse_csv_seeds(csv).unwrap_err();
        assert!(err.to_string().contains("Unknown category"));
    }

    #[test]
    fn test_parse_csv_rejects_bad_distance() {
        let csv = "name,state,category,distance\nSomewhere,MD,government,near\n";
        assert!(parse_csv_seeds(csv).is_err());
    }

    #[test]
    fn test_parse_json_seeds() {
        let json = r#"[
            {"name": "Frederick County", "state": "MD", "category": "government", "distance": 0},
            {"name": "Adams County", "state": "PA", "category": "government", "distance": 35}
        ]"#;
        let entities = parse_json_seeds(json).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].state, "PA");
    }

    #[test]
    fn test_parse_json_rejects_empty_name() {
        let json = r#"[{"name": "", "state": "MD", "category": "government", "distance": 0}]"#;
        assert!(parse_json_seeds(json).is_err());
    }

    #[test]
    fn test_seed_format_detection() {
        assert_eq!(
            SeedFormat::from_path(Path::new("seeds.csv")),
            Some(SeedFormat::Csv)
        );
        assert_eq!(
            SeedFormat::from_path(Path::new("seeds.JSON")),
            Some(SeedFormat::Json)
        );
        assert_eq!(SeedFormat::from_path(Path::new("seeds.xlsx")), None);
    }
}
