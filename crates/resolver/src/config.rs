use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ResolveError;
use crate::model::{MethodTag, ZoneLabel};

const BUILTIN_TABLES: &str = include_str!("../data/static_tables.toml");

// ---------------------------------------------------------------------------
// Static tables
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawTables {
    #[serde(default)]
    island_group: Vec<String>,
    #[serde(default)]
    province_splits: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    manual_overrides: Vec<RawOverride>,
}

#[derive(Debug, Deserialize)]
struct RawOverride {
    name: String,
    province: String,
    zone: String,
}

/// Hand-maintained data the cascade consults: manual overrides, historical
/// province splits and the island province group.
///
/// Province codes are stored uppercase; the island group is kept sorted.
#[derive(Debug, Clone, Default)]
pub struct StaticTables {
    overrides: HashMap<(String, String), ZoneLabel>,
    province_splits: BTreeMap<String, Vec<String>>,
    island_group: Vec<String>,
}

impl StaticTables {
    /// Tables shipped with the crate.
    pub fn builtin() -> Result<Self, ResolveError> {
        Self::from_toml(BUILTIN_TABLES)
    }

    pub fn from_toml(input: &str) -> Result<Self, ResolveError> {
        let raw: RawTables =
            toml::from_str(input).map_err(|e| ResolveError::ConfigParse(e.to_string()))?;

        let mut tables = StaticTables::default();
        for code in raw.island_group {
            tables = tables.with_island_code(&validated_code(&code, "island_group")?);
        }
        for (code, parents) in raw.province_splits {
            let code = validated_code(&code, "province_splits")?;
            let parents = parents
                .iter()
                .map(|p| validated_code(p, "province_splits"))
                .collect::<Result<Vec<_>, _>>()?;
            tables = tables.with_split(&code, parents.iter().map(String::as_str));
        }
        for entry in raw.manual_overrides {
            let province = validated_code(&entry.province, "manual_overrides")?;
            if entry.name.trim().is_empty() {
                return Err(ResolveError::ConfigValidation(format!(
                    "manual_overrides: empty name for province {province}"
                )));
            }
            let zone = ZoneLabel::parse(&entry.zone).ok_or_else(|| {
                ResolveError::ConfigValidation(format!(
                    "manual_overrides: '{}' ({province}) has invalid zone '{}'",
                    entry.name, entry.zone
                ))
            })?;
            tables = tables.with_override(&entry.name, &province, zone);
        }
        Ok(tables)
    }

    pub fn with_override(mut self, name: &str, province: &str, zone: ZoneLabel) -> Self {
        self.overrides
            .insert((name.trim().to_string(), province.trim().to_ascii_uppercase()), zone);
        self
    }

    pub fn with_split<'a>(mut self, code: &str, parents: impl IntoIterator<Item = &'a str>) -> Self {
        let entry = self
            .province_splits
            .entry(code.trim().to_ascii_uppercase())
            .or_default();
        for parent in parents {
            let parent = parent.trim().to_ascii_uppercase();
            if !entry.contains(&parent) {
                entry.push(parent);
            }
        }
        self
    }

    pub fn with_island_code(mut self, code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        if let Err(pos) = self.island_group.binary_search(&code) {
            self.island_group.insert(pos, code);
        }
        self
    }

    /// Override for an exact (display name, province code) pair.
    pub fn manual_override(&self, name: &str, province: &str) -> Option<ZoneLabel> {
        self.overrides
            .get(&(name.trim().to_string(), province.trim().to_ascii_uppercase()))
            .copied()
    }

    pub fn split_parents(&self, code: &str) -> &[String] {
        self.province_splits.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn island_group(&self) -> &[String] {
        &self.island_group
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

fn validated_code(code: &str, table: &str) -> Result<String, ResolveError> {
    let code = code.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(ResolveError::ConfigValidation(format!(
            "{table}: empty province code"
        )));
    }
    Ok(code)
}

// ---------------------------------------------------------------------------
// Resolver parameters
// ---------------------------------------------------------------------------

/// Tuned constants of the cascade. `Default` holds the production values;
/// changing them changes output, so they are not exposed in run configs.
#[derive(Debug, Clone)]
pub struct ResolverParams {
    /// Minimum similarity for a fuzzy candidate to be considered.
    pub fuzzy_min_score: f64,
    /// Required lead of the best fuzzy score over the next distinct one.
    pub fuzzy_margin: f64,
    /// Scores closer than this are the same score.
    pub score_epsilon: f64,
    /// Shortest token that can vote.
    pub token_min_len: usize,
    pub knn_neighbors: usize,
    /// Widen the KNN search scope while it holds fewer candidates.
    pub knn_min_candidates: usize,
    pub knn_distance_floor_km: f64,
    pub earth_radius_km: f64,
    /// Fallback assignments below this are reported for review.
    pub low_confidence: f64,
    /// Catch-all when nothing else can place a municipality.
    pub fallback_zone: ZoneLabel,
    pub manual_override_confidence: f64,
    pub pair_confidence: f64,
    pub name_unique_confidence: f64,
    pub token_vote_confidence: f64,
}

impl Default for ResolverParams {
    fn default() -> Self {
        Self {
            fuzzy_min_score: 0.75,
            fuzzy_margin: 0.06,
            score_epsilon: 1e-9,
            token_min_len: 5,
            knn_neighbors: 15,
            knn_min_candidates: 8,
            knn_distance_floor_km: 0.5,
            earth_radius_km: 6371.0,
            low_confidence: 0.65,
            fallback_zone: ZoneLabel::E,
            manual_override_confidence: 1.0,
            pair_confidence: 1.0,
            name_unique_confidence: 0.9,
            token_vote_confidence: 0.7,
        }
    }
}

impl ResolverParams {
    /// Fixed confidence of the stages that do not compute one.
    pub fn fixed_confidence(&self, method: MethodTag) -> f64 {
        match method {
            MethodTag::ManualOverride => self.manual_override_confidence,
            MethodTag::Pair => self.pair_confidence,
            MethodTag::NameUnique => self.name_unique_confidence,
            MethodTag::TokenVote => self.token_vote_confidence,
            MethodTag::FuzzyProv | MethodTag::Knn | MethodTag::FallbackE => 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Run config
// ---------------------------------------------------------------------------

/// One resolution run: where the two input datasets live and where the
/// cities JSON goes. Paths are relative to the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub name: String,
    pub registry: RegistryConfig,
    pub zones: ZoneSourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub file: String,
    /// ISTAT code -> cadastral (Belfiore) code.
    #[serde(default)]
    pub catastali: Option<String>,
    /// ISTAT code -> resident population.
    #[serde(default)]
    pub population: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSourceConfig {
    pub file: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub columns: ZoneColumns,
}

fn default_delimiter() -> char {
    ','
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneColumns {
    #[serde(default = "default_name_column")]
    pub name: String,
    #[serde(default = "default_province_column")]
    pub province: String,
    #[serde(default = "default_zone_column")]
    pub zone: String,
}

impl Default for ZoneColumns {
    fn default() -> Self {
        Self {
            name: default_name_column(),
            province: default_province_column(),
            zone: default_zone_column(),
        }
    }
}

fn default_name_column() -> String {
    "comune".into()
}

fn default_province_column() -> String {
    "provincia".into()
}

fn default_zone_column() -> String {
    "zona".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub file: Option<String>,
}

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ResolveError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ResolveError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn from_path(path: &Path) -> Result<Self, ResolveError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ResolveError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    /// Input and output paths are relative to the config file's directory.
    pub fn resolve_path(config_path: &Path, file: &str) -> PathBuf {
        config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(file)
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.name.trim().is_empty() {
            return Err(ResolveError::ConfigValidation("name must not be empty".into()));
        }

        let mut paths = vec![("registry.file", Some(&self.registry.file)), ("zones.file", Some(&self.zones.file))];
        paths.push(("registry.catastali", self.registry.catastali.as_ref()));
        paths.push(("registry.population", self.registry.population.as_ref()));
        paths.push(("output.file", self.output.file.as_ref()));
        for (key, path) in paths {
            if let Some(path) = path {
                if path.trim().is_empty() {
                    return Err(ResolveError::ConfigValidation(format!("{key} must not be empty")));
                }
            }
        }

        if !self.zones.delimiter.is_ascii() {
            return Err(ResolveError::ConfigValidation(format!(
                "zones.delimiter must be an ASCII character, got '{}'",
                self.zones.delimiter
            )));
        }

        let cols = &self.zones.columns;
        if cols.name == cols.province || cols.name == cols.zone || cols.province == cols.zone {
            return Err(ResolveError::ConfigValidation(format!(
                "zones.columns must be distinct (name='{}', province='{}', zone='{}')",
                cols.name, cols.province, cols.zone
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
