use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cities::CityRecord;

// ---------------------------------------------------------------------------
// Zone labels
// ---------------------------------------------------------------------------

/// Climate zone per DPR 412/1993, from the mildest (A) to the coldest (F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZoneLabel {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl ZoneLabel {
    pub const ALL: [ZoneLabel; 6] = [Self::A, Self::B, Self::C, Self::D, Self::E, Self::F];

    /// Parse a free-text label. Surrounding whitespace and case are ignored;
    /// anything outside the six letters yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            "E" => Some(Self::E),
            "F" => Some(Self::F),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        }
    }
}

impl fmt::Display for ZoneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A row of the primary registry. Identity is (name, province_code).
#[derive(Debug, Clone, PartialEq)]
pub struct Municipality {
    pub name: String,
    pub province_code: String,
    pub province_name: String,
    pub region: String,
    pub coordinates: Option<Coordinates>,
    /// Six-digit ISTAT code, zero padded.
    pub istat: String,
    pub belfiore: String,
    pub population: String,
}

impl Municipality {
    /// Bare record with just the identity fields, everything else empty.
    pub fn new(name: impl Into<String>, province_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            province_code: province_code.into(),
            province_name: String::new(),
            region: String::new(),
            coordinates: None,
            istat: String::new(),
            belfiore: String::new(),
            population: String::new(),
        }
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.coordinates = Some(Coordinates { lat, lng });
        self
    }
}

/// A raw row of the secondary zone source. Validated by the index builder,
/// not here: the source is noisy and bad rows are dropped there.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSourceRecord {
    pub name: String,
    pub province_code: String,
    pub zone: String,
}

impl ZoneSourceRecord {
    pub fn new(name: impl Into<String>, province_code: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            province_code: province_code.into(),
            zone: zone.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Which cascade stage produced a zone. Declaration order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MethodTag {
    #[serde(rename = "manual_override")]
    ManualOverride,
    #[serde(rename = "pair")]
    Pair,
    #[serde(rename = "name_unique")]
    NameUnique,
    #[serde(rename = "fuzzy_prov")]
    FuzzyProv,
    #[serde(rename = "token_vote")]
    TokenVote,
    #[serde(rename = "knn")]
    Knn,
    #[serde(rename = "fallback_E")]
    FallbackE,
}

impl MethodTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManualOverride => "manual_override",
            Self::Pair => "pair",
            Self::NameUnique => "name_unique",
            Self::FuzzyProv => "fuzzy_prov",
            Self::TokenVote => "token_vote",
            Self::Knn => "knn",
            Self::FallbackE => "fallback_E",
        }
    }

    /// Geographic stages, as opposed to evidence from the zone source.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Knn | Self::FallbackE)
    }
}

impl fmt::Display for MethodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolution {
    pub zone: ZoneLabel,
    pub method: MethodTag,
    pub confidence: f64,
}

impl Resolution {
    pub fn new(zone: ZoneLabel, method: MethodTag, confidence: f64) -> Self {
        Self { zone, method, confidence }
    }
}

/// One municipality with its final resolution, in output order.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedMunicipality {
    pub name: String,
    pub province_code: String,
    pub zone: ZoneLabel,
    pub method: MethodTag,
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// Fallback assignment an operator should look at.
#[derive(Debug, Clone, Serialize)]
pub struct LowConfidenceEntry {
    pub name: String,
    pub province_code: String,
    pub confidence: f64,
    pub zone: ZoneLabel,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolutionSummary {
    pub total: usize,
    pub method_counts: BTreeMap<MethodTag, usize>,
    pub low_confidence: Vec<LowConfidenceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub summary: ResolutionSummary,
    pub municipalities: Vec<ResolvedMunicipality>,
    /// Written to its own file, not part of the report.
    #[serde(skip)]
    pub cities: Vec<CityRecord>,
}
