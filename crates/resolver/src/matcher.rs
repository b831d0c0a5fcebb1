//! The evidence stages of the cascade: everything that places a
//! municipality from the zone source itself, before the geographic fallback.
//!
//! Stages run in a fixed order and the first one producing an unambiguous
//! zone wins. An ambiguous stage never guesses; it hands over to the next.

use std::collections::BTreeSet;

use crate::config::{ResolverParams, StaticTables};
use crate::index::{ListedName, SourceIndex};
use crate::model::{MethodTag, Municipality, Resolution, ZoneLabel};
use crate::normalize::{normalize, tokens};
use crate::province::aliases;

/// Generic place-name particles that say nothing about which municipality
/// a token belongs to. Only words at least `token_min_len` long matter.
const STOP_WORDS: &[&str] = &[
    "santo", "santa", "monte", "monti", "montagna", "valle", "valli", "vallo",
    "della", "delle", "dello", "degli", "terme", "marina", "castel", "castello",
    "borgo", "porto", "ponte", "torre", "villa", "piano", "fiume", "bagni",
    "superiore", "inferiore", "sopra", "sotto", "nuovo", "nuova", "vecchio",
    "vecchia",
];

/// Result of the pair lookup across the alias scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    /// No pair key exists for any alias code.
    Missing,
    Unique(ZoneLabel),
    /// Pair keys exist but disagree.
    Ambiguous(BTreeSet<ZoneLabel>),
}

pub struct Matcher<'a> {
    index: &'a SourceIndex,
    tables: &'a StaticTables,
    params: &'a ResolverParams,
}

impl<'a> Matcher<'a> {
    pub fn new(index: &'a SourceIndex, tables: &'a StaticTables, params: &'a ResolverParams) -> Self {
        Self { index, tables, params }
    }

    /// Run stages 1-5. `None` means the municipality is left for the
    /// geographic fallback.
    pub fn resolve(&self, municipality: &Municipality) -> Option<Resolution> {
        if let Some(zone) = self
            .tables
            .manual_override(&municipality.name, &municipality.province_code)
        {
            return Some(self.fixed(zone, MethodTag::ManualOverride));
        }

        let normalized = normalize(&municipality.name);
        let scope = aliases(self.tables, &municipality.province_code);

        match self.pair_match(&normalized, &scope) {
            PairOutcome::Unique(zone) => return Some(self.fixed(zone, MethodTag::Pair)),
            PairOutcome::Missing => {
                if let Some(zone) = self.unique_name(&normalized) {
                    return Some(self.fixed(zone, MethodTag::NameUnique));
                }
            }
            PairOutcome::Ambiguous(zones) => {
                log::debug!(
                    "{} ({}): pair keys disagree on {:?}",
                    municipality.name,
                    municipality.province_code,
                    zones
                );
            }
        }

        if let Some((zone, score)) = self.fuzzy_in_scope(&normalized, &scope) {
            return Some(Resolution::new(zone, MethodTag::FuzzyProv, score));
        }

        if let Some(zone) = self.token_vote(&normalized, &scope) {
            return Some(self.fixed(zone, MethodTag::TokenVote));
        }

        log::debug!(
            "{} ({}): no evidence in zone source",
            municipality.name,
            municipality.province_code
        );
        None
    }

    fn fixed(&self, zone: ZoneLabel, method: MethodTag) -> Resolution {
        Resolution::new(zone, method, self.params.fixed_confidence(method))
    }

    /// Union of the pair-index zone sets over every alias code.
    pub fn pair_match(&self, normalized: &str, scope: &[String]) -> PairOutcome {
        let mut found = false;
        let mut zones = BTreeSet::new();
        for code in scope {
            if let Some(set) = self.index.pair_zones(normalized, code) {
                found = true;
                zones.extend(set.iter().copied());
            }
        }

        if !found {
            return PairOutcome::Missing;
        }
        if zones.len() == 1 {
            if let Some(zone) = zones.iter().next() {
                return PairOutcome::Unique(*zone);
            }
        }
        PairOutcome::Ambiguous(zones)
    }

    /// The name alone, anywhere in the country, maps to a single zone.
    pub fn unique_name(&self, normalized: &str) -> Option<ZoneLabel> {
        match self.index.name_zones(normalized) {
            Some(zones) if zones.len() == 1 => zones.iter().next().copied(),
            _ => None,
        }
    }

    /// Best similarity match inside the alias scope, with its score.
    pub fn fuzzy_in_scope(&self, normalized: &str, scope: &[String]) -> Option<(ZoneLabel, f64)> {
        let scored: Vec<(f64, ZoneLabel)> = self
            .scope_listing(scope)
            .map(|c| (similarity(normalized, &c.normalized), c.zone))
            .collect();
        pick_fuzzy(&scored, self.params)
    }

    /// Unanimous per-token evidence inside the alias scope.
    pub fn token_vote(&self, normalized: &str, scope: &[String]) -> Option<ZoneLabel> {
        let mut seen = BTreeSet::new();
        let mut verdict: Option<ZoneLabel> = None;

        for token in tokens(normalized) {
            if token.len() < self.params.token_min_len
                || STOP_WORDS.contains(&token)
                || !seen.insert(token)
            {
                continue;
            }

            let zones: BTreeSet<ZoneLabel> = self
                .scope_listing(scope)
                .filter(|c| tokens(&c.normalized).any(|t| t == token))
                .map(|c| c.zone)
                .collect();

            // A token whose matches disagree casts no vote.
            if zones.len() != 1 {
                continue;
            }
            let Some(&zone) = zones.iter().next() else { continue };

            match verdict {
                None => verdict = Some(zone),
                Some(current) if current != zone => return None,
                Some(_) => {}
            }
        }

        verdict
    }

    fn scope_listing<'s>(&'s self, scope: &'s [String]) -> impl Iterator<Item = &'s ListedName> + 's {
        scope.iter().flat_map(move |code| self.index.listing(code).iter())
    }
}

/// Symmetric edit-distance ratio in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Accept the top-scoring candidate only if it clears the floor, every
/// candidate tied with it agrees on the zone, and it leads the next
/// distinct score by at least the margin.
pub fn pick_fuzzy(scored: &[(f64, ZoneLabel)], params: &ResolverParams) -> Option<(ZoneLabel, f64)> {
    let eps = params.score_epsilon;
    let kept: Vec<(f64, ZoneLabel)> = scored
        .iter()
        .copied()
        .filter(|(score, _)| *score >= params.fuzzy_min_score)
        .collect();

    let top = kept.iter().map(|(s, _)| *s).fold(f64::NEG_INFINITY, f64::max);
    if !top.is_finite() {
        return None;
    }

    let tied: BTreeSet<ZoneLabel> = kept
        .iter()
        .filter(|(s, _)| (top - s).abs() <= eps)
        .map(|(_, z)| *z)
        .collect();
    if tied.len() != 1 {
        return None;
    }

    let runner_up = kept
        .iter()
        .map(|(s, _)| *s)
        .filter(|s| top - s > eps)
        .fold(f64::NEG_INFINITY, f64::max);
    if runner_up.is_finite() && top - runner_up + eps < params.fuzzy_margin {
        return None;
    }

    tied.iter().next().map(|zone| (*zone, top))
}
