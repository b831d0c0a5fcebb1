//! Geographic fallback: place a municipality from the zones of its nearest
//! already-resolved neighbours.
//!
//! Always terminates with a valid zone. When the neighbours cannot decide,
//! the catch-all zone is assigned with confidence 0.

use std::collections::BTreeMap;

use crate::config::ResolverParams;
use crate::model::{Coordinates, MethodTag, Resolution, ZoneLabel};

/// A municipality resolved by the evidence stages, as a KNN reference point.
#[derive(Debug, Clone)]
pub struct ReferencePoint {
    pub province_code: String,
    pub coordinates: Coordinates,
    pub zone: ZoneLabel,
}

/// Great-circle distance in km.
pub fn haversine_km(a: Coordinates, b: Coordinates, radius_km: f64) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * radius_km * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Resolve `target` from the reference population. `scope` is the
/// municipality's alias scope with its own code first.
pub fn geographic_fallback(
    target: Option<Coordinates>,
    scope: &[String],
    population: &[ReferencePoint],
    params: &ResolverParams,
) -> Resolution {
    target
        .and_then(|coords| nearest_vote(coords, scope, population, params))
        .map(|(zone, confidence)| Resolution::new(zone, MethodTag::Knn, confidence))
        .unwrap_or_else(|| Resolution::new(params.fallback_zone, MethodTag::FallbackE, 0.0))
}

/// Distance-weighted vote of the nearest neighbours. Returns the winning
/// zone and its share of the total weight.
pub fn nearest_vote(
    target: Coordinates,
    scope: &[String],
    population: &[ReferencePoint],
    params: &ResolverParams,
) -> Option<(ZoneLabel, f64)> {
    let candidates = candidate_scope(scope, population, params.knn_min_candidates);

    let mut ranked: Vec<(f64, ZoneLabel)> = candidates
        .iter()
        .map(|p| (haversine_km(target, p.coordinates, params.earth_radius_km), p.zone))
        .filter(|(d, _)| d.is_finite())
        .collect();
    // Stable sort: equidistant points keep population order.
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    ranked.truncate(params.knn_neighbors);

    let mut weights: BTreeMap<ZoneLabel, f64> = BTreeMap::new();
    for (distance, zone) in &ranked {
        *weights.entry(*zone).or_insert(0.0) += 1.0 / distance.max(params.knn_distance_floor_km);
    }

    let total: f64 = weights.values().sum();
    // Ties go to the mildest zone.
    let (zone, best) = weights
        .iter()
        .fold(None, |acc: Option<(ZoneLabel, f64)>, (zone, w)| match acc {
            Some((_, bw)) if bw >= *w => acc,
            _ => Some((*zone, *w)),
        })?;

    let confidence = best / total;
    if !confidence.is_finite() || total <= 0.0 {
        return None;
    }
    Some((zone, confidence))
}

/// Same province; then the alias scope; then everyone, widening while
/// fewer than `min` candidates are in reach.
fn candidate_scope<'p>(scope: &[String], population: &'p [ReferencePoint], min: usize) -> Vec<&'p ReferencePoint> {
    if let Some(own) = scope.first() {
        let same: Vec<&ReferencePoint> = population.iter().filter(|p| &p.province_code == own).collect();
        if same.len() >= min {
            return same;
        }
    }

    let aliased: Vec<&ReferencePoint> = population
        .iter()
        .filter(|p| scope.contains(&p.province_code))
        .collect();
    if aliased.len() >= min {
        return aliased;
    }

    population.iter().collect()
}
