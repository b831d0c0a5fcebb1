use std::collections::BTreeMap;

use crate::config::ResolverParams;
use crate::model::{LowConfidenceEntry, MethodTag, ResolutionSummary, ResolvedMunicipality};

const ALL_METHODS: [MethodTag; 7] = [
    MethodTag::ManualOverride,
    MethodTag::Pair,
    MethodTag::NameUnique,
    MethodTag::FuzzyProv,
    MethodTag::TokenVote,
    MethodTag::Knn,
    MethodTag::FallbackE,
];

/// Count resolutions per method and collect the fallback assignments whose
/// confidence is under the review threshold. Observational only.
pub fn summarize(resolved: &[ResolvedMunicipality], params: &ResolverParams) -> ResolutionSummary {
    let mut method_counts: BTreeMap<MethodTag, usize> =
        ALL_METHODS.iter().map(|m| (*m, 0)).collect();
    let mut low_confidence = Vec::new();

    for r in resolved {
        *method_counts.entry(r.method).or_insert(0) += 1;

        if r.method.is_fallback() && r.confidence < params.low_confidence {
            low_confidence.push(LowConfidenceEntry {
                name: r.name.clone(),
                province_code: r.province_code.clone(),
                confidence: r.confidence,
                zone: r.zone,
            });
        }
    }

    ResolutionSummary {
        total: resolved.len(),
        method_counts,
        low_confidence,
    }
}
