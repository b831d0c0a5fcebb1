use crate::cities::build_cities;
use crate::config::{ResolverParams, StaticTables};
use crate::error::ResolveError;
use crate::index::SourceIndex;
use crate::knn::{geographic_fallback, ReferencePoint};
use crate::matcher::Matcher;
use crate::model::{
    MethodTag, Municipality, Resolution, ResolvedMunicipality, RunMeta, RunResult,
    ZoneSourceRecord,
};
use crate::province::aliases;
use crate::report::summarize;

/// Pre-loaded records for one run.
pub struct ResolveInput {
    pub municipalities: Vec<Municipality>,
    pub sources: Vec<ZoneSourceRecord>,
}

/// The cascade with its static data injected at construction.
#[derive(Debug, Clone)]
pub struct Resolver {
    tables: StaticTables,
    params: ResolverParams,
}

impl Resolver {
    pub fn new(tables: StaticTables, params: ResolverParams) -> Self {
        Self { tables, params }
    }

    /// Resolver over the shipped tables and production parameters.
    pub fn builtin() -> Result<Self, ResolveError> {
        Ok(Self::new(StaticTables::builtin()?, ResolverParams::default()))
    }

    pub fn tables(&self) -> &StaticTables {
        &self.tables
    }

    pub fn params(&self) -> &ResolverParams {
        &self.params
    }

    /// One resolution per municipality, in input order.
    ///
    /// Two passes: the evidence stages run for everyone first, so the KNN
    /// reference population is complete before any fallback reads it.
    pub fn resolve_all(
        &self,
        municipalities: &[Municipality],
        sources: &[ZoneSourceRecord],
    ) -> Vec<Resolution> {
        let index = SourceIndex::build(sources);
        let matcher = Matcher::new(&index, &self.tables, &self.params);

        let first_pass: Vec<Option<Resolution>> =
            municipalities.iter().map(|m| matcher.resolve(m)).collect();

        let population: Vec<ReferencePoint> = municipalities
            .iter()
            .zip(&first_pass)
            .filter_map(|(m, r)| {
                let r = r.as_ref()?;
                let coordinates = m.coordinates?;
                Some(ReferencePoint {
                    province_code: m.province_code.trim().to_ascii_uppercase(),
                    coordinates,
                    zone: r.zone,
                })
            })
            .collect();

        log::info!(
            "evidence stages placed {} of {} municipalities ({} with coordinates)",
            first_pass.iter().filter(|r| r.is_some()).count(),
            municipalities.len(),
            population.len(),
        );

        municipalities
            .iter()
            .zip(first_pass)
            .map(|(m, resolved)| {
                resolved.unwrap_or_else(|| {
                    let scope = aliases(&self.tables, &m.province_code);
                    let r = geographic_fallback(m.coordinates, &scope, &population, &self.params);
                    if r.method == MethodTag::FallbackE {
                        log::warn!(
                            "{} ({}): no evidence and no neighbours, assigned catch-all zone {}",
                            m.name,
                            m.province_code,
                            r.zone
                        );
                    }
                    r
                })
            })
            .collect()
    }
}

/// Indices of `municipalities` in output order: name case-insensitive,
/// then province code uppercase.
pub fn output_order(municipalities: &[Municipality]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..municipalities.len()).collect();
    order.sort_by_cached_key(|&i| {
        let m = &municipalities[i];
        (m.name.to_lowercase(), m.province_code.trim().to_ascii_uppercase())
    });
    order
}

/// Resolve every municipality and assemble the report.
pub fn run(config_name: &str, resolver: &Resolver, input: &ResolveInput) -> RunResult {
    log::info!(
        "resolving {} municipalities against {} zone-source rows",
        input.municipalities.len(),
        input.sources.len()
    );

    let resolutions = resolver.resolve_all(&input.municipalities, &input.sources);

    let municipalities: Vec<ResolvedMunicipality> = output_order(&input.municipalities)
        .into_iter()
        .map(|i| {
            let m = &input.municipalities[i];
            let r = resolutions[i];
            ResolvedMunicipality {
                name: m.name.clone(),
                province_code: m.province_code.trim().to_ascii_uppercase(),
                zone: r.zone,
                method: r.method,
                confidence: r.confidence,
            }
        })
        .collect();

    let summary = summarize(&municipalities, resolver.params());
    let cities = build_cities(&input.municipalities, &resolutions);

    RunResult {
        meta: RunMeta {
            config_name: config_name.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        municipalities,
        cities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ZoneLabel;

    fn resolver() -> Resolver {
        Resolver::new(StaticTables::default(), ResolverParams::default())
    }

    #[test]
    fn every_municipality_gets_a_zone() {
        let municipalities = vec![
            Municipality::new("Milano", "MI").with_coordinates(45.46, 9.19),
            Municipality::new("Nowhere", "ZZ"),
            Municipality::new("Somewhere", "MI").with_coordinates(45.47, 9.20),
        ];
        let sources = vec![ZoneSourceRecord::new("Milano", "MI", "E")];
        let out = resolver().resolve_all(&municipalities, &sources);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].method, MethodTag::Pair);
        assert_eq!(out[1].method, MethodTag::FallbackE);
        assert_eq!(out[1].zone, ZoneLabel::E);
        assert_eq!(out[2].method, MethodTag::Knn);
        assert_eq!(out[2].zone, ZoneLabel::E);
    }

    #[test]
    fn knn_reference_ignores_fallback_results() {
        // "Lost" sits next to "Found" but has no evidence; "Orphan" must
        // still be placed from "Found", not from "Lost".
        let municipalities = vec![
            Municipality::new("Found", "LE").with_coordinates(40.0, 18.0),
            Municipality::new("Lost", "LE").with_coordinates(40.01, 18.0),
            Municipality::new("Orphan", "LE").with_coordinates(40.02, 18.0),
        ];
        let sources = vec![ZoneSourceRecord::new("Found", "LE", "C")];
        let out = resolver().resolve_all(&municipalities, &sources);
        assert_eq!(out[1].zone, ZoneLabel::C);
        assert_eq!(out[2].zone, ZoneLabel::C);
        assert_eq!(out[2].confidence, 1.0);
    }

    #[test]
    fn output_is_sorted_case_insensitively() {
        let municipalities = vec![
            Municipality::new("bari", "BA"),
            Municipality::new("Ancona", "AN"),
            Municipality::new("Castro", "le"),
            Municipality::new("Castro", "BG"),
        ];
        let order = output_order(&municipalities);
        let names: Vec<(&str, &str)> = order
            .iter()
            .map(|&i| (municipalities[i].name.as_str(), municipalities[i].province_code.as_str()))
            .collect();
        assert_eq!(names, vec![("Ancona", "AN"), ("bari", "BA"), ("Castro", "BG"), ("Castro", "le")]);
    }

    #[test]
    fn run_reports_per_method_counts() {
        let input = ResolveInput {
            municipalities: vec![
                Municipality::new("Milano", "MI"),
                Municipality::new("Nowhere", "ZZ"),
            ],
            sources: vec![ZoneSourceRecord::new("Milano", "MI", "E")],
        };
        let result = run("test", &resolver(), &input);
        assert_eq!(result.meta.config_name, "test");
        assert_eq!(result.summary.total, 2);
        assert_eq!(result.summary.method_counts[&MethodTag::Pair], 1);
        assert_eq!(result.summary.method_counts[&MethodTag::FallbackE], 1);
        assert_eq!(result.summary.low_confidence.len(), 1);
        assert_eq!(result.municipalities[0].name, "Milano");
        assert_eq!(result.cities.len(), 2);
        assert_eq!(result.cities[1].comune, "Nowhere");
    }
}
