use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::{ZoneLabel, ZoneSourceRecord};
use crate::normalize::normalize;

/// One zone-source entry as scanned by the fuzzy and token stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedName {
    pub normalized: String,
    pub zone: ZoneLabel,
}

/// Read-only lookup structures over the zone source.
///
/// Zone sets rather than single zones: duplicate rows that disagree must
/// stay visible so the matcher can treat the key as ambiguous.
#[derive(Debug, Default)]
pub struct SourceIndex {
    pairs: HashMap<(String, String), BTreeSet<ZoneLabel>>,
    names: HashMap<String, BTreeSet<ZoneLabel>>,
    by_province: BTreeMap<String, Vec<ListedName>>,
    skipped: usize,
}

impl SourceIndex {
    /// Build the index. Rows lacking a name or province code, or carrying a
    /// label outside A-F, are skipped.
    pub fn build(records: &[ZoneSourceRecord]) -> Self {
        let mut index = SourceIndex::default();

        for record in records {
            let name = normalize(&record.name);
            let province = record.province_code.trim().to_ascii_uppercase();
            let zone = ZoneLabel::parse(&record.zone);

            let zone = match zone {
                Some(zone) if !name.is_empty() && !province.is_empty() => zone,
                _ => {
                    index.skipped += 1;
                    continue;
                }
            };

            index
                .pairs
                .entry((name.clone(), province.clone()))
                .or_default()
                .insert(zone);
            index.names.entry(name.clone()).or_default().insert(zone);
            index
                .by_province
                .entry(province)
                .or_default()
                .push(ListedName { normalized: name, zone });
        }

        log::info!(
            "zone source indexed: {} pairs, {} names, {} provinces ({} rows skipped)",
            index.pairs.len(),
            index.names.len(),
            index.by_province.len(),
            index.skipped,
        );

        index
    }

    pub fn pair_zones(&self, normalized: &str, province: &str) -> Option<&BTreeSet<ZoneLabel>> {
        self.pairs.get(&(normalized.to_string(), province.to_string()))
    }

    pub fn name_zones(&self, normalized: &str) -> Option<&BTreeSet<ZoneLabel>> {
        self.names.get(normalized)
    }

    /// Listing for a province in source order; empty if the province is unknown.
    pub fn listing(&self, province: &str) -> &[ListedName] {
        self.by_province.get(province).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows dropped during construction.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
