//! CSV loaders for the primary registry and the zone source.
//!
//! Callers read the files; these functions take the text so they stay easy
//! to drive from tests.

use std::collections::HashMap;

use crate::config::ZoneSourceConfig;
use crate::error::ResolveError;
use crate::model::{Coordinates, Municipality, ZoneSourceRecord};

const REGISTRY: &str = "registry";
const CATASTALI: &str = "catastali";
const POPULATION: &str = "population";
const ZONES: &str = "zones";

/// Zero-pad an ISTAT municipality code to six digits. Some exports strip
/// the leading zeros.
pub fn pad_istat(value: &str) -> String {
    let s = value.trim();
    if s.is_empty() {
        return String::new();
    }
    format!("{s:0>6}")
}

struct Table {
    headers: Vec<String>,
    records: Vec<csv::StringRecord>,
}

impl Table {
    fn read(source_name: &str, csv_data: &str, delimiter: u8) -> Result<Self, ResolveError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(csv_data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| csv_err(source_name, e))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| csv_err(source_name, e))?;

        Ok(Self { headers, records })
    }

    fn column(&self, source_name: &str, name: &str) -> Result<usize, ResolveError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ResolveError::MissingColumn {
                source_name: source_name.into(),
                column: name.into(),
            })
    }
}

fn csv_err(source_name: &str, e: csv::Error) -> ResolveError {
    ResolveError::Csv {
        source_name: source_name.into(),
        message: e.to_string(),
    }
}

fn field(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("").trim()
}

/// Zero or unparseable means "no coordinate".
fn parse_coord(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| *v != 0.0 && v.is_finite())
}

/// ISTAT code -> value side table. Rows missing either side are dropped.
fn read_side_table(
    source_name: &str,
    csv_data: &str,
    value_column: &str,
) -> Result<HashMap<String, String>, ResolveError> {
    let table = Table::read(source_name, csv_data, b',')?;
    let istat_idx = table.column(source_name, "pro_com_t")?;
    let value_idx = table.column(source_name, value_column)?;

    Ok(table
        .records
        .iter()
        .filter_map(|r| {
            let istat = pad_istat(field(r, istat_idx));
            let value = field(r, value_idx);
            (!istat.is_empty() && !value.is_empty()).then(|| (istat, value.to_string()))
        })
        .collect())
}

/// Load the primary registry, joining the optional cadastral-code and
/// population tables by ISTAT code. Rows without ISTAT code, name or
/// province code are skipped.
pub fn load_registry(
    main_csv: &str,
    catastali_csv: Option<&str>,
    population_csv: Option<&str>,
) -> Result<Vec<Municipality>, ResolveError> {
    let catastali = match catastali_csv {
        Some(data) => read_side_table(CATASTALI, data, "codice_catastale")?,
        None => HashMap::new(),
    };
    let population = match population_csv {
        Some(data) => read_side_table(POPULATION, data, "pop_res_21")?,
        None => HashMap::new(),
    };

    let table = Table::read(REGISTRY, main_csv, b',')?;
    let istat_idx = table.column(REGISTRY, "pro_com_t")?;
    let name_idx = table.column(REGISTRY, "comune")?;
    let province_name_idx = table.column(REGISTRY, "den_prov")?;
    let province_idx = table.column(REGISTRY, "sigla")?;
    let region_idx = table.column(REGISTRY, "den_reg")?;
    let lat_idx = table.column(REGISTRY, "lat")?;
    let lng_idx = table.column(REGISTRY, "long")?;

    let mut municipalities = Vec::with_capacity(table.records.len());
    let mut skipped = 0usize;

    for record in &table.records {
        let istat = pad_istat(field(record, istat_idx));
        let name = field(record, name_idx);
        let province_code = field(record, province_idx);

        if istat.is_empty() || name.is_empty() || province_code.is_empty() {
            skipped += 1;
            continue;
        }

        let coordinates = match (
            parse_coord(field(record, lat_idx)),
            parse_coord(field(record, lng_idx)),
        ) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        };

        municipalities.push(Municipality {
            name: name.to_string(),
            province_code: province_code.to_string(),
            province_name: field(record, province_name_idx).to_string(),
            region: field(record, region_idx).to_string(),
            coordinates,
            belfiore: catastali.get(&istat).cloned().unwrap_or_default(),
            population: population.get(&istat).cloned().unwrap_or_default(),
            istat,
        });
    }

    if skipped > 0 {
        log::warn!("registry: skipped {skipped} incomplete rows");
    }
    log::info!("registry: loaded {} municipalities", municipalities.len());

    Ok(municipalities)
}

/// Load the zone source through the configured column mapping. Rows are
/// returned as-is; validation is the index builder's job.
pub fn load_zone_sources(
    csv_data: &str,
    config: &ZoneSourceConfig,
) -> Result<Vec<ZoneSourceRecord>, ResolveError> {
    // Non-ASCII delimiters are rejected by RunConfig::validate.
    let delimiter = u8::try_from(config.delimiter).map_err(|_| {
        ResolveError::ConfigValidation(format!("unsupported delimiter '{}'", config.delimiter))
    })?;

    let table = Table::read(ZONES, csv_data, delimiter)?;
    let cols = &config.columns;
    let name_idx = table.column(ZONES, &cols.name)?;
    let province_idx = table.column(ZONES, &cols.province)?;
    let zone_idx = table.column(ZONES, &cols.zone)?;

    let records: Vec<ZoneSourceRecord> = table
        .records
        .iter()
        .map(|r| ZoneSourceRecord {
            name: field(r, name_idx).to_string(),
            province_code: field(r, province_idx).to_string(),
            zone: field(r, zone_idx).to_string(),
        })
        .collect();

    log::info!("zone source: loaded {} rows", records.len());
    Ok(records)
}
