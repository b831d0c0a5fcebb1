//! The `cities.json` projection consumed by the application.

use serde::Serialize;

use crate::engine::output_order;
use crate::model::{Municipality, Resolution, ZoneLabel};

const COUNTRY: &str = "Italia";
const COUNTRY_CODE: &str = "IT";

/// One entry of `cities.json`. Field names are the application's.
#[derive(Debug, Clone, Serialize)]
pub struct CityRecord {
    pub comune: String,
    pub codice_belfiore: String,
    pub zona_climatica: ZoneLabel,
    /// Not enriched yet.
    pub altitudine: Option<u32>,
    /// Not enriched yet.
    pub gradi_giorno: Option<u32>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub abitanti: String,
    pub provincia: String,
    pub codice_provincia: String,
    pub regione: String,
    pub stato: &'static str,
    pub codice_stato: &'static str,
}

/// Pair each municipality with its resolution, in output order.
/// `resolutions` is aligned with `municipalities`.
pub fn build_cities(municipalities: &[Municipality], resolutions: &[Resolution]) -> Vec<CityRecord> {
    output_order(municipalities)
        .into_iter()
        .filter_map(|i| {
            let m = &municipalities[i];
            let r = resolutions.get(i)?;
            Some(CityRecord {
                comune: m.name.clone(),
                codice_belfiore: m.belfiore.clone(),
                zona_climatica: r.zone,
                altitudine: None,
                gradi_giorno: None,
                lat: m.coordinates.map(|c| c.lat),
                lng: m.coordinates.map(|c| c.lng),
                abitanti: m.population.clone(),
                provincia: m.province_name.clone(),
                codice_provincia: m.province_code.trim().to_ascii_uppercase(),
                regione: m.region.clone(),
                stato: COUNTRY,
                codice_stato: COUNTRY_CODE,
            })
        })
        .collect()
}
