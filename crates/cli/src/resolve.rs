//! `climazone run` / `climazone validate`: config-driven resolution runs.

use std::path::{Path, PathBuf};

use climazone_resolver::load::{load_registry, load_zone_sources};
use climazone_resolver::model::RunResult;
use climazone_resolver::{ResolveError, ResolveInput, Resolver, RunConfig};

use crate::exit_codes::{EXIT_ERROR, EXIT_INPUT, EXIT_INVALID_CONFIG, EXIT_LOW_CONFIDENCE, EXIT_OUTPUT};
use crate::CliError;

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::new(EXIT_INPUT, format!("cannot read {}: {e}", path.display())))
}

fn load_config(config_path: &Path) -> Result<RunConfig, CliError> {
    RunConfig::from_path(config_path).map_err(|e| match e {
        ResolveError::Io(message) => CliError::new(EXIT_INPUT, message),
        other => CliError::new(EXIT_INVALID_CONFIG, other.to_string())
            .with_hint(format!("check {} against the run config format", config_path.display())),
    })
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "config ok: \"{}\" (registry {}, zones {})",
        config.name, config.registry.file, config.zones.file
    );
    Ok(())
}

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    let input = load_input(&config, &config_path)?;
    let resolver = Resolver::builtin().map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
    let result = climazone_resolver::run(&config.name, &resolver, &input);

    // --output wins over the config
    let cities_path = output_file.or_else(|| {
        config
            .output
            .file
            .as_ref()
            .map(|f| RunConfig::resolve_path(&config_path, f))
    });
    match cities_path {
        Some(path) => {
            let cities_json = serde_json::to_string_pretty(&result.cities)
                .map_err(|e| CliError::new(EXIT_OUTPUT, format!("JSON serialization error: {e}")))?;
            std::fs::write(&path, cities_json).map_err(|e| {
                CliError::new(EXIT_OUTPUT, format!("cannot write {}: {e}", path.display()))
            })?;
            eprintln!("wrote {}", path.display());
        }
        None => log::warn!("no output file configured, cities JSON not written"),
    }

    if json_output {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    print_summary(&result);

    let low = result.summary.low_confidence.len();
    if strict && low > 0 {
        return Err(CliError::new(
            EXIT_LOW_CONFIDENCE,
            format!("{low} low-confidence assignments (--strict)"),
        )
        .with_hint("add manual overrides for these municipalities or fix the zone source"));
    }

    Ok(())
}

fn load_input(config: &RunConfig, config_path: &Path) -> Result<ResolveInput, CliError> {
    let input_err = |e: ResolveError| CliError::new(EXIT_INPUT, e.to_string());
    let read_input = |file: &str| read_file(&RunConfig::resolve_path(config_path, file));
    let read_optional = |file: &Option<String>| file.as_deref().map(read_input).transpose();

    let registry_csv = read_input(&config.registry.file)?;
    let catastali_csv = read_optional(&config.registry.catastali)?;
    let population_csv = read_optional(&config.registry.population)?;
    let municipalities = load_registry(&registry_csv, catastali_csv.as_deref(), population_csv.as_deref())
        .map_err(input_err)?;

    let zones_csv = read_input(&config.zones.file)?;
    let sources = load_zone_sources(&zones_csv, &config.zones).map_err(input_err)?;

    Ok(ResolveInput { municipalities, sources })
}

/// Human summary to stderr.
fn print_summary(result: &RunResult) {
    let s = &result.summary;
    let counts: Vec<String> = s
        .method_counts
        .iter()
        .map(|(method, count)| format!("{method} {count}"))
        .collect();
    eprintln!("resolved {} municipalities: {}", s.total, counts.join(", "));

    if s.low_confidence.is_empty() {
        return;
    }
    eprintln!("low confidence ({}):", s.low_confidence.len());
    for entry in &s.low_confidence {
        eprintln!(
            "  {} ({}) -> {} [{:.2}]",
            entry.name, entry.province_code, entry.zone, entry.confidence
        );
    }
}
