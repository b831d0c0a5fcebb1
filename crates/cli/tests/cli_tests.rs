// Contract tests for the climazone binary: exit codes, stdout/stderr split,
// and the cities JSON written to disk.
//
// Run with: cargo test -p climazone-cli --test cli_tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const REGISTRY: &str = "\
pro_com_t,comune,den_prov,sigla,den_reg,lat,long
015146,Milano,Milano,MI,Lombardia,45.4642,9.1900
108033,Monza,Monza e della Brianza,MB,Lombardia,45.5845,9.2744
015192,San Donato Milanese,Milano,MI,Lombardia,45.4167,9.2667
";

const ZONES: &str = "\
comune,provincia,zona
Milano,MI,E
Monza,MI,E
San Donato,MI,E
";

const CONFIG: &str = r#"
name = "cli test"

[registry]
file = "registry.csv"

[zones]
file = "zones.csv"

[output]
file = "cities.json"
"#;

fn climazone() -> Command {
    Command::new(env!("CARGO_BIN_EXE_climazone"))
}

/// Temp dir holding a run config and its inputs.
fn workspace(registry: &str, zones: &str, config: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("registry.csv"), registry).unwrap();
    std::fs::write(dir.path().join("zones.csv"), zones).unwrap();
    let config_path = dir.path().join("run.toml");
    std::fs::write(&config_path, config).unwrap();
    (dir, config_path)
}

fn run_cmd(args: &[&str], config: &Path) -> Output {
    climazone().args(args).arg(config).output().unwrap()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// ===========================================================================
// run
// ===========================================================================

#[test]
fn run_writes_cities_next_to_config() {
    let (dir, config) = workspace(REGISTRY, ZONES, CONFIG);
    let out = run_cmd(&["run"], &config);

    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(out.stdout.is_empty(), "stdout must stay empty without --json");
    assert!(stderr(&out).contains("resolved 3 municipalities"));

    let cities: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("cities.json")).unwrap()).unwrap();
    let cities = cities.as_array().unwrap();
    assert_eq!(cities.len(), 3);
    assert_eq!(cities[0]["comune"], "Milano");
    assert_eq!(cities[0]["zona_climatica"], "E");
    assert_eq!(cities[0]["codice_stato"], "IT");
    assert_eq!(cities[2]["comune"], "San Donato Milanese");
}

#[test]
fn run_json_prints_one_json_value() {
    let (_dir, config) = workspace(REGISTRY, ZONES, CONFIG);
    let out = run_cmd(&["run", "--json"], &config);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let val: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(val["meta"]["config_name"], "cli test");
    assert_eq!(val["summary"]["total"], 3);
    assert_eq!(val["summary"]["method_counts"]["pair"], 2);
    assert_eq!(val["summary"]["method_counts"]["token_vote"], 1);
    assert_eq!(val["summary"]["method_counts"]["fallback_E"], 0);
    assert!(val.get("cities").is_none());

    let first = &val["municipalities"][0];
    assert_eq!(first["name"], "Milano");
    assert_eq!(first["method"], "pair");
    assert_eq!(first["confidence"], 1.0);
}

#[test]
fn run_output_flag_overrides_config() {
    let (dir, config) = workspace(REGISTRY, ZONES, CONFIG);
    let target = dir.path().join("elsewhere.json");
    let out = climazone()
        .arg("run")
        .arg(&config)
        .arg("--output")
        .arg(&target)
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(target.exists());
    assert!(!dir.path().join("cities.json").exists());
}

#[test]
fn strict_fails_on_catch_all() {
    let registry = format!("{REGISTRY}099999,Isola Perduta,Nessuna,XX,Nessuna,,\n");
    let (_dir, config) = workspace(&registry, ZONES, CONFIG);

    let relaxed = run_cmd(&["run"], &config);
    assert_eq!(relaxed.status.code(), Some(0));
    assert!(stderr(&relaxed).contains("Isola Perduta (XX) -> E [0.00]"));

    let strict = run_cmd(&["run", "--strict"], &config);
    assert_eq!(strict.status.code(), Some(6));
    assert!(stderr(&strict).contains("1 low-confidence assignments"));
}

#[test]
fn strict_passes_when_everything_has_evidence() {
    let (_dir, config) = workspace(REGISTRY, ZONES, CONFIG);
    let out = run_cmd(&["run", "--strict"], &config);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
}

#[test]
fn missing_input_file_exits_4() {
    let (dir, config) = workspace(REGISTRY, ZONES, CONFIG);
    std::fs::remove_file(dir.path().join("zones.csv")).unwrap();
    let out = run_cmd(&["run"], &config);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("zones.csv"));
}

#[test]
fn missing_column_exits_4() {
    let (_dir, config) = workspace(REGISTRY, "comune,provincia\nMilano,MI\n", CONFIG);
    let out = run_cmd(&["run"], &config);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("zona"));
}

#[test]
fn unwritable_output_exits_5() {
    let (dir, config) = workspace(REGISTRY, ZONES, CONFIG);
    std::fs::create_dir(dir.path().join("cities.json")).unwrap();
    let out = run_cmd(&["run"], &config);
    assert_eq!(out.status.code(), Some(5));
}

#[test]
fn custom_zone_columns_and_delimiter() {
    let zones = "Comune;Sigla;Zona climatica\nMilano;MI;E\nMonza;MI;E\nSan Donato;MI;E\n";
    let config = r#"
name = "mapped"

[registry]
file = "registry.csv"

[zones]
file = "zones.csv"
delimiter = ";"

[zones.columns]
name = "Comune"
province = "Sigla"
zone = "Zona climatica"
"#;
    let (_dir, config) = workspace(REGISTRY, zones, config);
    let out = run_cmd(&["run", "--json"], &config);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));

    let val: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(val["summary"]["method_counts"]["pair"], 2);
}

// ===========================================================================
// validate
// ===========================================================================

#[test]
fn validate_accepts_good_config() {
    let (_dir, config) = workspace(REGISTRY, ZONES, CONFIG);
    let out = run_cmd(&["validate"], &config);
    assert_eq!(out.status.code(), Some(0));
    assert!(stderr(&out).contains("config ok"));
}

#[test]
fn validate_rejects_empty_name() {
    let bad = CONFIG.replace("name = \"cli test\"", "name = \"\"");
    let (_dir, config) = workspace(REGISTRY, ZONES, &bad);
    let out = run_cmd(&["validate"], &config);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("hint:"));
}

#[test]
fn validate_rejects_malformed_toml() {
    let (_dir, config) = workspace(REGISTRY, ZONES, "name = ");
    let out = run_cmd(&["validate"], &config);
    assert_eq!(out.status.code(), Some(3));
}

// ===========================================================================
// normalize + usage
// ===========================================================================

#[test]
fn normalize_prints_one_line_per_name() {
    let out = climazone()
        .args(["normalize", "Sant'Angelo d'Alife", "Poiana Maggiore"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["sant angelo di alife", "pojana maggiore"]);
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let out = climazone().output().unwrap();
    assert_eq!(out.status.code(), Some(2));
}
