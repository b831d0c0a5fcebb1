use crate::config::StaticTables;

/// Province codes that may hold the zone-source record for a municipality
/// filed under `code`, in search order: the code itself, its historical
/// parents, then (for island provinces) the rest of the island group.
/// No duplicates.
pub fn aliases(tables: &StaticTables, code: &str) -> Vec<String> {
    let code = code.trim().to_ascii_uppercase();
    let mut out = vec![code.clone()];

    for parent in tables.split_parents(&code) {
        if !out.contains(parent) {
            out.push(parent.clone());
        }
    }

    let island = tables.island_group();
    if island.contains(&code) {
        for other in island {
            if !out.contains(other) {
                out.push(other.clone());
            }
        }
    }

    out
}
