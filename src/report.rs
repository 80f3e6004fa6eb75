//! Plain-text summaries printed by the CLI.

use autoevo_core::{GenerationHistory, GenerationOutcome, Result, SpeciesRecordFull};
use autoevo_data::SpeciesId;
use std::fmt::Write;

/// One line per species: population before and after, and the delta.
#[must_use]
pub fn outcome_table(generation: u32, outcome: &GenerationOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Generation {generation}: {} species, {:.1} energy, {:.0}% used",
        outcome.species.len(),
        outcome.metrics.total_energy,
        outcome.metrics.utilisation() * 100.0
    );
    for (id, species) in &outcome.species {
        let _ = writeln!(
            out,
            "  species {id:>4}  {:>12} -> {:>12}  ({:+})",
            species.previous_population, species.population, species.delta
        );
    }
    out
}

/// Summary of one recorded generation, diffed against the one before it.
pub fn generation_summary(history: &GenerationHistory, generation: u32) -> Result<String> {
    let record = history
        .get(generation)
        .ok_or(autoevo_core::AutoEvoError::GenerationNotFound(generation))?;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Generation {generation} at {:.3e} years, total population {}",
        record.time_elapsed,
        record.total_population()
    );
    for (id, species) in &record.species {
        let kind = if species.is_full() { "full" } else { "lite" };
        let _ = writeln!(out, "  species {id:>4}  {:>12}  [{kind}]", species.population());
    }
    if generation > 0 {
        let diff = history.population_diff(generation - 1, generation)?;
        if !diff.appeared.is_empty() {
            let _ = writeln!(out, "  appeared: {:?}", diff.appeared);
        }
        if !diff.extinct.is_empty() {
            let _ = writeln!(out, "  extinct: {:?}", diff.extinct);
        }
    }
    Ok(out)
}

/// Full record of one species plus its population over time.
pub fn species_summary(
    history: &GenerationHistory,
    id: SpeciesId,
    generation: u32,
) -> Result<String> {
    let SpeciesRecordFull {
        species,
        population,
        lineage,
    } = history.get_full_species_record(id, generation)?;
    let mut out = String::new();
    let _ = writeln!(out, "{} (species {id}) at generation {generation}", species.name);
    let _ = writeln!(out, "  membrane: {}", species.membrane);
    let _ = writeln!(out, "  organelles: {}", species.organelles.join(", "));
    let _ = writeln!(
        out,
        "  aggression {} / activity {}",
        species.behaviour.aggression, species.behaviour.activity
    );
    let _ = writeln!(out, "  population: {population}");
    let _ = writeln!(out, "  lineage: {lineage:?}");
    let series: Vec<String> = history
        .species_population_series(id)
        .into_iter()
        .map(|(g, p)| format!("{g}:{p}"))
        .collect();
    let _ = writeln!(out, "  history: {}", series.join(" "));
    Ok(out)
}
