use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use evroute_engine::{Catalog, ErrorResponse, Plan, PlanStep, SearchStats};
use serde::Serialize;

use crate::runner::RequestResult;

#[derive(Serialize)]
#[serde(untagged)]
enum ResponseBody<'a> {
    Plan(&'a Plan),
    Error(ErrorResponse),
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    label: &'a str,
    elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<SearchStats>,
    #[serde(flatten)]
    body: ResponseBody<'a>,
}

fn body_of(result: &RequestResult) -> ResponseBody<'_> {
    match &result.outcome {
        Ok(outcome) => ResponseBody::Plan(&outcome.plan),
        Err(err) => ResponseBody::Error(err.to_response()),
    }
}

/// Single response in the wire shape: the plan, or `{"error": {...}}`.
pub fn generate_json_response<W: Write + ?Sized>(out: &mut W, result: &RequestResult) -> Result<()> {
    let json = serde_json::to_string_pretty(&body_of(result))?;
    writeln!(out, "{json}")?;
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, results: &[RequestResult]) -> Result<()> {
    let entries: Vec<BatchEntry<'_>> = results
        .iter()
        .map(|r| BatchEntry {
            label: &r.label,
            elapsed_ms: u64::try_from(r.elapsed.as_millis()).unwrap_or(u64::MAX),
            stats: r.outcome.as_ref().ok().map(|o| o.stats),
            body: body_of(r),
        })
        .collect();
    let json = serde_json::to_string_pretty(&entries)?;
    writeln!(out, "{json}")?;
    Ok(())
}

fn describe_step(step: &PlanStep) -> String {
    match step {
        PlanStep::Travel { to, distance } => format!("Travel to {to} ({distance})"),
        PlanStep::Battle {
            zone,
            target_pokemon,
            count,
            stat_focus,
            gained_evs,
        } => format!(
            "Battle {target_pokemon} x{count} in {zone} [{stat_focus}] +{gained_evs}"
        ),
    }
}

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[RequestResult],
) -> Result<()> {
    let solved = results.iter().filter(|r| r.succeeded()).count();
    writeln!(out)?;
    writeln!(out, "{}", "📊 Plan Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===============".cyan())?;
    writeln!(out, "Requests: {}", results.len())?;
    writeln!(out, "Solved: {}", solved.to_string().green())?;
    writeln!(out, "Failed: {}", (results.len() - solved).to_string().red())?;
    writeln!(out)?;

    for result in results {
        match &result.outcome {
            Ok(outcome) => {
                let plan = &outcome.plan;
                writeln!(out, "{} {}", "✅ PLAN".green(), result.label.bold())?;
                if plan.is_empty() {
                    writeln!(out, "   Target already met")?;
                }
                for (idx, step) in plan.path.iter().enumerate() {
                    writeln!(out, "   {:>2}. {}", idx + 1, describe_step(step))?;
                }
                writeln!(
                    out,
                    "   Distance: {} | Encounters: {} | Cost: {}",
                    plan.total_distance, plan.total_encounters, plan.total_cost
                )?;
                writeln!(out, "   Final EVs: {}", plan.final_stats)?;
                writeln!(
                    out,
                    "   Search: {} expanded, {} pushed in {:?}",
                    outcome.stats.expanded, outcome.stats.pushed, result.elapsed
                )?;
            }
            Err(err) => {
                writeln!(
                    out,
                    "{} {} ({})",
                    "❌ FAIL".red(),
                    result.label.bold(),
                    err.kind().yellow()
                )?;
                writeln!(out, "   {}", err.message())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[RequestResult],
) -> Result<()> {
    writeln!(out, "# EV Route Plans\n")?;
    for result in results {
        writeln!(out, "## {}\n", result.label)?;
        match &result.outcome {
            Ok(outcome) => {
                let plan = &outcome.plan;
                writeln!(out, "| # | Step |")?;
                writeln!(out, "|---|------|")?;
                for (idx, step) in plan.path.iter().enumerate() {
                    writeln!(out, "| {} | {} |", idx + 1, describe_step(step))?;
                }
                writeln!(
                    out,
                    "\n**Distance:** {} · **Encounters:** {} · **Final EVs:** {}\n",
                    plan.total_distance, plan.total_encounters, plan.final_stats
                )?;
            }
            Err(err) => {
                writeln!(out, "**{}**: {}\n", err.kind(), err.message())?;
            }
        }
    }
    Ok(())
}

pub fn write_zone_listing<W: Write + ?Sized>(out: &mut W, catalog: &Catalog) -> Result<()> {
    writeln!(out, "Zones ({}):", catalog.zone_count())?;
    for (_, zone) in catalog.zones() {
        let edges: Vec<String> = zone
            .edges
            .iter()
            .map(|e| format!("{} ({})", catalog.zone(e.to).name, e.distance))
            .collect();
        let species: Vec<&str> = zone
            .encounters
            .iter()
            .map(|slot| catalog.species(slot.species).name.as_str())
            .collect();
        writeln!(out, "  {}", zone.name.bold())?;
        writeln!(out, "    exits:   {}", edges.join(", "))?;
        if !species.is_empty() {
            writeln!(out, "    species: {}", species.join(", "))?;
        }
    }
    Ok(())
}

pub fn write_species_listing<W: Write + ?Sized>(out: &mut W, catalog: &Catalog) -> Result<()> {
    writeln!(out, "Species ({}):", catalog.species_count())?;
    for (id, species) in catalog.all_species() {
        let dex = species
            .pokedex_number
            .map_or_else(|| "---".to_string(), |n| format!("{n:03}"));
        let zones: Vec<&str> = catalog
            .zones_for_species(id)
            .into_iter()
            .map(|z| catalog.zone(z).name.as_str())
            .collect();
        writeln!(
            out,
            "  #{dex} {:12} {:16} yields {}",
            species.name,
            species.types.join("/"),
            species.evs
        )?;
        if !zones.is_empty() {
            writeln!(out, "       found in {}", zones.join(", "))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use evroute_engine::{EvVector, PlanError, PlanOutcome, Stat};
    use std::time::Duration;

    fn solved() -> RequestResult {
        RequestResult {
            label: "rattata".into(),
            outcome: Ok(PlanOutcome {
                plan: Plan {
                    path: vec![
                        PlanStep::Travel {
                            to: "B".into(),
                            distance: 10.0,
                        },
                        PlanStep::Battle {
                            zone: "B".into(),
                            target_pokemon: "Rattata".into(),
                            count: 2,
                            stat_focus: Stat::Speed,
                            gained_evs: EvVector::single(Stat::Speed, 2),
                        },
                    ],
                    total_distance: 10.0,
                    total_encounters: 2,
                    final_stats: EvVector::single(Stat::Speed, 2),
                    total_cost: 10.0,
                },
                stats: SearchStats::default(),
            }),
            elapsed: Duration::from_millis(3),
        }
    }

    fn failed() -> RequestResult {
        RequestResult {
            label: "stuck".into(),
            outcome: Err(PlanError::NoFeasiblePlan("no reachable species yields HP".into())),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn json_response_matches_wire_shape() {
        let mut buf = Vec::new();
        generate_json_response(&mut buf, &solved()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["path"][0]["type"], "travel");
        assert_eq!(value["total_encounters"], 2);

        let mut buf = Vec::new();
        generate_json_response(&mut buf, &failed()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["error"]["kind"], "NoFeasiblePlan");
    }

    #[test]
    fn json_batch_report_flattens_bodies() {
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &[solved(), failed()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["label"], "rattata");
        assert_eq!(value[0]["final_stats"]["Speed"], 2);
        assert!(value[0]["stats"].is_object());
        assert_eq!(value[1]["error"]["kind"], "NoFeasiblePlan");
        assert!(value[1].get("stats").is_none());
    }

    #[test]
    fn console_and_markdown_mention_every_request() {
        let mut console = Vec::new();
        generate_console_report(&mut console, &[solved(), failed()]).unwrap();
        let text = String::from_utf8(console).unwrap();
        assert!(text.contains("Battle Rattata x2 in B [Speed] +Speed 2"));
        assert!(text.contains("NoFeasiblePlan"));

        let mut markdown = Vec::new();
        generate_markdown_report(&mut markdown, &[solved(), failed()]).unwrap();
        let text = String::from_utf8(markdown).unwrap();
        assert!(text.starts_with("# EV Route Plans"));
        assert!(text.contains("| 1 | Travel to B (10) |"));
        assert!(text.contains("**NoFeasiblePlan**"));
    }

    #[test]
    fn listings_cover_the_bundled_catalog() {
        let catalog = Catalog::embedded().unwrap();
        let mut buf = Vec::new();
        write_zone_listing(&mut buf, &catalog).unwrap();
        write_species_listing(&mut buf, &catalog).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Viridian Forest"));
        assert!(text.contains("#025 Pikachu"));
    }
}
