use anyhow::Result;
use colored::Colorize;
use pigfarm_game::format_compact;
use std::io::Write;
use std::time::Duration;

use crate::live::LiveReport;
use crate::simulation::SimulationReport;
use crate::util::timestamp;

pub fn generate_console_report<W: Write>(
    writer: &mut W,
    reports: &[SimulationReport],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Simulation Results Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "=============================".cyan())?;

    let total = reports.len();
    let passed = reports.iter().filter(|r| r.passed).count();
    writeln!(writer, "Total sessions: {total}")?;
    writeln!(writer, "Passed: {}", passed.to_string().green())?;
    writeln!(writer, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for report in reports {
        let status = if report.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            writer,
            "{} {} (seed {})",
            status,
            report.strategy.bold(),
            report.seed
        )?;
        writeln!(
            writer,
            "   🪙 {} coins, 🐷 {}/{} raised/harvested, 👆 {} clicks ({} auto)",
            format_compact(report.coins),
            report.pigs_raised,
            report.pigs_harvested,
            report.total_clicks,
            report.auto_clicks
        )?;
        writeln!(
            writer,
            "   🎀 {} ribbons at {}%, 🤖 level {}, 🏆 {} achievements, 💾 {} saves",
            report.ribbons_won,
            report.ribbon_chance_percent,
            report.auto_clicker_level,
            report.achievements.len(),
            report.saves
        )?;
        if !report.failures.is_empty() {
            writeln!(writer, "   Failures:")?;
            for failure in &report.failures {
                writeln!(writer, "     • {}", failure.red())?;
            }
        }
        writeln!(writer)?;
    }

    if let Some(richest) = reports.iter().max_by_key(|r| r.coins) {
        writeln!(writer, "{}", "💰 Best Earner".bright_yellow().bold())?;
        writeln!(
            writer,
            "{} seed {} with {} coins",
            richest.strategy.green(),
            richest.seed,
            format_compact(richest.coins)
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(writer: &mut W, reports: &[SimulationReport]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, reports)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(
    writer: &mut W,
    reports: &[SimulationReport],
) -> Result<()> {
    writeln!(writer, "# Pig Farm Simulation Results\n")?;
    writeln!(writer, "_Generated {}_\n", timestamp())?;

    let total = reports.len();
    let passed = reports.iter().filter(|r| r.passed).count();
    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Total sessions**: {total}")?;
    writeln!(writer, "- **Passed**: {passed}")?;
    writeln!(writer, "- **Failed**: {}\n", total - passed)?;

    writeln!(
        writer,
        "| Strategy | Seed | Coins | Harvested | Clicks | Auto | Ribbons | Chance | Achievements | Status |"
    )?;
    writeln!(writer, "|---|---|---|---|---|---|---|---|---|---|")?;
    for r in reports {
        let status = if r.passed { "✅" } else { "❌" };
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} | {} | {} | {}% | {} | {} |",
            r.strategy,
            r.seed,
            r.coins,
            r.pigs_harvested,
            r.total_clicks,
            r.auto_clicks,
            r.ribbons_won,
            r.ribbon_chance_percent,
            r.achievements.len(),
            status
        )?;
    }

    let failing: Vec<_> = reports.iter().filter(|r| !r.passed).collect();
    if !failing.is_empty() {
        writeln!(writer, "\n## Failures\n")?;
        for r in failing {
            writeln!(writer, "### {} seed {}\n", r.strategy, r.seed)?;
            for failure in &r.failures {
                writeln!(writer, "- {failure}")?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}

pub fn generate_live_report<W: Write>(
    writer: &mut W,
    report: &LiveReport,
    format: &str,
) -> Result<()> {
    match format {
        "json" => {
            serde_json::to_writer_pretty(&mut *writer, report)?;
            writeln!(writer)?;
        }
        "markdown" => {
            writeln!(writer, "# Pig Farm Live Session\n")?;
            writeln!(writer, "- **Strategy**: {}", report.strategy)?;
            writeln!(writer, "- **Save key**: `{}`", report.save_key)?;
            writeln!(writer, "- **Coins**: {}", report.coins)?;
            writeln!(
                writer,
                "- **Clicks**: {} ({} auto)",
                report.total_clicks, report.auto_clicks
            )?;
            writeln!(writer, "- **Autosaves**: {}", report.autosaves)?;
            let flushed = if report.final_save { "yes" } else { "no" };
            writeln!(writer, "- **Final save**: {flushed}")?;
        }
        _ => {
            writeln!(writer, "{}", "🐷 Live Session Summary".bright_cyan().bold())?;
            writeln!(writer, "{}", "=======================".cyan())?;
            writeln!(writer, "Strategy: {}", report.strategy.bold())?;
            writeln!(writer, "Coins: {}", format_compact(report.coins).green())?;
            writeln!(
                writer,
                "Clicks: {} ({} auto), harvested {}",
                report.total_clicks, report.auto_clicks, report.pigs_harvested
            )?;
            writeln!(writer, "Auto-clicker restarts: {}", report.tick_restarts)?;
            writeln!(writer, "Autosaves: {}", report.autosaves)?;
            let flushed = if report.final_save {
                "saved".green()
            } else {
                "not saved".red()
            };
            writeln!(writer, "Final save `{}`: {}", report.save_key, flushed)?;
        }
    }
    Ok(())
}
