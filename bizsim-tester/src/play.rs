//! Interactive terminal run.
use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use std::io::{BufRead, Write};

use bizsim_game::{
    DecisionOutcome, DecisionSession, FinalResults, IndicatorLevel, RunStatus, ScoreCategory,
    VisiblePhase,
};

enum Command {
    Pick(usize),
    Restart,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "q" | "quit" => Command::Quit,
        "r" | "restart" => Command::Restart,
        other => other
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map_or_else(|| Command::Unknown(trimmed.to_string()), Command::Pick),
    }
}

fn paint_level(text: &str, level: IndicatorLevel) -> ColoredString {
    match level {
        IndicatorLevel::Failed => text.bright_red().bold(),
        IndicatorLevel::Critical => text.red(),
        IndicatorLevel::Warning => text.yellow(),
        IndicatorLevel::Healthy => text.green(),
    }
}

fn paint_category(text: &str, category: ScoreCategory) -> ColoredString {
    match category {
        ScoreCategory::Excellent => text.bright_green().bold(),
        ScoreCategory::Good => text.green(),
        ScoreCategory::Regular => text.yellow(),
        ScoreCategory::Critical => text.red().bold(),
    }
}

fn render_indicators<W: Write + ?Sized>(out: &mut W, session: &DecisionSession) -> Result<()> {
    let progress = session.progress();
    writeln!(
        out,
        "{}",
        format!(
            "── Phase {}/{} ──",
            progress.phase_number(),
            progress.total_phases
        )
        .cyan()
    )?;
    let indicators = session.indicators();
    for (name, level) in session.indicator_levels() {
        let value = indicators.get(&name).unwrap_or_default();
        let bar = "█".repeat(usize::try_from(value / 5).unwrap_or(0));
        writeln!(
            out,
            "  {name:<28} {:>3} {}",
            paint_level(&value.to_string(), level),
            paint_level(&bar, level)
        )?;
    }
    Ok(())
}

fn render_phase<W: Write + ?Sized>(out: &mut W, phase: &VisiblePhase) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", phase.title.bright_white().bold())?;
    if !phase.question.is_empty() {
        writeln!(out, "{}", phase.question)?;
    }
    for option in &phase.options {
        writeln!(out, "  {}) {}", option.index + 1, option.text.bold())?;
        if !option.description.is_empty() {
            writeln!(out, "     {}", option.description.dimmed())?;
        }
    }
    Ok(())
}

fn render_outcome<W: Write + ?Sized>(out: &mut W, outcome: &DecisionOutcome) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "▶ {}", outcome.decision_text.bold())?;
    for change in &outcome.effects {
        let sign = if change.delta >= 0 { "+" } else { "" };
        let delta = format!("{sign}{}", change.delta);
        let delta = if change.delta >= 0 {
            delta.green()
        } else {
            delta.red()
        };
        let marker = if change.synergy {
            format!(" (synergy {:+})", change.synergy_delta)
                .magenta()
                .to_string()
        } else {
            String::new()
        };
        writeln!(
            out,
            "  {:<28} {delta:>4}  {} → {}{marker}",
            change.indicator, change.old_value, change.new_value
        )?;
    }
    if outcome.synergy_applied() {
        writeln!(out, "{}", "✨ Synergy activated".magenta().bold())?;
    }
    if outcome.has_critical_warning() {
        writeln!(
            out,
            "{} {}",
            "⚠️  Critical:".yellow().bold(),
            outcome.critical_indicators.join(", ")
        )?;
    }
    if outcome.game_over {
        writeln!(
            out,
            "{} {}",
            "💥 Game over:".red().bold(),
            outcome.failed_indicators.join(", ")
        )?;
    } else if outcome.game_completed {
        writeln!(out, "{}", "🏁 All phases completed".green().bold())?;
    }
    Ok(())
}

/// Every option of the phase is gated; the run cannot move on.
fn render_stuck<W: Write + ?Sized>(out: &mut W, phase: &VisiblePhase) -> Result<()> {
    writeln!(
        out,
        "{} no option of phase {} is available",
        "⛔ Stuck:".red().bold(),
        phase.id
    )?;
    for gate in &phase.gates {
        writeln!(out, "  {} needs {}", gate.option_id, gate.missing.join(", "))?;
    }
    write!(out, "[r]estart or [q]uit: ")?;
    out.flush()?;
    Ok(())
}

fn render_results<W: Write + ?Sized>(out: &mut W, results: &FinalResults) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Final results".bright_cyan().bold())?;
    for indicator in results.indicators.iter() {
        writeln!(out, "  {:<28} {:>3}", indicator.name, indicator.value)?;
    }
    writeln!(
        out,
        "Average: {:.1} ({})",
        results.average_score,
        paint_category(&results.category.to_string(), results.category)
    )?;
    writeln!(out, "{}", results.message)?;
    Ok(())
}

/// Drive `session` from `input` until the player quits or input ends.
pub fn run_interactive<R, W>(session: &mut DecisionSession, input: R, out: &mut W) -> Result<()>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut lines = input.lines();
    loop {
        if session.status() == RunStatus::Active {
            let Some(phase) = session.visible_phase() else {
                break;
            };
            render_indicators(out, session)?;
            render_phase(out, &phase)?;
            if phase.options.is_empty() {
                render_stuck(out, &phase)?;
                let Some(line) = lines.next() else { break };
                match parse_command(&line.context("failed to read input")?) {
                    Command::Restart => session.reset(),
                    Command::Quit => break,
                    _ => writeln!(out, "{} type r or q", "✗".red())?,
                }
                continue;
            }
            write!(out, "Choose 1-{} (q to quit): ", phase.options.len())?;
            out.flush()?;

            let Some(line) = lines.next() else { break };
            match parse_command(&line.context("failed to read input")?) {
                Command::Quit => break,
                Command::Restart => {
                    session.reset();
                    writeln!(out, "{}", "↺ Restarted".cyan())?;
                }
                Command::Pick(number) => match session.apply_decision(number - 1) {
                    Ok(outcome) => render_outcome(out, &outcome)?,
                    Err(err) => writeln!(out, "{} {err}", "✗".red())?,
                },
                Command::Unknown(text) => {
                    writeln!(out, "{} unrecognised input `{text}`", "✗".red())?;
                }
            }
        } else {
            render_results(out, &session.final_results())?;
            write!(out, "[r]estart or [q]uit: ")?;
            out.flush()?;

            let Some(line) = lines.next() else { break };
            match parse_command(&line.context("failed to read input")?) {
                Command::Restart => session.reset(),
                Command::Quit => break,
                _ => writeln!(out, "{} type r or q", "✗".red())?,
            }
        }
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
