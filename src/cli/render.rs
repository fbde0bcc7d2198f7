use std::io::{self, Write};

use ansi_term::{Colour, Style};

use crate::{
    refresh::{Alert, AlertKind},
    usage::{entities::DailyUsage, store::UsageStore},
};

pub const TITLE: &str = "Daily Usage";
const ACTIONS: &str = "[r] Refresh today   [p] Open permissions   [q] Quit";
const DIM: Colour = Colour::Fixed(244);

/// Draws every stored day, newest first. The day matching `today_key` is marked.
pub fn render_store(out: &mut impl Write, store: &UsageStore, today_key: &str) -> io::Result<()> {
    writeln!(out, "{}", Style::new().bold().paint(TITLE))?;
    writeln!(out, "{}", DIM.paint(ACTIONS))?;
    writeln!(out)?;

    if store.is_empty() {
        writeln!(out, "{}", DIM.paint("No usage collected yet"))?;
        writeln!(out)?;
    }

    for day in store.days() {
        render_day(out, day, day.date_key == today_key)?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn render_day(out: &mut impl Write, day: &DailyUsage, is_today: bool) -> io::Result<()> {
    let header = Style::new().bold().paint(day.date_key.as_str());
    if is_today {
        writeln!(out, "{header} {}", Colour::Green.paint("(Today)"))?;
    } else {
        writeln!(out, "{header}")?;
    }

    if day.apps.is_empty() {
        writeln!(out, "  {}", DIM.paint("no usage"))?;
        return Ok(());
    }

    let width = day
        .apps
        .iter()
        .map(|v| v.package_name.chars().count())
        .max()
        .unwrap_or(0);
    for app in &day.apps {
        writeln!(out, "  {:<width$}  {:>5} min", app.package_name, app.minutes)?;
    }
    Ok(())
}

pub fn render_alert(out: &mut impl Write, alert: &Alert) -> io::Result<()> {
    let title = match alert.kind {
        AlertKind::Error => Colour::Red.bold().paint("Error"),
        AlertKind::Info => Colour::Blue.bold().paint("Info"),
    };
    writeln!(out, "{title}: {}", alert.message)?;
    writeln!(out, "{}", DIM.paint("Press Enter to dismiss"))
}
