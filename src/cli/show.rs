use std::{fmt::Display, io::Write};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{Parser, ValueEnum};

use crate::{
    bridge::Platform,
    usage::aggregator::UsageAggregator,
    utils::time::date_to_key,
};

use super::render::render_day;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct ShowCommand {
    #[arg(
        long,
        short,
        help = "Day to show. Examples are \"today\", \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Print the day as JSON")]
    json: bool,
}

/// Command to process `show` command. Aggregates a single day once and prints it. Only days the
/// platform still keeps statistics for have anything to show.
pub async fn process_show_command(
    ShowCommand {
        date,
        date_style,
        json,
    }: ShowCommand,
    platform: &Platform,
    out: &mut impl Write,
) -> Result<()> {
    let now = Local::now();
    let day = parse_day(date.as_deref(), date_style, now)?;

    let usage = UsageAggregator::new(platform).aggregate_day(day).await?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &usage)?;
        writeln!(out)?;
    } else {
        render_day(out, &usage, usage.date_key == date_to_key(now.date_naive()))?;
    }
    Ok(())
}

fn parse_day(date: Option<&str>, date_style: DateStyle, now: DateTime<Local>) -> Result<NaiveDate> {
    match date {
        Some(s) => parse_date_string(s, now, date_style.into())
            .map(|v| v.date_naive())
            .map_err(|e| anyhow!("Failed to parse date {s:?}: {e}")),
        None => Ok(now.date_naive()),
    }
}
