use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use clap::Parser;

use crate::{
    activity::ActivityDraft, store::ActivityStore, timeline::palette::KNOWN_CATEGORIES,
    utils::time::format_minutes,
};

#[derive(Debug, Parser)]
pub struct AddCommand {
    #[arg(
        short,
        long,
        value_parser = non_empty,
        help = format!("Category of the activity. Usually one of {}", KNOWN_CATEGORIES.join(", "))
    )]
    category: String,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..24), help = "Hours spent")]
    hours: u8,
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..60), help = "Minutes spent")]
    minutes: u8,
    #[arg(short, long, help = "Additional details")]
    details: Option<String>,
    #[arg(
        short,
        long,
        value_parser = parse_time,
        help = "Start of the activity today, e.g. \"09:30\". Defaults to now"
    )]
    start: Option<NaiveTime>,
}

fn non_empty(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(anyhow!("Category can't be empty"))
    } else {
        Ok(value.to_string())
    }
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .with_context(|| format!("Expected time as HH:MM, got {value}"))
}

/// Places `time` on the reference's calendar day.
fn start_on_day<Tz: TimeZone>(time: NaiveTime, reference: &DateTime<Tz>) -> Result<DateTime<Utc>> {
    reference
        .timezone()
        .from_local_datetime(&reference.date_naive().and_time(time))
        .earliest()
        .map(|v| v.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("{time} doesn't exist on {}", reference.date_naive()))
}

impl AddCommand {
    fn into_draft<Tz: TimeZone>(self, reference: &DateTime<Tz>) -> Result<ActivityDraft> {
        let duration = i64::from(self.hours) * 60 + i64::from(self.minutes);
        let mut draft = ActivityDraft::new(self.category, duration);
        if let Some(details) = self.details.as_deref().map(str::trim) {
            if !details.is_empty() {
                draft = draft.with_details(details);
            }
        }
        if let Some(start) = self.start {
            draft = draft.with_start(start_on_day(start, reference)?);
        }
        Ok(draft)
    }
}

pub async fn process_add_command(command: AddCommand, store: &ActivityStore) -> Result<()> {
    let draft = command.into_draft(&Local::now())?;
    let created = store
        .add(draft)
        .await
        .context("Failed to save the activity")?;
    println!(
        "Saved {} for {} at {}",
        created.category,
        format_minutes(created.duration),
        created.timestamp.with_timezone(&Local).format("%H:%M")
    );
    Ok(())
}
