use std::fmt::Write;

use ansi_term::Colour;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use clap::Parser;
use tracing::{debug, info};

use crate::{
    activity::Activity,
    repository::ActivityRepository,
    store::ActivityStore,
    timeline::{build_daily_timeline, palette::hex_to_rgb, DailyTimeline},
    utils::time::{day_bounds, format_minutes},
};

/// Width of the day bar in characters.
const BAR_WIDTH: i64 = 48;

#[derive(Debug, Clone, Copy, Parser)]
pub struct TodayCommand {
    #[arg(long, help = "Print the timeline as json")]
    json: bool,
    #[arg(long = "no-color", help = "Don't use terminal colors")]
    plain: bool,
}

#[derive(Debug, Clone, Copy, Parser)]
pub struct ListCommand {
    #[arg(long, help = "Only activities that started today")]
    today: bool,
}

#[derive(Debug, Clone, Copy, Parser)]
pub struct WatchCommand {
    #[arg(long = "no-color", help = "Don't use terminal colors")]
    plain: bool,
}

fn swatch(color: &str, plain: bool, text: &str) -> String {
    match hex_to_rgb(color) {
        Some((r, g, b)) if !plain => Colour::RGB(r, g, b).paint(text).to_string(),
        _ => text.to_string(),
    }
}

/// Renders the day as a bar, the list of segments and a legend with totals per category.
pub fn render_dashboard<Tz: TimeZone>(
    timeline: &DailyTimeline,
    day: &DateTime<Tz>,
    plain: bool,
) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    let _ = writeln!(out, "Today's Activities ({})", day.date_naive().format("%Y-%m-%d"));
    let _ = writeln!(
        out,
        "Tracked Time: {}",
        format_minutes(timeline.total_tracked_minutes)
    );
    let _ = writeln!(out);

    let total = i128::from(timeline.total_value().max(1));
    let mut bar = String::new();
    for segment in &timeline.segments {
        let value = i128::from(segment.value().max(0));
        let width = (value * i128::from(BAR_WIDTH) + total / 2) / total;
        let fill = if segment.is_gap() { "░" } else { "█" };
        bar += &swatch(segment.color(), plain, &fill.repeat(width as usize));
    }
    let _ = writeln!(out, "{bar}");
    let _ = writeln!(out);

    for segment in &timeline.segments {
        match segment.category() {
            Some(category) => {
                let _ = writeln!(
                    out,
                    "{} {:<16}{}",
                    swatch(segment.color(), plain, "■"),
                    category,
                    segment.label().unwrap_or_default()
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "{} {:<16}{}",
                    swatch(segment.color(), plain, "□"),
                    "untracked",
                    format_minutes(segment.value())
                );
            }
        }
    }

    if !timeline.category_totals.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Legend");
        for total in &timeline.category_totals {
            let _ = writeln!(
                out,
                "{} {:<16}{}",
                swatch(total.color, plain, "●"),
                total.category,
                format_minutes(total.minutes)
            );
        }
    }
    out
}

pub fn render_activity(activity: &Activity) -> String {
    let start = activity.timestamp.with_timezone(&Local);
    let mut line = format!(
        "{}\t{}\t{}",
        start.format("%Y-%m-%d %H:%M"),
        format_minutes(activity.duration),
        activity.category
    );
    if let Some(details) = &activity.details {
        line += "\t";
        line += details;
    }
    line
}

fn print_today(activities: &[Activity], command: TodayCommand) -> Result<()> {
    let now = Local::now();
    let timeline = build_daily_timeline(activities, &now);
    if command.json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
    } else {
        print!("{}", render_dashboard(&timeline, &now, command.plain));
    }
    Ok(())
}

pub async fn process_today_command(command: TodayCommand, store: &ActivityStore) -> Result<()> {
    store.load().await.context("Failed to load activities")?;
    print_today(&store.activities(), command)
}

pub async fn process_list_command(
    command: ListCommand,
    store: &ActivityStore,
    repository: &dyn ActivityRepository,
) -> Result<()> {
    let activities = if command.today {
        let (start, end) =
            day_bounds(&Local::now()).context("Today can't be expressed in local time")?;
        repository
            .list_in_range(start, end)
            .await
            .context("Failed to load today's activities")?
    } else {
        store.load().await.context("Failed to load activities")?;
        store.activities()
    };

    for activity in &activities {
        println!("{}", render_activity(activity));
    }
    Ok(())
}

/// Keeps the dashboard on screen and redraws it whenever the activities change. Stops on ctrl-c.
pub async fn process_watch_command(command: WatchCommand, store: &ActivityStore) -> Result<()> {
    store.load().await.context("Failed to load activities")?;
    let subscription = store.subscribe_to_updates();
    let mut observer = store.observe();
    let today = TodayCommand {
        json: false,
        plain: command.plain,
    };

    print_today(&store.activities(), today)?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch");
                break;
            }
            changed = observer.changed() => {
                changed.context("Activity store was closed")?;
                let activities = observer.borrow_and_update().clone();
                debug!("Redrawing with {} activities", activities.len());
                println!();
                print_today(&activities, today)?;
            }
        }
    }

    subscription.dispose();
    Ok(())
}
