//! Command-line front end for browsing and favoriting events.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use event_finder::{
    feed::DEFAULT_PAGE_SIZE, format_event_datetime, AppConfig, Event, EventCategory, EventQuery,
    EventsApp,
};

#[derive(Parser, Debug)]
#[command(name = "event-finder")]
#[command(version, about = "Browse, search and favorite nearby events", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one or more pages of events
    List {
        /// Free-text search
        #[arg(short, long)]
        keyword: Option<String>,

        /// One of music, tech, fitness, food, art
        #[arg(short, long)]
        category: Option<EventCategory>,

        #[arg(long)]
        city: Option<String>,

        /// 0-based page to start from
        #[arg(short, long, default_value_t = 0)]
        page: u32,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,

        /// Keep paging while more results are available, up to this many pages
        #[arg(long, default_value_t = 1)]
        pages: u32,

        #[arg(long)]
        json: bool,
    },
    /// Show a single event by id
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },
    /// Add or remove an event from favorites
    Favorite { id: String },
    /// List favorited events
    Favorites {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    event_finder::init_tracing();

    let args = Args::parse();
    let config = AppConfig::from_env();
    let app = EventsApp::bootstrap(&config).await?;

    let result = run(&app, args.command).await;
    app.shutdown().await;
    result
}

async fn run(app: &EventsApp, command: Command) -> Result<()> {
    match command {
        Command::List {
            keyword,
            category,
            city,
            page,
            page_size,
            pages,
            json,
        } => {
            let query = EventQuery {
                keyword,
                category,
                city,
            };
            let mut events = Vec::new();
            let mut has_more = true;
            for current in page..page.saturating_add(pages.max(1)) {
                let result = app
                    .list_page(&query, current, page_size)
                    .await
                    .with_context(|| format!("failed to load page {current}"))?;
                events.extend(result.events);
                has_more = result.has_more;
                if !has_more {
                    break;
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                for event in &events {
                    print_summary(app, event);
                }
                if has_more {
                    println!("… more available");
                }
            }
        }
        Command::Show { id, json } => {
            let event = app
                .get_by_id(&id)
                .await
                .with_context(|| format!("failed to look up {id}"))?
                .with_context(|| format!("no event with id {id}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                print_details(app, &event);
            }
        }
        Command::Favorite { id } => {
            if app.toggle_favorite(&id) {
                println!("★ added {id}");
            } else {
                println!("☆ removed {id}");
            }
        }
        Command::Favorites { json } => {
            let events = app
                .favorite_events()
                .await
                .context("failed to load favorites")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else if events.is_empty() {
                println!("No favorites yet");
            } else {
                for event in &events {
                    print_summary(app, event);
                }
            }
        }
    }
    Ok(())
}

fn print_summary(app: &EventsApp, event: &Event) {
    let star = if app.is_favorite(&event.id) { "★" } else { " " };
    println!(
        "{star} {id:<14} {when:<24} [{category}] {title}",
        id = event.id,
        when = format_event_datetime(&event.starts_at_iso),
        category = event.category,
        title = event.title,
    );
}

fn print_details(app: &EventsApp, event: &Event) {
    let mut lines = vec![
        event.title.clone(),
        format!("When: {}", format_event_datetime(&event.starts_at_iso)),
        format!("Category: {}", event.category),
    ];
    if let Some(location) = event.location() {
        lines.push(format!("Where: {location}"));
    }
    if let Some(address) = &event.address {
        lines.push(format!("Address: {address}"));
    }
    if let Some(description) = &event.description {
        lines.push(String::new());
        lines.push(description.clone());
    }
    if let Some(url) = &event.url {
        lines.push(format!("Link: {url}"));
    }
    if app.is_favorite(&event.id) {
        lines.push("★ Favorite".to_string());
    }
    println!("{}", lines.join("\n"));
}
