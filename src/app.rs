use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::time::{sleep_until, Instant};
use tracing::info;

use crate::catalog::{CatalogApi, CatalogClient};
use crate::favorites::FavoritesStore;
use crate::models::{Episode, Show};
use crate::notify::{ConsoleNotifier, Notifier};
use crate::render::{
    cast_lines, episodes_for_season, seasons, EpisodeLine, ShowCard, ShowSheet,
};

const SEARCH_MIN_CHARS: usize = 2;
const LIVE_MIN_CHARS: usize = 3;
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Parser)]
#[command(
    name = "tvshelf",
    version,
    about = "Browse the TVmaze catalog and keep a local favorites shelf"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the catalog for shows
    Search {
        /// Search terms, joined into one query
        query: Vec<String>,
    },
    /// Well-rated shows with artwork from the catalog's first listing page
    Popular,
    /// Full details for one show, including cast and episodes
    Show {
        id: i64,
        /// Only list episodes from this season
        #[arg(long)]
        season: Option<i64>,
    },
    /// Interactive search: every line restarts a short quiet period, and
    /// the last line standing is searched
    Live,
    /// Manage the favorites shelf
    Fav {
        #[command(subcommand)]
        action: FavCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavCommand {
    /// List favorites in the order they were added
    List,
    /// Fetch a show and add it to the shelf
    Add { id: i64 },
    /// Remove a show from the shelf
    Remove { id: i64 },
    /// Flip a show's favorite state
    Toggle { id: i64 },
    /// Remove every favorite
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print how many shows are on the shelf
    Count,
}

/// The services every command runs against, constructed once per
/// invocation and passed by reference. Tests swap in fakes through the
/// trait objects.
pub struct App {
    pub catalog: Arc<dyn CatalogApi>,
    pub store: FavoritesStore,
    pub notifier: Arc<dyn Notifier>,
}

pub async fn run(cli: Cli) -> Result<()> {
    let app = App {
        catalog: Arc::new(CatalogClient::from_env()?),
        store: FavoritesStore::from_env()?,
        notifier: Arc::new(ConsoleNotifier),
    };
    app.execute(cli.command).await
}

impl App {
    pub async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Search { query } => self.search(&query.join(" ")).await,
            Command::Popular => self.popular().await,
            Command::Show { id, season } => self.show(id, season).await,
            Command::Live => self.live().await,
            Command::Fav { action } => self.favorites(action).await,
        }
    }

    async fn search(&self, query: &str) -> Result<()> {
        if query.trim().chars().count() < SEARCH_MIN_CHARS {
            bail!("The search term must be at least {SEARCH_MIN_CHARS} characters.");
        }
        let shows = self.catalog.search_shows(query).await?;
        if shows.is_empty() {
            println!("No results were found for \"{}\".", query.trim());
            return Ok(());
        }
        info!("Found {} shows for \"{}\"", shows.len(), query.trim());
        self.print_show_cards(&shows);
        Ok(())
    }

    async fn popular(&self) -> Result<()> {
        let shows = self.catalog.popular_shows().await?;
        if shows.is_empty() {
            println!("Could not load featured shows.");
            return Ok(());
        }
        self.print_show_cards(&shows);
        Ok(())
    }

    async fn show(&self, id: i64, season: Option<i64>) -> Result<()> {
        let show = self.catalog.show_details(id).await?;
        // Supplementary sections load together and never fail the view.
        let (cast, episodes) = tokio::try_join!(
            self.catalog.show_cast(id),
            self.catalog.show_episodes(id)
        )?;

        self.print_sheet(&show);
        if !cast.is_empty() {
            println!("\nCast");
            for line in cast_lines(&cast) {
                println!("  {} as {}", line.name, line.character);
            }
        }
        if !episodes.is_empty() {
            self.print_episodes(&episodes, season);
        }
        Ok(())
    }

    fn print_episodes(&self, episodes: &[Episode], season: Option<i64>) {
        let available = seasons(episodes);
        match season {
            Some(wanted) if !available.contains(&wanted) => {
                let listed: Vec<String> = available.iter().map(i64::to_string).collect();
                println!("\nNo season {wanted}; available: {}", listed.join(", "));
            }
            Some(wanted) => {
                println!("\nSeason {wanted}");
                for episode in episodes_for_season(episodes, wanted) {
                    print_episode_line(&EpisodeLine::from_episode(episode));
                }
            }
            None => {
                for number in available {
                    println!("\nSeason {number}");
                    for episode in episodes_for_season(episodes, number) {
                        print_episode_line(&EpisodeLine::from_episode(episode));
                    }
                }
            }
        }
    }

    async fn live(&self) -> Result<()> {
        println!(
            "Type to search ({LIVE_MIN_CHARS}+ characters). An empty line clears, Ctrl-D exits."
        );
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        let mut debounce = Debouncer::new(SEARCH_DEBOUNCE);
        let mut pending: Option<String> = None;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(raw) => {
                            pending = Some(raw.trim().to_string());
                            debounce.poke();
                        }
                        None => break,
                    }
                }
                _ = debounce.ready(), if debounce.armed() => {
                    let Some(query) = pending.take() else { continue };
                    if query.is_empty() {
                        println!("(search cleared)");
                        continue;
                    }
                    if query.chars().count() < LIVE_MIN_CHARS {
                        continue;
                    }
                    // The search runs to completion before the next one can
                    // fire, so a stale result set never races a newer one.
                    match self.catalog.search_shows(&query).await {
                        Ok(shows) if shows.is_empty() => {
                            println!("No results were found for \"{query}\".");
                        }
                        Ok(shows) => self.print_show_cards(&shows),
                        Err(e) => eprintln!("{e}"),
                    }
                }
            }
        }
        Ok(())
    }

    async fn favorites(&self, action: FavCommand) -> Result<()> {
        match action {
            FavCommand::List => {
                let entries = self.store.load();
                if entries.is_empty() {
                    println!("You have no favorites yet.");
                    return Ok(());
                }
                let cards: Vec<ShowCard> = entries.iter().map(ShowCard::from_favorite).collect();
                self.print_cards(&cards);
            }
            FavCommand::Add { id } => {
                let show = self.catalog.show_details(id).await?;
                let m = self.store.add(&show);
                if m.changed {
                    self.notifier
                        .notify(&format!("Added \"{}\" to favorites", show.name), false);
                } else {
                    println!("\"{}\" is already a favorite.", show.name);
                }
                self.warn_if_not_durable(m.durable);
            }
            FavCommand::Remove { id } => {
                let m = self.store.remove(id);
                if m.changed {
                    self.notifier.notify("Removed from favorites", false);
                } else {
                    println!("Show {id} is not on your shelf.");
                }
                self.warn_if_not_durable(m.durable);
            }
            FavCommand::Toggle { id } => {
                let show = self.catalog.show_details(id).await?;
                let t = self.store.toggle(&show);
                let message = if t.favorite {
                    format!("Added \"{}\" to favorites", show.name)
                } else {
                    format!("Removed \"{}\" from favorites", show.name)
                };
                self.notifier.notify(&message, false);
                self.warn_if_not_durable(t.durable);
            }
            FavCommand::Clear { yes } => {
                let count = self.store.count();
                if count == 0 {
                    println!("You have no favorites to clear.");
                    return Ok(());
                }
                if !yes && !confirm(&format!("Remove all {count} favorites? This cannot be undone."))? {
                    println!("Kept your favorites.");
                    return Ok(());
                }
                let m = self.store.clear();
                self.notifier.notify("All favorites removed", false);
                self.warn_if_not_durable(m.durable);
            }
            FavCommand::Count => println!("{}", self.store.count()),
        }
        Ok(())
    }

    fn warn_if_not_durable(&self, durable: bool) {
        if !durable {
            self.notifier.notify(
                "Favorites could not be saved to disk; this change may not survive a restart.",
                true,
            );
        }
    }

    fn print_show_cards(&self, shows: &[Show]) {
        let cards: Vec<ShowCard> = shows.iter().map(ShowCard::from_show).collect();
        self.print_cards(&cards);
    }

    fn print_cards(&self, cards: &[ShowCard]) {
        for card in cards {
            for line in card_lines(card, self.store.is_favorite(card.id)) {
                println!("{line}");
            }
            println!();
        }
    }

    fn print_sheet(&self, show: &Show) {
        let sheet = ShowSheet::from_show(show);
        let heart = if self.store.is_favorite(show.id) {
            " ♥"
        } else {
            ""
        };
        println!("{}{}", sheet.title, heart);
        println!("  Rating:    {}", sheet.rating);
        println!("  Status:    {}", sheet.status);
        println!("  Genres:    {}", sheet.genres);
        println!("  Network:   {}", sheet.network);
        println!("  Premiered: {}", sheet.premiered);
        println!("  Runtime:   {}", sheet.runtime);
        println!("  Language:  {}", sheet.language);
        if let Some(site) = &sheet.official_site {
            println!("  Site:      {site}");
        }
        if let Some(image) = &sheet.image {
            println!("  Poster:    {image}");
        }
        println!("\n{}", sheet.summary);
    }
}

fn card_lines(card: &ShowCard, favorite: bool) -> Vec<String> {
    let heart = if favorite { " ♥" } else { "" };
    let mut lines = vec![format!(
        "#{} {}{}  [{}] {}",
        card.id, card.title, heart, card.rating, card.status
    )];
    if let Some(image) = &card.image {
        lines.push(format!("    {image}"));
    }
    if !card.genres.is_empty() {
        lines.push(format!("    {}", card.genres.join(" / ")));
    }
    lines.push(format!("    {}", card.summary));
    if let Some(added) = &card.added {
        lines.push(format!("    Added: {added}"));
    }
    lines
}

fn print_episode_line(line: &EpisodeLine) {
    let mut meta = Vec::new();
    if let Some(airdate) = &line.airdate {
        meta.push(airdate.clone());
    }
    if let Some(runtime) = &line.runtime {
        meta.push(runtime.clone());
    }
    if meta.is_empty() {
        println!("  {}  {}", line.code, line.title);
    } else {
        println!("  {}  {} ({})", line.code, line.title, meta.join(", "));
    }
    println!("      {}", line.summary);
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Restartable quiet-period timer: `poke` on every input event; `ready`
/// completes once a full delay has passed with no further poke.
#[derive(Debug)]
struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    fn poke(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    fn armed(&self) -> bool {
        self.deadline.is_some()
    }

    async fn ready(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn debounce_waits_out_the_full_quiet_period() {
        let start = Instant::now();
        let mut debounce = Debouncer::new(Duration::from_millis(500));
        debounce.poke();
        debounce.ready().await;
        assert_eq!(start.elapsed(), Duration::from_millis(500));
        assert!(!debounce.armed());
    }

    #[tokio::test(start_paused = true)]
    async fn each_event_restarts_the_delay() {
        let start = Instant::now();
        let mut debounce = Debouncer::new(Duration::from_millis(500));
        debounce.poke();
        tokio::time::advance(Duration::from_millis(300)).await;
        debounce.poke();
        tokio::time::advance(Duration::from_millis(300)).await;
        debounce.poke();
        debounce.ready().await;
        // Only the final poke's deadline counts: 300 + 300 + 500.
        assert_eq!(start.elapsed(), Duration::from_millis(1100));
    }

    #[test]
    fn unpoked_debouncer_is_not_armed() {
        let debounce = Debouncer::new(Duration::from_millis(500));
        assert!(!debounce.armed());
    }

    #[test]
    fn cards_render_their_artwork_and_favorite_mark() {
        let show: Show = serde_json::from_value(serde_json::json!({
            "id": 82,
            "name": "Game of Thrones",
            "status": "Ended",
            "rating": { "average": 8.9 },
            "image": { "medium": "https://static.tvmaze.com/82_m.jpg" }
        }))
        .unwrap();
        let card = ShowCard::from_show(&show);

        let lines = card_lines(&card, true);
        assert!(lines[0].contains("♥"));
        assert!(lines
            .iter()
            .any(|l| l.contains("https://static.tvmaze.com/82_m.jpg")));

        let lines = card_lines(&card, false);
        assert!(!lines[0].contains("♥"));
    }

    #[test]
    fn imageless_cards_skip_the_artwork_line() {
        let show: Show =
            serde_json::from_value(serde_json::json!({ "id": 1, "name": "X" })).unwrap();
        let lines = card_lines(&ShowCard::from_show(&show), false);
        assert_eq!(lines.len(), 2, "title and summary only: {lines:?}");
    }
}
