//! Pure projections from catalog and favorites data to presentation
//! structures. No I/O and no store or client dependency: the frontend
//! decides how to draw these, tests assert on them directly.

use chrono::NaiveDate;

use crate::models::{CastEntry, Episode, FavoriteEntry, Show};

pub const CARD_SUMMARY_CHARS: usize = 150;
pub const EPISODE_SUMMARY_CHARS: usize = 200;
pub const CARD_GENRE_LIMIT: usize = 3;
pub const CAST_LIMIT: usize = 12;

const NO_SUMMARY: &str = "No description available.";

/// Compact card for search results, the featured grid, and the favorites
/// list.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowCard {
    pub id: i64,
    pub title: String,
    /// One decimal ("8.2") or "N/A".
    pub rating: String,
    pub status: String,
    /// At most `CARD_GENRE_LIMIT` entries.
    pub genres: Vec<String>,
    /// Stripped of HTML, truncated to `CARD_SUMMARY_CHARS`.
    pub summary: String,
    pub image: Option<String>,
    /// Formatted added date; only favorites cards carry one.
    pub added: Option<String>,
}

impl ShowCard {
    pub fn from_show(show: &Show) -> Self {
        Self {
            id: show.id,
            title: show.name.clone(),
            rating: card_rating(show.rating_average()),
            status: show.status.clone().unwrap_or_else(|| "Unknown".to_string()),
            genres: show.genres.iter().take(CARD_GENRE_LIMIT).cloned().collect(),
            summary: card_summary(show.summary.as_deref(), CARD_SUMMARY_CHARS),
            image: show.medium_image().map(str::to_string),
            added: None,
        }
    }

    pub fn from_favorite(entry: &FavoriteEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.name.clone(),
            rating: card_rating(entry.rating_average()),
            status: entry
                .status
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            genres: entry
                .genres
                .iter()
                .take(CARD_GENRE_LIMIT)
                .cloned()
                .collect(),
            summary: card_summary(entry.summary.as_deref(), CARD_SUMMARY_CHARS),
            image: entry.image.as_ref().and_then(|i| i.medium.clone()),
            added: Some(format_date(&entry.added_date.format("%Y-%m-%d").to_string())),
        }
    }
}

/// Full details view of a single show.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowSheet {
    pub title: String,
    /// "8.9/10" or "Unrated".
    pub rating: String,
    pub status: String,
    pub genres: String,
    /// Network name, falling back to the web channel.
    pub network: String,
    pub premiered: String,
    /// "60 minutes", or "~61 minutes" from the average when the show has no
    /// fixed runtime.
    pub runtime: String,
    pub language: String,
    pub official_site: Option<String>,
    /// Full summary, HTML stripped.
    pub summary: String,
    /// Original image, falling back to medium.
    pub image: Option<String>,
}

impl ShowSheet {
    pub fn from_show(show: &Show) -> Self {
        let network = show
            .network
            .as_ref()
            .or(show.web_channel.as_ref())
            .map(|n| n.name.clone())
            .unwrap_or_else(|| "Unavailable".to_string());
        let runtime = match (show.runtime, show.average_runtime) {
            (Some(minutes), _) => format!("{minutes} minutes"),
            (None, Some(minutes)) => format!("~{minutes} minutes"),
            (None, None) => "Unavailable".to_string(),
        };
        Self {
            title: show.name.clone(),
            rating: show
                .rating_average()
                .map(|avg| format!("{avg}/10"))
                .unwrap_or_else(|| "Unrated".to_string()),
            status: show.status.clone().unwrap_or_else(|| "Unknown".to_string()),
            genres: if show.genres.is_empty() {
                "Unavailable".to_string()
            } else {
                show.genres.join(", ")
            },
            network,
            premiered: show
                .premiered
                .as_deref()
                .map(format_date)
                .unwrap_or_else(|| "Unavailable".to_string()),
            runtime,
            language: show
                .language
                .clone()
                .unwrap_or_else(|| "Unavailable".to_string()),
            official_site: show.official_site.clone(),
            summary: show
                .summary
                .as_deref()
                .map(strip_html)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| NO_SUMMARY.to_string()),
            image: show.image.as_ref().and_then(|i| {
                i.original.clone().or_else(|| i.medium.clone())
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastLine {
    pub name: String,
    pub character: String,
}

/// The main cast: first `CAST_LIMIT` entries.
pub fn cast_lines(cast: &[CastEntry]) -> Vec<CastLine> {
    cast.iter()
        .take(CAST_LIMIT)
        .map(|member| CastLine {
            name: member.person.name.clone(),
            character: member
                .character
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Unknown role".to_string()),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeLine {
    /// "S1E5", or "S1 Special" when the episode has no number.
    pub code: String,
    pub title: String,
    pub airdate: Option<String>,
    pub runtime: Option<String>,
    pub summary: String,
}

impl EpisodeLine {
    pub fn from_episode(episode: &Episode) -> Self {
        let code = match episode.number {
            Some(number) => format!("S{}E{}", episode.season, number),
            None => format!("S{} Special", episode.season),
        };
        Self {
            code,
            title: episode
                .name
                .clone()
                .unwrap_or_else(|| "Untitled episode".to_string()),
            airdate: episode.airdate.as_deref().map(format_date),
            runtime: episode.runtime.map(|minutes| format!("{minutes} min")),
            summary: card_summary(episode.summary.as_deref(), EPISODE_SUMMARY_CHARS),
        }
    }
}

/// Distinct season numbers in ascending order, for the season picker.
pub fn seasons(episodes: &[Episode]) -> Vec<i64> {
    let mut out: Vec<i64> = episodes.iter().map(|e| e.season).collect();
    out.sort_unstable();
    out.dedup();
    out
}

pub fn episodes_for_season(episodes: &[Episode], season: i64) -> Vec<&Episode> {
    episodes.iter().filter(|e| e.season == season).collect()
}

fn card_rating(average: Option<f64>) -> String {
    average
        .map(|avg| format!("{avg:.1}"))
        .unwrap_or_else(|| "N/A".to_string())
}

fn card_summary(summary: Option<&str>, limit: usize) -> String {
    match summary.map(strip_html).filter(|s| !s.is_empty()) {
        Some(text) => truncate_chars(&text, limit),
        None => NO_SUMMARY.to_string(),
    }
}

/// Strips tags and decodes the handful of entities TVmaze summaries use.
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '<' {
            for c in chars.by_ref() {
                if c == '>' {
                    break;
                }
            }
            continue;
        }
        if ch != '&' {
            out.push(ch);
            continue;
        }
        // Only a short alphanumeric run ending in ';' is an entity
        // candidate; a bare '&' and whatever follows it pass through
        // unchanged.
        let mut entity = String::new();
        let mut terminated = false;
        while let Some(&c) = chars.peek() {
            if c == ';' {
                chars.next();
                terminated = true;
                break;
            }
            if !c.is_ascii_alphanumeric() || entity.len() >= 8 {
                break;
            }
            entity.push(c);
            chars.next();
        }
        if !terminated {
            out.push('&');
            out.push_str(&entity);
            continue;
        }
        match entity.as_str() {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            "nbsp" => out.push(' '),
            other => {
                out.push('&');
                out.push_str(other);
                out.push(';');
            }
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts on a character boundary and appends an ellipsis, like the cards cut
/// long summaries.
pub fn truncate_chars(input: &str, limit: usize) -> String {
    if input.chars().count() <= limit {
        return input.to_string();
    }
    let cut: String = input.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}

/// "2011-04-17" -> "April 17, 2011"; anything unparseable passes through.
pub fn format_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%B %-d, %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn show_value() -> serde_json::Value {
        json!({
            "id": 82,
            "name": "Game of Thrones",
            "genres": ["Drama", "Adventure", "Fantasy", "War"],
            "status": "Ended",
            "rating": { "average": 8.9 },
            "image": {
                "medium": "https://static.tvmaze.com/82_m.jpg",
                "original": "https://static.tvmaze.com/82.jpg"
            },
            "network": { "name": "HBO" },
            "premiered": "2011-04-17",
            "runtime": 60,
            "language": "English",
            "summary": "<p>Seven noble families fight for control of the mythical land of Westeros. Friction between the houses leads to full-scale war. All while a very ancient evil awakens in the farthest north.</p>"
        })
    }

    #[test]
    fn card_truncates_summary_and_limits_genres() {
        let show: Show = serde_json::from_value(show_value()).unwrap();
        let card = ShowCard::from_show(&show);
        assert_eq!(card.rating, "8.9");
        assert_eq!(card.genres, vec!["Drama", "Adventure", "Fantasy"]);
        assert!(card.summary.ends_with("..."));
        assert!(!card.summary.contains('<'));
        assert!(card.summary.chars().count() <= CARD_SUMMARY_CHARS + 3);
        assert!(card.added.is_none());
    }

    #[test]
    fn card_handles_missing_everything() {
        let show: Show = serde_json::from_value(json!({ "id": 1, "name": "X" })).unwrap();
        let card = ShowCard::from_show(&show);
        assert_eq!(card.rating, "N/A");
        assert_eq!(card.status, "Unknown");
        assert!(card.genres.is_empty());
        assert_eq!(card.summary, "No description available.");
        assert!(card.image.is_none());
    }

    #[test]
    fn favorite_card_carries_added_date() {
        let show: Show = serde_json::from_value(show_value()).unwrap();
        let added = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        let entry = FavoriteEntry::from_show(&show, added);
        let card = ShowCard::from_favorite(&entry);
        assert_eq!(card.added.as_deref(), Some("March 5, 2026"));
        assert_eq!(card.title, "Game of Thrones");
    }

    #[test]
    fn sheet_formats_fields_and_falls_back() {
        let show: Show = serde_json::from_value(show_value()).unwrap();
        let sheet = ShowSheet::from_show(&show);
        assert_eq!(sheet.rating, "8.9/10");
        assert_eq!(sheet.network, "HBO");
        assert_eq!(sheet.premiered, "April 17, 2011");
        assert_eq!(sheet.runtime, "60 minutes");
        assert_eq!(sheet.image.as_deref(), Some("https://static.tvmaze.com/82.jpg"));

        let sparse: Show = serde_json::from_value(json!({
            "id": 2,
            "name": "Web Thing",
            "webChannel": { "name": "Netflix" },
            "averageRuntime": 55,
            "image": { "medium": "https://img/m.jpg" }
        }))
        .unwrap();
        let sheet = ShowSheet::from_show(&sparse);
        assert_eq!(sheet.rating, "Unrated");
        assert_eq!(sheet.network, "Netflix");
        assert_eq!(sheet.runtime, "~55 minutes");
        assert_eq!(sheet.image.as_deref(), Some("https://img/m.jpg"));
    }

    #[test]
    fn cast_lines_cap_at_twelve() {
        let cast: Vec<CastEntry> = (0..15)
            .map(|i| {
                serde_json::from_value(json!({
                    "person": { "name": format!("Actor {i}") },
                    "character": if i % 2 == 0 {
                        json!({ "name": format!("Role {i}") })
                    } else {
                        json!(null)
                    }
                }))
                .unwrap()
            })
            .collect();
        let lines = cast_lines(&cast);
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0].character, "Role 0");
        assert_eq!(lines[1].character, "Unknown role");
    }

    #[test]
    fn episode_lines_and_season_filter() {
        let episodes: Vec<Episode> = serde_json::from_value(json!([
            { "id": 1, "name": "Pilot", "season": 1, "number": 1,
              "airdate": "2011-04-17", "runtime": 60, "summary": "<p>Ned.</p>" },
            { "id": 2, "name": null, "season": 1, "number": 2 },
            { "id": 3, "name": "Special", "season": 2, "number": null },
            { "id": 4, "name": "Opener", "season": 2, "number": 1 }
        ]))
        .unwrap();

        let line = EpisodeLine::from_episode(&episodes[0]);
        assert_eq!(line.code, "S1E1");
        assert_eq!(line.airdate.as_deref(), Some("April 17, 2011"));
        assert_eq!(line.runtime.as_deref(), Some("60 min"));
        assert_eq!(line.summary, "Ned.");

        assert_eq!(EpisodeLine::from_episode(&episodes[1]).title, "Untitled episode");
        assert_eq!(EpisodeLine::from_episode(&episodes[2]).code, "S2 Special");

        assert_eq!(seasons(&episodes), vec![1, 2]);
        let second: Vec<i64> = episodes_for_season(&episodes, 2)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(second, vec![3, 4]);
    }

    #[test]
    fn strip_html_decodes_entities_and_collapses_whitespace() {
        assert_eq!(
            strip_html("<p>Tom &amp; Jerry&nbsp;&mdash; <b>chaos</b></p>"),
            "Tom & Jerry &mdash; chaos"
        );
        assert_eq!(strip_html("no markup"), "no markup");
        assert_eq!(strip_html("<p></p>"), "");
    }

    #[test]
    fn bare_ampersands_pass_through_unchanged() {
        assert_eq!(strip_html("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(
            strip_html("S&P 500 index rose today"),
            "S&P 500 index rose today"
        );
        assert_eq!(strip_html("Law & Order: SVU &"), "Law & Order: SVU &");
        // Runs longer than any entity name keep every character.
        assert_eq!(
            strip_html("&incrediblylongrun without a terminator"),
            "&incrediblylongrun without a terminator"
        );
        assert_eq!(strip_html("fish &; chips"), "fish &; chips");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("short", 150), "short");
        let truncated = truncate_chars(&"é".repeat(200), 150);
        assert_eq!(truncated.chars().count(), 153);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn unparseable_dates_pass_through() {
        assert_eq!(format_date("sometime"), "sometime");
        assert_eq!(format_date("2020-01-05"), "January 5, 2020");
    }

    #[test]
    fn card_rating_keeps_one_decimal() {
        let show = Show {
            rating: Some(Rating { average: Some(8.0) }),
            ..serde_json::from_value(json!({ "id": 9, "name": "Y" })).unwrap()
        };
        assert_eq!(ShowCard::from_show(&show).rating, "8.0");
    }
}
