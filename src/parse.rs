use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::config::OnMissing;
use crate::request::{Fetch, Page};
use crate::writer::Row;
use crate::{warn_time, Error, Result};

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));
static LINK_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:spielbericht|verein|spieler)/(\d+)").expect("static regex"));
static RESULT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+:\d+").expect("static regex"));
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\d+\.\d+").expect("static regex"));

// Match report page.
const HOME_TEAM: &str =
    "div.box.sb-spielbericht-head div.box-content div.sb-team.sb-heim a.sb-vereinslink";
const AWAY_TEAM: &str =
    "div.box.sb-spielbericht-head div.box-content div.sb-team.sb-gast a.sb-vereinslink";
const RESULT: &str = "div.sb-spieldaten div.ergebnis-wrap div.sb-ergebnis div.sb-endstand";
const MATCHDAY: &str = "div.box.sb-spielbericht-head div.box-content div.sb-spieldaten p.sb-datum.hide-for-small a:nth-child(1)";
const MATCH_DATE: &str = "div.box.sb-spielbericht-head div.box-content div.sb-spieldaten p.sb-datum.hide-for-small a:nth-child(2)";
const HOME_GOALS: &str = "div.box div#sb-tore.sb-ereignisse ul li.sb-aktion-heim";
const AWAY_GOALS: &str = "div.box div#sb-tore.sb-ereignisse ul li.sb-aktion-gast";
const HOME_SUBSTITUTIONS: &str = "div.box div#sb-wechsel.sb-ereignisse ul li.sb-aktion-heim";
const AWAY_SUBSTITUTIONS: &str = "div.box div#sb-wechsel.sb-ereignisse ul li.sb-aktion-gast";
const HOME_CARDS: &str = "div.box div#sb-karten.sb-ereignisse ul li.sb-aktion-heim";
const AWAY_CARDS: &str = "div.box div#sb-karten.sb-ereignisse ul li.sb-aktion-gast";
const STATISTICS_LINK: &str = "li#statistik a.tm-subnav-item.megamenu";

// Single event inside one of the lists above.
const ACTION: &str = "div.sb-aktion div.sb-aktion-aktion";
const ACTION_PLAYER: &str = "div.sb-aktion div.sb-aktion-aktion a.wichtig";
const PLAYER_IN: &str = "div.sb-aktion div.sb-aktion-aktion span.sb-aktion-wechsel-ein a.wichtig";
const PLAYER_OUT: &str = "div.sb-aktion div.sb-aktion-aktion span.sb-aktion-wechsel-aus a.wichtig";
const YELLOW_CARD: &str = "div.sb-aktion div.sb-aktion-spielstand span.sb-sprite.sb-gelb";
const YELLOW_RED_CARD: &str = "div.sb-aktion-spielstand span.sb-sprite.sb-gelbrot";
const RED_CARD: &str = "div.sb-aktion div.sb-aktion-spielstand span.sb-sprite.sb-rot";

// Statistics sub-page.
const HOME_STAT: &str =
    "div.box div.sb-statistik ul li.sb-statistik-heim div div.sb-statistik-zahl";
const AWAY_STAT: &str =
    "div.box div.sb-statistik ul li.sb-statistik-gast div div.sb-statistik-zahl";

/// Number of paired figures on the statistics page, in page order:
/// total shots, shots off target, shots saved, corners, free kicks, fouls, offsides.
const STAT_COUNT: usize = 7;

const MATCH_COLUMNS: [&str; 14] = [
    "match_id",
    "home_team_id",
    "home_team",
    "away_team_id",
    "away_team",
    "result",
    "matchday",
    "match_date",
    "home_goals",
    "away_goals",
    "home_substitutions",
    "away_substitutions",
    "home_cards",
    "away_cards",
];

const STAT_COLUMNS: [&str; 2 * STAT_COUNT] = [
    "home_total_shots",
    "away_total_shots",
    "home_shots_off_target",
    "away_shots_off_target",
    "home_shots_saved",
    "away_shots_saved",
    "home_corners",
    "away_corners",
    "home_freekicks",
    "away_freekicks",
    "home_fouls",
    "away_fouls",
    "home_offsides",
    "away_offsides",
];

/// Turns a fetched page into a record ready for the output file.
#[async_trait]
pub trait Extract: Send + Sync {
    type Record: Row + Send + Sync;

    async fn extract(&self, page: &Page) -> Result<Self::Record>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchGoal {
    pub match_id: String,
    pub scorer_id: Option<String>,
    pub scorer: Option<String>,
    pub goal_type: Option<String>,
    pub assist_id: Option<String>,
    pub assist: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSubstitute {
    pub match_id: String,
    pub player_in_id: Option<String>,
    pub player_in: Option<String>,
    pub player_out_id: Option<String>,
    pub player_out: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardKind {
    Yellow,
    YellowRed,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCard {
    pub match_id: String,
    pub player_id: String,
    pub player: String,
    pub card: Option<CardKind>,
}

/// Home and away figures, `None` where the page had nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchStatistics {
    pub home: [Option<String>; STAT_COUNT],
    pub away: [Option<String>; STAT_COUNT],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub match_id: String,
    pub home_team_id: String,
    pub home_team: String,
    pub away_team_id: String,
    pub away_team: String,
    pub result: String,
    pub matchday: String,
    pub match_date: String,
    pub home_goals: Vec<MatchGoal>,
    pub away_goals: Vec<MatchGoal>,
    pub home_substitutions: Vec<MatchSubstitute>,
    pub away_substitutions: Vec<MatchSubstitute>,
    pub home_cards: Vec<MatchCard>,
    pub away_cards: Vec<MatchCard>,
    pub statistics: MatchStatistics,
}

impl Row for MatchRecord {
    fn columns() -> Vec<&'static str> {
        MATCH_COLUMNS.iter().chain(STAT_COLUMNS.iter()).copied().collect()
    }

    fn fields(&self) -> Result<Vec<String>> {
        let mut fields = vec![
            self.match_id.clone(),
            self.home_team_id.clone(),
            self.home_team.clone(),
            self.away_team_id.clone(),
            self.away_team.clone(),
            self.result.clone(),
            self.matchday.clone(),
            self.match_date.clone(),
            serde_json::to_string(&self.home_goals)?,
            serde_json::to_string(&self.away_goals)?,
            serde_json::to_string(&self.home_substitutions)?,
            serde_json::to_string(&self.away_substitutions)?,
            serde_json::to_string(&self.home_cards)?,
            serde_json::to_string(&self.away_cards)?,
        ];
        for (home, away) in self.statistics.home.iter().zip(&self.statistics.away) {
            fields.push(home.clone().unwrap_or_default());
            fields.push(away.clone().unwrap_or_default());
        }
        Ok(fields)
    }
}

/// Extracts match reports and follows their link to the statistics page
/// through the same fetcher the crawl uses.
pub struct MatchExtractor<F> {
    fetcher: F,
    base_url: String,
    stats_attempts: usize,
    on_missing: OnMissing,
}

impl<F: Fetch> MatchExtractor<F> {
    pub fn new(
        fetcher: F,
        base_url: impl Into<String>,
        stats_attempts: usize,
        on_missing: OnMissing,
    ) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            stats_attempts,
            on_missing,
        }
    }

    async fn statistics(&self, href: &str, report_url: &str) -> Result<MatchStatistics> {
        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}{href}", self.base_url.trim_end_matches('/'))
        };

        for attempt in 1..=self.stats_attempts {
            match self.fetcher.fetch(&url).await {
                Some(page) if page.is_success() => {
                    return parse_statistics(&page.body, report_url, self.on_missing)
                }
                _ => warn_time!("statistics attempt {attempt}/{} failed: {url}", self.stats_attempts),
            }
        }
        note_missing(self.on_missing, "statistics", report_url)?;
        Ok(MatchStatistics::default())
    }
}

#[async_trait]
impl<F: Fetch> Extract for MatchExtractor<F> {
    type Record = MatchRecord;

    async fn extract(&self, page: &Page) -> Result<MatchRecord> {
        let (mut record, stats_href) = parse_report(page, self.on_missing)?;
        record.statistics = match stats_href {
            Some(href) => self.statistics(&href, &page.url).await?,
            None => {
                note_missing(self.on_missing, "statistics link", &page.url)?;
                MatchStatistics::default()
            }
        };
        Ok(record)
    }
}

/// Parses the report page. Statistics are left empty, the link to them is returned alongside.
pub fn parse_report(page: &Page, on_missing: OnMissing) -> Result<(MatchRecord, Option<String>)> {
    let doc = Html::parse_document(&page.body);
    let url = page.url.as_str();

    let match_id = link_id(url).ok_or_else(|| required("match_id", url))?;
    let (home_team_id, home_team) = team(&doc, HOME_TEAM, "home_team", url)?;
    let (away_team_id, away_team) = team(&doc, AWAY_TEAM, "away_team", url)?;
    let result = select_text(&doc, RESULT)?
        .and_then(|t| find(&RESULT_RE, &t))
        .ok_or_else(|| required("result", url))?;
    let matchday = select_text(&doc, MATCHDAY)?
        .and_then(|t| find(&DIGITS_RE, &t))
        .ok_or_else(|| required("matchday", url))?;
    let match_date = select_text(&doc, MATCH_DATE)?
        .and_then(|t| find(&DATE_RE, &t))
        .ok_or_else(|| required("match_date", url))?;

    let goals = |sel: &str| -> Result<Vec<MatchGoal>> {
        doc.select(&create_selector(sel)?)
            .map(|el| goal(&match_id, el, url, on_missing))
            .collect()
    };
    let substitutions = |sel: &str| -> Result<Vec<MatchSubstitute>> {
        doc.select(&create_selector(sel)?)
            .map(|el| substitute(&match_id, el, url, on_missing))
            .collect()
    };
    let cards = |sel: &str| -> Result<Vec<MatchCard>> {
        doc.select(&create_selector(sel)?)
            .map(|el| card(&match_id, el, url, on_missing))
            .collect()
    };

    let record = MatchRecord {
        home_goals: goals(HOME_GOALS)?,
        away_goals: goals(AWAY_GOALS)?,
        home_substitutions: substitutions(HOME_SUBSTITUTIONS)?,
        away_substitutions: substitutions(AWAY_SUBSTITUTIONS)?,
        home_cards: cards(HOME_CARDS)?,
        away_cards: cards(AWAY_CARDS)?,
        match_id,
        home_team_id,
        home_team,
        away_team_id,
        away_team,
        result,
        matchday,
        match_date,
        statistics: MatchStatistics::default(),
    };

    let stats_href = doc
        .select(&create_selector(STATISTICS_LINK)?)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    Ok((record, stats_href))
}

/// Reads the paired figures of the statistics page. Short lists leave the tail empty.
pub fn parse_statistics(html: &str, report_url: &str, on_missing: OnMissing) -> Result<MatchStatistics> {
    let doc = Html::parse_document(html);
    let figures = |sel: &str| -> Result<Vec<String>> {
        Ok(doc.select(&create_selector(sel)?).map(text).collect())
    };
    let home = figures(HOME_STAT)?;
    let away = figures(AWAY_STAT)?;

    if home.len() < STAT_COUNT || away.len() < STAT_COUNT {
        note_missing(on_missing, "statistics figures", report_url)?;
    }

    let mut stats = MatchStatistics::default();
    for i in 0..STAT_COUNT {
        stats.home[i] = home.get(i).cloned();
        stats.away[i] = away.get(i).cloned();
    }
    Ok(stats)
}

fn goal(match_id: &str, el: ElementRef, url: &str, on_missing: OnMissing) -> Result<MatchGoal> {
    let players: Vec<ElementRef> = el.select(&create_selector(ACTION_PLAYER)?).collect();
    let scorer = players.first();
    // Not every goal has an assist.
    let assist = players.get(1);
    if scorer.is_none() {
        note_missing(on_missing, "goal scorer", url)?;
    }

    // "Scorer, Right-footed shot, 1. Goal of the Season\nAssist: ..."
    let goal_type = el
        .select(&create_selector(ACTION)?)
        .next()
        .map(text)
        .and_then(|t| {
            t.split([',', '\n'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .nth(1)
                .map(str::to_string)
        });
    if goal_type.is_none() {
        note_missing(on_missing, "goal type", url)?;
    }

    Ok(MatchGoal {
        match_id: match_id.to_string(),
        scorer_id: scorer.and_then(|a| href_id(*a)),
        scorer: scorer.map(|a| text(*a)),
        goal_type,
        assist_id: assist.and_then(|a| href_id(*a)),
        assist: assist.map(|a| text(*a)),
    })
}

fn substitute(match_id: &str, el: ElementRef, url: &str, on_missing: OnMissing) -> Result<MatchSubstitute> {
    let player_in = el.select(&create_selector(PLAYER_IN)?).next();
    let player_out = el.select(&create_selector(PLAYER_OUT)?).next();
    if player_in.is_none() {
        note_missing(on_missing, "substitution player in", url)?;
    }
    if player_out.is_none() {
        note_missing(on_missing, "substitution player out", url)?;
    }

    Ok(MatchSubstitute {
        match_id: match_id.to_string(),
        player_in_id: player_in.and_then(href_id),
        player_in: player_in.map(text),
        player_out_id: player_out.and_then(href_id),
        player_out: player_out.map(text),
    })
}

fn card(match_id: &str, el: ElementRef, url: &str, on_missing: OnMissing) -> Result<MatchCard> {
    let player = el
        .select(&create_selector(ACTION_PLAYER)?)
        .next()
        .ok_or_else(|| required("card player", url))?;
    let player_id = href_id(player).ok_or_else(|| required("card player id", url))?;

    let has = |sel: &str| -> Result<bool> { Ok(el.select(&create_selector(sel)?).next().is_some()) };
    let card = if has(YELLOW_CARD)? {
        Some(CardKind::Yellow)
    } else if has(YELLOW_RED_CARD)? {
        Some(CardKind::YellowRed)
    } else if has(RED_CARD)? {
        Some(CardKind::Red)
    } else {
        note_missing(on_missing, "card colour", url)?;
        None
    };

    Ok(MatchCard {
        match_id: match_id.to_string(),
        player_id,
        player: text(player),
        card,
    })
}

fn team(doc: &Html, sel: &str, field: &'static str, url: &str) -> Result<(String, String)> {
    let link = doc
        .select(&create_selector(sel)?)
        .next()
        .ok_or_else(|| required(field, url))?;
    let id = href_id(link).ok_or_else(|| required(field, url))?;
    Ok((id, text(link)))
}

fn select_text(doc: &Html, sel: &str) -> Result<Option<String>> {
    Ok(doc.select(&create_selector(sel)?).next().map(text))
}

fn text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn href_id(el: ElementRef) -> Option<String> {
    el.value().attr("href").and_then(link_id)
}

/// Id embedded in a site link: the number after `/spielbericht/`, `/verein/` or
/// `/spieler/`, else the first run of digits. Slugs like `fc-schalke-04` are skipped.
pub fn link_id(s: &str) -> Option<String> {
    LINK_ID_RE
        .captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .or_else(|| find(&DIGITS_RE, s))
}

fn find(re: &Regex, s: &str) -> Option<String> {
    re.find(s).map(|m| m.as_str().to_string())
}

fn required(field: &'static str, url: &str) -> Error {
    Error::ExtractMissingField {
        field,
        url: url.to_string(),
    }
}

fn note_missing(on_missing: OnMissing, field: &'static str, url: &str) -> Result<()> {
    match on_missing {
        OnMissing::Fail => Err(required(field, url)),
        OnMissing::SkipAndLog => {
            warn_time!("missing {field} on {url}");
            Ok(())
        }
    }
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseInvalidSelector(sel_str.into()))
}
