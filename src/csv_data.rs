use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Weekday;
use tracing::{debug, warn};

use crate::model::{
    DayColor, Gender, MatchFormat, MatchRecord, Team, TeamColor, parse_match_date,
};
use crate::repository::MatchRepository;

pub const INDEX_FILE: &str = "Index.csv";
pub const TEAMS_FILE: &str = "Teams.csv";
pub const TEAM_COLORS_FILE: &str = "team colors.csv";
pub const DAY_COLORS_FILE: &str = "day colors.csv";

/// One CSV row keyed by header name.
pub type Row = HashMap<String, String>;

/// Parsed CSV tables keyed by file name, shared by every repository built on it.
#[derive(Debug, Default)]
pub struct TableCache {
    tables: Mutex<HashMap<String, Arc<Vec<Row>>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached table for `file`, running `load` on a miss.
    /// Failed loads are not cached.
    pub fn get_or_load<F>(&self, file: &str, load: F) -> Result<Arc<Vec<Row>>>
    where
        F: FnOnce() -> Result<Vec<Row>>,
    {
        {
            let guard = self.tables.lock().expect("table cache lock poisoned");
            if let Some(table) = guard.get(file) {
                return Ok(Arc::clone(table));
            }
        }
        let loaded = Arc::new(load()?);
        let mut guard = self.tables.lock().expect("table cache lock poisoned");
        let table = guard.entry(file.to_string()).or_insert(loaded);
        Ok(Arc::clone(table))
    }

    /// Drops one table, or all of them with `None`.
    pub fn clear(&self, file: Option<&str>) {
        let mut guard = self.tables.lock().expect("table cache lock poisoned");
        match file {
            Some(file) => {
                guard.remove(file);
            }
            None => guard.clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.tables.lock().expect("table cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads a headed CSV table with trimmed cells. Blank lines are skipped.
pub fn parse_table<R: Read>(reader: R) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("read csv header")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read csv record {}", line + 2))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn cell<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).map(|v| v.trim()).unwrap_or("")
}

/// Builds a match from a row of a match file. Rows without both teams are dropped.
pub fn parse_match_row(row: &Row, format: MatchFormat, gender: Gender) -> Option<MatchRecord> {
    let (team_a, team_b) = cell(row, "Teams").split_once(" vs ")?;
    let (team_a, team_b) = (team_a.trim(), team_b.trim());
    if team_a.is_empty() || team_b.is_empty() {
        return None;
    }
    Some(MatchRecord {
        team_a: team_a.to_string(),
        team_b: team_b.to_string(),
        winner: cell(row, "WINNER").to_string(),
        format,
        gender,
        match_date: parse_match_date(cell(row, "Date")),
        stadium: stadium_from_venue(cell(row, "Venue")),
    })
}

/// `"Wankhede Stadium, Mumbai"` becomes `Wankhede Stadium`.
pub fn stadium_from_venue(venue: &str) -> String {
    let first = venue.split(',').next().unwrap_or(venue).trim();
    first
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(first)
        .trim()
        .to_string()
}

fn hex_after_hash(raw: &str) -> String {
    raw.split_once('#')
        .map(|(_, hex)| hex.trim().to_string())
        .unwrap_or_default()
}

pub fn parse_team_color(row: &Row) -> Option<TeamColor> {
    let team_name = cell(row, "Team Name");
    if team_name.is_empty() {
        return None;
    }
    Some(TeamColor {
        team_name: team_name.to_string(),
        primary_color: hex_after_hash(cell(row, "Jersey - Color 1")),
        secondary_color: hex_after_hash(cell(row, "Jersey - Color 2")),
    })
}

pub fn parse_day_color(row: &Row) -> Option<DayColor> {
    let day = cell(row, "दिन");
    let hex = cell(row, "Hex Code");
    if day.is_empty() || hex.is_empty() {
        return None;
    }
    let Some(weekday) = parse_weekday(day) else {
        debug!(day, "unrecognised weekday in day colors");
        return None;
    };
    Some(DayColor {
        weekday,
        color_hex: hex.to_string(),
        color_name: cell(row, "रंग").to_string(),
    })
}

/// Accepts Hindi weekday names as well as anything chrono parses ("Monday", "mon").
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    let day = match raw.trim() {
        "सोमवार" => Weekday::Mon,
        "मंगलवार" => Weekday::Tue,
        "बुधवार" => Weekday::Wed,
        "गुरुवार" => Weekday::Thu,
        "शुक्रवार" => Weekday::Fri,
        "शनिवार" => Weekday::Sat,
        "रविवार" => Weekday::Sun,
        other => return other.parse::<Weekday>().ok(),
    };
    Some(day)
}

/// Match, team and color data read from a directory of CSV files.
#[derive(Debug, Clone)]
pub struct CsvRepository {
    data_dir: PathBuf,
    cache: Arc<TableCache>,
}

impl CsvRepository {
    pub fn new(data_dir: impl Into<PathBuf>, cache: Arc<TableCache>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache(&self) -> &Arc<TableCache> {
        &self.cache
    }

    fn table(&self, file: &str) -> Result<Arc<Vec<Row>>> {
        self.cache.get_or_load(file, || {
            let path = self.data_dir.join(file);
            let handle = File::open(&path)
                .with_context(|| format!("open {}", path.display()))?;
            let rows = parse_table(handle).with_context(|| format!("parse {}", path.display()))?;
            debug!(file, rows = rows.len(), "loaded csv table");
            Ok(rows)
        })
    }

    /// File holding matches for `format`/`gender`, looked up in the index
    /// and falling back to `ODI.csv` / `T20.csv`.
    pub fn match_file(&self, format: MatchFormat, gender: Gender) -> String {
        let index = match self.table(INDEX_FILE) {
            Ok(index) => index,
            Err(err) => {
                debug!(error = %format!("{err:#}"), "match index unavailable");
                Arc::new(Vec::new())
            }
        };
        let entry = index.iter().find(|row| {
            cell(row, "Format").eq_ignore_ascii_case(format.label())
                && cell(row, "Gendre").eq_ignore_ascii_case(gender.label())
                && !cell(row, "File Name").is_empty()
        });
        match entry {
            Some(row) => cell(row, "File Name").to_string(),
            None => format!("{}.csv", format.label()),
        }
    }

    pub fn teams(&self) -> Result<Vec<Team>> {
        let rows = self.table(TEAMS_FILE)?;
        Ok(rows
            .iter()
            .filter(|row| !cell(row, "Team").is_empty())
            .map(|row| {
                let short = cell(row, "ShortName");
                Team {
                    name: cell(row, "Team").to_string(),
                    short_name: (!short.is_empty()).then(|| short.to_string()),
                }
            })
            .collect())
    }

    pub fn search_teams(&self, query: &str) -> Result<Vec<String>> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .teams()?
            .into_iter()
            .filter(|team| team.name.to_lowercase().contains(&needle))
            .map(|team| team.name)
            .collect())
    }

    /// Distinct stadium names across every format and gender, sorted.
    pub fn stadiums(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for format in MatchFormat::ALL {
            for gender in Gender::ALL {
                match self.all_matches(format, gender) {
                    Ok(matches) => {
                        names.extend(
                            matches
                                .into_iter()
                                .map(|m| m.stadium)
                                .filter(|s| !s.is_empty()),
                        );
                    }
                    Err(err) => {
                        debug!(%format, %gender, error = %format!("{err:#}"), "skipping match file");
                    }
                }
            }
        }
        names.into_iter().collect()
    }

    pub fn search_stadiums(&self, query: &str) -> Vec<String> {
        let needle = query.trim().to_lowercase();
        self.stadiums()
            .into_iter()
            .filter(|s| s.to_lowercase().contains(&needle))
            .collect()
    }

    /// City part of the first raw venue mentioning `stadium`, or the stadium itself.
    pub fn city_for_stadium(&self, stadium: &str) -> String {
        let stadium = stadium.trim();
        for format in MatchFormat::ALL {
            for gender in Gender::ALL {
                let Ok(rows) = self.table(&self.match_file(format, gender)) else {
                    continue;
                };
                for row in rows.iter() {
                    let venue = cell(row, "Venue");
                    if !venue.contains(stadium) {
                        continue;
                    }
                    if let Some(city) = venue.split(',').nth(1).map(str::trim)
                        && !city.is_empty()
                    {
                        return city.trim_matches('"').to_string();
                    }
                }
            }
        }
        stadium.to_string()
    }
}

impl MatchRepository for CsvRepository {
    fn all_matches(&self, format: MatchFormat, gender: Gender) -> Result<Vec<MatchRecord>> {
        let file = self.match_file(format, gender);
        let rows = self.table(&file)?;
        let matches: Vec<MatchRecord> = rows
            .iter()
            .filter_map(|row| parse_match_row(row, format, gender))
            .collect();
        if matches.len() < rows.len() {
            debug!(
                file = file.as_str(),
                dropped = rows.len() - matches.len(),
                "dropped match rows without both teams"
            );
        }
        Ok(matches)
    }

    fn team_colors(&self) -> Result<Vec<TeamColor>> {
        let rows = self.table(TEAM_COLORS_FILE)?;
        Ok(rows.iter().filter_map(parse_team_color).collect())
    }

    fn day_colors(&self) -> Result<Vec<DayColor>> {
        let rows = self.table(DAY_COLORS_FILE)?;
        let colors: Vec<DayColor> = rows.iter().filter_map(parse_day_color).collect();
        if colors.len() != 7 {
            warn!(count = colors.len(), "day colors table does not cover the whole week");
        }
        Ok(colors)
    }
}
