use anyhow::Result;
use chrono::Weekday;

use crate::color_theory::{find_day_color, find_team_color};
use crate::model::{DayColor, Gender, MatchFormat, MatchRecord, TeamColor, same_venue};

/// Read-only source of historical matches and color data consumed by the
/// factor analyzers.
pub trait MatchRepository: Send + Sync {
    fn all_matches(&self, format: MatchFormat, gender: Gender) -> Result<Vec<MatchRecord>>;

    fn team_colors(&self) -> Result<Vec<TeamColor>>;

    fn day_colors(&self) -> Result<Vec<DayColor>>;

    fn matches_between(
        &self,
        team_a: &str,
        team_b: &str,
        format: MatchFormat,
        gender: Gender,
    ) -> Result<Vec<MatchRecord>> {
        Ok(self
            .all_matches(format, gender)?
            .into_iter()
            .filter(|m| m.is_between(team_a, team_b))
            .collect())
    }

    fn matches_at_venue(
        &self,
        stadium: &str,
        format: MatchFormat,
        gender: Gender,
    ) -> Result<Vec<MatchRecord>> {
        Ok(self
            .all_matches(format, gender)?
            .into_iter()
            .filter(|m| same_venue(&m.stadium, stadium))
            .collect())
    }

    fn team_color(&self, team: &str) -> Result<Option<TeamColor>> {
        let colors = self.team_colors()?;
        Ok(find_team_color(team, &colors).cloned())
    }

    fn day_color(&self, weekday: Weekday) -> Result<Option<DayColor>> {
        let colors = self.day_colors()?;
        Ok(find_day_color(weekday, &colors).cloned())
    }
}

/// Repository over data already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    pub matches: Vec<MatchRecord>,
    pub team_colors: Vec<TeamColor>,
    pub day_colors: Vec<DayColor>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matches(mut self, matches: impl IntoIterator<Item = MatchRecord>) -> Self {
        self.matches.extend(matches);
        self
    }

    pub fn with_team_colors(mut self, colors: impl IntoIterator<Item = TeamColor>) -> Self {
        self.team_colors.extend(colors);
        self
    }

    pub fn with_day_colors(mut self, colors: impl IntoIterator<Item = DayColor>) -> Self {
        self.day_colors.extend(colors);
        self
    }
}

impl MatchRepository for MemoryRepository {
    fn all_matches(&self, format: MatchFormat, gender: Gender) -> Result<Vec<MatchRecord>> {
        Ok(self
            .matches
            .iter()
            .filter(|m| m.format == format && m.gender == gender)
            .cloned()
            .collect())
    }

    fn team_colors(&self) -> Result<Vec<TeamColor>> {
        Ok(self.team_colors.clone())
    }

    fn day_colors(&self) -> Result<Vec<DayColor>> {
        Ok(self.day_colors.clone())
    }
}
