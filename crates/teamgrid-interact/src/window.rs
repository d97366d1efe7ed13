use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use teamgrid_core::{Clock, GridError, GridResult};
use teamgrid_domain::Quarter;
use teamgrid_persistence::{DateSpan, SettingsStore};

const SETTINGS_SCOPE: &str = "grid";
const WINDOW_KEY: &str = "quarter_window";

/// Which end of the window a prompt would extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowEdge {
    Append,
    Prepend,
}

/// A request for user confirmation before the window grows. Produced when
/// navigation runs past a loaded edge; never produced by the silent
/// auto-extension on writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterPrompt {
    pub quarter: Quarter,
    pub edge: WindowEdge,
}

/// Tracks which calendar quarters are loaded and the visible-week pointer.
///
/// The loaded list is persisted in the settings store and filtered on every
/// load and persist: a quarter whose end date has passed is dropped and
/// never comes back, even if it was loaded before.
pub struct QuarterWindowManager {
    quarters: Vec<Quarter>,
    visible_week: usize,
    settings: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
}

impl QuarterWindowManager {
    pub fn new(settings: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            quarters: Vec::new(),
            visible_week: 0,
            settings,
            clock,
        }
    }

    pub fn quarters(&self) -> &[Quarter] {
        &self.quarters
    }

    pub fn visible_week(&self) -> usize {
        self.visible_week
    }

    /// Restore the persisted window, dropping past quarters. An empty or
    /// fully expired window is seeded with the current quarter.
    pub async fn load(&mut self) -> GridResult<()> {
        let stored = self.settings.get(SETTINGS_SCOPE, WINDOW_KEY).await?;
        let mut quarters: Vec<Quarter> = match stored {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| GridError::Serialization(e.to_string()))?,
            None => Vec::new(),
        };

        let today = self.clock.today();
        quarters.retain(|q| q.last_day() >= today);
        if quarters.is_empty() {
            quarters.push(Quarter::containing(today));
        }

        tracing::info!("Loaded quarter window: {} quarter(s)", quarters.len());
        self.quarters = quarters;
        self.visible_week = 0;
        Ok(())
    }

    /// Write the window back, filtering past quarters again first.
    pub async fn persist(&mut self) -> GridResult<()> {
        let today = self.clock.today();
        self.quarters.retain(|q| q.last_day() >= today);

        let value = serde_json::to_value(&self.quarters)
            .map_err(|e| GridError::Serialization(e.to_string()))?;
        self.settings.set(SETTINGS_SCOPE, WINDOW_KEY, value).await
    }

    /// Monday week-start sequence for the whole window, concatenated per
    /// quarter in list order.
    pub fn weeks_for_window(&self) -> Vec<NaiveDate> {
        self.quarters
            .iter()
            .flat_map(|q| q.week_starts())
            .collect()
    }

    /// Full date range the window covers, including the partial boundary
    /// weeks. Used by the reload operation.
    pub fn date_range(&self) -> Option<DateSpan> {
        let weeks = self.weeks_for_window();
        let first = *weeks.first()?;
        let last = *weeks.last()? + chrono::Duration::days(6);
        Some(DateSpan::new(first, last))
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.quarters.iter().any(|q| q.contains(date))
    }

    /// Candidate quarter after the window's last entry. Mutates nothing; the
    /// caller shows the prompt and confirms explicitly.
    pub fn request_next_quarter(&self) -> GridResult<QuarterPrompt> {
        let last = self
            .quarters
            .last()
            .ok_or_else(|| GridError::Internal("quarter window is empty".into()))?;
        Ok(QuarterPrompt {
            quarter: last.next(),
            edge: WindowEdge::Append,
        })
    }

    pub fn request_previous_quarter(&self) -> GridResult<QuarterPrompt> {
        let first = self
            .quarters
            .first()
            .ok_or_else(|| GridError::Internal("quarter window is empty".into()))?;
        Ok(QuarterPrompt {
            quarter: first.prev(),
            edge: WindowEdge::Prepend,
        })
    }

    pub async fn confirm_append(&mut self, quarter: Quarter) -> GridResult<()> {
        if self.quarters.contains(&quarter) {
            return Err(GridError::Validation(format!("{quarter} is already loaded")));
        }
        self.quarters.push(quarter);
        tracing::info!("Appended {quarter} to the window");
        self.persist().await
    }

    /// Prepending inserts the quarter's weeks before everything currently
    /// visible, so the visible-week pointer resets to zero.
    pub async fn confirm_prepend(&mut self, quarter: Quarter) -> GridResult<()> {
        if self.quarters.contains(&quarter) {
            return Err(GridError::Validation(format!("{quarter} is already loaded")));
        }
        self.quarters.insert(0, quarter);
        self.visible_week = 0;
        tracing::info!("Prepended {quarter} to the window");
        self.persist().await
    }

    /// Silently append the next quarter when a write lands just past the
    /// window's end. No prompt: the user already performed the write and
    /// must not be blocked. Returns true if the window grew.
    pub async fn auto_append_if_needed(&mut self, date: NaiveDate) -> GridResult<bool> {
        if self.contains_date(date) {
            return Ok(false);
        }
        let Some(last) = self.quarters.last() else {
            return Ok(false);
        };
        let candidate = last.next();
        if !candidate.contains(date) {
            return Ok(false);
        }
        self.quarters.push(candidate);
        tracing::info!("Auto-extended window with {candidate} for write on {date}");
        self.persist().await?;
        Ok(true)
    }

    /// Step the visible week forward; past the last loaded week this returns
    /// the next-quarter prompt instead of moving.
    pub fn advance_week(&mut self) -> GridResult<Option<QuarterPrompt>> {
        if self.visible_week + 1 < self.weeks_for_window().len() {
            self.visible_week += 1;
            Ok(None)
        } else {
            self.request_next_quarter().map(Some)
        }
    }

    pub fn retreat_week(&mut self) -> GridResult<Option<QuarterPrompt>> {
        if self.visible_week > 0 {
            self.visible_week -= 1;
            Ok(None)
        } else {
            self.request_previous_quarter().map(Some)
        }
    }
}
