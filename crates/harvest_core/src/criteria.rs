use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::AppId;

/// Items at or below this id predate the target years and are skipped before any fetch.
pub const DEFAULT_MIN_APP_ID: AppId = 1_200_000;
pub const DEFAULT_YEAR_START: u16 = 2021;
pub const DEFAULT_YEAR_END: u16 = 2025;
pub const DEFAULT_ITEM_TYPE: &str = "game";

/// Immutable acceptance rules, built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub min_app_id: AppId,
    pub years: BTreeSet<u16>,
    pub item_type: String,
}

impl FilterCriteria {
    pub fn new(min_app_id: AppId, years: RangeInclusive<u16>) -> Self {
        Self {
            min_app_id,
            years: years.collect(),
            item_type: DEFAULT_ITEM_TYPE.to_string(),
        }
    }

    pub fn with_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = item_type.into();
        self
    }

    /// Strictly greater than the threshold.
    pub fn accepts_id(&self, app_id: AppId) -> bool {
        app_id > self.min_app_id
    }

    pub fn accepts_year(&self, year: u16) -> bool {
        self.years.contains(&year)
    }
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_APP_ID, DEFAULT_YEAR_START..=DEFAULT_YEAR_END)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive() {
        let criteria = FilterCriteria::new(100, 2021..=2021);
        assert!(!criteria.accepts_id(100));
        assert!(criteria.accepts_id(101));
    }

    #[test]
    fn default_years_cover_2021_through_2025() {
        let criteria = FilterCriteria::default();
        assert_eq!(
            criteria.years.iter().copied().collect::<Vec<_>>(),
            vec![2021, 2022, 2023, 2024, 2025]
        );
        assert!(!criteria.accepts_year(2020));
        assert!(!criteria.accepts_year(2026));
    }

    #[test]
    fn empty_range_accepts_nothing() {
        #[allow(clippy::reversed_empty_ranges)]
        let criteria = FilterCriteria::new(0, 2025..=2021);
        assert!(criteria.years.is_empty());
        assert!(!criteria.accepts_year(2023));
    }
}
