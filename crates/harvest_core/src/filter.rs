use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::{AcceptedRecord, AppDetails, AppId, Descriptor, FilterCriteria};

static YEAR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("year token pattern"));

/// Why a detail record was not accepted. Expected non-matches, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    WrongType { found: Option<String> },
    NoReleaseYear,
    YearOutOfRange { found: u16 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::WrongType { found: Some(kind) } => write!(f, "wrong item type {kind}"),
            Rejection::WrongType { found: None } => write!(f, "missing item type"),
            Rejection::NoReleaseYear => write!(f, "no release year"),
            Rejection::YearOutOfRange { found } => write!(f, "release year {found} out of range"),
        }
    }
}

/// First 4-digit token of `date_text` that belongs to `years`.
pub fn parse_release_year(date_text: &str, years: &BTreeSet<u16>) -> Option<u16> {
    year_tokens(date_text).find(|year| years.contains(year))
}

fn year_tokens(text: &str) -> impl Iterator<Item = u16> + '_ {
    YEAR_TOKEN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().parse::<u16>().ok()))
}

/// Turns raw detail records into normalized output records.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    criteria: FilterCriteria,
}

impl RecordFilter {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn apply(&self, app_id: AppId, details: &AppDetails) -> Result<AcceptedRecord, Rejection> {
        if details.kind.as_deref() != Some(self.criteria.item_type.as_str()) {
            return Err(Rejection::WrongType {
                found: details.kind.clone(),
            });
        }

        let date_text = details.release_date_text();
        let release_year = match parse_release_year(date_text, &self.criteria.years) {
            Some(year) => year,
            None => {
                return Err(match year_tokens(date_text).next() {
                    Some(found) => Rejection::YearOutOfRange { found },
                    None => Rejection::NoReleaseYear,
                })
            }
        };

        Ok(AcceptedRecord {
            appid: app_id,
            name: details.name.clone(),
            release_year,
            release_date: date_text.to_string(),
            genres: join_descriptions(details.genres.as_deref()),
            categories: join_descriptions(details.categories.as_deref()),
            price: normalized_price(details),
            recommendations: details
                .recommendations
                .as_ref()
                .and_then(|r| r.total)
                .unwrap_or(0),
            developer: join_names(details.developers.as_deref()),
            publisher: join_names(details.publishers.as_deref()),
        })
    }
}

/// Final price in major units; free items are always 0.
fn normalized_price(details: &AppDetails) -> f64 {
    if details.is_free == Some(true) {
        return 0.0;
    }
    details
        .price_overview
        .as_ref()
        .and_then(|p| p.final_price)
        .map(|cents| cents as f64 / 100.0)
        .unwrap_or(0.0)
}

fn join_descriptions(items: Option<&[Descriptor]>) -> String {
    items
        .unwrap_or_default()
        .iter()
        .map(|d| d.description.as_str())
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join(";")
}

fn join_names(items: Option<&[String]>) -> String {
    items.unwrap_or_default().join(";")
}
