use serde::Deserialize;

/// Raw `data` object of a store detail response.
///
/// Every field is optional: the store omits or nulls most of them for
/// unreleased, delisted or non-game entries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppDetails {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub is_free: Option<bool>,
    pub release_date: Option<ReleaseDate>,
    pub price_overview: Option<PriceOverview>,
    pub categories: Option<Vec<Descriptor>>,
    pub genres: Option<Vec<Descriptor>>,
    pub developers: Option<Vec<String>>,
    pub publishers: Option<Vec<String>>,
    pub recommendations: Option<Recommendations>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReleaseDate {
    pub coming_soon: Option<bool>,
    pub date: Option<String>,
}

/// Prices are in minor currency units (cents).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PriceOverview {
    pub currency: Option<String>,
    #[serde(rename = "final")]
    pub final_price: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Recommendations {
    pub total: Option<u64>,
}

impl AppDetails {
    pub fn release_date_text(&self) -> &str {
        self.release_date
            .as_ref()
            .and_then(|rd| rd.date.as_deref())
            .unwrap_or("")
    }
}
