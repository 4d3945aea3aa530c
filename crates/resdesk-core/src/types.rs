use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

/// One dish line on a reservation's pre-order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodOrder {
    pub item: String,
    pub quantity: u32,
    /// Unit price in the restaurant's currency; never negative.
    pub price: f64,
    /// Dietary labels for the dish, e.g. `"vegan"` or `"gluten-free"`.
    pub dietary_tags: Vec<String>,
}

impl FoodOrder {
    /// Returns `price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Upstream context (reviews, emails, prior bookings) carried for display.
///
/// Stored and handed back as-is; nothing in the pipeline looks inside.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OriginalData(Value);

impl OriginalData {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

/// A booking after normalization.
///
/// Every sequence field is always present (possibly empty) and `client_name`
/// is never empty. Build these through [`crate::normalize`]; the pipeline
/// treats them as immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reservation {
    pub client_name: String,
    pub date: NaiveDateTime,
    pub number_of_guests: u32,
    pub food_ordered: Vec<FoodOrder>,
    pub special_requests: Vec<String>,
    pub preferences: Vec<String>,
    pub is_vip: bool,
    #[serde(skip_serializing_if = "OriginalData::is_null")]
    pub original_data: OriginalData,
    /// Upstream fields the pipeline does not recognize, copied verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reservation {
    /// The calendar day of the booking, ignoring time of day.
    #[must_use]
    pub fn calendar_date(&self) -> NaiveDate {
        self.date.date()
    }

    #[must_use]
    pub fn has_special_requests(&self) -> bool {
        !self.special_requests.is_empty()
    }

    /// Returns `true` if at least one ordered dish carries a dietary tag.
    #[must_use]
    pub fn has_dietary_restrictions(&self) -> bool {
        self.food_ordered.iter().any(|o| !o.dietary_tags.is_empty())
    }

    /// Sum of `price * quantity` over every food order.
    #[must_use]
    pub fn revenue(&self) -> f64 {
        self.food_ordered.iter().map(FoodOrder::line_total).sum()
    }

    /// Stable identifier for this booking's message thread, e.g.
    /// `"emily-chen-2025-01-10"`.
    #[must_use]
    pub fn thread_key(&self) -> String {
        let slug = self
            .client_name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        format!("{slug}-{}", self.calendar_date().format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    /// When the upstream batch job produced the dataset, if it says so legibly.
    pub processed_at: Option<NaiveDateTime>,
    pub input_file: String,
}

/// The envelope produced by one successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedData {
    pub metadata: Metadata,
    pub reservations: Vec<Reservation>,
}
