//! Combinable filtering over a normalized reservation collection.

use chrono::NaiveDate;

use crate::types::Reservation;

/// Which calendar days a filter admits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateScope {
    #[default]
    All,
    /// Only reservations on this day, regardless of time of day.
    On(NaiveDate),
}

impl DateScope {
    #[must_use]
    pub fn admits(self, reservation: &Reservation) -> bool {
        match self {
            DateScope::All => true,
            DateScope::On(day) => reservation.calendar_date() == day,
        }
    }
}

/// Filter criteria. Every active criterion must hold for a record to match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub date_scope: DateScope,
    /// Case-insensitive substring over client name, special requests and
    /// dish names. `None` or empty matches everything.
    pub search_query: Option<String>,
    pub vip_only: bool,
    pub has_special_requests: bool,
    pub has_dietary_restrictions: bool,
}

impl FilterCriteria {
    #[must_use]
    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.date_scope.admits(reservation)
            && (!self.vip_only || reservation.is_vip)
            && (!self.has_special_requests || reservation.has_special_requests())
            && (!self.has_dietary_restrictions || reservation.has_dietary_restrictions())
            && self.matches_search(reservation)
    }

    fn matches_search(&self, reservation: &Reservation) -> bool {
        let Some(query) = self.search_query.as_deref().filter(|q| !q.is_empty()) else {
            return true;
        };
        let needle = query.to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

        contains(&reservation.client_name)
            || reservation.special_requests.iter().any(|r| contains(r))
            || reservation.food_ordered.iter().any(|o| contains(&o.item))
    }
}

/// Returns the matching reservations sorted by date ascending.
///
/// The sort is stable, so reservations at the same instant keep their input
/// order. The input is left untouched.
#[must_use]
pub fn filter_reservations(
    reservations: &[Reservation],
    criteria: &FilterCriteria,
) -> Vec<Reservation> {
    let mut matched: Vec<Reservation> = reservations
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();
    matched.sort_by_key(|r| r.date);
    matched
}
