//! Aggregate statistics over a (usually filtered) reservation collection.

use serde::Serialize;

use crate::types::Reservation;

/// Request substrings that mark a reservation as a special occasion.
pub const OCCASION_TRIGGERS: [&str; 4] = ["birthday", "anniversary", "proposal", "celebrate"];

/// How many dishes [`compute_insights`] ranks.
pub const TOP_DISHES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialOccasion {
    pub client_name: String,
    /// The first request on the reservation that contains a trigger.
    pub request: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DishPopularity {
    pub name: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSummary {
    pub total_reservations: usize,
    pub total_guests: u64,
    pub vip_count: usize,
    /// Guests per reservation rounded to one decimal; `0.0` for no reservations.
    pub average_party_size: f64,
    pub special_occasions: Vec<SpecialOccasion>,
    pub special_occasion_count: usize,
    /// At most [`TOP_DISHES`] entries, most ordered first.
    pub popular_dishes: Vec<DishPopularity>,
    pub total_revenue: f64,
    /// Revenue per reservation; `0.0` for no reservations.
    pub average_revenue: f64,
}

impl InsightSummary {
    /// Names of the ranked dishes, most ordered first.
    #[must_use]
    pub fn popular_dish_names(&self) -> Vec<&str> {
        self.popular_dishes.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Computes the dashboard statistics for `reservations`.
///
/// Never produces NaN: averages over an empty collection are `0.0`.
#[must_use]
pub fn compute_insights(reservations: &[Reservation]) -> InsightSummary {
    let total_reservations = reservations.len();
    let total_guests: u64 = reservations
        .iter()
        .map(|r| u64::from(r.number_of_guests))
        .sum();
    let vip_count = reservations.iter().filter(|r| r.is_vip).count();
    let total_revenue: f64 = reservations.iter().map(Reservation::revenue).sum();

    let special_occasions: Vec<SpecialOccasion> =
        reservations.iter().filter_map(special_occasion).collect();

    #[allow(clippy::cast_precision_loss)]
    let (average_party_size, average_revenue) = if total_reservations == 0 {
        (0.0, 0.0)
    } else {
        let count = total_reservations as f64;
        (
            round_to_tenth(total_guests as f64 / count),
            total_revenue / count,
        )
    };

    InsightSummary {
        total_reservations,
        total_guests,
        vip_count,
        average_party_size,
        special_occasion_count: special_occasions.len(),
        special_occasions,
        popular_dishes: popular_dishes(reservations),
        total_revenue,
        average_revenue,
    }
}

fn special_occasion(reservation: &Reservation) -> Option<SpecialOccasion> {
    reservation
        .special_requests
        .iter()
        .find(|request| {
            let lower = request.to_lowercase();
            OCCASION_TRIGGERS.iter().any(|t| lower.contains(t))
        })
        .map(|request| SpecialOccasion {
            client_name: reservation.client_name.clone(),
            request: request.clone(),
        })
}

/// Tallies quantity per dish in first-seen order, then ranks.
///
/// `sort_by` is stable, so equal quantities keep first-encountered order.
fn popular_dishes(reservations: &[Reservation]) -> Vec<DishPopularity> {
    let mut tally: Vec<DishPopularity> = Vec::new();
    for order in reservations.iter().flat_map(|r| &r.food_ordered) {
        match tally.iter_mut().find(|d| d.name == order.item) {
            Some(entry) => entry.quantity += u64::from(order.quantity),
            None => tally.push(DishPopularity {
                name: order.item.clone(),
                quantity: u64::from(order.quantity),
            }),
        }
    }
    tally.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    tally.truncate(TOP_DISHES);
    tally
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
