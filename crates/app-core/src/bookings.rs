//! Booking summaries for the profile screen

use serde::{Deserialize, Serialize};

/// Payment state of a booking as reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting payment
    Pending,
    /// Delivered and settled
    Completed,
    /// Paid, not yet completed
    Paid,
    /// Payment refused
    Rejected,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

/// The subset of a booking the profile needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSummary {
    /// Booking identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Payment state
    pub payment_status: PaymentStatus,
}

/// Booking counts per payment status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStats {
    /// All bookings, including unknown statuses
    pub total: usize,
    /// Pending payment
    pub pending: usize,
    /// Completed
    pub completed: usize,
    /// Paid
    pub paid: usize,
    /// Rejected
    pub rejected: usize,
}

impl BookingStats {
    /// Count bookings by payment status
    pub fn from_bookings<'a, I>(bookings: I) -> Self
    where
        I: IntoIterator<Item = &'a BookingSummary>,
    {
        bookings.into_iter().fold(Self::default(), |mut stats, booking| {
            stats.total += 1;
            match booking.payment_status {
                PaymentStatus::Pending => stats.pending += 1,
                PaymentStatus::Completed => stats.completed += 1,
                PaymentStatus::Paid => stats.paid += 1,
                PaymentStatus::Rejected => stats.rejected += 1,
                PaymentStatus::Unknown => {}
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_stats() {
        let stats = BookingStats::from_bookings(&Vec::<BookingSummary>::new());
        assert_eq!(stats, BookingStats::default());
    }

    #[test]
    fn test_counts_by_status() {
        let bookings: Vec<BookingSummary> = serde_json::from_value(json!([
            { "id": "1", "payment_status": "pending" },
            { "id": "2", "payment_status": "paid" },
            { "id": "3", "payment_status": "paid" },
            { "id": "4", "payment_status": "completed" },
            { "id": "5", "payment_status": "rejected" },
            { "id": "6", "payment_status": "refunded" }
        ]))
        .unwrap();

        let stats = BookingStats::from_bookings(&bookings);
        assert_eq!(
            stats,
            BookingStats { total: 6, pending: 1, completed: 1, paid: 2, rejected: 1 }
        );
    }
}
