//! Server-side price arithmetic. The kiosk front-end shows its own running
//! total, but the number it submits is a display hint only; everything that
//! gets persisted is recomputed here from catalog prices.

/// Half a cent: NUMERIC(10,2) в базе, f64 в коде, сравниваем с допуском
const MONEY_EPSILON: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub tickets_total: f64,
    pub extras_total: f64,
    pub total: f64,
}

/// `seat_count × ticket_price + Σ price × quantity` over the extras lines.
pub fn order_totals(seat_count: usize, ticket_price: f64, extras: &[(f64, u32)]) -> OrderTotals {
    let tickets_total = seat_count as f64 * ticket_price;
    let extras_total: f64 = extras.iter().map(|(price, qty)| price * *qty as f64).sum();
    OrderTotals {
        tickets_total,
        extras_total,
        total: tickets_total + extras_total,
    }
}

pub fn totals_match(a: f64, b: f64) -> bool {
    (a - b).abs() < MONEY_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_order_comes_to_50_50() {
        let totals = order_totals(3, 12.50, &[(5.00, 2), (3.00, 1)]);
        assert!(totals_match(totals.tickets_total, 37.50));
        assert!(totals_match(totals.extras_total, 13.00));
        assert!(totals_match(totals.total, 50.50));
    }

    #[test]
    fn tickets_only_order() {
        let totals = order_totals(2, 10.00, &[]);
        assert!(totals_match(totals.total, 20.00));
        assert_eq!(totals.extras_total, 0.0);
    }

    #[test]
    fn subtotals_always_sum_to_total() {
        let totals = order_totals(5, 9.75, &[(4.25, 3), (2.00, 10), (6.50, 1)]);
        assert!(totals_match(totals.tickets_total + totals.extras_total, totals.total));
    }

    #[test]
    fn mismatch_detection_is_strict_past_half_cent() {
        assert!(totals_match(50.50, 50.504));
        assert!(!totals_match(50.50, 50.51));
        assert!(!totals_match(50.50, 49.50));
    }
}
