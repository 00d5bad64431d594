//! Pure price-time priority counterparty selection.
//!
//! ```text
//! find_counterparty(incoming, resting, policy) -> Option<MatchResult>
//! ```
//!
//! ## Algorithm
//!
//! 1. Arrange the resting snapshot into a [`RestingBook`] (price levels, FIFO)
//! 2. Take the top of the opposite side: best price, then earliest arrival
//! 3. If that order's price does not cross the incoming limit, nothing
//!    further down the book can either: no match
//! 4. `trade_amount = min(incoming.amount, resting.amount)`
//! 5. Execution price per [`ExecutionPricePolicy`]
//!
//! No I/O, no clock, no randomness: the same inputs always give the same
//! result, including the [`MatchId`].

use rust_decimal::Decimal;
use tracing::debug;
use veilmatch_types::{
    Counterparty, ExecutionPricePolicy, MatchId, MatchResult, Order, OrderSide,
};

use crate::RestingBook;

/// Select the counterparty for `incoming` among `resting`, if any.
///
/// `resting` must be in arrival order. Orders on another pair, orders on
/// the same side, and an entry carrying the incoming order's own id are
/// never candidates.
#[must_use]
pub fn find_counterparty(
    incoming: &Order,
    resting: &[Order],
    policy: ExecutionPricePolicy,
) -> Option<MatchResult> {
    let book = RestingBook::from_snapshot(
        incoming.pair_id.clone(),
        resting.iter().filter(|o| o.id != incoming.id),
    );
    if book.is_empty() {
        debug!(order_id = %incoming.id, pair = %incoming.pair_id, "Resting book is empty");
        return None;
    }

    let candidate = book.top_of_book(incoming.side.opposite())?;
    if !incoming.accepts_price(candidate.price) {
        debug!(
            order_id = %incoming.id,
            pair = %incoming.pair_id,
            "No crossing resting order"
        );
        return None;
    }

    Some(build_match(incoming, candidate, policy))
}

/// Price the incoming order clears at against `resting`.
#[must_use]
pub fn execution_price(incoming: &Order, resting: &Order, policy: ExecutionPricePolicy) -> Decimal {
    match policy {
        ExecutionPricePolicy::Resting => resting.price,
        ExecutionPricePolicy::SellerPrice => match incoming.side {
            OrderSide::Buy => resting.price,
            OrderSide::Sell => incoming.price,
        },
    }
}

fn build_match(incoming: &Order, resting: &Order, policy: ExecutionPricePolicy) -> MatchResult {
    let (buy, sell) = match incoming.side {
        OrderSide::Buy => (incoming, resting),
        OrderSide::Sell => (resting, incoming),
    };

    MatchResult {
        match_id: MatchId::derive(&incoming.pair_id, &buy.id, &sell.id),
        pair_id: incoming.pair_id.clone(),
        buyer: Counterparty::from(buy),
        seller: Counterparty::from(sell),
        trade_amount: incoming.amount.min(resting.amount),
        execution_price: execution_price(incoming, resting, policy),
        taker_side: incoming.side,
    }
}

#[cfg(test)]
mod tests {
    use veilmatch_types::{Address, PairId};

    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    fn sell(id: &str, price: i64, amount: i64) -> Order {
        Order::dummy(id, OrderSide::Sell, d(price), d(amount))
    }

    fn buy(id: &str, price: i64, amount: i64) -> Order {
        Order::dummy(id, OrderSide::Buy, d(price), d(amount))
    }

    const POLICY: ExecutionPricePolicy = ExecutionPricePolicy::SellerPrice;

    #[test]
    fn buy_takes_lowest_price_then_earliest() {
        let resting = vec![sell("s101", 101, 1), sell("s100a", 100, 1), sell("s100b", 100, 1)];
        let m = find_counterparty(&buy("in", 101, 1), &resting, POLICY).unwrap();
        assert_eq!(m.seller.id.as_str(), "s100a");
        assert_eq!(m.buyer.id.as_str(), "in");
        assert_eq!(m.execution_price, d(100));
    }

    #[test]
    fn sell_takes_highest_price_then_earliest() {
        let resting = vec![buy("b99", 99, 1), buy("b105a", 105, 1), buy("b105b", 105, 1)];
        let m = find_counterparty(&sell("in", 98, 1), &resting, POLICY).unwrap();
        assert_eq!(m.buyer.id.as_str(), "b105a");
        assert_eq!(m.seller.id.as_str(), "in");
        assert_eq!(m.taker_side, OrderSide::Sell);
    }

    #[test]
    fn no_crossing_buy() {
        let resting = vec![sell("s1", 100, 1), sell("s2", 101, 1)];
        assert!(find_counterparty(&buy("in", 99, 1), &resting, POLICY).is_none());
    }

    #[test]
    fn no_crossing_sell() {
        let resting = vec![buy("b1", 99, 1)];
        assert!(find_counterparty(&sell("in", 100, 1), &resting, POLICY).is_none());
    }

    #[test]
    fn equal_prices_cross() {
        let resting = vec![sell("s1", 100, 1)];
        assert!(find_counterparty(&buy("in", 100, 1), &resting, POLICY).is_some());
    }

    #[test]
    fn empty_book_has_no_match() {
        assert!(find_counterparty(&buy("in", 100, 1), &[], POLICY).is_none());
    }

    #[test]
    fn same_side_orders_are_not_candidates() {
        let resting = vec![buy("b1", 90, 1)];
        assert!(find_counterparty(&buy("in", 100, 1), &resting, POLICY).is_none());
    }

    #[test]
    fn trade_amount_is_minimum() {
        let resting = vec![sell("s1", 100, 3)];
        let m = find_counterparty(&buy("in", 100, 5), &resting, POLICY).unwrap();
        assert_eq!(m.trade_amount, d(3));

        let resting = vec![buy("b1", 100, 7)];
        let m = find_counterparty(&sell("in", 100, 2), &resting, POLICY).unwrap();
        assert_eq!(m.trade_amount, d(2));
    }

    #[test]
    fn fractional_amounts_are_exact() {
        let mut s = sell("s1", 100, 1);
        s.amount = Decimal::new(3, 1); // 0.3
        let mut b = buy("in", 100, 1);
        b.amount = Decimal::new(1, 1) + Decimal::new(2, 1); // 0.1 + 0.2
        let m = find_counterparty(&b, &[s], POLICY).unwrap();
        assert_eq!(m.trade_amount, Decimal::new(3, 1));
    }

    #[test]
    fn seller_price_policy_for_incoming_sell_uses_own_price() {
        let resting = vec![buy("b1", 105, 1)];
        let m = find_counterparty(&sell("in", 100, 1), &resting, ExecutionPricePolicy::SellerPrice)
            .unwrap();
        assert_eq!(m.execution_price, d(100));
    }

    #[test]
    fn resting_policy_for_incoming_sell_uses_resting_price() {
        let resting = vec![buy("b1", 105, 1)];
        let m = find_counterparty(&sell("in", 100, 1), &resting, ExecutionPricePolicy::Resting)
            .unwrap();
        assert_eq!(m.execution_price, d(105));
    }

    #[test]
    fn incoming_buy_always_pays_resting_sell_price() {
        let resting = vec![sell("s1", 95, 1)];
        for policy in [ExecutionPricePolicy::SellerPrice, ExecutionPricePolicy::Resting] {
            let m = find_counterparty(&buy("in", 100, 1), &resting, policy).unwrap();
            assert_eq!(m.execution_price, d(95));
        }
    }

    #[test]
    fn own_id_in_snapshot_is_ignored() {
        let resting = vec![sell("in", 90, 1), sell("s1", 100, 1)];
        let m = find_counterparty(&buy("in", 100, 1), &resting, POLICY).unwrap();
        assert_eq!(m.seller.id.as_str(), "s1");
    }

    #[test]
    fn other_pair_is_ignored() {
        let mut foreign = sell("s-foreign", 50, 1);
        foreign.pair_id = PairId::new("BTC-USDC");
        let resting = vec![foreign, sell("s1", 100, 1)];
        let m = find_counterparty(&buy("in", 100, 1), &resting, POLICY).unwrap();
        assert_eq!(m.seller.id.as_str(), "s1");
    }

    #[test]
    fn addresses_are_carried_per_role() {
        let seller = sell("s1", 100, 1)
            .with_addresses(Address::repeat_byte(0x51), Address::repeat_byte(0x52));
        let buyer = buy("in", 100, 1)
            .with_addresses(Address::repeat_byte(0xb1), Address::repeat_byte(0xb2));
        let m = find_counterparty(&buyer, &[seller], POLICY).unwrap();
        assert_eq!(m.buyer.owner_identity, Address::repeat_byte(0xb1));
        assert_eq!(m.buyer.recipient_address, Address::repeat_byte(0xb2));
        assert_eq!(m.seller.owner_identity, Address::repeat_byte(0x51));
        assert_eq!(m.seller.recipient_address, Address::repeat_byte(0x52));
    }

    #[test]
    fn result_is_deterministic() {
        let resting = vec![sell("s1", 100, 2), sell("s2", 100, 2)];
        let a = find_counterparty(&buy("in", 101, 1), &resting, POLICY).unwrap();
        let b = find_counterparty(&buy("in", 101, 1), &resting, POLICY).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.match_id,
            MatchId::derive(&PairId::new("ETH-USDC"), &"in".into(), &"s1".into())
        );
    }
}
