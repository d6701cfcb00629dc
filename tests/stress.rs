//! Capacity and churn tests: the pool boundary, slot recycling, and deep
//! books under sustained load.

use tickmatch::{
    EngineError, MatchingEngine, NoopListener, Order, OrderBook, Side,
};

fn submit(book: &mut OrderBook, id: u64, qty: u32, price: u64, side: Side) {
    MatchingEngine::submit(book, Order::new(id, qty, price, side), &mut NoopListener).unwrap();
}

#[test]
fn fills_to_capacity_then_rejects() {
    const CAPACITY: usize = 1_000;
    let mut book = OrderBook::new(CAPACITY, 10_000);
    book.warm_up();

    // Non-overlapping prices so nothing matches.
    for i in 0..CAPACITY as u64 {
        let (side, price) = if i % 2 == 0 {
            (Side::Buy, 4_000 + i % 100)
        } else {
            (Side::Sell, 6_000 + i % 100)
        };
        submit(&mut book, i, 10, price, side);
    }
    assert_eq!(book.len(), CAPACITY);

    let overflow = Order::new(CAPACITY as u64, 10, 4_000, Side::Buy);
    assert_eq!(
        MatchingEngine::submit(&mut book, overflow, &mut NoopListener),
        Err(EngineError::PoolExhausted)
    );
    assert_eq!(book.len(), CAPACITY);
}

#[test]
fn cancel_frees_a_slot() {
    const CAPACITY: usize = 100;
    let mut book = OrderBook::new(CAPACITY, 10_000);

    for i in 0..CAPACITY as u64 {
        submit(&mut book, i, 10, 5_000, Side::Buy);
    }

    MatchingEngine::cancel(&mut book, 50, &mut NoopListener).unwrap();
    submit(&mut book, 1_000, 10, 5_000, Side::Buy);
    assert_eq!(book.len(), CAPACITY);
}

#[test]
fn full_fill_frees_a_slot() {
    const CAPACITY: usize = 100;
    let mut book = OrderBook::new(CAPACITY, 10_000);

    // Leave one slot free: every submission reserves a slot up front, even
    // when it ends up fully matching.
    for i in 0..(CAPACITY - 1) as u64 {
        submit(&mut book, i, 10, 5_000, Side::Sell);
    }

    // The crossing buy borrows the last slot, consumes maker 0 entirely,
    // and returns both slots.
    submit(&mut book, 1_000, 10, 5_000, Side::Buy);
    assert_eq!(book.len(), CAPACITY - 2);

    submit(&mut book, 1_001, 10, 4_000, Side::Buy);
    submit(&mut book, 1_002, 10, 4_000, Side::Buy);
    assert_eq!(book.len(), CAPACITY);
}

#[test]
fn single_level_churn() {
    let mut book = OrderBook::new(10_000, 10_000);

    // Alternate resting and aggressing at one price for many rounds; the
    // book must end each round exactly where it started.
    for round in 0..5_000u64 {
        let maker = round * 2;
        let taker = round * 2 + 1;
        submit(&mut book, maker, 25, 5_000, Side::Sell);
        submit(&mut book, taker, 25, 5_000, Side::Buy);
        assert!(book.is_empty(), "round {round} left residue");
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
    }
}

#[test]
fn sweep_a_deep_ladder() {
    let mut book = OrderBook::new(10_000, 10_000);

    // 1000 one-lot asks on consecutive ticks.
    for i in 0..1_000u64 {
        submit(&mut book, i, 1, 5_000 + i, Side::Sell);
    }

    // One buy takes the whole ladder.
    submit(&mut book, 9_999, 1_000, 6_000, Side::Buy);
    assert!(book.is_empty());
    assert_eq!(book.best_ask(), None);
}

#[test]
fn modify_churn_keeps_the_book_consistent() {
    let mut book = OrderBook::new(1_000, 10_000);

    for i in 0..100u64 {
        submit(&mut book, i, 100, 5_000, Side::Sell);
    }

    // Repeatedly shrink in place, then bounce everything to a new price.
    for i in 0..100u64 {
        MatchingEngine::modify(&mut book, i, 5_000, 50, &mut NoopListener).unwrap();
    }
    assert_eq!(book.depth(Side::Sell, 5_000), (5_000, 100));

    for i in 0..100u64 {
        MatchingEngine::modify(&mut book, i, 5_100, 50, &mut NoopListener).unwrap();
    }
    assert_eq!(book.depth(Side::Sell, 5_000), (0, 0));
    assert_eq!(book.depth(Side::Sell, 5_100), (5_000, 100));
    assert_eq!(book.best_ask(), Some(5_100));
    assert_eq!(book.len(), 100);
}

#[test]
fn max_values_do_not_overflow_level_totals() {
    let mut book = OrderBook::new(8, 10);

    submit(&mut book, 1, u32::MAX, 5, Side::Buy);
    submit(&mut book, 2, u32::MAX, 5, Side::Buy);
    assert_eq!(book.depth(Side::Buy, 5), (2 * u32::MAX as u64, 2));

    MatchingEngine::cancel(&mut book, 1, &mut NoopListener).unwrap();
    MatchingEngine::cancel(&mut book, 2, &mut NoopListener).unwrap();
    assert_eq!(book.depth(Side::Buy, 5), (0, 0));
}
