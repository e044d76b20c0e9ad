use criterion::{Criterion, criterion_group, criterion_main};
use order_book_core::book::OrderBook;
use order_book_core::order::Order;
use order_book_core::types::{OrderType, Side};

fn setup_order_book(depth: i64, orders_per_level: i64) -> OrderBook {
    let mut ob = OrderBook::new();
    for price in 1..=depth {
        for i in 0..orders_per_level {
            let ask_id = (price as u64) * 1_000 + (i as u64);
            ob.submit(Order::new(ask_id, price, Side::Ask, OrderType::GoodTillCancel, 1).unwrap());

            let bid_id = ((depth as u64 + price as u64) * 1_000) + (i as u64);
            ob.submit(Order::new(bid_id, price, Side::Bid, OrderType::GoodTillCancel, 1).unwrap());
        }
    }
    ob
}

fn bench_match_order(c: &mut Criterion) {
    let depth = 100;
    let orders_per_level = 10;
    let mut ob = setup_order_book(depth, orders_per_level);

    c.bench_function("match 1 market order", |b| {
        b.iter(|| {
            let market_buy = Order::new(
                0,
                0,
                Side::Bid,
                OrderType::Market,
                (depth * orders_per_level / 2) as u64,
            )
            .unwrap();
            ob.submit(market_buy);
        })
    });

    c.bench_function("match 1 limit crossing order", |b| {
        b.iter(|| {
            let limit_sell = Order::new(
                1,
                depth / 2,
                Side::Ask,
                OrderType::GoodTillCancel,
                (depth * orders_per_level) as u64,
            )
            .unwrap();
            ob.submit(limit_sell);
        })
    });
}

criterion_group!(benches, bench_match_order);
criterion_main!(benches);
