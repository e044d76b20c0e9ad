//! A standalone demo CLI driving an in-process [`OrderBook`] — no server,
//! no network, just the core wired straight to a terminal.
//!
//! Grounded on the teacher's `cli.rs`, generalized from buy/sell +
//! limit/market to the full order-type set the core now enforces, and with
//! `cancel`/`modify` commands added to exercise the rest of the contract.

use clap::{Parser, Subcommand, builder::PossibleValuesParser};

use crate::book::OrderBook;
use crate::order::Order;
use crate::types::{OrderType, Price, Quantity, Side};

#[derive(Parser)]
#[command(name = "Order Book CLI")]
#[command(version = "0.1", about = "A demo of a limit-order-book engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new order.
    Add {
        #[arg(value_parser = PossibleValuesParser::new(["bid", "ask"]))]
        side: String,

        #[arg(value_parser = PossibleValuesParser::new([
            "gtc", "fak", "fok", "gfd", "market",
        ]))]
        order_type: String,

        /// Price in ticks (ignored for market orders).
        #[arg(default_value_t = 0)]
        price: Price,

        quantity: Quantity,
    },
    /// Cancel a resting order by id.
    Cancel { order_id: u64 },
    /// Modify a resting order's price and quantity, losing time priority.
    Modify {
        order_id: u64,
        price: Price,
        quantity: Quantity,
    },
    /// Display the current order book.
    Book,
}

fn parse_side(s: &str) -> Side {
    match s {
        "bid" => Side::Bid,
        "ask" => Side::Ask,
        _ => unreachable!("clap restricts this to bid|ask"),
    }
}

fn parse_order_type(s: &str) -> OrderType {
    match s {
        "gtc" => OrderType::GoodTillCancel,
        "fak" => OrderType::FillAndKill,
        "fok" => OrderType::FillOrKill,
        "gfd" => OrderType::GoodForDay,
        "market" => OrderType::Market,
        _ => unreachable!("clap restricts this to a known order type"),
    }
}

fn handle_add(book: &mut OrderBook, side: String, order_type: String, price: Price, quantity: Quantity) {
    let side = parse_side(&side);
    let order_type = parse_order_type(&order_type);

    let order = match Order::new(rand::random::<u64>(), price, side, order_type, quantity) {
        Ok(order) => order,
        Err(e) => {
            println!("order rejected: {e}");
            return;
        }
    };

    let order_id = order.id();
    let trades = book.submit(order);
    if trades.is_empty() {
        println!("order {order_id} accepted, no trades");
    } else {
        println!("order {order_id} accepted, {} trade(s):", trades.len());
        for trade in trades {
            println!("  {trade:?}");
        }
    }
}

fn handle_cancel(book: &mut OrderBook, order_id: u64) {
    let was_resting = book.contains(order_id);
    book.cancel(order_id);
    if was_resting {
        println!("order {order_id} cancelled");
    } else {
        println!("order {order_id} was not resting; no-op");
    }
}

fn handle_modify(book: &mut OrderBook, order_id: u64, price: Price, quantity: Quantity) {
    let trades = book.modify(order_id, price, quantity);
    println!("order {order_id} modified, {} trade(s)", trades.len());
    for trade in trades {
        println!("  {trade:?}");
    }
}

fn print_order_book(book: &OrderBook) {
    println!("------ Order Book ------");
    println!("Bids (highest first):");
    for (price, qty) in book.snapshot_bids(usize::MAX) {
        println!("  price: {price}, qty: {qty}");
    }
    println!("Asks (lowest first):");
    for (price, qty) in book.snapshot_asks(usize::MAX) {
        println!("  price: {price}, qty: {qty}");
    }
    println!("--------------------------");
}

pub fn run_cli() {
    let cli = Cli::parse();
    let mut book = OrderBook::new();
    match cli.command {
        Commands::Add {
            side,
            order_type,
            price,
            quantity,
        } => handle_add(&mut book, side, order_type, price, quantity),
        Commands::Cancel { order_id } => handle_cancel(&mut book, order_id),
        Commands::Modify {
            order_id,
            price,
            quantity,
        } => handle_modify(&mut book, order_id, price, quantity),
        Commands::Book => print_order_book(&book),
    }
}
