//! # Stockpile Sim
//!
//! Demonstration harness: supplier and customer threads hammering one
//! shared [`Stockpile`] with fixed batch amounts and sleep pacing.
//!
//! The core primitive makes no assumption about call cadence; every
//! sleep in this program is illustration, not coordination.
//!
//! ```bash
//! # Run with defaults (the classic 1 supplier / 1 customer demo)
//! cargo run --bin stockpile_sim
//!
//! # Run with a custom scenario
//! cargo run --bin stockpile_sim -- scenario.toml
//! ```

use std::process::exit;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use stockpile::Stockpile;
use tracing_subscriber::EnvFilter;

/// Simulation parameters, loadable from a TOML file.
///
/// Defaults reproduce the classic demo: one supplier adding 5 units
/// every 500 ms, one customer removing 3 units every 2000 ms, five
/// rounds each, capacity 100.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SimConfig {
    /// Fixed upper bound on the stock level.
    capacity: u32,
    /// Number of supplier threads.
    suppliers: usize,
    /// Number of customer threads.
    customers: usize,
    /// Units each supplier deposits per round.
    deposit_amount: u32,
    /// Units each customer withdraws per round.
    withdraw_amount: u32,
    /// Rounds per supplier.
    supplier_rounds: u32,
    /// Rounds per customer.
    customer_rounds: u32,
    /// Pause between supplier rounds (ms).
    supplier_pause_ms: u64,
    /// Pause between customer rounds (ms).
    customer_pause_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            suppliers: 1,
            customers: 1,
            deposit_amount: 5,
            withdraw_amount: 3,
            supplier_rounds: 5,
            customer_rounds: 5,
            supplier_pause_ms: 500,
            customer_pause_ms: 2000,
        }
    }
}

impl SimConfig {
    /// Loads the config from the first CLI argument, or defaults.
    fn load() -> Self {
        let Some(path) = std::env::args().nth(1) else {
            return Self::default();
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!("FATAL: cannot read config {path}: {e}");
                exit(1);
            }
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("FATAL: invalid config {path}: {e}");
                exit(1);
            }
        }
    }

    /// Total units all suppliers will ever add.
    fn total_supply(&self) -> u64 {
        self.suppliers as u64 * u64::from(self.supplier_rounds) * u64::from(self.deposit_amount)
    }

    /// Total units all customers will ever take.
    fn total_demand(&self) -> u64 {
        self.customers as u64 * u64::from(self.customer_rounds) * u64::from(self.withdraw_amount)
    }

    /// Rejects scenarios that can never finish.
    fn validate(&self) {
        if self.deposit_amount > self.capacity || self.withdraw_amount > self.capacity {
            eprintln!(
                "FATAL: batch amount exceeds capacity {}, every round would be rejected",
                self.capacity
            );
            exit(1);
        }
        if self.total_demand() > self.total_supply() {
            eprintln!(
                "FATAL: demand {} exceeds supply {}, customers would wait forever",
                self.total_demand(),
                self.total_supply()
            );
            exit(1);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SimConfig::load();
    config.validate();

    println!("═══════════════════════════════════════════════════════════");
    println!("                     STOCKPILE SIM");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("  Capacity:   {}", config.capacity);
    println!(
        "  Suppliers:  {} x {} rounds of +{} every {} ms",
        config.suppliers, config.supplier_rounds, config.deposit_amount, config.supplier_pause_ms
    );
    println!(
        "  Customers:  {} x {} rounds of -{} every {} ms",
        config.customers, config.customer_rounds, config.withdraw_amount, config.customer_pause_ms
    );
    println!();

    let store = match Stockpile::new(config.capacity) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("FATAL: {e}");
            exit(1);
        }
    };

    let mut handles = Vec::new();

    for id in 0..config.suppliers {
        let store = Arc::clone(&store);
        let config = config.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..config.supplier_rounds {
                store
                    .deposit(config.deposit_amount)
                    .expect("deposit amount validated against capacity");
                tracing::info!(
                    supplier = id,
                    added = config.deposit_amount,
                    level = store.level(),
                    "supplier added items"
                );
                thread::sleep(Duration::from_millis(config.supplier_pause_ms));
            }
        }));
    }

    for id in 0..config.customers {
        let store = Arc::clone(&store);
        let config = config.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..config.customer_rounds {
                store
                    .withdraw(config.withdraw_amount)
                    .expect("withdraw amount validated against capacity");
                tracing::info!(
                    customer = id,
                    removed = config.withdraw_amount,
                    level = store.level(),
                    "customer removed items"
                );
                thread::sleep(Duration::from_millis(config.customer_pause_ms));
            }
        }));
    }

    for handle in handles {
        handle.join().expect("actor thread panicked");
    }

    let stats = store.stats();
    println!();
    println!("═══════════════════════════════════════════════════════════");
    println!("                     SIM COMPLETE");
    println!("═══════════════════════════════════════════════════════════");
    println!("  Final level:     {}", store.level());
    println!("  Peak level:      {}", stats.peak_level);
    println!(
        "  Deposits:        {} ({} units, {} waits)",
        stats.deposits, stats.units_deposited, stats.deposit_waits
    );
    println!(
        "  Withdrawals:     {} ({} units, {} waits)",
        stats.withdrawals, stats.units_withdrawn, stats.withdraw_waits
    );
}
