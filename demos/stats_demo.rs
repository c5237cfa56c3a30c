use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use clap::Parser;
use clap::ValueEnum;
use robin_hash::GrowthPolicy;
use robin_hash::HashCache;
use robin_hash::HashTable;
use robin_hash::ModGrowthPolicy;
use robin_hash::NoStoreHash;
use robin_hash::PowerOfTwoGrowthPolicy;
use robin_hash::PrimeGrowthPolicy;
use robin_hash::StoreHash;
use robin_hash::hash_table::Entry;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    PowerOfTwo,
    Prime,
    Mod,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    #[arg(short = 'l', long = "max_load_factor", default_value_t = 0.95)]
    max_load_factor: f32,

    #[arg(short = 'p', long = "policy", value_enum, default_value_t = Policy::PowerOfTwo)]
    policy: Policy,

    /// Cache hash fragments in the buckets.
    #[arg(long = "store_hash")]
    store_hash: bool,
}

fn hash_u64(value: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn run<P: GrowthPolicy, C: HashCache>(args: &Args) {
    let mut table: HashTable<u64, P, C> = HashTable::new();
    table.set_max_load_factor(args.max_load_factor);
    table.reserve(args.target_capacity, |&v| hash_u64(v));

    println!(
        "Created table for {} values: {} buckets, capacity {}, max load factor {}",
        args.target_capacity,
        table.bucket_count(),
        table.capacity(),
        table.max_load_factor()
    );

    let num_values = table.capacity() as u64;
    for value in 0..num_values {
        let hash = hash_u64(value);
        match table.entry(hash, |&v| v == value, |&v| hash_u64(v)) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(_) => {
                panic!("Value already exists in table: {}", value);
            }
        }
    }

    println!("Inserted {} values into table", table.len());
    table.probe_histogram().print();
    table.debug_stats().print();

    let hit_probes: usize = (0..num_values)
        .map(|value| table.probe_length(hash_u64(value), |&v| v == value))
        .sum();
    let miss_probes: usize = (num_values..num_values * 2)
        .map(|value| table.probe_length(hash_u64(value), |&v| v == value))
        .sum();
    let lookups = num_values.max(1) as f64;
    println!(
        "Buckets inspected per lookup: {:.3} (hit), {:.3} (miss)",
        hit_probes as f64 / lookups,
        miss_probes as f64 / lookups
    );

    for value in (0..num_values).step_by(2) {
        table.remove(hash_u64(value), |&v| v == value);
    }
    println!("After removing every other value:");
    table.debug_stats().print();
    table.check_invariants(|&v| hash_u64(v));
}

fn main() {
    let args = Args::parse();

    match (args.policy, args.store_hash) {
        (Policy::PowerOfTwo, false) => run::<PowerOfTwoGrowthPolicy, NoStoreHash>(&args),
        (Policy::PowerOfTwo, true) => run::<PowerOfTwoGrowthPolicy, StoreHash>(&args),
        (Policy::Prime, false) => run::<PrimeGrowthPolicy, NoStoreHash>(&args),
        (Policy::Prime, true) => run::<PrimeGrowthPolicy, StoreHash>(&args),
        (Policy::Mod, false) => run::<ModGrowthPolicy, NoStoreHash>(&args),
        (Policy::Mod, true) => run::<ModGrowthPolicy, StoreHash>(&args),
    }
}
