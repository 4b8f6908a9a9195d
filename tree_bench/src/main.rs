use std::time::{Duration, Instant};

use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rbmap::{error::Result, OrderedMap};

mod args;

use args::{get_args, Args};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Insert,
    Remove,
    Lookup,
}

const OP_KINDS: [OpKind; 3] = [OpKind::Insert, OpKind::Remove, OpKind::Lookup];

#[derive(Default)]
struct Stats {
    insert: Vec<Duration>,
    remove: Vec<Duration>,
    lookup: Vec<Duration>,
    hits: usize,
}

impl Stats {
    fn of(&mut self, kind: OpKind) -> &mut Vec<Duration> {
        match kind {
            OpKind::Insert => &mut self.insert,
            OpKind::Remove => &mut self.remove,
            OpKind::Lookup => &mut self.lookup,
        }
    }
}

fn next_op(rng: &mut StdRng, remove_ratio: f64) -> OpKind {
    if rng.gen_bool(remove_ratio) {
        OpKind::Remove
    } else if rng.gen_bool(0.5) {
        OpKind::Insert
    } else {
        OpKind::Lookup
    }
}

fn fill(map: &mut OrderedMap<u64, u64>, args: &Args, rng: &mut StdRng) {
    let mut keys: Vec<u64> = (0..args.keys).collect();
    keys.shuffle(rng);

    let start_time = Instant::now();
    for key in keys {
        map.insert(key, key);
    }
    info!(
        "Inserted {} keys in {:?}",
        map.len(),
        Instant::now().duration_since(start_time)
    );
}

fn run_benchmark(args: &Args) -> Result<Stats> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut map = OrderedMap::with_capacity(args.capacity);
    fill(&mut map, args, &mut rng);

    let mut stats = Stats::default();
    for i in 0..args.operations {
        let kind = next_op(&mut rng, args.remove_ratio);
        let key = rng.gen_range(0..args.key_space);

        let start_time = Instant::now();
        let hit = match kind {
            OpKind::Insert => map.insert(key, key).1,
            OpKind::Remove => map.remove(&key).is_some(),
            OpKind::Lookup => map.get(&key).is_some(),
        };
        stats.of(kind).push(Instant::now().duration_since(start_time));
        stats.hits += usize::from(hit);

        if args.validate_every != 0 && (i + 1) % args.validate_every == 0 {
            let black_height = map.validate()?;
            debug!(
                "Valid after {} operations (len: {}, black height: {})",
                i + 1,
                map.len(),
                black_height
            );
        }
    }

    info!("Finished with {} entries, {} hits", map.len(), stats.hits);
    Ok(stats)
}

fn print_stats(name: &str, mut stats: Vec<Duration>) {
    if stats.is_empty() {
        println!("{}: no operations", name);
        return;
    }
    stats.sort();

    let total: Duration = stats.iter().sum();
    let last_index = stats.len() - 1;
    let min = stats[0];
    let max = stats[last_index];
    let p50 = stats[last_index / 2];
    let p90 = stats[last_index * 9 / 10];
    let p99 = stats[last_index * 99 / 100];
    let p999 = stats[last_index * 999 / 1000];
    println!(
        "{} ({}): total: {:?}, min: {:?}, p50: {:?}, p90: {:?}, p99: {:?}, \
         p999: {:?} max: {:?}",
        name,
        stats.len(),
        total,
        min,
        p50,
        p90,
        p99,
        p999,
        max
    );
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = get_args();
    debug!("{:?}", args);

    let mut stats = run_benchmark(&args)?;
    for kind in OP_KINDS {
        let name = format!("{:?}", kind).to_lowercase();
        print_stats(&name, std::mem::take(stats.of(kind)));
    }
    Ok(())
}
