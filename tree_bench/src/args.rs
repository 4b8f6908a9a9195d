use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
/// Benchmark the ordered map with a random insert / remove / lookup mix.
pub struct Args {
    #[clap(
        short,
        long,
        help = "Number of keys inserted before the measured run.",
        default_value = "100000"
    )]
    pub keys: u64,

    #[clap(
        short = 'n',
        long,
        help = "Number of measured operations.",
        default_value = "1000000"
    )]
    pub operations: usize,

    #[clap(
        short,
        long,
        help = "Seed for the random workload, the same seed replays the \
                same operations.",
        default_value = "0"
    )]
    pub seed: u64,

    #[clap(
        long,
        help = "Keys of the measured operations are drawn from \
                0..<key_space>.",
        default_value = "200000",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub key_space: u64,

    #[clap(
        short,
        long,
        help = "Fraction of the measured operations that are removes.
The rest is split evenly between inserts and lookups.",
        default_value = "0.25",
        value_parser = parse_ratio
    )]
    pub remove_ratio: f64,

    #[clap(
        long,
        help = "Check the tree invariants every <validate_every> operations \
                (0 disables).",
        default_value = "0"
    )]
    pub validate_every: usize,

    #[clap(
        short,
        long,
        help = "Entries to preallocate room for.",
        default_value = "0"
    )]
    pub capacity: usize,
}

fn parse_ratio(arg: &str) -> Result<f64, String> {
    let ratio: f64 = arg.parse().map_err(|e| format!("{}", e))?;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(format!("{} is not between 0 and 1", ratio));
    }
    Ok(ratio)
}

pub fn get_args() -> Args {
    Args::parse()
}

pub fn parse_args_from<I, T>(itr: I) -> Args
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Args::parse_from(itr)
}
