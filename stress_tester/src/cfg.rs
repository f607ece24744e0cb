#[derive(Debug, Clone, clap::Parser)]
pub struct Cfg {
    /// The priority queue implementation to test.
    pub implementation: Implementation,
    /// Number of producers that will push elements to the queue.
    #[arg(short, long)]
    pub producer_num: usize,
    /// Number of elements each producer will push during the test.
    #[arg(short, long)]
    pub element_num: usize,
    /// Number of consumers that will pop elements from the queue.
    #[arg(short, long, default_value_t = 1)]
    pub consumer_num: usize,
    /// Pushed values are drawn uniformly from `0..max_value`.
    #[arg(short, long, default_value_t = 1_000_000)]
    pub max_value: u64,
    /// Pause between two pops of one consumer.
    #[arg(long, default_value_t = 0)]
    pub pop_interval_us: u64,
    // Hard cap on the test's execution time
    #[arg(long, default_value_t = 10)]
    pub run_duration_seconds: u64,
}

#[derive(Debug, Clone, Copy, strum::EnumString, strum::Display, clap::ValueEnum)]
pub enum Implementation {
    #[strum(ascii_case_insensitive)]
    Pipelined,
    #[strum(ascii_case_insensitive)]
    Locked,
}
