use baseline::LockedQueue;
use cfg::Cfg;
use clap::Parser;
use ppqueue::{PipelinedQueue, PriorityQueue};
use std::sync::Arc;
use stress::{StressTestConfig, run_stress_test};
use tracing_subscriber::EnvFilter;

pub mod cfg;
pub mod stress;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = cfg::Cfg::parse();
    println!("Running configuration:\n{cfg:#?}");

    let res = match cfg.implementation {
        cfg::Implementation::Pipelined => run_pipelined(cfg),
        cfg::Implementation::Locked => run_locked(cfg),
    };
    if let Err(e) = res {
        eprintln!("Error: {e:?}");
    }
}

fn capacity(cfg: &Cfg) -> anyhow::Result<usize> {
    cfg.element_num
        .checked_mul(cfg.producer_num)
        .ok_or_else(|| anyhow::anyhow!("Overflow while calculating queue capacity"))
}

fn stress_config(cfg: &Cfg) -> StressTestConfig {
    StressTestConfig {
        num_producers: cfg.producer_num,
        num_elements: cfg.element_num,
        num_consumers: cfg.consumer_num,
        max_value: cfg.max_value,
        pop_interval_us: cfg.pop_interval_us,
        run_duration_seconds: cfg.run_duration_seconds,
    }
}

fn run_pipelined(cfg: Cfg) -> anyhow::Result<()> {
    let queue_cfg = ppqueue::Cfg {
        capacity: capacity(&cfg)?,
        worker_name: "stress".to_string(),
    };
    let queue = Arc::new(PipelinedQueue::start(queue_cfg, ppqueue::Ascending, vec![])?);
    run(queue, &cfg)
}

fn run_locked(cfg: Cfg) -> anyhow::Result<()> {
    let queue = Arc::new(LockedQueue::new(capacity(&cfg)?)?);
    run(queue, &cfg)
}

fn run<Q: PriorityQueue<u64>>(queue: Arc<Q>, cfg: &Cfg) -> anyhow::Result<()> {
    tracing::info!(implementation = %cfg.implementation, "starting stress test");
    let results = run_stress_test(queue, stress_config(cfg))?;
    results.print_summary();
    anyhow::ensure!(
        results.is_consistent(),
        "pushed {} elements, {} were popped or remained (leftovers in order: {})",
        results.total_pushed,
        results.total_popped + results.remaining,
        results.remaining_in_order
    );
    Ok(())
}
