use anyhow::anyhow;
use hdrhistogram::Histogram;
use num_format::{Locale, ToFormattedString};
use ppqueue::{PriorityQueue, QueueError};
use rand::Rng;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct StressTestConfig {
    pub num_producers: usize,
    pub num_elements: usize,
    pub num_consumers: usize,
    pub max_value: u64,
    pub pop_interval_us: u64,
    pub run_duration_seconds: u64,
}

/// Latencies in nanoseconds. Auto-resizing, so recording never fails.
fn latency_histogram() -> anyhow::Result<Histogram<u64>> {
    Histogram::new(3).map_err(|e| anyhow!("Could not create latency histogram: {e:?}"))
}

fn merge(into: &mut Histogram<u64>, other: &Histogram<u64>) -> anyhow::Result<()> {
    into.add(other)
        .map_err(|e| anyhow!("Could not merge latency histograms: {e:?}"))
}

pub fn run_stress_test<Q: PriorityQueue<u64>>(
    queue: Arc<Q>,
    config: StressTestConfig,
) -> anyhow::Result<TestResults> {
    anyhow::ensure!(config.max_value > 0, "max_value must be positive");

    println!(
        "Starting stress test with {} producer and {} consumer threads",
        config.num_producers, config.num_consumers
    );
    println!(
        "Each producer will push {} elements",
        config.num_elements.to_formatted_string(&Locale::en)
    );
    println!("\n{:-<75}\n", "");
    let start_time = Instant::now();
    let test_end_time = start_time + Duration::from_secs(config.run_duration_seconds);

    let pushed_count = Arc::new(AtomicUsize::new(0));
    let producers_stopped = Arc::new(AtomicUsize::new(0));

    // region:    --- Producer threads
    let mut producer_handles = vec![];

    for producer_id in 1..=config.num_producers {
        let queue = Arc::clone(&queue);
        let pushed_count = Arc::clone(&pushed_count);
        let producers_stopped = Arc::clone(&producers_stopped);

        let handle = thread::spawn(move || -> anyhow::Result<Histogram<u64>> {
            let mut rng = rand::rng();
            let mut latencies = latency_histogram()?;
            let mut local_pushed = 0;

            while Instant::now() < test_end_time && local_pushed < config.num_elements {
                let value = rng.random_range(0..config.max_value);

                // --> Push
                let push_start = Instant::now();
                let res = queue.push(value);
                latencies.saturating_record(push_start.elapsed().as_nanos() as u64);
                if let Err(e) = res {
                    producers_stopped.fetch_add(1, Ordering::SeqCst);
                    return Err(e.into());
                }

                local_pushed += 1;
                pushed_count.fetch_add(1, Ordering::Relaxed);
            }

            producers_stopped.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(producer_id, local_pushed, "producer completed");
            Ok(latencies)
        });

        producer_handles.push(handle);
    }

    // endregion: --- Producer threads

    // region:    --- Consumer threads
    let mut consumer_handles = vec![];

    for consumer_id in 1..=config.num_consumers {
        let queue = Arc::clone(&queue);
        let producers_stopped = Arc::clone(&producers_stopped);

        let handle = thread::spawn(move || -> anyhow::Result<(usize, Histogram<u64>)> {
            let mut latencies = latency_histogram()?;
            let mut local_popped = 0;

            while Instant::now() < test_end_time {
                let pop_start = Instant::now();
                match queue.pop_top() {
                    Ok(_) => {
                        latencies.saturating_record(pop_start.elapsed().as_nanos() as u64);
                        local_popped += 1;
                    }
                    Err(QueueError::Empty) => {
                        if producers_stopped.load(Ordering::SeqCst) == config.num_producers {
                            break;
                        }
                        thread::yield_now();
                    }
                    Err(e) => return Err(e.into()),
                }

                if config.pop_interval_us > 0 {
                    thread::sleep(Duration::from_micros(config.pop_interval_us));
                }
            }
            tracing::debug!(consumer_id, local_popped, "consumer completed");
            Ok((local_popped, latencies))
        });
        consumer_handles.push(handle);
    }

    // endregion: --- Consumer threads

    let mut push_latencies = latency_histogram()?;
    for handle in producer_handles {
        let latencies = handle
            .join()
            .map_err(|_| anyhow!("Producer thread panicked"))??;
        merge(&mut push_latencies, &latencies)?;
    }
    println!("Waiting for consumers!");
    let mut pop_latencies = latency_histogram()?;
    let mut total_popped = 0;
    for handle in consumer_handles {
        let (popped, latencies) = handle
            .join()
            .map_err(|_| anyhow!("Consumer thread panicked"))??;
        total_popped += popped;
        merge(&mut pop_latencies, &latencies)?;
    }
    let test_duration = start_time.elapsed();

    let leftover = drain_remaining(&*queue)?;

    Ok(TestResults {
        test_duration,
        total_pushed: pushed_count.load(Ordering::Relaxed),
        total_popped,
        remaining: leftover.len(),
        remaining_in_order: leftover.windows(2).all(|w| w[0] >= w[1]),
        push_latencies,
        pop_latencies,
    })
}

/// Pops whatever the consumers left behind, top first. All workers have stopped by now.
fn drain_remaining<Q: PriorityQueue<u64>>(queue: &Q) -> anyhow::Result<Vec<u64>> {
    let mut leftover = Vec::with_capacity(queue.len());
    loop {
        match queue.pop_top() {
            Ok(value) => leftover.push(value),
            Err(QueueError::Empty) => return Ok(leftover),
            Err(e) => return Err(e.into()),
        }
    }
}

#[derive(Debug)]
pub struct TestResults {
    pub test_duration: Duration,
    pub total_pushed: usize,
    pub total_popped: usize,
    pub remaining: usize,
    /// The leftover elements came out with non-increasing priority.
    pub remaining_in_order: bool,
    push_latencies: Histogram<u64>,
    pop_latencies: Histogram<u64>,
}

impl TestResults {
    /// Every pushed element was either popped or left in the queue, and the leftovers drained
    /// in priority order.
    pub fn is_consistent(&self) -> bool {
        self.total_pushed == self.total_popped + self.remaining && self.remaining_in_order
    }

    pub fn print_summary(&self) {
        let secs = self.test_duration.as_secs_f64().max(f64::EPSILON);

        println!("\n{:=^75}", " Stress Test Results ");
        println!("Test duration: {:?}", self.test_duration);
        println!(
            "Total elements pushed: {}",
            self.total_pushed.to_formatted_string(&Locale::en)
        );
        println!(
            "Total elements popped: {}",
            self.total_popped.to_formatted_string(&Locale::en)
        );
        println!(
            "Elements left in queue: {} (drained {})",
            self.remaining.to_formatted_string(&Locale::en),
            if self.remaining_in_order {
                "in order"
            } else {
                "OUT OF ORDER"
            }
        );
        println!(
            "Operations per second: {:.2}",
            (self.total_pushed + self.total_popped) as f64 / secs
        );

        print_latencies("push", &self.push_latencies);
        print_latencies("pop (top + pop)", &self.pop_latencies);
    }
}

fn print_latencies(name: &str, latencies: &Histogram<u64>) {
    if latencies.len() == 0 {
        return;
    }
    println!("\n{name} latency:");
    for quantile in [0.5, 0.9, 0.99, 0.999] {
        println!(
            "  - p{:<5} {} ns",
            quantile * 100.0,
            latencies.value_at_quantile(quantile)
        );
    }
    println!("  - max    {} ns", latencies.max());
}
