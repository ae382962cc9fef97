use anyhow::Context;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tessera_config::{ConsumerKind, TesseraConfig};
use tessera_frames::{SensorFrame, SensorId};
use tessera_pipeline::{Consumer, NewestReader, Producer};
use tessera_ring::{RingConfig, SlotRing};
use tracing::info;

fn load_config() -> anyhow::Result<TesseraConfig> {
    match std::env::args().nth(1) {
        Some(path) => TesseraConfig::load(path.clone())
            .with_context(|| format!("failed to load config from {path}")),
        None => Ok(TesseraConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let ring_config = RingConfig::new(config.capacity)
        .with_lock_timeout(config.lock_timeout())
        .with_serialized_writers(config.serialize_writers);
    let ring = SlotRing::<SensorFrame>::with_config(ring_config);

    let producer = Producer::new(
        SensorId(config.producer.sensor_id),
        Duration::from_millis(config.producer.hold_ms),
        Duration::from_millis(config.producer.idle_ms),
    );

    info!(
        capacity = config.capacity,
        lock_timeout_ms = config.lock_timeout_ms,
        consumers = config.consumers.len(),
        run_secs = config.run_secs,
        "starting tessera demo"
    );

    let stop = AtomicBool::new(false);
    let run_for = Duration::from_secs(config.run_secs);
    let render_every = Duration::from_millis(config.render_interval_ms.max(1));

    thread::scope(|s| {
        let ring = &ring;
        let stop = &stop;

        let producer_handle = s.spawn(move || producer.run(ring, stop));

        let mut consumer_handles = Vec::new();
        let mut reader_handles = Vec::new();
        for (id, c) in config.consumers.iter().enumerate() {
            let hold = Duration::from_millis(c.hold_ms);
            let idle = Duration::from_millis(c.idle_ms);
            match c.kind {
                ConsumerKind::Consume => {
                    let consumer = Consumer::new(hold, idle);
                    consumer_handles.push((id, s.spawn(move || consumer.run(ring, stop))));
                }
                ConsumerKind::Newest => {
                    let reader = NewestReader::new(hold, idle);
                    reader_handles.push((id, s.spawn(move || reader.run(ring, stop))));
                }
            }
        }

        let start = Instant::now();
        let mut out = std::io::stdout().lock();
        while start.elapsed() < run_for {
            let _ = write!(out, "\r{ring}");
            let _ = out.flush();
            thread::sleep(render_every);
        }
        let _ = writeln!(out);
        stop.store(true, Ordering::Relaxed);

        match producer_handle.join() {
            Ok(stats) => info!(?stats, "producer finished"),
            Err(_) => tracing::error!("producer thread panicked"),
        }
        for (id, h) in consumer_handles {
            match h.join() {
                Ok(stats) => info!(id, ?stats, "consumer finished"),
                Err(_) => tracing::error!(id, "consumer thread panicked"),
            }
        }
        for (id, h) in reader_handles {
            match h.join() {
                Ok(stats) => info!(id, ?stats, "reader finished"),
                Err(_) => tracing::error!(id, "reader thread panicked"),
            }
        }
    });

    info!(consumable = ring.num_consumable_slots(), "tessera demo stopped");
    Ok(())
}
