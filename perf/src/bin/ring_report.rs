use std::hint::black_box;
use std::mem::{align_of, size_of};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tessera_frames::{SensorFrame, SensorId};
use tessera_perf::*;
use tessera_ring::{RingConfig, RingError, SlotRing};

const HANDOFFS: u64 = 50_000;

fn main() {
    section_header("Layout");
    println!(
        "  SensorFrame: {} bytes, align {}",
        size_of::<SensorFrame>(),
        align_of::<SensorFrame>()
    );

    section_header("Single thread");
    print_table_header();
    for r in single_thread_results() {
        print_result_row(&r);
    }

    section_header("Producer to consumer handoff");
    print_table_header();
    for &cap in &[16usize, 1024] {
        if let Some(r) = handoff_latency(cap) {
            print_result_row(&r);
        }
    }
}

fn single_thread_results() -> Vec<BenchResult> {
    let ring = SlotRing::<SensorFrame>::with_config(RingConfig::new(1024));
    let frame = make_test_frame(1);
    let mut results = Vec::new();

    results.push(measure_batched("write_release", 1_000, 100, 10, || {
        if let Ok((mut slot, _)) = ring.write_next() {
            *slot = black_box(frame);
        }
    }));

    results.push(measure_batched("write_consume", 1_000, 100, 10, || {
        drop(ring.write_next());
        black_box(ring.consume_next_available().map(|slot| slot.seq).ok());
    }));

    drop(ring.write_next());
    results.push(measure_batched("read_newest_available", 1_000, 100, 10, || {
        black_box(ring.read_newest_available().map(|slot| slot.seq).ok());
    }));

    results
}

/// Latency from stamping a frame in the producer to a consumer holding it.
fn handoff_latency(capacity: usize) -> Option<BenchResult> {
    let ring = SlotRing::<SensorFrame>::with_config(
        RingConfig::new(capacity).with_lock_timeout(Duration::from_millis(100)),
    );
    let epoch = Instant::now();
    let done = AtomicBool::new(false);

    let mut samples = thread::scope(|s| {
        let consumer = s.spawn(|| {
            let mut samples = Vec::with_capacity(HANDOFFS as usize);
            loop {
                match ring.consume_next_available() {
                    Ok(slot) => {
                        let now = epoch.elapsed().as_nanos() as u64;
                        samples.push(now.saturating_sub(slot.ts_ns));
                    }
                    Err(RingError::DataAvailableTimeout) if done.load(Ordering::Acquire) => break,
                    Err(_) => {}
                }
            }
            samples
        });

        for seq in 0..HANDOFFS {
            if let Ok((mut slot, _)) = ring.write_next() {
                slot.fill(seq, epoch.elapsed().as_nanos() as u64, SensorId(1));
            }
            if seq % 64 == 0 {
                thread::yield_now();
            }
        }
        done.store(true, Ordering::Release);
        consumer.join().unwrap_or_default()
    });

    if samples.is_empty() {
        return None;
    }
    Some(BenchResult {
        name: format!("handoff_cap_{capacity}"),
        unit: "ns",
        stats: compute_stats(&mut samples),
    })
}
