//! Autotune Cache Usage Example
//!
//! Simulates a training loop whose convolution layers pick their algorithm
//! through the cache, with a per-step status report and flush check.
//!
//! Run with: RUST_LOG=debug cargo run --example autotune_usage

extern crate autotune_cache;

use autotune_cache::key::{conv_key, DataType};
use autotune_cache::{AutoTuneCache, CacheMetrics};
use std::sync::Arc;
use std::thread;

/// Stand-in for benchmarking every candidate algorithm.
fn pick_best_algorithm(x_dims: &[i64], w_dims: &[i64]) -> i64 {
    (x_dims.iter().sum::<i64>() + w_dims.iter().sum::<i64>()) % 4
}

fn run_layer(registry: &AutoTuneCache, x_dims: &[i64], w_dims: &[i64]) -> i64 {
    let key = conv_key(x_dims, w_dims, &[1, 1], &[1, 1], &[1, 1], DataType::Float32);
    let conv = registry.register_or_get("conv_forward");
    conv.get_or_insert_with(key, || pick_best_algorithm(x_dims, w_dims))
}

fn main() {
    env_logger::init();

    let registry: Arc<AutoTuneCache> = Arc::new(AutoTuneCache::new());
    let layers: Vec<(Vec<i64>, Vec<i64>)> = vec![
        (vec![32, 3, 224, 224], vec![64, 3, 3, 3]),
        (vec![32, 64, 112, 112], vec![128, 64, 3, 3]),
        (vec![32, 128, 56, 56], vec![256, 128, 3, 3]),
    ];

    println!("🔁 Static shapes: four workers, fifty iterations per step");
    for step in 0..5 {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let layers = layers.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        for (x_dims, w_dims) in &layers {
                            run_layer(&registry, x_dims, w_dims);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let status = registry.update_status();
        let flushed = registry.clean(status.miss_rate());
        println!(
            "   step {}: size {} hits {} misses {} hit rate {:.3} flushed {}",
            step,
            status.size,
            status.hits,
            status.misses,
            status.hit_rate(),
            flushed
        );
    }

    println!("🌊 Dynamic shapes: every step sees a new batch size");
    for step in 0..3i64 {
        let x_dims = [step + 1, 3, 224, 224];
        run_layer(&registry, &x_dims, &layers[0].1);
        let status = registry.update_status();
        let flushed = registry.clean(status.miss_rate());
        println!(
            "   step {}: miss rate {:.3} flushed {}",
            step,
            status.miss_rate(),
            flushed
        );
    }

    println!("📊 Final metrics ({}):", registry.cache_type());
    for (name, value) in registry.metrics() {
        println!("   {name}: {value}");
    }
}
