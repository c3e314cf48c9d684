//! Behaviour of the sampling loop against scripted providers.

mod helpers;

use helpers::{table, CapturingConsole, Exhausted, ScriptedProvider};
use procplot::{
    internal_metrics::Metrics,
    records::RecordBuffer,
    sampler::{Sampler, SamplerExit},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn sampler(
    provider: Arc<ScriptedProvider>,
    tick: Duration,
) -> (Sampler, RecordBuffer, Arc<CapturingConsole>) {
    let records = RecordBuffer::new();
    let console = Arc::new(CapturingConsole::default());
    let sampler = Sampler::new(
        7,
        tick,
        provider,
        records.clone(),
        console.clone(),
        Arc::new(Metrics::new()),
    );
    (sampler, records, console)
}

#[tokio::test(start_paused = true)]
async fn test_n_ticks_produce_n_increasing_records() {
    let script = (0..5).map(|i| table(&format!(" {}.0 1.0 {} 8192", i, 1024 * (i + 1)))).collect();
    let provider = Arc::new(ScriptedProvider::new(script, Exhausted::Exit));
    let (sampler, records, console) = sampler(provider.clone(), Duration::from_secs(1));
    let (_tx, rx) = watch::channel(false);

    let exit = sampler.run(rx).await;

    assert_eq!(exit, SamplerExit::ProcessExited);
    assert_eq!(provider.calls(), 6, "five samples plus the empty answer");

    let snapshot = records.snapshot();
    assert_eq!(snapshot.len(), 5);
    assert!(snapshot
        .windows(2)
        .all(|pair| pair[0].timestamp < pair[1].timestamp));
    for (i, record) in snapshot.iter().enumerate() {
        assert_eq!(record.cpu_percent, i as f64);
        assert_eq!(record.rss_kib, 1024 * (i as u64 + 1));
        assert_eq!(record.vsz_kib, 8192);
    }

    let lines = console.lines();
    assert_eq!(lines.len(), 5);
    assert!(lines[4].ends_with("cpu: 4%, mem: 1%, rss: 5 MiB, vsz: 8 MiB"), "{}", lines[4]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_provider_output_ends_loop_without_record() {
    let provider = Arc::new(ScriptedProvider::new(vec![], Exhausted::Exit));
    let (sampler, records, console) = sampler(provider.clone(), Duration::from_secs(1));
    let (_tx, rx) = watch::channel(false);

    assert_eq!(sampler.run(rx).await, SamplerExit::ProcessExited);
    assert_eq!(provider.calls(), 1);
    assert!(records.is_empty());
    assert!(console.lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_header_only_output_ends_loop() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![format!("{}\n", helpers::HEADER)],
        Exhausted::Repeat(table(" 1 1 1 1")),
    ));
    let (sampler, records, _) = sampler(provider, Duration::from_secs(1));
    let (_tx, rx) = watch::channel(false);

    assert_eq!(sampler.run(rx).await, SamplerExit::ProcessExited);
    assert!(records.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unparseable_field_degrades_to_zero() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![table("  bad  2.0 2048 4096")],
        Exhausted::Exit,
    ));
    let (sampler, records, console) = sampler(provider, Duration::from_secs(1));
    let (_tx, rx) = watch::channel(false);

    sampler.run(rx).await;

    let snapshot = records.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].cpu_percent, 0.0);
    assert_eq!(snapshot[0].mem_percent, 2.0);
    assert_eq!(snapshot[0].rss_kib, 2048);
    assert_eq!(snapshot[0].vsz_kib, 4096);
    assert!(console.lines()[0].contains("cpu: 0%"));
}

#[tokio::test(start_paused = true)]
async fn test_records_are_spaced_by_the_tick() {
    let tick = Duration::from_millis(250);
    let provider = Arc::new(ScriptedProvider::repeating(table(" 1 1 1 1")));
    let (sampler, records, _) = sampler(provider, tick);
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(sampler.run(rx));

    tokio::time::sleep(tick * 10 + tick / 2).await;
    tx.send(true).unwrap();
    assert_eq!(handle.await.unwrap(), SamplerExit::Shutdown);

    let snapshot = records.snapshot();
    assert_eq!(snapshot.len(), 10);
    let tick_ms = tick.as_millis() as i64;
    for pair in snapshot.windows(2) {
        let gap = (pair[1].timestamp - pair[0].timestamp).num_milliseconds();
        assert!(
            (gap - tick_ms).abs() <= tick_ms / 5,
            "gap of {}ms is not within 20% of {}ms",
            gap,
            tick_ms
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_query_completes_before_shutdown() {
    let provider = Arc::new(
        ScriptedProvider::repeating(table(" 1 1 1 1")).with_delay(Duration::from_millis(500)),
    );
    let (sampler, records, _) = sampler(provider, Duration::from_secs(1));
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(sampler.run(rx));

    // The first query starts at 1.0s and answers at 1.5s.
    tokio::time::sleep(Duration::from_millis(1200)).await;
    tx.send(true).unwrap();

    assert_eq!(handle.await.unwrap(), SamplerExit::Shutdown);
    assert_eq!(records.len(), 1);
}
