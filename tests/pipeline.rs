// End-to-end behavior from device lines to shared state and control
// output, with no serial hardware involved.

use emglab::{
    AcquisitionState, AcquisitionTask, ChannelLayout, ConditioningPolicy, ControlSource,
    InputSnapshot, SamplePipeline, SessionClock, SessionConfig, SignalQuality,
};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

fn config(layout: ChannelLayout, policy: ConditioningPolicy) -> SessionConfig {
    SessionConfig {
        layout,
        policy: Some(policy),
        poll_timeout_ms: 20,
        retry_delay_ms: 5,
        ..SessionConfig::default()
    }
}

// =============================================================================
// LINE-TO-STATE PIPELINE
// =============================================================================

#[test]
fn test_fixed_threshold_sequence() {
    let config = config(ChannelLayout::Crosshair, ConditioningPolicy::FixedThreshold);
    let state = AcquisitionState::new(2);
    let mut pipeline = SamplePipeline::new(&config, state.clone(), SessionClock::start());

    pipeline.ingest_line("EMG,100,0.50,0.00");
    assert_eq!(state.snapshot().conditioned, vec![3.0, 0.0]);
    assert!(!state.is_calibrated());

    pipeline.ingest_line("EMG,200,0.08,0.50");
    assert_eq!(state.snapshot().conditioned, vec![0.0, 3.0]);

    pipeline.ingest_line("CALIBRATION_COMPLETE");
    assert!(state.is_calibrated());

    let stats = state.stats();
    assert_eq!(stats.frames_decoded, 2);
    assert_eq!(stats.frames_dropped, 0);
}

#[test]
fn test_malformed_lines_never_poison_the_stream() {
    let config = config(ChannelLayout::Crosshair, ConditioningPolicy::FixedThreshold);
    let state = AcquisitionState::new(2);
    let mut pipeline = SamplePipeline::new(&config, state.clone(), SessionClock::start());

    pipeline.ingest_line("EMG,oops,0.50,0.00");
    pipeline.ingest_line("EMG,100");
    pipeline.ingest_line("QUALITY,100");
    pipeline.ingest_line("emg,100,0.50,0.00");
    pipeline.ingest_line("EMG,100,0.50,0.00");

    let stats = state.stats();
    assert_eq!(stats.frames_decoded, 1);
    assert_eq!(stats.frames_dropped, 3);
    assert_eq!(state.snapshot().raw, vec![0.5, 0.0]);
}

#[test]
fn test_extra_trailing_fields_tolerated() {
    let config = config(ChannelLayout::Vertical, ConditioningPolicy::FixedThreshold);
    let state = AcquisitionState::new(1);
    let mut pipeline = SamplePipeline::new(&config, state.clone(), SessionClock::start());

    // Channel, baseline, and two unknown trailing fields.
    pipeline.ingest_line("EMG,100,0.29,0.02,7,debug");
    let snap = state.snapshot();
    assert_eq!(snap.raw, vec![0.29]);
    assert_eq!(snap.baseline, vec![0.02]);
    assert_eq!(state.stats().frames_dropped, 0);
}

#[test]
fn test_baseline_relative_policy_uses_calibration() {
    let config = config(ChannelLayout::Flight, ConditioningPolicy::BaselineRelative);
    let state = AcquisitionState::new(4);
    let mut pipeline = SamplePipeline::new(&config, state.clone(), SessionClock::start());

    // Warm-up formula before the device reports calibration.
    pipeline.ingest_line("EMG,100,60.0,20.0,100.0,140.0");
    assert_eq!(state.snapshot().conditioned, vec![0.5, 0.0, 1.0, 1.0]);

    pipeline.ingest_line("CALIBRATION_COMPLETE");
    pipeline.ingest_line("EMG,200,50.0,0.0,100.0,200.0");
    assert_eq!(state.snapshot().conditioned, vec![0.5, 0.0, 1.0, 1.0]);
}

// =============================================================================
// READ LOOP
// =============================================================================

#[tokio::test]
async fn test_read_loop_until_device_loss() {
    let config = config(ChannelLayout::Crosshair, ConditioningPolicy::FixedThreshold);
    let state = AcquisitionState::new(2);
    let mut task = AcquisitionTask::new(
        config,
        state.clone(),
        SessionClock::start(),
        CancellationToken::new(),
    );

    let (mut device, host) = tokio::io::duplex(512);
    device
        .write_all(b"EMG,1,0.29,0.00\nQUALITY,1,0.02,GOOD\nnoise\nEMG,2,0.50,0.50\n")
        .await
        .unwrap();
    drop(device);

    let mut reader = BufReader::new(host);
    task.read_lines(&mut reader).await;

    let snap = state.snapshot();
    assert_eq!(snap.conditioned, vec![3.0, 3.0]);
    assert_eq!(snap.quality, SignalQuality::Good);
    assert_eq!(state.stats().frames_decoded, 2);
    assert_eq!(state.stats().frames_dropped, 0);
}

#[tokio::test]
async fn test_cancellation_wins_over_pending_reads() {
    let config = config(ChannelLayout::Crosshair, ConditioningPolicy::FixedThreshold);
    let state = AcquisitionState::new(2);
    let cancel = CancellationToken::new();
    let mut task = AcquisitionTask::new(
        config,
        state,
        SessionClock::start(),
        cancel.clone(),
    );

    let (_device, host) = tokio::io::duplex(64);
    let loop_task = tokio::spawn(async move {
        let mut reader = BufReader::new(host);
        task.read_lines(&mut reader).await;
    });

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), loop_task)
        .await
        .expect("read loop should exit on cancellation")
        .unwrap();
}

// =============================================================================
// CONTROL PATH SELECTION
// =============================================================================

#[test]
fn test_control_switches_between_live_and_fallback() {
    let config = config(ChannelLayout::Crosshair, ConditioningPolicy::FixedThreshold);
    let state = AcquisitionState::new(2);
    let mut pipeline = SamplePipeline::new(&config, state.clone(), SessionClock::start());
    let mut control = ControlSource::new(ChannelLayout::Crosshair, state.clone());

    let held = InputSnapshot {
        right: true,
        ..Default::default()
    };

    // Disconnected: synthetic axes drive the vector even though a
    // sample already arrived.
    pipeline.ingest_line("EMG,1,0.50,0.00");
    assert_eq!(control.tick(held), &[0.5, 0.0]);

    state.set_connected(true);
    assert_eq!(control.tick(held), &[3.0, 0.0]);

    // Device loss mid-session falls back on the next tick.
    state.set_connected(false);
    assert_eq!(control.tick(held), &[0.5, 0.0]);
}
