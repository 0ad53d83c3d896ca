//! Generator Pool Tests
//!
//! Tests for lease exclusivity, command queueing and tuning words.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test generator_tests

use simradio_firmware::config::{AD9833_MCLK_HZ, GENERATOR_COUNT, SILENT_HZ};
use simradio_firmware::drivers::ad9833::{command_words, control_word};
use simradio_firmware::generator::{tuning_word, Generator, GeneratorCommand, GeneratorPool};
use simradio_firmware::types::{Channel, StationId};

fn drain(generator: &mut Generator) -> Vec<GeneratorCommand> {
    let mut out = Vec::new();
    generator.drain(|c| out.push(c));
    out
}

// =============================================================================
// Pool Tests
// =============================================================================

#[test]
fn pool_hands_out_each_generator_once() {
    let mut pool = GeneratorPool::default();
    let mut slots = Vec::new();
    for i in 0..GENERATOR_COUNT {
        let lease = pool.acquire(StationId::new(i as u8)).expect("free generator");
        slots.push(lease.slot());
    }
    slots.sort_unstable();
    slots.dedup();
    assert_eq!(slots.len(), GENERATOR_COUNT);
    assert!(pool.acquire(StationId::new(9)).is_none());
    assert_eq!(pool.available_count(), 0);
}

#[test]
fn pool_released_slot_is_reused() {
    let mut pool = GeneratorPool::default();
    let a = pool.acquire(StationId::new(0)).unwrap();
    let _b = pool.acquire(StationId::new(1)).unwrap();
    let slot = a.slot();
    pool.release(a, StationId::new(0));
    assert_eq!(pool.holder(slot), None);

    let c = pool.acquire(StationId::new(2)).unwrap();
    assert_eq!(c.slot(), slot);
    assert_eq!(pool.holder(slot), Some(StationId::new(2)));
}

#[test]
fn pool_pair_needs_two_free() {
    let mut pool = GeneratorPool::new(3);
    let _a = pool.acquire(StationId::new(0)).unwrap();
    let _b = pool.acquire(StationId::new(1)).unwrap();
    assert!(pool.acquire_pair(StationId::new(2)).is_none());
    // Nothing leaked by the failed attempt
    assert_eq!(pool.available_count(), 1);
}

#[test]
fn pool_pair_distinct_slots() {
    let mut pool = GeneratorPool::default();
    let (a, b) = pool.acquire_pair(StationId::new(4)).unwrap();
    assert_ne!(a.slot(), b.slot());
    assert_eq!(pool.holder(a.slot()), Some(StationId::new(4)));
    assert_eq!(pool.holder(b.slot()), Some(StationId::new(4)));
}

// =============================================================================
// Generator Queue Tests
// =============================================================================

#[test]
fn generator_boot_writes_everything() {
    let mut gen = Generator::new();
    let cmds = drain(&mut gen);
    assert_eq!(cmds.len(), 3);
    assert!(gen.is_silent());
    assert!(!gen.has_pending());
}

#[test]
fn generator_queues_only_changes() {
    let mut gen = Generator::new();
    drain(&mut gen);

    assert!(gen.set_frequency(Channel::Main, 700.0));
    assert!(!gen.set_frequency(Channel::Main, 700.0));
    gen.select(Channel::Main);
    gen.select(Channel::Alt);

    let cmds = drain(&mut gen);
    assert_eq!(
        cmds,
        vec![
            GeneratorCommand::SetFrequency {
                channel: Channel::Main,
                hz: 700.0
            },
            GeneratorCommand::Select(Channel::Alt),
        ]
    );
    assert_eq!(gen.output(), SILENT_HZ);
}

#[test]
fn generator_force_refresh_rewrites_state() {
    let mut gen = Generator::new();
    gen.set_frequency(Channel::Alt, 1200.0);
    drain(&mut gen);

    gen.force_refresh();
    let cmds = drain(&mut gen);
    assert_eq!(cmds.len(), 3);
    assert!(cmds.contains(&GeneratorCommand::SetFrequency {
        channel: Channel::Alt,
        hz: 1200.0
    }));
}

#[test]
fn pool_drain_reports_slot() {
    let mut pool = GeneratorPool::new(2);
    pool.drain_commands(|_, _| {});
    let lease = pool.acquire(StationId::new(0)).unwrap();
    let slot = lease.slot();
    pool.generator_mut(&lease).unwrap().set_frequency(Channel::Main, 800.0);

    let mut seen = Vec::new();
    pool.drain_commands(|s, c| seen.push((s, c)));
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, slot);
}

// =============================================================================
// Tuning Word Tests
// =============================================================================

#[test]
fn tuning_word_scales_with_frequency() {
    let w1 = tuning_word(1000.0, AD9833_MCLK_HZ);
    let w2 = tuning_word(2000.0, AD9833_MCLK_HZ);
    assert_eq!(w1, 10_737);
    assert!((w2 as i64 - 2 * w1 as i64).abs() <= 1);
}

#[test]
fn tuning_word_fits_28_bits() {
    assert!(tuning_word(20_000_000.0, AD9833_MCLK_HZ) < (1 << 28));
    assert_eq!(tuning_word(f32::NAN, AD9833_MCLK_HZ), 0);
}

#[test]
fn select_command_is_one_control_word() {
    let (words, count) = command_words(GeneratorCommand::Select(Channel::Alt), AD9833_MCLK_HZ);
    assert_eq!(count, 1);
    assert_eq!(words[0], control_word(Channel::Alt, false));
}
