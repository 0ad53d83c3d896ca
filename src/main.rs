//! Simulated Radio Main Application
//!
//! Entry point for the STM32G474 band-activity generator.
//! Initializes the AD9833 bank, builds the band and runs the engine loop.
//! The tuning knob runs in its own task and publishes the dial.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU32, Ordering};

use defmt::{debug, info, warn};
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_time::{Instant, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use simradio_firmware::drivers::ad9833::Ad9833;
use simradio_firmware::drivers::encoder::{Quadrature, TuningKnob};
use simradio_firmware::meter::ChargeMeter;
use simradio_firmware::prelude::*;
use simradio_firmware::sim::SimRadio;
use simradio_firmware::station::Station;

static RADIO: StaticCell<SimRadio> = StaticCell::new();

/// Dial published by the tuning task (Hz)
static DIAL_HZ: AtomicU32 = AtomicU32::new(DEFAULT_DIAL_HZ);

fn dial() -> DialFrequency {
    DialFrequency::from_hz(DIAL_HZ.load(Ordering::Relaxed))
}

/// Default station roster: 40m CW and numbers, 20m RTTY, 2m pagers
fn band_plan(radio: &mut SimRadio) {
    let roster = [
        Station::cw(7_001_000.0, 31, 10, 0x1001),
        Station::cw(7_001_500.0, 19, 50, 0x1002),
        Station::cw(7_002_000.0, 11, 95, 0x1003),
        Station::cw(7_002_500.0, 15, 40, 0x1004),
        Station::cw(7_003_000.0, 25, 80, 0x1005),
        Station::cw(7_003_500.0, 22, 30, 0x1006),
        Station::cw(7_004_000.0, 18, 60, 0x1007),
        Station::cw(7_004_500.0, 28, 20, 0x1008),
        Station::cw(7_005_000.0, 13, 70, 0x1009),
        Station::cw(7_005_500.0, 16, 45, 0x100A),
        Station::numbers(7_006_000.0, 12, 0x2001),
        Station::numbers(7_007_000.0, 15, 0x2002),
        Station::numbers(7_008_000.0, 18, 0x2003),
        Station::numbers(7_009_000.0, 22, 0x2004),
        Station::jammer(7_010_000.0, 0x3001),
        Station::teleprinter(14_002_000.0, 0x4001),
        Station::teleprinter(14_004_000.0, 0x4002),
        Station::teleprinter(14_006_000.0, 0x4003),
        Station::teleprinter(14_008_000.0, 0x4004),
        Station::pager(146_800_000.0, 0x5001),
        Station::dual_pager(146_900_000.0, 0x5002),
    ];
    for station in roster {
        if let Err(e) = radio.add_station(station) {
            warn!("station not added: {}", e);
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn now() -> Millis {
    Millis::new(Instant::now().as_millis() as u32)
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Simulated radio firmware v{}", env!("CARGO_PKG_VERSION"));

    let p = embassy_stm32::init(embassy_stm32::Config::default());

    let led = Output::new(p.PC6, Level::Low, Speed::Low);
    let enc_a = Input::new(p.PA0, Pull::Up);
    let enc_b = Input::new(p.PA1, Pull::Up);

    // SPI1: PA5 = SCK, PA7 = MOSI; the AD9833 samples on the falling edge
    let mut spi_config = spi::Config::default();
    spi_config.mode = spi::MODE_2;
    spi_config.frequency = Hertz(GENERATOR_SPI_HZ);
    let mut bus = Spi::new_txonly(p.SPI1, p.PA5, p.PA7, p.DMA1_CH1, spi_config);

    let mut chips = [
        Ad9833::new(Output::new(p.PB0, Level::High, Speed::VeryHigh), AD9833_MCLK_HZ),
        Ad9833::new(Output::new(p.PB1, Level::High, Speed::VeryHigh), AD9833_MCLK_HZ),
        Ad9833::new(Output::new(p.PB2, Level::High, Speed::VeryHigh), AD9833_MCLK_HZ),
        Ad9833::new(Output::new(p.PB10, Level::High, Speed::VeryHigh), AD9833_MCLK_HZ),
    ];
    for (slot, chip) in chips.iter_mut().enumerate() {
        if let Err(e) = chip.init(&mut bus).await {
            warn!("gen{} init failed: {}", slot, e);
        }
    }
    info!("Generator bank initialized");

    let radio = RADIO.init(SimRadio::new(SimConfig::default()));
    band_plan(radio);
    radio.set_pipelining(true);

    let mut meter = ChargeMeter::new();
    radio.setup(dial(), now(), &mut meter);

    spawner.must_spawn(heartbeat_task(led));
    spawner.must_spawn(tuning_task(enc_a, enc_b));
    info!("Engine running at {}", dial());

    loop {
        let t = now();
        radio.tick(t, dial(), &mut meter);
        meter.decay(t);

        let mut failed = false;
        let mut pending: heapless::Vec<(usize, GeneratorCommand), 32> = heapless::Vec::new();
        radio.drain_commands(|slot, command| {
            if pending.push((slot, command)).is_err() {
                failed = true;
            }
        });
        for (slot, command) in pending {
            if let Some(chip) = chips.get_mut(slot) {
                if chip.apply(&mut bus, command).await.is_err() {
                    failed = true;
                }
            }
        }
        if failed {
            radio.mark_hardware_unknown();
        }

        Timer::after_millis(TICK_PERIOD_MS).await;
    }
}

/// Heartbeat task - blinks LED to show system is running
#[embassy_executor::task]
async fn heartbeat_task(mut led: Output<'static>) {
    loop {
        led.set_high();
        Timer::after_millis(100).await;
        led.set_low();
        Timer::after_millis(900).await;
    }
}

/// Tuning task - polls the encoder and publishes the dial
#[embassy_executor::task]
async fn tuning_task(a: Input<'static>, b: Input<'static>) {
    let mut decoder = Quadrature::new();
    let mut knob = TuningKnob::new(DIAL_HZ.load(Ordering::Relaxed), TUNING_STEP_HZ);
    loop {
        if let Some(detent) = decoder.update(a.is_high(), b.is_high()) {
            let dial = knob.turn(detent, now());
            debug!("dial {} {}", detent, dial);
            DIAL_HZ.store(dial.hz(), Ordering::Relaxed);
        }
        Timer::after_millis(1).await;
    }
}
