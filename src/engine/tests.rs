use {
    super::*,
    crate::{
        clock::Tier,
        hal::{PwmDivisor, sim::SimHardware},
        phase_accumulator::UNITY_GAIN,
    },
};

fn engine() -> Engine<SimHardware> {
    Engine::new(SimHardware::new(7), Calibration::default())
}

fn synced_engine() -> Engine<SimHardware> {
    let mut eng = engine();
    assert!(eng.toggle_square_wave_sync());
    eng
}

#[test]
fn power_up_defaults() {
    let eng = engine();
    let st = eng.status();
    assert_eq!(st.selector, TierSelector::Fast(Tier::T0));
    assert_eq!(st.mode, Mode::Wave);
    assert_eq!(st.pin, SquarePin::Unsynced);
    assert!(eng.hw().dma_running);
    assert!(eng.hw().irqs.contains(IrqSources::DMA));
    // 1 kHz unsynced square runs on the PWM unit
    assert_eq!(eng.hw().pwm.map(|p| p.divisor), Some(PwmDivisor::X2));
}

/// The DMA tiers can only divide the clock by whole numbers. At 1 kHz tier 0 truncates
/// the divisor to 262, which plays 1001.91 Hz, so 0.01% accuracy is out of reach there.
/// The fast path is held to one divisor step; 0.01% is only checked in exact mode.
#[test]
fn one_khz_tier_zero_and_exact() {
    let mut eng = engine();
    let st = eng.status();
    assert_eq!(st.selector, TierSelector::Fast(Tier::T0));
    // Divisor 262 at 160 samples per cycle
    assert!((st.wave_freq - tc_to_freq(262, 160)).abs() < 1e-9);
    assert!((st.wave_freq - 1001.91).abs() < 0.01);
    assert!(st.wave_freq >= 1000.0 && (st.wave_freq - 1000.0) / 1000.0 < 1.0 / 262.0);
    assert!(eng.toggle_exact_freq_mode());
    let st = eng.status();
    assert_eq!(st.selector, TierSelector::Slow);
    assert!((st.wave_freq - 1000.0).abs() / 1000.0 < 1e-4);
    assert!(!eng.hw().dma_running);
    assert!(eng.hw().irqs.contains(IrqSources::SLOW_TICK));
    assert!(!eng.toggle_exact_freq_mode());
    assert_eq!(eng.status().selector, TierSelector::Fast(Tier::T0));
    assert!(!eng.hw().irqs.contains(IrqSources::SLOW_TICK));
}

#[test]
fn tier_follows_frequency() {
    let mut eng = engine();
    for (freq, sel) in [
        (999.0, TierSelector::Slow),
        (10_000.0, TierSelector::Fast(Tier::T0)),
        (15_000.0, TierSelector::Fast(Tier::T1)),
        (30_000.0, TierSelector::Fast(Tier::T2)),
        (90_000.0, TierSelector::Fast(Tier::T3)),
    ] {
        eng.set_frequency(Frequency::Hz(freq));
        assert_eq!(eng.status().selector, sel, "{freq}");
    }
    eng.set_frequency(Frequency::Hz(1e9));
    assert!((eng.wave_target().freq - MAX_WAVE_FREQ).abs() < 1e-9);
    assert!((eng.square_target().freq - MAX_SQUARE_FREQ).abs() < 1e-9);
}

#[test]
fn zero_duty_at_50khz_holds_a_half() {
    let mut eng = synced_engine();
    eng.set_frequency(Frequency::Hz(50_000.0));
    eng.set_duty(DutyCycle::Percent(0.0));
    assert_eq!(eng.status().selector, TierSelector::Fast(Tier::T3));
    let expected = extreme_duty(0.0, tc_to_freq(52, 16));
    assert_eq!(Some(eng.status().wave_duty), expected);
    // Let the half queued before the change drain
    eng.run_sim_ms(1);
    eng.hw_mut().clear_records();
    eng.run_sim_ms(1);
    let events = &eng.hw().pin_events;
    assert!((49..=51).contains(&events.len()), "{}", events.len());
    assert!(events.iter().all(|ev| *ev == PinAction::Pulse(true)));
    let (_, queued) = eng.hw().dma_buffers();
    assert_eq!(queued, eng.buffers.half(Tier::T3, Half::Second, &eng.duty));
    assert_eq!(queued.len(), 16);
}

#[test]
fn synced_square_follows_fast_halves() {
    let mut eng = synced_engine();
    eng.set_frequency(Frequency::Hz(5000.0));
    eng.run_sim_ms(1);
    eng.hw_mut().clear_records();
    eng.run_sim_ms(2);
    let events = &eng.hw().pin_events;
    // 10 cycles, two edges each
    assert!((19..=21).contains(&events.len()), "{}", events.len());
    for pair in events.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
    assert!(eng.hw().spun > 0);
}

#[test]
fn slow_path_plays_and_toggles() {
    let mut eng = synced_engine();
    eng.set_frequency(Frequency::Hz(100.0));
    assert_eq!(eng.status().selector, TierSelector::Slow);
    eng.hw_mut().clear_records();
    eng.run_sim_ms(20);
    let hw = eng.hw();
    assert_eq!(hw.dac.len(), 8000);
    assert!(hw.pin_events.contains(&PinAction::Level(true)));
    assert!(hw.pin_events.contains(&PinAction::Level(false)));
    let (lo, hi) = hw
        .dac
        .iter()
        .fold((u16::MAX, 0), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    assert!(lo < 100 && hi > 4000, "{lo} {hi}");
}

#[test]
fn noise_round_trip_restores_sync() {
    let mut eng = synced_engine();
    eng.set_wave_shape(WaveShape::Noise);
    let st = eng.status();
    assert_eq!(st.mode, Mode::Noise { resume_synced: true });
    assert_eq!(st.pin, SquarePin::Unsynced);
    assert!(eng.hw().irqs.contains(IrqSources::NOISE_TICK));
    assert!(!eng.hw().irqs.contains(IrqSources::DMA));
    assert!(!eng.hw().dma_running);
    assert!(eng.hw().pwm.is_some());
    // Can't sync to noise
    assert!(!eng.toggle_square_wave_sync());
    eng.hw_mut().clear_records();
    eng.run_sim_ms(1);
    assert_eq!(eng.hw().dac.len(), 150);
    eng.set_wave_shape(WaveShape::Triangle);
    assert_eq!(eng.status().mode, Mode::Wave);
    assert!(eng.synced());
    assert!(!eng.hw().irqs.contains(IrqSources::NOISE_TICK));
    assert!(eng.hw().irqs.contains(IrqSources::DMA));
    assert!(eng.hw().pwm.is_none());
}

#[test]
fn timer_mode_owns_the_pin() {
    let mut eng = synced_engine();
    eng.set_control(Control::Both);
    assert_eq!(eng.enter_timer_mode(false), Ok(()));
    assert_eq!(
        eng.status().pin,
        SquarePin::Timer {
            resume_synced: true,
            invert: false
        }
    );
    assert_eq!(eng.control(), Control::Synced);
    assert!(!eng.hw().square);
    assert!(!eng.toggle_square_wave_sync());
    eng.hw_mut().clear_records();
    eng.run_sim_ms(1);
    assert!(eng.hw().pin_events.is_empty());
    eng.set_timer_output(true);
    assert!(eng.hw().square);
    assert_eq!(eng.start_sweep(0), Err(SweepError::TimerActive));
    eng.exit_timer_mode();
    assert!(eng.synced());
}

#[test]
fn inverted_timer_returns_to_unsynced() {
    let mut eng = engine();
    assert_eq!(eng.enter_timer_mode(true), Ok(()));
    assert!(eng.hw().square);
    assert!(eng.hw().pwm.is_none());
    eng.set_timer_output(true);
    assert!(!eng.hw().square);
    eng.exit_timer_mode();
    assert_eq!(eng.status().pin, SquarePin::Unsynced);
    assert!(eng.hw().pwm.is_some());
}

#[test]
fn timer_period_is_kept_when_invalid() {
    let mut eng = engine();
    let bad = TimerPeriod {
        minutes: 60,
        ..TimerPeriod::default()
    };
    assert_eq!(eng.set_timer_period(bad), Err(TimerError::OutOfRange));
    assert_eq!(eng.timer_period(), &bad);
}

#[test]
fn sweep_runs_and_restores() {
    let mut eng = engine();
    let cfg = SweepConfig {
        min_freq: 100.0,
        max_freq: 1000.0,
        rise_secs: 1.0,
        fall_secs: 1.0,
    };
    assert_eq!(eng.set_sweep_config(cfg), Ok(()));
    assert_eq!(eng.start_sweep(0), Ok(()));
    assert!(eng.status().sweeping);
    assert!((eng.wave_target().freq - 100.0).abs() < 1e-9);
    assert_eq!(eng.status().selector, TierSelector::Slow);
    assert_eq!(eng.enter_timer_mode(false), Err(TimerError::SweepActive));
    let mut last = 100.0;
    for step in 1..=20 {
        eng.poll(step * 25);
        let freq = eng.wave_target().freq;
        assert!(freq > last);
        last = freq;
    }
    assert!((eng.square_target().freq - last).abs() < 1e-9);
    assert!((eng.snapshot().wave.freq - 1000.0).abs() < 1e-9);
    eng.stop_sweep();
    assert!(!eng.status().sweeping);
    assert!((eng.wave_target().freq - 1000.0).abs() < 1e-9);
    assert!((eng.square_target().freq - 1000.0).abs() < 1e-9);
    assert_eq!(eng.status().selector, TierSelector::Fast(Tier::T0));
}

#[test]
fn sweep_caps_the_wave() {
    let mut eng = engine();
    let cfg = SweepConfig {
        min_freq: 150_000.0,
        max_freq: 1e6,
        rise_secs: 1.0,
        fall_secs: 0.0,
    };
    assert_eq!(eng.set_sweep_config(cfg), Ok(()));
    assert_eq!(eng.start_sweep(0), Ok(()));
    assert!((eng.wave_target().freq - SWEEP_WAVE_LIMIT).abs() < 1e-9);
    assert!((eng.square_target().freq - 150_000.0).abs() < 1e-9);
}

#[test]
fn invalid_sweep_is_refused() {
    let mut eng = engine();
    let cfg = SweepConfig {
        min_freq: 500.0,
        max_freq: 100.0,
        ..SweepConfig::default()
    };
    assert_eq!(eng.set_sweep_config(cfg), Err(SweepError::InvertedRange));
    assert_eq!(eng.start_sweep(0), Err(SweepError::InvertedRange));
    assert!(!eng.status().sweeping);
}

#[test]
fn pulse_width_follows_frequency() {
    let mut eng = engine();
    eng.set_control(Control::Synced);
    eng.set_duty(DutyCycle::PulseWidthUs(100.0));
    eng.set_frequency(Frequency::Hz(2000.0));
    assert!((eng.wave_target().duty - 20.0).abs() < 1e-9);
    assert!((eng.square_target().duty - 50.0).abs() < 1e-9);
    eng.set_frequency(Frequency::PeriodMs(0.2));
    assert!((eng.wave_target().freq - 5000.0).abs() < 1e-6);
    assert!((eng.wave_target().duty - 50.0).abs() < 1e-6);
    assert_eq!(eng.wave_target().period_ms, Some(0.2));
}

#[test]
fn low_unsynced_square_uses_interrupt() {
    let mut eng = engine();
    eng.set_control(Control::Unsynced);
    eng.set_frequency(Frequency::Hz(10.0));
    assert!(eng.hw().pwm.is_none());
    assert!(eng.hw().irqs.contains(IrqSources::UNSYNCED_TICK));
    assert!((eng.wave_target().freq - 1000.0).abs() < 1e-9);
    eng.hw_mut().clear_records();
    eng.run_sim_ms(200);
    let events = &eng.hw().pin_events;
    assert!((3..=5).contains(&events.len()), "{}", events.len());
    assert!((eng.status().square_freq - 10.0).abs() < 1e-6);
}

#[test]
fn shape_changes_rebuild_tables() {
    let mut eng = engine();
    let sine = eng.table().half(Half::First).to_vec();
    eng.set_wave_shape(WaveShape::Triangle);
    assert_ne!(eng.table().half(Half::First), sine.as_slice());
    let tri = eng.table().half(Half::First).to_vec();
    // Sine parameters don't touch the triangle being played
    assert!(eng.set_shape_parameter(WaveShape::Sine, ShapeParam::Amplitude, 0.2));
    assert_eq!(eng.table().half(Half::First), tri.as_slice());
    assert!(eng.set_shape_parameter(WaveShape::Triangle, ShapeParam::Amplitude, 0.2));
    assert_ne!(eng.table().half(Half::First), tri.as_slice());
    assert!(!eng.set_shape_parameter(WaveShape::Triangle, ShapeParam::Colour, 1.0));
}

#[test]
fn arbitrary_upload_and_randomize() {
    let mut eng = engine();
    eng.set_wave_shape(WaveShape::Arbitrary);
    let mut up = WaypointUpload::new();
    for level in [0, 4095, 0, 4095] {
        up.push_level(level).unwrap();
    }
    assert_eq!(eng.commit_waypoints(up), Ok(()));
    assert_eq!(eng.waypoints().len(), 4);
    let uploaded = eng.table().half(Half::First).to_vec();
    assert_eq!(
        eng.commit_waypoints(WaypointUpload::new()),
        Err(crate::UploadError::Empty)
    );
    assert_eq!(eng.waypoints().len(), 4);
    eng.randomize_arbitrary(RandomStyle::Mixed);
    assert_eq!(eng.waypoints().len(), 300);
    assert_ne!(eng.table().half(Half::First), uploaded.as_slice());
}

#[test]
fn reset_phase_restarts_slow_cycle() {
    let mut eng = synced_engine();
    eng.set_frequency(Frequency::Hz(10.0));
    eng.run_sim_ms(30);
    eng.hw_mut().clear_records();
    eng.reset_phase();
    assert_eq!(eng.phase, PhaseState::at(Half::First));
    assert_eq!(eng.hw().pin_events, [PinAction::Level(true)]);
}

#[test]
fn snapshot_survives_power_cycle() {
    let mut eng = synced_engine();
    eng.set_wave_shape(WaveShape::Triangle);
    eng.set_frequency(Frequency::Hz(5000.0));
    eng.set_duty(DutyCycle::Percent(30.0));
    eng.toggle_exact_freq_mode();
    eng.set_gain(UNITY_GAIN / 2);
    eng.set_shape_parameter(WaveShape::Triangle, ShapeParam::Steps, 4.0);
    let snap = eng.snapshot();
    let text = toml::to_string(&snap).unwrap();
    let loaded: Snapshot = toml::from_str(&text).unwrap();
    let restored = Engine::with_snapshot(SimHardware::new(1), Calibration::default(), &loaded);
    assert_eq!(restored.snapshot(), snap);
    assert_eq!(restored.status(), eng.status());
    assert_eq!(restored.table().half(Half::First), eng.table().half(Half::First));
}

#[test]
fn snapshot_restores_noise() {
    let mut eng = synced_engine();
    eng.set_wave_shape(WaveShape::Noise);
    let snap = eng.snapshot();
    assert!(snap.synced);
    let restored = Engine::with_snapshot(SimHardware::new(1), Calibration::default(), &snap);
    assert_eq!(restored.status().mode, Mode::Noise { resume_synced: true });
    assert!(restored.hw().irqs.contains(IrqSources::NOISE_TICK));
    assert!(!restored.hw().dma_running);
}

#[test]
fn modulation_scales_the_wave() {
    let mut eng = engine();
    eng.hw_mut().analog = 2048;
    assert!(eng.set_modulation(true));
    let st = eng.status();
    assert_eq!(st.mode, Mode::Modulation);
    assert_eq!(st.selector, TierSelector::Slow);
    assert!(!eng.hw().dma_running);
    assert!(eng.hw().irqs.contains(IrqSources::SLOW_TICK));
    let span = |eng: &mut Engine<SimHardware>| {
        eng.hw_mut().clear_records();
        eng.run_sim_ms(2);
        eng.hw()
            .dac
            .iter()
            .fold((u16::MAX, 0), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    };
    // Half depth keeps the wave within a quarter of full scale around the centre
    let (lo, hi) = span(&mut eng);
    assert!((1024..1100).contains(&lo) && (3000..=3071).contains(&hi), "{lo} {hi}");
    eng.hw_mut().analog = 4095;
    eng.poll(1);
    let (lo, hi) = span(&mut eng);
    assert!(lo < 100 && hi > 4000, "{lo} {hi}");
    eng.hw_mut().analog = 0;
    eng.poll(2);
    assert_eq!(span(&mut eng), (2048, 2048));
    assert!(!eng.set_modulation(false));
    let st = eng.status();
    assert_eq!(st.mode, Mode::Wave);
    assert_eq!(st.selector, TierSelector::Fast(Tier::T0));
    assert!(eng.hw().dma_running);
    assert!(!eng.hw().irqs.contains(IrqSources::SLOW_TICK));
}

#[test]
fn modulation_is_saved_and_yields_to_noise() {
    let mut eng = engine();
    eng.set_modulation(true);
    let snap = eng.snapshot();
    assert!(snap.modulation);
    let restored = Engine::with_snapshot(SimHardware::new(1), Calibration::default(), &snap);
    assert_eq!(restored.status().mode, Mode::Modulation);
    assert_eq!(restored.status().selector, TierSelector::Slow);
    eng.set_wave_shape(WaveShape::Noise);
    assert!(matches!(eng.status().mode, Mode::Noise { .. }));
    assert!(!eng.set_modulation(true));
    assert!(!eng.hw().irqs.contains(IrqSources::SLOW_TICK));
    eng.set_wave_shape(WaveShape::Sine);
    assert_eq!(eng.status().mode, Mode::Wave);
}
