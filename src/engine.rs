//! The synthesis engine.
//!
//! [`Engine`] owns every table, target and mode flag, plus the [`Hardware`] it drives.
//! Foreground operations (the `set_*` family, shape changes, uploads) rebuild whatever they
//! affect and reprogram the hardware; the interrupt handlers in [`dispatch`] only read
//! tables and advance playback state.
use {
    crate::{
        Calibration, Rng, Snapshot, SweepConfig, TimerPeriod,
        clock::{
            NOISE_TICK_HZ, SLOW_SAMPLES_PER_CYCLE, SLOW_TICK_HZ, TierSelector,
            UNSYNCED_TICK_HZ, freq_to_tc, tc_to_freq, tick_divisor,
        },
        fast_mode::{DutyTable, ReducedTable, TierBuffers},
        hal::{Hardware, IrqSources, PinAction, SampleTimer},
        noise::NoiseSynth,
        phase_accumulator::{Dither, PhaseState, SlowParams},
        result::{SweepError, SweepResult, TimerError, TimerResult, UploadResult},
        shape::{ShapeParam, ShapeParams, WaveShape},
        sweep::Sweep,
        sync_square::{SyncSquare, sync_delay},
        target::{Control, DutyCycle, Frequency, MAX_SQUARE_FREQ, MAX_WAVE_FREQ, Target},
        unsynced_square::{SquareDrive, UnsyncedSquare},
        wave_table::{ArbTable, Half, HalfCycleTable},
        waypoint::{RandomStyle, WaypointUpload, Waypoints},
    },
    std::mem,
};

mod dispatch;
#[cfg(test)]
mod tests;

/// Width of the single pulse produced at 0 and 100 percent duty, seconds
const EXTREME_PULSE_SECS: f64 = 48e-9;
/// Highest frequency a sweep takes the analogue wave to, Hz
const SWEEP_WAVE_LIMIT: f64 = 100_000.0;
/// Rate the phase accumulator path is measured against when reporting its frequency
const SLOW_MEASURE_HZ: f64 = 200_000.0;

/// Which generator feeds the DAC
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    /// Wave tables, through the DMA tiers or the phase accumulator
    Wave,
    /// Filtered noise
    Noise {
        /// Sync the square wave again when leaving noise
        resume_synced: bool,
    },
    /// Wave tables through the phase accumulator, amplitude modulated by the analogue input
    Modulation,
}

/// What drives the square wave pin
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SquarePin {
    /// Toggled at the half cycle boundaries of the analogue wave
    Synced,
    /// The independent square wave generator
    Unsynced,
    /// The output timer
    Timer {
        /// Sync the square wave again when leaving timer mode
        resume_synced: bool,
        /// Pin is driven inverted
        invert: bool,
    },
}

/// What is being produced right now
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Status {
    /// Frequency of the analogue wave, Hz
    pub wave_freq: f64,
    /// Duty cycle of the analogue wave, percent
    pub wave_duty: f64,
    /// Frequency of the unsynced square wave, Hz
    pub square_freq: f64,
    /// Duty cycle of the unsynced square wave, percent
    pub square_duty: f64,
    /// Sampling path of the analogue wave
    pub selector: TierSelector,
    /// Generator feeding the DAC
    pub mode: Mode,
    /// Owner of the square wave pin
    pub pin: SquarePin,
    /// Exact frequency mode
    pub exact: bool,
    /// A sweep is running
    pub sweeping: bool,
}

#[derive(Clone, Copy, Debug)]
struct ActiveSweep {
    sweep: Sweep,
    /// Wave and square frequencies from before the sweep
    resume: [f64; 2],
}

/// The waveform generator
pub struct Engine<H> {
    hw: H,
    cal: Calibration,
    shape: WaveShape,
    params: ShapeParams,
    waypoints: Waypoints,
    arb: Box<ArbTable>,
    table: Box<HalfCycleTable>,
    scratch: Box<HalfCycleTable>,
    reduced: ReducedTable,
    buffers: Box<TierBuffers>,
    duty: DutyTable,
    selector: TierSelector,
    /// Sampling path the hardware is currently set up for
    source: Option<TierSelector>,
    tc: u32,
    /// Half the DMA is streaming
    playing: Half,
    slow: SlowParams,
    phase: PhaseState,
    dither: Dither,
    noise: NoiseSynth,
    unsynced: UnsyncedSquare,
    sync: SyncSquare,
    mode: Mode,
    pin: SquarePin,
    wave_target: Target,
    square_target: Target,
    control: Control,
    exact: bool,
    gain: u32,
    actual_freq: f64,
    actual_duty: f64,
    sweep_cfg: SweepConfig,
    sweep: Option<ActiveSweep>,
    timer: TimerPeriod,
    timer_invert: bool,
    /// Last level read from the modulation input
    depth: u16,
    now_ms: u64,
}

impl<H: Hardware> Engine<H> {
    /// Power up with default settings
    pub fn new(hw: H, cal: Calibration) -> Self {
        Self::with_snapshot(hw, cal, &Snapshot::default())
    }
    /// Power up with saved settings
    pub fn with_snapshot(hw: H, cal: Calibration, snap: &Snapshot) -> Self {
        let unsynced = UnsyncedSquare::new(snap.square.freq, snap.square.duty, &cal);
        let mut eng = Self {
            hw,
            shape: WaveShape::Sine,
            params: snap.params,
            waypoints: snap.waypoints.clone(),
            arb: Box::default(),
            table: HalfCycleTable::boxed(),
            scratch: HalfCycleTable::boxed(),
            reduced: ReducedTable::default(),
            buffers: Box::default(),
            duty: DutyTable::default(),
            selector: TierSelector::Slow,
            source: None,
            tc: 0,
            playing: Half::First,
            slow: SlowParams::default(),
            phase: PhaseState::at(Half::First),
            dither: Dither::default(),
            noise: NoiseSynth::new(snap.params.noise.colour, snap.params.noise.amplitude),
            unsynced,
            sync: SyncSquare::default(),
            mode: Mode::Wave,
            pin: SquarePin::Unsynced,
            wave_target: snap.wave,
            square_target: snap.square,
            control: snap.control,
            exact: snap.exact,
            gain: snap.gain,
            actual_freq: 0.0,
            actual_duty: 0.0,
            sweep_cfg: snap.sweep,
            sweep: None,
            timer: snap.timer,
            timer_invert: snap.timer_invert,
            depth: 0,
            now_ms: 0,
            cal,
        };
        eng.restore(snap);
        eng
    }
    /// The hardware
    pub const fn hw(&self) -> &H {
        &self.hw
    }
    /// The hardware, mutably
    pub const fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }
    /// Board calibration in use
    pub const fn calibration(&self) -> &Calibration {
        &self.cal
    }
    /// Selected wave shape
    pub const fn shape(&self) -> WaveShape {
        self.shape
    }
    /// Parameters of every wave family
    pub const fn params(&self) -> &ShapeParams {
        &self.params
    }
    /// Points of the arbitrary wave
    pub const fn waypoints(&self) -> &Waypoints {
        &self.waypoints
    }
    /// The half cycle tables being played
    pub fn table(&self) -> &HalfCycleTable {
        &self.table
    }
    /// (testing-only) The reduced table the fast tiers are built from
    #[cfg(feature = "testing")]
    pub const fn reduced(&self) -> &ReducedTable {
        &self.reduced
    }
    /// (testing-only) Samples of `half` at `tier`
    #[cfg(feature = "testing")]
    pub fn tier_half(&self, tier: crate::clock::Tier, half: Half) -> &[u16] {
        self.buffers.half(tier, half, &self.duty)
    }
    /// Targets of the analogue wave
    pub const fn wave_target(&self) -> &Target {
        &self.wave_target
    }
    /// Targets of the unsynced square wave
    pub const fn square_target(&self) -> &Target {
        &self.square_target
    }
    /// Outputs that requests apply to
    pub const fn control(&self) -> Control {
        self.control
    }
    /// Direct frequency and duty requests at `control`
    pub const fn set_control(&mut self, control: Control) {
        self.control = control;
    }
    /// Whether the square wave follows the analogue wave
    pub fn synced(&self) -> bool {
        self.pin == SquarePin::Synced
    }
    /// Current status
    pub fn status(&self) -> Status {
        Status {
            wave_freq: self.actual_freq,
            wave_duty: self.actual_duty,
            square_freq: self.unsynced.actual_freq,
            square_duty: self.unsynced.actual_duty,
            selector: self.selector,
            mode: self.mode,
            pin: self.pin,
            exact: self.exact,
            sweeping: self.sweep.is_some(),
        }
    }

    /// Retarget the frequency of the outputs selected by [`Control`]
    pub fn set_frequency(&mut self, freq: Frequency) {
        if self.control.synced() && self.wave_target.set_frequency(freq, MAX_WAVE_FREQ) {
            self.retune();
        }
        if self.control.unsynced() && self.square_target.set_frequency(freq, MAX_SQUARE_FREQ) {
            self.apply_square();
        }
    }
    /// Retarget the duty cycle of the outputs selected by [`Control`]
    pub fn set_duty(&mut self, duty: DutyCycle) {
        if self.control.synced() {
            self.wave_target.set_duty(duty, self.actual_freq);
            self.retune();
        }
        if self.control.unsynced() {
            self.square_target.set_duty(duty, self.unsynced.actual_freq);
            self.apply_square();
        }
    }
    /// Switch to `shape`, handing the DAC to the noise generator and back as needed
    pub fn set_wave_shape(&mut self, shape: WaveShape) {
        log::info!("Wave shape {:?} -> {shape:?}", self.shape);
        self.shape = shape;
        if shape != WaveShape::Noise {
            if uses_arb(shape) {
                self.rebuild_arb();
            }
            self.rebuild_table();
        }
        match self.mode {
            Mode::Noise { resume_synced } if shape != WaveShape::Noise => {
                self.exit_noise(resume_synced);
            }
            Mode::Wave | Mode::Modulation if shape == WaveShape::Noise => self.enter_noise(),
            _ => {}
        }
    }
    /// Change one shape parameter. Returns `false` if `shape` has no such parameter.
    pub fn set_shape_parameter(&mut self, shape: WaveShape, param: ShapeParam, value: f32) -> bool {
        if !self.params.set(shape, param, value) {
            log::debug!("{shape:?} has no parameter {param:?}");
            return false;
        }
        if shape == WaveShape::Noise {
            let noise = self.params.noise;
            self.noise.configure(noise.colour, noise.amplitude);
        } else if shape == self.shape || self.shape == WaveShape::Composite {
            self.rebuild_table();
        }
        true
    }
    /// Make `upload` the arbitrary wave
    pub fn commit_waypoints(&mut self, upload: WaypointUpload) -> UploadResult {
        let points = upload.finish()?;
        log::info!("Arbitrary wave committed, {} points", points.len());
        self.waypoints = points;
        self.refresh_arb();
        Ok(())
    }
    /// Replace the arbitrary wave with a random one
    pub fn randomize_arbitrary(&mut self, style: RandomStyle) {
        let mut rng = Rng::new(self.hw.read_random());
        self.waypoints = Waypoints::random(style, &mut rng);
        log::info!("Random {style:?} arbitrary wave");
        self.refresh_arb();
    }
    /// Toggle exact frequency mode, returning whether it is now on
    pub fn toggle_exact_freq_mode(&mut self) -> bool {
        self.exact = !self.exact;
        self.sync.delay = 0;
        log::info!("Exact frequency mode {}", on_off(self.exact));
        self.retune();
        self.exact
    }
    /// Toggle whether the square wave follows the analogue wave, returning whether it now does.
    ///
    /// Nothing changes while the timer owns the pin, and syncing is refused while noise is
    /// playing.
    pub fn toggle_square_wave_sync(&mut self) -> bool {
        match (self.pin, self.mode) {
            (SquarePin::Timer { .. }, _) => log::debug!("Square wave sync locked by the timer"),
            (SquarePin::Unsynced, Mode::Noise { .. }) => {
                log::debug!("Square wave can't sync to noise");
            }
            (pin, _) => self.set_sync(pin == SquarePin::Unsynced),
        }
        self.synced()
    }
    /// Switch amplitude modulation from the analogue input on or off, returning whether it is
    /// now on.
    ///
    /// Modulation plays through the phase accumulator at every frequency. It is refused while
    /// noise is playing.
    pub fn set_modulation(&mut self, on: bool) -> bool {
        match self.mode {
            Mode::Noise { .. } if on => log::debug!("Noise can't be modulated"),
            Mode::Wave if on => {
                self.depth = self.hw.read_analog();
                self.mode = Mode::Modulation;
                log::info!("Modulation on");
                self.retune();
            }
            Mode::Modulation if !on => {
                self.mode = Mode::Wave;
                log::info!("Modulation off");
                self.retune();
            }
            _ => {}
        }
        self.mode == Mode::Modulation
    }
    /// Set the 16.16 fixed point gain of the phase accumulator path
    pub const fn set_gain(&mut self, gain: u32) {
        self.gain = gain;
        self.slow.gain = gain;
    }
    /// Restart the cycle of whichever square wave is on the pin.
    ///
    /// At very low frequencies this lines the output up with an external event.
    pub fn reset_phase(&mut self) {
        match self.pin {
            SquarePin::Synced if self.source == Some(TierSelector::Slow) => {
                self.phase = PhaseState::at(self.slow.first_half());
                let level = self.phase.active == Half::First;
                self.sync.emit(&mut self.hw, PinAction::Level(level));
            }
            SquarePin::Unsynced => self.apply_square(),
            _ => {}
        }
    }

    /// Hand the square wave pin to the output timer
    pub fn enter_timer_mode(&mut self, invert: bool) -> TimerResult {
        if self.sweep.is_some() {
            return Err(TimerError::SweepActive);
        }
        let resume_synced = match self.pin {
            SquarePin::Timer { .. } => return Ok(()),
            SquarePin::Synced => true,
            SquarePin::Unsynced => self.mode == Mode::Noise { resume_synced: true },
        };
        self.stop_unsynced();
        self.sync.enabled = false;
        self.pin = SquarePin::Timer {
            resume_synced,
            invert,
        };
        self.timer_invert = invert;
        self.hw.set_square(invert);
        self.control = Control::Synced;
        self.retune();
        log::info!("Timer mode on");
        Ok(())
    }
    /// Drive the timer output: active once the period has elapsed
    pub fn set_timer_output(&mut self, time_up: bool) {
        if let SquarePin::Timer { invert, .. } = self.pin {
            self.hw.set_square(time_up != invert);
        }
    }
    /// Give the square wave pin back to the generator that had it before timer mode
    pub fn exit_timer_mode(&mut self) {
        let SquarePin::Timer { resume_synced, .. } = self.pin else {
            return;
        };
        self.pin = SquarePin::Unsynced;
        log::info!("Timer mode off");
        if resume_synced && !matches!(self.mode, Mode::Noise { .. }) {
            self.set_sync(true);
        } else {
            self.apply_square();
        }
    }
    /// Set the output timer period. Invalid periods are kept but reported.
    pub fn set_timer_period(&mut self, period: TimerPeriod) -> TimerResult {
        self.timer = period;
        period.validate()
    }
    /// Output timer period
    pub const fn timer_period(&self) -> &TimerPeriod {
        &self.timer
    }

    /// Set the sweep limits and timing. Inconsistent settings are kept but reported.
    pub fn set_sweep_config(&mut self, cfg: SweepConfig) -> SweepResult {
        self.sweep_cfg = cfg;
        cfg.validate()
    }
    /// Sweep limits and timing
    pub const fn sweep_config(&self) -> &SweepConfig {
        &self.sweep_cfg
    }
    /// Start sweeping from the lowest frequency at `now_ms`
    pub fn start_sweep(&mut self, now_ms: u64) -> SweepResult {
        if matches!(self.pin, SquarePin::Timer { .. }) {
            return Err(SweepError::TimerActive);
        }
        let sweep = Sweep::start(self.sweep_cfg, now_ms)?;
        let resume = match self.sweep {
            Some(active) => active.resume,
            None => [self.wave_target.freq, self.square_target.freq],
        };
        self.now_ms = now_ms;
        self.sweep = Some(ActiveSweep { sweep, resume });
        self.apply_sweep_freq(sweep.freq());
        log::info!(
            "Sweep {} Hz to {} Hz",
            self.sweep_cfg.min_freq,
            self.sweep_cfg.max_freq
        );
        Ok(())
    }
    /// Stop the sweep and go back to the frequencies from before it
    pub fn stop_sweep(&mut self) {
        let Some(ActiveSweep { resume, .. }) = self.sweep.take() else {
            return;
        };
        log::info!("Sweep stopped");
        if self.control.synced() {
            self.wave_target.freq = resume[0];
            self.retune();
        }
        if self.control.unsynced() {
            self.square_target.freq = resume[1];
            self.apply_square();
        }
    }
    /// Foreground housekeeping: modulation input, sweep steps and low frequency dithering
    /// due at `now_ms`
    pub fn poll(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        if self.mode == Mode::Modulation {
            self.depth = self.hw.read_analog();
        }
        let swept = self.sweep.as_mut().and_then(|s| s.sweep.poll(now_ms));
        if let Some(freq) = swept {
            self.apply_sweep_freq(freq);
        }
        if self.selector != TierSelector::Slow {
            return;
        }
        let fine_step = self.slow.fine_step;
        if let Some(steps) = self.dither.poll(now_ms, self.wave_target.freq, fine_step, &self.cal) {
            self.slow.step = steps;
        }
    }

    /// Every user setting
    pub fn snapshot(&self) -> Snapshot {
        let mut wave = self.wave_target;
        let mut square = self.square_target;
        if let Some(active) = &self.sweep {
            wave.freq = active.resume[0];
            square.freq = active.resume[1];
        }
        Snapshot {
            shape: self.shape,
            params: self.params,
            wave,
            square,
            control: self.control,
            exact: self.exact,
            synced: match (self.pin, self.mode) {
                (SquarePin::Synced, _) => true,
                (SquarePin::Timer { resume_synced, .. }, _)
                | (SquarePin::Unsynced, Mode::Noise { resume_synced }) => resume_synced,
                (SquarePin::Unsynced, Mode::Wave | Mode::Modulation) => false,
            },
            modulation: self.mode == Mode::Modulation,
            gain: self.gain,
            sweep: self.sweep_cfg,
            timer: self.timer,
            timer_invert: self.timer_invert,
            waypoints: self.waypoints.clone(),
        }
    }
    /// Apply saved settings. A running sweep is abandoned.
    pub fn restore(&mut self, snap: &Snapshot) {
        self.sweep = None;
        self.params = snap.params;
        self.waypoints = snap.waypoints.clone();
        self.wave_target = snap.wave;
        self.square_target = snap.square;
        self.control = snap.control;
        self.exact = snap.exact;
        self.sweep_cfg = snap.sweep;
        self.timer = snap.timer;
        self.timer_invert = snap.timer_invert;
        self.set_gain(snap.gain);
        let noise = self.params.noise;
        self.noise.configure(noise.colour, noise.amplitude);
        self.rebuild_arb();
        if snap.shape != WaveShape::Noise {
            self.set_wave_shape(snap.shape);
        }
        if let Mode::Noise { resume_synced } = &mut self.mode {
            *resume_synced = snap.synced;
        } else {
            self.set_sync(snap.synced);
        }
        if snap.shape == WaveShape::Noise {
            if !matches!(self.mode, Mode::Noise { .. }) {
                self.set_wave_shape(WaveShape::Noise);
            }
        } else {
            self.set_modulation(snap.modulation);
        }
        self.retune();
        self.apply_square();
    }

    fn apply_sweep_freq(&mut self, freq: f64) {
        if self.control.synced() {
            self.wave_target.freq = freq.min(SWEEP_WAVE_LIMIT);
            self.retune();
        }
        if self.control.unsynced() {
            self.square_target.freq = freq;
            self.apply_square();
        }
    }
    fn refresh_arb(&mut self) {
        self.rebuild_arb();
        if uses_arb(self.shape) {
            self.rebuild_table();
        }
    }
    fn rebuild_arb(&mut self) {
        *self.arb = ArbTable::build(&self.waypoints, self.wave_target.freq);
    }
    /// Build the tables aside, then swap them in
    fn rebuild_table(&mut self) {
        if !self.scratch.build(self.shape, &self.params, &self.arb) {
            return;
        }
        mem::swap(&mut self.table, &mut self.scratch);
        self.reduced.reduce(&self.table);
        if let TierSelector::Fast(tier) = self.selector {
            let next = self.next_half();
            self.buffers.rebuild(&self.reduced, &self.duty, tier, next);
        }
    }
    /// Half the DMA reads after the one it is on
    fn next_half(&self) -> Half {
        if self.source.is_some() {
            self.playing.other()
        } else {
            Half::First
        }
    }
    /// Work out the sampling path and its parameters for the wave targets, and move the
    /// hardware over to it
    fn retune(&mut self) {
        let freq = self.wave_target.freq;
        let duty = self.wave_target.duty;
        self.selector = if self.mode == Mode::Modulation {
            TierSelector::Slow
        } else {
            TierSelector::for_frequency(freq, self.exact, &self.cal)
        };
        if self.source.is_some_and(|s| s != self.selector) {
            log::debug!("Sampling path {:?} -> {:?}", self.source, self.selector);
            self.stop_wave_source();
        }
        self.sync.delay = 0;
        match self.selector {
            TierSelector::Slow => {
                self.slow = SlowParams::new(freq, duty, self.exact, &self.cal);
                self.slow.gain = self.gain;
                self.tc = freq_to_tc(freq, SLOW_SAMPLES_PER_CYCLE);
                if freq >= self.cal.dither_below_hz {
                    self.dither.disarm();
                } else if !self.dither.armed() {
                    self.dither.arm(self.now_ms);
                }
                self.actual_freq = if self.exact {
                    freq
                } else {
                    SLOW_MEASURE_HZ
                        / (SLOW_MEASURE_HZ / (freq * self.cal.slow_measure_factor)).ceil()
                };
                self.actual_duty = extreme_duty(duty, self.actual_freq).unwrap_or(self.slow.duty);
            }
            TierSelector::Fast(tier) => {
                self.dither.disarm();
                let s = tier.samples_per_cycle();
                self.tc = freq_to_tc(freq, s);
                self.duty = DutyTable::new(duty, self.sync.min_half());
                let next = self.next_half();
                self.buffers.rebuild(&self.reduced, &self.duty, tier, next);
                self.actual_freq = tc_to_freq(self.tc, s);
                self.actual_duty = extreme_duty(duty, self.actual_freq)
                    .unwrap_or_else(|| self.duty.actual_duty(tier));
                let held = self.duty.held(tier).is_some();
                self.sync.delay =
                    sync_delay(self.tc, self.actual_duty, held, &self.cal.sync_delay);
            }
        }
        match self.source {
            None if !matches!(self.mode, Mode::Noise { .. }) => self.start_wave_source(),
            Some(TierSelector::Fast(_)) => self.hw.program_timer(SampleTimer::Dma, self.tc),
            _ => {}
        }
    }
    fn start_wave_source(&mut self) {
        let start = match self.selector {
            TierSelector::Fast(tier) => {
                let held = self.duty.held(tier);
                self.playing = held.unwrap_or(Half::First);
                let queued = held.unwrap_or(Half::Second);
                self.hw.program_timer(SampleTimer::Dma, self.tc);
                self.hw.arm_dma(
                    self.buffers.half(tier, self.playing, &self.duty),
                    self.buffers.half(tier, queued, &self.duty),
                );
                self.hw.enable_irq(IrqSources::DMA);
                self.playing
            }
            TierSelector::Slow => {
                self.phase = PhaseState::at(self.slow.first_half());
                self.hw.program_timer(SampleTimer::Slow, tick_divisor(SLOW_TICK_HZ));
                self.hw.enable_irq(IrqSources::SLOW_TICK);
                self.phase.active
            }
        };
        self.sync.emit(&mut self.hw, PinAction::Level(start == Half::First));
        self.source = Some(self.selector);
    }
    fn stop_wave_source(&mut self) {
        match self.source.take() {
            Some(TierSelector::Fast(_)) => {
                self.hw.disable_irq(IrqSources::DMA);
                self.hw.stop_dma();
            }
            Some(TierSelector::Slow) => self.hw.disable_irq(IrqSources::SLOW_TICK),
            None => {}
        }
    }
    fn enter_noise(&mut self) {
        let resume_synced = match self.pin {
            SquarePin::Synced => true,
            SquarePin::Timer { resume_synced, .. } => resume_synced,
            SquarePin::Unsynced => false,
        };
        if self.pin == SquarePin::Synced {
            self.set_sync(false);
        }
        self.stop_wave_source();
        let noise = self.params.noise;
        self.noise.configure(noise.colour, noise.amplitude);
        self.hw.program_timer(SampleTimer::Noise, tick_divisor(NOISE_TICK_HZ));
        self.hw.enable_irq(IrqSources::NOISE_TICK);
        self.mode = Mode::Noise { resume_synced };
    }
    fn exit_noise(&mut self, resume_synced: bool) {
        self.hw.disable_irq(IrqSources::NOISE_TICK);
        self.mode = Mode::Wave;
        self.retune();
        if resume_synced {
            self.set_sync(true);
        }
    }
    fn set_sync(&mut self, on: bool) {
        if let SquarePin::Timer { resume_synced, .. } = &mut self.pin {
            *resume_synced = on;
            return;
        }
        if on == self.synced() {
            return;
        }
        if on {
            self.stop_unsynced();
            self.pin = SquarePin::Synced;
            self.sync.enabled = true;
            self.retune();
            self.realign_square();
        } else {
            self.pin = SquarePin::Unsynced;
            self.sync.enabled = false;
            self.apply_square();
            self.retune();
        }
        log::info!("Square wave sync {}", on_off(on));
    }
    /// Put the synced square wave in step with the half being played
    fn realign_square(&mut self) {
        match self.source {
            Some(TierSelector::Fast(_)) => {
                self.stop_wave_source();
                self.start_wave_source();
            }
            Some(TierSelector::Slow) => {
                let half = self.slow.held.unwrap_or(self.phase.active);
                self.sync
                    .emit(&mut self.hw, PinAction::Level(half == Half::First));
            }
            None => {}
        }
    }
    /// Work out the unsynced square wave programming, and apply it if it owns the pin
    fn apply_square(&mut self) {
        self.unsynced = UnsyncedSquare::new(
            self.square_target.freq,
            self.square_target.duty,
            &self.cal,
        );
        if self.pin == SquarePin::Unsynced {
            self.stop_unsynced();
            self.start_unsynced();
        }
    }
    fn start_unsynced(&mut self) {
        match self.unsynced.drive {
            SquareDrive::Pwm(setting) => self.hw.configure_pwm(setting),
            SquareDrive::Interrupt(_) => {
                self.hw.set_square(self.square_target.duty > 0.0);
                self.hw
                    .program_timer(SampleTimer::Unsynced, tick_divisor(UNSYNCED_TICK_HZ));
                self.hw.enable_irq(IrqSources::UNSYNCED_TICK);
            }
        }
    }
    fn stop_unsynced(&mut self) {
        self.hw.disable_irq(IrqSources::UNSYNCED_TICK);
        self.hw.disable_pwm();
    }
}

const fn uses_arb(shape: WaveShape) -> bool {
    matches!(shape, WaveShape::Arbitrary | WaveShape::Composite)
}

const fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

/// Duty cycle reported at 0 and 100 percent, where a single short pulse is produced
fn extreme_duty(duty: f64, freq: f64) -> Option<f64> {
    let pulse = 100.0 * EXTREME_PULSE_SECS * freq;
    if duty <= 0.0 {
        Some(pulse)
    } else if duty >= 100.0 {
        Some(100.0 - pulse)
    } else {
        None
    }
}

#[test]
fn test_extreme_duty() {
    let zero = extreme_duty(0.0, 50_000.0).unwrap();
    assert!((zero - 0.24).abs() < 1e-9);
    let full = extreme_duty(100.0, 50_000.0).unwrap();
    assert!((full - 99.76).abs() < 1e-9);
    assert_eq!(extreme_duty(30.0, 50_000.0), None);
}
