//! Interrupt handlers.
//!
//! Each handler reads tables the foreground built and advances playback state by one step.
//! None of them allocate, block or log. A handler firing for a source that was just torn
//! down does nothing.
use {
    super::{Engine, Mode, SquarePin},
    crate::{
        clock::TierSelector,
        hal::{Hardware, IrqSources, SampleTimer, sim::SimHardware},
        sync_square::SyncSquare,
        unsynced_square::SquareDrive,
        wave_table::modulate,
    },
};

impl<H: Hardware> Engine<H> {
    /// DMA finished a half; the queued half is now streaming.
    ///
    /// Queues the half after it and toggles the synced square wave. With a held half the
    /// same half is queued again and the square wave pulses once per cycle instead.
    pub fn on_dma_complete(&mut self) {
        let Some(TierSelector::Fast(tier)) = self.source else {
            return;
        };
        let held = self.duty.held(tier);
        self.playing = held.unwrap_or(self.playing.other());
        let next = held.unwrap_or(self.playing.other());
        self.hw.queue_dma(self.buffers.half(tier, next, &self.duty));
        self.sync
            .emit_delayed(&mut self.hw, SyncSquare::edge(self.playing, held));
    }
    /// Phase accumulator tick
    pub fn on_slow_tick(&mut self) {
        if self.source != Some(TierSelector::Slow) {
            return;
        }
        let (sample, phase) = self.phase.tick(&self.slow, &self.table);
        self.phase = phase;
        let level = if self.mode == Mode::Modulation {
            modulate(sample.level, self.depth)
        } else {
            sample.level
        };
        self.hw.write_dac(level);
        if let Some(edge) = sample.edge {
            self.sync.emit(&mut self.hw, edge);
        }
    }
    /// Noise generator tick
    pub fn on_noise_tick(&mut self) {
        if !matches!(self.mode, Mode::Noise { .. }) {
            return;
        }
        let random = self.hw.read_random();
        let level = self.noise.tick(random);
        self.hw.write_dac(level);
    }
    /// Unsynced square wave tick, below the PWM range
    pub fn on_unsynced_tick(&mut self) {
        if self.pin != SquarePin::Unsynced {
            return;
        }
        let SquareDrive::Interrupt(irq) = &mut self.unsynced.drive else {
            return;
        };
        if let Some(action) = irq.tick() {
            self.hw.drive_square(action);
        }
    }
}

impl Engine<SimHardware> {
    /// Run the simulated board for `clocks` counts of the 42 MHz timer clock, dispatching
    /// every interrupt that comes due
    pub fn run_sim(&mut self, clocks: u64) {
        let end = self.hw.clock + clocks;
        while let Some((timer, due)) = self.hw.next_due() {
            if due > end {
                break;
            }
            self.hw.fire(timer, due);
            match timer {
                SampleTimer::Dma => {
                    let done = matches!(self.hw.step_dma(), Some((_, true)));
                    if done && self.hw.irqs.contains(IrqSources::DMA) {
                        self.on_dma_complete();
                    }
                }
                SampleTimer::Slow => self.on_slow_tick(),
                SampleTimer::Noise => self.on_noise_tick(),
                SampleTimer::Unsynced => self.on_unsynced_tick(),
            }
        }
        self.hw.clock = end;
    }
    /// Run the simulated board for `ms` milliseconds
    pub fn run_sim_ms(&mut self, ms: u64) {
        self.run_sim(ms * 42_000);
    }
}
