//! Backend trait abstraction for FM synthesis devices
//!
//! The IMF player treats the FM chip as a black box: it writes registers and
//! pulls samples. Anything implementing [`FmBackend`] can be driven by it,
//! from the built-in YM3812 emulation to a deterministic stub in tests.

/// Common interface for register-level FM synthesizers
///
/// # Example
///
/// ```
/// use wolfsounds::FmBackend;
///
/// fn play_note<B: FmBackend>(chip: &mut B) -> i16 {
///     chip.write_register(0x20, 0x01); // Modulator multiplier
///     chip.write_register(0x43, 0x00); // Carrier full volume
///     chip.write_register(0x63, 0xF0); // Carrier fast attack
///     chip.write_register(0xA0, 0x98); // F-number low
///     chip.write_register(0xB0, 0x31); // Key on, block 4
///     chip.get_sample()
/// }
/// ```
pub trait FmBackend {
    /// Reset the device and set its output sample rate
    ///
    /// Clears all registers and silences every channel.
    fn init(&mut self, sample_rate: u32);

    /// Write a value to a chip register
    ///
    /// Unmapped register addresses are ignored.
    fn write_register(&mut self, addr: u8, value: u8);

    /// Advance the device by one output sample and return it
    fn get_sample(&mut self) -> i16;

    /// Fill a caller-provided buffer with consecutive samples
    ///
    /// This avoids per-call allocations; prefer this in hot paths.
    fn generate_samples_into(&mut self, buffer: &mut [i16]) {
        for sample in buffer.iter_mut() {
            *sample = self.get_sample();
        }
    }
}
