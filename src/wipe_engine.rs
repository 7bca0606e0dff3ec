// Wipe Engine - Multi-pass block overwrite of a single device
//
// Opens the device once for writing, runs every pass of the scheme in order
// from offset 0 to the reported capacity, closes the handle on every exit
// path and optionally spot-checks the result through a fresh read-only
// handle.

use crate::algorithms::{PassBuffer, PatternGenerator, WipeScheme};
use crate::config::{ConfigError, EngineConfig};
use crate::error::{WipeError, WipeResult};
use crate::io::{BlockDevice, DeviceOpener, OpenMode};
use crate::verification::SampledVerifier;
use crate::{DeviceDescriptor, VerificationStatus, WipeReport, WipeSession};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives progress from the write loop.
///
/// Called synchronously with the zero-based pass index, the number of passes
/// and the overall completion in percent.
pub trait ProgressObserver {
    fn on_progress(&mut self, pass_index: u32, pass_count: u32, percent: f64);
}

impl<F> ProgressObserver for F
where
    F: FnMut(u32, u32, f64),
{
    fn on_progress(&mut self, pass_index: u32, pass_count: u32, percent: f64) {
        self(pass_index, pass_count, percent)
    }
}

/// Observer that ignores every update
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _pass_index: u32, _pass_count: u32, _percent: f64) {}
}

/// Cooperative cancellation, checked once per block.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Raise this flag when the process receives SIGINT
    pub fn register_sigint(&self) -> std::io::Result<signal_hook::SigId> {
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&self.0))
    }
}

pub struct WipeEngine<O: DeviceOpener> {
    opener: O,
    config: EngineConfig,
    cancel: CancelFlag,
    seed: Option<u64>,
}

impl<O: DeviceOpener> WipeEngine<O> {
    pub fn new(opener: O, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            opener,
            config,
            cancel: CancelFlag::new(),
            seed: None,
        })
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Seed random passes deterministically instead of from the clock
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Overwrite `device` with every pass of `scheme`.
    ///
    /// A mounted device is refused before anything is opened. The write
    /// handle is closed exactly once whether the passes succeed or not; when
    /// both the overwrite and the close fail, the overwrite error is returned
    /// and the close error is logged. A failed verification does not fail the
    /// run, it is reported as `VerificationStatus::Mismatch`.
    pub fn wipe<P>(
        &self,
        device: &DeviceDescriptor,
        scheme: WipeScheme,
        verify: bool,
        progress: &mut P,
    ) -> WipeResult<WipeReport>
    where
        P: ProgressObserver + ?Sized,
    {
        if device.mounted {
            tracing::warn!(device = %device.path.display(), "Refusing to wipe mounted device");
            return Err(WipeError::MountedDevice {
                path: device.path.clone(),
            });
        }

        tracing::info!(
            device = %device.path.display(),
            scheme = %scheme,
            passes = scheme.pass_count(),
            block_size = self.config.block_size,
            verify,
            "Starting wipe"
        );

        let mut handle = self.opener.open(&device.path, OpenMode::ReadWrite)?;
        let outcome = self.overwrite(&mut handle, device, scheme, progress);
        let closed = handle.close();

        let (session, final_pass) = match outcome {
            Ok(done) => {
                closed?;
                done
            }
            Err(e) => {
                if let Err(close_err) = closed {
                    tracing::warn!(
                        device = %device.path.display(),
                        error = %close_err,
                        "Close failed after wipe error"
                    );
                }
                tracing::error!(
                    device = %device.path.display(),
                    kind = e.kind(),
                    error = %e,
                    "Wipe failed"
                );
                return Err(e);
            }
        };

        let verification = if verify {
            self.verify_device(&device.path, &final_pass)
        } else {
            VerificationStatus::Skipped
        };

        let report = session.into_report(verification);
        tracing::info!(
            device = %device.path.display(),
            scheme = %scheme,
            bytes_written = report.bytes_written,
            verification = ?report.verification,
            "Wipe completed"
        );
        Ok(report)
    }

    /// Run every pass on an open handle. Returns the finished session and
    /// the buffer of the last pass for verification.
    fn overwrite<P>(
        &self,
        handle: &mut O::Device,
        device: &DeviceDescriptor,
        scheme: WipeScheme,
        progress: &mut P,
    ) -> WipeResult<(WipeSession, PassBuffer)>
    where
        P: ProgressObserver + ?Sized,
    {
        let size = handle.size()?;
        if size == 0 {
            return Err(WipeError::EmptyDevice {
                path: device.path.clone(),
            });
        }
        if size != device.size_bytes {
            tracing::debug!(
                device = %device.path.display(),
                catalog_size = device.size_bytes,
                device_size = size,
                "Capacity differs from catalog entry, using device capacity"
            );
        }

        let block_size = self.config.block_size;
        let mut generator = match self.seed {
            Some(seed) => PatternGenerator::with_seed(block_size, seed),
            None => PatternGenerator::new(block_size),
        };
        let mut passes = generator.generate(scheme);

        let mut session = WipeSession::new(device.clone(), scheme, passes.len() as u32, size);
        let total_blocks = session.total_blocks(block_size);
        let total_passes = session.total_passes();
        let interval = self.config.progress_interval_blocks;

        for (index, pass) in passes.iter().enumerate() {
            let pass_index = index as u32;
            tracing::info!(
                device = %device.path.display(),
                pass = pass_index + 1,
                total = total_passes,
                pattern = %pass.pattern(),
                "Starting pass"
            );

            handle.seek_to_start()?;
            let mut blocks_in_pass: u64 = 0;

            while !session.is_pass_complete() {
                if self.cancel.is_cancelled() {
                    let bytes_written =
                        u64::from(pass_index) * size + session.bytes_written_in_pass();
                    tracing::warn!(
                        device = %device.path.display(),
                        pass = pass_index + 1,
                        bytes_written,
                        "Wipe cancelled"
                    );
                    return Err(WipeError::Cancelled {
                        path: device.path.clone(),
                        pass: pass_index,
                        bytes_written,
                    });
                }

                let offset = session.bytes_written_in_pass();
                let chunk = (block_size as u64).min(session.remaining_in_pass()) as usize;
                let written = handle.write_block(&pass.as_slice()[..chunk])?;

                if written < chunk {
                    return Err(WipeError::ShortWrite {
                        path: device.path.clone(),
                        offset,
                        requested: chunk,
                        written,
                    });
                }

                session.record_write(written as u64);
                blocks_in_pass += 1;

                if blocks_in_pass % interval == 0 || session.is_pass_complete() {
                    progress.on_progress(
                        pass_index,
                        total_passes,
                        session.percent_complete(blocks_in_pass, total_blocks),
                    );
                }
            }

            handle.sync()?;
            session.finish_pass();
            tracing::debug!(
                device = %device.path.display(),
                pass = pass_index + 1,
                blocks = blocks_in_pass,
                "Pass complete"
            );
        }

        // Non-empty: every scheme has at least one pass
        let final_pass = passes.pop().ok_or_else(|| WipeError::EmptyDevice {
            path: device.path.clone(),
        })?;
        Ok((session, final_pass))
    }

    fn verify_device(&self, path: &Path, expected: &PassBuffer) -> VerificationStatus {
        let mut handle = match self.opener.open(path, OpenMode::ReadOnly) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(device = %path.display(), error = %e, "Cannot reopen device for verification");
                return VerificationStatus::Mismatch;
            }
        };

        let verifier = SampledVerifier::new(self.config.block_size, self.config.verify_sample_blocks);
        let matched = verifier.verify(&mut handle, expected.as_slice());

        if let Err(e) = handle.close() {
            tracing::warn!(device = %path.display(), error = %e, "Close failed after verification");
        }

        if matched {
            tracing::info!(device = %path.display(), "Verification passed");
            VerificationStatus::Confirmed
        } else {
            tracing::warn!(
                device = %path.display(),
                "Verification failed: sampled data does not match the final pass"
            );
            VerificationStatus::Mismatch
        }
    }
}
