//! Watch loop: poll every source, feed the gate, run a publish cycle when
//! something has settled.
//!
//! Ticks are synchronous and run on a current-thread runtime; the only
//! awaits are the inter-poll sleep and Ctrl-C. A source that cannot be
//! stat'ed is skipped for that poll with a warning. A tick that errors or
//! panics is logged and the loop goes on after the error interval.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use progwatch_core::{ClassCode, WatcherConfig};

use crate::activity_log::ActivityLog;
use crate::error::{io_err, WatchError};
use crate::gate::{Observation, StabilizationGate};
use crate::launcher::{ProcessLauncher, SystemLauncher};
use crate::pipeline::{CycleSummary, Pipeline};
use crate::signature::{self, Signature};

/// What one poll saw and did.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub observations: Vec<Observation>,
    /// Files whose source could not be stat'ed this poll.
    pub unreadable: Vec<ClassCode>,
    pub ready: Vec<ClassCode>,
    /// Present when at least one file was ready.
    pub cycle: Option<CycleSummary>,
}

pub struct Watcher {
    pipeline: Pipeline,
    gate: StabilizationGate,
}

impl Watcher {
    /// Build the watcher and seed the gate with each file's current
    /// signature. A source that cannot be stat'ed is seeded as absent.
    pub fn new(config: WatcherConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        let mut gate = StabilizationGate::new(config.poll.stabilize_window);
        let pipeline = Pipeline::new(config, launcher);
        let log = pipeline.log();

        log.rotate_if_needed();
        log.info("=== watch started (mtime+size) ===");
        for file in &pipeline.config().files {
            let initial = match signature::read(&file.source) {
                Ok(sig) => sig,
                Err(err) => {
                    log.warn(&format!(
                        "cannot stat {}: {err}; treating as absent",
                        file.source.display()
                    ));
                    Signature::Absent
                }
            };
            log.init(&format!("{} -> {}", file.class, file.source.display()));
            log.init(&format!("{} initial signature: {initial}", file.class));
            gate.seed(file.class.clone(), initial);
        }

        Self { pipeline, gate }
    }

    pub fn log(&self) -> &ActivityLog {
        self.pipeline.log()
    }

    pub fn gate(&self) -> &StabilizationGate {
        &self.gate
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// One poll over every watched file, in configuration order.
    pub fn tick(&mut self) -> Result<TickReport, WatchError> {
        let log = self.pipeline.log();
        log.rotate_if_needed();

        let files = &self.pipeline.config().files;
        let mut observations = Vec::with_capacity(files.len());
        let mut unreadable = Vec::new();
        for file in files {
            // An unreadable source skips this poll only; its counter and
            // every other file's observation are left intact.
            let current = match signature::read(&file.source) {
                Ok(sig) => sig,
                Err(err) => {
                    log.warn(&format!(
                        "cannot stat {} for {}: {err}; skipped this poll",
                        file.source.display(),
                        file.class
                    ));
                    unreadable.push(file.class.clone());
                    continue;
                }
            };
            let observation = self.gate.observe(&file.class, current);
            if let Some(previous) = &observation.previous {
                log.info(&format!(
                    "change detected for {}: {previous} -> {}",
                    observation.class, observation.current
                ));
            }
            observations.push(observation);
        }

        let ready: Vec<ClassCode> = observations
            .iter()
            .filter(|o| o.ready)
            .map(|o| o.class.clone())
            .collect();
        let cycle = if ready.is_empty() {
            None
        } else {
            let names: Vec<String> = ready.iter().map(ToString::to_string).collect();
            log.info(&format!(
                "stable files: [{}] -> starting export",
                names.join(", ")
            ));
            Some(self.pipeline.run(&ready, false))
        };

        Ok(TickReport {
            observations,
            unreadable,
            ready,
            cycle,
        })
    }

    /// [`Watcher::tick`] with panics turned into [`WatchError::Panic`].
    pub fn poll_once(&mut self) -> Result<TickReport, WatchError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.tick())) {
            Ok(result) => result,
            Err(payload) => Err(WatchError::Panic(panic_message(payload))),
        }
    }

    /// Poll once and return how long to sleep before the next poll.
    pub fn step(&mut self) -> Duration {
        match self.poll_once() {
            Ok(_) => self.pipeline.config().interval(),
            Err(err) => {
                self.log().error_chain("main loop", &err);
                self.pipeline.config().error_interval()
            }
        }
    }

    /// Poll until `max_cycles` polls have run, or forever when `None`.
    /// Returns the number of polls performed.
    pub async fn run(&mut self, max_cycles: Option<u64>) -> u64 {
        let mut cycles = 0u64;
        loop {
            let delay = self.step();
            cycles += 1;
            if max_cycles.is_some_and(|max| cycles >= max) {
                return cycles;
            }
            tokio::time::sleep(delay).await;
        }
    }
}

/// Blocking entrypoint used by `progwatch run`.
pub fn start_blocking(config: WatcherConfig, max_cycles: Option<u64>) -> Result<(), WatchError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;

    let launcher: Arc<dyn ProcessLauncher> = Arc::new(SystemLauncher::new(config.suppress_window));
    let mut watcher = Watcher::new(config, launcher);
    let log = watcher.log().clone();

    runtime.block_on(async {
        tokio::select! {
            cycles = watcher.run(max_cycles) => {
                tracing::info!(cycles, "bounded watch finished");
                log.info("=== watch stopped ===");
                Ok(())
            }
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    log.info("=== watch stopped (interrupted) ===");
                    Ok(())
                }
                Err(err) => Err(WatchError::Runtime(format!("ctrl-c handler failed: {err}"))),
            },
        }
    })
}

pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
