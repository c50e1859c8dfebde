use super::Interpreter;
use crate::error::ExecutionError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

/// Stop and pause requests, polled by the interpreter once per executed block.
#[derive(Debug, Default)]
pub(crate) struct InterruptFlags {
    stop: AtomicBool,
    pause: AtomicBool,
}

impl InterruptFlags {
    pub(crate) fn take_stop(&self) -> bool {
        self.stop.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn take_pause(&self) -> bool {
        self.pause.swap(false, Ordering::AcqRel)
    }

    /// Whether a stop is pending, without consuming it. Used inside function calls,
    /// which unwind with an error and leave the flag for the outer loop.
    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub(crate) fn clear(&self) {
        self.stop.store(false, Ordering::Release);
        self.pause.store(false, Ordering::Release);
    }
}

/// Lets another thread stop or pause a continuous run.
///
/// Requests take effect before the next block executes.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    flags: Arc<InterruptFlags>,
}

impl InterruptHandle {
    pub(crate) fn new(flags: Arc<InterruptFlags>) -> Self {
        Self { flags }
    }

    /// Cancels the run. The interpreter reports completion and returns to idle.
    pub fn stop(&self) {
        self.flags.stop.store(true, Ordering::Release);
    }

    /// Switches a continuous run to stepping mode.
    pub fn pause(&self) {
        self.flags.pause.store(true, Ordering::Release);
    }
}

/// An interpreter shared between threads, for hosts that drive stepping from a
/// timer or UI event loop.
///
/// A step requested while another step is still executing is dropped rather than
/// queued.
#[derive(Clone)]
pub struct SharedInterpreter {
    inner: Arc<Mutex<Interpreter>>,
    interrupt: InterruptHandle,
}

impl SharedInterpreter {
    pub fn new(interpreter: Interpreter) -> Self {
        let interrupt = interpreter.interrupt_handle();
        Self {
            inner: Arc::new(Mutex::new(interpreter)),
            interrupt,
        }
    }

    /// Executes one block unless a step is already in progress. Returns whether
    /// the step ran.
    pub fn try_step(&self) -> Result<bool, ExecutionError> {
        let mut interpreter = match self.inner.try_lock() {
            Ok(interpreter) => interpreter,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                tracing::debug!("step already in progress, dropping request");
                return Ok(false);
            }
        };
        interpreter.step()?;
        Ok(true)
    }

    /// Runs to completion (or to the next Input) on the calling thread.
    pub fn run(&self) -> Result<(), ExecutionError> {
        self.lock().run()
    }

    pub fn provide_input(&self, text: &str) -> Result<(), ExecutionError> {
        self.lock().provide_input(text)
    }

    /// Requests cancellation. If nothing is executing right now the interpreter
    /// is stopped immediately.
    pub fn stop(&self) {
        self.interrupt.stop();
        if let Ok(mut interpreter) = self.inner.try_lock() {
            interpreter.stop();
        }
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Locks the interpreter for inspection or direct control.
    pub fn lock(&self) -> MutexGuard<'_, Interpreter> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
