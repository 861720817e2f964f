//! Output interception point shared by a runtime's print hooks.
//!
//! Outside of a capture, printed lines go live to the log. [`OutputSink::capture`]
//! redirects them into a buffer until the returned guard is dropped; the guard
//! also holds the sink exclusively, so two executions never interleave lines.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct OutputSink {
    buffer: Mutex<Option<Vec<String>>>,
    exclusive: Mutex<()>,
}

impl OutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print hook entry point.
    pub fn emit(&self, line: &str) {
        let mut buffer = lock(&self.buffer);
        match buffer.as_mut() {
            Some(lines) => lines.push(line.to_string()),
            None => log::info!(target: "lessonbox::program", "{}", line),
        }
    }

    pub fn is_capturing(&self) -> bool {
        lock(&self.buffer).is_some()
    }

    /// Blocks while another capture on this sink is active.
    pub fn capture(&self) -> CaptureGuard<'_> {
        let exclusive = lock(&self.exclusive);
        *lock(&self.buffer) = Some(Vec::new());
        CaptureGuard { sink: self, _exclusive: exclusive }
    }
}

pub struct CaptureGuard<'a> {
    sink: &'a OutputSink,
    _exclusive: MutexGuard<'a, ()>,
}

impl CaptureGuard<'_> {
    /// Lines captured so far, in emission order. Capturing continues.
    pub fn take_lines(&self) -> Vec<String> {
        lock(&self.sink.buffer)
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        *lock(&self.sink.buffer) = None;
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_buffered_in_order_while_capturing() {
        let sink = OutputSink::new();
        let guard = sink.capture();
        sink.emit("a");
        sink.emit("b");
        assert_eq!(guard.take_lines(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn dropping_the_guard_restores_live_output() {
        let sink = OutputSink::new();
        {
            let _guard = sink.capture();
            assert!(sink.is_capturing());
        }
        assert!(!sink.is_capturing());
        sink.emit("after");
        let guard = sink.capture();
        assert!(guard.take_lines().is_empty());
    }

    #[test]
    fn capture_is_restored_after_a_panic() {
        let sink = OutputSink::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = sink.capture();
            sink.emit("lost");
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!sink.is_capturing());
    }
}
