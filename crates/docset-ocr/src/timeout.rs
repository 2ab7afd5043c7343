// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-call timeout for any recognizer. The call runs on a helper thread; when
// the deadline passes the caller gets `OcrTimeout` and the helper is left to
// finish on its own.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use docset_core::error::{DocsetError, Result};
use image::RgbImage;
use tracing::warn;

use crate::recognizer::{Recognizer, TextItem};

/// Abandoned calls allowed to keep running before new calls are refused.
pub const DEFAULT_MAX_STALLED: usize = 4;

const RUNNING: u8 = 0;
const FINISHED: u8 = 1;
const ABANDONED: u8 = 2;

/// Wraps a recognizer so that no call blocks longer than `timeout`.
///
/// Engines cannot be interrupted mid-call, so a timed-out call keeps its
/// `ocr-call` thread, and the copy of the page it was given, alive until the
/// engine returns. At most `max_stalled` such threads may be outstanding;
/// while that many are still running, further calls fail immediately with
/// [`DocsetError::OcrError`] instead of spawning another thread.
pub struct TimeoutRecognizer {
    inner: Arc<dyn Recognizer>,
    timeout: Duration,
    max_stalled: usize,
    stalled: Arc<AtomicUsize>,
}

impl TimeoutRecognizer {
    pub fn new(inner: Arc<dyn Recognizer>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            max_stalled: DEFAULT_MAX_STALLED,
            stalled: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_max_stalled(mut self, max_stalled: usize) -> Self {
        self.max_stalled = max_stalled;
        self
    }
}

impl Recognizer for TimeoutRecognizer {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn recognize_items(&self, image: &RgbImage) -> Result<Vec<TextItem>> {
        let stalled = self.stalled.load(Ordering::SeqCst);
        if stalled >= self.max_stalled {
            return Err(DocsetError::OcrError(format!(
                "{stalled} timed-out OCR calls are still running"
            )));
        }

        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let page = image.clone();
        let state = Arc::new(AtomicU8::new(RUNNING));
        let helper_state = Arc::clone(&state);
        let helper_stalled = Arc::clone(&self.stalled);

        std::thread::Builder::new()
            .name("ocr-call".into())
            .spawn(move || {
                let result = inner.recognize_items(&page);
                if helper_state.swap(FINISHED, Ordering::SeqCst) == ABANDONED {
                    helper_stalled.fetch_sub(1, Ordering::SeqCst);
                }
                // The receiver is gone after a timeout.
                let _ = tx.send(result);
            })
            .map_err(|err| DocsetError::OcrError(format!("cannot start OCR thread: {}", err)))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // Count first so the helper never decrements below zero.
                self.stalled.fetch_add(1, Ordering::SeqCst);
                if state.swap(ABANDONED, Ordering::SeqCst) != RUNNING {
                    self.stalled.fetch_sub(1, Ordering::SeqCst);
                }
                warn!(engine = self.inner.name(), timeout = ?self.timeout, "OCR call timed out");
                Err(DocsetError::OcrTimeout(self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(DocsetError::OcrError(
                "OCR thread exited without a result".into(),
            )),
        }
    }

    fn min_confidence(&self) -> f32 {
        self.inner.min_confidence()
    }

    fn parallel_safe(&self) -> bool {
        self.inner.parallel_safe()
    }
}
