//! engine.rs - Bounded redaction of freeform text.
//!
//! Every pattern in a `PatternSet` is run against the original text and the
//! resulting spans are sorted, merged and spliced in a single pass. Output
//! therefore does not depend on pattern order, and a second pass over already
//! redacted text finds nothing new.
//!
//! Inputs that fit in one chunk are scanned on the caller's thread. Longer
//! inputs are scanned chunk by chunk on a short-lived worker thread while the
//! caller waits on a channel with a deadline. Whatever the worker has not
//! committed when the deadline passes is replaced by a single marker, so a
//! timeout can only over-redact.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::config::{RedactionLimits, REDACTED, TRUNCATION_SUFFIX};
use crate::patterns::PatternSet;

/// Half-open byte range `[start, end)` of a secret in the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Largest char boundary at or below `idx`.
pub(crate) fn floor_char_boundary(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Smallest char boundary at or above `idx`.
pub(crate) fn ceil_char_boundary(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Collects secret spans whose match starts in `[start, commit_end)`.
///
/// Matching runs over `text[..window_end]` from `start`, so look-behind
/// assertions like `\b` still see the text before `start`.
fn scan_window(
    patterns: &PatternSet,
    text: &str,
    start: usize,
    commit_end: usize,
    window_end: usize,
    out: &mut Vec<Span>,
) {
    let hay = &text[..window_end];
    for pattern in patterns {
        let re = pattern.regex();
        let grouped = pattern.has_secret_group();
        let mut at = start;
        while at <= hay.len() {
            let (whole, secret) = if grouped {
                let Some(caps) = re.captures_at(hay, at) else { break };
                let Some(whole) = caps.get(0) else { break };
                let secret = caps.get(1).unwrap_or(whole);
                (whole, secret)
            } else {
                let Some(whole) = re.find_at(hay, at) else { break };
                (whole, whole)
            };
            if whole.start() >= commit_end {
                break;
            }
            let accepted = pattern.accepts(whole.as_str());
            if accepted && secret.start() < secret.end() {
                out.push(Span::new(secret.start(), secret.end()));
            }
            // A rejected candidate can swallow a valid one that starts inside it.
            at = if accepted && whole.end() > whole.start() {
                whole.end()
            } else {
                match hay[whole.start()..].chars().next() {
                    Some(c) => whole.start() + c.len_utf8(),
                    None => break,
                }
            };
        }
    }
}

/// Sorts spans and merges any that overlap or touch.
pub fn merge_spans(spans: &mut Vec<Span>) {
    if spans.len() < 2 {
        return;
    }
    spans.sort_unstable();
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans.drain(..) {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    *spans = merged;
}

/// Replaces every span with the redaction marker.
pub fn splice(text: &str, mut spans: Vec<Span>) -> Cow<'_, str> {
    if spans.is_empty() {
        return Cow::Borrowed(text);
    }
    merge_spans(&mut spans);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in spans {
        let end = span.end.min(text.len());
        if span.start >= end {
            continue;
        }
        out.push_str(&text[last..span.start]);
        out.push_str(REDACTED);
        last = end;
    }
    out.push_str(&text[last..]);
    Cow::Owned(out)
}

/// Scans the whole of `text` with no chunking or deadline.
pub fn find_spans(patterns: &PatternSet, text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    scan_window(patterns, text, 0, text.len(), text.len(), &mut spans);
    spans
}

/// Spans found in one chunk, committed up to `end`.
#[derive(Debug)]
struct ChunkResult {
    end: usize,
    spans: Vec<Span>,
}

#[derive(Debug, Default)]
struct Progress {
    committed: usize,
    spans: Vec<Span>,
}

impl Progress {
    fn absorb(&mut self, chunk: ChunkResult) {
        self.committed = chunk.end;
        self.spans.extend(chunk.spans);
    }
}

/// Walks `text` in commit-sized chunks, handing each result to `sink` until
/// the text is exhausted or `sink` returns false.
fn for_each_chunk<F>(patterns: &PatternSet, text: &str, limits: &RedactionLimits, mut sink: F)
where
    F: FnMut(ChunkResult) -> bool,
{
    let len = text.len();
    let chunk_size = limits.chunk_size.max(1);
    let mut start = 0;
    while start < len {
        let mut end = floor_char_boundary(text, start.saturating_add(chunk_size));
        if end <= start {
            end = ceil_char_boundary(text, start + 1);
        }
        let mut window_end = if end >= len {
            len
        } else {
            floor_char_boundary(text, end.saturating_add(limits.chunk_overlap)).max(end)
        };
        let mut spans = Vec::new();
        loop {
            scan_window(patterns, text, start, end, window_end, &mut spans);
            // A match that runs into the window edge may continue past it.
            if window_end >= len || !spans.iter().any(|s| s.end >= window_end) {
                break;
            }
            window_end = ceil_char_boundary(text, window_end.saturating_add(chunk_size));
            debug!(target: "logveil_core::engine", "Match reached window edge, widening scan to {} bytes.", window_end);
            spans.clear();
        }
        if !sink(ChunkResult { end, spans }) {
            return;
        }
        start = end;
    }
}

#[derive(Debug, Clone, Copy)]
struct Deadline(Option<Instant>);

impl Deadline {
    fn after(budget: Duration) -> Self {
        Deadline(Instant::now().checked_add(budget))
    }

    /// Time left, or `None` once the deadline has passed.
    fn remaining(&self) -> Option<Duration> {
        match self.0 {
            Some(at) => at.checked_duration_since(Instant::now()).filter(|d| !d.is_zero()),
            None => Some(Duration::MAX),
        }
    }

    fn expired(&self) -> bool {
        self.remaining().is_none()
    }
}

/// Compare-and-swap admission for worker threads.
///
/// Not a semaphore: a caller that finds the gate full never waits, it scans
/// inline instead.
#[derive(Debug)]
pub struct WorkerGate {
    active: Arc<AtomicI32>,
    limit: i32,
}

impl WorkerGate {
    pub fn new(limit: i32) -> Self {
        Self {
            active: Arc::new(AtomicI32::new(0)),
            limit,
        }
    }

    pub fn try_acquire(&self) -> Option<WorkerPermit> {
        let limit = self.limit;
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < limit).then_some(n + 1))
            .ok()
            .map(|_| WorkerPermit {
                active: Arc::clone(&self.active),
            })
    }

    pub fn active(&self) -> i32 {
        self.active.load(Ordering::Acquire)
    }

    /// Polls until no worker is in flight or `timeout` elapses.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Deadline::after(timeout);
        loop {
            if self.active() <= 0 {
                return true;
            }
            if deadline.expired() {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

/// One admitted worker. Releases its slot on drop, including during unwinding.
#[derive(Debug)]
pub struct WorkerPermit {
    active: Arc<AtomicI32>,
}

impl Drop for WorkerPermit {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

fn run_inline(text: &str, patterns: &PatternSet, limits: &RedactionLimits, deadline: Deadline) -> Progress {
    let mut progress = Progress::default();
    for_each_chunk(patterns, text, limits, |chunk| {
        progress.absorb(chunk);
        !deadline.expired()
    });
    progress
}

fn run_on_worker(
    text: &str,
    patterns: &Arc<PatternSet>,
    limits: &RedactionLimits,
    deadline: Deadline,
    permit: WorkerPermit,
) -> Progress {
    let owned: Arc<str> = Arc::from(text);
    let set = Arc::clone(patterns);
    let worker_limits = *limits;
    let (tx, rx) = mpsc::channel::<ChunkResult>();

    let spawned = thread::Builder::new()
        .name("logveil-redact".to_string())
        .spawn(move || {
            let _permit = permit;
            for_each_chunk(&set, &owned, &worker_limits, |chunk| tx.send(chunk).is_ok());
        });
    if let Err(e) = spawned {
        warn!(target: "logveil_core::engine", "Failed to spawn redaction worker, scanning inline: {}", e);
        return run_inline(text, patterns, limits, deadline);
    }

    let mut progress = Progress::default();
    while progress.committed < text.len() {
        let Some(wait) = deadline.remaining() else { break };
        match rx.recv_timeout(wait) {
            Ok(chunk) => progress.absorb(chunk),
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => {
                warn!(target: "logveil_core::engine", "Redaction worker exited before finishing.");
                break;
            }
        }
    }
    progress
}

fn redact_body<'a>(
    text: &'a str,
    patterns: &Arc<PatternSet>,
    limits: &RedactionLimits,
    gate: &WorkerGate,
    deadline: Deadline,
) -> Cow<'a, str> {
    if text.len() < limits.fast_path_threshold {
        return splice(text, find_spans(patterns, text));
    }

    let mut progress = if text.len() <= limits.chunk_size {
        run_inline(text, patterns, limits, deadline)
    } else {
        match gate.try_acquire() {
            Some(permit) => run_on_worker(text, patterns, limits, deadline, permit),
            None => {
                debug!(target: "logveil_core::engine", "Worker limit reached, scanning {} bytes inline.", text.len());
                run_inline(text, patterns, limits, deadline)
            }
        }
    };

    if progress.committed < text.len() {
        warn!(
            target: "logveil_core::engine",
            "Redaction exceeded {:?}: {} of {} bytes scanned, remainder redacted.",
            limits.timeout,
            progress.committed,
            text.len()
        );
        progress.spans.push(Span::new(progress.committed, text.len()));
    }
    splice(text, progress.spans)
}

/// Where oversized input is cut, and whether a secret straddled the cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Truncation {
    cut: usize,
    straddled: bool,
}

fn plan_truncation(patterns: &PatternSet, text: &str, limits: &RedactionLimits) -> Option<Truncation> {
    if text.len() <= limits.max_input_length {
        return None;
    }
    let cut = floor_char_boundary(text, limits.max_input_length);
    let lo = floor_char_boundary(text, cut.saturating_sub(limits.boundary_window));
    let hi = floor_char_boundary(text, cut.saturating_add(limits.boundary_window));

    let mut spans = Vec::new();
    scan_window(patterns, text, lo, cut, hi, &mut spans);
    merge_spans(&mut spans);

    let plan = match spans.iter().find(|s| s.start < cut && s.end > cut) {
        Some(span) => Truncation { cut: span.start, straddled: true },
        None => Truncation { cut, straddled: false },
    };
    debug!(
        target: "logveil_core::engine",
        "Truncating {} bytes at {} (secret straddles cut: {}).",
        text.len(),
        plan.cut,
        plan.straddled
    );
    Some(plan)
}

/// Redacts `text` under `limits`, borrowing the input when nothing changed.
pub fn redact<'a>(
    text: &'a str,
    patterns: &Arc<PatternSet>,
    limits: &RedactionLimits,
    gate: &WorkerGate,
) -> Cow<'a, str> {
    if text.is_empty() || patterns.is_empty() {
        return Cow::Borrowed(text);
    }
    let deadline = Deadline::after(limits.timeout);

    match plan_truncation(patterns, text, limits) {
        None => redact_body(text, patterns, limits, gate, deadline),
        Some(plan) => {
            let body = redact_body(&text[..plan.cut], patterns, limits, gate, deadline);
            let mut out = body.into_owned();
            if plan.straddled {
                out.push_str(REDACTED);
            }
            out.push_str(TRUNCATION_SUFFIX);
            Cow::Owned(out)
        }
    }
}
