//! Sans-IO single-in-flight dispatcher.
//!
//! The dispatcher owns ordering and correlation state only. The caller does
//! the writing and the timing: after [`Dispatcher::dispatch_next`] it writes
//! the request, arms a timer for `wait`, and later reports either a decoded
//! reply ([`Dispatcher::resolve`]) or a timeout ([`Dispatcher::expire`]).

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

/// A request waiting for, or holding, the device.
#[derive(Debug)]
pub struct PendingRequest<T> {
    /// Correlation token handed back on resolution.
    pub tag: T,
    pub code: u8,
    pub payload: Bytes,
    /// How long to wait for the reply once written.
    pub wait: Duration,
}

impl<T> PendingRequest<T> {
    pub fn new(tag: T, code: u8, payload: impl Into<Bytes>, wait: Duration) -> Self {
        Self {
            tag,
            code,
            payload: payload.into(),
            wait,
        }
    }
}

/// How a reply related to the in-flight request.
#[derive(Debug)]
pub enum Resolved<T> {
    /// The reply code equals the request code.
    Matched(PendingRequest<T>),
    /// The reply carried some other code.
    Mismatched(PendingRequest<T>),
}

impl<T> Resolved<T> {
    pub fn request(&self) -> &PendingRequest<T> {
        match self {
            Self::Matched(req) | Self::Mismatched(req) => req,
        }
    }

    pub fn into_request(self) -> PendingRequest<T> {
        match self {
            Self::Matched(req) | Self::Mismatched(req) => req,
        }
    }
}

/// FIFO queue with at most one request in flight.
///
/// Every accepted, unfinished request is either queued or `current`.
/// `current` is set exactly while a request has been handed to the
/// transport and has not yet resolved or expired.
#[derive(Debug)]
pub struct Dispatcher<T> {
    queue: VecDeque<PendingRequest<T>>,
    current: Option<PendingRequest<T>>,
}

impl<T> Dispatcher<T> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            current: None,
        }
    }

    /// Append a request.
    ///
    /// Returns `true` when nothing was in flight, in which case the caller
    /// must call [`dispatch_next`](Self::dispatch_next) now.
    pub fn enqueue(&mut self, req: PendingRequest<T>) -> bool {
        self.queue.push_back(req);
        !self.is_busy()
    }

    /// Move the head of the queue into flight and return it for writing.
    ///
    /// Returns `None` and stays idle when the queue is empty, or when a
    /// request is already in flight.
    pub fn dispatch_next(&mut self) -> Option<&PendingRequest<T>> {
        if self.current.is_some() {
            return None;
        }
        self.current = self.queue.pop_front();
        if let Some(req) = &self.current {
            debug!(code = req.code, queued = self.queue.len(), "dispatching request");
        }
        self.current.as_ref()
    }

    /// Settle the in-flight request with a reply carrying `code`.
    ///
    /// Returns `None` when idle; the reply is unsolicited.
    pub fn resolve(&mut self, code: u8) -> Option<Resolved<T>> {
        let req = self.current.take()?;
        if req.code == code {
            debug!(code, "reply matched in-flight request");
            Some(Resolved::Matched(req))
        } else {
            debug!(expected = req.code, got = code, "reply code mismatch");
            Some(Resolved::Mismatched(req))
        }
    }

    /// Give up on the in-flight request.
    ///
    /// Used both when the reply timer fires and when the write itself failed.
    pub fn expire(&mut self) -> Option<PendingRequest<T>> {
        let req = self.current.take()?;
        debug!(code = req.code, wait = ?req.wait, "request abandoned");
        Some(req)
    }

    /// Whether the in-flight request expects `code`.
    pub fn current_matches(&self, code: u8) -> bool {
        self.current.as_ref().is_some_and(|req| req.code == code)
    }

    pub fn current(&self) -> Option<&PendingRequest<T>> {
        self.current.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// Requests waiting behind the in-flight one.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Remove the queued requests and leave the in-flight one alone.
    pub fn clear_queued(&mut self) -> Vec<PendingRequest<T>> {
        self.queue.drain(..).collect()
    }

    /// Remove every request, in-flight first, then in queue order.
    pub fn drain(&mut self) -> Vec<PendingRequest<T>> {
        self.current.take().into_iter().chain(self.queue.drain(..)).collect()
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(1000);

    fn req(tag: u8, code: u8) -> PendingRequest<u8> {
        PendingRequest::new(tag, code, Bytes::new(), WAIT)
    }

    #[test]
    fn enqueue_reports_idle_only_when_nothing_in_flight() {
        let mut d = Dispatcher::new();
        assert!(d.enqueue(req(1, 101)));
        assert!(d.dispatch_next().is_some());
        assert!(!d.enqueue(req(2, 102)));
        assert!(!d.enqueue(req(3, 103)));
        assert_eq!(d.queued(), 2);
    }

    #[test]
    fn dispatch_is_fifo() {
        let mut d = Dispatcher::new();
        for (tag, code) in [(1, 101), (2, 102), (3, 103)] {
            d.enqueue(req(tag, code));
        }

        let mut order = Vec::new();
        while let Some(current) = d.dispatch_next() {
            order.push(current.tag);
            let code = current.code;
            d.resolve(code);
        }
        assert_eq!(order, vec![1, 2, 3]);
        assert!(!d.is_busy());
    }

    #[test]
    fn clear_queued_keeps_in_flight() {
        let mut d = Dispatcher::new();
        d.enqueue(req(1, 101));
        d.enqueue(req(2, 102));
        d.enqueue(req(3, 103));
        d.dispatch_next();

        let cleared: Vec<_> = d.clear_queued().into_iter().map(|r| r.tag).collect();
        assert_eq!(cleared, vec![2, 3]);
        assert_eq!(d.current().map(|r| r.tag), Some(1));
        assert_eq!(d.queued(), 0);
    }

    #[test]
    fn dispatch_next_does_not_replace_in_flight() {
        let mut d = Dispatcher::new();
        d.enqueue(req(1, 101));
        d.enqueue(req(2, 102));
        d.dispatch_next();

        assert!(d.dispatch_next().is_none());
        assert_eq!(d.current().map(|r| r.tag), Some(1));
        assert_eq!(d.queued(), 1);
    }

    #[test]
    fn resolve_classifies_by_code() {
        let mut d = Dispatcher::new();
        d.enqueue(req(1, 108));
        d.dispatch_next();
        assert!(d.current_matches(108));
        assert!(!d.current_matches(109));
        assert!(matches!(d.resolve(108), Some(Resolved::Matched(r)) if r.tag == 1));

        d.enqueue(req(2, 108));
        d.dispatch_next();
        match d.resolve(109) {
            Some(Resolved::Mismatched(r)) => assert_eq!(r.tag, 2),
            other => panic!("expected mismatch, got {other:?}"),
        }
        assert!(!d.is_busy());
    }

    #[test]
    fn resolve_while_idle_is_ignored() {
        let mut d: Dispatcher<u8> = Dispatcher::new();
        assert!(d.resolve(101).is_none());

        d.enqueue(req(1, 101));
        assert!(d.resolve(101).is_none(), "queued but not dispatched");
        assert_eq!(d.queued(), 1);
    }

    #[test]
    fn expire_frees_the_device() {
        let mut d = Dispatcher::new();
        d.enqueue(req(1, 101));
        d.enqueue(req(2, 102));
        d.dispatch_next();

        let expired = d.expire().unwrap();
        assert_eq!(expired.tag, 1);
        assert!(!d.is_busy());
        assert!(d.expire().is_none());
        assert_eq!(d.dispatch_next().map(|r| r.tag), Some(2));
    }

    #[test]
    fn drain_returns_in_flight_then_queue() {
        let mut d = Dispatcher::new();
        for tag in 1..=3 {
            d.enqueue(req(tag, 100 + tag));
        }
        d.dispatch_next();

        let tags: Vec<u8> = d.drain().into_iter().map(|r| r.tag).collect();
        assert_eq!(tags, vec![1, 2, 3]);
        assert!(!d.is_busy());
        assert_eq!(d.queued(), 0);
    }
}
