//! One-shot completion signal.
//!
//! A [`Resolver`] is handed to whoever produces a value later (the refresh
//! worker building a collision index); the matching [`Deferred`] stays with
//! the scene, which polls it once per tick. Resolving consumes the resolver,
//! so a value is delivered at most once.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

/// What a poll found.
#[derive(Debug, PartialEq)]
pub enum Poll<T> {
    Ready(T),
    Pending,
    /// The resolver was dropped without resolving
    Abandoned,
}

/// Producer half.
#[derive(Debug)]
pub struct Resolver<T> {
    tx: SyncSender<T>,
}

/// Consumer half.
#[derive(Debug)]
pub struct Deferred<T> {
    rx: Option<Receiver<T>>,
}

/// Create a connected resolver/deferred pair.
pub fn deferred<T>() -> (Resolver<T>, Deferred<T>) {
    let (tx, rx) = mpsc::sync_channel(1);
    (Resolver { tx }, Deferred { rx: Some(rx) })
}

impl<T> Resolver<T> {
    /// Deliver the value. Returns false when the consumer is already gone.
    pub fn resolve(self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

impl<T> Deferred<T> {
    /// A deferred that is already resolved.
    pub fn ready(value: T) -> Self {
        let (resolver, deferred) = deferred();
        resolver.resolve(value);
        deferred
    }

    /// Non-blocking check. After `Ready` or `Abandoned` every later poll
    /// returns `Abandoned`.
    pub fn poll(&mut self) -> Poll<T> {
        let Some(rx) = self.rx.as_ref() else {
            return Poll::Abandoned;
        };
        match rx.try_recv() {
            Ok(value) => {
                self.rx = None;
                Poll::Ready(value)
            }
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => {
                self.rx = None;
                Poll::Abandoned
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.rx.is_none()
    }
}
