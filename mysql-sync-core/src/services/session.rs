//! Guaranteed release of the remote session

use std::io;

use tracing::warn;

use crate::ports::RemoteSession;

/// Owns the remote session for the length of a run and closes it exactly once
///
/// The success path calls [`close`](Self::close) to see the result; any other
/// exit (early return, panic) closes it from `Drop`.
pub struct SessionGuard {
    session: Box<dyn RemoteSession>,
    closed: bool,
}

impl SessionGuard {
    pub fn new(session: Box<dyn RemoteSession>) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    pub fn session(&mut self) -> &mut dyn RemoteSession {
        &mut *self.session
    }

    /// Close the session and report whether that worked
    pub fn close(mut self) -> io::Result<()> {
        self.closed = true;
        self.session.close()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.session.close() {
                warn!("failed to close remote session: {}", e);
            }
        }
    }
}
