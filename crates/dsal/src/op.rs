//! The asynchronous IO-operation lifecycle (C4): init → submit → wait →
//! fini, with an optional completion callback fired exactly once when the
//! operation reaches a terminal state.
//!
//! `wait` is the sole suspension point in the core; everything else either
//! resolves immediately or awaits exactly one `wait` internally. Each
//! backend tracks its in-flight request behind its own completion channel
//! rather than a raw OS-level callback.

use crate::backend::{BackendOp, IoOpPayload};
use crate::error::Result;
use tracing::trace;

/// The three IO operation kinds the backend ABI accepts. Any other value
/// is rejected by `IoOp::init` with `DsalError::InvalidArgument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOpType {
    Read,
    Write,
    Free,
}

impl IoOpType {
    pub fn is_data_bearing(self) -> bool {
        matches!(self, IoOpType::Read | IoOpType::Write)
    }
}

/// A one-shot completion notification. Whatever the caller needs at
/// completion time is captured by the closure rather than threaded through
/// a separate context pointer.
pub type CompletionCallback = Box<dyn FnOnce(i32) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpState {
    Init,
    Submitted,
    Terminal(i32),
}

/// An opaque, one-shot asynchronous IO operation.
///
/// Owns the backend-private submission record ([`BackendOp`]) and borrows
/// the object handle and caller buffers for its lifetime (enforced here by
/// ordinary Rust ownership/lifetimes rather than a documented-but-unchecked
/// contract: the buffers an `IoOp` is built from are moved into it and are
/// therefore unavailable to the caller until the op is consumed).
pub struct IoOp {
    op_type: IoOpType,
    backend_op: Box<dyn BackendOp>,
    cb: Option<CompletionCallback>,
    state: OpState,
}

impl IoOp {
    /// Constructs an operation already bound to its backend-private
    /// submission record. Only called by [`crate::object::ObjectHandle`].
    /// The C original's "only READ/WRITE/FREE accepted" check has nothing
    /// left to guard here: `IoOpType` is a closed enum, so a value outside
    /// those three variants cannot be constructed in the first place.
    pub(crate) fn new(
        op_type: IoOpType,
        backend_op: Box<dyn BackendOp>,
        cb: Option<CompletionCallback>,
    ) -> Self {
        Self {
            op_type,
            backend_op,
            cb,
            state: OpState::Init,
        }
    }

    pub fn op_type(&self) -> IoOpType {
        self.op_type
    }

    /// INIT → SUBMITTED. Infallible: asynchronous errors surface at
    /// `wait`, not here.
    pub async fn submit(&mut self) -> Result<()> {
        debug_assert!(matches!(self.state, OpState::Init));
        self.backend_op.submit().await?;
        self.state = OpState::Submitted;
        trace!(op_type = ?self.op_type, "io op submitted");
        Ok(())
    }

    /// Blocks until the operation reaches STABLE or FAILED and returns the
    /// final rc. Invokes the completion callback, if registered, exactly
    /// once. Safe to call more than once: subsequent calls return the
    /// cached terminal rc without re-invoking the callback.
    pub async fn wait(&mut self) -> i32 {
        if let OpState::Terminal(rc) = self.state {
            return rc;
        }
        debug_assert!(matches!(self.state, OpState::Submitted));
        let rc = self.backend_op.wait().await;
        self.state = OpState::Terminal(rc);
        if let Some(cb) = self.cb.take() {
            cb(rc);
        }
        trace!(op_type = ?self.op_type, rc, "io op reached terminal state");
        rc
    }

    /// Releases backend resources and hands back the payload `io_op_init`
    /// was given, filled in for reads. Must be called in a terminal state;
    /// calling it earlier is undefined behaviour, matching the C
    /// original's contract (checked here with a `debug_assert`).
    pub async fn fini(self) -> IoOpPayload {
        debug_assert!(
            matches!(self.state, OpState::Terminal(_)),
            "IoOp::fini called before the operation reached a terminal state"
        );
        self.backend_op.fini().await
    }
}
