//! Data Store Abstraction Layer: translates arbitrary byte-range read,
//! write, and resize requests against an object backend that only accepts
//! block-aligned, multi-block IO, while preserving sparse-hole semantics
//! and per-block error recovery.
//!
//! The public surface lives in [`facade`]; everything else is the layered
//! implementation behind it (backend dispatch in [`backend`], the object
//! lifecycle in [`object`], the IO vector model in [`iovec`], the
//! asynchronous operation lifecycle in [`op`], and the positional IO
//! algorithms in [`io`]).

pub mod backend;
pub mod error;
pub mod facade;
pub mod io;
pub mod iovec;
pub mod object;
pub mod oid;
pub mod op;

pub use backend::{Backend, BackendObject, BackendOp, BackendRegistry, CallerCtx, IoOpPayload};
pub use error::{DsalError, Result};
pub use facade::{
    dstore_fini, dstore_init, get_bsize, obj_close, obj_create, obj_delete, obj_get_new_id,
    obj_open, pread, pwrite, resize,
};
pub use iovec::{Extent, ExtentVec, IoBuffer, IoVec, IoVecFlags};
pub use object::{DataStore, ObjectHandle};
pub use oid::ObjectId;
pub use op::{CompletionCallback, IoOp, IoOpType};
