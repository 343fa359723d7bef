//! Error taxonomy for the core: invalid argument, out of memory, hole
//! (recovered internally and never seen here), object-not-found, and
//! opaque backend failures passed through unchanged.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DsalError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("out of memory")]
    OutOfMemory,

    #[error("object not found")]
    NotFound,

    #[error("backend error ({0})")]
    Backend(i32),
}

pub type Result<T> = std::result::Result<T, DsalError>;

/// `errno`-style negative-integer view of an error: the public surface
/// promises `0 or -errno` everywhere.
impl DsalError {
    pub fn as_errno(&self) -> i32 {
        match self {
            DsalError::InvalidArgument(_) => -libc_einval(),
            DsalError::OutOfMemory => -libc_enomem(),
            DsalError::NotFound => -libc_enoent(),
            DsalError::Backend(rc) => {
                if *rc < 0 {
                    *rc
                } else {
                    -rc
                }
            }
        }
    }
}

impl From<DsalError> for i32 {
    fn from(e: DsalError) -> i32 {
        e.as_errno()
    }
}

/// Wraps a raw backend rc (0 or negative errno) as a [`DsalError`] when
/// non-zero, recognising the one code the core itself gives special
/// treatment to (`-ENOENT`).
pub fn from_backend_rc(rc: i32) -> Result<()> {
    match rc {
        0 => Ok(()),
        r if r == -libc_enoent() => Err(DsalError::NotFound),
        r => Err(DsalError::Backend(r)),
    }
}

// Small local stand-ins for the handful of errno values the core itself
// produces, so the crate does not need a `libc` dependency merely to name
// three constants.
const fn libc_einval() -> i32 {
    22
}
const fn libc_enomem() -> i32 {
    12
}
const fn libc_enoent() -> i32 {
    2
}
