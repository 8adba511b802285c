//! Host process identity used for the extraction hop's ownership clause.

use serde::Serialize;

use super::command::Ownership;

/// Numeric user and group the staging files should belong to on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostIdentity {
    pub uid: u32,
    pub gid: u32,
}

impl HostIdentity {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Effective identity of the running process.
    pub fn current() -> Self {
        // SAFETY: geteuid/getegid take no arguments and cannot fail.
        let (uid, gid) = unsafe { (libc::geteuid(), libc::getegid()) };
        Self { uid, gid }
    }

    pub fn ownership(&self) -> Ownership {
        Ownership::new(Some(self.uid.to_string()), Some(self.gid.to_string()))
    }
}
