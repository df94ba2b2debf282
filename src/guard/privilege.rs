//! Administrator checks.

use crate::config::PrivilegeCheck;

/// Whether the calling process runs as the superuser.
pub fn is_root() -> bool {
    // SAFETY: getuid has no preconditions and always succeeds.
    unsafe { libc::getuid() == 0 }
}

impl PrivilegeCheck {
    /// Whether this policy lets the calling process take the lock.
    pub fn is_admin(self) -> bool {
        match self {
            PrivilegeCheck::Root => is_root(),
            PrivilegeCheck::Bypass => true,
            PrivilegeCheck::Deny => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bypass_and_deny_ignore_uid() {
        assert!(PrivilegeCheck::Bypass.is_admin());
        assert!(!PrivilegeCheck::Deny.is_admin());
    }

    #[test]
    fn root_check_follows_uid() {
        assert_eq!(PrivilegeCheck::Root.is_admin(), is_root());
    }

    #[test]
    fn is_root_matches_uid() {
        // SAFETY: getuid has no preconditions.
        let uid = unsafe { libc::getuid() };
        assert_eq!(is_root(), uid == 0);
    }
}
