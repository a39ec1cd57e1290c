use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Flags for [`FileSystem::open_file`](crate::FileSystem::open_file).
///
/// The values are the Linux `open(2)` bits, so a raw `i32` flag word converts losslessly in both
/// directions. Exactly one access mode (`RDONLY`, `WRONLY`, `RDWR`) is expected; the remaining
/// flags combine freely with `|`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct OpenFlags(i32);

impl OpenFlags {
    pub const RDONLY: OpenFlags = OpenFlags(0o0);
    pub const WRONLY: OpenFlags = OpenFlags(0o1);
    pub const RDWR: OpenFlags = OpenFlags(0o2);
    pub const CREATE: OpenFlags = OpenFlags(0o100);
    pub const EXCL: OpenFlags = OpenFlags(0o200);
    pub const TRUNC: OpenFlags = OpenFlags(0o1000);
    pub const APPEND: OpenFlags = OpenFlags(0o2000);

    const ACCESS_MODE: i32 = 0o3;

    pub const fn from_bits(bits: i32) -> Self {
        OpenFlags(bits)
    }

    pub const fn bits(&self) -> i32 {
        self.0
    }

    /// Returns true if every bit of `other` is set. Access modes are compared as a whole.
    pub const fn contains(&self, other: OpenFlags) -> bool {
        let mode = other.0 & Self::ACCESS_MODE;
        let rest = other.0 & !Self::ACCESS_MODE;
        (mode == 0 || self.0 & Self::ACCESS_MODE == mode) && self.0 & rest == rest
    }

    pub const fn is_readable(&self) -> bool {
        self.0 & Self::ACCESS_MODE != Self::WRONLY.0
    }

    pub const fn is_writable(&self) -> bool {
        self.0 & Self::ACCESS_MODE != Self::RDONLY.0
    }

    /// True for a plain read-only open: no create, truncate or append bits.
    pub const fn is_plain_read(&self) -> bool {
        !self.is_writable()
            && self.0 & (Self::CREATE.0 | Self::TRUNC.0 | Self::APPEND.0) == 0
    }
}

impl BitOr for OpenFlags {
    type Output = OpenFlags;

    fn bitor(self, rhs: OpenFlags) -> OpenFlags {
        OpenFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for OpenFlags {
    fn bitor_assign(&mut self, rhs: OpenFlags) {
        self.0 |= rhs.0;
    }
}

impl From<i32> for OpenFlags {
    fn from(bits: i32) -> Self {
        OpenFlags(bits)
    }
}

impl From<OpenFlags> for i32 {
    fn from(flags: OpenFlags) -> Self {
        flags.0
    }
}

impl fmt::Debug for OpenFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = vec![match self.0 & Self::ACCESS_MODE {
            0 => "RDONLY",
            1 => "WRONLY",
            _ => "RDWR",
        }];
        for (flag, name) in [
            (Self::CREATE, "CREATE"),
            (Self::EXCL, "EXCL"),
            (Self::TRUNC, "TRUNC"),
            (Self::APPEND, "APPEND"),
        ] {
            if self.contains(flag) {
                names.push(name);
            }
        }
        write!(f, "OpenFlags({})", names.join(" | "))
    }
}
