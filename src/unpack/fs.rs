// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! The filesystem surface the unpack engine drives, behind a trait so the
//! decision tree in [super::engine] can be exercised without root and
//! without device nodes or real ownership changes. [StdFilesystem] is the
//! real implementation, backed by [std::fs] plus `nix`/`filetime` for the
//! handful of operations `std` doesn't expose (`mknod`, non-`UTIME_NOW`
//! timestamps).

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use super::entry::{DeviceNumber, EntryKind};

/// Result of an `lstat`-equivalent probe: either the path doesn't exist, or
/// it does and we know its type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeKind {
    /// A directory.
    Dir,
    /// A symbolic link.
    Symlink,
    /// Anything else (regular file, device, fifo, ...).
    Other,
}

/// The subset of `(dev, ino)` needed to tell two directory entries apart
/// without comparing full [std::fs::Metadata].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Inode {
    /// Device id.
    pub dev: u64,
    /// Inode number.
    pub ino: u64,
}

/// One `lstat`/`stat` result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Probe {
    /// What's at this path.
    pub kind: ProbeKind,
    /// Size in bytes, meaningful for regular files.
    pub size: u64,
    /// `(dev, ino)`, used to recognise "symlink to the same directory".
    pub inode: Inode,
}

/// Filesystem operations the decision tree in [super::engine] needs.
/// Implemented for real by [StdFilesystem]; tests substitute an in-memory
/// fake.
pub trait Filesystem {
    /// `lstat`: does not follow a trailing symlink. `Ok(None)` on ENOENT.
    fn lstat(&self, path: &Path) -> io::Result<Option<Probe>>;

    /// `stat`: follows symlinks. `Ok(None)` on ENOENT or a broken symlink.
    fn stat(&self, path: &Path) -> io::Result<Option<Probe>>;

    /// `open(O_CREAT|O_EXCL|O_RDWR, 0)`: nobody can read or write the file
    /// until a later `fchmod` applies the real mode.
    fn create_new_file(&self, path: &Path) -> io::Result<File>;

    /// Create a directory; fails if `path` already exists.
    fn mkdir(&self, path: &Path) -> io::Result<()>;
    /// Create a named pipe with the given permission bits.
    fn mkfifo(&self, path: &Path, mode: u32) -> io::Result<()>;
    /// Create a character or block device node.
    fn mknod(&self, path: &Path, kind: EntryKind, dev: DeviceNumber, mode: u32) -> io::Result<()>;
    /// Create a symbolic link at `link` pointing at `target`.
    fn symlink(&self, target: &str, link: &Path) -> io::Result<()>;
    /// Create `dst` as a new hard link to `src`.
    fn hard_link(&self, src: &Path, dst: &Path) -> io::Result<()>;
    /// Atomically move `from` onto `to`, replacing whatever was there.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// Unlink `path`.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    /// Read a symbolic link's target.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// `chown`, following symlinks.
    fn chown(&self, path: &Path, uid: u32, gid: u32) -> io::Result<()>;
    /// `lchown`, not following symlinks.
    fn lchown(&self, path: &Path, uid: u32, gid: u32) -> io::Result<()>;
    /// `chmod`.
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;
    /// Set a regular file or directory's modification time.
    fn set_mtime(&self, path: &Path, mtime: i64) -> io::Result<()>;
    /// Set a symbolic link's own modification time, without following it.
    fn set_symlink_mtime(&self, path: &Path, mtime: i64) -> io::Result<()>;
}

/// Real filesystem access, for `src/bin/` front-ends and integration tests
/// run as root.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdFilesystem;

fn probe(meta: &fs::Metadata) -> Probe {
    use std::os::unix::fs::MetadataExt;

    let kind = if meta.is_dir() {
        ProbeKind::Dir
    } else if meta.file_type().is_symlink() {
        ProbeKind::Symlink
    } else {
        ProbeKind::Other
    };
    Probe {
        kind,
        size: meta.len(),
        inode: Inode {
            dev: meta.dev(),
            ino: meta.ino(),
        },
    }
}

fn ignore_not_found(err: io::Error) -> io::Result<Option<Probe>> {
    if err.kind() == io::ErrorKind::NotFound {
        Ok(None)
    } else {
        Err(err)
    }
}

impl Filesystem for StdFilesystem {
    fn lstat(&self, path: &Path) -> io::Result<Option<Probe>> {
        match fs::symlink_metadata(path) {
            Ok(meta) => Ok(Some(probe(&meta))),
            Err(err) => ignore_not_found(err),
        }
    }

    fn stat(&self, path: &Path) -> io::Result<Option<Probe>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(probe(&meta))),
            Err(err) => ignore_not_found(err),
        }
    }

    fn create_new_file(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new().read(true).write(true).create_new(true).mode(0).open(path)
    }

    fn mkdir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn mkfifo(&self, path: &Path, mode: u32) -> io::Result<()> {
        nix::unistd::mkfifo(path, nix::sys::stat::Mode::from_bits_truncate(mode))
            .map_err(io::Error::from)
    }

    fn mknod(&self, path: &Path, kind: EntryKind, dev: DeviceNumber, mode: u32) -> io::Result<()> {
        let sflag = match kind {
            EntryKind::CharDev => nix::sys::stat::SFlag::S_IFCHR,
            EntryKind::BlockDev => nix::sys::stat::SFlag::S_IFBLK,
            _ => return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a device entry")),
        };
        let makedev = nix::sys::stat::makedev(dev.major as u64, dev.minor as u64);
        nix::sys::stat::mknod(path, sflag, nix::sys::stat::Mode::from_bits_truncate(mode), makedev)
            .map_err(io::Error::from)
    }

    fn symlink(&self, target: &str, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }

    fn hard_link(&self, src: &Path, dst: &Path) -> io::Result<()> {
        fs::hard_link(src, dst)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(path)
    }

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> io::Result<()> {
        std::os::unix::fs::chown(path, Some(uid), Some(gid))
    }

    fn lchown(&self, path: &Path, uid: u32, gid: u32) -> io::Result<()> {
        std::os::unix::fs::lchown(path, Some(uid), Some(gid))
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }

    fn set_mtime(&self, path: &Path, mtime: i64) -> io::Result<()> {
        filetime::set_file_mtime(path, filetime::FileTime::from_unix_time(mtime, 0))
    }

    fn set_symlink_mtime(&self, path: &Path, mtime: i64) -> io::Result<()> {
        filetime::set_symlink_file_times(
            path,
            filetime::FileTime::from_unix_time(mtime, 0),
            filetime::FileTime::from_unix_time(mtime, 0),
        )
    }
}

// vim: foldmethod=marker
