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

//! One decoded tar header, handed to the unpack engine by whatever is
//! reading the archive member off `dpkg-deb`'s pipe. Decoding the tar wire
//! format itself isn't this crate's job.

/// What kind of filesystem object a [TarEntry] describes. Mirrors `dpkg`'s
/// `tar_filetype`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file; its content follows as `size` bytes.
    File,
    /// A named pipe.
    Fifo,
    /// A character device; `rdev` carries major/minor.
    CharDev,
    /// A block device; `rdev` carries major/minor.
    BlockDev,
    /// A hard link to `linkname`, another path in this same archive.
    HardLink,
    /// A symbolic link to `linkname`.
    Symlink,
    /// A directory.
    Dir,
}

/// Ownership, permission and timestamp metadata carried by one [TarEntry],
/// or substituted wholesale by a `dpkg-statoverride` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileStat {
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Permission bits, `S_IFMT` excluded.
    pub mode: u32,
    /// Modification time, Unix epoch seconds.
    pub mtime: i64,
}

/// Major/minor device numbers for [EntryKind::CharDev] / [EntryKind::BlockDev].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceNumber {
    /// Device major number.
    pub major: u32,
    /// Device minor number.
    pub minor: u32,
}

/// One tar member about to be placed into the filesystem.
#[derive(Clone, Debug)]
pub struct TarEntry {
    /// Canonical path, relative to `instdir`, leading `./` already stripped.
    pub name: String,
    /// What kind of object this is.
    pub kind: EntryKind,
    /// Link target for [EntryKind::HardLink] / [EntryKind::Symlink]; empty
    /// otherwise.
    pub linkname: String,
    /// Payload length in bytes; meaningful only for [EntryKind::File].
    pub size: u64,
    /// Owner/mode/mtime as recorded in the archive.
    pub stat: FileStat,
    /// Device number, for [EntryKind::CharDev] / [EntryKind::BlockDev].
    pub dev: Option<DeviceNumber>,
}

// vim: foldmethod=marker
