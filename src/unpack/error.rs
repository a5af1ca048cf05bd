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

use std::path::PathBuf;

/// Every way placing one archive can fail. Forcible kinds
/// ([UnpackError::FileConflict], [UnpackError::DivertedOverwrite]) are the
/// ones a `--force-*` flag downgrades to a warning; the caller is
/// expected to check [super::force::ForceFlags] *before* treating one of
/// these as fatal -- [super::engine::UnpackEngine] only constructs one once
/// it has already confirmed the matching flag is absent.
#[derive(Debug, thiserror::Error)]
pub enum UnpackError {
    /// A filesystem operation on `path` failed.
    #[error("error accessing {path:?}: {source}")]
    Io {
        /// The path being operated on.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Two packages both claim `path` and neither `Replaces` the other.
    #[error("trying to overwrite '{path}', which is also in package {other}")]
    FileConflict {
        /// The contended path.
        path: String,
        /// The package that already owns it.
        other: String,
    },

    /// `path` is the rename target of a diversion owned by a package other
    /// than the one currently being unpacked.
    #[error("trying to overwrite '{path}', which is the diverted version of '{came_from}'")]
    DivertedOverwrite {
        /// The diversion's target path (what we tried to write).
        path: String,
        /// The diversion's source path.
        came_from: String,
    },

    /// A `Multi-Arch: same` peer's shared file content, or a conffile's
    /// recorded hash, doesn't match what's about to be installed.
    #[error("'{path}' is not in sync with other instances of the same package")]
    NotInSync {
        /// The path whose content disagreed.
        path: String,
    },

    /// The archive named an unsupported tar entry type for `path`.
    #[error("archive contained object '{path}' of unknown type")]
    UnknownEntryType {
        /// The offending path.
        path: String,
    },

    /// An invariant the decision tree depends on did not hold.
    #[error("internal error: {0}")]
    Internal(String),
}

pub(super) fn io_err(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> UnpackError {
    let path = path.into();
    move |source| UnpackError::Io { path, source }
}

// vim: foldmethod=marker
