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

//! Shared helper for the small, hand-rolled error enums used by the
//! value-parsing modules ([crate::arch], [crate::version], [crate::control]).
//! These types are plain data -- no `#[from]` conversions,
//! no chained sources -- so a single macro gives them `Display` and
//! `std::error::Error` without repeating the boilerplate in every module.
//!
//! Subsystems with real I/O and multiple error sources ([crate::db],
//! [crate::infodb], [crate::unpack]) use `thiserror` instead; see those
//! modules for their own `Error` enums.

/// Implement [std::fmt::Display] (via `{:?}`) and [std::error::Error] for a
/// plain enum that has no fields worth a bespoke message.
macro_rules! error_enum {
    ($ty:ty) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:?}", self)
            }
        }

        impl std::error::Error for $ty {}
    };
}
pub(crate) use error_enum;

// vim: foldmethod=marker
