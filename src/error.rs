// MIT License
//
// Copyright (c) 2020 Gregory Meyer
//
// Permission is hereby granted, free of charge, to any person
// obtaining a copy of this software and associated documentation files
// (the "Software"), to deal in the Software without restriction,
// including without limitation the rights to use, copy, modify, merge,
// publish, distribute, sublicense, and/or sell copies of the Software,
// and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS
// BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN
// ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Errors reported by `chash` maps.

/// The error type for constructing and manipulating a [`HashMap`].
///
/// [`HashMap`]: crate::HashMap
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    /// The load factor was zero, negative, NaN or infinite.
    #[error("illegal load factor: {0}")]
    IllegalLoadFactor(f32),
    /// The concurrency level was zero.
    #[error("illegal concurrency level: {0}")]
    IllegalConcurrencyLevel(usize),
    /// An iterator was asked to remove an entry before yielding one, or after
    /// the entry it last yielded was already removed through it.
    #[error("iterator has no current entry to remove")]
    NoCurrentEntry,
}

/// A specialized [`Result`] type for `chash` operations.
///
/// [`Result`]: std::result::Result
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            Error::IllegalLoadFactor(-1.0).to_string(),
            "illegal load factor: -1"
        );
        assert_eq!(
            Error::IllegalConcurrencyLevel(0).to_string(),
            "illegal concurrency level: 0"
        );
        assert_eq!(
            Error::NoCurrentEntry.to_string(),
            "iterator has no current entry to remove"
        );
    }
}
