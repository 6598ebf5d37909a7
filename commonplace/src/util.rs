// Copyright (C) 2025-2026 the commonplace authors
//
// This file is part of commonplace.
//
// commonplace is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// commonplace is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with commonplace.  If
// not, see <http://www.gnu.org/licenses/>.

//! # util
//!
//! Small, general-purpose helpers with no better home (yet).

use std::fmt::Display;

use either::Either;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          exactly_two                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The iterator handed to [exactly_two] yielded something other than two items.
#[derive(Debug)]
pub struct ExactlyTwoError<T: Iterator> {
    #[allow(clippy::type_complexity)]
    cause: Option<Either<T::Item, (T::Item, T::Item, T::Item)>>,
}

impl<T: Iterator> Display for ExactlyTwoError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(Either::Left(_one)) => write!(f, "ExactlyTwoError: one element"),
            Some(Either::Right(_three)) => write!(f, "ExactlyTwoError: three or more elements"),
            None => write!(f, "ExactlyTwoError: no elements"),
        }
    }
}

/// Demand exactly two items of an iterator.
///
/// The tag grammar is full of "split this string & insist on precisely two pieces" moments; this
/// expresses that insistence once, rather than scattering index arithmetic around.
pub fn exactly_two<T>(mut iter: T) -> std::result::Result<(T::Item, T::Item), ExactlyTwoError<T>>
where
    T: Iterator,
{
    match (iter.next(), iter.next()) {
        (Some(first), Some(second)) => match iter.next() {
            None => Ok((first, second)),
            Some(third) => Err(ExactlyTwoError {
                cause: Some(Either::Right((first, second, third))),
            }),
        },
        (Some(first), None) => Err(ExactlyTwoError {
            cause: Some(Either::Left(first)),
        }),
        _ => Err(ExactlyTwoError { cause: None }),
    }
}

#[cfg(test)]
mod check_exactly_two {
    use super::*;

    #[test]
    fn smoke() {
        assert_eq!(exactly_two("a@b".split('@')).unwrap(), ("a", "b"));
        assert!(exactly_two("a".split('@')).is_err());
        assert!(exactly_two("a@b@c".split('@')).is_err());
        assert!(exactly_two(std::iter::empty::<&str>()).is_err());
    }
}
