//! Reduces a random value to a winner index.
//!
//! The input is trusted to be uniformly distributed already; this only performs
//! the modular reduction so it can be checked apart from the async plumbing.

use crate::Error;

/// Index of the winner among `len` participants.
pub fn select_index(random_value: u64, len: usize) -> Result<usize, Error> {
    if len == 0 {
        return Err(Error::EmptyParticipantSet);
    }
    Ok((random_value % len as u64) as usize)
}

/// The participant `random_value` selects from `participants`.
pub fn select<T>(random_value: u64, participants: &[T]) -> Result<(usize, &T), Error> {
    let index = select_index(random_value, participants.len())?;
    Ok((index, &participants[index]))
}
