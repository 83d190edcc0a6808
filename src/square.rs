/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Result};

use crate::Team;

/// Represents a single square on an `8x8` chess board.
///
/// Internally encoded as `file + rank * 8`, also known as
/// [Least Significant File Mapping](https://www.chessprogramming.org/Square_Mapping_Considerations#Deduction_on_Files_and_Ranks):
/// ```text
/// 8| 56 57 58 59 60 61 62 63
/// 7| 48 49 50 51 52 53 54 55
/// 6| 40 41 42 43 44 45 46 47
/// 5| 32 33 34 35 36 37 38 39
/// 4| 24 25 26 27 28 29 30 31
/// 3| 16 17 18 19 20 21 22 23
/// 2|  8  9 10 11 12 13 14 15
/// 1|  0  1  2  3  4  5  6  7
///  +------------------------
///    a  b  c  d  e  f  g  h
/// ```
///
/// A [`Square`] can only ever hold an in-range value.
/// Anything that could produce an off-board coordinate returns [`Option`] or [`Result`] instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Square(pub(crate) u8);

impl Square {
    pub const A1: Self = Self::new(File::A, Rank::ONE);
    pub const B1: Self = Self::new(File::B, Rank::ONE);
    pub const C1: Self = Self::new(File::C, Rank::ONE);
    pub const D1: Self = Self::new(File::D, Rank::ONE);
    pub const E1: Self = Self::new(File::E, Rank::ONE);
    pub const F1: Self = Self::new(File::F, Rank::ONE);
    pub const G1: Self = Self::new(File::G, Rank::ONE);
    pub const H1: Self = Self::new(File::H, Rank::ONE);

    pub const A8: Self = Self::new(File::A, Rank::EIGHT);
    pub const B8: Self = Self::new(File::B, Rank::EIGHT);
    pub const C8: Self = Self::new(File::C, Rank::EIGHT);
    pub const D8: Self = Self::new(File::D, Rank::EIGHT);
    pub const E8: Self = Self::new(File::E, Rank::EIGHT);
    pub const F8: Self = Self::new(File::F, Rank::EIGHT);
    pub const G8: Self = Self::new(File::G, Rank::EIGHT);
    pub const H8: Self = Self::new(File::H, Rank::EIGHT);

    /// Number of squares along either axis of the board.
    pub const SIDE: i8 = 8;
    pub const COUNT: usize = 64;

    /// Returns an iterator over all squares, from `a1` to `h8`.
    ///
    /// # Example
    /// ```
    /// # use gambit::Square;
    /// let mut iter = Square::iter();
    /// assert_eq!(iter.len(), 64);
    /// assert_eq!(iter.next().unwrap(), Square::A1);
    /// assert_eq!(iter.last().unwrap(), Square::H8);
    /// ```
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Creates a new [`Square`] from the provided [`File`] and [`Rank`].
    #[inline(always)]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self(file.0 | rank.0 << 3)
    }

    /// Returns `true` if both components lie on the board.
    ///
    /// The check is done per axis, so it does not care which axis is out of range.
    ///
    /// # Example
    /// ```
    /// # use gambit::Square;
    /// assert!(Square::is_in_range(0, 7));
    /// assert!(!Square::is_in_range(8, 0));
    /// assert!(!Square::is_in_range(3, -1));
    /// ```
    #[inline(always)]
    pub const fn is_in_range(file: i8, rank: i8) -> bool {
        file >= 0 && file < Self::SIDE && rank >= 0 && rank < Self::SIDE
    }

    /// Creates a [`Square`] from raw integer coordinates, if they are on the board.
    ///
    /// # Example
    /// ```
    /// # use gambit::Square;
    /// assert_eq!(Square::from_coords(4, 0), Some(Square::E1));
    /// assert_eq!(Square::from_coords(-1, 0), None);
    /// ```
    #[inline(always)]
    pub const fn from_coords(file: i8, rank: i8) -> Option<Self> {
        if Self::is_in_range(file, rank) {
            Some(Self::new(File(file as u8), Rank(rank as u8)))
        } else {
            None
        }
    }

    /// Parses a [`Square`] from board notation, such as `"c4"` or `"C4"`.
    ///
    /// The string must be exactly two characters: a file letter followed by a rank digit.
    /// Anything else is an `Err`; this never panics.
    ///
    /// # Example
    /// ```
    /// # use gambit::Square;
    /// assert_eq!(Square::from_uci("e1").unwrap(), Square::E1);
    /// assert_eq!(Square::from_uci("H8").unwrap(), Square::H8);
    /// assert!(Square::from_uci("z0").is_err());
    /// assert!(Square::from_uci("a10").is_err());
    /// ```
    pub fn from_uci(square: &str) -> Result<Self> {
        let mut chars = square.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            bail!("Invalid Square string: String must contain exactly 2 characters. Got {square:?}")
        };

        let file = File::from_char(file)?;
        let rank = Rank::from_char(rank)?;

        Ok(Self::new(file, rank))
    }

    /// Converts this [`Square`] to board notation, using a lowercase file letter.
    #[inline(always)]
    pub fn to_uci(self) -> String {
        format!("{}{}", self.file(), self.rank())
    }

    /// Fetches the [`File`] of this [`Square`].
    #[inline(always)]
    pub const fn file(&self) -> File {
        File(self.0 & 0b0000_0111)
    }

    /// Fetches the [`Rank`] of this [`Square`].
    #[inline(always)]
    pub const fn rank(&self) -> Rank {
        Rank(self.0 >> 3)
    }

    /// Index of this square in `[0, 63]`.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Attempt to offset this [`Square`] by the file and rank deltas.
    ///
    /// # Example
    /// ```
    /// # use gambit::Square;
    /// assert_eq!(Square::A1.offset(1, 1), "b2".parse().ok());
    /// assert_eq!(Square::A1.offset(-1, 0), None);
    /// ```
    #[inline(always)]
    pub const fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        Self::from_coords(
            self.file().0 as i8 + file_delta,
            self.rank().0 as i8 + rank_delta,
        )
    }

    /// Signed number of files from `self` to `other`.
    #[inline(always)]
    pub const fn file_delta(&self, other: Self) -> i8 {
        other.file().0 as i8 - self.file().0 as i8
    }

    /// Signed number of ranks from `self` to `other`.
    #[inline(always)]
    pub const fn rank_delta(&self, other: Self) -> i8 {
        other.rank().0 as i8 - self.rank().0 as i8
    }

    /// The colour class of this square: `true` when the file and rank indices share parity.
    ///
    /// Only meaningful relative to another square; two squares are the same colour iff their parities match.
    #[inline(always)]
    pub const fn parity(&self) -> bool {
        self.file().0 % 2 == self.rank().0 % 2
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    /// Wrapper for [`Square::from_uci`].
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl TryFrom<&str> for Square {
    type Error = anyhow::Error;
    #[inline(always)]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_uci(value)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_uci().fmt(f)
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.to_uci(), self.0)
    }
}

/// Represents one of eight ranks on a chess board.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Rank(pub(crate) u8);

impl Rank {
    pub const ONE: Self = Self(0);
    pub const TWO: Self = Self(1);
    pub const THREE: Self = Self(2);
    pub const FOUR: Self = Self(3);
    pub const FIVE: Self = Self(4);
    pub const SIX: Self = Self(5);
    pub const SEVEN: Self = Self(6);
    pub const EIGHT: Self = Self(7);

    pub const MAX: u8 = 7;

    /// Returns an iterator over all ranks, from `1` to `8`.
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (0..=Self::MAX).map(Self)
    }

    /// Construct a new [`Rank`] from the provided value.
    #[inline(always)]
    pub fn new(rank: u8) -> Result<Self> {
        if rank > Self::MAX {
            bail!("Invalid int for Rank: Must be between [0, {}]. Got {rank}", Self::MAX);
        }

        Ok(Self(rank))
    }

    /// The back rank of `team`, where its King and Rooks start.
    ///
    /// [`Team::NoTeam`] has no back rank and maps to rank `1`.
    #[inline(always)]
    pub const fn first(team: Team) -> Self {
        match team {
            Team::Black => Self::EIGHT,
            _ => Self::ONE,
        }
    }

    /// The rank `team`'s Pawns start on.
    #[inline(always)]
    pub const fn second(team: Team) -> Self {
        match team {
            Team::Black => Self::SEVEN,
            _ => Self::TWO,
        }
    }

    /// The rank on which `team`'s Pawns promote.
    #[inline(always)]
    pub const fn last(team: Team) -> Self {
        match team {
            Team::Black => Self::ONE,
            _ => Self::EIGHT,
        }
    }

    /// Parses a rank digit (`'1'` through `'8'`).
    pub fn from_char(rank: char) -> Result<Self> {
        let rank_int = rank
            .to_digit(10)
            .context(format!("Invalid char for Rank: Must be between [1, 8]. Got {rank:?}"))?;

        let rank_int = rank_int
            .checked_sub(1)
            .context(format!("Invalid char for Rank: Must be between [1, 8]. Got {rank:?}"))?;

        Self::new(rank_int as u8)
    }

    /// Obtain the inner value as a `usize`.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        (self.0 + b'1') as char
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.char(), self.0)
    }
}

/// Represents one of eight files on a chess board.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct File(pub(crate) u8);

impl File {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);
    pub const C: Self = Self(2);
    pub const D: Self = Self(3);
    pub const E: Self = Self(4);
    pub const F: Self = Self(5);
    pub const G: Self = Self(6);
    pub const H: Self = Self(7);

    pub const MAX: u8 = 7;

    /// Returns an iterator over all files, from `a` to `h`.
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (0..=Self::MAX).map(Self)
    }

    #[inline(always)]
    pub fn new(file: u8) -> Result<Self> {
        if file > Self::MAX {
            bail!("Invalid int for File: Must be between [0, {}]. Got {file}", Self::MAX);
        }

        Ok(Self(file))
    }

    /// Parses a file letter, ignoring case (`'a'` through `'h'`).
    pub fn from_char(file: char) -> Result<Self> {
        if !file.is_ascii_alphabetic() {
            bail!("Invalid char for File: Must be between [a, h]. Got {file:?}");
        }

        // Zero the letter against `a`, regardless of case
        let file_int = file.to_ascii_lowercase() as u8 - b'a';

        if file_int > Self::MAX {
            bail!("Invalid char for File: Must be between [a, h]. Got {file:?}");
        }

        Self::new(file_int)
    }

    /// Obtain the inner value as a `usize`.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Lowercase letter for this file.
    #[inline(always)]
    pub const fn char(&self) -> char {
        (self.0 + b'a') as char
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.char(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notation_round_trip() {
        for square in Square::iter() {
            assert_eq!(Square::from_uci(&square.to_uci()).unwrap(), square);
            assert_eq!(
                Square::from_uci(&square.to_uci().to_ascii_uppercase()).unwrap(),
                square
            );
        }
    }

    #[test]
    fn test_malformed_notation_is_rejected() {
        for bad in ["", "a", "a9", "i1", "a0", "11", "aa", "c44", " c4", "é1", "4c", "-1"] {
            assert!(Square::from_uci(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_from_coords_bounds() {
        assert_eq!(Square::from_coords(0, 0), Some(Square::A1));
        assert_eq!(Square::from_coords(7, 7), Some(Square::H8));
        assert_eq!(Square::from_coords(8, 7), None);
        assert_eq!(Square::from_coords(7, 8), None);
        assert_eq!(Square::from_coords(-1, 3), None);
        assert_eq!(Square::from_coords(3, -1), None);
    }

    #[test]
    fn test_offsets_and_deltas() {
        let c2: Square = "c2".parse().unwrap();
        let c4: Square = "c4".parse().unwrap();
        assert_eq!(c2.offset(0, 2), Some(c4));
        assert_eq!(c2.rank_delta(c4), 2);
        assert_eq!(c4.rank_delta(c2), -2);
        assert_eq!(Square::E1.file_delta(Square::G1), 2);
        assert_eq!(Square::H8.offset(1, 0), None);
    }

    #[test]
    fn test_square_parity() {
        // a1 and h8 are both dark, a8 and h1 are both light
        assert_eq!(Square::A1.parity(), Square::H8.parity());
        assert_eq!(Square::A8.parity(), Square::H1.parity());
        assert_ne!(Square::A1.parity(), Square::A8.parity());
    }

    #[test]
    fn test_ranks_relative_to_team() {
        assert_eq!(Rank::first(Team::White), Rank::ONE);
        assert_eq!(Rank::first(Team::Black), Rank::EIGHT);
        assert_eq!(Rank::second(Team::Black), Rank::SEVEN);
        assert_eq!(Rank::last(Team::White), Rank::EIGHT);
        assert_eq!(Rank::last(Team::Black), Rank::ONE);
    }
}
