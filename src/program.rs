// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Textual Intcode program images
//!
//! A program is a single line of comma-separated decimal integers, with an optional trailing
//! newline. Whitespace around each entry is ignored.

use std::ops::Deref;
use std::str::FromStr;

use crate::Engine;
use crate::error::ProgramError;

/// A parsed Intcode program, ready to be loaded into any number of [Engine]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program(Box<[i64]>);

impl Program {
    /// Parse `text` as a program image
    ///
    /// # Example
    ///
    /// ```
    /// use intcode_vm::program::Program;
    /// let program = Program::parse("1,0,0,3,99\n").unwrap();
    /// assert_eq!(&program[..], &[1, 0, 0, 3, 99]);
    /// ```
    pub fn parse(text: &str) -> Result<Self, ProgramError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ProgramError::Empty);
        }
        text.split(',')
            .map(str::trim)
            .enumerate()
            .map(|(index, token)| {
                token.parse().map_err(|source| ProgramError::InvalidInt {
                    index,
                    token: token.to_owned(),
                    source,
                })
            })
            .collect::<Result<Box<[i64]>, _>>()
            .map(Self)
    }

    /// Build a fresh [Engine] with this program loaded into its memory
    pub fn load(&self) -> Engine {
        Engine::new(self.0.iter().copied())
    }
}

impl FromStr for Program {
    type Err = ProgramError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Deref for Program {
    type Target = [i64];
    fn deref(&self) -> &[i64] {
        &self.0
    }
}

impl From<Vec<i64>> for Program {
    fn from(code: Vec<i64>) -> Self {
        Self(code.into_boxed_slice())
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = i64;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, i64>>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}
