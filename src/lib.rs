// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A soundboard triggered over UDP.
//!
//! Clips are decoded into memory at startup ([`clips`]), triggered by text
//! datagrams ([`control`]) and mixed into a stereo output stream ([`mixer`],
//! [`audio`]). [`board`] wires the pieces together.

pub mod audio;
pub mod board;
pub mod clips;
pub mod config;
pub mod control;
pub mod mixer;

#[cfg(test)]
mod testutil;
