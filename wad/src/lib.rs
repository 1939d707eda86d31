//! This crate contains the structures and tools for reading WAD files and
//! merging several of them in to one directory of lumps.
//!
//! The structure of a WAD is this:
//!
//! ```text,ignore
//!                        <───── 32 bits ──────>
//!                        ┌────────────────────┐
//!             ┌──── 0x00 |  ASCII WAD Type    | 0x03
//!             |          | ────────────────── |
//!     Header ─┤     0x04 | # of directories   | 0x07
//!             |          | ────────────────── |
//!             └──── 0x08 | offset to listing ───0x0B ──┐
//!             ┌───────── | ────────────────── |        |
//!             |     0x0C | ┌────────────────┐ |        |
//!             |          | |   Lump Bytes   |<─────┐   |
//!     Lumps ──┤          | |       .        | |    |   |
//!             |          | └────────────────┘ |    |   |
//!             |          |         .          |    |   |
//!             └───────── |         .          |    |   |
//!             ┌───────── | ┌────────────────┐<─────────┘
//!             |          | |   Lump Offset  |──────┘
//!             |          | |----------------| |
//!  Directory ─┤          | |   Lump Size    | |
//!     List    |          | |----------------| |
//!             |          | |   Lump Name    | |
//!             |          | └────────────────┘ |
//!             |          |         .          |
//!             |          |         .          |
//!             |          |         .          |
//!             └───────── └────────────────────┘
//! ```

pub use crate::catalog::*;
pub use crate::cursor::*;
pub use crate::error::*;
pub use crate::lump::*;
pub use crate::name::*;
/// Bring only the WAD structs down to root level
pub use crate::wad::*;

/// The merged lump directory built from several WADs
pub mod catalog;
/// Bounds checked reads of fixed layout records
pub mod cursor;
pub mod error;
/// A Lump is a chunk of data that starts at an offset in the WAD, and ends
/// at a location that is `sizeof<record-in-lump> * num-of-entries`
pub mod lump;
pub mod name;
/// The WAD structure and parser
pub mod wad;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
