use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::{ByteCursor, LumpName, WadError};

/// Logical grouping of lumps. Everything is `Global` unless it sat between a
/// recognised pair of markers, or came from a single lump file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    #[default]
    Global,
    /// `S_START`..`S_END`
    Sprites,
    /// `F_START`..`F_END`
    Flats,
    /// `C_START`..`C_END`
    Colormaps,
    /// `B_START`..`B_END`, PrBoom extended resources
    Extended,
    /// Lumps loaded from a loose `.lmp` file
    Demos,
    /// `HI_START`..`HI_END`, high resolution replacements
    Hires,
}

/// A named chunk of data in the merged lump directory.
///
/// The bytes are a view in to the archive that contained the lump; the archive
/// buffer stays alive for as long as any `Lump` pointing in to it does.
#[derive(Clone)]
pub struct Lump {
    pub(crate) index: usize,
    pub(crate) namespace: Namespace,
    pub(crate) name: LumpName,
    pub(crate) wad: usize,
    pub(crate) data: Arc<[u8]>,
    pub(crate) range: Range<usize>,
}

impl Lump {
    /// Position in the merged directory
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn name(&self) -> LumpName {
        self.name
    }

    /// Index of the archive this lump came from, in load order
    pub fn wad_handle(&self) -> usize {
        self.wad
    }

    pub fn data(&self) -> &[u8] {
        &self.data[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn cursor(&self) -> ByteCursor<'_> {
        ByteCursor::new(self.data())
    }

    pub fn read_i16(&self, offset: usize) -> Result<i16, WadError> {
        self.cursor().read_i16(offset)
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16, WadError> {
        self.cursor().read_u16(offset)
    }

    pub fn read_i32(&self, offset: usize) -> Result<i32, WadError> {
        self.cursor().read_i32(offset)
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32, WadError> {
        self.cursor().read_u32(offset)
    }
}

impl fmt::Debug for Lump {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Lump {{ index: {}, name: {}, namespace: {:?}, wad: {}, size: {} }}",
            self.index,
            self.name,
            self.namespace,
            self.wad,
            self.len()
        )
    }
}
