use std::path::Path;
use std::sync::Arc;
use std::{fmt, fs};

use log::{debug, info};

use crate::{ByteCursor, LumpName, Namespace, WadError};

const HEADER_SIZE: usize = 12;
const DIRECTORY_ENTRY_SIZE: usize = 16;
const IGNORED_LUMP: &str = "-IGNORE-";

/// Where an archive sits in the load order, and how it is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WadKind {
    /// The main game data
    Iwad,
    /// A patch WAD loaded over the top of the IWAD
    Pwad,
    /// A loose lump file. The whole file becomes one lump.
    Lump,
}

/// Header which tells us the WAD type and where the data is
///
/// The header structure in the WAD is as follows:
///
/// | Field Size | Data Type    | Content                                              |
/// |------------|--------------|------------------------------------------------------|
/// | 0x00-0x03  | 4 ASCII char | *Must* be an ASCII string (either "IWAD" or "PWAD")  |
/// | 0x04-0x07  | signed int   | The number entries in the directory                  |
/// | 0x08-0x0b  | signed int   | Offset in bytes to the directory in the WAD file     |
///
struct WadHeader {
    /// Will be either `IWAD` for game, or `PWAD` for patch
    wad_type: [u8; 4],
    /// The count of "lumps" of data
    dir_count: usize,
    /// Offset in bytes that the directory starts at
    dir_offset: usize,
}

impl WadHeader {
    fn read(label: &str, cursor: ByteCursor) -> Result<Self, WadError> {
        if cursor.len() < HEADER_SIZE {
            return Err(WadError::TooSmall {
                wad: label.to_string(),
                len: cursor.len(),
            });
        }

        let mut wad_type = [0u8; 4];
        wad_type.copy_from_slice(cursor.bytes(0, 4)?);
        if &wad_type != b"IWAD" && &wad_type != b"PWAD" {
            return Err(WadError::InvalidIdentification {
                wad: label.to_string(),
                ident: wad_type,
            });
        }

        let count = cursor.read_i32(4)?;
        if count == 0 {
            return Err(WadError::Empty {
                wad: label.to_string(),
            });
        }
        if count < 0 {
            return Err(WadError::InvalidLumpCount {
                wad: label.to_string(),
                count,
            });
        }

        let offset = cursor.read_i32(8)?;
        if offset < HEADER_SIZE as i32 {
            return Err(WadError::InvalidDirectoryOffset {
                wad: label.to_string(),
                offset,
            });
        }

        Ok(Self {
            wad_type,
            dir_count: count as usize,
            dir_offset: offset as usize,
        })
    }
}

impl fmt::Debug for WadHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\nWadHeader {{\n  wad_type: {},\n  dir_count: {},\n  dir_offset: {},\n}}",
            String::from_utf8_lossy(&self.wad_type),
            self.dir_count,
            self.dir_offset
        )
    }
}

/// Contains the details for a lump of data: where it starts, the size of it, and the name
///
/// The directory structure in the WAD is as follows:
///
/// | Field Size | Data Type    | Content                                                    |
/// |------------|--------------|------------------------------------------------------------|
/// | 0x00-0x03  | signed int   | Offset value to the start of the lump data in the WAD file |
/// | 0x04-0x07  | signed int   | The size of the lump in bytes                              |
/// | 0x08-0x0f  | 8 ASCII char | ASCII holding the name of the lump                         |
///
#[derive(Clone)]
pub struct WadDirectory {
    /// The offset in bytes where the lump data starts
    pub(crate) lump_offset: usize,
    /// The size in bytes of the lump referenced
    pub(crate) lump_size: usize,
    /// Name for the lump data
    pub(crate) lump_name: LumpName,
    /// Namespace the lump starts out in before markers are processed
    pub(crate) namespace: Namespace,
}

impl WadDirectory {
    pub fn name(&self) -> LumpName {
        self.lump_name
    }

    pub fn offset(&self) -> usize {
        self.lump_offset
    }

    pub fn size(&self) -> usize {
        self.lump_size
    }
}

impl fmt::Debug for WadDirectory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\nWadDirectory {{\n  lump_name: {},\n  lump_size: {},\n  lump_offset: {},\n}}",
            &self.lump_name, self.lump_size, self.lump_offset
        )
    }
}

/// "Where's All (the) Data": contains the WAD in memory, plus an array of directories
/// telling us where each data lump starts
#[derive(Clone)]
pub struct Wad {
    label: String,
    kind: WadKind,
    /// The WAD as an array of bytes read in to memory
    wad_data: Arc<[u8]>,
    /// Tells us where each lump of data is
    wad_dirs: Vec<WadDirectory>,
}

impl fmt::Debug for Wad {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\nWad {{\n  label: {:?},\n  kind: {:?},\n  wad_dirs: {:?},\n}}",
            self.label, self.kind, self.wad_dirs
        )
    }
}

impl Wad {
    /// Read a file fully in to memory and decode it
    pub fn from_path<P: AsRef<Path>>(path: P, kind: WadKind) -> Result<Wad, WadError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| WadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let label = match kind {
            WadKind::Lump => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            _ => path.to_string_lossy().into_owned(),
        };
        info!("Read {} bytes from {:?}", data.len(), path);
        Self::from_bytes(label, data, kind)
    }

    /// Decode an in-memory archive. For `WadKind::Lump` the label is used
    /// to name the single lump: extension stripped, upper-cased, and cut to
    /// 8 characters.
    pub fn from_bytes<L, D>(label: L, data: D, kind: WadKind) -> Result<Wad, WadError>
    where
        L: Into<String>,
        D: Into<Arc<[u8]>>,
    {
        let label = label.into();
        let wad_data: Arc<[u8]> = data.into();

        let wad_dirs = match kind {
            WadKind::Lump => {
                let mut lump_name = LumpName::new(lump_stem(&label)).to_ascii_uppercase();
                if is_texture_metadata(&lump_name) {
                    lump_name = LumpName::new(IGNORED_LUMP);
                }
                vec![WadDirectory {
                    lump_offset: 0,
                    lump_size: wad_data.len(),
                    lump_name,
                    namespace: Namespace::Demos,
                }]
            }
            WadKind::Iwad | WadKind::Pwad => Self::read_directories(&label, &wad_data, kind)?,
        };
        debug!("{}: {} lumps", label, wad_dirs.len());

        Ok(Wad {
            label,
            kind,
            wad_data,
            wad_dirs,
        })
    }

    /// Read a loose lump file, named after the file stem
    pub fn from_lump_path<P: AsRef<Path>>(path: P) -> Result<Wad, WadError> {
        Self::from_path(path, WadKind::Lump)
    }

    /// Wrap a single lump of data as its own archive
    pub fn from_lump(name: &str, data: Vec<u8>) -> Wad {
        let mut lump_name = LumpName::new(name);
        if is_texture_metadata(&lump_name) {
            lump_name = LumpName::new(IGNORED_LUMP);
        }
        Wad {
            label: name.to_string(),
            kind: WadKind::Lump,
            wad_dirs: vec![WadDirectory {
                lump_offset: 0,
                lump_size: data.len(),
                lump_name,
                namespace: Namespace::Demos,
            }],
            wad_data: data.into(),
        }
    }

    fn read_directories(
        label: &str,
        data: &[u8],
        kind: WadKind,
    ) -> Result<Vec<WadDirectory>, WadError> {
        let cursor = ByteCursor::new(data);
        let header = WadHeader::read(label, cursor)?;
        debug!("{}: {:?}", label, header);

        let dir_len = header
            .dir_count
            .checked_mul(DIRECTORY_ENTRY_SIZE)
            .and_then(|len| len.checked_add(header.dir_offset));
        if dir_len.is_none_or(|end| end > data.len()) {
            return Err(WadError::DirectoryOutOfBounds {
                wad: label.to_string(),
                offset: header.dir_offset,
                count: header.dir_count,
                len: data.len(),
            });
        }

        // An IWAD loaded as a patch must not replace the real texture tables
        let ignore_textures = kind != WadKind::Iwad && &header.wad_type == b"IWAD";

        let mut dirs = Vec::new();
        dirs.try_reserve_exact(header.dir_count)?;
        for i in 0..header.dir_count {
            let entry = cursor.sub(header.dir_offset + i * DIRECTORY_ENTRY_SIZE, 16)?;
            let offset = entry.read_i32(0)?;
            let size = entry.read_i32(4)?;
            let mut lump_name = entry.read_name(8)?;

            let end = offset as i64 + size as i64;
            if offset < 0 || size < 0 || end > data.len() as i64 {
                return Err(WadError::LumpOutOfBounds {
                    wad: label.to_string(),
                    name: lump_name.to_string(),
                    offset: offset as i64,
                    size: size as i64,
                    len: data.len(),
                });
            }

            if ignore_textures && is_texture_metadata(&lump_name) {
                debug!("{}: renamed {} to {}", label, lump_name, IGNORED_LUMP);
                lump_name = LumpName::new(IGNORED_LUMP);
            }

            dirs.push(WadDirectory {
                lump_offset: offset as usize,
                lump_size: size as usize,
                lump_name,
                namespace: Namespace::Global,
            });
        }
        Ok(dirs)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> WadKind {
        self.kind
    }

    pub fn data(&self) -> &Arc<[u8]> {
        &self.wad_data
    }

    pub fn directories(&self) -> &[WadDirectory] {
        &self.wad_dirs
    }

    pub fn lump_count(&self) -> usize {
        self.wad_dirs.len()
    }

    /// The bytes of the lump at `index` in this archive's own directory
    pub fn lump_data(&self, index: usize) -> Option<&[u8]> {
        self.wad_dirs
            .get(index)
            .map(|d| &self.wad_data[d.lump_offset..d.lump_offset + d.lump_size])
    }
}

fn is_texture_metadata(name: &LumpName) -> bool {
    name.eq_ignore_case(&LumpName::new("TEXTURE1")) || name.eq_ignore_case(&LumpName::new("PNAMES"))
}

fn lump_stem(label: &str) -> &str {
    let file = label.rsplit(['/', '\\']).next().unwrap_or(label);
    match file.rfind('.') {
        Some(0) | None => file,
        Some(dot) => &file[..dot],
    }
}
