//! The blockmap: a grid of 128 map unit cells over the map, each holding the
//! lines that touch it.
//!
//! The `BLOCKMAP` lump is laid out as follows:
//!
//! | Field Size         | Data Type    | Content                               |
//! |--------------------|--------------|---------------------------------------|
//! | 0x00-0x01          | i16          | X origin, in map units                |
//! | 0x02-0x03          | i16          | Y origin, in map units                |
//! | 0x04-0x05          | i16          | Column count                          |
//! | 0x06-0x07          | i16          | Row count                             |
//! | 0x08 + 2 * cells   | u16 per cell | Offset of the cell's list, in u16s    |
//! | ..                 | u16 lists    | `0`, line numbers.., `0xFFFF`         |
//!
//! Cells are stored row major from the bottom left.

use std::collections::TryReserveError;

use log::debug;
use math::{FRACBITS, FixedPoint, FixedVertex};
use thiserror::Error;
use wad::{ByteCursor, ErrorKind};

use crate::LineDef;

/// Map units per cell, as a shift
pub const MAPBLOCKSHIFT: i32 = 7;
/// Map units per cell
pub const MAPBLOCKUNITS: i32 = 1 << MAPBLOCKSHIFT;
const MAPBLOCKMASK: i32 = MAPBLOCKUNITS - 1;

const HEADER_SIZE: usize = 8;
const LIST_END: u16 = 0xFFFF;

#[derive(Debug, Error)]
pub enum BlockmapError {
    #[error("truncated blockmap header: {0} bytes")]
    TruncatedHeader(usize),

    #[error("negative blockmap width {0}")]
    NegativeWidth(i16),

    #[error("negative blockmap height {0}")]
    NegativeHeight(i16),

    #[error("truncated blockmap directory: {cells} cells need {needed} bytes but the lump is {len}")]
    TruncatedDirectory {
        cells: usize,
        needed: usize,
        len: usize,
    },

    #[error("invalid blockmap offset {offset} for cell {cell}")]
    InvalidOffset { cell: usize, offset: usize },

    #[error("line {line} references a vertex that does not exist")]
    InvalidLineVertex { line: usize },

    #[error("allocation failed: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

impl BlockmapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BlockmapError::InvalidLineVertex { .. } => ErrorKind::OutOfRangeReference,
            BlockmapError::OutOfMemory(_) => ErrorKind::ResourceExhaustion,
            _ => ErrorKind::MalformedInput,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Blockmap {
    pub x_origin: FixedPoint,
    pub y_origin: FixedPoint,
    pub columns: usize,
    pub rows: usize,
    /// Line numbers per cell, row major
    blocks: Vec<Vec<u32>>,
}

impl Blockmap {
    /// Decode a `BLOCKMAP` lump. Line numbers are not checked against the map
    /// here, see [`Blockmap::first_invalid_line`].
    pub fn from_lump(data: &[u8]) -> Result<Self, BlockmapError> {
        if data.len() < HEADER_SIZE {
            return Err(BlockmapError::TruncatedHeader(data.len()));
        }
        let cursor = ByteCursor::new(data);
        let read = |offset| {
            cursor
                .read_i16(offset)
                .map_err(|_| BlockmapError::TruncatedHeader(data.len()))
        };
        let x_origin = read(0)?;
        let y_origin = read(2)?;
        let width = read(4)?;
        let height = read(6)?;
        if width < 0 {
            return Err(BlockmapError::NegativeWidth(width));
        }
        if height < 0 {
            return Err(BlockmapError::NegativeHeight(height));
        }

        let columns = width as usize;
        let rows = height as usize;
        let cells = columns * rows;
        let list_start = HEADER_SIZE + cells * 2;
        if list_start > data.len() {
            return Err(BlockmapError::TruncatedDirectory {
                cells,
                needed: list_start,
                len: data.len(),
            });
        }

        // Byte offsets of every list, checked before any are read
        let mut offsets = Vec::new();
        offsets.try_reserve_exact(cells)?;
        for cell in 0..cells {
            let offset = cursor
                .read_u16(HEADER_SIZE + cell * 2)
                .map_err(|_| BlockmapError::InvalidOffset { cell, offset: 0 })?
                as usize
                * 2;
            let after_previous = offsets.last().is_none_or(|prev| offset >= prev + 4);
            if offset < list_start || offset + 4 > data.len() || !after_previous {
                return Err(BlockmapError::InvalidOffset { cell, offset });
            }
            offsets.push(offset);
        }

        let mut blocks = Vec::new();
        blocks.try_reserve_exact(cells)?;
        for (cell, &start) in offsets.iter().enumerate() {
            let end = offsets.get(cell + 1).copied().unwrap_or(data.len());
            let list = ByteCursor::new(&data[start..end]);
            let lines = list
                .records(2)
                .skip(1)
                .filter_map(|word| word.read_u16(0).ok())
                .take_while(|line| *line != LIST_END)
                .map(u32::from);
            let mut block = Vec::new();
            block.try_reserve_exact(list.len() / 2)?;
            block.extend(lines);
            blocks.push(block);
        }

        Ok(Blockmap {
            x_origin: FixedPoint::from(x_origin),
            y_origin: FixedPoint::from(y_origin),
            columns,
            rows,
            blocks,
        })
    }

    /// Build a blockmap for the linedefs of a map
    pub fn build(vertexes: &[FixedVertex], linedefs: &[LineDef]) -> Result<Self, BlockmapError> {
        Self::build_from_lines(vertexes, linedefs.iter().map(|l| (l.v1, l.v2)))
    }

    /// Build a blockmap from lines given as vertex index pairs. The grid
    /// covers every vertex, not only those used by a line.
    ///
    /// Each line is added to every cell it passes through. A line passing
    /// exactly through a cell corner is also added to the neighbouring cells
    /// it touches there. A line lying along a cell edge belongs to the cells
    /// above or to the right of that edge.
    pub fn build_from_lines<I>(vertexes: &[FixedVertex], lines: I) -> Result<Self, BlockmapError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let Some(first) = vertexes.first() else {
            return Ok(Blockmap::default());
        };
        let (mut min, mut max) = (*first, *first);
        for v in vertexes {
            min.x = Ord::min(min.x, v.x);
            min.y = Ord::min(min.y, v.y);
            max.x = Ord::max(max.x, v.x);
            max.y = Ord::max(max.y, v.y);
        }

        let xorg = min.x.raw() >> FRACBITS;
        let yorg = min.y.raw() >> FRACBITS;
        let columns = ((max.x.raw() >> FRACBITS) - xorg + 1 + MAPBLOCKMASK) >> MAPBLOCKSHIFT;
        let rows = ((max.y.raw() >> FRACBITS) - yorg + 1 + MAPBLOCKMASK) >> MAPBLOCKSHIFT;

        let mut grid = Grid::new(columns, rows)?;
        for (line, (v1, v2)) in lines.into_iter().enumerate() {
            let (Some(v1), Some(v2)) = (vertexes.get(v1), vertexes.get(v2)) else {
                return Err(BlockmapError::InvalidLineVertex { line });
            };
            grid.add_line(line as u32, *v1, *v2, xorg, yorg);
        }

        debug!(
            "Built blockmap, {}x{} blocks at {},{}",
            columns, rows, xorg, yorg
        );
        Ok(Blockmap {
            x_origin: FixedPoint::from_int(xorg),
            y_origin: FixedPoint::from_int(yorg),
            columns: columns as usize,
            rows: rows as usize,
            blocks: grid.blocks,
        })
    }

    /// Lines touching the cell at `column`, `row`
    pub fn lines_in_block(&self, column: usize, row: usize) -> Option<&[u32]> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.blocks.get(row * self.columns + column).map(Vec::as_slice)
    }

    /// Cell containing a point, if it is inside the grid
    pub fn block_for_point(&self, point: FixedVertex) -> Option<(usize, usize)> {
        let column = (point.x - self.x_origin).raw() >> (FRACBITS + MAPBLOCKSHIFT);
        let row = (point.y - self.y_origin).raw() >> (FRACBITS + MAPBLOCKSHIFT);
        if column < 0 || row < 0 || column as usize >= self.columns || row as usize >= self.rows {
            return None;
        }
        Some((column as usize, row as usize))
    }

    pub fn blocks(&self) -> &[Vec<u32>] {
        &self.blocks
    }

    /// The first cell and line number that is not below `line_count`
    pub fn first_invalid_line(&self, line_count: usize) -> Option<(usize, u32)> {
        self.blocks.iter().enumerate().find_map(|(cell, lines)| {
            lines
                .iter()
                .find(|l| **l as usize >= line_count)
                .map(|l| (cell, *l))
        })
    }
}

struct Grid {
    columns: i32,
    rows: i32,
    blocks: Vec<Vec<u32>>,
    /// Cells the current line has been added to
    done: Vec<bool>,
}

impl Grid {
    fn new(columns: i32, rows: i32) -> Result<Self, TryReserveError> {
        let cells = columns as usize * rows as usize;
        let mut blocks = Vec::new();
        blocks.try_reserve_exact(cells)?;
        blocks.resize_with(cells, Vec::new);
        let mut done = Vec::new();
        done.try_reserve_exact(cells)?;
        done.resize(cells, false);
        Ok(Grid {
            columns,
            rows,
            blocks,
            done,
        })
    }

    fn add(&mut self, line: u32, row: i32, column: i32) {
        let cell = (row * self.columns + column) as usize;
        if !self.done[cell] {
            self.done[cell] = true;
            self.blocks[cell].push(line);
        }
    }

    fn add_line(&mut self, line: u32, v1: FixedVertex, v2: FixedVertex, xorg: i32, yorg: i32) {
        self.done.fill(false);

        let (x1, y1) = (v1.x.raw() >> FRACBITS, v1.y.raw() >> FRACBITS);
        let (x2, y2) = (v2.x.raw() >> FRACBITS, v2.y.raw() >> FRACBITS);
        let (dx, dy) = (x2 - x1, y2 - y1);
        let vert = dx == 0;
        let horiz = dy == 0;
        let spos = !vert && !horiz && (dx ^ dy) > 0;
        let sneg = !vert && !horiz && (dx ^ dy) < 0;
        let (minx, maxx) = (x1.min(x2), x1.max(x2));
        let (miny, maxy) = (y1.min(y2), y1.max(y2));

        self.add(
            line,
            (y1 - yorg) >> MAPBLOCKSHIFT,
            (x1 - xorg) >> MAPBLOCKSHIFT,
        );
        self.add(
            line,
            (y2 - yorg) >> MAPBLOCKSHIFT,
            (x2 - xorg) >> MAPBLOCKSHIFT,
        );

        // Where the line crosses each column edge
        if !vert {
            for j in 0..self.columns {
                let x = xorg + (j << MAPBLOCKSHIFT);
                let y = (dy as i64 * (x - x1) as i64 / dx as i64) as i32 + y1;
                let yb = (y - yorg) >> MAPBLOCKSHIFT;
                let yp = (y - yorg) & MAPBLOCKMASK;
                if yb < 0 || yb > self.rows - 1 || x < minx || x > maxx {
                    continue;
                }
                self.add(line, yb, j);
                if yp == 0 {
                    if sneg {
                        if yb > 0 && miny < y {
                            self.add(line, yb - 1, j);
                        }
                        if j > 0 && minx < x {
                            self.add(line, yb, j - 1);
                        }
                    } else if spos {
                        if yb > 0 && j > 0 && minx < x {
                            self.add(line, yb - 1, j - 1);
                        }
                    } else if horiz && j > 0 && minx < x {
                        self.add(line, yb, j - 1);
                    }
                } else if j > 0 && minx < x {
                    self.add(line, yb, j - 1);
                }
            }
        }

        // Where the line crosses each row edge
        if !horiz {
            for j in 0..self.rows {
                let y = yorg + (j << MAPBLOCKSHIFT);
                let x = (dx as i64 * (y - y1) as i64 / dy as i64) as i32 + x1;
                let xb = (x - xorg) >> MAPBLOCKSHIFT;
                let xp = (x - xorg) & MAPBLOCKMASK;
                if xb < 0 || xb > self.columns - 1 || y < miny || y > maxy {
                    continue;
                }
                self.add(line, j, xb);
                if xp == 0 {
                    if sneg {
                        if j > 0 && miny < y {
                            self.add(line, j - 1, xb);
                        }
                        if xb > 0 && minx < x {
                            self.add(line, j, xb - 1);
                        }
                    } else if vert {
                        if j > 0 && miny < y {
                            self.add(line, j - 1, xb);
                        }
                    } else if spos && xb > 0 && j > 0 && miny < y {
                        self.add(line, j - 1, xb - 1);
                    }
                } else if j > 0 && miny < y {
                    self.add(line, j - 1, xb);
                }
            }
        }
    }
}
