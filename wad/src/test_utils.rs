//! Helpers for building WAD files in memory

/// Assembles a WAD: header, then lump data in order, then the directory.
#[derive(Debug, Clone)]
pub struct WadBuilder {
    ident: [u8; 4],
    lumps: Vec<(String, Vec<u8>)>,
}

impl WadBuilder {
    pub fn iwad() -> Self {
        Self {
            ident: *b"IWAD",
            lumps: Vec::new(),
        }
    }

    pub fn pwad() -> Self {
        Self {
            ident: *b"PWAD",
            lumps: Vec::new(),
        }
    }

    pub fn lump(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.lumps.push((name.to_string(), data.into()));
        self
    }

    /// A zero length lump
    pub fn marker(self, name: &str) -> Self {
        self.lump(name, Vec::new())
    }

    pub fn build(&self) -> Vec<u8> {
        let data_len: usize = self.lumps.iter().map(|(_, d)| d.len()).sum();
        let dir_offset = 12 + data_len;

        let mut out = Vec::with_capacity(dir_offset + self.lumps.len() * 16);
        out.extend_from_slice(&self.ident);
        out.extend_from_slice(&(self.lumps.len() as i32).to_le_bytes());
        out.extend_from_slice(&(dir_offset as i32).to_le_bytes());

        let mut offsets = Vec::with_capacity(self.lumps.len());
        for (_, data) in &self.lumps {
            offsets.push(out.len());
            out.extend_from_slice(data);
        }

        for ((name, data), offset) in self.lumps.iter().zip(offsets) {
            out.extend_from_slice(&(offset as i32).to_le_bytes());
            out.extend_from_slice(&(data.len() as i32).to_le_bytes());
            let mut raw = [0u8; 8];
            for (dst, src) in raw.iter_mut().zip(name.bytes()) {
                *dst = src;
            }
            out.extend_from_slice(&raw);
        }
        out
    }
}

/// Little-endian record writer for building lump contents
#[derive(Debug, Default, Clone)]
pub struct LumpWriter {
    data: Vec<u8>,
}

impl LumpWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn i16(mut self, value: i16) -> Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u16(mut self, value: u16) -> Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i32(mut self, value: i32) -> Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// An 8 byte NUL padded name
    pub fn name(mut self, name: &str) -> Self {
        let mut raw = [0u8; 8];
        for (dst, src) in raw.iter_mut().zip(name.bytes()) {
            *dst = src;
        }
        self.data.extend_from_slice(&raw);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}
