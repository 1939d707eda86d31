use wad::ByteCursor;

use crate::error::MapError;

/// Split a lump in to fixed size records after skipping `header` bytes, and
/// decode each one. The lump must hold a whole number of records.
pub(crate) fn decode_records<T>(
    lump: &'static str,
    data: &[u8],
    header: usize,
    size: usize,
    mut decode: impl FnMut(usize, ByteCursor<'_>) -> Result<T, MapError>,
) -> Result<Vec<T>, MapError> {
    let body = data
        .get(header..)
        .filter(|body| body.len() % size == 0)
        .ok_or(MapError::MalformedLump {
            lump,
            len: data.len(),
            record_size: size,
        })?;

    let mut out = Vec::new();
    out.try_reserve_exact(body.len() / size)?;
    for (i, record) in ByteCursor::new(body).records(size).enumerate() {
        out.push(decode(i, record)?);
    }
    Ok(out)
}

/// Pass `index` through if it is below `len`
pub(crate) fn check_index(
    lump: &'static str,
    record: usize,
    field: &'static str,
    index: usize,
    len: usize,
) -> Result<usize, MapError> {
    if index < len {
        Ok(index)
    } else {
        Err(MapError::InvalidIndex {
            lump,
            record,
            field,
            index,
            len,
        })
    }
}
