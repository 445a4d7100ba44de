use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crc32fast::Hasher;

use crate::error::{Error, ErrorKind, Result};
use crate::property::PropertyIndex;
use crate::property::index::PropertyState;

const MAGIC: [u8; 4] = *b"ZMBI";
const VERSION: u32 = 1;

/// One property's state as read back from disk, paired with the
/// configuration values needed to reconstruct its `PropertyIndex`.
pub struct LoadedProperty {
    pub name: String,
    pub pool_block_capacity: usize,
    pub pool_count_cap: u32,
    pub state: PropertyState,
}

/// Writes every property's dictionary and pools to one file: a small
/// fixed header (magic, version, the index-wide `reverse` flag),
/// length-prefixed per-property records, and a trailing CRC32 over the
/// whole payload. Written to a temp path and renamed into place so a
/// crash mid-write never corrupts an existing index.
pub fn save(path: &Path, reverse: bool, properties: &[&PropertyIndex]) -> Result<()> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&(properties.len() as u32).to_le_bytes());

    for property in properties {
        let guard = property.snapshot();
        let name_bytes = property.name.as_bytes();
        payload.extend_from_slice(&(name_bytes.len() as u32).to_le_bytes());
        payload.extend_from_slice(name_bytes);
        payload.extend_from_slice(&(property.pool_block_capacity() as u64).to_le_bytes());
        payload.extend_from_slice(&property.pool_count_cap().to_le_bytes());

        let encoded = bincode::serialize(&*guard)
            .map_err(|err| Error::new(ErrorKind::Internal, err.to_string()))?;
        payload.extend_from_slice(&(encoded.len() as u64).to_le_bytes());
        payload.extend_from_slice(&encoded);
    }

    let mut hasher = Hasher::new();
    hasher.update(&payload);
    let checksum = hasher.finalize();

    let mut file_bytes = Vec::with_capacity(payload.len() + 13);
    file_bytes.extend_from_slice(&MAGIC);
    file_bytes.extend_from_slice(&VERSION.to_le_bytes());
    file_bytes.push(reverse as u8);
    file_bytes.extend_from_slice(&payload);
    file_bytes.extend_from_slice(&checksum.to_le_bytes());

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(&file_bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn load(path: &Path) -> Result<(bool, Vec<LoadedProperty>)> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    if bytes.len() < 4 + 4 + 1 + 4 {
        return Err(Error::new(ErrorKind::CorruptIndex, "file too small to hold a header"));
    }
    if bytes[0..4] != MAGIC {
        return Err(Error::new(ErrorKind::CorruptIndex, "bad magic bytes"));
    }
    let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    if version != VERSION {
        return Err(Error::new(
            ErrorKind::CorruptIndex,
            format!("unsupported index version {version}"),
        ));
    }
    let reverse = bytes[8] != 0;

    let payload_end = bytes.len() - 4;
    let payload = &bytes[9..payload_end];
    let stored_checksum = u32::from_le_bytes(bytes[payload_end..].try_into().unwrap());

    let mut hasher = Hasher::new();
    hasher.update(payload);
    if hasher.finalize() != stored_checksum {
        return Err(Error::new(ErrorKind::CorruptIndex, "checksum mismatch"));
    }

    let mut reader = ByteReader::new(payload);
    let property_count = reader.read_u32()? as usize;
    let mut properties = Vec::with_capacity(property_count);
    for _ in 0..property_count {
        let name_len = reader.read_u32()? as usize;
        let name = String::from_utf8(reader.read_bytes(name_len)?.to_vec())
            .map_err(|err| Error::new(ErrorKind::CorruptIndex, err.to_string()))?;
        let pool_block_capacity = reader.read_u64()? as usize;
        let pool_count_cap = reader.read_u32()?;
        let encoded_len = reader.read_u64()? as usize;
        let encoded = reader.read_bytes(encoded_len)?;
        let state: PropertyState = bincode::deserialize(encoded)
            .map_err(|err| Error::new(ErrorKind::CorruptIndex, err.to_string()))?;

        properties.push(LoadedProperty {
            name,
            pool_block_capacity,
            pool_count_cap,
            state,
        });
    }

    Ok((reverse, properties))
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(Error::new(ErrorKind::CorruptIndex, "truncated record"));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_bytes(4)?.try_into().unwrap()))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_bytes(8)?.try_into().unwrap()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropertyConfig;
    use crate::types::hash_term;
    use crate::types::DocId;

    #[test]
    fn round_trips_a_single_property_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.zmb");

        let config = PropertyConfig::new("title", 4096);
        let property = PropertyIndex::new(&config, 8, false);
        let term = hash_term("rust");
        property.append(term, DocId::new(1), 3).unwrap();
        property.append(term, DocId::new(2), 5).unwrap();

        save(&path, false, &[&property]).unwrap();
        let (reverse, loaded) = load(&path).unwrap();
        assert!(!reverse);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "title");
        assert_eq!(loaded[0].state.dictionary.term_count(), 1);
    }

    #[test]
    fn rejects_a_file_with_a_flipped_byte() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.zmb");

        let config = PropertyConfig::new("title", 4096);
        let property = PropertyIndex::new(&config, 8, false);
        property.append(hash_term("rust"), DocId::new(1), 1).unwrap();
        save(&path, false, &[&property]).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        let err = load(&path).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CorruptIndex);
    }
}
