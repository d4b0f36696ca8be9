//! Compilation cache.
//!
//! Maps a body to its encoded instruction stream. Records live in a
//! concurrent map and, when a directory is configured, one file per body.
//!
//! Record layout: magic `ARGB`, format version (BER), the key (file and body
//! as length-prefixed UTF-8, fingerprint as BER), instruction count (BER),
//! then the encoded instructions. Record files are named by a hash of the
//! key, so the stored key is checked on every load.

use argbind_ast::Body;
use argbind_binder::BinderOptions;
use argbind_core::collections::fx_hash;
use argbind_ir::serialize::Decoder;
use argbind_ir::varint::write_ber;
use argbind_ir::{decode_instruction, encode_instruction, DecodeError, Instruction, FORMAT_VERSION};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub const RECORD_MAGIC: &[u8; 4] = b"ARGB";

/// Identifies one body: where it lives plus a fingerprint of its AST and of
/// the binder options it compiles under, so an edited body or a changed
/// option never hits a stale record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub file: String,
    pub body: String,
    pub fingerprint: u64,
}

impl CacheKey {
    pub fn new(file: &str, body: &Body, options: BinderOptions) -> Self {
        let fingerprint = serde_json::to_string(body)
            .map(|json| fx_hash(&(json, options.local_only)))
            .unwrap_or_default();
        Self {
            file: file.to_string(),
            body: body.name().to_string(),
            fingerprint,
        }
    }

    fn file_name(&self) -> String {
        format!("{:016x}.argb", fx_hash(self))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("not a cache record")]
    BadMagic,
    #[error("record format version {found}, expected {}", FORMAT_VERSION)]
    VersionMismatch { found: u32 },
    #[error("record declares {expected} instructions but holds more")]
    TrailingBytes { expected: usize },
    #[error("record belongs to '{found}'")]
    KeyMismatch { found: String },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("cache I/O on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Encode a complete cache record.
pub fn encode_record(key: &CacheKey, stream: &[Instruction]) -> Vec<u8> {
    let mut out = Vec::with_capacity(24 + key.file.len() + key.body.len() + stream.len() * 4);
    out.extend_from_slice(RECORD_MAGIC);
    write_ber(&mut out, u64::from(FORMAT_VERSION));
    for text in [&key.file, &key.body] {
        write_ber(&mut out, text.len() as u64);
        out.extend_from_slice(text.as_bytes());
    }
    write_ber(&mut out, key.fingerprint);
    write_ber(&mut out, stream.len() as u64);
    for instruction in stream {
        encode_instruction(instruction, &mut out);
    }
    out
}

/// Decode a complete cache record into the key it was written for and its
/// stream. Any failure invalidates the whole record.
pub fn decode_record(bytes: &[u8]) -> Result<(CacheKey, Vec<Instruction>), CacheError> {
    let mut dec = Decoder::new(bytes, 0);
    if !dec.expect_bytes(RECORD_MAGIC)? {
        return Err(CacheError::BadMagic);
    }
    let version = dec.read_u32()?;
    if version != FORMAT_VERSION {
        return Err(CacheError::VersionMismatch { found: version });
    }
    let key = CacheKey {
        file: dec.read_string()?,
        body: dec.read_string()?,
        fingerprint: dec.read_ber()?,
    };
    let count = dec.read_len()?;
    // Every instruction takes at least three bytes.
    let mut stream = Vec::with_capacity(count.min(dec.remaining() / 3));
    for _ in 0..count {
        stream.push(decode_instruction(&mut dec)?);
    }
    if dec.remaining() != 0 {
        return Err(CacheError::TrailingBytes { expected: count });
    }
    Ok((key, stream))
}

/// Decode a record that must belong to `key`.
fn decode_for(key: &CacheKey, bytes: &[u8]) -> Result<Vec<Instruction>, CacheError> {
    let (found, stream) = decode_record(bytes)?;
    if found != *key {
        return Err(CacheError::KeyMismatch {
            found: format!("{}:{}", found.file, found.body),
        });
    }
    Ok(stream)
}

pub struct CompilationCache {
    records: DashMap<CacheKey, Vec<u8>>,
    dir: Option<PathBuf>,
}

impl CompilationCache {
    pub fn in_memory() -> Self {
        Self {
            records: DashMap::new(),
            dir: None,
        }
    }

    /// A cache that also persists records under `dir`, creating it if needed.
    pub fn persistent(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        Ok(Self {
            records: DashMap::new(),
            dir: Some(dir),
        })
    }

    /// Where the record for `key` is persisted, if this cache persists.
    pub fn record_path(&self, key: &CacheKey) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(key.file_name()))
    }

    /// The decoded stream for `key`. `Ok(None)` is a plain miss; an error
    /// means a record exists but is unusable and should be evicted.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Vec<Instruction>>, CacheError> {
        if let Some(record) = self.records.get(key) {
            trace!(body = %key.body, "cache hit (memory)");
            return decode_for(key, record.value()).map(Some);
        }
        let Some(path) = self.record_path(key) else {
            return Ok(None);
        };
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&path, e)),
        };
        let stream = decode_for(key, &bytes)?;
        trace!(body = %key.body, path = %path.display(), "cache hit (disk)");
        self.records.insert(key.clone(), bytes);
        Ok(Some(stream))
    }

    /// Store the record for `stream`, replacing any previous one.
    pub fn insert(&self, key: CacheKey, stream: &[Instruction]) -> Result<(), CacheError> {
        let record = encode_record(&key, stream);
        if let Some(path) = self.record_path(&key) {
            std::fs::write(&path, &record).map_err(|e| CacheError::io(&path, e))?;
        }
        debug!(body = %key.body, bytes = record.len(), "cached");
        self.records.insert(key, record);
        Ok(())
    }

    /// Drop the record for `key` from memory and disk.
    pub fn evict(&self, key: &CacheKey) {
        self.records.remove(key);
        if let Some(path) = self.record_path(key) {
            let _ = std::fs::remove_file(path);
        }
    }

    /// The raw record held in memory for `key`.
    pub fn raw_record(&self, key: &CacheKey) -> Option<Vec<u8>> {
        self.records.get(key).map(|record| record.value().clone())
    }

    /// Replace the in-memory record for `key` without validating it.
    pub fn insert_raw(&self, key: CacheKey, record: Vec<u8>) {
        self.records.insert(key, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
