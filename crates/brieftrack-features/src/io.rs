//! Binary reference-model format.
//!
//! Layout, all little-endian:
//!
//! 1. target size: `i32 width`, `i32 height`
//! 2. feature table: `u64` byte length, then 40-byte records
//!    (`8 × u32` descriptor words, `u16 x`, `u16 y`, `u32 bucket`)
//! 3. for each of the 8192 buckets in order: `u64` byte length, then `u32`
//!    feature indices
//!
//! Loading is all-or-nothing: any truncation, length mismatch or broken
//! index invariant returns an error and no partial model.

use crate::extract::Feature;
use crate::index::{ReferenceIndex, TargetSize};
use crate::pattern::{DESCRIPTOR_WORDS, NUM_BUCKETS};
use crate::Descriptor;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Size of one serialized [`Feature`].
pub const FEATURE_RECORD_BYTES: usize = DESCRIPTOR_WORDS * 4 + 2 + 2 + 4;
const INDEX_BYTES: usize = 4;

#[derive(thiserror::Error, Debug)]
pub enum ModelLoadError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("model truncated while reading {section}")]
    Truncated { section: &'static str },
    #[error("feature table length {bytes} is not a multiple of the {record}-byte record")]
    MisalignedTable { bytes: u64, record: usize },
    #[error("bucket {bucket} length {bytes} is not a multiple of 4")]
    BucketLength { bucket: usize, bytes: u64 },
    #[error("bucket {bucket} references feature {index}, table has {len}")]
    IndexOutOfRange { bucket: usize, index: u32, len: usize },
    #[error("feature {feature} has bucket {stored} but is listed in bucket {bucket}")]
    BucketMismatch {
        feature: usize,
        stored: u16,
        bucket: usize,
    },
    #[error("feature {feature} is not listed in any bucket")]
    FeatureMissing { feature: usize },
    #[error("feature {feature} is listed more than once")]
    FeatureDuplicated { feature: usize },
    #[error("feature {feature} has bucket value {bucket} outside 0..8192")]
    InvalidBucketValue { feature: usize, bucket: u32 },
    #[error("{0} features do not fit 32-bit indices")]
    TooManyFeatures(usize),
}

impl ReferenceIndex {
    /// Load a model file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let index = Self::read_from(BufReader::new(file))
            .inspect_err(|e| log::warn!("model load failed for {}: {e}", path.display()))?;
        let stats = index.stats();
        log::debug!(
            "model loaded from {}: {}x{}, {} features, {} non-empty buckets, largest {}",
            path.display(),
            stats.width,
            stats.height,
            stats.features,
            stats.non_empty_buckets,
            stats.largest_bucket
        );
        Ok(index)
    }

    /// Parse a model from any byte stream.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, ModelLoadError> {
        let mut size_buf = [0u8; 8];
        read_exact(&mut reader, &mut size_buf, "target size")?;
        let size = TargetSize {
            width: i32::from_le_bytes([size_buf[0], size_buf[1], size_buf[2], size_buf[3]]),
            height: i32::from_le_bytes([size_buf[4], size_buf[5], size_buf[6], size_buf[7]]),
        };

        let table_bytes = read_u64(&mut reader, "feature table length")?;
        if table_bytes % FEATURE_RECORD_BYTES as u64 != 0 {
            return Err(ModelLoadError::MisalignedTable {
                bytes: table_bytes,
                record: FEATURE_RECORD_BYTES,
            });
        }
        let raw = read_block(&mut reader, table_bytes, "feature table")?;
        let features = raw
            .chunks_exact(FEATURE_RECORD_BYTES)
            .enumerate()
            .map(|(i, rec)| decode_feature(i, rec))
            .collect::<Result<Vec<_>, _>>()?;
        if u32::try_from(features.len()).is_err() {
            return Err(ModelLoadError::TooManyFeatures(features.len()));
        }

        let mut seen = vec![false; features.len()];
        let mut buckets = Vec::with_capacity(NUM_BUCKETS);
        for b in 0..NUM_BUCKETS {
            let bytes = read_u64(&mut reader, "bucket length")?;
            if bytes % INDEX_BYTES as u64 != 0 {
                return Err(ModelLoadError::BucketLength { bucket: b, bytes });
            }
            let raw = read_block(&mut reader, bytes, "bucket indices")?;
            let mut list = Vec::with_capacity(raw.len() / INDEX_BYTES);
            for chunk in raw.chunks_exact(INDEX_BYTES) {
                let index = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                let feature = index as usize;
                let Some(f) = features.get(feature) else {
                    return Err(ModelLoadError::IndexOutOfRange {
                        bucket: b,
                        index,
                        len: features.len(),
                    });
                };
                if f.bucket as usize != b {
                    return Err(ModelLoadError::BucketMismatch {
                        feature,
                        stored: f.bucket,
                        bucket: b,
                    });
                }
                if std::mem::replace(&mut seen[feature], true) {
                    return Err(ModelLoadError::FeatureDuplicated { feature });
                }
                list.push(index);
            }
            buckets.push(list);
        }
        if let Some(feature) = seen.iter().position(|s| !s) {
            return Err(ModelLoadError::FeatureMissing { feature });
        }

        Ok(Self::from_parts(size, features, buckets))
    }

    /// Serialize in the layout [`ReferenceIndex::read_from`] expects.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), ModelLoadError> {
        let size = self.target_size();
        writer.write_all(&size.width.to_le_bytes())?;
        writer.write_all(&size.height.to_le_bytes())?;

        let table_bytes = (self.features().len() * FEATURE_RECORD_BYTES) as u64;
        writer.write_all(&table_bytes.to_le_bytes())?;
        for f in self.features() {
            writer.write_all(&encode_feature(f))?;
        }

        for list in self.buckets() {
            let bytes = (list.len() * INDEX_BYTES) as u64;
            writer.write_all(&bytes.to_le_bytes())?;
            for idx in list {
                writer.write_all(&idx.to_le_bytes())?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Write a model file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelLoadError> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }
}

fn read_exact<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    section: &'static str,
) -> Result<(), ModelLoadError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ModelLoadError::Truncated { section },
        _ => ModelLoadError::Io(e),
    })
}

fn read_u64<R: Read>(reader: &mut R, section: &'static str) -> Result<u64, ModelLoadError> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf, section)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read exactly `len` bytes without trusting `len` for the allocation.
fn read_block<R: Read>(
    reader: &mut R,
    len: u64,
    section: &'static str,
) -> Result<Vec<u8>, ModelLoadError> {
    let mut buf = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(ModelLoadError::Truncated { section });
    }
    Ok(buf)
}

fn decode_feature(i: usize, rec: &[u8]) -> Result<Feature, ModelLoadError> {
    let u32_at = |off: usize| u32::from_le_bytes([rec[off], rec[off + 1], rec[off + 2], rec[off + 3]]);
    let u16_at = |off: usize| u16::from_le_bytes([rec[off], rec[off + 1]]);

    let mut words = [0u32; DESCRIPTOR_WORDS];
    for (k, w) in words.iter_mut().enumerate() {
        *w = u32_at(k * 4);
    }
    let base = DESCRIPTOR_WORDS * 4;
    let bucket = u32_at(base + 4);
    if bucket as usize >= NUM_BUCKETS {
        return Err(ModelLoadError::InvalidBucketValue { feature: i, bucket });
    }
    Ok(Feature {
        descriptor: Descriptor(words),
        x: u16_at(base),
        y: u16_at(base + 2),
        bucket: bucket as u16,
    })
}

fn encode_feature(f: &Feature) -> [u8; FEATURE_RECORD_BYTES] {
    let mut rec = [0u8; FEATURE_RECORD_BYTES];
    for (k, w) in f.descriptor.words().iter().enumerate() {
        rec[k * 4..k * 4 + 4].copy_from_slice(&w.to_le_bytes());
    }
    let base = DESCRIPTOR_WORDS * 4;
    rec[base..base + 2].copy_from_slice(&f.x.to_le_bytes());
    rec[base + 2..base + 4].copy_from_slice(&f.y.to_le_bytes());
    rec[base + 4..base + 8].copy_from_slice(&(f.bucket as u32).to_le_bytes());
    rec
}
