//! Channel data sources.
//!
//! A channel source presents one scan's data as named numeric arrays,
//! independent of the underlying file format. Two variants exist:
//!
//! - [`SpecChannels`]: fully implemented, backed by a parsed SPEC file
//! - [`Hdf5Channels`]: declared but unimplemented; every operation reports
//!   the missing capability instead of pretending to work

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ScanError;
use crate::specfile::SpecFile;

/// Channel label to data column, ordered by label for deterministic
/// iteration.
pub type ChannelMap = BTreeMap<String, Vec<f64>>;

/// Named access to the channels of one scan.
pub trait ChannelSource {
    /// All channels of a scan, keyed by label.
    ///
    /// Guarantee: one entry per label, and every column has the scan's
    /// number of acquisition points. Lookup failures propagate from the
    /// underlying format layer unmodified.
    fn channels(&self, scan: u32) -> Result<ChannelMap, ScanError>;

    /// One channel by label, equal to indexing the [`ChannelSource::channels`]
    /// map.
    fn channel(&self, name: &str, scan: u32) -> Result<Vec<f64>, ScanError> {
        let mut map = self.channels(scan)?;
        map.remove(name).ok_or_else(|| ScanError::ChannelNotFound {
            channel: name.to_string(),
            scan,
        })
    }
}

/// Channel source backed by a parsed SPEC file.
///
/// The file is parsed once at construction; repeated channel lookups reuse
/// the in-memory scans.
#[derive(Debug, Clone)]
pub struct SpecChannels {
    file: SpecFile,
}

impl SpecChannels {
    /// Open and parse a SPEC file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        Ok(Self {
            file: SpecFile::open(path)?,
        })
    }

    /// Wrap an already-parsed file.
    pub fn from_file(file: SpecFile) -> Self {
        Self { file }
    }

    /// The underlying parsed file.
    pub fn file(&self) -> &SpecFile {
        &self.file
    }
}

impl ChannelSource for SpecChannels {
    fn channels(&self, scan: u32) -> Result<ChannelMap, ScanError> {
        let scan = self.file.scan_by_number(scan)?;
        let mut map = ChannelMap::new();
        for (idx, label) in scan.labels().iter().enumerate() {
            let column = scan.rows().iter().map(|row| row[idx]).collect();
            map.insert(label.clone(), column);
        }
        Ok(map)
    }
}

/// Channel source for hierarchical data files.
///
/// The variant exists so call sites can already be written against
/// [`ChannelSource`]; until a real adapter lands, every operation reports
/// the capability as not implemented.
#[derive(Debug, Clone)]
pub struct Hdf5Channels {
    path: PathBuf,
}

impl Hdf5Channels {
    /// Record the target file. No I/O happens here.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChannelSource for Hdf5Channels {
    fn channels(&self, _scan: u32) -> Result<ChannelMap, ScanError> {
        Err(ScanError::not_implemented("HDF5 channel source"))
    }
}
