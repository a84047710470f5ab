//! Block-device bridge.
//!
//! Host-side model of sector-addressed storage. The image lives in memory, optionally loaded
//! from a backing file at initialization and written back at finalization. Out-of-range or
//! malformed requests from the design are answered with "no data" and recorded; any recorded
//! request fails the bridge at finalization.

use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::traits::{Bridge, BridgeKind, BridgeResult};
use crate::common::BridgeError;
use crate::config::BlockDeviceConfig;

/// Block-device bridge state.
#[derive(Debug, Clone)]
pub struct BlockDeviceBridge {
    /// Bridge name.
    name: String,
    /// In-memory disk image, a whole number of sectors long after `init`.
    disk_image: Vec<u8>,
    /// Bytes per sector.
    sector_size: usize,
    /// Minimum capacity in sectors.
    min_sectors: u64,
    /// File the image is loaded from.
    backing: Option<PathBuf>,
    /// Write a modified image back to `backing` at finalization.
    write_back: bool,
    /// Image modified since it was loaded.
    dirty: bool,
    /// Sector reads served.
    reads: u64,
    /// Sector writes accepted.
    writes: u64,
    /// Rejected requests, in arrival order.
    errors: Vec<String>,
}

impl BlockDeviceBridge {
    /// Creates an empty, zero-filled device of `sectors` sectors.
    ///
    /// # Arguments
    ///
    /// * `name` - Bridge name.
    /// * `sectors` - Capacity in sectors.
    /// * `sector_size` - Bytes per sector; must be non-zero.
    pub fn new(name: impl Into<String>, sectors: u64, sector_size: usize) -> Self {
        Self {
            name: name.into(),
            disk_image: Vec::new(),
            sector_size,
            min_sectors: sectors,
            backing: None,
            write_back: false,
            dirty: false,
            reads: 0,
            writes: 0,
            errors: Vec::new(),
        }
    }

    /// Creates a block device from its configuration entry.
    pub fn from_config(config: &BlockDeviceConfig) -> Self {
        let mut bridge = Self::new(config.name.clone(), config.sectors, config.sector_size)
            .with_write_back(config.write_back);
        if let Some(image) = &config.image {
            bridge = bridge.with_image(image);
        }
        bridge
    }

    /// Loads the image from `path` at initialization.
    #[must_use]
    pub fn with_image(mut self, path: impl AsRef<Path>) -> Self {
        self.backing = Some(path.as_ref().to_path_buf());
        self
    }

    /// Writes a modified image back to its file at finalization.
    #[must_use]
    pub const fn with_write_back(mut self, write_back: bool) -> Self {
        self.write_back = write_back;
        self
    }

    /// Replaces the disk image with `data`.
    ///
    /// The image is padded to a whole number of sectors at the next `init`.
    pub fn load(&mut self, data: Vec<u8>) {
        self.disk_image = data;
        self.dirty = false;
    }

    /// Capacity in sectors.
    pub fn sectors(&self) -> u64 {
        if self.sector_size == 0 {
            return 0;
        }
        (self.disk_image.len() / self.sector_size) as u64
    }

    /// Bytes per sector.
    pub const fn sector_size(&self) -> usize {
        self.sector_size
    }

    /// The whole disk image.
    pub fn image(&self) -> &[u8] {
        &self.disk_image
    }

    /// Sector reads served so far.
    pub const fn reads(&self) -> u64 {
        self.reads
    }

    /// Sector writes accepted so far.
    pub const fn writes(&self) -> u64 {
        self.writes
    }

    /// Requests rejected so far.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Reads one sector.
    ///
    /// # Returns
    ///
    /// The sector contents, or `None` if `lba` is past the end of the device.
    pub fn read_sector(&mut self, lba: u64) -> Option<Vec<u8>> {
        let Some(range) = self.sector_range(lba) else {
            self.reject(format!("read of sector {lba} beyond capacity {}", self.sectors()));
            return None;
        };
        self.reads += 1;
        Some(self.disk_image[range].to_vec())
    }

    /// Writes one sector.
    ///
    /// # Returns
    ///
    /// `true` if the write was accepted; `false` if `lba` is out of range or `data` is not
    /// exactly one sector long.
    pub fn write_sector(&mut self, lba: u64, data: &[u8]) -> bool {
        if data.len() != self.sector_size {
            self.reject(format!(
                "write of {} bytes to sector {lba}, expected {}",
                data.len(),
                self.sector_size
            ));
            return false;
        }
        let Some(range) = self.sector_range(lba) else {
            self.reject(format!("write of sector {lba} beyond capacity {}", self.sectors()));
            return false;
        };
        self.disk_image[range].copy_from_slice(data);
        self.writes += 1;
        self.dirty = true;
        true
    }

    /// Byte range of sector `lba`, if it exists.
    fn sector_range(&self, lba: u64) -> Option<std::ops::Range<usize>> {
        let start = usize::try_from(lba).ok()?.checked_mul(self.sector_size)?;
        let end = start.checked_add(self.sector_size)?;
        (end <= self.disk_image.len() && self.sector_size > 0).then_some(start..end)
    }

    /// Records a rejected request.
    fn reject(&mut self, reason: String) {
        warn!(bridge = %self.name, "{reason}");
        self.errors.push(reason);
    }
}

impl Bridge for BlockDeviceBridge {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BridgeKind {
        BridgeKind::BlockDevice
    }

    fn init(&mut self) -> Result<(), BridgeError> {
        if self.sector_size == 0 {
            return Err(BridgeError::Invalid(format!(
                "block device `{}` has a zero sector size",
                self.name
            )));
        }
        if let Some(path) = &self.backing {
            self.disk_image = fs::read(path).map_err(|source| BridgeError::Io {
                path: path.clone(),
                source,
            })?;
        }

        let min_len = usize::try_from(self.min_sectors)
            .ok()
            .and_then(|sectors| sectors.checked_mul(self.sector_size))
            .ok_or_else(|| {
                BridgeError::Invalid(format!(
                    "block device `{}` capacity of {} sectors is too large",
                    self.name, self.min_sectors
                ))
            })?;
        let len = self.disk_image.len().max(min_len).next_multiple_of(self.sector_size);
        self.disk_image.resize(len, 0);

        self.reads = 0;
        self.writes = 0;
        self.dirty = false;
        self.errors.clear();
        debug!(bridge = %self.name, sectors = self.sectors(), "block device ready");
        Ok(())
    }

    fn finalize(&mut self) -> BridgeResult {
        if self.dirty && self.write_back {
            if let Some(path) = &self.backing {
                if let Err(err) = fs::write(path, &self.disk_image) {
                    return BridgeResult::Failed(format!(
                        "failed to write image back to `{}`: {err}",
                        path.display()
                    ));
                }
                self.dirty = false;
            }
        }
        match self.errors.as_slice() {
            [] => BridgeResult::Passed,
            [first, ..] => BridgeResult::Failed(format!(
                "{} rejected request(s), first: {first}",
                self.errors.len()
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
