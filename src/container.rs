//! High-level [`Container`] API: the surface the CLI drives.
//!
//! ```no_run
//! use std::fs::File;
//! use xnbdec::container::{Container, ExportOptions};
//!
//! let cont = Container::read(File::open("explosion.xnb")?)?;
//! print!("{cont}");
//! for result in cont.export_all(&ExportOptions::new("explosion")) {
//!     let path = result.outcome?;
//!     println!("wrote {}", path.display());
//! }
//! cont.release();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Layout
//! ```text
//! header
//! type_reader_count:VarInt   type_reader[count]
//! shared_resource_count:VarInt
//! primary_type_index:VarInt  [payload]
//! { type_index:VarInt [payload] } x shared_resource_count
//! ```
//!
//! A type index of `0` is an empty slot; `n` selects type reader `n - 1`.
//! Decoding is a single forward pass.  On any error the partially built
//! objects are dropped with the stack frame and no container is returned.

use serde::Serialize;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::error::{Result, XnbError};
use crate::header::XnbHeader;
use crate::object::{read_object, XnbObject};
use crate::type_reader::{read_type_readers, resolve_index, write_type_readers, TypeReaderDescriptor};
use crate::varint::{read_7bit_encoded, write_7bit_encoded};

// ── ExportOptions ─────────────────────────────────────────────────────────────

/// Output naming for [`Container::export_all`].
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Base file name, without extension.
    pub basename:      PathBuf,
    /// Directory prepended to every output path.
    pub output_prefix: Option<PathBuf>,
}

impl ExportOptions {
    pub fn new<P: Into<PathBuf>>(basename: P) -> Self {
        Self { basename: basename.into(), output_prefix: None }
    }

    pub fn with_prefix<P: Into<PathBuf>>(mut self, prefix: P) -> Self {
        self.output_prefix = Some(prefix.into());
        self
    }

    fn base(&self) -> PathBuf {
        match &self.output_prefix {
            Some(dir) => dir.join(&self.basename),
            None      => self.basename.clone(),
        }
    }

    /// Base path (no extension) for the primary asset.
    pub fn primary_base(&self) -> PathBuf {
        self.base()
    }

    /// Base path (no extension) for shared slot `slot` (0-based); names
    /// are numbered from 1.
    pub fn shared_base(&self, slot: usize) -> PathBuf {
        let mut name = self.base().into_os_string();
        name.push(format!("_shared_{}", slot + 1));
        PathBuf::from(name)
    }
}

// ── ExportResult ──────────────────────────────────────────────────────────────

/// Which slot an export result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Primary,
    /// 0-based shared resource position.
    Shared(usize),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Primary   => write!(f, "primary asset"),
            Slot::Shared(i) => write!(f, "shared resource {}", i + 1),
        }
    }
}

#[derive(Debug)]
pub struct ExportResult {
    pub slot:    Slot,
    pub outcome: Result<PathBuf>,
}

// ── Container ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub header:           XnbHeader,
    pub type_readers:     Vec<TypeReaderDescriptor>,
    pub primary:          Option<XnbObject>,
    pub shared_resources: Vec<Option<XnbObject>>,
}

impl Container {
    /// Assemble an uncompressed container around the given objects.  One
    /// type reader (version 0) is declared per distinct kind, in first-use
    /// order, and `file_size` is set to the encoded length.
    pub fn from_objects(
        platform: u8,
        primary:  Option<XnbObject>,
        shared:   Vec<Option<XnbObject>>,
    ) -> io::Result<Self> {
        let mut type_readers: Vec<TypeReaderDescriptor> = Vec::new();
        for obj in primary.iter().chain(shared.iter().flatten()) {
            let name = obj.kind().reader_name();
            if !type_readers.iter().any(|d| d.name == name) {
                type_readers.push(TypeReaderDescriptor::new(name, 0));
            }
        }
        let mut cont = Self {
            header: XnbHeader::new(platform, 0, 0),
            type_readers,
            primary,
            shared_resources: shared,
        };
        let len = cont.encoded_len()?;
        cont.header.file_size = u32::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "container larger than 4 GiB"))?;
        cont.header.decompressed_size = cont.header.file_size;
        Ok(cont)
    }

    /// Decode a container from the start of `reader`.
    ///
    /// Compressed containers are rejected with
    /// [`XnbError::UnsupportedFeature`] right after the header; nothing
    /// past the decompressed-size field is consumed.
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let header = XnbHeader::read(&mut reader)?;
        if header.is_compressed() {
            return Err(XnbError::UnsupportedFeature("compressed container"));
        }

        let reader_count = read_7bit_encoded(&mut reader)? as usize;
        let type_readers = read_type_readers(&mut reader, reader_count)?;

        let shared_count = read_7bit_encoded(&mut reader)? as usize;
        debug!(type_readers = reader_count, shared_count, "reading assets");

        let primary = read_slot(&mut reader, &type_readers)?;
        debug!(present = primary.is_some(), "read primary asset");

        let mut shared_resources = Vec::new();
        for slot in 0..shared_count {
            let obj = read_slot(&mut reader, &type_readers)?;
            debug!(slot, present = obj.is_some(), "read shared resource");
            shared_resources.push(obj);
        }

        Ok(Self { header, type_readers, primary, shared_resources })
    }

    /// Encode the container.  The header is written as stored; its
    /// `file_size` is not recomputed.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        self.header.write(&mut writer)?;
        write_type_readers(&mut writer, &self.type_readers)?;
        write_7bit_encoded(&mut writer, self.shared_resources.len() as u32)?;
        self.write_slot(&mut writer, self.primary.as_ref())?;
        for obj in &self.shared_resources {
            self.write_slot(&mut writer, obj.as_ref())?;
        }
        Ok(())
    }

    fn write_slot<W: Write>(&self, mut writer: W, obj: Option<&XnbObject>) -> io::Result<()> {
        let Some(obj) = obj else {
            return write_7bit_encoded(&mut writer, 0);
        };
        let reader_name = obj.kind().reader_name();
        let position = self.type_readers.iter()
            .position(|d| d.name == reader_name)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput,
                format!("no type reader declared for {reader_name}")))?;
        write_7bit_encoded(&mut writer, position as u32 + 1)?;
        obj.write(&mut writer)
    }

    /// Encoded size in bytes; suitable for the header's `file_size`.
    pub fn encoded_len(&self) -> io::Result<u64> {
        let mut counter = ByteCounter(0);
        self.write(&mut counter)?;
        Ok(counter.0)
    }

    pub fn shared_resource_count(&self) -> usize {
        self.shared_resources.len()
    }

    /// Every present object, primary first.
    pub fn objects(&self) -> impl Iterator<Item = (Slot, &XnbObject)> {
        let primary = self.primary.iter().map(|o| (Slot::Primary, o));
        let shared = self.shared_resources.iter().enumerate()
            .filter_map(|(i, o)| o.as_ref().map(|o| (Slot::Shared(i), o)));
        primary.chain(shared)
    }

    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Export every present object.  A failed export does not stop the
    /// remaining ones; each slot gets its own result.
    pub fn export_all(&self, opts: &ExportOptions) -> Vec<ExportResult> {
        self.objects()
            .map(|(slot, obj)| {
                let base = match slot {
                    Slot::Primary   => opts.primary_base(),
                    Slot::Shared(i) => opts.shared_base(i),
                };
                ExportResult { slot, outcome: obj.export_file(&base) }
            })
            .collect()
    }

    /// Release every object, shared resources first, then the primary asset.
    pub fn release(self) {
        let Self { primary, shared_resources, .. } = self;
        for (slot, obj) in shared_resources.into_iter().enumerate() {
            if let Some(obj) = obj {
                trace!(slot, "releasing shared resource");
                obj.release();
            }
        }
        if let Some(obj) = primary {
            obj.release();
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "XNB Container")?;
        writeln!(f, "=============")?;
        write!(f, "{}", self.header)?;
        writeln!(f)?;
        for desc in &self.type_readers {
            write!(f, "{desc}")?;
        }
        writeln!(f)?;
        writeln!(f, "Shared resource count: {}", self.shared_resources.len())?;

        writeln!(f, "Primary Asset:")?;
        match &self.primary {
            Some(obj) => write!(f, "{obj}")?,
            None      => writeln!(f, "[empty]")?,
        }

        if !self.shared_resources.is_empty() {
            writeln!(f, "Shared Assets:")?;
            for obj in &self.shared_resources {
                match obj {
                    Some(obj) => write!(f, "{obj}")?,
                    None      => writeln!(f, "[empty]")?,
                }
            }
        }
        Ok(())
    }
}

/// Read one slot's type index and, if non-zero, its payload.
fn read_slot<R: Read>(mut reader: R, type_readers: &[TypeReaderDescriptor]) -> Result<Option<XnbObject>> {
    let index = read_7bit_encoded(&mut reader)?;
    match resolve_index(type_readers, index)? {
        Some(desc) => read_object(desc, &mut reader).map(Some),
        None       => Ok(None),
    }
}

/// Counts bytes written; used to size a container without buffering it.
struct ByteCounter(u64);

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len() as u64;
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

/// Decode a container from a file on disk.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Container> {
    let file = std::fs::File::open(path)?;
    Container::read(io::BufReader::new(file))
}
