//! Object registry: maps declared type reader names to object kinds.
//!
//! # Dispatch
//! [`ObjectKind`] is the single discriminant for every operation.  Decoding
//! resolves a reader name to a kind exactly once; the resulting
//! [`XnbObject`] carries its kind, and describe/export/release all dispatch
//! on that.  Reader names are matched byte for byte, case-sensitive.
//!
//! # Adding a kind
//! Implement [`XnbAsset`] for the decoded type, add a variant to both
//! [`ObjectKind`] and [`XnbObject`], and list the kind in [`ObjectKind::ALL`].

pub mod sound_effect;

use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::error::{Result, XnbError};
use crate::type_reader::TypeReaderDescriptor;

pub use sound_effect::SoundEffect;

// ── XnbAsset ─────────────────────────────────────────────────────────────────

/// Capability set of one concrete object kind.
pub trait XnbAsset: Sized + fmt::Display {
    /// Type reader name this kind is registered under.
    const READER_NAME: &'static str;
    const KIND: ObjectKind;

    /// Decode the payload that follows the slot's type index.
    fn read<R: Read>(reader: R) -> Result<Self>;

    /// Encode the payload in the layout [`XnbAsset::read`] accepts.
    fn write<W: Write>(&self, writer: W) -> io::Result<()>;

    /// Convert to the kind's standard external file format.
    fn export<W: Write>(&self, writer: W) -> Result<()>;
}

// ── ObjectKind ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectKind {
    SoundEffect,
}

impl ObjectKind {
    /// Every registered kind.
    pub const ALL: &'static [ObjectKind] = &[ObjectKind::SoundEffect];

    pub fn reader_name(self) -> &'static str {
        match self {
            ObjectKind::SoundEffect => SoundEffect::READER_NAME,
        }
    }

    pub fn from_reader_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.reader_name() == name)
    }

    /// Display name (diagnostics only).
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::SoundEffect => "SoundEffect",
        }
    }

    /// File extension used by [`XnbObject::export_file`].
    pub fn extension(self) -> &'static str {
        match self {
            ObjectKind::SoundEffect => "wav",
        }
    }

    pub fn read<R: Read>(self, reader: R) -> Result<XnbObject> {
        Ok(match self {
            ObjectKind::SoundEffect => XnbObject::SoundEffect(SoundEffect::read(reader)?),
        })
    }
}

// ── XnbObject ────────────────────────────────────────────────────────────────

/// A decoded object.  Owns all of its buffers; dropping it releases them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum XnbObject {
    SoundEffect(SoundEffect),
}

impl XnbObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            XnbObject::SoundEffect(_) => SoundEffect::KIND,
        }
    }

    pub fn describe(&self) -> String {
        self.to_string()
    }

    pub fn write<W: Write>(&self, writer: W) -> io::Result<()> {
        match self {
            XnbObject::SoundEffect(o) => o.write(writer),
        }
    }

    pub fn export<W: Write>(&self, writer: W) -> Result<()> {
        match self {
            XnbObject::SoundEffect(o) => o.export(writer),
        }
    }

    /// Export to `base` with the kind's extension appended, returning the
    /// path written.  A partially written file is removed on failure.
    pub fn export_file<P: AsRef<Path>>(&self, base: P) -> Result<PathBuf> {
        let path = with_extension(base.as_ref(), self.kind().extension());
        let result = File::create(&path).map_err(XnbError::from).and_then(|file| {
            let mut writer = BufWriter::new(file);
            self.export(&mut writer)?;
            writer.flush()?;
            Ok(())
        });
        match result {
            Ok(()) => {
                debug!(path = %path.display(), kind = self.kind().name(), "exported object");
                Ok(path)
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(&path) {
                    if rm.kind() != io::ErrorKind::NotFound {
                        warn!(path = %path.display(), error = %rm, "could not remove partial export");
                    }
                }
                Err(e)
            }
        }
    }

    /// Release the object and every buffer it owns.
    pub fn release(self) {
        trace!(kind = self.kind().name(), "releasing object");
        drop(self);
    }

    pub fn as_sound_effect(&self) -> Option<&SoundEffect> {
        match self {
            XnbObject::SoundEffect(o) => Some(o),
        }
    }
}

impl fmt::Display for XnbObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XnbObject::SoundEffect(o) => fmt::Display::fmt(o, f),
        }
    }
}

impl From<SoundEffect> for XnbObject {
    fn from(o: SoundEffect) -> Self {
        XnbObject::SoundEffect(o)
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────────────

/// Decode one object using the kind registered for `desc.name`.
///
/// Returns [`XnbError::UnsupportedType`] without consuming any bytes if no
/// kind is registered under that name.
pub fn read_object<R: Read>(desc: &TypeReaderDescriptor, reader: R) -> Result<XnbObject> {
    let kind = ObjectKind::from_reader_name(&desc.name)
        .ok_or_else(|| XnbError::UnsupportedType { name: desc.name.clone() })?;
    kind.read(reader)
}

/// Read exactly `len` bytes.  Memory grows with what the stream actually
/// supplies, not with the declared length.
pub(crate) fn read_blob<R: Read>(mut reader: R, len: u32) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.by_ref().take(u64::from(len)).read_to_end(&mut buf)?;
    if buf.len() != len as usize {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {len} bytes, stream ended after {}", buf.len()),
        )
        .into());
    }
    Ok(buf)
}

fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn registry_lookup_is_exact() {
        let name = "Microsoft.Xna.Framework.Content.SoundEffectReader";
        assert_eq!(ObjectKind::from_reader_name(name), Some(ObjectKind::SoundEffect));
        assert_eq!(ObjectKind::from_reader_name(&name.to_lowercase()), None);
        assert_eq!(ObjectKind::from_reader_name(&format!("{name} ")), None);
    }

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for &kind in ObjectKind::ALL {
            assert_eq!(ObjectKind::from_reader_name(kind.reader_name()), Some(kind));
        }
    }

    #[test]
    fn unknown_reader_consumes_nothing() {
        let desc = TypeReaderDescriptor::new("Microsoft.Xna.Framework.Content.Texture2DReader", 0);
        let mut cur = Cursor::new(vec![1, 2, 3, 4]);
        let err = read_object(&desc, &mut cur).unwrap_err();
        assert!(matches!(&err, XnbError::UnsupportedType { name } if name == &desc.name));
        assert_eq!(cur.position(), 0);
    }

    #[test]
    fn read_blob_requires_full_length() {
        let err = read_blob(Cursor::new(vec![1, 2]), 3).unwrap_err();
        assert!(err.is_truncated());
        assert_eq!(read_blob(Cursor::new(vec![1, 2, 3, 4]), 3).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn huge_declared_length_does_not_preallocate() {
        let err = read_blob(Cursor::new(vec![0u8; 8]), u32::MAX).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn extension_is_appended_not_replaced() {
        assert_eq!(with_extension(Path::new("out/level1.xnb"), "wav"), PathBuf::from("out/level1.xnb.wav"));
    }
}
