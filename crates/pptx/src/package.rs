//! OPC package access: the ZIP container behind a .pptx file.

use locker_core::{Error, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// A single part (ZIP entry) of the package.
#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
}

/// All parts of a package, held in memory in their original order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Open a package from a file on disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read every part of a package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;
            if file.is_dir() {
                continue;
            }

            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", file.name(), e)))?;
            parts.push(Part {
                name: file.name().to_string(),
                data,
            });
        }

        log::debug!("Loaded package with {} parts", parts.len());
        Ok(Self { parts })
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// A part decoded as UTF-8 text.
    pub fn part_str(&self, name: &str) -> Result<String> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::ZipError(format!("File not found in archive '{}'", name)))?;
        String::from_utf8(data.to_vec())
            .map_err(|e| Error::ZipError(format!("Part '{}' is not UTF-8: {}", name, e)))
    }

    /// Replace a part's content, adding the part if it does not exist.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Names of all parts in package order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Write the package to a file, replacing it if it exists.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize the package into an in-memory ZIP.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            zip.start_file(part.name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", part.name, e)))?;
            zip.write_all(&part.data)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Package {
        let mut package = Package::default();
        package.set_part("[Content_Types].xml", b"<Types/>".to_vec());
        package.set_part("ppt/presentation.xml", b"<p:presentation/>".to_vec());
        package
    }

    #[test]
    fn test_part_lookup_and_replace() {
        let mut package = sample();
        assert_eq!(package.part("ppt/presentation.xml"), Some(&b"<p:presentation/>"[..]));
        assert!(package.part("missing.xml").is_none());

        package.set_part("ppt/presentation.xml", b"<x/>".to_vec());
        assert_eq!(package.part_str("ppt/presentation.xml").unwrap(), "<x/>");
        assert_eq!(package.part_names().count(), 2);
    }

    #[test]
    fn test_zip_round_trip_keeps_order() {
        let package = sample();
        let bytes = package.to_bytes().unwrap();
        let reopened = Package::from_reader(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = reopened.part_names().collect();
        assert_eq!(names, vec!["[Content_Types].xml", "ppt/presentation.xml"]);
        assert_eq!(reopened.part_str("[Content_Types].xml").unwrap(), "<Types/>");
    }

    #[test]
    fn test_not_a_zip() {
        let result = Package::from_reader(Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(result, Err(Error::ZipError(_))));
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("out.pptx");
        assert!(sample().save(&path).is_err());
    }
}
