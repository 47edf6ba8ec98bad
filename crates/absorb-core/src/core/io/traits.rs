use crate::core::models::structure::AtomicStructure;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing periodic structure file formats.
///
/// Implementors handle format-specific parsing and serialization; the provided methods add
/// path-based conveniences on top.
pub trait StructureFile {
    /// Format-specific information carried alongside the structure (e.g. the data block name).
    type Metadata: Default;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a structure from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the reader fails.
    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(AtomicStructure, Self::Metadata), Self::Error>;

    /// Writes a structure and its metadata to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure cannot be represented in the format or writing fails.
    fn write_to(
        structure: &AtomicStructure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes a structure with default metadata.
    fn write_structure_to(
        structure: &AtomicStructure,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        Self::write_to(structure, &Self::Metadata::default(), writer)
    }

    fn read_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<(AtomicStructure, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(
        structure: &AtomicStructure,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(structure, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes a structure to a file path with default metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_structure_to_path<P: AsRef<Path>>(
        structure: &AtomicStructure,
        path: P,
    ) -> Result<(), Self::Error> {
        Self::write_to_path(structure, &Self::Metadata::default(), path)
    }
}
