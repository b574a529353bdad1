use descriptor_rvb::wire::{Descriptor, ParseError};
use descriptor_rvb::DescriptorRegistry;
use nab_rvb::utils::hash_bytes;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum InspectError
{
    ReadError(PathBuf, io::Error),
    ParseError(PathBuf, ParseError),
    WriteError(io::Error),
}
impl Display for InspectError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            InspectError::ParseError(path, err) => write!(f, "{path:?} is not a valid descriptor: {err}"),
            _ => std::fmt::Debug::fmt(&self, f),
        }
    }
}
impl Error for InspectError { }

// Print every field record of a descriptor (source or built), then the fields its schema rewrites
pub fn inspect_file(registry: &DescriptorRegistry, file: &Path, out: &mut impl Write) -> Result<(), InspectError>
{
    let bytes = std::fs::read(file).map_err(|err| InspectError::ReadError(file.to_path_buf(), err))?;
    let descriptor = Descriptor::parse(&bytes).map_err(|err| InspectError::ParseError(file.to_path_buf(), err))?;
    write_descriptor(registry, file, &bytes, &descriptor, out).map_err(InspectError::WriteError)
}

fn write_descriptor(registry: &DescriptorRegistry, file: &Path, bytes: &[u8], descriptor: &Descriptor, out: &mut impl Write) -> io::Result<()>
{
    writeln!(out, "{file:?} ({} bytes, hash {:016x})", bytes.len(), hash_bytes(0, bytes))?;
    for field in descriptor.fields()
    {
        match field.as_str()
        {
            Some(Ok(value)) => writeln!(out, "  #{} {:?} = {value:?}", field.number(), field.wire_type())?,
            _ => writeln!(out, "  #{} {:?} = {:02x?}", field.number(), field.wire_type(), field.payload())?,
        }
    }

    let ext = file.extension().map(|e| e.to_string_lossy()).unwrap_or_default();
    let Some(schema) = registry.lookup_any(&ext) else { return Ok(()) };

    writeln!(out, "{}:", schema.name)?;
    for rule in schema.rules
    {
        match descriptor.last_field(rule.number).and_then(|f| f.as_str())
        {
            Some(Ok(value)) => writeln!(out, "  {} = {value:?}", rule.field)?,
            Some(Err(_)) => writeln!(out, "  {} is not utf-8", rule.field)?,
            None => writeln!(out, "  {} unset", rule.field)?,
        }
    }

    match (schema.summarize)(bytes)
    {
        Ok(summary) => writeln!(out, "{summary}")?,
        Err(err) => log::warn!("{file:?} does not decode as {}: {err}", schema.name),
    }
    Ok(())
}
