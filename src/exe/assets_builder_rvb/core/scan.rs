use crate::core::AssetsBuilderConfig;
use std::error::Error;
use std::ffi::OsStr;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ScanError
{
    WalkError(walkdir::Error),
}
impl Error for ScanError { }
impl Display for ScanError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedSource
{
    pub path: PathBuf,
    pub builder_name: &'static str,
}

// Walks the sources root, yielding every file that a registered builder can read
pub struct ScanSources<'c>
{
    pub(super) walk_dir: walkdir::IntoIter,
    pub(super) config: &'c AssetsBuilderConfig,
}
impl Iterator for ScanSources<'_>
{
    type Item = Result<ScannedSource, ScanError>;

    fn next(&mut self) -> Option<Self::Item>
    {
        while let Some(maybe_entry) = self.walk_dir.next()
        {
            let entry = match maybe_entry
            {
                Ok(entry) => entry,
                Err(err) => return Some(Err(ScanError::WalkError(err))),
            };

            if !entry.file_type().is_file() { continue; }

            let Some(builder) = entry.path().extension()
                .and_then(OsStr::to_str) // builders only register unicode extensions
                .and_then(|ext| self.config.builder_for(ext)) else { continue; };

            return Some(Ok(ScannedSource
            {
                builder_name: builder.name(),
                path: entry.into_path(),
            }));
        }
        None
    }
}
