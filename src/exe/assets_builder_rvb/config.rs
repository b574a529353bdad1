use descriptor_rvb::SuffixMismatch;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "assets_builder.toml";

pub trait TomlRead: DeserializeOwned
{
    fn load(reader: &mut impl Read) -> Result<Self, Box<dyn Error>>
    {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Ok(toml::from_str(&buf)?)
    }
}

#[derive(Debug)]
pub enum ConfigError
{
    IOError(PathBuf, std::io::Error),
    ParseError(PathBuf, Box<dyn Error>),
}
impl Display for ConfigError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { std::fmt::Debug::fmt(&self, f) }
}
impl Error for ConfigError { }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorSettings
{
    pub suffix_mismatch: SuffixMismatch,
}
impl Default for DescriptorSettings
{
    fn default() -> Self { Self { suffix_mismatch: SuffixMismatch::Keep } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderSettings
{
    pub sources_root: PathBuf,
    pub build_root: PathBuf,
    pub jobs: usize, // 0 = one per core
    pub descriptor: DescriptorSettings,
}
impl Default for BuilderSettings
{
    fn default() -> Self
    {
        Self
        {
            sources_root: PathBuf::from("assets/src"),
            build_root: PathBuf::from("assets/build"),
            jobs: 0,
            descriptor: DescriptorSettings::default(),
        }
    }
}
impl TomlRead for BuilderSettings { }
impl BuilderSettings
{
    // Load from an explicit path (which must exist), or from the default file if present
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError>
    {
        let (path, required) = match path
        {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        let mut fin = match std::fs::File::open(path)
        {
            Ok(fin) => fin,
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound =>
            {
                log::debug!("No {path:?}, using default settings");
                return Ok(Self::default());
            }
            Err(err) => return Err(ConfigError::IOError(path.to_path_buf(), err)),
        };

        let settings = Self::load(&mut fin).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?;
        log::debug!("Loaded settings from {path:?}");
        Ok(settings)
    }

    #[must_use]
    pub fn effective_jobs(&self) -> usize
    {
        match self.jobs
        {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        }
    }
}
