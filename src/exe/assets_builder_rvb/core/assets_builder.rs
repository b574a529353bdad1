use super::*;
use clap::ValueEnum;
use crossbeam::channel;
use nab_rvb::format_binary;
use nab_rvb::utils::hash_bytes;
use std::collections::HashMap;
use std::error::Error;
use std::ffi::OsStr;
use std::fmt::{Debug, Display, Formatter};
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use unicase::UniCase;
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab_case")]
pub enum BuildRule
{
    #[default]
    OnlyIfChanged,
    ForceBuildAll,
}

pub struct AssetsBuilderConfig
{
    pub sources_root: PathBuf,
    pub build_root: PathBuf,
    asset_builders: Vec<Box<dyn AssetBuilder>>,
    file_ext_to_builder: HashMap<UniCase<&'static str>, usize>,
}
impl AssetsBuilderConfig
{
    pub fn new<P: Into<PathBuf>>(sources_root: P, build_root: P) -> Self
    {
        Self
        {
            sources_root: sources_root.into(),
            build_root: build_root.into(),
            asset_builders: Vec::new(),
            file_ext_to_builder: HashMap::new(),
        }
    }

    // Register a builder for its input extension. Will panic if that extension was already registered
    pub fn add_builder<B: AssetBuilder + 'static>(&mut self, builder: B)
    {
        let ext = builder.input_extension();
        if let Some(&obi) = self.file_ext_to_builder.get(&UniCase::new(ext))
        {
            panic!("Tried to register builder {} for extension {} that was already registered to {}",
                   builder.name(), ext, self.asset_builders[obi].name())
        }

        log::trace!("Registered {} for .{} -> .{}", builder.name(), ext, builder.output_extension());
        self.file_ext_to_builder.insert(UniCase::new(ext), self.asset_builders.len());
        self.asset_builders.push(Box::new(builder));
    }

    #[must_use]
    pub fn builder_for(&self, file_ext: &str) -> Option<&dyn AssetBuilder>
    {
        let b_index = *self.file_ext_to_builder.get(&UniCase::new(file_ext))?;
        Some(self.asset_builders[b_index].as_ref())
    }

    pub fn builders(&self) -> impl Iterator<Item=&dyn AssetBuilder>
    {
        self.asset_builders.iter().map(|b| b.as_ref())
    }
}

pub struct AssetsBuilder
{
    config: AssetsBuilderConfig,
}
impl AssetsBuilder
{
    pub fn new(mut config: AssetsBuilderConfig) -> Self
    {
        if let Err(err) = std::fs::create_dir_all(&config.build_root)
        {
            log::warn!("Failed to create build root {:?}: {err}", config.build_root);
        }

        // sources must be canonical so that built paths can be made relative to it
        match config.sources_root.canonicalize()
        {
            Ok(canonical) => config.sources_root = canonical,
            Err(err) => log::warn!("Sources root {:?} is not accessible: {err}", config.sources_root),
        }

        Self
        {
            config
        }
    }

    #[inline] #[must_use]
    pub fn config(&self) -> &AssetsBuilderConfig { &self.config }

    pub fn scan_sources(&self) -> ScanSources<'_>
    {
        let walker = WalkDir::new(&self.config.sources_root).sort_by_file_name();
        ScanSources { walk_dir: walker.into_iter(), config: &self.config }
    }

    // Where a source (relative to the sources root) is written once built
    #[must_use]
    pub fn output_path(&self, rel_source_path: &Path, builder: &dyn AssetBuilder) -> PathBuf
    {
        self.config.build_root.join(rel_source_path).with_extension(builder.output_extension())
    }

    // Another source beside this one that builds to the same output, e.g. x.rivescene and x.RIVESCENE
    fn colliding_source(&self, source_path: &Path, builder: &dyn AssetBuilder) -> Option<PathBuf>
    {
        let stem = source_path.file_stem()?;
        std::fs::read_dir(source_path.parent()?).ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path != source_path && path.file_stem() == Some(stem) && path.is_file())
            .find(|path|
            {
                let ext = path.extension().unwrap_or(OsStr::new("")).to_string_lossy();
                self.config.builder_for(&ext).is_some_and(|b| b.output_extension() == builder.output_extension())
            })
    }

    // Transform a source file into its built asset. The output is only replaced once the build has fully succeeded,
    // and with OnlyIfChanged only when the built bytes differ from what is already there
    pub fn build_source<P: AsRef<Path> + Debug>(&self, source_path: P, build_rule: BuildRule) -> Result<BuildResult, BuildError>
    {
        let canonical_path =
        {
            if source_path.as_ref().is_relative()
            {
                self.config.sources_root.join(source_path.as_ref())
            }
            else
            {
                source_path.as_ref().into()
            }
        }.canonicalize().map_err(BuildError::SourceIOError)?;

        let rel_path = canonical_path.strip_prefix(&self.config.sources_root)
            .map_err(|_| BuildError::InvalidSourcePath(canonical_path.clone()))?;

        let file_ext = rel_path.extension().unwrap_or(OsStr::new("")).to_string_lossy();
        let builder = self.config.builder_for(&file_ext)
            .ok_or_else(|| BuildError::NoBuilderForSource(file_ext.to_string()))?;

        let output_path = self.output_path(rel_path, builder);
        if let Some(other_source) = self.colliding_source(&canonical_path, builder)
        {
            return Err(BuildError::OutputCollision { output_path, other_source });
        }

        let content = std::fs::read(&canonical_path).map_err(BuildError::SourceIOError)?;
        let input = SourceInput::new(rel_path, file_ext.to_string(), &content);

        log::debug!("Building {rel_path:?} with {}", builder.name());
        let built = builder.build(&input).map_err(BuildError::BuilderError)?;
        let content_hash = hash_bytes(0, &built);

        if build_rule == BuildRule::OnlyIfChanged && existing_output_hash(&output_path) == Some(content_hash)
        {
            log::debug!("{rel_path:?} is up to date");
            return Ok(BuildResult
            {
                source_path: rel_path.to_path_buf(),
                output_path,
                outcome: BuildOutcome::UpToDate,
            });
        }

        write_atomic(&output_path, &built).map_err(BuildError::OutputIOError)?;
        log::debug!("Wrote {output_path:?} ({}B, hash {content_hash:016x})", format_binary!(built.len()));

        Ok(BuildResult
        {
            source_path: rel_path.to_path_buf(),
            output_path,
            outcome: BuildOutcome::Built { content_hash, len: built.len() },
        })
    }

    // Build every known source. Each source is its own task, a failure does not stop the others
    pub fn build_all(&self, build_rule: BuildRule, jobs: usize) -> BuildSummary
    {
        let mut summary = BuildSummary::default();

        let mut sources = Vec::new();
        for scanned in self.scan_sources()
        {
            match scanned
            {
                Ok(source) => sources.push(source.path),
                Err(err) =>
                {
                    log::error!("Failed to scan sources: {err}");
                    summary.scan_errors.push(err);
                }
            }
        }

        let jobs = jobs.clamp(1, sources.len().max(1));
        log::debug!("Building {} source(s) on {jobs} thread(s)", sources.len());

        summary.results = match jobs
        {
            1 => sources.into_iter()
                .map(|path| { let result = self.build_source(&path, build_rule); (path, result) })
                .collect(),
            _ =>
            {
                let (work_send, work_recv) = channel::unbounded::<PathBuf>();
                let (result_send, result_recv) = channel::unbounded();
                sources.into_iter().for_each(|path| { let _ = work_send.send(path); });
                drop(work_send);

                std::thread::scope(|scope|
                {
                    for _ in 0..jobs
                    {
                        let work_recv = work_recv.clone();
                        let result_send = result_send.clone();
                        scope.spawn(move ||
                        {
                            for path in work_recv.iter()
                            {
                                let result = self.build_source(&path, build_rule);
                                if result_send.send((path, result)).is_err() { break; }
                            }
                        });
                    }
                });
                drop(result_send);
                result_recv.iter().collect()
            }
        };

        summary.results.sort_by(|a, b| a.0.cmp(&b.0));
        summary
    }
}

fn existing_output_hash(output_path: &Path) -> Option<u64>
{
    std::fs::read(output_path).ok().map(|bytes| hash_bytes(0, &bytes))
}

// Write to a temp file beside the output, then move it into place
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()>
{
    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[derive(Debug)]
pub enum BuildError
{
    InvalidSourcePath(PathBuf), // lies outside the sources root
    NoBuilderForSource(String),
    SourceIOError(io::Error),
    BuilderError(BuilderError),
    OutputIOError(io::Error),
    OutputCollision
    {
        output_path: PathBuf,
        other_source: PathBuf,
    },
}
impl Display for BuildError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { std::fmt::Debug::fmt(&self, f) }
}
impl Error for BuildError { }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome
{
    Built
    {
        content_hash: u64,
        len: usize,
    },
    UpToDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult
{
    pub source_path: PathBuf, // relative to the sources root
    pub output_path: PathBuf,
    pub outcome: BuildOutcome,
}

#[derive(Debug, Default)]
pub struct BuildSummary
{
    pub results: Vec<(PathBuf, Result<BuildResult, BuildError>)>, // sorted by source path
    pub scan_errors: Vec<ScanError>,
}
impl BuildSummary
{
    pub fn built_count(&self) -> usize
    {
        self.results.iter().filter(|r| matches!(r.1, Ok(BuildResult { outcome: BuildOutcome::Built { .. }, .. }))).count()
    }
    pub fn up_to_date_count(&self) -> usize
    {
        self.results.iter().filter(|r| matches!(r.1, Ok(BuildResult { outcome: BuildOutcome::UpToDate, .. }))).count()
    }
    pub fn failed_count(&self) -> usize
    {
        self.results.iter().filter(|r| r.1.is_err()).count() + self.scan_errors.len()
    }
    pub fn is_success(&self) -> bool { self.failed_count() == 0 }
}
