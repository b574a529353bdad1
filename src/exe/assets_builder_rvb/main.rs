mod core;
mod builders;
mod config;
mod inspect;

use crate::builders::DescriptorBuilder;
use crate::config::BuilderSettings;
use crate::core::{AssetsBuilder, AssetsBuilderConfig, BuildOutcome, BuildRule, BuildSummary};
use clap::{ArgGroup, Parser, Subcommand};
use crate::inspect::inspect_file;
use descriptor_rvb::DescriptorRegistry;
use nab_rvb::app::{set_panic_hook, AppRun, ExitReason};
use std::path::{Path, PathBuf};

#[derive(Debug, Subcommand)]
pub enum CliCommands
{
    #[clap(about = "Build sources into assets")]
    #[command(group(ArgGroup::new("build_what").required(true).args(["all", "source"])))]
    Build
    {
        #[arg(long)]
        all: bool,

        #[arg(long, value_delimiter = ',', num_args = 1..)]
        source: Vec<PathBuf>,

        #[arg(long)]
        rule: Option<BuildRule>,

        #[arg(long, requires = "all", help = "Parallel build tasks with --all, 0 for one per core")]
        jobs: Option<usize>,
    },
    #[clap(about = "List known source files and their builder")]
    Sources,
    #[clap(about = "Print the fields of a source or built descriptor")]
    Inspect
    {
        file: PathBuf,
    },
}

#[derive(Debug, Parser)]
struct CliArgs
{
    #[command(subcommand)]
    command: CliCommands,

    #[arg(long, global = true, help = "Settings file (defaults to assets_builder.toml if present)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    sources_root: Option<PathBuf>,

    #[arg(long, global = true)]
    build_root: Option<PathBuf>,
}

fn main() -> ExitReason
{
    let app_run = AppRun::<CliArgs>::startup("Assets Builder", env!("CARGO_PKG_VERSION"));
    set_panic_hook();

    let mut settings = match BuilderSettings::load_from(app_run.args.config.as_deref())
    {
        Ok(settings) => settings,
        Err(err) =>
        {
            log::error!("Failed to load settings: {err}");
            return ExitReason::BuildFailed;
        }
    };
    if let Some(sources_root) = &app_run.args.sources_root { settings.sources_root = sources_root.clone(); }
    if let Some(build_root) = &app_run.args.build_root { settings.build_root = build_root.clone(); }

    let registry = DescriptorRegistry::with_builtin();

    let mut builder_cfg = AssetsBuilderConfig::new(&settings.sources_root, &settings.build_root);
    DescriptorBuilder::register_all(&mut builder_cfg, &registry, settings.descriptor.suffix_mismatch);

    let exit_reason = match &app_run.args.command
    {
        CliCommands::Build { all: true, rule, jobs, .. } =>
        {
            if let Some(jobs) = jobs { settings.jobs = *jobs; }
            let builder = AssetsBuilder::new(builder_cfg);
            let summary = builder.build_all(rule.unwrap_or_default(), settings.effective_jobs());
            report_summary(&summary)
        }
        CliCommands::Build { all: false, source: sources, rule, .. } =>
        {
            let builder = AssetsBuilder::new(builder_cfg);
            let build_rule = rule.unwrap_or_default();
            let mut failed = false;
            for src_path in sources
            {
                match builder.build_source(src_path, build_rule)
                {
                    Ok(result) => match result.outcome
                    {
                        BuildOutcome::Built { content_hash, .. } =>
                            log::info!("Successfully built {src_path:?} into {:?} ({content_hash:016x})", result.output_path),
                        BuildOutcome::UpToDate =>
                            log::info!("{src_path:?} is up to date"),
                    },
                    Err(err) =>
                    {
                        log::error!("Failed to build {src_path:?}: {err:#}");
                        failed = true;
                    }
                }
            }
            if failed { ExitReason::BuildFailed } else { ExitReason::NormalExit }
        }
        CliCommands::Sources =>
        {
            let builder = AssetsBuilder::new(builder_cfg);
            for asset_builder in builder.config().builders()
            {
                log::debug!("{}: .{} -> .{}", asset_builder.name(), asset_builder.input_extension(), asset_builder.output_extension());
            }

            let mut exit_reason = ExitReason::NormalExit;
            for source in builder.scan_sources()
            {
                match source
                {
                    Ok(source) => println!("{:?} {}", source.path, source.builder_name),
                    Err(err) =>
                    {
                        println!("{err}");
                        exit_reason = ExitReason::BuildFailed;
                    }
                }
            }
            exit_reason
        }
        CliCommands::Inspect { file } => inspect(&registry, file),
    };

    app_run.set_exit_reason(exit_reason);
    exit_reason
}

fn report_summary(summary: &BuildSummary) -> ExitReason
{
    for (src_path, result) in &summary.results
    {
        if let Err(err) = result
        {
            log::error!("Failed to build {src_path:?}: {err:#}");
        }
    }

    log::info!("Built {}, {} up to date, {} failed",
        summary.built_count(),
        summary.up_to_date_count(),
        summary.failed_count());

    match summary.is_success()
    {
        true => ExitReason::NormalExit,
        false => ExitReason::BuildFailed,
    }
}

fn inspect(registry: &DescriptorRegistry, file: &Path) -> ExitReason
{
    match inspect_file(registry, file, &mut std::io::stdout().lock())
    {
        Ok(()) => ExitReason::NormalExit,
        Err(err) =>
        {
            log::error!("Failed to inspect {file:?}: {err}");
            ExitReason::BuildFailed
        }
    }
}
