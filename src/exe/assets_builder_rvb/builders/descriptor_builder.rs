use crate::core::{AssetBuilder, AssetsBuilderConfig, BuilderError, SourceInput};
use descriptor_rvb::{DescriptorCompiler, DescriptorRegistry, SuffixMismatch};

// Builds descriptor sources by redirecting their path fields to compiled artifacts
pub struct DescriptorBuilder
{
    compiler: DescriptorCompiler,
}
impl DescriptorBuilder
{
    #[must_use]
    pub fn new(compiler: DescriptorCompiler) -> Self
    {
        Self { compiler }
    }

    // Add a builder for every schema in the registry
    pub fn register_all(config: &mut AssetsBuilderConfig, registry: &DescriptorRegistry, on_mismatch: SuffixMismatch)
    {
        for schema in registry.iter()
        {
            config.add_builder(Self::new(DescriptorCompiler::new(schema, on_mismatch)));
        }
    }
}
impl AssetBuilder for DescriptorBuilder
{
    fn name(&self) -> &'static str { self.compiler.schema().name }
    fn input_extension(&self) -> &'static str { self.compiler.schema().input_ext }
    fn output_extension(&self) -> &'static str { self.compiler.schema().output_ext }

    fn build(&self, input: &SourceInput) -> Result<Vec<u8>, BuilderError>
    {
        match self.compiler.compile(input.first_input())
        {
            Ok(output) => Ok(output),
            Err(err) =>
            {
                log::debug!("{} failed to compile {} (.{}, mismatches {:?}): {err}",
                    self.name(), input.source_path_string(), input.file_extension(), self.compiler.on_mismatch());
                Err(err.into())
            }
        }
    }
}
