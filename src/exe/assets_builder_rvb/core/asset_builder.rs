use std::error::Error;
use std::path::Path;
use unicase::UniCase;

pub type BuilderError = Box<dyn Error + Send + Sync>;

// One build step: the bytes of a single source in, the bytes of a single asset out.
// Builders are shared across worker threads and must not keep per-build state
pub trait AssetBuilder: Send + Sync
{
    fn name(&self) -> &'static str;

    // The file extension (omit . prefix) that this builder reads from
    fn input_extension(&self) -> &'static str;
    // The file extension (omit . prefix) of the built asset
    fn output_extension(&self) -> &'static str;

    fn build(&self, input: &SourceInput) -> Result<Vec<u8>, BuilderError>;
}

pub struct SourceInput<'b>
{
    source_path: &'b Path, // Should only be used for debug purposes
    file_extension: UniCase<String>, // does not include .
    content: &'b [u8],
}
impl<'b> SourceInput<'b>
{
    pub(crate) fn new(source_path: &'b Path, file_extension: impl Into<String>, content: &'b [u8]) -> Self
    {
        Self
        {
            source_path,
            file_extension: UniCase::new(file_extension.into()),
            content,
        }
    }

    pub fn source_path_string(&self) -> String { self.source_path.to_string_lossy().to_string() }
    pub fn file_extension(&self) -> &UniCase<String> { &self.file_extension }
    pub fn first_input(&self) -> &'b [u8] { self.content }
}
