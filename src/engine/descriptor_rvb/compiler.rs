use crate::wire::{Descriptor, ParseError, SerializationError};
use crate::{DescriptorSchema, SuffixMismatch, RIVE_SCENE_DESC};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError
{
    Parse(ParseError),
    Serialize(SerializationError),
}
impl Display for CompileError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { std::fmt::Debug::fmt(&self, f) }
}
impl Error for CompileError
{
    fn source(&self) -> Option<&(dyn Error + 'static)>
    {
        match self
        {
            CompileError::Parse(err) => Some(err),
            CompileError::Serialize(err) => Some(err),
        }
    }
}
impl From<ParseError> for CompileError
{
    fn from(err: ParseError) -> Self { Self::Parse(err) }
}
impl From<SerializationError> for CompileError
{
    fn from(err: SerializationError) -> Self { Self::Serialize(err) }
}

// Compiles serialized descriptors of one schema. Holds no state between calls
#[derive(Debug, Clone, Copy)]
pub struct DescriptorCompiler
{
    schema: &'static DescriptorSchema,
    on_mismatch: SuffixMismatch,
}
impl DescriptorCompiler
{
    #[must_use]
    pub const fn new(schema: &'static DescriptorSchema, on_mismatch: SuffixMismatch) -> Self
    {
        Self { schema, on_mismatch }
    }

    #[inline] #[must_use]
    pub fn schema(&self) -> &'static DescriptorSchema { self.schema }
    #[inline] #[must_use]
    pub fn on_mismatch(&self) -> SuffixMismatch { self.on_mismatch }

    // Parse, redirect the schema's path fields, and re-encode. All other fields are passed through untouched
    pub fn compile(&self, input: &[u8]) -> Result<Vec<u8>, CompileError>
    {
        let mut descriptor = Descriptor::parse(input)?;
        for rule in self.schema.rules
        {
            rule.apply(&mut descriptor, self.on_mismatch)?;
        }
        Ok(descriptor.encode()?)
    }
}

// Compile a .rivescene with the default mismatch policy
pub fn compile_rive_scene(input: &[u8]) -> Result<Vec<u8>, CompileError>
{
    DescriptorCompiler::new(&RIVE_SCENE_DESC, SuffixMismatch::default()).compile(input)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::RiveSceneDesc;
    use prost::Message;

    #[test]
    fn compile_hero()
    {
        let input = RiveSceneDesc { scene: "fx/hero.riv".into(), atlas: Some("fx/hero.atlas".into()) };
        let output = compile_rive_scene(&input.encode_to_vec()).unwrap();
        let compiled = RiveSceneDesc::decode(output.as_slice()).unwrap();
        assert_eq!("fx/hero.rivc", compiled.scene);
        assert_eq!(Some("fx/hero.a.texturesetc"), compiled.atlas.as_deref());
    }

    #[test]
    fn compile_without_atlas()
    {
        let input = RiveSceneDesc { scene: "hero.riv".into(), atlas: None };
        let compiled = RiveSceneDesc::decode(compile_rive_scene(&input.encode_to_vec()).unwrap().as_slice()).unwrap();
        assert_eq!("hero.rivc", compiled.scene);
        assert_eq!(None, compiled.atlas);
    }

    #[test]
    fn compile_mismatch_policies()
    {
        let input = RiveSceneDesc { scene: "fx/hero.rivz".into(), atlas: Some("fx/hero.atlas".into()) }.encode_to_vec();

        let kept = DescriptorCompiler::new(&RIVE_SCENE_DESC, SuffixMismatch::Keep).compile(&input).unwrap();
        let compiled = RiveSceneDesc::decode(kept.as_slice()).unwrap();
        assert_eq!("fx/hero.rivz", compiled.scene);
        assert_eq!(Some("fx/hero.a.texturesetc"), compiled.atlas.as_deref());

        let rejected = DescriptorCompiler::new(&RIVE_SCENE_DESC, SuffixMismatch::Reject).compile(&input);
        assert!(matches!(rejected, Err(CompileError::Parse(ParseError::UnexpectedExtension { field: "scene", .. }))));
    }

    #[test]
    fn compile_malformed()
    {
        let input = RiveSceneDesc { scene: "fx/hero.riv".into(), atlas: None }.encode_to_vec();
        let truncated = &input[..input.len() - 1];
        assert!(matches!(compile_rive_scene(truncated), Err(CompileError::Parse(ParseError::Truncated { .. }))));
    }

    #[test]
    fn compile_is_deterministic()
    {
        let input = RiveSceneDesc { scene: "a/b.riv".into(), atlas: Some("a/b.atlas".into()) }.encode_to_vec();
        assert_eq!(compile_rive_scene(&input), compile_rive_scene(&input));
    }

    #[test]
    fn compile_error_source()
    {
        let err = compile_rive_scene(&[0x0a, 0x05]).unwrap_err();
        assert!(err.source().is_some());
    }
}
