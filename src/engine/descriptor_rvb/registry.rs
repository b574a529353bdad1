use crate::{DescriptorSchema, RIVE_SCENE_DESC};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use unicase::UniCase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError
{
    DuplicateExtension
    {
        extension: &'static str,
        existing: &'static str,
        new: &'static str,
    },
}
impl Display for RegistryError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { std::fmt::Debug::fmt(&self, f) }
}
impl Error for RegistryError { }

// Input extension -> descriptor schema, built once at startup and handed to the assets builder
#[derive(Debug, Default)]
pub struct DescriptorRegistry
{
    schemas: Vec<&'static DescriptorSchema>, // registration order
    by_input_ext: HashMap<UniCase<&'static str>, usize>,
}
impl DescriptorRegistry
{
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn with_builtin() -> Self
    {
        let mut registry = Self::new();
        registry.register(&RIVE_SCENE_DESC).expect("Built-in descriptor schemas must have unique extensions");
        registry
    }

    // Extensions compare case-insensitively
    pub fn register(&mut self, schema: &'static DescriptorSchema) -> Result<(), RegistryError>
    {
        let key = UniCase::new(schema.input_ext);
        if let Some(&existing) = self.by_input_ext.get(&key)
        {
            return Err(RegistryError::DuplicateExtension
            {
                extension: schema.input_ext,
                existing: self.schemas[existing].name,
                new: schema.name,
            });
        }

        self.by_input_ext.insert(key, self.schemas.len());
        self.schemas.push(schema);
        Ok(())
    }

    #[must_use]
    pub fn lookup(&self, input_ext: &str) -> Option<&'static DescriptorSchema>
    {
        self.by_input_ext.get(&UniCase::new(input_ext)).map(|&i| self.schemas[i])
    }

    // Find the schema that reads or writes this extension
    #[must_use]
    pub fn lookup_any(&self, ext: &str) -> Option<&'static DescriptorSchema>
    {
        self.lookup(ext).or_else(||
        {
            let ext = UniCase::new(ext);
            self.schemas.iter().find(|s| UniCase::new(s.output_ext) == ext).copied()
        })
    }

    pub fn iter(&self) -> impl Iterator<Item=&'static DescriptorSchema> + '_
    {
        self.schemas.iter().copied()
    }
}
