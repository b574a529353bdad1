use crate::RewriteRule;
use prost::Message;

// A descriptor format: which files it is read from and written to, and how its path fields are redirected.
// Rules are applied in order
#[derive(Debug)]
pub struct DescriptorSchema
{
    pub name: &'static str,
    pub input_ext: &'static str, // no leading .
    pub output_ext: &'static str, // no leading .
    pub rules: &'static [RewriteRule],
    // Typed, human-readable rendering of an encoded descriptor
    pub summarize: fn(&[u8]) -> Result<String, prost::DecodeError>,
}

#[derive(Clone, PartialEq, Message)]
pub struct RiveSceneDesc
{
    #[prost(string, tag = "1")]
    pub scene: String,
    #[prost(string, optional, tag = "2")]
    pub atlas: Option<String>,
}

pub static RIVE_SCENE_DESC: DescriptorSchema = DescriptorSchema
{
    name: "RiveSceneDesc",
    input_ext: "rivescene",
    output_ext: "rivescenec",
    rules: &[
        RewriteRule { field: "scene", number: 1, from_ext: ".riv", to_ext: ".rivc" },
        RewriteRule { field: "atlas", number: 2, from_ext: ".atlas", to_ext: ".a.texturesetc" },
    ],
    summarize: summarize_rive_scene,
};

fn summarize_rive_scene(bytes: &[u8]) -> Result<String, prost::DecodeError>
{
    RiveSceneDesc::decode(bytes).map(|desc| format!("{desc:#?}"))
}
