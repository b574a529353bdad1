use descriptor_rvb::wire::Descriptor;
use descriptor_rvb::compile_rive_scene;
use prost::Message;
use proptest::prelude::*;

// A richer scene descriptor than the compiler knows about. Everything past atlas is opaque to it
#[derive(Clone, PartialEq, Message)]
struct ExtendedSceneDesc
{
    #[prost(string, tag = "1")]
    scene: String,
    #[prost(string, optional, tag = "2")]
    atlas: Option<String>,
    #[prost(string, tag = "3")]
    name: String,
    #[prost(uint64, tag = "4")]
    flags: u64,
    #[prost(fixed32, tag = "5")]
    tint: u32,
    #[prost(bytes = "vec", tag = "6")]
    blob: Vec<u8>,
    #[prost(double, tag = "7")]
    scale: f64,
    #[prost(string, repeated, tag = "8")]
    tags: Vec<String>,
    #[prost(sint64, tag = "900")]
    far_field: i64,
}

#[test]
fn hero_scene_keeps_name()
{
    let input = ExtendedSceneDesc
    {
        scene: "fx/hero.riv".into(),
        atlas: Some("fx/hero.atlas".into()),
        name: "hero".into(),
        ..Default::default()
    };
    let expected = ExtendedSceneDesc
    {
        scene: "fx/hero.rivc".into(),
        atlas: Some("fx/hero.a.texturesetc".into()),
        name: "hero".into(),
        ..Default::default()
    };

    let output = compile_rive_scene(&input.encode_to_vec()).unwrap();
    assert_eq!(expected.encode_to_vec(), output);
    assert_eq!(expected, ExtendedSceneDesc::decode(output.as_slice()).unwrap());
}

#[test]
fn unknown_fields_keep_wire_order()
{
    // field 9 "x", then scene, then field 10 varint 7, then another field 9
    let input = [
        0x4a, 0x01, b'x',
        0x0a, 0x05, b'a', b'.', b'r', b'i', b'v',
        0x50, 0x07,
        0x4a, 0x01, b'y',
    ];
    let output = compile_rive_scene(&input).unwrap();

    let desc = Descriptor::parse(&output).unwrap();
    let fields: Vec<_> = desc.fields().iter().map(|f| (f.number(), f.payload().to_vec())).collect();
    assert_eq!(vec![
        (9, b"x".to_vec()),
        (1, b"a.rivc".to_vec()),
        (10, vec![0x07]),
        (9, b"y".to_vec()),
    ], fields);
}

#[test]
fn repeated_scene_records_all_rewritten()
{
    let mut input = ExtendedSceneDesc { scene: "old.riv".into(), ..Default::default() }.encode_to_vec();
    input.extend(ExtendedSceneDesc { scene: "new.riv".into(), ..Default::default() }.encode_to_vec());

    let output = compile_rive_scene(&input).unwrap();
    // last record wins on decode
    assert_eq!("new.rivc", ExtendedSceneDesc::decode(output.as_slice()).unwrap().scene);
    assert_eq!(Some(Ok("old.rivc")), Descriptor::parse(&output).unwrap().fields()[0].as_str());
}

fn extended_desc() -> impl Strategy<Value=ExtendedSceneDesc>
{
    (
        "[a-z/]{0,16}",
        proptest::option::of("[a-z/]{0,16}"),
        ".{0,16}",
        any::<u64>(),
        any::<u32>(),
        proptest::collection::vec(any::<u8>(), 0..32),
        -1.0e9f64..1.0e9,
        proptest::collection::vec("[a-z]{1,8}", 0..4),
        any::<i64>(),
    ).prop_map(|(scene, atlas, name, flags, tint, blob, scale, tags, far_field)| ExtendedSceneDesc
    {
        scene: format!("{scene}.riv"),
        atlas: atlas.map(|a| format!("{a}.atlas")),
        name,
        flags,
        tint,
        blob,
        scale,
        tags,
        far_field,
    })
}

proptest!
{
    #[test]
    fn only_path_fields_change(input in extended_desc())
    {
        let output = compile_rive_scene(&input.encode_to_vec()).unwrap();
        let compiled = ExtendedSceneDesc::decode(output.as_slice()).unwrap();

        let expected = ExtendedSceneDesc
        {
            scene: input.scene.replace(".riv", ".rivc"),
            atlas: input.atlas.as_ref().map(|a| format!("{}.a.texturesetc", a.strip_suffix(".atlas").unwrap())),
            ..input.clone()
        };
        prop_assert_eq!(expected, compiled);
    }

    #[test]
    fn output_len_grows_by_suffix_delta(input in extended_desc())
    {
        let encoded = input.encode_to_vec();
        let output = compile_rive_scene(&encoded).unwrap();

        // paths stay under 128 bytes so length prefixes keep their size
        let growth = 1 + input.atlas.as_ref().map_or(0, |_| ".a.texturesetc".len() - ".atlas".len());
        prop_assert_eq!(encoded.len() + growth, output.len());
    }
}
