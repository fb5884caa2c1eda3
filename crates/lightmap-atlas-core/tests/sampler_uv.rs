use lightmap_atlas_core::prelude::*;
use lightmap_atlas_core::sampler::{atlas_uv, bilinear, texel_position};
use std::collections::BTreeSet;

fn close(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn bare_atlas(width: u32, height: u32, placements: Vec<Placement>) -> FinalAtlas {
    FinalAtlas {
        id: 0,
        width,
        height,
        mips: vec![SampleGrid::new(width, height)],
        placements,
        key: CompatibilityKey {
            light_set: BTreeSet::new(),
            brightness_bucket: 1,
            material: MaterialRef(0),
        },
        dedicated: false,
        padding: 0,
    }
}

#[test]
fn uv_remap_lands_on_content_corners() {
    let p = Placement::new(AllocationId(1), 0, 10, 20, 64, 32, 256, 256, 1.0);
    assert!(close(p.uv_scale[0], 0.25, 1e-6) && close(p.uv_scale[1], 0.125, 1e-6));
    assert!(close(p.uv_bias[0], 10.5 / 256.0, 1e-6));
    assert!(close(p.uv_bias[1], 20.5 / 256.0, 1e-6));

    let atlas = bare_atlas(256, 256, vec![p.clone()]);
    let origin = texel_position(&atlas, &p, [0.0, 0.0]);
    assert!(close(origin[0], 10.0, 1e-3) && close(origin[1], 20.0, 1e-3), "{origin:?}");
    let far = texel_position(&atlas, &p, [1.0, 1.0]);
    assert!(close(far[0], 74.0, 1e-3) && close(far[1], 52.0, 1e-3), "{far:?}");

    let uv = atlas_uv(&p, [0.5, 0.5]);
    assert!(close(uv[0], (10.5 + 32.0) / 256.0, 1e-6));
}

#[test]
fn bilinear_interpolates_and_clamps() {
    let samples = (0..16u8).map(|x| Sample::mapped(x * 10)).collect();
    let grid = SampleGrid::from_samples(16, 1, samples);
    assert!(close(bilinear(&grid, [3.5 / 16.0, 0.5]), 30.0, 1e-3));
    assert!(close(bilinear(&grid, [4.0 / 16.0, 0.5]), 35.0, 1e-3));
    assert!(close(bilinear(&grid, [0.0, 0.5]), 0.0, 1e-3));
    assert!(close(bilinear(&grid, [1.0, 0.5]), 150.0, 1e-3));
}

#[test]
fn unknown_allocation_is_reported() {
    let atlas = bare_atlas(4, 4, Vec::new());
    let sampler = RuntimeSampler::new(&atlas);
    match sampler.sample(AllocationId(42), [0.5, 0.5]) {
        Err(LightmapAtlasError::UnknownAllocation(id)) => assert_eq!(id, AllocationId(42)),
        other => panic!("Expected UnknownAllocation, got {:?}", other),
    }
}

#[test]
fn sampling_near_footprint_edge_reads_dilated_value() {
    let cfg = AtlasConfig::builder().max_atlas_extent(64).padding(2).build();
    let alloc = RawAllocation::new(
        AllocationId(1),
        8,
        8,
        vec![Sample::mapped(180); 64],
        4.0,
        [LightId(3)],
        MaterialRef(0),
    )
    .expect("alloc");
    let out = build_atlases(vec![alloc], &cfg).expect("build");
    let atlas = &out.atlases[0];
    let p = atlas.placement(AllocationId(1)).expect("placed");
    assert_eq!((p.base_x, p.base_y), (2, 2));

    let sampler = RuntimeSampler::new(atlas);
    let centre = sampler.sample(AllocationId(1), [0.5, 0.5]).expect("centre");
    assert!(close(centre, 180.0, 1e-3), "{centre}");
    // a little outside the content still blends with the dilated border
    let edge = sampler.sample(AllocationId(1), [-0.05, 0.5]).expect("edge");
    assert!(close(edge, 180.0, 1e-3), "{edge}");
    let corner = sampler.sample(AllocationId(1), [1.0, 1.0]).expect("corner");
    assert!(close(corner, 180.0, 1e-3), "{corner}");

    let linear = sampler.sample_linear(AllocationId(1), [0.5, 0.5]).expect("linear");
    let expected = (180.0f32 / 255.0).powf(2.2) * 4.0;
    assert!(close(linear, expected, 1e-3), "{linear} vs {expected}");

    // levels past the end clamp to the last one
    let top = sampler.sample_level(AllocationId(1), [0.5, 0.5], 99).expect("level");
    assert!(top > 0.0);
}

#[test]
fn decode_scales_full_value_to_peak() {
    let p = Placement::new(AllocationId(1), 0, 0, 0, 4, 4, 4, 4, 4.0);
    assert!(close(p.decode(255.0), 4.0, 1e-5));
    assert!(close(p.decode(0.0), 0.0, 1e-6));
}

#[test]
fn atlas_without_levels_reports_error() {
    let p = Placement::new(AllocationId(1), 3, 0, 0, 4, 4, 4, 4, 1.0);
    let mut atlas = bare_atlas(4, 4, vec![p.clone()]);
    atlas.id = 3;
    atlas.mips.clear();
    assert!(atlas.base_level().is_none());
    assert_eq!(lightmap_atlas_core::sampler::sample(&atlas, &p, [0.5, 0.5]), None);

    let sampler = RuntimeSampler::new(&atlas);
    match sampler.sample(AllocationId(1), [0.5, 0.5]) {
        Err(LightmapAtlasError::EmptyMipChain(id)) => assert_eq!(id, 3),
        other => panic!("Expected EmptyMipChain, got {:?}", other),
    }
    assert!(sampler.sample_linear(AllocationId(1), [0.5, 0.5]).is_err());
    assert!(sampler.sample_level(AllocationId(1), [0.5, 0.5], 2).is_err());
    assert!(close(bilinear(&SampleGrid::new(0, 0), [0.5, 0.5]), 0.0, 1e-6));
}
