use lightmap_atlas_core::config::{AllocationOrder, AtlasConfig};
use lightmap_atlas_core::error::LightmapAtlasError;
use lightmap_atlas_core::grouping::sort_allocations;
use lightmap_atlas_core::model::{AllocationId, LightId, MaterialRef, RawAllocation, Sample};
use lightmap_atlas_core::build_atlases;

fn alloc(id: u64, w: u32, h: u32) -> RawAllocation {
    RawAllocation::new(
        AllocationId(id),
        w,
        h,
        vec![Sample::mapped(1); (w * h) as usize],
        1.0,
        [LightId(1)],
        MaterialRef(0),
    )
    .expect("alloc")
}

/// Test zero-sized atlas extent
#[test]
fn test_zero_extent() {
    let cfg = AtlasConfig {
        max_atlas_extent: 0,
        ..Default::default()
    };
    match cfg.validate() {
        Err(LightmapAtlasError::InvalidConfig(msg)) => assert!(msg.contains("max_atlas_extent")),
        _ => panic!("Expected InvalidConfig error"),
    }
}

#[test]
fn test_zero_min_mip_extent() {
    let cfg = AtlasConfig {
        min_mip_extent: 0,
        ..Default::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_non_pow2_extent_requires_pow2_off() {
    let cfg = AtlasConfig {
        max_atlas_extent: 300,
        power_of_two_only: true,
        ..Default::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = AtlasConfig {
        max_atlas_extent: 300,
        power_of_two_only: false,
        ..Default::default()
    };
    assert!(cfg.validate().is_ok());
}

/// Padding on both sides must leave room for a single texel
#[test]
fn test_padding_leaves_no_space() {
    let cfg = AtlasConfig {
        max_atlas_extent: 8,
        padding: 4,
        ..Default::default()
    };
    match cfg.validate() {
        Err(LightmapAtlasError::InvalidConfig(msg)) => assert!(msg.contains("padding")),
        _ => panic!("Expected InvalidConfig error"),
    }

    let cfg = AtlasConfig {
        max_atlas_extent: 8,
        padding: 3,
        ..Default::default()
    };
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_zero_flush_threshold() {
    let cfg = AtlasConfig {
        group_flush_threshold_bytes: 0,
        ..Default::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_build_validates_config() {
    let cfg = AtlasConfig {
        max_atlas_extent: 0,
        ..Default::default()
    };
    assert!(matches!(
        build_atlases(vec![alloc(1, 4, 4)], &cfg),
        Err(LightmapAtlasError::InvalidConfig(_))
    ));
}

/// Empty input is not an error
#[test]
fn test_empty_input() {
    let out = build_atlases(Vec::new(), &AtlasConfig::default()).expect("empty build");
    assert!(out.is_empty());
}

/// Allocation that fills the shared extent exactly once padded
#[test]
fn test_allocation_exactly_fills_shared_atlas() {
    let cfg = AtlasConfig {
        max_atlas_extent: 64,
        padding: 2,
        ..Default::default()
    };
    let out = build_atlases(vec![alloc(1, 60, 60)], &cfg).expect("build");
    assert_eq!(out.atlases.len(), 1);
    let atlas = &out.atlases[0];
    assert!(!atlas.dedicated);
    assert_eq!((atlas.width, atlas.height), (64, 64));
    let p = &atlas.placements[0];
    assert_eq!((p.base_x, p.base_y), (2, 2));
}

/// One texel more than fits goes to a dedicated atlas
#[test]
fn test_allocation_one_over_is_dedicated() {
    let cfg = AtlasConfig {
        max_atlas_extent: 64,
        padding: 2,
        ..Default::default()
    };
    let out = build_atlases(vec![alloc(1, 61, 10)], &cfg).expect("build");
    let atlas = &out.atlases[0];
    assert!(atlas.dedicated);
    assert_eq!(atlas.padding, 0);
    assert_eq!((atlas.width, atlas.height), (61, 10));
}

#[test]
fn test_allocation_order_parsing() {
    assert_eq!("max_side_desc".parse(), Ok(AllocationOrder::MaxSideDesc));
    assert_eq!("AREA_DESC".parse(), Ok(AllocationOrder::AreaDesc));
    assert_eq!("height_desc".parse(), Ok(AllocationOrder::HeightDesc));
    assert_eq!("width_desc".parse(), Ok(AllocationOrder::WidthDesc));
    assert_eq!("id_asc".parse(), Ok(AllocationOrder::IdAsc));
    assert_eq!("none".parse(), Ok(AllocationOrder::None));
    assert!("largest_first".parse::<AllocationOrder>().is_err());
}

#[test]
fn test_sort_breaks_ties_by_id() {
    let mut allocs = vec![alloc(3, 8, 4), alloc(1, 4, 8), alloc(2, 16, 1), alloc(0, 2, 2)];
    sort_allocations(&mut allocs, AllocationOrder::MaxSideDesc);
    let ids: Vec<u64> = allocs.iter().map(|a| a.id().0).collect();
    assert_eq!(ids, vec![2, 1, 3, 0]);

    sort_allocations(&mut allocs, AllocationOrder::AreaDesc);
    let ids: Vec<u64> = allocs.iter().map(|a| a.id().0).collect();
    assert_eq!(ids, vec![1, 3, 2, 0]);
}

#[test]
fn test_config_serde_defaults() {
    let cfg: AtlasConfig = serde_json::from_str(
        r#"{"max_atlas_extent":256,"padding":1,"group_flush_threshold_bytes":4096,"power_of_two_only":true}"#,
    )
    .expect("parse");
    assert_eq!(cfg.min_mip_extent, 1);
    assert_eq!(cfg.allocation_order, AllocationOrder::MaxSideDesc);
    assert!(!cfg.parallel);
    assert!(cfg.validate().is_ok());

    let cfg: AtlasConfig = serde_json::from_str(
        r#"{"max_atlas_extent":256,"padding":1,"group_flush_threshold_bytes":4096,"power_of_two_only":true,"allocation_order":"id_asc","min_mip_extent":4}"#,
    )
    .expect("parse");
    assert_eq!(cfg.allocation_order, AllocationOrder::IdAsc);
    assert_eq!(cfg.min_mip_extent, 4);
}
