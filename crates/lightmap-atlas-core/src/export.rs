use crate::config::AtlasConfig;
use crate::pipeline::BuildOutput;
use serde::Serialize;
use serde_json::{Value, json};

/// Build-level metadata written next to the placement records.
#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    /// Schema version of the manifest; additive changes keep it.
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    pub max_atlas_extent: u32,
    pub padding: u32,
    pub power_of_two: bool,
    pub min_mip_extent: u32,
}

impl Meta {
    pub fn from_config(cfg: &AtlasConfig) -> Self {
        Self {
            schema_version: "1".into(),
            app: "lightmap-atlas".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            format: "V8C8".into(),
            max_atlas_extent: cfg.max_atlas_extent,
            padding: cfg.padding,
            power_of_two: cfg.power_of_two_only,
            min_mip_extent: cfg.min_mip_extent,
        }
    }
}

/// Serialize atlases and placements as `{ atlases: [...], meta }`.
/// Sample data is not included; texture persistence belongs to the consumer.
pub fn to_json(output: &BuildOutput, cfg: &AtlasConfig) -> Value {
    let atlases = output
        .atlases
        .iter()
        .map(|a| {
            let placements: Vec<Value> = a
                .placements
                .iter()
                .map(|p| {
                    json!({
                        "allocationId": p.allocation_id.0,
                        "atlasId": p.atlas_id,
                        "base": {"x": p.base_x, "y": p.base_y},
                        "size": {"w": p.size_x, "h": p.size_y},
                        "uvScale": p.uv_scale,
                        "uvBias": p.uv_bias,
                        "valueScale": p.value_scale,
                    })
                })
                .collect();
            let mips: Vec<Value> = a
                .mips
                .iter()
                .map(|m| json!({"w": m.width, "h": m.height}))
                .collect();
            json!({
                "id": a.id,
                "width": a.width,
                "height": a.height,
                "mipCount": a.mips.len(),
                "mips": mips,
                "dedicated": a.dedicated,
                "brightnessBucket": a.key.brightness_bucket,
                "material": a.key.material.0,
                "lights": a.key.light_set.iter().map(|l| l.0.to_string()).collect::<Vec<_>>(),
                "placements": placements,
            })
        })
        .collect::<Vec<_>>();
    json!({ "atlases": atlases, "meta": Meta::from_config(cfg) })
}
