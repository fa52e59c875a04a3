use common::AssetRef;
use serde::Serialize;

/// Pagination block attached to list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PaginationInfo {
    pub total_items: u64,
    pub current_page: u64,
    pub total_pages: u64,
}

impl PaginationInfo {
    pub fn new(total_items: u64, current_page: u64, per_page: u64) -> Self {
        Self {
            total_items,
            current_page,
            total_pages: total_items.div_ceil(per_page.max(1)),
        }
    }
}

/// Decode a JSON column holding an array of asset reference pairs.
///
/// Rows written by this service always hold a well-formed array; anything
/// else decodes to empty rather than failing a read path.
pub fn assets_from_json(value: &serde_json::Value) -> Vec<AssetRef> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Decode a nullable JSON column holding a single asset reference pair.
pub fn asset_from_json(value: Option<&serde_json::Value>) -> Option<AssetRef> {
    value.and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Encode asset references for a JSON array column.
pub fn assets_to_json(assets: &[AssetRef]) -> serde_json::Value {
    serde_json::to_value(assets).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
}

/// Encode one asset reference for a nullable JSON column.
pub fn asset_to_json(asset: &AssetRef) -> serde_json::Value {
    serde_json::to_value(asset).unwrap_or(serde_json::Value::Null)
}
