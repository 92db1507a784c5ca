use serde::{Deserialize, Serialize};

/// Identifies a physical asset file in the index. Assigned in scan order,
/// which is (mod, path) order, so comparing ids compares source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u32);

/// Identifies a resolved recipe in the entity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies a resolved machine in the entity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineId(pub u32);

/// Identifies a resolved item in the entity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_ids_order_by_scan_position() {
        let mut ids = vec![AssetId(3), AssetId(0), AssetId(2)];
        ids.sort();
        assert_eq!(ids, vec![AssetId(0), AssetId(2), AssetId(3)]);
    }

    #[test]
    fn entity_ids_are_copy() {
        let a = ItemId(5);
        let b = a;
        assert_eq!(a, b);
        assert_ne!(RecipeId(1), RecipeId(2));
        assert_eq!(MachineId(7), MachineId(7));
    }
}
