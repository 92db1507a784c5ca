//! A [`PackageSource`] over a directory of dumped assets.
//!
//! Each `.uasset` file holds its export records as a JSON array. Texture
//! images sit beside the asset as `<stem>.png`, or `<stem>_<n>.png` for
//! texture arrays.

use path_slash::{PathBufExt, PathExt};
use serde_json::Value;
use sfmod_core::error::ExtractError;
use sfmod_core::source::{Icon, Package, PackageSource};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct DumpSource {
    root: PathBuf,
}

impl DumpSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a namespace path.
    pub fn locate(&self, path: &str) -> PathBuf {
        self.root.join(PathBuf::from_slash(path))
    }

    /// Every file under the root with the given extension, sorted.
    pub fn files_with_extension(&self, extension: &str) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.path().extension().unwrap_or_default() == extension)
            .map(|e| e.into_path())
            .collect()
    }

    /// Sidecar images of a texture asset, in array order.
    fn sidecars(&self, path: &str) -> Vec<PathBuf> {
        let asset = self.locate(path);
        let single = asset.with_extension("png");
        if single.is_file() {
            return vec![single];
        }
        let stem = asset.file_stem().unwrap_or_default().to_string_lossy().into_owned();
        (0..)
            .map(|n| asset.with_file_name(format!("{stem}_{n}.png")))
            .take_while(|p| p.is_file())
            .collect()
    }
}

impl PackageSource for DumpSource {
    fn files(&self) -> Vec<String> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                e.path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(|rel| rel.to_slash_lossy().into_owned())
            })
            .collect()
    }

    fn load_package(&self, path: &str) -> Result<Package, ExtractError> {
        let load_error = |detail: String| ExtractError::PackageLoad {
            file: path.to_string(),
            detail,
        };
        let content = std::fs::read_to_string(self.locate(path)).map_err(|e| load_error(e.to_string()))?;
        match serde_json::from_str::<Value>(&content).map_err(|e| load_error(e.to_string()))? {
            Value::Array(exports) => Ok(exports),
            _ => Err(load_error("expected an array of export records".into())),
        }
    }

    fn decode_texture(&self, path: &str, export: usize) -> Result<Icon, ExtractError> {
        let sidecars = self.sidecars(path);
        if sidecars.is_empty() {
            return Err(ExtractError::TextureDecode {
                file: path.to_string(),
                detail: format!("no image beside export {export}"),
            });
        }
        sidecars
            .iter()
            .map(|sidecar| {
                image::open(sidecar)
                    .map(|img| img.to_rgba8())
                    .map_err(|e| ExtractError::TextureDecode {
                        file: path.to_string(),
                        detail: format!("{}: {e}", sidecar.display()),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::fs;

    fn write(root: &Path, path: &str, content: &str) {
        let file = root.join(path);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, content).unwrap();
    }

    fn write_png(root: &Path, path: &str, width: u32) {
        RgbaImage::new(width, 1).save(root.join(path)).unwrap();
    }

    #[test]
    fn files_are_slash_separated_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "FactoryGame/Content/B.uasset", "[]");
        write(dir.path(), "FactoryGame/Content/A/C.uasset", "[]");
        let source = DumpSource::new(dir.path());
        assert_eq!(
            source.files(),
            vec!["FactoryGame/Content/A/C.uasset", "FactoryGame/Content/B.uasset"]
        );
    }

    #[test]
    fn packages_are_json_export_arrays() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "G/Desc_X.uasset", r#"[{"Name": "Desc_X_C"}, {"Name": "Default__Desc_X_C"}]"#);
        write(dir.path(), "G/Broken.uasset", r#"{"Name": "not an array"}"#);
        let source = DumpSource::new(dir.path());

        let package = source.load_package("G/Desc_X.uasset").unwrap();
        assert_eq!(package.len(), 2);
        assert_eq!(package[1]["Name"], "Default__Desc_X_C");

        assert!(matches!(
            source.load_package("G/Broken.uasset"),
            Err(ExtractError::PackageLoad { .. })
        ));
        assert!(matches!(
            source.load_package("G/Missing.uasset"),
            Err(ExtractError::PackageLoad { .. })
        ));
    }

    #[test]
    fn single_texture_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "T/Icon.uasset", "[]");
        write_png(dir.path(), "T/Icon.png", 3);
        let source = DumpSource::new(dir.path());
        let icon = source.decode_texture("T/Icon.uasset", 0).unwrap();
        assert_eq!(icon.len(), 1);
        assert_eq!(icon[0].width(), 3);
    }

    #[test]
    fn texture_array_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "T/Array.uasset", "[]");
        write_png(dir.path(), "T/Array_0.png", 1);
        write_png(dir.path(), "T/Array_1.png", 2);
        let source = DumpSource::new(dir.path());
        let icon = source.decode_texture("T/Array.uasset", 0).unwrap();
        assert_eq!(icon.iter().map(|i| i.width()).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn missing_sidecar_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "T/Bare.uasset", "[]");
        let source = DumpSource::new(dir.path());
        let err = source.decode_texture("T/Bare.uasset", 0).unwrap_err();
        assert!(matches!(err, ExtractError::TextureDecode { .. }));
        assert!(!err.is_invariant());
    }
}
