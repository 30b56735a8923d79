use std::fs;
use std::path::{Path, PathBuf};

pub const ASSETS_DIR: &str = "assets";

/// A located resource file.
#[derive(Debug, Clone, PartialEq)]
pub struct BundledResource {
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Ordered set of directories resources are resolved from.
#[derive(Debug, Clone, Default)]
pub struct ResourceBundle {
    search_dirs: Vec<PathBuf>,
}

impl ResourceBundle {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        ResourceBundle { search_dirs }
    }

    /// Configured directories first, then `assets/` next to the executable,
    /// then `assets/` in the working directory.
    pub fn main(extra_dirs: &[PathBuf]) -> Self {
        let mut dirs = extra_dirs.to_vec();
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            dirs.push(exe_dir.join(ASSETS_DIR));
        }
        dirs.push(PathBuf::from(ASSETS_DIR));
        ResourceBundle::new(dirs)
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// First regular file named `<name>.<ext>` in search order.
    pub fn path_for_resource(&self, name: &str, ext: &str) -> Option<BundledResource> {
        let file_name = format!("{name}.{ext}");
        self.search_dirs.iter().find_map(|dir| {
            let path = dir.join(&file_name);
            let meta = fs::metadata(&path).ok()?;
            if !meta.is_file() {
                return None;
            }
            log::debug!("resolved {} to {}", file_name, path.display());
            Some(BundledResource {
                file_name: file_name.clone(),
                path,
                size: meta.len(),
            })
        })
    }
}
