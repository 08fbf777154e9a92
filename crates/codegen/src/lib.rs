//! sapling-codegen: lays a [`CompiledPack`] out as a datapack directory.
//!
//! The compiler core produces code units with dotted in-pack paths; this
//! crate renders them to text, maps dotted paths to directories, writes
//! `pack.mcmeta`, and puts everything under
//! `data/<project>/functions|predicates/`.

use sapling_core::command::to_kebab;
use sapling_core::{CompiledPack, Config, FileKind};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Error type for pack layout and writing.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// The configured target version has no known `pack_format`.
    #[error("unknown target version '{version}'")]
    UnknownVersion { version: String },

    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One file of the finished pack, relative to the pack root.
#[derive(Debug, Clone, PartialEq)]
pub struct DatapackFile {
    pub path: PathBuf,
    pub contents: String,
}

/// `pack_format` for a target version string like `"1.18.2"`.
pub fn pack_format(version: &str) -> Result<u32, CodegenError> {
    let unknown = || CodegenError::UnknownVersion {
        version: version.to_owned(),
    };
    let mut parts = version.split('.');
    let major: u32 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(unknown)?;
    let minor: u32 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(unknown)?;
    let patch: u32 = match parts.next() {
        None => 0,
        Some(p) => p.parse().map_err(|_| unknown())?,
    };
    if major != 1 || parts.next().is_some() {
        return Err(unknown());
    }
    match minor {
        13 | 14 => Ok(4),
        15 => Ok(5),
        16 if patch <= 1 => Ok(5),
        16 => Ok(6),
        17 => Ok(7),
        18 if patch <= 1 => Ok(8),
        18 => Ok(9),
        19 => Ok(10),
        _ => Err(unknown()),
    }
}

/// Render every unit of `pack` into its on-disk form. Paths are relative
/// to the pack root directory.
pub fn layout(pack: &CompiledPack, config: &Config) -> Result<Vec<DatapackFile>, CodegenError> {
    let format = pack_format(&config.mc_version)?;
    let mcmeta = json!({
        "pack": {
            "pack_format": format,
            "description": config.description,
        }
    });
    let mut files = vec![DatapackFile {
        path: PathBuf::from("pack.mcmeta"),
        contents: format!("{:#}\n", mcmeta),
    }];

    let project = to_kebab(&pack.project);
    for unit in &pack.units {
        for slot in unit.slots.values() {
            let (dir, extension) = match slot.kind {
                FileKind::Function => ("functions", "mcfunction"),
                FileKind::Predicate => ("predicates", "json"),
            };
            let mut path = PathBuf::from("data").join(&project).join(dir);
            for segment in slot.path.dir_segments() {
                path.push(to_kebab(segment));
            }
            path.push(format!("{}.{}", to_kebab(slot.path.name()), extension));

            let mut contents: String = slot
                .commands
                .iter()
                .map(|command| command.render())
                .collect::<Vec<_>>()
                .join("\n");
            if !contents.is_empty() {
                contents.push('\n');
            }
            files.push(DatapackFile { path, contents });
        }
    }
    Ok(files)
}

/// Write the laid-out files under `root` (the pack directory itself),
/// creating directories as needed.
pub fn write_to(root: &Path, files: &[DatapackFile]) -> Result<(), CodegenError> {
    for file in files {
        let path = root.join(&file.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CodegenError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, &file.contents)
            .map_err(|source| CodegenError::Io { path, source })?;
    }
    Ok(())
}

/// Compile-and-layout convenience used by the CLI: the pack directory is
/// `<output_directory>/<project>`.
pub fn pack_root(config: &Config) -> PathBuf {
    PathBuf::from(&config.output_directory).join(to_kebab(&config.project_name))
}
