//! Darknet-style dataset directories: `<id>.jpg` next to `<id>.txt`.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Extension of per-image annotation files.
pub const ANNOTATION_EXT: &str = "txt";
/// Default extension of training images.
pub const DEFAULT_IMAGE_EXT: &str = "jpg";

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

impl DatasetError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Which images [`DatasetLayout::list_images`] returns.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LabelState {
    /// Images that have an annotation file.
    Labeled,
    /// Images without an annotation file.
    Unlabeled,
}

/// Outcome of [`DatasetLayout::seed_empty_annotations`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SeedSummary {
    pub found: usize,
    pub created: usize,
}

/// `/path/to/abc.txt` -> `abc`.
///
/// Strips everything up to the last path separator and the last extension.
/// Applied to both sides whenever image ids are compared.
pub fn image_id_from_path(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

/// Resolves image and annotation paths inside one dataset directory.
#[derive(Clone, Debug)]
pub struct DatasetLayout {
    dir: PathBuf,
    image_ext: String,
}

impl DatasetLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            image_ext: DEFAULT_IMAGE_EXT.to_string(),
        }
    }

    /// Use a different image extension (without the dot).
    pub fn with_image_ext(mut self, ext: impl Into<String>) -> Self {
        self.image_ext = ext.into().trim_start_matches('.').to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn image_ext(&self) -> &str {
        &self.image_ext
    }

    pub fn image_path(&self, image_id: &str) -> PathBuf {
        self.dir.join(format!("{image_id}.{}", self.image_ext))
    }

    pub fn annotation_path(&self, image_id: &str) -> PathBuf {
        self.dir.join(format!("{image_id}.{ANNOTATION_EXT}"))
    }

    /// Image ids in the directory, sorted alphabetically.
    pub fn list_images(&self, state: LabelState) -> Result<Vec<String>, DatasetError> {
        if !self.dir.is_dir() {
            return Err(DatasetError::NotADirectory(self.dir.clone()));
        }

        let mut images = BTreeSet::new();
        let mut labels = BTreeSet::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| DatasetError::io(&self.dir, e))? {
            let entry = entry.map_err(|e| DatasetError::io(&self.dir, e))?;
            let path = entry.path();
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };
            if ext == self.image_ext {
                images.insert(stem.to_string());
            } else if ext == ANNOTATION_EXT {
                labels.insert(stem.to_string());
            }
        }

        let wanted = state == LabelState::Labeled;
        Ok(images
            .into_iter()
            .filter(|id| labels.contains(id) == wanted)
            .collect())
    }

    /// Create an empty annotation file for every unlabeled image.
    ///
    /// Failures on single files are logged and counted as not created.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self), fields(dataset = %self.dir.display()))
    )]
    pub fn seed_empty_annotations(&self) -> Result<SeedSummary, DatasetError> {
        let unlabeled = self.list_images(LabelState::Unlabeled)?;
        log::info!(
            "found {} unlabeled images in {}",
            unlabeled.len(),
            self.dir.display()
        );

        let mut summary = SeedSummary {
            found: unlabeled.len(),
            created: 0,
        };
        let mut failures = 0usize;
        for id in &unlabeled {
            let path = self.annotation_path(id);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(_) => summary.created += 1,
                Err(e) => {
                    // only the first failure is worth an error line
                    if failures == 0 {
                        log::error!(
                            "can not create {}: {e}, omitting next errors",
                            path.display()
                        );
                    } else {
                        log::debug!("can not create {}: {e}", path.display());
                    }
                    failures += 1;
                }
            }
        }

        if summary.created == summary.found {
            log::info!("created {} empty annotation files", summary.created);
        } else {
            log::warn!(
                "created only {} of {} annotation files in {}",
                summary.created,
                summary.found,
                self.dir.display()
            );
        }
        Ok(summary)
    }
}

#[cfg(feature = "image")]
impl DatasetLayout {
    /// Decode the image of `image_id`. Zero-sized images are an error.
    pub fn load_image(&self, image_id: &str) -> Result<image::DynamicImage, image::ImageError> {
        use image::error::{LimitError, LimitErrorKind};

        let img = image::ImageReader::open(self.image_path(image_id))?
            .with_guessed_format()?
            .decode()?;
        if img.width() == 0 || img.height() == 0 {
            return Err(image::ImageError::Limits(LimitError::from_kind(
                LimitErrorKind::DimensionError,
            )));
        }
        Ok(img)
    }
}

/// Class names, one per line, indexed by class id.
#[derive(Clone, Debug, Default)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        Ok(Self::parse(&raw))
    }

    pub fn parse(text: &str) -> Self {
        Self {
            names: text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of `class_id`, or the id itself when the class is unknown.
    pub fn name(&self, class_id: u32) -> String {
        self.names
            .get(class_id as usize)
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }
}
