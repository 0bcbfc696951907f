//! Image file loader
//!
//! Reads and decodes reference and candidate files into RGBA buffers.
//! Decoding is CPU-bound, so it runs on tokio's blocking pool.
//! No format validation happens beyond "decodable as an image".

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use tokio::task;

use crate::error::{CompareError, Result};
use crate::state::data::ReferenceImage;

/// A decoded input file
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// File name only (e.g., "shot_02.png")
    pub name: String,
    /// Where the bytes came from, if they came from disk
    pub path: Option<PathBuf>,
    pub image: Arc<RgbaImage>,
}

impl LoadedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Use this image as the comparison reference
    pub fn into_reference(self) -> ReferenceImage {
        ReferenceImage::new(self.name, self.image)
    }
}

/// Load and decode an image file
///
/// # Arguments
/// * `path` - Path to the image file
///
/// # Returns
/// * `Ok(LoadedImage)` - Decoded RGBA pixels and the file name
/// * `Err(CompareError::Io | CompareError::Decode)` - File unreadable or not an image
pub async fn load_image(path: PathBuf) -> Result<LoadedImage> {
    let display = path.display().to_string();

    // Spawn blocking because decoding is CPU-intensive
    task::spawn_blocking(move || load_image_blocking(&path))
        .await
        .map_err(|e| CompareError::Io {
            path: PathBuf::from(display),
            source: std::io::Error::other(e),
        })?
}

/// Load every path, keeping the outcome of each one separately
///
/// One unreadable file never prevents the others from loading.
pub async fn load_images(paths: Vec<PathBuf>) -> Vec<(PathBuf, Result<LoadedImage>)> {
    let mut outcomes = Vec::with_capacity(paths.len());
    for path in paths {
        let outcome = load_image(path.clone()).await;
        outcomes.push((path, outcome));
    }
    outcomes
}

/// Blocking implementation of image loading
fn load_image_blocking(path: &Path) -> Result<LoadedImage> {
    let bytes = std::fs::read(path).map_err(|source| CompareError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut loaded = decode_image(file_name(path), &bytes)?;
    loaded.path = Some(path.to_path_buf());

    log::debug!(
        "Decoded {} ({}x{})",
        loaded.name,
        loaded.width(),
        loaded.height()
    );

    Ok(loaded)
}

/// Decode in-memory bytes (e.g. from a drag-and-drop payload)
pub fn decode_image(name: impl Into<String>, bytes: &[u8]) -> Result<LoadedImage> {
    let name = name.into();
    let decoded = image::load_from_memory(bytes).map_err(|source| CompareError::Decode {
        name: name.clone(),
        source,
    })?;

    Ok(LoadedImage {
        name,
        path: None,
        image: Arc::new(decoded.to_rgba8()),
    })
}

/// Extract the file name used for display and labels
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Where a file drop lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropTarget {
    /// Anywhere else in the window
    #[default]
    Candidates,
    /// The reference row of the sidebar
    Reference,
}

/// Files of one finished drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropBatch {
    Reference(PathBuf),
    Candidates(Vec<PathBuf>),
}

/// Gathers the per-file drop events of the window into one batch
///
/// The target is taken from what the cursor hovered when the first file
/// of the drop arrived.
#[derive(Debug, Default)]
pub struct DropQueue {
    hovered: DropTarget,
    target: DropTarget,
    paths: Vec<PathBuf>,
}

impl DropQueue {
    pub fn hover(&mut self, target: DropTarget) {
        self.hovered = target;
    }

    pub fn hovered(&self) -> DropTarget {
        self.hovered
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Add a dropped file; returns true if it starts a new drop
    pub fn push(&mut self, path: PathBuf) -> bool {
        let first = self.paths.is_empty();
        if first {
            self.target = self.hovered;
        }
        self.paths.push(path);
        first
    }

    /// End the current drop and hand out its files
    ///
    /// A reference takes only the first file.
    pub fn flush(&mut self) -> Option<DropBatch> {
        let paths = std::mem::take(&mut self.paths);
        match self.target {
            DropTarget::Candidates if !paths.is_empty() => Some(DropBatch::Candidates(paths)),
            DropTarget::Candidates => None,
            DropTarget::Reference => {
                if paths.len() > 1 {
                    log::debug!("Reference drop: ignoring {} extra files", paths.len() - 1);
                }
                paths.into_iter().next().map(DropBatch::Reference)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png() {
        let loaded = decode_image("a.png", &png_bytes(4, 3)).unwrap();

        assert_eq!(loaded.name, "a.png");
        assert_eq!((loaded.width(), loaded.height()), (4, 3));
        assert_eq!(loaded.image.get_pixel(1, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = decode_image("notes.txt", b"definitely not an image").unwrap_err();
        assert!(matches!(err, CompareError::Decode { ref name, .. } if name == "notes.txt"));
    }

    #[test]
    fn test_into_reference_keeps_dimensions() {
        let reference = decode_image("ref.png", &png_bytes(8, 6))
            .unwrap()
            .into_reference();
        assert_eq!(reference.summary(), "ref.png (8x6)");
    }

    #[test]
    fn test_multi_file_drop_is_one_batch() {
        let mut drops = DropQueue::default();

        assert!(drops.push(PathBuf::from("a.png")));
        assert!(!drops.push(PathBuf::from("b.png")));
        assert!(!drops.push(PathBuf::from("c.png")));

        assert_eq!(
            drops.flush(),
            Some(DropBatch::Candidates(vec![
                PathBuf::from("a.png"),
                PathBuf::from("b.png"),
                PathBuf::from("c.png"),
            ]))
        );
        assert!(drops.is_empty());
        assert_eq!(drops.flush(), None);
    }

    #[test]
    fn test_drop_on_reference_row_sets_reference() {
        let mut drops = DropQueue::default();
        drops.hover(DropTarget::Reference);

        drops.push(PathBuf::from("ref.png"));
        drops.push(PathBuf::from("extra.png"));
        // Leaving mid-drop does not retarget files already dropped
        drops.hover(DropTarget::Candidates);

        assert_eq!(drops.flush(), Some(DropBatch::Reference(PathBuf::from("ref.png"))));

        drops.push(PathBuf::from("next.png"));
        assert_eq!(
            drops.flush(),
            Some(DropBatch::Candidates(vec![PathBuf::from("next.png")]))
        );
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = load_image(PathBuf::from("/nonexistent/path.png")).await;
        assert!(matches!(result, Err(CompareError::Io { .. })));
    }

    #[tokio::test]
    async fn test_load_images_keeps_going_after_failure() {
        let outcomes = load_images(vec![
            PathBuf::from("/nonexistent/a.png"),
            PathBuf::from("/nonexistent/b.png"),
        ])
        .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|(_, outcome)| outcome.is_err()));
    }
}
