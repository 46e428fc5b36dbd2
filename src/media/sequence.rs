//! Image sequence source: numbered frames on disk played at a fixed rate.
//!
//! Accepted inputs:
//! - a directory: every readable image file in it, sorted by frame number
//! - a glob pattern (`shots/take1.*.png`)
//! - one numbered frame (`seq.0001.png`): expands to `seq.*.png`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbImage;
use log::{debug, info};

use super::source::{MediaError, VideoInfo, VideoSource};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "tga", "bmp", "exr", "hdr"];

pub struct ImageSequenceSource {
    frames: Vec<PathBuf>,
    info: VideoInfo,
    position: u64,
    origin: PathBuf,
}

impl std::fmt::Debug for ImageSequenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSequenceSource")
            .field("origin", &self.origin)
            .field("frames", &self.frames.len())
            .field("position", &self.position)
            .finish()
    }
}

/// True for inputs this source can open without probing a container.
pub fn looks_like_sequence(path: &Path) -> bool {
    if path.is_dir() || path.to_string_lossy().contains('*') {
        return true;
    }
    is_image_file(path)
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl ImageSequenceSource {
    pub fn open(path: &Path, fps: f64) -> Result<Self, MediaError> {
        let frames = collect_frames(path)?;
        let first = frames.first().ok_or_else(|| MediaError::NoFrames(path.to_path_buf()))?;
        let (width, height) = image::image_dimensions(first).map_err(|e| MediaError::Open {
            path: first.clone(),
            reason: e.to_string(),
        })?;

        info!(
            "Opened image sequence {} ({} frames, {}x{} @ {} fps)",
            path.display(),
            frames.len(),
            width,
            height,
            fps
        );
        Ok(Self {
            info: VideoInfo {
                width,
                height,
                fps,
                frame_count: frames.len() as u64,
            },
            frames,
            position: 0,
            origin: path.to_path_buf(),
        })
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }
}

impl VideoSource for ImageSequenceSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.origin)
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>, MediaError> {
        let Some(frame) = self.frames.get(self.position as usize) else {
            return Ok(None);
        };
        let img = image::open(frame)
            .map_err(|e| MediaError::Decode(format!("{}: {}", frame.display(), e)))?
            .to_rgb8();
        self.position += 1;
        Ok(Some(img))
    }

    fn seek(&mut self, seconds: f64) -> Result<(), MediaError> {
        self.position = self.info.frame_at_or_after(seconds);
        debug!("Sequence seek {:.3}s -> frame {}", seconds, self.position);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }
}

/// Resolve the input to an ordered frame list.
fn collect_frames(path: &Path) -> Result<Vec<PathBuf>, MediaError> {
    let candidates = if path.is_dir() {
        let entries = std::fs::read_dir(path).map_err(|e| MediaError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect()
    } else if path.to_string_lossy().contains('*') {
        glob_paths(&path.to_string_lossy())?
    } else if let Some((prefix, _number, ext, _padding)) = split_sequence_path(path) {
        glob_paths(&format!("{}*.{}", glob::Pattern::escape(&prefix), ext))?
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        return Err(MediaError::Open {
            path: path.to_path_buf(),
            reason: "no such file or directory".into(),
        });
    };

    Ok(order_frames(candidates.into_iter().filter(|p| is_image_file(p)).collect()))
}

/// Keep the largest `(prefix, ext)` group and sort it by frame number.
/// Files without a trailing number sort by name after numbered ones.
fn order_frames(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut groups: HashMap<(String, String), Vec<(usize, PathBuf)>> = HashMap::new();
    let mut loose = Vec::new();
    for p in paths {
        match split_sequence_path(&p) {
            Some((prefix, number, ext, _)) => groups.entry((prefix, ext)).or_default().push((number, p)),
            None => loose.push(p),
        }
    }

    let main = groups
        .into_iter()
        .max_by(|(ka, a), (kb, b)| a.len().cmp(&b.len()).then_with(|| kb.cmp(ka)))
        .map(|(_, v)| v);

    match main {
        Some(mut frames) => {
            frames.sort_by_key(|(n, _)| *n);
            frames.into_iter().map(|(_, p)| p).collect()
        }
        None => {
            loose.sort();
            loose
        }
    }
}

fn glob_paths(pattern: &str) -> Result<Vec<PathBuf>, MediaError> {
    let entries = glob::glob(pattern)
        .map_err(|e| MediaError::Open {
            path: PathBuf::from(pattern),
            reason: format!("bad pattern: {}", e),
        })?;
    Ok(entries.filter_map(Result::ok).collect())
}

/// Split a frame filename into `(prefix, number, ext, padding)`.
///
/// `/path/seq.0001.png` -> `("/path/seq.", 1, "png", 4)`
fn split_sequence_path(path: &Path) -> Option<(String, usize, String, usize)> {
    let ext = path.extension()?.to_str()?.to_string();
    let stem = path.file_stem()?.to_str()?;

    let digit_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;

    let number_str = &stem[digit_start..];
    let number = number_str.parse::<usize>().ok()?;

    let mut prefix = String::new();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        prefix.push_str(&parent.to_string_lossy());
        if !prefix.ends_with(std::path::MAIN_SEPARATOR) {
            prefix.push(std::path::MAIN_SEPARATOR);
        }
    }
    prefix.push_str(&stem[..digit_start]);

    Some((prefix, number, ext, number_str.len()))
}
