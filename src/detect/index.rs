//! Navigation index: scenes, their shots, and subshots of long shots.
//!
//! Built once per loaded video from repeated detector calls:
//! 1. scenes over the whole video (scene threshold)
//! 2. shots inside each scene (shot threshold)
//! 3. subshots inside each shot at least `subshot_min_length` long
//!    (subshot threshold)
//!
//! An empty answer for a window yields one entry spanning the window, so
//! every scene has at least one shot. The index is immutable once built and
//! materializes as one seek button per entry in a scroll view.

use std::path::Path;

use log::{error, info};

use crate::ui::button::Button;
use crate::ui::events::SeekRequested;
use crate::ui::tree::UiTree;
use crate::ui::widget::ElementId;

use super::{BoundaryDetector, DetectError, TimeRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexLevel {
    Scene,
    Shot,
    Subshot,
}

impl IndexLevel {
    pub fn depth(&self) -> i32 {
        match self {
            IndexLevel::Scene => 0,
            IndexLevel::Shot => 1,
            IndexLevel::Subshot => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IndexLevel::Scene => "Scene",
            IndexLevel::Shot => "Shot",
            IndexLevel::Subshot => "Subshot",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub level: IndexLevel,
    /// 1-based position among siblings
    pub number: usize,
    pub range: TimeRange,
    pub children: Vec<IndexEntry>,
}

impl IndexEntry {
    pub fn label(&self) -> String {
        format!("{} {}", self.level.name(), self.number)
    }

    /// Where a click on this entry seeks to.
    pub fn seek_time(&self) -> f64 {
        self.range.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexSettings {
    pub scene_threshold: f64,
    pub shot_threshold: f64,
    pub subshot_threshold: f64,
    /// Shots at least this long (seconds) are split into subshots
    pub subshot_min_length: f64,
}

/// Row geometry for the materialized index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexLayout {
    pub row_height: i32,
    pub indent: i32,
    pub font_size: f32,
}

impl Default for IndexLayout {
    fn default() -> Self {
        Self {
            row_height: 25,
            indent: 20,
            font_size: 14.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavIndex {
    pub scenes: Vec<IndexEntry>,
    /// Non-fatal detector failures on sub-windows
    pub warnings: Vec<String>,
}

/// `found`, or one entry spanning `window` when nothing was found.
fn or_whole(found: Vec<TimeRange>, window: TimeRange) -> Vec<TimeRange> {
    if found.is_empty() { vec![window] } else { found }
}

impl NavIndex {
    /// Single scene with a single shot spanning the whole video.
    pub fn fallback(duration: f64) -> Self {
        let whole = TimeRange::new(0.0, duration.max(0.0));
        Self {
            scenes: vec![IndexEntry {
                level: IndexLevel::Scene,
                number: 1,
                range: whole,
                children: vec![IndexEntry {
                    level: IndexLevel::Shot,
                    number: 1,
                    range: whole,
                    children: Vec::new(),
                }],
            }],
            warnings: Vec::new(),
        }
    }

    /// Run the detector hierarchy. Only a scene-level failure is an error;
    /// window failures degrade to a spanning entry and a warning.
    pub fn build(
        detector: &dyn BoundaryDetector,
        video: &Path,
        duration: f64,
        settings: &IndexSettings,
    ) -> Result<Self, DetectError> {
        let whole = TimeRange::new(0.0, duration.max(0.0));
        let scenes = detector.detect(video, settings.scene_threshold, None)?;
        let scenes = or_whole(scenes, whole);
        info!("Index: {} scenes in {}", scenes.len(), video.display());

        let mut warnings = Vec::new();
        let mut sub_detect = |threshold: f64, window: TimeRange| -> Vec<TimeRange> {
            match detector.detect(video, threshold, Some(window)) {
                Ok(found) => or_whole(found, window),
                Err(e) => {
                    error!("Detector failed for {}: {}", window, e);
                    warnings.push(format!("{}: {}", window, e));
                    vec![window]
                }
            }
        };

        let mut entries = Vec::with_capacity(scenes.len());
        for (si, scene) in scenes.into_iter().enumerate() {
            let mut shots = Vec::new();
            for (shi, shot) in sub_detect(settings.shot_threshold, scene).into_iter().enumerate() {
                let subshots = if shot.length() >= settings.subshot_min_length {
                    sub_detect(settings.subshot_threshold, shot)
                        .into_iter()
                        .enumerate()
                        .map(|(i, range)| IndexEntry {
                            level: IndexLevel::Subshot,
                            number: i + 1,
                            range,
                            children: Vec::new(),
                        })
                        .collect()
                } else {
                    Vec::new()
                };
                shots.push(IndexEntry {
                    level: IndexLevel::Shot,
                    number: shi + 1,
                    range: shot,
                    children: subshots,
                });
            }
            entries.push(IndexEntry {
                level: IndexLevel::Scene,
                number: si + 1,
                range: scene,
                children: shots,
            });
        }

        Ok(Self {
            scenes: entries,
            warnings,
        })
    }

    /// Entries in display order (pre-order).
    pub fn flatten(&self) -> Vec<&IndexEntry> {
        fn walk<'a>(entries: &'a [IndexEntry], out: &mut Vec<&'a IndexEntry>) {
            for e in entries {
                out.push(e);
                walk(&e.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.scenes, &mut out);
        out
    }

    pub fn len(&self) -> usize {
        self.flatten().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Replace the content of `view` with one seek button per entry.
    /// Returns the created button ids in display order.
    pub fn populate(&self, tree: &mut UiTree, view: ElementId, layout: &IndexLayout) -> Vec<ElementId> {
        tree.clear_content(view);
        let content_width = tree
            .scroll_content(view)
            .and_then(|c| tree.base(c))
            .map_or(0, |b| b.width());

        let mut ids = Vec::new();
        for (row, entry) in self.flatten().into_iter().enumerate() {
            let x = entry.level.depth() * layout.indent + 4;
            let width = (content_width - x - 4).max(1);
            let button = Button::new(entry.label())
                .with_font_size(layout.font_size)
                .emitting(SeekRequested {
                    seconds: entry.seek_time(),
                });
            let id = tree.create(x, row as i32 * layout.row_height, width, layout.row_height - 4, button);
            tree.add_to_content(view, id);
            ids.push(id);
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::FixedDetector;
    use crate::ui::glyphs::BlockGlyphs;

    const SETTINGS: IndexSettings = IndexSettings {
        scene_threshold: 40.0,
        shot_threshold: 27.0,
        subshot_threshold: 15.0,
        subshot_min_length: 5.0,
    };

    fn r(a: f64, b: f64) -> TimeRange {
        TimeRange::new(a, b)
    }

    #[test]
    fn test_scene_without_shots_gets_one_spanning_shot() {
        let det = FixedDetector::new(vec![r(0.0, 4.0), r(4.0, 10.0)])
            .with_window(r(4.0, 10.0), vec![r(4.0, 6.0), r(6.0, 10.0)]);
        let index = NavIndex::build(&det, Path::new("v.mp4"), 10.0, &SETTINGS).unwrap();

        assert_eq!(index.scenes.len(), 2);
        assert_eq!(index.scenes[0].children.len(), 1);
        assert_eq!(index.scenes[0].children[0].range, r(0.0, 4.0));
        assert_eq!(index.scenes[1].children.len(), 2);
        assert_eq!(index.scenes[1].children[1].label(), "Shot 2");
    }

    #[test]
    fn test_long_shots_get_subshots() {
        let det = FixedDetector::new(vec![r(0.0, 12.0)])
            .with_window(r(0.0, 12.0), vec![r(0.0, 2.0), r(2.0, 12.0)])
            .with_window(r(2.0, 12.0), vec![r(2.0, 7.0), r(7.0, 12.0)]);
        let index = NavIndex::build(&det, Path::new("v.mp4"), 12.0, &SETTINGS).unwrap();

        let shots = &index.scenes[0].children;
        assert!(shots[0].children.is_empty());
        assert_eq!(shots[1].children.len(), 2);
        assert_eq!(shots[1].children[1].label(), "Subshot 2");

        // scene pass, shot pass on the scene, subshot pass on the long shot
        let calls = det.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], (40.0, None));
        assert_eq!(calls[1], (27.0, Some(r(0.0, 12.0))));
        assert_eq!(calls[2], (15.0, Some(r(2.0, 12.0))));
    }

    #[test]
    fn test_no_scenes_spans_whole_video() {
        let det = FixedDetector::new(vec![]);
        let index = NavIndex::build(&det, Path::new("v.mp4"), 3.0, &SETTINGS).unwrap();
        assert_eq!(index.scenes.len(), 1);
        assert_eq!(index.scenes[0].range, r(0.0, 3.0));
        assert_eq!(index.scenes[0].children[0].range, r(0.0, 3.0));
    }

    #[test]
    fn test_scene_failure_is_error() {
        let det = FixedDetector::failing(DetectError::Spawn("missing".into()));
        assert!(NavIndex::build(&det, Path::new("v.mp4"), 3.0, &SETTINGS).is_err());
        assert_eq!(NavIndex::fallback(3.0).len(), 2);
    }

    #[test]
    fn test_populate_rows_and_indent() {
        let det = FixedDetector::new(vec![r(0.0, 4.0), r(4.0, 8.0)]);
        let index = NavIndex::build(&det, Path::new("v.mp4"), 8.0, &SETTINGS).unwrap();
        assert_eq!(
            index.flatten().iter().map(|e| e.label()).collect::<Vec<_>>(),
            vec!["Scene 1", "Shot 1", "Scene 2", "Shot 1"]
        );

        let mut tree = UiTree::with_glyphs(Box::new(BlockGlyphs));
        let view = tree.create_scroll_view(0, 0, 200, 60, 10);
        let layout = IndexLayout::default();
        let ids = index.populate(&mut tree, view, &layout);
        assert_eq!(ids.len(), 4);
        assert_eq!(tree.content_extent(view), Some(3 * 25 + 21));
        let shot = tree.base(ids[1]).unwrap();
        assert_eq!((shot.x, shot.y), (24, 25));

        // Rebuild replaces the old rows
        let ids2 = index.populate(&mut tree, view, &layout);
        assert!(!tree.contains(ids[0]));
        assert_eq!(tree.children(tree.scroll_content(view).unwrap()), ids2.as_slice());
    }
}
