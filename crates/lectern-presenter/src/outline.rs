//! Presenter-side views of a class: pause list, outline and media gallery.

use lectern_models::{format_time, ClassConfig, MediaItem, MediaKind};
use serde::Serialize;

use crate::matcher::{match_section, MatchReason};

/// One row of the pause list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseEntry {
    pub index: usize,
    pub label: String,
    pub time: f64,
    pub time_label: String,
}

/// Shown instead of the pause list when a class has no pause points.
pub const NO_PAUSES_MESSAGE: &str = "No planned pauses yet.";

/// Pause points in display order.
pub fn pause_list(class: &ClassConfig) -> Vec<PauseEntry> {
    class
        .pause_points
        .iter()
        .enumerate()
        .map(|(index, point)| PauseEntry {
            index,
            label: point.label.clone(),
            time: point.time,
            time_label: format_time(point.time),
        })
        .collect()
}

/// An outline section with its jump target, if it has one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAffordance {
    pub section_id: String,
    pub summary: String,
    /// Present only when the section maps to a pause point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jump: Option<JumpTarget>,
}

/// Pause point a section jumps to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpTarget {
    pub index: usize,
    pub time_label: String,
    pub reason: MatchReason,
}

/// Builds an affordance per outline section.
pub fn outline_affordances(class: &ClassConfig) -> Vec<SectionAffordance> {
    class
        .outline
        .iter()
        .map(|section| {
            let jump = match_section(&section.summary, &class.pause_points).and_then(|matched| {
                let point = class.pause_points.get(matched.index)?;
                Some(JumpTarget {
                    index: matched.index,
                    time_label: format_time(point.time),
                    reason: matched.reason,
                })
            });
            SectionAffordance {
                section_id: section.id.clone(),
                summary: section.summary.clone(),
                jump,
            }
        })
        .collect()
}

/// A media gallery entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub index: usize,
    pub item: MediaItem,
    /// Title of the outline section the item came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
}

impl MediaEntry {
    /// Title to show, falling back to the locator.
    pub fn display_title(&self) -> String {
        self.item
            .title
            .clone()
            .or_else(|| self.item.reference.clone())
            .or_else(|| self.item.url().map(str::to_string))
            .unwrap_or_else(|| self.item.kind.clone())
    }

    /// Links open on the presenter's machine rather than on a display.
    pub fn opens_locally(&self) -> bool {
        self.item.media_kind() == Some(MediaKind::Link)
    }
}

/// Class media followed by each section's media.
pub fn media_entries(class: &ClassConfig) -> Vec<MediaEntry> {
    let class_media = class.media.iter().map(|item| (item, None));
    let section_media = class.outline.iter().flat_map(|section| {
        section
            .media
            .iter()
            .map(move |item| (item, Some(section.summary.clone())))
    });

    class_media
        .chain(section_media)
        .enumerate()
        .map(|(index, (item, section_title))| MediaEntry {
            index,
            item: item.clone(),
            section_title,
        })
        .collect()
}
