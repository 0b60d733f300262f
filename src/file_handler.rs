use std::path::{Path, PathBuf};

use egui::{Align2, Color32, Id, LayerId, Order, TextStyle};
use image::ImageFormat;

/// Turns files dropped on the window into an image path to open.
#[derive(Debug, Default)]
pub struct FileHandler;

impl FileHandler {
    /// The first dropped file this frame that looks like an image we can decode.
    ///
    /// Only one image can be open, so any further dropped files are ignored.
    pub fn take_dropped_image(&self, ctx: &egui::Context) -> Option<PathBuf> {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if dropped.is_empty() {
            return None;
        }

        let path = dropped.iter().find(|path| is_image_path(path)).cloned();
        match &path {
            Some(path) => {
                log::info!("Image dropped: {}", path.display());
                if dropped.len() > 1 {
                    log::warn!("{} files dropped, opening only the first image", dropped.len());
                }
            }
            None => log::warn!("Dropped file is not a supported image: {}", dropped[0].display()),
        }
        path
    }

    /// Dims the window and lists the files while they hover over it.
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }

        let text = ctx.input(|i| {
            let mut text = "Drop to open:\n".to_owned();
            for file in &i.raw.hovered_files {
                match &file.path {
                    Some(path) => text += &format!("\n{}", path.display()),
                    None => text += "\n(path not available)",
                }
            }
            text
        });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            TextStyle::Heading.resolve(&ctx.style()),
            Color32::WHITE,
        );
    }
}

/// True when the extension names a format the codec can read.
pub fn is_image_path(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok_and(|format| format.reading_enabled())
}
