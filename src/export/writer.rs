use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use image::DynamicImage;

use super::{ExportTarget, Naming, Slice, SlicePlan};
use crate::codec;
use crate::error::ExportError;
use crate::event::ExportProgress;

/// A slice that made it to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// 1-based counter used in the file name
    pub index: usize,
    pub path: PathBuf,
    pub slice: Slice,
}

/// A slice that could not be encoded or written. Earlier files are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceFailure {
    pub index: usize,
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub directory: PathBuf,
    pub written: Vec<WrittenFile>,
    /// Zero-height boundary pairs dropped while planning
    pub skipped: usize,
    pub failures: Vec<SliceFailure>,
    /// Stopped early at a cancellation checkpoint
    pub cancelled: bool,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.written.is_empty() {
            parts.push(format!("saved {} slice(s)", self.written.len()));
        }
        if self.skipped > 0 {
            parts.push(format!("skipped {} slice(s)", self.skipped));
        }
        if !self.failures.is_empty() {
            parts.push(format!("errors: {}", self.failures.len()));
        }
        if self.cancelled {
            parts.push("cancelled".to_owned());
        }
        if parts.is_empty() {
            "no work done".to_owned()
        } else {
            parts.join(", ")
        }
    }
}

/// Crops, encodes and writes every slice of `plan` into `directory`, in order.
///
/// The directory is created if missing; failing that aborts before anything is
/// written. After that, a failing slice is recorded in the report and the loop moves
/// on. `cancel` is checked after each slice; files already written stay on disk.
pub fn export_slices(
    image: &DynamicImage,
    plan: &SlicePlan,
    target: &ExportTarget,
    naming: &Naming,
    directory: &Path,
    cancel: &AtomicBool,
    mut on_progress: impl FnMut(ExportProgress),
) -> Result<ExportReport, ExportError> {
    fs::create_dir_all(directory).map_err(|source| ExportError::Destination {
        path: directory.to_path_buf(),
        source,
    })?;

    let total = plan.len();
    let width = image.width();
    let mut report = ExportReport {
        directory: directory.to_path_buf(),
        skipped: plan.skipped,
        ..Default::default()
    };

    log::info!(
        "Exporting {} slice(s) to {} ({} skipped)",
        total,
        directory.display(),
        plan.skipped
    );

    for (offset, slice) in plan.slices.iter().enumerate() {
        let index = offset + 1;
        let path = directory.join(naming.file_name(index, total, &target.extension));

        match write_slice(image, width, *slice, target, index, &path) {
            Ok(()) => {
                log::debug!("Wrote {}", path.display());
                report.written.push(WrittenFile {
                    index,
                    path,
                    slice: *slice,
                });
            }
            Err(err) => {
                log::error!("{err}");
                report.failures.push(SliceFailure {
                    index,
                    path,
                    message: err.to_string(),
                });
            }
        }

        on_progress(ExportProgress { done: index, total });

        if cancel.load(Ordering::Relaxed) && index < total {
            log::info!("Export cancelled after {index} of {total} slice(s)");
            report.cancelled = true;
            break;
        }
    }

    Ok(report)
}

fn write_slice(
    image: &DynamicImage,
    width: u32,
    slice: Slice,
    target: &ExportTarget,
    index: usize,
    path: &Path,
) -> Result<(), ExportError> {
    let strip = image.crop_imm(0, slice.y_start, width, slice.height());
    let bytes = codec::encode(&strip, target.encoding)
        .map_err(|source| ExportError::Encode { index, source })?;
    fs::write(path, bytes).map_err(|source| ExportError::Write {
        index,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::compute_slices;
    use image::{Rgba, RgbaImage};

    fn striped(width: u32, height: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(width, height, |_, y| Rgba([(y % 256) as u8, 0, 0, 255]));
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_writes_contiguous_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        let image = striped(8, 100);
        let plan = compute_slices(100, &[0.0, 30.0, 30.0, 70.0]);
        let mut progress = Vec::new();

        let report = export_slices(
            &image,
            &plan,
            &ExportTarget::png(),
            &Naming::default(),
            dir.path(),
            &AtomicBool::new(false),
            |p| progress.push(p.done),
        )
        .unwrap();

        assert!(report.is_success());
        assert_eq!(report.skipped, 2);
        let names: Vec<String> = report
            .written
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["001.png", "002.png", "003.png"]);
        assert_eq!(progress, vec![1, 2, 3]);

        let second = image::open(dir.path().join("002.png")).unwrap();
        assert_eq!((second.width(), second.height()), (8, 40));
        // First row of the second strip is source row 30
        assert_eq!(second.to_rgba8().get_pixel(0, 0)[0], 30);
    }

    #[test]
    fn test_cancel_stops_between_slices() {
        let dir = tempfile::tempdir().unwrap();
        let image = striped(4, 40);
        let plan = compute_slices(40, &[10.0, 20.0, 30.0]);
        let cancel = AtomicBool::new(false);

        let report = export_slices(
            &image,
            &plan,
            &ExportTarget::png(),
            &Naming::default(),
            dir.path(),
            &cancel,
            |p| {
                if p.done == 2 {
                    cancel.store(true, Ordering::Relaxed);
                }
            },
        )
        .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.written.len(), 2);
        assert!(dir.path().join("002.png").exists());
        assert!(!dir.path().join("003.png").exists());
    }

    #[test]
    fn test_write_failure_keeps_earlier_slices() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the second file name makes that write fail
        fs::create_dir(dir.path().join("002.png")).unwrap();
        let image = striped(4, 30);
        let plan = compute_slices(30, &[10.0, 20.0]);

        let report = export_slices(
            &image,
            &plan,
            &ExportTarget::png(),
            &Naming::default(),
            dir.path(),
            &AtomicBool::new(false),
            |_| {},
        )
        .unwrap();

        assert_eq!(report.written.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert!(dir.path().join("001.png").is_file());
        assert!(dir.path().join("003.png").is_file());
        assert_eq!(report.summary(), "saved 2 slice(s), errors: 1");
    }

    #[test]
    fn test_destination_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let image = striped(4, 10);

        let err = export_slices(
            &image,
            &compute_slices(10, &[]),
            &ExportTarget::png(),
            &Naming::default(),
            &blocker.join("out"),
            &AtomicBool::new(false),
            |_| {},
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::Destination { .. }));
    }
}
