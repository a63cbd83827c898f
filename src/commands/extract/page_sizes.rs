use super::*;

/// Replaces each page's size with its image dimensions when the image can be read.
///
/// Relative image paths are resolved against `hocr_dir`. Pages whose image is
/// missing keep the size from their HOCR title, if any.
pub(super) fn resolve_page_sizes(pages: &mut [Page], hocr_dir: &Path, warnings: &mut Vec<String>) {
    for page in pages.iter_mut() {
        if page.file.is_empty() {
            continue;
        }

        let image_path = resolve_image_path(hocr_dir, &page.file);
        if !image_path.is_file() {
            continue;
        }

        match image::image_dimensions(&image_path) {
            Ok((width, height)) => page.size = Some(ImageSize { width, height }),
            Err(err) => {
                let message = format!(
                    "failed to read image size for page {} ({}): {err}",
                    page.page_num + 1,
                    image_path.display()
                );
                warn!(path = %image_path.display(), error = %err, "image size unavailable");
                warnings.push(message);
            }
        }
    }
}

pub(super) fn resolve_image_path(hocr_dir: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        hocr_dir.join(path)
    }
}
