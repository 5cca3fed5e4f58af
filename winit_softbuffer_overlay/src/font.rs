use std::path::Path;

use cairo::freetype;
use cairo::{FontFace, FontSlant, FontWeight};
use log::{error, info, warn};
use overlay_core::OverlayError;

/// Font face used for every text widget.
///
/// The FreeType library backing a loaded face lives as long as the face.
pub struct OverlayFont {
    face: Option<FontFace>,
    _library: Option<freetype::Library>,
}

impl OverlayFont {
    pub fn face(&self) -> Option<&FontFace> {
        self.face.as_ref()
    }

    fn fallback() -> Self {
        let face = match FontFace::toy_create("sans-serif", FontSlant::Normal, FontWeight::Normal) {
            Ok(face) => Some(face),
            Err(e) => {
                warn!("Fallback font face unavailable, using cairo default: {}", e);
                None
            }
        };
        Self {
            face,
            _library: None,
        }
    }
}

fn load_from_file(path: &Path) -> Result<OverlayFont, OverlayError> {
    let library = freetype::Library::init()
        .map_err(|e| OverlayError::font(format!("FreeType init failed: {}", e)))?;
    let ft_face = library
        .new_face(path, 0)
        .map_err(|e| OverlayError::font(format!("{}: {}", path.display(), e)))?;
    let face = FontFace::create_from_ft(&ft_face)
        .map_err(|e| OverlayError::font(format!("cairo font face: {}", e)))?;

    Ok(OverlayFont {
        face: Some(face),
        _library: Some(library),
    })
}

/// Loads the overlay font, falling back to a toolkit face on any failure.
pub fn load_font(path: &Path) -> OverlayFont {
    match load_from_file(path) {
        Ok(font) => {
            info!("Loaded font {}", path.display());
            font
        }
        Err(e) => {
            error!("Failed to load font. {}", e);
            OverlayFont::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_is_not_fatal() {
        let font = load_font(Path::new("definitely/not/here/font.ttf"));
        // 回退字体可能为 None（cairo 默认），但不应 panic
        let _ = font.face();
    }

    #[test]
    fn missing_font_reports_path() {
        let err = load_from_file(Path::new("missing-font.ttf"))
            .err()
            .expect("loading a missing file should fail");
        assert!(err.to_string().contains("missing-font.ttf"));
    }
}
