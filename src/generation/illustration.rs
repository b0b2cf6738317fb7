//! Illustration generation with a caption overlay.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::generation::provider::{ImageProvider, ProviderError};

pub const FONT_SIZE: f32 = 65.0;
pub const LINE_HEIGHT: u32 = FONT_SIZE as u32 + 10;
pub const MARGIN: u32 = 100;
pub const PADDING: u32 = 20;
pub const BACKDROP: Rgba<u8> = Rgba([0, 0, 128, 180]);
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Fonts probed when no explicit path is configured.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "C:/Windows/Fonts/arial.ttf",
    "/usr/share/fonts/truetype/freefont/FreeMono.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

/// DejaVu Sans, used when neither the configured path nor a system font loads.
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptionError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("caption task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Caption(#[from] CaptionError),
}

/// Greedy word wrap: words are appended while the measured line fits.
///
/// A single word wider than `max_width` still gets its own line.
pub fn wrap_words<F>(text: &str, max_width: u32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> u32,
{
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure(&candidate) <= max_width {
            line = candidate;
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Blends `color` over the rectangle, clipped to the image bounds.
fn blend_rect(img: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    let alpha = f32::from(color[3]) / 255.0;
    let x_end = x.saturating_add(width).min(img.width());
    let y_end = y.saturating_add(height).min(img.height());

    for py in y..y_end {
        for px in x..x_end {
            let pixel = img.get_pixel_mut(px, py);
            for c in 0..3 {
                let blended =
                    f32::from(color[c]) * alpha + f32::from(pixel[c]) * (1.0 - alpha);
                pixel[c] = blended.round() as u8;
            }
        }
    }
}

// == Caption Renderer ==
#[derive(Clone)]
pub struct CaptionRenderer {
    font: Option<Arc<FontVec>>,
}

impl Default for CaptionRenderer {
    fn default() -> Self {
        Self::bundled()
    }
}

impl std::fmt::Debug for CaptionRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionRenderer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl CaptionRenderer {
    /// Loads the configured font, falling back to common system fonts.
    pub fn load(configured: Option<&Path>) -> Self {
        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    info!(path = %path.display(), "caption font loaded");
                    return Self {
                        font: Some(Arc::new(font)),
                    };
                }
                Err(e) => warn!(path = %path.display(), error = %e, "unusable caption font"),
            }
        }

        info!("no system caption font found, using the bundled one");
        Self::bundled()
    }

    /// Renderer backed by the font compiled into the binary.
    pub fn bundled() -> Self {
        match FontVec::try_from_vec(BUNDLED_FONT.to_vec()) {
            Ok(font) => Self {
                font: Some(Arc::new(font)),
            },
            Err(e) => {
                warn!(error = %e, "bundled caption font unusable, captions will render backdrop only");
                Self::without_font()
            }
        }
    }

    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn measure(&self, text: &str) -> u32 {
        match &self.font {
            Some(font) => text_size(PxScale::from(FONT_SIZE), font.as_ref(), text).0,
            // Rough advance so wrapping still produces sensible lines.
            None => (text.chars().count() as f32 * FONT_SIZE * 0.5) as u32,
        }
    }

    /// Draws `caption` over the encoded image and returns JPEG bytes.
    pub fn render(&self, image_bytes: &[u8], caption: &str) -> Result<Vec<u8>, CaptionError> {
        let mut img = image::load_from_memory(image_bytes)
            .map_err(|e| CaptionError::Decode(e.to_string()))?
            .to_rgba8();
        let (width, height) = img.dimensions();

        let wrap_width = width.saturating_sub(2 * MARGIN);
        let lines = wrap_words(caption, wrap_width, |s| self.measure(s));
        let text_height = lines.len() as u32 * LINE_HEIGHT;

        blend_rect(
            &mut img,
            MARGIN,
            MARGIN,
            wrap_width,
            text_height + PADDING,
            BACKDROP,
        );

        if let Some(font) = &self.font {
            let scale = PxScale::from(FONT_SIZE);
            let mut y = MARGIN + PADDING / 2;
            for line in &lines {
                let line_width = self.measure(line);
                let x = (width.saturating_sub(line_width) / 2) as i32;
                draw_text_mut(&mut img, TEXT_COLOR, x, y as i32, scale, font.as_ref(), line);
                y += LINE_HEIGHT;
            }
        } else {
            warn!("caption font unavailable, drawing backdrop only");
        }
        debug!(width, height, lines = lines.len(), "caption rendered");

        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .write_to(&mut out, ImageFormat::Jpeg)
            .map_err(|e| CaptionError::Encode(e.to_string()))?;
        Ok(out.into_inner())
    }
}

// == Image Generator ==
#[derive(Clone)]
pub struct ImageGenerator {
    provider: Arc<dyn ImageProvider>,
    renderer: CaptionRenderer,
}

impl std::fmt::Debug for ImageGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageGenerator")
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

impl ImageGenerator {
    pub fn new(provider: Arc<dyn ImageProvider>, renderer: CaptionRenderer) -> Self {
        Self { provider, renderer }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Generates an image for `prompt` and overlays `caption` on it.
    pub async fn generate_with_caption(
        &self,
        prompt: &str,
        caption: &str,
    ) -> Result<Vec<u8>, ImageError> {
        let raw = self.provider.generate(prompt).await?;

        let renderer = self.renderer.clone();
        let caption = caption.to_string();
        let jpeg = tokio::task::spawn_blocking(move || renderer.render(&raw, &caption))
            .await
            .map_err(|e| CaptionError::Task(e.to_string()))??;

        info!(bytes = jpeg.len(), "captioned image ready");
        Ok(jpeg)
    }
}
