//! Font loading and glyph rasterization for the CPU-drawn panels. One font is
//! installed per process; glyph bitmaps are cached per character and pixel
//! size.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use fontdue::{Font, FontSettings};
use once_cell::sync::{Lazy, OnceCell};
use thiserror::Error;

use crate::canvas::Canvas;

/// Tried in order when no `--font` is given.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT: OnceCell<Font> = OnceCell::new();
static GLYPH_CACHE: Lazy<Mutex<HashMap<(char, u32), GlyphBitmap>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Debug, Error)]
pub enum FontError {
    #[error("reading font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing font {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("no usable system font found (tried {tried} locations); pass --font")]
    NotFound { tried: usize },
}

#[derive(Clone)]
struct GlyphBitmap {
    width: usize,
    height: usize,
    xmin: i32,
    ymin: i32,
    advance: f32,
    alpha: Arc<[u8]>,
}

/// Load the overlay font from `path`, or from the first readable system
/// font. Later calls return the font installed first.
pub fn install_font(path: Option<&Path>) -> Result<Typeface, FontError> {
    if let Some(font) = FONT.get() {
        return Ok(Typeface { font });
    }
    let font = match path {
        Some(path) => load_font(path)?,
        None => load_system_font()?,
    };
    let font = FONT.get_or_init(|| font);
    Ok(Typeface { font })
}

fn load_font(path: &Path) -> Result<Font, FontError> {
    let data = fs::read(path).map_err(|source| FontError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let font = Font::from_bytes(data, FontSettings::default()).map_err(|message| {
        FontError::Parse {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    })?;
    log::info!("overlay font loaded from {}", path.display());
    Ok(font)
}

fn load_system_font() -> Result<Font, FontError> {
    for candidate in SYSTEM_FONT_CANDIDATES {
        let path = Path::new(candidate);
        if !path.is_file() {
            continue;
        }
        match load_font(path) {
            Ok(font) => return Ok(font),
            Err(err) => log::debug!("skipping system font: {err}"),
        }
    }
    Err(FontError::NotFound {
        tried: SYSTEM_FONT_CANDIDATES.len(),
    })
}

/// Handle to the installed font.
#[derive(Clone, Copy)]
pub struct Typeface {
    font: &'static Font,
}

impl Typeface {
    pub fn line_height(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|metrics| metrics.new_line_size)
            .unwrap_or(size * 1.25)
            .ceil()
    }

    fn ascent(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|metrics| metrics.ascent)
            .unwrap_or(size)
    }

    pub fn measure(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|ch| self.glyph(ch, size).advance).sum()
    }

    /// Greedy word wrap to `max_width` pixels. Words wider than a line are
    /// kept whole on their own line.
    pub fn wrap(&self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let space = self.measure(" ", size);
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut line = String::new();
            let mut width = 0.0;
            for word in paragraph.split_whitespace() {
                let word_width = self.measure(word, size);
                if !line.is_empty() && width + space + word_width > max_width {
                    lines.push(std::mem::take(&mut line));
                    width = 0.0;
                }
                if !line.is_empty() {
                    line.push(' ');
                    width += space;
                }
                line.push_str(word);
                width += word_width;
            }
            lines.push(line);
        }
        lines
    }

    /// Draw one line with its top edge at `y`; returns the pen x after the
    /// last glyph.
    pub fn draw(&self, canvas: &mut Canvas, x: f32, y: f32, text: &str, size: f32, color: [u8; 4]) -> f32 {
        let baseline = (y + self.ascent(size)).round() as i32;
        let mut pen = x;
        for ch in text.chars() {
            let glyph = self.glyph(ch, size);
            if glyph.width > 0 && glyph.height > 0 {
                let left = pen.round() as i32 + glyph.xmin;
                let top = baseline - glyph.ymin - glyph.height as i32;
                canvas.blend_coverage(left, top, glyph.width, glyph.height, &glyph.alpha, color);
            }
            pen += glyph.advance;
        }
        pen
    }

    /// Draw wrapped text and return the y just below the last line.
    pub fn draw_wrapped(
        &self,
        canvas: &mut Canvas,
        x: f32,
        y: f32,
        max_width: f32,
        text: &str,
        size: f32,
        color: [u8; 4],
    ) -> f32 {
        let line_height = self.line_height(size);
        let mut cursor = y;
        for line in self.wrap(text, size, max_width) {
            self.draw(canvas, x, cursor, &line, size, color);
            cursor += line_height;
        }
        cursor
    }

    fn glyph(&self, ch: char, size: f32) -> GlyphBitmap {
        let key = (ch, size.to_bits());
        let mut cache = GLYPH_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(key)
            .or_insert_with(|| {
                let (metrics, alpha) = self.font.rasterize(ch, size);
                GlyphBitmap {
                    width: metrics.width,
                    height: metrics.height,
                    xmin: metrics.xmin,
                    ymin: metrics.ymin,
                    advance: metrics.advance_width,
                    alpha: Arc::from(alpha),
                }
            })
            .clone()
    }
}
