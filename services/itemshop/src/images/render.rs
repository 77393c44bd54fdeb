//! Promotional card per shop section.
//!
//! The section background is scaled to a fixed card size and darkened toward
//! the bottom. The title goes across the top and an info panel sits in the
//! middle, then the whole card gets a soft rounded border. Text is only drawn
//! when a font could be loaded; without one the card keeps the background
//! and shapes.

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use chrono::FixedOffset;
use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use crate::catalog::CanonicalSection;
use crate::images::store::sanitize_file_name;
use crate::timebucket::display_date;

pub const CARD_WIDTH: u32 = 750;
pub const CARD_HEIGHT: u32 = 422;

const TITLE_PX: f32 = 56.0;
const INFO_PX: f32 = 32.0;
const TITLE_Y: i32 = 28;
const FADE_MAX_ALPHA: u32 = 200;
const PANEL_MARGIN_X: u32 = 40;
const PANEL_HEIGHT: u32 = 120;
const PANEL_RADIUS: u32 = 20;
const PANEL_ALPHA: u8 = 160;
const BORDER_INSET: u32 = 4;
const BORDER_RADIUS: u32 = 24;
const BORDER_WIDTH: u32 = 3;
const BORDER_ALPHA: u8 = 60;

const UNTITLED: &str = "無題セクション";
const UNKNOWN_ID: &str = "unknown_id";

/// Load a TrueType/OpenType font, logging instead of failing.
pub fn load_font(path: &Path) -> Option<FontVec> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read font {:?}: {}", path, e);
            return None;
        }
    };
    match FontVec::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("Failed to parse font {:?}: {}", path, e);
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RoundedRect {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
    radius: u32,
}

impl RoundedRect {
    fn contains(&self, x: u32, y: u32) -> bool {
        if x < self.x0 || x >= self.x1 || y < self.y0 || y >= self.y1 {
            return false;
        }
        let r = self
            .radius
            .min((self.x1 - self.x0 - 1) / 2)
            .min((self.y1 - self.y0 - 1) / 2) as i64;
        let (x, y) = (x as i64, y as i64);
        let cx = x.clamp(self.x0 as i64 + r, self.x1 as i64 - 1 - r);
        let cy = y.clamp(self.y0 as i64 + r, self.y1 as i64 - 1 - r);
        let (dx, dy) = (x - cx, y - cy);
        dx * dx + dy * dy <= r * r
    }

    fn shrink(&self, by: u32) -> Self {
        Self {
            x0: self.x0 + by,
            y0: self.y0 + by,
            x1: self.x1.saturating_sub(by),
            y1: self.y1.saturating_sub(by),
            radius: self.radius.saturating_sub(by),
        }
    }
}

/// Source-over blend of a flat colour onto one pixel.
fn blend(pixel: &mut Rgba<u8>, color: [u8; 3], alpha: u8) {
    let a = alpha as u32;
    let inv = 255 - a;
    for (channel, c) in pixel.0.iter_mut().take(3).zip(color) {
        *channel = ((*channel as u32 * inv + c as u32 * a) / 255) as u8;
    }
    pixel.0[3] = (a + pixel.0[3] as u32 * inv / 255).min(255) as u8;
}

fn apply_fade(img: &mut RgbaImage) {
    let height = img.height();
    for (_, y, pixel) in img.enumerate_pixels_mut() {
        let alpha = (y * FADE_MAX_ALPHA / height) as u8;
        blend(pixel, [0, 0, 0], alpha);
    }
}

fn fill_rounded(img: &mut RgbaImage, rect: RoundedRect, color: [u8; 3], alpha: u8) {
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        if rect.contains(x, y) {
            blend(pixel, color, alpha);
        }
    }
}

fn outline_rounded(img: &mut RgbaImage, rect: RoundedRect, width: u32, color: [u8; 3], alpha: u8) {
    let inner = rect.shrink(width);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        if rect.contains(x, y) && !inner.contains(x, y) {
            blend(pixel, color, alpha);
        }
    }
}

/// Text with a dark outline drawn by offsetting the shadow around it.
fn draw_outlined_text(img: &mut RgbaImage, font: &FontVec, scale: PxScale, x: i32, y: i32, stroke: i32, text: &str) {
    let shadow = Rgba([0, 0, 0, 200]);
    for dx in [-stroke, 0, stroke] {
        for dy in [-stroke, 0, stroke] {
            if dx != 0 || dy != 0 {
                draw_text_mut(img, shadow, x + dx, y + dy, scale, font, text);
            }
        }
    }
    draw_text_mut(img, Rgba([255, 255, 255, 240]), x, y, scale, font, text);
}

/// Words printed on a card: the title and the panel lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardText {
    pub title: String,
    pub info: [String; 3],
}

impl CardText {
    pub fn for_section(section: &CanonicalSection, offset: FixedOffset) -> Self {
        Self {
            title: section.display_name.as_deref().unwrap_or(UNTITLED).to_string(),
            info: [
                format!("ID  {}", section.section_id.as_deref().unwrap_or(UNKNOWN_ID)),
                format!("#  {} セクション", section.offer_groups_count),
                display_date(section.stack_rank_start.as_deref(), offset),
            ],
        }
    }
}

/// Left edge that centers text of `width` pixels on the card.
fn centered_x(width: u32) -> i32 {
    (CARD_WIDTH as i32 - width as i32) / 2
}

/// Compose the card for `section` over the encoded background image `background`.
pub fn render_card(
    section: &CanonicalSection,
    background: &[u8],
    font: Option<&FontVec>,
    offset: FixedOffset,
) -> Result<RgbaImage> {
    let mut img = image::load_from_memory(background)
        .context("Failed to decode background image")?
        .resize_exact(CARD_WIDTH, CARD_HEIGHT, FilterType::Lanczos3)
        .to_rgba8();

    apply_fade(&mut img);

    let panel = RoundedRect {
        x0: PANEL_MARGIN_X,
        y0: (CARD_HEIGHT - PANEL_HEIGHT) / 2,
        x1: CARD_WIDTH - PANEL_MARGIN_X,
        y1: (CARD_HEIGHT + PANEL_HEIGHT) / 2,
        radius: PANEL_RADIUS,
    };
    fill_rounded(&mut img, panel, [0, 0, 0], PANEL_ALPHA);

    if let Some(font) = font {
        let text = CardText::for_section(section, offset);
        let title_scale = PxScale::from(TITLE_PX);
        let (title_w, _) = text_size(title_scale, font, &text.title);
        draw_outlined_text(&mut img, font, title_scale, centered_x(title_w), TITLE_Y, 3, &text.title);

        let info_scale = PxScale::from(INFO_PX);
        let mut y = panel.y0 as i32 + 20;
        for line in &text.info {
            draw_outlined_text(&mut img, font, info_scale, panel.x0 as i32 + 30, y, 2, line);
            y += INFO_PX as i32 + 10;
        }
    }

    let border = RoundedRect {
        x0: BORDER_INSET,
        y0: BORDER_INSET,
        x1: CARD_WIDTH - BORDER_INSET,
        y1: CARD_HEIGHT - BORDER_INSET,
        radius: BORDER_RADIUS,
    };
    outline_rounded(&mut img, border, BORDER_WIDTH, [255, 255, 255], BORDER_ALPHA);

    Ok(img)
}

/// File name for a section's card.
pub fn card_file_name(section: &CanonicalSection) -> String {
    sanitize_file_name(&format!("{}.png", section.label().unwrap_or(UNKNOWN_ID)))
}

/// Write `img` as PNG through a temporary file so readers never see a partial card.
pub fn save_card(img: &RgbaImage, out_dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory: {:?}", out_dir))?;

    let final_path = out_dir.join(file_name);
    let tmp_path = out_dir.join(format!("{}.__tmp", file_name));

    let result = img
        .save_with_format(&tmp_path, ImageFormat::Png)
        .context("Failed to encode card")
        .and_then(|_| {
            std::fs::rename(&tmp_path, &final_path)
                .with_context(|| format!("Failed to move card into place: {:?}", final_path))
        });

    if result.is_err() && tmp_path.exists() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result?;

    Ok(final_path)
}

pub struct SectionRenderer {
    out_dir: PathBuf,
    font: Option<FontVec>,
    offset: FixedOffset,
}

impl SectionRenderer {
    pub fn new(out_dir: PathBuf, font_path: Option<&str>, offset: FixedOffset) -> Self {
        let font = font_path.and_then(|p| load_font(Path::new(p)));
        if font.is_none() {
            info!("No font loaded; section cards will be rendered without text");
        }
        Self {
            out_dir,
            font,
            offset,
        }
    }

    pub fn render(&self, section: &CanonicalSection, background: &[u8]) -> Result<PathBuf> {
        let card = render_card(section, background, self.font.as_ref(), self.offset)?;
        let path = save_card(&card, &self.out_dir, &card_file_name(section))?;
        info!("Saved section card to {:?}", path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timebucket::jst;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 180, 40, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn section() -> CanonicalSection {
        CanonicalSection {
            section_id: Some("Jam:Tracks".to_string()),
            display_name: Some("ジャムトラック".to_string()),
            offer_groups_count: 2,
            stack_rank_start: Some("2025-09-20T00:00:00.000Z".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_card_without_font() {
        let card = render_card(&section(), &png_bytes(100, 60), None, jst()).unwrap();
        assert_eq!(card.dimensions(), (CARD_WIDTH, CARD_HEIGHT));

        // Top row is barely faded, bottom row is much darker.
        let top = card.get_pixel(CARD_WIDTH / 2, 10).0[0];
        let bottom = card.get_pixel(CARD_WIDTH / 2, CARD_HEIGHT - 10).0[0];
        assert!(top > bottom);

        // Panel darkens the middle compared with the same row outside it.
        let inside = card.get_pixel(CARD_WIDTH / 2, CARD_HEIGHT / 2).0[0];
        let outside = card.get_pixel(PANEL_MARGIN_X / 2, CARD_HEIGHT / 2).0[0];
        assert!(inside < outside);
    }

    #[test]
    fn test_render_card_rejects_garbage() {
        assert!(render_card(&section(), b"not an image", None, jst()).is_err());
    }

    #[test]
    fn test_rounded_rect_corners() {
        let rect = RoundedRect { x0: 0, y0: 0, x1: 100, y1: 50, radius: 10 };
        assert!(rect.contains(50, 25));
        assert!(!rect.contains(0, 0));
        assert!(rect.contains(10, 0));
        assert!(!rect.contains(100, 25));
    }

    #[test]
    fn test_card_file_name() {
        assert_eq!(card_file_name(&section()), "JamTracks.png");
        assert_eq!(card_file_name(&CanonicalSection::default()), "unknown_id.png");
    }

    #[test]
    fn test_renderer_saves_png() {
        let temp_dir = TempDir::new().unwrap();
        let renderer = SectionRenderer::new(temp_dir.path().to_path_buf(), None, jst());

        let path = renderer.render(&section(), &png_bytes(40, 40)).unwrap();
        assert_eq!(path, temp_dir.path().join("JamTracks.png"));
        assert!(path.exists());
        assert!(!temp_dir.path().join("JamTracks.png.__tmp").exists());

        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.width(), CARD_WIDTH);
    }

    const SYSTEM_FONTS: [&str; 3] = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/Library/Fonts/Arial Unicode.ttf",
    ];

    fn system_font() -> Option<FontVec> {
        SYSTEM_FONTS
            .iter()
            .map(Path::new)
            .filter(|p| p.exists())
            .find_map(load_font)
    }

    #[test]
    fn test_card_text() {
        let text = CardText::for_section(&section(), jst());
        assert_eq!(text.title, "ジャムトラック");
        assert_eq!(text.info[0], "ID  Jam:Tracks");
        assert_eq!(text.info[1], "#  2 セクション");
        assert_eq!(text.info[2], "9月20日");

        let blank = CardText::for_section(&CanonicalSection::default(), jst());
        assert_eq!(blank.title, UNTITLED);
        assert_eq!(blank.info[0], "ID  unknown_id");
        assert_eq!(blank.info[2], "-");
    }

    #[test]
    fn test_centered_x() {
        assert_eq!(centered_x(0), CARD_WIDTH as i32 / 2);
        assert_eq!(centered_x(CARD_WIDTH), 0);
        assert_eq!(centered_x(CARD_WIDTH + 100), -50);
    }

    #[test]
    fn test_render_card_with_font_draws_text() {
        let Some(font) = system_font() else {
            eprintln!("no system font found; skipping text rendering check");
            return;
        };
        let section = CanonicalSection {
            section_id: Some("Daily".to_string()),
            display_name: Some("Daily Items".to_string()),
            offer_groups_count: 4,
            stack_rank_start: Some("2025-09-20T00:00:00.000Z".to_string()),
            ..Default::default()
        };
        let background = png_bytes(100, 60);

        let plain = render_card(&section, &background, None, jst()).unwrap();
        let texted = render_card(&section, &background, Some(&font), jst()).unwrap();
        assert_eq!(texted.dimensions(), plain.dimensions());

        let title_band = (TITLE_Y as u32)..(TITLE_Y as u32 + TITLE_PX as u32);
        let changed = title_band
            .flat_map(|y| (0..CARD_WIDTH).map(move |x| (x, y)))
            .filter(|&(x, y)| texted.get_pixel(x, y) != plain.get_pixel(x, y))
            .count();
        assert!(changed > 0);

        // Left edge stays clear of the centered title.
        for y in (TITLE_Y as u32)..(TITLE_Y as u32 + 10) {
            assert_eq!(texted.get_pixel(10, y), plain.get_pixel(10, y));
        }
    }

    #[test]
    fn test_missing_font_is_tolerated() {
        assert!(load_font(Path::new("/nonexistent/font.otf")).is_none());
    }
}
