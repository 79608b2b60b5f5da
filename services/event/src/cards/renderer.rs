use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Rgba, RgbaImage, imageops};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use qrcode::{EcLevel, QrCode};
use rusttype::{Font, Scale};

use crate::cards::quotes;
use crate::domain::types::{MemberRecord, QrCardPayload, TeamRecord};

/// Card raster: vertical badge, 3.5" × 5.5" at 300 dpi.
pub const CARD_WIDTH: u32 = 1050;
pub const CARD_HEIGHT: u32 = 1650;
pub const CARD_DPI: f32 = 300.0;

/// Rendered QR edge. 220 px at 300 dpi is ~18.6 mm printed, above the
/// 17 mm floor that keeps worn badges scannable.
const QR_SIZE: u32 = 220;
const PHOTO_SIZE: u32 = 280;

const BACKGROUND: Rgba<u8> = Rgba([10, 14, 39, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 136, 255]);
const CYAN: Rgba<u8> = Rgba([0, 232, 255, 255]);
const MAGENTA: Rgba<u8> = Rgba([200, 0, 255, 255]);
const ORANGE: Rgba<u8> = Rgba([255, 170, 0, 255]);
const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LAVENDER: Rgba<u8> = Rgba([170, 170, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// The three faces every card uses.
pub struct Fonts {
    regular: Font<'static>,
    bold: Font<'static>,
    oblique: Font<'static>,
}

impl Fonts {
    /// Load the DejaVu faces from `dir`. Missing fonts are an expected
    /// runtime failure, reported (never panicked) to the caller.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            regular: load_font(&dir.join("DejaVuSans.ttf"))?,
            bold: load_font(&dir.join("DejaVuSans-Bold.ttf"))?,
            oblique: load_font(&dir.join("DejaVuSans-Oblique.ttf"))?,
        })
    }
}

fn load_font(path: &Path) -> anyhow::Result<Font<'static>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read card font {}", path.display()))?;
    Font::try_from_vec(bytes)
        .with_context(|| format!("parse card font {}", path.display()))
}

/// Renders one identity card per member.
pub struct CardRenderer {
    fonts: Fonts,
    banner: String,
    event_title: String,
}

impl CardRenderer {
    pub fn new(font_dir: &Path, banner: String, event_title: String) -> anyhow::Result<Self> {
        Ok(Self {
            fonts: Fonts::load(font_dir)?,
            banner,
            event_title,
        })
    }

    /// Render a single card raster for `member`.
    pub fn render_card(
        &self,
        team: &TeamRecord,
        member: &MemberRecord,
        photo: Option<&DynamicImage>,
        issued_at: DateTime<Utc>,
    ) -> anyhow::Result<RgbaImage> {
        let mut card = RgbaImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, BACKGROUND);
        let mut y = 48;

        // Banner + event title.
        self.draw_centered(&mut card, &self.banner, y, 36.0, Face::Bold, GREEN);
        y += 58;
        self.draw_centered(&mut card, &self.event_title, y, 52.0, Face::Bold, MAGENTA);
        y += 90;

        // Photo in a circular mask, monogram placeholder otherwise.
        match photo {
            Some(photo) => paste_circular_photo(&mut card, photo, y),
            None => self.draw_monogram(&mut card, &member.name, y),
        }
        y += PHOTO_SIZE as i32 + 50;

        // Member details.
        self.draw_centered(&mut card, &member.name, y, 44.0, Face::Bold, GREEN);
        y += 62;
        self.draw_centered(&mut card, &member.email, y, 26.0, Face::Regular, WHITE);
        y += 40;
        self.draw_centered(&mut card, &member.phone, y, 26.0, Face::Regular, WHITE);
        y += 44;
        let college_line = format!("{} • {}", team.year, team.college_name);
        self.draw_centered(&mut card, &college_line, y, 26.0, Face::Regular, CYAN);
        y += 40;
        let track_line = format!("Track: {}", team.domain);
        self.draw_centered(&mut card, &track_line, y, 26.0, Face::Regular, MAGENTA);
        y += 56;

        // Team identity.
        let team_line = format!("Team: {}", team.team_name);
        self.draw_centered(&mut card, &team_line, y, 30.0, Face::Regular, CYAN);
        y += 44;
        let id_line = format!("Team ID: {}", team.team_id);
        self.draw_centered(&mut card, &id_line, y, 26.0, Face::Regular, YELLOW);
        y += 58;

        // Team code, boxed and prominent: this is the manual check-in key.
        draw_hollow_rect_mut(
            &mut card,
            Rect::at(120, y - 14).of_size(CARD_WIDTH - 240, 76),
            MAGENTA,
        );
        self.draw_centered(&mut card, &team.team_code, y, 48.0, Face::Bold, YELLOW);
        y += 96;

        // Attendance QR.
        let payload = QrCardPayload::new(team, member, issued_at);
        let qr = attendance_qr(&payload)?;
        let qr_x = (CARD_WIDTH - QR_SIZE) / 2;
        overlay_qr(&mut card, &qr, qr_x as i32, y);
        y += QR_SIZE as i32 + 28;

        // Manual-entry fallback.
        self.draw_centered(
            &mut card,
            &member.participant_id,
            y,
            26.0,
            Face::Regular,
            ORANGE,
        );
        y += 56;

        // Caption, wrapped.
        let quote = quotes::quote_for(member.member_index as usize);
        for line in wrap_text(quote, 46) {
            let quoted = format!("\u{201c}{line}\u{201d}");
            self.draw_centered(&mut card, &quoted, y, 22.0, Face::Oblique, LAVENDER);
            y += 32;
        }

        Ok(card)
    }

    fn draw_centered(
        &self,
        card: &mut RgbaImage,
        text: &str,
        y: i32,
        size: f32,
        face: Face,
        color: Rgba<u8>,
    ) {
        let font = match face {
            Face::Regular => &self.fonts.regular,
            Face::Bold => &self.fonts.bold,
            Face::Oblique => &self.fonts.oblique,
        };
        let scale = Scale::uniform(size);
        let (width, _) = text_size(scale, font, text);
        let x = (CARD_WIDTH as i32 - width as i32) / 2;
        draw_text_mut(card, color, x.max(0), y, scale, font, text);
    }

    fn draw_monogram(&self, card: &mut RgbaImage, name: &str, y: i32) {
        let radius = (PHOTO_SIZE / 2) as i32;
        let center = ((CARD_WIDTH / 2) as i32, y + radius);
        for ring in 0..3 {
            draw_hollow_circle_mut(card, center, radius - ring, CYAN);
        }
        let monogram = initials(name);
        let scale = Scale::uniform(96.0);
        let (width, height) = text_size(scale, &self.fonts.bold, &monogram);
        draw_text_mut(
            card,
            GREEN,
            center.0 - width as i32 / 2,
            center.1 - height as i32 / 2,
            scale,
            &self.fonts.bold,
            &monogram,
        );
    }
}

enum Face {
    Regular,
    Bold,
    Oblique,
}

/// Encode the scan payload at the highest error-correction level so print
/// wear does not defeat decoding. Black modules on a transparent ground.
pub fn attendance_qr(payload: &QrCardPayload) -> anyhow::Result<GrayImage> {
    let json = serde_json::to_string(payload).context("encode scan payload")?;
    let code = QrCode::with_error_correction_level(json.as_bytes(), EcLevel::H)
        .context("encode attendance QR")?;
    let rendered = code
        .render::<image::Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(8, 8)
        .build();
    Ok(imageops::resize(&rendered, QR_SIZE, QR_SIZE, FilterType::Nearest))
}

/// Stamp dark QR modules onto the card; light modules stay transparent.
fn overlay_qr(card: &mut RgbaImage, qr: &GrayImage, x: i32, y: i32) {
    for (qx, qy, pixel) in qr.enumerate_pixels() {
        if pixel.0[0] < 128 {
            let cx = x + qx as i32;
            let cy = y + qy as i32;
            if cx >= 0 && cy >= 0 && (cx as u32) < CARD_WIDTH && (cy as u32) < CARD_HEIGHT {
                card.put_pixel(cx as u32, cy as u32, BLACK);
            }
        }
    }
}

/// Resize `photo` to the portrait slot and paste it through a circular mask.
fn paste_circular_photo(card: &mut RgbaImage, photo: &DynamicImage, y: i32) {
    let resized = photo
        .resize_to_fill(PHOTO_SIZE, PHOTO_SIZE, FilterType::Lanczos3)
        .to_rgba8();
    let left = (CARD_WIDTH - PHOTO_SIZE) / 2;
    let radius = (PHOTO_SIZE / 2) as f32;
    for (px, py, pixel) in resized.enumerate_pixels() {
        let dx = px as f32 - radius + 0.5;
        let dy = py as f32 - radius + 0.5;
        if dx * dx + dy * dy <= radius * radius {
            card.put_pixel(left + px, y as u32 + py, *pixel);
        }
    }
}

/// Uppercase initials of the first and last name part, e.g. "Ada Lovelace"
/// → "AL".
pub fn initials(name: &str) -> String {
    let mut parts = name.split_whitespace().filter_map(|part| {
        part.chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
    });
    let first = parts.next().unwrap_or('?');
    match parts.last() {
        Some(last) => format!("{first}{last}"),
        None => first.to_string(),
    }
}

/// Greedy word wrap by character budget.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
