use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context as _;
use image::{DynamicImage, RgbaImage};
use printpdf::{Image as PdfImage, ImageTransform, Mm, PdfDocument};

use crate::cards::renderer::CARD_DPI;

/// US letter.
const PAGE_WIDTH_MM: f32 = 215.9;
const PAGE_HEIGHT_MM: f32 = 279.4;
const MM_PER_INCH: f32 = 25.4;

/// Compose the rendered cards into one multi-page PDF, one card per page in
/// member-index order, each centered on a letter page. The caller owns the
/// written file and deletes it once the mailer has consumed it.
pub fn assemble(cards: Vec<RgbaImage>, title: &str, out_path: &Path) -> anyhow::Result<()> {
    anyhow::ensure!(!cards.is_empty(), "no cards to assemble");

    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "cards",
    );

    for (index, card) in cards.into_iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "cards");
            doc.get_page(page).get_layer(layer)
        };

        let width_mm = card.width() as f32 / CARD_DPI * MM_PER_INCH;
        let height_mm = card.height() as f32 / CARD_DPI * MM_PER_INCH;
        // Flatten: the QR transparency only matters within the raster.
        let rgb = DynamicImage::ImageRgba8(card).to_rgb8();
        let pdf_image = PdfImage::from_dynamic_image(&DynamicImage::ImageRgb8(rgb));
        pdf_image.add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm((PAGE_WIDTH_MM - width_mm) / 2.0)),
                translate_y: Some(Mm((PAGE_HEIGHT_MM - height_mm) / 2.0)),
                dpi: Some(CARD_DPI),
                ..Default::default()
            },
        );
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    let file = File::create(out_path)
        .with_context(|| format!("create document {}", out_path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .with_context(|| format!("write document {}", out_path.display()))?;
    Ok(())
}
