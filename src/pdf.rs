use std::io::BufWriter;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use printpdf::image_crate::{self, DynamicImage, RgbImage};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;
use rust_decimal::Decimal;
use tracing::warn;

use crate::error::{ResitError, Result};
use crate::fmt::{amount, iso_date, tarikh};
use crate::ledger::total_collected;
use crate::models::{OrgSettings, ReceiptView, SavedReceipt};

// A4 (mm)
const A4_SHORT: f32 = 210.0;
const A4_LONG: f32 = 297.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const MARGIN_LEFT: f32 = 14.0;
const MARGIN_RIGHT: f32 = 14.0;
const ROW_H: f32 = 8.0;
const FONT_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 16.0;

const BLACK: (u8, u8, u8) = (0, 0, 0);
const WHITE: (u8, u8, u8) = (255, 255, 255);
const GREY: (u8, u8, u8) = (107, 114, 128);
const STAMP_RED: (u8, u8, u8) = (239, 68, 68);
const IMAGE_DPI: f32 = 300.0;

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
    Italic,
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    font_italic: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    page_w: f32,
    page_h: f32,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str, page_w: f32, page_h: f32) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(page_w), Mm(page_h), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ResitError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ResitError::Pdf(format!("{e:?}")))?;
        let font_italic = doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| ResitError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            font_italic,
            current_page: page,
            current_layer: layer,
            page_w,
            page_h,
            y: MARGIN_TOP,
        })
    }

    fn layer(&self) -> PdfLayerReference {
        self.doc
            .get_page(self.current_page)
            .get_layer(self.current_layer)
    }

    fn pdf_y(&self) -> f32 {
        self.page_h - self.y
    }

    fn right_edge(&self) -> f32 {
        self.page_w - MARGIN_RIGHT
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(self.page_w), Mm(self.page_h), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > self.page_h - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn colored_text(&self, s: &str, x: f32, size: f32, font: Font, color: (u8, u8, u8)) {
        let font = match font {
            Font::Regular => &self.font,
            Font::Bold => &self.font_bold,
            Font::Italic => &self.font_italic,
        };
        let layer = self.layer();
        layer.set_fill_color(rgb(color));
        layer.use_text(s, size, Mm(x), Mm(self.pdf_y()), font);
        layer.set_fill_color(rgb(BLACK));
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { Font::Bold } else { Font::Regular };
        self.colored_text(s, x, size, font, BLACK);
    }

    fn text_right(&self, s: &str, right: f32, size: f32, font: Font, color: (u8, u8, u8)) {
        let x = right - approx_text_width(s, size);
        self.colored_text(s, x, size, font, color);
    }

    fn hline(&self, x1: f32, x2: f32) {
        let layer = self.layer();
        layer.set_outline_thickness(0.5);
        let line = Line {
            points: vec![
                (Point::new(Mm(x1), Mm(self.pdf_y())), false),
                (Point::new(Mm(x2), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        };
        layer.add_line(line);
    }

    /// Filled band spanning the page width, `top` and `height` in mm from the top edge.
    fn band(&self, top: f32, height: f32, color: (u8, u8, u8)) {
        let (y1, y2) = (self.page_h - top, self.page_h - top - height);
        let layer = self.layer();
        layer.set_fill_color(rgb(color));
        layer.add_polygon(Polygon {
            rings: vec![vec![
                (Point::new(Mm(0.0), Mm(y1)), false),
                (Point::new(Mm(self.page_w), Mm(y1)), false),
                (Point::new(Mm(self.page_w), Mm(y2)), false),
                (Point::new(Mm(0.0), Mm(y2)), false),
            ]],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
        layer.set_fill_color(rgb(BLACK));
    }

    fn table_header(&mut self, cols: &[Col], headers: &[&str]) {
        self.ensure_space(ROW_H * 2.0);
        let mut x = MARGIN_LEFT;
        for (col, header) in cols.iter().zip(headers) {
            match col.align {
                Align::Left => self.text(header, x, FONT_SIZE, true),
                Align::Right => {
                    self.text_right(header, x + col.width, FONT_SIZE, Font::Bold, BLACK)
                }
            }
            x += col.width;
        }
        self.y += 2.0;
        self.hline(MARGIN_LEFT, self.right_edge());
        self.y += ROW_H;
    }

    fn table_row(&mut self, cols: &[Col], values: &[&str], bold: bool) {
        self.ensure_space(ROW_H);
        let mut x = MARGIN_LEFT;
        let font = if bold { Font::Bold } else { Font::Regular };
        for (col, value) in cols.iter().zip(values) {
            match col.align {
                Align::Left => self.colored_text(value, x, FONT_SIZE, font, BLACK),
                Align::Right => self.text_right(value, x + col.width, FONT_SIZE, font, BLACK),
            }
            x += col.width;
        }
        self.y += ROW_H;
    }

    /// Draw `img` scaled to fit a `w` x `h` box whose top-left corner sits at
    /// (`x`, `top`) in mm from the top edge. Centered horizontally, bottom aligned.
    fn image_in_box(&self, img: &RgbImage, x: f32, top: f32, w: f32, h: f32) {
        if img.width() == 0 || img.height() == 0 {
            return;
        }
        let native_w = img.width() as f32 / IMAGE_DPI * 25.4;
        let native_h = img.height() as f32 / IMAGE_DPI * 25.4;
        let scale = (w / native_w).min(h / native_h);
        let drawn_w = native_w * scale;
        Image::from_dynamic_image(&DynamicImage::ImageRgb8(img.clone())).add_to_layer(
            self.layer(),
            ImageTransform {
                translate_x: Some(Mm(x + (w - drawn_w) / 2.0)),
                translate_y: Some(Mm(self.page_h - top - h)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
    }

    fn separator(&mut self) {
        self.hline(MARGIN_LEFT, self.right_edge());
        self.y += ROW_H;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| ResitError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| ResitError::Pdf(e.to_string()))
    }
}

/// Payload bytes of a `data:<mime>;base64,<payload>` URI.
fn data_uri_bytes(uri: &str) -> Result<Vec<u8>> {
    let payload = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload.trim())
        .ok_or_else(|| ResitError::Pdf("image is not a base64 data URI".to_string()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| ResitError::Pdf(format!("bad image data: {e}")))
}

/// Decode a stored image, flattening transparency onto white paper.
fn decode_image(uri: &str) -> Result<RgbImage> {
    let bytes = data_uri_bytes(uri)?;
    let decoded = image_crate::load_from_memory(&bytes)
        .map_err(|e| ResitError::Pdf(format!("unreadable image: {e}")))?;
    let rgba = decoded.to_rgba8();
    Ok(RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let over_white = |c: u8| ((c as u32 * a as u32 + 255 * (255 - a as u32)) / 255) as u8;
        image_crate::Rgb([over_white(r), over_white(g), over_white(b)])
    }))
}

/// A stored image ready to draw. Unreadable images are skipped with a warning
/// so the receipt still prints with its placeholder.
fn stored_image(slot: &Option<String>, what: &str) -> Option<RgbImage> {
    let uri = slot.as_deref()?;
    match decode_image(uri) {
        Ok(img) => Some(img),
        Err(e) => {
            warn!(image = what, error = %e, "stored image skipped");
            None
        }
    }
}

/// Labeled line in the receipt body, value wrapped to the printable width.
fn field(pdf: &mut PdfWriter, label: &str, value: &str, placeholder: &str, size: f32) {
    const LABEL_W: f32 = 55.0;
    pdf.colored_text(label, MARGIN_LEFT + 6.0, 9.0, Font::Bold, GREY);
    let shown = if value.trim().is_empty() { placeholder } else { value };
    let chars_per_line = ((pdf.right_edge() - MARGIN_LEFT - LABEL_W) / (size * 0.2)) as usize;
    for line in textwrap::wrap(shown, chars_per_line.max(20)) {
        pdf.colored_text(&line, MARGIN_LEFT + LABEL_W, size, Font::Regular, BLACK);
        pdf.y += size * 0.5;
    }
    pdf.y += 1.0;
    pdf.hline(MARGIN_LEFT + LABEL_W, pdf.right_edge() - 6.0);
    pdf.y += ROW_H;
}

/// Single official receipt on an A4 landscape page.
pub fn render_receipt(view: ReceiptView<'_>, session_year: i32) -> Result<Vec<u8>> {
    let settings = view.settings;
    let receipt = view.receipt;
    let accent = settings.theme.style().rgb;
    let mut pdf = PdfWriter::new(&format!("Resit {}", receipt.receipt_no), A4_LONG, A4_SHORT)?;

    // Header band: logo and school identity on the left, title and number on the right.
    const LOGO: f32 = 28.0;
    let ident_x = MARGIN_LEFT + LOGO + 5.0;
    pdf.band(0.0, 38.0, accent);
    match stored_image(&settings.logo, "logo") {
        Some(logo) => pdf.image_in_box(&logo, MARGIN_LEFT, 5.0, LOGO, LOGO),
        None => {
            pdf.y = 18.0;
            pdf.colored_text("LOGO", MARGIN_LEFT + 8.0, 9.0, Font::Bold, WHITE);
            pdf.y = 22.0;
            pdf.colored_text("SEKOLAH", MARGIN_LEFT + 6.0, 7.0, Font::Regular, WHITE);
        }
    }
    pdf.y = 16.0;
    pdf.colored_text(&settings.school_name, ident_x, 18.0, Font::Bold, WHITE);
    pdf.text_right("RESIT RASMI", pdf.right_edge(), 24.0, Font::Bold, WHITE);
    pdf.y = 24.0;
    pdf.colored_text(
        &settings.school_address.to_uppercase(),
        ident_x,
        8.0,
        Font::Regular,
        WHITE,
    );
    pdf.y = 33.0;
    pdf.text_right(
        &format!("NO. RESIT  {}", receipt.receipt_no),
        pdf.right_edge(),
        12.0,
        Font::Bold,
        WHITE,
    );

    pdf.y = 50.0;
    pdf.colored_text(&settings.org_name.to_uppercase(), MARGIN_LEFT, 11.0, Font::Bold, accent);
    pdf.y += 3.0;
    pdf.hline(MARGIN_LEFT, pdf.right_edge());
    pdf.y += 14.0;

    field(&mut pdf, "DITERIMA DARIPADA", &receipt.received_from, "....................", 14.0);
    field(&mut pdf, "UNTUK BAYARAN", &receipt.for_payment, "....................", 12.0);

    pdf.y += 4.0;
    let total = format!("JUMLAH RM  {}  Sahaja", amount(receipt.amount));
    pdf.colored_text(&total, MARGIN_LEFT + 6.0, 18.0, Font::Bold, accent);
    pdf.colored_text("TARIKH", pdf.right_edge() - 50.0, 8.0, Font::Bold, GREY);
    pdf.y += 7.0;
    let date = receipt
        .date
        .map(tarikh)
        .unwrap_or_else(|| "....................".to_string());
    pdf.text_right(&date, pdf.right_edge(), 13.0, Font::Bold, BLACK);

    // Footer: paid mark, treasurer signature block, stamp slot.
    pdf.y = A4_SHORT - 40.0;
    if settings.show_paid_stamp {
        pdf.colored_text("PAID", MARGIN_LEFT + 6.0, 28.0, Font::Bold, STAMP_RED);
        pdf.y += 6.0;
        pdf.colored_text("LUNAS", MARGIN_LEFT + 12.0, 10.0, Font::Bold, STAMP_RED);
        pdf.y -= 6.0;
    }

    let sig_center = pdf.page_w / 2.0;
    let sig_left = sig_center - 35.0;
    match stored_image(&settings.signature, "signature") {
        Some(sig) => pdf.image_in_box(&sig, sig_left + 10.0, pdf.y - 16.0, 50.0, 16.0),
        None => {
            pdf.colored_text("Tandatangan Bendahari", sig_left + 14.0, 9.0, Font::Italic, GREY)
        }
    }
    pdf.y += 3.0;
    pdf.hline(sig_left, sig_left + 70.0);
    pdf.y += 5.0;
    let treasurer = if receipt.treasurer_name.trim().is_empty() {
        "BENDAHARI BKGK".to_string()
    } else {
        receipt.treasurer_name.to_uppercase()
    };
    pdf.colored_text(&treasurer, sig_left, 10.0, Font::Bold, BLACK);
    pdf.y += 4.5;
    pdf.colored_text(
        &format!("BENDAHARI {}", settings.org_name.to_uppercase()),
        sig_left,
        7.0,
        Font::Bold,
        GREY,
    );
    pdf.y += 3.5;
    pdf.colored_text(&settings.school_name, sig_left, 6.0, Font::Regular, GREY);

    match stored_image(&settings.stamp, "stamp") {
        Some(stamp) => {
            pdf.image_in_box(&stamp, pdf.right_edge() - 42.0, A4_SHORT - 52.0, 36.0, 36.0)
        }
        None => {
            pdf.y = A4_SHORT - 36.0;
            pdf.text_right("COP RASMI", pdf.right_edge() - 6.0, 8.0, Font::Regular, GREY);
        }
    }

    pdf.band(A4_SHORT - 9.0, 9.0, accent);
    pdf.y = A4_SHORT - 3.5;
    pdf.colored_text(
        &format!("SESI {} / {}", session_year, session_year + 1),
        MARGIN_LEFT,
        7.0,
        Font::Bold,
        WHITE,
    );
    pdf.colored_text(
        "RESIT DIJANA SECARA SISTEM OLEH APLIKASI BKGK",
        sig_left,
        7.0,
        Font::Bold,
        WHITE,
    );
    pdf.text_right("ORIGINAL", pdf.right_edge(), 7.0, Font::Bold, WHITE);

    pdf.to_bytes()
}

/// Collection summary: every receipt in history order with a grand total.
pub fn render_summary(
    history: &[SavedReceipt],
    settings: &OrgSettings,
    generated: &str,
) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new("Ringkasan Kutipan", A4_SHORT, A4_LONG)?;
    pdf.text(
        &format!("RINGKASAN KUTIPAN - {}", settings.org_name),
        MARGIN_LEFT,
        TITLE_SIZE,
        true,
    );
    pdf.y += 8.0;
    pdf.text(&settings.school_name, MARGIN_LEFT, FONT_SIZE, false);
    pdf.y += 6.0;
    pdf.text(&format!("Dijana pada: {generated}"), MARGIN_LEFT, FONT_SIZE, false);
    pdf.y += 11.0;

    let cols = &[
        Col { width: 31.0, align: Align::Left },
        Col { width: 30.0, align: Align::Left },
        Col { width: 75.0, align: Align::Left },
        Col { width: 30.0, align: Align::Right },
    ];
    pdf.table_header(cols, &["No. Resit", "Tarikh", "Nama Pembayar", "Amaun (RM)"]);

    for r in history {
        let row = &r.receipt;
        let date = iso_date(row.date);
        let payer: String = row.received_from.chars().take(30).collect();
        let amt = amount(row.amount);
        pdf.table_row(cols, &[&row.receipt_no, &date, &payer, &amt], false);
    }

    let total: Decimal = total_collected(history);
    pdf.separator();
    pdf.table_row(cols, &["", "", "JUMLAH KESELURUHAN", &amount(total)], true);

    pdf.to_bytes()
}

pub const SUMMARY_FILE: &str = "RINGKASAN_REKOD_BKGK.pdf";

/// File name for a single receipt, with `/` made path-safe.
pub fn receipt_file_name(receipt_no: &str) -> String {
    format!("{}.pdf", receipt_no.replace(['/', '\\'], "-"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{ReceiptData, Theme};

    fn saved(no: &str, from: &str, cents: i64) -> SavedReceipt {
        SavedReceipt {
            receipt: ReceiptData {
                received_from: from.to_string(),
                amount: Decimal::new(cents, 2),
                for_payment: "Yuran Tahunan BKGK 2024".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, 1),
                receipt_no: no.to_string(),
                treasurer_name: "Aida Nordila Bt. Abdul Hadi".to_string(),
            },
            id: format!("id-{no}"),
            timestamp: 0,
        }
    }

    #[test]
    fn test_render_receipt_produces_pdf() {
        let settings = OrgSettings::default();
        let r = saved("BKGK/2024/0001", "Ahmad bin Ali", 15000);
        let bytes = render_receipt(ReceiptView { settings: &settings, receipt: &r.receipt }, 2024)
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_receipt_blank_fields_and_other_theme() {
        let settings = OrgSettings {
            theme: Theme::Yellow,
            show_paid_stamp: false,
            ..OrgSettings::default()
        };
        let mut r = saved("BKGK/2024/0002", "", 0);
        r.receipt.treasurer_name.clear();
        r.receipt.for_payment = "Sumbangan ".repeat(40);
        let bytes = render_receipt(ReceiptView { settings: &settings, receipt: &r.receipt }, 2024)
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    /// PNG data URI of a `size` x `size` image filled by `pixel`.
    fn png_uri(size: u32, mut pixel: impl FnMut(u32, u32) -> [u8; 4]) -> String {
        let img =
            image_crate::RgbaImage::from_fn(size, size, |x, y| image_crate::Rgba(pixel(x, y)));
        let mut buf = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image_crate::ImageOutputFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(buf.into_inner()))
    }

    #[test]
    fn test_decode_image_flattens_transparency() {
        let img = decode_image(&png_uri(2, |_, _| [255, 0, 0, 128])).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
        assert_eq!(img.get_pixel(0, 0).0, [255, 127, 127]);
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(data_uri_bytes("https://example.com/logo.png").is_err());
        assert!(decode_image("data:image/png;base64,@@@").is_err());
        assert!(decode_image("data:image/png;base64,aGVsbG8=").is_err());
        let not_an_image = Some("data:image/png;base64,aGVsbG8=".to_string());
        assert!(stored_image(&not_an_image, "logo").is_none());
        assert!(stored_image(&None, "logo").is_none());
    }

    #[test]
    fn test_render_receipt_embeds_stored_images() {
        // noisy pixels so the embedded stream cannot compress away
        let mut seed: u32 = 7;
        let noise = png_uri(64, |_, _| {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let [a, b, c, _] = seed.to_le_bytes();
            [a, b, c, 255]
        });
        let r = saved("BKGK/2024/0001", "Ahmad bin Ali", 15000);
        let plain = OrgSettings::default();
        let with_images = OrgSettings {
            logo: Some(noise.clone()),
            stamp: Some(noise.clone()),
            signature: Some(noise),
            ..OrgSettings::default()
        };
        let without = render_receipt(ReceiptView { settings: &plain, receipt: &r.receipt }, 2024)
            .unwrap();
        let with = render_receipt(
            ReceiptView { settings: &with_images, receipt: &r.receipt },
            2024,
        )
        .unwrap();
        assert!(with.starts_with(b"%PDF"));
        assert!(with.len() > without.len() + 3 * 64 * 64);
    }

    #[test]
    fn test_render_receipt_survives_unreadable_image() {
        let settings = OrgSettings {
            logo: Some("data:image/svg+xml;base64,PHN2Zy8+".to_string()),
            ..OrgSettings::default()
        };
        let r = saved("BKGK/2024/0001", "Ali", 100);
        let bytes = render_receipt(ReceiptView { settings: &settings, receipt: &r.receipt }, 2024)
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_summary_spans_pages() {
        let history: Vec<SavedReceipt> = (1..=80)
            .map(|i| saved(&format!("BKGK/2024/{i:04}"), "Pembayar Contoh", 1000 + i))
            .collect();
        let bytes = render_summary(&history, &OrgSettings::default(), "01/03/2024").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_receipt_file_name() {
        assert_eq!(receipt_file_name("BKGK/2024/0007"), "BKGK-2024-0007.pdf");
    }
}
