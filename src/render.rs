use crate::errors::BotError;
use crate::report::{ColumnStyle, Report};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tracing::{info, warn};

const GLYPH_SIZE: u32 = 8;
const TEXT_SCALE: u32 = 2;
const TITLE_SCALE: u32 = 3;
const CELL_PAD_X: u32 = 12;
const CELL_PAD_Y: u32 = 10;
const TITLE_LINE_GAP: u32 = 8;
const TITLE_TABLE_GAP: u32 = 16;
const MARGIN: u32 = 20;
const MAX_DIMENSION: u32 = 16_384;

pub const BACKGROUND: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
pub const INK: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);
pub const GRID: Rgb<u8> = Rgb([0x40, 0x40, 0x40]);
pub const HIGHLIGHT: Rgb<u8> = Rgb([0x00, 0xFF, 0xFF]);
pub const TOTAL_FILL: Rgb<u8> = Rgb([0xFF, 0xD9, 0x66]);

/// Achievement bands, one per decile, from red through yellow to green.
pub const BANDS: [Rgb<u8>; 10] = [
    Rgb([0xF8, 0x69, 0x6B]),
    Rgb([0xF9, 0x83, 0x70]),
    Rgb([0xFA, 0x9D, 0x75]),
    Rgb([0xFC, 0xB7, 0x7A]),
    Rgb([0xFD, 0xD1, 0x7F]),
    Rgb([0xFF, 0xEB, 0x84]),
    Rgb([0xE0, 0xE3, 0x83]),
    Rgb([0xC1, 0xDA, 0x81]),
    Rgb([0xA2, 0xD0, 0x7F]),
    Rgb([0x63, 0xBE, 0x7B]),
];

pub const WARNING: Rgb<u8> = BANDS[0];
pub const SUCCESS: Rgb<u8> = BANDS[BANDS.len() - 1];

/// Index into [`BANDS`] for an achievement percentage clamped to 0..=100.
pub fn achievement_band(value: f64) -> usize {
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) };
    ((clamped / 10.0).floor() as usize).min(BANDS.len() - 1)
}

pub fn delta_color(value: f64) -> Rgb<u8> {
    if value < 0.0 { WARNING } else { SUCCESS }
}

fn parse_percent(text: &str) -> Result<f64, std::num::ParseFloatError> {
    text.trim().trim_end_matches('%').trim().parse()
}

/// Background of a body cell. Unparsable values fall back to the plain background.
pub fn cell_fill(style: ColumnStyle, text: &str, is_total: bool) -> Rgb<u8> {
    if is_total {
        return TOTAL_FILL;
    }
    match style {
        ColumnStyle::Label => HIGHLIGHT,
        ColumnStyle::Plain => BACKGROUND,
        ColumnStyle::Achievement => match parse_percent(text) {
            Ok(value) => BANDS[achievement_band(value)],
            Err(err) => {
                warn!(cell = text, "cannot color achievement cell: {err}");
                BACKGROUND
            }
        },
        ColumnStyle::Delta => match parse_percent(text) {
            Ok(value) => delta_color(value),
            Err(err) => {
                warn!(cell = text, "cannot color delta cell: {err}");
                BACKGROUND
            }
        },
    }
}

fn text_width(text: &str, scale: u32) -> u32 {
    u32::try_from(text.chars().count())
        .unwrap_or(u32::MAX)
        .saturating_mul(GLYPH_SIZE * scale)
}

/// Pixel geometry of the title block and the table grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub width: u32,
    pub height: u32,
    pub table_x: u32,
    pub table_y: u32,
    pub column_widths: Vec<u32>,
    pub row_height: u32,
    pub title_line_height: u32,
}

impl TableLayout {
    pub fn new(titles: &[String], header: &[String], body: &[Vec<String>]) -> Self {
        let column_widths: Vec<u32> = (0..header.len())
            .map(|col| {
                std::iter::once(&header[col])
                    .chain(body.iter().filter_map(|row| row.get(col)))
                    .map(|text| text_width(text, TEXT_SCALE))
                    .max()
                    .unwrap_or(0)
                    .saturating_add(2 * CELL_PAD_X)
            })
            .collect();
        let row_height = GLYPH_SIZE * TEXT_SCALE + 2 * CELL_PAD_Y;
        let title_line_height = GLYPH_SIZE * TITLE_SCALE + TITLE_LINE_GAP;

        let table_width = column_widths
            .iter()
            .fold(1u32, |total, width| total.saturating_add(*width));
        let table_height = (body.len() as u32 + 1) * row_height + 1;
        let title_width = titles
            .iter()
            .map(|title| text_width(title, TITLE_SCALE))
            .max()
            .unwrap_or(0);
        let title_height = titles.len() as u32 * title_line_height;

        let width = table_width.max(title_width).saturating_add(2 * MARGIN);
        let height = (MARGIN + title_height + TITLE_TABLE_GAP + MARGIN).saturating_add(table_height);

        Self {
            width,
            height,
            table_x: (width - table_width) / 2,
            table_y: MARGIN + title_height + TITLE_TABLE_GAP,
            column_widths,
            row_height,
            title_line_height,
        }
    }

    /// Top-left pixel of a cell; row 0 is the header.
    pub fn cell_origin(&self, row: usize, col: usize) -> (u32, u32) {
        let x = self.table_x + self.column_widths[..col].iter().sum::<u32>();
        let y = self.table_y + row as u32 * self.row_height;
        (x, y)
    }

    fn table_width(&self) -> u32 {
        self.column_widths.iter().sum()
    }

    fn table_height(&self, rows: usize) -> u32 {
        rows as u32 * self.row_height
    }
}

/// Draws the report as a PNG and returns the encoded bytes.
pub fn render_report(report: &Report) -> Result<Vec<u8>, BotError> {
    if report.rows.is_empty() {
        return Err(BotError::render("report has no rows"));
    }

    let columns = report.columns();
    let titles = report.title_lines();
    let header: Vec<String> = columns.iter().map(|col| col.header.to_string()).collect();
    let body: Vec<Vec<String>> = report.rows.iter().map(|row| row.cells()).collect();
    if let Some(row) = body.iter().find(|row| row.len() != columns.len()) {
        return Err(BotError::render(format!(
            "row has {} cells but the table has {} columns",
            row.len(),
            columns.len()
        )));
    }

    let layout = TableLayout::new(&titles, &header, &body);
    if layout.width > MAX_DIMENSION || layout.height > MAX_DIMENSION {
        return Err(BotError::render(format!(
            "image of {}x{} px exceeds the {MAX_DIMENSION} px limit",
            layout.width, layout.height
        )));
    }
    let mut image = RgbImage::from_pixel(layout.width, layout.height, BACKGROUND);

    for (line, title) in titles.iter().enumerate() {
        let x = (layout.width - text_width(title, TITLE_SCALE)) / 2;
        let y = MARGIN + line as u32 * layout.title_line_height;
        draw_text(&mut image, x, y, title, TITLE_SCALE, true);
    }

    for (col, text) in header.iter().enumerate() {
        draw_cell(&mut image, &layout, 0, col, text, HIGHLIGHT, true);
    }
    for (index, (row, cells)) in report.rows.iter().zip(&body).enumerate() {
        for (col, text) in cells.iter().enumerate() {
            let fill = cell_fill(columns[col].style, text, row.is_total());
            draw_cell(&mut image, &layout, index + 1, col, text, fill, row.is_total());
        }
    }
    draw_grid(&mut image, &layout, body.len() + 1);

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(BotError::render)?;

    info!(
        rows = report.rows.len(),
        width = layout.width,
        height = layout.height,
        "report image created"
    );
    Ok(png)
}

fn draw_cell(
    image: &mut RgbImage,
    layout: &TableLayout,
    row: usize,
    col: usize,
    text: &str,
    fill: Rgb<u8>,
    bold: bool,
) {
    let (x, y) = layout.cell_origin(row, col);
    let width = layout.column_widths[col];
    fill_rect(image, x, y, width, layout.row_height, fill);

    let text_x = x + (width - text_width(text, TEXT_SCALE)) / 2;
    draw_text(image, text_x, y + CELL_PAD_Y, text, TEXT_SCALE, bold);
}

fn draw_grid(image: &mut RgbImage, layout: &TableLayout, rows: usize) {
    let width = layout.table_width();
    let height = layout.table_height(rows);

    for row in 0..=rows {
        let y = layout.table_y + row as u32 * layout.row_height;
        fill_rect(image, layout.table_x, y, width + 1, 1, GRID);
    }
    let mut x = layout.table_x;
    for col_width in std::iter::once(&0).chain(&layout.column_widths) {
        x += col_width;
        fill_rect(image, x, layout.table_y, 1, height + 1, GRID);
    }
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn draw_text(image: &mut RgbImage, x: u32, y: u32, text: &str, scale: u32, bold: bool) {
    let stroke = scale + u32::from(bold);
    for (index, c) in text.chars().enumerate() {
        let origin_x = x + index as u32 * GLYPH_SIZE * scale;
        for (line, bits) in glyph(c).iter().enumerate() {
            for bit in 0..GLYPH_SIZE {
                if bits & (1 << bit) == 0 {
                    continue;
                }
                let px = origin_x + bit * scale;
                let py = y + line as u32 * scale;
                fill_rect(image, px, py, stroke, scale, INK);
            }
        }
    }
}

fn fill_rect(image: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    let x_end = x.saturating_add(width).min(image.width());
    let y_end = y.saturating_add(height).min(image.height());
    for py in y..y_end {
        for px in x..x_end {
            image.put_pixel(px, py, color);
        }
    }
}
