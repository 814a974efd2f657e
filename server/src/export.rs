use chrono::Utc;
use memo_core::Note;
use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::errors::{RestError, RestResult};

/// Column order of the CSV export, one row per note after the header.
const CSV_HEADER: [&str; 10] = [
    "index",
    "title",
    "slug",
    "owner",
    "content",
    "created_at",
    "due_date",
    "priority",
    "status",
    "category",
];

fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|d| d.to_rfc3339())
        .unwrap_or_default()
}

/// Render a note collection as CSV. An empty collection still yields a
/// header-only file.
pub fn render_csv(notes: &[Note], owner: &str) -> RestResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| RestError::Render(e.to_string()))?;

    for (index, note) in notes.iter().enumerate() {
        writer
            .write_record([
                (index + 1).to_string(),
                note.title.clone(),
                note.slug.clone(),
                owner.to_string(),
                note.content.clone(),
                format_millis(note.created_at),
                note.due_date.map(|d| d.to_string()).unwrap_or_default(),
                note.priority.as_code().to_string(),
                note.status.as_code().to_string(),
                note.category.as_code().to_string(),
            ])
            .map_err(|e| RestError::Render(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| RestError::Render(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| RestError::Render(e.to_string()))
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;

/// Render a note collection as a PDF document with one block per note.
pub fn render_pdf(notes: &[Note], display_name: &str) -> RestResult<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new("Notes List", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "notes");

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RestError::Render(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RestError::Render(e.to_string()))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = PAGE_HEIGHT - 20.0;

    layer.use_text(
        format!("Notes for {display_name}"),
        16.0,
        Mm(MARGIN),
        Mm(y),
        &bold,
    );
    y -= 7.0;
    layer.use_text(
        format!("Generated {}", Utc::now().format("%Y-%m-%d %H:%M:%S")),
        10.0,
        Mm(MARGIN),
        Mm(y),
        &font,
    );
    y -= 12.0;

    for (index, note) in notes.iter().enumerate() {
        if y < 30.0 {
            let (page, new_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "notes");
            layer = doc.get_page(page).get_layer(new_layer);
            y = PAGE_HEIGHT - 20.0;
        }

        layer.use_text(
            format!("{}. {}", index + 1, note.title),
            12.0,
            Mm(MARGIN),
            Mm(y),
            &bold,
        );
        y -= 6.0;

        let due = note
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "none".to_string());
        layer.use_text(
            format!(
                "priority: {}  status: {}  category: {}  due: {due}",
                note.priority.as_code(),
                note.status.as_code(),
                note.category.as_code(),
            ),
            9.0,
            Mm(MARGIN),
            Mm(y),
            &font,
        );
        y -= 6.0;

        // One preview line per note, the full text lives in the CSV export
        let preview: String = note.content.chars().take(100).collect();
        layer.use_text(preview, 10.0, Mm(MARGIN), Mm(y), &font);
        y -= 10.0;
    }

    doc.save_to_bytes()
        .map_err(|e| RestError::Render(e.to_string()))
}
