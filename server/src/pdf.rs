//! PDF ticket rendering with `lopdf`.
//!
//! One A4 page in the built-in Helvetica font: a title, the booked show
//! details and a closing line.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use showtime_core::providers::{Attachment, TicketRenderer};
use showtime_core::{BookingError, Result, TicketDetails};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 60;
const LINE_HEIGHT: i64 = 22;

/// Renders tickets as single-page PDFs named `booking.pdf`.
#[derive(Debug, Clone)]
pub struct PdfTicketRenderer {
    title: String,
}

impl PdfTicketRenderer {
    /// Create a renderer printing `title` at the top of each ticket.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Default for PdfTicketRenderer {
    fn default() -> Self {
        Self::new("Flick Tickets")
    }
}

fn text(font: &str, size: i64, line: &str) -> [Operation; 2] {
    [
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), size.into()]),
        Operation::new("Tj", vec![Object::string_literal(line)]),
    ]
}

fn next_line(gap: i64) -> Operation {
    Operation::new("Td", vec![0.into(), (-gap).into()])
}

impl PdfTicketRenderer {
    fn operations(&self, details: &TicketDetails) -> Vec<Operation> {
        let fields = [
            ("Movie", &details.title),
            ("Date", &details.date),
            ("Time", &details.time),
            ("Theatre", &details.theatre),
            ("Location", &details.address),
            ("Seats", &details.seats),
            ("Transaction Id", &details.transaction_id),
        ];

        let mut ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - 24).into()]),
        ];
        ops.extend(text("F2", 24, &self.title));
        ops.push(next_line(LINE_HEIGHT * 2));
        ops.extend(text("F2", 16, "Booked show details"));
        ops.push(next_line(LINE_HEIGHT * 3 / 2));
        for (label, value) in fields {
            ops.extend(text("F1", 12, &format!("{label}: {value}")));
            ops.push(next_line(LINE_HEIGHT));
        }
        ops.push(next_line(LINE_HEIGHT));
        ops.extend(text("F1", 12, "Thank you for booking! Visit again!"));
        ops.push(Operation::new("ET", vec![]));
        ops
    }
}

impl TicketRenderer for PdfTicketRenderer {
    fn render(&self, details: &TicketDetails) -> Result<Attachment> {
        let render_error = |e: lopdf::Error| BookingError::Internal(format!("ticket pdf: {e}"));

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        let content = Content {
            operations: self.operations(details),
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(render_error)?,
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut content = Vec::new();
        doc.save_to(&mut content)
            .map_err(|e| BookingError::Internal(format!("ticket pdf: {e}")))?;

        Ok(Attachment {
            filename: "booking.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            content,
        })
    }
}
