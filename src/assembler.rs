//! Assembles kept frames into a single PDF, one page per frame, in the exact
//! order given. The JPEG data is embedded as-is (DCTDecode), nothing is
//! recompressed.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("there are no pages to assemble")]
    Empty,
    #[error("failed to build the pdf")]
    Pdf(#[from] lopdf::Error),
}

/// One kept frame, ready for embedding.
#[derive(Debug, Clone)]
pub struct Page {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Encodes the pages into PDF bytes. The page order is preserved verbatim,
/// deduplication already happened upstream. Writing the bytes anywhere is the
/// caller's business.
pub fn assemble(pages: &[Page]) -> Result<Vec<u8>, AssembleError> {
    if pages.is_empty() {
        return Err(AssembleError::Empty);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let width = i64::from(page.width);
        let height = i64::from(page.height);

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            page.jpeg.clone(),
        ));

        // draw the image over the whole media box, one pixel per point
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width.into(),
                        0.into(),
                        0.into(),
                        height.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).expect("page count fits");
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(lopdf::Error::from)?;
    Ok(bytes)
}
