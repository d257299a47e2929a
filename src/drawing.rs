//! PDF drawing operations for exported sheets

use crate::Result;
use crate::constants::*;
use crate::export::PageFit;
use image::RgbImage;
use lopdf::{
    Dictionary, Document, Object, ObjectId, Stream,
    content::{Content, Operation},
    dictionary,
};
use tracing::{debug, trace};

/// A4 page size in PDF points
pub fn a4_size_points() -> (f32, f32) {
    (A4_WIDTH_MM * POINTS_PER_MM, A4_HEIGHT_MM * POINTS_PER_MM)
}

/// Create a document holding one empty portrait A4 page
pub fn create_a4_document() -> (Document, ObjectId) {
    let (width, height) = a4_size_points();
    let media_box: Vec<Object> = vec![0_i64.into(), 0_i64.into(), width.into(), height.into()];

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box.clone(),
        "Resources" => Dictionary::new(),
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1_i64,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("A4 text blocks"),
        "Producer" => Object::string_literal("blocksheet"),
    });
    doc.trailer.set("Info", info_id);

    (doc, page_id)
}

/// Add an RGB raster as an image XObject
pub fn add_image_xobject(doc: &mut Document, image: &RgbImage) -> ObjectId {
    let (width, height) = image.dimensions();
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        },
        image.as_raw().clone(),
    );
    doc.add_object(stream)
}

/// Operations painting a named XObject into the fitted rectangle
pub fn place_image_operations(name: &str, fit: &PageFit) -> Vec<Operation> {
    let (x, y, width, height) = fit.to_pdf_rect();
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                width.into(),
                0.0_f32.into(),
                0.0_f32.into(),
                height.into(),
                x.into(),
                y.into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// Make an XObject reachable from a page's resources under `name`
pub fn register_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    xobject_id: ObjectId,
) -> Result<()> {
    // Resources may be inline on the page or an indirect object
    let resources_id = match doc.get_dictionary(page_id)?.get(b"Resources") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    let resources = match resources_id {
        Some(id) => doc.get_dictionary_mut(id)?,
        None => {
            let page = doc.get_dictionary_mut(page_id)?;
            if !matches!(page.get(b"Resources"), Ok(Object::Dictionary(_))) {
                page.set("Resources", Dictionary::new());
            }
            page.get_mut(b"Resources")?.as_dict_mut()?
        }
    };

    let xobjects_id = match resources.get_mut(b"XObject") {
        Ok(Object::Dictionary(xobjects)) => {
            xobjects.set(name, xobject_id);
            return Ok(());
        }
        Ok(Object::Reference(id)) => *id,
        _ => {
            resources.set("XObject", dictionary! { name => xobject_id });
            return Ok(());
        }
    };
    doc.get_dictionary_mut(xobjects_id)?.set(name, xobject_id);
    Ok(())
}

/// Append content operations to a page
pub fn add_operations_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<()> {
    debug!(
        "Adding {} operations to page {:?}",
        operations.len(),
        page_id
    );
    for op in &operations {
        trace!(
            "Operation: {} with operands: {:?}",
            op.operator, op.operands
        );
    }

    let content = Content { operations };
    let content_bytes = content.encode()?;
    doc.add_page_contents(page_id, content_bytes)?;

    Ok(())
}

/// Serialize a document to bytes with compressed streams
pub fn document_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    trace!("Serialized document to {} bytes", buffer.len());
    Ok(buffer)
}
