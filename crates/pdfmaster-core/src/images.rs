//! Images to PDF
//!
//! Builds a document with one page per image, each page sized to the
//! image's pixel dimensions (1 px = 1 pt) and fully covered by it.

use std::io::{Cursor, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::PdfError;
use crate::save_document;

/// Image formats that can be placed on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// Map an upload's MIME type; anything else is unsupported
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            _ => None,
        }
    }

    /// Detect the format from the file's magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            _ => None,
        }
    }
}

/// One uploaded image
#[derive(Debug, Clone, Copy)]
pub struct ImageInput<'a> {
    pub bytes: &'a [u8],
    /// Declared MIME type; sniffed from the bytes when absent
    pub mime_type: Option<&'a str>,
}

impl ImageInput<'_> {
    fn kind(&self) -> Option<ImageKind> {
        match self.mime_type {
            Some(mime) if !mime.is_empty() => ImageKind::from_mime(mime),
            _ => ImageKind::sniff(self.bytes),
        }
    }
}

/// An image XObject ready to be added to a document
struct EmbeddedImage {
    width: u32,
    height: u32,
    stream: Stream,
    soft_mask: Option<Stream>,
}

/// Create a PDF with one full-page image per supported input
///
/// Inputs with an unsupported MIME type are skipped without error. A
/// supported image that fails to decode fails the whole request.
pub fn images_to_pdf(images: &[ImageInput<'_>]) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut page_ids = Vec::new();

    for (i, input) in images.iter().enumerate() {
        let embedded = match input.kind() {
            Some(ImageKind::Jpeg) => embed_jpeg(input.bytes)?,
            Some(ImageKind::Png) => embed_png(input.bytes)?,
            None => {
                debug!(index = i, mime = ?input.mime_type, "skipping unsupported image");
                continue;
            }
        };
        page_ids.push(add_image_page(&mut doc, pages_id, embedded)?);
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => page_ids.len() as i64,
        "Kids" => page_ids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    save_document(&mut doc)
}

/// JPEG data is embedded untouched and decoded by the viewer
fn embed_jpeg(bytes: &[u8]) -> Result<EmbeddedImage, PdfError> {
    let decoder = JpegDecoder::new(Cursor::new(bytes))
        .map_err(|e| PdfError::UnsupportedImage(format!("Invalid JPEG: {}", e)))?;
    let (width, height) = decoder.dimensions();

    // The decoder reports CMYK as RGB, so the frame header decides
    let header = JpegHeader::read(bytes).unwrap_or(JpegHeader {
        components: if decoder.color_type().has_color() { 3 } else { 1 },
        adobe: false,
    });

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => header.color_space()?,
        "BitsPerComponent" => 8_i64,
        "Filter" => "DCTDecode",
    };
    if header.inverted() {
        dict.set(
            "Decode",
            [1, 0, 1, 0, 1, 0, 1, 0]
                .into_iter()
                .map(Object::Integer)
                .collect::<Vec<_>>(),
        );
    }

    Ok(EmbeddedImage {
        width,
        height,
        stream: Stream::new(dict, bytes.to_vec()),
        soft_mask: None,
    })
}

/// Colour layout read from a JPEG's frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegHeader {
    components: u8,
    /// An Adobe APP14 segment was present
    adobe: bool,
}

impl JpegHeader {
    /// Walk the marker segments up to the first start-of-frame
    fn read(bytes: &[u8]) -> Option<Self> {
        if bytes.get(..2)? != [0xFF, 0xD8] {
            return None;
        }
        let mut adobe = false;
        let mut pos = 2;
        loop {
            if *bytes.get(pos)? != 0xFF {
                return None;
            }
            let marker = *bytes.get(pos + 1)?;
            match marker {
                // Fill byte before a marker
                0xFF => {
                    pos += 1;
                    continue;
                }
                // Markers without a length field
                0x01 | 0xD0..=0xD7 => {
                    pos += 2;
                    continue;
                }
                // Start of scan without a frame header
                0xD9 | 0xDA => return None,
                _ => {}
            }

            let length = u16::from_be_bytes([*bytes.get(pos + 2)?, *bytes.get(pos + 3)?]) as usize;
            let segment = bytes.get(pos + 4..pos + 2 + length)?;
            match marker {
                0xEE if segment.starts_with(b"Adobe") => adobe = true,
                // SOF0..SOF15 except DHT, JPG and DAC
                0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                    return Some(Self {
                        components: *segment.get(5)?,
                        adobe,
                    });
                }
                _ => {}
            }
            pos += 2 + length;
        }
    }

    fn color_space(&self) -> Result<&'static str, PdfError> {
        match self.components {
            1 => Ok("DeviceGray"),
            3 => Ok("DeviceRGB"),
            4 => Ok("DeviceCMYK"),
            n => Err(PdfError::UnsupportedImage(format!(
                "JPEG with {} colour components",
                n
            ))),
        }
    }

    /// Adobe CMYK JPEGs store inverted samples
    fn inverted(&self) -> bool {
        self.components == 4 && self.adobe
    }
}

/// PNG is decoded and re-encoded as Flate samples plus an alpha soft mask
fn embed_png(bytes: &[u8]) -> Result<EmbeddedImage, PdfError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| PdfError::UnsupportedImage(format!("Invalid PNG: {}", e)))?;
    let (width, height) = image.dimensions();
    let color = image.color();

    let (color_space, samples) = if color.has_color() {
        ("DeviceRGB", image.to_rgb8().into_raw())
    } else {
        ("DeviceGray", image.to_luma8().into_raw())
    };

    let soft_mask = if color.has_alpha() {
        let alpha = alpha_channel(&image);
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8_i64,
            "Filter" => "FlateDecode",
        };
        Some(Stream::new(dict, deflate(&alpha)?))
    } else {
        None
    };

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8_i64,
        "Filter" => "FlateDecode",
    };

    Ok(EmbeddedImage {
        width,
        height,
        stream: Stream::new(dict, deflate(&samples)?),
        soft_mask,
    })
}

fn alpha_channel(image: &DynamicImage) -> Vec<u8> {
    image.to_rgba8().pixels().map(|pixel| pixel[3]).collect()
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| PdfError::OperationError(format!("Deflate failed: {}", e)))
}

/// Add a page of the image's size that draws it edge to edge
fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    image: EmbeddedImage,
) -> Result<ObjectId, PdfError> {
    let EmbeddedImage {
        width,
        height,
        mut stream,
        soft_mask,
    } = image;

    if let Some(mask) = soft_mask {
        let mask_id = doc.add_object(mask);
        stream.dict.set("SMask", mask_id);
    }
    let image_id = doc.add_object(stream);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width as i64),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height as i64),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| PdfError::OperationError(format!("Content encoding failed: {}", e)))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width as i64),
            Object::Integer(height as i64),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
        "Contents" => content_id,
    }))
}
