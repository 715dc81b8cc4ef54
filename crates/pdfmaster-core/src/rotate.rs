//! PDF Rotate
//!
//! Adds a rotation delta to the /Rotate of selected pages.

use lopdf::Object;
use tracing::debug;

use crate::error::PdfError;
use crate::pages::inherited_attribute;
use crate::{load_document, parse_page_indices, save_document};

/// Rotation applied when the request gives none (or an unreadable one)
pub const DEFAULT_ROTATION: i64 = 90;

/// What to rotate and by how much
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotateRequest {
    /// Degrees to add, clockwise; must be a multiple of 90
    pub degrees: i64,
    /// 0-indexed pages to rotate; `None` rotates every page
    pub pages: Option<Vec<i64>>,
}

impl Default for RotateRequest {
    fn default() -> Self {
        Self {
            degrees: DEFAULT_ROTATION,
            pages: None,
        }
    }
}

impl RotateRequest {
    /// Build a request from the `rotation` and `pages` form fields
    ///
    /// A missing or non-numeric `rotation` falls back to 90 degrees; an
    /// explicit `"0"` is kept as 0.
    /// `pages`, when present, must be a JSON array of integers.
    pub fn from_form(rotation: Option<&str>, pages: Option<&str>) -> Result<Self, PdfError> {
        let degrees = rotation
            .and_then(|r| r.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_ROTATION);
        let pages = pages.map(parse_page_indices).transpose()?;
        Ok(Self { degrees, pages })
    }
}

/// Normalize an angle into `[0, 360)`
pub fn normalize_rotation(degrees: i64) -> i64 {
    degrees.rem_euclid(360)
}

/// Rotate the requested pages of a PDF by `request.degrees`
///
/// Each page's effective rotation (its own /Rotate or the inherited one)
/// is increased by the delta and written back onto the page itself.
pub fn rotate_document(bytes: &[u8], request: &RotateRequest) -> Result<Vec<u8>, PdfError> {
    if request.degrees % 90 != 0 {
        return Err(PdfError::InvalidRotation(request.degrees));
    }

    let mut doc = load_document(bytes)?;
    let pages = doc.get_pages();
    let page_count = pages.len() as u32;

    let targets: Vec<i64> = match &request.pages {
        Some(indices) => indices.clone(),
        None => (0..page_count as i64).collect(),
    };

    for index in targets {
        let page_id = index
            .checked_add(1)
            .and_then(|page_number| u32::try_from(page_number).ok())
            .and_then(|page_number| pages.get(&page_number))
            .copied()
            .ok_or(PdfError::PageOutOfRange { index, page_count })?;

        let current = inherited_attribute(&doc, page_id, b"Rotate")
            .and_then(|rotate| rotate.as_i64().ok())
            .unwrap_or(0);
        // Both terms are reduced first so huge values cannot overflow
        let rotated =
            normalize_rotation(normalize_rotation(current) + normalize_rotation(request.degrees));

        doc.get_dictionary_mut(page_id)
            .map_err(|e| PdfError::OperationError(format!("Page {} unreadable: {}", index, e)))?
            .set("Rotate", Object::Integer(rotated));

        debug!(index, current, rotated, "page rotated");
    }

    save_document(&mut doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_pdf, page_rotations};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_default_request_rotates_all_pages_90() {
        let pdf = create_test_pdf(3, "Rot");
        let rotated = rotate_document(&pdf, &RotateRequest::default()).unwrap();
        assert_eq!(page_rotations(&rotated), vec![90, 90, 90]);
    }

    #[test]
    fn test_rotate_selected_pages_only() {
        let pdf = create_test_pdf(4, "Rot");
        let request = RotateRequest {
            degrees: 180,
            pages: Some(vec![0, 2]),
        };
        let rotated = rotate_document(&pdf, &request).unwrap();
        assert_eq!(page_rotations(&rotated), vec![180, 0, 180, 0]);
    }

    #[test]
    fn test_negative_rotation_normalizes() {
        let pdf = create_test_pdf(1, "Rot");
        let request = RotateRequest {
            degrees: -90,
            pages: None,
        };
        let rotated = rotate_document(&pdf, &request).unwrap();
        assert_eq!(page_rotations(&rotated), vec![270]);
    }

    #[test]
    fn test_rotation_wraps_past_360() {
        let pdf = create_test_pdf(1, "Rot");
        let once = rotate_document(
            &pdf,
            &RotateRequest {
                degrees: 270,
                pages: None,
            },
        )
        .unwrap();
        let twice = rotate_document(
            &once,
            &RotateRequest {
                degrees: 180,
                pages: None,
            },
        )
        .unwrap();
        assert_eq!(page_rotations(&twice), vec![90]);
    }

    #[test]
    fn test_huge_delta_does_not_overflow() {
        let pdf = create_test_pdf(1, "Rot");
        let at_90 = rotate_document(&pdf, &RotateRequest::default()).unwrap();

        for (degrees, expected) in [
            (9_223_372_036_854_775_800, 90),
            (9_223_372_036_854_775_710, 0),
            (-9_223_372_036_854_775_800, 90),
        ] {
            let request = RotateRequest {
                degrees,
                pages: None,
            };
            let rotated = rotate_document(&at_90, &request).unwrap();
            assert_eq!(page_rotations(&rotated), vec![expected]);
        }
    }

    #[test]
    fn test_from_form_zero_is_a_no_op() {
        let request = RotateRequest::from_form(Some("0"), None).unwrap();
        assert_eq!(request.degrees, 0);

        let pdf = create_test_pdf(2, "Rot");
        let rotated = rotate_document(&pdf, &request).unwrap();
        assert_eq!(page_rotations(&rotated), vec![0, 0]);
    }

    #[test]
    fn test_non_right_angle_fails() {
        let pdf = create_test_pdf(1, "Rot");
        let request = RotateRequest {
            degrees: 45,
            pages: None,
        };
        assert!(matches!(
            rotate_document(&pdf, &request),
            Err(PdfError::InvalidRotation(45))
        ));
    }

    #[test]
    fn test_page_index_out_of_range_fails() {
        let pdf = create_test_pdf(2, "Rot");
        for index in [2, -1, i64::MAX, i64::MIN] {
            let request = RotateRequest {
                degrees: 90,
                pages: Some(vec![index]),
            };
            assert!(matches!(
                rotate_document(&pdf, &request),
                Err(PdfError::PageOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_from_form_defaults() {
        let request = RotateRequest::from_form(None, None).unwrap();
        assert_eq!(request, RotateRequest::default());

        let request = RotateRequest::from_form(Some("abc"), None).unwrap();
        assert_eq!(request.degrees, DEFAULT_ROTATION);
    }

    #[test]
    fn test_from_form_parses_fields() {
        let request = RotateRequest::from_form(Some(" 180 "), Some("[1, 3]")).unwrap();
        assert_eq!(request.degrees, 180);
        assert_eq!(request.pages, Some(vec![1, 3]));
    }

    #[test]
    fn test_from_form_rejects_malformed_pages() {
        let result = RotateRequest::from_form(Some("90"), Some("[1,"));
        assert!(matches!(result, Err(PdfError::SerializationError(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Property: rotating by d1 then d2 equals one rotation by (d1 + d2) mod 360
        #[test]
        fn rotations_compose(q1 in -4i64..8, q2 in -4i64..8) {
            let (d1, d2) = (q1 * 90, q2 * 90);
            let pdf = create_test_pdf(2, "Prop");

            let rotate = |bytes: &[u8], degrees: i64| {
                rotate_document(bytes, &RotateRequest { degrees, pages: None }).unwrap()
            };

            let stepwise = rotate(&rotate(&pdf, d1), d2);
            let combined = rotate(&pdf, normalize_rotation(d1 + d2));

            prop_assert_eq!(page_rotations(&stepwise), page_rotations(&combined));
        }
    }
}
