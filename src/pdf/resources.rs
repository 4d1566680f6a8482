//! Per-page resource dictionaries.

use lopdf::{Dictionary, Object, ObjectId};

use super::fonts::{CID_FONT_RESOURCE, StandardFont};

/// Font resource entries shared by every page
pub fn font_resources(
    regular_id: ObjectId,
    bold_id: ObjectId,
    cid_font_id: Option<ObjectId>,
) -> Dictionary {
    let mut fonts = Dictionary::new();
    fonts.set(StandardFont::Helvetica.resource_name(), Object::Reference(regular_id));
    fonts.set(StandardFont::HelveticaBold.resource_name(), Object::Reference(bold_id));
    if let Some(id) = cid_font_id {
        fonts.set(CID_FONT_RESOURCE, Object::Reference(id));
    }
    fonts
}

/// Build a page's resources dictionary from the shared fonts and the
/// XObjects drawn on that page
pub fn page_resources(fonts: &Dictionary, xobject_dict: &Dictionary) -> Dictionary {
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts.clone()));

    if !xobject_dict.is_empty() {
        resources.set("XObject", Object::Dictionary(xobject_dict.clone()));
    }

    resources.set(
        "ProcSet",
        ["PDF", "Text", "ImageB", "ImageC"]
            .into_iter()
            .map(|name| Object::Name(name.as_bytes().to_vec()))
            .collect::<Vec<_>>(),
    );
    resources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_resources_without_fallback() {
        let fonts = font_resources((1, 0), (2, 0), None);
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(b"F2"));
        assert!(!fonts.has(CID_FONT_RESOURCE.as_bytes()));
    }

    #[test]
    fn test_page_resources_skips_empty_xobjects() {
        let fonts = font_resources((1, 0), (2, 0), Some((3, 0)));
        let resources = page_resources(&fonts, &Dictionary::new());
        assert!(resources.has(b"Font"));
        assert!(!resources.has(b"XObject"));

        let mut xobjects = Dictionary::new();
        xobjects.set("Logo", Object::Reference((4, 0)));
        let resources = page_resources(&fonts, &xobjects);
        let xobj = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert!(xobj.has(b"Logo"));
    }
}
