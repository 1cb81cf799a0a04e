//! Writing a cropped single-page document.
//!
//! The selected page is copied into a fresh document with `hayro-write`, which
//! leaves interactive annotations behind. The page dictionary is then patched
//! in place to carry the new `/CropBox` and `/Rotate`, and a fresh
//! cross-reference section is appended so that object offsets stay valid.

use crate::coord::{PdfRect, Viewport};
use crate::error::CropError;
use crate::rect::Rectangle;
use crate::settings::CropSettings;
use hayro_syntax::Pdf;
use pdf_writer::Ref;
use std::collections::BTreeMap;

/// Export the page under `selection` as a new single-page document.
///
/// The selection is converted to PDF space with `viewport`, which must have
/// been produced by rendering `page_index`. `rotation_degrees` is added on
/// top of the page's own `/Rotate`, and the sum is taken modulo 360.
pub fn export_crop(
    pdf: &Pdf,
    page_index: usize,
    selection: &Rectangle,
    viewport: &Viewport,
    rotation_degrees: i64,
    settings: &CropSettings,
) -> Result<Vec<u8>, CropError> {
    if !selection.is_valid(settings.min_selection_size) {
        return Err(CropError::InvalidRectangle);
    }

    if viewport.page_index() != page_index {
        return Err(CropError::StaleViewport);
    }

    let crop_box = viewport.crop_box_for(selection.bounds());
    let rotation = (i64::from(viewport.rotation()) + rotation_degrees).rem_euclid(360) as i32;
    write_cropped_page(pdf, page_index, crop_box, rotation)
}

/// Copy page `page_index` into a new document with the given crop box and
/// rotation, and without annotations.
pub fn write_cropped_page(
    pdf: &Pdf,
    page_index: usize,
    crop_box: PdfRect,
    rotation: i32,
) -> Result<Vec<u8>, CropError> {
    if page_index >= pdf.pages().len() {
        return Err(CropError::InvalidPageIndex(page_index));
    }

    let mut next_ref = Ref::new(1);
    let mut alloc = || {
        let r = next_ref;
        next_ref = Ref::new(next_ref.get() + 1);
        r
    };

    let catalog_ref = alloc();
    let page_tree_ref = alloc();

    let extracted = hayro_write::extract(
        pdf,
        Box::new(|| {
            let r = next_ref;
            next_ref = Ref::new(next_ref.get() + 1);
            r
        }),
        &[hayro_write::ExtractionQuery::new_page(page_index)],
    )
    .map_err(|_| CropError::InvalidPdf)?;

    let page_ref = extracted
        .root_refs
        .first()
        .ok_or(CropError::InvalidPdf)?
        .as_ref()
        .map_err(|_| CropError::InvalidPdf)
        .copied()?;

    let mut out_pdf = pdf_writer::Pdf::new();
    out_pdf.catalog(catalog_ref).pages(page_tree_ref);
    out_pdf.pages(page_tree_ref).kids([page_ref]).count(1);
    out_pdf.extend(&extracted.chunk);

    let mut pdf_bytes = out_pdf.finish();

    let entries = [
        ("CropBox", format_rect(&crop_box)),
        ("Rotate", rotation.to_string()),
        ("Parent", format!("{} 0 R", page_tree_ref.get())),
    ];

    if !rewrite_page_dict(&mut pdf_bytes, page_ref, &entries, &["Annots"]) {
        return Err(CropError::InvalidPdf);
    }

    append_xref_and_trailer(&mut pdf_bytes, catalog_ref);

    log::debug!(
        "exported page {page_index} with crop box {:?} and rotation {rotation}",
        crop_box.to_array()
    );

    Ok(pdf_bytes)
}

/// Format a number the way it should appear in the page dictionary.
///
/// Values are rounded to four decimals so that the same selection always
/// produces the same bytes.
fn format_number(v: f64) -> String {
    let rounded = (v * 10_000.0).round() / 10_000.0;
    if rounded == rounded.trunc() {
        return format!("{}", rounded as i64);
    }

    format!("{rounded:.4}").trim_end_matches('0').to_string()
}

fn format_rect(rect: &PdfRect) -> String {
    let [x0, y0, x1, y1] = rect.to_array();
    format!(
        "[{} {} {} {}]",
        format_number(x0),
        format_number(y0),
        format_number(x1),
        format_number(y1)
    )
}

/// Set `entries` in a page dictionary in the raw PDF bytes, replacing any
/// existing values, and drop the keys listed in `strip`.
fn rewrite_page_dict(
    pdf_bytes: &mut Vec<u8>,
    page_ref: Ref,
    entries: &[(&str, String)],
    strip: &[&str],
) -> bool {
    let Some(obj_pos) = find_object(pdf_bytes, page_ref) else {
        return false;
    };

    let Some(dict_start_rel) = find_bytes(&pdf_bytes[obj_pos..], b"<<") else {
        return false;
    };
    let dict_start = obj_pos + dict_start_rel;

    let Some(dict_end) = dict_close(pdf_bytes, dict_start) else {
        return false;
    };

    let Some(body) = rewrite_dict_body(&pdf_bytes[dict_start + 2..dict_end], entries, strip)
    else {
        return false;
    };

    let tail = pdf_bytes.split_off(dict_end);
    pdf_bytes.truncate(dict_start + 2);
    pdf_bytes.extend_from_slice(&body);
    pdf_bytes.extend_from_slice(&tail);
    true
}

/// Rebuild the inside of a dictionary (between `<<` and `>>`).
///
/// Entries are expected one per line, as `pdf-writer` emits them. Returns
/// `None` if a key that has to be removed spans multiple lines.
fn rewrite_dict_body(
    body: &[u8],
    entries: &[(&str, String)],
    strip: &[&str],
) -> Option<Vec<u8>> {
    let mut kept: Vec<&[u8]> = Vec::new();
    let mut indent: Option<&[u8]> = None;
    let mut depth = 0_i32;

    for line in body.split(|b| *b == b'\n') {
        let content_start = line
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(line.len());
        let content = &line[content_start..];
        let delta = nesting_delta(line);

        if depth == 0 && content.first() == Some(&b'/') {
            indent.get_or_insert(&line[..content_start]);

            let replaced = entries.iter().any(|(key, _)| starts_with_key(content, key))
                || strip.iter().any(|key| starts_with_key(content, key));

            if replaced {
                if delta != 0 {
                    return None;
                }
                continue;
            }
        }

        depth += delta;
        kept.push(line);
    }

    let mut out = kept.join(&b'\n');
    while out.last().is_some_and(|b| b.is_ascii_whitespace()) {
        out.pop();
    }

    let indent = indent.unwrap_or(b"  ");
    for (key, value) in entries {
        out.push(b'\n');
        out.extend_from_slice(indent);
        out.extend_from_slice(format!("/{key} {value}").as_bytes());
    }
    out.push(b'\n');

    Some(out)
}

/// Whether a dictionary line starts with the key `/key`.
fn starts_with_key(content: &[u8], key: &str) -> bool {
    let Some(rest) = content
        .strip_prefix(b"/")
        .and_then(|c| c.strip_prefix(key.as_bytes()))
    else {
        return false;
    };

    match rest.first() {
        None => true,
        Some(b) => b.is_ascii_whitespace() || matches!(b, b'[' | b'<' | b'(' | b'/'),
    }
}

/// The net number of dictionaries and arrays opened on a line.
fn nesting_delta(line: &[u8]) -> i32 {
    let mut delta = 0;
    let mut idx = 0;

    while idx < line.len() {
        if line[idx..].starts_with(b"<<") {
            delta += 1;
            idx += 2;
            continue;
        }

        if line[idx..].starts_with(b">>") {
            delta -= 1;
            idx += 2;
            continue;
        }

        match line[idx] {
            b'[' => delta += 1,
            b']' => delta -= 1,
            _ => {}
        }
        idx += 1;
    }

    delta
}

/// Find the start of the header of an indirect object.
fn find_object(pdf_bytes: &[u8], obj_ref: Ref) -> Option<usize> {
    let marker = format!("{} 0 obj", obj_ref.get());
    let mut from = 0;

    while let Some(rel) = find_bytes(&pdf_bytes[from..], marker.as_bytes()) {
        let pos = from + rel;
        // Reject matches such as "13 0 obj" when looking for "3 0 obj".
        if pos == 0 || matches!(pdf_bytes[pos - 1], b'\n' | b'\r') {
            return Some(pos);
        }
        from = pos + marker.len();
    }

    None
}

/// The offset of the `>>` closing the dictionary whose `<<` is at `open`.
fn dict_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    let mut pos = open;

    while let Some(pair) = bytes.get(pos..pos + 2) {
        let step = match pair {
            b"<<" => {
                depth += 1;
                2
            }
            b">>" => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(pos);
                }
                2
            }
            _ => 1,
        };
        pos += step;
    }

    None
}

/// Append a cross-reference section covering every object in the file.
///
/// The earlier sections are left in place but no longer referenced, since
/// patching the page dictionary shifted the offsets they record.
fn append_xref_and_trailer(pdf_bytes: &mut Vec<u8>, catalog_ref: Ref) {
    let offsets = collect_object_offsets(pdf_bytes);
    let Some(&last_id) = offsets.keys().next_back() else {
        return;
    };
    let size = last_id + 1;

    // Unused numbers form the free list, headed by object 0 and closed by 0.
    let free: Vec<i32> = (0..size).filter(|id| !offsets.contains_key(id)).collect();

    let mut section = format!("xref\n0 {size}\n");
    for id in 0..size {
        let entry = match offsets.get(&id) {
            Some(offset) => format!("{offset:010} 00000 n\r\n"),
            None => {
                let next = free.iter().copied().find(|f| *f > id).unwrap_or(0);
                let generation = if id == 0 { 65535 } else { 0 };
                format!("{next:010} {generation:05} f\r\n")
            }
        };
        section.push_str(&entry);
    }

    let xref_offset = pdf_bytes.len() + 1;
    pdf_bytes.push(b'\n');
    pdf_bytes.extend_from_slice(section.as_bytes());
    pdf_bytes.extend_from_slice(
        format!(
            "trailer\n<<\n  /Size {size}\n  /Root {} 0 R\n>>\nstartxref\n{xref_offset}\n%%EOF",
            catalog_ref.get()
        )
        .as_bytes(),
    );
}

/// The offset of every `N 0 obj` header, by object number.
fn collect_object_offsets(pdf_bytes: &[u8]) -> BTreeMap<i32, usize> {
    let mut offsets = BTreeMap::new();
    let mut line_start = 0;

    for line in pdf_bytes.split_inclusive(|b| matches!(b, b'\n' | b'\r')) {
        if let Some(id) = parse_obj_header(line) {
            offsets.insert(id, line_start);
        }
        line_start += line.len();
    }

    offsets
}

/// Parse an indirect object header line like "12 0 obj".
fn parse_obj_header(line: &[u8]) -> Option<i32> {
    let line = line.trim_ascii();
    let rest = line.strip_suffix(b" 0 obj")?;

    if rest.is_empty() || !rest.iter().all(u8::is_ascii_digit) {
        return None;
    }

    std::str::from_utf8(rest).ok()?.parse().ok()
}

/// Find the position of a byte pattern in a byte slice.
fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
