use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// First line of the managed region.
pub const BEGIN_MARK: &str = ".. pysphinx-autoindex start";
/// Last line of the managed region.
pub const END_MARK: &str = ".. pysphinx-autoindex end";
/// Heading used as the insertion point before any markers exist.
pub const INITIAL_MARK: &str = "Indices and tables";

/// Splices `body` into the managed region of `document`.
///
/// With markers present the span from the begin marker through the end
/// marker is replaced; a newline separator before the begin marker is
/// ensured, not accumulated, so repeated runs are byte-stable. Without
/// markers the block is inserted immediately before the fallback anchor,
/// followed by a blank line, and the markers are installed so later runs
/// take the marker path. A marker or anchor at offset 0 counts as found.
///
/// Fails when the document has neither a begin marker nor the anchor, or
/// when a begin marker has no matching end marker (a previously corrupted
/// managed region).
pub fn splice_document(document: &str, body: &str) -> Result<String> {
    let (replace_start, replace_end, leading, trailing) = match document.find(BEGIN_MARK) {
        Some(begin) => {
            let end = document.find(END_MARK).with_context(|| {
                format!("corrupted index file, please clear the autogenerated area under {BEGIN_MARK}")
            })?;
            let leading = if begin == 0 || document[..begin].ends_with('\n') {
                ""
            } else {
                "\n"
            };
            (begin, end + END_MARK.len(), leading, "")
        }
        None => {
            let anchor = document.find(INITIAL_MARK).with_context(|| {
                format!("cannot find where to write automodule, index file does not contain {INITIAL_MARK:?}")
            })?;
            (anchor, anchor, "", "\n\n")
        }
    };

    Ok(format!(
        "{}{leading}{BEGIN_MARK}{body}{END_MARK}{trailing}{}",
        &document[..replace_start],
        &document[replace_end..]
    ))
}

/// Rewrites `index_file` in place with `body` spliced into its managed
/// region. The file is only written once the whole new document has been
/// composed, so a failing splice leaves it untouched. Returns `true` when
/// the write was skipped because the document was already current.
pub fn patch_index_file(index_file: &Path, body: &str) -> Result<bool> {
    let document = fs::read_to_string(index_file)
        .with_context(|| format!("failed to read index file: {}", index_file.display()))?;
    let updated = splice_document(&document, body)?;

    if updated == document {
        return Ok(true);
    }

    fs::write(index_file, &updated)
        .with_context(|| format!("failed to write index file: {}", index_file.display()))?;
    Ok(false)
}
