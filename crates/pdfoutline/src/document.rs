use std::path::{Path, PathBuf};
use std::sync::Arc;

use outline_core::{Outline, OutlineConfig};
use tokio::task::JoinError;

/// File name shown in place of a title when a document cannot be read.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Decode one PDF and infer its outline.
///
/// Never fails: unreadable input becomes an outline carrying an error.
pub fn process_path(path: &Path, config: &OutlineConfig) -> Outline {
    let pages = match pdf::open(path) {
        Ok(pages) => pages,
        Err(err) => {
            log::warn!("{}: {err}", path.display());
            return Outline::unreadable(display_name(path));
        }
    };

    let outline = outline_core::extract_outline(&pages, config);
    log::debug!(
        "{}: {} pages, {} headings",
        path.display(),
        pages.len(),
        outline.outline.len()
    );
    outline
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Run `job` on the blocking pool. A panic comes back as `Err` with its
/// message.
pub async fn run_blocking<F>(job: F) -> Result<Outline, String>
where
    F: FnOnce() -> Outline + Send + 'static,
{
    tokio::task::spawn_blocking(job).await.map_err(panic_message)
}

/// [`run_blocking`], turning a panic into a failed outline for `name`.
pub async fn isolate<F>(name: &str, job: F) -> Outline
where
    F: FnOnce() -> Outline + Send + 'static,
{
    match run_blocking(job).await {
        Ok(outline) => outline,
        Err(reason) => {
            log::error!("{name}: extraction failed: {reason}");
            Outline::failed(reason)
        }
    }
}

/// [`process_path`] on the blocking pool.
pub async fn process_isolated(path: PathBuf, config: Arc<OutlineConfig>) -> Outline {
    let name = path.display().to_string();
    isolate(&name, move || process_path(&path, &config)).await
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! In-memory PDFs for shell tests.

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    const BODY: &str = "the quick brown fox jumps over the lazy dog again";

    fn name(n: &str) -> Object {
        Object::Name(n.as_bytes().to_vec())
    }

    /// Draw `text` with font `font` at `size`, baseline at (`x`, `y`) in PDF space.
    pub fn show(font: &str, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![name(font), Object::Integer(size)]),
            Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    }

    /// Three 12pt body lines starting at baseline `y`, 14pt apart.
    pub fn body(y: i64) -> Vec<Operation> {
        (0..3).flat_map(|i| show("F1", 12, 72, y - i * 14, BODY)).collect()
    }

    /// US Letter pages with `F1` = Helvetica and `F2` = Helvetica-Bold.
    pub fn build_pdf(pages: Vec<Vec<Operation>>) -> Vec<u8> {
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

        let mut kids: Vec<Object> = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => regular, "F2" => bold },
                },
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(count),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// A one-page report: centered title, two headings, body paragraphs.
    pub fn report_pdf() -> Vec<u8> {
        let mut ops = show("F2", 24, 228, 712, "Annual Report");
        ops.extend(show("F2", 18, 72, 450, "Introduction"));
        ops.extend(body(420));
        ops.extend(show("F2", 14, 72, 360, "Background"));
        ops.extend(body(330));
        build_pdf(vec![ops])
    }
}
