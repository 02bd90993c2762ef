use crate::error::ExtractError;
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};
use lopdf::Document;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Converts the raw bytes of one file format into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// Recognizes the text in one encoded raster image (PNG, JPEG).
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<String, ExtractError>;
}

/// Renders every page of a PDF to an encoded image, in page order.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>, ExtractError>;
}

#[derive(Debug, Clone)]
pub struct TesseractConfig {
    pub binary: PathBuf,
    pub language: String,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
        }
    }
}

/// OCR through the `tesseract` command line tool, image on stdin and text on stdout.
#[derive(Debug, Clone, Default)]
pub struct TesseractOcr {
    config: TesseractConfig,
}

impl TesseractOcr {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> Result<String, ExtractError> {
        if image.is_empty() {
            return Err(ExtractError::Ocr("image payload is empty".to_string()));
        }

        let mut child = Command::new(&self.config.binary)
            .args(["stdin", "stdout", "-l", self.config.language.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| {
                ExtractError::Ocr(format!(
                    "unable to start {}: {error}",
                    self.config.binary.display()
                ))
            })?;

        // An early exit breaks the pipe; the exit status is reported first.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(image),
            None => Ok(()),
        };

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ExtractError::Ocr(format!(
                "{} exited with {}: {}",
                self.config.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        written?;

        String::from_utf8(output.stdout)
            .map_err(|error| ExtractError::Ocr(format!("ocr output is not utf-8: {error}")))
    }
}

#[derive(Debug, Clone)]
pub struct PdftoppmConfig {
    pub binary: PathBuf,
    pub dpi: u32,
}

impl Default for PdftoppmConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
            dpi: 200,
        }
    }
}

/// Page rendering through poppler's `pdftoppm`.
///
/// The document is opened with lopdf first, so corrupt input is reported as a
/// parse error and the rendered page count can be checked against the
/// document's own page tree.
#[derive(Debug, Clone, Default)]
pub struct PdftoppmRasterizer {
    config: PdftoppmConfig,
}

impl PdftoppmRasterizer {
    pub fn new(config: PdftoppmConfig) -> Self {
        Self { config }
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>, ExtractError> {
        let page_count = count_pdf_pages(pdf)?;
        if page_count == 0 {
            return Err(ExtractError::Pdf("pdf has no pages".to_string()));
        }

        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input.pdf");
        fs::write(&input, pdf)?;
        let prefix = workdir.path().join("page");

        let output = Command::new(&self.config.binary)
            .arg("-png")
            .arg("-r")
            .arg(self.config.dpi.to_string())
            .arg(&input)
            .arg(&prefix)
            .output()
            .map_err(|error| {
                ExtractError::Rasterize(format!(
                    "unable to start {}: {error}",
                    self.config.binary.display()
                ))
            })?;

        if !output.status.success() {
            return Err(ExtractError::Rasterize(format!(
                "{} exited with {}: {}",
                self.config.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let pages = rendered_pages_in_order(workdir.path())?;
        if pages.len() != page_count {
            return Err(ExtractError::Rasterize(format!(
                "rendered {} page image(s) for a {page_count}-page document",
                pages.len()
            )));
        }

        pages
            .iter()
            .map(|path| fs::read(path).map_err(ExtractError::Io))
            .collect()
    }
}

pub fn count_pdf_pages(pdf: &[u8]) -> Result<usize, ExtractError> {
    let document = Document::load_mem(pdf).map_err(|error| ExtractError::Pdf(error.to_string()))?;
    Ok(document.get_pages().len())
}

/// Lists `page-N.png` files in numeric page order. pdftoppm zero-pads the
/// page number to the width of the last page, so lexical order is not enough.
fn rendered_pages_in_order(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let mut numbered = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let page_number = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(".png"))
            .and_then(|stem| stem.rsplit('-').next())
            .and_then(|number| number.parse::<u32>().ok());

        if let Some(number) = page_number {
            numbered.push((number, path));
        }
    }

    numbered.sort_unstable_by_key(|(number, _)| *number);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

/// PDF text through page rendering and per-page OCR.
pub struct PdfExtractor<R, O> {
    rasterizer: R,
    ocr: O,
}

impl<R, O> PdfExtractor<R, O>
where
    R: PageRasterizer,
    O: OcrEngine,
{
    pub fn new(rasterizer: R, ocr: O) -> Self {
        Self { rasterizer, ocr }
    }
}

impl<R, O> TextExtractor for PdfExtractor<R, O>
where
    R: PageRasterizer,
    O: OcrEngine,
{
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let pages = self.rasterizer.rasterize(bytes)?;
        let mut text = String::new();

        for (index, page) in pages.iter().enumerate() {
            let page_text = self.ocr.recognize(page).map_err(|error| {
                ExtractError::Ocr(format!("page {}: {error}", index + 1))
            })?;
            text.push_str(&page_text);
            text.push('\n');
        }

        debug!(pages = pages.len(), chars = text.len(), "pdf text extracted");
        Ok(text)
    }
}

/// Paragraph text of a `.docx`, one line per top-level paragraph.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let docx =
            docx_rs::read_docx(bytes).map_err(|error| ExtractError::Docx(error.to_string()))?;

        let mut text = String::new();
        for child in &docx.document.children {
            if let DocumentChild::Paragraph(paragraph) = child {
                text.push_str(&paragraph_text(paragraph));
                text.push('\n');
            }
        }

        Ok(text)
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    push_paragraph_children(&paragraph.children, &mut text);
    text
}

fn push_paragraph_children(children: &[ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(value) => text.push_str(&value.text),
                        RunChild::Tab(_) => text.push('\t'),
                        RunChild::Break(_) => text.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_paragraph_children(&link.children, text),
            _ => {}
        }
    }
}

/// Single-pass OCR over an uploaded image.
pub struct ImageExtractor<O> {
    ocr: O,
}

impl<O: OcrEngine> ImageExtractor<O> {
    pub fn new(ocr: O) -> Self {
        Self { ocr }
    }
}

impl<O: OcrEngine> TextExtractor for ImageExtractor<O> {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        self.ocr.recognize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Run};
    use std::io::Cursor;
    use tempfile::tempdir;

    /// Treats every "image" as UTF-8 text that it returns verbatim.
    struct EchoOcr;

    impl OcrEngine for EchoOcr {
        fn recognize(&self, image: &[u8]) -> Result<String, ExtractError> {
            let text = String::from_utf8_lossy(image).to_string();
            if text.contains("smudge") {
                return Err(ExtractError::Ocr("unreadable".to_string()));
            }
            Ok(text)
        }
    }

    struct FixedPages(Vec<&'static str>);

    impl PageRasterizer for FixedPages {
        fn rasterize(&self, _pdf: &[u8]) -> Result<Vec<Vec<u8>>, ExtractError> {
            Ok(self.0.iter().map(|page| page.as_bytes().to_vec()).collect())
        }
    }

    #[test]
    fn pdf_pages_are_joined_in_page_order() {
        let extractor = PdfExtractor::new(
            FixedPages(vec!["first page", "second page", "third page"]),
            EchoOcr,
        );

        let text = extractor.extract(b"%PDF").expect("extraction should succeed");
        assert_eq!(text, "first page\nsecond page\nthird page\n");
    }

    #[test]
    fn pdf_page_failure_fails_whole_document() {
        let extractor = PdfExtractor::new(
            FixedPages(vec!["first page", "smudge", "third page"]),
            EchoOcr,
        );

        let error = extractor.extract(b"%PDF").expect_err("second page should fail");
        assert!(matches!(error, ExtractError::Ocr(ref message) if message.starts_with("page 2")));
    }

    #[test]
    fn image_extractor_returns_raw_ocr_output() {
        let extractor = ImageExtractor::new(EchoOcr);
        let text = extractor.extract(b"  Total: 42\n").expect("ocr should succeed");
        assert_eq!(text, "  Total: 42\n");
    }

    #[test]
    fn docx_paragraphs_keep_order_and_blank_lines() {
        let mut buffer = Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Heading")))
            .add_paragraph(Paragraph::new())
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text("Body "))
                    .add_run(Run::new().add_text("text")),
            )
            .build()
            .pack(&mut buffer)
            .expect("docx should pack");

        let text = DocxExtractor
            .extract(buffer.get_ref())
            .expect("docx should parse");
        assert_eq!(text, "Heading\n\nBody text\n");
    }

    #[test]
    fn docx_garbage_is_an_error() {
        let result = DocxExtractor.extract(b"definitely not a zip archive");
        assert!(matches!(result, Err(ExtractError::Docx(_))));
    }

    #[test]
    fn corrupt_pdf_is_reported_before_rendering() {
        let rasterizer = PdftoppmRasterizer::default();
        let result = rasterizer.rasterize(b"%PDF-1.4\n%broken");
        assert!(matches!(result, Err(ExtractError::Pdf(_))));
    }

    #[test]
    fn rendered_pages_sort_numerically() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        for name in ["page-10.png", "page-02.png", "page-01.png", "page-9.png", "notes.txt"] {
            fs::write(dir.path().join(name), name)?;
        }

        let names = rendered_pages_in_order(dir.path())?
            .into_iter()
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["page-01.png", "page-02.png", "page-9.png", "page-10.png"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn tesseract_exit_status_wins_over_broken_pipe() {
        let ocr = TesseractOcr::new(TesseractConfig {
            binary: PathBuf::from("false"),
            language: "eng".to_string(),
        });
        let image = vec![0u8; 4 * 1024 * 1024];

        match ocr.recognize(&image) {
            Err(ExtractError::Ocr(message)) => assert!(message.contains("exited with")),
            other => panic!("expected an ocr failure, got {other:?}"),
        }
    }
}
