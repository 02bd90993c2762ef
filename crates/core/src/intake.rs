use crate::error::ExtractError;
use crate::extractor::{
    DocxExtractor, ImageExtractor, OcrEngine, PageRasterizer, PdfExtractor, TextExtractor,
};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Image,
}

impl DocumentFormat {
    /// Picks the format from the filename's extension, ignoring case.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                ExtractError::UnsupportedFormat(format!("{filename} has no file extension"))
            })?;

        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "png" | "jpg" | "jpeg" => Ok(DocumentFormat::Image),
            other => Err(ExtractError::UnsupportedFormat(format!(
                ".{other} (expected pdf, docx, png, jpg or jpeg)"
            ))),
        }
    }
}

/// Strategy table from [`DocumentFormat`] to the extractor that handles it.
#[derive(Clone)]
pub struct IntakeRouter {
    pdf: Arc<dyn TextExtractor>,
    docx: Arc<dyn TextExtractor>,
    image: Arc<dyn TextExtractor>,
}

impl IntakeRouter {
    pub fn new(
        pdf: Arc<dyn TextExtractor>,
        docx: Arc<dyn TextExtractor>,
        image: Arc<dyn TextExtractor>,
    ) -> Self {
        Self { pdf, docx, image }
    }

    /// Wires the stock adapters around one rasterizer and one OCR engine.
    pub fn with_engines<R, O>(rasterizer: R, ocr: O) -> Self
    where
        R: PageRasterizer + 'static,
        O: OcrEngine + Clone + 'static,
    {
        Self::new(
            Arc::new(PdfExtractor::new(rasterizer, ocr.clone())),
            Arc::new(DocxExtractor),
            Arc::new(ImageExtractor::new(ocr)),
        )
    }

    pub fn extractor_for(&self, format: DocumentFormat) -> &Arc<dyn TextExtractor> {
        match format {
            DocumentFormat::Pdf => &self.pdf,
            DocumentFormat::Docx => &self.docx,
            DocumentFormat::Image => &self.image,
        }
    }

    pub fn route(&self, filename: &str) -> Result<Arc<dyn TextExtractor>, ExtractError> {
        let format = DocumentFormat::from_filename(filename)?;
        Ok(Arc::clone(self.extractor_for(format)))
    }

    pub fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
        self.route(filename)?.extract(bytes)
    }
}
