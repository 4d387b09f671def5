//! PowerPoint deck ingestion.
//!
//! A `.pptx` file is a zip archive; each slide lives in
//! `ppt/slides/slide<N>.xml` with its visible text in `<a:t>` runs grouped
//! into `<a:p>` paragraphs. [`PptxDirectorySource`] turns every slide that
//! has text into one [`SourceDocument`]:
//!
//! | Field | Value |
//! |-------|-------|
//! | `original_id` | `<file_stem>_slide_<n>` (n is 1-based) |
//! | `content` | the slide's paragraphs joined by a single space |
//! | `metadata` | `{"file_name": <stem>, "slide_number": n, "source": "pptx"}` |

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ragify_core::{Error, Result, id_from_path, slide_id};
use regex::{Captures, Regex};
use serde_json::json;

use crate::source::{DocumentSource, SourceDocument};

/// Value of the `source` metadata key for slides.
pub const PPTX_SOURCE: &str = "pptx";

/// Reads every `*.pptx` file directly inside a directory.
///
/// Files are visited in name order. A missing directory is created and
/// yields no documents. Files that cannot be parsed are logged and skipped.
#[derive(Debug, Clone)]
pub struct PptxDirectorySource {
    dir: PathBuf,
    parser: SlideParser,
}

impl PptxDirectorySource {
    /// Create a source over `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            dir: dir.into(),
            parser: SlideParser::new()?,
        })
    }

    /// The directory being read.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Extract the slide documents of a single deck.
    pub fn read_deck(&self, path: &Path) -> Result<Vec<SourceDocument>> {
        let stem = id_from_path(path)
            .ok_or_else(|| Error::parse(format!("no file stem in {}", path.display())))?;

        let file = File::open(path).map_err(|e| Error::io_with_path(e, path))?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| Error::parse(format!("{} is not a pptx archive: {e}", path.display())))?;

        let mut slides: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| self.parser.slide_number(name).map(|n| (n, name.to_string())))
            .collect();
        slides.sort_by_key(|(n, _)| *n);

        let mut documents = Vec::new();
        for (position, (_, name)) in slides.iter().enumerate() {
            let mut xml = String::new();
            archive
                .by_name(name)
                .map_err(|e| Error::parse(format!("{}: {name}: {e}", path.display())))?
                .read_to_string(&mut xml)
                .map_err(|e| Error::io_with_path(e, path))?;

            let content = self.parser.slide_text(&xml);
            if content.is_empty() {
                continue;
            }

            let slide_number = position + 1;
            documents.push(
                SourceDocument::new(slide_id(&stem, slide_number), content).with_metadata(json!({
                    "file_name": stem,
                    "slide_number": slide_number,
                    "source": PPTX_SOURCE,
                })),
            );
        }

        log::debug!(
            "Extracted {} of {} slides from {}",
            documents.len(),
            slides.len(),
            path.display()
        );
        Ok(documents)
    }

    fn deck_paths(&self) -> Result<Vec<PathBuf>> {
        let dir = self
            .dir
            .to_str()
            .ok_or_else(|| Error::config(format!("non UTF-8 path: {}", self.dir.display())))?;
        let pattern = Path::new(&glob::Pattern::escape(dir))
            .join("*.pptx")
            .to_string_lossy()
            .into_owned();

        let mut paths = Vec::new();
        let entries = glob::glob(&pattern)
            .map_err(|e| Error::config(format!("bad deck pattern {pattern}: {e}")))?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => log::warn!("Skipping unreadable entry: {e}"),
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn load(&self) -> Result<Vec<SourceDocument>> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|e| Error::io_with_path(e, &self.dir))?;
            log::info!("Created deck directory {}", self.dir.display());
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();
        for path in self.deck_paths()? {
            match self.read_deck(&path) {
                Ok(slides) => documents.extend(slides),
                Err(e) => log::warn!("Skipping {}: {e}", path.display()),
            }
        }

        log::info!(
            "Found {} slides in {}",
            documents.len(),
            self.dir.display()
        );
        Ok(documents)
    }
}

#[async_trait]
impl DocumentSource for PptxDirectorySource {
    async fn documents(&self) -> Result<Vec<SourceDocument>> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.load())
            .await
            .map_err(|e| Error::operation(format!("spawn_blocking failed: {e}")))?
    }

    fn name(&self) -> &str {
        PPTX_SOURCE
    }
}

// ============================================================================
// Slide XML
// ============================================================================

/// Pulls slide numbers out of archive entry names and text out of slide XML.
#[derive(Debug, Clone)]
struct SlideParser {
    slide_entry: Regex,
    paragraph: Regex,
    run: Regex,
    entity: Regex,
}

impl SlideParser {
    fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::parse(format!("bad pattern {pattern}: {e}")))
        };
        Ok(Self {
            slide_entry: compile(r"^ppt/slides/slide(\d+)\.xml$")?,
            paragraph: compile(r"(?s)<a:p(?:\s[^>]*)?>(.*?)</a:p>")?,
            run: compile(r"(?s)<a:t(?:\s[^>]*)?>(.*?)</a:t>")?,
            entity: compile(r"&(#x[0-9A-Fa-f]+|#[0-9]+|[a-z]+);")?,
        })
    }

    fn slide_number(&self, entry: &str) -> Option<u32> {
        self.slide_entry
            .captures(entry)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Text of one slide: runs concatenated per paragraph, non-empty
    /// paragraphs joined by a single space.
    fn slide_text(&self, xml: &str) -> String {
        let mut paragraphs = Vec::new();
        for paragraph in self.paragraph.captures_iter(xml) {
            let body = paragraph.get(1).map_or("", |m| m.as_str());
            let text: String = self
                .run
                .captures_iter(body)
                .filter_map(|run| run.get(1))
                .map(|m| self.unescape(m.as_str()))
                .collect();
            let text = text.trim();
            if !text.is_empty() {
                paragraphs.push(text.to_string());
            }
        }
        paragraphs.join(" ")
    }

    fn unescape(&self, text: &str) -> String {
        self.entity
            .replace_all(text, |caps: &Captures| {
                let name = &caps[1];
                let decoded = match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => name
                        .strip_prefix("#x")
                        .map(|hex| u32::from_str_radix(hex, 16))
                        .or_else(|| name.strip_prefix('#').map(str::parse::<u32>))
                        .and_then(|code| code.ok())
                        .and_then(char::from_u32),
                };
                decoded.map_or_else(|| caps[0].to_string(), String::from)
            })
            .into_owned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    /// Slide XML with one shape per entry of `paragraphs`.
    fn slide_xml(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| {
                format!(
                    "<p:sp><p:txBody><a:bodyPr/><a:p><a:pPr lvl=\"0\"/><a:r><a:rPr lang=\"en-US\"/><a:t>{p}</a:t></a:r></a:p></p:txBody></p:sp>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
             xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\">\
             <p:cSld><p:spTree>{body}</p:spTree></p:cSld></p:sld>"
        )
    }

    /// Write a minimal deck; slide `i` (0-based) becomes `slide{i+1}.xml`.
    fn write_deck(path: &Path, slides: &[Vec<&str>]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
        zip.start_file("ppt/presentation.xml", options).unwrap();
        zip.write_all(b"<?xml version=\"1.0\"?><p:presentation/>").unwrap();

        for (i, paragraphs) in slides.iter().enumerate() {
            zip.start_file(format!("ppt/slides/slide{}.xml", i + 1), options)
                .unwrap();
            zip.write_all(slide_xml(paragraphs).as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn parser() -> SlideParser {
        SlideParser::new().unwrap()
    }

    #[test]
    fn test_slide_number() {
        let parser = parser();
        assert_eq!(parser.slide_number("ppt/slides/slide12.xml"), Some(12));
        assert_eq!(parser.slide_number("ppt/slides/_rels/slide1.xml.rels"), None);
        assert_eq!(parser.slide_number("ppt/slideLayouts/slideLayout1.xml"), None);
    }

    #[test]
    fn test_slide_text_joins_paragraphs() {
        let xml = slide_xml(&["Quarterly Review", "Revenue grew 12%"]);
        assert_eq!(parser().slide_text(&xml), "Quarterly Review Revenue grew 12%");
    }

    #[test]
    fn test_slide_text_concatenates_runs() {
        let xml = "<a:p><a:r><a:t>Hel</a:t></a:r><a:r><a:t xml:space=\"preserve\">lo</a:t></a:r></a:p>";
        assert_eq!(parser().slide_text(xml), "Hello");
    }

    #[test]
    fn test_slide_text_skips_empty_paragraphs() {
        let xml = "<a:p/><a:p><a:endParaRPr/></a:p><a:p><a:r><a:t>  only  </a:t></a:r></a:p>";
        assert_eq!(parser().slide_text(xml), "only");
    }

    #[test]
    fn test_slide_text_ignores_tab_elements() {
        let xml = "<a:p><a:r><a:t>a</a:t></a:r><a:tab/><a:r><a:t>b</a:t></a:r></a:p>";
        assert_eq!(parser().slide_text(xml), "ab");
    }

    #[test]
    fn test_unescape() {
        let parser = parser();
        assert_eq!(parser.unescape("R&amp;D &lt;2024&gt;"), "R&D <2024>");
        assert_eq!(parser.unescape("&quot;hi&apos;"), "\"hi'");
        assert_eq!(parser.unescape("&#233;t&#xE9;"), "été");
        assert_eq!(parser.unescape("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_read_deck() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roadmap.pptx");
        write_deck(
            &path,
            &[vec!["Roadmap"], vec![], vec!["Q3 goals", "Ship search"]],
        );

        let source = PptxDirectorySource::new(dir.path()).unwrap();
        let docs = source.read_deck(&path).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].original_id, "roadmap_slide_1");
        assert_eq!(docs[0].content, "Roadmap");
        assert_eq!(docs[1].original_id, "roadmap_slide_3");
        assert_eq!(docs[1].content, "Q3 goals Ship search");
        assert_eq!(
            docs[1].metadata,
            json!({"file_name": "roadmap", "slide_number": 3, "source": "pptx"})
        );
    }

    #[test]
    fn test_read_deck_orders_slides_numerically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.pptx");
        let words = [
            "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
            "eleven",
        ];
        let slides: Vec<Vec<&str>> = words.iter().map(|w| vec![*w]).collect();
        write_deck(&path, &slides);

        let docs = PptxDirectorySource::new(dir.path())
            .unwrap()
            .read_deck(&path)
            .unwrap();
        assert_eq!(docs[1].original_id, "long_slide_2");
        assert_eq!(docs[1].content, "two");
        assert_eq!(docs[10].original_id, "long_slide_11");
        assert_eq!(docs[10].content, "eleven");
    }

    #[test]
    fn test_read_deck_not_a_zip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.pptx");
        std::fs::write(&path, b"definitely not a zip").unwrap();

        let source = PptxDirectorySource::new(dir.path()).unwrap();
        assert!(source.read_deck(&path).is_err());
    }

    #[tokio::test]
    async fn test_documents_missing_dir_is_created() {
        let dir = tempdir().unwrap();
        let decks = dir.path().join("resources").join("pptx");

        let source = PptxDirectorySource::new(&decks).unwrap();
        assert!(source.documents().await.unwrap().is_empty());
        assert!(decks.is_dir());
    }

    #[tokio::test]
    async fn test_documents_skips_bad_files_and_non_pptx() {
        let dir = tempdir().unwrap();
        write_deck(&dir.path().join("b.pptx"), &[vec!["bee"]]);
        write_deck(&dir.path().join("a.pptx"), &[vec!["ay"]]);
        std::fs::write(dir.path().join("c.pptx"), b"garbage").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_deck(&dir.path().join("nested").join("deep.pptx"), &[vec!["deep"]]);

        let source = PptxDirectorySource::new(dir.path()).unwrap();
        let docs = source.documents().await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.original_id.as_str()).collect();
        assert_eq!(ids, vec!["a_slide_1", "b_slide_1"]);
        assert_eq!(source.name(), "pptx");
    }
}
