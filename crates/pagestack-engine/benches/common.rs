use pagestack_engine::io::ImportedSource;
use pagestack_engine::{Cmd, Document, SourceKind};

/// A document of `items` imported sources, alternating multi-page files and
/// single images
pub fn generate_document(items: usize, pages_per_file: usize) -> Document {
    let sources = (0..items)
        .map(|i| {
            if i % 2 == 0 {
                ImportedSource::new(format!("/bench/file-{i}.pdf"), SourceKind::File, pages_per_file)
            } else {
                ImportedSource::new(format!("/bench/image-{i}.png"), SourceKind::Image, 1)
            }
        })
        .collect();

    let mut doc = Document::new();
    if let Err(e) = doc.apply(Cmd::Import(sources)) {
        panic!("Failed to build bench document: {e}");
    }
    doc
}
