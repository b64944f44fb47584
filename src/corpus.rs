//! Sample corpus bootstrapping.
//!
//! Creates a tiny local corpus of engineering notes so the pipeline can run
//! immediately without any real or sensitive data.

use std::path::Path;

use tokio::fs;
use tracing::debug;

use crate::types::RagError;

/// Fixed sample notes written on first run.
const SAMPLE_DOCS: [(&str, &str); 3] = [
    (
        "yield_notes.txt",
        "Weekly yield summary: Yield dipped on Line B after photo step adjustment. \
         Primary excursion correlated with humidity spikes. Recommended: verify chamber seals \
         and review SPC limits for humidity sensors.",
    ),
    (
        "fa_notes.txt",
        "Failure analysis notes: Open circuit observed in a subset of units. \
         Cross-section suggests voiding near interconnect. Potential root cause: \
         process temperature profile drift during reflow.",
    ),
    (
        "process_change.txt",
        "Process change log: Updated etch recipe v3.2 to reduce sidewall roughness. \
         Observed improvement in parametric stability. Monitor for any increased defect density \
         in the next two lots.",
    ),
];

/// Ensures the sample corpus exists under `dir` and returns its
/// (path, content) pairs.
///
/// Existing files are never overwritten, so local edits survive re-runs; the
/// returned content is always read back from disk.
pub async fn ensure_sample_docs(dir: impl AsRef<Path>) -> Result<Vec<(String, String)>, RagError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).await?;

    let mut corpus = Vec::with_capacity(SAMPLE_DOCS.len());
    for (name, contents) in SAMPLE_DOCS {
        let path = dir.join(name);
        if !path.exists() {
            fs::write(&path, contents).await?;
            debug!(path = %path.display(), "wrote sample document");
        }
        let text = fs::read_to_string(&path).await?;
        corpus.push((path.to_string_lossy().into_owned(), text));
    }
    Ok(corpus)
}
