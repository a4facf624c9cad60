pub mod classify;
pub mod corpus;
pub mod normalize;
pub mod taxonomy;

use crate::api_types::ApiItem;
use crate::models::BibItem;
use corpus::Corpus;
use taxonomy::Taxonomy;

/// Two-pass pipeline: wire items → normalized items → tag rows joined with the taxonomy.
pub fn build_corpus(api_items: Vec<ApiItem>, taxonomy: &Taxonomy) -> Corpus {
    let mut warnings = Vec::new();
    let items: Vec<BibItem> = api_items
        .into_iter()
        .map(|raw| {
            let (item, missing) = BibItem::from_api(raw);
            warnings.extend(missing);
            item
        })
        .collect();
    Corpus::build(items, taxonomy).with_warnings(warnings)
}
