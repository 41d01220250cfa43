//! List corpus content

use anyhow::Result;

use crate::Site;

/// List corpus content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let build = site.build()?;
    let corpus = &build.corpus;
    let index = corpus.index();

    match content_type {
        "post" | "posts" => {
            println!("Posts ({}):", index.by_date().len());
            for doc in corpus.published() {
                println!(
                    "  {} - {} [{}]",
                    doc.publish_date.format("%Y-%m-%d"),
                    doc.title,
                    doc.slug
                );
            }
        }
        "draft" | "drafts" => {
            println!("Drafts ({}):", index.drafts().len());
            for slug in index.drafts() {
                let doc = corpus.get(slug)?;
                println!("  {} [{}]", doc.title, doc.source);
            }
        }
        "tag" | "tags" => {
            let mut tags: Vec<_> = index.tag_counts().into_iter().collect();
            println!("Tags ({}):", tags.len());
            tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            for (tag, count) in tags {
                println!("  {} ({})", tag, count);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, draft, tag",
                content_type
            );
        }
    }

    Ok(())
}
