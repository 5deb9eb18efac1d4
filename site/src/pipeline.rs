// kiln/site/src/pipeline.rs

//! Assembles the site build: every stage, in the order it must run.

use crate::config::SiteConfig;
use crate::stages::NormalizeNewlines;
use kiln::stages::{
  CollectionMetadata, Collections, Concat, DataLoader, DefaultValues, Drafts, Env, Except, Excerpts, Ignore,
  MetadataDirectory, Paginate, ReadingTime, Rename, TagCollections, Validate,
};
use kiln::{Branch, Kiln, KilnOptions, KilnResult};
use serde_json::json;

/// Excluded at read time: dotfiles, JSON sidecars and editor lock files.
pub const READ_IGNORE: [&str; 3] = ["**/.*", "**/*.json", "**/*.rsls*"];

pub fn options(config: &SiteConfig) -> KilnOptions {
  KilnOptions {
    source: config.source.clone(),
    destination: config.destination.clone(),
    metadata: config.metadata(),
    clean: config.clean,
    ignore: READ_IGNORE.iter().map(|p| p.to_string()).collect(),
    frontmatter: true,
  }
}

/// Builds the engine for `config`.
pub fn assemble(config: &SiteConfig) -> KilnResult<Kiln> {
  let production = config.is_production();
  let mut kiln = Kiln::new(options(config))?;

  kiln
    .use_stage(Env::from_process())
    .use_stage(MetadataDirectory::any(["data/*.yml", "data/*.yaml"])?)
    .use_stage(Rename::lowercase_extensions()?)
    .use_stage(NormalizeNewlines::any(["**/*.md", "**/*.html", "**/*.css", "**/*.js"], config.concurrency)?)
    .use_stage(Drafts::new().include_drafts(!production))
    .use_stage(Validate::new("blog/*.md")?.require("title").require_date("date"))
    .use_stage(DataLoader::new().remove_source(true))
    .use_stage(Collections::by_directory("*/**/*.md")?.sort_by("date").reverse(true))
    .use_stage(
      Branch::new("blog/**/*.md")?
        .use_stage(Excerpts::new("**/*")?)
        .use_stage(Except::new(["pageDescription"]))
        .use_stage(DefaultValues::new("**/*")?.compute("pageDescription", |_, record| record.get_set("excerpt").cloned())),
    )
    .use_stage(ReadingTime::new("blog/**/*.md")?)
    .use_stage(TagCollections::new("blog/**", "tags", "blog/tag/{tag}")?.sort_by("date").reverse(true))
    .use_stage(
      CollectionMetadata::new()
        .set("blog", "pageHeader", true)
        .set("blog", "pageFooter", true),
    )
    .use_stage(
      Paginate::new("{collection}/{num}/index.html")?
        .first("{collection}/index.html")
        .no_page_one(true)
        .per_page(12)
        .set("collection", json!([]))
        .set("priority", 0.9)
        .set("pageWide", true)
        .set("title", "Blog")
        .set("layout", "blog_index.hbs"),
    )
    .use_stage(
      DefaultValues::new("**/*.md")?
        .set("description", config.site_description.clone())
        .compute("pageTitle", |_, record| record.get_set("title").cloned())
        .compute("pageDescription", |_, record| record.get_set("description").cloned())
        .set("layout", "default.hbs")
        .set("hideNavigation", false)
        .set("hideFooter", false),
    )
    .use_stage(Concat::new("js/**/*.js", "js/bundle.js")?)
    .use_stage(Concat::new("css/**/*.css", "css/bundle.css")?)
    .use_if(production, Ignore::new(["**/*.map"])?)
    .use_stage(Ignore::new(["google*.html"])?);

  tracing::info!(num_steps = kiln.pipeline().len(), production, "Site pipeline assembled.");
  Ok(kiln)
}
